//! Single-shot suggestions for an existing frame: reflection, interaction and steps.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::Instrument;
use ugglan_llm::{CompletionOptions, TextGenerator};

use crate::prompts::{self, UGGLAN};
use crate::state::{id_value, null_as_default};
use crate::WizardError;

const MAX_STEP_MINUTES: u32 = 20;

const SYSTEM: &str = "{{persona}} Du hjälper arrangörer att förbättra en programpunkt i ett \
eventprogram.\nGe praktiska, konkreta förslag för hur man kan lägga till reflektion, \
interaktion och bygga upp ett steg-för-steg-upplägg.\nAnvänd enkelt språk. Anpassa förslagen \
utifrån syfte, deltagarprofil och eventtema.\nMinst ett inslag av reflektion och ett av \
interaktion ska finnas. Inget steg får vara längre än 20 minuter.\nBeräkna ett NFI-index \
(1–5) där 5 är mest neurovänligt, samt engagemangsnivå (1–5).\nReturnera ENDAST ett \
JSON-objekt med fälten reflection_suggestion, interaction_suggestion, steps (lista med \
label och duration i minuter), nfi_index och engagement_level.";

const USER: &str = "Eventets syfte: {{purpose}}\nDeltagarprofil: {{audience}}\n{{theme}}\n\
Befintlig data: {{existing}}";

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct HelperContext {
    #[serde(default)]
    pub purpose: Option<String>,
    #[serde(default)]
    pub audience: Option<String>,
    #[serde(default)]
    pub theme: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct FrameHelperRequest {
    #[serde(default)]
    pub frame_id: Option<Value>,
    #[serde(default)]
    pub existing_data: Option<Value>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub context: HelperContext,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct StepSuggestion {
    pub label: String,
    pub duration: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct FrameSuggestions {
    pub reflection_suggestion: String,
    pub interaction_suggestion: String,
    pub steps: Vec<StepSuggestion>,
    pub nfi_index: u8,
    pub engagement_level: u8,
}

impl FrameSuggestions {
    /// Checks the shape beyond what deserialization guarantees.
    pub fn validate(&self) -> Result<(), String> {
        if self.reflection_suggestion.trim().is_empty() {
            return Err("reflection_suggestion is empty".to_string());
        }
        if self.interaction_suggestion.trim().is_empty() {
            return Err("interaction_suggestion is empty".to_string());
        }
        if self.steps.is_empty() {
            return Err("no steps".to_string());
        }
        for step in &self.steps {
            if step.label.trim().is_empty() {
                return Err("step without label".to_string());
            }
            if !(1..=MAX_STEP_MINUTES).contains(&step.duration) {
                return Err(format!(
                    "step '{}' lasts {} minutes, expected 1..={MAX_STEP_MINUTES}",
                    step.label, step.duration
                ));
            }
        }
        for (name, value) in [
            ("nfi_index", self.nfi_index),
            ("engagement_level", self.engagement_level),
        ] {
            if !(1..=5).contains(&value) {
                return Err(format!("{name} is {value}, expected 1..=5"));
            }
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FrameHelperReply {
    pub ok: bool,
    pub frame_id: Option<String>,
    pub suggestions: FrameSuggestions,
}

#[derive(Clone)]
pub struct FrameHelper {
    generator: TextGenerator,
}

impl FrameHelper {
    pub fn new(generator: TextGenerator) -> Self {
        Self { generator }
    }

    pub async fn suggest(
        &self,
        request: &FrameHelperRequest,
    ) -> Result<FrameHelperReply, WizardError> {
        let purpose = non_blank(&request.context.purpose)
            .ok_or_else(|| WizardError::missing_input("context.purpose"))?;
        let audience = non_blank(&request.context.audience)
            .ok_or_else(|| WizardError::missing_input("context.audience"))?;
        let frame_id = id_value(request.frame_id.as_ref());

        let span =
            tracing::info_span!("frame_helper", frame_id = frame_id.as_deref().unwrap_or(""));
        async move {
            let system =
                prompts::render(SYSTEM, prompts::vars([("persona", UGGLAN.to_string())]))?;
            let theme = non_blank(&request.context.theme)
                .map(|t| format!("Tema: {t}"))
                .unwrap_or_default();
            let existing = request
                .existing_data
                .as_ref()
                .map(Value::to_string)
                .unwrap_or_else(|| "{}".to_string());
            let user = prompts::render(
                USER,
                prompts::vars([
                    ("purpose", purpose.to_string()),
                    ("audience", audience.to_string()),
                    ("theme", theme),
                    ("existing", existing),
                ]),
            )?;

            let suggestions: FrameSuggestions = self
                .generator
                .generate_json(&system, &user, &CompletionOptions::json())
                .await?;
            suggestions.validate().map_err(|reason| {
                WizardError::GenerationFailed(format!("frame suggestions: {reason}"))
            })?;

            Ok(FrameHelperReply {
                ok: true,
                frame_id,
                suggestions,
            })
        }
        .instrument(span)
        .await
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}
