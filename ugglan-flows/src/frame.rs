//! Program frame wizard: purpose → bento suggestions → choice → generated frame text.

use std::fmt;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, warn, Instrument};
use ugglan_llm::{CompletionOptions, TextGenerator};
use ugglan_store::{Bento, EventContext, EventStore};

use crate::guard::{guarded_generate, Constraints, Guarded};
use crate::prompts::{self, OLLO};
use crate::reply::{Button, FinalizeAction, UiMessage, BENTO_CARD};
use crate::state::{id_value, LAST_PROPOSAL};
use crate::{StepId, WizardError, WizardReply, WizardRequest, WizardState};

pub const FRAME_FIELD: &str = "frame_proposal_raw";

const EVENT_ID: &str = "event_id";
const FRAME_PURPOSE: &str = "frame_purpose";
const SUGGESTED: &str = "suggested_bentos";
const SELECTED: &str = "selected_bento_id";

const MAX_SUGGESTIONS: usize = 5;

/// Headings every generated frame text must carry.
pub const FRAME_HEADINGS: &[&str] = &[
    "Titel:",
    "Beskrivning:",
    "Steg:",
    "Reflektion:",
    "Interaktion:",
    "NFI-index:",
    "Engagemangsnivå:",
];

const RANKING_SYSTEM: &str = "Du är Ollo, en svensk AI-assistent för inkluderande mötesdesign.\n\n\
Din uppgift:\nVälj 3–5 bentos som passar bäst för en programpunkt.\n\n\
Ta hänsyn till:\n- Programpunktens syfte\n- Eventets övergripande syfte\n\
- Deltagarprofil (HOPA)\n- Variation i engagemangsnivå\n- Hjärnvänlighet (NFI)\n\n\
Svara med ett JSON-objekt enligt detta format och inget annat:\n\
{\"bentos\": [{\"id\": \"bento_id\", \"motivation\": \"Kort motivering\"}]}";

const RANKING_USER: &str = "PROGRAMPUNKTENS SYFTE:\n{{frame_purpose}}\n\n\
EVENTETS SYFTE:\n{{purpose}}\n\nDELTAGARPROFIL:\n{{audience}}\n\n\
TILLGÄNGLIGA BENTOS:\n{{candidates}}";

const CONTENT_SYSTEM: &str = "{{persona}}\n\n\
Din uppgift är att skapa en tydlig, inkluderande och hjärnvänlig programpunkt som innehåller:\n\
- En kort och tydlig titel (max 6 ord)\n- En beskrivning (1–3 meningar)\n\
- Ett reflektionsinslag\n- Ett interaktionsinslag\n\
- 3–5 steg med namn och kort beskrivning\n\
- En rimlig tidslängd för varje steg (max 20 minuter)\n\
- Ett NFI-index (1–5) som anger hjärnvänlighet\n\
- En engagemangsnivå (1–5) baserat på variation och interaktivitet\n\n\
Svarsmall:\nTitel: ...\nBeskrivning: ...\n\nSteg:\n1. Namn (X min) – Kort beskrivning\n2. ...\n\n\
Reflektion: ...\nInteraktion: ...\nNFI-index: X\nEngagemangsnivå: X";

const CONTENT_USER: &str = "{{adjustment}}\n\nEventets syfte:\n{{purpose}}\n\n\
Deltagarprofil:\n{{audience}}\n\nProgramanteckningar:\n{{notes}}\n\n\
Syfte med denna programpunkt:\n{{frame_purpose}}\n\n{{bento}}\n\n{{current}}";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameStep {
    Start,
    SuggestBentos,
    ChooseOrCustom,
    GenerateContent,
    Refine,
    Finalize,
    Done,
}

impl FrameStep {
    pub fn resolve(id: Option<&StepId>) -> Result<Self, WizardError> {
        let name = match id {
            None => return Ok(Self::Start),
            Some(StepId::Index(0)) => return Ok(Self::Start),
            Some(StepId::Index(n)) => return Err(WizardError::InvalidStep(n.to_string())),
            Some(StepId::Name(name)) => name.trim(),
        };
        match name {
            "" | "start" => Ok(Self::Start),
            "suggest_bentos" => Ok(Self::SuggestBentos),
            "choose_or_custom" => Ok(Self::ChooseOrCustom),
            "generate_content" => Ok(Self::GenerateContent),
            "refine" => Ok(Self::Refine),
            "finalize" => Ok(Self::Finalize),
            other => Err(WizardError::InvalidStep(other.to_string())),
        }
    }
}

impl fmt::Display for FrameStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Start => "start",
            Self::SuggestBentos => "suggest_bentos",
            Self::ChooseOrCustom => "choose_or_custom",
            Self::GenerateContent => "generate_content",
            Self::Refine => "refine",
            Self::Finalize => "finalize",
            Self::Done => "done",
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RankingReply {
    Wrapped { bentos: Vec<RankedBento> },
    Bare(Vec<RankedBento>),
}

#[derive(Debug, Deserialize)]
struct RankedBento {
    id: Value,
    #[serde(default)]
    motivation: Option<String>,
}

/// A candidate the model picked, with its reason.
#[derive(Clone, Debug, PartialEq)]
pub struct Suggestion {
    pub bento: Bento,
    pub motivation: String,
}

#[derive(Clone)]
pub struct FrameFlow {
    generator: TextGenerator,
    store: Arc<dyn EventStore>,
}

impl FrameFlow {
    pub fn new(generator: TextGenerator, store: Arc<dyn EventStore>) -> Self {
        Self { generator, store }
    }

    pub async fn handle(&self, request: &WizardRequest) -> Result<WizardReply, WizardError> {
        let step = FrameStep::resolve(request.step.as_ref())?;
        let span = tracing::info_span!("frame_step", step = %step);
        async move {
            let reply = match step {
                FrameStep::Start => Ok(self.start(request)),
                FrameStep::SuggestBentos => self.suggest_bentos(request).await,
                FrameStep::ChooseOrCustom => self.choose_or_custom(request).await,
                FrameStep::GenerateContent => {
                    self.generate_content(request.state.clone(), None).await
                }
                FrameStep::Refine => self.refine(request).await,
                FrameStep::Finalize => self.finalize(request),
                FrameStep::Done => Err(WizardError::InvalidStep(step.to_string())),
            }?;
            info!(next_step = %reply.next_step, "frame step handled");
            Ok(reply)
        }
        .instrument(span)
        .await
    }

    fn start(&self, request: &WizardRequest) -> WizardReply {
        let mut state = request.state.clone();
        if state.get_str(EVENT_ID).is_none() {
            if let Some(event_id) = request.context.get_id(EVENT_ID) {
                state = state.with(EVENT_ID, event_id);
            }
        }
        WizardReply::builder(FrameStep::SuggestBentos)
            .say(
                "Vad är syftet med den här programpunkten?\n\nBeskriv kort vad den ska \
                 handla om och leda till.",
            )
            .state(state)
            .build()
    }

    async fn suggest_bentos(&self, request: &WizardRequest) -> Result<WizardReply, WizardError> {
        let purpose = request
            .input()
            .ok_or_else(|| WizardError::missing_input(FRAME_PURPOSE))?;
        let event_id = event_id(request)?;

        let context = self.store.event_context(&event_id).await?;
        let candidates = self.store.candidate_bentos().await?;
        let state = request
            .state
            .clone()
            .with(EVENT_ID, event_id)
            .with(FRAME_PURPOSE, purpose)
            .without(SELECTED);

        if candidates.is_empty() {
            warn!("bento library returned no candidates");
            return Ok(WizardReply::builder(FrameStep::ChooseOrCustom)
                .say("Jag hittade inga bentos i biblioteket. Vi skapar en egen aktivitet.")
                .message(UiMessage::choices(vec![Button::new(
                    "Skapa egen",
                    FrameStep::ChooseOrCustom,
                )]))
                .state(state.with(SUGGESTED, Vec::<String>::new()))
                .build());
        }

        let suggestions = self.rank(&candidates, purpose, &context).await?;
        let ids: Vec<String> = suggestions.iter().map(|s| s.bento.id.clone()).collect();

        let mut reply = WizardReply::builder(FrameStep::ChooseOrCustom)
            .say("Här är några bentos som passar bra för den här programpunkten:");
        for suggestion in &suggestions {
            reply = reply.message(UiMessage::card(BENTO_CARD, bento_card(suggestion)));
        }
        Ok(reply
            .message(
                UiMessage::assistant(
                    "Vill du använda någon av dessa, eller skapa en egen aktivitet?",
                )
                .with_options(ids.iter().cloned())
                .with_buttons(vec![Button::new("Skapa egen", FrameStep::ChooseOrCustom)]),
            )
            .state(state.with(SUGGESTED, ids))
            .build())
    }

    /// Asks the model to pick among `candidates` and keeps only picks that exist.
    pub async fn rank(
        &self,
        candidates: &[Bento],
        frame_purpose: &str,
        context: &EventContext,
    ) -> Result<Vec<Suggestion>, WizardError> {
        let lines: Vec<String> = candidates.iter().map(Bento::prompt_line).collect();
        let user = prompts::render(
            RANKING_USER,
            prompts::vars([
                ("frame_purpose", frame_purpose.to_string()),
                ("purpose", context.purpose.clone().unwrap_or_default()),
                ("audience", context.audience_profile.clone().unwrap_or_default()),
                ("candidates", lines.join("\n")),
            ]),
        )?;
        let options = CompletionOptions {
            temperature: Some(0.4),
            ..CompletionOptions::json()
        };
        let ranking: RankingReply = self
            .generator
            .generate_json(RANKING_SYSTEM, &user, &options)
            .await?;
        let ranked = match ranking {
            RankingReply::Wrapped { bentos } | RankingReply::Bare(bentos) => bentos,
        };

        let mut suggestions: Vec<Suggestion> = Vec::new();
        for pick in ranked {
            let Some(id) = id_value(Some(&pick.id)) else {
                continue;
            };
            let Some(bento) = candidates.iter().find(|b| b.id == id) else {
                warn!(%id, "ranking named an unknown bento");
                continue;
            };
            if suggestions.iter().any(|s| s.bento.id == id) {
                continue;
            }
            suggestions.push(Suggestion {
                bento: bento.clone(),
                motivation: pick.motivation.unwrap_or_default(),
            });
            if suggestions.len() == MAX_SUGGESTIONS {
                break;
            }
        }

        if suggestions.is_empty() {
            return Err(WizardError::GenerationFailed(
                "bento ranking named no known bentos".to_string(),
            ));
        }
        Ok(suggestions)
    }

    async fn choose_or_custom(&self, request: &WizardRequest) -> Result<WizardReply, WizardError> {
        let state = request.state.clone();
        let choice = request
            .input()
            .filter(|input| !matches!(input.to_lowercase().as_str(), "custom" | "egen"));

        let state = match choice {
            Some(bento_id) => {
                let suggested = state.string_list(SUGGESTED);
                if !suggested.is_empty() && !suggested.iter().any(|id| id == bento_id) {
                    return Err(WizardError::InvalidRequest(format!(
                        "bento '{bento_id}' was not among the suggestions"
                    )));
                }
                state.with(SELECTED, bento_id)
            }
            None => state.with(SELECTED, Value::Null),
        };
        self.generate_content(state, None).await
    }

    async fn generate_content(
        &self,
        state: WizardState,
        adjustment: Option<&str>,
    ) -> Result<WizardReply, WizardError> {
        let event_id = id_value(state.get(EVENT_ID))
            .ok_or_else(|| WizardError::MissingField(EVENT_ID.to_string()))?;
        let frame_purpose = state
            .get_str(FRAME_PURPOSE)
            .ok_or_else(|| WizardError::missing_input(FRAME_PURPOSE))?
            .to_string();

        let context = self.store.event_context(&event_id).await?;
        let bento = match id_value(state.get(SELECTED)) {
            Some(bento_id) => Some(self.store.bento(&bento_id).await?),
            None => None,
        };

        let system = prompts::render(
            CONTENT_SYSTEM,
            prompts::vars([("persona", OLLO.to_string())]),
        )?;
        let adjustment_text = adjustment
            .map(|a| {
                format!(
                    "Användaren vill justera följande:\n{a}\n\nSkapa ett nytt förslag med \
                     uppdaterade delar enligt användarens önskemål. Återskapa hela förslaget."
                )
            })
            .unwrap_or_default();
        let current = match (adjustment, state.last_proposal()) {
            (Some(_), Some(previous)) => format!("Nuvarande förslag:\n{previous}"),
            _ => String::new(),
        };
        let bento_text = bento
            .as_ref()
            .map(|b| format!("Bygg programpunkten på denna bento:\n{}", b.prompt_line()))
            .unwrap_or_default();
        let user = prompts::render(
            CONTENT_USER,
            prompts::vars([
                ("adjustment", adjustment_text),
                ("purpose", context.purpose.unwrap_or_default()),
                ("audience", context.audience_profile.unwrap_or_default()),
                ("notes", context.program_notes.unwrap_or_else(|| "—".to_string())),
                ("frame_purpose", frame_purpose),
                ("bento", bento_text),
                ("current", current),
            ]),
        )?;

        let constraints = Constraints::new().must_include(FRAME_HEADINGS);
        let guarded = guarded_generate(
            &self.generator,
            &system,
            &user,
            &constraints,
            &CompletionOptions::with_temperature(0.5),
        )
        .await?;

        let intro = if adjustment.is_some() {
            "Uppdaterat förslag:"
        } else {
            "Här är ett första förslag:"
        };
        Ok(frame_proposal(intro, guarded, state))
    }

    async fn refine(&self, request: &WizardRequest) -> Result<WizardReply, WizardError> {
        let adjustment = request.input();
        if adjustment.is_none() && request.state.last_proposal().is_none() {
            return Err(WizardError::missing_input("refinement"));
        }
        self.generate_content(request.state.clone(), adjustment).await
    }

    fn finalize(&self, request: &WizardRequest) -> Result<WizardReply, WizardError> {
        let value = request
            .input()
            .or_else(|| request.state.last_proposal())
            .ok_or_else(|| WizardError::missing_input("value to save"))?;
        Ok(WizardReply::builder(FrameStep::Done)
            .say("Klart! Programpunkten sparas.")
            .action(FinalizeAction::save("frame", FRAME_FIELD, value))
            .build())
    }
}

fn event_id(request: &WizardRequest) -> Result<String, WizardError> {
    id_value(request.state.get(EVENT_ID))
        .or_else(|| request.context.get_id(EVENT_ID))
        .ok_or_else(|| WizardError::MissingField(EVENT_ID.to_string()))
}

fn bento_card(suggestion: &Suggestion) -> Value {
    let mut card = serde_json::to_value(&suggestion.bento).unwrap_or_else(|_| json!({}));
    if let Value::Object(map) = &mut card {
        map.insert(
            "motivation".to_string(),
            Value::String(suggestion.motivation.clone()),
        );
    }
    card
}

fn frame_proposal(intro: &str, guarded: Guarded, state: WizardState) -> WizardReply {
    let validated = guarded.passed();
    let text = guarded.text;
    WizardReply::builder(FrameStep::Refine)
        .message(UiMessage::assistant(format!("{intro}\n\n{text}")).with_value(text.clone()))
        .message(
            UiMessage::assistant("Vill du justera något, eller ska vi spara förslaget?")
                .with_buttons(vec![
                    Button::new("Justera", FrameStep::Refine),
                    Button::new("Spara", FrameStep::Finalize),
                ]),
        )
        .data(json!({ FRAME_FIELD: text, "validated": validated }))
        .state(state.with(LAST_PROPOSAL, text))
        .build()
}
