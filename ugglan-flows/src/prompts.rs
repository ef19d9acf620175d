//! Prompt assembly. The wording is product content; the structure is what callers rely
//! on: persona, instruction, requirement lines, optional metadata, then the task.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;
use ugglan_prompt::{PromptTemplate, PromptVars};

use crate::catalog::{FieldSpec, Merge, WizardKind, EVENT_METADATA};
use crate::guard::Constraints;
use crate::{StepContext, WizardError, WizardState};

pub(crate) const UGGLAN: &str = "Du är Ugglan, en svensk eventassistent.";
pub(crate) const OLLO: &str = "Du är Ollo, en svensk eventdesigner som hjälper arrangörer \
                               att skapa meningsfulla programpunkter.";

pub(crate) const HOPA: &str = "HOPA – Human Oriented Participation Architecture:\n\
HOPA är en modell för att designa möten och event så att fler deltagare kan känna sig \
inkluderade, trygga och engagerade.\n\nTre deltagartyper:\n\
- Analytiker – uppskattar struktur, fördjupning och lugn.\n\
- Interaktörer – trivs med samarbete, dialog och aktivitet.\n\
- Visionärer – drivs av syfte, helhet och verklighetskoppling.";

const PRINCIPLES: &str = "FÖLJ DESSA PRINCIPER:\n\
- Följ instruktioner ordagrant om de är tydliga.\n\
- Förbättra tydlighet, struktur och språk, inte längd.\n\
- Använd enkelt, vardagligt språk utan metaforer och fluff.\n\
- Inkludera exakt stavning, versaler och ordning på uttryck som ska vara med.";

const SYSTEM_TEMPLATE: &str = "{{persona}}\n\n{{hopa}}\n\nInstruktion:\n{{instruction}}\n\n\
{{principles}}\n\n{{requirements}}\n\n{{metadata}}\n\n{{task}}";

const REFINE_TASK: &str = "Förbättra utgångstexten utifrån användarens instruktion. Behåll \
ton och stil. Skriv endast den nya texten.";

const PROPOSE_TASK: &str = "Skriv endast själva texten.";

/// Renders a template and squeezes the blank lines left by empty sections.
pub(crate) fn render(template: &str, vars: PromptVars) -> Result<String, WizardError> {
    let rendered = PromptTemplate::new(template).render(&vars)?;
    Ok(squeeze_blank_lines(&rendered))
}

pub(crate) fn vars<const N: usize>(pairs: [(&str, String); N]) -> PromptVars {
    pairs
        .into_iter()
        .map(|(key, value)| (key.to_string(), Value::String(value)))
        .collect()
}

fn squeeze_blank_lines(text: &str) -> String {
    static BLANKS: OnceLock<Option<Regex>> = OnceLock::new();
    match BLANKS.get_or_init(|| Regex::new(r"\n[ \t]*\n(?:[ \t]*\n)+").ok()) {
        Some(blanks) => blanks.replace_all(text, "\n\n").into_owned(),
        None => text.to_string(),
    }
}

fn persona(kind: WizardKind) -> &'static str {
    match kind {
        WizardKind::Purpose | WizardKind::Audience => UGGLAN,
        WizardKind::EventData => OLLO,
    }
}

fn metadata(kind: WizardKind, context: &StepContext) -> String {
    if !kind.uses_event_metadata() {
        return String::new();
    }
    let lines: Vec<String> = EVENT_METADATA
        .iter()
        .filter_map(|(key, label)| context.get_str(key).map(|v| format!("- {label}: {v}")))
        .collect();
    if lines.is_empty() {
        return String::new();
    }
    format!("Använd följande metadata vid behov:\n{}", lines.join("\n"))
}

pub(crate) fn system_instruction(
    kind: WizardKind,
    field: &FieldSpec,
    constraints: &Constraints,
    context: &StepContext,
    refining: bool,
) -> Result<String, WizardError> {
    let hopa = match kind {
        WizardKind::EventData => String::new(),
        _ => HOPA.to_string(),
    };
    render(
        SYSTEM_TEMPLATE,
        vars([
            ("persona", persona(kind).to_string()),
            ("hopa", hopa),
            ("instruction", field.instruction.to_string()),
            ("principles", PRINCIPLES.to_string()),
            ("requirements", constraints.instructions()),
            ("metadata", metadata(kind, context)),
            (
                "task",
                if refining { REFINE_TASK } else { PROPOSE_TASK }.to_string(),
            ),
        ]),
    )
}

/// The accumulated answers, one `LABEL: answer` line each, plus the base text if any.
pub(crate) fn proposal_message(kind: WizardKind, state: &WizardState, base: Option<&str>) -> String {
    let mut sections = Vec::new();
    if let Some(base) = base {
        sections.push(format!("UTGÅNGSTEXT:\n{base}"));
    }
    let answers: Vec<String> = kind
        .questions()
        .iter()
        .filter(|q| q.merge == Merge::Answer)
        .filter_map(|q| state.get_str(q.key).map(|a| format!("{}: {a}", q.label)))
        .collect();
    if !answers.is_empty() {
        sections.push(answers.join("\n"));
    }
    if sections.is_empty() {
        sections.push("Skapa texten utifrån metadata.".to_string());
    }
    sections.join("\n\n")
}

pub(crate) fn refine_message(base: &str, adjustment: Option<&str>) -> String {
    match adjustment {
        Some(adjustment) => {
            format!("UTGÅNGSTEXT:\n{base}\n\nANVÄNDARENS INSTRUKTION:\n{adjustment}")
        }
        None => format!("UTGÅNGSTEXT:\n{base}"),
    }
}
