//! The question wizard state machine:
//! `start → ask_1 … ask_n → propose → refine (loop) → finalize → done`.

use serde_json::json;
use tracing::{info, Instrument};
use ugglan_llm::{CompletionOptions, TextGenerator};
use ugglan_prompt::PromptTemplate;

use crate::catalog::{FieldKind, FieldSpec, Merge, Question, WizardKind};
use crate::guard::{guarded_generate, normalize_phrases, Guarded};
use crate::prompts;
use crate::reply::{Button, FinalizeAction, UiMessage, WizardReply};
use crate::state::{EXISTING_VALUE, FIELD, LAST_PROPOSAL, MUST_INCLUDE};
use crate::{Step, WizardError, WizardRequest, WizardState};

/// Runs one step of a question wizard. Holds no per-conversation state: everything the
/// next step needs goes back to the client in the reply.
#[derive(Clone)]
pub struct Dispatcher {
    generator: TextGenerator,
}

struct Turn<'a> {
    kind: WizardKind,
    field: FieldSpec,
    request: &'a WizardRequest,
}

impl Dispatcher {
    pub fn new(generator: TextGenerator) -> Self {
        Self { generator }
    }

    pub async fn handle(
        &self,
        kind: WizardKind,
        request: &WizardRequest,
    ) -> Result<WizardReply, WizardError> {
        let field = resolve_field(kind, request)?;
        let step = Step::resolve(request.step.as_ref(), &kind.question_keys())?;
        let span = tracing::info_span!(
            "wizard_step",
            wizard = kind.name(),
            field = field.name(),
            step = %step
        );
        let turn = Turn {
            kind,
            field: field.spec(),
            request,
        };
        async move {
            let reply = match step {
                Step::Start => self.start(&turn, true),
                Step::Restart => self.start(&turn, false),
                Step::Ask(index) => self.answer(&turn, index).await,
                Step::Propose => self.propose(&turn, request.state.clone()).await,
                Step::Refine => self.refine(&turn).await,
                Step::Finalize => self.finalize(&turn),
                Step::Done => Err(WizardError::InvalidStep(step.to_string())),
            }?;
            info!(next_step = %reply.next_step, "wizard step handled");
            Ok(reply)
        }
        .instrument(span)
        .await
    }

    fn start(&self, turn: &Turn<'_>, offer_existing: bool) -> Result<WizardReply, WizardError> {
        let mut state = turn.request.state.clone().without(LAST_PROPOSAL);
        if turn.kind.fixed_field().is_none() {
            state = state.with(FIELD, turn.field.kind.name());
        }

        if offer_existing {
            if let Some(existing) = existing_value(turn) {
                let text = format!(
                    "Det finns redan {} sparad:\n\n**{existing}**\n\nVill du förbättra eller \
                     förtydliga den? Beskriv i så fall vad du vill ändra.",
                    turn.field.label
                );
                return Ok(WizardReply::builder(Step::Refine)
                    .message(
                        UiMessage::assistant(text)
                            .with_id(format!("{}_existing", turn.kind.name()))
                            .with_buttons(vec![
                                Button::new("Förbättra", Step::Refine),
                                Button::new("Skapa ny", Step::Restart),
                            ]),
                    )
                    .state(state.with(EXISTING_VALUE, existing))
                    .build());
            }
        }

        let state = state.without(EXISTING_VALUE);
        self.ask(turn, 1, state)
    }

    fn ask(
        &self,
        turn: &Turn<'_>,
        index: usize,
        state: WizardState,
    ) -> Result<WizardReply, WizardError> {
        let question = question(turn.kind, index)?;
        let text = PromptTemplate::new(question.text).render(&prompts::vars([(
            "label",
            turn.field.label.to_string(),
        )]))?;
        let message = UiMessage::assistant(text)
            .with_id(format!("{}_q{index}", turn.kind.name()))
            .with_options(question.options.iter().copied());
        Ok(WizardReply::builder(Step::Ask(index))
            .message(message)
            .state(state)
            .build())
    }

    async fn answer(&self, turn: &Turn<'_>, index: usize) -> Result<WizardReply, WizardError> {
        let question = question(turn.kind, index)?;
        let input = turn.request.input();
        if question.required && input.is_none() {
            return Err(WizardError::missing_input(question.key));
        }
        let state = merge_answer(question, input, turn.request.state.clone());

        if index < turn.kind.questions().len() {
            self.ask(turn, index + 1, state)
        } else {
            self.propose(turn, state).await
        }
    }

    async fn propose(
        &self,
        turn: &Turn<'_>,
        state: WizardState,
    ) -> Result<WizardReply, WizardError> {
        let missing = turn.kind.questions().iter().find(|q| {
            q.required && q.merge == Merge::Answer && state.get_str(q.key).is_none()
        });
        if let Some(question) = missing {
            return Err(WizardError::missing_input(question.key));
        }

        let constraints = turn.field.constraints(&state.must_include());
        let system = prompts::system_instruction(
            turn.kind,
            &turn.field,
            &constraints,
            &turn.request.context,
            false,
        )?;
        let user = prompts::proposal_message(turn.kind, &state, state.get_str(EXISTING_VALUE));
        let guarded = guarded_generate(
            &self.generator,
            &system,
            &user,
            &constraints,
            &CompletionOptions::with_temperature(turn.field.temperature),
        )
        .await?;

        Ok(proposal_reply(turn, "Då föreslår jag detta:", guarded, state))
    }

    async fn refine(&self, turn: &Turn<'_>) -> Result<WizardReply, WizardError> {
        let state = turn.request.state.clone();
        let adjustment = turn.request.input();
        let base = state
            .last_proposal()
            .or_else(|| state.get_str(EXISTING_VALUE))
            .map(str::to_string)
            .or_else(|| existing_value(turn));

        let (base, adjustment) = match (base, adjustment) {
            (Some(base), adjustment) => (base, adjustment),
            (None, Some(draft)) => (draft.to_string(), None),
            (None, None) => return Err(WizardError::missing_input("refinement")),
        };

        let constraints = turn.field.constraints(&state.must_include());
        let system = prompts::system_instruction(
            turn.kind,
            &turn.field,
            &constraints,
            &turn.request.context,
            true,
        )?;
        let user = prompts::refine_message(&base, adjustment);
        let guarded = guarded_generate(
            &self.generator,
            &system,
            &user,
            &constraints,
            &CompletionOptions::with_temperature(turn.field.temperature),
        )
        .await?;

        Ok(proposal_reply(turn, "Här är ett uppdaterat förslag:", guarded, state))
    }

    fn finalize(&self, turn: &Turn<'_>) -> Result<WizardReply, WizardError> {
        let value = turn
            .request
            .input()
            .or_else(|| turn.request.state.last_proposal())
            .ok_or_else(|| WizardError::missing_input("value to save"))?;

        Ok(WizardReply::builder(Step::Done)
            .say("Klart! Texten sparas.")
            .action(FinalizeAction::save(
                turn.kind.entity(),
                turn.field.kind.name(),
                value,
            ))
            .build())
    }
}

fn proposal_reply(
    turn: &Turn<'_>,
    intro: &str,
    guarded: Guarded,
    state: WizardState,
) -> WizardReply {
    let validated = guarded.passed();
    let text = guarded.text;
    let body = format!("{intro}\n\n**{text}**\n\nVill du ändra något, eller ska vi spara?");
    WizardReply::builder(Step::Refine)
        .message(
            UiMessage::assistant(body)
                .with_id(format!("{}_proposal", turn.kind.name()))
                .with_value(text.clone()),
        )
        .message(UiMessage::choices(vec![
            Button::new("Justera", Step::Refine),
            Button::new("Spara", Step::Finalize),
        ]))
        .data(json!({
            "field": turn.field.kind.name(),
            "candidate": text,
            "validated": validated,
        }))
        .state(state.with(LAST_PROPOSAL, text))
        .build()
}

fn resolve_field(kind: WizardKind, request: &WizardRequest) -> Result<FieldKind, WizardError> {
    if let Some(field) = kind.fixed_field() {
        return Ok(field);
    }
    let name = request
        .state
        .get_str(FIELD)
        .or_else(|| request.context.get_str(FIELD))
        .ok_or_else(|| WizardError::MissingField(FIELD.to_string()))?;
    FieldKind::parse(name)
        .ok_or_else(|| WizardError::InvalidRequest(format!("unknown field '{name}'")))
}

fn question(kind: WizardKind, index: usize) -> Result<&'static Question, WizardError> {
    index
        .checked_sub(1)
        .and_then(|i| kind.questions().get(i))
        .ok_or_else(|| WizardError::InvalidStep(Step::Ask(index).to_string()))
}

fn merge_answer(question: &Question, input: Option<&str>, state: WizardState) -> WizardState {
    let Some(input) = input else {
        return state;
    };
    match question.merge {
        Merge::Answer => state.with(question.key, input),
        Merge::MustInclude => {
            let mut phrases = state.must_include();
            phrases.push(input.to_string());
            state.with(MUST_INCLUDE, normalize_phrases(phrases))
        }
    }
}

/// A value already saved for the target field, read from the context the caller sent.
fn existing_value(turn: &Turn<'_>) -> Option<String> {
    let context = &turn.request.context;
    if let Some(alias) = turn.kind.existing_alias() {
        if context.get_bool(&format!("has_{alias}")) == Some(false) {
            return None;
        }
        if let Some(existing) = context.get_str(&format!("existing_{alias}")) {
            return Some(existing.to_string());
        }
    }
    context.get_str(EXISTING_VALUE).map(str::to_string)
}
