//! Client-driven wizards for Ugglan.
//!
//! Every handler is a function of `(step, input, state, context)`. Nothing is kept
//! between requests: the reply carries the updated state and the client sends it back
//! with the next step. Writes are never performed here; the final step returns a
//! [`FinalizeAction`] for the caller to execute.
//!
//! - [`Dispatcher`] runs the question wizards listed in [`WizardKind`].
//! - [`FrameFlow`] builds program frames from the bento library.
//! - [`FrameHelper`] and [`Assistant`] are single-shot handlers.

mod assistant;
pub mod catalog;
mod error;
mod frame;
pub mod guard;
mod helper;
mod prompts;
pub mod reply;
mod request;
pub mod state;
mod step;
mod wizard;

pub use assistant::{Assistant, ChatReply, ChatRequest, TIPS_LIMIT};
pub use catalog::{FieldKind, FieldSpec, WizardKind};
pub use error::WizardError;
pub use frame::{FrameFlow, FrameStep, Suggestion, FRAME_FIELD, FRAME_HEADINGS};
pub use guard::{guarded_generate, Constraints, Guarded, Violation};
pub use helper::{
    FrameHelper, FrameHelperReply, FrameHelperRequest, FrameSuggestions, HelperContext,
    StepSuggestion,
};
pub use reply::{Button, FinalizeAction, ReplyBuilder, UiMessage, WizardReply};
pub use request::WizardRequest;
pub use state::{StepContext, WizardState};
pub use step::{Step, StepId};
pub use wizard::Dispatcher;
