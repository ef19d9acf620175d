//! Read access to the hosted event datastore.
//!
//! The wizards only ever read: event context, the bento activity library and the tips
//! bank. Writes are described as actions in wizard replies and executed by the caller.
//!
//! Environment variables read by [`SupabaseStoreBuilder`]:
//! - `SUPABASE_URL`
//! - `SUPABASE_SERVICE_ROLE_KEY`

pub mod client;
mod config;
mod error;
pub mod query;
mod store;
mod types;

pub use config::SupabaseStoreBuilder;
pub use error::StoreError;
pub use query::{search_needle, Query};
pub use store::{EventStore, SupabaseStore};
pub use types::{Bento, EventContext, Tip};
