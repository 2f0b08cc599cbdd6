//! # crm-service
//!
//! The UI-agnostic side of the CRM assistant.
//!
//! A [`Conversation`] owns a [`Session`] and a [`QueryPipeline`]. Each
//! submission is classified, executed and turned into an ordered list of
//! [`PresentationEvent`]s (transcript messages, a chart or table render, a CSV
//! download) that any front end can replay.

pub mod conversation;
pub mod events;
pub mod export;
pub mod pipeline;
pub mod presentation;
pub mod presets;
pub mod session;

pub use conversation::Conversation;
pub use events::PresentationEvent;
pub use export::{to_csv, ExportError};
pub use pipeline::{response_text, QueryPipeline, TurnOutcome, HELP_MESSAGE, NO_RESULTS_MESSAGE};
pub use presentation::{select_chart, ChartBar, ChartKind, ChartSpec};
pub use presets::Preset;
pub use session::{welcome_message, AuthState, ClassifierState, Session};
