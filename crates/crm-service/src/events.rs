//! Events handed to the presentation layer, in the order they occur.

use crm_types::{ChatMessage, TabularResult};

use crate::presentation::ChartSpec;

#[derive(Debug, Clone, PartialEq)]
pub enum PresentationEvent {
    /// A message appended to the transcript
    Message(ChatMessage),

    /// Draw a chart. The table is kept for a tabular fallback.
    RenderChart {
        title: String,
        chart: ChartSpec,
        table: TabularResult,
    },

    /// Draw a table
    RenderTable { title: String, table: TabularResult },

    /// Offer the result as a CSV download
    Download { file_name: String, csv: String },
}

impl PresentationEvent {
    /// The message, if this is a transcript event.
    pub fn as_message(&self) -> Option<&ChatMessage> {
        match self {
            PresentationEvent::Message(message) => Some(message),
            _ => None,
        }
    }

    /// Returns true for chart or table renders.
    pub fn is_render(&self) -> bool {
        matches!(
            self,
            PresentationEvent::RenderChart { .. } | PresentationEvent::RenderTable { .. }
        )
    }
}
