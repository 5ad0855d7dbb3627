use thiserror::Error;

/// Failures surfaced by the heatmap pipeline.
///
/// An empty mapping is not an error; it is handled by each renderer.
#[derive(Debug, Error)]
pub enum HeatmapError {
    #[error("activity source {source_name} unavailable: {reason}")]
    SourceUnavailable { source_name: String, reason: String },

    #[error("invalid calendar date {input:?}")]
    DateParse { input: String },

    #[error("failed writing heatmap output")]
    Io(#[from] std::io::Error),

    #[error("failed rendering heatmap page")]
    Render(#[from] askama::Error),
}

impl HeatmapError {
    pub fn source_unavailable(source_name: impl Into<String>, reason: impl ToString) -> Self {
        Self::SourceUnavailable {
            source_name: source_name.into(),
            reason: reason.to_string(),
        }
    }

    pub fn is_date_parse(&self) -> bool {
        matches!(self, Self::DateParse { .. })
    }
}
