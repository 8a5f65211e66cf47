use thiserror::Error;

/// Faults that abort an extraction run.
///
/// Malformed page content never produces one of these; the renderer and
/// strategies degrade to plain text instead. These are reserved for failures
/// of the extraction machinery itself.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("invalid selector `{selector}`: {reason}")]
    Selector { selector: String, reason: String },

    #[error("extraction panicked: {0}")]
    Panicked(String),
}
