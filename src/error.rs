/// Errors surfaced by the controller and its collaborators.
///
/// None of these are fatal to the host page: callers inside the crate log and
/// swallow store and reporter failures, and message handling turns every
/// error into a `{ success: false, error }` response.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The settings store rejected a read or write.
    #[error("settings store failure: {0}")]
    Store(String),
    /// The counterpart context (background, popup) is not listening yet.
    #[error("counterpart context is not ready")]
    Unavailable,
    /// An iframe belongs to another origin and cannot be inspected.
    #[error("frame is cross-origin")]
    CrossOrigin,
    /// A manually entered speed is outside the accepted range.
    #[error("speed {speed} is outside {min}..={max}")]
    SpeedOutOfRange { speed: f64, min: f64, max: f64 },
    /// A user-edited max speed is outside the accepted range.
    #[error("max speed {0} is outside 2..=10")]
    MaxSpeedOutOfRange(f64),
    /// `updateEnhancedSetting` named a key the settings do not have.
    #[error("unknown setting `{0}`")]
    UnknownSetting(String),
    /// `applyEducationalSpeed` asked for a speed outside the platform list.
    #[error("Speed not recommended for this platform")]
    NotRecommended(f64),
    /// The clipboard refused the write.
    #[error("clipboard write rejected")]
    Clipboard,
    #[error("invalid page url: {0}")]
    Url(#[from] url::ParseError),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
