/// Error types for the sprinkle engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// The settings store could not be read or written
    StoreError(String),
    /// A stored value had the wrong shape
    SettingsError(String),
    /// Values could not be converted to or from JSON
    SerializationError(String),
    /// Vocabulary could not be loaded
    VocabularyError(String),
    /// General error with context
    Other(String),
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::StoreError(msg) => write!(f, "Store error: {}", msg),
            EngineError::SettingsError(msg) => write!(f, "Settings error: {}", msg),
            EngineError::SerializationError(msg) => write!(f, "Serialization error: {}", msg),
            EngineError::VocabularyError(msg) => write!(f, "Vocabulary error: {}", msg),
            EngineError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for EngineError {}

impl From<serde_json::Error> for EngineError {
    fn from(e: serde_json::Error) -> Self {
        EngineError::SerializationError(e.to_string())
    }
}

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;
