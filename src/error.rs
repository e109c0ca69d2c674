use thiserror::Error;

#[derive(Error, Debug)]
pub enum DeckError {
    #[error("API error: {0}")]
    Api(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Session expired: {0}")]
    Unauthorized(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, DeckError>;

/// Cloneable error shape carried through the action channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    Transient(String),
    Unauthorized(String),
}

impl LoadError {
    pub fn message(&self) -> &str {
        match self {
            LoadError::Transient(msg) | LoadError::Unauthorized(msg) => msg,
        }
    }
}

impl From<DeckError> for LoadError {
    fn from(err: DeckError) -> Self {
        match err {
            DeckError::Unauthorized(msg) => LoadError::Unauthorized(msg),
            other => LoadError::Transient(other.to_string()),
        }
    }
}

impl std::fmt::Display for LoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unauthorized_survives_flattening() {
        let err: LoadError = DeckError::Unauthorized("token rejected".into()).into();
        assert_eq!(err, LoadError::Unauthorized("token rejected".into()));
    }

    #[test]
    fn other_errors_become_transient() {
        let err: LoadError = DeckError::Api("502".into()).into();
        assert_eq!(err, LoadError::Transient("API error: 502".into()));
    }
}
