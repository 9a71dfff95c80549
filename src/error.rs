// src/error.rs
//
// Crate-wide error type

pub type Result<T> = std::result::Result<T, AnimakeError>;

#[derive(thiserror::Error, Debug)]
pub enum AnimakeError {
    #[error("config error: {0}")]
    Config(String),

    #[error("scene script error: {0}")]
    Script(String),

    #[error("export error: {0}")]
    Export(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl AnimakeError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn script(msg: impl Into<String>) -> Self {
        Self::Script(msg.into())
    }

    pub fn export(msg: impl Into<String>) -> Self {
        Self::Export(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes_are_stable() {
        assert!(AnimakeError::config("x").to_string().contains("config error:"));
        assert!(
            AnimakeError::script("x")
                .to_string()
                .contains("scene script error:")
        );
        assert!(AnimakeError::export("x").to_string().contains("export error:"));
    }

    #[test]
    fn io_preserves_source() {
        let err = AnimakeError::from(std::io::Error::other("boom"));
        assert!(err.to_string().contains("boom"));
    }
}
