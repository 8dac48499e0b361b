//! Popup error types

use thiserror::Error;

/// Main error type for popup construction and image loading
#[derive(Error, Debug)]
pub enum PopupError {
    // ===== Configuration time (construction aborts) =====
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("View could not be inflated: {0}")]
    ViewInflation(String),

    #[error("Configuration error: {0}")]
    Config(String),

    // ===== Image loading (reported per image, popup keeps running) =====
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image decode error: {0}")]
    ImageDecode(String),

    #[error("Fetch failed: {0}")]
    Fetch(String),

    #[error("Cache error: {0}")]
    Cache(String),
}

impl PopupError {
    /// Is this error recoverable while the popup is showing?
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            PopupError::Io(_)
                | PopupError::ImageDecode(_)
                | PopupError::Fetch(_)
                | PopupError::Cache(_)
        )
    }

    /// Did this error abort popup construction?
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            PopupError::InvalidInput(_) | PopupError::ViewInflation(_) | PopupError::Config(_)
        )
    }
}

impl From<image::ImageError> for PopupError {
    fn from(e: image::ImageError) -> Self {
        PopupError::ImageDecode(e.to_string())
    }
}

impl From<toml::de::Error> for PopupError {
    fn from(e: toml::de::Error) -> Self {
        PopupError::Config(e.to_string())
    }
}

impl From<toml::ser::Error> for PopupError {
    fn from(e: toml::ser::Error) -> Self {
        PopupError::Config(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, PopupError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classes() {
        assert!(PopupError::InvalidInput("empty".into()).is_configuration());
        assert!(!PopupError::InvalidInput("empty".into()).is_recoverable());
        assert!(PopupError::Fetch("404".into()).is_recoverable());
        assert!(!PopupError::Config("bad colour".into()).is_recoverable());
        assert!(!PopupError::Cache("disk full".into()).is_configuration());
    }
}
