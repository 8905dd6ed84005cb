//! Error types for the coating-thickness crate.

/// Errors that can occur while configuring the analyzer or ingesting frames.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The frame has zero area or its pixel buffer does not match its dimensions.
    #[error("invalid frame ({width}x{height}): {reason}")]
    InvalidFrame {
        /// Declared frame width in pixels.
        width: u32,
        /// Declared frame height in pixels.
        height: u32,
        /// What was wrong with the frame.
        reason: String,
    },

    /// The frame bytes could not be decoded into an image.
    #[error("failed to decode frame: {0}")]
    Decode(image::ImageError),

    /// The analyzer configuration failed validation.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The configuration file is not valid TOML for [`AnalyzerConfig`](crate::AnalyzerConfig).
    #[error("failed to parse configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// An I/O error occurred while reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An error occurred while encoding or saving an image.
    #[error("image processing error: {0}")]
    Image(#[from] image::ImageError),
}

impl Error {
    /// Whether this error rejects a single frame rather than the whole session.
    ///
    /// Stream and batch callers should skip such a frame and keep going.
    #[must_use]
    pub fn is_invalid_frame(&self) -> bool {
        matches!(self, Self::InvalidFrame { .. } | Self::Decode(_))
    }
}

/// A specialized `Result` type for this crate.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_messages() {
        let io_err = Error::Io(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
        assert!(io_err.to_string().contains("gone"));

        let parse = toml::from_str::<toml::Value>("weights = [").unwrap_err();
        assert!(Error::ConfigParse(parse)
            .to_string()
            .starts_with("failed to parse configuration"));

        let invalid = Error::InvalidFrame {
            width: 0,
            height: 20,
            reason: "zero area".to_string(),
        };
        let msg = invalid.to_string();
        assert!(msg.contains("0x20"));
        assert!(msg.contains("zero area"));

        let config = Error::Config("weights sum to 0.9".to_string());
        assert!(config.to_string().contains("weights sum to 0.9"));
    }

    #[test]
    fn only_frame_errors_are_skippable() {
        let invalid = Error::InvalidFrame {
            width: 0,
            height: 0,
            reason: "zero area".to_string(),
        };
        assert!(invalid.is_invalid_frame());
        assert!(!Error::Config("empty profile set".to_string()).is_invalid_frame());
        let io = Error::Io(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
        assert!(!io.is_invalid_frame());
    }
}
