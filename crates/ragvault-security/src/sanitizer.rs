/// Default ceiling on user-supplied text, counted in characters.
pub const DEFAULT_MAX_CHARS: usize = 2000;

/// Why an input was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SanitizeError {
    /// More characters than the configured ceiling.
    #[error("too long")]
    TooLong,
    /// Contains control characters other than tab, newline or carriage return.
    #[error("contains invalid characters")]
    ControlCharacters,
}

/// Input validator guarding the gateway against oversized and malformed text.
#[derive(Debug, Clone)]
pub struct Sanitizer {
    max_chars: usize,
}

impl Default for Sanitizer {
    fn default() -> Self {
        Self {
            max_chars: DEFAULT_MAX_CHARS,
        }
    }
}

impl Sanitizer {
    /// Create a sanitizer accepting at most `max_chars` characters.
    pub fn new(max_chars: usize) -> Self {
        Self { max_chars }
    }

    /// The configured ceiling.
    pub fn max_chars(&self) -> usize {
        self.max_chars
    }

    /// Check `input` without modifying it.
    pub fn validate(&self, input: &str) -> Result<(), SanitizeError> {
        if input.chars().count() > self.max_chars {
            return Err(SanitizeError::TooLong);
        }
        let has_control = input
            .chars()
            .any(|c| c.is_control() && c != '\n' && c != '\t' && c != '\r');
        if has_control {
            return Err(SanitizeError::ControlCharacters);
        }
        Ok(())
    }

    /// Sanitize HTTP headers to prevent log poisoning.
    pub fn sanitize_header(&self, value: &str) -> String {
        value
            .chars()
            .filter(|c| c.is_ascii_graphic() || *c == ' ')
            .take(1000)
            .collect()
    }
}
