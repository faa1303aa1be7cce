use std::fmt;

/// Size of the capture buffer for driver diagnostics, in bytes.
pub const LOG_CAPACITY: usize = 1024;

const EMPTY_LOG: &str = "(no diagnostic output)";

/// Driver diagnostic text captured into a fixed-size buffer.
///
/// Text longer than the buffer is cut at the last UTF-8 boundary that fits and
/// flagged as truncated. Captured text is never empty.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct DiagnosticLog {
    text: String,
    truncated: bool,
}

impl DiagnosticLog {
    pub fn capture(raw: &str) -> Self {
        Self::capture_with_capacity(raw, LOG_CAPACITY)
    }

    pub fn capture_with_capacity(raw: &str, capacity: usize) -> Self {
        let raw = raw.trim_end();
        if raw.is_empty() {
            return Self {
                text: EMPTY_LOG.to_string(),
                truncated: false,
            };
        }

        if raw.len() <= capacity {
            return Self {
                text: raw.to_string(),
                truncated: false,
            };
        }

        let mut end = capacity;
        while !raw.is_char_boundary(end) {
            end -= 1;
        }

        Self {
            text: raw[..end].to_string(),
            truncated: true,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn is_truncated(&self) -> bool {
        self.truncated
    }
}

impl fmt::Display for DiagnosticLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)?;
        if self.truncated {
            f.write_str(" [log truncated]")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_logs_are_kept_verbatim() {
        let log = DiagnosticLog::capture("error: expected ';'\n");
        assert_eq!(log.as_str(), "error: expected ';'");
        assert!(!log.is_truncated());
    }

    #[test]
    fn empty_logs_get_placeholder_text() {
        let log = DiagnosticLog::capture("  \n");
        assert!(!log.as_str().is_empty());
    }

    #[test]
    fn long_logs_are_truncated_to_capacity() {
        let raw = "x".repeat(LOG_CAPACITY * 3);
        let log = DiagnosticLog::capture(&raw);
        assert_eq!(log.as_str().len(), LOG_CAPACITY);
        assert!(log.is_truncated());
        assert!(log.to_string().ends_with("[log truncated]"));
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        // 'é' is two bytes; capacity 5 lands inside the third one.
        let log = DiagnosticLog::capture_with_capacity("ééééé", 5);
        assert_eq!(log.as_str(), "éé");
        assert!(log.is_truncated());
    }
}
