use crate::model::RunStatus;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub struct ConfigError(pub String);

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "config error: {}", self.0)
    }
}

impl std::error::Error for ConfigError {}

/// Rejected run mutations. The document is left untouched when one of these is returned.
#[derive(Debug, Clone, PartialEq)]
pub enum RunError {
    IllegalTransition { from: RunStatus, to: RunStatus },
    InvalidScore(f64),
    InvalidWeight(i32),
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunError::IllegalTransition { from, to } => {
                write!(f, "illegal status transition: {} -> {}", from, to)
            }
            RunError::InvalidScore(s) => write!(
                f,
                "score {} out of range ({}..={})",
                s,
                crate::model::MIN_SCORE,
                crate::model::MAX_SCORE
            ),
            RunError::InvalidWeight(w) => write!(
                f,
                "tag weight {} out of range (-1..={})",
                w,
                crate::model::MAX_TAG_WEIGHT
            ),
        }
    }
}

impl std::error::Error for RunError {}

/// Non-2xx answer from the inference server.
#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamError {
    pub status: u16,
    pub body: String,
}

impl fmt::Display for UpstreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.body.trim().is_empty() {
            write!(f, "Request failed ({})", self.status)
        } else {
            f.write_str(&self.body)
        }
    }
}

impl std::error::Error for UpstreamError {}

pub fn is_config_error(e: &anyhow::Error) -> bool {
    e.downcast_ref::<ConfigError>().is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_message_prefers_body() {
        let e = UpstreamError {
            status: 404,
            body: "model 'x' not found".into(),
        };
        assert_eq!(e.to_string(), "model 'x' not found");

        let e = UpstreamError {
            status: 502,
            body: "  ".into(),
        };
        assert_eq!(e.to_string(), "Request failed (502)");
    }

    #[test]
    fn test_config_error_is_detected_through_anyhow() {
        let e: anyhow::Error = ConfigError("bad".into()).into();
        assert!(is_config_error(&e));
        assert!(!is_config_error(&anyhow::anyhow!("other")));
    }
}
