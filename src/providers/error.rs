use std::fmt;

use crate::utils::truncate_str;

/// Classified inference failure, so the caller can decide between a retry
/// and an apology.
#[derive(Debug)]
pub struct ProviderError {
    pub kind: ProviderErrorKind,
    pub status: Option<u16>,
    pub message: String,
    /// Seconds to wait before retrying (from 429 Retry-After header or body).
    pub retry_after_secs: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderErrorKind {
    /// 401/403: bad API key or permissions.
    Auth,
    /// 402: billing/quota exhausted.
    Billing,
    /// 429: rate limited; check retry_after_secs.
    RateLimit,
    /// 404 or "model not found": bad model name.
    NotFound,
    /// 408, request timeout, or provider took too long.
    Timeout,
    /// Connection refused, DNS failure, reset, etc.
    Network,
    /// 500/502/503/504: provider-side outage.
    ServerError,
    /// Anything else.
    Unknown,
}

impl ProviderError {
    pub fn from_status(status: u16, body: &str) -> Self {
        let kind = match status {
            401 | 403 => ProviderErrorKind::Auth,
            402 => ProviderErrorKind::Billing,
            404 => ProviderErrorKind::NotFound,
            408 => ProviderErrorKind::Timeout,
            429 => ProviderErrorKind::RateLimit,
            500 | 502 | 503 | 504 => ProviderErrorKind::ServerError,
            _ => ProviderErrorKind::Unknown,
        };

        // Try to extract retry_after from JSON body for 429s
        let retry_after_secs = if kind == ProviderErrorKind::RateLimit {
            extract_retry_after(body)
        } else {
            None
        };

        Self {
            kind,
            status: Some(status),
            message: truncate_body(body),
            retry_after_secs,
        }
    }

    pub fn network(err: &reqwest::Error) -> Self {
        let kind = if err.is_timeout() {
            ProviderErrorKind::Timeout
        } else {
            ProviderErrorKind::Network
        };
        Self {
            kind,
            status: None,
            message: err.to_string(),
            retry_after_secs: None,
        }
    }

    /// Short apology for the driver. Never exposes keys, URLs or model names.
    pub fn user_message(&self) -> String {
        match self.kind {
            ProviderErrorKind::RateLimit | ProviderErrorKind::ServerError => {
                "Lagi rame nih, coba kirim ulang sebentar lagi ya 🙏".to_string()
            }
            ProviderErrorKind::Timeout | ProviderErrorKind::Network => {
                "Koneksi ke server lagi lambat. Coba kirim ulang ya 🙏".to_string()
            }
            ProviderErrorKind::Auth
            | ProviderErrorKind::Billing
            | ProviderErrorKind::NotFound
            | ProviderErrorKind::Unknown => {
                "Maaf, sistem lagi ada gangguan. Catatanmu belum tersimpan, coba lagi nanti ya 🙏"
                    .to_string()
            }
        }
    }

    /// Whether this error is worth retrying (same request, same model).
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.kind,
            ProviderErrorKind::RateLimit
                | ProviderErrorKind::Timeout
                | ProviderErrorKind::Network
                | ProviderErrorKind::ServerError
        )
    }
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(status) = self.status {
            write!(f, "Provider error ({}, {:?}): {}", status, self.kind, self.message)
        } else {
            write!(f, "Provider error ({:?}): {}", self.kind, self.message)
        }
    }
}

impl std::error::Error for ProviderError {}

/// Try to parse retry_after from a JSON response body.
/// Handles: {"error": {"retry_after": 5}} and {"retry_after": 5}
fn extract_retry_after(body: &str) -> Option<u64> {
    let v: serde_json::Value = serde_json::from_str(body).ok()?;
    v["error"]["retry_after"]
        .as_u64()
        .or_else(|| v["retry_after"].as_u64())
        .or_else(|| {
            // Some providers use a float
            v["error"]["retry_after"]
                .as_f64()
                .or_else(|| v["retry_after"].as_f64())
                .map(|f| f.ceil() as u64)
        })
}

fn truncate_body(body: &str) -> String {
    truncate_str(body, 300)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_are_classified() {
        assert_eq!(ProviderError::from_status(401, "").kind, ProviderErrorKind::Auth);
        assert_eq!(ProviderError::from_status(503, "").kind, ProviderErrorKind::ServerError);
        assert_eq!(ProviderError::from_status(418, "").kind, ProviderErrorKind::Unknown);
    }

    #[test]
    fn rate_limit_reads_retry_after() {
        let err = ProviderError::from_status(429, r#"{"error": {"retry_after": 2.5}}"#);
        assert_eq!(err.kind, ProviderErrorKind::RateLimit);
        assert_eq!(err.retry_after_secs, Some(3));
        assert!(err.is_retryable());
        assert!(!ProviderError::from_status(401, "").is_retryable());
    }

    #[test]
    fn long_bodies_are_truncated_on_char_boundaries() {
        let body = "é".repeat(400);
        let err = ProviderError::from_status(500, &body);
        assert_eq!(err.message.chars().count(), 300);
    }

    #[test]
    fn user_message_hides_details() {
        let err = ProviderError::from_status(401, "invalid key sk-abc");
        assert!(!err.user_message().contains("sk-abc"));
    }
}
