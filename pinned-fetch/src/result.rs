use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
/// Transport-level failures, phrased for end users.
pub enum FetchError {
    #[error("request timed out")]
    Timeout,
    /// Covers pin mismatches and failed trust evaluation alike.
    #[error("server authentication failed")]
    ServerAuthentication,
    #[error("transport error: {0}")]
    Transport(String),
}

impl FetchError {
    pub fn classify(err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            return FetchError::Timeout;
        }
        if caused_by_tls(err) {
            return FetchError::ServerAuthentication;
        }
        FetchError::Transport(err.to_string())
    }
}

/// Walks the source chain looking for a rustls error, including ones wrapped in `io::Error`.
fn caused_by_tls(err: &reqwest::Error) -> bool {
    let mut source = std::error::Error::source(err);
    while let Some(e) = source {
        if e.downcast_ref::<rustls::Error>().is_some() {
            return true;
        }
        if let Some(io) = e.downcast_ref::<std::io::Error>() {
            if io
                .get_ref()
                .is_some_and(|inner| inner.downcast_ref::<rustls::Error>().is_some())
            {
                return true;
            }
        }
        source = e.source();
    }
    false
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
/// Outcome of one fetch. `status_code` is 0 whenever the fetch is not a success
/// but the server reported 2xx, or no response arrived at all.
pub struct FetchResult {
    pub status_code: u16,
    pub body: Vec<u8>,
    pub message: String,
    pub timed_out: bool,
}

impl FetchResult {
    /// Builds the result for a received response. A `Content-Length` that
    /// disagrees with the body turns a 2xx into a failure.
    pub fn from_response(status: StatusCode, content_length: Option<u64>, body: Vec<u8>) -> Self {
        let mut result = FetchResult {
            status_code: status.as_u16(),
            body,
            ..Default::default()
        };

        let length_ok = content_length.map_or(true, |expected| expected == result.body.len() as u64);
        if result.success() && length_ok {
            return result;
        }

        if result.success() {
            result.status_code = 0;
            result.message = format!(
                "received {} bytes, expected {}",
                result.body.len(),
                content_length.unwrap_or_default()
            );
        } else {
            result.message = status
                .canonical_reason()
                .unwrap_or("unknown status")
                .to_string();
        }
        result
    }

    pub fn from_error(err: FetchError) -> Self {
        FetchResult {
            timed_out: matches!(err, FetchError::Timeout),
            message: err.to_string(),
            ..Default::default()
        }
    }

    pub fn success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }

    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status_code)
    }

    pub fn body_utf8(&self) -> Option<&str> {
        std::str::from_utf8(&self.body).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ok_response_without_length_header() {
        let result = FetchResult::from_response(StatusCode::OK, None, b"hello".to_vec());
        assert!(result.success());
        assert_eq!(result.body_utf8(), Some("hello"));
        assert!(result.message.is_empty());
    }

    #[test]
    fn ok_response_with_matching_length() {
        let result = FetchResult::from_response(StatusCode::CREATED, Some(5), b"hello".to_vec());
        assert!(result.success());
        assert_eq!(result.status_code, 201);
    }

    #[test]
    fn short_body_fails_a_2xx() {
        let result = FetchResult::from_response(StatusCode::OK, Some(10), b"hello".to_vec());
        assert!(!result.success());
        assert_eq!(result.status_code, 0);
        assert_eq!(result.message, "received 5 bytes, expected 10");
        assert!(!result.timed_out);
    }

    #[test]
    fn client_error_keeps_status_and_reason() {
        let result = FetchResult::from_response(StatusCode::NOT_FOUND, Some(0), Vec::new());
        assert!(result.is_client_error());
        assert_eq!(result.status_code, 404);
        assert_eq!(result.message, "Not Found");
    }

    #[test]
    fn server_error_is_not_client_error() {
        let result = FetchResult::from_response(StatusCode::BAD_GATEWAY, None, Vec::new());
        assert!(!result.success());
        assert!(!result.is_client_error());
        assert_eq!(result.message, "Bad Gateway");
    }

    #[test]
    fn timeout_sets_flag() {
        let result = FetchResult::from_error(FetchError::Timeout);
        assert!(result.timed_out);
        assert_eq!(result.status_code, 0);
        assert_eq!(result.message, "request timed out");
    }

    #[test]
    fn authentication_failure_is_generic() {
        let result = FetchResult::from_error(FetchError::ServerAuthentication);
        assert!(!result.timed_out);
        assert_eq!(result.message, "server authentication failed");
    }

    #[test]
    fn binary_body_has_no_utf8_view() {
        let result = FetchResult::from_response(StatusCode::OK, None, vec![0xff, 0xfe]);
        assert_eq!(result.body_utf8(), None);
    }
}
