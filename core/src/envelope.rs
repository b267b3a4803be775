//! Backend envelopes and the tagged result of a call.
//!
//! # Design
//! The two backends wrap their payloads differently. The primary backend
//! uses `{errorCode, errorMsg, ...}`; third-party feeds use `{code, ...}`.
//! Callers pick the decoding rule with an explicit `Backend` rather than the
//! client sniffing the URL. Only the status fields are decoded into typed
//! structs, the payload stays a `serde_json::Value` and is handed back whole.

use serde_json::Value;

use crate::error::RequestError;

/// Which envelope shape the target host speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    /// `{errorCode, errorMsg, ...}`; failures yield no payload.
    Primary,
    /// `{code, ...}`; failures yield the fallback fixture.
    Other,
}

impl Backend {
    /// Classify `url` by whether it starts with the primary base address.
    pub fn for_url(url: &str, primary_base_url: &str) -> Self {
        if url.starts_with(primary_base_url) {
            Backend::Primary
        } else {
            Backend::Other
        }
    }
}

/// Status fields of a primary backend envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrimaryStatus {
    pub error_code: Option<i64>,
    pub error_msg: Option<String>,
}

impl PrimaryStatus {
    /// Missing or non-numeric fields decode as absent.
    pub fn of(envelope: &Value) -> Self {
        PrimaryStatus {
            error_code: envelope.get("errorCode").and_then(Value::as_i64),
            error_msg: envelope
                .get("errorMsg")
                .and_then(Value::as_str)
                .map(str::to_string),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error_code == Some(0)
    }
}

/// Status field of a third-party feed envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedStatus {
    pub code: Option<i64>,
}

impl FeedStatus {
    pub fn of(envelope: &Value) -> Self {
        FeedStatus {
            code: envelope.get("code").and_then(Value::as_i64),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.code == Some(0)
    }
}

/// Outcome of a `get` or `post` call. Calls never fail with `Err`; the
/// failure kind travels inside this value instead.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolved {
    /// The backend's own envelope. For the primary backend this includes
    /// envelopes with a non-zero `errorCode`.
    Live(Value),
    /// The fallback fixture, substituted because of `reason`.
    Fallback { payload: Value, reason: RequestError },
    /// Nothing usable came back.
    Failed(RequestError),
}

impl Resolved {
    pub fn payload(&self) -> Option<&Value> {
        match self {
            Resolved::Live(v) | Resolved::Fallback { payload: v, .. } => Some(v),
            Resolved::Failed(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&RequestError> {
        match self {
            Resolved::Live(_) => None,
            Resolved::Fallback { reason, .. } => Some(reason),
            Resolved::Failed(err) => Some(err),
        }
    }

    pub fn is_live(&self) -> bool {
        matches!(self, Resolved::Live(_))
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Resolved::Fallback { .. })
    }

    /// The always-resolves shape older UI code expects: the envelope or the
    /// fixture, or `None` where it used to receive `undefined`.
    pub fn into_legacy(self) -> Option<Value> {
        match self {
            Resolved::Live(v) | Resolved::Fallback { payload: v, .. } => Some(v),
            Resolved::Failed(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn backend_is_detected_by_prefix() {
        let base = "https://www.wanandroid.com/";
        assert_eq!(
            Backend::for_url("https://www.wanandroid.com/article/list/0/json", base),
            Backend::Primary
        );
        assert_eq!(Backend::for_url("https://c.y.qq.com/musichall/focus", base), Backend::Other);
        assert_eq!(Backend::for_url("http://www.wanandroid.com/x", base), Backend::Other);
    }

    #[test]
    fn primary_status_reads_error_fields() {
        let status = PrimaryStatus::of(&json!({"errorCode": 7, "errorMsg": "bad", "data": null}));
        assert_eq!(status.error_code, Some(7));
        assert_eq!(status.error_msg.as_deref(), Some("bad"));
        assert!(!status.is_ok());
        assert!(PrimaryStatus::of(&json!({"errorCode": 0})).is_ok());
    }

    #[test]
    fn missing_codes_are_not_ok() {
        assert!(!PrimaryStatus::of(&json!({"data": 1})).is_ok());
        assert!(!FeedStatus::of(&json!({"code": "0"})).is_ok());
        assert!(!FeedStatus::of(&json!([])).is_ok());
        assert!(FeedStatus::of(&json!({"code": 0})).is_ok());
    }

    #[test]
    fn legacy_shape_drops_failures() {
        let live = Resolved::Live(json!({"errorCode": 0}));
        assert_eq!(live.clone().into_legacy(), Some(json!({"errorCode": 0})));
        assert!(live.failure().is_none());

        let fallback = Resolved::Fallback {
            payload: json!({"code": 0}),
            reason: RequestError::Rejected { code: Some(1) },
        };
        assert_eq!(fallback.failure(), Some(&RequestError::Rejected { code: Some(1) }));
        assert_eq!(fallback.into_legacy(), Some(json!({"code": 0})));

        let failed = Resolved::Failed(RequestError::HttpStatus { status: 503 });
        assert!(failed.payload().is_none());
        assert_eq!(failed.into_legacy(), None);
    }
}
