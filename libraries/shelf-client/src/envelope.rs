//! Response envelope and the wire shapes it is decoded from.
//!
//! The backend is inconsistent: some endpoints answer with
//! `{status, data, message}`, others with a bare JSON payload, and a few with
//! an empty or plain-text body. Everything is decoded into [`WireBody`] at
//! the HTTP boundary and normalized into a single [`Envelope`].

use crate::error::{ClientError, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Outcome reported by an envelope.
///
/// Status strings other than `success` and `error` are kept as received.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(from = "String", into = "String")]
pub enum Status {
    Success,
    Error,
    Other(String),
}

impl Status {
    fn from_http(success: bool) -> Self {
        if success {
            Self::Success
        } else {
            Self::Error
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
            Self::Other(raw) => raw.as_str(),
        }
    }
}

impl From<String> for Status {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "success" => Self::Success,
            "error" => Self::Error,
            _ => Self::Other(raw),
        }
    }
}

impl From<Status> for String {
    fn from(status: Status) -> Self {
        match status {
            Status::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

/// Normalized response returned by every client call.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Envelope {
    pub status: Status,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Any other top-level members of an enveloped response, as received
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Envelope {
    /// Wrap a bare payload as a successful response.
    pub fn success(data: Option<Value>) -> Self {
        Self {
            status: Status::Success,
            data,
            message: None,
            extra: Map::new(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == Status::Success
    }

    /// Look up a field of an object-shaped `data`, falling back to the
    /// members that sat next to `status` (e.g. `{"status": .., "users": ..}`).
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.data
            .as_ref()
            .and_then(|data| data.get(key))
            .or_else(|| self.extra.get(key))
    }

    /// String view of a `data` field, accepting numbers as well.
    ///
    /// Ids come back as integers from some endpoints and strings from others.
    pub fn field_string(&self, key: &str) -> Option<String> {
        match self.field(key)? {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    /// Deserialize `data` into a concrete type.
    pub fn data_as<T: DeserializeOwned>(&self) -> Result<T> {
        let data = self.data.clone().unwrap_or(Value::Null);
        serde_json::from_value(data).map_err(|e| ClientError::Parse(e.to_string()))
    }
}

/// Body of an HTTP response, classified once at the boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum WireBody {
    /// Object carrying at least one of `status`, `data`, `message`
    Enveloped {
        status: Option<String>,
        data: Option<Value>,
        message: Option<String>,
        raw: Value,
    },
    /// Any other JSON value
    Bare(Value),
    /// Non-empty body that was not JSON
    Text(String),
    /// No body, or a JSON content type whose body failed to parse
    Empty,
}

impl WireBody {
    /// Classify a response body using its content type.
    pub fn decode(content_type: Option<&str>, bytes: &[u8]) -> Self {
        let is_json = content_type.is_some_and(|ct| ct.contains("application/json"));

        if is_json {
            return match serde_json::from_slice::<Value>(bytes) {
                Ok(value) => Self::from_json(value),
                Err(_) => Self::Empty,
            };
        }

        match String::from_utf8_lossy(bytes) {
            text if text.is_empty() => Self::Empty,
            text => Self::Text(text.into_owned()),
        }
    }

    fn from_json(value: Value) -> Self {
        match value {
            Value::Object(map) if is_envelope(&map) => Self::Enveloped {
                status: map.get("status").and_then(Value::as_str).map(str::to_string),
                data: map.get("data").filter(|v| !v.is_null()).cloned(),
                message: map.get("message").and_then(Value::as_str).map(str::to_string),
                raw: Value::Object(map),
            },
            Value::Null => Self::Empty,
            other => Self::Bare(other),
        }
    }

    /// Server-provided message, if the body carried one.
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Enveloped { message, .. } => message.as_deref(),
            _ => None,
        }
    }

    /// The parsed payload as received, for error reporting.
    pub fn into_raw(self) -> Option<Value> {
        match self {
            Self::Enveloped { raw, .. } => Some(raw),
            Self::Bare(value) => Some(value),
            Self::Text(text) => Some(Value::String(text)),
            Self::Empty => None,
        }
    }

    /// Normalize into an envelope; `http_success` fills in a missing status.
    pub fn into_envelope(self, http_success: bool) -> Envelope {
        let (status, data, message, extra) = match self {
            Self::Enveloped {
                status,
                data,
                message,
                raw,
            } => {
                let mut extra = match raw {
                    Value::Object(map) => map,
                    _ => Map::new(),
                };
                extra.remove("status");
                extra.remove("data");
                // A non-string message stays with the other members.
                if message.is_some() || extra.get("message").is_some_and(Value::is_null) {
                    extra.remove("message");
                }
                (status.map(Status::from), data, message, extra)
            }
            Self::Bare(value) => (None, Some(value), None, Map::new()),
            Self::Text(text) => (None, Some(Value::String(text)), None, Map::new()),
            Self::Empty => (None, None, None, Map::new()),
        };

        Envelope {
            status: status.unwrap_or_else(|| Status::from_http(http_success)),
            data,
            message,
            extra,
        }
    }
}

fn is_envelope(map: &Map<String, Value>) -> bool {
    ["status", "data", "message"]
        .iter()
        .any(|key| map.contains_key(*key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const JSON: Option<&str> = Some("application/json; charset=utf-8");

    fn decode(value: &Value) -> WireBody {
        WireBody::decode(JSON, value.to_string().as_bytes())
    }

    #[test]
    fn test_bare_payload_is_wrapped() {
        let envelope = decode(&json!([{"id": 1}, {"id": 2}])).into_envelope(true);

        assert_eq!(envelope.status, Status::Success);
        assert_eq!(envelope.data, Some(json!([{"id": 1}, {"id": 2}])));
        assert!(envelope.message.is_none());
    }

    #[test]
    fn test_enveloped_payload_passes_through() {
        let envelope = decode(&json!({
            "status": "success",
            "data": {"books": []},
            "message": "ok"
        }))
        .into_envelope(true);

        assert_eq!(envelope.status, Status::Success);
        assert_eq!(envelope.field("books"), Some(&json!([])));
        assert_eq!(envelope.message.as_deref(), Some("ok"));
    }

    #[test]
    fn test_enveloped_members_survive() {
        let raw = json!({
            "status": "success",
            "users": [{"id": 1}],
            "total": 1
        });
        let envelope = decode(&raw).into_envelope(true);

        assert!(envelope.data.is_none());
        assert_eq!(envelope.field("total"), Some(&json!(1)));
        assert_eq!(serde_json::to_value(&envelope).unwrap(), raw);
    }

    #[test]
    fn test_unknown_status_is_kept() {
        let envelope = decode(&json!({"status": "partial", "data": [1]})).into_envelope(true);

        assert_eq!(envelope.status, Status::Other("partial".into()));
        assert!(!envelope.is_success());
        assert_eq!(
            serde_json::to_value(&envelope).unwrap(),
            json!({"status": "partial", "data": [1]})
        );
    }

    #[test]
    fn test_non_string_message_is_kept() {
        let envelope = decode(&json!({
            "status": "error",
            "message": {"email": "taken"}
        }))
        .into_envelope(false);

        assert_eq!(envelope.status, Status::Error);
        assert!(envelope.message.is_none());
        assert_eq!(envelope.extra.get("message"), Some(&json!({"email": "taken"})));
    }

    #[test]
    fn test_envelope_without_status_infers_from_http() {
        let body = decode(&json!({"data": {"access_token": "AT"}}));
        assert!(matches!(body, WireBody::Enveloped { .. }));

        let envelope = body.into_envelope(true);
        assert!(envelope.is_success());
        assert_eq!(envelope.field_string("access_token").as_deref(), Some("AT"));
    }

    #[test]
    fn test_object_without_envelope_keys_is_bare() {
        let body = decode(&json!({"total_books": 12}));
        assert_eq!(body, WireBody::Bare(json!({"total_books": 12})));
    }

    #[test]
    fn test_text_body() {
        let body = WireBody::decode(Some("text/html"), b"<h1>hi</h1>");
        assert_eq!(body, WireBody::Text("<h1>hi</h1>".into()));

        let envelope = body.into_envelope(true);
        assert_eq!(envelope.data, Some(json!("<h1>hi</h1>")));
    }

    #[test]
    fn test_empty_and_malformed_bodies() {
        assert_eq!(WireBody::decode(None, b""), WireBody::Empty);
        assert_eq!(WireBody::decode(JSON, b"{not json"), WireBody::Empty);

        let envelope = WireBody::Empty.into_envelope(true);
        assert!(envelope.is_success());
        assert!(envelope.data.is_none());
    }

    #[test]
    fn test_error_message_and_raw() {
        let body = decode(&json!({"status": "error", "message": "Invalid credentials"}));
        assert_eq!(body.message(), Some("Invalid credentials"));
        assert_eq!(
            body.into_raw(),
            Some(json!({"status": "error", "message": "Invalid credentials"}))
        );
    }

    #[test]
    fn test_field_string_accepts_numbers() {
        let envelope = Envelope::success(Some(json!({"user_id": 7, "role": ""})));
        assert_eq!(envelope.field_string("user_id").as_deref(), Some("7"));
        assert!(envelope.field_string("role").is_none());
        assert!(envelope.field_string("missing").is_none());
    }

    #[test]
    fn test_data_as() {
        #[derive(Deserialize)]
        struct Stats {
            total: u32,
        }

        let envelope = Envelope::success(Some(json!({"total": 3})));
        let stats: Stats = envelope.data_as().unwrap();
        assert_eq!(stats.total, 3);

        let bad = Envelope::success(Some(json!("nope")));
        assert!(matches!(bad.data_as::<Stats>(), Err(ClientError::Parse(_))));
    }
}
