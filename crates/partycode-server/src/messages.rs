//! HTTP request and response bodies

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use partycode_core::PartyCode;

/// Body of a create request
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CreateRequest {
    /// Peer id to register, kept raw so a wrong type is a validation error
    #[serde(default)]
    pub peer_id: Option<Value>,
}

impl CreateRequest {
    /// The peer id if it is a non-empty string
    pub fn peer_id(&self) -> Option<&str> {
        match &self.peer_id {
            Some(Value::String(id)) if !id.is_empty() => Some(id.as_str()),
            _ => None,
        }
    }
}

/// Issued code
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CreateResponse {
    pub code: String,
    pub peer_id: String,
    pub expires_at: DateTime<Utc>,
}

impl From<PartyCode> for CreateResponse {
    fn from(entry: PartyCode) -> Self {
        Self {
            code: entry.code,
            peer_id: entry.peer_id,
            expires_at: entry.expires_at,
        }
    }
}

/// Peer behind a resolved code
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LookupResponse {
    pub peer_id: String,
}

/// Error body
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Health check body
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    /// Entries currently stored, including expired ones not yet swept
    pub codes: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_request_parsing() {
        let req: CreateRequest = serde_json::from_str(r#"{"peer_id":"peer-123"}"#).unwrap();
        assert_eq!(req.peer_id(), Some("peer-123"));

        for body in [
            "{}",
            r#"{"peer_id":null}"#,
            r#"{"peer_id":""}"#,
            r#"{"peer_id":42}"#,
            r#"{"peer_id":["a"]}"#,
            r#"{"peer_id":{"id":"a"}}"#,
        ] {
            let req: CreateRequest = serde_json::from_str(body).unwrap();
            assert!(req.peer_id().is_none(), "accepted {}", body);
        }
    }

    #[test]
    fn test_create_response_fields() {
        let created = DateTime::parse_from_rfc3339("2024-05-01T10:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let entry = PartyCode::new("AB3DEF".into(), "peer-123".into(), created);

        let json = serde_json::to_value(CreateResponse::from(entry)).unwrap();
        assert_eq!(json["code"], "AB3DEF");
        assert_eq!(json["peer_id"], "peer-123");
        assert_eq!(json["expires_at"], "2024-05-01T12:00:00Z");
        assert!(json.get("created_at").is_none());
    }
}
