use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An event invitation as served by the check-in endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invite {
    pub id: String,
    pub name: String,
    pub email: String,
    pub event: String,
    /// Ticket type: VIP, General, Speaker, ...
    #[serde(rename = "type")]
    pub ticket_type: String,
    pub checked_in: bool,
    /// When the invite was last checked in
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl Invite {
    /// One-line attendee summary for the kiosk operator
    pub fn summary(&self) -> String {
        let checked_in_at = self
            .timestamp
            .map(|at| at.format("%Y-%m-%d %H:%M:%S UTC").to_string())
            .unwrap_or_else(|| "not checked in".to_string());

        format!(
            "{} <{}> | {} | {} | {} | {}",
            self.name, self.email, self.event, self.ticket_type, self.id, checked_in_at
        )
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CheckInRequest {
    #[serde(default)]
    pub code: Option<String>,
}

impl CheckInRequest {
    pub fn new<S: Into<String>>(code: S) -> Self {
        Self {
            code: Some(code.into()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub fn new<S: Into<String>>(error: S) -> Self {
        Self {
            error: error.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_invite_wire_format() {
        let invite = Invite {
            id: "INVITE-49XA1KD".to_string(),
            name: "John Doe".to_string(),
            email: "john.doe@example.com".to_string(),
            event: "Tech Conference 2024".to_string(),
            ticket_type: "VIP".to_string(),
            checked_in: true,
            timestamp: Some(Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap()),
        };

        let json = serde_json::to_value(&invite).unwrap();
        assert_eq!(json["type"], "VIP");
        assert_eq!(json["checkedIn"], true);
        assert_eq!(json["timestamp"], "2024-05-01T09:30:00Z");

        let parsed: Invite = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, invite);
        assert!(invite.summary().contains("2024-05-01 09:30:00 UTC"));
    }

    #[test]
    fn test_invite_without_timestamp() {
        let json = r#"{"id":"A","name":"N","email":"e","event":"E","type":"General","checkedIn":false}"#;
        let invite: Invite = serde_json::from_str(json).unwrap();

        assert!(invite.timestamp.is_none());
        assert!(!serde_json::to_string(&invite).unwrap().contains("timestamp"));
        assert!(invite.summary().ends_with("not checked in"));
    }

    #[test]
    fn test_request_code_is_optional() {
        let request: CheckInRequest = serde_json::from_str("{}").unwrap();
        assert!(request.code.is_none());

        let request: CheckInRequest = serde_json::from_str(r#"{"code":"X"}"#).unwrap();
        assert_eq!(request.code.as_deref(), Some("X"));
    }
}
