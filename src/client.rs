use crate::checkin::{CheckInRequest, ErrorBody, Invite};
use crate::config::ClientConfig;
use crate::error::CheckInError;
use reqwest::StatusCode;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Submits decoded invite codes to the check-in API
#[derive(Clone)]
pub struct CheckInClient {
    http: reqwest::Client,
    endpoint: String,
    token: String,
}

impl CheckInClient {
    pub fn new(config: &ClientConfig) -> Result<Self, CheckInError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            http,
            endpoint: format!("{}/api/check-in", config.api_base_url.trim_end_matches('/')),
            token: config.token.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Check in the invite identified by `code` and return the updated record
    pub async fn check_in(&self, code: &str) -> Result<Invite, CheckInError> {
        debug!("Submitting code {} to {}", code, self.endpoint);

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.token)
            .json(&CheckInRequest::new(code))
            .send()
            .await?;

        let status = response.status();
        match status {
            StatusCode::OK => {
                let invite: Invite = response.json().await?;
                info!("Invite {} checked in for {}", invite.id, invite.name);
                Ok(invite)
            }
            StatusCode::UNAUTHORIZED => {
                warn!("Check-in API rejected the device token");
                Err(CheckInError::Unauthorized)
            }
            StatusCode::NOT_FOUND => Err(CheckInError::InvalidCode {
                code: code.to_string(),
            }),
            _ => {
                let body = response.text().await.unwrap_or_default();
                let body = serde_json::from_str::<ErrorBody>(&body)
                    .map(|error| error.error)
                    .unwrap_or(body);
                Err(CheckInError::Rejected {
                    status: status.as_u16(),
                    body,
                })
            }
        }
    }
}
