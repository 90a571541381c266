use super::model::Invite;
use crate::error::StoreError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info};

/// Persistence for invites, injected into the check-in server
#[async_trait]
pub trait InviteStore: Send + Sync {
    /// Look up an invite by its code
    async fn find(&self, code: &str) -> Result<Option<Invite>, StoreError>;

    /// Mark the invite checked in at `at` and return the updated record.
    /// `None` when no invite has that code.
    async fn check_in(&self, code: &str, at: DateTime<Utc>) -> Result<Option<Invite>, StoreError>;

    /// Number of invites held
    async fn count(&self) -> Result<usize, StoreError>;
}

/// In-memory invite store
#[derive(Default)]
pub struct MemoryInviteStore {
    invites: RwLock<HashMap<String, Invite>>,
}

impl MemoryInviteStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_invites<I>(invites: I) -> Self
    where
        I: IntoIterator<Item = Invite>,
    {
        let invites = invites
            .into_iter()
            .map(|invite| (invite.id.clone(), invite))
            .collect();
        Self {
            invites: RwLock::new(invites),
        }
    }

    /// Store seeded with the demo invites used by the kiosk out of the box
    pub fn sample() -> Self {
        Self::with_invites(vec![
            sample_invite(
                "INVITE-49XA1KD",
                "John Doe",
                "john.doe@example.com",
                "VIP",
                false,
            ),
            sample_invite(
                "INVITE-ABC123X",
                "Jane Smith",
                "jane.smith@example.com",
                "General",
                true,
            ),
            sample_invite(
                "INVITE-XYZ789P",
                "Mike Johnson",
                "mike.johnson@example.com",
                "Speaker",
                false,
            ),
        ])
    }

    /// Load invites from a JSON array file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let path_str = path.display().to_string();

        let contents = std::fs::read_to_string(path).map_err(|source| StoreError::Load {
            path: path_str.clone(),
            source,
        })?;
        let invites: Vec<Invite> =
            serde_json::from_str(&contents).map_err(|source| StoreError::Parse {
                path: path_str.clone(),
                source,
            })?;

        info!("Loaded {} invites from {}", invites.len(), path_str);
        Ok(Self::with_invites(invites))
    }
}

fn sample_invite(id: &str, name: &str, email: &str, ticket_type: &str, checked_in: bool) -> Invite {
    Invite {
        id: id.to_string(),
        name: name.to_string(),
        email: email.to_string(),
        event: "Tech Conference 2024".to_string(),
        ticket_type: ticket_type.to_string(),
        checked_in,
        timestamp: None,
    }
}

#[async_trait]
impl InviteStore for MemoryInviteStore {
    async fn find(&self, code: &str) -> Result<Option<Invite>, StoreError> {
        Ok(self.invites.read().get(code).cloned())
    }

    async fn check_in(&self, code: &str, at: DateTime<Utc>) -> Result<Option<Invite>, StoreError> {
        let mut invites = self.invites.write();
        let Some(invite) = invites.get_mut(code) else {
            return Ok(None);
        };

        if invite.checked_in {
            debug!("Invite {} was already checked in; refreshing timestamp", code);
        }
        invite.checked_in = true;
        invite.timestamp = Some(at);

        Ok(Some(invite.clone()))
    }

    async fn count(&self) -> Result<usize, StoreError> {
        Ok(self.invites.read().len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn test_sample_store() {
        let store = MemoryInviteStore::sample();
        assert_eq!(store.count().await.unwrap(), 3);

        let jane = store.find("INVITE-ABC123X").await.unwrap().unwrap();
        assert_eq!(jane.name, "Jane Smith");
        assert!(jane.checked_in);

        assert!(store.find("INVITE-NOPE").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_check_in_persists() {
        let store = MemoryInviteStore::sample();
        let at = Utc::now();

        let updated = store.check_in("INVITE-49XA1KD", at).await.unwrap().unwrap();
        assert!(updated.checked_in);
        assert_eq!(updated.timestamp, Some(at));

        let stored = store.find("INVITE-49XA1KD").await.unwrap().unwrap();
        assert_eq!(stored, updated);

        assert!(store.check_in("INVITE-NOPE", at).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_stores_are_independent() {
        let first = MemoryInviteStore::sample();
        let second = MemoryInviteStore::sample();

        first.check_in("INVITE-XYZ789P", Utc::now()).await.unwrap();

        let untouched = second.find("INVITE-XYZ789P").await.unwrap().unwrap();
        assert!(!untouched.checked_in);
    }

    #[tokio::test]
    async fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"id":"INVITE-1","name":"Ada","email":"ada@example.com","event":"Expo","type":"VIP","checkedIn":false}}]"#
        )
        .unwrap();

        let store = MemoryInviteStore::load_from_file(file.path()).unwrap();
        assert_eq!(store.count().await.unwrap(), 1);
        assert_eq!(store.find("INVITE-1").await.unwrap().unwrap().name, "Ada");
    }

    #[test]
    fn test_load_errors() {
        assert!(matches!(
            MemoryInviteStore::load_from_file("/nonexistent/invites.json"),
            Err(StoreError::Load { .. })
        ));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        assert!(matches!(
            MemoryInviteStore::load_from_file(file.path()),
            Err(StoreError::Parse { .. })
        ));
    }
}
