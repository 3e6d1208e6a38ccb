use chrono::{DateTime, Utc};
use uuid::Uuid;

/// A token row as persisted: only the SHA-256 digest of the raw token is stored
#[derive(Debug, Clone)]
pub struct NewToken {
    pub digest: String,
    pub user_id: Uuid,
    pub expires_at: Option<DateTime<Utc>>,
}
