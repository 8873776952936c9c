use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A paste's metadata record. The content itself lives in the blob store
/// under `content_key`; this record is the authoritative entry for the
/// paste's lifecycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paste {
    pub short_id: String,
    pub user_id: Option<String>,
    pub content_key: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub syntax_type: String,
    pub is_private: bool,
    pub burn_after_read: bool,
}

impl Paste {
    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(at) => Utc::now() > at,
            None => false,
        }
    }

    pub fn has_expiration(&self) -> bool {
        self.expires_at.is_some()
    }
}

#[derive(Debug, Deserialize)]
pub struct CreatePasteRequest {
    pub content: String,
    #[serde(default)]
    pub syntax_type: String,
    /// "10m", "1h", "1d", "1w", "never", "burn", or a composite duration.
    #[serde(default)]
    pub expires_in: String,
    /// Optional filename hint for syntax detection.
    #[serde(default)]
    pub filename: String,
    #[serde(default)]
    pub is_private: bool,
}

#[derive(Debug, Serialize)]
pub struct CreatePasteResponse {
    pub short_id: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct GetPasteResponse {
    pub short_id: String,
    pub content: String,
    pub syntax_type: String,
    pub created_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<String>,
}
