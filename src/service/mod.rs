//! The paste lifecycle: create, read, delete, and the purge fan-out.

use crate::{
    cache::Cache,
    db::{blob::BlobDb, Database},
    error::AppError,
    expiry::{self, Expiry},
    models::paste::{CreatePasteRequest, CreatePasteResponse, GetPasteResponse, Paste},
    syntax,
};
use chrono::{DateTime, SecondsFormat, Utc};
use std::sync::Arc;
use std::time::Duration;

/// Maximum allowed content size in bytes (1 MiB).
pub const MAX_CONTENT_SIZE: usize = 1024 * 1024;

/// Orchestrates the key pool, blob store, metadata index and cache. Stateless
/// beyond its shared handles; safe to clone behind an `Arc`.
pub struct PasteService {
    db: Arc<Database>,
    cache: Arc<Cache>,
    base_url: String,
}

impl PasteService {
    pub fn new(db: Arc<Database>, cache: Arc<Cache>, base_url: String) -> Self {
        Self {
            db,
            cache,
            base_url,
        }
    }

    pub fn create_paste(
        &self,
        req: &CreatePasteRequest,
    ) -> Result<CreatePasteResponse, AppError> {
        if req.content.is_empty() {
            return Err(AppError::EmptyContent);
        }
        if req.content.len() > MAX_CONTENT_SIZE {
            return Err(AppError::ContentTooLarge);
        }

        let mut syntax_type = req.syntax_type.trim().to_lowercase();
        if !syntax::is_valid_syntax_type(&syntax_type) {
            return Err(AppError::InvalidSyntaxType);
        }
        if syntax_type.is_empty() {
            let filename = req.filename.trim();
            syntax_type = if filename.is_empty() {
                syntax::detect_language(&req.content)
            } else {
                syntax::detect_language_with_filename(filename, &req.content)
            };
        }

        let (expires_at, burn_after_read) = match expiry::parse_expires_in(&req.expires_in)? {
            Expiry::Never => (None, false),
            Expiry::Burn => (None, true),
            Expiry::At(at) => (Some(at), false),
        };

        let short_id = self.db.keys.reserve()?;

        self.db.blobs.put(&short_id, &req.content)?;

        let paste = Paste {
            short_id: short_id.clone(),
            user_id: None,
            content_key: BlobDb::content_key(&short_id),
            created_at: Utc::now(),
            expires_at,
            syntax_type,
            is_private: req.is_private,
            burn_after_read,
        };

        if let Err(err) = self.db.pastes.create(&paste) {
            // The record never landed; reclaim the orphaned blob.
            if let Err(cleanup_err) = self.db.blobs.delete(&short_id) {
                tracing::warn!("blob cleanup failed for {}: {}", short_id, cleanup_err);
            }
            return Err(err);
        }

        // Warm the cache only after both durable writes have committed.
        if !burn_after_read {
            self.cache.set(
                &short_id,
                &req.content,
                cache_ttl(self.cache.default_ttl(), expires_at),
            );
        }

        Ok(CreatePasteResponse {
            url: format!("{}/{}", self.base_url, short_id),
            expires_at: expires_at.map(format_rfc3339),
            short_id,
        })
    }

    pub fn get_paste(&self, short_id: &str) -> Result<GetPasteResponse, AppError> {
        let paste = self.db.pastes.get(short_id)?.ok_or(AppError::NotFound)?;

        if paste.is_expired() {
            self.spawn_purge(short_id.to_string());
            return Err(AppError::Expired);
        }

        let content = match self.cache.get(short_id) {
            Some(content) => content,
            None => {
                let content = match self.db.blobs.get(short_id) {
                    Ok(content) => content,
                    // A metadata-only remnant is indistinguishable from a miss.
                    Err(AppError::ContentNotFound) => return Err(AppError::NotFound),
                    Err(err) => return Err(err),
                };

                if !paste.burn_after_read {
                    self.cache.set(
                        short_id,
                        &content,
                        cache_ttl(self.cache.default_ttl(), paste.expires_at),
                    );
                }
                content
            }
        };

        if paste.burn_after_read {
            self.spawn_purge(short_id.to_string());
        }

        Ok(GetPasteResponse {
            short_id: paste.short_id,
            content,
            syntax_type: paste.syntax_type,
            created_at: format_rfc3339(paste.created_at),
            expires_at: paste.expires_at.map(format_rfc3339),
        })
    }

    pub fn delete_paste(&self, short_id: &str) -> Result<(), AppError> {
        if self.db.pastes.get(short_id)?.is_none() {
            return Err(AppError::NotFound);
        }
        purge_tiers(&self.db, &self.cache, short_id);
        Ok(())
    }

    /// Detached purge used by the burn and expiry read paths; the reaper
    /// reclaims anything a lost task leaves behind.
    fn spawn_purge(&self, short_id: String) {
        let db = self.db.clone();
        let cache = self.cache.clone();
        tokio::spawn(async move {
            purge_tiers(&db, &cache, &short_id);
        });
    }
}

/// Best-effort removal from every tier, cache first to close the stale-hit
/// window. Errors are logged, never surfaced; every sub-delete is idempotent.
pub fn purge_tiers(db: &Database, cache: &Cache, short_id: &str) {
    cache.delete(short_id);
    if let Err(err) = db.blobs.delete(short_id) {
        tracing::warn!("purge: blob delete failed for {}: {}", short_id, err);
    }
    if let Err(err) = db.pastes.delete(short_id) {
        tracing::warn!("purge: metadata delete failed for {}: {}", short_id, err);
    }
}

/// Cache TTL for a paste: the default, clamped down to the time left before
/// expiry.
fn cache_ttl(default_ttl: Duration, expires_at: Option<DateTime<Utc>>) -> Duration {
    let Some(expires_at) = expires_at else {
        return default_ttl;
    };
    match (expires_at - Utc::now()).to_std() {
        Ok(until_expiry) if until_expiry < default_ttl => until_expiry,
        _ => default_ttl,
    }
}

fn format_rfc3339(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}
