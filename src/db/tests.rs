//! Database integration tests.

#[cfg(test)]
mod db_tests {
    use super::super::*;
    use crate::models::paste::Paste;
    use chrono::{Duration, Utc};
    use tempfile::TempDir;

    fn setup_test_db() -> (Database, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");
        let db = Database::new(db_path.to_str().unwrap()).unwrap();
        (db, temp_dir)
    }

    fn sample_paste(short_id: &str, expires_at: Option<chrono::DateTime<Utc>>) -> Paste {
        Paste {
            short_id: short_id.to_string(),
            user_id: None,
            content_key: blob::BlobDb::content_key(short_id),
            created_at: Utc::now(),
            expires_at,
            syntax_type: "plaintext".to_string(),
            is_private: false,
            burn_after_read: false,
        }
    }

    #[test]
    fn test_create_database() {
        let (db, _temp) = setup_test_db();
        assert!(db.flush().is_ok());
    }

    #[test]
    fn test_paste_create_and_get() {
        let (db, _temp) = setup_test_db();

        let paste = sample_paste("aB3x9Z", Some(Utc::now() + Duration::hours(1)));
        db.pastes.create(&paste).unwrap();

        let retrieved = db.pastes.get("aB3x9Z").unwrap().unwrap();
        assert_eq!(retrieved.short_id, "aB3x9Z");
        assert_eq!(retrieved.content_key, "gisty/aB3x9Z.gz");
        assert_eq!(retrieved.expires_at, paste.expires_at);

        assert!(db.pastes.get("missing").unwrap().is_none());
    }

    #[test]
    fn test_paste_duplicate_insert_is_rejected() {
        let (db, _temp) = setup_test_db();

        let paste = sample_paste("aB3x9Z", None);
        db.pastes.create(&paste).unwrap();

        assert!(matches!(
            db.pastes.create(&paste),
            Err(crate::error::AppError::Duplicate)
        ));
    }

    #[test]
    fn test_paste_delete() {
        let (db, _temp) = setup_test_db();

        let paste = sample_paste("aB3x9Z", Some(Utc::now() - Duration::hours(1)));
        db.pastes.create(&paste).unwrap();

        assert!(db.pastes.delete("aB3x9Z").unwrap());
        assert!(db.pastes.get("aB3x9Z").unwrap().is_none());
        // The expiry index entry goes with the record.
        assert_eq!(db.pastes.count_expired().unwrap(), 0);

        assert!(!db.pastes.delete("aB3x9Z").unwrap());
    }

    #[test]
    fn test_paste_delete_many() {
        let (db, _temp) = setup_test_db();

        for i in 0..5 {
            db.pastes
                .create(&sample_paste(&format!("aaaaa{}", i), None))
                .unwrap();
        }

        let ids = vec![
            "aaaaa0".to_string(),
            "aaaaa1".to_string(),
            "missing".to_string(),
        ];
        assert_eq!(db.pastes.delete_many(&ids).unwrap(), 2);
        assert!(db.pastes.get("aaaaa2").unwrap().is_some());
    }

    #[test]
    fn test_expired_batch_only_returns_past_deadlines() {
        let (db, _temp) = setup_test_db();

        db.pastes
            .create(&sample_paste("old001", Some(Utc::now() - Duration::hours(1))))
            .unwrap();
        db.pastes
            .create(&sample_paste("old002", Some(Utc::now() - Duration::minutes(5))))
            .unwrap();
        db.pastes
            .create(&sample_paste("new001", Some(Utc::now() + Duration::hours(1))))
            .unwrap();
        db.pastes.create(&sample_paste("forever", None)).unwrap();

        let batch = db.pastes.get_expired_batch(10).unwrap();
        let mut ids: Vec<&str> = batch.iter().map(|p| p.short_id.as_str()).collect();
        ids.sort();
        assert_eq!(ids, ["old001", "old002"]);

        assert_eq!(db.pastes.count_expired().unwrap(), 2);
    }

    #[test]
    fn test_expired_batch_respects_limit() {
        let (db, _temp) = setup_test_db();

        for i in 0..7 {
            db.pastes
                .create(&sample_paste(
                    &format!("old{:03}", i),
                    Some(Utc::now() - Duration::minutes(i + 1)),
                ))
                .unwrap();
        }

        assert_eq!(db.pastes.get_expired_batch(3).unwrap().len(), 3);
        assert_eq!(db.pastes.get_expired_batch(100).unwrap().len(), 7);
    }

    #[test]
    fn test_keys_generate_and_reserve() {
        let (db, _temp) = setup_test_db();

        let generated = db.keys.generate(50).unwrap();
        assert!(generated > 0 && generated <= 50);
        assert_eq!(db.keys.count_unused(), generated);
        assert_eq!(db.keys.count_total(), generated);

        let key = db.keys.reserve().unwrap();
        assert_eq!(key.len(), 6);
        assert_eq!(db.keys.count_unused(), generated - 1);
        // Reserved keys move to the used ledger, they are not dropped.
        assert_eq!(db.keys.count_total(), generated);
    }

    #[test]
    fn test_keys_reserve_is_unique_until_exhausted() {
        let (db, _temp) = setup_test_db();

        let generated = db.keys.generate(20).unwrap();
        let mut seen = std::collections::HashSet::new();
        for _ in 0..generated {
            assert!(seen.insert(db.keys.reserve().unwrap()));
        }

        assert!(matches!(
            db.keys.reserve(),
            Err(crate::error::AppError::NoKeysAvailable)
        ));
    }

    #[test]
    fn test_keys_concurrent_reserve_hands_out_distinct_keys() {
        let (db, _temp) = setup_test_db();
        let db = std::sync::Arc::new(db);

        db.keys.generate(64).unwrap();

        let mut handles = Vec::new();
        for _ in 0..8 {
            let db = db.clone();
            handles.push(std::thread::spawn(move || {
                let mut keys = Vec::new();
                for _ in 0..8 {
                    keys.push(db.keys.reserve().unwrap());
                }
                keys
            }));
        }

        let mut all: Vec<String> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        let total = all.len();
        all.sort();
        all.dedup();
        assert_eq!(all.len(), total, "duplicate keys were handed out");
    }

    #[test]
    fn test_blob_roundtrip_and_missing() {
        let (db, _temp) = setup_test_db();

        db.blobs.put("aB3x9Z", "hello ☃ world").unwrap();
        assert!(db.blobs.exists("aB3x9Z").unwrap());
        assert_eq!(db.blobs.get("aB3x9Z").unwrap(), "hello ☃ world");

        assert!(matches!(
            db.blobs.get("missing"),
            Err(crate::error::AppError::ContentNotFound)
        ));
    }

    #[test]
    fn test_blob_delete_is_idempotent() {
        let (db, _temp) = setup_test_db();

        db.blobs.put("aB3x9Z", "data").unwrap();
        db.blobs.delete("aB3x9Z").unwrap();
        assert!(!db.blobs.exists("aB3x9Z").unwrap());

        // Deleting again is fine.
        db.blobs.delete("aB3x9Z").unwrap();
    }

    #[test]
    fn test_database_flush() {
        let (db, _temp) = setup_test_db();

        db.pastes.create(&sample_paste("aB3x9Z", None)).unwrap();
        assert!(db.flush().is_ok());
    }
}
