#[cfg(test)]
mod model_tests {
    use super::super::paste::*;
    use chrono::{Duration, Utc};

    fn sample_paste() -> Paste {
        Paste {
            short_id: "aB3x9Z".to_string(),
            user_id: None,
            content_key: "gisty/aB3x9Z.gz".to_string(),
            created_at: Utc::now(),
            expires_at: None,
            syntax_type: "plaintext".to_string(),
            is_private: false,
            burn_after_read: false,
        }
    }

    #[test]
    fn test_paste_without_expiry_never_expires() {
        let paste = sample_paste();
        assert!(!paste.has_expiration());
        assert!(!paste.is_expired());
    }

    #[test]
    fn test_paste_expiry_boundaries() {
        let mut paste = sample_paste();

        paste.expires_at = Some(Utc::now() + Duration::hours(1));
        assert!(paste.has_expiration());
        assert!(!paste.is_expired());

        paste.expires_at = Some(Utc::now() - Duration::seconds(1));
        assert!(paste.is_expired());
    }

    #[test]
    fn test_paste_bincode_roundtrip() {
        let mut paste = sample_paste();
        paste.expires_at = Some(Utc::now() + Duration::minutes(10));
        paste.user_id = Some("u-123".to_string());
        paste.burn_after_read = true;

        let bytes = bincode::serialize(&paste).unwrap();
        let decoded: Paste = bincode::deserialize(&bytes).unwrap();

        assert_eq!(decoded.short_id, paste.short_id);
        assert_eq!(decoded.content_key, paste.content_key);
        assert_eq!(decoded.expires_at, paste.expires_at);
        assert_eq!(decoded.user_id, paste.user_id);
        assert!(decoded.burn_after_read);
    }

    #[test]
    fn test_create_request_defaults() {
        let req: CreatePasteRequest =
            serde_json::from_str(r#"{"content": "hello"}"#).unwrap();

        assert_eq!(req.content, "hello");
        assert_eq!(req.syntax_type, "");
        assert_eq!(req.expires_in, "");
        assert_eq!(req.filename, "");
        assert!(!req.is_private);
    }

    #[test]
    fn test_create_response_omits_absent_expiry() {
        let resp = CreatePasteResponse {
            short_id: "aB3x9Z".to_string(),
            url: "http://localhost:8080/aB3x9Z".to_string(),
            expires_at: None,
        };

        let json = serde_json::to_value(&resp).unwrap();
        assert!(json.get("expires_at").is_none());
    }
}
