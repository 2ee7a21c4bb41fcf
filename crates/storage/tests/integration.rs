//! Integration tests for the storage crate.
//!
//! Uses in-memory SQLite for fast, isolated tests, and a temp dir where the
//! file itself matters.

use salute_storage::{
    Database, MemoryBackend, StorageError, TemplateBackend, TemplateStore, TEMPLATE_KEY,
};
use salute_template::{Direction, Template};
use std::sync::Arc;

fn create_test_db() -> Database {
    Database::open_in_memory().expect("Failed to create in-memory database")
}

// =============================================================================
// Database Initialization Tests
// =============================================================================

mod initialization {
    use super::*;
    use std::path::PathBuf;
    use tempfile::tempdir;

    #[test]
    fn test_open_in_memory() {
        let db = Database::open_in_memory();
        assert!(db.is_ok(), "Should create in-memory database");
    }

    #[test]
    fn test_open_file_database() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");

        let db = Database::open(&db_path);
        assert!(db.is_ok(), "Should create file-based database");
        assert!(db_path.exists(), "Database file should exist");
    }

    #[tokio::test]
    async fn test_reopen_existing_database() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");

        {
            let db = Database::open(&db_path).unwrap();
            db.store("Persisted <name>").await.unwrap();
        }

        {
            let db = Database::open(&db_path).unwrap();
            assert_eq!(
                db.load().await.unwrap(),
                Some("Persisted <name>".to_string()),
                "Template should persist after reopen"
            );
        }
    }

    #[test]
    fn test_invalid_path_fails() {
        let result = Database::open(&PathBuf::from("/nonexistent/path/db.sqlite"));
        assert!(matches!(result, Err(StorageError::Database(_))));
    }
}

// =============================================================================
// Template Slot Tests
// =============================================================================

mod slot {
    use super::*;

    #[tokio::test]
    async fn test_empty_database_has_no_template() {
        let db = create_test_db();
        assert_eq!(db.load().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_store_overwrites() {
        let db = create_test_db();
        db.store("first <name>").await.unwrap();
        db.store("second <name>").await.unwrap();

        assert_eq!(db.load().await.unwrap(), Some("second <name>".to_string()));
    }

    #[tokio::test]
    async fn test_template_lives_under_its_key() {
        let db = create_test_db();
        db.store("Hi <name>").await.unwrap();

        assert_eq!(
            db.get_setting(TEMPLATE_KEY).unwrap(),
            Some("Hi <name>".to_string())
        );
        assert_eq!(db.get_setting("other").unwrap(), None);
    }

    #[tokio::test]
    async fn test_unicode_template() {
        let db = create_test_db();
        db.store("חג שמח <name> יקרה!").await.unwrap();

        assert_eq!(
            db.load().await.unwrap(),
            Some("חג שמח <name> יקרה!".to_string())
        );
    }
}

// =============================================================================
// Fallback Chain Tests
// =============================================================================

mod fallback {
    use super::*;

    #[tokio::test]
    async fn test_round_trip_through_sqlite() {
        let store = TemplateStore::with_cache(
            Arc::new(create_test_db()),
            Arc::new(MemoryBackend::new()),
        );
        let template = Template::new("Dear <name>, see you soon");

        store.set(&template).await.unwrap();

        assert_eq!(store.get(Direction::Ltr).await, template);
    }

    #[tokio::test]
    async fn test_sqlite_hit_mirrors_into_cache() {
        let db = Arc::new(create_test_db());
        let cache = Arc::new(MemoryBackend::new());
        db.store("Mirrored <name>").await.unwrap();

        let store = TemplateStore::with_cache(db, cache.clone());
        store.get(Direction::Ltr).await;

        assert_eq!(cache.peek(), Some("Mirrored <name>".to_string()));
    }

    #[tokio::test]
    async fn test_rtl_default_when_nothing_stored() {
        let store = TemplateStore::with_cache(
            Arc::new(create_test_db()),
            Arc::new(MemoryBackend::new()),
        );

        assert_eq!(
            store.get(Direction::Rtl).await,
            Template::default_for(Direction::Rtl)
        );
    }
}
