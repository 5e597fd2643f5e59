
    use super::*;
    use tempfile::TempDir;

    fn fields(entries: &[(&str, &str)]) -> HashMap<String, String> {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[tokio::test]
    async fn test_file_storage_creates_parent_dir() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("store.json");
        let storage = FileStorage::new(&path).await.unwrap();

        assert!(path.parent().unwrap().exists());
        assert_eq!(storage.path(), path.as_path());
        assert!(storage.get_all_items_from_set("ids").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_file_storage_persists_across_instances() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("store.json");

        let storage = FileStorage::new(&path).await.unwrap();
        storage
            .commit(
                WriteTransaction::new()
                    .set_range_in_hash("job:a", fields(&[("Cron", "0 * * * *")]))
                    .add_to_set("ids", "a"),
            )
            .await
            .unwrap();
        storage
            .set_range_in_hash("job:a", fields(&[("NextExecution", "")]))
            .await
            .unwrap();

        let reopened = FileStorage::new(&path).await.unwrap();
        let hash = reopened
            .get_all_entries_from_hash("job:a")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(hash["Cron"], "0 * * * *");
        assert_eq!(hash["NextExecution"], "");
        assert_eq!(reopened.get_all_items_from_set("ids").await.unwrap(), vec!["a"]);
    }

    #[tokio::test]
    async fn test_file_storage_remove() {
        let temp_dir = TempDir::new().unwrap();
        let storage = FileStorage::new(temp_dir.path().join("store.json"))
            .await
            .unwrap();

        storage
            .commit(
                WriteTransaction::new()
                    .set_range_in_hash("job:a", fields(&[("Cron", "0 * * * *")]))
                    .add_to_set("ids", "a"),
            )
            .await
            .unwrap();
        storage
            .commit(
                WriteTransaction::new()
                    .remove_hash("job:a")
                    .remove_from_set("ids", "a"),
            )
            .await
            .unwrap();

        assert!(storage.get_all_entries_from_hash("job:a").await.unwrap().is_none());
        assert!(storage.get_all_items_from_set("ids").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_file_storage_rejects_corrupt_document() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("store.json");
        std::fs::write(&path, "{ not json").unwrap();

        let storage = FileStorage::new(&path).await.unwrap();
        let err = storage.get_all_items_from_set("ids").await.unwrap_err();
        assert!(matches!(err, StorageError::Serialization(_)));
    }

    #[tokio::test]
    async fn test_file_lock_is_exclusive_across_instances() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("store.json");
        let first = FileStorage::new(&path).await.unwrap();
        let second = FileStorage::new(&path).await.unwrap();

        let held = first
            .acquire_lock("jobs:lock", Duration::from_millis(100))
            .await
            .unwrap();
        let lock_path = first.lock_path("jobs:lock");
        assert!(lock_path.exists());

        let err = second
            .acquire_lock("jobs:lock", Duration::from_millis(250))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::LockTimeout { .. }));

        drop(held);
        assert!(!lock_path.exists());
        second
            .acquire_lock("jobs:lock", Duration::from_millis(100))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_stale_lock_file_is_broken() {
        let temp_dir = TempDir::new().unwrap();
        let storage = FileStorage::new(temp_dir.path().join("store.json"))
            .await
            .unwrap()
            .with_stale_lock_age(Duration::ZERO);

        std::fs::write(storage.lock_path("jobs:lock"), "").unwrap();

        storage
            .acquire_lock("jobs:lock", Duration::from_millis(100))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_lock_file_records_owner() {
        let temp_dir = TempDir::new().unwrap();
        let storage = FileStorage::new(temp_dir.path().join("store.json"))
            .await
            .unwrap();

        let _held = storage
            .acquire_lock("jobs:lock", Duration::from_millis(100))
            .await
            .unwrap();
        let owner = std::fs::read_to_string(storage.lock_path("jobs:lock")).unwrap();
        assert!(owner.starts_with(&format!("{}-", std::process::id())));
    }

    #[tokio::test]
    async fn test_held_lock_is_refreshed() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("store.json");
        let stale_age = Duration::from_millis(600);
        let holder = FileStorage::new(&path)
            .await
            .unwrap()
            .with_stale_lock_age(stale_age);
        let waiter = FileStorage::new(&path)
            .await
            .unwrap()
            .with_stale_lock_age(stale_age);

        let held = holder
            .acquire_lock("jobs:lock", Duration::from_millis(100))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(1000)).await;

        let err = waiter
            .acquire_lock("jobs:lock", Duration::from_millis(150))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::LockTimeout { .. }));
        drop(held);
    }

    #[tokio::test]
    async fn test_taken_over_lock_is_left_in_place() {
        let temp_dir = TempDir::new().unwrap();
        let storage = FileStorage::new(temp_dir.path().join("store.json"))
            .await
            .unwrap();
        let lock_path = storage.lock_path("jobs:lock");

        let held = storage
            .acquire_lock("jobs:lock", Duration::from_millis(100))
            .await
            .unwrap();
        std::fs::write(&lock_path, "successor").unwrap();
        drop(held);

        assert_eq!(std::fs::read_to_string(&lock_path).unwrap(), "successor");
    }

    #[tokio::test]
    async fn test_fresh_lock_is_not_broken() {
        let temp_dir = TempDir::new().unwrap();
        let storage = FileStorage::new(temp_dir.path().join("store.json"))
            .await
            .unwrap();
        let lock_path = storage.lock_path("jobs:lock");
        std::fs::write(&lock_path, "other").unwrap();

        assert!(!storage.break_if_stale(&lock_path).await.unwrap());
        assert_eq!(std::fs::read_to_string(&lock_path).unwrap(), "other");
    }

    #[tokio::test]
    async fn test_writes_leave_only_the_document() {
        let temp_dir = TempDir::new().unwrap();
        let storage = FileStorage::new(temp_dir.path().join("store.json"))
            .await
            .unwrap();

        for id in ["a", "b", "c"] {
            storage
                .commit(
                    WriteTransaction::new()
                        .set_range_in_hash(format!("job:{id}"), fields(&[("Cron", "* * * * *")]))
                        .add_to_set("ids", id),
                )
                .await
                .unwrap();
        }

        let names: Vec<String> = std::fs::read_dir(temp_dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["store.json"]);
    }

    #[test]
    fn test_lock_path_is_sanitized() {
        let storage = FileStorage {
            path: PathBuf::from("/tmp/store.json"),
            stale_lock_age: DEFAULT_STALE_LOCK_AGE,
            write_guard: Mutex::new(()),
        };
        assert_eq!(
            storage.lock_path("recurring-daterange-jobs:lock"),
            PathBuf::from("/tmp/store.json.recurring-daterange-jobs_lock.lock")
        );
    }
