
    use super::*;
    use std::collections::HashMap;
    use crate::factory::{DEFAULT_QUEUE, MockJobFactory};
    use chrono::{NaiveDate, TimeZone};
    use rangecron_core::FixedClock;
    use rangecron_storage::MemoryStorage;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 10, 30, 0).unwrap()
    }

    fn local(month: u32, day: u32, hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, month, day)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    fn manager(storage: Arc<MemoryStorage>, factory: MockJobFactory) -> RecurringJobManager {
        RecurringJobManager::new(storage, Arc::new(factory))
            .with_clock(Arc::new(FixedClock::new(now())))
    }

    fn options() -> RecurringJobOptions {
        RecurringJobOptions::new("nightly", Invocation::new("Reports", "Run"), "0 2 * * *")
    }

    async fn stored(storage: &MemoryStorage, id: &str) -> Option<HashMap<String, String>> {
        storage.get_all_entries_from_hash(&job_key(id)).await.unwrap()
    }

    #[tokio::test]
    async fn test_add_registers_job() {
        let storage = Arc::new(MemoryStorage::new());
        let manager = manager(storage.clone(), MockJobFactory::new());

        manager
            .add_or_update(
                &options()
                    .with_time_zone("Europe/Berlin")
                    .with_queue("reports")
                    .with_start(local(5, 1, 0, 0))
                    .with_end(local(6, 1, 0, 0))
                    .with_end_date_time_mode(EndDateTimeMode::DateOnly),
            )
            .await
            .unwrap();

        assert_eq!(
            storage.get_all_items_from_set(JOB_SET).await.unwrap(),
            vec!["nightly"]
        );
        let hash = stored(&storage, "nightly").await.unwrap();
        assert_eq!(hash[fields::CRON], "0 2 * * *");
        assert_eq!(hash[fields::TIME_ZONE_ID], "Europe/Berlin");
        assert_eq!(hash[fields::QUEUE], "reports");
        // Berlin is UTC+2 in summer.
        assert_eq!(hash[fields::START_DATE], "2024-04-30T22:00:00Z");
        assert_eq!(hash[fields::END_DATE], "2024-05-31T22:00:00Z");
        assert_eq!(hash[fields::USE_END_DATE_TIME_COMPONENT], "False");
        assert_eq!(hash[fields::CREATED_AT], encode_instant(now()));

        let (id, record) = manager.list().await.unwrap().remove(0);
        assert_eq!(id, "nightly");
        assert_eq!(
            Invocation::from_json(&record.job).unwrap(),
            Invocation::new("Reports", "Run")
        );
        assert_eq!(record.end_date_time_mode, EndDateTimeMode::DateOnly);
    }

    #[tokio::test]
    async fn test_update_keeps_created_at_and_execution_state() {
        let storage = Arc::new(MemoryStorage::new());
        let manager = manager(storage.clone(), MockJobFactory::new());
        manager
            .add_or_update(&options().with_queue("reports").with_end(local(6, 1, 0, 0)))
            .await
            .unwrap();

        let created_at = encode_instant(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
        storage
            .set_range_in_hash(
                &job_key("nightly"),
                HashMap::from([
                    (fields::CREATED_AT.to_string(), created_at.clone()),
                    (fields::LAST_JOB_ID.to_string(), "job-7".to_string()),
                ]),
            )
            .await
            .unwrap();

        manager
            .add_or_update(&RecurringJobOptions {
                cron_expression: "0 3 * * *".to_string(),
                ..options()
            })
            .await
            .unwrap();

        let hash = stored(&storage, "nightly").await.unwrap();
        assert_eq!(hash[fields::CRON], "0 3 * * *");
        assert_eq!(hash[fields::CREATED_AT], created_at);
        assert_eq!(hash[fields::LAST_JOB_ID], "job-7");
        assert_eq!(hash[fields::QUEUE], "");
        assert_eq!(hash[fields::END_DATE], "");
    }

    #[tokio::test]
    async fn test_missing_required_options_are_rejected() {
        let storage = Arc::new(MemoryStorage::new());
        let manager = manager(storage.clone(), MockJobFactory::new());

        let cases = [
            (
                RecurringJobOptions {
                    recurring_job_id: " ".to_string(),
                    ..options()
                },
                "recurring job id",
            ),
            (
                RecurringJobOptions {
                    invocation: None,
                    ..options()
                },
                "job",
            ),
            (
                RecurringJobOptions {
                    cron_expression: String::new(),
                    ..options()
                },
                "cron expression",
            ),
        ];

        for (options, missing) in cases {
            let err = manager.add_or_update(&options).await.unwrap_err();
            match err {
                SchedulerError::Validation(message) => assert!(message.starts_with(missing)),
                other => panic!("unexpected error: {other}"),
            }
        }
        assert!(storage.get_all_items_from_set(JOB_SET).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_definitions_are_not_stored() {
        let storage = Arc::new(MemoryStorage::new());
        let manager = manager(storage.clone(), MockJobFactory::new());

        let invalid = [
            RecurringJobOptions {
                cron_expression: "not a cron".to_string(),
                ..options()
            },
            RecurringJobOptions {
                cron_expression: "0 2 31 2 *".to_string(),
                ..options()
            },
            options().with_time_zone("Mars/Olympus"),
            // 02:30 does not exist in Berlin on the spring-forward date.
            options()
                .with_time_zone("Europe/Berlin")
                .with_start(local(3, 31, 2, 30)),
        ];

        for options in invalid {
            let err = manager.add_or_update(&options).await.unwrap_err();
            assert!(matches!(err, SchedulerError::Validation(_)), "{err}");
        }
        assert!(stored(&storage, "nightly").await.is_none());
        assert!(storage.get_all_items_from_set(JOB_SET).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_cron_is_validated_in_configured_format() {
        let storage = Arc::new(MemoryStorage::new());
        let manager =
            manager(storage, MockJobFactory::new()).with_cron_format(CronFormat::WithSeconds);

        let err = manager.add_or_update(&options()).await.unwrap_err();
        assert!(matches!(err, SchedulerError::Validation(_)));

        manager
            .add_or_update(&RecurringJobOptions {
                cron_expression: "30 0 2 * * *".to_string(),
                ..options()
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_trigger_creates_job_immediately() {
        let storage = Arc::new(MemoryStorage::new());
        let mut factory = MockJobFactory::new();
        factory
            .expect_create()
            .withf(|request| {
                request.state.reason == MANAGER_REASON
                    && request.state.queue == DEFAULT_QUEUE
                    && request.recurring_job_id() == Some("nightly")
            })
            .times(1)
            .returning(|_| Ok(Some("job-9".to_string())));
        let manager = manager(storage.clone(), factory);

        // Outside its date range, which a manual trigger ignores.
        manager
            .add_or_update(&options().with_end(local(1, 1, 0, 0)))
            .await
            .unwrap();

        let job_id = manager.trigger("nightly").await.unwrap();
        assert_eq!(job_id.as_deref(), Some("job-9"));

        let hash = stored(&storage, "nightly").await.unwrap();
        assert!(!hash.contains_key(fields::LAST_EXECUTION));
    }

    #[tokio::test]
    async fn test_trigger_unknown_job_is_noop() {
        let mut factory = MockJobFactory::new();
        factory.expect_create().times(0);
        let manager = manager(Arc::new(MemoryStorage::new()), factory);

        assert_eq!(manager.trigger("missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_remove_if_exists() {
        let storage = Arc::new(MemoryStorage::new());
        let manager = manager(storage.clone(), MockJobFactory::new());
        manager.add_or_update(&options()).await.unwrap();

        manager.remove_if_exists("nightly").await.unwrap();
        manager.remove_if_exists("nightly").await.unwrap();

        assert!(stored(&storage, "nightly").await.is_none());
        assert!(manager.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_skips_unreadable_records() {
        let storage = Arc::new(MemoryStorage::new());
        let manager = manager(storage.clone(), MockJobFactory::new());
        manager.add_or_update(&options()).await.unwrap();
        storage
            .commit(
                WriteTransaction::new()
                    .set_range_in_hash(
                        job_key("broken"),
                        HashMap::from([(fields::JOB.to_string(), "{}".to_string())]),
                    )
                    .add_to_set(JOB_SET, "broken"),
            )
            .await
            .unwrap();

        let ids: Vec<String> = manager
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|(id, _)| id)
            .collect();
        assert_eq!(ids, vec!["nightly"]);
    }
