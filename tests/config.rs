#[cfg(test)]
mod tests {
    use rekur::libs::config::{Config, DaprConfig, RemindersConfig, DAPR_HTTP_ENDPOINT_ENV, DEFAULT_JOB_CALLBACK, DEFAULT_PUBSUB_NAME, DEFAULT_USER};
    use rekur::libs::data_storage::{DataStorage, HOME_ENV};
    use tempfile::TempDir;
    use test_context::{test_context, TestContext};

    struct ConfigTestContext {
        temp_dir: TempDir,
    }

    impl TestContext for ConfigTestContext {
        fn setup() -> Self {
            let temp_dir = tempfile::tempdir().unwrap();
            std::env::set_var(HOME_ENV, temp_dir.path().join("rekur-home"));
            ConfigTestContext { temp_dir }
        }

        fn teardown(self) {
            std::env::remove_var(HOME_ENV);
        }
    }

    #[test]
    fn test_config_defaults() {
        let config = Config::default();

        assert!(config.dapr.is_none());
        assert_eq!(config.user(), DEFAULT_USER);
        let reminders = config.reminders();
        assert!(reminders.drop_invalid);
        assert!(!reminders.allow_past_due_dates);
        assert_eq!(reminders.delivery_method, "webhook");
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config: Config = serde_json::from_str(
            r#"{
                "dapr": { "http_endpoint": "http://localhost:3500" },
                "reminders": { "allow_past_due_dates": true }
            }"#,
        )
        .unwrap();

        let dapr = config.dapr.clone().unwrap();
        assert_eq!(dapr.pubsub_name, DEFAULT_PUBSUB_NAME);
        assert_eq!(dapr.topic, "task-events");
        assert_eq!(dapr.job_callback, DEFAULT_JOB_CALLBACK);

        let reminders = config.reminders();
        assert!(reminders.allow_past_due_dates);
        assert!(reminders.drop_invalid);
    }

    #[test]
    fn test_env_endpoint_override() {
        std::env::set_var(DAPR_HTTP_ENDPOINT_ENV, "http://127.0.0.1:3501/");

        let from_nothing = Config::default().with_env_overrides();
        let dapr = from_nothing.dapr.unwrap();
        assert_eq!(dapr.http_endpoint, "http://127.0.0.1:3501");
        assert_eq!(dapr.pubsub_name, DEFAULT_PUBSUB_NAME);

        let configured = Config {
            dapr: Some(DaprConfig {
                topic: "chores".to_string(),
                ..DaprConfig::new("http://sidecar:3500")
            }),
            ..Config::default()
        }
        .with_env_overrides();
        let dapr = configured.dapr.unwrap();
        assert_eq!(dapr.http_endpoint, "http://127.0.0.1:3501");
        assert_eq!(dapr.topic, "chores");

        std::env::remove_var(DAPR_HTTP_ENDPOINT_ENV);
    }

    #[test_context(ConfigTestContext)]
    #[test]
    fn test_config_save_read_delete(ctx: &mut ConfigTestContext) {
        let path = Config::path().unwrap();
        assert!(path.starts_with(ctx.temp_dir.path()));
        assert_eq!(DataStorage::new().get_path("rekur.db").unwrap().parent(), path.parent());

        assert_eq!(Config::read().unwrap(), Config::default());
        assert!(!Config::delete().unwrap());

        let config = Config {
            dapr: Some(DaprConfig::new("http://localhost:3500")),
            reminders: Some(RemindersConfig {
                drop_invalid: false,
                ..RemindersConfig::default()
            }),
            default_user: Some("alice".to_string()),
        };
        config.save().unwrap();
        assert!(path.exists());

        let loaded = Config::read().unwrap();
        assert_eq!(loaded, config);
        assert_eq!(loaded.user(), "alice");
        assert!(!loaded.reminders().drop_invalid);

        assert!(Config::delete().unwrap());
        assert!(!path.exists());
        assert_eq!(Config::read().unwrap(), Config::default());
    }
}
