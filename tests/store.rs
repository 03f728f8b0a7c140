#[cfg(test)]
mod tests {
    use chrono::{DateTime, Duration, FixedOffset, Utc};
    use rekur::db::db::DB_FILE_NAME;
    use rekur::db::reminders::ReminderFilter;
    use rekur::db::store::SqliteStore;
    use rekur::libs::recurrence::{Pattern, RecurrenceRule, RecurrenceSpec};
    use rekur::libs::reminder::{plan_reminder, Reminder, ReminderStatus};
    use rekur::libs::store::{InsertOutcome, TaskStore};
    use rekur::libs::task::{Priority, Task, TaskFilter};
    use tempfile::TempDir;
    use test_context::{test_context, TestContext};
    use uuid::Uuid;

    struct StoreTestContext {
        _temp_dir: TempDir,
        store: SqliteStore,
    }

    impl TestContext for StoreTestContext {
        fn setup() -> Self {
            let temp_dir = tempfile::tempdir().unwrap();
            let store = SqliteStore::open(temp_dir.path().join(DB_FILE_NAME)).unwrap();
            StoreTestContext { _temp_dir: temp_dir, store }
        }
    }

    fn at(value: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(value).unwrap()
    }

    fn daily_rule(user_id: &str, due: &DateTime<FixedOffset>) -> RecurrenceRule {
        RecurrenceRule::new(user_id, RecurrenceSpec::new(Pattern::Daily, 1).unwrap(), due)
    }

    #[test_context(StoreTestContext)]
    #[test]
    fn test_task_round_trip(ctx: &mut StoreTestContext) {
        let due = at("2026-05-04T18:30:00+03:00");
        let task = Task::new("user-1", "Pay rent")
            .with_description(Some("Transfer to landlord".to_string()))
            .with_priority(Priority::High)
            .with_tags(vec!["Home".to_string(), "money".to_string()])
            .with_due_date(Some(due));

        ctx.store.create_task(&task, None, None).unwrap();

        let stored = ctx.store.tasks().get_by_id(&task.id).unwrap().unwrap();
        assert_eq!(stored.title, "Pay rent");
        assert_eq!(stored.description.as_deref(), Some("Transfer to landlord"));
        assert_eq!(stored.priority, Priority::High);
        assert_eq!(stored.tags, vec!["home".to_string(), "money".to_string()]);
        assert_eq!(stored.due_date, Some(due));
        assert_eq!(stored.due_date.unwrap().offset().local_minus_utc(), 3 * 3600);
        assert!(!stored.completed);
        assert!(stored.recurrence_id.is_none());
    }

    #[test_context(StoreTestContext)]
    #[test]
    fn test_get_missing_task(ctx: &mut StoreTestContext) {
        assert!(ctx.store.tasks().get_by_id(&Uuid::new_v4()).unwrap().is_none());
    }

    #[test_context(StoreTestContext)]
    #[test]
    fn test_fetch_filters_and_orders_by_due_date(ctx: &mut StoreTestContext) {
        let later = Task::new("user-1", "Later").with_due_date(Some(at("2026-05-10T09:00:00Z")));
        // Earlier instant despite the later wall-clock hour.
        let sooner = Task::new("user-1", "Sooner").with_due_date(Some(at("2026-05-10T10:00:00+05:00")));
        let undated = Task::new("user-1", "Someday");
        let other_user = Task::new("user-2", "Not mine").with_due_date(Some(at("2026-05-01T09:00:00Z")));
        for task in [&later, &sooner, &undated, &other_user] {
            ctx.store.create_task(task, None, None).unwrap();
        }
        assert!(ctx.store.tasks().complete(&later.id, Utc::now()).unwrap());

        let titles = |tasks: Vec<Task>| tasks.into_iter().map(|t| t.title).collect::<Vec<_>>();

        assert_eq!(titles(ctx.store.tasks().fetch(TaskFilter::ByUser("user-1".to_string())).unwrap()), vec!["Sooner", "Later", "Someday"]);
        assert_eq!(titles(ctx.store.tasks().fetch(TaskFilter::OpenByUser("user-1".to_string())).unwrap()), vec!["Sooner", "Someday"]);
        assert_eq!(ctx.store.tasks().fetch(TaskFilter::Open).unwrap().len(), 3);
        assert_eq!(ctx.store.tasks().fetch(TaskFilter::All).unwrap().len(), 4);
    }

    #[test_context(StoreTestContext)]
    #[test]
    fn test_complete_only_once(ctx: &mut StoreTestContext) {
        let task = Task::new("user-1", "Call mom");
        ctx.store.create_task(&task, None, None).unwrap();

        assert!(ctx.store.tasks().complete(&task.id, Utc::now()).unwrap());
        assert!(!ctx.store.tasks().complete(&task.id, Utc::now()).unwrap());
        assert!(!ctx.store.tasks().complete(&Uuid::new_v4(), Utc::now()).unwrap());

        let stored = ctx.store.tasks().get_by_id(&task.id).unwrap().unwrap();
        assert!(stored.completed);
    }

    #[test_context(StoreTestContext)]
    #[test]
    fn test_rule_round_trip_keeps_metadata(ctx: &mut StoreTestContext) {
        let due = at("2026-01-31T09:00:00+01:00");
        let rule = RecurrenceRule::new("user-1", RecurrenceSpec::new(Pattern::Monthly, 1).unwrap(), &due);
        let task = Task::new("user-1", "Invoice").with_due_date(Some(due)).with_recurrence(Some(rule.id));

        ctx.store.create_task(&task, Some(&rule), None).unwrap();

        let stored = ctx.store.find_rule(&rule.id).unwrap().unwrap();
        assert_eq!(stored.pattern, Pattern::Monthly);
        assert_eq!(stored.interval, 1);
        assert_eq!(stored.metadata.day_of_month, Some(31));
        assert_eq!(stored.user_id, "user-1");
        assert!(ctx.store.find_rule(&Uuid::new_v4()).unwrap().is_none());
    }

    #[test_context(StoreTestContext)]
    #[test]
    fn test_second_open_instance_is_duplicate(ctx: &mut StoreTestContext) {
        let due = at("2026-05-04T09:00:00Z");
        let rule = daily_rule("user-1", &due);
        let first = Task::new("user-1", "Stretch").with_due_date(Some(due)).with_recurrence(Some(rule.id));
        ctx.store.create_task(&first, Some(&rule), None).unwrap();

        // Same instant written in another offset.
        let same_instant = at("2026-05-04T11:00:00+02:00");
        let second = first.next_instance(same_instant);
        assert_eq!(ctx.store.insert_instance(&second).unwrap(), InsertOutcome::Duplicate);
        assert_eq!(ctx.store.tasks().count_open_instances(&rule.id).unwrap(), 1);

        let found = ctx.store.find_open_instance(&rule.id, &same_instant).unwrap().unwrap();
        assert_eq!(found.id, first.id);
    }

    #[test_context(StoreTestContext)]
    #[test]
    fn test_instances_within_one_second_are_distinct(ctx: &mut StoreTestContext) {
        let early = at("2026-05-04T09:00:00.250Z");
        let late = at("2026-05-04T09:00:00.750Z");
        let rule = daily_rule("user-1", &early);
        let first = Task::new("user-1", "Ping").with_due_date(Some(early)).with_recurrence(Some(rule.id));
        ctx.store.create_task(&first, Some(&rule), None).unwrap();

        let second = first.next_instance(late);
        assert_eq!(ctx.store.insert_instance(&second).unwrap(), InsertOutcome::Inserted);
        assert_eq!(ctx.store.tasks().count_open_instances(&rule.id).unwrap(), 2);

        assert_eq!(ctx.store.find_open_instance(&rule.id, &early).unwrap().unwrap().id, first.id);
        assert_eq!(ctx.store.find_open_instance(&rule.id, &late).unwrap().unwrap().id, second.id);
        assert!(ctx.store.find_open_instance(&rule.id, &at("2026-05-04T09:00:00Z")).unwrap().is_none());
    }

    #[test_context(StoreTestContext)]
    #[test]
    fn test_completed_instance_does_not_block_new_one(ctx: &mut StoreTestContext) {
        let due = at("2026-05-04T09:00:00Z");
        let rule = daily_rule("user-1", &due);
        let first = Task::new("user-1", "Stretch").with_due_date(Some(due)).with_recurrence(Some(rule.id));
        ctx.store.create_task(&first, Some(&rule), None).unwrap();
        ctx.store.tasks().complete(&first.id, Utc::now()).unwrap();

        assert!(ctx.store.find_open_instance(&rule.id, &due).unwrap().is_none());
        assert_eq!(ctx.store.insert_instance(&first.next_instance(due)).unwrap(), InsertOutcome::Inserted);
        assert_eq!(ctx.store.tasks().count_open_instances(&rule.id).unwrap(), 1);
    }

    #[test_context(StoreTestContext)]
    #[test]
    fn test_non_recurring_tasks_may_share_due_date(ctx: &mut StoreTestContext) {
        let due = at("2026-05-04T09:00:00Z");
        let first = Task::new("user-1", "One").with_due_date(Some(due));
        let second = Task::new("user-1", "Two").with_due_date(Some(due));

        assert_eq!(ctx.store.insert_instance(&first).unwrap(), InsertOutcome::Inserted);
        assert_eq!(ctx.store.insert_instance(&second).unwrap(), InsertOutcome::Inserted);
    }

    #[test_context(StoreTestContext)]
    #[test]
    fn test_create_task_with_reminder(ctx: &mut StoreTestContext) {
        let now = Utc::now();
        let due = (now + Duration::days(2)).fixed_offset();
        let task = Task::new("user-1", "Dentist").with_due_date(Some(due));
        let plan = plan_reminder(task.due_date, Some("1 day before"), now).unwrap().unwrap();
        let reminder = Reminder::pending(&task, &plan, "webhook");

        ctx.store.create_task(&task, None, Some(&reminder)).unwrap();

        let stored = ctx.store.reminders().fetch(ReminderFilter::ByTask(task.id)).unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].status, ReminderStatus::Pending);
        assert_eq!(stored[0].reminder_time, due - Duration::days(1));
        assert_eq!(stored[0].delivery_method, "webhook");
        assert_eq!(ctx.store.reminders().fetch(ReminderFilter::PendingByUser("user-1".to_string())).unwrap().len(), 1);
        assert!(ctx.store.reminders().fetch(ReminderFilter::PendingByUser("user-2".to_string())).unwrap().is_empty());
    }

    #[test_context(StoreTestContext)]
    #[test]
    fn test_create_task_rolls_back_on_duplicate(ctx: &mut StoreTestContext) {
        let now = Utc::now();
        let due = (now + Duration::days(1)).fixed_offset();
        let rule = daily_rule("user-1", &due);
        let first = Task::new("user-1", "Stretch").with_due_date(Some(due)).with_recurrence(Some(rule.id));
        ctx.store.create_task(&first, Some(&rule), None).unwrap();

        let clash = first.next_instance(due);
        let plan = plan_reminder(clash.due_date, Some("1 hour before"), now).unwrap().unwrap();
        let reminder = Reminder::pending(&clash, &plan, "webhook");

        assert!(ctx.store.create_task(&clash, None, Some(&reminder)).is_err());
        assert!(ctx.store.tasks().get_by_id(&clash.id).unwrap().is_none());
        assert!(ctx.store.reminders().fetch(ReminderFilter::ByTask(clash.id)).unwrap().is_empty());
    }

    #[test_context(StoreTestContext)]
    #[test]
    fn test_find_by_prefix(ctx: &mut StoreTestContext) {
        let task = Task::new("user-1", "Prefix lookup");
        ctx.store.create_task(&task, None, None).unwrap();

        let id = task.id.to_string();
        let found = ctx.store.tasks().find_by_prefix(&id[..8]).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, task.id);
        assert_eq!(ctx.store.tasks().find_by_prefix(&id[..8].to_uppercase()).unwrap().len(), 1);
        assert!(ctx.store.tasks().find_by_prefix("zz").unwrap().is_empty());
    }
}
