#[derive(Debug, Clone)]
pub enum Message {
    // === TASK MESSAGES ===
    TaskCreated(String),              // id
    TaskCompleted(String),            // id
    TaskAlreadyCompleted(String),     // id
    TaskNotFound(String),             // id
    TaskNotFoundForPrefix(String),    // id prefix
    TaskPrefixAmbiguous(String),      // id prefix
    TasksNotFound,
    TasksHeader,
    RecurrenceAttached(String),       // rule summary

    // === MATERIALIZATION MESSAGES ===
    NextInstanceCreated(String, String), // id, due date
    NextInstanceExists(String),          // due date
    NextInstanceSkipped(String),         // reason
    EventsConsumed(usize, usize),        // processed, created
    EventParseFailed(usize, String),     // line, error
    EventSourceEmpty,
    EventPublishFailed(String, String),  // event type, error

    // === REMINDER MESSAGES ===
    ReminderScheduled(String),       // reminder time
    ReminderDropped(String),         // reason
    ReminderJobFailed(String),       // error
    RemindersNotFound,
    RemindersHeader,

    // === OCCURRENCE PREVIEW ===
    OccurrencesHeader(String),       // rule summary

    // === CONFIGURATION MESSAGES ===
    ConfigSaved,
    ConfigDeleted,
    ConfigNotFound,
    ConfigPath(String),
    ConfigEndpoint(String),
    ConfigLocalOnly,

    // === INPUT ERRORS ===
    InvalidDate(String),

    // === MIGRATION MESSAGES ===
    MigrationsFound(usize),        // count
    RunningMigration(u32, String), // version, name
    MigrationCompleted(u32),       // version
    MigrationFailed(u32, String),  // version, error
    AllMigrationsCompleted,
    DbUpToDate,
    DbNeedsUpdate,
    DbVersion(u32),
    MigrationHistory,
    NothingToRollback,
    RollingBack(u32, u32),  // from, to
    RollbackCompleted(u32), // version
}
