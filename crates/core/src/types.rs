/// User primary keys are PostgreSQL BIGSERIAL.
pub type DbId = i64;

/// Buyer lead and history ids are UUIDs generated app-side at creation.
pub type LeadId = uuid::Uuid;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
