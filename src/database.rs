//! Database initialization and table definitions
//!
//! Documents are stored in an embedded redb database as JSON strings keyed
//! by id. Secondary tables map lookup keys back to document ids.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use redb::{Database, ReadableTable, Table, TableDefinition};
use serde::{de::DeserializeOwned, Serialize};
use uuid::Uuid;

use crate::config::AppConfig;
use crate::error::AppError;

/// Key: user id. Value: JSON-serialized `User`
pub const TABLE_USERS: TableDefinition<&str, &str> = TableDefinition::new("users_v1");

/// Key: normalized email. Value: user id
pub const TABLE_USER_EMAILS: TableDefinition<&str, &str> = TableDefinition::new("user_emails_v1");

/// Key: username. Value: user id
pub const TABLE_USER_NAMES: TableDefinition<&str, &str> = TableDefinition::new("user_names_v1");

/// Key: course id. Value: JSON-serialized `Course`
pub const TABLE_COURSES: TableDefinition<&str, &str> = TableDefinition::new("courses_v1");

/// Every course in creation order
///
/// Key: "{created_at_micros:020}:{course_id}". Value: course id
///
/// The zero-padded timestamp keeps lexicographic order chronological, so a
/// reversed scan yields newest first.
pub const TABLE_COURSE_TIMELINE: TableDefinition<&str, &str> =
    TableDefinition::new("course_timeline_v1");

/// Courses grouped by owning teacher
///
/// Key: "{teacher_id}:{created_at_micros:020}:{course_id}". Value: course id
pub const TABLE_COURSE_TEACHER_INDEX: TableDefinition<&str, &str> =
    TableDefinition::new("course_teacher_index_v1");

/// Key: swap id. Value: JSON-serialized `SwapRequest`
pub const TABLE_SWAPS: TableDefinition<&str, &str> = TableDefinition::new("swaps_v1");

/// Application state shared across all request handlers
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(db: Database, config: AppConfig) -> Self {
        Self {
            db: Arc::new(db),
            config: Arc::new(config),
        }
    }
}

/// Creates or opens the database file and makes sure every table exists
///
/// # Example
///
/// ```no_run
/// # use skillswap::database::init_db;
/// let db = init_db("skillswap.db").expect("Failed to initialize database");
/// ```
pub fn init_db(db_path: &str) -> Result<Database, redb::Error> {
    let db = Database::create(db_path)?;

    let write_txn = db.begin_write()?;
    {
        write_txn.open_table(TABLE_USERS)?;
        write_txn.open_table(TABLE_USER_EMAILS)?;
        write_txn.open_table(TABLE_USER_NAMES)?;
        write_txn.open_table(TABLE_COURSES)?;
        write_txn.open_table(TABLE_COURSE_TIMELINE)?;
        write_txn.open_table(TABLE_COURSE_TEACHER_INDEX)?;
        write_txn.open_table(TABLE_SWAPS)?;
    }
    write_txn.commit()?;

    Ok(db)
}

/// Reads and deserializes the document stored under `key`
pub fn get_json<T, R>(table: &R, key: &str) -> Result<Option<T>, AppError>
where
    T: DeserializeOwned,
    R: ReadableTable<&'static str, &'static str>,
{
    match table.get(key)? {
        Some(guard) => Ok(Some(serde_json::from_str(guard.value())?)),
        None => Ok(None),
    }
}

/// Reads the plain string stored under `key`
pub fn get_str<R>(table: &R, key: &str) -> Result<Option<String>, AppError>
where
    R: ReadableTable<&'static str, &'static str>,
{
    Ok(table.get(key)?.map(|guard| guard.value().to_string()))
}

pub fn put_json<T: Serialize>(
    table: &mut Table<'_, &'static str, &'static str>,
    key: &str,
    value: &T,
) -> Result<(), AppError> {
    let json = serde_json::to_string(value)?;
    table.insert(key, json.as_str())?;
    Ok(())
}

/// Values of every entry whose key starts with `prefix`, newest key first
pub fn values_with_prefix_rev<R>(table: &R, prefix: &str) -> Result<Vec<String>, AppError>
where
    R: ReadableTable<&'static str, &'static str>,
{
    // '{' sorts right after ':' so this bounds every "{prefix}:..." key
    let start_key = format!("{prefix}:");
    let end_key = format!("{prefix}:{{");

    let mut values = Vec::new();
    for entry in table.range(start_key.as_str()..end_key.as_str())?.rev() {
        let (_, value) = entry?;
        values.push(value.value().to_string());
    }
    Ok(values)
}

/// Values of every entry, newest key first
pub fn values_rev<R>(table: &R) -> Result<Vec<String>, AppError>
where
    R: ReadableTable<&'static str, &'static str>,
{
    let mut values = Vec::new();
    for entry in table.iter()?.rev() {
        let (_, value) = entry?;
        values.push(value.value().to_string());
    }
    Ok(values)
}

pub fn timeline_key(created_at: DateTime<Utc>, id: Uuid) -> String {
    format!("{:020}:{}", created_at.timestamp_micros(), id)
}

pub fn teacher_key(teacher: Uuid, created_at: DateTime<Utc>, id: Uuid) -> String {
    format!("{}:{}", teacher, timeline_key(created_at, id))
}
