//! Settings service: arbitrary key/value preferences for the boundary layer.
//!
//! Values round-trip as JSON when they parse as JSON and as raw strings
//! otherwise, so both structured preferences and plain strings coexist in
//! one TEXT column.

use serde_json::Value;

use crate::db::TodoDb;
use crate::error::CoreError;

/// The stored value for a key, if present.
pub fn get(db: &TodoDb, key: &str) -> Result<Option<Value>, CoreError> {
    Ok(db.get_setting(key)?.map(parse_value))
}

/// The stored value for a key, or `default` when absent.
pub fn get_or(db: &TodoDb, key: &str, default: Value) -> Result<Value, CoreError> {
    Ok(get(db, key)?.unwrap_or(default))
}

/// Store a value under a key. Plain strings are stored raw; everything else
/// is stored as JSON.
pub fn set(db: &TodoDb, key: &str, value: &Value) -> Result<(), CoreError> {
    let stored = match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    db.set_setting(key, &stored)?;
    Ok(())
}

/// Remove a key. Returns whether it existed.
pub fn delete(db: &TodoDb, key: &str) -> Result<bool, CoreError> {
    Ok(db.delete_setting(key)? > 0)
}

/// All settings as a key → value map.
pub fn get_all(db: &TodoDb) -> Result<serde_json::Map<String, Value>, CoreError> {
    let mut map = serde_json::Map::new();
    for (key, raw) in db.get_all_settings()? {
        map.insert(key, parse_value(raw));
    }
    Ok(map)
}

fn parse_value(raw: String) -> Value {
    serde_json::from_str(&raw).unwrap_or(Value::String(raw))
}
