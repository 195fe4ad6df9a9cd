//! Append-only audit log. Entries are recorded once per mutation and never
//! edited or deleted; no update/delete functions exist here by design.

use rusqlite::{params, Row};

use crate::db::models::{ActivityAction, ActivityLog, EntityType};
use crate::db::repos::{bad_column, Actor};
use crate::db::DbPool;
use crate::error::AppError;

fn row_to_entry(row: &Row) -> rusqlite::Result<ActivityLog> {
    let action: String = row.get("action")?;
    let entity_type: String = row.get("entity_type")?;
    let changes: Option<String> = row.get("changes")?;

    Ok(ActivityLog {
        id: row.get("id")?,
        action: ActivityAction::parse(&action).ok_or_else(|| bad_column("action", &action))?,
        entity_type: EntityType::parse(&entity_type)
            .ok_or_else(|| bad_column("entity_type", &entity_type))?,
        entity_id: row.get("entity_id")?,
        entity_name: row.get("entity_name")?,
        changes: match changes {
            Some(raw) => Some(super::decode_json("changes", &raw)?),
            None => None,
        },
        user_id: row.get("user_id")?,
        user_name: row.get("user_name")?,
        timestamp: row.get("timestamp")?,
    })
}

/// Append one audit entry. Called by every repo mutation.
pub fn record(
    pool: &DbPool,
    action: ActivityAction,
    entity_type: EntityType,
    entity_id: &str,
    entity_name: &str,
    changes: Option<serde_json::Value>,
    actor: &Actor,
) -> Result<ActivityLog, AppError> {
    let id = uuid::Uuid::new_v4().to_string();
    let now = chrono::Utc::now().to_rfc3339();
    let changes_json = changes.as_ref().map(serde_json::to_string).transpose()?;

    let conn = pool.get()?;
    conn.execute(
        "INSERT INTO activity_log
         (id, action, entity_type, entity_id, entity_name, changes, user_id, user_name, timestamp)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            id,
            action.as_str(),
            entity_type.as_str(),
            entity_id,
            entity_name,
            changes_json,
            actor.user_id,
            actor.user_name,
            now,
        ],
    )?;

    tracing::debug!(
        action = action.as_str(),
        entity = entity_type.as_str(),
        entity_id,
        "Activity recorded"
    );

    conn.query_row(
        "SELECT * FROM activity_log WHERE id = ?1",
        params![id],
        row_to_entry,
    )
    .map_err(AppError::Database)
}

/// Latest activity, newest first. Backs the "Latest Updates" panel.
pub fn list_recent(pool: &DbPool, limit: Option<i64>) -> Result<Vec<ActivityLog>, AppError> {
    let limit = limit.unwrap_or(50);
    let conn = pool.get()?;
    let mut stmt = conn.prepare(
        "SELECT * FROM activity_log ORDER BY timestamp DESC, id DESC LIMIT ?1",
    )?;
    let rows = stmt.query_map(params![limit], row_to_entry)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(AppError::Database)
}

/// Full history for one entity, newest first.
pub fn list_for_entity(
    pool: &DbPool,
    entity_type: EntityType,
    entity_id: &str,
) -> Result<Vec<ActivityLog>, AppError> {
    let conn = pool.get()?;
    let mut stmt = conn.prepare(
        "SELECT * FROM activity_log
         WHERE entity_type = ?1 AND entity_id = ?2
         ORDER BY timestamp DESC, id DESC",
    )?;
    let rows = stmt.query_map(params![entity_type.as_str(), entity_id], row_to_entry)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(AppError::Database)
}
