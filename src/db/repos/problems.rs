use rusqlite::{params, Row};

use crate::db::models::{
    ActivityAction, ClearPath, CreateProblemInput, EntityType, Priority, Problem, ProblemStatus,
    UnclearPath, UpdateProblemInput,
};
use crate::db::repos::{activity, bad_column, decode_json, Actor};
use crate::db::DbPool;
use crate::engine::{matrix, reorder};
use crate::error::AppError;
use crate::validation::{require_non_empty, require_valid_id};

fn row_to_problem(row: &Row) -> rusqlite::Result<Problem> {
    let priority: String = row.get("priority")?;
    let status: String = row.get("status")?;
    let faq_levels: String = row.get("faq_levels")?;
    let verification_steps: String = row.get("verification_steps")?;
    let clear_path: Option<String> = row.get("clear_path")?;
    let unclear_path: Option<String> = row.get("unclear_path")?;
    let tags: String = row.get("tags")?;

    Ok(Problem {
        id: row.get("id")?,
        title: row.get("title")?,
        title_ar: row.get("title_ar")?,
        category_id: row.get("category_id")?,
        scenario_id: row.get("scenario_id")?,
        priority: Priority::parse(&priority).ok_or_else(|| bad_column("priority", &priority))?,
        status: ProblemStatus::parse(&status).ok_or_else(|| bad_column("status", &status))?,
        faq_levels: decode_json("faq_levels", &faq_levels)?,
        verification_steps: decode_json("verification_steps", &verification_steps)?,
        clear_path: match clear_path {
            Some(raw) => Some(decode_json("clear_path", &raw)?),
            None => None,
        },
        unclear_path: match unclear_path {
            Some(raw) => Some(decode_json("unclear_path", &raw)?),
            None => None,
        },
        tags: decode_json("tags", &tags)?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
        created_by: row.get("created_by")?,
    })
}

pub fn get_all(pool: &DbPool) -> Result<Vec<Problem>, AppError> {
    let conn = pool.get()?;
    let mut stmt = conn.prepare("SELECT * FROM problems ORDER BY created_at DESC")?;
    let rows = stmt.query_map([], row_to_problem)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(AppError::Database)
}

pub fn get_by_id(pool: &DbPool, id: &str) -> Result<Problem, AppError> {
    let conn = pool.get()?;
    conn.query_row("SELECT * FROM problems WHERE id = ?1", params![id], row_to_problem)
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => AppError::NotFound(format!("Problem {id}")),
            other => AppError::Database(other),
        })
}

pub fn list_by_category(pool: &DbPool, category_id: &str) -> Result<Vec<Problem>, AppError> {
    let conn = pool.get()?;
    let mut stmt =
        conn.prepare("SELECT * FROM problems WHERE category_id = ?1 ORDER BY created_at DESC")?;
    let rows = stmt.query_map(params![category_id], row_to_problem)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(AppError::Database)
}

pub fn list_by_scenario(pool: &DbPool, scenario_id: &str) -> Result<Vec<Problem>, AppError> {
    let conn = pool.get()?;
    let mut stmt =
        conn.prepare("SELECT * FROM problems WHERE scenario_id = ?1 ORDER BY created_at DESC")?;
    let rows = stmt.query_map(params![scenario_id], row_to_problem)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(AppError::Database)
}

pub fn create(
    pool: &DbPool,
    input: CreateProblemInput,
    actor: &Actor,
) -> Result<Problem, AppError> {
    require_non_empty("title", &input.title)?;
    require_non_empty("title_ar", &input.title_ar)?;
    require_valid_id("category_id", &input.category_id)?;
    require_valid_id("scenario_id", &input.scenario_id)?;

    crate::db::repos::categories::get_by_id(pool, &input.category_id)?;
    crate::db::repos::scenarios::get_by_id(pool, &input.scenario_id)?;

    if let Some(ref path) = input.unclear_path {
        matrix::validate(path)?;
    }

    let id = uuid::Uuid::new_v4().to_string();
    let now = chrono::Utc::now().to_rfc3339();
    let priority = input.priority.unwrap_or_default();
    let status = input.status.unwrap_or_default();
    let faq_levels = input.faq_levels.unwrap_or_default();
    let verification_steps = input.verification_steps.unwrap_or_default();
    let tags = input.tags.unwrap_or_default();

    let conn = pool.get()?;
    conn.execute(
        "INSERT INTO problems
         (id, title, title_ar, category_id, scenario_id, priority, status,
          faq_levels, verification_steps, clear_path, unclear_path, tags,
          created_at, updated_at, created_by)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?13, ?14)",
        params![
            id,
            input.title,
            input.title_ar,
            input.category_id,
            input.scenario_id,
            priority.as_str(),
            status.as_str(),
            serde_json::to_string(&faq_levels)?,
            serde_json::to_string(&verification_steps)?,
            input.clear_path.as_ref().map(serde_json::to_string).transpose()?,
            input.unclear_path.as_ref().map(serde_json::to_string).transpose()?,
            serde_json::to_string(&tags)?,
            now,
            input.created_by,
        ],
    )?;
    drop(conn);

    let problem = get_by_id(pool, &id)?;
    activity::record(
        pool,
        ActivityAction::Added,
        EntityType::Problem,
        &problem.id,
        &problem.title,
        Some(serde_json::json!({
            "title": problem.title,
            "priority": problem.priority,
            "status": problem.status,
        })),
        actor,
    )?;
    Ok(problem)
}

pub fn update(
    pool: &DbPool,
    id: &str,
    input: UpdateProblemInput,
    actor: &Actor,
) -> Result<Problem, AppError> {
    let mut problem = get_by_id(pool, id)?;
    let mut changes = serde_json::Map::new();

    if let Some(title) = input.title {
        require_non_empty("title", &title)?;
        changes.insert("title".into(), title.clone().into());
        problem.title = title;
    }
    if let Some(title_ar) = input.title_ar {
        require_non_empty("title_ar", &title_ar)?;
        changes.insert("title_ar".into(), title_ar.clone().into());
        problem.title_ar = title_ar;
    }
    if let Some(category_id) = input.category_id {
        crate::db::repos::categories::get_by_id(pool, &category_id)?;
        changes.insert("category_id".into(), category_id.clone().into());
        problem.category_id = category_id;
    }
    if let Some(scenario_id) = input.scenario_id {
        crate::db::repos::scenarios::get_by_id(pool, &scenario_id)?;
        changes.insert("scenario_id".into(), scenario_id.clone().into());
        problem.scenario_id = scenario_id;
    }
    if let Some(priority) = input.priority {
        changes.insert("priority".into(), serde_json::to_value(priority)?);
        problem.priority = priority;
    }
    if let Some(status) = input.status {
        changes.insert("status".into(), serde_json::to_value(status)?);
        problem.status = status;
    }
    if let Some(faq_levels) = input.faq_levels {
        changes.insert("faq_levels".into(), (faq_levels.len() as i64).into());
        problem.faq_levels = faq_levels;
    }
    if let Some(verification_steps) = input.verification_steps {
        changes.insert("verification_steps".into(), (verification_steps.len() as i64).into());
        problem.verification_steps = verification_steps;
    }
    if let Some(clear_path) = input.clear_path {
        changes.insert("clear_path".into(), clear_path.is_some().into());
        problem.clear_path = clear_path;
    }
    if let Some(unclear_path) = input.unclear_path {
        if let Some(ref path) = unclear_path {
            matrix::validate(path)?;
        }
        changes.insert("unclear_path".into(), unclear_path.is_some().into());
        problem.unclear_path = unclear_path;
    }
    if let Some(tags) = input.tags {
        changes.insert("tags".into(), serde_json::to_value(&tags)?);
        problem.tags = tags;
    }

    problem.updated_at = chrono::Utc::now().to_rfc3339();
    persist(pool, &problem)?;

    activity::record(
        pool,
        ActivityAction::Edited,
        EntityType::Problem,
        id,
        &problem.title,
        Some(serde_json::Value::Object(changes)),
        actor,
    )?;
    get_by_id(pool, id)
}

pub fn delete(pool: &DbPool, id: &str, actor: &Actor) -> Result<(), AppError> {
    let problem = get_by_id(pool, id)?;

    let conn = pool.get()?;
    conn.execute("DELETE FROM problems WHERE id = ?1", params![id])?;
    drop(conn);

    activity::record(
        pool,
        ActivityAction::Deleted,
        EntityType::Problem,
        id,
        &problem.title,
        None,
        actor,
    )?;
    Ok(())
}

/// Persist an edited clear path wholesale.
pub fn save_clear_path(
    pool: &DbPool,
    problem_id: &str,
    clear_path: Option<ClearPath>,
    actor: &Actor,
) -> Result<Problem, AppError> {
    update(
        pool,
        problem_id,
        UpdateProblemInput {
            clear_path: Some(clear_path),
            ..Default::default()
        },
        actor,
    )
}

/// Persist an edited unclear path wholesale. The path is validated first so
/// a duplicate (primary, secondary) pair or dangling mapping never lands in
/// the store.
pub fn save_unclear_path(
    pool: &DbPool,
    problem_id: &str,
    unclear_path: Option<UnclearPath>,
    actor: &Actor,
) -> Result<Problem, AppError> {
    update(
        pool,
        problem_id,
        UpdateProblemInput {
            unclear_path: Some(unclear_path),
            ..Default::default()
        },
        actor,
    )
}

/// Move a FAQ level and recompute dense 1-based levels.
pub fn reorder_faq_levels(
    pool: &DbPool,
    problem_id: &str,
    from: usize,
    to: usize,
    actor: &Actor,
) -> Result<Problem, AppError> {
    let mut problem = get_by_id(pool, problem_id)?;
    reorder::reorder(&mut problem.faq_levels, from, to)?;
    update(
        pool,
        problem_id,
        UpdateProblemInput {
            faq_levels: Some(problem.faq_levels),
            ..Default::default()
        },
        actor,
    )
}

/// Move a verification step and recompute dense 1-based orders.
pub fn reorder_verification_steps(
    pool: &DbPool,
    problem_id: &str,
    from: usize,
    to: usize,
    actor: &Actor,
) -> Result<Problem, AppError> {
    let mut problem = get_by_id(pool, problem_id)?;
    reorder::reorder(&mut problem.verification_steps, from, to)?;
    update(
        pool,
        problem_id,
        UpdateProblemInput {
            verification_steps: Some(problem.verification_steps),
            ..Default::default()
        },
        actor,
    )
}

fn persist(pool: &DbPool, problem: &Problem) -> Result<(), AppError> {
    let conn = pool.get()?;
    conn.execute(
        "UPDATE problems SET
            title = ?1, title_ar = ?2, category_id = ?3, scenario_id = ?4,
            priority = ?5, status = ?6, faq_levels = ?7, verification_steps = ?8,
            clear_path = ?9, unclear_path = ?10, tags = ?11, updated_at = ?12
         WHERE id = ?13",
        params![
            problem.title,
            problem.title_ar,
            problem.category_id,
            problem.scenario_id,
            problem.priority.as_str(),
            problem.status.as_str(),
            serde_json::to_string(&problem.faq_levels)?,
            serde_json::to_string(&problem.verification_steps)?,
            problem.clear_path.as_ref().map(serde_json::to_string).transpose()?,
            problem.unclear_path.as_ref().map(serde_json::to_string).transpose()?,
            serde_json::to_string(&problem.tags)?,
            problem.updated_at,
            problem.id,
        ],
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_test_db;

    fn actor() -> Actor {
        Actor::new("user-admin", "Admin User")
    }

    #[test]
    fn test_seeded_problem_roundtrips_nested_structure() {
        let pool = init_test_db().unwrap();

        let problem = get_by_id(&pool, "prob-payment").unwrap();
        assert_eq!(problem.faq_levels.len(), 2);
        assert_eq!(problem.faq_levels[0].level, 1);
        assert_eq!(problem.verification_steps.len(), 2);
        assert!(problem.clear_path.is_some());

        let unclear = problem.unclear_path.unwrap();
        assert_eq!(unclear.primary_options.len(), 6);
        assert_eq!(unclear.secondary_options.len(), 2);
        assert_eq!(unclear.result_mappings.len(), 1);
    }

    #[test]
    fn test_update_replaces_nested_lists_wholesale() {
        let pool = init_test_db().unwrap();

        let updated = update(
            &pool,
            "prob-payment",
            UpdateProblemInput {
                verification_steps: Some(vec![]),
                status: Some(ProblemStatus::Investigating),
                ..Default::default()
            },
            &actor(),
        )
        .unwrap();
        assert!(updated.verification_steps.is_empty());
        assert_eq!(updated.status, ProblemStatus::Investigating);
        // Untouched fields survive
        assert_eq!(updated.faq_levels.len(), 2);
    }

    #[test]
    fn test_clear_path_can_be_removed_with_some_none() {
        let pool = init_test_db().unwrap();

        let updated = update(
            &pool,
            "prob-payment",
            UpdateProblemInput {
                clear_path: Some(None),
                ..Default::default()
            },
            &actor(),
        )
        .unwrap();
        assert!(updated.clear_path.is_none());
    }

    #[test]
    fn test_update_rejects_invalid_unclear_path() {
        let pool = init_test_db().unwrap();

        let problem = get_by_id(&pool, "prob-payment").unwrap();
        let mut path = problem.unclear_path.unwrap();
        // Duplicate the curated mapping's pair
        let mut dup = path.result_mappings[0].clone();
        dup.id = "dup".into();
        path.result_mappings.push(dup);

        let result = save_unclear_path(&pool, "prob-payment", Some(path), &actor());
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[test]
    fn test_reorder_faq_levels_renumbers() {
        let pool = init_test_db().unwrap();

        let updated = reorder_faq_levels(&pool, "prob-payment", 1, 0, &actor()).unwrap();
        assert_eq!(updated.faq_levels[0].id, "prob-payment-faq2");
        assert_eq!(updated.faq_levels[0].level, 1);
        assert_eq!(updated.faq_levels[1].level, 2);
    }

    #[test]
    fn test_delete_records_activity() {
        let pool = init_test_db().unwrap();

        delete(&pool, "prob-login", &actor()).unwrap();
        let history = activity::list_for_entity(&pool, EntityType::Problem, "prob-login").unwrap();
        assert_eq!(history[0].action, ActivityAction::Deleted);
    }
}
