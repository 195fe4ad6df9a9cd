use rusqlite::{params, Row};

use crate::db::models::{
    ActivityAction, CreateScenarioInput, EntityType, Scenario, UpdateScenarioInput,
};
use crate::db::repos::{activity, Actor};
use crate::db::DbPool;
use crate::engine::reorder;
use crate::error::AppError;
use crate::validation::{require_non_empty, require_valid_id};

fn row_to_scenario(row: &Row) -> rusqlite::Result<Scenario> {
    Ok(Scenario {
        id: row.get("id")?,
        name: row.get("name")?,
        name_ar: row.get("name_ar")?,
        category_id: row.get("category_id")?,
        icon: row.get("icon")?,
        color: row.get("color")?,
        order: row.get("sort_order")?,
        is_active: row.get::<_, i32>("is_active")? != 0,
    })
}

pub fn get_all(pool: &DbPool) -> Result<Vec<Scenario>, AppError> {
    let conn = pool.get()?;
    let mut stmt = conn.prepare("SELECT * FROM scenarios ORDER BY category_id, sort_order")?;
    let rows = stmt.query_map([], row_to_scenario)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(AppError::Database)
}

pub fn get_by_id(pool: &DbPool, id: &str) -> Result<Scenario, AppError> {
    let conn = pool.get()?;
    conn.query_row("SELECT * FROM scenarios WHERE id = ?1", params![id], row_to_scenario)
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => AppError::NotFound(format!("Scenario {id}")),
            other => AppError::Database(other),
        })
}

pub fn list_by_category(pool: &DbPool, category_id: &str) -> Result<Vec<Scenario>, AppError> {
    let conn = pool.get()?;
    let mut stmt =
        conn.prepare("SELECT * FROM scenarios WHERE category_id = ?1 ORDER BY sort_order")?;
    let rows = stmt.query_map(params![category_id], row_to_scenario)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(AppError::Database)
}

pub fn create(
    pool: &DbPool,
    input: CreateScenarioInput,
    actor: &Actor,
) -> Result<Scenario, AppError> {
    require_non_empty("name", &input.name)?;
    require_non_empty("name_ar", &input.name_ar)?;
    require_valid_id("category_id", &input.category_id)?;

    // Parent must exist (also enforced by the FK, but this surfaces NotFound
    // instead of a bare constraint error)
    crate::db::repos::categories::get_by_id(pool, &input.category_id)?;

    let id = uuid::Uuid::new_v4().to_string();
    let is_active = input.is_active.unwrap_or(true) as i32;

    let conn = pool.get()?;
    let order = match input.order {
        Some(o) => o,
        None => conn.query_row(
            "SELECT COALESCE(MAX(sort_order), 0) + 1 FROM scenarios WHERE category_id = ?1",
            params![input.category_id],
            |row| row.get(0),
        )?,
    };

    conn.execute(
        "INSERT INTO scenarios
         (id, name, name_ar, category_id, icon, color, sort_order, is_active)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            id, input.name, input.name_ar, input.category_id,
            input.icon, input.color, order, is_active,
        ],
    )?;
    drop(conn);

    let scenario = get_by_id(pool, &id)?;
    activity::record(
        pool,
        ActivityAction::Added,
        EntityType::Scenario,
        &scenario.id,
        &scenario.name,
        Some(serde_json::json!({ "name": scenario.name, "category_id": scenario.category_id })),
        actor,
    )?;
    Ok(scenario)
}

pub fn update(
    pool: &DbPool,
    id: &str,
    input: UpdateScenarioInput,
    actor: &Actor,
) -> Result<Scenario, AppError> {
    let mut scenario = get_by_id(pool, id)?;
    let mut changes = serde_json::Map::new();

    if let Some(name) = input.name {
        require_non_empty("name", &name)?;
        changes.insert("name".into(), name.clone().into());
        scenario.name = name;
    }
    if let Some(name_ar) = input.name_ar {
        require_non_empty("name_ar", &name_ar)?;
        changes.insert("name_ar".into(), name_ar.clone().into());
        scenario.name_ar = name_ar;
    }
    if let Some(category_id) = input.category_id {
        crate::db::repos::categories::get_by_id(pool, &category_id)?;
        changes.insert("category_id".into(), category_id.clone().into());
        scenario.category_id = category_id;
    }
    if let Some(icon) = input.icon {
        changes.insert("icon".into(), icon.clone().into());
        scenario.icon = Some(icon);
    }
    if let Some(color) = input.color {
        changes.insert("color".into(), color.clone().into());
        scenario.color = Some(color);
    }
    if let Some(order) = input.order {
        changes.insert("order".into(), order.into());
        scenario.order = order;
    }
    if let Some(is_active) = input.is_active {
        changes.insert("is_active".into(), is_active.into());
        scenario.is_active = is_active;
    }

    let conn = pool.get()?;
    conn.execute(
        "UPDATE scenarios SET
            name = ?1, name_ar = ?2, category_id = ?3, icon = ?4, color = ?5,
            sort_order = ?6, is_active = ?7
         WHERE id = ?8",
        params![
            scenario.name, scenario.name_ar, scenario.category_id, scenario.icon,
            scenario.color, scenario.order, scenario.is_active as i32, id,
        ],
    )?;
    drop(conn);

    activity::record(
        pool,
        ActivityAction::Edited,
        EntityType::Scenario,
        id,
        &scenario.name,
        Some(serde_json::Value::Object(changes)),
        actor,
    )?;
    get_by_id(pool, id)
}

/// Delete a scenario. Problems under it go with it (FK cascade).
pub fn delete(pool: &DbPool, id: &str, actor: &Actor) -> Result<(), AppError> {
    let scenario = get_by_id(pool, id)?;

    let conn = pool.get()?;
    conn.execute("DELETE FROM scenarios WHERE id = ?1", params![id])?;
    drop(conn);

    activity::record(
        pool,
        ActivityAction::Deleted,
        EntityType::Scenario,
        id,
        &scenario.name,
        None,
        actor,
    )?;
    Ok(())
}

/// Move a scenario within its category and persist the recomputed dense
/// 1-based orders.
pub fn reorder_in_category(
    pool: &DbPool,
    category_id: &str,
    from: usize,
    to: usize,
) -> Result<Vec<Scenario>, AppError> {
    let mut scenarios = list_by_category(pool, category_id)?;
    reorder::reorder(&mut scenarios, from, to)?;

    let conn = pool.get()?;
    for scenario in &scenarios {
        conn.execute(
            "UPDATE scenarios SET sort_order = ?1 WHERE id = ?2",
            params![scenario.order, scenario.id],
        )?;
    }
    Ok(scenarios)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_test_db;

    fn actor() -> Actor {
        Actor::new("user-editor", "Editor User")
    }

    #[test]
    fn test_scenario_crud() {
        let pool = init_test_db().unwrap();

        let created = create(
            &pool,
            CreateScenarioInput {
                name: "Refund Issue".into(),
                name_ar: "مشكلة استرداد".into(),
                category_id: "customerSide".into(),
                icon: None,
                color: None,
                order: None,
                is_active: None,
            },
            &actor(),
        )
        .unwrap();
        // Appended after the two seeded customerSide scenarios
        assert_eq!(created.order, 3);

        let updated = update(
            &pool,
            &created.id,
            UpdateScenarioInput {
                name: Some("Refund Request".into()),
                ..Default::default()
            },
            &actor(),
        )
        .unwrap();
        assert_eq!(updated.name, "Refund Request");

        delete(&pool, &created.id, &actor()).unwrap();
        assert!(matches!(
            get_by_id(&pool, &created.id),
            Err(AppError::NotFound(_))
        ));
    }

    #[test]
    fn test_create_requires_existing_category() {
        let pool = init_test_db().unwrap();
        let result = create(
            &pool,
            CreateScenarioInput {
                name: "Orphan".into(),
                name_ar: "يتيم".into(),
                category_id: "no-such-category".into(),
                icon: None,
                color: None,
                order: None,
                is_active: None,
            },
            &actor(),
        );
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[test]
    fn test_reorder_within_category() {
        let pool = init_test_db().unwrap();

        let reordered = reorder_in_category(&pool, "customerSide", 1, 0).unwrap();
        assert_eq!(reordered[0].id, "nonOrderIssue");
        assert_eq!(reordered[0].order, 1);
        assert_eq!(reordered[1].order, 2);
    }
}
