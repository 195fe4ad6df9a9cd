use rusqlite::{params, Row};

use crate::db::models::{
    ActivityAction, Category, CreateCategoryInput, EntityType, UpdateCategoryInput,
};
use crate::db::repos::{activity, Actor};
use crate::db::DbPool;
use crate::engine::reorder;
use crate::error::AppError;
use crate::validation::require_non_empty;

fn row_to_category(row: &Row) -> rusqlite::Result<Category> {
    Ok(Category {
        id: row.get("id")?,
        name: row.get("name")?,
        name_ar: row.get("name_ar")?,
        icon: row.get("icon")?,
        color: row.get("color")?,
        description: row.get("description")?,
        description_ar: row.get("description_ar")?,
        order: row.get("sort_order")?,
        is_active: row.get::<_, i32>("is_active")? != 0,
    })
}

pub fn get_all(pool: &DbPool) -> Result<Vec<Category>, AppError> {
    let conn = pool.get()?;
    let mut stmt = conn.prepare("SELECT * FROM categories ORDER BY sort_order")?;
    let rows = stmt.query_map([], row_to_category)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(AppError::Database)
}

pub fn get_active(pool: &DbPool) -> Result<Vec<Category>, AppError> {
    let conn = pool.get()?;
    let mut stmt =
        conn.prepare("SELECT * FROM categories WHERE is_active = 1 ORDER BY sort_order")?;
    let rows = stmt.query_map([], row_to_category)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(AppError::Database)
}

pub fn get_by_id(pool: &DbPool, id: &str) -> Result<Category, AppError> {
    let conn = pool.get()?;
    conn.query_row("SELECT * FROM categories WHERE id = ?1", params![id], row_to_category)
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => AppError::NotFound(format!("Category {id}")),
            other => AppError::Database(other),
        })
}

pub fn create(
    pool: &DbPool,
    input: CreateCategoryInput,
    actor: &Actor,
) -> Result<Category, AppError> {
    require_non_empty("name", &input.name)?;
    require_non_empty("name_ar", &input.name_ar)?;

    let id = uuid::Uuid::new_v4().to_string();
    let is_active = input.is_active.unwrap_or(true) as i32;

    let conn = pool.get()?;
    let order = match input.order {
        Some(o) => o,
        None => conn.query_row(
            "SELECT COALESCE(MAX(sort_order), 0) + 1 FROM categories",
            [],
            |row| row.get(0),
        )?,
    };

    conn.execute(
        "INSERT INTO categories
         (id, name, name_ar, icon, color, description, description_ar, sort_order, is_active)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            id, input.name, input.name_ar, input.icon, input.color,
            input.description, input.description_ar, order, is_active,
        ],
    )?;
    drop(conn);

    let category = get_by_id(pool, &id)?;
    activity::record(
        pool,
        ActivityAction::Added,
        EntityType::Category,
        &category.id,
        &category.name,
        Some(serde_json::json!({ "name": category.name, "order": category.order })),
        actor,
    )?;
    Ok(category)
}

pub fn update(
    pool: &DbPool,
    id: &str,
    input: UpdateCategoryInput,
    actor: &Actor,
) -> Result<Category, AppError> {
    let mut category = get_by_id(pool, id)?;
    let mut changes = serde_json::Map::new();

    if let Some(name) = input.name {
        require_non_empty("name", &name)?;
        changes.insert("name".into(), name.clone().into());
        category.name = name;
    }
    if let Some(name_ar) = input.name_ar {
        require_non_empty("name_ar", &name_ar)?;
        changes.insert("name_ar".into(), name_ar.clone().into());
        category.name_ar = name_ar;
    }
    if let Some(description) = input.description {
        changes.insert("description".into(), description.clone().into());
        category.description = description;
    }
    if let Some(description_ar) = input.description_ar {
        changes.insert("description_ar".into(), description_ar.clone().into());
        category.description_ar = description_ar;
    }
    if let Some(icon) = input.icon {
        changes.insert("icon".into(), icon.clone().into());
        category.icon = Some(icon);
    }
    if let Some(color) = input.color {
        changes.insert("color".into(), color.clone().into());
        category.color = Some(color);
    }
    if let Some(order) = input.order {
        changes.insert("order".into(), order.into());
        category.order = order;
    }
    if let Some(is_active) = input.is_active {
        changes.insert("is_active".into(), is_active.into());
        category.is_active = is_active;
    }

    let conn = pool.get()?;
    conn.execute(
        "UPDATE categories SET
            name = ?1, name_ar = ?2, icon = ?3, color = ?4,
            description = ?5, description_ar = ?6, sort_order = ?7, is_active = ?8
         WHERE id = ?9",
        params![
            category.name, category.name_ar, category.icon, category.color,
            category.description, category.description_ar, category.order,
            category.is_active as i32, id,
        ],
    )?;
    drop(conn);

    activity::record(
        pool,
        ActivityAction::Edited,
        EntityType::Category,
        id,
        &category.name,
        Some(serde_json::Value::Object(changes)),
        actor,
    )?;
    get_by_id(pool, id)
}

/// Delete a category. Scenarios and problems under it go with it (FK cascade).
pub fn delete(pool: &DbPool, id: &str, actor: &Actor) -> Result<(), AppError> {
    let category = get_by_id(pool, id)?;

    let conn = pool.get()?;
    conn.execute("DELETE FROM categories WHERE id = ?1", params![id])?;
    drop(conn);

    activity::record(
        pool,
        ActivityAction::Deleted,
        EntityType::Category,
        id,
        &category.name,
        None,
        actor,
    )?;
    Ok(())
}

/// Move a category within the ordered list and persist the recomputed dense
/// 1-based orders.
pub fn reorder_categories(pool: &DbPool, from: usize, to: usize) -> Result<Vec<Category>, AppError> {
    let mut categories = get_all(pool)?;
    reorder::reorder(&mut categories, from, to)?;

    let conn = pool.get()?;
    for category in &categories {
        conn.execute(
            "UPDATE categories SET sort_order = ?1 WHERE id = ?2",
            params![category.order, category.id],
        )?;
    }
    Ok(categories)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_test_db;

    fn actor() -> Actor {
        Actor::new("user-admin", "Admin User")
    }

    #[test]
    fn test_category_crud() {
        let pool = init_test_db().unwrap();

        let created = create(
            &pool,
            CreateCategoryInput {
                name: "Vendor Side".into(),
                name_ar: "جانب المورد".into(),
                description: "Vendor support".into(),
                description_ar: "دعم الموردين".into(),
                icon: None,
                color: Some("red".into()),
                order: None,
                is_active: None,
            },
            &actor(),
        )
        .unwrap();
        assert!(created.is_active);
        // Appended after the 4 seeded categories
        assert_eq!(created.order, 5);

        let updated = update(
            &pool,
            &created.id,
            UpdateCategoryInput {
                name: Some("Vendor Support".into()),
                is_active: Some(false),
                ..Default::default()
            },
            &actor(),
        )
        .unwrap();
        assert_eq!(updated.name, "Vendor Support");
        assert!(!updated.is_active);

        delete(&pool, &created.id, &actor()).unwrap();
        assert!(matches!(
            get_by_id(&pool, &created.id),
            Err(AppError::NotFound(_))
        ));
    }

    #[test]
    fn test_create_rejects_empty_name() {
        let pool = init_test_db().unwrap();
        let result = create(
            &pool,
            CreateCategoryInput {
                name: "  ".into(),
                name_ar: "x".into(),
                description: String::new(),
                description_ar: String::new(),
                icon: None,
                color: None,
                order: None,
                is_active: None,
            },
            &actor(),
        );
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[test]
    fn test_delete_cascades_to_scenarios() {
        let pool = init_test_db().unwrap();

        // Seeded customerSide owns two scenarios
        delete(&pool, "customerSide", &actor()).unwrap();
        let remaining =
            crate::db::repos::scenarios::list_by_category(&pool, "customerSide").unwrap();
        assert!(remaining.is_empty());
    }

    #[test]
    fn test_reorder_reassigns_dense_orders() {
        let pool = init_test_db().unwrap();

        let reordered = reorder_categories(&pool, 0, 2).unwrap();
        let orders: Vec<i32> = reordered.iter().map(|c| c.order).collect();
        assert_eq!(orders, vec![1, 2, 3, 4]);
        assert_eq!(reordered[2].id, "generalSOP");
    }
}
