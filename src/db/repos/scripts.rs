use rusqlite::{params, Row};

use crate::db::models::{
    ActivityAction, CreateScriptInput, EntityType, Script, UpdateScriptInput,
};
use crate::db::repos::{activity, decode_json, Actor};
use crate::db::DbPool;
use crate::error::AppError;
use crate::validation::require_non_empty;

fn row_to_script(row: &Row) -> rusqlite::Result<Script> {
    let tags: String = row.get("tags")?;
    let variables: String = row.get("variables")?;

    Ok(Script {
        id: row.get("id")?,
        title: row.get("title")?,
        title_ar: row.get("title_ar")?,
        content: row.get("content")?,
        content_ar: row.get("content_ar")?,
        category: row.get("category")?,
        tags: decode_json("tags", &tags)?,
        color: row.get("color")?,
        is_template: row.get::<_, i32>("is_template")? != 0,
        variables: decode_json("variables", &variables)?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
        created_by: row.get("created_by")?,
    })
}

pub fn get_all(pool: &DbPool) -> Result<Vec<Script>, AppError> {
    let conn = pool.get()?;
    let mut stmt = conn.prepare("SELECT * FROM scripts ORDER BY updated_at DESC")?;
    let rows = stmt.query_map([], row_to_script)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(AppError::Database)
}

pub fn get_by_id(pool: &DbPool, id: &str) -> Result<Script, AppError> {
    let conn = pool.get()?;
    conn.query_row("SELECT * FROM scripts WHERE id = ?1", params![id], row_to_script)
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => AppError::NotFound(format!("Script {id}")),
            other => AppError::Database(other),
        })
}

pub fn list_by_category(pool: &DbPool, category: &str) -> Result<Vec<Script>, AppError> {
    let conn = pool.get()?;
    let mut stmt =
        conn.prepare("SELECT * FROM scripts WHERE category = ?1 ORDER BY updated_at DESC")?;
    let rows = stmt.query_map(params![category], row_to_script)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(AppError::Database)
}

pub fn create(pool: &DbPool, input: CreateScriptInput, actor: &Actor) -> Result<Script, AppError> {
    require_non_empty("title", &input.title)?;
    require_non_empty("content", &input.content)?;

    let id = uuid::Uuid::new_v4().to_string();
    let now = chrono::Utc::now().to_rfc3339();
    let tags = input.tags.unwrap_or_default();
    let variables = input.variables.unwrap_or_default();

    let conn = pool.get()?;
    conn.execute(
        "INSERT INTO scripts
         (id, title, title_ar, content, content_ar, category, tags, color,
          is_template, variables, created_at, updated_at, created_by)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?11, ?12)",
        params![
            id,
            input.title,
            input.title_ar,
            input.content,
            input.content_ar,
            input.category,
            serde_json::to_string(&tags)?,
            input.color,
            input.is_template.unwrap_or(false) as i32,
            serde_json::to_string(&variables)?,
            now,
            input.created_by,
        ],
    )?;
    drop(conn);

    let script = get_by_id(pool, &id)?;
    activity::record(
        pool,
        ActivityAction::Added,
        EntityType::Script,
        &script.id,
        &script.title,
        Some(serde_json::json!({ "title": script.title, "category": script.category })),
        actor,
    )?;
    Ok(script)
}

pub fn update(
    pool: &DbPool,
    id: &str,
    input: UpdateScriptInput,
    actor: &Actor,
) -> Result<Script, AppError> {
    let mut script = get_by_id(pool, id)?;
    let mut changes = serde_json::Map::new();

    if let Some(title) = input.title {
        require_non_empty("title", &title)?;
        changes.insert("title".into(), title.clone().into());
        script.title = title;
    }
    if let Some(title_ar) = input.title_ar {
        changes.insert("title_ar".into(), title_ar.clone().into());
        script.title_ar = title_ar;
    }
    if let Some(content) = input.content {
        require_non_empty("content", &content)?;
        changes.insert("content".into(), "updated".into());
        script.content = content;
    }
    if let Some(content_ar) = input.content_ar {
        changes.insert("content_ar".into(), "updated".into());
        script.content_ar = content_ar;
    }
    if let Some(category) = input.category {
        changes.insert("category".into(), category.clone().into());
        script.category = category;
    }
    if let Some(tags) = input.tags {
        changes.insert("tags".into(), serde_json::to_value(&tags)?);
        script.tags = tags;
    }
    if let Some(color) = input.color {
        changes.insert("color".into(), serde_json::to_value(&color)?);
        script.color = color;
    }
    if let Some(is_template) = input.is_template {
        changes.insert("is_template".into(), is_template.into());
        script.is_template = is_template;
    }
    if let Some(variables) = input.variables {
        changes.insert("variables".into(), (variables.len() as i64).into());
        script.variables = variables;
    }

    script.updated_at = chrono::Utc::now().to_rfc3339();

    let conn = pool.get()?;
    conn.execute(
        "UPDATE scripts SET
            title = ?1, title_ar = ?2, content = ?3, content_ar = ?4, category = ?5,
            tags = ?6, color = ?7, is_template = ?8, variables = ?9, updated_at = ?10
         WHERE id = ?11",
        params![
            script.title,
            script.title_ar,
            script.content,
            script.content_ar,
            script.category,
            serde_json::to_string(&script.tags)?,
            script.color,
            script.is_template as i32,
            serde_json::to_string(&script.variables)?,
            script.updated_at,
            id,
        ],
    )?;
    drop(conn);

    activity::record(
        pool,
        ActivityAction::Edited,
        EntityType::Script,
        id,
        &script.title,
        Some(serde_json::Value::Object(changes)),
        actor,
    )?;
    get_by_id(pool, id)
}

pub fn delete(pool: &DbPool, id: &str, actor: &Actor) -> Result<(), AppError> {
    let script = get_by_id(pool, id)?;

    let conn = pool.get()?;
    conn.execute("DELETE FROM scripts WHERE id = ?1", params![id])?;
    drop(conn);

    activity::record(
        pool,
        ActivityAction::Deleted,
        EntityType::Script,
        id,
        &script.title,
        None,
        actor,
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_test_db;

    fn actor() -> Actor {
        Actor::new("user-editor", "Editor User")
    }

    #[test]
    fn test_seeded_scripts_present() {
        let pool = init_test_db().unwrap();

        let all = get_all(&pool).unwrap();
        assert_eq!(all.len(), 2);

        let payment = get_by_id(&pool, "script-payment-declined").unwrap();
        assert!(payment.is_template);
        assert_eq!(payment.variables.len(), 2);
        assert_eq!(payment.variables[0].placeholder, "[Customer Name]");
    }

    #[test]
    fn test_script_crud() {
        let pool = init_test_db().unwrap();

        let created = create(
            &pool,
            CreateScriptInput {
                title: "Greeting".into(),
                title_ar: "تحية".into(),
                content: "Hello [Customer Name]!".into(),
                content_ar: "مرحبا [اسم العميل]!".into(),
                category: "General SOP".into(),
                tags: Some(vec!["greeting".into()]),
                color: None,
                is_template: Some(false),
                variables: None,
                created_by: "user-editor".into(),
            },
            &actor(),
        )
        .unwrap();

        let updated = update(
            &pool,
            &created.id,
            UpdateScriptInput {
                color: Some(Some("teal".into())),
                ..Default::default()
            },
            &actor(),
        )
        .unwrap();
        assert_eq!(updated.color.as_deref(), Some("teal"));

        // Double-Option clears the color
        let cleared = update(
            &pool,
            &created.id,
            UpdateScriptInput {
                color: Some(None),
                ..Default::default()
            },
            &actor(),
        )
        .unwrap();
        assert!(cleared.color.is_none());

        delete(&pool, &created.id, &actor()).unwrap();
        assert!(matches!(
            get_by_id(&pool, &created.id),
            Err(AppError::NotFound(_))
        ));
    }

    #[test]
    fn test_update_rejects_empty_content() {
        let pool = init_test_db().unwrap();
        let result = update(
            &pool,
            "script-cancellation",
            UpdateScriptInput {
                content: Some("   ".into()),
                ..Default::default()
            },
            &actor(),
        );
        assert!(matches!(result, Err(AppError::Validation(_))));
    }
}
