use rusqlite::{params, Row};

use crate::auth;
use crate::db::models::{ActivityAction, CreateUserInput, EntityType, User, UserRole};
use crate::db::repos::{activity, bad_column, Actor};
use crate::db::DbPool;
use crate::error::AppError;
use crate::validation::require_non_empty;

fn row_to_user(row: &Row) -> rusqlite::Result<User> {
    let role: String = row.get("role")?;
    Ok(User {
        id: row.get("id")?,
        name: row.get("name")?,
        email: row.get("email")?,
        role: UserRole::parse(&role).ok_or_else(|| bad_column("role", &role))?,
        password_digest: row.get("password_digest")?,
        created_at: row.get("created_at")?,
        last_login: row.get("last_login")?,
    })
}

pub fn get_all(pool: &DbPool) -> Result<Vec<User>, AppError> {
    let conn = pool.get()?;
    let mut stmt = conn.prepare("SELECT * FROM users ORDER BY created_at")?;
    let rows = stmt.query_map([], row_to_user)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(AppError::Database)
}

pub fn get_by_id(pool: &DbPool, id: &str) -> Result<User, AppError> {
    let conn = pool.get()?;
    conn.query_row("SELECT * FROM users WHERE id = ?1", params![id], row_to_user)
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => AppError::NotFound(format!("User {id}")),
            other => AppError::Database(other),
        })
}

pub fn get_by_email(pool: &DbPool, email: &str) -> Result<User, AppError> {
    let conn = pool.get()?;
    conn.query_row("SELECT * FROM users WHERE email = ?1", params![email], row_to_user)
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => AppError::NotFound(format!("User {email}")),
            other => AppError::Database(other),
        })
}

pub fn create(pool: &DbPool, input: CreateUserInput, actor: &Actor) -> Result<User, AppError> {
    require_non_empty("name", &input.name)?;
    require_non_empty("email", &input.email)?;
    require_non_empty("password", &input.password)?;

    if get_by_email(pool, &input.email).is_ok() {
        return Err(AppError::Validation(format!(
            "email {} is already registered",
            input.email
        )));
    }

    let id = uuid::Uuid::new_v4().to_string();
    let now = chrono::Utc::now().to_rfc3339();

    let conn = pool.get()?;
    conn.execute(
        "INSERT INTO users (id, name, email, role, password_digest, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            id,
            input.name,
            input.email,
            input.role.as_str(),
            auth::digest(&input.password),
            now,
        ],
    )?;
    drop(conn);

    let user = get_by_id(pool, &id)?;
    activity::record(
        pool,
        ActivityAction::Added,
        EntityType::User,
        &user.id,
        &user.name,
        Some(serde_json::json!({
            "name": user.name,
            "email": user.email,
            "role": user.role,
        })),
        actor,
    )?;
    Ok(user)
}

pub fn delete(pool: &DbPool, id: &str, actor: &Actor) -> Result<(), AppError> {
    let user = get_by_id(pool, id)?;

    let conn = pool.get()?;
    conn.execute("DELETE FROM users WHERE id = ?1", params![id])?;
    drop(conn);

    activity::record(
        pool,
        ActivityAction::Deleted,
        EntityType::User,
        id,
        &user.name,
        None,
        actor,
    )?;
    Ok(())
}

pub fn touch_last_login(pool: &DbPool, id: &str) -> Result<(), AppError> {
    let now = chrono::Utc::now().to_rfc3339();
    let conn = pool.get()?;
    conn.execute(
        "UPDATE users SET last_login = ?1 WHERE id = ?2",
        params![now, id],
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
    fn test_seeded_users() {
        let pool = init_test_db().unwrap();
        let users = get_all(&pool).unwrap();
        assert_eq!(users.len(), 3);

        let admin = get_by_email(&pool, "admin@clearpath.com").unwrap();
        assert_eq!(admin.role, UserRole::Admin);
        assert!(admin.last_login.is_none());
    }

    #[test]
    fn test_create_rejects_duplicate_email() {
        let pool = init_test_db().unwrap();
        let result = create(
            &pool,
            CreateUserInput {
                name: "Second Admin".into(),
                email: "admin@clearpath.com".into(),
                role: UserRole::Admin,
                password: "whatever".into(),
            },
            &actor(),
        );
        assert!(matches!(result, Err(AppError::Validation(_))));
    }
}
