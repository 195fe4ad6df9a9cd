use rusqlite::Connection;

use crate::error::AppError;

/// Run the consolidated schema migration. Idempotent; safe to run on every
/// pool init.
pub fn run(conn: &Connection) -> Result<(), AppError> {
    tracing::debug!("Running database migrations");

    conn.execute_batch(SCHEMA)?;

    tracing::info!("Database migrations complete");
    Ok(())
}

const SCHEMA: &str = r#"

-- ============================================================================
-- Categories (must precede scenarios due to FK)
-- ============================================================================

CREATE TABLE IF NOT EXISTS categories (
    id              TEXT PRIMARY KEY,
    name            TEXT NOT NULL,
    name_ar         TEXT NOT NULL,
    icon            TEXT,
    color           TEXT,
    description     TEXT NOT NULL DEFAULT '',
    description_ar  TEXT NOT NULL DEFAULT '',
    sort_order      INTEGER NOT NULL DEFAULT 0,
    is_active       INTEGER NOT NULL DEFAULT 1
);
CREATE INDEX IF NOT EXISTS idx_categories_sort ON categories(sort_order);

-- ============================================================================
-- Scenarios
-- ============================================================================

CREATE TABLE IF NOT EXISTS scenarios (
    id          TEXT PRIMARY KEY,
    name        TEXT NOT NULL,
    name_ar     TEXT NOT NULL,
    category_id TEXT NOT NULL REFERENCES categories(id) ON DELETE CASCADE,
    icon        TEXT,
    color       TEXT,
    sort_order  INTEGER NOT NULL DEFAULT 0,
    is_active   INTEGER NOT NULL DEFAULT 1
);
CREATE INDEX IF NOT EXISTS idx_scenarios_category ON scenarios(category_id);

-- ============================================================================
-- Problems
--
-- Nested curation (FAQ levels, verification steps, clear/unclear paths) is
-- stored as JSON text columns; the matrix engine operates on the decoded
-- structs and the repo writes them back wholesale.
-- ============================================================================

CREATE TABLE IF NOT EXISTS problems (
    id                  TEXT PRIMARY KEY,
    title               TEXT NOT NULL,
    title_ar            TEXT NOT NULL,
    category_id         TEXT NOT NULL REFERENCES categories(id) ON DELETE CASCADE,
    scenario_id         TEXT NOT NULL REFERENCES scenarios(id) ON DELETE CASCADE,
    priority            TEXT NOT NULL DEFAULT 'medium',
    status              TEXT NOT NULL DEFAULT 'pending',
    faq_levels          TEXT NOT NULL DEFAULT '[]',
    verification_steps  TEXT NOT NULL DEFAULT '[]',
    clear_path          TEXT,
    unclear_path        TEXT,
    tags                TEXT NOT NULL DEFAULT '[]',
    created_at          TEXT NOT NULL,
    updated_at          TEXT NOT NULL,
    created_by          TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_problems_category ON problems(category_id);
CREATE INDEX IF NOT EXISTS idx_problems_scenario ON problems(scenario_id);
CREATE INDEX IF NOT EXISTS idx_problems_status   ON problems(status);

-- ============================================================================
-- Scripts
-- ============================================================================

CREATE TABLE IF NOT EXISTS scripts (
    id          TEXT PRIMARY KEY,
    title       TEXT NOT NULL,
    title_ar    TEXT NOT NULL,
    content     TEXT NOT NULL,
    content_ar  TEXT NOT NULL,
    category    TEXT NOT NULL DEFAULT '',
    tags        TEXT NOT NULL DEFAULT '[]',
    color       TEXT,
    is_template INTEGER NOT NULL DEFAULT 0,
    variables   TEXT NOT NULL DEFAULT '[]',
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL,
    created_by  TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_scripts_category ON scripts(category);

-- ============================================================================
-- Users
-- ============================================================================

CREATE TABLE IF NOT EXISTS users (
    id              TEXT PRIMARY KEY,
    name            TEXT NOT NULL,
    email           TEXT NOT NULL UNIQUE,
    role            TEXT NOT NULL DEFAULT 'Agent',
    password_digest TEXT NOT NULL,
    created_at      TEXT NOT NULL,
    last_login      TEXT
);

-- ============================================================================
-- Activity log (append-only; no UPDATE/DELETE path exists in the repos)
-- ============================================================================

CREATE TABLE IF NOT EXISTS activity_log (
    id          TEXT PRIMARY KEY,
    action      TEXT NOT NULL,
    entity_type TEXT NOT NULL,
    entity_id   TEXT NOT NULL,
    entity_name TEXT NOT NULL,
    changes     TEXT,
    user_id     TEXT NOT NULL,
    user_name   TEXT NOT NULL,
    timestamp   TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_activity_timestamp ON activity_log(timestamp DESC);
CREATE INDEX IF NOT EXISTS idx_activity_entity    ON activity_log(entity_type, entity_id);

"#;
