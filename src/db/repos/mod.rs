pub mod activity;
pub mod categories;
pub mod problems;
pub mod scenarios;
pub mod scripts;
pub mod users;

/// The acting editor/agent, attributed on every audit entry.
#[derive(Debug, Clone)]
pub struct Actor {
    pub user_id: String,
    pub user_name: String,
}

impl Actor {
    pub fn new(user_id: impl Into<String>, user_name: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            user_name: user_name.into(),
        }
    }
}

/// Map an unexpected enum column value to a rusqlite conversion error so row
/// mappers stay `rusqlite::Result`.
pub(crate) fn bad_column(col: &str, value: &str) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        0,
        rusqlite::types::Type::Text,
        format!("unexpected {col} value: {value}").into(),
    )
}

/// Decode a JSON text column inside a row mapper.
pub(crate) fn decode_json<T: serde::de::DeserializeOwned>(
    col: &str,
    raw: &str,
) -> rusqlite::Result<T> {
    serde_json::from_str(raw).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(
            0,
            rusqlite::types::Type::Text,
            format!("invalid JSON in {col}: {e}").into(),
        )
    })
}
