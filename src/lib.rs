//! ClearPath core: the headless engine behind the support knowledge base.
//!
//! Content lives in an embedded SQLite store (`db`), agents work problems
//! through the session state machine (`engine::session`), editors maintain
//! the Unclear decision matrix (`engine::matrix`), and everything searchable
//! flows through the debounced search service (`engine::search`). Shells
//! (desktop or otherwise) sit on top of this crate and own all rendering.

pub mod auth;
pub mod clipboard;
pub mod db;
pub mod engine;
pub mod error;
pub mod i18n;
pub mod logging;
pub mod validation;

pub use db::DbPool;
pub use error::AppError;
pub use i18n::Language;
