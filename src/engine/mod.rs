pub mod matrix;
pub mod reorder;
pub mod search;
pub mod session;
