//! Dense-order reordering shared by every draggable list.
//!
//! The presentation layer owns the drag gesture; the core only sees the
//! resulting `(from, to)` move and recomputes dense 1-based order fields over
//! the whole list.

use crate::db::models::{
    Category, FaqLevel, PrimaryOption, Scenario, SecondaryOption, VerificationStep,
};
use crate::error::AppError;

/// Anything that carries a 1-based position in an ordered list.
pub trait Orderable {
    fn set_order(&mut self, order: i32);
}

impl Orderable for Category {
    fn set_order(&mut self, order: i32) {
        self.order = order;
    }
}

impl Orderable for Scenario {
    fn set_order(&mut self, order: i32) {
        self.order = order;
    }
}

impl Orderable for PrimaryOption {
    fn set_order(&mut self, order: i32) {
        self.order = order;
    }
}

impl Orderable for SecondaryOption {
    fn set_order(&mut self, order: i32) {
        self.order = order;
    }
}

impl Orderable for VerificationStep {
    fn set_order(&mut self, order: i32) {
        self.order = order;
    }
}

impl Orderable for FaqLevel {
    // FAQ levels use `level` as their position
    fn set_order(&mut self, order: i32) {
        self.level = order;
    }
}

/// Move `items[from]` to index `to`, then reassign order = index + 1 across
/// the whole list.
pub fn reorder<T: Orderable>(items: &mut Vec<T>, from: usize, to: usize) -> Result<(), AppError> {
    if from >= items.len() || to >= items.len() {
        return Err(AppError::Validation(format!(
            "reorder out of range: {from} -> {to} in list of {}",
            items.len()
        )));
    }

    let item = items.remove(from);
    items.insert(to, item);
    renumber(items);
    Ok(())
}

/// Reassign dense 1-based orders without moving anything. Used after
/// removals so gaps never appear in option lists.
pub fn renumber<T: Orderable>(items: &mut [T]) {
    for (idx, item) in items.iter_mut().enumerate() {
        item.set_order((idx + 1) as i32);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(n: usize) -> Vec<PrimaryOption> {
        (1..=n)
            .map(|i| PrimaryOption {
                id: format!("opt-{i}"),
                label: format!("Option {i}"),
                label_ar: format!("خيار {i}"),
                order: i as i32,
            })
            .collect()
    }

    #[test]
    fn test_reorder_moves_and_renumbers() {
        let mut items = options(4);
        reorder(&mut items, 3, 0).unwrap();

        let ids: Vec<&str> = items.iter().map(|o| o.id.as_str()).collect();
        assert_eq!(ids, vec!["opt-4", "opt-1", "opt-2", "opt-3"]);
        let orders: Vec<i32> = items.iter().map(|o| o.order).collect();
        assert_eq!(orders, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_reorder_same_index_is_noop() {
        let mut items = options(3);
        reorder(&mut items, 1, 1).unwrap();
        let ids: Vec<&str> = items.iter().map(|o| o.id.as_str()).collect();
        assert_eq!(ids, vec!["opt-1", "opt-2", "opt-3"]);
    }

    #[test]
    fn test_reorder_out_of_range() {
        let mut items = options(2);
        assert!(matches!(
            reorder(&mut items, 0, 5),
            Err(AppError::Validation(_))
        ));
    }
}
