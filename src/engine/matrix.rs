//! Decision-matrix editing and lookup for the Unclear branch.
//!
//! All operations here mutate an [`UnclearPath`] in memory; the problems repo
//! persists the whole structure when an edit session is saved. Mappings are
//! keyed by one primary and one secondary option id, with at most one mapping
//! per pair.

use std::collections::HashSet;

use crate::db::models::{
    Instruction, InstructionType, PrimaryOption, ResultMapping, Script, SecondaryOption,
    UnclearPath,
};
use crate::engine::reorder;
use crate::error::AppError;

/// A fresh, empty matrix for a problem that is getting an Unclear branch.
pub fn new_unclear_path() -> UnclearPath {
    UnclearPath {
        id: uuid::Uuid::new_v4().to_string(),
        ..Default::default()
    }
}

// ============================================================================
// Options
// ============================================================================

/// Append a primary option with order = len + 1. Labels may still be empty
/// while the editor is open; `validate` rejects them on save.
pub fn add_primary_option(path: &mut UnclearPath, label: &str, label_ar: &str) -> String {
    let id = uuid::Uuid::new_v4().to_string();
    let order = path.primary_options.len() as i32 + 1;
    path.primary_options.push(PrimaryOption {
        id: id.clone(),
        label: label.to_string(),
        label_ar: label_ar.to_string(),
        order,
    });
    id
}

/// Append a secondary option with order = len + 1.
pub fn add_secondary_option(path: &mut UnclearPath, label: &str, label_ar: &str) -> String {
    let id = uuid::Uuid::new_v4().to_string();
    let order = path.secondary_options.len() as i32 + 1;
    path.secondary_options.push(SecondaryOption {
        id: id.clone(),
        label: label.to_string(),
        label_ar: label_ar.to_string(),
        order,
    });
    id
}

/// Edit the labels of an option on either axis.
pub fn update_option(
    path: &mut UnclearPath,
    option_id: &str,
    label: Option<&str>,
    label_ar: Option<&str>,
) -> Result<(), AppError> {
    if let Some(opt) = path.primary_options.iter_mut().find(|o| o.id == option_id) {
        if let Some(label) = label {
            opt.label = label.to_string();
        }
        if let Some(label_ar) = label_ar {
            opt.label_ar = label_ar.to_string();
        }
        return Ok(());
    }
    if let Some(opt) = path.secondary_options.iter_mut().find(|o| o.id == option_id) {
        if let Some(label) = label {
            opt.label = label.to_string();
        }
        if let Some(label_ar) = label_ar {
            opt.label_ar = label_ar.to_string();
        }
        return Ok(());
    }
    Err(AppError::NotFound(format!("Option {option_id}")))
}

/// Remove an option from whichever axis holds it, cascade-delete every
/// mapping that references it on either axis, and renumber the axis so
/// orders stay dense.
pub fn remove_option(path: &mut UnclearPath, option_id: &str) -> Result<(), AppError> {
    let before_primary = path.primary_options.len();
    path.primary_options.retain(|o| o.id != option_id);
    let removed_primary = path.primary_options.len() != before_primary;

    let before_secondary = path.secondary_options.len();
    path.secondary_options.retain(|o| o.id != option_id);
    let removed_secondary = path.secondary_options.len() != before_secondary;

    if !removed_primary && !removed_secondary {
        return Err(AppError::NotFound(format!("Option {option_id}")));
    }

    path.result_mappings
        .retain(|m| m.primary_option_id != option_id && m.secondary_option_id != option_id);

    if removed_primary {
        reorder::renumber(&mut path.primary_options);
    }
    if removed_secondary {
        reorder::renumber(&mut path.secondary_options);
    }
    Ok(())
}

/// Move a primary option and persist dense orders.
pub fn reorder_primary(path: &mut UnclearPath, from: usize, to: usize) -> Result<(), AppError> {
    reorder::reorder(&mut path.primary_options, from, to)
}

/// Move a secondary option and persist dense orders.
pub fn reorder_secondary(path: &mut UnclearPath, from: usize, to: usize) -> Result<(), AppError> {
    reorder::reorder(&mut path.secondary_options, from, to)
}

// ============================================================================
// Mappings
// ============================================================================

/// Create a blank mapping for every (primary, secondary) pair that does not
/// have one yet. Existing mappings are untouched, so the operation is
/// idempotent and never loses curated content. Returns how many mappings
/// were created.
pub fn generate_mappings(path: &mut UnclearPath) -> usize {
    let existing: HashSet<(String, String)> = path
        .result_mappings
        .iter()
        .map(|m| (m.primary_option_id.clone(), m.secondary_option_id.clone()))
        .collect();

    let mut created = 0;
    for primary in &path.primary_options {
        for secondary in &path.secondary_options {
            let key = (primary.id.clone(), secondary.id.clone());
            if existing.contains(&key) {
                continue;
            }
            path.result_mappings.push(ResultMapping {
                id: uuid::Uuid::new_v4().to_string(),
                primary_option_id: primary.id.clone(),
                secondary_option_id: secondary.id.clone(),
                instructions: Vec::new(),
                script: None,
            });
            created += 1;
        }
    }
    created
}

/// Attach or clear the suggested script on a mapping.
pub fn set_mapping_script(
    path: &mut UnclearPath,
    mapping_id: &str,
    script: Option<Script>,
) -> Result<(), AppError> {
    let mapping = mapping_mut(path, mapping_id)?;
    mapping.script = script;
    Ok(())
}

/// Append an instruction to a mapping with order = len + 1.
pub fn add_instruction(
    path: &mut UnclearPath,
    mapping_id: &str,
    content: &str,
    content_ar: &str,
    kind: InstructionType,
) -> Result<String, AppError> {
    let mapping = mapping_mut(path, mapping_id)?;
    let id = uuid::Uuid::new_v4().to_string();
    let order = mapping.instructions.len() as i32 + 1;
    mapping.instructions.push(Instruction {
        id: id.clone(),
        content: content.to_string(),
        content_ar: content_ar.to_string(),
        order,
        kind,
    });
    Ok(id)
}

/// Edit an instruction in place.
pub fn update_instruction(
    path: &mut UnclearPath,
    mapping_id: &str,
    instruction_id: &str,
    content: Option<&str>,
    content_ar: Option<&str>,
    kind: Option<InstructionType>,
) -> Result<(), AppError> {
    let mapping = mapping_mut(path, mapping_id)?;
    let instruction = mapping
        .instructions
        .iter_mut()
        .find(|i| i.id == instruction_id)
        .ok_or_else(|| AppError::NotFound(format!("Instruction {instruction_id}")))?;

    if let Some(content) = content {
        instruction.content = content.to_string();
    }
    if let Some(content_ar) = content_ar {
        instruction.content_ar = content_ar.to_string();
    }
    if let Some(kind) = kind {
        instruction.kind = kind;
    }
    Ok(())
}

/// Remove an instruction. Remaining orders are NOT renumbered; `order` is a
/// sort key and gaps are fine.
pub fn remove_instruction(
    path: &mut UnclearPath,
    mapping_id: &str,
    instruction_id: &str,
) -> Result<(), AppError> {
    let mapping = mapping_mut(path, mapping_id)?;
    let before = mapping.instructions.len();
    mapping.instructions.retain(|i| i.id != instruction_id);
    if mapping.instructions.len() == before {
        return Err(AppError::NotFound(format!("Instruction {instruction_id}")));
    }
    Ok(())
}

/// Find the mapping for a selected (primary, secondary) pair.
///
/// A missing option id means the agent is holding a stale selection; a
/// missing mapping for two valid options means the pair has no curated
/// content yet, which callers surface as a neutral state.
pub fn lookup<'a>(
    path: &'a UnclearPath,
    primary_id: &str,
    secondary_id: &str,
) -> Result<Option<&'a ResultMapping>, AppError> {
    if !path.primary_options.iter().any(|o| o.id == primary_id) {
        return Err(AppError::StaleReference(format!(
            "primary option {primary_id} no longer exists"
        )));
    }
    if !path.secondary_options.iter().any(|o| o.id == secondary_id) {
        return Err(AppError::StaleReference(format!(
            "secondary option {secondary_id} no longer exists"
        )));
    }
    Ok(path
        .result_mappings
        .iter()
        .find(|m| m.primary_option_id == primary_id && m.secondary_option_id == secondary_id))
}

// ============================================================================
// Validation
// ============================================================================

/// Structural checks applied before an Unclear branch is persisted:
/// non-empty labels, unique (primary, secondary) pairs, and no mapping that
/// references a removed option.
pub fn validate(path: &UnclearPath) -> Result<(), AppError> {
    for opt in &path.primary_options {
        if opt.label.trim().is_empty() {
            return Err(AppError::Validation(format!(
                "primary option {} has an empty label",
                opt.id
            )));
        }
    }
    for opt in &path.secondary_options {
        if opt.label.trim().is_empty() {
            return Err(AppError::Validation(format!(
                "secondary option {} has an empty label",
                opt.id
            )));
        }
    }

    let primary_ids: HashSet<&str> = path.primary_options.iter().map(|o| o.id.as_str()).collect();
    let secondary_ids: HashSet<&str> =
        path.secondary_options.iter().map(|o| o.id.as_str()).collect();

    let mut seen_pairs = HashSet::new();
    for mapping in &path.result_mappings {
        if !primary_ids.contains(mapping.primary_option_id.as_str()) {
            return Err(AppError::Validation(format!(
                "mapping {} references unknown primary option {}",
                mapping.id, mapping.primary_option_id
            )));
        }
        if !secondary_ids.contains(mapping.secondary_option_id.as_str()) {
            return Err(AppError::Validation(format!(
                "mapping {} references unknown secondary option {}",
                mapping.id, mapping.secondary_option_id
            )));
        }
        if !seen_pairs.insert((
            mapping.primary_option_id.as_str(),
            mapping.secondary_option_id.as_str(),
        )) {
            return Err(AppError::Validation(format!(
                "duplicate mapping for pair ({}, {})",
                mapping.primary_option_id, mapping.secondary_option_id
            )));
        }
    }
    Ok(())
}

fn mapping_mut<'a>(
    path: &'a mut UnclearPath,
    mapping_id: &str,
) -> Result<&'a mut ResultMapping, AppError> {
    path.result_mappings
        .iter_mut()
        .find(|m| m.id == mapping_id)
        .ok_or_else(|| AppError::NotFound(format!("Mapping {mapping_id}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_by_two() -> (UnclearPath, Vec<String>, Vec<String>) {
        let mut path = new_unclear_path();
        let p = vec![
            add_primary_option(&mut path, "Payment Issue", "مشكلة دفع"),
            add_primary_option(&mut path, "Technical Issue", "مشكلة تقنية"),
        ];
        let s = vec![
            add_secondary_option(&mut path, "Urgent", "عاجل"),
            add_secondary_option(&mut path, "Standard", "عادي"),
        ];
        (path, p, s)
    }

    #[test]
    fn test_generate_covers_every_pair() {
        let (mut path, p, s) = two_by_two();
        let created = generate_mappings(&mut path);
        assert_eq!(created, 4);
        assert_eq!(path.result_mappings.len(), 4);

        for pid in &p {
            for sid in &s {
                assert!(lookup(&path, pid, sid).unwrap().is_some());
            }
        }
    }

    #[test]
    fn test_generate_is_idempotent_and_preserves_content() {
        let (mut path, p, s) = two_by_two();
        generate_mappings(&mut path);

        let mapping_id = lookup(&path, &p[0], &s[0]).unwrap().unwrap().id.clone();
        add_instruction(
            &mut path,
            &mapping_id,
            "Check the payment gateway logs",
            "تحقق من سجلات بوابة الدفع",
            InstructionType::Action,
        )
        .unwrap();

        let created = generate_mappings(&mut path);
        assert_eq!(created, 0);
        assert_eq!(path.result_mappings.len(), 4);

        let kept = lookup(&path, &p[0], &s[0]).unwrap().unwrap();
        assert_eq!(kept.id, mapping_id);
        assert_eq!(kept.instructions.len(), 1);
    }

    #[test]
    fn test_generate_fills_only_missing_pairs_after_add() {
        let (mut path, _, _) = two_by_two();
        generate_mappings(&mut path);

        add_primary_option(&mut path, "Account Problem", "مشكلة حساب");
        let created = generate_mappings(&mut path);
        // One new primary against two secondaries
        assert_eq!(created, 2);
        assert_eq!(path.result_mappings.len(), 6);
    }

    #[test]
    fn test_remove_option_cascades_mappings() {
        let (mut path, p, s) = two_by_two();
        generate_mappings(&mut path);

        remove_option(&mut path, &p[0]).unwrap();
        assert_eq!(path.primary_options.len(), 1);
        assert_eq!(path.result_mappings.len(), 2);
        assert!(path
            .result_mappings
            .iter()
            .all(|m| m.primary_option_id != p[0]));
        // Surviving primary got renumbered
        assert_eq!(path.primary_options[0].order, 1);

        // Lookup against the removed id is a stale reference, not a miss
        assert!(matches!(
            lookup(&path, &p[0], &s[0]),
            Err(AppError::StaleReference(_))
        ));
    }

    #[test]
    fn test_remove_secondary_cascades_on_second_axis() {
        let (mut path, _, s) = two_by_two();
        generate_mappings(&mut path);

        remove_option(&mut path, &s[1]).unwrap();
        assert_eq!(path.secondary_options.len(), 1);
        assert_eq!(path.result_mappings.len(), 2);
        assert!(path
            .result_mappings
            .iter()
            .all(|m| m.secondary_option_id != s[1]));
    }

    #[test]
    fn test_lookup_miss_is_unconfigured_not_error() {
        let (path, p, s) = two_by_two();
        // No mappings generated yet
        assert!(lookup(&path, &p[1], &s[1]).unwrap().is_none());
    }

    #[test]
    fn test_instruction_orders_keep_gaps_after_removal() {
        let (mut path, p, s) = two_by_two();
        generate_mappings(&mut path);
        let mapping_id = lookup(&path, &p[0], &s[0]).unwrap().unwrap().id.clone();

        let first = add_instruction(&mut path, &mapping_id, "One", "واحد", InstructionType::Text)
            .unwrap();
        add_instruction(&mut path, &mapping_id, "Two", "اثنان", InstructionType::Text).unwrap();
        remove_instruction(&mut path, &mapping_id, &first).unwrap();

        let mapping = lookup(&path, &p[0], &s[0]).unwrap().unwrap();
        assert_eq!(mapping.instructions.len(), 1);
        // Survivor keeps its original order; the next append continues from len + 1
        assert_eq!(mapping.instructions[0].order, 2);
    }

    #[test]
    fn test_validate_rejects_duplicate_pair() {
        let (mut path, _, _) = two_by_two();
        generate_mappings(&mut path);

        let dup = path.result_mappings[0].clone();
        path.result_mappings.push(ResultMapping {
            id: "dup".into(),
            ..dup
        });
        assert!(matches!(validate(&path), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_validate_rejects_empty_label_and_dangling_reference() {
        let (mut path, p, _) = two_by_two();
        generate_mappings(&mut path);

        update_option(&mut path, &p[0], Some("   "), None).unwrap();
        assert!(matches!(validate(&path), Err(AppError::Validation(_))));
        update_option(&mut path, &p[0], Some("Payment Issue"), None).unwrap();
        assert!(validate(&path).is_ok());

        path.result_mappings[0].primary_option_id = "ghost".into();
        assert!(matches!(validate(&path), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_set_mapping_script_and_clear() {
        let (mut path, p, s) = two_by_two();
        generate_mappings(&mut path);
        let mapping_id = lookup(&path, &p[0], &s[0]).unwrap().unwrap().id.clone();

        assert!(matches!(
            set_mapping_script(&mut path, "no-such-mapping", None),
            Err(AppError::NotFound(_))
        ));
        set_mapping_script(&mut path, &mapping_id, None).unwrap();
        assert!(lookup(&path, &p[0], &s[0]).unwrap().unwrap().script.is_none());
    }
}
