//! Agent-facing resolution flow for a single problem.
//!
//! A session is a small serializable state machine the embedding UI drives
//! with [`SessionEvent`]s. `apply` is pure: it never touches storage, and the
//! effective resolution is recomputed from the current problem on every
//! [`resolution`] call so concurrent edits by an editor are picked up
//! immediately instead of being cached.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::clipboard::CopyText;
use crate::db::models::{Instruction, Problem, Script, UnclearPath};
use crate::engine::matrix;
use crate::error::AppError;
use crate::i18n::Language;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum ResolutionChoice {
    Clear,
    Unclear,
}

/// Where the agent currently is in working one problem. Serializable so an
/// embedding shell can stash it across view changes.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SessionState {
    pub problem_id: String,
    /// Currently displayed FAQ level. Levels are jumpable in any order.
    pub faq_level: i32,
    pub verified_steps: BTreeSet<String>,
    pub choice: Option<ResolutionChoice>,
    pub primary_selection: Option<String>,
    pub secondary_selection: Option<String>,
}

impl SessionState {
    pub fn new(problem_id: &str) -> Self {
        Self {
            problem_id: problem_id.to_string(),
            faq_level: 1,
            verified_steps: BTreeSet::new(),
            choice: None,
            primary_selection: None,
            secondary_selection: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum SessionEvent {
    SelectFaqLevel(i32),
    ToggleVerification(String),
    ChooseResolution(ResolutionChoice),
    SelectPrimary(String),
    SelectSecondary(String),
    Restart,
}

/// The instruction/script bundle the agent acts on once a branch resolves.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ResolutionBundle {
    pub instructions: Vec<Instruction>,
    pub script: Option<Script>,
}

/// What the session currently resolves to. Recomputed per call, never cached.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum Resolution {
    /// No choice made yet, or the Unclear classification is incomplete.
    Pending,
    /// Both options are selected but nobody has curated content for the pair,
    /// or the chosen branch has not been configured on this problem.
    Unconfigured,
    Clear(ResolutionBundle),
    Unclear(ResolutionBundle),
}

/// Advance the session by one event. Pure; returns the next state.
pub fn apply(
    problem: &Problem,
    state: &SessionState,
    event: SessionEvent,
) -> Result<SessionState, AppError> {
    let mut next = state.clone();
    match event {
        SessionEvent::SelectFaqLevel(level) => {
            if !problem.faq_levels.iter().any(|f| f.level == level) {
                return Err(AppError::NotFound(format!(
                    "FAQ level {level} on problem {}",
                    problem.id
                )));
            }
            next.faq_level = level;
        }
        SessionEvent::ToggleVerification(step_id) => {
            if !problem.verification_steps.iter().any(|s| s.id == step_id) {
                return Err(AppError::StaleReference(format!(
                    "verification step {step_id} no longer exists"
                )));
            }
            if !next.verified_steps.remove(&step_id) {
                next.verified_steps.insert(step_id);
            }
        }
        SessionEvent::ChooseResolution(choice) => {
            next.choice = Some(choice);
            if choice == ResolutionChoice::Clear {
                next.primary_selection = None;
                next.secondary_selection = None;
            }
        }
        SessionEvent::SelectPrimary(option_id) => {
            require_unclear(&next)?;
            let path = unclear_path(problem)?;
            if !path.primary_options.iter().any(|o| o.id == option_id) {
                return Err(AppError::StaleReference(format!(
                    "primary option {option_id} no longer exists"
                )));
            }
            next.primary_selection = Some(option_id);
        }
        SessionEvent::SelectSecondary(option_id) => {
            require_unclear(&next)?;
            let path = unclear_path(problem)?;
            if !path.secondary_options.iter().any(|o| o.id == option_id) {
                return Err(AppError::StaleReference(format!(
                    "secondary option {option_id} no longer exists"
                )));
            }
            next.secondary_selection = Some(option_id);
        }
        SessionEvent::Restart => {
            next = SessionState::new(&state.problem_id);
        }
    }
    Ok(next)
}

/// The Clear branch bundle, instructions sorted by their order key.
pub fn resolve_clear(problem: &Problem) -> Result<ResolutionBundle, AppError> {
    let path = problem.clear_path.as_ref().ok_or_else(|| {
        AppError::NotFound(format!("clear path on problem {}", problem.id))
    })?;
    let mut instructions = path.instructions.clone();
    instructions.sort_by_key(|i| i.order);
    Ok(ResolutionBundle {
        instructions,
        script: path.script.clone(),
    })
}

/// The Unclear branch bundle for a selected pair. `Ok(None)` means the pair
/// has no curated mapping yet.
pub fn resolve_unclear(
    problem: &Problem,
    primary_id: &str,
    secondary_id: &str,
) -> Result<Option<ResolutionBundle>, AppError> {
    let path = unclear_path(problem)?;
    let Some(mapping) = matrix::lookup(path, primary_id, secondary_id)? else {
        return Ok(None);
    };
    let mut instructions = mapping.instructions.clone();
    instructions.sort_by_key(|i| i.order);
    Ok(Some(ResolutionBundle {
        instructions,
        script: mapping.script.clone(),
    }))
}

/// What the agent should see right now for this session.
///
/// Stale selections surface as `StaleReference`; callers typically follow up
/// with [`reconcile`] and re-render.
pub fn resolution(problem: &Problem, state: &SessionState) -> Result<Resolution, AppError> {
    match state.choice {
        None => Ok(Resolution::Pending),
        Some(ResolutionChoice::Clear) => match resolve_clear(problem) {
            Ok(bundle) => Ok(Resolution::Clear(bundle)),
            Err(AppError::NotFound(_)) => Ok(Resolution::Unconfigured),
            Err(other) => Err(other),
        },
        Some(ResolutionChoice::Unclear) => {
            let (Some(primary), Some(secondary)) =
                (&state.primary_selection, &state.secondary_selection)
            else {
                return Ok(Resolution::Pending);
            };
            match resolve_unclear(problem, primary, secondary)? {
                Some(bundle) => Ok(Resolution::Unclear(bundle)),
                None => Ok(Resolution::Unconfigured),
            }
        }
    }
}

/// Drop session references that no longer exist on the problem, sending the
/// agent back to the selection step rather than failing the whole session.
pub fn reconcile(problem: &Problem, state: &SessionState) -> SessionState {
    let mut next = state.clone();

    if !problem.faq_levels.iter().any(|f| f.level == next.faq_level) {
        next.faq_level = problem.faq_levels.iter().map(|f| f.level).min().unwrap_or(1);
    }

    let step_ids: BTreeSet<&str> = problem
        .verification_steps
        .iter()
        .map(|s| s.id.as_str())
        .collect();
    next.verified_steps.retain(|id| step_ids.contains(id.as_str()));

    let path = problem.unclear_path.as_ref();
    let primary_ok = |id: &String| {
        path.is_some_and(|p| p.primary_options.iter().any(|o| &o.id == id))
    };
    let secondary_ok = |id: &String| {
        path.is_some_and(|p| p.secondary_options.iter().any(|o| &o.id == id))
    };
    if next.primary_selection.as_ref().is_some_and(|id| !primary_ok(id)) {
        next.primary_selection = None;
    }
    if next.secondary_selection.as_ref().is_some_and(|id| !secondary_ok(id)) {
        next.secondary_selection = None;
    }
    next
}

/// Copy a script's content in the requested language to the given clipboard.
pub fn copy_script(
    clipboard: &dyn CopyText,
    script: &Script,
    lang: Language,
) -> Result<(), AppError> {
    clipboard.copy(script.content(lang))
}

fn require_unclear(state: &SessionState) -> Result<(), AppError> {
    if state.choice != Some(ResolutionChoice::Unclear) {
        return Err(AppError::Validation(
            "classification requires the Unclear branch".into(),
        ));
    }
    Ok(())
}

fn unclear_path(problem: &Problem) -> Result<&UnclearPath, AppError> {
    problem.unclear_path.as_ref().ok_or_else(|| {
        AppError::NotFound(format!("unclear path on problem {}", problem.id))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_test_db;
    use crate::db::repos::problems;
    use std::sync::Mutex;

    struct RecordingClipboard {
        copied: Mutex<Vec<String>>,
    }

    impl RecordingClipboard {
        fn new() -> Self {
            Self {
                copied: Mutex::new(Vec::new()),
            }
        }
    }

    impl CopyText for RecordingClipboard {
        fn copy(&self, text: &str) -> Result<(), AppError> {
            self.copied.lock().unwrap().push(text.to_string());
            Ok(())
        }
    }

    fn payment_problem() -> Problem {
        let pool = init_test_db().unwrap();
        problems::get_by_id(&pool, "prob-payment").unwrap()
    }

    #[test]
    fn test_session_starts_at_level_one_and_jumps_freely() {
        let problem = payment_problem();
        let state = SessionState::new(&problem.id);
        assert_eq!(state.faq_level, 1);

        let state = apply(&problem, &state, SessionEvent::SelectFaqLevel(2)).unwrap();
        assert_eq!(state.faq_level, 2);
        let state = apply(&problem, &state, SessionEvent::SelectFaqLevel(1)).unwrap();
        assert_eq!(state.faq_level, 1);

        assert!(matches!(
            apply(&problem, &state, SessionEvent::SelectFaqLevel(9)),
            Err(AppError::NotFound(_))
        ));
    }

    #[test]
    fn test_toggle_verification_is_a_toggle() {
        let problem = payment_problem();
        let state = SessionState::new(&problem.id);

        let state = apply(
            &problem,
            &state,
            SessionEvent::ToggleVerification("prob-payment-v1".into()),
        )
        .unwrap();
        assert!(state.verified_steps.contains("prob-payment-v1"));

        let state = apply(
            &problem,
            &state,
            SessionEvent::ToggleVerification("prob-payment-v1".into()),
        )
        .unwrap();
        assert!(state.verified_steps.is_empty());
    }

    #[test]
    fn test_clear_branch_returns_bundle_in_order() {
        let problem = payment_problem();
        let state = apply(
            &problem,
            &SessionState::new(&problem.id),
            SessionEvent::ChooseResolution(ResolutionChoice::Clear),
        )
        .unwrap();

        let Resolution::Clear(bundle) = resolution(&problem, &state).unwrap() else {
            panic!("expected a clear resolution");
        };
        let orders: Vec<i32> = bundle.instructions.iter().map(|i| i.order).collect();
        assert_eq!(orders, vec![1, 2, 3]);
        assert!(bundle.script.is_some());
    }

    #[test]
    fn test_unclear_flow_reaches_curated_mapping() {
        let problem = payment_problem();
        let mut state = SessionState::new(&problem.id);
        for event in [
            SessionEvent::ChooseResolution(ResolutionChoice::Unclear),
            SessionEvent::SelectPrimary("primary-3".into()),
            SessionEvent::SelectSecondary("secondary-1".into()),
        ] {
            state = apply(&problem, &state, event).unwrap();
        }

        let Resolution::Unclear(bundle) = resolution(&problem, &state).unwrap() else {
            panic!("expected an unclear resolution");
        };
        assert_eq!(bundle.instructions.len(), 3);
        assert!(bundle.script.is_some());
    }

    #[test]
    fn test_unclear_pair_without_mapping_is_unconfigured() {
        let problem = payment_problem();
        let mut state = SessionState::new(&problem.id);
        for event in [
            SessionEvent::ChooseResolution(ResolutionChoice::Unclear),
            SessionEvent::SelectPrimary("primary-1".into()),
            SessionEvent::SelectSecondary("secondary-1".into()),
        ] {
            state = apply(&problem, &state, event).unwrap();
        }

        assert!(matches!(
            resolution(&problem, &state).unwrap(),
            Resolution::Unconfigured
        ));
    }

    #[test]
    fn test_selection_requires_unclear_choice() {
        let problem = payment_problem();
        let state = SessionState::new(&problem.id);
        assert!(matches!(
            apply(&problem, &state, SessionEvent::SelectPrimary("primary-1".into())),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_stale_selection_surfaces_then_reconciles() {
        let mut problem = payment_problem();
        let mut state = SessionState::new(&problem.id);
        for event in [
            SessionEvent::ChooseResolution(ResolutionChoice::Unclear),
            SessionEvent::SelectPrimary("primary-3".into()),
            SessionEvent::SelectSecondary("secondary-1".into()),
        ] {
            state = apply(&problem, &state, event).unwrap();
        }

        // An editor removes the selected primary option concurrently
        let path = problem.unclear_path.as_mut().unwrap();
        matrix::remove_option(path, "primary-3").unwrap();

        assert!(matches!(
            resolution(&problem, &state),
            Err(AppError::StaleReference(_))
        ));

        let state = reconcile(&problem, &state);
        assert!(state.primary_selection.is_none());
        assert_eq!(state.secondary_selection.as_deref(), Some("secondary-1"));
        // Back to the selection step, still on the Unclear branch
        assert!(matches!(
            resolution(&problem, &state).unwrap(),
            Resolution::Pending
        ));
    }

    #[test]
    fn test_restart_resets_everything() {
        let problem = payment_problem();
        let mut state = SessionState::new(&problem.id);
        for event in [
            SessionEvent::SelectFaqLevel(2),
            SessionEvent::ToggleVerification("prob-payment-v1".into()),
            SessionEvent::ChooseResolution(ResolutionChoice::Unclear),
        ] {
            state = apply(&problem, &state, event).unwrap();
        }

        let state = apply(&problem, &state, SessionEvent::Restart).unwrap();
        assert_eq!(state.faq_level, 1);
        assert!(state.verified_steps.is_empty());
        assert!(state.choice.is_none());
    }

    #[test]
    fn test_copy_script_uses_requested_language() {
        let problem = payment_problem();
        let script = problem.clear_path.as_ref().unwrap().script.clone().unwrap();

        let clipboard = RecordingClipboard::new();
        copy_script(&clipboard, &script, Language::Ar).unwrap();

        let copied = clipboard.copied.lock().unwrap();
        assert_eq!(copied.len(), 1);
        assert_eq!(copied[0], script.content_ar);
    }
}
