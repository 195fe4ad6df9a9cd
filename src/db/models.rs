use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::i18n::Language;

// ============================================================================
// Category
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Category {
    pub id: String,
    pub name: String,
    pub name_ar: String,
    pub icon: Option<String>,
    pub color: Option<String>,
    pub description: String,
    pub description_ar: String,
    pub order: i32,
    pub is_active: bool,
}

impl Category {
    pub fn name(&self, lang: Language) -> &str {
        lang.pick(&self.name, &self.name_ar)
    }

    pub fn description(&self, lang: Language) -> &str {
        lang.pick(&self.description, &self.description_ar)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CreateCategoryInput {
    pub name: String,
    pub name_ar: String,
    pub description: String,
    pub description_ar: String,
    pub icon: Option<String>,
    pub color: Option<String>,
    pub order: Option<i32>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct UpdateCategoryInput {
    pub name: Option<String>,
    pub name_ar: Option<String>,
    pub description: Option<String>,
    pub description_ar: Option<String>,
    pub icon: Option<String>,
    pub color: Option<String>,
    pub order: Option<i32>,
    pub is_active: Option<bool>,
}

// ============================================================================
// Scenario
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Scenario {
    pub id: String,
    pub name: String,
    pub name_ar: String,
    pub category_id: String,
    pub icon: Option<String>,
    pub color: Option<String>,
    pub order: i32,
    pub is_active: bool,
}

impl Scenario {
    pub fn name(&self, lang: Language) -> &str {
        lang.pick(&self.name, &self.name_ar)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CreateScenarioInput {
    pub name: String,
    pub name_ar: String,
    pub category_id: String,
    pub icon: Option<String>,
    pub color: Option<String>,
    pub order: Option<i32>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct UpdateScenarioInput {
    pub name: Option<String>,
    pub name_ar: Option<String>,
    pub category_id: Option<String>,
    pub icon: Option<String>,
    pub color: Option<String>,
    pub order: Option<i32>,
    pub is_active: Option<bool>,
}

// ============================================================================
// Problem
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "low" => Some(Priority::Low),
            "medium" => Some(Priority::Medium),
            "high" => Some(Priority::High),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum ProblemStatus {
    #[default]
    Pending,
    Investigating,
    Resolved,
}

impl ProblemStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProblemStatus::Pending => "pending",
            ProblemStatus::Investigating => "investigating",
            ProblemStatus::Resolved => "resolved",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(ProblemStatus::Pending),
            "investigating" => Some(ProblemStatus::Investigating),
            "resolved" => Some(ProblemStatus::Resolved),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Problem {
    pub id: String,
    pub title: String,
    pub title_ar: String,
    pub category_id: String,
    pub scenario_id: String,
    pub priority: Priority,
    pub status: ProblemStatus,
    pub faq_levels: Vec<FaqLevel>,
    pub verification_steps: Vec<VerificationStep>,
    pub clear_path: Option<ClearPath>,
    pub unclear_path: Option<UnclearPath>,
    pub tags: Vec<String>,
    pub created_at: String,
    pub updated_at: String,
    pub created_by: String,
}

impl Problem {
    pub fn title(&self, lang: Language) -> &str {
        lang.pick(&self.title, &self.title_ar)
    }

    /// Flat search content: every FAQ question and answer, concatenated.
    pub fn search_content(&self) -> String {
        self.faq_levels
            .iter()
            .map(|faq| format!("{} {}", faq.question, faq.answer))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// A graded disambiguating question/answer pair. Levels are browsed
/// non-sequentially by the agent; `is_required` is informational only and
/// never gates progression.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct FaqLevel {
    pub id: String,
    pub level: i32,
    pub question: String,
    pub question_ar: String,
    pub answer: String,
    pub answer_ar: String,
    pub is_required: bool,
}

impl FaqLevel {
    pub fn question(&self, lang: Language) -> &str {
        lang.pick(&self.question, &self.question_ar)
    }

    pub fn answer(&self, lang: Language) -> &str {
        lang.pick(&self.answer, &self.answer_ar)
    }
}

/// A checklist item the agent marks complete while working a problem.
/// Completion is unordered set membership; `is_required` never gates the
/// Clear/Unclear choice.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct VerificationStep {
    pub id: String,
    pub step: String,
    pub step_ar: String,
    pub order: i32,
    pub is_required: bool,
}

impl VerificationStep {
    pub fn step(&self, lang: Language) -> &str {
        lang.pick(&self.step, &self.step_ar)
    }
}

// ============================================================================
// Resolution paths
// ============================================================================

/// The single resolution bundle shown when the agent marks the issue Clear.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ClearPath {
    pub id: String,
    pub instructions: Vec<Instruction>,
    pub script: Option<Script>,
}

/// The two-axis classification branch for Unclear issues. Every mapping
/// references one existing primary and one existing secondary option id;
/// at most one mapping exists per (primary, secondary) pair.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct UnclearPath {
    pub id: String,
    pub primary_options: Vec<PrimaryOption>,
    pub secondary_options: Vec<SecondaryOption>,
    pub result_mappings: Vec<ResultMapping>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PrimaryOption {
    pub id: String,
    pub label: String,
    pub label_ar: String,
    pub order: i32,
}

impl PrimaryOption {
    pub fn label(&self, lang: Language) -> &str {
        lang.pick(&self.label, &self.label_ar)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SecondaryOption {
    pub id: String,
    pub label: String,
    pub label_ar: String,
    pub order: i32,
}

impl SecondaryOption {
    pub fn label(&self, lang: Language) -> &str {
        lang.pick(&self.label, &self.label_ar)
    }
}

/// The cell of the decision matrix: the curated instruction/script bundle
/// keyed by one primary and one secondary option.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ResultMapping {
    pub id: String,
    pub primary_option_id: String,
    pub secondary_option_id: String,
    pub instructions: Vec<Instruction>,
    pub script: Option<Script>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum InstructionType {
    #[default]
    Text,
    Action,
    Warning,
    Info,
}

/// A single resolution instruction. `order` is append-assigned and not
/// renumbered after deletions, so gaps can appear; consumers treat it as a
/// sort key, not a dense index.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Instruction {
    pub id: String,
    pub content: String,
    pub content_ar: String,
    pub order: i32,
    #[serde(rename = "type")]
    pub kind: InstructionType,
}

impl Instruction {
    pub fn content(&self, lang: Language) -> &str {
        lang.pick(&self.content, &self.content_ar)
    }
}

// ============================================================================
// Script
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Script {
    pub id: String,
    pub title: String,
    pub title_ar: String,
    pub content: String,
    pub content_ar: String,
    pub category: String,
    pub tags: Vec<String>,
    pub color: Option<String>,
    pub is_template: bool,
    pub variables: Vec<ScriptVariable>,
    pub created_at: String,
    pub updated_at: String,
    pub created_by: String,
}

impl Script {
    pub fn title(&self, lang: Language) -> &str {
        lang.pick(&self.title, &self.title_ar)
    }

    pub fn content(&self, lang: Language) -> &str {
        lang.pick(&self.content, &self.content_ar)
    }
}

/// Declarative metadata for a placeholder token embedded in script content
/// (e.g. `[Customer Name]`). The core never substitutes variables; editors
/// insert and replace tokens manually.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ScriptVariable {
    pub id: String,
    pub name: String,
    pub placeholder: String,
    pub description: String,
    pub is_required: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CreateScriptInput {
    pub title: String,
    pub title_ar: String,
    pub content: String,
    pub content_ar: String,
    pub category: String,
    pub tags: Option<Vec<String>>,
    pub color: Option<String>,
    pub is_template: Option<bool>,
    pub variables: Option<Vec<ScriptVariable>>,
    pub created_by: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct UpdateScriptInput {
    pub title: Option<String>,
    pub title_ar: Option<String>,
    pub content: Option<String>,
    pub content_ar: Option<String>,
    pub category: Option<String>,
    pub tags: Option<Vec<String>>,
    pub color: Option<Option<String>>,
    pub is_template: Option<bool>,
    pub variables: Option<Vec<ScriptVariable>>,
}

// ============================================================================
// Problem inputs
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CreateProblemInput {
    pub title: String,
    pub title_ar: String,
    pub category_id: String,
    pub scenario_id: String,
    pub priority: Option<Priority>,
    pub status: Option<ProblemStatus>,
    pub faq_levels: Option<Vec<FaqLevel>>,
    pub verification_steps: Option<Vec<VerificationStep>>,
    pub clear_path: Option<ClearPath>,
    pub unclear_path: Option<UnclearPath>,
    pub tags: Option<Vec<String>>,
    pub created_by: String,
}

/// Nested lists are replaced wholesale when provided; `clear_path` and
/// `unclear_path` use the double-Option pattern so `Some(None)` clears them.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct UpdateProblemInput {
    pub title: Option<String>,
    pub title_ar: Option<String>,
    pub category_id: Option<String>,
    pub scenario_id: Option<String>,
    pub priority: Option<Priority>,
    pub status: Option<ProblemStatus>,
    pub faq_levels: Option<Vec<FaqLevel>>,
    pub verification_steps: Option<Vec<VerificationStep>>,
    pub clear_path: Option<Option<ClearPath>>,
    pub unclear_path: Option<Option<UnclearPath>>,
    pub tags: Option<Vec<String>>,
}

// ============================================================================
// User
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum UserRole {
    Admin,
    Editor,
    Agent,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "Admin",
            UserRole::Editor => "Editor",
            UserRole::Agent => "Agent",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Admin" => Some(UserRole::Admin),
            "Editor" => Some(UserRole::Editor),
            "Agent" => Some(UserRole::Agent),
            _ => None,
        }
    }
}

/// Editor/agent account. `password_digest` never leaves the crate; the
/// public-facing struct skips it on serialization.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    #[serde(skip_serializing)]
    #[ts(skip)]
    pub password_digest: String,
    pub created_at: String,
    pub last_login: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CreateUserInput {
    pub name: String,
    pub email: String,
    pub role: UserRole,
    pub password: String,
}

// ============================================================================
// Activity log
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum ActivityAction {
    Added,
    Edited,
    Deleted,
}

impl ActivityAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityAction::Added => "Added",
            ActivityAction::Edited => "Edited",
            ActivityAction::Deleted => "Deleted",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Added" => Some(ActivityAction::Added),
            "Edited" => Some(ActivityAction::Edited),
            "Deleted" => Some(ActivityAction::Deleted),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum EntityType {
    Category,
    Scenario,
    Problem,
    Script,
    User,
}

impl EntityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::Category => "Category",
            EntityType::Scenario => "Scenario",
            EntityType::Problem => "Problem",
            EntityType::Script => "Script",
            EntityType::User => "User",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Category" => Some(EntityType::Category),
            "Scenario" => Some(EntityType::Scenario),
            "Problem" => Some(EntityType::Problem),
            "Script" => Some(EntityType::Script),
            "User" => Some(EntityType::User),
            _ => None,
        }
    }
}

/// One append-only audit entry per mutation. Entries are never edited or
/// deleted after insert.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ActivityLog {
    pub id: String,
    pub action: ActivityAction,
    pub entity_type: EntityType,
    pub entity_id: String,
    pub entity_name: String,
    /// Changed-field map, field name -> new value.
    #[ts(type = "Record<string, unknown> | null")]
    pub changes: Option<serde_json::Value>,
    pub user_id: String,
    pub user_name: String,
    pub timestamp: String,
}
