//! The closed catalogue of ledger actions the model may call.
//!
//! Names coming back from inference are untrusted strings; `ActionKind::from_name`
//! is the only way in, so anything outside the catalogue never reaches dispatch.

mod schemas;

use serde_json::{json, Value};

use crate::types::SubjectKind;

/// Bumped whenever an action's name or parameters change.
pub const CATALOGUE_VERSION: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    RecordTransactions,
    EditTransaction,
    DeleteTransaction,
    GetRecap,
    GetHistory,
    CheckTarget,
    AddDebt,
    PayDebt,
    ListDebts,
    DeleteDebt,
    AddObligation,
    EditObligation,
    CancelObligation,
    ListObligations,
    AddGoal,
    ContributeGoal,
    CancelGoal,
    ListGoals,
    SetDailySavings,
}

impl ActionKind {
    pub const ALL: [ActionKind; 19] = [
        ActionKind::RecordTransactions,
        ActionKind::EditTransaction,
        ActionKind::DeleteTransaction,
        ActionKind::GetRecap,
        ActionKind::GetHistory,
        ActionKind::CheckTarget,
        ActionKind::AddDebt,
        ActionKind::PayDebt,
        ActionKind::ListDebts,
        ActionKind::DeleteDebt,
        ActionKind::AddObligation,
        ActionKind::EditObligation,
        ActionKind::CancelObligation,
        ActionKind::ListObligations,
        ActionKind::AddGoal,
        ActionKind::ContributeGoal,
        ActionKind::CancelGoal,
        ActionKind::ListGoals,
        ActionKind::SetDailySavings,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ActionKind::RecordTransactions => "record_transactions",
            ActionKind::EditTransaction => "edit_transaction",
            ActionKind::DeleteTransaction => "delete_transaction",
            ActionKind::GetRecap => "get_recap",
            ActionKind::GetHistory => "get_history",
            ActionKind::CheckTarget => "check_target",
            ActionKind::AddDebt => "add_debt",
            ActionKind::PayDebt => "pay_debt",
            ActionKind::ListDebts => "list_debts",
            ActionKind::DeleteDebt => "delete_debt",
            ActionKind::AddObligation => "add_obligation",
            ActionKind::EditObligation => "edit_obligation",
            ActionKind::CancelObligation => "cancel_obligation",
            ActionKind::ListObligations => "list_obligations",
            ActionKind::AddGoal => "add_goal",
            ActionKind::ContributeGoal => "contribute_goal",
            ActionKind::CancelGoal => "cancel_goal",
            ActionKind::ListGoals => "list_goals",
            ActionKind::SetDailySavings => "set_daily_savings",
        }
    }

    /// Whitelist lookup. Exact match only: the model must use catalogue names.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|k| k.name() == name)
    }

    /// Deletes require a yes/no round trip before they run.
    pub fn is_destructive(&self) -> bool {
        self.subject_kind().is_some()
    }

    pub fn subject_kind(&self) -> Option<SubjectKind> {
        match self {
            ActionKind::DeleteTransaction => Some(SubjectKind::LedgerEntry),
            ActionKind::DeleteDebt => Some(SubjectKind::Debt),
            _ => None,
        }
    }

    /// Name of the line-item array for batch actions.
    pub fn batch_field(&self) -> Option<&'static str> {
        match self {
            ActionKind::RecordTransactions => Some("items"),
            _ => None,
        }
    }

    /// Top-level money fields checked by the validator.
    pub fn amount_fields(&self) -> &'static [&'static str] {
        match self {
            ActionKind::EditTransaction
            | ActionKind::PayDebt
            | ActionKind::AddObligation
            | ActionKind::EditObligation
            | ActionKind::ContributeGoal
            | ActionKind::SetDailySavings => &["amount"],
            ActionKind::AddDebt => &["amount", "installment_amount"],
            ActionKind::AddGoal => &["target_amount"],
            _ => &[],
        }
    }

    /// Read-only actions never change the ledger.
    pub fn is_read_only(&self) -> bool {
        matches!(
            self,
            ActionKind::GetRecap
                | ActionKind::GetHistory
                | ActionKind::CheckTarget
                | ActionKind::ListDebts
                | ActionKind::ListObligations
                | ActionKind::ListGoals
        )
    }

    /// Function schema (`name`, `description`, `parameters`).
    pub fn schema(&self) -> Value {
        schemas::schema_for(*self)
    }
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// OpenAI-format tool definitions for the given subset.
pub fn tool_definitions(kinds: &[ActionKind]) -> Vec<Value> {
    kinds
        .iter()
        .map(|kind| {
            json!({
                "type": "function",
                "function": kind.schema()
            })
        })
        .collect()
}

pub fn tool_name_from_definition(def: &Value) -> Option<&str> {
    def.get("function")
        .and_then(|f| f.get("name"))
        .and_then(|n| n.as_str())
}
