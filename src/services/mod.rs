//! Ledger-side handlers, one per catalogue action.
//!
//! Handlers take already-validated arguments. Missing or unusable details and
//! unknown entities come back as a clarification outcome, not an error; errors
//! are reserved for storage failures.

mod debts;
mod goals;
mod obligations;
mod reports;
mod transactions;

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::actions::ActionKind;
use crate::traits::LedgerStore;

pub use debts::{add_debt, describe_debt_deletion, delete_debt, list_debts, pay_debt};
pub use goals::{add_goal, cancel_goal, contribute_goal, list_goals, set_daily_savings};
pub use obligations::{add_obligation, cancel_obligation, edit_obligation, list_obligations};
pub use reports::{check_target, get_history, get_recap, progress_summary, target_breakdown};
pub use transactions::{
    delete_transaction, describe_transaction_deletion, edit_transaction, record_transactions,
};

/// Result of running one action for the user.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionOutcome {
    pub kind: ActionKind,
    pub message: String,
    /// True when at least one income entry was written.
    pub recorded_income: bool,
    /// The action did not run because something was missing or not found.
    pub needs_clarification: bool,
}

impl ActionOutcome {
    pub fn done(kind: ActionKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            recorded_income: false,
            needs_clarification: false,
        }
    }

    pub fn clarify(kind: ActionKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            recorded_income: false,
            needs_clarification: true,
        }
    }
}

/// A destructive action resolved to one concrete row, ready to be parked
/// for confirmation.
#[derive(Debug, Clone, PartialEq)]
pub enum DeletionPlan {
    Ready {
        description: String,
        /// Arguments with the row id pinned, so confirming deletes exactly this row.
        payload: Map<String, Value>,
    },
    NotFound(ActionOutcome),
}

/// What a handler needs besides its arguments.
pub struct ServiceContext<'a> {
    pub ledger: &'a dyn LedgerStore,
    pub user_id: &'a str,
    pub today: NaiveDate,
}

/// Deserialize arguments into a typed struct; `None` on shape mismatch.
pub(crate) fn parse_args<T: DeserializeOwned>(args: &Map<String, Value>) -> Option<T> {
    serde_json::from_value(Value::Object(args.clone())).ok()
}

pub(crate) fn unclear(kind: ActionKind) -> ActionOutcome {
    ActionOutcome::clarify(
        kind,
        "Detailnya kurang jelas nih. Bisa diulang dengan nominal dan keterangannya?",
    )
}

/// Amount fields arrive as numbers after validation, but the model may
/// still send floats.
pub(crate) fn amount_of(value: Option<f64>) -> Option<i64> {
    value.map(|v| v.round() as i64).filter(|v| *v > 0)
}
