//! Financial derivations over raw ledger rows: debt terms, due status and the
//! daily earning target. Everything here is pure; callers pass `today`.

pub mod due;
pub mod interest;
pub mod matching;
pub mod target;

pub use due::{debt_daily_installment, debt_due_status, DueInfo, DueStatus};
pub use interest::{compute_terms, DebtTerms};
pub use matching::find_by_name;
pub use target::{build_breakdown, TargetBreakdown, TargetInputs, EXPENSE_WINDOW_DAYS};
