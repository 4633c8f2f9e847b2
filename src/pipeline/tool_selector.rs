use once_cell::sync::Lazy;
use regex::Regex;

use super::classifier::EDIT_REQUEST;
use crate::actions::ActionKind;

/// One keyword rule: when `pattern` matches, offer `actions` to the model.
struct ToolRule {
    pattern: Regex,
    actions: &'static [ActionKind],
    label: &'static str,
}

/// Subset of the catalogue offered for one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolSelection {
    pub actions: Vec<ActionKind>,
    pub label: &'static str,
}

// Every subset a recording message can land in keeps `RecordTransactions`:
// "bayar listrik 200.000" is an expense far more often than a new obligation.
static TOOL_RULES: Lazy<Vec<ToolRule>> = Lazy::new(|| {
    vec![
        ToolRule {
            pattern: EDIT_REQUEST.clone(),
            actions: &[
                ActionKind::EditTransaction,
                ActionKind::DeleteTransaction,
                ActionKind::DeleteDebt,
                ActionKind::EditObligation,
                ActionKind::CancelObligation,
                ActionKind::CancelGoal,
                ActionKind::GetHistory,
                ActionKind::RecordTransactions,
            ],
            label: "edit",
        },
        ToolRule {
            pattern: Regex::new(
                r"(?i)\b(?:utang|hutang|ngutang|pinjam|pinjem|pinjol|minjem|kasbon|paylater|lunas|nyicil|bunga|tenor)\b",
            )
            .unwrap(),
            actions: &[
                ActionKind::AddDebt,
                ActionKind::PayDebt,
                ActionKind::ListDebts,
                ActionKind::RecordTransactions,
            ],
            label: "debt",
        },
        ToolRule {
            pattern: Regex::new(
                r"(?i)\b(?:kewajiban|tagihan|cicilan|setoran|sewa|kontrakan|kos|kost|listrik|iuran)\b",
            )
            .unwrap(),
            actions: &[
                ActionKind::AddObligation,
                ActionKind::EditObligation,
                ActionKind::CancelObligation,
                ActionKind::ListObligations,
                ActionKind::RecordTransactions,
            ],
            label: "obligation",
        },
        ToolRule {
            pattern: Regex::new(r"(?i)\b(?:goal|nabung|menabung|tabungan|tabung|impian|celengan)\b")
                .unwrap(),
            actions: &[
                ActionKind::AddGoal,
                ActionKind::ContributeGoal,
                ActionKind::CancelGoal,
                ActionKind::ListGoals,
                ActionKind::SetDailySavings,
                ActionKind::RecordTransactions,
            ],
            label: "goal",
        },
        ToolRule {
            pattern: Regex::new(
                r"(?i)\b(?:rekap|recap|laporan|riwayat|history|histori|cek|check|target|progres|progress|sisa|daftar|list)\b",
            )
            .unwrap(),
            actions: &[
                ActionKind::GetRecap,
                ActionKind::GetHistory,
                ActionKind::CheckTarget,
                ActionKind::ListDebts,
                ActionKind::ListObligations,
                ActionKind::ListGoals,
            ],
            label: "query",
        },
    ]
});

impl ToolSelection {
    /// Whether a plain income or expense can still be recorded from this subset.
    pub fn can_record(&self) -> bool {
        self.actions.contains(&ActionKind::RecordTransactions)
    }
}

/// Pick the action subset for a message: first matching rule, else everything.
pub fn select_tools(text: &str) -> ToolSelection {
    for rule in TOOL_RULES.iter() {
        if rule.pattern.is_match(text) {
            return ToolSelection {
                actions: rule.actions.to_vec(),
                label: rule.label,
            };
        }
    }
    ToolSelection {
        actions: ActionKind::ALL.to_vec(),
        label: "all",
    }
}
