use serde_json::{json, Value};

use super::ActionKind;

fn no_params(name: &str, description: &str) -> Value {
    json!({
        "name": name,
        "description": description,
        "parameters": { "type": "object", "properties": {} }
    })
}

pub(super) fn schema_for(kind: ActionKind) -> Value {
    let name = kind.name();
    match kind {
        ActionKind::RecordTransactions => json!({
            "name": name,
            "description": "Record one or more income/expense entries. Use one call with several items when the user lists several amounts.",
            "parameters": {
                "type": "object",
                "properties": {
                    "items": {
                        "type": "array",
                        "maxItems": 10,
                        "items": {
                            "type": "object",
                            "properties": {
                                "type": { "type": "string", "enum": ["income", "expense"] },
                                "amount": { "type": "number", "description": "Amount in rupiah, digits only" },
                                "category": { "type": "string", "description": "e.g. 'orderan', 'bensin', 'makan', 'parkir'" },
                                "note": { "type": "string" },
                                "date": { "type": "string", "description": "YYYY-MM-DD, omit for today" }
                            },
                            "required": ["type", "amount", "category"]
                        }
                    }
                },
                "required": ["items"]
            }
        }),
        ActionKind::EditTransaction => json!({
            "name": name,
            "description": "Correct a recorded entry. Without transaction_id the most recent entry is edited.",
            "parameters": {
                "type": "object",
                "properties": {
                    "transaction_id": { "type": "integer" },
                    "amount": { "type": "number" },
                    "category": { "type": "string" }
                }
            }
        }),
        ActionKind::DeleteTransaction => json!({
            "name": name,
            "description": "Delete a recorded entry. Without transaction_id the most recent entry is deleted. The user is asked to confirm first.",
            "parameters": {
                "type": "object",
                "properties": {
                    "transaction_id": { "type": "integer" }
                }
            }
        }),
        ActionKind::GetRecap => json!({
            "name": name,
            "description": "Summarize income and expenses for a period.",
            "parameters": {
                "type": "object",
                "properties": {
                    "period": { "type": "string", "enum": ["today", "week", "month"] }
                },
                "required": ["period"]
            }
        }),
        ActionKind::GetHistory => json!({
            "name": name,
            "description": "List the most recent entries.",
            "parameters": {
                "type": "object",
                "properties": {
                    "limit": { "type": "integer", "minimum": 1, "maximum": 20 }
                }
            }
        }),
        ActionKind::CheckTarget => no_params(
            name,
            "Show today's earning target and progress against it.",
        ),
        ActionKind::AddDebt => json!({
            "name": name,
            "description": "Record money the user owes someone (a person, a lender, a paylater app).",
            "parameters": {
                "type": "object",
                "properties": {
                    "person": { "type": "string" },
                    "amount": { "type": "number", "description": "Principal in rupiah" },
                    "interest_rate": { "type": "number", "description": "Fraction per month (flat) or per day (daily), e.g. 0.02" },
                    "interest_type": { "type": "string", "enum": ["none", "flat", "daily"] },
                    "tenor_months": { "type": "integer" },
                    "installment_amount": { "type": "number" },
                    "installment_freq": { "type": "string", "enum": ["daily", "weekly", "monthly"] },
                    "due_date": { "type": "string", "description": "YYYY-MM-DD" },
                    "next_payment_date": { "type": "string", "description": "YYYY-MM-DD" }
                },
                "required": ["person", "amount"]
            }
        }),
        ActionKind::PayDebt => json!({
            "name": name,
            "description": "Record a payment towards an existing debt.",
            "parameters": {
                "type": "object",
                "properties": {
                    "person": { "type": "string" },
                    "amount": { "type": "number" }
                },
                "required": ["person", "amount"]
            }
        }),
        ActionKind::ListDebts => no_params(name, "List active debts with their due status."),
        ActionKind::DeleteDebt => json!({
            "name": name,
            "description": "Delete a debt record. The user is asked to confirm first.",
            "parameters": {
                "type": "object",
                "properties": {
                    "person": { "type": "string" }
                },
                "required": ["person"]
            }
        }),
        ActionKind::AddObligation => json!({
            "name": name,
            "description": "Register a recurring fixed payment such as rent, vehicle installment or daily car deposit.",
            "parameters": {
                "type": "object",
                "properties": {
                    "name": { "type": "string" },
                    "amount": { "type": "number" },
                    "frequency": { "type": "string", "enum": ["daily", "weekly", "monthly"] }
                },
                "required": ["name", "amount", "frequency"]
            }
        }),
        ActionKind::EditObligation => json!({
            "name": name,
            "description": "Change the amount of an existing obligation.",
            "parameters": {
                "type": "object",
                "properties": {
                    "name": { "type": "string" },
                    "amount": { "type": "number" }
                },
                "required": ["name", "amount"]
            }
        }),
        ActionKind::CancelObligation => json!({
            "name": name,
            "description": "Stop tracking an obligation, either because it is paid off (done) or no longer relevant (cancelled).",
            "parameters": {
                "type": "object",
                "properties": {
                    "name": { "type": "string" },
                    "status": { "type": "string", "enum": ["done", "cancelled"] }
                },
                "required": ["name"]
            }
        }),
        ActionKind::ListObligations => no_params(name, "List active obligations."),
        ActionKind::AddGoal => json!({
            "name": name,
            "description": "Create a savings goal with a deadline.",
            "parameters": {
                "type": "object",
                "properties": {
                    "name": { "type": "string" },
                    "target_amount": { "type": "number" },
                    "deadline_days": { "type": "integer", "minimum": 1 }
                },
                "required": ["name", "target_amount", "deadline_days"]
            }
        }),
        ActionKind::ContributeGoal => json!({
            "name": name,
            "description": "Add money saved towards a goal.",
            "parameters": {
                "type": "object",
                "properties": {
                    "name": { "type": "string" },
                    "amount": { "type": "number" }
                },
                "required": ["name", "amount"]
            }
        }),
        ActionKind::CancelGoal => json!({
            "name": name,
            "description": "Cancel a savings goal.",
            "parameters": {
                "type": "object",
                "properties": {
                    "name": { "type": "string" }
                },
                "required": ["name"]
            }
        }),
        ActionKind::ListGoals => no_params(name, "List active savings goals and their progress."),
        ActionKind::SetDailySavings => json!({
            "name": name,
            "description": "Set how much the user wants to put aside every day.",
            "parameters": {
                "type": "object",
                "properties": {
                    "amount": { "type": "number" }
                },
                "required": ["amount"]
            }
        }),
    }
}
