use chrono::NaiveDate;
use serde::Serialize;

use super::interest::compute_terms;
use crate::traits::{Debt, Frequency};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DueStatus {
    Overdue,
    Urgent,
    Soon,
    Ok,
    NoDue,
}

impl DueStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DueStatus::Overdue => "overdue",
            DueStatus::Urgent => "urgent",
            DueStatus::Soon => "soon",
            DueStatus::Ok => "ok",
            DueStatus::NoDue => "no_due",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DueInfo {
    pub status: DueStatus,
    pub days_left: Option<i64>,
}

/// The next payment date wins over the static due date when both are set.
pub fn effective_due_date(debt: &Debt) -> Option<NaiveDate> {
    debt.next_payment_date.or(debt.due_date)
}

pub fn due_status(due: Option<NaiveDate>, today: NaiveDate) -> DueInfo {
    let Some(due) = due else {
        return DueInfo {
            status: DueStatus::NoDue,
            days_left: None,
        };
    };
    let days_left = (due - today).num_days();
    let status = match days_left {
        d if d < 0 => DueStatus::Overdue,
        0..=3 => DueStatus::Urgent,
        4..=7 => DueStatus::Soon,
        _ => DueStatus::Ok,
    };
    DueInfo {
        status,
        days_left: Some(days_left),
    }
}

pub fn debt_due_status(debt: &Debt, today: NaiveDate) -> DueInfo {
    due_status(effective_due_date(debt), today)
}

/// Installment per period: the explicit one if set, else the derived one.
pub fn effective_installment(debt: &Debt) -> Option<i64> {
    debt.installment_amount.filter(|a| *a > 0).or_else(|| {
        compute_terms(
            debt.amount,
            debt.interest_rate,
            debt.interest_type,
            debt.tenor_months,
        )
        .installment
    })
}

/// What this debt adds to today's target.
///
/// Overdue debts count at their full installment (or the full remaining
/// balance when there is no installment). Otherwise the installment is spread
/// over its period, or the balance over the days left until the due date.
pub fn debt_daily_installment(debt: &Debt, today: NaiveDate) -> i64 {
    if debt.remaining <= 0 {
        return 0;
    }
    let due = debt_due_status(debt, today);
    let installment = effective_installment(debt);

    let daily = if due.status == DueStatus::Overdue {
        installment.unwrap_or(debt.remaining)
    } else if let Some(installment) = installment {
        let period = debt.installment_freq.unwrap_or(Frequency::Monthly).days();
        (installment as f64 / period as f64).round() as i64
    } else {
        match due.days_left {
            Some(0) => debt.remaining,
            Some(days) => (debt.remaining as f64 / days as f64).round() as i64,
            None => 0,
        }
    };

    daily.clamp(0, debt.remaining)
}
