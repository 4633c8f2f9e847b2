use chrono::NaiveDate;
use serde::Serialize;

use super::due::{debt_daily_installment, debt_due_status, DueStatus};
use crate::traits::{Debt, Frequency, Goal, Obligation};

/// Safety margin added on top of everything else, in percent.
const BUFFER_PERCENT: i64 = 10;

/// Days of expense history averaged into the target.
pub const EXPENSE_WINDOW_DAYS: i64 = 7;

/// The daily parts that make up a target, before the buffer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TargetComponents {
    pub obligations: i64,
    pub debts: i64,
    pub avg_expense: i64,
    pub savings: i64,
    pub goals: i64,
}

/// Derived view of how much the user needs to earn today. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TargetBreakdown {
    pub obligations: i64,
    pub debts: i64,
    pub avg_expense: i64,
    pub savings: i64,
    pub goals: i64,
    pub subtotal: i64,
    pub buffer: i64,
    pub target: i64,
    pub income: i64,
    pub progress_pct: i64,
    pub remainder: i64,
    /// Debts that are overdue or due within three days.
    pub pressing_debts: Vec<PressingDebt>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PressingDebt {
    pub person: String,
    pub status: DueStatus,
    pub days_left: i64,
}

/// Raw ledger state the target is derived from.
pub struct TargetInputs<'a> {
    pub obligations: &'a [Obligation],
    pub debts: &'a [Debt],
    pub goals: &'a [Goal],
    /// Sum of expenses over the trailing window.
    pub trailing_expense_total: i64,
    pub daily_savings: i64,
    pub income_today: i64,
    pub today: NaiveDate,
}

fn div_round(amount: i64, days: i64) -> i64 {
    if days <= 0 {
        return amount;
    }
    (amount as f64 / days as f64).round() as i64
}

pub fn obligation_daily(amount: i64, frequency: Frequency) -> i64 {
    div_round(amount, frequency.days())
}

/// Remaining savings spread over the days left, never negative.
pub fn goal_daily(goal: &Goal, today: NaiveDate) -> i64 {
    let remaining = (goal.target_amount - goal.saved_amount).max(0);
    let days_left = (goal.deadline - today).num_days().max(1);
    div_round(remaining, days_left)
}

pub fn trailing_average(total: i64) -> i64 {
    div_round(total, EXPENSE_WINDOW_DAYS)
}

/// Apply the buffer and compare against income.
pub fn compute_breakdown(parts: TargetComponents, income: i64) -> TargetBreakdown {
    let subtotal = parts.obligations + parts.debts + parts.avg_expense + parts.savings + parts.goals;
    let buffer = div_round(subtotal * BUFFER_PERCENT, 100);
    let target = subtotal + buffer;
    let progress_pct = if target > 0 {
        (income as f64 * 100.0 / target as f64).round() as i64
    } else {
        100
    };

    TargetBreakdown {
        obligations: parts.obligations,
        debts: parts.debts,
        avg_expense: parts.avg_expense,
        savings: parts.savings,
        goals: parts.goals,
        subtotal,
        buffer,
        target,
        income,
        progress_pct,
        remainder: (target - income).max(0),
        pressing_debts: Vec::new(),
    }
}

pub fn build_breakdown(inputs: &TargetInputs<'_>) -> TargetBreakdown {
    let parts = TargetComponents {
        obligations: inputs
            .obligations
            .iter()
            .map(|o| obligation_daily(o.amount, o.frequency))
            .sum(),
        debts: inputs
            .debts
            .iter()
            .map(|d| debt_daily_installment(d, inputs.today))
            .sum(),
        avg_expense: trailing_average(inputs.trailing_expense_total),
        savings: inputs.daily_savings.max(0),
        goals: inputs
            .goals
            .iter()
            .map(|g| goal_daily(g, inputs.today))
            .sum(),
    };

    let mut breakdown = compute_breakdown(parts, inputs.income_today);
    breakdown.pressing_debts = inputs
        .debts
        .iter()
        .filter(|d| d.remaining > 0)
        .filter_map(|d| {
            let info = debt_due_status(d, inputs.today);
            match info.status {
                DueStatus::Overdue | DueStatus::Urgent => Some(PressingDebt {
                    person: d.person.clone(),
                    status: info.status,
                    days_left: info.days_left.unwrap_or_default(),
                }),
                _ => None,
            }
        })
        .collect();
    breakdown
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::{DebtStatus, InterestType, RecordStatus};
    use chrono::{Duration, Utc};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 10).unwrap()
    }

    #[test]
    fn target_from_components() {
        let parts = TargetComponents {
            obligations: 50_000,
            debts: 30_000,
            avg_expense: 70_000,
            savings: 20_000,
            goals: 30_000,
        };
        let b = compute_breakdown(parts, 110_000);
        assert_eq!(b.subtotal, 200_000);
        assert_eq!(b.buffer, 20_000);
        assert_eq!(b.target, 220_000);
        assert_eq!(b.progress_pct, 50);
        assert_eq!(b.remainder, 110_000);
    }

    #[test]
    fn income_above_target_leaves_no_remainder() {
        let parts = TargetComponents {
            avg_expense: 100_000,
            ..Default::default()
        };
        let b = compute_breakdown(parts, 165_000);
        assert_eq!(b.target, 110_000);
        assert_eq!(b.progress_pct, 150);
        assert_eq!(b.remainder, 0);
    }

    #[test]
    fn empty_target_counts_as_complete() {
        let b = compute_breakdown(TargetComponents::default(), 0);
        assert_eq!(b.target, 0);
        assert_eq!(b.progress_pct, 100);
    }

    #[test]
    fn obligation_frequencies_normalize_to_daily() {
        assert_eq!(obligation_daily(20_000, Frequency::Daily), 20_000);
        assert_eq!(obligation_daily(100_000, Frequency::Weekly), 14_286);
        assert_eq!(obligation_daily(900_000, Frequency::Monthly), 30_000);
    }

    fn goal(target: i64, saved: i64, days: i64) -> Goal {
        Goal {
            id: 1,
            user_id: "u1".to_string(),
            name: "HP baru".to_string(),
            target_amount: target,
            saved_amount: saved,
            deadline: today() + Duration::days(days),
            status: RecordStatus::Active,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn goal_rate_is_floored_at_zero() {
        assert_eq!(goal_daily(&goal(3_000_000, 0, 100), today()), 30_000);
        assert_eq!(goal_daily(&goal(1_000_000, 1_500_000, 10), today()), 0);
        // Past deadline spreads over a single day.
        assert_eq!(goal_daily(&goal(50_000, 0, -4), today()), 50_000);
    }

    #[test]
    fn build_breakdown_from_ledger_rows() {
        let obligations = vec![Obligation {
            id: 1,
            user_id: "u1".to_string(),
            name: "Kontrakan".to_string(),
            amount: 1_500_000,
            frequency: Frequency::Monthly,
            status: RecordStatus::Active,
            created_at: Utc::now(),
        }];
        let debts = vec![Debt {
            id: 1,
            user_id: "u1".to_string(),
            person: "Koperasi".to_string(),
            amount: 300_000,
            remaining: 300_000,
            interest_rate: 0.0,
            interest_type: InterestType::None,
            tenor_months: None,
            installment_amount: Some(30_000),
            installment_freq: Some(Frequency::Daily),
            due_date: Some(today() - Duration::days(2)),
            next_payment_date: None,
            status: DebtStatus::Active,
            created_at: Utc::now(),
        }];
        let goals = vec![goal(3_000_000, 0, 100)];
        let b = build_breakdown(&TargetInputs {
            obligations: &obligations,
            debts: &debts,
            goals: &goals,
            trailing_expense_total: 490_000,
            daily_savings: 20_000,
            income_today: 110_000,
            today: today(),
        });
        assert_eq!(b.obligations, 50_000);
        assert_eq!(b.debts, 30_000);
        assert_eq!(b.avg_expense, 70_000);
        assert_eq!(b.goals, 30_000);
        assert_eq!(b.target, 220_000);
        assert_eq!(b.progress_pct, 50);
        assert_eq!(b.pressing_debts.len(), 1);
        assert_eq!(b.pressing_debts[0].status, DueStatus::Overdue);
        assert_eq!(b.pressing_debts[0].days_left, -2);
    }
}
