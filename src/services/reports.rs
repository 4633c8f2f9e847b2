use chrono::{Datelike, Days};
use serde::Deserialize;
use serde_json::{Map, Value};

use super::transactions::describe;
use super::{parse_args, ActionOutcome, ServiceContext};
use crate::actions::ActionKind;
use crate::finance::target::PressingDebt;
use crate::finance::{build_breakdown, DueStatus, TargetBreakdown, TargetInputs, EXPENSE_WINDOW_DAYS};
use crate::traits::TxKind;
use crate::utils::format_rupiah;

const DEFAULT_HISTORY: usize = 10;
const MAX_HISTORY: usize = 20;

#[derive(Deserialize, Default)]
struct RecapArgs {
    #[serde(default)]
    period: Option<String>,
}

#[derive(Deserialize, Default)]
struct HistoryArgs {
    #[serde(default)]
    limit: Option<usize>,
}

pub async fn get_recap(
    ctx: &ServiceContext<'_>,
    args: &Map<String, Value>,
) -> anyhow::Result<ActionOutcome> {
    let period = parse_args::<RecapArgs>(args)
        .unwrap_or_default()
        .period
        .unwrap_or_else(|| "today".to_string());
    let today = ctx.today;
    let (from, label) = match period.as_str() {
        "week" => (
            today
                .checked_sub_days(Days::new(6))
                .unwrap_or(today),
            "7 hari terakhir",
        ),
        "month" => (today.with_day(1).unwrap_or(today), "bulan ini"),
        _ => (today, "hari ini"),
    };

    let income = ctx
        .ledger
        .sum_transactions(ctx.user_id, TxKind::Income, from, today)
        .await?;
    let expense = ctx
        .ledger
        .sum_transactions(ctx.user_id, TxKind::Expense, from, today)
        .await?;
    let net = income - expense;

    let msg = format!(
        "📊 Rekap {}\nPemasukan: {}\nPengeluaran: {}\nBersih: {}",
        label,
        format_rupiah(income),
        format_rupiah(expense),
        format_rupiah(net)
    );
    Ok(ActionOutcome::done(ActionKind::GetRecap, msg))
}

pub async fn get_history(
    ctx: &ServiceContext<'_>,
    args: &Map<String, Value>,
) -> anyhow::Result<ActionOutcome> {
    let kind = ActionKind::GetHistory;
    let limit = parse_args::<HistoryArgs>(args)
        .unwrap_or_default()
        .limit
        .unwrap_or(DEFAULT_HISTORY)
        .clamp(1, MAX_HISTORY);
    let rows = ctx.ledger.recent_transactions(ctx.user_id, limit).await?;
    if rows.is_empty() {
        return Ok(ActionOutcome::done(kind, "Belum ada transaksi yang dicatat."));
    }
    let mut lines = vec![format!("🧾 {} transaksi terakhir:", rows.len())];
    lines.extend(rows.iter().map(|tx| format!("#{} {}", tx.id, describe(tx))));
    Ok(ActionOutcome::done(kind, lines.join("\n")))
}

/// Gather ledger state and derive today's target.
///
/// The expense average covers the full days before today so a partly
/// spent day never skews it.
pub async fn target_breakdown(ctx: &ServiceContext<'_>) -> anyhow::Result<TargetBreakdown> {
    let obligations = ctx.ledger.active_obligations(ctx.user_id).await?;
    let debts = ctx.ledger.active_debts(ctx.user_id).await?;
    let goals = ctx.ledger.active_goals(ctx.user_id).await?;

    let yesterday = ctx.today.pred_opt().unwrap_or(ctx.today);
    let window_start = ctx
        .today
        .checked_sub_days(Days::new(EXPENSE_WINDOW_DAYS as u64))
        .unwrap_or(yesterday);
    let trailing_expense_total = ctx
        .ledger
        .sum_transactions(ctx.user_id, TxKind::Expense, window_start, yesterday)
        .await?;
    let income_today = ctx
        .ledger
        .sum_transactions(ctx.user_id, TxKind::Income, ctx.today, ctx.today)
        .await?;
    let daily_savings = ctx.ledger.daily_savings(ctx.user_id).await?;

    Ok(build_breakdown(&TargetInputs {
        obligations: &obligations,
        debts: &debts,
        goals: &goals,
        trailing_expense_total,
        daily_savings,
        income_today,
        today: ctx.today,
    }))
}

fn pressing_line(debt: &PressingDebt) -> String {
    match debt.status {
        DueStatus::Overdue => format!("⚠️ Utang {} telat {} hari", debt.person, -debt.days_left),
        _ if debt.days_left == 0 => format!("⚠️ Utang {} jatuh tempo hari ini", debt.person),
        _ => format!("⚠️ Utang {} jatuh tempo {} hari lagi", debt.person, debt.days_left),
    }
}

/// Short progress note appended after income is recorded.
pub fn progress_summary(b: &TargetBreakdown) -> String {
    let mut msg = if b.target == 0 {
        format!("📈 Pemasukan hari ini {}", format_rupiah(b.income))
    } else if b.remainder == 0 {
        format!(
            "🎉 Target hari ini tercapai! {} dari {} ({}%)",
            format_rupiah(b.income),
            format_rupiah(b.target),
            b.progress_pct
        )
    } else {
        format!(
            "📈 Progres: {} / {} ({}%). Kurang {}",
            format_rupiah(b.income),
            format_rupiah(b.target),
            b.progress_pct,
            format_rupiah(b.remainder)
        )
    };
    for debt in &b.pressing_debts {
        msg.push('\n');
        msg.push_str(&pressing_line(debt));
    }
    msg
}

pub async fn check_target(ctx: &ServiceContext<'_>) -> anyhow::Result<ActionOutcome> {
    let b = target_breakdown(ctx).await?;
    let mut lines = vec![
        "🎯 Target hari ini".to_string(),
        format!("Kewajiban: {}", format_rupiah(b.obligations)),
        format!("Cicilan utang: {}", format_rupiah(b.debts)),
        format!("Rata-rata pengeluaran: {}", format_rupiah(b.avg_expense)),
        format!("Tabungan: {}", format_rupiah(b.savings)),
        format!("Target tabungan: {}", format_rupiah(b.goals)),
        format!("Buffer 10%: {}", format_rupiah(b.buffer)),
        format!("Total: {}", format_rupiah(b.target)),
        String::new(),
    ];
    lines.push(progress_summary(&b));
    Ok(ActionOutcome::done(ActionKind::CheckTarget, lines.join("\n")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn breakdown(target: i64, income: i64) -> TargetBreakdown {
        TargetBreakdown {
            obligations: 0,
            debts: 0,
            avg_expense: 0,
            savings: 0,
            goals: 0,
            subtotal: target,
            buffer: 0,
            target,
            income,
            progress_pct: if target > 0 { income * 100 / target } else { 100 },
            remainder: (target - income).max(0),
            pressing_debts: Vec::new(),
        }
    }

    #[test]
    fn summary_shows_remainder() {
        let s = progress_summary(&breakdown(220_000, 110_000));
        assert_eq!(s, "📈 Progres: Rp 110.000 / Rp 220.000 (50%). Kurang Rp 110.000");
    }

    #[test]
    fn summary_when_target_met_or_absent() {
        assert!(progress_summary(&breakdown(100_000, 150_000)).starts_with("🎉"));
        assert_eq!(
            progress_summary(&breakdown(0, 50_000)),
            "📈 Pemasukan hari ini Rp 50.000"
        );
    }

    #[test]
    fn summary_lists_pressing_debts() {
        let mut b = breakdown(100_000, 0);
        b.pressing_debts = vec![
            PressingDebt {
                person: "Budi".into(),
                status: DueStatus::Overdue,
                days_left: -2,
            },
            PressingDebt {
                person: "Kredivo".into(),
                status: DueStatus::Urgent,
                days_left: 0,
            },
        ];
        let s = progress_summary(&b);
        assert!(s.contains("Utang Budi telat 2 hari"));
        assert!(s.contains("Utang Kredivo jatuh tempo hari ini"));
    }
}
