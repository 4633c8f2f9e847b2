use chrono::Days;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::info;

use super::{amount_of, parse_args, unclear, ActionOutcome, ServiceContext};
use crate::actions::ActionKind;
use crate::finance::find_by_name;
use crate::finance::target::goal_daily;
use crate::traits::{Goal, RecordStatus};
use crate::utils::format_rupiah;

const DEFAULT_DEADLINE_DAYS: u64 = 30;

#[derive(Deserialize)]
struct AddArgs {
    name: String,
    target_amount: f64,
    #[serde(default)]
    deadline_days: Option<u64>,
}

#[derive(Deserialize)]
struct ContributeArgs {
    name: String,
    amount: f64,
}

#[derive(Deserialize)]
struct NameArgs {
    name: String,
}

#[derive(Deserialize)]
struct SavingsArgs {
    amount: f64,
}

async fn find_active(ctx: &ServiceContext<'_>, name: &str) -> anyhow::Result<Option<Goal>> {
    let goals = ctx.ledger.active_goals(ctx.user_id).await?;
    Ok(find_by_name(&goals, name).cloned())
}

fn not_found(kind: ActionKind, name: &str) -> ActionOutcome {
    ActionOutcome::clarify(kind, format!("Target tabungan \"{}\" nggak ketemu.", name))
}

fn progress_line(goal: &Goal) -> String {
    let pct = if goal.target_amount > 0 {
        (goal.saved_amount as f64 * 100.0 / goal.target_amount as f64).round() as i64
    } else {
        100
    };
    format!(
        "{}: {} / {} ({}%)",
        goal.name,
        format_rupiah(goal.saved_amount),
        format_rupiah(goal.target_amount),
        pct
    )
}

pub async fn add_goal(
    ctx: &ServiceContext<'_>,
    args: &Map<String, Value>,
) -> anyhow::Result<ActionOutcome> {
    let kind = ActionKind::AddGoal;
    let Some(a) = parse_args::<AddArgs>(args) else {
        return Ok(unclear(kind));
    };
    let name = a.name.trim();
    let Some(target) = amount_of(Some(a.target_amount)).filter(|_| !name.is_empty()) else {
        return Ok(unclear(kind));
    };
    let days = a
        .deadline_days
        .filter(|d| *d > 0)
        .unwrap_or(DEFAULT_DEADLINE_DAYS);
    let Some(deadline) = ctx.today.checked_add_days(Days::new(days)) else {
        return Ok(unclear(kind));
    };

    let goal = ctx
        .ledger
        .insert_goal(ctx.user_id, name, target, deadline)
        .await?;
    info!(user_id = ctx.user_id, goal_id = goal.id, days, "Goal added");
    Ok(ActionOutcome::done(
        kind,
        format!(
            "🎯 Target {} {} dalam {} hari (≈ {}/hari)",
            goal.name,
            format_rupiah(goal.target_amount),
            days,
            format_rupiah(goal_daily(&goal, ctx.today))
        ),
    ))
}

pub async fn contribute_goal(
    ctx: &ServiceContext<'_>,
    args: &Map<String, Value>,
) -> anyhow::Result<ActionOutcome> {
    let kind = ActionKind::ContributeGoal;
    let Some(a) = parse_args::<ContributeArgs>(args) else {
        return Ok(unclear(kind));
    };
    let Some(amount) = amount_of(Some(a.amount)) else {
        return Ok(unclear(kind));
    };
    let Some(goal) = find_active(ctx, &a.name).await? else {
        return Ok(not_found(kind, &a.name));
    };

    let saved = goal.saved_amount.saturating_add(amount);
    let Some(mut updated) = ctx
        .ledger
        .update_goal_saved(ctx.user_id, goal.id, saved)
        .await?
    else {
        return Ok(not_found(kind, &a.name));
    };

    if updated.saved_amount >= updated.target_amount {
        if let Some(done) = ctx
            .ledger
            .set_goal_status(ctx.user_id, updated.id, RecordStatus::Done)
            .await?
        {
            updated = done;
        }
        info!(user_id = ctx.user_id, goal_id = updated.id, "Goal reached");
        return Ok(ActionOutcome::done(
            kind,
            format!("🏆 Target {} tercapai! {}", updated.name, progress_line(&updated)),
        ));
    }
    Ok(ActionOutcome::done(
        kind,
        format!("💰 Nabung {} → {}", format_rupiah(amount), progress_line(&updated)),
    ))
}

pub async fn cancel_goal(
    ctx: &ServiceContext<'_>,
    args: &Map<String, Value>,
) -> anyhow::Result<ActionOutcome> {
    let kind = ActionKind::CancelGoal;
    let Some(a) = parse_args::<NameArgs>(args) else {
        return Ok(unclear(kind));
    };
    let Some(goal) = find_active(ctx, &a.name).await? else {
        return Ok(not_found(kind, &a.name));
    };
    match ctx
        .ledger
        .set_goal_status(ctx.user_id, goal.id, RecordStatus::Cancelled)
        .await?
    {
        Some(g) => Ok(ActionOutcome::done(kind, format!("❌ Target {} dibatalkan.", g.name))),
        None => Ok(not_found(kind, &a.name)),
    }
}

pub async fn list_goals(ctx: &ServiceContext<'_>) -> anyhow::Result<ActionOutcome> {
    let kind = ActionKind::ListGoals;
    let goals = ctx.ledger.active_goals(ctx.user_id).await?;
    if goals.is_empty() {
        return Ok(ActionOutcome::done(kind, "Belum ada target tabungan."));
    }
    let mut lines = vec!["🎯 Target tabungan:".to_string()];
    for goal in &goals {
        let days_left = (goal.deadline - ctx.today).num_days();
        lines.push(format!(
            "• {} · sisa {} hari · {}/hari",
            progress_line(goal),
            days_left.max(0),
            format_rupiah(goal_daily(goal, ctx.today))
        ));
    }
    Ok(ActionOutcome::done(kind, lines.join("\n")))
}

pub async fn set_daily_savings(
    ctx: &ServiceContext<'_>,
    args: &Map<String, Value>,
) -> anyhow::Result<ActionOutcome> {
    let kind = ActionKind::SetDailySavings;
    let Some(a) = parse_args::<SavingsArgs>(args) else {
        return Ok(unclear(kind));
    };
    let Some(amount) = amount_of(Some(a.amount)) else {
        return Ok(unclear(kind));
    };
    ctx.ledger.set_daily_savings(ctx.user_id, amount).await?;
    Ok(ActionOutcome::done(
        kind,
        format!("🐷 Tabungan harian diset {}", format_rupiah(amount)),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::setup_test_ledger;
    use crate::traits::LedgerStore;
    use chrono::NaiveDate;
    use serde_json::json;

    fn args(v: Value) -> Map<String, Value> {
        v.as_object().unwrap().clone()
    }

    #[tokio::test]
    async fn goal_completes_when_target_is_reached() {
        let (ledger, _db) = setup_test_ledger().await;
        let ctx = ServiceContext {
            ledger: ledger.as_ref(),
            user_id: "u1",
            today: NaiveDate::from_ymd_opt(2026, 3, 10).unwrap(),
        };
        let out = add_goal(
            &ctx,
            &args(json!({"name": "HP baru", "target_amount": 1000000, "deadline_days": 20})),
        )
        .await
        .unwrap();
        assert!(out.message.contains("dalam 20 hari (≈ Rp 50.000/hari)"), "{}", out.message);

        let out = contribute_goal(&ctx, &args(json!({"name": "hp", "amount": 400000})))
            .await
            .unwrap();
        assert!(out.message.starts_with("💰 Nabung Rp 400.000"), "{}", out.message);
        assert_eq!(ledger.active_goals("u1").await.unwrap()[0].saved_amount, 400_000);

        let out = contribute_goal(&ctx, &args(json!({"name": "HP baru", "amount": 700000})))
            .await
            .unwrap();
        assert!(out.message.starts_with("🏆 Target HP baru tercapai!"), "{}", out.message);
        assert!(out.message.contains("Rp 1.100.000 / Rp 1.000.000"));
        assert!(ledger.active_goals("u1").await.unwrap().is_empty());

        // A finished goal no longer takes contributions.
        let out = contribute_goal(&ctx, &args(json!({"name": "HP baru", "amount": 1000})))
            .await
            .unwrap();
        assert!(out.needs_clarification);
    }
}
