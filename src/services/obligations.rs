use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::info;

use super::{amount_of, parse_args, unclear, ActionOutcome, ServiceContext};
use crate::actions::ActionKind;
use crate::finance::find_by_name;
use crate::finance::target::obligation_daily;
use crate::traits::{Frequency, Obligation, RecordStatus};
use crate::utils::format_rupiah;

#[derive(Deserialize)]
struct AddArgs {
    name: String,
    amount: f64,
    #[serde(default)]
    frequency: Option<String>,
}

#[derive(Deserialize)]
struct EditArgs {
    name: String,
    amount: f64,
}

#[derive(Deserialize)]
struct CancelArgs {
    name: String,
    #[serde(default)]
    status: Option<String>,
}

fn frequency_word(freq: Frequency) -> &'static str {
    match freq {
        Frequency::Daily => "harian",
        Frequency::Weekly => "mingguan",
        Frequency::Monthly => "bulanan",
    }
}

async fn find_active(ctx: &ServiceContext<'_>, name: &str) -> anyhow::Result<Option<Obligation>> {
    let all = ctx.ledger.active_obligations(ctx.user_id).await?;
    Ok(find_by_name(&all, name).cloned())
}

fn not_found(kind: ActionKind, name: &str) -> ActionOutcome {
    ActionOutcome::clarify(kind, format!("Kewajiban \"{}\" nggak ketemu.", name))
}

pub async fn add_obligation(
    ctx: &ServiceContext<'_>,
    args: &Map<String, Value>,
) -> anyhow::Result<ActionOutcome> {
    let kind = ActionKind::AddObligation;
    let Some(a) = parse_args::<AddArgs>(args) else {
        return Ok(unclear(kind));
    };
    let name = a.name.trim();
    let Some(amount) = amount_of(Some(a.amount)).filter(|_| !name.is_empty()) else {
        return Ok(unclear(kind));
    };
    let frequency = a
        .frequency
        .as_deref()
        .and_then(Frequency::parse)
        .unwrap_or_default();

    let ob = ctx
        .ledger
        .insert_obligation(ctx.user_id, name, amount, frequency)
        .await?;
    info!(user_id = ctx.user_id, obligation_id = ob.id, "Obligation added");
    Ok(ActionOutcome::done(
        kind,
        format!(
            "📌 Kewajiban {} {} {} dicatat (≈ {}/hari)",
            frequency_word(ob.frequency),
            ob.name,
            format_rupiah(ob.amount),
            format_rupiah(obligation_daily(ob.amount, ob.frequency))
        ),
    ))
}

pub async fn edit_obligation(
    ctx: &ServiceContext<'_>,
    args: &Map<String, Value>,
) -> anyhow::Result<ActionOutcome> {
    let kind = ActionKind::EditObligation;
    let Some(a) = parse_args::<EditArgs>(args) else {
        return Ok(unclear(kind));
    };
    let Some(amount) = amount_of(Some(a.amount)) else {
        return Ok(unclear(kind));
    };
    let Some(ob) = find_active(ctx, &a.name).await? else {
        return Ok(not_found(kind, &a.name));
    };
    match ctx
        .ledger
        .update_obligation_amount(ctx.user_id, ob.id, amount)
        .await?
    {
        Some(updated) => Ok(ActionOutcome::done(
            kind,
            format!(
                "✏️ {}: {} → {}",
                updated.name,
                format_rupiah(ob.amount),
                format_rupiah(updated.amount)
            ),
        )),
        None => Ok(not_found(kind, &a.name)),
    }
}

pub async fn cancel_obligation(
    ctx: &ServiceContext<'_>,
    args: &Map<String, Value>,
) -> anyhow::Result<ActionOutcome> {
    let kind = ActionKind::CancelObligation;
    let Some(a) = parse_args::<CancelArgs>(args) else {
        return Ok(unclear(kind));
    };
    let status = match a.status.as_deref() {
        Some("done") => RecordStatus::Done,
        _ => RecordStatus::Cancelled,
    };
    let Some(ob) = find_active(ctx, &a.name).await? else {
        return Ok(not_found(kind, &a.name));
    };
    let Some(updated) = ctx
        .ledger
        .set_obligation_status(ctx.user_id, ob.id, status)
        .await?
    else {
        return Ok(not_found(kind, &a.name));
    };
    info!(user_id = ctx.user_id, obligation_id = updated.id, status = status.as_str(), "Obligation closed");

    let msg = match status {
        RecordStatus::Done => format!("✅ Kewajiban {} selesai.", updated.name),
        _ => format!("❌ Kewajiban {} dibatalkan.", updated.name),
    };
    Ok(ActionOutcome::done(kind, msg))
}

pub async fn list_obligations(ctx: &ServiceContext<'_>) -> anyhow::Result<ActionOutcome> {
    let kind = ActionKind::ListObligations;
    let all = ctx.ledger.active_obligations(ctx.user_id).await?;
    if all.is_empty() {
        return Ok(ActionOutcome::done(kind, "Belum ada kewajiban rutin yang dicatat."));
    }
    let mut daily_total = 0;
    let mut lines = vec!["📌 Kewajiban rutin:".to_string()];
    for ob in &all {
        daily_total += obligation_daily(ob.amount, ob.frequency);
        lines.push(format!(
            "• {} {} ({})",
            ob.name,
            format_rupiah(ob.amount),
            frequency_word(ob.frequency)
        ));
    }
    lines.push(format!("Setara {}/hari", format_rupiah(daily_total)));
    Ok(ActionOutcome::done(kind, lines.join("\n")))
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
    async fn edit_and_cancel_find_obligations_by_token() {
        let (ledger, _db) = setup_test_ledger().await;
        let ctx = ServiceContext {
            ledger: ledger.as_ref(),
            user_id: "u1",
            today: NaiveDate::from_ymd_opt(2026, 3, 10).unwrap(),
        };
        for (name, amount) in [("Kontrakan Rumah", 900_000), ("Cicilan Motor", 600_000)] {
            ledger
                .insert_obligation("u1", name, amount, Frequency::Monthly)
                .await
                .unwrap();
        }

        let out = edit_obligation(
            &ctx,
            &args(json!({"name": "sewa kontrakan bulanan", "amount": 950000})),
        )
        .await
        .unwrap();
        assert_eq!(out.message, "✏️ Kontrakan Rumah: Rp 900.000 → Rp 950.000");

        let out = cancel_obligation(&ctx, &args(json!({"name": "hapus kewajiban motor"})))
            .await
            .unwrap();
        assert_eq!(out.message, "❌ Kewajiban Cicilan Motor dibatalkan.");

        let active = ledger.active_obligations("u1").await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].amount, 950_000);

        let out = cancel_obligation(&ctx, &args(json!({"name": "kontrakan", "status": "done"})))
            .await
            .unwrap();
        assert_eq!(out.message, "✅ Kewajiban Kontrakan Rumah selesai.");
        assert!(ledger.active_obligations("u1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_obligation_asks_back() {
        let (ledger, _db) = setup_test_ledger().await;
        let ctx = ServiceContext {
            ledger: ledger.as_ref(),
            user_id: "u1",
            today: NaiveDate::from_ymd_opt(2026, 3, 10).unwrap(),
        };
        let out = edit_obligation(&ctx, &args(json!({"name": "internet", "amount": 300000})))
            .await
            .unwrap();
        assert!(out.needs_clarification);
        assert!(out.message.contains("\"internet\""));
    }
}
