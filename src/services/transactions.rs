use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, info};

use super::{amount_of, parse_args, unclear, ActionOutcome, DeletionPlan, ServiceContext};
use crate::actions::ActionKind;
use crate::traits::{NewTransaction, Transaction, TxKind};
use crate::utils::{format_rupiah, parse_date};

#[derive(Deserialize)]
struct LineItem {
    #[serde(rename = "type")]
    kind: String,
    amount: f64,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    note: Option<String>,
    #[serde(default)]
    date: Option<String>,
}

#[derive(Deserialize)]
struct EditArgs {
    #[serde(default)]
    amount: Option<f64>,
    #[serde(default)]
    category: Option<String>,
}

/// Which entry an edit or delete points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TargetId {
    /// No id given: the most recent entry.
    Latest,
    Id(i64),
    /// An id was given but is not a positive whole number.
    Unusable,
}

/// Read `transaction_id` leniently: integers, integral floats and numeric
/// strings (`"12"`, `"#12"`) all name a row.
fn target_id(args: &Map<String, Value>) -> TargetId {
    let parsed = match args.get("transaction_id") {
        None | Some(Value::Null) => return TargetId::Latest,
        Some(Value::Number(n)) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && f.fract() == 0.0)
                .map(|f| f as i64)
        }),
        Some(Value::String(s)) => {
            let trimmed = s.trim().trim_start_matches('#');
            if trimmed.is_empty() {
                return TargetId::Latest;
            }
            trimmed.parse::<i64>().ok()
        }
        Some(_) => None,
    };
    match parsed {
        Some(id) if id > 0 => TargetId::Id(id),
        _ => TargetId::Unusable,
    }
}

const UNREADABLE_ID: &str = "Nomor transaksinya nggak kebaca. Cek riwayat dulu, terus sebut nomornya ya.";

fn kind_label(kind: TxKind) -> &'static str {
    match kind {
        TxKind::Income => "Pemasukan",
        TxKind::Expense => "Pengeluaran",
    }
}

pub(crate) fn describe(tx: &Transaction) -> String {
    format!(
        "{} {} {} ({})",
        kind_label(tx.kind),
        tx.category,
        format_rupiah(tx.amount),
        tx.occurred_on.format("%d/%m")
    )
}

/// Insert every usable line item. Partial success is normal: bad items are
/// skipped and counted in the reply.
pub async fn record_transactions(
    ctx: &ServiceContext<'_>,
    args: &Map<String, Value>,
) -> anyhow::Result<ActionOutcome> {
    let kind = ActionKind::RecordTransactions;
    let Some(items) = args.get("items").and_then(|v| v.as_array()) else {
        return Ok(unclear(kind));
    };

    let mut lines = Vec::new();
    let mut failed = 0usize;
    let mut recorded_income = false;

    for raw in items {
        let Some(item) = serde_json::from_value::<LineItem>(raw.clone()).ok() else {
            failed += 1;
            continue;
        };
        let (Some(tx_kind), Some(amount)) = (TxKind::parse(&item.kind), amount_of(Some(item.amount)))
        else {
            failed += 1;
            continue;
        };
        let occurred_on = item
            .date
            .as_deref()
            .and_then(parse_date)
            .filter(|d| *d <= ctx.today)
            .unwrap_or(ctx.today);
        let category = item
            .category
            .map(|c| c.trim().to_lowercase())
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| "lainnya".to_string());

        let tx = ctx
            .ledger
            .insert_transaction(
                ctx.user_id,
                &NewTransaction {
                    kind: tx_kind,
                    amount,
                    category,
                    note: item.note.filter(|n| !n.trim().is_empty()),
                    occurred_on,
                },
            )
            .await?;
        recorded_income |= tx.kind == TxKind::Income;
        lines.push(format!("✅ {}", describe(&tx)));
    }

    if lines.is_empty() {
        debug!(user_id = ctx.user_id, failed, "No line item could be recorded");
        return Ok(unclear(kind));
    }
    info!(user_id = ctx.user_id, recorded = lines.len(), failed, "Transactions recorded");

    if failed > 0 {
        lines.push(format!("⚠️ {} item gagal dicatat, cek lagi nominalnya ya.", failed));
    }
    Ok(ActionOutcome {
        kind,
        message: lines.join("\n"),
        recorded_income,
        needs_clarification: false,
    })
}

async fn resolve_target(
    ctx: &ServiceContext<'_>,
    target: TargetId,
) -> anyhow::Result<Option<Transaction>> {
    match target {
        TargetId::Id(id) => ctx.ledger.get_transaction(ctx.user_id, id).await,
        TargetId::Latest => ctx.ledger.last_transaction(ctx.user_id).await,
        TargetId::Unusable => Ok(None),
    }
}

pub async fn edit_transaction(
    ctx: &ServiceContext<'_>,
    args: &Map<String, Value>,
) -> anyhow::Result<ActionOutcome> {
    let kind = ActionKind::EditTransaction;
    let Some(edit) = parse_args::<EditArgs>(args) else {
        return Ok(unclear(kind));
    };
    let amount = amount_of(edit.amount);
    let category = edit
        .category
        .map(|c| c.trim().to_lowercase())
        .filter(|c| !c.is_empty());
    if amount.is_none() && category.is_none() {
        return Ok(ActionOutcome::clarify(
            kind,
            "Mau diubah jadi berapa atau kategorinya apa?",
        ));
    }

    let target_ref = target_id(args);
    if target_ref == TargetId::Unusable {
        return Ok(ActionOutcome::clarify(kind, UNREADABLE_ID));
    }
    let Some(target) = resolve_target(ctx, target_ref).await? else {
        return Ok(ActionOutcome::clarify(kind, "Transaksi yang mau diubah nggak ketemu."));
    };

    match ctx
        .ledger
        .update_transaction(ctx.user_id, target.id, amount, category.as_deref())
        .await?
    {
        Some(updated) => Ok(ActionOutcome::done(
            kind,
            format!("✏️ Diubah: {} → {}", describe(&target), describe(&updated)),
        )),
        None => Ok(ActionOutcome::clarify(kind, "Transaksi yang mau diubah nggak ketemu.")),
    }
}

/// Resolve which entry a delete refers to and pin its id.
pub async fn describe_transaction_deletion(
    ctx: &ServiceContext<'_>,
    args: &Map<String, Value>,
) -> anyhow::Result<DeletionPlan> {
    let target_ref = target_id(args);
    if target_ref == TargetId::Unusable {
        return Ok(DeletionPlan::NotFound(ActionOutcome::clarify(
            ActionKind::DeleteTransaction,
            UNREADABLE_ID,
        )));
    }
    let Some(target) = resolve_target(ctx, target_ref).await? else {
        return Ok(DeletionPlan::NotFound(ActionOutcome::clarify(
            ActionKind::DeleteTransaction,
            "Belum ada transaksi yang bisa dihapus.",
        )));
    };

    let mut payload = args.clone();
    payload.insert("transaction_id".to_string(), Value::from(target.id));
    Ok(DeletionPlan::Ready {
        description: format!("Hapus {}?", describe(&target)),
        payload,
    })
}

pub async fn delete_transaction(
    ctx: &ServiceContext<'_>,
    args: &Map<String, Value>,
) -> anyhow::Result<ActionOutcome> {
    let kind = ActionKind::DeleteTransaction;
    let TargetId::Id(id) = target_id(args) else {
        return Ok(unclear(kind));
    };
    if ctx.ledger.delete_transaction(ctx.user_id, id).await? {
        info!(user_id = ctx.user_id, transaction_id = id, "Transaction deleted");
        Ok(ActionOutcome::done(kind, "🗑️ Transaksi sudah dihapus."))
    } else {
        Ok(ActionOutcome::clarify(kind, "Transaksinya sudah nggak ada."))
    }
}
