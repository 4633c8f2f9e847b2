use chrono::{Days, Months, NaiveDate};
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::info;

use super::{amount_of, parse_args, unclear, ActionOutcome, DeletionPlan, ServiceContext};
use crate::actions::ActionKind;
use crate::finance::due::effective_installment;
use crate::finance::{compute_terms, debt_due_status, find_by_name, DueStatus};
use crate::traits::{Debt, DebtStatus, Frequency, InterestType, NewDebt};
use crate::utils::{format_rupiah, parse_date};

#[derive(Deserialize)]
struct AddDebtArgs {
    person: String,
    amount: f64,
    #[serde(default)]
    interest_rate: Option<f64>,
    #[serde(default)]
    interest_type: Option<String>,
    #[serde(default)]
    tenor_months: Option<u32>,
    #[serde(default)]
    installment_amount: Option<f64>,
    #[serde(default)]
    installment_freq: Option<String>,
    #[serde(default)]
    due_date: Option<String>,
    #[serde(default)]
    next_payment_date: Option<String>,
}

#[derive(Deserialize)]
struct PayDebtArgs {
    person: String,
    amount: f64,
}

#[derive(Deserialize)]
struct DeleteDebtArgs {
    #[serde(default)]
    person: Option<String>,
    #[serde(default)]
    debt_id: Option<i64>,
}

/// Rates of 1 and above are read as percentages ("2" means 2%). A monthly
/// rate of 100% is never what the user meant.
fn normalize_rate(rate: f64) -> f64 {
    if !rate.is_finite() || rate <= 0.0 {
        0.0
    } else if rate >= 1.0 {
        rate / 100.0
    } else {
        rate
    }
}

fn status_label(status: DueStatus, days_left: Option<i64>) -> String {
    match (status, days_left) {
        (DueStatus::Overdue, Some(d)) => format!("🔴 telat {} hari", -d),
        (DueStatus::Urgent, Some(0)) => "🟠 jatuh tempo hari ini".to_string(),
        (DueStatus::Urgent, Some(d)) => format!("🟠 {} hari lagi", d),
        (DueStatus::Soon, Some(d)) => format!("🟡 {} hari lagi", d),
        (DueStatus::Ok, Some(d)) => format!("🟢 {} hari lagi", d),
        _ => "tanpa jatuh tempo".to_string(),
    }
}

/// Move a payment date forward by one installment period.
fn advance(date: NaiveDate, freq: Frequency) -> Option<NaiveDate> {
    match freq {
        Frequency::Daily => date.checked_add_days(Days::new(1)),
        Frequency::Weekly => date.checked_add_days(Days::new(7)),
        Frequency::Monthly => date.checked_add_months(Months::new(1)),
    }
}

async fn find_active(ctx: &ServiceContext<'_>, person: &str) -> anyhow::Result<Option<Debt>> {
    let debts = ctx.ledger.active_debts(ctx.user_id).await?;
    Ok(find_by_name(&debts, person).cloned())
}

fn not_found(kind: ActionKind, person: &str) -> ActionOutcome {
    ActionOutcome::clarify(
        kind,
        format!("Utang ke \"{}\" nggak ketemu. Cek daftar utang dulu ya.", person),
    )
}

pub async fn add_debt(
    ctx: &ServiceContext<'_>,
    args: &Map<String, Value>,
) -> anyhow::Result<ActionOutcome> {
    let kind = ActionKind::AddDebt;
    let Some(a) = parse_args::<AddDebtArgs>(args) else {
        return Ok(unclear(kind));
    };
    let person = a.person.trim().to_string();
    let Some(amount) = amount_of(Some(a.amount)).filter(|_| !person.is_empty()) else {
        return Ok(unclear(kind));
    };

    let interest_type = a
        .interest_type
        .as_deref()
        .map(InterestType::parse)
        .unwrap_or_default();
    let interest_rate = match interest_type {
        InterestType::None => 0.0,
        _ => normalize_rate(a.interest_rate.unwrap_or(0.0)),
    };
    let tenor_months = a.tenor_months.filter(|t| *t > 0);
    let terms = compute_terms(amount, interest_rate, interest_type, tenor_months);

    let new = NewDebt {
        person,
        amount,
        remaining: terms.total,
        interest_rate,
        interest_type,
        tenor_months,
        installment_amount: amount_of(a.installment_amount),
        installment_freq: a.installment_freq.as_deref().and_then(Frequency::parse),
        due_date: a.due_date.as_deref().and_then(parse_date),
        next_payment_date: a.next_payment_date.as_deref().and_then(parse_date),
    };
    let debt = ctx.ledger.insert_debt(ctx.user_id, &new).await?;
    info!(user_id = ctx.user_id, debt_id = debt.id, total = terms.total, "Debt recorded");

    let mut msg = format!(
        "📝 Utang ke {} dicatat: {}",
        debt.person,
        format_rupiah(debt.amount)
    );
    if terms.total != debt.amount {
        msg.push_str(&format!(" (total dengan bunga {})", format_rupiah(terms.total)));
    }
    if let Some(installment) = effective_installment(&debt) {
        let freq = debt.installment_freq.unwrap_or(Frequency::Monthly);
        msg.push_str(&format!(
            "\nCicilan {} per {}",
            format_rupiah(installment),
            period_word(freq)
        ));
    }
    let due = debt_due_status(&debt, ctx.today);
    if due.status != DueStatus::NoDue {
        msg.push_str(&format!("\nJatuh tempo: {}", status_label(due.status, due.days_left)));
    }
    Ok(ActionOutcome::done(kind, msg))
}

fn period_word(freq: Frequency) -> &'static str {
    match freq {
        Frequency::Daily => "hari",
        Frequency::Weekly => "minggu",
        Frequency::Monthly => "bulan",
    }
}

pub async fn pay_debt(
    ctx: &ServiceContext<'_>,
    args: &Map<String, Value>,
) -> anyhow::Result<ActionOutcome> {
    let kind = ActionKind::PayDebt;
    let Some(a) = parse_args::<PayDebtArgs>(args) else {
        return Ok(unclear(kind));
    };
    let Some(amount) = amount_of(Some(a.amount)) else {
        return Ok(unclear(kind));
    };
    let Some(debt) = find_active(ctx, &a.person).await? else {
        return Ok(not_found(kind, &a.person));
    };

    let paid = amount.min(debt.remaining);
    let remaining = debt.remaining - paid;
    let status = if remaining == 0 {
        DebtStatus::Settled
    } else {
        DebtStatus::Active
    };
    let next_payment_date = match (debt.next_payment_date, status) {
        (Some(date), DebtStatus::Active) => {
            advance(date, debt.installment_freq.unwrap_or(Frequency::Monthly)).or(Some(date))
        }
        (date, _) => date,
    };

    let Some(updated) = ctx
        .ledger
        .update_debt_payment(ctx.user_id, debt.id, remaining, next_payment_date, status)
        .await?
    else {
        return Ok(not_found(kind, &a.person));
    };
    info!(
        user_id = ctx.user_id,
        debt_id = updated.id,
        paid,
        remaining,
        "Debt payment recorded"
    );

    let msg = if updated.status == DebtStatus::Settled {
        let mut msg = format!("🎉 Utang ke {} LUNAS!", updated.person);
        if amount > paid {
            msg.push_str(&format!(
                " Kelebihan bayar {} nggak dicatat.",
                format_rupiah(amount - paid)
            ));
        }
        msg
    } else {
        format!(
            "💸 Bayar utang ke {} {}. Sisa {}",
            updated.person,
            format_rupiah(paid),
            format_rupiah(updated.remaining)
        )
    };
    Ok(ActionOutcome::done(kind, msg))
}

pub async fn list_debts(ctx: &ServiceContext<'_>) -> anyhow::Result<ActionOutcome> {
    let kind = ActionKind::ListDebts;
    let debts = ctx.ledger.active_debts(ctx.user_id).await?;
    if debts.is_empty() {
        return Ok(ActionOutcome::done(kind, "Nggak ada utang aktif. Mantap! 👍"));
    }

    let mut lines = vec!["📋 Utang aktif:".to_string()];
    let mut total = 0;
    for debt in &debts {
        let due = debt_due_status(debt, ctx.today);
        total += debt.remaining;
        lines.push(format!(
            "• {}: sisa {} ({})",
            debt.person,
            format_rupiah(debt.remaining),
            status_label(due.status, due.days_left)
        ));
    }
    lines.push(format!("Total: {}", format_rupiah(total)));
    Ok(ActionOutcome::done(kind, lines.join("\n")))
}

/// Resolve the debt a delete refers to and pin its id.
pub async fn describe_debt_deletion(
    ctx: &ServiceContext<'_>,
    args: &Map<String, Value>,
) -> anyhow::Result<DeletionPlan> {
    let kind = ActionKind::DeleteDebt;
    let Some(person) = parse_args::<DeleteDebtArgs>(args).and_then(|a| a.person) else {
        return Ok(DeletionPlan::NotFound(unclear(kind)));
    };
    let Some(debt) = find_active(ctx, &person).await? else {
        return Ok(DeletionPlan::NotFound(not_found(kind, &person)));
    };

    let mut payload = args.clone();
    payload.insert("debt_id".to_string(), Value::from(debt.id));
    Ok(DeletionPlan::Ready {
        description: format!(
            "Hapus utang ke {} (sisa {})?",
            debt.person,
            format_rupiah(debt.remaining)
        ),
        payload,
    })
}

pub async fn delete_debt(
    ctx: &ServiceContext<'_>,
    args: &Map<String, Value>,
) -> anyhow::Result<ActionOutcome> {
    let kind = ActionKind::DeleteDebt;
    let Some(id) = parse_args::<DeleteDebtArgs>(args).and_then(|a| a.debt_id) else {
        return Ok(unclear(kind));
    };
    if ctx.ledger.delete_debt(ctx.user_id, id).await? {
        info!(user_id = ctx.user_id, debt_id = id, "Debt deleted");
        Ok(ActionOutcome::done(kind, "🗑️ Catatan utang sudah dihapus."))
    } else {
        Ok(ActionOutcome::clarify(kind, "Catatan utangnya sudah nggak ada."))
    }
}
