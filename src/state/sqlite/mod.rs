use chrono::{DateTime, NaiveDate, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};

use crate::traits::{
    Debt, DebtStatus, Frequency, Goal, InterestType, Obligation, RecordStatus, Transaction,
    TxKind,
};

mod kv;
mod ledger;
mod migrations;


/// Set restrictive file permissions (0600) on the database and WAL files.
fn set_db_file_permissions(db_path: &str) {
    use std::os::unix::fs::PermissionsExt;
    let mode = std::fs::Permissions::from_mode(0o600);
    if let Err(e) = std::fs::set_permissions(db_path, mode.clone()) {
        tracing::warn!("Failed to set permissions on {}: {}", db_path, e);
    }
    for suffix in &["-wal", "-shm"] {
        let path = format!("{}{}", db_path, suffix);
        if std::path::Path::new(&path).exists() {
            if let Err(e) = std::fs::set_permissions(&path, mode.clone()) {
                tracing::warn!("Failed to set permissions on {}: {}", path, e);
            }
        }
    }
}

/// Open (creating if needed) the database and bring the schema up to date.
/// Ledger and KV stores share the returned pool.
pub async fn open_pool(db_path: &str) -> anyhow::Result<SqlitePool> {
    let opts = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(opts)
        .await?;

    set_db_file_permissions(db_path);
    migrations::migrate(&pool).await?;
    Ok(pool)
}

/// Durable per-user ledger.
pub struct SqliteLedgerStore {
    pool: SqlitePool,
}

impl SqliteLedgerStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

/// Key-value state in the same database. Expired rows are invisible to reads
/// and cleaned up on write.
pub struct SqliteKvStore {
    pool: SqlitePool,
}

impl SqliteKvStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn parse_timestamp(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

fn parse_day(raw: &str) -> anyhow::Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|e| anyhow::anyhow!("Bad date '{}' in ledger: {}", raw, e))
}

fn parse_opt_day(raw: Option<String>) -> anyhow::Result<Option<NaiveDate>> {
    raw.as_deref().map(parse_day).transpose()
}

fn day_str(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn row_to_transaction(r: &SqliteRow) -> anyhow::Result<Transaction> {
    let kind: String = r.get("kind");
    let occurred_on: String = r.get("occurred_on");
    let created_at: String = r.get("created_at");
    Ok(Transaction {
        id: r.get("id"),
        user_id: r.get("user_id"),
        kind: TxKind::parse(&kind)
            .ok_or_else(|| anyhow::anyhow!("Unknown transaction kind '{}'", kind))?,
        amount: r.get("amount"),
        category: r.get("category"),
        note: r.get("note"),
        occurred_on: parse_day(&occurred_on)?,
        created_at: parse_timestamp(&created_at),
    })
}

fn row_to_debt(r: &SqliteRow) -> anyhow::Result<Debt> {
    let interest_type: String = r.get("interest_type");
    let installment_freq: Option<String> = r.get("installment_freq");
    let tenor_months: Option<i64> = r.get("tenor_months");
    let status: String = r.get("status");
    let created_at: String = r.get("created_at");
    Ok(Debt {
        id: r.get("id"),
        user_id: r.get("user_id"),
        person: r.get("person"),
        amount: r.get("amount"),
        remaining: r.get("remaining"),
        interest_rate: r.get("interest_rate"),
        interest_type: InterestType::parse(&interest_type),
        tenor_months: tenor_months.and_then(|t| u32::try_from(t).ok()),
        installment_amount: r.get("installment_amount"),
        installment_freq: installment_freq.as_deref().and_then(Frequency::parse),
        due_date: parse_opt_day(r.get("due_date"))?,
        next_payment_date: parse_opt_day(r.get("next_payment_date"))?,
        status: DebtStatus::parse(&status),
        created_at: parse_timestamp(&created_at),
    })
}

fn row_to_obligation(r: &SqliteRow) -> Obligation {
    let frequency: String = r.get("frequency");
    let status: String = r.get("status");
    let created_at: String = r.get("created_at");
    Obligation {
        id: r.get("id"),
        user_id: r.get("user_id"),
        name: r.get("name"),
        amount: r.get("amount"),
        frequency: Frequency::parse(&frequency).unwrap_or_default(),
        status: RecordStatus::parse(&status),
        created_at: parse_timestamp(&created_at),
    }
}

fn row_to_goal(r: &SqliteRow) -> anyhow::Result<Goal> {
    let deadline: String = r.get("deadline");
    let status: String = r.get("status");
    let created_at: String = r.get("created_at");
    Ok(Goal {
        id: r.get("id"),
        user_id: r.get("user_id"),
        name: r.get("name"),
        target_amount: r.get("target_amount"),
        saved_amount: r.get("saved_amount"),
        deadline: parse_day(&deadline)?,
        status: RecordStatus::parse(&status),
        created_at: parse_timestamp(&created_at),
    })
}
