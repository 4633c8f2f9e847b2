use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

mod kv;
mod ledger;
mod provider;

pub use kv::KvStore;
pub use ledger::LedgerStore;
pub use provider::{InferenceRequest, ModelProvider};

/// Direction of a ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TxKind {
    Income,
    Expense,
}

impl TxKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TxKind::Income => "income",
            TxKind::Expense => "expense",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "income" | "pemasukan" | "masuk" => Some(TxKind::Income),
            "expense" | "pengeluaran" | "keluar" => Some(TxKind::Expense),
            _ => None,
        }
    }
}

/// A single income or expense row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    pub user_id: String,
    pub kind: TxKind,
    pub amount: i64,
    pub category: String,
    pub note: Option<String>,
    pub occurred_on: NaiveDate,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub kind: TxKind,
    pub amount: i64,
    pub category: String,
    pub note: Option<String>,
    pub occurred_on: NaiveDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterestType {
    #[default]
    None,
    Flat,
    Daily,
}

impl InterestType {
    pub fn as_str(&self) -> &'static str {
        match self {
            InterestType::None => "none",
            InterestType::Flat => "flat",
            InterestType::Daily => "daily",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "flat" => InterestType::Flat,
            "daily" | "harian" => InterestType::Daily,
            _ => InterestType::None,
        }
    }
}

/// How often a recurring amount falls due. Shared by obligations and debt installments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    Daily,
    Weekly,
    #[default]
    Monthly,
}

impl Frequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Frequency::Daily => "daily",
            Frequency::Weekly => "weekly",
            Frequency::Monthly => "monthly",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "daily" | "harian" => Some(Frequency::Daily),
            "weekly" | "mingguan" => Some(Frequency::Weekly),
            "monthly" | "bulanan" => Some(Frequency::Monthly),
            _ => None,
        }
    }

    /// Days covered by one period, used to spread an amount into a daily rate.
    pub fn days(&self) -> i64 {
        match self {
            Frequency::Daily => 1,
            Frequency::Weekly => 7,
            Frequency::Monthly => 30,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DebtStatus {
    Active,
    Settled,
}

impl DebtStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DebtStatus::Active => "active",
            DebtStatus::Settled => "settled",
        }
    }

    pub fn parse(s: &str) -> Self {
        if s == "settled" {
            DebtStatus::Settled
        } else {
            DebtStatus::Active
        }
    }
}

/// Money the user owes to someone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Debt {
    pub id: i64,
    pub user_id: String,
    pub person: String,
    /// Principal.
    pub amount: i64,
    /// Outstanding balance, interest included. Never above `total_with_interest`.
    pub remaining: i64,
    pub interest_rate: f64,
    pub interest_type: InterestType,
    pub tenor_months: Option<u32>,
    pub installment_amount: Option<i64>,
    pub installment_freq: Option<Frequency>,
    pub due_date: Option<NaiveDate>,
    pub next_payment_date: Option<NaiveDate>,
    pub status: DebtStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct NewDebt {
    pub person: String,
    pub amount: i64,
    pub remaining: i64,
    pub interest_rate: f64,
    pub interest_type: InterestType,
    pub tenor_months: Option<u32>,
    pub installment_amount: Option<i64>,
    pub installment_freq: Option<Frequency>,
    pub due_date: Option<NaiveDate>,
    pub next_payment_date: Option<NaiveDate>,
}

/// Lifecycle of obligations and goals. Leaving `Active` is one-way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordStatus {
    Active,
    Done,
    Cancelled,
}

impl RecordStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordStatus::Active => "active",
            RecordStatus::Done => "done",
            RecordStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "done" => RecordStatus::Done,
            "cancelled" => RecordStatus::Cancelled,
            _ => RecordStatus::Active,
        }
    }
}

/// A recurring fixed payment such as rent or a vehicle installment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Obligation {
    pub id: i64,
    pub user_id: String,
    pub name: String,
    pub amount: i64,
    pub frequency: Frequency,
    pub status: RecordStatus,
    pub created_at: DateTime<Utc>,
}

/// A savings target with a deadline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Goal {
    pub id: i64,
    pub user_id: String,
    pub name: String,
    pub target_amount: i64,
    pub saved_amount: i64,
    pub deadline: NaiveDate,
    pub status: RecordStatus,
    pub created_at: DateTime<Utc>,
}

/// Anything that can be looked up by a free-text name.
pub trait Named {
    fn display_name(&self) -> &str;
}

impl Named for Obligation {
    fn display_name(&self) -> &str {
        &self.name
    }
}

impl Named for Goal {
    fn display_name(&self) -> &str {
        &self.name
    }
}

impl Named for Debt {
    fn display_name(&self) -> &str {
        &self.person
    }
}
