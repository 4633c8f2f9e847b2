use async_trait::async_trait;
use chrono::NaiveDate;

use super::{
    Debt, DebtStatus, Frequency, Goal, NewDebt, NewTransaction, Obligation, RecordStatus,
    Transaction, TxKind,
};

/// Durable per-user ledger storage.
///
/// Every call is scoped to one `user_id`; rows belonging to another user are
/// never visible. Lookups return `None` (or `false` for deletes) when the row
/// does not exist so callers can turn it into a clarification instead of an error.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    // --- transactions ---

    async fn insert_transaction(
        &self,
        user_id: &str,
        tx: &NewTransaction,
    ) -> anyhow::Result<Transaction>;

    async fn get_transaction(&self, user_id: &str, id: i64) -> anyhow::Result<Option<Transaction>>;

    /// Most recently created transaction.
    async fn last_transaction(&self, user_id: &str) -> anyhow::Result<Option<Transaction>>;

    async fn update_transaction(
        &self,
        user_id: &str,
        id: i64,
        amount: Option<i64>,
        category: Option<&str>,
    ) -> anyhow::Result<Option<Transaction>>;

    async fn delete_transaction(&self, user_id: &str, id: i64) -> anyhow::Result<bool>;

    async fn recent_transactions(
        &self,
        user_id: &str,
        limit: usize,
    ) -> anyhow::Result<Vec<Transaction>>;

    /// Sum of `kind` amounts with `from <= occurred_on <= to`.
    async fn sum_transactions(
        &self,
        user_id: &str,
        kind: TxKind,
        from: NaiveDate,
        to: NaiveDate,
    ) -> anyhow::Result<i64>;

    // --- debts ---

    async fn insert_debt(&self, user_id: &str, debt: &NewDebt) -> anyhow::Result<Debt>;

    async fn active_debts(&self, user_id: &str) -> anyhow::Result<Vec<Debt>>;

    /// Record a payment. Only applies to active debts; a settled debt stays settled.
    async fn update_debt_payment(
        &self,
        user_id: &str,
        id: i64,
        remaining: i64,
        next_payment_date: Option<NaiveDate>,
        status: DebtStatus,
    ) -> anyhow::Result<Option<Debt>>;

    async fn delete_debt(&self, user_id: &str, id: i64) -> anyhow::Result<bool>;

    // --- obligations ---

    async fn insert_obligation(
        &self,
        user_id: &str,
        name: &str,
        amount: i64,
        frequency: Frequency,
    ) -> anyhow::Result<Obligation>;

    async fn active_obligations(&self, user_id: &str) -> anyhow::Result<Vec<Obligation>>;

    async fn update_obligation_amount(
        &self,
        user_id: &str,
        id: i64,
        amount: i64,
    ) -> anyhow::Result<Option<Obligation>>;

    /// Move an active obligation to `done`/`cancelled`. No-op on inactive rows.
    async fn set_obligation_status(
        &self,
        user_id: &str,
        id: i64,
        status: RecordStatus,
    ) -> anyhow::Result<Option<Obligation>>;

    // --- goals ---

    async fn insert_goal(
        &self,
        user_id: &str,
        name: &str,
        target_amount: i64,
        deadline: NaiveDate,
    ) -> anyhow::Result<Goal>;

    async fn active_goals(&self, user_id: &str) -> anyhow::Result<Vec<Goal>>;

    async fn update_goal_saved(
        &self,
        user_id: &str,
        id: i64,
        saved_amount: i64,
    ) -> anyhow::Result<Option<Goal>>;

    async fn set_goal_status(
        &self,
        user_id: &str,
        id: i64,
        status: RecordStatus,
    ) -> anyhow::Result<Option<Goal>>;

    // --- settings ---

    /// Configured daily savings amount, 0 when never set.
    async fn daily_savings(&self, user_id: &str) -> anyhow::Result<i64>;

    async fn set_daily_savings(&self, user_id: &str, amount: i64) -> anyhow::Result<()>;
}
