use super::*;

use crate::traits::{LedgerStore, NewDebt, NewTransaction};

const TRANSACTION_COLUMNS: &str =
    "id, user_id, kind, amount, category, note, occurred_on, created_at";

impl SqliteLedgerStore {
    async fn debt_by_id(&self, user_id: &str, id: i64) -> anyhow::Result<Option<Debt>> {
        let row = sqlx::query("SELECT * FROM debts WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(row_to_debt).transpose()
    }

    async fn obligation_by_id(&self, user_id: &str, id: i64) -> anyhow::Result<Option<Obligation>> {
        let row = sqlx::query("SELECT * FROM obligations WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(row_to_obligation))
    }

    async fn goal_by_id(&self, user_id: &str, id: i64) -> anyhow::Result<Option<Goal>> {
        let row = sqlx::query("SELECT * FROM goals WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(row_to_goal).transpose()
    }
}

#[async_trait::async_trait]
impl LedgerStore for SqliteLedgerStore {
    async fn insert_transaction(
        &self,
        user_id: &str,
        tx: &NewTransaction,
    ) -> anyhow::Result<Transaction> {
        let created_at = Utc::now();
        let result = sqlx::query(
            "INSERT INTO transactions (user_id, kind, amount, category, note, occurred_on, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(user_id)
        .bind(tx.kind.as_str())
        .bind(tx.amount)
        .bind(&tx.category)
        .bind(&tx.note)
        .bind(day_str(tx.occurred_on))
        .bind(created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(Transaction {
            id: result.last_insert_rowid(),
            user_id: user_id.to_string(),
            kind: tx.kind,
            amount: tx.amount,
            category: tx.category.clone(),
            note: tx.note.clone(),
            occurred_on: tx.occurred_on,
            created_at,
        })
    }

    async fn get_transaction(&self, user_id: &str, id: i64) -> anyhow::Result<Option<Transaction>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM transactions WHERE id = ? AND user_id = ?",
            TRANSACTION_COLUMNS
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(row_to_transaction).transpose()
    }

    async fn last_transaction(&self, user_id: &str) -> anyhow::Result<Option<Transaction>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM transactions WHERE user_id = ? ORDER BY id DESC LIMIT 1",
            TRANSACTION_COLUMNS
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(row_to_transaction).transpose()
    }

    async fn update_transaction(
        &self,
        user_id: &str,
        id: i64,
        amount: Option<i64>,
        category: Option<&str>,
    ) -> anyhow::Result<Option<Transaction>> {
        let result = sqlx::query(
            "UPDATE transactions
             SET amount = COALESCE(?, amount), category = COALESCE(?, category)
             WHERE id = ? AND user_id = ?",
        )
        .bind(amount)
        .bind(category)
        .bind(id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_transaction(user_id, id).await
    }

    async fn delete_transaction(&self, user_id: &str, id: i64) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM transactions WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn recent_transactions(
        &self,
        user_id: &str,
        limit: usize,
    ) -> anyhow::Result<Vec<Transaction>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM transactions WHERE user_id = ?
             ORDER BY occurred_on DESC, id DESC LIMIT ?",
            TRANSACTION_COLUMNS
        ))
        .bind(user_id)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(row_to_transaction).collect()
    }

    async fn sum_transactions(
        &self,
        user_id: &str,
        kind: TxKind,
        from: NaiveDate,
        to: NaiveDate,
    ) -> anyhow::Result<i64> {
        let row = sqlx::query(
            "SELECT COALESCE(SUM(amount), 0) AS total FROM transactions
             WHERE user_id = ? AND kind = ? AND occurred_on >= ? AND occurred_on <= ?",
        )
        .bind(user_id)
        .bind(kind.as_str())
        .bind(day_str(from))
        .bind(day_str(to))
        .fetch_one(&self.pool)
        .await?;
        Ok(row.get::<i64, _>("total"))
    }

    async fn insert_debt(&self, user_id: &str, debt: &NewDebt) -> anyhow::Result<Debt> {
        let result = sqlx::query(
            "INSERT INTO debts (user_id, person, amount, remaining, interest_rate, interest_type,
                                tenor_months, installment_amount, installment_freq, due_date,
                                next_payment_date, status, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 'active', ?)",
        )
        .bind(user_id)
        .bind(&debt.person)
        .bind(debt.amount)
        .bind(debt.remaining)
        .bind(debt.interest_rate)
        .bind(debt.interest_type.as_str())
        .bind(debt.tenor_months.map(i64::from))
        .bind(debt.installment_amount)
        .bind(debt.installment_freq.map(|f| f.as_str()))
        .bind(debt.due_date.map(day_str))
        .bind(debt.next_payment_date.map(day_str))
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        self.debt_by_id(user_id, result.last_insert_rowid())
            .await?
            .ok_or_else(|| anyhow::anyhow!("Debt vanished right after insert"))
    }

    async fn active_debts(&self, user_id: &str) -> anyhow::Result<Vec<Debt>> {
        let rows = sqlx::query(
            "SELECT * FROM debts WHERE user_id = ? AND status = 'active' ORDER BY id",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(row_to_debt).collect()
    }

    async fn update_debt_payment(
        &self,
        user_id: &str,
        id: i64,
        remaining: i64,
        next_payment_date: Option<NaiveDate>,
        status: DebtStatus,
    ) -> anyhow::Result<Option<Debt>> {
        let result = sqlx::query(
            "UPDATE debts SET remaining = ?, next_payment_date = ?, status = ?
             WHERE id = ? AND user_id = ? AND status = 'active'",
        )
        .bind(remaining.max(0))
        .bind(next_payment_date.map(day_str))
        .bind(status.as_str())
        .bind(id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.debt_by_id(user_id, id).await
    }

    async fn delete_debt(&self, user_id: &str, id: i64) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM debts WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn insert_obligation(
        &self,
        user_id: &str,
        name: &str,
        amount: i64,
        frequency: Frequency,
    ) -> anyhow::Result<Obligation> {
        let created_at = Utc::now();
        let result = sqlx::query(
            "INSERT INTO obligations (user_id, name, amount, frequency, status, created_at)
             VALUES (?, ?, ?, ?, 'active', ?)",
        )
        .bind(user_id)
        .bind(name)
        .bind(amount)
        .bind(frequency.as_str())
        .bind(created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(Obligation {
            id: result.last_insert_rowid(),
            user_id: user_id.to_string(),
            name: name.to_string(),
            amount,
            frequency,
            status: RecordStatus::Active,
            created_at,
        })
    }

    async fn active_obligations(&self, user_id: &str) -> anyhow::Result<Vec<Obligation>> {
        let rows = sqlx::query(
            "SELECT * FROM obligations WHERE user_id = ? AND status = 'active' ORDER BY id",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().map(row_to_obligation).collect())
    }

    async fn update_obligation_amount(
        &self,
        user_id: &str,
        id: i64,
        amount: i64,
    ) -> anyhow::Result<Option<Obligation>> {
        let result = sqlx::query(
            "UPDATE obligations SET amount = ?
             WHERE id = ? AND user_id = ? AND status = 'active'",
        )
        .bind(amount)
        .bind(id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.obligation_by_id(user_id, id).await
    }

    async fn set_obligation_status(
        &self,
        user_id: &str,
        id: i64,
        status: RecordStatus,
    ) -> anyhow::Result<Option<Obligation>> {
        let result = sqlx::query(
            "UPDATE obligations SET status = ?
             WHERE id = ? AND user_id = ? AND status = 'active'",
        )
        .bind(status.as_str())
        .bind(id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.obligation_by_id(user_id, id).await
    }

    async fn insert_goal(
        &self,
        user_id: &str,
        name: &str,
        target_amount: i64,
        deadline: NaiveDate,
    ) -> anyhow::Result<Goal> {
        let created_at = Utc::now();
        let result = sqlx::query(
            "INSERT INTO goals (user_id, name, target_amount, saved_amount, deadline, status, created_at)
             VALUES (?, ?, ?, 0, ?, 'active', ?)",
        )
        .bind(user_id)
        .bind(name)
        .bind(target_amount)
        .bind(day_str(deadline))
        .bind(created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(Goal {
            id: result.last_insert_rowid(),
            user_id: user_id.to_string(),
            name: name.to_string(),
            target_amount,
            saved_amount: 0,
            deadline,
            status: RecordStatus::Active,
            created_at,
        })
    }

    async fn active_goals(&self, user_id: &str) -> anyhow::Result<Vec<Goal>> {
        let rows = sqlx::query(
            "SELECT * FROM goals WHERE user_id = ? AND status = 'active' ORDER BY deadline, id",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(row_to_goal).collect()
    }

    async fn update_goal_saved(
        &self,
        user_id: &str,
        id: i64,
        saved_amount: i64,
    ) -> anyhow::Result<Option<Goal>> {
        let result = sqlx::query(
            "UPDATE goals SET saved_amount = ?
             WHERE id = ? AND user_id = ? AND status = 'active'",
        )
        .bind(saved_amount.max(0))
        .bind(id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.goal_by_id(user_id, id).await
    }

    async fn set_goal_status(
        &self,
        user_id: &str,
        id: i64,
        status: RecordStatus,
    ) -> anyhow::Result<Option<Goal>> {
        let result = sqlx::query(
            "UPDATE goals SET status = ?
             WHERE id = ? AND user_id = ? AND status = 'active'",
        )
        .bind(status.as_str())
        .bind(id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.goal_by_id(user_id, id).await
    }

    async fn daily_savings(&self, user_id: &str) -> anyhow::Result<i64> {
        let row = sqlx::query("SELECT daily_savings FROM user_settings WHERE user_id = ?")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|r| r.get::<i64, _>("daily_savings")).unwrap_or(0))
    }

    async fn set_daily_savings(&self, user_id: &str, amount: i64) -> anyhow::Result<()> {
        sqlx::query(
            "INSERT INTO user_settings (user_id, daily_savings, updated_at) VALUES (?, ?, datetime('now'))
             ON CONFLICT(user_id) DO UPDATE SET daily_savings = excluded.daily_savings, updated_at = excluded.updated_at",
        )
        .bind(user_id)
        .bind(amount.max(0))
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
