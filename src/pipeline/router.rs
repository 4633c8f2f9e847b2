//! Dispatch of validated actions to the ledger services.

use std::sync::Arc;

use chrono::NaiveDate;
use serde_json::{Map, Value};
use tracing::{error, info, warn};

use super::confirmation::ConfirmationStore;
use crate::actions::ActionKind;
use crate::services::{self, ActionOutcome, DeletionPlan, ServiceContext};
use crate::traits::LedgerStore;
use crate::types::{ActionCall, PendingConfirmation};

const CONFIRM_HINT: &str = "Balas *ya* untuk lanjut atau *batal* untuk membatalkan.";

pub struct ExecutionRouter {
    ledger: Arc<dyn LedgerStore>,
    confirmations: Arc<ConfirmationStore>,
}

impl ExecutionRouter {
    pub fn new(ledger: Arc<dyn LedgerStore>, confirmations: Arc<ConfirmationStore>) -> Self {
        Self {
            ledger,
            confirmations,
        }
    }

    fn context<'a>(&'a self, user_id: &'a str, today: NaiveDate) -> ServiceContext<'a> {
        ServiceContext {
            ledger: self.ledger.as_ref(),
            user_id,
            today,
        }
    }

    /// Run a validated batch. Returns one outcome per known action, in order.
    ///
    /// Names outside the catalogue are dropped here; the inference layer is
    /// untrusted and may invent operations.
    pub async fn execute(
        &self,
        user_id: &str,
        today: NaiveDate,
        calls: Vec<ActionCall>,
    ) -> anyhow::Result<Vec<ActionOutcome>> {
        let ctx = self.context(user_id, today);
        let mut outcomes = Vec::with_capacity(calls.len());

        for call in calls {
            let Some(kind) = ActionKind::from_name(&call.name) else {
                warn!(
                    user_id,
                    action = %call.name,
                    "Dropping action outside the catalogue"
                );
                continue;
            };
            let outcome = self.dispatch(&ctx, kind, &call.arguments).await?;
            info!(
                user_id,
                action = %kind,
                read_only = kind.is_read_only(),
                clarification = outcome.needs_clarification,
                "Action handled"
            );
            outcomes.push(outcome);
        }

        self.append_progress(&ctx, &mut outcomes).await;
        Ok(outcomes)
    }

    /// Run a payload the user has just confirmed. Only destructive actions
    /// are ever parked, so anything else is refused.
    pub async fn execute_confirmed(
        &self,
        user_id: &str,
        today: NaiveDate,
        pending: &PendingConfirmation,
    ) -> anyhow::Result<ActionOutcome> {
        let ctx = self.context(user_id, today);
        let args = &pending.payload.arguments;
        match ActionKind::from_name(&pending.payload.name) {
            Some(ActionKind::DeleteTransaction) => services::delete_transaction(&ctx, args).await,
            Some(ActionKind::DeleteDebt) => services::delete_debt(&ctx, args).await,
            _ => {
                error!(
                    user_id,
                    action = %pending.payload.name,
                    "Confirmed payload is not a destructive action, ignoring"
                );
                anyhow::bail!("unexpected confirmed action {}", pending.payload.name)
            }
        }
    }

    async fn dispatch(
        &self,
        ctx: &ServiceContext<'_>,
        kind: ActionKind,
        args: &Map<String, Value>,
    ) -> anyhow::Result<ActionOutcome> {
        match kind {
            ActionKind::RecordTransactions => services::record_transactions(ctx, args).await,
            ActionKind::EditTransaction => services::edit_transaction(ctx, args).await,
            ActionKind::DeleteTransaction => {
                let plan = services::describe_transaction_deletion(ctx, args).await?;
                self.park(ctx, kind, plan).await
            }
            ActionKind::GetRecap => services::get_recap(ctx, args).await,
            ActionKind::GetHistory => services::get_history(ctx, args).await,
            ActionKind::CheckTarget => services::check_target(ctx).await,
            ActionKind::AddDebt => services::add_debt(ctx, args).await,
            ActionKind::PayDebt => services::pay_debt(ctx, args).await,
            ActionKind::ListDebts => services::list_debts(ctx).await,
            ActionKind::DeleteDebt => {
                let plan = services::describe_debt_deletion(ctx, args).await?;
                self.park(ctx, kind, plan).await
            }
            ActionKind::AddObligation => services::add_obligation(ctx, args).await,
            ActionKind::EditObligation => services::edit_obligation(ctx, args).await,
            ActionKind::CancelObligation => services::cancel_obligation(ctx, args).await,
            ActionKind::ListObligations => services::list_obligations(ctx).await,
            ActionKind::AddGoal => services::add_goal(ctx, args).await,
            ActionKind::ContributeGoal => services::contribute_goal(ctx, args).await,
            ActionKind::CancelGoal => services::cancel_goal(ctx, args).await,
            ActionKind::ListGoals => services::list_goals(ctx).await,
            ActionKind::SetDailySavings => services::set_daily_savings(ctx, args).await,
        }
    }

    /// Hold a resolved delete until the user answers yes or no.
    async fn park(
        &self,
        ctx: &ServiceContext<'_>,
        kind: ActionKind,
        plan: DeletionPlan,
    ) -> anyhow::Result<ActionOutcome> {
        let (description, payload) = match plan {
            DeletionPlan::Ready {
                description,
                payload,
            } => (description, payload),
            DeletionPlan::NotFound(outcome) => return Ok(outcome),
        };
        let Some(subject_kind) = kind.subject_kind() else {
            anyhow::bail!("{} is not a destructive action", kind);
        };

        let pending = PendingConfirmation {
            subject_kind,
            payload: ActionCall::new(kind.name(), payload),
            description: description.clone(),
        };
        if let Err(e) = self.confirmations.propose(ctx.user_id, &pending).await {
            // Without a stored confirmation the delete can never run, so say so.
            warn!(user_id = ctx.user_id, action = %kind, error = %e, "Could not store confirmation");
            return Ok(ActionOutcome::clarify(
                kind,
                "Maaf, penghapusan belum bisa diproses sekarang. Coba lagi sebentar ya.",
            ));
        }
        Ok(ActionOutcome::done(
            kind,
            format!("⚠️ {}\n{}", description, CONFIRM_HINT),
        ))
    }

    /// Recording income always reports progress against today's target.
    async fn append_progress(&self, ctx: &ServiceContext<'_>, outcomes: &mut [ActionOutcome]) {
        let Some(first) = outcomes.iter_mut().find(|o| o.recorded_income) else {
            return;
        };
        match services::target_breakdown(ctx).await {
            Ok(breakdown) => {
                first.message.push_str("\n\n");
                first.message.push_str(&services::progress_summary(&breakdown));
            }
            Err(e) => {
                warn!(user_id = ctx.user_id, error = %e, "Target breakdown failed, skipping progress note");
            }
        }
    }
}
