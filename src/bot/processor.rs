/* Business operations over the ledger store.
 * Handlers stay thin: they parse input and render output, while every
 * ledger-touching decision lives here and is exercised directly by the
 * test suite through the in-memory store.
 */

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;

use crate::bot::constants::misc::{LIMIT_PERIOD, PERIOD_MONTHLY, PERIOD_WEEKLY};
use crate::bot::ledger::{
    CategoryTotal, Expense, Income, LedgerStore, NewChannel, RequiredChannel, StoreError,
    UserProfile,
};
use crate::bot::utils::BotError;

#[derive(thiserror::Error, Debug)]
pub enum ProcessError {
    #[error("Store error: {0}")]
    StoreError(StoreError),
}

impl From<StoreError> for ProcessError {
    fn from(store_error: StoreError) -> ProcessError {
        ProcessError::StoreError(store_error)
    }
}

/* Users */

pub fn register_user(
    store: &dyn LedgerStore,
    telegram_id: u64,
    username: Option<&str>,
    first_name: Option<&str>,
) -> Result<UserProfile, ProcessError> {
    Ok(store.find_or_create_user(telegram_id, username, first_name)?)
}

pub fn set_language(
    store: &dyn LedgerStore,
    telegram_id: u64,
    language: &str,
) -> Result<(), ProcessError> {
    Ok(store.set_user_language(telegram_id, language)?)
}

/* Ledger entries */

pub fn record_expense(
    store: &dyn LedgerStore,
    user_id: u64,
    amount: i64,
    category: &str,
    note: Option<&str>,
) -> Result<Expense, ProcessError> {
    Ok(store.create_expense(user_id, amount, category, note)?)
}

pub fn record_income(
    store: &dyn LedgerStore,
    user_id: u64,
    amount: i64,
    source: &str,
    note: Option<&str>,
) -> Result<Income, ProcessError> {
    Ok(store.create_income(user_id, amount, source, note)?)
}

#[derive(Debug, Clone, PartialEq)]
pub struct LimitBreach {
    pub spent: i64,
    pub limit: i64,
}

// Rolling-window spend check, run after a commit as a separate side effect.
pub fn check_expense_limit(
    store: &dyn LedgerStore,
    user_id: u64,
    limit: i64,
) -> Result<Option<LimitBreach>, ProcessError> {
    let spent = store.expense_sum_by_period(user_id, LIMIT_PERIOD)?;
    if spent > limit {
        Ok(Some(LimitBreach { spent, limit }))
    } else {
        Ok(None)
    }
}

/* Aggregation */

#[derive(Debug, Clone, PartialEq)]
pub struct BalanceSummary {
    pub total_income: i64,
    pub total_expense: i64,
    pub balance: i64,
}

pub fn get_balance(store: &dyn LedgerStore, user_id: u64) -> Result<BalanceSummary, ProcessError> {
    let total_income = store.income_total(user_id)?;
    let total_expense = store.expense_total(user_id)?;
    Ok(BalanceSummary {
        total_income,
        total_expense,
        balance: total_income - total_expense,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportPeriod {
    Weekly,
    Monthly,
}

impl ReportPeriod {
    pub fn days(&self) -> i64 {
        match self {
            ReportPeriod::Weekly => PERIOD_WEEKLY,
            ReportPeriod::Monthly => PERIOD_MONTHLY,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            ReportPeriod::Weekly => "Weekly",
            ReportPeriod::Monthly => "Monthly",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PeriodReport {
    pub period: ReportPeriod,
    pub by_category: Vec<CategoryTotal>,
    pub total_income: i64,
    pub total_expense: i64,
}

pub fn build_report(
    store: &dyn LedgerStore,
    user_id: u64,
    period: ReportPeriod,
) -> Result<PeriodReport, ProcessError> {
    let days = period.days();
    Ok(PeriodReport {
        period,
        by_category: store.expense_sum_by_category(user_id, days)?,
        total_income: store.income_sum_by_period(user_id, days)?,
        total_expense: store.expense_sum_by_period(user_id, days)?,
    })
}

/* Required channels */

pub fn upsert_required_channel(
    store: &dyn LedgerStore,
    channel: NewChannel,
) -> Result<RequiredChannel, ProcessError> {
    Ok(store.upsert_channel(channel)?)
}

pub fn toggle_required_channel(
    store: &dyn LedgerStore,
    channel_id: &str,
) -> Result<Option<RequiredChannel>, ProcessError> {
    Ok(store.toggle_channel(channel_id)?)
}

pub fn remove_required_channel(
    store: &dyn LedgerStore,
    channel_id: &str,
) -> Result<bool, ProcessError> {
    Ok(store.delete_channel(channel_id)?)
}

pub fn retrieve_channels(store: &dyn LedgerStore) -> Result<Vec<RequiredChannel>, ProcessError> {
    Ok(store.list_channels()?)
}

pub fn find_required_channel(
    store: &dyn LedgerStore,
    channel_id: &str,
) -> Result<Option<RequiredChannel>, ProcessError> {
    Ok(store.find_channel(channel_id)?)
}

#[derive(Debug, Clone, PartialEq)]
pub struct UsageStatistics {
    pub total_users: u64,
    pub unblocked_users: u64,
    pub total_channels: usize,
    pub active_channels: usize,
}

pub fn usage_statistics(store: &dyn LedgerStore) -> Result<UsageStatistics, ProcessError> {
    let channels = store.list_channels()?;
    let active_channels = channels.iter().filter(|c| c.is_active).count();
    Ok(UsageStatistics {
        total_users: store.user_count()?,
        unblocked_users: store.unblocked_user_count()?,
        total_channels: channels.len(),
        active_channels,
    })
}

/* Subscription gate */

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MembershipStatus {
    Owner,
    Administrator,
    Member,
    Restricted,
    Left,
    Kicked,
}

impl MembershipStatus {
    // Left and kicked are the only statuses that fail the gate
    pub fn is_member(&self) -> bool {
        !matches!(self, MembershipStatus::Left | MembershipStatus::Kicked)
    }
}

#[async_trait]
pub trait MembershipChecker: Send + Sync {
    async fn status(&self, channel_id: &str, user_id: u64) -> Result<MembershipStatus, BotError>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubscriptionStatus {
    pub satisfied: bool,
    pub missing: Vec<RequiredChannel>,
}

// A failed check counts as not-a-member: better to ask a joined user to
// re-tap the check button than to let a non-member through.
pub async fn check_subscription(
    store: &dyn LedgerStore,
    checker: &dyn MembershipChecker,
    user_id: u64,
) -> Result<SubscriptionStatus, ProcessError> {
    let channels = store.active_channels()?;
    if channels.is_empty() {
        return Ok(SubscriptionStatus { satisfied: true, missing: Vec::new() });
    }

    let mut missing = Vec::new();
    for channel in channels {
        let is_member = match checker.status(&channel.channel_id, user_id).await {
            Ok(status) => status.is_member(),
            Err(err) => {
                log::warn!(
                    "Membership check failed for channel {} and user {}: {}",
                    channel.channel_id,
                    user_id,
                    err
                );
                false
            }
        };
        if !is_member {
            missing.push(channel);
        }
    }

    Ok(SubscriptionStatus { satisfied: missing.is_empty(), missing })
}

/* Broadcast */

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BroadcastSummary {
    pub sent: u32,
    pub failed: u32,
}

// Blocked users are never broadcast targets.
pub fn broadcast_recipients(store: &dyn LedgerStore) -> Result<Vec<UserProfile>, ProcessError> {
    Ok(store.unblocked_users()?)
}

// Sequential delivery with pacing between successful sends. A failed
// recipient is tallied and the loop moves on.
pub async fn run_broadcast<F, Fut>(
    recipients: &[UserProfile],
    pace: Duration,
    send: F,
) -> BroadcastSummary
where
    F: Fn(u64) -> Fut,
    Fut: Future<Output = Result<(), BotError>>,
{
    let mut summary = BroadcastSummary::default();
    for user in recipients {
        match send(user.telegram_id).await {
            Ok(()) => {
                summary.sent += 1;
                if !pace.is_zero() {
                    tokio::time::sleep(pace).await;
                }
            }
            Err(err) => {
                log::error!(
                    "Broadcast delivery failed for user {}: {}",
                    user.telegram_id,
                    err
                );
                summary.failed += 1;
            }
        }
    }
    summary
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::bot::ledger::{ChannelKind, MemoryLedgerStore};

    struct ScriptedChecker {
        statuses: HashMap<String, MembershipStatus>,
        failing: Vec<String>,
    }

    impl ScriptedChecker {
        fn new() -> Self {
            Self { statuses: HashMap::new(), failing: Vec::new() }
        }

        fn with_status(mut self, channel_id: &str, status: MembershipStatus) -> Self {
            self.statuses.insert(channel_id.to_string(), status);
            self
        }

        fn with_failure(mut self, channel_id: &str) -> Self {
            self.failing.push(channel_id.to_string());
            self
        }
    }

    #[async_trait]
    impl MembershipChecker for ScriptedChecker {
        async fn status(
            &self,
            channel_id: &str,
            _user_id: u64,
        ) -> Result<MembershipStatus, BotError> {
            if self.failing.iter().any(|c| c == channel_id) {
                return Err(BotError::UserError("api unavailable".to_string()));
            }
            Ok(*self.statuses.get(channel_id).unwrap_or(&MembershipStatus::Member))
        }
    }

    fn seed_channel(store: &MemoryLedgerStore, channel_id: &str, active: bool) {
        store
            .upsert_channel(NewChannel {
                channel_id: channel_id.to_string(),
                title: channel_id.trim_start_matches('@').to_string(),
                url: format!("https://t.me/{}", channel_id.trim_start_matches('@')),
                kind: ChannelKind::Channel,
            })
            .unwrap();
        if !active {
            store.toggle_channel(channel_id).unwrap();
        }
    }

    fn user(telegram_id: u64) -> UserProfile {
        UserProfile {
            telegram_id,
            username: None,
            first_name: None,
            language: "en".to_string(),
            is_blocked: false,
            created_at: 0,
        }
    }

    #[test]
    fn balance_is_income_minus_expense() {
        let store = MemoryLedgerStore::new();
        record_income(&store, 1, 2_000, "salary", None).unwrap();
        record_expense(&store, 1, 500, "food", None).unwrap();
        record_expense(&store, 1, 700, "transport", None).unwrap();

        let summary = get_balance(&store, 1).unwrap();
        assert_eq!(summary.total_income, 2_000);
        assert_eq!(summary.total_expense, 1_200);
        assert_eq!(summary.balance, 800);
    }

    #[test]
    fn balance_of_zero_row_user_is_zero() {
        let store = MemoryLedgerStore::new();
        let summary = get_balance(&store, 99).unwrap();
        assert_eq!(
            summary,
            BalanceSummary { total_income: 0, total_expense: 0, balance: 0 }
        );
    }

    #[test]
    fn balance_can_go_negative() {
        let store = MemoryLedgerStore::new();
        record_expense(&store, 1, 300, "food", None).unwrap();
        assert_eq!(get_balance(&store, 1).unwrap().balance, -300);
    }

    #[test]
    fn limit_check_warns_only_above_the_limit() {
        let store = MemoryLedgerStore::new();
        record_expense(&store, 1, 900, "food", None).unwrap();
        assert_eq!(check_expense_limit(&store, 1, 1_000).unwrap(), None);

        record_expense(&store, 1, 200, "food", None).unwrap();
        assert_eq!(
            check_expense_limit(&store, 1, 1_000).unwrap(),
            Some(LimitBreach { spent: 1_100, limit: 1_000 })
        );
    }

    #[test]
    fn report_aggregates_the_requested_window() {
        let store = MemoryLedgerStore::new();
        record_expense(&store, 1, 600, "food", None).unwrap();
        record_expense(&store, 1, 400, "transport", None).unwrap();
        record_income(&store, 1, 5_000, "salary", None).unwrap();

        let report = build_report(&store, 1, ReportPeriod::Weekly).unwrap();
        assert_eq!(report.total_expense, 1_000);
        assert_eq!(report.total_income, 5_000);
        assert_eq!(report.by_category.len(), 2);
        assert_eq!(report.by_category[0].category, "food");
    }

    #[tokio::test]
    async fn gate_passes_everyone_with_no_active_channels() {
        let store = MemoryLedgerStore::new();
        seed_channel(&store, "@dormant", false);
        let checker = ScriptedChecker::new().with_status("@dormant", MembershipStatus::Left);

        let status = check_subscription(&store, &checker, 1).await.unwrap();
        assert!(status.satisfied);
        assert!(status.missing.is_empty());
    }

    #[tokio::test]
    async fn gate_reports_left_channels() {
        let store = MemoryLedgerStore::new();
        seed_channel(&store, "@news", true);
        seed_channel(&store, "@chat", true);
        let checker = ScriptedChecker::new()
            .with_status("@news", MembershipStatus::Left)
            .with_status("@chat", MembershipStatus::Member);

        let status = check_subscription(&store, &checker, 1).await.unwrap();
        assert!(!status.satisfied);
        assert_eq!(status.missing.len(), 1);
        assert_eq!(status.missing[0].channel_id, "@news");
    }

    #[tokio::test]
    async fn gate_treats_check_failures_as_unsatisfied() {
        let store = MemoryLedgerStore::new();
        seed_channel(&store, "@flaky", true);
        let checker = ScriptedChecker::new().with_failure("@flaky");

        let status = check_subscription(&store, &checker, 1).await.unwrap();
        assert!(!status.satisfied);
        assert_eq!(status.missing[0].channel_id, "@flaky");
    }

    #[tokio::test]
    async fn gate_accepts_admin_and_restricted_statuses() {
        let store = MemoryLedgerStore::new();
        seed_channel(&store, "@news", true);
        for status in [
            MembershipStatus::Owner,
            MembershipStatus::Administrator,
            MembershipStatus::Restricted,
        ] {
            let checker = ScriptedChecker::new().with_status("@news", status);
            assert!(check_subscription(&store, &checker, 1).await.unwrap().satisfied);
        }
    }

    #[tokio::test]
    async fn broadcast_tallies_failures_without_aborting() {
        let recipients = vec![user(1), user(2), user(3)];

        let summary = run_broadcast(&recipients, Duration::ZERO, |telegram_id| async move {
            if telegram_id == 2 {
                Err(BotError::UserError("blocked".to_string()))
            } else {
                Ok(())
            }
        })
        .await;

        assert_eq!(summary, BroadcastSummary { sent: 2, failed: 1 });
    }

    #[test]
    fn statistics_count_users_and_channels() {
        let store = MemoryLedgerStore::new();
        register_user(&store, 1, Some("alice"), None).unwrap();
        register_user(&store, 2, None, None).unwrap();
        store.block_user(2);
        seed_channel(&store, "@a", true);
        seed_channel(&store, "@b", false);

        let stats = usage_statistics(&store).unwrap();
        assert_eq!(stats.total_users, 2);
        assert_eq!(stats.unblocked_users, 1);
        assert_eq!(stats.total_channels, 2);
        assert_eq!(stats.active_channels, 1);
    }
}
