/* In-memory ledger store.
 * Backs the test suite, and serves as the fallback backend when no
 * REDIS_URL is configured. Data lives only as long as the process.
 */

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{Duration, Utc};
use uuid::Uuid;

use crate::bot::constants::misc::DEFAULT_LANGUAGE;

use super::{
    sort_category_totals, CategoryTotal, Expense, Income, LedgerStore, NewChannel,
    RequiredChannel, StoreError, UserProfile,
};

#[derive(Default)]
struct Inner {
    users: HashMap<u64, UserProfile>,
    expenses: Vec<Expense>,
    incomes: Vec<Income>,
    channels: Vec<RequiredChannel>,
    requests: HashMap<u64, i64>,
}

#[derive(Default)]
pub struct MemoryLedgerStore {
    inner: Mutex<Inner>,
}

impl MemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn period_floor(days: i64) -> i64 {
        (Utc::now() - Duration::days(days)).timestamp()
    }
}

impl LedgerStore for MemoryLedgerStore {
    fn find_or_create_user(
        &self,
        telegram_id: u64,
        username: Option<&str>,
        first_name: Option<&str>,
    ) -> Result<UserProfile, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let user = inner.users.entry(telegram_id).or_insert_with(|| UserProfile {
            telegram_id,
            username: None,
            first_name: None,
            language: DEFAULT_LANGUAGE.to_string(),
            is_blocked: false,
            created_at: Utc::now().timestamp(),
        });

        if let Some(username) = username {
            user.username = Some(username.to_string());
        }
        if let Some(first_name) = first_name {
            user.first_name = Some(first_name.to_string());
        }

        Ok(user.clone())
    }

    fn set_user_language(&self, telegram_id: u64, language: &str) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(user) = inner.users.get_mut(&telegram_id) {
            user.language = language.to_string();
        }
        Ok(())
    }

    fn unblocked_users(&self) -> Result<Vec<UserProfile>, StoreError> {
        let inner = self.inner.lock().unwrap();
        let mut users: Vec<UserProfile> =
            inner.users.values().filter(|u| !u.is_blocked).cloned().collect();
        users.sort_by_key(|u| u.telegram_id);
        Ok(users)
    }

    fn user_count(&self) -> Result<u64, StoreError> {
        Ok(self.inner.lock().unwrap().users.len() as u64)
    }

    fn unblocked_user_count(&self) -> Result<u64, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.users.values().filter(|u| !u.is_blocked).count() as u64)
    }

    fn create_expense(
        &self,
        user_id: u64,
        amount: i64,
        category: &str,
        note: Option<&str>,
    ) -> Result<Expense, StoreError> {
        let expense = Expense {
            id: Uuid::new_v4().to_string(),
            user_id,
            amount,
            category: category.to_string(),
            note: note.map(str::to_string),
            created_at: Utc::now().timestamp(),
        };
        self.inner.lock().unwrap().expenses.push(expense.clone());
        Ok(expense)
    }

    fn create_income(
        &self,
        user_id: u64,
        amount: i64,
        source: &str,
        note: Option<&str>,
    ) -> Result<Income, StoreError> {
        let income = Income {
            id: Uuid::new_v4().to_string(),
            user_id,
            amount,
            source: source.to_string(),
            note: note.map(str::to_string),
            created_at: Utc::now().timestamp(),
        };
        self.inner.lock().unwrap().incomes.push(income.clone());
        Ok(income)
    }

    fn expense_sum_by_period(&self, user_id: u64, days: i64) -> Result<i64, StoreError> {
        let floor = Self::period_floor(days);
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .expenses
            .iter()
            .filter(|e| e.user_id == user_id && e.created_at >= floor)
            .map(|e| e.amount)
            .sum())
    }

    fn income_sum_by_period(&self, user_id: u64, days: i64) -> Result<i64, StoreError> {
        let floor = Self::period_floor(days);
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .incomes
            .iter()
            .filter(|i| i.user_id == user_id && i.created_at >= floor)
            .map(|i| i.amount)
            .sum())
    }

    fn expense_total(&self, user_id: u64) -> Result<i64, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .expenses
            .iter()
            .filter(|e| e.user_id == user_id)
            .map(|e| e.amount)
            .sum())
    }

    fn income_total(&self, user_id: u64) -> Result<i64, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .incomes
            .iter()
            .filter(|i| i.user_id == user_id)
            .map(|i| i.amount)
            .sum())
    }

    fn expense_sum_by_category(
        &self,
        user_id: u64,
        days: i64,
    ) -> Result<Vec<CategoryTotal>, StoreError> {
        let floor = Self::period_floor(days);
        let inner = self.inner.lock().unwrap();

        let mut by_category: HashMap<String, i64> = HashMap::new();
        for expense in inner
            .expenses
            .iter()
            .filter(|e| e.user_id == user_id && e.created_at >= floor)
        {
            *by_category.entry(expense.category.clone()).or_insert(0) += expense.amount;
        }

        let mut totals: Vec<CategoryTotal> = by_category
            .into_iter()
            .map(|(category, total)| CategoryTotal { category, total })
            .collect();
        sort_category_totals(&mut totals);
        Ok(totals)
    }

    fn upsert_channel(&self, channel: NewChannel) -> Result<RequiredChannel, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(existing) = inner
            .channels
            .iter_mut()
            .find(|c| c.channel_id == channel.channel_id)
        {
            existing.title = channel.title;
            existing.url = channel.url;
            existing.kind = channel.kind;
            existing.is_active = true;
            return Ok(existing.clone());
        }

        let stored = RequiredChannel {
            channel_id: channel.channel_id,
            title: channel.title,
            url: channel.url,
            kind: channel.kind,
            is_active: true,
            created_at: Utc::now().timestamp(),
        };
        inner.channels.push(stored.clone());
        Ok(stored)
    }

    fn toggle_channel(&self, channel_id: &str) -> Result<Option<RequiredChannel>, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(channel) = inner.channels.iter_mut().find(|c| c.channel_id == channel_id) {
            channel.is_active = !channel.is_active;
            return Ok(Some(channel.clone()));
        }
        Ok(None)
    }

    fn delete_channel(&self, channel_id: &str) -> Result<bool, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let before = inner.channels.len();
        inner.channels.retain(|c| c.channel_id != channel_id);
        Ok(inner.channels.len() < before)
    }

    fn list_channels(&self) -> Result<Vec<RequiredChannel>, StoreError> {
        Ok(self.inner.lock().unwrap().channels.clone())
    }

    fn active_channels(&self) -> Result<Vec<RequiredChannel>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.channels.iter().filter(|c| c.is_active).cloned().collect())
    }

    fn find_channel(&self, channel_id: &str) -> Result<Option<RequiredChannel>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.channels.iter().find(|c| c.channel_id == channel_id).cloned())
    }

    fn check_rate_limit(&self, telegram_id: u64, timestamp: i64) -> Result<bool, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        match inner.requests.get(&telegram_id) {
            Some(last) if *last >= timestamp => Ok(false),
            _ => {
                inner.requests.insert(telegram_id, timestamp);
                Ok(true)
            }
        }
    }
}

// Test-only hooks for asserting on raw rows and shaping fixtures
#[cfg(test)]
impl MemoryLedgerStore {
    pub fn expenses(&self) -> Vec<Expense> {
        self.inner.lock().unwrap().expenses.clone()
    }

    pub fn incomes(&self) -> Vec<Income> {
        self.inner.lock().unwrap().incomes.clone()
    }

    pub fn backdate_expense(&self, id: &str, created_at: i64) {
        let mut inner = self.inner.lock().unwrap();
        if let Some(expense) = inner.expenses.iter_mut().find(|e| e.id == id) {
            expense.created_at = created_at;
        }
    }

    pub fn block_user(&self, telegram_id: u64) {
        let mut inner = self.inner.lock().unwrap();
        if let Some(user) = inner.users.get_mut(&telegram_id) {
            user.is_blocked = true;
        }
    }

    pub fn seed_channel(&self, channel: RequiredChannel) {
        self.inner.lock().unwrap().channels.push(channel);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bot::ledger::ChannelKind;

    fn new_channel(id: &str, title: &str) -> NewChannel {
        NewChannel {
            channel_id: id.to_string(),
            title: title.to_string(),
            url: format!("https://t.me/{}", id.trim_start_matches('@')),
            kind: ChannelKind::Channel,
        }
    }

    #[test]
    fn find_or_create_registers_once_and_refreshes_names() {
        let store = MemoryLedgerStore::new();

        let created = store.find_or_create_user(42, Some("alice"), Some("Alice")).unwrap();
        assert_eq!(created.username.as_deref(), Some("alice"));

        let updated = store.find_or_create_user(42, Some("alice_b"), None).unwrap();
        assert_eq!(updated.username.as_deref(), Some("alice_b"));
        assert_eq!(updated.first_name.as_deref(), Some("Alice"));
        assert_eq!(store.user_count().unwrap(), 1);
    }

    #[test]
    fn balance_inputs_are_zero_for_unknown_user() {
        let store = MemoryLedgerStore::new();
        assert_eq!(store.expense_total(7).unwrap(), 0);
        assert_eq!(store.income_total(7).unwrap(), 0);
    }

    #[test]
    fn period_sum_ignores_rows_outside_the_window() {
        let store = MemoryLedgerStore::new();
        let recent = store.create_expense(1, 500, "food", None).unwrap();
        let old = store.create_expense(1, 900, "food", None).unwrap();
        store.backdate_expense(&old.id, (Utc::now() - Duration::days(10)).timestamp());

        assert_eq!(store.expense_sum_by_period(1, 7).unwrap(), recent.amount);
        assert_eq!(store.expense_sum_by_period(1, 30).unwrap(), 1400);
    }

    #[test]
    fn period_sum_with_zero_days_is_zero() {
        let store = MemoryLedgerStore::new();
        let expense = store.create_expense(1, 500, "food", None).unwrap();
        // Nudge the row behind "now" so the empty window excludes it
        store.backdate_expense(&expense.id, Utc::now().timestamp() - 5);

        assert_eq!(store.expense_sum_by_period(1, 0).unwrap(), 0);
    }

    #[test]
    fn category_breakdown_groups_and_orders() {
        let store = MemoryLedgerStore::new();
        store.create_expense(1, 200, "food", None).unwrap();
        store.create_expense(1, 300, "food", None).unwrap();
        store.create_expense(1, 100, "transport", None).unwrap();
        store.create_expense(2, 999, "food", None).unwrap();

        let totals = store.expense_sum_by_category(1, 7).unwrap();
        assert_eq!(
            totals,
            vec![
                CategoryTotal { category: "food".to_string(), total: 500 },
                CategoryTotal { category: "transport".to_string(), total: 100 },
            ]
        );
    }

    #[test]
    fn upsert_is_idempotent_on_channel_id() {
        let store = MemoryLedgerStore::new();
        store.upsert_channel(new_channel("@mychannel", "My Channel")).unwrap();
        store.toggle_channel("@mychannel").unwrap();

        let updated = store.upsert_channel(new_channel("@mychannel", "Updated")).unwrap();

        assert_eq!(store.list_channels().unwrap().len(), 1);
        assert_eq!(updated.title, "Updated");
        assert!(updated.is_active, "upsert must reactivate the channel");
    }

    #[test]
    fn toggle_and_delete_handle_missing_channels() {
        let store = MemoryLedgerStore::new();
        assert!(store.toggle_channel("@nope").unwrap().is_none());
        assert!(!store.delete_channel("@nope").unwrap());

        store.upsert_channel(new_channel("@here", "Here")).unwrap();
        let toggled = store.toggle_channel("@here").unwrap().unwrap();
        assert!(!toggled.is_active);
        assert!(store.active_channels().unwrap().is_empty());

        assert!(store.delete_channel("@here").unwrap());
        assert!(store.list_channels().unwrap().is_empty());
    }

    #[test]
    fn rate_limit_rejects_same_second() {
        let store = MemoryLedgerStore::new();
        assert!(store.check_rate_limit(1, 1000).unwrap());
        assert!(!store.check_rate_limit(1, 1000).unwrap());
        assert!(store.check_rate_limit(1, 1001).unwrap());
        // Other users are throttled independently
        assert!(store.check_rate_limit(2, 1000).unwrap());
    }
}
