/* Persisted entities and the store seam.
 * Handlers never touch a backend directly; they go through processor
 * functions holding an Arc<dyn LedgerStore>, so backends can be swapped
 * without touching engine logic.
 */

use serde::{Deserialize, Serialize};

pub use self::memory::MemoryLedgerStore;
pub use self::redis::RedisLedgerStore;

mod memory;
mod redis;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub telegram_id: u64,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub language: String,
    pub is_blocked: bool,
    pub created_at: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    pub id: String,
    pub user_id: u64,
    pub amount: i64,
    pub category: String,
    pub note: Option<String>,
    pub created_at: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Income {
    pub id: String,
    pub user_id: u64,
    pub amount: i64,
    pub source: String,
    pub note: Option<String>,
    pub created_at: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChannelKind {
    Channel,
    Group,
}

impl ChannelKind {
    pub fn label(&self) -> &'static str {
        match self {
            ChannelKind::Channel => "channel",
            ChannelKind::Group => "group",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequiredChannel {
    pub channel_id: String,
    pub title: String,
    pub url: String,
    pub kind: ChannelKind,
    pub is_active: bool,
    pub created_at: i64,
}

// Fields captured by the admin flow before the upsert
#[derive(Debug, Clone, PartialEq)]
pub struct NewChannel {
    pub channel_id: String,
    pub title: String,
    pub url: String,
    pub kind: ChannelKind,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryTotal {
    pub category: String,
    pub total: i64,
}

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("Redis error: {0}")]
    Redis(#[from] ::redis::RedisError),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub trait LedgerStore: Send + Sync {
    // Users
    fn find_or_create_user(
        &self,
        telegram_id: u64,
        username: Option<&str>,
        first_name: Option<&str>,
    ) -> Result<UserProfile, StoreError>;
    fn set_user_language(&self, telegram_id: u64, language: &str) -> Result<(), StoreError>;
    fn unblocked_users(&self) -> Result<Vec<UserProfile>, StoreError>;
    fn user_count(&self) -> Result<u64, StoreError>;
    fn unblocked_user_count(&self) -> Result<u64, StoreError>;

    // Ledger entries
    fn create_expense(
        &self,
        user_id: u64,
        amount: i64,
        category: &str,
        note: Option<&str>,
    ) -> Result<Expense, StoreError>;
    fn create_income(
        &self,
        user_id: u64,
        amount: i64,
        source: &str,
        note: Option<&str>,
    ) -> Result<Income, StoreError>;

    // Aggregation reads; days bound the trailing window, created_at >= now - days
    fn expense_sum_by_period(&self, user_id: u64, days: i64) -> Result<i64, StoreError>;
    fn income_sum_by_period(&self, user_id: u64, days: i64) -> Result<i64, StoreError>;
    fn expense_total(&self, user_id: u64) -> Result<i64, StoreError>;
    fn income_total(&self, user_id: u64) -> Result<i64, StoreError>;
    fn expense_sum_by_category(
        &self,
        user_id: u64,
        days: i64,
    ) -> Result<Vec<CategoryTotal>, StoreError>;

    // Required channels
    fn upsert_channel(&self, channel: NewChannel) -> Result<RequiredChannel, StoreError>;
    fn toggle_channel(&self, channel_id: &str) -> Result<Option<RequiredChannel>, StoreError>;
    fn delete_channel(&self, channel_id: &str) -> Result<bool, StoreError>;
    fn list_channels(&self) -> Result<Vec<RequiredChannel>, StoreError>;
    fn active_channels(&self) -> Result<Vec<RequiredChannel>, StoreError>;
    fn find_channel(&self, channel_id: &str) -> Result<Option<RequiredChannel>, StoreError>;

    // Request throttle; true when the request may proceed
    fn check_rate_limit(&self, telegram_id: u64, timestamp: i64) -> Result<bool, StoreError>;
}

// Descending by sum; equal sums fall back to the category label so the
// ordering stays stable across backends.
pub(crate) fn sort_category_totals(totals: &mut Vec<CategoryTotal>) {
    totals.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.category.cmp(&b.category)));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_totals_sort_descending_with_label_tiebreak() {
        let mut totals = vec![
            CategoryTotal { category: "transport".to_string(), total: 300 },
            CategoryTotal { category: "food".to_string(), total: 500 },
            CategoryTotal { category: "cinema".to_string(), total: 300 },
        ];

        sort_category_totals(&mut totals);

        let order: Vec<&str> = totals.iter().map(|t| t.category.as_str()).collect();
        assert_eq!(order, vec!["food", "cinema", "transport"]);
    }
}
