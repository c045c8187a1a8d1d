/* Redis-backed ledger store.
 * Entities are stored as JSON strings under prefixed keys; ledger entries
 * live in per-user sorted sets scored by creation timestamp, so period
 * sums reduce to ZRANGEBYSCORE over the trailing window.
 */

use chrono::{Duration, Utc};
use redis::{Client, Commands, Connection};
use uuid::Uuid;

use crate::bot::constants::misc::DEFAULT_LANGUAGE;
use crate::bot::constants::redis::{
    CHANNELS_KEY, CHANNEL_KEY, EXPENSE_KEY, INCOME_KEY, REQUEST_KEY, USERS_KEY, USER_KEY,
};

use super::{
    sort_category_totals, CategoryTotal, Expense, Income, LedgerStore, NewChannel,
    RequiredChannel, StoreError, UserProfile,
};

pub struct RedisLedgerStore {
    client: Client,
}

impl RedisLedgerStore {
    pub fn connect(url: &str) -> Result<Self, StoreError> {
        let client = Client::open(url)?;
        Ok(Self { client })
    }

    fn connection(&self) -> Result<Connection, StoreError> {
        Ok(self.client.get_connection()?)
    }

    fn user_key(telegram_id: u64) -> String {
        format!("{USER_KEY}:{telegram_id}")
    }

    fn expense_key(user_id: u64) -> String {
        format!("{EXPENSE_KEY}:{user_id}")
    }

    fn income_key(user_id: u64) -> String {
        format!("{INCOME_KEY}:{user_id}")
    }

    fn channel_key(channel_id: &str) -> String {
        format!("{CHANNEL_KEY}:{channel_id}")
    }

    fn request_key(telegram_id: u64) -> String {
        format!("{REQUEST_KEY}:{telegram_id}")
    }

    fn period_floor(days: i64) -> i64 {
        (Utc::now() - Duration::days(days)).timestamp()
    }

    fn load_user(con: &mut Connection, telegram_id: u64) -> Result<Option<UserProfile>, StoreError> {
        let raw: Option<String> = con.get(Self::user_key(telegram_id))?;
        match raw {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    fn save_user(con: &mut Connection, user: &UserProfile) -> Result<(), StoreError> {
        let raw = serde_json::to_string(user)?;
        let _: () = con.set(Self::user_key(user.telegram_id), raw)?;
        Ok(())
    }

    fn load_channel(
        con: &mut Connection,
        channel_id: &str,
    ) -> Result<Option<RequiredChannel>, StoreError> {
        let raw: Option<String> = con.get(Self::channel_key(channel_id))?;
        match raw {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    fn save_channel(con: &mut Connection, channel: &RequiredChannel) -> Result<(), StoreError> {
        let raw = serde_json::to_string(channel)?;
        let _: () = con.set(Self::channel_key(&channel.channel_id), raw)?;
        let _: i64 = con.sadd(CHANNELS_KEY, &channel.channel_id)?;
        Ok(())
    }

    fn sum_entries(con: &mut Connection, key: &str, floor: Option<i64>) -> Result<i64, StoreError> {
        let rows: Vec<String> = match floor {
            Some(floor) => con.zrangebyscore(key, floor, "+inf")?,
            None => con.zrange(key, 0, -1)?,
        };

        let mut total = 0;
        for raw in rows {
            let amount: i64 = serde_json::from_str::<serde_json::Value>(&raw)?
                .get("amount")
                .and_then(|v| v.as_i64())
                .unwrap_or(0);
            total += amount;
        }
        Ok(total)
    }

    fn channels(&self, only_active: bool) -> Result<Vec<RequiredChannel>, StoreError> {
        let mut con = self.connection()?;
        let ids: Vec<String> = con.smembers(CHANNELS_KEY)?;

        let mut channels = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(channel) = Self::load_channel(&mut con, &id)? {
                if !only_active || channel.is_active {
                    channels.push(channel);
                }
            }
        }
        channels.sort_by(|a, b| {
            a.created_at.cmp(&b.created_at).then_with(|| a.channel_id.cmp(&b.channel_id))
        });
        Ok(channels)
    }
}

impl LedgerStore for RedisLedgerStore {
    fn find_or_create_user(
        &self,
        telegram_id: u64,
        username: Option<&str>,
        first_name: Option<&str>,
    ) -> Result<UserProfile, StoreError> {
        let mut con = self.connection()?;
        let mut user = match Self::load_user(&mut con, telegram_id)? {
            Some(user) => user,
            None => UserProfile {
                telegram_id,
                username: None,
                first_name: None,
                language: DEFAULT_LANGUAGE.to_string(),
                is_blocked: false,
                created_at: Utc::now().timestamp(),
            },
        };

        if let Some(username) = username {
            user.username = Some(username.to_string());
        }
        if let Some(first_name) = first_name {
            user.first_name = Some(first_name.to_string());
        }

        Self::save_user(&mut con, &user)?;
        let _: i64 = con.sadd(USERS_KEY, telegram_id)?;
        Ok(user)
    }

    fn set_user_language(&self, telegram_id: u64, language: &str) -> Result<(), StoreError> {
        let mut con = self.connection()?;
        if let Some(mut user) = Self::load_user(&mut con, telegram_id)? {
            user.language = language.to_string();
            Self::save_user(&mut con, &user)?;
        }
        Ok(())
    }

    fn unblocked_users(&self) -> Result<Vec<UserProfile>, StoreError> {
        let mut con = self.connection()?;
        let ids: Vec<u64> = con.smembers(USERS_KEY)?;

        let mut users = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(user) = Self::load_user(&mut con, id)? {
                if !user.is_blocked {
                    users.push(user);
                }
            }
        }
        users.sort_by_key(|u| u.telegram_id);
        Ok(users)
    }

    fn user_count(&self) -> Result<u64, StoreError> {
        let mut con = self.connection()?;
        let count: u64 = con.scard(USERS_KEY)?;
        Ok(count)
    }

    fn unblocked_user_count(&self) -> Result<u64, StoreError> {
        Ok(self.unblocked_users()?.len() as u64)
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

        let mut con = self.connection()?;
        let raw = serde_json::to_string(&expense)?;
        let _: i64 = con.zadd(Self::expense_key(user_id), raw, expense.created_at)?;
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

        let mut con = self.connection()?;
        let raw = serde_json::to_string(&income)?;
        let _: i64 = con.zadd(Self::income_key(user_id), raw, income.created_at)?;
        Ok(income)
    }

    fn expense_sum_by_period(&self, user_id: u64, days: i64) -> Result<i64, StoreError> {
        let mut con = self.connection()?;
        Self::sum_entries(&mut con, &Self::expense_key(user_id), Some(Self::period_floor(days)))
    }

    fn income_sum_by_period(&self, user_id: u64, days: i64) -> Result<i64, StoreError> {
        let mut con = self.connection()?;
        Self::sum_entries(&mut con, &Self::income_key(user_id), Some(Self::period_floor(days)))
    }

    fn expense_total(&self, user_id: u64) -> Result<i64, StoreError> {
        let mut con = self.connection()?;
        Self::sum_entries(&mut con, &Self::expense_key(user_id), None)
    }

    fn income_total(&self, user_id: u64) -> Result<i64, StoreError> {
        let mut con = self.connection()?;
        Self::sum_entries(&mut con, &Self::income_key(user_id), None)
    }

    fn expense_sum_by_category(
        &self,
        user_id: u64,
        days: i64,
    ) -> Result<Vec<CategoryTotal>, StoreError> {
        let mut con = self.connection()?;
        let floor = Self::period_floor(days);
        let rows: Vec<String> =
            con.zrangebyscore(Self::expense_key(user_id), floor, "+inf")?;

        let mut by_category = std::collections::HashMap::new();
        for raw in rows {
            let expense: Expense = serde_json::from_str(&raw)?;
            *by_category.entry(expense.category).or_insert(0) += expense.amount;
        }

        let mut totals: Vec<CategoryTotal> = by_category
            .into_iter()
            .map(|(category, total)| CategoryTotal { category, total })
            .collect();
        sort_category_totals(&mut totals);
        Ok(totals)
    }

    fn upsert_channel(&self, channel: NewChannel) -> Result<RequiredChannel, StoreError> {
        let mut con = self.connection()?;
        let stored = match Self::load_channel(&mut con, &channel.channel_id)? {
            Some(mut existing) => {
                existing.title = channel.title;
                existing.url = channel.url;
                existing.kind = channel.kind;
                existing.is_active = true;
                existing
            }
            None => RequiredChannel {
                channel_id: channel.channel_id,
                title: channel.title,
                url: channel.url,
                kind: channel.kind,
                is_active: true,
                created_at: Utc::now().timestamp(),
            },
        };

        Self::save_channel(&mut con, &stored)?;
        Ok(stored)
    }

    fn toggle_channel(&self, channel_id: &str) -> Result<Option<RequiredChannel>, StoreError> {
        let mut con = self.connection()?;
        match Self::load_channel(&mut con, channel_id)? {
            Some(mut channel) => {
                channel.is_active = !channel.is_active;
                Self::save_channel(&mut con, &channel)?;
                Ok(Some(channel))
            }
            None => Ok(None),
        }
    }

    fn delete_channel(&self, channel_id: &str) -> Result<bool, StoreError> {
        let mut con = self.connection()?;
        let removed: i64 = con.srem(CHANNELS_KEY, channel_id)?;
        let _: () = con.del(Self::channel_key(channel_id))?;
        Ok(removed > 0)
    }

    fn list_channels(&self) -> Result<Vec<RequiredChannel>, StoreError> {
        self.channels(false)
    }

    fn active_channels(&self) -> Result<Vec<RequiredChannel>, StoreError> {
        self.channels(true)
    }

    fn find_channel(&self, channel_id: &str) -> Result<Option<RequiredChannel>, StoreError> {
        let mut con = self.connection()?;
        Self::load_channel(&mut con, channel_id)
    }

    fn check_rate_limit(&self, telegram_id: u64, timestamp: i64) -> Result<bool, StoreError> {
        let mut con = self.connection()?;
        let key = Self::request_key(telegram_id);
        let last: Option<i64> = con.get(&key)?;
        match last {
            Some(last) if last >= timestamp => Ok(false),
            _ => {
                let _: () = con.set(&key, timestamp)?;
                Ok(true)
            }
        }
    }
}
