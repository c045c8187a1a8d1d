use std::collections::HashSet;
use std::env;

use crate::bot::constants::misc::{DECIMAL_PLACES, DEFAULT_EXPENSE_LIMIT};

/* Runtime configuration, read once at startup and injected into the
 * dispatcher as a dependency.
 */
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub admin_ids: HashSet<u64>,
    // Rolling 30-day expense ceiling, in minor units
    pub expense_limit: i64,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let admin_ids = env::var("ADMIN_IDS")
            .unwrap_or_default()
            .split(',')
            .filter_map(|id| id.trim().parse::<u64>().ok())
            .collect::<HashSet<u64>>();

        if admin_ids.is_empty() {
            log::warn!("No ADMIN_IDS configured, admin panel is unreachable");
        }

        let expense_limit = env::var("EXPENSE_LIMIT")
            .ok()
            .and_then(|limit| limit.trim().parse::<i64>().ok())
            .map(|whole| whole.saturating_mul(10_i64.pow(DECIMAL_PLACES as u32)))
            .unwrap_or(DEFAULT_EXPENSE_LIMIT);

        Self { admin_ids, expense_limit }
    }

    pub fn is_admin(&self, telegram_id: u64) -> bool {
        self.admin_ids.contains(&telegram_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_lookup_matches_configured_ids() {
        let config = AppConfig {
            admin_ids: [10, 20].into_iter().collect(),
            expense_limit: 1_000,
        };
        assert!(config.is_admin(10));
        assert!(!config.is_admin(30));
    }
}
