// Largest amount accepted for a single entry, in minor units
pub const MAX_VALUE: i64 = 10_000_000_000_000;

// Minor units per whole unit, as a power of ten
pub const DECIMAL_PLACES: i32 = 2;

// Fallback label when a category or source is left blank
pub const DEFAULT_LABEL: &str = "other";

// Word accepted in place of a note
pub const SKIP_WORD: &str = "skip";

pub const EXPENSE_CATEGORIES: [&str; 4] = ["Food", "Transport", "Entertainment", "Other"];
pub const INCOME_SOURCES: [&str; 4] = ["Salary", "Side Job", "Gift", "Other"];

// Report windows, in days
pub const PERIOD_WEEKLY: i64 = 7;
pub const PERIOD_MONTHLY: i64 = 30;

// Rolling window for the expense limit warning, in days
pub const LIMIT_PERIOD: i64 = 30;

// Fallback monthly expense limit, in minor units
pub const DEFAULT_EXPENSE_LIMIT: i64 = 100_000_000;

// Delay between broadcast deliveries, to stay under the send rate limit
pub const BROADCAST_PACE_MS: u64 = 50;

pub const LANGUAGES: [(&str, &str); 3] = [
    ("en", "🇬🇧 English"),
    ("ru", "🇷🇺 Русский"),
    ("uz", "🇺🇿 O'zbek"),
];
pub const DEFAULT_LANGUAGE: &str = "en";
