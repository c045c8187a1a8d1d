// Request
pub const REQUEST_KEY: &str = "request";

// User
pub const USER_KEY: &str = "user";
pub const USERS_KEY: &str = "users";

// Ledger
pub const EXPENSE_KEY: &str = "expense";
pub const INCOME_KEY: &str = "income";

// Required channels
pub const CHANNEL_KEY: &str = "channel";
pub const CHANNELS_KEY: &str = "channels";
