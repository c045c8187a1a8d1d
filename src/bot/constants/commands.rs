// Command literals, for referencing inside user-facing messages
pub const COMMAND_START: &str = "/start";
pub const COMMAND_HELP: &str = "/help";
pub const COMMAND_ADD_EXPENSE: &str = "/add_expense";
pub const COMMAND_ADD_INCOME: &str = "/add_income";
pub const COMMAND_BALANCE: &str = "/balance";
pub const COMMAND_REPORT: &str = "/report";
pub const COMMAND_LANGUAGE: &str = "/language";
pub const COMMAND_CANCEL: &str = "/cancel";
pub const COMMAND_ADMIN: &str = "/admin";
