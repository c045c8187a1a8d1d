// Admin panel menu
pub const CALLBACK_ADMIN_ADD_CHANNEL: &str = "admin_add_channel";
pub const CALLBACK_ADMIN_LIST_CHANNELS: &str = "admin_list_channels";
pub const CALLBACK_ADMIN_BROADCAST: &str = "admin_broadcast";
pub const CALLBACK_ADMIN_STATISTICS: &str = "admin_statistics";

// Channel list rows, suffixed with the external channel ID
pub const CALLBACK_TOGGLE_CHANNEL_PREFIX: &str = "toggle_channel:";
pub const CALLBACK_DELETE_CHANNEL_PREFIX: &str = "delete_channel:";

// Channel type selection
pub const CALLBACK_CHANNEL_TYPE_CHANNEL: &str = "channel_type:channel";
pub const CALLBACK_CHANNEL_TYPE_GROUP: &str = "channel_type:group";

// Broadcast confirmation
pub const CALLBACK_BROADCAST_CONFIRM: &str = "broadcast_confirm";
pub const CALLBACK_BROADCAST_CANCEL: &str = "broadcast_cancel";

// Reports
pub const CALLBACK_REPORT_WEEKLY: &str = "report_weekly";
pub const CALLBACK_REPORT_MONTHLY: &str = "report_monthly";

// Subscription gate
pub const CALLBACK_CHECK_SUBSCRIPTION: &str = "check_subscription";

// Language selection, suffixed with the language code
pub const CALLBACK_SET_LANGUAGE_PREFIX: &str = "set_lang:";

// Guided entry
pub const CALLBACK_SKIP_NOTE: &str = "skip_note";
