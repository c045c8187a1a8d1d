// Error messages
pub const UNKNOWN_ERROR_MESSAGE: &str =
    "Oops! Something went wrong! I can't do that right now. Please try again later!\n\n";
pub const NO_TEXT_MESSAGE: &str =
    "❓ I'm having a bit of trouble understanding that! Please reply to me in text!\n\n";
pub const NO_ADMIN_MESSAGE: &str = "⛔ Sorry, this section is for admins only!";

// Instruction messages
pub const AMOUNT_INSTRUCTIONS_MESSAGE: &str =
    "💵 Enter the amount. For example: 1500, 99.50, etc.";
pub const EXPENSE_CATEGORY_INSTRUCTIONS_MESSAGE: &str =
    "📂 Pick a category below, or type your own!";
pub const INCOME_SOURCE_INSTRUCTIONS_MESSAGE: &str =
    "📋 Pick a source below, or type your own!";
pub const NOTE_INSTRUCTIONS_MESSAGE: &str =
    "📝 Add a note for this entry, or skip it!";
pub const CHANNEL_TYPE_INSTRUCTIONS_MESSAGE: &str =
    "➕ Adding a new required channel!\n\nWhat kind is it?";
pub const CHANNEL_ID_INSTRUCTIONS_MESSAGE: &str =
    "🆔 Enter the channel ID or username. For example: @mychannel or -100123456789";
pub const CHANNEL_TITLE_INSTRUCTIONS_MESSAGE: &str =
    "📝 Enter the title to show to users!";
pub const CHANNEL_URL_INSTRUCTIONS_MESSAGE: &str =
    "🔗 Enter the join link. For example: https://t.me/mychannel";
pub const BROADCAST_INSTRUCTIONS_MESSAGE: &str =
    "📝 Write the message you want to send to everyone!";

// Validation messages
pub const EMPTY_FIELD_MESSAGE: &str =
    "Uh-oh! ❌ I need some text here! Please try again!";

// Action messages
pub const CANCEL_ENTRY_MESSAGE: &str =
    "Okay! I've cancelled this entry. No changes have been made! 🌟";
pub const CANCEL_CHANNEL_MESSAGE: &str =
    "Okay! I've cancelled adding the channel. No changes have been made! 🌟";
pub const CANCEL_BROADCAST_MESSAGE: &str =
    "Okay! I've cancelled the broadcast. Nothing has been sent! 🌟";
pub const BLANK_CANCEL_MESSAGE: &str = "There's nothing to cancel right now! 🌟";
pub const BROADCAST_ABORTED_MESSAGE: &str =
    "Okay! I've dropped that broadcast. Nothing has been sent! 🌟";
pub const BROADCAST_SENDING_MESSAGE: &str = "⏳ Sending your message to everyone...";
pub const LANGUAGE_PROMPT_MESSAGE: &str = "🌐 Pick your preferred language!";
pub const LANGUAGE_SAVED_MESSAGE: &str = "✅ Language preference saved!";

pub const REPORT_PROMPT_MESSAGE: &str = "📊 Which period would you like a report for?";

// Subscription gate messages
pub const SUBSCRIPTION_REQUIRED_MESSAGE: &str =
    "⚠️ To use me, please join the channels below first!\n\nOnce you've joined, tap the button to check again!";
pub const SUBSCRIPTION_OK_MESSAGE: &str =
    "✅ You're all set! Thanks for joining! Send me a command to continue!";
pub const SUBSCRIPTION_STILL_MISSING_MESSAGE: &str =
    "Hmm, you're still missing some channels!";

// Admin messages
pub const ADMIN_PANEL_MESSAGE: &str =
    "🔐 Admin panel\n\nWelcome back! Pick a section below!";
pub const CHANNEL_LIST_HEADER_MESSAGE: &str =
    "📋 Required channels\n\n✅ active, ❌ inactive\n\nTap a channel to toggle it, or 🗑 to remove it!";
pub const CHANNEL_LIST_EMPTY_MESSAGE: &str =
    "📋 Required channels\n\nNo channels added yet!";
pub const CHANNEL_NOT_FOUND_MESSAGE: &str = "Channel not found!";
