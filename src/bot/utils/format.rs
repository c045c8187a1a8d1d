use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

use crate::bot::{
    constants::{
        callbacks::{
            CALLBACK_ADMIN_ADD_CHANNEL, CALLBACK_ADMIN_BROADCAST, CALLBACK_ADMIN_LIST_CHANNELS,
            CALLBACK_ADMIN_STATISTICS, CALLBACK_BROADCAST_CANCEL, CALLBACK_BROADCAST_CONFIRM,
            CALLBACK_CHANNEL_TYPE_CHANNEL, CALLBACK_CHANNEL_TYPE_GROUP,
            CALLBACK_CHECK_SUBSCRIPTION, CALLBACK_DELETE_CHANNEL_PREFIX,
            CALLBACK_REPORT_MONTHLY, CALLBACK_REPORT_WEEKLY, CALLBACK_SET_LANGUAGE_PREFIX,
            CALLBACK_SKIP_NOTE, CALLBACK_TOGGLE_CHANNEL_PREFIX,
        },
        misc::{DECIMAL_PLACES, LANGUAGES},
    },
    dispatcher::EntryKind,
    ledger::RequiredChannel,
    processor::{BalanceSummary, BroadcastSummary, PeriodReport, UsageStatistics},
};

// Groups a whole number into blocks of three digits.
pub fn format_thousands(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(' ');
        }
        grouped.push(ch);
    }

    if value < 0 {
        format!("-{grouped}")
    } else {
        grouped
    }
}

// Converts an amount from base value to actual representation.
// Whole amounts drop the fractional part entirely.
pub fn display_amount(amount: i64, decimal_places: i32) -> String {
    if amount < 0 {
        return format!("-{}", display_amount(-amount, decimal_places));
    }
    if decimal_places == 0 {
        return format_thousands(amount);
    }

    let factor = 10_i64.pow(decimal_places as u32);
    let whole = amount / factor;
    let frac = amount % factor;
    if frac == 0 {
        format_thousands(whole)
    } else {
        format!(
            "{}.{:0width$}",
            format_thousands(whole),
            frac,
            width = decimal_places as usize
        )
    }
}

// Confirmation summary shown right after an entry is committed.
pub fn display_entry_summary(
    kind: EntryKind,
    amount: i64,
    label: &str,
    note: Option<&str>,
) -> String {
    let (header, label_line) = match kind {
        EntryKind::Expense => ("✅ Expense saved!", "📂 Category"),
        EntryKind::Income => ("✅ Income saved!", "📋 Source"),
    };

    let mut summary = format!(
        "{header}\n\n💵 Amount: {}\n{label_line}: {label}",
        display_amount(amount, DECIMAL_PLACES)
    );
    if let Some(note) = note {
        summary.push_str(&format!("\n📝 Note: {note}"));
    }
    summary
}

pub fn display_balance(summary: &BalanceSummary) -> String {
    format!(
        "💰 Balance\n\n📈 Total income: {}\n📉 Total expense: {}\n━━━━━━━━━━━━━━━━━\n💵 Net balance: {}",
        display_amount(summary.total_income, DECIMAL_PLACES),
        display_amount(summary.total_expense, DECIMAL_PLACES),
        display_amount(summary.balance, DECIMAL_PLACES),
    )
}

pub fn display_report(report: &PeriodReport) -> String {
    let categories = if report.by_category.is_empty() {
        "   No expenses in this period!".to_string()
    } else {
        report
            .by_category
            .iter()
            .map(|row| {
                let percent = if report.total_expense > 0 {
                    row.total as f64 / report.total_expense as f64 * 100.0
                } else {
                    0.0
                };
                format!(
                    "   • {}: {} ({percent:.1}%)",
                    row.category,
                    display_amount(row.total, DECIMAL_PLACES)
                )
            })
            .collect::<Vec<String>>()
            .join("\n")
    };

    format!(
        "📊 {} report\n\n📋 Expenses by category:\n{categories}\n\n━━━━━━━━━━━━━━━━━\n📈 Income: {}\n📉 Expense: {}\n💵 Net: {}",
        report.period.title(),
        display_amount(report.total_income, DECIMAL_PLACES),
        display_amount(report.total_expense, DECIMAL_PLACES),
        display_amount(report.total_income - report.total_expense, DECIMAL_PLACES),
    )
}

pub fn display_limit_warning(spent: i64, limit: i64) -> String {
    format!(
        "⚠️ Heads up! You've gone over your expense limit!\n\nSpent in the last 30 days: {}\nConfigured limit: {}\n\nPlease keep an eye on your spending!",
        display_amount(spent, DECIMAL_PLACES),
        display_amount(limit, DECIMAL_PLACES),
    )
}

pub fn display_channel_saved(channel: &RequiredChannel) -> String {
    format!(
        "✅ Channel saved!\n\n📢 Title: {}\n🆔 ID: {}\n🔗 Link: {}",
        channel.title, channel.channel_id, channel.url
    )
}

// One line per missing channel, title first so the list scans easily.
pub fn display_missing_channels(channels: &[RequiredChannel]) -> String {
    channels
        .iter()
        .map(|channel| format!("📢 {}\n{}", channel.title, channel.url))
        .collect::<Vec<String>>()
        .join("\n\n")
}

pub fn display_statistics(stats: &UsageStatistics) -> String {
    format!(
        "📊 Statistics\n\n👥 Total users: {}\n✅ Active users: {}\n📢 Total channels: {}\n🟢 Active channels: {}",
        stats.total_users, stats.unblocked_users, stats.total_channels, stats.active_channels
    )
}

pub fn display_broadcast_summary(summary: &BroadcastSummary) -> String {
    format!(
        "✅ Broadcast finished!\n\n📤 Sent: {}\n❌ Failed: {}",
        summary.sent, summary.failed
    )
}

// Make a keyboard, button menu.
pub fn make_keyboard(options: Vec<&str>, columns: Option<usize>) -> InlineKeyboardMarkup {
    let mut keyboard: Vec<Vec<InlineKeyboardButton>> = Vec::new();
    if let Some(col) = columns {
        for chunk in options.chunks(col) {
            let mut row: Vec<InlineKeyboardButton> = Vec::new();
            for option in chunk {
                row.push(InlineKeyboardButton::callback(
                    option.to_string(),
                    option.to_string(),
                ));
            }
            keyboard.push(row);
        }
    } else {
        for option in options {
            keyboard.push(vec![InlineKeyboardButton::callback(option, option)]);
        }
    }

    InlineKeyboardMarkup::new(keyboard)
}

pub fn make_skip_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![InlineKeyboardButton::callback(
        "➖ Skip",
        CALLBACK_SKIP_NOTE,
    )]])
}

pub fn make_admin_menu_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![
            InlineKeyboardButton::callback("➕ Add channel", CALLBACK_ADMIN_ADD_CHANNEL),
            InlineKeyboardButton::callback("📋 Channel list", CALLBACK_ADMIN_LIST_CHANNELS),
        ],
        vec![
            InlineKeyboardButton::callback("📨 Broadcast", CALLBACK_ADMIN_BROADCAST),
            InlineKeyboardButton::callback("📊 Statistics", CALLBACK_ADMIN_STATISTICS),
        ],
    ])
}

pub fn make_channel_type_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![
        InlineKeyboardButton::callback("📢 Channel", CALLBACK_CHANNEL_TYPE_CHANNEL),
        InlineKeyboardButton::callback("👥 Group", CALLBACK_CHANNEL_TYPE_GROUP),
    ]])
}

// One row per channel: toggle on the title, delete on the bin.
pub fn make_channels_keyboard(channels: &[RequiredChannel]) -> InlineKeyboardMarkup {
    let rows = channels
        .iter()
        .map(|channel| {
            let status = if channel.is_active { "✅" } else { "❌" };
            vec![
                InlineKeyboardButton::callback(
                    format!("{status} {}", channel.title),
                    format!("{CALLBACK_TOGGLE_CHANNEL_PREFIX}{}", channel.channel_id),
                ),
                InlineKeyboardButton::callback(
                    "🗑",
                    format!("{CALLBACK_DELETE_CHANNEL_PREFIX}{}", channel.channel_id),
                ),
            ]
        })
        .collect::<Vec<Vec<InlineKeyboardButton>>>();

    InlineKeyboardMarkup::new(rows)
}

pub fn make_broadcast_confirm_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![
        InlineKeyboardButton::callback("✅ Confirm", CALLBACK_BROADCAST_CONFIRM),
        InlineKeyboardButton::callback("❌ Cancel", CALLBACK_BROADCAST_CANCEL),
    ]])
}

pub fn make_report_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![
        InlineKeyboardButton::callback("📅 Weekly", CALLBACK_REPORT_WEEKLY),
        InlineKeyboardButton::callback("📆 Monthly", CALLBACK_REPORT_MONTHLY),
    ]])
}

pub fn make_language_keyboard() -> InlineKeyboardMarkup {
    let rows = LANGUAGES
        .chunks(2)
        .map(|chunk| {
            chunk
                .iter()
                .map(|(code, name)| {
                    InlineKeyboardButton::callback(
                        name.to_string(),
                        format!("{CALLBACK_SET_LANGUAGE_PREFIX}{code}"),
                    )
                })
                .collect::<Vec<InlineKeyboardButton>>()
        })
        .collect::<Vec<Vec<InlineKeyboardButton>>>();

    InlineKeyboardMarkup::new(rows)
}

pub fn make_subscription_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![InlineKeyboardButton::callback(
        "✅ I've joined",
        CALLBACK_CHECK_SUBSCRIPTION,
    )]])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bot::ledger::{CategoryTotal, ChannelKind};
    use crate::bot::processor::ReportPeriod;

    fn channel(id: &str, title: &str, active: bool) -> RequiredChannel {
        RequiredChannel {
            channel_id: id.to_string(),
            title: title.to_string(),
            url: format!("https://t.me/{}", id.trim_start_matches('@')),
            kind: ChannelKind::Channel,
            is_active: active,
            created_at: 0,
        }
    }

    #[test]
    fn thousands_grouping() {
        assert_eq!(format_thousands(0), "0");
        assert_eq!(format_thousands(999), "999");
        assert_eq!(format_thousands(1_500_000), "1 500 000");
        assert_eq!(format_thousands(-42_000), "-42 000");
    }

    #[test]
    fn amount_display_drops_zero_fractions() {
        assert_eq!(display_amount(150_000, 2), "1 500");
        assert_eq!(display_amount(9_950, 2), "99.50");
        assert_eq!(display_amount(0, 2), "0");
        assert_eq!(display_amount(-50, 2), "-0.50");
    }

    #[test]
    fn report_percentages_zero_when_no_expense() {
        let report = PeriodReport {
            period: ReportPeriod::Weekly,
            by_category: vec![CategoryTotal { category: "food".to_string(), total: 0 }],
            total_income: 0,
            total_expense: 0,
        };

        let rendered = display_report(&report);
        assert!(rendered.contains("(0.0%)"));
    }

    #[test]
    fn report_percentages_split_the_total() {
        let report = PeriodReport {
            period: ReportPeriod::Monthly,
            by_category: vec![
                CategoryTotal { category: "food".to_string(), total: 7_500 },
                CategoryTotal { category: "transport".to_string(), total: 2_500 },
            ],
            total_income: 0,
            total_expense: 10_000,
        };

        let rendered = display_report(&report);
        assert!(rendered.contains("food: 75 (75.0%)"));
        assert!(rendered.contains("transport: 25 (25.0%)"));
    }

    #[test]
    fn entry_summary_mentions_note_only_when_present() {
        let with_note =
            display_entry_summary(EntryKind::Expense, 150_000, "food", Some("groceries"));
        assert!(with_note.contains("📝 Note: groceries"));

        let without_note = display_entry_summary(EntryKind::Income, 150_000, "salary", None);
        assert!(!without_note.contains("Note"));
        assert!(without_note.contains("📋 Source: salary"));
    }

    #[test]
    fn channels_keyboard_has_toggle_and_delete_per_row() {
        let keyboard =
            make_channels_keyboard(&[channel("@a", "A", true), channel("@b", "B", false)]);
        assert_eq!(keyboard.inline_keyboard.len(), 2);
        assert_eq!(keyboard.inline_keyboard[0].len(), 2);
    }

    #[test]
    fn generic_keyboard_chunks_by_column() {
        let keyboard = make_keyboard(vec!["a", "b", "c"], Some(2));
        assert_eq!(keyboard.inline_keyboard.len(), 2);
        assert_eq!(keyboard.inline_keyboard[0].len(), 2);
        assert_eq!(keyboard.inline_keyboard[1].len(), 1);
    }
}
