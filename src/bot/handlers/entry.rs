/* Guided entry conversation.
 * One machine for both ledger variants: amount, then category or source,
 * then an optional note, then a single commit. Invalid input re-prompts
 * in place; /cancel drops the flow from any step.
 */

use std::sync::Arc;

use teloxide::prelude::*;

use crate::bot::{
    config::AppConfig,
    constants::{
        callbacks::CALLBACK_SKIP_NOTE,
        messages::{
            AMOUNT_INSTRUCTIONS_MESSAGE, EXPENSE_CATEGORY_INSTRUCTIONS_MESSAGE,
            INCOME_SOURCE_INSTRUCTIONS_MESSAGE, NOTE_INSTRUCTIONS_MESSAGE, NO_TEXT_MESSAGE,
            UNKNOWN_ERROR_MESSAGE,
        },
        misc::{DECIMAL_PLACES, DEFAULT_LABEL, EXPENSE_CATEGORIES, INCOME_SOURCES, SKIP_WORD},
    },
    dispatcher::EntryKind,
    ledger::LedgerStore,
    processor,
    utils::{
        amounts::parse_amount,
        bot_actions::{assert_handle_request_limit, callback_chat_id, send_bot_message},
        format::{display_entry_summary, display_limit_warning, make_keyboard, make_skip_keyboard},
        BotError, HandlerResult, UserDialogue,
    },
    State,
};

// Amount step. A valid positive amount advances, anything else stays put.
fn apply_amount(kind: EntryKind, text: &str) -> Result<State, BotError> {
    let amount = parse_amount(text, DECIMAL_PLACES)?;
    Ok(State::AwaitingCategory { kind, amount })
}

// Category/source step. Blank input falls back to the default label.
fn apply_label(text: &str) -> String {
    let label = text.trim();
    if label.is_empty() {
        DEFAULT_LABEL.to_string()
    } else {
        label.to_lowercase()
    }
}

// Note step. The skip word, in any casing, stands for no note.
fn parse_note(text: &str) -> Option<String> {
    let note = text.trim();
    if note.is_empty() || note.eq_ignore_ascii_case(SKIP_WORD) {
        None
    } else {
        Some(note.to_string())
    }
}

fn label_prompt(kind: EntryKind) -> (&'static str, Vec<&'static str>) {
    match kind {
        EntryKind::Expense => (
            EXPENSE_CATEGORY_INSTRUCTIONS_MESSAGE,
            EXPENSE_CATEGORIES.to_vec(),
        ),
        EntryKind::Income => (INCOME_SOURCE_INSTRUCTIONS_MESSAGE, INCOME_SOURCES.to_vec()),
    }
}

/* Add expense command.
 * Starts (or restarts) the guided entry from the amount step.
 */
pub async fn action_add_expense(
    bot: Bot,
    dialogue: UserDialogue,
    store: Arc<dyn LedgerStore>,
    msg: Message,
) -> HandlerResult {
    start_entry(EntryKind::Expense, bot, dialogue, store, msg).await
}

/* Add income command. */
pub async fn action_add_income(
    bot: Bot,
    dialogue: UserDialogue,
    store: Arc<dyn LedgerStore>,
    msg: Message,
) -> HandlerResult {
    start_entry(EntryKind::Income, bot, dialogue, store, msg).await
}

async fn start_entry(
    kind: EntryKind,
    bot: Bot,
    dialogue: UserDialogue,
    store: Arc<dyn LedgerStore>,
    msg: Message,
) -> HandlerResult {
    if !assert_handle_request_limit(store.as_ref(), &msg) {
        return Ok(());
    }

    // Restarting mid-flow discards whatever was collected so far
    dialogue.update(State::AwaitingAmount { kind }).await?;
    send_bot_message(&bot, &msg, AMOUNT_INSTRUCTIONS_MESSAGE.to_string()).await?;
    Ok(())
}

pub async fn receive_amount(
    bot: Bot,
    dialogue: UserDialogue,
    kind: EntryKind,
    msg: Message,
) -> HandlerResult {
    let text = match msg.text() {
        Some(text) => text,
        None => {
            send_bot_message(&bot, &msg, NO_TEXT_MESSAGE.to_string()).await?;
            return Ok(());
        }
    };

    match apply_amount(kind, text.trim()) {
        Ok(state) => {
            dialogue.update(state).await?;
            let (prompt, suggestions) = label_prompt(kind);
            send_bot_message(&bot, &msg, prompt.to_string())
                .reply_markup(make_keyboard(suggestions, Some(2)))
                .await?;
        }
        Err(err) => {
            // Same state, surfaced to the user as a re-prompt
            send_bot_message(&bot, &msg, err.to_string()).await?;
        }
    }
    Ok(())
}

pub async fn receive_category(
    bot: Bot,
    dialogue: UserDialogue,
    (kind, amount): (EntryKind, i64),
    msg: Message,
) -> HandlerResult {
    let text = match msg.text() {
        Some(text) => text,
        None => {
            send_bot_message(&bot, &msg, NO_TEXT_MESSAGE.to_string()).await?;
            return Ok(());
        }
    };

    let label = apply_label(text);
    dialogue
        .update(State::AwaitingNote { kind, amount, label })
        .await?;
    send_bot_message(&bot, &msg, NOTE_INSTRUCTIONS_MESSAGE.to_string())
        .reply_markup(make_skip_keyboard())
        .await?;
    Ok(())
}

pub async fn handle_category_selection(
    bot: Bot,
    dialogue: UserDialogue,
    (kind, amount): (EntryKind, i64),
    q: CallbackQuery,
) -> HandlerResult {
    let label = match q.data.as_deref() {
        Some(data) => apply_label(data),
        None => return Ok(()),
    };

    bot.answer_callback_query(q.id.clone()).await?;
    dialogue
        .update(State::AwaitingNote { kind, amount, label })
        .await?;
    bot.send_message(callback_chat_id(&q), NOTE_INSTRUCTIONS_MESSAGE)
        .reply_markup(make_skip_keyboard())
        .await?;
    Ok(())
}

pub async fn receive_note(
    bot: Bot,
    dialogue: UserDialogue,
    store: Arc<dyn LedgerStore>,
    config: Arc<AppConfig>,
    (kind, amount, label): (EntryKind, i64, String),
    msg: Message,
) -> HandlerResult {
    let text = match msg.text() {
        Some(text) => text,
        None => {
            send_bot_message(&bot, &msg, NO_TEXT_MESSAGE.to_string()).await?;
            return Ok(());
        }
    };

    let user = match msg.from() {
        Some(user) => user.clone(),
        None => return Ok(()),
    };

    commit_entry(
        &bot,
        &dialogue,
        store.as_ref(),
        config.as_ref(),
        msg.chat.id,
        user.id.0,
        user.username.as_deref(),
        Some(user.first_name.as_str()),
        kind,
        amount,
        &label,
        parse_note(text),
    )
    .await
}

pub async fn handle_note_skip(
    bot: Bot,
    dialogue: UserDialogue,
    store: Arc<dyn LedgerStore>,
    config: Arc<AppConfig>,
    (kind, amount, label): (EntryKind, i64, String),
    q: CallbackQuery,
) -> HandlerResult {
    if q.data.as_deref() != Some(CALLBACK_SKIP_NOTE) {
        return Ok(());
    }

    bot.answer_callback_query(q.id.clone()).await?;
    commit_entry(
        &bot,
        &dialogue,
        store.as_ref(),
        config.as_ref(),
        callback_chat_id(&q),
        q.from.id.0,
        q.from.username.as_deref(),
        Some(q.from.first_name.as_str()),
        kind,
        amount,
        &label,
        None,
    )
    .await
}

// Exactly one ledger write per completed conversation. The limit warning
// is a separate side effect and never blocks the commit.
#[allow(clippy::too_many_arguments)]
async fn commit_entry(
    bot: &Bot,
    dialogue: &UserDialogue,
    store: &dyn LedgerStore,
    config: &AppConfig,
    chat_id: ChatId,
    user_id: u64,
    username: Option<&str>,
    first_name: Option<&str>,
    kind: EntryKind,
    amount: i64,
    label: &str,
    note: Option<String>,
) -> HandlerResult {
    // The state is cleared no matter how the commit goes, so a store
    // failure cannot leave the conversation stuck
    dialogue.exit().await?;

    let committed = processor::register_user(store, user_id, username, first_name).and_then(|_| {
        match kind {
            EntryKind::Expense => {
                processor::record_expense(store, user_id, amount, label, note.as_deref()).map(drop)
            }
            EntryKind::Income => {
                processor::record_income(store, user_id, amount, label, note.as_deref()).map(drop)
            }
        }
    });

    if let Err(err) = committed {
        log::error!("Entry commit failed for user {}: {}", user_id, err);
        bot.send_message(chat_id, UNKNOWN_ERROR_MESSAGE).await?;
        return Ok(());
    }

    bot.send_message(
        chat_id,
        display_entry_summary(kind, amount, label, note.as_deref()),
    )
    .await?;

    if kind == EntryKind::Expense {
        match processor::check_expense_limit(store, user_id, config.expense_limit) {
            Ok(Some(breach)) => {
                bot.send_message(chat_id, display_limit_warning(breach.spent, breach.limit))
                    .await?;
            }
            Ok(None) => {}
            Err(err) => {
                log::error!("Limit check failed for user {}: {}", user_id, err);
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bot::ledger::MemoryLedgerStore;

    #[test]
    fn positive_amounts_advance_to_the_label_step() {
        let state = apply_amount(EntryKind::Expense, "1500").unwrap();
        match state {
            State::AwaitingCategory { kind, amount } => {
                assert_eq!(kind, EntryKind::Expense);
                assert_eq!(amount, 150_000);
            }
            other => panic!("unexpected state: {other:?}"),
        }
    }

    #[test]
    fn bad_amounts_do_not_advance() {
        assert!(apply_amount(EntryKind::Expense, "lunch").is_err());
        assert!(apply_amount(EntryKind::Expense, "-5").is_err());
        assert!(apply_amount(EntryKind::Income, "0").is_err());
    }

    #[test]
    fn blank_labels_fall_back_to_the_default() {
        assert_eq!(apply_label("   "), DEFAULT_LABEL);
        assert_eq!(apply_label("Food"), "food");
        assert_eq!(apply_label(" Side Job "), "side job");
    }

    #[test]
    fn skip_word_clears_the_note() {
        assert_eq!(parse_note("skip"), None);
        assert_eq!(parse_note("SKIP"), None);
        assert_eq!(parse_note(""), None);
        assert_eq!(parse_note("groceries"), Some("groceries".to_string()));
    }

    #[test]
    fn completed_conversation_produces_exactly_one_expense_row() {
        let store = MemoryLedgerStore::new();

        // amount "1500" -> category "food" -> note skipped
        let state = apply_amount(EntryKind::Expense, "1500").unwrap();
        let amount = match state {
            State::AwaitingCategory { amount, .. } => amount,
            other => panic!("unexpected state: {other:?}"),
        };
        let label = apply_label("food");
        let note = parse_note("skip");

        processor::register_user(&store, 7, None, None).unwrap();
        processor::record_expense(&store, 7, amount, &label, note.as_deref()).unwrap();

        let rows = store.expenses();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].amount, 150_000);
        assert_eq!(rows[0].category, "food");
        assert_eq!(rows[0].note, None);
    }
}
