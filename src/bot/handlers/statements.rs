/* Balance and report statements. Read-only over the ledger. */

use std::sync::Arc;

use teloxide::prelude::*;

use crate::bot::{
    constants::{
        callbacks::CALLBACK_REPORT_WEEKLY,
        messages::{REPORT_PROMPT_MESSAGE, UNKNOWN_ERROR_MESSAGE},
    },
    ledger::LedgerStore,
    processor::{self, ReportPeriod},
    utils::{
        bot_actions::{assert_handle_request_limit, callback_chat_id, send_bot_message},
        format::{display_balance, display_report, make_report_keyboard},
        HandlerResult,
    },
};

/* Balance command.
 * All-time income and expense totals with the net balance.
 */
pub async fn action_balance(bot: Bot, store: Arc<dyn LedgerStore>, msg: Message) -> HandlerResult {
    if !assert_handle_request_limit(store.as_ref(), &msg) {
        return Ok(());
    }

    let user = match msg.from() {
        Some(user) => user,
        None => return Ok(()),
    };

    processor::register_user(
        store.as_ref(),
        user.id.0,
        user.username.as_deref(),
        Some(user.first_name.as_str()),
    )?;

    match processor::get_balance(store.as_ref(), user.id.0) {
        Ok(summary) => {
            send_bot_message(&bot, &msg, display_balance(&summary)).await?;
        }
        Err(err) => {
            log::error!("Balance - failed for user {}: {}", user.id.0, err);
            send_bot_message(&bot, &msg, UNKNOWN_ERROR_MESSAGE.to_string()).await?;
        }
    }
    Ok(())
}

/* Report command.
 * Offers the two fixed windows; the report itself renders on callback.
 */
pub async fn action_report(bot: Bot, store: Arc<dyn LedgerStore>, msg: Message) -> HandlerResult {
    if !assert_handle_request_limit(store.as_ref(), &msg) {
        return Ok(());
    }

    send_bot_message(&bot, &msg, REPORT_PROMPT_MESSAGE.to_string())
        .reply_markup(make_report_keyboard())
        .await?;
    Ok(())
}

pub async fn handle_report_selection(
    bot: Bot,
    store: Arc<dyn LedgerStore>,
    q: CallbackQuery,
) -> HandlerResult {
    let period = if q.data.as_deref() == Some(CALLBACK_REPORT_WEEKLY) {
        ReportPeriod::Weekly
    } else {
        ReportPeriod::Monthly
    };

    let user_id = q.from.id.0;
    processor::register_user(
        store.as_ref(),
        user_id,
        q.from.username.as_deref(),
        Some(q.from.first_name.as_str()),
    )?;

    bot.answer_callback_query(q.id.clone()).await?;
    let text = match processor::build_report(store.as_ref(), user_id, period) {
        Ok(report) => display_report(&report),
        Err(err) => {
            log::error!("Report - failed for user {}: {}", user_id, err);
            UNKNOWN_ERROR_MESSAGE.to_string()
        }
    };

    match q.message.as_ref() {
        Some(message) => {
            bot.edit_message_text(message.chat.id, message.id, text).await?;
        }
        None => {
            bot.send_message(callback_chat_id(&q), text).await?;
        }
    }
    Ok(())
}
