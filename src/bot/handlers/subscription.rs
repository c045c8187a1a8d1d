/* Mandatory subscription gate.
 * Sits in front of every ledger-reading or ledger-mutating action.
 * Admins bypass it; the recheck button re-runs the check on demand.
 */

use std::sync::Arc;

use teloxide::prelude::*;

use crate::bot::{
    config::AppConfig,
    constants::messages::{
        SUBSCRIPTION_OK_MESSAGE, SUBSCRIPTION_REQUIRED_MESSAGE,
        SUBSCRIPTION_STILL_MISSING_MESSAGE,
    },
    ledger::{LedgerStore, RequiredChannel},
    processor::{self, MembershipChecker},
    utils::{
        bot_actions::{callback_chat_id, send_bot_message},
        format::{display_missing_channels, make_subscription_keyboard},
        HandlerResult,
    },
};

// Gate filter. Some(missing) routes the update into the prompt endpoint
// and swallows it; None lets the branch fall through to the real handler.
pub async fn missing_channels_for_message(
    config: Arc<AppConfig>,
    store: Arc<dyn LedgerStore>,
    checker: Arc<dyn MembershipChecker>,
    msg: Message,
) -> Option<Vec<RequiredChannel>> {
    let user = msg.from()?;
    if config.is_admin(user.id.0) {
        return None;
    }

    match processor::check_subscription(store.as_ref(), checker.as_ref(), user.id.0).await {
        Ok(status) if !status.satisfied => Some(status.missing),
        Ok(_) => None,
        Err(err) => {
            // Fail open: a broken store must not lock every user out
            log::error!("Subscription check failed for user {}: {}", user.id.0, err);
            None
        }
    }
}

// Callback-side twin of the message filter; in-flow button taps can
// commit ledger rows too and get the same treatment.
pub async fn missing_channels_for_callback(
    config: Arc<AppConfig>,
    store: Arc<dyn LedgerStore>,
    checker: Arc<dyn MembershipChecker>,
    q: CallbackQuery,
) -> Option<Vec<RequiredChannel>> {
    if config.is_admin(q.from.id.0) {
        return None;
    }

    match processor::check_subscription(store.as_ref(), checker.as_ref(), q.from.id.0).await {
        Ok(status) if !status.satisfied => Some(status.missing),
        Ok(_) => None,
        Err(err) => {
            log::error!("Subscription check failed for user {}: {}", q.from.id.0, err);
            None
        }
    }
}

pub async fn prompt_subscription_callback(
    bot: Bot,
    q: CallbackQuery,
    missing: Vec<RequiredChannel>,
) -> HandlerResult {
    bot.answer_callback_query(q.id.clone()).await?;
    bot.send_message(
        callback_chat_id(&q),
        format!(
            "{SUBSCRIPTION_REQUIRED_MESSAGE}\n\n{}",
            display_missing_channels(&missing)
        ),
    )
    .reply_markup(make_subscription_keyboard())
    .await?;
    Ok(())
}

pub async fn prompt_subscription(
    bot: Bot,
    msg: Message,
    missing: Vec<RequiredChannel>,
) -> HandlerResult {
    send_bot_message(
        &bot,
        &msg,
        format!(
            "{SUBSCRIPTION_REQUIRED_MESSAGE}\n\n{}",
            display_missing_channels(&missing)
        ),
    )
    .reply_markup(make_subscription_keyboard())
    .await?;
    Ok(())
}

pub async fn handle_recheck(
    bot: Bot,
    config: Arc<AppConfig>,
    store: Arc<dyn LedgerStore>,
    checker: Arc<dyn MembershipChecker>,
    q: CallbackQuery,
) -> HandlerResult {
    let user_id = q.from.id.0;

    let status = if config.is_admin(user_id) {
        processor::SubscriptionStatus { satisfied: true, missing: Vec::new() }
    } else {
        processor::check_subscription(store.as_ref(), checker.as_ref(), user_id).await?
    };

    if status.satisfied {
        bot.answer_callback_query(q.id.clone()).await?;
        match q.message.as_ref() {
            Some(message) => {
                bot.edit_message_text(message.chat.id, message.id, SUBSCRIPTION_OK_MESSAGE)
                    .await?;
            }
            None => {
                bot.send_message(callback_chat_id(&q), SUBSCRIPTION_OK_MESSAGE)
                    .await?;
            }
        }
        return Ok(());
    }

    bot.answer_callback_query(q.id.clone())
        .text(SUBSCRIPTION_STILL_MISSING_MESSAGE)
        .await?;
    if let Some(message) = q.message.as_ref() {
        // Redrawing an unchanged list is rejected by the API; not worth
        // surfacing to the user
        let redraw = bot
            .edit_message_text(
                message.chat.id,
                message.id,
                format!(
                    "{SUBSCRIPTION_REQUIRED_MESSAGE}\n\n{}",
                    display_missing_channels(&status.missing)
                ),
            )
            .reply_markup(make_subscription_keyboard())
            .await;
        if let Err(err) = redraw {
            log::debug!("Recheck redraw skipped for user {}: {}", user_id, err);
        }
    }
    Ok(())
}
