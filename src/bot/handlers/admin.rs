/* Admin provisioning.
 * Two flows off the panel menu: the linear channel-creation path and the
 * broadcast path, plus single-shot toggle/delete/statistics actions.
 * Every handler here sits behind the admin filter in the dispatcher.
 */

use std::sync::Arc;
use std::time::Duration;

use teloxide::prelude::*;

use crate::bot::{
    constants::{
        callbacks::{
            CALLBACK_BROADCAST_CONFIRM, CALLBACK_CHANNEL_TYPE_CHANNEL,
            CALLBACK_CHANNEL_TYPE_GROUP, CALLBACK_DELETE_CHANNEL_PREFIX,
            CALLBACK_TOGGLE_CHANNEL_PREFIX,
        },
        messages::{
            ADMIN_PANEL_MESSAGE, BROADCAST_ABORTED_MESSAGE, BROADCAST_INSTRUCTIONS_MESSAGE,
            BROADCAST_SENDING_MESSAGE, CHANNEL_ID_INSTRUCTIONS_MESSAGE,
            CHANNEL_LIST_EMPTY_MESSAGE, CHANNEL_LIST_HEADER_MESSAGE, CHANNEL_NOT_FOUND_MESSAGE,
            CHANNEL_TITLE_INSTRUCTIONS_MESSAGE, CHANNEL_TYPE_INSTRUCTIONS_MESSAGE,
            CHANNEL_URL_INSTRUCTIONS_MESSAGE, EMPTY_FIELD_MESSAGE, NO_TEXT_MESSAGE,
            UNKNOWN_ERROR_MESSAGE,
        },
        misc::BROADCAST_PACE_MS,
    },
    ledger::{ChannelKind, LedgerStore, NewChannel},
    processor,
    utils::{
        bot_actions::{assert_handle_request_limit, callback_chat_id, send_bot_message},
        format::{
            display_broadcast_summary, display_channel_saved, display_statistics,
            make_admin_menu_keyboard, make_broadcast_confirm_keyboard, make_channel_type_keyboard,
            make_channels_keyboard,
        },
        BotError, HandlerResult, UserDialogue,
    },
    State,
};

/* Admin command.
 * Clears any running session and opens the panel menu.
 */
pub async fn action_admin_panel(
    bot: Bot,
    dialogue: UserDialogue,
    store: Arc<dyn LedgerStore>,
    msg: Message,
) -> HandlerResult {
    if !assert_handle_request_limit(store.as_ref(), &msg) {
        return Ok(());
    }

    dialogue.exit().await?;
    send_bot_message(&bot, &msg, ADMIN_PANEL_MESSAGE.to_string())
        .reply_markup(make_admin_menu_keyboard())
        .await?;
    Ok(())
}

/* Channel creation path */

pub async fn handle_add_channel(
    bot: Bot,
    dialogue: UserDialogue,
    q: CallbackQuery,
) -> HandlerResult {
    bot.answer_callback_query(q.id.clone()).await?;
    dialogue.update(State::SelectingChannelType).await?;
    bot.send_message(callback_chat_id(&q), CHANNEL_TYPE_INSTRUCTIONS_MESSAGE)
        .reply_markup(make_channel_type_keyboard())
        .await?;
    Ok(())
}

pub async fn handle_channel_type(
    bot: Bot,
    dialogue: UserDialogue,
    q: CallbackQuery,
) -> HandlerResult {
    let kind = match q.data.as_deref() {
        Some(CALLBACK_CHANNEL_TYPE_CHANNEL) => ChannelKind::Channel,
        Some(CALLBACK_CHANNEL_TYPE_GROUP) => ChannelKind::Group,
        _ => {
            bot.answer_callback_query(q.id.clone()).await?;
            return Ok(());
        }
    };

    bot.answer_callback_query(q.id.clone()).await?;
    dialogue.update(State::AwaitingChannelId { kind }).await?;
    bot.send_message(callback_chat_id(&q), CHANNEL_ID_INSTRUCTIONS_MESSAGE)
        .await?;
    Ok(())
}

pub async fn receive_channel_id(
    bot: Bot,
    dialogue: UserDialogue,
    kind: ChannelKind,
    msg: Message,
) -> HandlerResult {
    let channel_id = match non_empty_text(&msg) {
        Ok(text) => text,
        Err(reply) => {
            send_bot_message(&bot, &msg, reply).await?;
            return Ok(());
        }
    };

    dialogue
        .update(State::AwaitingChannelTitle { kind, channel_id })
        .await?;
    send_bot_message(&bot, &msg, CHANNEL_TITLE_INSTRUCTIONS_MESSAGE.to_string()).await?;
    Ok(())
}

pub async fn receive_channel_title(
    bot: Bot,
    dialogue: UserDialogue,
    (kind, channel_id): (ChannelKind, String),
    msg: Message,
) -> HandlerResult {
    let title = match non_empty_text(&msg) {
        Ok(text) => text,
        Err(reply) => {
            send_bot_message(&bot, &msg, reply).await?;
            return Ok(());
        }
    };

    dialogue
        .update(State::AwaitingChannelUrl { kind, channel_id, title })
        .await?;
    send_bot_message(&bot, &msg, CHANNEL_URL_INSTRUCTIONS_MESSAGE.to_string()).await?;
    Ok(())
}

pub async fn receive_channel_url(
    bot: Bot,
    dialogue: UserDialogue,
    store: Arc<dyn LedgerStore>,
    (kind, channel_id, title): (ChannelKind, String, String),
    msg: Message,
) -> HandlerResult {
    let url = match non_empty_text(&msg) {
        Ok(text) => text,
        Err(reply) => {
            send_bot_message(&bot, &msg, reply).await?;
            return Ok(());
        }
    };

    // Saved state always clears the session, even on a store failure
    dialogue.exit().await?;

    match processor::upsert_required_channel(
        store.as_ref(),
        NewChannel { channel_id, title, url, kind },
    ) {
        Ok(channel) => {
            send_bot_message(&bot, &msg, display_channel_saved(&channel)).await?;
        }
        Err(err) => {
            log::error!("Channel upsert failed: {}", err);
            send_bot_message(&bot, &msg, UNKNOWN_ERROR_MESSAGE.to_string()).await?;
        }
    }
    Ok(())
}

/* Single-shot channel actions */

pub async fn handle_list_channels(
    bot: Bot,
    store: Arc<dyn LedgerStore>,
    q: CallbackQuery,
) -> HandlerResult {
    bot.answer_callback_query(q.id.clone()).await?;

    let channels = processor::retrieve_channels(store.as_ref())?;
    if channels.is_empty() {
        bot.send_message(callback_chat_id(&q), CHANNEL_LIST_EMPTY_MESSAGE)
            .await?;
    } else {
        bot.send_message(callback_chat_id(&q), CHANNEL_LIST_HEADER_MESSAGE)
            .reply_markup(make_channels_keyboard(&channels))
            .await?;
    }
    Ok(())
}

pub async fn handle_channel_toggle(
    bot: Bot,
    store: Arc<dyn LedgerStore>,
    q: CallbackQuery,
) -> HandlerResult {
    let channel_id = callback_suffix(&q, CALLBACK_TOGGLE_CHANNEL_PREFIX);

    match processor::toggle_required_channel(store.as_ref(), &channel_id)? {
        Some(channel) => {
            let status = if channel.is_active { "activated ✅" } else { "deactivated ❌" };
            bot.answer_callback_query(q.id.clone())
                .text(format!("{} - {status}", channel.title))
                .await?;
            refresh_channel_list(&bot, store.as_ref(), &q).await?;
        }
        None => {
            bot.answer_callback_query(q.id.clone())
                .text(CHANNEL_NOT_FOUND_MESSAGE)
                .await?;
        }
    }
    Ok(())
}

pub async fn handle_channel_delete(
    bot: Bot,
    store: Arc<dyn LedgerStore>,
    q: CallbackQuery,
) -> HandlerResult {
    let channel_id = callback_suffix(&q, CALLBACK_DELETE_CHANNEL_PREFIX);

    let channel = match processor::find_required_channel(store.as_ref(), &channel_id) {
        Ok(Some(channel)) => channel,
        Ok(None) => {
            bot.answer_callback_query(q.id.clone())
                .text(CHANNEL_NOT_FOUND_MESSAGE)
                .await?;
            return Ok(());
        }
        Err(err) => {
            log::error!("Channel lookup failed for {}: {}", channel_id, err);
            bot.answer_callback_query(q.id.clone())
                .text(UNKNOWN_ERROR_MESSAGE)
                .await?;
            return Ok(());
        }
    };

    processor::remove_required_channel(store.as_ref(), &channel_id)?;
    bot.answer_callback_query(q.id.clone())
        .text(format!("{} removed!", channel.title))
        .await?;
    refresh_channel_list(&bot, store.as_ref(), &q).await?;
    Ok(())
}

// Re-renders the list message the tapped button belongs to.
async fn refresh_channel_list(
    bot: &Bot,
    store: &dyn LedgerStore,
    q: &CallbackQuery,
) -> HandlerResult {
    let message = match q.message.as_ref() {
        Some(message) => message,
        None => return Ok(()),
    };

    let channels = processor::retrieve_channels(store)?;
    if channels.is_empty() {
        bot.edit_message_text(message.chat.id, message.id, CHANNEL_LIST_EMPTY_MESSAGE)
            .await?;
    } else {
        bot.edit_message_reply_markup(message.chat.id, message.id)
            .reply_markup(make_channels_keyboard(&channels))
            .await?;
    }
    Ok(())
}

/* Broadcast path */

pub async fn handle_broadcast_start(
    bot: Bot,
    dialogue: UserDialogue,
    q: CallbackQuery,
) -> HandlerResult {
    bot.answer_callback_query(q.id.clone()).await?;
    dialogue.update(State::AwaitingBroadcastMessage).await?;
    bot.send_message(callback_chat_id(&q), BROADCAST_INSTRUCTIONS_MESSAGE)
        .await?;
    Ok(())
}

pub async fn receive_broadcast_message(
    bot: Bot,
    dialogue: UserDialogue,
    store: Arc<dyn LedgerStore>,
    msg: Message,
) -> HandlerResult {
    // Text-only payloads; media is not carried into the broadcast
    let payload = match msg.text() {
        Some(text) if !text.trim().is_empty() => text.trim().to_string(),
        Some(_) => {
            send_bot_message(&bot, &msg, EMPTY_FIELD_MESSAGE.to_string()).await?;
            return Ok(());
        }
        None => {
            send_bot_message(&bot, &msg, NO_TEXT_MESSAGE.to_string()).await?;
            return Ok(());
        }
    };

    let recipients = processor::usage_statistics(store.as_ref())?.unblocked_users;
    dialogue
        .update(State::ConfirmingBroadcast { payload })
        .await?;
    send_bot_message(
        &bot,
        &msg,
        format!("📨 Confirm broadcast\n\nThis message will go out to {recipients} users.\n\nProceed?"),
    )
    .reply_markup(make_broadcast_confirm_keyboard())
    .await?;
    Ok(())
}

pub async fn handle_broadcast_decision(
    bot: Bot,
    dialogue: UserDialogue,
    store: Arc<dyn LedgerStore>,
    payload: String,
    q: CallbackQuery,
) -> HandlerResult {
    bot.answer_callback_query(q.id.clone()).await?;

    // Anything but the explicit confirm aborts and clears the session
    dialogue.exit().await?;
    if q.data.as_deref() != Some(CALLBACK_BROADCAST_CONFIRM) {
        bot.send_message(callback_chat_id(&q), BROADCAST_ABORTED_MESSAGE)
            .await?;
        return Ok(());
    }

    let chat_id = callback_chat_id(&q);
    bot.send_message(chat_id, BROADCAST_SENDING_MESSAGE).await?;

    let recipients = processor::broadcast_recipients(store.as_ref())?;
    let summary = processor::run_broadcast(
        &recipients,
        Duration::from_millis(BROADCAST_PACE_MS),
        |telegram_id| {
            let bot = bot.clone();
            let text = payload.clone();
            async move {
                bot.send_message(ChatId(telegram_id as i64), text)
                    .await
                    .map(drop)
                    .map_err(BotError::from)
            }
        },
    )
    .await;

    log::info!(
        "Broadcast by admin {} finished: {} sent, {} failed",
        q.from.id.0,
        summary.sent,
        summary.failed
    );
    bot.send_message(chat_id, display_broadcast_summary(&summary))
        .await?;
    Ok(())
}

/* Statistics */

pub async fn handle_statistics(
    bot: Bot,
    store: Arc<dyn LedgerStore>,
    q: CallbackQuery,
) -> HandlerResult {
    bot.answer_callback_query(q.id.clone()).await?;

    let stats = processor::usage_statistics(store.as_ref())?;
    bot.send_message(callback_chat_id(&q), display_statistics(&stats))
        .await?;
    Ok(())
}

fn non_empty_text(msg: &Message) -> Result<String, String> {
    match msg.text() {
        Some(text) if !text.trim().is_empty() => Ok(text.trim().to_string()),
        Some(_) => Err(EMPTY_FIELD_MESSAGE.to_string()),
        None => Err(NO_TEXT_MESSAGE.to_string()),
    }
}

fn callback_suffix(q: &CallbackQuery, prefix: &str) -> String {
    q.data
        .as_deref()
        .and_then(|data| data.strip_prefix(prefix))
        .unwrap_or_default()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bot::ledger::MemoryLedgerStore;

    #[test]
    fn upsert_scenario_keeps_one_row_with_the_latest_title() {
        let store = MemoryLedgerStore::new();

        processor::upsert_required_channel(
            &store,
            NewChannel {
                channel_id: "@mychannel".to_string(),
                title: "My Channel".to_string(),
                url: "https://t.me/mychannel".to_string(),
                kind: ChannelKind::Channel,
            },
        )
        .unwrap();

        let updated = processor::upsert_required_channel(
            &store,
            NewChannel {
                channel_id: "@mychannel".to_string(),
                title: "Updated".to_string(),
                url: "https://t.me/mychannel".to_string(),
                kind: ChannelKind::Channel,
            },
        )
        .unwrap();

        let channels = processor::retrieve_channels(&store).unwrap();
        assert_eq!(channels.len(), 1);
        assert_eq!(updated.title, "Updated");
        assert!(updated.is_active);
    }

    #[test]
    fn toggle_and_delete_are_noops_for_unknown_ids() {
        let store = MemoryLedgerStore::new();
        assert!(processor::toggle_required_channel(&store, "@ghost").unwrap().is_none());
        assert!(!processor::remove_required_channel(&store, "@ghost").unwrap());
    }
}
