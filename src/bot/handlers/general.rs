use std::sync::Arc;

use teloxide::{prelude::*, utils::command::BotCommands};

use crate::bot::{
    constants::{
        callbacks::CALLBACK_SET_LANGUAGE_PREFIX,
        commands::{
            COMMAND_ADD_EXPENSE, COMMAND_ADD_INCOME, COMMAND_BALANCE, COMMAND_LANGUAGE,
            COMMAND_REPORT,
        },
        messages::{
            BLANK_CANCEL_MESSAGE, CANCEL_BROADCAST_MESSAGE, CANCEL_CHANNEL_MESSAGE,
            CANCEL_ENTRY_MESSAGE, LANGUAGE_PROMPT_MESSAGE, LANGUAGE_SAVED_MESSAGE,
            NO_ADMIN_MESSAGE,
        },
        misc::LANGUAGES,
    },
    dispatcher::Command,
    ledger::LedgerStore,
    processor,
    utils::{
        bot_actions::{assert_handle_request_limit, callback_chat_id, send_bot_message},
        format::make_language_keyboard,
        HandlerResult, UserDialogue,
    },
    State,
};

/* Invalid state.
 * This action is invoked when the bot is in start state, and there is a
 * non-command message addressed to it.
 * Currently, simply does not respond to anything. Reduces spam.
 */
pub async fn invalid_state(_bot: Bot, _msg: Message) -> HandlerResult {
    Ok(())
}

/* Start command.
 * Registers the user and displays a welcome message.
 */
pub async fn action_start(bot: Bot, store: Arc<dyn LedgerStore>, msg: Message) -> HandlerResult {
    if !assert_handle_request_limit(store.as_ref(), &msg) {
        return Ok(());
    }

    if let Some(user) = msg.from() {
        if let Err(err) = processor::register_user(
            store.as_ref(),
            user.id.0,
            user.username.as_deref(),
            Some(user.first_name.as_str()),
        ) {
            log::error!("Start - failed to register user {}: {}", user.id.0, err);
        }
    }

    let intro = "Hello! I'm Tallybot!\n\nI keep track of your personal expenses and incomes, right here in the chat";

    let add_info = &format!("Start with {COMMAND_ADD_EXPENSE} or {COMMAND_ADD_INCOME}. I'll walk you through the amount, the category, and an optional note.");
    let view_info = &format!("Check {COMMAND_BALANCE} for your overall balance, and {COMMAND_REPORT} for weekly or monthly summaries. You can pick a language anytime with {COMMAND_LANGUAGE}.");
    send_bot_message(
        &bot,
        &msg,
        format!("{intro}\n\n{add_info}\n\n{view_info}\n\n"),
    )
    .await?;
    Ok(())
}

/* Help command.
 * Displays a list of commands available to the user.
 */
pub async fn action_help(bot: Bot, store: Arc<dyn LedgerStore>, msg: Message) -> HandlerResult {
    if !assert_handle_request_limit(store.as_ref(), &msg) {
        return Ok(());
    }

    send_bot_message(
        &bot,
        &msg,
        format!("Commands\n\n{}", Command::descriptions()),
    )
    .await?;

    Ok(())
}

/* Cancel command.
 * Clears whatever flow is in progress and says which one it was.
 */
pub async fn action_cancel(
    bot: Bot,
    dialogue: UserDialogue,
    store: Arc<dyn LedgerStore>,
    msg: Message,
) -> HandlerResult {
    if !assert_handle_request_limit(store.as_ref(), &msg) {
        return Ok(());
    }

    let reply = match dialogue.get().await? {
        None | Some(State::Start) => BLANK_CANCEL_MESSAGE,
        Some(State::AwaitingAmount { .. })
        | Some(State::AwaitingCategory { .. })
        | Some(State::AwaitingNote { .. }) => CANCEL_ENTRY_MESSAGE,
        Some(State::SelectingChannelType)
        | Some(State::AwaitingChannelId { .. })
        | Some(State::AwaitingChannelTitle { .. })
        | Some(State::AwaitingChannelUrl { .. }) => CANCEL_CHANNEL_MESSAGE,
        Some(State::AwaitingBroadcastMessage) | Some(State::ConfirmingBroadcast { .. }) => {
            CANCEL_BROADCAST_MESSAGE
        }
    };

    dialogue.exit().await?;
    send_bot_message(&bot, &msg, reply.to_string()).await?;
    Ok(())
}

/* Language command.
 * Offers the supported language codes; the choice is stored per user.
 */
pub async fn action_language(bot: Bot, store: Arc<dyn LedgerStore>, msg: Message) -> HandlerResult {
    if !assert_handle_request_limit(store.as_ref(), &msg) {
        return Ok(());
    }

    send_bot_message(&bot, &msg, LANGUAGE_PROMPT_MESSAGE.to_string())
        .reply_markup(make_language_keyboard())
        .await?;
    Ok(())
}

pub async fn handle_language_selection(
    bot: Bot,
    store: Arc<dyn LedgerStore>,
    q: CallbackQuery,
) -> HandlerResult {
    let code = q
        .data
        .as_deref()
        .and_then(|data| data.strip_prefix(CALLBACK_SET_LANGUAGE_PREFIX))
        .unwrap_or_default()
        .to_string();

    if !LANGUAGES.iter().any(|(known, _)| *known == code) {
        bot.answer_callback_query(q.id).await?;
        return Ok(());
    }

    let user_id = q.from.id.0;
    processor::register_user(
        store.as_ref(),
        user_id,
        q.from.username.as_deref(),
        Some(q.from.first_name.as_str()),
    )?;
    processor::set_language(store.as_ref(), user_id, &code)?;

    bot.answer_callback_query(q.id.clone()).await?;
    match q.message.as_ref() {
        Some(message) => {
            bot.edit_message_text(message.chat.id, message.id, LANGUAGE_SAVED_MESSAGE)
                .await?;
        }
        None => {
            bot.send_message(callback_chat_id(&q), LANGUAGE_SAVED_MESSAGE)
                .await?;
        }
    }
    Ok(())
}

/* Admin command, for everyone who is not an admin. */
pub async fn action_admin_denied(
    bot: Bot,
    store: Arc<dyn LedgerStore>,
    msg: Message,
) -> HandlerResult {
    if !assert_handle_request_limit(store.as_ref(), &msg) {
        return Ok(());
    }

    send_bot_message(&bot, &msg, NO_ADMIN_MESSAGE.to_string()).await?;
    Ok(())
}
