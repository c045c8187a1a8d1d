/* Common utilites for handlers. */

use async_trait::async_trait;
use teloxide::{
    payloads::SendMessage,
    prelude::*,
    requests::JsonRequest,
    types::{ChatMemberStatus, Message, Recipient},
    Bot,
};

use crate::bot::ledger::LedgerStore;
use crate::bot::processor::{MembershipChecker, MembershipStatus};

use super::BotError;

// Checks and asserts the rate limit of 1 request per user per second.
// Returns true if okay, false if exceeded
pub fn assert_handle_request_limit(store: &dyn LedgerStore, msg: &Message) -> bool {
    if let Some(user) = msg.from() {
        let user_id = user.id.0;
        let timestamp = msg.date.timestamp();
        match store.check_rate_limit(user_id, timestamp) {
            Ok(true) => {}
            Ok(false) => {
                log::error!(
                    "Rate limit exceeded for user: {} in chat: {}, with message timestamp: {}",
                    user_id,
                    msg.chat.id,
                    timestamp
                );
                return false;
            }
            Err(err) => {
                // A broken throttle should not take the bot down with it
                log::error!("Rate limit check failed for user {}: {}", user_id, err);
            }
        }
    }

    true
}

// Wrapper function to send bot message to specific thread, if available
// Only replaces bot::send_message, as bot::edit_message_text edits specific msg ID
pub fn send_bot_message(bot: &Bot, msg: &Message, text: String) -> JsonRequest<SendMessage> {
    let thread_id = msg.thread_id;
    match thread_id {
        Some(thread_id) => bot
            .send_message(msg.chat.id, text)
            .message_thread_id(thread_id),
        None => bot.send_message(msg.chat.id, text),
    }
}

// Chat to reply into for a callback: the message the button sits on,
// falling back to the private chat with the tapping user.
pub fn callback_chat_id(q: &CallbackQuery) -> ChatId {
    match q.message.as_ref() {
        Some(message) => message.chat.id,
        None => ChatId(q.from.id.0 as i64),
    }
}

// Maps a stored channel identifier to a Telegram recipient.
// Bare usernames get a leading '@', numeric IDs pass through as chat IDs.
pub fn channel_recipient(channel_id: &str) -> Recipient {
    if let Ok(id) = channel_id.parse::<i64>() {
        Recipient::Id(ChatId(id))
    } else if channel_id.starts_with('@') {
        Recipient::ChannelUsername(channel_id.to_string())
    } else {
        Recipient::ChannelUsername(format!("@{channel_id}"))
    }
}

// Membership checks against the live Telegram API.
pub struct TelegramMembershipChecker {
    bot: Bot,
}

impl TelegramMembershipChecker {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl MembershipChecker for TelegramMembershipChecker {
    async fn status(&self, channel_id: &str, user_id: u64) -> Result<MembershipStatus, BotError> {
        let member = self
            .bot
            .get_chat_member(channel_recipient(channel_id), UserId(user_id))
            .await?;

        Ok(match member.status() {
            ChatMemberStatus::Owner => MembershipStatus::Owner,
            ChatMemberStatus::Administrator => MembershipStatus::Administrator,
            ChatMemberStatus::Member => MembershipStatus::Member,
            ChatMemberStatus::Restricted => MembershipStatus::Restricted,
            ChatMemberStatus::Left => MembershipStatus::Left,
            ChatMemberStatus::Banned => MembershipStatus::Kicked,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recipient_mapping_covers_usernames_and_ids() {
        assert_eq!(
            channel_recipient("@mychannel"),
            Recipient::ChannelUsername("@mychannel".to_string())
        );
        assert_eq!(
            channel_recipient("mychannel"),
            Recipient::ChannelUsername("@mychannel".to_string())
        );
        assert_eq!(
            channel_recipient("-100123456789"),
            Recipient::Id(ChatId(-100123456789))
        );
    }
}
