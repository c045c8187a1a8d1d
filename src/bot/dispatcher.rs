use std::sync::Arc;

use teloxide::{
    dispatching::{dialogue, dialogue::InMemStorage, UpdateHandler},
    prelude::*,
    utils::command::BotCommands,
};

use crate::bot::{
    config::AppConfig,
    constants::callbacks::{
        CALLBACK_ADMIN_ADD_CHANNEL, CALLBACK_ADMIN_BROADCAST, CALLBACK_ADMIN_LIST_CHANNELS,
        CALLBACK_ADMIN_STATISTICS, CALLBACK_CHECK_SUBSCRIPTION, CALLBACK_DELETE_CHANNEL_PREFIX,
        CALLBACK_REPORT_MONTHLY, CALLBACK_REPORT_WEEKLY, CALLBACK_SET_LANGUAGE_PREFIX,
        CALLBACK_TOGGLE_CHANNEL_PREFIX,
    },
    handlers::{admin, entry, general, statements, subscription},
    ledger::{ChannelKind, LedgerStore, MemoryLedgerStore, RedisLedgerStore},
    processor::MembershipChecker,
    utils::{bot_actions::TelegramMembershipChecker, BotError},
};

#[derive(BotCommands, Clone)]
#[command(
    rename_rule = "snake_case",
    description = "These commands are supported:"
)]
pub enum Command {
    #[command(description = "register and show the welcome message.")]
    Start,
    #[command(description = "display this help text.")]
    Help,
    #[command(description = "record a new expense.")]
    AddExpense,
    #[command(description = "record a new income.")]
    AddIncome,
    #[command(description = "show your all-time balance.")]
    Balance,
    #[command(description = "show weekly or monthly reports.")]
    Report,
    #[command(description = "pick your preferred language.")]
    Language,
    #[command(description = "cancel the current operation.")]
    Cancel,
    #[command(description = "open the admin panel.")]
    Admin,
}

// Which ledger variant a guided entry commits to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Expense,
    Income,
}

/* Dialogue state, one live value per chat identity.
 * Covers both machines: the guided-entry conversation and the admin
 * session. Starting a new flow overwrites whatever was in progress.
 */
#[derive(Debug, Clone, Default)]
pub enum State {
    #[default]
    Start,
    // Guided entry
    AwaitingAmount {
        kind: EntryKind,
    },
    AwaitingCategory {
        kind: EntryKind,
        amount: i64,
    },
    AwaitingNote {
        kind: EntryKind,
        amount: i64,
        label: String,
    },
    // Admin: channel provisioning
    SelectingChannelType,
    AwaitingChannelId {
        kind: ChannelKind,
    },
    AwaitingChannelTitle {
        kind: ChannelKind,
        channel_id: String,
    },
    AwaitingChannelUrl {
        kind: ChannelKind,
        channel_id: String,
        title: String,
    },
    // Admin: broadcast
    AwaitingBroadcastMessage,
    ConfirmingBroadcast {
        payload: String,
    },
}

fn callback_data_is(expected: &'static str) -> impl Fn(CallbackQuery) -> bool {
    move |q: CallbackQuery| q.data.as_deref() == Some(expected)
}

fn callback_data_starts_with(prefix: &'static str) -> impl Fn(CallbackQuery) -> bool {
    move |q: CallbackQuery| q.data.as_deref().is_some_and(|data| data.starts_with(prefix))
}

fn schema() -> UpdateHandler<BotError> {
    use dptree::case;

    let admin_message = dptree::filter(|config: Arc<AppConfig>, msg: Message| {
        msg.from().map(|user| config.is_admin(user.id.0)).unwrap_or(false)
    });
    let admin_callback =
        dptree::filter(|config: Arc<AppConfig>, q: CallbackQuery| config.is_admin(q.from.id.0));

    // Commands that never go through the subscription gate
    let ungated_commands = teloxide::filter_command::<Command, _>()
        .branch(case![Command::Start].endpoint(general::action_start))
        .branch(case![Command::Help].endpoint(general::action_help))
        .branch(case![Command::Cancel].endpoint(general::action_cancel))
        .branch(case![Command::Language].endpoint(general::action_language))
        .branch(
            admin_message
                .clone()
                .branch(case![Command::Admin].endpoint(admin::action_admin_panel)),
        )
        .branch(case![Command::Admin].endpoint(general::action_admin_denied));

    // Admin session steps; plain text while the admin machine is mid-flow
    let admin_steps = admin_message
        .branch(case![State::AwaitingChannelId { kind }].endpoint(admin::receive_channel_id))
        .branch(
            case![State::AwaitingChannelTitle { kind, channel_id }]
                .endpoint(admin::receive_channel_title),
        )
        .branch(
            case![State::AwaitingChannelUrl { kind, channel_id, title }]
                .endpoint(admin::receive_channel_url),
        )
        .branch(
            case![State::AwaitingBroadcastMessage].endpoint(admin::receive_broadcast_message),
        );

    // Everything below this branch is a ledger action and requires the
    // mandatory subscriptions to be satisfied (admins fall through).
    let subscription_gate = dptree::filter_map_async(subscription::missing_channels_for_message)
        .endpoint(subscription::prompt_subscription);

    let ledger_commands = teloxide::filter_command::<Command, _>()
        .branch(case![Command::AddExpense].endpoint(entry::action_add_expense))
        .branch(case![Command::AddIncome].endpoint(entry::action_add_income))
        .branch(case![Command::Balance].endpoint(statements::action_balance))
        .branch(case![Command::Report].endpoint(statements::action_report));

    let message_handler = Update::filter_message()
        .branch(ungated_commands)
        .branch(admin_steps)
        .branch(subscription_gate)
        .branch(ledger_commands)
        .branch(case![State::AwaitingAmount { kind }].endpoint(entry::receive_amount))
        .branch(case![State::AwaitingCategory { kind, amount }].endpoint(entry::receive_category))
        .branch(case![State::AwaitingNote { kind, amount, label }].endpoint(entry::receive_note))
        .branch(dptree::endpoint(general::invalid_state));

    let callback_handler = Update::filter_callback_query()
        .branch(
            dptree::filter(callback_data_is(CALLBACK_CHECK_SUBSCRIPTION))
                .endpoint(subscription::handle_recheck),
        )
        .branch(
            dptree::filter(callback_data_starts_with(CALLBACK_SET_LANGUAGE_PREFIX))
                .endpoint(general::handle_language_selection),
        )
        .branch(
            dptree::filter_map_async(subscription::missing_channels_for_callback)
                .endpoint(subscription::prompt_subscription_callback),
        )
        .branch(
            case![State::AwaitingCategory { kind, amount }]
                .endpoint(entry::handle_category_selection),
        )
        .branch(case![State::AwaitingNote { kind, amount, label }].endpoint(entry::handle_note_skip))
        .branch(
            admin_callback
                .branch(case![State::SelectingChannelType].endpoint(admin::handle_channel_type))
                .branch(
                    case![State::ConfirmingBroadcast { payload }]
                        .endpoint(admin::handle_broadcast_decision),
                )
                .branch(
                    dptree::filter(callback_data_is(CALLBACK_ADMIN_ADD_CHANNEL))
                        .endpoint(admin::handle_add_channel),
                )
                .branch(
                    dptree::filter(callback_data_is(CALLBACK_ADMIN_LIST_CHANNELS))
                        .endpoint(admin::handle_list_channels),
                )
                .branch(
                    dptree::filter(callback_data_is(CALLBACK_ADMIN_BROADCAST))
                        .endpoint(admin::handle_broadcast_start),
                )
                .branch(
                    dptree::filter(callback_data_is(CALLBACK_ADMIN_STATISTICS))
                        .endpoint(admin::handle_statistics),
                )
                .branch(
                    dptree::filter(callback_data_starts_with(CALLBACK_TOGGLE_CHANNEL_PREFIX))
                        .endpoint(admin::handle_channel_toggle),
                )
                .branch(
                    dptree::filter(callback_data_starts_with(CALLBACK_DELETE_CHANNEL_PREFIX))
                        .endpoint(admin::handle_channel_delete),
                ),
        )
        .branch(
            dptree::filter(|q: CallbackQuery| {
                matches!(
                    q.data.as_deref(),
                    Some(CALLBACK_REPORT_WEEKLY) | Some(CALLBACK_REPORT_MONTHLY)
                )
            })
            .endpoint(statements::handle_report_selection),
        );

    dialogue::enter::<Update, InMemStorage<State>, State, _>()
        .branch(message_handler)
        .branch(callback_handler)
}

pub async fn run_dispatcher(bot: Bot) {
    let config = Arc::new(AppConfig::from_env());

    let store: Arc<dyn LedgerStore> = match std::env::var("REDIS_URL") {
        Ok(url) => match RedisLedgerStore::connect(&url) {
            Ok(store) => {
                log::info!("Connected to the Redis ledger store");
                Arc::new(store)
            }
            Err(err) => {
                log::error!("Failed to open Redis, falling back to the in-memory store: {err}");
                Arc::new(MemoryLedgerStore::new())
            }
        },
        Err(_) => {
            log::warn!("REDIS_URL not set, ledger data will not survive a restart");
            Arc::new(MemoryLedgerStore::new())
        }
    };

    let checker: Arc<dyn MembershipChecker> = Arc::new(TelegramMembershipChecker::new(bot.clone()));

    log::info!("Starting dispatcher...");
    Dispatcher::builder(bot, schema())
        .dependencies(dptree::deps![
            config,
            store,
            checker,
            InMemStorage::<State>::new()
        ])
        .default_handler(|upd| async move {
            log::warn!("Unhandled update: {:?}", upd);
        })
        .error_handler(LoggingErrorHandler::with_custom_text(
            "An error has occurred in the dispatcher",
        ))
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;
}
