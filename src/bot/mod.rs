pub use self::dispatcher::run_dispatcher;

pub use self::dispatcher::{Command, EntryKind, State};

mod config;
mod constants;
mod dispatcher;
mod handlers;
pub mod ledger;
mod processor;
mod utils;
