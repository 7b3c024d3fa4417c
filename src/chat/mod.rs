//! Operator chat interface: Telegram client, command parsing, and the bot
//! loop that wires commands to watch sessions

pub mod commands;
pub mod telegram;

pub use commands::{parse_command, render_event, ChatBot, Command};
pub use telegram::{TelegramClient, TelegramError};
