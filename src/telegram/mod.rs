//! Telegram Bot API: wire types, HTTP client, update routing and long polling

pub mod client;
pub mod poller;
pub mod router;
pub mod types;

pub use client::TelegramClient;
pub use poller::Poller;
pub use router::UpdateRouter;
