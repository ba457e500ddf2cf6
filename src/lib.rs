pub mod backend;
pub mod browser;
pub mod config;
pub mod fetch;
pub mod golf;
pub mod output;
pub mod ranking;
pub mod stderr_buffer;
pub mod triggers;
pub mod tui;
