mod config;
mod crud;
mod manager;
mod notify;
mod policy;

pub use config::{ChromeRule, Config};
pub use manager::{DesktopManager, NEW_DESKTOP_COMMAND_DELAY, SETTLE_DELAY};
