pub mod command;
pub mod event;

pub use command::{ActionInfo, Command, DesktopInfo, Response, StateInfo};
pub use event::{EventFilter, StateEvent};
