use serde::{Deserialize, Serialize};

use crate::event::EventFilter;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    // Navigation
    SwitchToDesktop { number: u32 },
    SwitchToRecentDesktop,

    // Desktop lifecycle
    AddDesktop { name: Option<String> },
    RemoveDesktop { number: u32 },
    RemoveCurrentDesktop,
    RemoveLastDesktop,
    RemoveEmptyDesktops,

    // Naming and ordering
    RenameDesktop { number: u32, name: String },
    RenameCurrentDesktop { name: String },
    RequestCurrentDesktopNameChange,
    SwapDesktops { first: u32, second: u32 },
    MoveDesktop { number: u32, step: i32 },
    MoveCurrentDesktopLeft,
    MoveCurrentDesktopRight,

    // Named actions (hotkey surface)
    InvokeAction { name: String },
    ListActions,

    // Configuration
    SetKeepOneEmptyDesktop { value: bool },
    SetDropRedundantDesktops { value: bool },
    SetEmptyDesktopName { name: String },
    SetNewDesktopCommand { command: String },

    // Queries
    ListDesktops,
    GetState,

    /// Turns the connection into an event stream; no further commands
    /// are read from it.
    Subscribe {
        #[serde(default)]
        snapshot: bool,
        #[serde(default)]
        filter: EventFilter,
    },

    // Control
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    Ok,
    Error { message: String },
    Desktops { desktops: Vec<DesktopInfo> },
    State { state: StateInfo },
    Actions { actions: Vec<ActionInfo> },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DesktopInfo {
    pub number: u32,
    pub name: String,
    pub is_current: bool,
    pub is_empty: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateInfo {
    pub desktop_count: u32,
    pub current_desktop: u32,
    pub recent_desktop: Option<u32>,
    pub empty_desktops: Vec<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionInfo {
    pub name: String,
    pub command: String,
}
