use serde::{Deserialize, Serialize};

use crate::DesktopInfo;

/// Event filter for subscribing to specific event types
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventFilter {
    /// Subscribe to desktop events (current changed, amount changed, remove requested)
    #[serde(default)]
    pub desktops: bool,
    /// Subscribe to naming events (names changed, rename requested)
    #[serde(default)]
    pub names: bool,
    /// Subscribe to empty-desktop updates
    #[serde(default)]
    pub empty: bool,
    /// Subscribe to action/hook invocations
    #[serde(default)]
    pub hooks: bool,
}

impl EventFilter {
    /// Create a filter that subscribes to all events
    pub fn all() -> Self {
        Self {
            desktops: true,
            names: true,
            empty: true,
            hooks: true,
        }
    }

    /// Check if the filter matches a given event
    pub fn matches(&self, event: &StateEvent) -> bool {
        match event {
            StateEvent::CurrentDesktopChanged { .. }
            | StateEvent::DesktopAmountChanged { .. }
            | StateEvent::DesktopRemoveRequested { .. } => self.desktops,
            StateEvent::DesktopNamesChanged
            | StateEvent::CurrentDesktopNameChangeRequested => self.names,
            StateEvent::EmptyDesktopsUpdated { .. } => self.empty,
            StateEvent::ActionInvoked { .. } => self.hooks,
            StateEvent::Snapshot { .. } => true, // Snapshots always pass filter
        }
    }

    /// Check if any filter is set
    pub fn any(&self) -> bool {
        self.desktops || self.names || self.empty || self.hooks
    }

    /// A filter with nothing set means "everything"
    pub fn or_all(self) -> Self {
        if self.any() {
            self
        } else {
            Self::all()
        }
    }
}

/// State change events sent to subscribers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StateEvent {
    /// The active desktop changed
    CurrentDesktopChanged { number: u32 },
    /// The number of desktops changed
    DesktopAmountChanged { count: u32 },
    /// The set of empty desktops was recomputed
    EmptyDesktopsUpdated { desktops: Vec<u32> },
    /// One or more desktop names changed
    DesktopNamesChanged,
    /// A desktop is about to be removed; bound resources should release
    DesktopRemoveRequested { number: u32 },
    /// The rename-current-desktop action was invoked without a name
    CurrentDesktopNameChangeRequested,
    /// A named action or lifecycle hook fired
    ActionInvoked { name: String },

    /// Full state, sent to new subscribers on request
    Snapshot {
        desktops: Vec<DesktopInfo>,
        current_desktop: u32,
        recent_desktop: Option<u32>,
        empty_desktops: Vec<u32>,
    },
}
