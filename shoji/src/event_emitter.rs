use shoji_ipc::StateEvent;
use tokio::sync::broadcast;

use crate::platform::ShortcutPort;

/// Fan-out for domain events. Backed by a broadcast channel so the IPC
/// event server and any in-process listeners see the same stream.
#[derive(Clone)]
pub struct EventEmitter {
    tx: broadcast::Sender<StateEvent>,
}

impl EventEmitter {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StateEvent> {
        self.tx.subscribe()
    }

    /// Send an event to subscribers
    pub fn emit(&self, event: StateEvent) {
        // No subscribers is not an error
        let _ = self.tx.send(event);
    }

    pub fn emit_current_desktop_changed(&self, number: u32) {
        self.emit(StateEvent::CurrentDesktopChanged { number });
    }

    pub fn emit_desktop_amount_changed(&self, count: u32) {
        self.emit(StateEvent::DesktopAmountChanged { count });
    }

    pub fn emit_empty_desktops_updated(&self, desktops: Vec<u32>) {
        self.emit(StateEvent::EmptyDesktopsUpdated { desktops });
    }

    pub fn emit_desktop_names_changed(&self) {
        self.emit(StateEvent::DesktopNamesChanged);
    }

    pub fn emit_desktop_remove_requested(&self, number: u32) {
        self.emit(StateEvent::DesktopRemoveRequested { number });
    }

    pub fn emit_current_desktop_name_change_requested(&self) {
        self.emit(StateEvent::CurrentDesktopNameChangeRequested);
    }

    pub fn emit_action_invoked(&self, name: &str) {
        self.emit(StateEvent::ActionInvoked {
            name: name.to_string(),
        });
    }
}

/// Hook invocations are published to the same event stream, so external
/// listeners can bracket desktop mutations the way other components
/// bracket them around global-shortcut signals.
impl ShortcutPort for EventEmitter {
    fn invoke(&self, name: &str) {
        tracing::debug!("Invoking hook: {}", name);
        self.emit_action_invoked(name);
    }
}
