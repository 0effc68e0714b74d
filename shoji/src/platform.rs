use anyhow::Result;

pub type WindowId = u32;

/// Where a window lives in the desktop sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowDesktop {
    /// A concrete 1-based desktop number.
    OnDesktop(u32),
    /// Pinned to all desktops.
    All,
}

/// The subset of window properties the desktop policy cares about.
#[derive(Debug, Clone)]
pub struct WindowDetails {
    pub desktop: WindowDesktop,
    pub skip_taskbar: bool,
    pub window_class: String,
    pub name: String,
}

/// Change notifications pushed by the window manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    CurrentDesktopChanged { number: u32 },
    DesktopCountChanged { count: u32 },
    DesktopNamesChanged,
    WindowAdded { id: WindowId },
    WindowChanged { id: WindowId, desktop_changed: bool },
    WindowRemoved { id: WindowId },
}

/// Trait for reading and mutating the window manager's desktop state.
/// Desktop numbers are 1-based everywhere on this interface; callers
/// never pass 0, and implementations must not panic if one does.
/// This abstraction allows mocking in tests.
pub trait WindowManagerPort {
    fn desktop_count(&self) -> u32;
    fn set_desktop_count(&self, count: u32);
    fn desktop_name(&self, number: u32) -> String;
    fn set_desktop_name(&self, number: u32, name: &str);
    /// Rename through the window manager's stable desktop ids, where
    /// supported. Callers treat failure as "feature unsupported".
    fn set_desktop_name_by_id(&self, number: u32, name: &str) -> Result<()>;
    fn current_desktop(&self) -> u32;
    fn set_current_desktop(&self, number: u32);
    /// Managed windows in stacking order.
    fn stacking_order(&self) -> Vec<WindowId>;
    /// All managed windows, regardless of stacking.
    fn all_windows(&self) -> Vec<WindowId>;
    fn window_details(&self, id: WindowId) -> Option<WindowDetails>;
    fn set_window_desktop(&self, id: WindowId, number: u32);
    fn has_window(&self, id: WindowId) -> bool;
}

/// Trait for programmatically invoking a named shortcut, used to signal
/// the before/after lifecycle hooks around desktop mutations.
/// This abstraction allows mocking in tests.
pub trait ShortcutPort {
    fn invoke(&self, name: &str);
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::cell::RefCell;
    use std::collections::BTreeMap;

    #[derive(Debug, Clone)]
    pub struct MockWindow {
        pub desktop: WindowDesktop,
        pub skip_taskbar: bool,
        pub window_class: String,
        pub name: String,
    }

    impl MockWindow {
        pub fn on_desktop(desktop: u32) -> Self {
            Self {
                desktop: WindowDesktop::OnDesktop(desktop),
                skip_taskbar: false,
                window_class: "app".to_string(),
                name: "App Window".to_string(),
            }
        }

        pub fn pinned() -> Self {
            Self {
                desktop: WindowDesktop::All,
                ..Self::on_desktop(1)
            }
        }

        pub fn skip_taskbar(mut self) -> Self {
            self.skip_taskbar = true;
            self
        }

        pub fn with_class(mut self, window_class: &str, name: &str) -> Self {
            self.window_class = window_class.to_string();
            self.name = name.to_string();
            self
        }
    }

    #[derive(Default)]
    struct WmState {
        desktop_count: u32,
        current: u32,
        names: BTreeMap<u32, String>,
        windows: BTreeMap<WindowId, MockWindow>,
        notifications: Vec<Notification>,
        id_renames: Vec<(u32, String)>,
        name_sync_supported: bool,
    }

    /// In-memory window manager double. Mutations behave like a real
    /// window manager: they update the fake state and queue the
    /// notification a real one would send asynchronously, which tests
    /// pump into the manager by hand via `take_notifications`.
    pub struct MockWindowManager {
        state: RefCell<WmState>,
    }

    impl MockWindowManager {
        pub fn new(desktop_count: u32) -> Self {
            Self {
                state: RefCell::new(WmState {
                    desktop_count,
                    current: 1,
                    name_sync_supported: true,
                    ..Default::default()
                }),
            }
        }

        pub fn with_current(self, number: u32) -> Self {
            self.state.borrow_mut().current = number;
            self
        }

        pub fn with_names(self, names: &[&str]) -> Self {
            {
                let mut state = self.state.borrow_mut();
                for (i, name) in names.iter().enumerate() {
                    state.names.insert(i as u32 + 1, name.to_string());
                }
            }
            self
        }

        pub fn without_name_sync(self) -> Self {
            self.state.borrow_mut().name_sync_supported = false;
            self
        }

        /// Map a new window and queue the WindowAdded notification.
        pub fn add_window(&self, id: WindowId, window: MockWindow) {
            let mut state = self.state.borrow_mut();
            state.windows.insert(id, window);
            state.notifications.push(Notification::WindowAdded { id });
        }

        /// Unmap a window. Details are gone afterwards, as with a real
        /// window manager where the lookup races the notification.
        pub fn remove_window(&self, id: WindowId) {
            let mut state = self.state.borrow_mut();
            state.windows.remove(&id);
            state.notifications.push(Notification::WindowRemoved { id });
        }

        pub fn take_notifications(&self) -> Vec<Notification> {
            std::mem::take(&mut self.state.borrow_mut().notifications)
        }

        pub fn window_desktop(&self, id: WindowId) -> Option<WindowDesktop> {
            self.state.borrow().windows.get(&id).map(|w| w.desktop)
        }

        pub fn names(&self) -> Vec<String> {
            let state = self.state.borrow();
            (1..=state.desktop_count)
                .map(|n| state.names.get(&n).cloned().unwrap_or_default())
                .collect()
        }

        pub fn id_renames(&self) -> Vec<(u32, String)> {
            self.state.borrow().id_renames.clone()
        }
    }

    impl WindowManagerPort for MockWindowManager {
        fn desktop_count(&self) -> u32 {
            self.state.borrow().desktop_count
        }

        fn set_desktop_count(&self, count: u32) {
            let state = &mut *self.state.borrow_mut();
            state.desktop_count = count;
            state
                .notifications
                .push(Notification::DesktopCountChanged { count });
            // A real window manager reassigns orphans and the current
            // desktop itself when the count shrinks below them.
            for (id, window) in state.windows.iter_mut() {
                if matches!(window.desktop, WindowDesktop::OnDesktop(d) if d > count) {
                    window.desktop = WindowDesktop::OnDesktop(count);
                    state.notifications.push(Notification::WindowChanged {
                        id: *id,
                        desktop_changed: true,
                    });
                }
            }
            if state.current > count {
                state.current = count;
                state
                    .notifications
                    .push(Notification::CurrentDesktopChanged { number: count });
            }
        }

        fn desktop_name(&self, number: u32) -> String {
            self.state
                .borrow()
                .names
                .get(&number)
                .cloned()
                .unwrap_or_default()
        }

        fn set_desktop_name(&self, number: u32, name: &str) {
            let mut state = self.state.borrow_mut();
            state.names.insert(number, name.to_string());
            state.notifications.push(Notification::DesktopNamesChanged);
        }

        fn set_desktop_name_by_id(&self, number: u32, name: &str) -> Result<()> {
            let mut state = self.state.borrow_mut();
            if !state.name_sync_supported {
                anyhow::bail!("desktop ids not exposed");
            }
            state.id_renames.push((number, name.to_string()));
            Ok(())
        }

        fn current_desktop(&self) -> u32 {
            self.state.borrow().current
        }

        fn set_current_desktop(&self, number: u32) {
            let mut state = self.state.borrow_mut();
            if number == state.current {
                return;
            }
            state.current = number;
            state
                .notifications
                .push(Notification::CurrentDesktopChanged { number });
        }

        fn stacking_order(&self) -> Vec<WindowId> {
            self.state.borrow().windows.keys().copied().collect()
        }

        fn all_windows(&self) -> Vec<WindowId> {
            self.state.borrow().windows.keys().copied().collect()
        }

        fn window_details(&self, id: WindowId) -> Option<WindowDetails> {
            self.state.borrow().windows.get(&id).map(|w| WindowDetails {
                desktop: w.desktop,
                skip_taskbar: w.skip_taskbar,
                window_class: w.window_class.clone(),
                name: w.name.clone(),
            })
        }

        fn set_window_desktop(&self, id: WindowId, number: u32) {
            let mut state = self.state.borrow_mut();
            if let Some(window) = state.windows.get_mut(&id) {
                window.desktop = WindowDesktop::OnDesktop(number);
                state.notifications.push(Notification::WindowChanged {
                    id,
                    desktop_changed: true,
                });
            }
        }

        fn has_window(&self, id: WindowId) -> bool {
            self.state.borrow().windows.contains_key(&id)
        }
    }

    /// Records hook invocations for assertions.
    #[derive(Default)]
    pub struct MockShortcuts {
        invoked: RefCell<Vec<String>>,
    }

    impl MockShortcuts {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn invoked(&self) -> Vec<String> {
            self.invoked.borrow().clone()
        }
    }

    impl ShortcutPort for MockShortcuts {
        fn invoke(&self, name: &str) {
            self.invoked.borrow_mut().push(name.to_string());
        }
    }
}
