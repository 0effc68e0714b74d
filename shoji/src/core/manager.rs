use std::time::Duration;

use super::{crud, notify, policy, Config};
use crate::event_emitter::EventEmitter;
use crate::platform::{
    Notification, ShortcutPort, WindowDetails, WindowId, WindowManagerPort,
};

/// Pause inserted between a guard check and the following removal/move
/// mutation, letting notifications from a prior mutation drain first.
/// A race mitigation, not a correctness guarantee.
pub const SETTLE_DELAY: Duration = Duration::from_millis(100);

/// Delay before running the configured new-desktop command, so the
/// command's own window-creation side effects don't race desktop setup.
pub const NEW_DESKTOP_COMMAND_DELAY: Duration = Duration::from_millis(100);

/// Owns the desktop-lifecycle state machine: current/recent tracking,
/// empty-desktop policy, and the bookkeeping that distinguishes
/// self-inflicted window moves from user-driven ones.
pub struct DesktopManager {
    pub(crate) current: u32,
    pub(crate) recent: Option<u32>,
    pub(crate) config: Config,
    /// Self-inflicted (window, target desktop) moves awaiting their own
    /// change notification. Duplicate pairs are meaningful; matches are
    /// consumed one at a time.
    pub(crate) ignored_moves: Vec<(WindowId, u32)>,
    pub(crate) events: EventEmitter,
}

impl DesktopManager {
    pub fn new<W: WindowManagerPort>(wm: &W, config: Config, events: EventEmitter) -> Self {
        let current = wm.current_desktop();
        Self {
            current,
            recent: Some(current),
            config,
            ignored_moves: Vec::new(),
            events,
        }
    }

    pub fn current_desktop(&self) -> u32 {
        self.current
    }

    pub fn recent_desktop(&self) -> Option<u32> {
        self.recent
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub(crate) fn is_chrome(&self, details: &WindowDetails) -> bool {
        self.config
            .chrome_rules
            .iter()
            .any(|rule| rule.matches(&details.window_class, &details.name))
    }

    // Desktop CRUD - delegated to crud.rs

    pub fn switch_to_desktop<W: WindowManagerPort>(&self, wm: &W, number: u32) {
        crud::switch_to_desktop(wm, number)
    }

    pub fn switch_to_recent_desktop<W: WindowManagerPort>(&self, wm: &W) {
        crud::switch_to_recent_desktop(self, wm)
    }

    /// Returns the new-desktop command to schedule, if one applies.
    pub fn add_new_desktop<W: WindowManagerPort>(
        &self,
        wm: &W,
        guarded: bool,
        name: Option<&str>,
    ) -> Option<String> {
        crud::add_new_desktop(self, wm, guarded, name)
    }

    pub fn remove_desktop<W: WindowManagerPort>(&mut self, wm: &W, number: u32) {
        crud::remove_desktop(self, wm, number)
    }

    pub async fn remove_current_desktop<W: WindowManagerPort, S: ShortcutPort>(
        &mut self,
        wm: &W,
        shortcuts: &S,
    ) {
        crud::remove_current_desktop(self, wm, shortcuts).await
    }

    pub async fn remove_last_desktop<W: WindowManagerPort, S: ShortcutPort>(
        &mut self,
        wm: &W,
        shortcuts: &S,
    ) {
        crud::remove_last_desktop(self, wm, shortcuts).await
    }

    pub fn rename_desktop<W: WindowManagerPort>(&self, wm: &W, number: u32, name: &str) {
        crud::rename_desktop(wm, number, name)
    }

    pub fn rename_current_desktop<W: WindowManagerPort>(&self, wm: &W, name: &str) {
        crud::rename_desktop(wm, self.current, name)
    }

    pub fn request_current_desktop_name_change(&self) {
        self.events.emit_current_desktop_name_change_requested();
    }

    pub fn swap_desktops<W: WindowManagerPort>(&mut self, wm: &W, first: u32, second: u32) {
        crud::swap_desktops(self, wm, first, second)
    }

    pub fn move_desktop<W: WindowManagerPort>(&mut self, wm: &W, number: u32, step: i32) {
        crud::move_desktop(self, wm, number, step)
    }

    pub async fn move_current_desktop_left<W: WindowManagerPort, S: ShortcutPort>(
        &mut self,
        wm: &W,
        shortcuts: &S,
    ) {
        crud::move_current_desktop_left(self, wm, shortcuts).await
    }

    pub async fn move_current_desktop_right<W: WindowManagerPort, S: ShortcutPort>(
        &mut self,
        wm: &W,
        shortcuts: &S,
    ) {
        crud::move_current_desktop_right(self, wm, shortcuts).await
    }

    // Empty-desktop policy - delegated to policy.rs

    pub fn empty_desktops<W: WindowManagerPort>(&self, wm: &W) -> Vec<u32> {
        policy::empty_desktops(wm)
    }

    pub async fn remove_empty_desktops<W: WindowManagerPort, S: ShortcutPort>(
        &mut self,
        wm: &W,
        shortcuts: &S,
    ) {
        policy::remove_empty_desktops(self, wm, shortcuts).await
    }

    /// Recompute empty desktops, apply the configured empty name, and
    /// publish the result.
    pub fn refresh_empty_desktops<W: WindowManagerPort>(&self, wm: &W) {
        policy::refresh_empty_desktops(self, wm)
    }

    pub async fn set_keep_one_empty_desktop<W: WindowManagerPort, S: ShortcutPort>(
        &mut self,
        wm: &W,
        shortcuts: &S,
        value: bool,
    ) {
        policy::set_keep_one_empty_desktop(self, wm, shortcuts, value).await
    }

    pub async fn set_drop_redundant_desktops<W: WindowManagerPort, S: ShortcutPort>(
        &mut self,
        wm: &W,
        shortcuts: &S,
        value: bool,
    ) {
        policy::set_drop_redundant_desktops(self, wm, shortcuts, value).await
    }

    pub fn set_empty_desktop_name<W: WindowManagerPort>(&mut self, wm: &W, name: String) {
        policy::set_empty_desktop_name(self, wm, name)
    }

    pub fn set_new_desktop_command(&mut self, command: String) {
        self.config.new_desktop_command = command;
    }

    // Window manager notifications - delegated to notify.rs

    pub async fn handle_notification<W: WindowManagerPort, S: ShortcutPort>(
        &mut self,
        wm: &W,
        shortcuts: &S,
        notification: Notification,
    ) {
        notify::handle_notification(self, wm, shortcuts, notification).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::mock::MockWindowManager;

    #[test]
    fn test_new_reads_initial_state() {
        let wm = MockWindowManager::new(3).with_current(2);
        let manager = DesktopManager::new(&wm, Config::new(), EventEmitter::new(16));

        assert_eq!(manager.current_desktop(), 2);
        assert_eq!(manager.recent_desktop(), Some(2));
    }

    #[test]
    fn test_is_chrome_uses_configured_rules() {
        let wm = MockWindowManager::new(1);
        let manager = DesktopManager::new(&wm, Config::new(), EventEmitter::new(16));

        let chrome = WindowDetails {
            desktop: crate::platform::WindowDesktop::OnDesktop(1),
            skip_taskbar: false,
            window_class: "plasmashell".to_string(),
            name: "Plasma".to_string(),
        };
        assert!(manager.is_chrome(&chrome));

        let ordinary = WindowDetails {
            window_class: "konsole".to_string(),
            name: "Konsole".to_string(),
            ..chrome
        };
        assert!(!manager.is_chrome(&ordinary));
    }
}
