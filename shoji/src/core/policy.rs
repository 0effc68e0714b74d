use super::crud;
use super::manager::{DesktopManager, SETTLE_DELAY};
use crate::platform::{ShortcutPort, WindowDesktop, WindowManagerPort};

pub(crate) const HOOK_REMOVE_EMPTY_BEFORE: &str = "remove-empty-desktops:before";
pub(crate) const HOOK_REMOVE_EMPTY_AFTER: &str = "remove-empty-desktops:after";

/// Desktops with no occupying window, ascending. A window occupies its
/// desktop unless it is a skip-taskbar utility window; pinned windows
/// occupy no particular desktop.
pub(crate) fn empty_desktops<W: WindowManagerPort>(wm: &W) -> Vec<u32> {
    let mut empty: Vec<u32> = (1..=wm.desktop_count()).collect();

    for id in wm.all_windows() {
        if !wm.has_window(id) {
            continue;
        }
        let Some(details) = wm.window_details(id) else {
            continue;
        };
        if details.skip_taskbar {
            continue;
        }
        if let WindowDesktop::OnDesktop(desktop) = details.desktop {
            empty.retain(|&d| d != desktop);
        }
    }

    empty
}

/// Remove every empty desktop except the lowest-numbered one. Removal
/// goes in descending order so earlier removals don't renumber the
/// desktops still queued.
pub(crate) async fn remove_empty_desktops<W: WindowManagerPort, S: ShortcutPort>(
    manager: &mut DesktopManager,
    wm: &W,
    shortcuts: &S,
) {
    let empty = empty_desktops(wm);
    if empty.len() <= 1 {
        return;
    }

    shortcuts.invoke(HOOK_REMOVE_EMPTY_BEFORE);
    tokio::time::sleep(SETTLE_DELAY).await;

    for &number in empty[1..].iter().rev() {
        crud::remove_desktop(manager, wm, number);
    }

    shortcuts.invoke(HOOK_REMOVE_EMPTY_AFTER);
}

pub(crate) fn rename_empty_desktops<W: WindowManagerPort>(
    manager: &DesktopManager,
    wm: &W,
    desktops: &[u32],
) {
    if manager.config.empty_desktop_name.is_empty() {
        return;
    }
    for &number in desktops {
        crud::rename_desktop(wm, number, &manager.config.empty_desktop_name);
    }
}

pub(crate) fn refresh_empty_desktops<W: WindowManagerPort>(manager: &DesktopManager, wm: &W) {
    let empty = empty_desktops(wm);
    rename_empty_desktops(manager, wm, &empty);
    manager.events.emit_empty_desktops_updated(empty);
}

/// One corrective mutation per pass: add a desktop when none is empty,
/// or drop redundant empties. Returns whether anything was done, in
/// which case the triggered notifications will drive the next pass.
pub(crate) async fn apply_corrective_action<W: WindowManagerPort, S: ShortcutPort>(
    manager: &mut DesktopManager,
    wm: &W,
    shortcuts: &S,
    allow_drop: bool,
) -> bool {
    let empty_count = empty_desktops(wm).len();
    if empty_count == 0 {
        crud::add_new_desktop(manager, wm, false, None);
        return true;
    }
    if empty_count > 1 && allow_drop {
        remove_empty_desktops(manager, wm, shortcuts).await;
        return true;
    }
    false
}

pub(crate) async fn set_keep_one_empty_desktop<W: WindowManagerPort, S: ShortcutPort>(
    manager: &mut DesktopManager,
    wm: &W,
    shortcuts: &S,
    value: bool,
) {
    manager.config.keep_one_empty_desktop = value;
    if !value {
        return;
    }
    if empty_desktops(wm).is_empty() {
        crud::add_new_desktop(manager, wm, false, None);
    } else if manager.config.drop_redundant_desktops {
        remove_empty_desktops(manager, wm, shortcuts).await;
    }
}

pub(crate) async fn set_drop_redundant_desktops<W: WindowManagerPort, S: ShortcutPort>(
    manager: &mut DesktopManager,
    wm: &W,
    shortcuts: &S,
    value: bool,
) {
    manager.config.drop_redundant_desktops = value;
    if manager.config.keep_one_empty_desktop && value {
        remove_empty_desktops(manager, wm, shortcuts).await;
    }
}

pub(crate) fn set_empty_desktop_name<W: WindowManagerPort>(
    manager: &mut DesktopManager,
    wm: &W,
    name: String,
) {
    manager.config.empty_desktop_name = name;
    if !manager.config.empty_desktop_name.is_empty() {
        let empty = empty_desktops(wm);
        rename_empty_desktops(manager, wm, &empty);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Config;
    use crate::event_emitter::EventEmitter;
    use crate::platform::mock::{MockShortcuts, MockWindow, MockWindowManager};
    use shoji_ipc::StateEvent;

    fn manager(wm: &MockWindowManager) -> DesktopManager {
        DesktopManager::new(wm, Config::new(), EventEmitter::new(16))
    }

    #[test]
    fn test_empty_desktops_excludes_occupied() {
        let wm = MockWindowManager::new(4);
        wm.add_window(10, MockWindow::on_desktop(2));
        wm.add_window(11, MockWindow::on_desktop(4));

        assert_eq!(empty_desktops(&wm), vec![1, 3]);
    }

    #[test]
    fn test_empty_desktops_ignores_skip_taskbar_and_pinned() {
        let wm = MockWindowManager::new(3);
        wm.add_window(10, MockWindow::on_desktop(1).skip_taskbar());
        wm.add_window(11, MockWindow::pinned());

        assert_eq!(empty_desktops(&wm), vec![1, 2, 3]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_remove_empty_desktops_keeps_first_empty() {
        let wm = MockWindowManager::new(4).with_names(&["one", "two", "three", "four"]);
        wm.add_window(10, MockWindow::on_desktop(2));
        let shortcuts = MockShortcuts::new();
        let mut mgr = manager(&wm);

        // 1, 3, 4 are empty; 1 survives.
        remove_empty_desktops(&mut mgr, &wm, &shortcuts).await;

        assert_eq!(wm.desktop_count(), 2);
        assert_eq!(wm.names(), ["one", "two"]);
        assert_eq!(
            shortcuts.invoked(),
            [HOOK_REMOVE_EMPTY_BEFORE, HOOK_REMOVE_EMPTY_AFTER]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_remove_empty_desktops_collapses_all_empty_to_one() {
        let wm = MockWindowManager::new(3);
        let shortcuts = MockShortcuts::new();
        let mut mgr = manager(&wm);

        remove_empty_desktops(&mut mgr, &wm, &shortcuts).await;

        assert_eq!(wm.desktop_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_remove_empty_desktops_single_empty_is_noop() {
        let wm = MockWindowManager::new(2);
        wm.add_window(10, MockWindow::on_desktop(1));
        let shortcuts = MockShortcuts::new();
        let mut mgr = manager(&wm);

        remove_empty_desktops(&mut mgr, &wm, &shortcuts).await;

        assert_eq!(wm.desktop_count(), 2);
        assert!(shortcuts.invoked().is_empty());
    }

    #[test]
    fn test_refresh_renames_and_publishes() {
        let wm = MockWindowManager::new(3).with_names(&["one", "two", "three"]);
        wm.add_window(10, MockWindow::on_desktop(2));
        let mut mgr = manager(&wm);
        mgr.config.empty_desktop_name = "Free".to_string();
        let mut rx = mgr.events.subscribe();

        refresh_empty_desktops(&mgr, &wm);

        assert_eq!(wm.names(), ["Free", "two", "Free"]);
        assert_eq!(
            rx.try_recv(),
            Ok(StateEvent::EmptyDesktopsUpdated {
                desktops: vec![1, 3]
            })
        );
    }

    #[test]
    fn test_refresh_without_empty_name_keeps_names() {
        let wm = MockWindowManager::new(2).with_names(&["one", "two"]);
        let mgr = manager(&wm);

        refresh_empty_desktops(&mgr, &wm);

        assert_eq!(wm.names(), ["one", "two"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_enable_keep_one_adds_when_no_empty() {
        let wm = MockWindowManager::new(2);
        wm.add_window(10, MockWindow::on_desktop(1));
        wm.add_window(11, MockWindow::on_desktop(2));
        let shortcuts = MockShortcuts::new();
        let mut mgr = manager(&wm);

        set_keep_one_empty_desktop(&mut mgr, &wm, &shortcuts, true).await;

        assert_eq!(wm.desktop_count(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_enable_keep_one_drops_redundant_when_configured() {
        let wm = MockWindowManager::new(3);
        wm.add_window(10, MockWindow::on_desktop(1));
        let shortcuts = MockShortcuts::new();
        let mut mgr = manager(&wm);
        mgr.config.drop_redundant_desktops = true;

        set_keep_one_empty_desktop(&mut mgr, &wm, &shortcuts, true).await;

        assert_eq!(wm.desktop_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_enable_drop_redundant_collapses_empties() {
        let wm = MockWindowManager::new(4);
        let shortcuts = MockShortcuts::new();
        let mut mgr = manager(&wm);
        mgr.config.keep_one_empty_desktop = true;

        set_drop_redundant_desktops(&mut mgr, &wm, &shortcuts, true).await;

        assert_eq!(wm.desktop_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_redundant_alone_does_nothing() {
        let wm = MockWindowManager::new(4);
        let shortcuts = MockShortcuts::new();
        let mut mgr = manager(&wm);

        set_drop_redundant_desktops(&mut mgr, &wm, &shortcuts, true).await;

        assert_eq!(wm.desktop_count(), 4);
    }

    #[test]
    fn test_set_empty_desktop_name_renames_immediately() {
        let wm = MockWindowManager::new(2).with_names(&["one", "two"]);
        wm.add_window(10, MockWindow::on_desktop(1));
        let mut mgr = manager(&wm);

        set_empty_desktop_name(&mut mgr, &wm, "Free".to_string());

        assert_eq!(wm.names(), ["one", "Free"]);
    }
}
