use super::manager::DesktopManager;
use super::{crud, policy};
use crate::platform::{Notification, ShortcutPort, WindowDesktop, WindowId, WindowManagerPort};

/// React to a window manager notification. Each handler performs at
/// most one corrective mutation and returns; the notifications that
/// mutation triggers drive any further convergence.
pub(crate) async fn handle_notification<W: WindowManagerPort, S: ShortcutPort>(
    manager: &mut DesktopManager,
    wm: &W,
    shortcuts: &S,
    notification: Notification,
) {
    match notification {
        Notification::CurrentDesktopChanged { number } => {
            on_current_desktop_changed(manager, number);
        }
        Notification::DesktopCountChanged { count } => {
            on_desktop_count_changed(manager, wm, shortcuts, count).await;
        }
        Notification::DesktopNamesChanged => {
            manager.events.emit_desktop_names_changed();
        }
        Notification::WindowAdded { id } => {
            on_window_added(manager, wm, id);
        }
        Notification::WindowChanged {
            id,
            desktop_changed,
        } => {
            on_window_changed(manager, wm, shortcuts, id, desktop_changed).await;
        }
        Notification::WindowRemoved { id } => {
            on_window_removed(manager, wm, shortcuts, id).await;
        }
    }
}

fn on_current_desktop_changed(manager: &mut DesktopManager, number: u32) {
    if number != manager.current {
        manager.recent = Some(manager.current);
    }
    manager.current = number;
    manager.events.emit_current_desktop_changed(number);
}

async fn on_desktop_count_changed<W: WindowManagerPort, S: ShortcutPort>(
    manager: &mut DesktopManager,
    wm: &W,
    shortcuts: &S,
    count: u32,
) {
    if manager.config.keep_one_empty_desktop {
        let allow_drop = manager.config.drop_redundant_desktops;
        if policy::apply_corrective_action(manager, wm, shortcuts, allow_drop).await {
            return;
        }
    }
    policy::refresh_empty_desktops(manager, wm);
    manager.events.emit_desktop_amount_changed(count);
}

fn on_window_added<W: WindowManagerPort>(manager: &mut DesktopManager, wm: &W, id: WindowId) {
    if !wm.has_window(id) {
        return;
    }
    let Some(details) = wm.window_details(id) else {
        return;
    };
    if details.skip_taskbar {
        return;
    }

    if manager.config.keep_one_empty_desktop && policy::empty_desktops(wm).is_empty() {
        crud::add_new_desktop(manager, wm, false, None);
        return;
    }

    policy::refresh_empty_desktops(manager, wm);
}

async fn on_window_changed<W: WindowManagerPort, S: ShortcutPort>(
    manager: &mut DesktopManager,
    wm: &W,
    shortcuts: &S,
    id: WindowId,
    desktop_changed: bool,
) {
    if !desktop_changed || !wm.has_window(id) {
        return;
    }
    let Some(details) = wm.window_details(id) else {
        return;
    };
    if details.skip_taskbar || manager.is_chrome(&details) {
        return;
    }

    if let WindowDesktop::OnDesktop(desktop) = details.desktop {
        if remove_ignored_move(manager, id, desktop) {
            // One refresh for the whole batch of self-inflicted moves,
            // once the last one has reported back.
            if manager.ignored_moves.is_empty() {
                policy::refresh_empty_desktops(manager, wm);
            }
            return;
        }
    }

    if manager.config.keep_one_empty_desktop {
        let allow_drop = manager.config.drop_redundant_desktops;
        if policy::apply_corrective_action(manager, wm, shortcuts, allow_drop).await {
            return;
        }
    }

    policy::refresh_empty_desktops(manager, wm);
}

async fn on_window_removed<W: WindowManagerPort, S: ShortcutPort>(
    manager: &mut DesktopManager,
    wm: &W,
    shortcuts: &S,
    id: WindowId,
) {
    // Details usually race the unmap and come back empty. When they are
    // still available, chrome and utility windows are filtered out.
    if let Some(details) = wm.window_details(id) {
        if details.skip_taskbar || manager.is_chrome(&details) {
            return;
        }
    }

    if manager.config.keep_one_empty_desktop
        && manager.config.drop_redundant_desktops
        && policy::empty_desktops(wm).len() > 1
    {
        policy::remove_empty_desktops(manager, wm, shortcuts).await;
        return;
    }

    policy::refresh_empty_desktops(manager, wm);
}

/// Consume one matching entry from the self-inflicted move list.
fn remove_ignored_move(manager: &mut DesktopManager, id: WindowId, desktop: u32) -> bool {
    match manager
        .ignored_moves
        .iter()
        .position(|&entry| entry == (id, desktop))
    {
        Some(index) => {
            manager.ignored_moves.remove(index);
            true
        }
        None => false,
    }
}
