use super::manager::{DesktopManager, SETTLE_DELAY};
use super::policy;
use crate::platform::{ShortcutPort, WindowDesktop, WindowId, WindowManagerPort};

pub(crate) const HOOK_REMOVE_CURRENT_BEFORE: &str = "remove-current-desktop:before";
pub(crate) const HOOK_REMOVE_CURRENT_AFTER: &str = "remove-current-desktop:after";
pub(crate) const HOOK_REMOVE_LAST_BEFORE: &str = "remove-last-desktop:before";
pub(crate) const HOOK_REMOVE_LAST_AFTER: &str = "remove-last-desktop:after";
pub(crate) const HOOK_MOVE_LEFT_BEFORE: &str = "move-current-desktop-to-left:before";
pub(crate) const HOOK_MOVE_LEFT_AFTER: &str = "move-current-desktop-to-left:after";
pub(crate) const HOOK_MOVE_RIGHT_BEFORE: &str = "move-current-desktop-to-right:before";
pub(crate) const HOOK_MOVE_RIGHT_AFTER: &str = "move-current-desktop-to-right:after";

/// Windows assigned to exactly `number`, in stacking order. Pinned
/// windows never qualify.
pub(crate) fn windows_on_desktop<W: WindowManagerPort>(wm: &W, number: u32) -> Vec<WindowId> {
    windows_matching(wm, |d| d == number)
}

/// Windows on any desktop greater than `number`, paired with their
/// desktop, in stacking order.
pub(crate) fn windows_above<W: WindowManagerPort>(wm: &W, number: u32) -> Vec<(WindowId, u32)> {
    wm.stacking_order()
        .into_iter()
        .filter(|&id| wm.has_window(id))
        .filter_map(|id| {
            let details = wm.window_details(id)?;
            match details.desktop {
                WindowDesktop::OnDesktop(d) if d > number => Some((id, d)),
                _ => None,
            }
        })
        .collect()
}

fn windows_matching<W, F>(wm: &W, pred: F) -> Vec<WindowId>
where
    W: WindowManagerPort,
    F: Fn(u32) -> bool,
{
    wm.stacking_order()
        .into_iter()
        .filter(|&id| wm.has_window(id))
        .filter(|&id| {
            matches!(
                wm.window_details(id).map(|d| d.desktop),
                Some(WindowDesktop::OnDesktop(d)) if pred(d)
            )
        })
        .collect()
}

pub(crate) fn switch_to_desktop<W: WindowManagerPort>(wm: &W, number: u32) {
    if number < 1 || number > wm.desktop_count() {
        return;
    }
    wm.set_current_desktop(number);
}

pub(crate) fn switch_to_recent_desktop<W: WindowManagerPort>(manager: &DesktopManager, wm: &W) {
    if let Some(recent) = manager.recent {
        switch_to_desktop(wm, recent);
    }
}

/// Append a desktop. `guarded` marks user-initiated adds, which respect
/// the redundant-desktop policy and may schedule the new-desktop
/// command; internal corrective adds pass false.
pub(crate) fn add_new_desktop<W: WindowManagerPort>(
    manager: &DesktopManager,
    wm: &W,
    guarded: bool,
    name: Option<&str>,
) -> Option<String> {
    let config = &manager.config;
    if guarded && config.keep_one_empty_desktop && config.drop_redundant_desktops {
        // The policy would drop the new desktop right back off.
        return None;
    }

    let count = wm.desktop_count();
    wm.set_desktop_count(count + 1);
    tracing::debug!("Added desktop {}", count + 1);

    if let Some(name) = name {
        if !name.is_empty() {
            rename_desktop(wm, count + 1, name);
        }
    }

    if guarded && !config.drop_redundant_desktops && !config.new_desktop_command.is_empty() {
        return Some(config.new_desktop_command.clone());
    }
    None
}

pub(crate) fn can_remove_desktop<W: WindowManagerPort>(
    manager: &DesktopManager,
    wm: &W,
    number: u32,
) -> bool {
    if wm.desktop_count() == 1 {
        return false;
    }
    if manager.config.keep_one_empty_desktop {
        let empty = policy::empty_desktops(wm);
        if empty == [number] {
            return false;
        }
    }
    true
}

pub(crate) fn remove_desktop<W: WindowManagerPort>(
    manager: &mut DesktopManager,
    wm: &W,
    number: u32,
) {
    let count = wm.desktop_count();
    if count == 1 || number < 1 || number > count {
        return;
    }

    // Announced before any mutation so listeners can release resources
    // bound to the doomed desktop.
    manager.events.emit_desktop_remove_requested(number);

    if number != count {
        // Close the gap: every window above the removed desktop slides
        // down one. Each move is recorded so its change notification is
        // swallowed instead of triggering policy reactions.
        for (id, desktop) in windows_above(wm, number) {
            manager.ignored_moves.push((id, desktop - 1));
            wm.set_window_desktop(id, desktop - 1);
        }

        let names: Vec<String> = (1..=count).map(|n| wm.desktop_name(n)).collect();
        for n in number..count {
            rename_desktop(wm, n, &names[n as usize]);
        }
    }

    if number == count && manager.current == number {
        // The desktop under our feet is going away. Prefer the recent
        // desktop, otherwise the new last one.
        manager.current = match manager.recent {
            Some(recent) if recent != number => recent,
            _ => count - 1,
        };
    }

    match manager.recent {
        Some(recent) if recent == number => manager.recent = None,
        Some(recent) if recent > number => manager.recent = Some(recent - 1),
        _ => {}
    }

    wm.set_desktop_count(count - 1);
    tracing::debug!("Removed desktop {}", number);
}

pub(crate) async fn remove_current_desktop<W: WindowManagerPort, S: ShortcutPort>(
    manager: &mut DesktopManager,
    wm: &W,
    shortcuts: &S,
) {
    if manager.current == wm.desktop_count() {
        remove_last_desktop(manager, wm, shortcuts).await;
        return;
    }
    if can_remove_desktop(manager, wm, manager.current) {
        shortcuts.invoke(HOOK_REMOVE_CURRENT_BEFORE);
        tokio::time::sleep(SETTLE_DELAY).await;
        remove_desktop(manager, wm, manager.current);
        shortcuts.invoke(HOOK_REMOVE_CURRENT_AFTER);
    }
}

pub(crate) async fn remove_last_desktop<W: WindowManagerPort, S: ShortcutPort>(
    manager: &mut DesktopManager,
    wm: &W,
    shortcuts: &S,
) {
    if can_remove_desktop(manager, wm, wm.desktop_count()) {
        shortcuts.invoke(HOOK_REMOVE_LAST_BEFORE);
        tokio::time::sleep(SETTLE_DELAY).await;
        // Re-read: the count may have shifted while we slept.
        let last = wm.desktop_count();
        remove_desktop(manager, wm, last);
        shortcuts.invoke(HOOK_REMOVE_LAST_AFTER);
    }
}

/// Renames through both channels: the standard desktop-names property
/// and, where the window manager exposes stable desktop ids, through
/// those as well so the rename survives desktop reordering.
pub(crate) fn rename_desktop<W: WindowManagerPort>(wm: &W, number: u32, name: &str) {
    wm.set_desktop_name(number, name);
    if let Err(err) = wm.set_desktop_name_by_id(number, name) {
        tracing::debug!("Id-based rename unsupported: {}", err);
    }
}

pub(crate) fn swap_desktops<W: WindowManagerPort>(
    manager: &mut DesktopManager,
    wm: &W,
    first: u32,
    second: u32,
) {
    if first == second {
        return;
    }
    let count = wm.desktop_count();
    if first < 1 || first > count || second < 1 || second > count {
        return;
    }

    // Capture both sides before moving anything, or the second capture
    // would pick up windows just moved onto it.
    let windows_from_first = windows_on_desktop(wm, first);
    let windows_from_second = windows_on_desktop(wm, second);

    for id in windows_from_first {
        manager.ignored_moves.push((id, second));
        wm.set_window_desktop(id, second);
    }
    for id in windows_from_second {
        manager.ignored_moves.push((id, first));
        wm.set_window_desktop(id, first);
    }

    let first_name = wm.desktop_name(first);
    let second_name = wm.desktop_name(second);
    rename_desktop(wm, first, &second_name);
    rename_desktop(wm, second, &first_name);

    if manager.current == first {
        manager.current = second;
    } else if manager.current == second {
        manager.current = first;
    }

    if manager.recent == Some(first) {
        manager.recent = Some(second);
    } else if manager.recent == Some(second) {
        manager.recent = Some(first);
    }
}

/// Move a desktop by `step` positions as a walk of adjacent swaps, so
/// every desktop in between shifts by one.
pub(crate) fn move_desktop<W: WindowManagerPort>(
    manager: &mut DesktopManager,
    wm: &W,
    number: u32,
    step: i32,
) {
    let target = i64::from(number) + i64::from(step);
    if target < 1 || target > i64::from(wm.desktop_count()) {
        return;
    }
    let target = target as u32;

    let mut position = number;
    while position != target {
        let next = if target > number {
            position + 1
        } else {
            position - 1
        };
        swap_desktops(manager, wm, position, next);
        position = next;
    }
}

pub(crate) async fn move_current_desktop_left<W: WindowManagerPort, S: ShortcutPort>(
    manager: &mut DesktopManager,
    wm: &W,
    shortcuts: &S,
) {
    if manager.current == 1 {
        return;
    }
    shortcuts.invoke(HOOK_MOVE_LEFT_BEFORE);
    tokio::time::sleep(SETTLE_DELAY).await;
    move_desktop(manager, wm, manager.current, -1);
    // The swaps updated `current` in place; follow it.
    switch_to_desktop(wm, manager.current);
    shortcuts.invoke(HOOK_MOVE_LEFT_AFTER);
}

pub(crate) async fn move_current_desktop_right<W: WindowManagerPort, S: ShortcutPort>(
    manager: &mut DesktopManager,
    wm: &W,
    shortcuts: &S,
) {
    if manager.current == wm.desktop_count() {
        return;
    }
    shortcuts.invoke(HOOK_MOVE_RIGHT_BEFORE);
    tokio::time::sleep(SETTLE_DELAY).await;
    move_desktop(manager, wm, manager.current, 1);
    switch_to_desktop(wm, manager.current);
    shortcuts.invoke(HOOK_MOVE_RIGHT_AFTER);
}
