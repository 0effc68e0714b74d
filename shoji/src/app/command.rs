use shoji_ipc::{Command, DesktopInfo, Response, StateInfo};

use super::actions::ActionTable;
use crate::core::{DesktopManager, NEW_DESKTOP_COMMAND_DELAY};
use crate::platform::{ShortcutPort, WindowManagerPort};

pub async fn process_command<W: WindowManagerPort, S: ShortcutPort>(
    manager: &mut DesktopManager,
    wm: &W,
    shortcuts: &S,
    actions: &ActionTable,
    cmd: Command,
) -> Response {
    match cmd {
        Command::SwitchToDesktop { number } => {
            manager.switch_to_desktop(wm, number);
            Response::Ok
        }
        Command::SwitchToRecentDesktop => {
            manager.switch_to_recent_desktop(wm);
            Response::Ok
        }
        Command::AddDesktop { name } => {
            if let Some(command) = manager.add_new_desktop(wm, true, name.as_deref()) {
                spawn_new_desktop_command(command);
            }
            Response::Ok
        }
        Command::RemoveDesktop { number } => {
            if number < 1 || number > wm.desktop_count() {
                return Response::Error {
                    message: format!("No such desktop: {}", number),
                };
            }
            manager.remove_desktop(wm, number);
            Response::Ok
        }
        Command::RemoveCurrentDesktop => {
            manager.remove_current_desktop(wm, shortcuts).await;
            Response::Ok
        }
        Command::RemoveLastDesktop => {
            manager.remove_last_desktop(wm, shortcuts).await;
            Response::Ok
        }
        Command::RemoveEmptyDesktops => {
            manager.remove_empty_desktops(wm, shortcuts).await;
            Response::Ok
        }
        Command::RenameDesktop { number, name } => {
            if number < 1 || number > wm.desktop_count() {
                return Response::Error {
                    message: format!("No such desktop: {}", number),
                };
            }
            manager.rename_desktop(wm, number, &name);
            Response::Ok
        }
        Command::RenameCurrentDesktop { name } => {
            manager.rename_current_desktop(wm, &name);
            Response::Ok
        }
        Command::RequestCurrentDesktopNameChange => {
            manager.request_current_desktop_name_change();
            Response::Ok
        }
        Command::SwapDesktops { first, second } => {
            manager.swap_desktops(wm, first, second);
            Response::Ok
        }
        Command::MoveDesktop { number, step } => {
            manager.move_desktop(wm, number, step);
            Response::Ok
        }
        Command::MoveCurrentDesktopLeft => {
            manager.move_current_desktop_left(wm, shortcuts).await;
            Response::Ok
        }
        Command::MoveCurrentDesktopRight => {
            manager.move_current_desktop_right(wm, shortcuts).await;
            Response::Ok
        }
        Command::InvokeAction { name } => match actions.resolve(&name) {
            Some(resolved) => {
                // Recursion through a boxed future keeps the size finite.
                Box::pin(process_command(manager, wm, shortcuts, actions, resolved)).await
            }
            None => Response::Error {
                message: format!("Unknown action: {}", name),
            },
        },
        Command::ListActions => Response::Actions {
            actions: actions.list(),
        },
        Command::SetKeepOneEmptyDesktop { value } => {
            manager.set_keep_one_empty_desktop(wm, shortcuts, value).await;
            Response::Ok
        }
        Command::SetDropRedundantDesktops { value } => {
            manager.set_drop_redundant_desktops(wm, shortcuts, value).await;
            Response::Ok
        }
        Command::SetEmptyDesktopName { name } => {
            manager.set_empty_desktop_name(wm, name);
            Response::Ok
        }
        Command::SetNewDesktopCommand { command } => {
            manager.set_new_desktop_command(command);
            Response::Ok
        }
        Command::ListDesktops => Response::Desktops {
            desktops: list_desktops(manager, wm),
        },
        Command::GetState => Response::State {
            state: StateInfo {
                desktop_count: wm.desktop_count(),
                current_desktop: manager.current_desktop(),
                recent_desktop: manager.recent_desktop(),
                empty_desktops: manager.empty_desktops(wm),
            },
        },
        // The IPC layer answers subscriptions on the connection that
        // sent them; none reach the state loop.
        Command::Subscribe { .. } => Response::Error {
            message: "Subscribe is only valid on a client connection".to_string(),
        },
        Command::Quit => {
            tracing::info!("Quit command received");
            Response::Ok
        }
    }
}

fn list_desktops<W: WindowManagerPort>(
    manager: &DesktopManager,
    wm: &W,
) -> Vec<DesktopInfo> {
    let empty = manager.empty_desktops(wm);
    (1..=wm.desktop_count())
        .map(|number| DesktopInfo {
            number,
            name: wm.desktop_name(number),
            is_current: number == manager.current_desktop(),
            is_empty: empty.contains(&number),
        })
        .collect()
}

/// Run the configured new-desktop command through the shell, detached,
/// after a short grace period.
fn spawn_new_desktop_command(command: String) {
    tokio::spawn(async move {
        tokio::time::sleep(NEW_DESKTOP_COMMAND_DELAY).await;
        match tokio::process::Command::new("/bin/sh")
            .arg("-c")
            .arg(&command)
            .spawn()
        {
            Ok(_) => tracing::debug!("Spawned new desktop command: {}", command),
            Err(e) => tracing::warn!("Failed to spawn new desktop command: {}", e),
        }
    });
}
