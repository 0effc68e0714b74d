pub mod actions;
pub mod command;

use anyhow::Result;
use tokio::sync::mpsc;

use shoji_ipc::Command;

use crate::core::{Config, DesktopManager};
use crate::event_emitter::EventEmitter;
use crate::ipc::IpcServer;
use crate::platform::{Notification, WindowManagerPort};
use crate::x11::{NotificationPump, X11WindowManager};

use actions::ActionTable;

pub struct App {}

impl App {
    pub fn run(config: Config) -> Result<()> {
        let wm = X11WindowManager::connect()?;

        // The pump blocks on the X socket, so it gets its own
        // connection and thread; notifications cross into the async
        // loop through an unbounded channel.
        let pump = NotificationPump::connect()?;
        let (notify_tx, notify_rx) = mpsc::unbounded_channel::<Notification>();
        std::thread::spawn(move || {
            if let Err(e) = pump.run(notify_tx) {
                tracing::error!("Notification pump exited: {}", e);
            }
        });

        let rt = tokio::runtime::Runtime::new()?;
        rt.block_on(Self::run_loop(wm, config, notify_rx))
    }

    async fn run_loop(
        wm: X11WindowManager,
        config: Config,
        mut notify_rx: mpsc::UnboundedReceiver<Notification>,
    ) -> Result<()> {
        let events = EventEmitter::new(256);

        // One socket serves commands and event subscriptions alike;
        // subscribers get their snapshot through the same command
        // channel as everyone else.
        let (cmd_tx, mut cmd_rx) = mpsc::channel(256);
        let ipc_server = IpcServer::new(cmd_tx, events.clone());
        tokio::spawn(async move {
            if let Err(e) = ipc_server.run().await {
                tracing::error!("IPC server error: {}", e);
            }
        });

        let actions = ActionTable::new();
        let hooks = events.clone();
        let keep_on_start = config.keep_one_empty_desktop;
        let mut manager = DesktopManager::new(&wm, config, events);

        // Apply startup policy and publish the initial empty set.
        if keep_on_start {
            manager.set_keep_one_empty_desktop(&wm, &hooks, true).await;
        }
        manager.refresh_empty_desktops(&wm);

        tracing::info!(
            "Managing {} desktops, current {}",
            wm.desktop_count(),
            manager.current_desktop()
        );

        loop {
            tokio::select! {
                Some((cmd, resp_tx)) = cmd_rx.recv() => {
                    let quit = matches!(cmd, Command::Quit);
                    let response =
                        command::process_command(&mut manager, &wm, &hooks, &actions, cmd).await;
                    let _ = resp_tx.send(response).await;
                    if quit {
                        break;
                    }
                }
                Some(notification) = notify_rx.recv() => {
                    manager.handle_notification(&wm, &hooks, notification).await;
                }
                else => break,
            }
        }

        tracing::info!("shoji exiting");
        Ok(())
    }
}
