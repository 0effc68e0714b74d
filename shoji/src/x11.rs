use std::collections::HashSet;

use anyhow::{Context, Result};
use tokio::sync::mpsc;
use x11rb::connection::Connection;
use x11rb::protocol::xproto::{
    Atom, AtomEnum, ChangeWindowAttributesAux, ClientMessageEvent, ConnectionExt, EventMask,
    PropMode, Window,
};
use x11rb::protocol::Event;
use x11rb::rust_connection::RustConnection;
use x11rb::wrapper::ConnectionExt as _;
use x11rb::CURRENT_TIME;

use crate::platform::{Notification, WindowDesktop, WindowDetails, WindowId, WindowManagerPort};

/// _NET_WM_DESKTOP value for windows pinned to all desktops.
const ALL_DESKTOPS: u32 = 0xFFFF_FFFF;
/// EWMH source indication: request comes from a pager-like tool.
const SOURCE_PAGER: u32 = 2;

x11rb::atom_manager! {
    pub Atoms: AtomsCookie {
        _NET_NUMBER_OF_DESKTOPS,
        _NET_CURRENT_DESKTOP,
        _NET_DESKTOP_NAMES,
        _NET_CLIENT_LIST,
        _NET_CLIENT_LIST_STACKING,
        _NET_WM_DESKTOP,
        _NET_WM_STATE,
        _NET_WM_STATE_SKIP_TASKBAR,
        _NET_WM_NAME,
        UTF8_STRING,
    }
}

fn read_cardinal(conn: &RustConnection, window: Window, atom: Atom) -> Option<u32> {
    let reply = conn
        .get_property(false, window, atom, AtomEnum::CARDINAL, 0, 1)
        .ok()?
        .reply()
        .ok()?;
    let value = reply.value32()?.next();
    value
}

fn read_window_list(conn: &RustConnection, window: Window, atom: Atom) -> Vec<WindowId> {
    let Ok(cookie) = conn.get_property(false, window, atom, AtomEnum::WINDOW, 0, u32::MAX) else {
        return Vec::new();
    };
    let Ok(reply) = cookie.reply() else {
        return Vec::new();
    };
    let windows = match reply.value32() {
        Some(values) => values.collect(),
        None => Vec::new(),
    };
    windows
}

fn read_string(conn: &RustConnection, window: Window, atom: Atom, type_: Atom) -> Option<String> {
    let reply = conn
        .get_property(false, window, atom, type_, 0, u32::MAX)
        .ok()?
        .reply()
        .ok()?;
    if reply.value.is_empty() {
        return None;
    }
    Some(String::from_utf8_lossy(&reply.value).into_owned())
}

/// 1-based port number to 0-based wire value. The port contract never
/// passes 0, but an underflow here must not be possible.
fn to_wire(number: u32) -> u32 {
    number.saturating_sub(1)
}

/// EWMH-speaking desktop adapter. Desktop numbers are 1-based on the
/// port and 0-based on the wire.
pub struct X11WindowManager {
    conn: RustConnection,
    root: Window,
    atoms: Atoms,
}

impl X11WindowManager {
    pub fn connect() -> Result<Self> {
        let (conn, screen_num) = x11rb::connect(None).context("Failed to connect to X server")?;
        let root = conn.setup().roots[screen_num].root;
        let atoms = Atoms::new(&conn)
            .context("Failed to request atoms")?
            .reply()
            .context("Failed to intern atoms")?;
        tracing::info!("Connected to X server, root window {}", root);
        Ok(Self { conn, root, atoms })
    }

    fn desktop_names(&self) -> Vec<String> {
        let Ok(cookie) = self.conn.get_property(
            false,
            self.root,
            self.atoms._NET_DESKTOP_NAMES,
            self.atoms.UTF8_STRING,
            0,
            u32::MAX,
        ) else {
            return Vec::new();
        };
        let Ok(reply) = cookie.reply() else {
            return Vec::new();
        };
        let mut names: Vec<String> = reply
            .value
            .split(|&b| b == 0)
            .map(|chunk| String::from_utf8_lossy(chunk).into_owned())
            .collect();
        // The property is NUL-terminated, leaving a trailing empty entry.
        if names.last().is_some_and(|name| name.is_empty()) {
            names.pop();
        }
        names
    }

    fn set_desktop_names(&self, names: &[String]) {
        let mut bytes = Vec::new();
        for name in names {
            bytes.extend_from_slice(name.as_bytes());
            bytes.push(0);
        }
        let result = self
            .conn
            .change_property8(
                PropMode::REPLACE,
                self.root,
                self.atoms._NET_DESKTOP_NAMES,
                self.atoms.UTF8_STRING,
                &bytes,
            )
            .and_then(|_| self.conn.flush());
        if let Err(e) = result {
            tracing::warn!("Failed to set desktop names: {}", e);
        }
    }

    /// Ask the window manager for a change via a root client message,
    /// the way pagers do.
    fn send_root_message(&self, window: Window, type_: Atom, data: [u32; 5]) {
        let event = ClientMessageEvent::new(32, window, type_, data);
        let result = self
            .conn
            .send_event(
                false,
                self.root,
                EventMask::SUBSTRUCTURE_NOTIFY | EventMask::SUBSTRUCTURE_REDIRECT,
                event,
            )
            .and_then(|_| self.conn.flush());
        if let Err(e) = result {
            tracing::warn!("Failed to send client message: {}", e);
        }
    }
}

impl WindowManagerPort for X11WindowManager {
    fn desktop_count(&self) -> u32 {
        read_cardinal(&self.conn, self.root, self.atoms._NET_NUMBER_OF_DESKTOPS)
            .unwrap_or(1)
            .max(1)
    }

    fn set_desktop_count(&self, count: u32) {
        self.send_root_message(
            self.root,
            self.atoms._NET_NUMBER_OF_DESKTOPS,
            [count, 0, 0, 0, 0],
        );
    }

    fn desktop_name(&self, number: u32) -> String {
        self.desktop_names()
            .into_iter()
            .nth(to_wire(number) as usize)
            .unwrap_or_default()
    }

    fn set_desktop_name(&self, number: u32, name: &str) {
        let slot = to_wire(number) as usize;
        let mut names = self.desktop_names();
        if names.len() <= slot {
            names.resize(slot + 1, String::new());
        }
        names[slot] = name.to_string();
        self.set_desktop_names(&names);
    }

    fn set_desktop_name_by_id(&self, _number: u32, _name: &str) -> Result<()> {
        // EWMH has no stable desktop identifiers; the positional rename
        // already covers everything this backend can express.
        Ok(())
    }

    fn current_desktop(&self) -> u32 {
        read_cardinal(&self.conn, self.root, self.atoms._NET_CURRENT_DESKTOP)
            .map(|d| d + 1)
            .unwrap_or(1)
    }

    fn set_current_desktop(&self, number: u32) {
        self.send_root_message(
            self.root,
            self.atoms._NET_CURRENT_DESKTOP,
            [to_wire(number), CURRENT_TIME, 0, 0, 0],
        );
    }

    fn stacking_order(&self) -> Vec<WindowId> {
        read_window_list(&self.conn, self.root, self.atoms._NET_CLIENT_LIST_STACKING)
    }

    fn all_windows(&self) -> Vec<WindowId> {
        read_window_list(&self.conn, self.root, self.atoms._NET_CLIENT_LIST)
    }

    fn window_details(&self, id: WindowId) -> Option<WindowDetails> {
        let desktop = match read_cardinal(&self.conn, id, self.atoms._NET_WM_DESKTOP)? {
            ALL_DESKTOPS => WindowDesktop::All,
            d => WindowDesktop::OnDesktop(d + 1),
        };

        let skip_taskbar = self
            .conn
            .get_property(false, id, self.atoms._NET_WM_STATE, AtomEnum::ATOM, 0, u32::MAX)
            .ok()
            .and_then(|cookie| cookie.reply().ok())
            .and_then(|reply| {
                reply
                    .value32()
                    .map(|mut atoms| atoms.any(|a| a == self.atoms._NET_WM_STATE_SKIP_TASKBAR))
            })
            .unwrap_or(false);

        // WM_CLASS holds instance and class, NUL-separated.
        let window_class = read_string(
            &self.conn,
            id,
            AtomEnum::WM_CLASS.into(),
            AtomEnum::STRING.into(),
        )
        .map(|raw| {
            raw.split('\0')
                .next()
                .unwrap_or_default()
                .to_string()
        })
        .unwrap_or_default();

        let name = read_string(&self.conn, id, self.atoms._NET_WM_NAME, self.atoms.UTF8_STRING)
            .or_else(|| {
                read_string(
                    &self.conn,
                    id,
                    AtomEnum::WM_NAME.into(),
                    AtomEnum::STRING.into(),
                )
            })
            .unwrap_or_default();

        Some(WindowDetails {
            desktop,
            skip_taskbar,
            window_class,
            name,
        })
    }

    fn set_window_desktop(&self, id: WindowId, number: u32) {
        self.send_root_message(
            id,
            self.atoms._NET_WM_DESKTOP,
            [to_wire(number), SOURCE_PAGER, 0, 0, 0],
        );
    }

    fn has_window(&self, id: WindowId) -> bool {
        self.all_windows().contains(&id)
    }
}

/// Blocking X event loop that translates property changes into port
/// notifications. Runs on its own connection and thread so the async
/// side never waits on the X socket.
pub struct NotificationPump {
    conn: RustConnection,
    root: Window,
    atoms: Atoms,
    clients: HashSet<WindowId>,
}

impl NotificationPump {
    pub fn connect() -> Result<Self> {
        let (conn, screen_num) = x11rb::connect(None).context("Failed to connect to X server")?;
        let root = conn.setup().roots[screen_num].root;
        let atoms = Atoms::new(&conn)
            .context("Failed to request atoms")?
            .reply()
            .context("Failed to intern atoms")?;
        Ok(Self {
            conn,
            root,
            atoms,
            clients: HashSet::new(),
        })
    }

    pub fn run(mut self, tx: mpsc::UnboundedSender<Notification>) -> Result<()> {
        let aux = ChangeWindowAttributesAux::new().event_mask(EventMask::PROPERTY_CHANGE);
        self.conn
            .change_window_attributes(self.root, &aux)?
            .check()
            .context("Failed to select root property events")?;

        self.clients = read_window_list(&self.conn, self.root, self.atoms._NET_CLIENT_LIST)
            .into_iter()
            .collect();
        for &id in &self.clients {
            watch_client(&self.conn, id);
        }
        self.conn.flush()?;

        tracing::info!("Watching {} windows", self.clients.len());

        loop {
            let event = self.conn.wait_for_event()?;
            if let Event::PropertyNotify(ev) = event {
                if ev.window == self.root {
                    self.on_root_property(ev.atom, &tx)?;
                } else {
                    self.on_client_property(ev.window, ev.atom, &tx)?;
                }
            }
        }
    }

    fn on_root_property(&mut self, atom: Atom, tx: &mpsc::UnboundedSender<Notification>) -> Result<()> {
        if atom == self.atoms._NET_CURRENT_DESKTOP {
            if let Some(d) = read_cardinal(&self.conn, self.root, atom) {
                forward(tx, Notification::CurrentDesktopChanged { number: d + 1 })?;
            }
        } else if atom == self.atoms._NET_NUMBER_OF_DESKTOPS {
            if let Some(count) = read_cardinal(&self.conn, self.root, atom) {
                forward(tx, Notification::DesktopCountChanged { count })?;
            }
        } else if atom == self.atoms._NET_DESKTOP_NAMES {
            forward(tx, Notification::DesktopNamesChanged)?;
        } else if atom == self.atoms._NET_CLIENT_LIST {
            let current: HashSet<WindowId> =
                read_window_list(&self.conn, self.root, self.atoms._NET_CLIENT_LIST)
                    .into_iter()
                    .collect();

            let added: Vec<WindowId> = current.difference(&self.clients).copied().collect();
            let removed: Vec<WindowId> = self.clients.difference(&current).copied().collect();
            self.clients = current;

            for &id in &added {
                watch_client(&self.conn, id);
            }
            self.conn.flush()?;

            for id in added {
                forward(tx, Notification::WindowAdded { id })?;
            }
            for id in removed {
                forward(tx, Notification::WindowRemoved { id })?;
            }
        }
        Ok(())
    }

    fn on_client_property(
        &self,
        id: WindowId,
        atom: Atom,
        tx: &mpsc::UnboundedSender<Notification>,
    ) -> Result<()> {
        if atom == self.atoms._NET_WM_DESKTOP {
            forward(
                tx,
                Notification::WindowChanged {
                    id,
                    desktop_changed: true,
                },
            )?;
        } else if atom == self.atoms._NET_WM_STATE {
            forward(
                tx,
                Notification::WindowChanged {
                    id,
                    desktop_changed: false,
                },
            )?;
        }
        Ok(())
    }
}

fn watch_client(conn: &RustConnection, id: WindowId) {
    let aux = ChangeWindowAttributesAux::new().event_mask(EventMask::PROPERTY_CHANGE);
    // The window may be gone already; that's fine.
    if let Err(e) = conn.change_window_attributes(id, &aux) {
        tracing::debug!("Failed to watch window {}: {}", id, e);
    }
}

fn forward(tx: &mpsc::UnboundedSender<Notification>, notification: Notification) -> Result<()> {
    tx.send(notification)
        .map_err(|_| anyhow::anyhow!("Notification channel closed"))
}

#[cfg(test)]
mod tests {
    use super::to_wire;

    #[test]
    fn test_to_wire_never_underflows() {
        assert_eq!(to_wire(1), 0);
        assert_eq!(to_wire(4), 3);
        assert_eq!(to_wire(0), 0);
    }
}
