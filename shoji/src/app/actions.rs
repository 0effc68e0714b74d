use shoji_ipc::{ActionInfo, Command};

/// The named actions exposed for global-shortcut style invocation.
/// Each resolves to a regular command, so a hotkey daemon only needs
/// `shoji invoke-action <name>`.
pub struct ActionTable {
    entries: Vec<(&'static str, Command)>,
}

impl ActionTable {
    pub fn new() -> Self {
        Self {
            entries: vec![
                ("switch-to-recent-desktop", Command::SwitchToRecentDesktop),
                ("add-new-desktop", Command::AddDesktop { name: None }),
                ("remove-last-desktop", Command::RemoveLastDesktop),
                ("remove-current-desktop", Command::RemoveCurrentDesktop),
                (
                    "rename-current-desktop",
                    Command::RequestCurrentDesktopNameChange,
                ),
                (
                    "move-current-desktop-to-left",
                    Command::MoveCurrentDesktopLeft,
                ),
                (
                    "move-current-desktop-to-right",
                    Command::MoveCurrentDesktopRight,
                ),
            ],
        }
    }

    pub fn resolve(&self, name: &str) -> Option<Command> {
        self.entries
            .iter()
            .find(|(entry_name, _)| *entry_name == name)
            .map(|(_, cmd)| cmd.clone())
    }

    pub fn list(&self) -> Vec<ActionInfo> {
        self.entries
            .iter()
            .map(|(name, cmd)| ActionInfo {
                name: name.to_string(),
                command: format!("{:?}", cmd),
            })
            .collect()
    }
}

impl Default for ActionTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_known_action() {
        let table = ActionTable::new();
        assert_eq!(
            table.resolve("switch-to-recent-desktop"),
            Some(Command::SwitchToRecentDesktop)
        );
        assert_eq!(
            table.resolve("remove-current-desktop"),
            Some(Command::RemoveCurrentDesktop)
        );
    }

    #[test]
    fn test_resolve_unknown_action() {
        let table = ActionTable::new();
        assert_eq!(table.resolve("explode-desktop"), None);
    }

    #[test]
    fn test_list_covers_all_actions() {
        let table = ActionTable::new();
        let names: Vec<String> = table.list().into_iter().map(|a| a.name).collect();
        assert_eq!(names.len(), 7);
        assert!(names.contains(&"add-new-desktop".to_string()));
        assert!(names.contains(&"move-current-desktop-to-left".to_string()));
    }
}
