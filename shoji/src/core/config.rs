/// Desktop policy settings.
/// Mutable at runtime through the set-* commands; some setters have
/// immediate side effects on the desktop set.
#[derive(Debug, Clone)]
pub struct Config {
    /// Always keep at least one empty desktop around.
    pub keep_one_empty_desktop: bool,
    /// Remove empty desktops beyond the first.
    pub drop_redundant_desktops: bool,
    /// Name applied to every empty desktop. Empty string disables it.
    pub empty_desktop_name: String,
    /// Shell command run shortly after an explicit desktop add.
    /// Empty string disables it.
    pub new_desktop_command: String,
    /// Shell/dock/launcher windows excluded from occupancy bookkeeping.
    pub chrome_rules: Vec<ChromeRule>,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            keep_one_empty_desktop: false,
            drop_redundant_desktops: false,
            empty_desktop_name: String::new(),
            new_desktop_command: String::new(),
            chrome_rules: ChromeRule::default_rules(),
        }
    }
}

/// Matches chrome windows by class, optionally narrowed by window name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChromeRule {
    pub window_class: String,
    pub name: Option<String>,
}

impl ChromeRule {
    pub fn new(window_class: &str, name: Option<&str>) -> Self {
        Self {
            window_class: window_class.to_string(),
            name: name.map(|n| n.to_string()),
        }
    }

    /// Parse a "CLASS" or "CLASS:NAME" spec as given on the command line.
    pub fn parse(spec: &str) -> Self {
        match spec.split_once(':') {
            Some((class, name)) => Self::new(class, Some(name)),
            None => Self::new(spec, None),
        }
    }

    pub fn matches(&self, window_class: &str, name: &str) -> bool {
        self.window_class == window_class
            && self.name.as_deref().map_or(true, |n| n == name)
    }

    /// The well-known shell/dock/launcher windows of a stock KDE-style
    /// desktop. Overridable via --chrome-filter.
    pub fn default_rules() -> Vec<ChromeRule> {
        vec![
            ChromeRule::new("plasmashell", Some("Plasma")),
            ChromeRule::new("latte-dock", Some("Latte Dock")),
            ChromeRule::new("krunner", None),
        ]
    }
}
