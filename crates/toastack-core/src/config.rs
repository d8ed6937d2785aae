use serde::Deserialize;
use std::io;
use std::path::{Path, PathBuf};
use toml_edit::DocumentMut;

use crate::heights::DEFAULT_TOAST_HEIGHT;
use crate::models::EntryEdge;

/// Return XDG_DATA_HOME/toastack.
/// The `dirs` crate returns ~/Library/Application Support on macOS,
/// so we construct ~/.local/share directly for XDG compliance.
pub fn data_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_DATA_HOME") {
        PathBuf::from(xdg).join("toastack")
    } else {
        PathBuf::from(home_dir())
            .join(".local")
            .join("share")
            .join("toastack")
    }
}

/// Return XDG_CONFIG_HOME/toastack.
pub fn config_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        PathBuf::from(xdg).join("toastack")
    } else {
        PathBuf::from(home_dir()).join(".config").join("toastack")
    }
}

fn home_dir() -> String {
    std::env::var("HOME").unwrap_or_else(|_| ".".to_string())
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    pub editor: Option<String>,
    #[serde(default)]
    pub stack: StackConfig,
    #[serde(default)]
    pub auto_dismiss: AutoDismissConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StackConfig {
    #[serde(default = "default_max_visible")]
    pub max_visible: usize,
    #[serde(default)]
    pub entry_edge: EntryEdge,
    /// Falls back to a per-edge default when unset. See [`StackConfig::collapsed_spacing`].
    #[serde(default, rename = "collapsed_spacing")]
    pub collapsed_spacing_override: Option<f64>,
    #[serde(default = "default_expanded_spacing")]
    pub expanded_spacing: f64,
    #[serde(default = "default_stack_reduction")]
    pub stack_reduction: f64,
    #[serde(default = "default_height")]
    pub default_height: f64,
    #[serde(default = "default_close_grace_ms")]
    pub close_grace_ms: u64,
}

impl Default for StackConfig {
    fn default() -> Self {
        Self {
            max_visible: default_max_visible(),
            entry_edge: EntryEdge::default(),
            collapsed_spacing_override: None,
            expanded_spacing: default_expanded_spacing(),
            stack_reduction: default_stack_reduction(),
            default_height: default_height(),
            close_grace_ms: default_close_grace_ms(),
        }
    }
}

impl StackConfig {
    /// `max_visible` clamped to at least one.
    pub fn effective_max_visible(&self) -> usize {
        self.max_visible.max(1)
    }

    pub fn collapsed_spacing(&self) -> f64 {
        self.collapsed_spacing_override
            .unwrap_or(match self.entry_edge {
                EntryEdge::Top => 14.0,
                EntryEdge::Bottom => 8.0,
            })
    }
}

fn default_max_visible() -> usize {
    3
}

fn default_expanded_spacing() -> f64 {
    8.0
}

fn default_stack_reduction() -> f64 {
    0.05
}

fn default_height() -> f64 {
    DEFAULT_TOAST_HEIGHT
}

fn default_close_grace_ms() -> u64 {
    150
}

#[derive(Debug, Clone, Deserialize)]
pub struct AutoDismissConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_auto_dismiss_duration")]
    pub duration_ms: u64,
}

impl Default for AutoDismissConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            duration_ms: default_auto_dismiss_duration(),
        }
    }
}

fn default_auto_dismiss_duration() -> u64 {
    4000
}

/// Return the path to config.toml.
pub fn config_path() -> PathBuf {
    config_dir().join("config.toml")
}

/// Load config.toml. Return defaults if the file is missing or fails to parse.
pub fn load_config() -> AppConfig {
    load_config_from(&config_path())
}

pub fn load_config_from(path: &Path) -> AppConfig {
    match std::fs::read_to_string(path) {
        Ok(content) => toml::from_str(&content).unwrap_or_else(|e| {
            log::warn!("Failed to parse config.toml: {}, using defaults", e);
            AppConfig::default()
        }),
        Err(_) => AppConfig::default(),
    }
}

/// Update [auto_dismiss] enabled in config.toml, preserving existing comments and formatting.
pub fn save_auto_dismiss_enabled(enabled: bool) -> io::Result<()> {
    save_auto_dismiss_enabled_at(&config_path(), enabled)
}

pub fn save_auto_dismiss_enabled_at(path: &Path, enabled: bool) -> io::Result<()> {
    let content = std::fs::read_to_string(path).unwrap_or_default();
    let mut doc: DocumentMut = content.parse().unwrap_or_default();
    doc["auto_dismiss"]["enabled"] = toml_edit::value(enabled);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, doc.to_string())
}

/// Default config.toml template.
fn default_config_template() -> &'static str {
    r#"# toastack configuration

# Editor to open when running `toastack config`
# Falls back to $EDITOR environment variable, then vim
# editor = "vim"

# Stack layout
[stack]
# Toasts shown while collapsed (default: 3, minimum 1)
# max_visible = 3

# Edge toasts slide in from: "top" or "bottom" (default: top)
# entry_edge = "top"

# Distance between stacked toasts while collapsed (default: 14 for top, 8 for bottom)
# collapsed_spacing = 14

# Gap between toasts while expanded (default: 8)
# expanded_spacing = 8

# Scale lost per step back in the collapsed stack (default: 0.05)
# stack_reduction = 0.05

# Height assumed until a toast has been measured (default: 80)
# default_height = 80

# Delay between a close request and removal, in milliseconds (default: 150)
# close_grace_ms = 150

# Clear all toasts after a period without interaction
[auto_dismiss]
# enabled = false

# Idle time in milliseconds (default: 4000)
# duration_ms = 4000
"#
}

/// Create config.toml with the default template if it does not exist. Return its path.
pub fn ensure_config_file() -> io::Result<PathBuf> {
    let path = config_path();
    if !path.exists() {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, default_config_template())?;
    }
    Ok(path)
}

/// Resolve the editor to use.
/// Priority: config.toml `editor` -> $EDITOR env var -> vim.
pub fn resolve_editor() -> String {
    let config = load_config();
    if let Some(ref editor) = config.editor {
        if !editor.is_empty() {
            return editor.clone();
        }
    }
    if let Ok(editor) = std::env::var("EDITOR") {
        if !editor.is_empty() {
            return editor;
        }
    }
    "vim".to_string()
}
