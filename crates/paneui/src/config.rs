use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use paneui_core::WindowType;
use serde::{Deserialize, Serialize};

use crate::error::{UiError, UiResult};
use crate::window::{with_size, with_title, with_type, WindowOption};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UiConfig {
    #[serde(default = "default_driver")]
    pub driver: String,

    /// Tried in order when `driver` cannot be constructed.
    #[serde(default = "default_fallback")]
    pub fallback: Vec<String>,

    #[serde(default)]
    pub window: WindowDefaults,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowDefaults {
    #[serde(default = "default_title")]
    pub title: String,

    #[serde(default = "default_width")]
    pub width: u32,

    #[serde(default = "default_height")]
    pub height: u32,

    #[serde(default)]
    pub kind: WindowType,
}

fn default_driver() -> String {
    "x11".to_string()
}
fn default_fallback() -> Vec<String> {
    vec!["dummy".to_string()]
}
fn default_title() -> String {
    "UI".to_string()
}
fn default_width() -> u32 {
    400
}
fn default_height() -> u32 {
    300
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            driver: default_driver(),
            fallback: default_fallback(),
            window: WindowDefaults::default(),
        }
    }
}

impl Default for WindowDefaults {
    fn default() -> Self {
        Self {
            title: default_title(),
            width: default_width(),
            height: default_height(),
            kind: WindowType::default(),
        }
    }
}

impl UiConfig {
    /// A missing file means defaults; an unreadable or malformed one is an error.
    pub fn load_or_default(path: impl AsRef<Path>) -> UiResult<Self> {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(s) => toml::from_str(&s)
                .map_err(|e| UiError::Config(format!("parse {}: {}", path.display(), e))),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(UiError::Config(format!("read {}: {}", path.display(), e))),
        }
    }

    /// Driver names in the order `Ui::from_config` tries them.
    pub fn candidates(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.driver.as_str()).chain(self.fallback.iter().map(String::as_str))
    }

    /// The `[window]` table as options; append more to override them.
    pub fn window_options<'a>(&self) -> Vec<WindowOption<'a>> {
        vec![
            with_title(self.window.title.clone()),
            with_size(self.window.width, self.window.height),
            with_type(self.window.kind),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::window::WindowConfig;

    #[test]
    fn partial_toml_keeps_defaults() {
        let cfg: UiConfig = toml::from_str(
            r#"
            driver = "headless"

            [window]
            kind = "dialog"
            "#,
        )
        .unwrap();

        assert_eq!(cfg.driver, "headless");
        assert_eq!(cfg.fallback, vec!["dummy".to_string()]);
        assert_eq!(cfg.window.kind, WindowType::Dialog);
        assert_eq!(cfg.window.width, 400);
    }

    #[test]
    fn candidates_start_with_primary_driver() {
        let cfg = UiConfig {
            driver: "a".into(),
            fallback: vec!["b".into(), "c".into()],
            ..UiConfig::default()
        };
        assert_eq!(cfg.candidates().collect::<Vec<_>>(), ["a", "b", "c"]);
    }

    #[test]
    fn window_options_can_be_overridden() {
        let mut cfg = UiConfig::default();
        cfg.window.title = "from file".into();

        let mut opts = cfg.window_options();
        opts.push(with_title("explicit"));
        let wc = WindowConfig::from_options(opts);

        assert_eq!(wc.title, "explicit");
        assert_eq!((wc.width, wc.height), (400, 300));
    }
}
