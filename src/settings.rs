use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use crate::api::Feed;
use crate::theme::ThemeVariant;
use crate::viewport::{
    DEFAULT_PREFETCH_DISTANCE, DisabledObservationService, LayoutObservationService,
    ObservationService, ObserverOptions,
};

const APP_SENTINEL: &str = "wikiscroll";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(rename = "_app")]
    pub app: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme: Option<ThemeVariant>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub feed: Option<Feed>,

    #[serde(default)]
    pub viewport: ViewportSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            app: APP_SENTINEL.to_string(),
            theme: None,
            feed: None,
            viewport: ViewportSettings::default(),
        }
    }
}

/// Which observation primitive the reader hands to the viewport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObserverKind {
    /// Measure card bounds after every layout pass.
    #[default]
    Layout,
    /// No observation; every card counts as visible.
    Disabled,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportSettings {
    pub thresholds: Vec<f64>,
    pub root_margin: u16,
    pub prefetch_distance: usize,
    pub observer: ObserverKind,
}

impl Default for ViewportSettings {
    fn default() -> Self {
        Self {
            thresholds: ObserverOptions::DEFAULT_THRESHOLDS.to_vec(),
            root_margin: 0,
            prefetch_distance: DEFAULT_PREFETCH_DISTANCE,
            observer: ObserverKind::default(),
        }
    }
}

impl ViewportSettings {
    pub fn observer_options(&self) -> ObserverOptions {
        ObserverOptions::new(self.thresholds.clone(), self.root_margin)
    }

    pub fn observation_service(&self) -> Box<dyn ObservationService> {
        match self.observer {
            ObserverKind::Layout => Box::new(LayoutObservationService),
            ObserverKind::Disabled => Box::new(DisabledObservationService),
        }
    }

    fn validate(&self) -> Result<()> {
        if self.thresholds.is_empty() {
            bail!("viewport.thresholds must list at least one ratio");
        }
        if let Some(bad) = self
            .thresholds
            .iter()
            .find(|t| !(0.0..=1.0).contains(*t))
        {
            bail!("viewport.thresholds entries must be between 0 and 1, found {bad}");
        }
        Ok(())
    }
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings from {}", path.display()))?;

        let settings: Settings = toml::from_str(&content)
            .with_context(|| format!("Failed to parse settings from {}", path.display()))?;

        settings.validate()?;
        Ok(settings)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        let content =
            toml::to_string_pretty(self).with_context(|| "Failed to serialize settings")?;

        fs::write(path, content)
            .with_context(|| format!("Failed to write settings to {}", path.display()))?;

        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.app != APP_SENTINEL {
            bail!(
                "Settings file appears to belong to another application (expected _app = '{}', found '{}')",
                APP_SENTINEL,
                self.app
            );
        }
        self.viewport.validate()
    }
}

pub fn config_dir(custom: Option<&PathBuf>) -> Option<PathBuf> {
    custom
        .cloned()
        .or_else(|| dirs::home_dir().map(|p| p.join(".config").join("wikiscroll")))
}

pub fn settings_path(config_dir: &Path) -> PathBuf {
    config_dir.join("settings.toml")
}

pub fn db_path(config_dir: &Path) -> PathBuf {
    config_dir.join("data.db")
}

pub fn log_path(config_dir: &Path) -> PathBuf {
    config_dir.join("wikiscroll.log")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn load_missing_file_returns_default() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("settings.toml");

        let settings = Settings::load(&path).unwrap();

        assert_eq!(settings.app, "wikiscroll");
        assert!(settings.theme.is_none());
        assert_eq!(settings.viewport, ViewportSettings::default());
    }

    #[test]
    fn load_valid_settings() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("settings.toml");
        fs::write(
            &path,
            r#"_app = "wikiscroll"
theme = "light"
feed = "trending"

[viewport]
thresholds = [0.25, 0.75]
root_margin = 4
observer = "disabled"
"#,
        )
        .unwrap();

        let settings = Settings::load(&path).unwrap();

        assert_eq!(settings.theme, Some(ThemeVariant::Light));
        assert_eq!(settings.feed, Some(Feed::Trending));
        assert_eq!(settings.viewport.thresholds, vec![0.25, 0.75]);
        assert_eq!(settings.viewport.root_margin, 4);
        assert_eq!(settings.viewport.prefetch_distance, DEFAULT_PREFETCH_DISTANCE);
        assert_eq!(settings.viewport.observer, ObserverKind::Disabled);
    }

    #[test]
    fn wrong_sentinel_returns_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("settings.toml");
        fs::write(&path, "_app = \"other-app\"\n").unwrap();

        let err = Settings::load(&path).unwrap_err().to_string();
        assert!(err.contains("another application"));
    }

    #[test]
    fn out_of_range_threshold_is_rejected() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("settings.toml");
        fs::write(
            &path,
            "_app = \"wikiscroll\"\n[viewport]\nthresholds = [0.5, 1.5]\n",
        )
        .unwrap();

        let err = Settings::load(&path).unwrap_err().to_string();
        assert!(err.contains("between 0 and 1"));
    }

    #[test]
    fn empty_thresholds_are_rejected() {
        let settings = ViewportSettings {
            thresholds: vec![],
            ..Default::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn observer_options_normalize_thresholds() {
        let settings = ViewportSettings {
            thresholds: vec![0.7, 0.1, 0.7],
            root_margin: 2,
            ..Default::default()
        };
        let options = settings.observer_options();
        assert_eq!(options.thresholds, vec![0.1, 0.7]);
        assert_eq!(options.root_margin, 2);
    }

    #[test]
    fn disabled_observer_kind_yields_no_capability() {
        let settings = ViewportSettings {
            observer: ObserverKind::Disabled,
            ..Default::default()
        };
        let service = settings.observation_service();
        assert!(service.create_observer(&settings.observer_options()).is_err());

        let layout = ViewportSettings::default().observation_service();
        assert!(layout.create_observer(&ObserverOptions::default()).is_ok());
    }

    #[test]
    fn round_trip_serialization() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested").join("settings.toml");

        let original = Settings {
            theme: Some(ThemeVariant::Dark),
            feed: Some(Feed::Random),
            ..Default::default()
        };
        original.save(&path).unwrap();
        let loaded = Settings::load(&path).unwrap();

        assert_eq!(loaded.app, original.app);
        assert_eq!(loaded.theme, original.theme);
        assert_eq!(loaded.feed, original.feed);
        assert_eq!(loaded.viewport, original.viewport);
    }

    #[test]
    fn config_dir_uses_custom_when_provided() {
        let custom = PathBuf::from("/custom/path");
        assert_eq!(config_dir(Some(&custom)), Some(custom));
    }

    #[test]
    fn config_dir_falls_back_to_default() {
        let result = config_dir(None);
        assert!(result.is_some());
        assert!(result.unwrap().ends_with("wikiscroll"));
    }
}
