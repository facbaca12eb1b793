//! Configuration management
//!
//! Settings live in `settings.json` inside the data directory:
//! ```json
//! {
//!   "app": { "userId": "local" },
//!   "import": { "dateInputFormat": "%Y-%m-%d %H:%M:%S", "dateOutputFormat": "%Y-%m-%d" },
//!   "importProfiles": { "bank": { "columns": { "Date": "date", "Amt": "amount" } } }
//! }
//! ```
//! Keys this crate does not manage are kept as-is when saving.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::domain::{DateFormats, FieldKey};

/// Environment variable overriding the configured user id
pub const USER_ENV: &str = "FINTRACK_USER";

/// User id when neither settings nor environment name one
pub const DEFAULT_USER_ID: &str = "local";

const SETTINGS_FILE: &str = "settings.json";

/// Raw settings.json structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettingsFile {
    #[serde(default)]
    app: AppSettings,
    #[serde(default)]
    import: ImportSettings,
    #[serde(default)]
    import_profiles: BTreeMap<String, ImportProfile>,
    #[serde(flatten)]
    other: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AppSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    user_id: Option<String>,
    #[serde(flatten)]
    other: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImportSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    date_input_format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    date_output_format: Option<String>,
    #[serde(flatten)]
    other: HashMap<String, serde_json::Value>,
}

/// Saved column mapping, keyed by header name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportProfile {
    pub columns: BTreeMap<String, FieldKey>,
}

/// Resolved configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub user_id: String,
    pub date_formats: DateFormats,
    pub import_profiles: BTreeMap<String, ImportProfile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            user_id: DEFAULT_USER_ID.to_string(),
            date_formats: DateFormats::default(),
            import_profiles: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Load config from the data directory
    ///
    /// A missing settings file yields the defaults. `FINTRACK_USER` wins
    /// over `app.userId`.
    pub fn load(data_dir: &Path) -> Result<Self> {
        let raw = read_settings(data_dir)?;
        let env_user = std::env::var(USER_ENV).ok();
        Ok(Self::resolve(raw, env_user))
    }

    fn resolve(raw: SettingsFile, env_user: Option<String>) -> Self {
        let defaults = DateFormats::default();

        let user_id = env_user
            .or(raw.app.user_id)
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| DEFAULT_USER_ID.to_string());

        Self {
            user_id,
            date_formats: DateFormats {
                input: raw.import.date_input_format.unwrap_or(defaults.input),
                output: raw.import.date_output_format.unwrap_or(defaults.output),
            },
            import_profiles: raw.import_profiles,
        }
    }

    /// Write the managed fields back, preserving everything else
    ///
    /// The user id is not written; it is only ever set by hand or through
    /// the environment.
    pub fn save(&self, data_dir: &Path) -> Result<()> {
        let mut settings = read_settings(data_dir)?;

        settings.import.date_input_format = Some(self.date_formats.input.clone());
        settings.import.date_output_format = Some(self.date_formats.output.clone());
        settings.import_profiles = self.import_profiles.clone();

        let path = data_dir.join(SETTINGS_FILE);
        let content = serde_json::to_string_pretty(&settings)?;
        std::fs::write(&path, content)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }

    pub fn profile(&self, name: &str) -> Option<&ImportProfile> {
        self.import_profiles.get(name)
    }

    pub fn set_profile(&mut self, name: impl Into<String>, profile: ImportProfile) {
        self.import_profiles.insert(name.into(), profile);
    }

    pub fn remove_profile(&mut self, name: &str) -> Option<ImportProfile> {
        self.import_profiles.remove(name)
    }
}

fn read_settings(data_dir: &Path) -> Result<SettingsFile> {
    let path = data_dir.join(SETTINGS_FILE);
    if !path.exists() {
        return Ok(SettingsFile::default());
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Invalid JSON in {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults_without_settings_file() {
        let dir = tempdir().unwrap();
        let raw = read_settings(dir.path()).unwrap();
        let config = Config::resolve(raw, None);

        assert_eq!(config.user_id, DEFAULT_USER_ID);
        assert_eq!(config.date_formats, DateFormats::default());
        assert!(config.import_profiles.is_empty());
    }

    #[test]
    fn test_env_user_overrides_settings() {
        let raw: SettingsFile = serde_json::from_str(r#"{"app": {"userId": "alice"}}"#).unwrap();
        assert_eq!(Config::resolve(raw.clone(), None).user_id, "alice");
        assert_eq!(Config::resolve(raw, Some("bob".into())).user_id, "bob");
    }

    #[test]
    fn test_blank_user_falls_back_to_default() {
        let raw: SettingsFile = serde_json::from_str(r#"{"app": {"userId": "  "}}"#).unwrap();
        assert_eq!(Config::resolve(raw, None).user_id, DEFAULT_USER_ID);
    }

    #[test]
    fn test_profiles_and_formats_load() {
        let raw: SettingsFile = serde_json::from_str(
            r#"{
                "import": {"dateInputFormat": "%m/%d/%Y"},
                "importProfiles": {"bank": {"columns": {"Date": "date", "Amt": "amount"}}}
            }"#,
        )
        .unwrap();
        let config = Config::resolve(raw, None);

        assert_eq!(config.date_formats.input, "%m/%d/%Y");
        assert_eq!(config.date_formats.output, DateFormats::default().output);
        let bank = config.profile("bank").unwrap();
        assert_eq!(bank.columns.get("Amt"), Some(&FieldKey::Amount));
    }

    #[test]
    fn test_save_preserves_unknown_fields() {
        let dir = tempdir().unwrap();
        std::fs::write(
            dir.path().join(SETTINGS_FILE),
            r#"{"app": {"userId": "alice", "theme": "dark"}, "plugins": {"x": 1}}"#,
        )
        .unwrap();

        let mut config = Config::load(dir.path()).unwrap();
        let mut profile = ImportProfile::default();
        profile.columns.insert("Desc".into(), FieldKey::Payee);
        config.set_profile("bank", profile.clone());
        config.save(dir.path()).unwrap();

        let saved: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(dir.path().join(SETTINGS_FILE)).unwrap())
                .unwrap();
        assert_eq!(saved["app"]["theme"], "dark");
        assert_eq!(saved["app"]["userId"], "alice");
        assert_eq!(saved["plugins"]["x"], 1);
        assert_eq!(saved["importProfiles"]["bank"]["columns"]["Desc"], "payee");

        let reloaded = read_settings(dir.path()).unwrap();
        assert_eq!(reloaded.import_profiles.get("bank"), Some(&profile));
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join(SETTINGS_FILE), "{ not json").unwrap();
        assert!(Config::load(dir.path()).is_err());
    }
}
