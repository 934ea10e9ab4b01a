// Application settings
// Loaded from ~/.config/sheetmend/settings.json

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // Export
    /// Directory for repaired files. None = the user's Downloads folder.
    #[serde(rename = "export.outputDir")]
    pub output_dir: Option<PathBuf>,

    #[serde(rename = "export.saveToDisk")]
    pub save_to_disk: bool,

    // Preview
    #[serde(rename = "preview.rows")]
    pub preview_rows: usize,

    /// Bytes shown when a file has no tabular content
    #[serde(rename = "preview.rawBytes")]
    pub raw_preview_bytes: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            output_dir: None,
            save_to_disk: true,
            preview_rows: 5,
            raw_preview_bytes: 500,
        }
    }
}

impl Settings {
    /// Get the settings file path
    pub fn config_path() -> PathBuf {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("sheetmend");
        config_dir.join("settings.json")
    }

    /// Load settings from the standard location, creating a commented
    /// default file on first run.
    pub fn load() -> Self {
        let path = Self::config_path();

        if !path.exists() {
            let settings = Self::default();
            settings.create_default_file(&path);
            return settings;
        }

        Self::load_from(&path)
    }

    /// Load settings from an explicit path. A missing or unreadable file
    /// yields defaults; nothing is written.
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            log::debug!("no settings at {}, using defaults", path.display());
            return Self::default();
        }

        match fs::read_to_string(path) {
            Ok(contents) => Self::parse(&contents).unwrap_or_else(|e| {
                log::warn!("Error parsing {}: {}", path.display(), e);
                log::warn!("Using default settings");
                Self::default()
            }),
            Err(e) => {
                log::warn!("Error reading {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Parse settings JSON. Lines starting with // are comments.
    pub fn parse(contents: &str) -> Result<Self, String> {
        let cleaned: String = contents
            .lines()
            .filter(|line| !line.trim().starts_with("//"))
            .collect::<Vec<_>>()
            .join("\n");

        serde_json::from_str(&cleaned).map_err(|e| e.to_string())
    }

    /// Save current settings to `path`
    pub fn save_to(&self, path: &Path) -> Result<(), String> {
        // Ensure directory exists
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| e.to_string())?;
        }

        let json = serde_json::to_string_pretty(self)
            .map_err(|e| e.to_string())?;

        fs::write(path, json).map_err(|e| e.to_string())
    }

    /// Where repaired files go: the configured directory, else Downloads,
    /// else ~/Downloads, else the working directory.
    pub fn effective_output_dir(&self) -> PathBuf {
        if let Some(dir) = &self.output_dir {
            return dir.clone();
        }
        dirs::download_dir()
            .or_else(|| dirs::home_dir().map(|home| home.join("Downloads")))
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Create default settings file with comments
    fn create_default_file(&self, path: &Path) {
        // Ensure directory exists
        if let Some(parent) = path.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                log::warn!("Error creating config directory: {}", e);
                return;
            }
        }

        let default_config = r#"{
    // Where repaired files are saved (null = your Downloads folder)
    "export.outputDir": null,
    "export.saveToDisk": true,

    // Rows shown in the dataset preview
    "preview.rows": 5,

    // Bytes shown when a file has no readable table
    "preview.rawBytes": 500
}
"#;

        if let Err(e) = fs::write(path, default_config) {
            log::warn!("Error writing default settings.json: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_config_path_is_app_scoped() {
        let path = Settings::config_path();
        assert!(path.ends_with("sheetmend/settings.json"), "{}", path.display());
    }

    #[test]
    fn test_parse_commented_file() {
        let json = r#"{
    // comment line
    "export.outputDir": "/tmp/out",
    "preview.rows": 12
}"#;
        let settings = Settings::parse(json).unwrap();
        assert_eq!(settings.output_dir, Some(PathBuf::from("/tmp/out")));
        assert_eq!(settings.preview_rows, 12);
        // Unspecified keys keep their defaults
        assert!(settings.save_to_disk);
        assert_eq!(settings.raw_preview_bytes, 500);
    }

    #[test]
    fn test_load_from_missing_file_does_not_create_it() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        assert_eq!(Settings::load_from(&path), Settings::default());
        assert!(!path.exists());
    }

    #[test]
    fn test_load_from_invalid_json_falls_back() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{ not json").unwrap();
        assert_eq!(Settings::load_from(&path), Settings::default());
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");
        let settings = Settings {
            output_dir: Some(dir.path().join("exports")),
            save_to_disk: false,
            preview_rows: 3,
            raw_preview_bytes: 64,
        };
        settings.save_to(&path).unwrap();
        assert_eq!(Settings::load_from(&path), settings);
    }

    #[test]
    fn test_default_file_parses() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        Settings::default().create_default_file(&path);
        assert_eq!(Settings::load_from(&path), Settings::default());
    }

    #[test]
    fn test_effective_output_dir_prefers_configured() {
        let settings = Settings { output_dir: Some(PathBuf::from("/srv/repaired")), ..Settings::default() };
        assert_eq!(settings.effective_output_dir(), PathBuf::from("/srv/repaired"));
    }
}
