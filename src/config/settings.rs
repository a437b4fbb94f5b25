use crate::utils::error::{Result, StoreError};
use serde::Deserialize;
use std::path::Path;
use url::Url;

/// Remote-sync settings, loaded from a TOML file. Both sections are
/// optional; the corresponding subcommands fail with a config error when
/// their section is missing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    pub drive: Option<DriveSettings>,
    pub wix: Option<WixSettings>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DriveSettings {
    #[serde(default = "default_drive_base_url")]
    pub base_url: String,
    pub token: String,
    #[serde(default = "default_folder_name")]
    pub folder_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WixSettings {
    #[serde(default = "default_wix_base_url")]
    pub base_url: String,
    pub api_key: String,
    pub site_id: String,
    pub account_id: Option<String>,
}

fn default_drive_base_url() -> String {
    "https://www.googleapis.com/drive/v3".to_string()
}

fn default_folder_name() -> String {
    "FlowerShopData".to_string()
}

fn default_wix_base_url() -> String {
    "https://www.wixapis.com".to_string()
}

impl Settings {
    /// Loads the settings file. A missing file yields empty settings so the
    /// local-only subcommands keep working without any configuration.
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parses the settings, substituting `${VAR}` environment references so
    /// tokens can stay out of the file.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed = substitute_env_vars(content);
        let settings: Settings =
            toml::from_str(&processed).map_err(|e| StoreError::Config {
                field: "settings".to_string(),
                message: format!("TOML parsing error: {e}"),
            })?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<()> {
        if let Some(drive) = &self.drive {
            validate_url("drive.base_url", &drive.base_url)?;
        }
        if let Some(wix) = &self.wix {
            validate_url("wix.base_url", &wix.base_url)?;
            if wix.api_key.trim().is_empty() {
                return Err(StoreError::Config {
                    field: "wix.api_key".to_string(),
                    message: "value cannot be empty".to_string(),
                });
            }
        }
        Ok(())
    }

    pub fn drive(&self) -> Result<&DriveSettings> {
        self.drive.as_ref().ok_or_else(|| StoreError::Config {
            field: "drive".to_string(),
            message: "missing [drive] section in settings".to_string(),
        })
    }

    pub fn wix(&self) -> Result<&WixSettings> {
        self.wix.as_ref().ok_or_else(|| StoreError::Config {
            field: "wix".to_string(),
            message: "missing [wix] section in settings".to_string(),
        })
    }
}

fn substitute_env_vars(content: &str) -> String {
    use regex::Regex;
    let re = Regex::new(r"\$\{([^}]+)\}").expect("static regex");
    re.replace_all(content, |caps: &regex::Captures| {
        let var_name = &caps[1];
        std::env::var(var_name).unwrap_or_else(|_| format!("${{{var_name}}}"))
    })
    .to_string()
}

fn validate_url(field: &str, url_str: &str) -> Result<()> {
    match Url::parse(url_str) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(()),
        Ok(url) => Err(StoreError::Config {
            field: field.to_string(),
            message: format!("unsupported URL scheme: {}", url.scheme()),
        }),
        Err(e) => Err(StoreError::Config {
            field: field.to_string(),
            message: format!("invalid URL: {e}"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_settings_parse() {
        let settings = Settings::from_toml_str("").unwrap();
        assert!(settings.drive.is_none());
        assert!(settings.wix.is_none());
        assert!(settings.drive().is_err());
    }

    #[test]
    fn wix_section_with_defaults() {
        let settings = Settings::from_toml_str(
            r#"
[wix]
api_key = "key-123"
site_id = "site-456"
"#,
        )
        .unwrap();
        let wix = settings.wix().unwrap();
        assert_eq!(wix.base_url, "https://www.wixapis.com");
        assert_eq!(wix.site_id, "site-456");
        assert!(wix.account_id.is_none());
    }

    #[test]
    fn env_var_substitution() {
        std::env::set_var("FLOWERSTOCK_TEST_TOKEN", "secret");
        let settings = Settings::from_toml_str(
            r#"
[drive]
token = "${FLOWERSTOCK_TEST_TOKEN}"
"#,
        )
        .unwrap();
        assert_eq!(settings.drive().unwrap().token, "secret");
        std::env::remove_var("FLOWERSTOCK_TEST_TOKEN");
    }

    #[test]
    fn bad_base_url_is_rejected() {
        let result = Settings::from_toml_str(
            r#"
[drive]
base_url = "not-a-url"
token = "t"
"#,
        );
        assert!(result.is_err());
    }
}
