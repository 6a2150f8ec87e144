// src/models/settings.rs

//! Program-wide settings read from `config.toml`.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::{AppError, Result};
use crate::models::Filter;

/// Root of `config.toml`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    /// Global defaults for every page
    #[serde(default)]
    pub settings: ProgramSettings,

    /// Outgoing mail account, optional
    #[serde(default)]
    pub mail: Option<MailSettings>,
}

impl ConfigFile {
    /// Parse and validate a `config.toml` document.
    pub fn parse(content: &str) -> Result<ProgramSettings> {
        let file: ConfigFile = toml::from_str(content)?;
        let mut settings = file.settings;
        if let Some(mail) = file.mail {
            mail.validate()?;
            settings.mail = mail;
        }
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from a file, falling back to defaults when it is missing.
    pub fn load(path: impl AsRef<Path>) -> Result<ProgramSettings> {
        match fs::read_to_string(path.as_ref()) {
            Ok(content) => Self::parse(&content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::warn!(
                    "No config file at {:?}, using default settings",
                    path.as_ref()
                );
                Ok(ProgramSettings::default())
            }
            Err(e) => Err(AppError::Io(e)),
        }
    }
}

/// Global settings used unless a page overrides them.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProgramSettings {
    /// Seconds between checks of a page
    #[serde(default = "defaults::interval", rename = "interval")]
    pub interval_secs: u64,

    /// Permission bits for cache and registry files
    #[serde(default = "defaults::file_perms")]
    pub file_perms: u32,

    /// Control port the daemon listens on
    #[serde(default = "defaults::port")]
    pub port: u16,

    /// Browser used by the client to open updated pages
    #[serde(default)]
    pub browser: String,

    /// Line separator used by the `html` filter and include patterns
    #[serde(default = "defaults::newline")]
    pub newline: String,

    /// Default notification address for pages without one
    #[serde(default)]
    pub notify: Option<String>,

    /// Default filters for pages without any
    #[serde(default)]
    pub filters: Vec<Filter>,

    #[serde(skip)]
    pub mail: MailSettings,
}

impl Default for ProgramSettings {
    fn default() -> Self {
        Self {
            interval_secs: defaults::interval(),
            file_perms: defaults::file_perms(),
            port: defaults::port(),
            browser: String::new(),
            newline: defaults::newline(),
            notify: None,
            filters: Vec::new(),
            mail: MailSettings::default(),
        }
    }
}

impl ProgramSettings {
    /// Default interval between checks.
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    /// Validate values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.interval_secs == 0 {
            return Err(AppError::validation("settings.interval must be > 0"));
        }
        if self.port == 0 {
            return Err(AppError::validation("settings.port must be > 0"));
        }
        if self.file_perms > 0o777 {
            return Err(AppError::validation(format!(
                "settings.file_perms {:o} is not a permission mode",
                self.file_perms
            )));
        }
        if let Some(addr) = &self.notify {
            validate_address(addr)?;
        }
        Ok(())
    }
}

/// Account used to send update notifications.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MailSettings {
    /// Sender address
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub password: String,
    /// Host used for authentication
    #[serde(default)]
    pub auth_server: String,
    /// Outgoing server as `host` or `host:port`
    #[serde(default)]
    pub out_server: String,
}

impl MailSettings {
    /// Whether every field needed to send mail is present.
    pub fn is_configured(&self) -> bool {
        !self.address.is_empty() && !self.auth_server.is_empty() && !self.out_server.is_empty()
    }

    fn validate(&self) -> Result<()> {
        if self.address.is_empty() {
            return Err(AppError::config("mail.address is required"));
        }
        validate_address(&self.address)?;
        if self.auth_server.is_empty() {
            return Err(AppError::config("mail.auth_server is required"));
        }
        if self.out_server.is_empty() {
            return Err(AppError::config("mail.out_server is required"));
        }
        Ok(())
    }
}

/// Reject addresses that are obviously not mail addresses.
pub(crate) fn validate_address(addr: &str) -> Result<()> {
    if addr.contains('@') {
        Ok(())
    } else {
        Err(AppError::config(format!(
            "invalid mail `{addr}`; correct syntax -> `name@domain.tld`"
        )))
    }
}

mod defaults {
    pub fn interval() -> u64 {
        60
    }
    pub fn file_perms() -> u32 {
        0o600
    }
    pub fn port() -> u16 {
        5239
    }
    pub fn newline() -> String {
        "\n".into()
    }
}
