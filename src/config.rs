//! Connection settings.

use std::env;
use std::fmt;

use serde::Deserialize;

use crate::error::Result;

/// The port of IMAP over TLS.
pub const DEFAULT_PORT: u16 = 993;

/// The environment variable the password is conventionally read from.
pub const PASSWORD_ENV_VAR: &str = "IGRAB_PASSWORD";

fn default_port() -> u16 {
    DEFAULT_PORT
}

/// Where and as whom to log in.
///
/// Usually read from a TOML table:
///
/// ```
/// let config = imapgrab::ImapConfig::from_toml(r#"
///     server = "imap.example.com"
///     user = "someone@example.com"
/// "#).unwrap();
/// assert_eq!(config.address(), "imap.example.com:993");
/// assert!(!config.insecure);
/// ```
///
/// The password is best kept out of the file; see [`ImapConfig::with_password_from_env`].
#[derive(Clone, Deserialize, PartialEq, Eq)]
pub struct ImapConfig {
    /// Host name or address of the server.
    pub server: String,
    /// Server port.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Login name.
    pub user: String,
    /// Login password. Empty means not set.
    #[serde(default)]
    pub password: String,
    /// Talk plain text instead of TLS. Only allowed with `server = "127.0.0.1"`.
    #[serde(default)]
    pub insecure: bool,
}

impl ImapConfig {
    /// A secure configuration on the default port, without a password.
    pub fn new(server: impl Into<String>, user: impl Into<String>) -> Self {
        ImapConfig {
            server: server.into(),
            port: DEFAULT_PORT,
            user: user.into(),
            password: String::new(),
            insecure: false,
        }
    }

    /// Parse a TOML document.
    pub fn from_toml(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }

    /// Set the password.
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = password.into();
        self
    }

    /// Take the password from the environment variable `var` (conventionally
    /// [`PASSWORD_ENV_VAR`]), if it is set and not empty.
    pub fn with_password_from_env(mut self, var: &str) -> Self {
        match env::var(var) {
            Ok(password) if !password.is_empty() => self.password = password,
            _ => {}
        }
        self
    }

    /// `server:port`, as handed to [`crate::connect`].
    pub fn address(&self) -> String {
        format!("{}:{}", self.server, self.port)
    }
}

impl fmt::Debug for ImapConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let password = if self.password.is_empty() {
            "<unset>"
        } else {
            "<redacted>"
        };
        f.debug_struct("ImapConfig")
            .field("server", &self.server)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &password)
            .field("insecure", &self.insecure)
            .finish()
    }
}
