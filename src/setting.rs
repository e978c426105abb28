use crate::Result;
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const CARGO_PKG_VERSION: Option<&'static str> = option_env!("CARGO_PKG_VERSION");

/// number of threads config
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Default)]
#[serde(default)]
pub struct Thread {
    /// number of http server threads
    pub http: usize,
}

/// network config
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Network {
    /// server bind host
    pub host: String,
    /// server bind port
    pub port: u16,

    pub real_ip_header: Option<String>,
}

impl Default for Network {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            real_ip_header: None,
        }
    }
}

/// payment vendor config
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Default)]
#[serde(default)]
pub struct Vendor {
    /// vendor api key, `test_` or `live_` prefixed
    pub api_key: String,
    /// override the vendor api base url
    pub base_url: Option<String>,
}

/// spam protection config
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Spam {
    /// submissions rendered-to-posted faster than this are rejected
    pub min_elapsed_secs: u64,
}

impl Default for Spam {
    fn default() -> Self {
        Self {
            min_elapsed_secs: 3,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct Setting {
    /// database url
    /// https://www.sea-ql.org/SeaORM/docs/install-and-config/connection/
    pub db_url: String,

    /// the site url, used for redirect and webhook urls
    pub site: Option<String>,

    pub thread: Thread,
    pub network: Network,

    pub vendor: Vendor,
    pub spam: Spam,
}

impl Default for Setting {
    fn default() -> Self {
        Self {
            db_url: "sqlite://givebox.sqlite".to_string(),
            site: None,
            thread: Default::default(),
            network: Default::default(),
            vendor: Default::default(),
            spam: Default::default(),
        }
    }
}

impl Setting {
    pub fn site(&self) -> String {
        self.site
            .clone()
            .unwrap_or_else(|| format!("http://{}:{}", self.network.host, self.network.port))
    }

    /// read config from file and env
    pub fn read<P: AsRef<Path>>(file: P, env_prefix: Option<String>) -> Result<Self> {
        let builder = Config::builder();
        let mut config = builder
            // Use serde default feature
            .add_source(File::with_name(file.as_ref().to_str().unwrap_or_default()));
        if let Some(prefix) = env_prefix {
            config = config.add_source(Self::env_source(&prefix));
        }

        let config = config.build()?;
        let setting: Setting = config.try_deserialize()?;
        Ok(setting)
    }

    fn env_source(prefix: &str) -> Environment {
        Environment::with_prefix(prefix)
            .try_parsing(true)
            .prefix_separator("_")
            .separator("__")
    }

    /// read config from env
    pub fn from_env(env_prefix: String) -> Result<Self> {
        let mut config = Config::builder();
        config = config.add_source(Self::env_source(&env_prefix));

        let config = config.build()?;
        let setting: Setting = config.try_deserialize()?;
        Ok(setting)
    }

    /// config from str
    pub fn from_str(s: &str, format: FileFormat) -> Result<Self> {
        let builder = Config::builder();
        let config = builder.add_source(File::from_str(s, format)).build()?;
        let setting: Setting = config.try_deserialize()?;
        Ok(setting)
    }
}
