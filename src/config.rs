use clap::Parser;
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "mozi", about = "A passcode-gated cinema showtime browser")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Host to bind to
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to
    #[arg(short, long)]
    pub port: Option<u16>,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub upstream: UpstreamConfig,
    pub display: DisplayConfig,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Marks cookies `Secure`.
    pub production: bool,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct AuthConfig {
    /// Shared passcode. `None` means the verifier is misconfigured.
    pub passcode: Option<String>,
    pub cookie_name: String,
    pub max_age_days: u64,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct UpstreamConfig {
    pub base_url: String,
    pub api_key: String,
    pub timeout_secs: u64,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct DisplayConfig {
    pub app_name: String,
    pub locale: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            production: false,
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            passcode: None,
            cookie_name: "passcode_auth".to_string(),
            max_age_days: 30,
        }
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: "http://backend:8000/api".to_string(),
            api_key: String::new(),
            timeout_secs: 30,
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            app_name: "Mi megy a moziba?".to_string(),
            locale: "hu".to_string(),
        }
    }
}

impl Config {
    pub fn load(cli: &Cli) -> anyhow::Result<Self> {
        let config_path = cli.config.clone().or_else(Self::default_path);

        let mut config = match config_path {
            Some(path) if path.exists() => {
                tracing::info!("Loading config from {}", path.display());
                let content = std::fs::read_to_string(&path)?;
                toml::from_str(&content)?
            }
            _ => Config::default(),
        };

        config.apply_env(|key| std::env::var(key).ok());

        // CLI overrides
        if let Some(ref host) = cli.host {
            config.server.host = host.clone();
        }
        if let Some(port) = cli.port {
            config.server.port = port;
        }

        if config.auth.passcode.is_none() {
            tracing::warn!("AUTH_PASSCODE is not set; every passcode attempt will fail");
        }

        Ok(config)
    }

    /// `~/.config/mozi/config.toml` (or the platform equivalent).
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("mozi").join("config.toml"))
    }

    /// Overlay environment variables onto the file/default values.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(passcode) = lookup("AUTH_PASSCODE").filter(|p| !p.is_empty()) {
            self.auth.passcode = Some(passcode);
        }
        if let Some(url) = lookup("BACKEND_URL").filter(|u| !u.is_empty()) {
            self.upstream.base_url = url;
        }
        if let Some(key) = lookup("API_KEY") {
            self.upstream.api_key = key;
        }
        if let Some(name) = lookup("APP_NAME").filter(|n| !n.is_empty()) {
            self.display.app_name = name;
        }
        if let Some(locale) = lookup("APP_LOCALE").filter(|l| !l.is_empty()) {
            self.display.locale = locale;
        }
        if lookup("NODE_ENV").as_deref() == Some("production")
            || lookup("MOZI_PRODUCTION").is_some_and(|v| v == "1" || v == "true")
        {
            self.server.production = true;
        }
    }

    pub fn cookie_max_age_secs(&self) -> u64 {
        self.auth.max_age_days * 24 * 60 * 60
    }
}
