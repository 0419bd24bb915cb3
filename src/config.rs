use chrono::Duration;
use clap::Parser;
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "courtkeeper", about = "Court booking and presence coordinator")]
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

    /// Path to data directory
    #[arg(long)]
    pub data_dir: Option<PathBuf>,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub limits: LimitsConfig,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: Option<PathBuf>,
}

/// Booking and presence tunables. Defaults are the production values;
/// everything is overridable from the config file.
#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct LimitsConfig {
    /// Length of one reservation slot, in minutes.
    pub slot_minutes: i64,
    /// Maximum reservations with a future end per user, across all courts.
    pub max_user_active_reservations: i64,
    /// Maximum reservations sharing one (court, starts_at) slot.
    pub max_slot_capacity: i64,
    /// Check-in validity, in minutes.
    pub checkin_ttl_minutes: i64,
    /// In-person proximity fence for check-ins, in meters.
    pub checkin_max_dist_m: f64,
    /// Coarse sanity bound between submitted and court coordinates, in meters.
    pub sanity_max_dist_m: f64,
    /// Rate limiter window, in seconds.
    pub rate_window_secs: u64,
    /// Requests allowed per client key per window.
    pub rate_limit: u32,
    /// How far back the check-in list returned on a new check-in reaches, in minutes.
    pub recent_window_minutes: i64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            slot_minutes: 30,
            max_user_active_reservations: 2,
            max_slot_capacity: 20,
            checkin_ttl_minutes: 90,
            checkin_max_dist_m: 20.0,
            sanity_max_dist_m: 500.0,
            rate_window_secs: 60,
            rate_limit: 30,
            recent_window_minutes: 120,
        }
    }
}

impl LimitsConfig {
    pub fn slot_duration(&self) -> Duration {
        Duration::minutes(self.slot_minutes)
    }

    pub fn checkin_ttl(&self) -> Duration {
        Duration::minutes(self.checkin_ttl_minutes)
    }

    pub fn recent_window(&self) -> Duration {
        Duration::minutes(self.recent_window_minutes)
    }
}

impl Config {
    pub fn load(cli: &Cli) -> anyhow::Result<Self> {
        let data_dir = Self::data_dir(cli);
        let config_path = cli
            .config
            .clone()
            .unwrap_or_else(|| data_dir.join("config.toml"));

        let mut config = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str(&content)?
        } else {
            Config::default()
        };

        // CLI overrides
        if let Some(ref host) = cli.host {
            config.server.host = host.clone();
        }
        if let Some(port) = cli.port {
            config.server.port = port;
        }

        // Resolve paths relative to data dir
        if config.database.path.is_none() {
            config.database.path = Some(data_dir.join("courtkeeper.db"));
        }

        Ok(config)
    }

    pub fn data_dir(cli: &Cli) -> PathBuf {
        cli.data_dir.clone().unwrap_or_else(|| {
            dirs::home_dir()
                .expect("Could not determine home directory")
                .join(".courtkeeper")
        })
    }

    pub fn db_path(&self) -> &PathBuf {
        self.database.path.as_ref().unwrap()
    }
}
