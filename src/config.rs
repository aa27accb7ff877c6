use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};

use anyhow::Context;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::{CardStatus, Error, Money, card::DEFAULT_EXPIRY};

pub const DEMO_PAN: &str = "4060222473856416";

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct KioskConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub limits: LoadLimits,
    #[serde(default)]
    pub fees: FeeSchedule,
    #[serde(default)]
    pub dashboard: DashboardConfig,
    #[serde(default)]
    pub card_defaults: CardDefaults,
    #[serde(default = "default_seed")]
    pub seed: Vec<SeedConfig>,
}

impl Default for KioskConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            limits: LoadLimits::default(),
            fees: FeeSchedule::default(),
            dashboard: DashboardConfig::default(),
            card_defaults: CardDefaults::default(),
            seed: default_seed(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerConfig {
    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

/// Inclusive bounds on a single reload.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadLimits {
    #[serde(default = "default_min_load")]
    pub min_load: Money,
    #[serde(default = "default_max_load")]
    pub max_load: Money,
}

impl Default for LoadLimits {
    fn default() -> Self {
        Self {
            min_load: default_min_load(),
            max_load: default_max_load(),
        }
    }
}

impl LoadLimits {
    /// Compares the unrounded amount, so 19.995 is below a 20.00 minimum.
    pub fn contains(&self, amount: Decimal) -> bool {
        amount >= self.min_load.as_decimal() && amount <= self.max_load.as_decimal()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeSchedule {
    #[serde(default = "default_fee")]
    pub fee: Money,
}

impl Default for FeeSchedule {
    fn default() -> Self {
        Self { fee: default_fee() }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DashboardConfig {
    #[serde(default = "default_service_name")]
    pub service_name: String,
    #[serde(default = "default_kiosks")]
    pub kiosks: u64,
    #[serde(default = "default_dau")]
    pub dau: u64,
    #[serde(default = "default_status")]
    pub status: String,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            service_name: default_service_name(),
            kiosks: default_kiosks(),
            dau: default_dau(),
            status: default_status(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CardDefaults {
    #[serde(default = "default_exp")]
    pub exp: String,
}

impl Default for CardDefaults {
    fn default() -> Self {
        Self { exp: default_exp() }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SeedConfig {
    Single {
        pan: String,
        balance: Money,
        #[serde(default)]
        status: CardStatus,
    },
    Generated {
        count: u64,
        first_pan: u64,
        balance: Money,
    },
    Csv {
        path: PathBuf,
    },
}

pub struct EnvOverride {
    pub port: Option<u16>,
}

impl KioskConfig {
    pub fn load_config(
        path: Option<impl AsRef<Path>>,
        env_override: EnvOverride,
    ) -> anyhow::Result<Self> {
        let mut config = if let Some(config_path) = path {
            let config_file =
                std::fs::read_to_string(config_path).context("Couldn't read config file")?;
            Self::from_yaml(&config_file)?
        } else {
            tracing::info!("No config file provided, using default config.");
            KioskConfig::default()
        };

        config.apply_env_override(env_override);
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml(raw: &str) -> anyhow::Result<Self> {
        serde_yaml::from_str(raw).context("Couldn't parse config file")
    }

    fn apply_env_override(&mut self, EnvOverride { port }: EnvOverride) {
        if let Some(port) = port {
            self.server.port = port;
        }
    }

    pub fn validate(&self) -> Result<(), Error> {
        let LoadLimits { min_load, max_load } = self.limits;
        if min_load <= Money::zero() {
            return Err(Error::Config(format!(
                "min_load must be positive, got {}",
                min_load
            )));
        }
        if min_load > max_load {
            return Err(Error::Config(format!(
                "min_load {} exceeds max_load {}",
                min_load, max_load
            )));
        }
        if self.fees.fee.is_negative() {
            return Err(Error::Config(format!("fee must not be negative, got {}", self.fees.fee)));
        }
        Ok(())
    }
}

fn default_seed() -> Vec<SeedConfig> {
    vec![
        SeedConfig::Single {
            pan: DEMO_PAN.to_string(),
            balance: Money::new(Decimal::new(29550, 2)),
            status: CardStatus::Active,
        },
        SeedConfig::Generated {
            count: 2000,
            first_pan: 4_060_220_000_000_000,
            balance: Money::from_major(1000),
        },
    ]
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}

fn default_port() -> u16 {
    8000
}

fn default_min_load() -> Money {
    Money::from_major(20)
}

fn default_max_load() -> Money {
    Money::from_major(5000)
}

fn default_fee() -> Money {
    Money::new(Decimal::new(395, 2))
}

fn default_service_name() -> String {
    "Nexus API".to_string()
}

fn default_kiosks() -> u64 {
    2000
}

fn default_dau() -> u64 {
    9_400_000
}

fn default_status() -> String {
    "LIVE".to_string()
}

fn default_exp() -> String {
    DEFAULT_EXPIRY.to_string()
}
