use std::env;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use time::macros::format_description;
use time::UtcOffset;

use crate::options::{Configuration, RangeKey, SizeKey};
use crate::window::EngineOptions;

const APP_DOMAIN: &str = "io";
const APP_ORG: &str = "Timescroll";
const APP_NAME: &str = "timescroll";

const DEFAULT_UTC_OFFSET: &str = "+02:00";

pub struct ConfigLoader {
    paths: ConfigPaths,
}

impl ConfigLoader {
    pub fn discover() -> Result<Self> {
        let paths = ConfigPaths::discover()?;
        Ok(Self { paths })
    }

    pub fn from_paths(paths: ConfigPaths) -> Self {
        Self { paths }
    }

    pub fn paths(&self) -> &ConfigPaths {
        &self.paths
    }

    pub fn load_or_init(&self) -> Result<AppConfig> {
        self.paths.ensure_directories()?;
        if !self.paths.config_file.exists() {
            let mut default_cfg = AppConfig::default();
            default_cfg.post_load();
            self.write_default_config(&default_cfg)?;
            return Ok(default_cfg);
        }

        self.load()
    }

    pub fn load(&self) -> Result<AppConfig> {
        let raw = fs::read_to_string(&self.paths.config_file)
            .with_context(|| format!("reading config {}", self.paths.config_file.display()))?;
        let mut cfg: AppConfig = toml::from_str(&raw).context("parsing config toml")?;
        cfg.post_load();
        Ok(cfg)
    }

    fn write_default_config(&self, cfg: &AppConfig) -> Result<()> {
        let toml = toml::to_string_pretty(cfg).context("serializing default config")?;
        if let Some(parent) = self.paths.config_file.parent() {
            fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
        }
        let mut file = fs::File::create(&self.paths.config_file)
            .with_context(|| format!("creating config {}", self.paths.config_file.display()))?;
        file.write_all(toml.as_bytes())
            .context("writing default config")?;
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct ConfigPaths {
    pub config_dir: PathBuf,
    pub config_file: PathBuf,
    pub state_dir: PathBuf,
    pub log_dir: PathBuf,
}

impl ConfigPaths {
    pub fn discover() -> Result<Self> {
        let override_config = env::var("TIMESCROLL_CONFIG").ok().map(PathBuf::from);

        let project_dirs = ProjectDirs::from(APP_DOMAIN, APP_ORG, APP_NAME)
            .context("resolving XDG project directories")?;

        let config_dir = override_config
            .clone()
            .map(|p| {
                if p.is_dir() {
                    p
                } else {
                    p.parent().map(Path::to_path_buf).unwrap_or(p)
                }
            })
            .unwrap_or_else(|| project_dirs.config_dir().to_path_buf());

        let config_file = override_config
            .filter(|p| p.is_file() || p.extension().is_some())
            .unwrap_or_else(|| config_dir.join("config.toml"));

        let state_dir = project_dirs
            .state_dir()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| project_dirs.data_dir().join("state"));
        let log_dir = state_dir.join("logs");

        Ok(Self {
            config_dir,
            config_file,
            state_dir,
            log_dir,
        })
    }

    pub fn ensure_directories(&self) -> Result<()> {
        for dir in [&self.config_dir, &self.state_dir, &self.log_dir] {
            fs::create_dir_all(dir)
                .with_context(|| format!("creating application directory {}", dir.display()))?;
        }
        Ok(())
    }

    pub fn log_file(&self) -> PathBuf {
        self.log_dir.join("timescroll.log")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Range key the list starts with (see `timescroll options`)
    pub range: String,
    /// Size key the list starts with
    pub size: String,
    /// Edge growths allowed before scrolling stops extending the list
    pub scroll_budget: u32,
    /// Offset labels are rendered in, e.g. "+02:00"
    pub utc_offset: String,
    pub tick_rate_ms: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            range: RangeKey::default().to_string(),
            size: SizeKey::default().to_string(),
            scroll_budget: 50,
            utc_offset: DEFAULT_UTC_OFFSET.to_string(),
            tick_rate_ms: 250,
        }
    }
}

impl AppConfig {
    fn post_load(&mut self) {
        if let Err(err) = RangeKey::parse(&self.range) {
            tracing::warn!(%err, "unknown range in config, falling back to default");
            self.range = RangeKey::default().to_string();
        }
        if let Err(err) = SizeKey::parse(&self.size) {
            tracing::warn!(%err, "unknown size in config, falling back to default");
            self.size = SizeKey::default().to_string();
        }
        if parse_offset(&self.utc_offset).is_none() {
            tracing::warn!(
                offset = %self.utc_offset,
                fallback = DEFAULT_UTC_OFFSET,
                "invalid utc_offset in config"
            );
            self.utc_offset = DEFAULT_UTC_OFFSET.to_string();
        }
    }

    pub fn range_key(&self) -> RangeKey {
        RangeKey::parse(&self.range).unwrap_or_default()
    }

    pub fn size_key(&self) -> SizeKey {
        SizeKey::parse(&self.size).unwrap_or_default()
    }

    pub fn utc_offset(&self) -> UtcOffset {
        parse_offset(&self.utc_offset)
            .or_else(|| parse_offset(DEFAULT_UTC_OFFSET))
            .unwrap_or(UtcOffset::UTC)
    }

    pub fn configuration(&self) -> Configuration {
        Configuration::new(self.range_key(), self.size_key())
    }

    pub fn engine_options(&self) -> EngineOptions {
        EngineOptions {
            scroll_budget: self.scroll_budget,
            utc_offset: self.utc_offset(),
        }
    }

    pub fn tick_rate(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.tick_rate_ms.max(10))
    }
}

fn parse_offset(raw: &str) -> Option<UtcOffset> {
    let format = format_description!("[offset_hour sign:mandatory]:[offset_minute]");
    UtcOffset::parse(raw.trim(), format).ok()
}
