#![allow(dead_code)]
//! Engine-wide tunables, loaded once into a `lazy_static` global the way the
//! teacher loads `SERVICE_CONFIG`. Unlike the teacher's `ServiceConfig` this
//! crate holds no secrets — persistence, transport and auth are external
//! collaborators (spec.md §1) so only the rules engine's own timers and
//! mode defaults live here.

use clap::Parser;
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};

#[derive(Parser, Debug)]
#[command(name = "catan-session-core")]
struct Arguments {
    /// Optional path to a JSON file of `EngineConfig` overrides.
    #[arg(long, env = "CATAN_CONFIG_FILE")]
    config_file: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineConfig {
    /// Seconds a player has to act once it becomes their turn (§4.6).
    pub turn_seconds: u32,
    /// Seconds given to reply to a discard prompt before a random discard (S4).
    pub discard_seconds: u32,
    /// Seconds of inactivity before a seat is flagged as a bot (§4.6).
    pub bot_after_seconds: u32,
    /// How often the ticker flushes the pending journal batch (§4.6).
    pub journal_flush_seconds: u32,
    /// Base discard limit before +2-per-wall adjustments (C&K), §4.4.
    pub base_discard_limit: u32,
    /// Whether Cities & Knights rules are active by default for new sessions.
    pub cities_and_knights_default: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            turn_seconds: 120,
            discard_seconds: 30,
            bot_after_seconds: 120,
            journal_flush_seconds: 5,
            base_discard_limit: 7,
            cities_and_knights_default: false,
        }
    }
}

impl EngineConfig {
    pub fn from_file(path: &str) -> std::io::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        serde_json::from_str(&contents)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))
    }
}

/// Initializes logging (spec.md SPEC_FULL.md's ambient logging section):
/// `log4rs` from a file if `CATAN_LOG_CONFIG` names one, the teacher's
/// heavier-weight option for structured appenders/rotation, falling back to
/// `env_logger` so a binary that never sets the variable still logs.
pub fn init_logging() {
    let path = std::env::var("CATAN_LOG_CONFIG").ok();
    let loaded = path.as_deref().map(|p| log4rs::init_file(p, Default::default())).transpose();

    if !matches!(loaded, Ok(Some(()))) {
        if let Some(p) = &path {
            log::warn!("failed to load log4rs config from {}; falling back to env_logger", p);
        }
        let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).try_init();
    }
}

lazy_static! {
    /// Loaded from `--config-file`/`CATAN_CONFIG_FILE` if present, otherwise
    /// `EngineConfig::default()`. Mirrors the teacher's `SERVICE_CONFIG` but
    /// never panics on a missing file — the engine is usable as a library
    /// with no configuration at all.
    pub static ref ENGINE_CONFIG: EngineConfig = {
        let args = Arguments::try_parse().ok();
        let path = args
            .and_then(|a| a.config_file)
            .or_else(|| std::env::var("CATAN_CONFIG_FILE").ok());

        match path {
            Some(p) => match EngineConfig::from_file(&p) {
                Ok(cfg) => cfg,
                Err(e) => {
                    log::warn!("failed to load engine config from {}: {}; using defaults", p, e);
                    EngineConfig::default()
                }
            },
            None => EngineConfig::default(),
        }
    };
}
