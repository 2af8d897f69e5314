//! Startup configuration: environment variables first, CLI flags override.
//! Loaded once; a missing signing secret or an unparsable number stops startup.

use std::fmt::{Debug, Formatter};
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};

pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_DB_NAME: &str = "techHubDB";
pub const DEFAULT_TOKEN_TTL_DAYS: i64 = 365;
pub const DEFAULT_ORIGIN: &str = "http://localhost:5173";
const MAX_TOKEN_TTL_DAYS: i64 = 36_500;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    pub fn parse(s: &str) -> Self {
        if s.trim().eq_ignore_ascii_case("production") { Environment::Production } else { Environment::Development }
    }
}

#[derive(Clone)]
pub struct Config {
    pub port: u16,
    pub token_secret: String,
    pub environment: Environment,
    pub allowed_origins: Vec<String>,
    /// Persistence folder; `None` keeps the store in memory.
    pub db_folder: Option<PathBuf>,
    pub db_name: String,
    pub token_ttl_days: i64,
}

impl Debug for Config {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("port", &self.port)
            .field("token_secret", &"<redacted>")
            .field("environment", &self.environment)
            .field("allowed_origins", &self.allowed_origins)
            .field("db_folder", &self.db_folder)
            .field("db_name", &self.db_name)
            .field("token_ttl_days", &self.token_ttl_days)
            .finish()
    }
}

fn parse_num<T: std::str::FromStr>(name: &str, raw: &str) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.trim().parse::<T>().with_context(|| format!("invalid value for {name}: '{raw}'"))
}

fn parse_flag_value(args: &[String], flag: &str) -> Option<String> {
    let mut i = 0;
    while i < args.len() {
        if args[i] == flag && i + 1 < args.len() {
            return Some(args[i + 1].clone());
        }
        i += 1;
    }
    None
}

pub fn has_flag(args: &[String], flag: &str) -> bool {
    args.iter().any(|a| a == flag)
}

pub const USAGE: &str = "TechHub server\n\nUSAGE:\n  techhub [--port N] [--db-folder PATH]\n\nOPTIONS:\n  --port N            HTTP port (env: PORT, default 5000)\n  --db-folder PATH    Persist collections under PATH (env: TECHHUB_DB_FOLDER, default in-memory)\n\nENVIRONMENT:\n  ACCESS_TOKEN_SECRET      token signing secret (required)\n  TECHHUB_ENV              'production' switches cookies to SameSite=None; Secure\n  TECHHUB_ALLOWED_ORIGINS  comma-separated CORS origins (default http://localhost:5173)\n  TECHHUB_DB_NAME          database name (default techHubDB)\n  TECHHUB_TOKEN_TTL_DAYS   token lifetime in days (default 365)\n";

impl Config {
    /// Defaults with the given secret; used by tests and embedders.
    pub fn with_secret(secret: impl Into<String>) -> Self {
        Self {
            port: DEFAULT_PORT,
            token_secret: secret.into(),
            environment: Environment::Development,
            allowed_origins: vec![DEFAULT_ORIGIN.to_string()],
            db_folder: None,
            db_name: DEFAULT_DB_NAME.to_string(),
            token_ttl_days: DEFAULT_TOKEN_TTL_DAYS,
        }
    }

    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    /// Build from an arbitrary variable lookup.
    pub fn from_lookup<F: Fn(&str) -> Option<String>>(get: F) -> Result<Self> {
        let token_secret = get("ACCESS_TOKEN_SECRET")
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| anyhow!("ACCESS_TOKEN_SECRET must be set to a non-empty value"))?;
        let mut cfg = Self::with_secret(token_secret);
        if let Some(p) = get("PORT") {
            cfg.port = parse_num("PORT", &p)?;
        }
        if let Some(e) = get("TECHHUB_ENV") {
            cfg.environment = Environment::parse(&e);
        }
        if let Some(o) = get("TECHHUB_ALLOWED_ORIGINS") {
            cfg.allowed_origins = o.split(',').map(str::trim).filter(|s| !s.is_empty()).map(str::to_string).collect();
        }
        if let Some(d) = get("TECHHUB_DB_FOLDER").filter(|s| !s.trim().is_empty()) {
            cfg.db_folder = Some(PathBuf::from(d));
        }
        if let Some(n) = get("TECHHUB_DB_NAME").filter(|s| !s.trim().is_empty()) {
            cfg.db_name = n;
        }
        if let Some(t) = get("TECHHUB_TOKEN_TTL_DAYS") {
            let days: i64 = parse_num("TECHHUB_TOKEN_TTL_DAYS", &t)?;
            if !(1..=MAX_TOKEN_TTL_DAYS).contains(&days) {
                return Err(anyhow!("TECHHUB_TOKEN_TTL_DAYS must be between 1 and {MAX_TOKEN_TTL_DAYS}, got {days}"));
            }
            cfg.token_ttl_days = days;
        }
        Ok(cfg)
    }

    /// CLI arguments override environment.
    pub fn apply_args(&mut self, args: &[String]) -> Result<()> {
        if let Some(p) = parse_flag_value(args, "--port") {
            self.port = parse_num("--port", &p)?;
        }
        if let Some(d) = parse_flag_value(args, "--db-folder") {
            self.db_folder = Some(PathBuf::from(d));
        }
        Ok(())
    }

    pub fn is_production(&self) -> bool { self.environment == Environment::Production }
}
