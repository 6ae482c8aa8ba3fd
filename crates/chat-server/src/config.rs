use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, bail};

const DEV_JWT_SECRET: &str = "dev-secret-change-me";

/// Logging profile selected by `CHAT_ENV`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    /// Human-readable output for a terminal.
    Local,
    /// JSON at debug level.
    Dev,
    /// JSON at info level.
    Prod,
}

impl FromStr for Environment {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s {
            "local" => Ok(Environment::Local),
            "dev" => Ok(Environment::Dev),
            "prod" => Ok(Environment::Prod),
            other => bail!("unknown environment {other:?}, expected local, dev or prod"),
        }
    }
}

pub struct Config {
    pub env: Environment,
    pub addr: SocketAddr,
    pub db_path: PathBuf,
    pub cipher_key: String,
    pub jwt_secret: String,
    /// Set when `CHAT_JWT_SECRET` was absent and the development key is used.
    pub jwt_secret_is_default: bool,
    pub token_ttl_secs: i64,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the config from any variable source.
    pub fn from_lookup(var: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let env = parse_or(&var, "CHAT_ENV", Environment::Local)?;

        let host = var("CHAT_HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port: u16 = parse_or(&var, "CHAT_PORT", 9000)?;
        let addr: SocketAddr = format!("{host}:{port}")
            .parse()
            .with_context(|| format!("invalid listen address {host}:{port}"))?;

        let db_path = PathBuf::from(var("CHAT_DB_PATH").unwrap_or_else(|| "chat.db".into()));

        let cipher_key = var("CHAT_SECRET")
            .filter(|v| !v.is_empty())
            .context("CHAT_SECRET must be set")?;

        let (jwt_secret, jwt_secret_is_default) =
            match var("CHAT_JWT_SECRET").filter(|v| !v.is_empty()) {
                Some(secret) => (secret, false),
                None => (DEV_JWT_SECRET.to_string(), true),
            };

        let token_ttl_secs: i64 = parse_or(&var, "CHAT_TOKEN_TTL_SECS", 180)?;
        if token_ttl_secs <= 0 {
            bail!("CHAT_TOKEN_TTL_SECS must be positive, got {token_ttl_secs}");
        }

        Ok(Self {
            env,
            addr,
            db_path,
            cipher_key,
            jwt_secret,
            jwt_secret_is_default,
            token_ttl_secs,
        })
    }
}

fn parse_or<T>(var: &impl Fn(&str) -> Option<String>, name: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match var(name) {
        None => Ok(default),
        Some(raw) => raw
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid {name} {raw:?}: {e}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(pairs: &[(&str, &str)]) -> anyhow::Result<Config> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_apply_when_only_the_secret_is_set() {
        let cfg = config(&[("CHAT_SECRET", "0123456789abcdef")]).unwrap();
        assert_eq!(cfg.env, Environment::Local);
        assert_eq!(cfg.addr, "0.0.0.0:9000".parse().unwrap());
        assert_eq!(cfg.db_path, PathBuf::from("chat.db"));
        assert_eq!(cfg.jwt_secret, DEV_JWT_SECRET);
        assert!(cfg.jwt_secret_is_default);
        assert_eq!(cfg.token_ttl_secs, 180);
    }

    #[test]
    fn cipher_secret_is_required() {
        let err = config(&[]).err().unwrap();
        assert!(err.to_string().contains("CHAT_SECRET"));
    }

    #[test]
    fn bad_values_are_reported_by_name() {
        let err = config(&[("CHAT_SECRET", "k"), ("CHAT_PORT", "http")]).err().unwrap();
        assert!(err.to_string().contains("CHAT_PORT"));

        let err = config(&[("CHAT_SECRET", "k"), ("CHAT_ENV", "staging")]).err().unwrap();
        assert!(err.to_string().contains("staging"));

        let err = config(&[("CHAT_SECRET", "k"), ("CHAT_TOKEN_TTL_SECS", "0")]).err().unwrap();
        assert!(err.to_string().contains("must be positive"));
    }

    #[test]
    fn explicit_values_win() {
        let cfg = config(&[
            ("CHAT_SECRET", "k"),
            ("CHAT_ENV", "prod"),
            ("CHAT_HOST", "127.0.0.1"),
            ("CHAT_PORT", "8080"),
            ("CHAT_JWT_SECRET", "s3cret"),
        ])
        .unwrap();
        assert_eq!(cfg.env, Environment::Prod);
        assert_eq!(cfg.addr.port(), 8080);
        assert_eq!(cfg.jwt_secret, "s3cret");
        assert!(!cfg.jwt_secret_is_default);
    }
}
