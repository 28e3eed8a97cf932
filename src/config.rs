// Copyright 2025 Memophor Labs
// SPDX-License-Identifier: Apache-2.0

//! Environment-driven configuration for the catalog proxy.

use std::env;
use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{bail, Context, Result};

use crate::cache::CachePolicy;
use crate::upstream::RetryPolicy;

const DEFAULT_USER_AGENT: &str = concat!("game-catalog-proxy/", env!("CARGO_PKG_VERSION"));

/// Where and how to reach the two upstream services.
#[derive(Debug, Clone)]
pub struct UpstreamConfig {
    pub games_base_url: String,
    pub thumbnails_base_url: String,
    pub timeout: Duration,
    pub user_agent: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub listen_addr: SocketAddr,
    pub upstream: UpstreamConfig,
    pub retry: RetryPolicy,
    pub max_batch_size: usize,
    pub cache: CachePolicy,
    pub coalesce: bool,
    pub max_term_length: usize,
    pub json_logs: bool,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let listen_addr: SocketAddr = env::var("GAMES_PROXY_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:3000".to_string())
            .parse()
            .context("invalid GAMES_PROXY_ADDR")?;

        let timeout = parse_millis("GAMES_PROXY_UPSTREAM_TIMEOUT_MS", 5_000)?;
        if timeout.is_zero() {
            bail!("GAMES_PROXY_UPSTREAM_TIMEOUT_MS must be greater than zero");
        }

        let upstream = UpstreamConfig {
            games_base_url: env::var("GAMES_PROXY_GAMES_API_URL")
                .unwrap_or_else(|_| "https://games.roblox.com".to_string()),
            thumbnails_base_url: env::var("GAMES_PROXY_THUMBNAILS_API_URL")
                .unwrap_or_else(|_| "https://thumbnails.roblox.com".to_string()),
            timeout,
            user_agent: env::var("GAMES_PROXY_USER_AGENT")
                .unwrap_or_else(|_| DEFAULT_USER_AGENT.to_string()),
        };

        let retry = RetryPolicy {
            max_retries: parse_number("GAMES_PROXY_MAX_RETRIES", 0)?,
            backoff: parse_millis("GAMES_PROXY_RETRY_BACKOFF_MS", 250)?,
        };

        let max_batch_size = parse_number("GAMES_PROXY_MAX_BATCH_SIZE", 50)?;
        if max_batch_size == 0 {
            bail!("GAMES_PROXY_MAX_BATCH_SIZE must be greater than zero");
        }

        let stale_while_revalidate = match env::var("GAMES_PROXY_STALE_WHILE_REVALIDATE") {
            Ok(raw) if !raw.trim().is_empty() => Some(Duration::from_secs(
                raw.trim()
                    .parse()
                    .context("GAMES_PROXY_STALE_WHILE_REVALIDATE must be an integer number of seconds")?,
            )),
            _ => None,
        };

        let cache = CachePolicy {
            shared_max_age: Duration::from_secs(parse_number("GAMES_PROXY_CACHE_MAX_AGE", 300)?),
            stale_while_revalidate,
        };

        Ok(Self {
            listen_addr,
            upstream,
            retry,
            max_batch_size,
            cache,
            coalesce: parse_flag("GAMES_PROXY_COALESCE", false)?,
            max_term_length: parse_number("GAMES_PROXY_MAX_TERM_LENGTH", 200)?,
            json_logs: env::var("GAMES_PROXY_LOG_FORMAT")
                .map(|format| format.eq_ignore_ascii_case("json"))
                .unwrap_or(false),
        })
    }

    pub fn listen_addr(&self) -> SocketAddr {
        self.listen_addr
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            upstream: UpstreamConfig {
                games_base_url: "https://games.roblox.com".to_string(),
                thumbnails_base_url: "https://thumbnails.roblox.com".to_string(),
                timeout: Duration::from_millis(5_000),
                user_agent: DEFAULT_USER_AGENT.to_string(),
            },
            retry: RetryPolicy::NONE,
            max_batch_size: 50,
            cache: CachePolicy::default(),
            coalesce: false,
            max_term_length: 200,
            json_logs: false,
        }
    }
}

fn parse_number<T>(env_key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr + ToString,
{
    let raw = env::var(env_key).unwrap_or_else(|_| default.to_string());
    raw.trim()
        .parse()
        .map_err(|_| anyhow::anyhow!("{env_key} must be a non-negative integer, got {raw:?}"))
}

fn parse_millis(env_key: &str, default_ms: u64) -> Result<Duration> {
    parse_number(env_key, default_ms).map(Duration::from_millis)
}

fn parse_flag(env_key: &str, default: bool) -> Result<bool> {
    match env::var(env_key) {
        Err(_) => Ok(default),
        Ok(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" | "" => Ok(false),
            _ => bail!("{env_key} must be a boolean, got {raw:?}"),
        },
    }
}
