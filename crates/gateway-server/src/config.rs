use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, bail};
use gateway::{CacheCategory, CacheSettings, GatewayConfig, RateLimitConfig};

const DEFAULT_PORT: u16 = 3001;
const DEFAULT_SWEEP_SECS: u64 = 60;

/// Log output format.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug)]
pub(crate) struct Config {
    pub(crate) listen_addr: SocketAddr,
    pub(crate) log_format: LogFormat,
    pub(crate) gateway: GatewayConfig,
    pub(crate) sweep_interval: Duration,
}

impl Config {
    /// Loads `.env`, then reads configuration from the process environment.
    pub(crate) fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads configuration through `lookup`. Malformed values are errors.
    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let listen_addr = match lookup("GATEWAY_LISTEN_ADDR") {
            Some(addr) => addr
                .parse()
                .with_context(|| format!("Invalid GATEWAY_LISTEN_ADDR: {addr}"))?,
            None => {
                let port = parse_var(&lookup, "PORT")?.unwrap_or(DEFAULT_PORT);
                SocketAddr::from(([0, 0, 0, 0], port))
            }
        };

        let log_format = match lookup("GATEWAY_LOG_FORMAT") {
            None => LogFormat::Text,
            Some(format) if format.eq_ignore_ascii_case("text") => LogFormat::Text,
            Some(format) if format.eq_ignore_ascii_case("json") => LogFormat::Json,
            Some(format) => bail!("Invalid GATEWAY_LOG_FORMAT: {format} (expected text or json)"),
        };

        let mut gateway = GatewayConfig::default();
        for category in CacheCategory::ALL {
            let name = category.prefix().to_uppercase();
            let defaults = gateway.cache(category);
            let settings = CacheSettings {
                capacity: parse_var(&lookup, &format!("GATEWAY_{name}_CACHE_CAPACITY"))?
                    .unwrap_or(defaults.capacity),
                ttl: parse_var(&lookup, &format!("GATEWAY_{name}_CACHE_TTL_SECS"))?
                    .map_or(defaults.ttl, Duration::from_secs),
            };
            gateway = gateway.with_cache(category, settings);
        }

        let rate_limit = RateLimitConfig {
            window: parse_var(&lookup, "GATEWAY_RATE_LIMIT_WINDOW_SECS")?
                .map_or(gateway.rate_limit.window, Duration::from_secs),
            max_calls: parse_var(&lookup, "GATEWAY_RATE_LIMIT_MAX_CALLS")?
                .unwrap_or(gateway.rate_limit.max_calls),
        };
        gateway = gateway.with_rate_limit(rate_limit);

        if let Some(batch_size) = parse_var(&lookup, "GATEWAY_BATCH_SIZE")? {
            gateway = gateway.with_batch_size(batch_size);
        }
        gateway.validate()?;

        let sweep_secs: u64 =
            parse_var(&lookup, "GATEWAY_CACHE_SWEEP_SECS")?.unwrap_or(DEFAULT_SWEEP_SECS);
        if sweep_secs == 0 {
            bail!("GATEWAY_CACHE_SWEEP_SECS must be greater than zero");
        }

        Ok(Self {
            listen_addr,
            log_format,
            gateway,
            sweep_interval: Duration::from_secs(sweep_secs),
        })
    }
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> anyhow::Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    lookup(key)
        .map(|value| {
            value
                .trim()
                .parse()
                .with_context(|| format!("Invalid {key}: {value}"))
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn from_vars(vars: &[(&str, &str)]) -> anyhow::Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = from_vars(&[]).unwrap();
        assert_eq!(config.listen_addr, "0.0.0.0:3001".parse().unwrap());
        assert_eq!(config.log_format, LogFormat::Text);
        assert_eq!(config.gateway.batch_size, 10);
        assert_eq!(config.gateway.rate_limit.max_calls, 100);
        assert_eq!(config.sweep_interval, Duration::from_secs(60));
        assert_eq!(
            config.gateway.cache(CacheCategory::Quote).ttl,
            Duration::from_secs(300)
        );
    }

    #[test]
    fn test_port_and_listen_addr() {
        let config = from_vars(&[("PORT", "8080")]).unwrap();
        assert_eq!(config.listen_addr, "0.0.0.0:8080".parse().unwrap());

        let config =
            from_vars(&[("PORT", "8080"), ("GATEWAY_LISTEN_ADDR", "127.0.0.1:9000")]).unwrap();
        assert_eq!(config.listen_addr, "127.0.0.1:9000".parse().unwrap());
    }

    #[test]
    fn test_overrides() {
        let config = from_vars(&[
            ("GATEWAY_LOG_FORMAT", "JSON"),
            ("GATEWAY_BATCH_SIZE", "25"),
            ("GATEWAY_RATE_LIMIT_MAX_CALLS", "50"),
            ("GATEWAY_RATE_LIMIT_WINDOW_SECS", "30"),
            ("GATEWAY_SEARCH_CACHE_TTL_SECS", "120"),
            ("GATEWAY_OPTIONS_CACHE_CAPACITY", "42"),
        ])
        .unwrap();

        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.gateway.batch_size, 25);
        assert_eq!(config.gateway.rate_limit.max_calls, 50);
        assert_eq!(config.gateway.rate_limit.window, Duration::from_secs(30));
        assert_eq!(
            config.gateway.cache(CacheCategory::Search).ttl,
            Duration::from_secs(120)
        );
        assert_eq!(config.gateway.cache(CacheCategory::Options).capacity, 42);
        assert_eq!(config.gateway.cache(CacheCategory::Dividends).capacity, 500);
    }

    #[test]
    fn test_malformed_values_are_rejected() {
        assert!(from_vars(&[("PORT", "eighty")]).is_err());
        assert!(from_vars(&[("GATEWAY_LISTEN_ADDR", "localhost")]).is_err());
        assert!(from_vars(&[("GATEWAY_LOG_FORMAT", "xml")]).is_err());
        assert!(from_vars(&[("GATEWAY_BATCH_SIZE", "0")]).is_err());
        assert!(from_vars(&[("GATEWAY_QUOTE_CACHE_TTL_SECS", "-5")]).is_err());
        assert!(from_vars(&[("GATEWAY_CACHE_SWEEP_SECS", "0")]).is_err());
    }

    #[test]
    fn test_unbounded_durations_are_rejected() {
        let max = u64::MAX.to_string();
        assert!(from_vars(&[("GATEWAY_QUOTE_CACHE_TTL_SECS", &max)]).is_err());
        assert!(from_vars(&[("GATEWAY_RATE_LIMIT_WINDOW_SECS", &max)]).is_err());
        assert!(from_vars(&[("GATEWAY_SEARCH_CACHE_TTL_SECS", "86400")]).is_ok());
    }
}
