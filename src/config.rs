//! Runtime configuration from environment variables.
//!
//! DESIGN
//! ======
//! Every knob has a default; an unset or unparsable variable falls back to
//! it rather than failing start-up. `.env` files are loaded by `main` before
//! this runs.

use std::time::Duration;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 3001;
const DEFAULT_ROOM_IDLE_TTL_SECS: u64 = 0;
const DEFAULT_ROOM_REAP_INTERVAL_SECS: u64 = 60;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// How long an empty room survives. `None` keeps rooms forever.
    pub room_idle_ttl: Option<Duration>,
    /// How often the reaper scans for idle rooms.
    pub reap_interval: Duration,
}

impl Config {
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Lets tests avoid the process env.
    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let ttl_secs = parse_or(&lookup, "ROOM_IDLE_TTL_SECS", DEFAULT_ROOM_IDLE_TTL_SECS);
        let reap_secs = parse_or(&lookup, "ROOM_REAP_INTERVAL_SECS", DEFAULT_ROOM_REAP_INTERVAL_SECS).max(1);

        Self {
            host: lookup("HOST")
                .filter(|h| !h.is_empty())
                .unwrap_or_else(|| DEFAULT_HOST.into()),
            port: parse_or(&lookup, "PORT", DEFAULT_PORT),
            room_idle_ttl: (ttl_secs > 0).then(|| Duration::from_secs(ttl_secs)),
            reap_interval: Duration::from_secs(reap_secs),
        }
    }

    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    lookup(key)
        .and_then(|v| v.trim().parse::<T>().ok())
        .unwrap_or(default)
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
