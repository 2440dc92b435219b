use crate::mjpeg::MjpegBridge;
use crate::relay::SignalingRelay;
use anyhow::Context;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

/// What happens to signals cached before a second peer joined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PendingPolicy {
    /// Keep them but never deliver them
    #[default]
    Retain,
    /// Deliver them to every peer once the second peer connects
    FlushOnQuorum,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_host: String,
    /// HTTP port; the relay listens on the next one
    pub port: u16,
    pub static_dir: PathBuf,
    pub sink_timeout: Duration,
    pub sink_buffer: usize,
    pub pending_policy: PendingPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_host: "0.0.0.0".to_string(),
            port: 8888,
            static_dir: PathBuf::from("public"),
            sink_timeout: Duration::from_millis(2000),
            sink_buffer: 8,
            pending_policy: PendingPolicy::Retain,
        }
    }
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let defaults = Config::default();

        let bind_host = std::env::var("BIND_HOST").unwrap_or(defaults.bind_host);
        let port = env_or("PORT", defaults.port)?;
        let static_dir = std::env::var("STATIC_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.static_dir);

        let sink_timeout = env_or("MJPEG_SINK_TIMEOUT_MS", 2000u64).map(Duration::from_millis)?;
        let sink_buffer = env_or("MJPEG_SINK_BUFFER", defaults.sink_buffer)?;
        if sink_buffer == 0 {
            anyhow::bail!("MJPEG_SINK_BUFFER must be at least 1");
        }

        let pending_policy = match std::env::var("RELAY_FLUSH_PENDING").as_deref() {
            Ok("1") | Ok("true") => PendingPolicy::FlushOnQuorum,
            Ok(other) if !other.is_empty() && other != "0" && other != "false" => {
                tracing::warn!("Unrecognized RELAY_FLUSH_PENDING value {:?}, keeping default", other);
                PendingPolicy::Retain
            }
            _ => PendingPolicy::Retain,
        };

        let config = Config {
            bind_host,
            port,
            static_dir,
            sink_timeout,
            sink_buffer,
            pending_policy,
        };
        config.relay_port()?;
        Ok(config)
    }

    pub fn relay_port(&self) -> anyhow::Result<u16> {
        self.port
            .checked_add(1)
            .with_context(|| format!("No relay port available above HTTP port {}", self.port))
    }

    pub fn http_address(&self) -> String {
        format!("{}:{}", self.bind_host, self.port)
    }

    pub fn relay_address(&self) -> anyhow::Result<String> {
        Ok(format!("{}:{}", self.bind_host, self.relay_port()?))
    }
}

fn env_or<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(value) => value
            .trim()
            .parse()
            .with_context(|| format!("Invalid value for {key}: {value:?}")),
        Err(_) => Ok(default),
    }
}

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub relay: Arc<SignalingRelay>,
    pub bridge: Arc<MjpegBridge>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let bridge = Arc::new(MjpegBridge::new(config.sink_timeout, config.sink_buffer));
        let relay = Arc::new(SignalingRelay::new(bridge.clone(), config.pending_policy));

        Self {
            config,
            relay,
            bridge,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relay_listens_one_above_http() {
        let config = Config::default();
        assert_eq!(config.relay_port().unwrap(), 8889);
        assert_eq!(config.http_address(), "0.0.0.0:8888");
        assert_eq!(config.relay_address().unwrap(), "0.0.0.0:8889");
    }

    #[test]
    fn highest_port_leaves_no_room_for_relay() {
        let config = Config {
            port: u16::MAX,
            ..Config::default()
        };
        assert!(config.relay_port().is_err());
    }

    #[test]
    fn state_shares_one_bridge() {
        let state = AppState::new(Config::default());
        assert!(Arc::ptr_eq(&state.bridge, state.relay.bridge()));
    }
}
