//! Server configuration, read from the environment.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use doodle_protocol::RoomId;
use doodle_room::RoomConfig;

/// Everything the server needs to start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Address the WebSocket listener binds to.
    pub bind_addr: String,

    /// Settings applied to every room.
    pub room: RoomConfig,

    /// Corpus locale; the file loaded is `<clue_dir>/<locale>.json`.
    pub locale: String,
    pub clue_dir: PathBuf,

    /// Base URL of the telemetry collector. `None` disables export.
    pub export_url: Option<String>,

    /// Create rooms on first join instead of rejecting unknown ids.
    pub auto_create_rooms: bool,

    /// Rooms created at startup.
    pub rooms: Vec<RoomId>,

    /// How long a new connection has to send its `join`.
    pub handshake_timeout: Duration,

    /// A connection that sends nothing for this long is closed. Room
    /// broadcasts do not count, so watching clients send heartbeats.
    pub idle_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
            room: RoomConfig::default(),
            locale: "pl".to_string(),
            clue_dir: PathBuf::from("clues"),
            export_url: None,
            auto_create_rooms: false,
            rooms: Vec::new(),
            handshake_timeout: Duration::from_secs(5),
            idle_timeout: Duration::from_secs(60),
        }
    }
}

impl ServerConfig {
    /// Reads the configuration from process environment variables.
    ///
    /// | variable                   | default        |
    /// |----------------------------|----------------|
    /// | `DOODLE_BIND`              | `0.0.0.0:8080` |
    /// | `TIMEOUT_SECONDS`          | `15`           |
    /// | `CLOSE_THRESHOLD`          | `60`           |
    /// | `CLUE_LOCALE`              | `pl`           |
    /// | `CLUE_DIR`                 | `clues`        |
    /// | `EXPORT_RESULTS_URL`       | unset          |
    /// | `DOODLE_AUTO_CREATE_ROOMS` | `false`        |
    /// | `DOODLE_ROOMS`             | empty          |
    ///
    /// A value that does not parse is logged and replaced by the default.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`from_env`](Self::from_env), reading from `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let text = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let turn_secs: u64 = parsed(
            "TIMEOUT_SECONDS",
            text("TIMEOUT_SECONDS"),
            defaults.room.turn_timeout.as_secs(),
        );
        let close_threshold: u8 = parsed(
            "CLOSE_THRESHOLD",
            text("CLOSE_THRESHOLD"),
            defaults.room.close_threshold,
        );
        let room = RoomConfig::default()
            .with_turn_timeout(Duration::from_secs(turn_secs))
            .with_close_threshold(close_threshold)
            .validated();

        let rooms = text("DOODLE_ROOMS")
            .map(|list| {
                list.split(',')
                    .map(str::trim)
                    .filter(|id| !id.is_empty())
                    .map(RoomId::new)
                    .collect()
            })
            .unwrap_or_default();

        Self {
            bind_addr: text("DOODLE_BIND").unwrap_or(defaults.bind_addr),
            room,
            locale: text("CLUE_LOCALE").unwrap_or(defaults.locale),
            clue_dir: text("CLUE_DIR").map(PathBuf::from).unwrap_or(defaults.clue_dir),
            export_url: text("EXPORT_RESULTS_URL"),
            auto_create_rooms: parsed(
                "DOODLE_AUTO_CREATE_ROOMS",
                text("DOODLE_AUTO_CREATE_ROOMS"),
                defaults.auto_create_rooms,
            ),
            rooms,
            ..defaults
        }
    }
}

fn parsed<T>(key: &str, value: Option<String>, default: T) -> T
where
    T: FromStr + std::fmt::Display,
{
    let Some(value) = value else {
        return default;
    };
    match value.parse() {
        Ok(parsed) => parsed,
        Err(_) => {
            tracing::warn!(key, %value, %default, "unparseable value, using default");
            default
        }
    }
}
