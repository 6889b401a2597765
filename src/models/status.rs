// src/models/status.rs
use serde::{ Deserialize, Serialize };
use serde_json::Value;

pub const DEFAULT_PLAYERS_ONLINE: u32 = 0;
pub const DEFAULT_PLAYERS_MAX: u32 = 100;
pub const DEFAULT_VERSION: &str = "Unknown";
pub const DEFAULT_MOTD: &str = "StoneMC Server";
pub const DEFAULT_PING: u64 = 0;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Players {
    pub online: u32,
    pub max: u32,
}

/// One normalized status reading. Every field is always populated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerStatusSnapshot {
    pub online: bool,
    pub players: Players,
    pub version: String,
    pub motd: String,
    pub ping: u64,
}

impl ServerStatusSnapshot {
    /// What the proxy serves when the upstream cannot be reached.
    pub fn fallback() -> Self {
        Self {
            online: false,
            players: Players {
                online: DEFAULT_PLAYERS_ONLINE,
                max: DEFAULT_PLAYERS_MAX,
            },
            version: DEFAULT_VERSION.to_string(),
            motd: DEFAULT_MOTD.to_string(),
            ping: DEFAULT_PING,
        }
    }

    /// What a presenter shows before its first fetch resolves.
    pub fn placeholder() -> Self {
        Self {
            online: true,
            players: Players {
                online: 1847,
                max: 2000,
            },
            version: "1.20.1".to_string(),
            motd: DEFAULT_MOTD.to_string(),
            ping: 45,
        }
    }
}

/// Raw upstream payload. Anything missing or of the wrong type is `None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpstreamStatus {
    pub online: Option<bool>,
    pub players_online: Option<u32>,
    pub players_max: Option<u32>,
    pub version: Option<String>,
    pub motd: Option<String>,
    pub ping: Option<u64>,
}

impl UpstreamStatus {
    pub fn from_json(value: &Value) -> Self {
        let players = value.get("players");

        Self {
            online: value.get("online").and_then(Value::as_bool),
            // mcapi.us reports the current count as `now`
            players_online: players
                .and_then(|p| p.get("online").or_else(|| p.get("now")))
                .and_then(as_count)
                .map(saturate_u32),
            players_max: players
                .and_then(|p| p.get("max"))
                .and_then(as_count)
                .map(saturate_u32),
            version: value.get("version").and_then(as_text),
            motd: value.get("motd").and_then(as_text),
            ping: value.get("ping").and_then(as_count),
        }
    }
}

impl From<UpstreamStatus> for ServerStatusSnapshot {
    fn from(upstream: UpstreamStatus) -> Self {
        // Zero and empty strings select the default, same as an absent field.
        Self {
            online: upstream.online.unwrap_or(false),
            players: Players {
                online: upstream.players_online
                    .filter(|n| *n != 0)
                    .unwrap_or(DEFAULT_PLAYERS_ONLINE),
                max: upstream.players_max.filter(|n| *n != 0).unwrap_or(DEFAULT_PLAYERS_MAX),
            },
            version: upstream.version
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| DEFAULT_VERSION.to_string()),
            motd: upstream.motd
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| DEFAULT_MOTD.to_string()),
            ping: upstream.ping.filter(|n| *n != 0).unwrap_or(DEFAULT_PING),
        }
    }
}

fn as_count(value: &Value) -> Option<u64> {
    if let Some(n) = value.as_u64() {
        return Some(n);
    }
    match value.as_f64() {
        Some(f) if f.is_finite() && f >= 0.0 => Some(f.trunc() as u64),
        _ => None,
    }
}

fn as_text(value: &Value) -> Option<String> {
    value.as_str().map(str::to_string)
}

fn saturate_u32(n: u64) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn normalize(value: Value) -> ServerStatusSnapshot {
        UpstreamStatus::from_json(&value).into()
    }

    #[test]
    fn partial_payload_gets_defaults() {
        let snapshot = normalize(json!({
            "online": true,
            "players": { "online": 5 },
            "version": "1.21"
        }));

        assert_eq!(snapshot, ServerStatusSnapshot {
            online: true,
            players: Players { online: 5, max: 100 },
            version: "1.21".to_string(),
            motd: "StoneMC Server".to_string(),
            ping: 0,
        });
    }

    #[test]
    fn empty_object_normalizes_to_fallback() {
        assert_eq!(normalize(json!({})), ServerStatusSnapshot::fallback());
    }

    #[test]
    fn falsy_values_select_defaults() {
        let snapshot = normalize(json!({
            "online": null,
            "players": { "online": 0, "max": 0 },
            "version": "",
            "motd": "",
            "ping": 0
        }));

        assert_eq!(snapshot, ServerStatusSnapshot::fallback());
    }

    #[test]
    fn full_payload_passes_through() {
        let snapshot = normalize(json!({
            "online": true,
            "players": { "online": 312, "max": 500 },
            "version": "Paper 1.20.4",
            "motd": "Welcome to StoneMC",
            "ping": 37,
            "favicon": "data:image/png;base64,AAAA"
        }));

        assert!(snapshot.online);
        assert_eq!(snapshot.players, Players { online: 312, max: 500 });
        assert_eq!(snapshot.version, "Paper 1.20.4");
        assert_eq!(snapshot.motd, "Welcome to StoneMC");
        assert_eq!(snapshot.ping, 37);
    }

    #[test]
    fn accepts_mcapi_now_field() {
        let snapshot = normalize(json!({ "online": true, "players": { "now": 12, "max": 60 } }));
        assert_eq!(snapshot.players, Players { online: 12, max: 60 });
    }

    #[test]
    fn wrongly_typed_fields_are_ignored() {
        let snapshot = normalize(json!({
            "online": "yes",
            "players": { "online": -4, "max": "lots" },
            "version": 17,
            "motd": { "text": "hi" },
            "ping": 12.9
        }));

        assert!(!snapshot.online);
        assert_eq!(snapshot.players, Players { online: 0, max: 100 });
        assert_eq!(snapshot.version, DEFAULT_VERSION);
        assert_eq!(snapshot.motd, DEFAULT_MOTD);
        assert_eq!(snapshot.ping, 12);
    }

    #[test]
    fn serializes_to_the_public_shape() {
        let body = serde_json::to_value(ServerStatusSnapshot::fallback()).unwrap();
        assert_eq!(body, json!({
            "online": false,
            "players": { "online": 0, "max": 100 },
            "version": "Unknown",
            "motd": "StoneMC Server",
            "ping": 0
        }));
    }

    #[test]
    fn strict_decode_rejects_partial_snapshot() {
        let partial = json!({ "online": true, "players": { "online": 1 } });
        assert!(serde_json::from_value::<ServerStatusSnapshot>(partial).is_err());
    }
}
