// INICIO DEL ARCHIVO [libs/core/environment/src/config.rs]
/*!
 * =================================================================
 * APARATO: CONFIG SURFACE CONTRACTS (V1.0)
 * CLASIFICACIÓN: APPLICATION PORT (ESTRATO L2)
 * RESPONSABILIDAD: FORMAS QUE EL CARGADOR DE CONFIGURACIÓN (EXTERNO,
 *                   FUERA DE ALCANCE) DEBE PRODUCIR PARA ALIMENTAR EL
 *                   NÚCLEO
 *
 * VISION HIPER-HOLÍSTICA:
 * Ninguna de estas formas sabe leer un archivo TOML/YAML ni un flag de
 * CLI — eso es explícitamente un no-objetivo. Solo se definen
 * como `serde::Deserialize` con `Default` para que quien sí lea
 * archivos tenga un tipo de destino estable.
 * =================================================================
 */

use serde::Deserialize;
use std::time::Duration;

fn default_stream_uri() -> String {
    "https://stream.example-control-plane.invalid".to_string()
}

fn default_events_uri() -> String {
    "https://events.example-control-plane.invalid".to_string()
}

fn default_heartbeat_interval() -> Duration {
    Duration::from_secs(15)
}

fn default_init_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_disconnected_status_threshold() -> Duration {
    Duration::from_secs(60)
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_flush_interval() -> Duration {
    Duration::from_secs(5)
}

fn default_capacity() -> usize {
    10_000
}

fn default_cleanup_interval() -> Duration {
    Duration::from_secs(60)
}

fn default_true() -> bool {
    true
}

/// Relay-wide settings that are not per-environment.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MainConfig {
    #[serde(default = "default_stream_uri")]
    pub stream_uri: String,
    #[serde(default = "default_heartbeat_interval")]
    pub heartbeat_interval: Duration,
    #[serde(default = "default_init_timeout")]
    pub init_timeout: Duration,
    #[serde(default = "default_disconnected_status_threshold")]
    pub disconnected_status_threshold: Duration,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// When set, a control-plane init failure logs and leaves the
    /// environment active (empty store) instead of surfacing a terminal
    /// error on the ready signal.
    #[serde(default)]
    pub ignore_connection_errors: bool,
    /// Interval of the credential-cleanup background loop.
    #[serde(default = "default_cleanup_interval")]
    pub credential_cleanup_interval: Duration,
}

impl Default for MainConfig {
    fn default() -> Self {
        Self {
            stream_uri: default_stream_uri(),
            heartbeat_interval: default_heartbeat_interval(),
            init_timeout: default_init_timeout(),
            disconnected_status_threshold: default_disconnected_status_threshold(),
            log_level: default_log_level(),
            ignore_connection_errors: false,
            credential_cleanup_interval: default_cleanup_interval(),
        }
    }
}

/// Event-pipeline-wide settings (HTTP Event Publisher).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EventsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_flush_interval")]
    pub flush_interval: Duration,
    #[serde(default = "default_capacity")]
    pub capacity: usize,
    #[serde(default = "default_events_uri")]
    pub events_uri: String,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            flush_interval: default_flush_interval(),
            capacity: default_capacity(),
            events_uri: default_events_uri(),
        }
    }
}

/// Outbound proxy settings. Out of scope beyond the shape itself — the
/// core never constructs an HTTP client from this directly; a config
/// loader (external) would use it to build the shared `reqwest::Client`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProxyConfig {
    pub url: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub ntlm_domain: Option<String>,
}

/// Per-environment configuration, as a config loader (external) would
/// deserialize it before calling `EnvironmentContext::spawn`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EnvConfig {
    pub sdk_key: String,
    pub mobile_key: Option<String>,
    pub environment_id: Option<String>,
    pub expiring_sdk_key: Option<String>,
    pub expiring_sdk_key_expiry_unix_seconds: Option<i64>,
    pub ttl_seconds: u64,
    pub secure_mode: bool,
    pub filter_key: Option<String>,
    pub offline: bool,
    pub allowed_origins: Vec<String>,
    pub allowed_headers: Vec<String>,
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self {
            sdk_key: String::new(),
            mobile_key: None,
            environment_id: None,
            expiring_sdk_key: None,
            expiring_sdk_key_expiry_unix_seconds: None,
            ttl_seconds: 0,
            secure_mode: false,
            filter_key: None,
            offline: false,
            allowed_origins: Vec::new(),
            allowed_headers: Vec::new(),
        }
    }
}

// FIN DEL ARCHIVO [libs/core/environment/src/config.rs]
