// INICIO DEL ARCHIVO [libs/core/models/src/environment.rs]
/*!
 * =================================================================
 * APARATO: ENVIRONMENT IDENTITY MODELS (V1.0)
 * CLASIFICACIÓN: DOMAIN ENTITIES (L2)
 * RESPONSABILIDAD: IDENTIFICADORES Y PARÁMETROS DE ARRANQUE DE UN TENANT
 * =================================================================
 */

use crate::credential::Credential;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Project/environment identity, as surfaced to the outside world (log
/// lines, diagnostic payloads, the stream metadata).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EnvironmentIdentifiers {
    pub project_key: String,
    pub project_name: String,
    pub environment_key: String,
    pub environment_name: String,
    pub filter_key: Option<String>,
    pub configured_name: Option<String>,
}

impl EnvironmentIdentifiers {
    /// The name shown in operator-facing surfaces: the configured override
    /// if present, else "project/environment".
    pub fn display_name(&self) -> String {
        self.configured_name.clone().unwrap_or_else(|| {
            format!("{}/{}", self.project_name, self.environment_name)
        })
    }
}

/// An expiring server key awaiting activation — not yet primary, becomes
/// primary (via Rotate) once its holder decides to cut over.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExpiringServerKey {
    pub credential: Credential,
    pub expires_at: DateTime<Utc>,
}

/// Minimum input to construct an Environment Context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvironmentParams {
    pub environment_id: String,
    pub identifiers: EnvironmentIdentifiers,
    pub primary_server_key: Credential,
    pub mobile_key: Option<Credential>,
    pub environment_id_credential: Option<Credential>,
    pub expiring_server_key: Option<ExpiringServerKey>,
    pub php_ttl_seconds: u64,
    pub secure_mode: bool,
    pub filter_key: Option<String>,
    pub offline: bool,
}

// FIN DEL ARCHIVO [libs/core/models/src/environment.rs]
