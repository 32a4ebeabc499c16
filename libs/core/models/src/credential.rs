// INICIO DEL ARCHIVO [libs/core/models/src/credential.rs]
/*!
 * =================================================================
 * APARATO: CREDENTIAL SUM TYPE (V1.0 - TENANT AUTHORIZATION)
 * CLASIFICACIÓN: DOMAIN ENTITIES (L2)
 * RESPONSABILIDAD: REPRESENTACIÓN CERRADA DE LAS TRES ESTIRPES DE LLAVE SDK
 *
 * VISION HIPER-HOLÍSTICA:
 * ServerKey, MobileKey y EnvironmentID son una unión etiquetada cerrada;
 * el comportamiento especial de gracia solo existe para ServerKey,
 * por lo que el tipo lo modela en el nivel de variante, no en un flag.
 * =================================================================
 */

use serde::{Deserialize, Serialize};
use std::fmt;

/// Una de las tres estirpes de credencial que un SDK puede presentar.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(tag = "kind", content = "value")]
pub enum Credential {
    ServerKey(String),
    MobileKey(String),
    EnvironmentID(String),
}

/// Discriminante de estirpe sin el cuerpo, usada para comparar "mismo tipo
/// de credencial" sin clonar el valor entero.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum CredentialKind {
    ServerKey,
    MobileKey,
    EnvironmentID,
}

impl fmt::Display for CredentialKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            CredentialKind::ServerKey => "ServerKey",
            CredentialKind::MobileKey => "MobileKey",
            CredentialKind::EnvironmentID => "EnvironmentID",
        };
        write!(f, "{label}")
    }
}

impl Credential {
    pub fn kind(&self) -> CredentialKind {
        match self {
            Credential::ServerKey(_) => CredentialKind::ServerKey,
            Credential::MobileKey(_) => CredentialKind::MobileKey,
            Credential::EnvironmentID(_) => CredentialKind::EnvironmentID,
        }
    }

    pub fn body(&self) -> &str {
        match self {
            Credential::ServerKey(body) => body,
            Credential::MobileKey(body) => body,
            Credential::EnvironmentID(body) => body,
        }
    }

    /// Non-empty body. An empty primary slot is the "absent" state.
    pub fn is_defined(&self) -> bool {
        !self.body().is_empty()
    }

    /// Last four characters, prefixed with an ellipsis. Used anywhere a
    /// credential might be logged.
    pub fn masked(&self) -> String {
        let body = self.body();
        if body.len() <= 4 {
            format!("...{body}")
        } else {
            format!("...{}", &body[body.len() - 4..])
        }
    }

    /// The value this credential contributes to an outbound `Authorization`
    /// header. EnvironmentID never authenticates outbound requests.
    pub fn authorization_header_value(&self) -> &str {
        match self {
            Credential::ServerKey(body) => body,
            Credential::MobileKey(body) => body,
            Credential::EnvironmentID(_) => "",
        }
    }
}

impl fmt::Display for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.kind(), self.masked())
    }
}

/// `(filter-key, credential)`, the key the Environment Registry contract is
/// keyed by.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct ScopedCredential {
    pub filter_key: Option<String>,
    pub credential: Credential,
}

impl ScopedCredential {
    pub fn new(filter_key: Option<String>, credential: Credential) -> Self {
        Self { filter_key, credential }
    }
}

// FIN DEL ARCHIVO [libs/core/models/src/credential.rs]
