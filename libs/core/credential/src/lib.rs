// INICIO DEL ARCHIVO [libs/core/credential/src/lib.rs]
/*!
 * =================================================================
 * APARATO: CREDENTIAL ROTATOR (V1.0 - SOVEREIGN KEY STATE MACHINE)
 * CLASIFICACIÓN: DOMAIN SERVICE (ESTRATO L2)
 * RESPONSABILIDAD: AUTORIDAD ÚNICA SOBRE QUÉ CREDENCIALES AUTORIZAN
 *                   CADA ESTIRPE DE SDK, Y EMISIÓN DE CAMBIOS
 *
 * VISION HIPER-HOLÍSTICA:
 * El estado vive detrás de un único RwLock; cada transición
 * (Rotate/RotateWithGrace/StepTime) toma el lock de escritura por el
 * tiempo mínimo indispensable. No hay await dentro de la sección
 * crítica: la rotación es aritmética de estado pura, no I/O.
 * =================================================================
 */

use chrono::{DateTime, Utc};
use relay_core_models::{Credential, CredentialKind};
use std::collections::HashMap;
use std::sync::RwLock;
use thiserror::Error;
use tracing::{trace, warn};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RotatorError {
    #[error("grace period is only applicable to ServerKey, got {0}")]
    GraceNotApplicable(CredentialKind),
}

/// Input to `RotateWithGrace`: the deprecated key being granted a grace
/// window, its absolute expiry, and the instant the call is evaluated at.
#[derive(Debug, Clone)]
pub struct GraceSpec {
    pub key: Credential,
    pub expiry: DateTime<Utc>,
    pub now: DateTime<Utc>,
}

/// Additions and expirations accumulated since the previous `StepTime`
/// call. Additions are listed (and must be processed by the caller) before
/// expirations, so a caller that registers new credentials before
/// unregistering lapsed ones never leaves a channel briefly unservable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CredentialChangeBatch {
    pub additions: Vec<Credential>,
    pub expirations: Vec<Credential>,
}

impl CredentialChangeBatch {
    pub fn is_empty(&self) -> bool {
        self.additions.is_empty() && self.expirations.is_empty()
    }
}

struct RotatorInner {
    primary_server_key: Option<Credential>,
    primary_mobile_key: Option<Credential>,
    primary_environment_id: Option<Credential>,
    /// deprecated ServerKey body -> absolute expiry. Only ServerKey ever
    /// passes through deprecation; Mobile/EnvironmentID rotate immediately.
    deprecated: HashMap<String, DateTime<Utc>>,
    pending_additions: Vec<Credential>,
    pending_expirations: Vec<Credential>,
}

impl RotatorInner {
    fn new() -> Self {
        Self {
            primary_server_key: None,
            primary_mobile_key: None,
            primary_environment_id: None,
            deprecated: HashMap::new(),
            pending_additions: Vec::new(),
            pending_expirations: Vec::new(),
        }
    }

    fn primary_slot_mut(&mut self, kind: CredentialKind) -> &mut Option<Credential> {
        match kind {
            CredentialKind::ServerKey => &mut self.primary_server_key,
            CredentialKind::MobileKey => &mut self.primary_mobile_key,
            CredentialKind::EnvironmentID => &mut self.primary_environment_id,
        }
    }

    fn primary_slot(&self, kind: CredentialKind) -> &Option<Credential> {
        match kind {
            CredentialKind::ServerKey => &self.primary_server_key,
            CredentialKind::MobileKey => &self.primary_mobile_key,
            CredentialKind::EnvironmentID => &self.primary_environment_id,
        }
    }
}

/// Owns the per-environment credential state. Guarded by a single
/// `RwLock`; every public method takes the lock for the minimum time its
/// bookkeeping needs.
pub struct CredentialRotator {
    inner: RwLock<RotatorInner>,
}

impl Default for CredentialRotator {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialRotator {
    pub fn new() -> Self {
        Self { inner: RwLock::new(RotatorInner::new()) }
    }

    /// Populates the primary slots from `credentials`. Undefined bodies are
    /// skipped. Does not emit additions/expirations — this is startup
    /// population, not a rotation event.
    pub fn initialize(&self, credentials: impl IntoIterator<Item = Credential>) {
        let mut state = self.inner.write().expect("rotator lock poisoned");
        for credential in credentials {
            if !credential.is_defined() {
                trace!(kind = %credential.kind(), "skipping undefined credential during initialize");
                continue;
            }
            *state.primary_slot_mut(credential.kind()) = Some(credential);
        }
    }

    /// Seeds a ServerKey directly into the deprecated map at a known expiry,
    /// without going through `RotateWithGrace`. Mirrors `initialize`'s
    /// no-events-emitted contract: this is startup population (an
    /// environment constructed with an already-expiring server key) rather
    /// than a rotation, so it must not appear in the next `StepTime` batch's
    /// additions. Skips an undefined or already-elapsed key.
    pub fn initialize_deprecated(&self, key: Credential, expiry: DateTime<Utc>, now: DateTime<Utc>) {
        if !key.is_defined() {
            return;
        }
        if expiry <= now {
            warn!(key = %key.masked(), "expiring server key supplied at construction is already past its expiry; ignoring");
            return;
        }
        let mut state = self.inner.write().expect("rotator lock poisoned");
        state.deprecated.insert(key.body().to_string(), expiry);
    }

    /// Immediate revocation of any previous primary of the same kind. For
    /// ServerKey the previous key is deprecated with an already-elapsed
    /// expiry so the next `StepTime` call sweeps it into `expirations`
    /// unconditionally; for Mobile/EnvironmentID there is no grace state at
    /// all, so the previous key is queued directly as an expiration.
    pub fn rotate(&self, primary: Credential) {
        let kind = primary.kind();
        let mut state = self.inner.write().expect("rotator lock poisoned");

        let previous = state.primary_slot_mut(kind).replace(primary.clone());
        state.pending_additions.push(primary);

        if let Some(previous) = previous {
            if !previous.is_defined() {
                return;
            }
            match kind {
                CredentialKind::ServerKey => {
                    state.deprecated.insert(previous.body().to_string(), DateTime::<Utc>::MIN_UTC);
                }
                CredentialKind::MobileKey | CredentialKind::EnvironmentID => {
                    state.pending_expirations.push(previous);
                }
            }
        }
    }

    /// Only valid when `primary` is a ServerKey. Branches on whether the
    /// incoming grace key is already deprecated or already past its expiry.
    pub fn rotate_with_grace(&self, primary: Credential, grace: GraceSpec) -> Result<(), RotatorError> {
        if primary.kind() != CredentialKind::ServerKey {
            return Err(RotatorError::GraceNotApplicable(primary.kind()));
        }
        if grace.key.kind() != CredentialKind::ServerKey {
            return Err(RotatorError::GraceNotApplicable(grace.key.kind()));
        }

        let mut state = self.inner.write().expect("rotator lock poisoned");
        let previous = state.primary_server_key.replace(primary.clone());
        state.pending_additions.push(primary);

        if state.deprecated.contains_key(grace.key.body()) {
            warn!(key = %grace.key.masked(), "grace key already deprecated; keeping earlier expiry");
            return Ok(());
        }
        if grace.expiry <= grace.now {
            warn!(key = %grace.key.masked(), "grace expiry already elapsed; ignoring");
            return Ok(());
        }

        let was_previous_primary = previous.as_ref().map(|p| p.body()) == Some(grace.key.body());
        state.deprecated.insert(grace.key.body().to_string(), grace.expiry);
        if !was_previous_primary {
            // Adopted deprecated key, never managed here before: downstream
            // must start accepting it immediately.
            state.pending_additions.push(grace.key);
        }

        Ok(())
    }

    pub fn primary_credentials(&self) -> Vec<Credential> {
        let state = self.inner.read().expect("rotator lock poisoned");
        [&state.primary_server_key, &state.primary_mobile_key, &state.primary_environment_id]
            .into_iter()
            .flatten()
            .cloned()
            .collect()
    }

    pub fn deprecated_credentials(&self) -> Vec<Credential> {
        let state = self.inner.read().expect("rotator lock poisoned");
        state.deprecated.keys().cloned().map(Credential::ServerKey).collect()
    }

    pub fn all_credentials(&self) -> Vec<Credential> {
        let mut all = self.primary_credentials();
        all.extend(self.deprecated_credentials());
        all
    }

    /// Removes every deprecated key whose expiry is strictly before `now`,
    /// then returns and clears the accumulated change batch. This is the
    /// single synchronization point between rotation events and whatever
    /// owns this rotator.
    pub fn step_time(&self, now: DateTime<Utc>) -> CredentialChangeBatch {
        let mut state = self.inner.write().expect("rotator lock poisoned");

        let expired: Vec<String> = state
            .deprecated
            .iter()
            .filter(|(_, expiry)| **expiry < now)
            .map(|(key, _)| key.clone())
            .collect();
        for key in &expired {
            state.deprecated.remove(key);
            state.pending_expirations.push(Credential::ServerKey(key.clone()));
        }

        CredentialChangeBatch {
            additions: std::mem::take(&mut state.pending_additions),
            expirations: std::mem::take(&mut state.pending_expirations),
        }
    }

    /// Returns the currently held primary of `kind`, if any.
    pub fn primary_of(&self, kind: CredentialKind) -> Option<Credential> {
        let state = self.inner.read().expect("rotator lock poisoned");
        state.primary_slot(kind).clone()
    }
}

// FIN DEL ARCHIVO [libs/core/credential/src/lib.rs]
