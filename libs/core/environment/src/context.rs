// INICIO DEL ARCHIVO [libs/core/environment/src/context.rs]
/*!
 * =================================================================
 * APARATO: ENVIRONMENT CONTEXT (V1.0 - COMPOSITION ROOT POR TENANT)
 * CLASIFICACIÓN: APPLICATION SERVICE (ESTRATO L2)
 * RESPONSABILIDAD: ENSAMBLAR ROTATOR + STORE + CLIENTES + DISPATCHER
 *                   DETRÁS DE UNA ÚNICA SUPERFICIE POR TENANT
 *
 * VISION HIPER-HOLÍSTICA:
 * `spawn` nunca bloquea en red: valida su entrada de forma síncrona y
 * devuelve un `Arc<Self>` de inmediato, dejando el primer fetch del
 * plano de control como una tarea en segundo plano que resuelve el
 * oneshot `ready()` exactamente una vez. El mapa de clientes y el mapa
 * de credenciales activas usan `std::sync::RwLock` porque ninguna
 * sección crítica cruza un `.await` — el mismo patrón que el rotador.
 * =================================================================
 */

use crate::config::MainConfig;
use crate::errors::RelayError;
use crate::registry::EnvironmentRegistry;
use chrono::{DateTime, Utc};
use relay_core_credential::{CredentialRotator, GraceSpec};
use relay_core_models::{AllData, Credential, CredentialKind, EnvironmentIdentifiers, EnvironmentParams, ScopedCredential};
use relay_infra_control_plane_client::ControlPlaneClient;
use relay_infra_data_store::{BroadcastDataStoreAdapter, ChannelKind, DataStore, EnvStreams};
use relay_infra_event_pipeline::{EventDispatcher, FlagLookup, HttpEventPublisher, HttpEventPublisherConfig, SummarizingRelay};
use reqwest::Client;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex as StdMutex, RwLock as StdRwLock};
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::{error, info, instrument, warn};

/// A pending rotation instruction, handed to `update_credential`. Mirrors
/// the two rotator entry points one-to-one.
#[derive(Debug, Clone)]
pub enum CredentialUpdate {
    Rotate(Credential),
    RotateWithGrace(Credential, GraceSpec),
}

/// Opaque flag-evaluation collaborator. Built lazily once the primary
/// client produces a usable store snapshot; evaluation itself is out of
/// scope here — this trait exists only so the Environment
/// Context has a single, uniform `Close` call site.
pub trait FlagEvaluator: Send + Sync {
    fn close(&self);
}

/// Opaque big-segment store collaborator, same rationale as `FlagEvaluator`.
pub trait BigSegmentStore: Send + Sync {
    fn close(&self);
}

/// Everything `EnvironmentContext::spawn` needs beyond the per-tenant
/// `EnvironmentParams` — the parts a config loader would source from
/// `MainConfig`/`EventsConfig`.
#[derive(Debug, Clone)]
pub struct EnvironmentRuntimeConfig {
    pub stream_base_url: String,
    pub events_uri: String,
    pub diagnostic_upstream_url: String,
    pub events_enabled: bool,
    pub publisher_queue_capacity: usize,
    pub publisher_flush_interval: Duration,
    pub summarizer_cleanup_interval: Duration,
    pub credential_cleanup_interval: Duration,
    pub ignore_connection_errors: bool,
}

impl EnvironmentRuntimeConfig {
    pub fn from_main_config(main: &MainConfig, events_uri: impl Into<String>, diagnostic_upstream_url: impl Into<String>) -> Self {
        Self {
            stream_base_url: main.stream_uri.clone(),
            events_uri: events_uri.into(),
            diagnostic_upstream_url: diagnostic_upstream_url.into(),
            events_enabled: true,
            publisher_queue_capacity: 10_000,
            publisher_flush_interval: Duration::from_secs(5),
            summarizer_cleanup_interval: Duration::from_secs(60),
            credential_cleanup_interval: main.credential_cleanup_interval,
            ignore_connection_errors: main.ignore_connection_errors,
        }
    }
}

/// Composition root for a single tenant (project/environment pair). Owns
/// the credential rotator, the broadcast data store adapter, every active
/// control-plane client, and (unless offline) the analytics dispatcher.
pub struct EnvironmentContext {
    identifiers: EnvironmentIdentifiers,
    filter_key: Option<String>,
    offline: bool,
    ignore_connection_errors: bool,
    stream_base_url: String,

    rotator: Arc<CredentialRotator>,
    store: Arc<BroadcastDataStoreAdapter>,
    dispatcher: Option<Arc<EventDispatcher>>,
    registry: Arc<dyn EnvironmentRegistry>,

    /// ServerKey body -> client. Populated only for online environments;
    /// an offline environment carries exactly one client, registered
    /// directly at construction (`GetClient`'s "sole client" case).
    clients: StdRwLock<HashMap<String, Arc<ControlPlaneClient>>>,
    /// Bookkeeping table the HTTP layer never reads: which of the
    /// three broadcast channel kinds a given credential is entitled to.
    active_credentials: StdRwLock<HashMap<Credential, ChannelKind>>,

    evaluator: StdRwLock<Option<Arc<dyn FlagEvaluator>>>,
    big_segments: StdRwLock<Option<Arc<dyn BigSegmentStore>>>,

    ready_tx: StdMutex<Option<oneshot::Sender<Result<(), RelayError>>>>,
    ready_rx: StdMutex<Option<oneshot::Receiver<Result<(), RelayError>>>>,

    cleanup_stop: StdMutex<Option<oneshot::Sender<()>>>,
    cleanup_done: StdMutex<Option<oneshot::Receiver<()>>>,
    heartbeat_stop: StdMutex<Option<oneshot::Sender<()>>>,

    closed: AtomicBool,
}

impl EnvironmentContext {
    /// Validates synchronously, wires the initial credential set, and
    /// starts the first control-plane client (or, offline, registers the
    /// sole local client) on a background task. Never awaits network I/O
    /// itself — callers that need to know the first snapshot landed should
    /// await `ready()`.
    #[instrument(skip(params, data_store, registry, flag_lookup, http, runtime), fields(environment = %params.environment_id))]
    pub fn spawn(
        params: EnvironmentParams,
        data_store: Arc<dyn DataStore>,
        registry: Arc<dyn EnvironmentRegistry>,
        flag_lookup: Arc<dyn FlagLookup>,
        runtime: EnvironmentRuntimeConfig,
        http: Client,
    ) -> Result<Arc<Self>, RelayError> {
        if runtime.stream_base_url.is_empty() {
            return Err(RelayError::Configuration("stream_base_url must not be empty".into()));
        }
        if !params.primary_server_key.is_defined() {
            return Err(RelayError::Configuration("primary_server_key must be defined".into()));
        }

        let rotator = Arc::new(CredentialRotator::new());
        let mut initial = vec![params.primary_server_key.clone()];
        if let Some(mobile) = params.mobile_key.clone() {
            initial.push(mobile);
        }
        if let Some(env_id) = params.environment_id_credential.clone() {
            initial.push(env_id);
        }
        rotator.initialize(initial);
        if let Some(expiring) = &params.expiring_server_key {
            rotator.initialize_deprecated(expiring.credential.clone(), expiring.expires_at, Utc::now());
        }

        let streams = Arc::new(EnvStreams::new());
        let store = Arc::new(BroadcastDataStoreAdapter::new(data_store, streams));

        let publisher = Arc::new(HttpEventPublisher::spawn(
            HttpEventPublisherConfig {
                events_uri: runtime.events_uri.clone(),
                queue_capacity: runtime.publisher_queue_capacity,
                flush_interval: runtime.publisher_flush_interval,
                ..Default::default()
            },
            http,
            params.primary_server_key.clone(),
        ));

        let dispatcher = if runtime.events_enabled && !params.offline {
            let summarizer = SummarizingRelay::new(flag_lookup, Arc::clone(&publisher));
            Some(Arc::new(EventDispatcher::new(
                Some(params.primary_server_key.clone()),
                params.mobile_key.clone(),
                params.environment_id_credential.clone(),
                publisher,
                summarizer,
                runtime.diagnostic_upstream_url.clone(),
                runtime.summarizer_cleanup_interval,
            )))
        } else {
            None
        };

        let (ready_tx, ready_rx) = oneshot::channel();

        let context = Arc::new(Self {
            identifiers: params.identifiers.clone(),
            filter_key: params.filter_key.clone(),
            offline: params.offline,
            ignore_connection_errors: runtime.ignore_connection_errors,
            stream_base_url: runtime.stream_base_url.clone(),
            rotator,
            store,
            dispatcher,
            registry,
            clients: StdRwLock::new(HashMap::new()),
            active_credentials: StdRwLock::new(HashMap::new()),
            evaluator: StdRwLock::new(None),
            big_segments: StdRwLock::new(None),
            ready_tx: StdMutex::new(Some(ready_tx)),
            ready_rx: StdMutex::new(Some(ready_rx)),
            cleanup_stop: StdMutex::new(None),
            cleanup_done: StdMutex::new(None),
            heartbeat_stop: StdMutex::new(None),
            closed: AtomicBool::new(false),
        });

        // Construction-time wiring for the initial primaries plus any
        // already-expiring ServerKey seeded above: Initialize/
        // initialize_deprecated do not emit rotator change events, so this
        // is driven directly rather than through `trigger_credential_changes`.
        for credential in context.rotator.all_credentials() {
            context.register_credential(&credential);
        }

        if params.offline {
            let client = Arc::new(ControlPlaneClient::new(runtime.stream_base_url.clone(), params.primary_server_key.clone()));
            context
                .clients
                .write()
                .expect("clients lock poisoned")
                .insert(params.primary_server_key.body().to_string(), client);

            // An offline environment never talks to a control plane, so it
            // serves a static/empty snapshot and is "initialized" by
            // definition — without this, `store.is_initialized()` never
            // flips true and every request against it 503s forever.
            let store = Arc::clone(&context.store);
            let ready_tx = context.ready_tx.lock().expect("ready_tx lock poisoned").take();
            tokio::spawn(async move {
                let result = store.init(AllData::default()).await;
                match (&result, ready_tx) {
                    (Ok(()), Some(tx)) => {
                        let _ = tx.send(Ok(()));
                    }
                    (Err(fault), Some(tx)) => {
                        let _ = tx.send(Err(RelayError::from(fault_clone(fault))));
                    }
                    (Err(fault), None) => error!(error = %fault, "offline snapshot init failed"),
                    (Ok(()), None) => {}
                }
            });
        } else {
            context.start_client(params.primary_server_key.clone());
            // The expiring key (if any) is already-active and accepted, not
            // merely pending — it gets its own streaming client immediately,
            // same as any other active ServerKey (§4.3 "one client per
            // active ServerKey"), but never resolves `ready()`: only the
            // first call to `start_client` (the primary, above) does that.
            if let Some(expiring) = &params.expiring_server_key {
                context.start_client(expiring.credential.clone());
            }
        }

        Ok(context)
    }

    /// Starts the credential-cleanup background loop: each tick,
    /// sweeps the rotator for lapsed grace windows and applies whatever
    /// additions/expirations fall out.
    pub fn spawn_cleanup_loop(self: &Arc<Self>, interval: Duration) {
        let (stop_tx, mut stop_rx) = oneshot::channel();
        let (done_tx, done_rx) = oneshot::channel();
        *self.cleanup_stop.lock().expect("cleanup_stop lock poisoned") = Some(stop_tx);
        *self.cleanup_done.lock().expect("cleanup_done lock poisoned") = Some(done_rx);

        let context = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                tokio::select! {
                    _ = ticker.tick() => context.trigger_credential_changes(Utc::now()).await,
                    _ = &mut stop_rx => break,
                }
            }
            let _ = done_tx.send(());
        });
    }

    /// Starts the SSE heartbeat daemon on the owned broadcast adapter.
    pub fn spawn_heartbeat(self: &Arc<Self>, interval: Duration) {
        let (stop_tx, stop_rx) = oneshot::channel();
        *self.heartbeat_stop.lock().expect("heartbeat_stop lock poisoned") = Some(stop_tx);
        Arc::clone(&self.store).spawn_heartbeat(interval, stop_rx);
    }

    /// Resolves once the first control-plane bootstrap (or, offline, the
    /// sole local client registration) has settled. Consuming this more
    /// than once after the first call returns `Ok(())` immediately —
    /// callers are expected to await it exactly once.
    pub async fn ready(&self) -> Result<(), RelayError> {
        let rx = self.ready_rx.lock().expect("ready_rx lock poisoned").take();
        match rx {
            Some(rx) => rx.await.unwrap_or_else(|_| Err(RelayError::Configuration("ready signal dropped before resolving".into()))),
            None => Ok(()),
        }
    }

    /// Applies a single rotation instruction to the rotator, then
    /// immediately drives whatever additions/expirations it produces —
    /// rotation is always followed by its own `StepTime`.
    pub async fn update_credential(self: &Arc<Self>, update: CredentialUpdate, now: DateTime<Utc>) -> Result<(), RelayError> {
        match update {
            CredentialUpdate::Rotate(new) => self.rotator.rotate(new),
            CredentialUpdate::RotateWithGrace(new, grace) => self.rotator.rotate_with_grace(new, grace)?,
        }
        self.trigger_credential_changes(now).await;
        Ok(())
    }

    /// Sweeps the rotator for `now` and applies the resulting batch:
    /// additions before expirations, exactly as the rotator orders them.
    pub async fn trigger_credential_changes(self: &Arc<Self>, now: DateTime<Utc>) {
        let batch = self.rotator.step_time(now);
        for addition in batch.additions {
            self.add_credential(addition).await;
        }
        for expiration in batch.expirations {
            self.remove_credential(expiration).await;
        }
    }

    /// Registers a newly active credential: maps it onto its channel kind,
    /// tells the registry it may now route connections to this tenant, and
    /// — for ServerKey — rotates the dispatcher's outbound authorization
    /// and (if online) starts a fresh control-plane client.
    async fn add_credential(self: &Arc<Self>, credential: Credential) {
        self.register_credential(&credential);

        if credential.kind() != CredentialKind::ServerKey {
            return;
        }
        if let Some(dispatcher) = &self.dispatcher {
            dispatcher.replace_credential(credential.clone()).await;
        }
        if !self.offline {
            self.start_client(credential);
        }
    }

    fn register_credential(self: &Arc<Self>, credential: &Credential) {
        let channel_kind = ChannelKind::for_credential_kind(credential.kind());
        self.active_credentials.write().expect("active_credentials lock poisoned").insert(credential.clone(), channel_kind);
        self.registry.add_connection_mapping(ScopedCredential::new(self.filter_key.clone(), credential.clone()), Arc::clone(self));
    }

    /// Removes a lapsed credential: drops the bookkeeping entry, tells the
    /// registry to stop routing to it, and closes+drops its control-plane
    /// client if it was a ServerKey.
    async fn remove_credential(self: &Arc<Self>, credential: Credential) {
        self.active_credentials.write().expect("active_credentials lock poisoned").remove(&credential);
        self.registry.remove_connection_mapping(ScopedCredential::new(self.filter_key.clone(), credential.clone()));

        if credential.kind() == CredentialKind::ServerKey {
            let client = self.clients.write().expect("clients lock poisoned").remove(credential.body());
            if let Some(client) = client {
                client.close();
            }
        }
    }

    /// Spawns a control-plane client for `credential`, registers it, and
    /// drives its bootstrap fetch to completion on a background task. The
    /// first call ever made resolves `ready()`; later calls (credential
    /// rotation) only log on failure.
    fn start_client(self: &Arc<Self>, credential: Credential) {
        let client = Arc::new(ControlPlaneClient::new(self.stream_base_url.clone(), credential.clone()));
        let bootstrap_rx = client.spawn_bootstrap();
        self.clients.write().expect("clients lock poisoned").insert(credential.body().to_string(), Arc::clone(&client));

        let store = Arc::clone(&self.store);
        let ignore_errors = self.ignore_connection_errors;
        let ready_tx = self.ready_tx.lock().expect("ready_tx lock poisoned").take();

        tokio::spawn(async move {
            match bootstrap_rx.await {
                Ok(Ok(snapshot)) => {
                    let init_result = store.init(snapshot).await;
                    match (&init_result, ready_tx) {
                        (Ok(()), Some(tx)) => {
                            let _ = tx.send(Ok(()));
                        }
                        (Err(fault), Some(tx)) => {
                            let _ = tx.send(Err(RelayError::from(fault_clone(fault))));
                        }
                        (Err(fault), None) => error!(error = %fault, "snapshot re-init after rotation failed"),
                        (Ok(()), None) => {}
                    }
                }
                Ok(Err(fault)) => {
                    warn!(error = %fault, ignore_connection_errors = ignore_errors, "control plane bootstrap failed");
                    if let Some(tx) = ready_tx {
                        if ignore_errors {
                            let _ = tx.send(Ok(()));
                        } else {
                            let _ = tx.send(Err(RelayError::from(fault)));
                        }
                    }
                }
                Err(_) => {
                    if let Some(tx) = ready_tx {
                        let _ = tx.send(Err(RelayError::Configuration("bootstrap task dropped before completion".into())));
                    }
                }
            }
        });
    }

    /// Returns the control-plane client for the currently held primary
    /// ServerKey, or (offline) the sole registered client.
    pub fn get_client(&self) -> Option<Arc<ControlPlaneClient>> {
        if self.offline {
            return self.clients.read().expect("clients lock poisoned").values().next().cloned();
        }
        let primary = self.rotator.primary_of(CredentialKind::ServerKey)?;
        self.clients.read().expect("clients lock poisoned").get(primary.body()).cloned()
    }

    /// Returns the channel kind a given credential is currently entitled to
    /// subscribe on, or `None` if it is not (or no longer) active.
    pub fn channel_for_credential(&self, credential: &Credential) -> Option<ChannelKind> {
        self.active_credentials.read().expect("active_credentials lock poisoned").get(credential).copied()
    }

    pub fn identifiers(&self) -> &EnvironmentIdentifiers {
        &self.identifiers
    }

    pub fn filter_key(&self) -> Option<&str> {
        self.filter_key.as_deref()
    }

    pub fn is_offline(&self) -> bool {
        self.offline
    }

    pub fn streams(&self) -> Arc<EnvStreams> {
        self.store.streams()
    }

    pub fn store(&self) -> &Arc<BroadcastDataStoreAdapter> {
        &self.store
    }

    pub fn dispatcher(&self) -> Option<Arc<EventDispatcher>> {
        self.dispatcher.clone()
    }

    /// Installs the flag evaluator built lazily once the primary client
    /// produces a usable store snapshot.
    pub fn set_evaluator(&self, evaluator: Arc<dyn FlagEvaluator>) {
        *self.evaluator.write().expect("evaluator lock poisoned") = Some(evaluator);
    }

    pub fn set_big_segment_store(&self, store: Arc<dyn BigSegmentStore>) {
        *self.big_segments.write().expect("big_segments lock poisoned") = Some(store);
    }

    /// Tears down every background task and collaborator this context
    /// owns. Idempotent — a second call is a no-op.
    pub async fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        info!(environment = %self.identifiers.display_name(), "environment context closing");

        if let Some(stop) = self.cleanup_stop.lock().expect("cleanup_stop lock poisoned").take() {
            let _ = stop.send(());
        }
        if let Some(done) = self.cleanup_done.lock().expect("cleanup_done lock poisoned").take() {
            let _ = done.await;
        }
        if let Some(stop) = self.heartbeat_stop.lock().expect("heartbeat_stop lock poisoned").take() {
            let _ = stop.send(());
        }

        let clients: Vec<Arc<ControlPlaneClient>> = self.clients.write().expect("clients lock poisoned").drain().map(|(_, client)| client).collect();
        for client in clients {
            client.close();
        }

        if let Some(dispatcher) = &self.dispatcher {
            dispatcher.close().await;
        }
        if let Some(evaluator) = self.evaluator.write().expect("evaluator lock poisoned").take() {
            evaluator.close();
        }
        if let Some(store) = self.big_segments.write().expect("big_segments lock poisoned").take() {
            store.close();
        }

        if let Err(fault) = self.store.close().await {
            error!(error = %fault, "broadcast data store adapter close failed");
        }
    }
}

/// `DataStoreError` does not implement `Clone`; this reconstructs an
/// equivalent value for the rare branch where both the ready signal and a
/// log line need to report the same underlying failure.
fn fault_clone(fault: &relay_infra_data_store::DataStoreError) -> relay_infra_data_store::DataStoreError {
    use relay_infra_data_store::DataStoreError;
    match fault {
        DataStoreError::WriteFailed(message) => DataStoreError::WriteFailed(message.clone()),
        DataStoreError::NotInitialized => DataStoreError::NotInitialized,
        DataStoreError::Closed => DataStoreError::Closed,
    }
}

// FIN DEL ARCHIVO [libs/core/environment/src/context.rs]
