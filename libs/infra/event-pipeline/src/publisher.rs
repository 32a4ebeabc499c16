// INICIO DEL ARCHIVO [libs/infra/event-pipeline/src/publisher.rs]
/*!
 * =================================================================
 * APARATO: HTTP EVENT PUBLISHER (V1.0)
 * CLASIFICACIÓN: INFRASTRUCTURE ADAPTER (ESTRATO L3)
 * RESPONSABILIDAD: COLAS ACOTADAS POR EventPayloadMetadata Y ENTREGA
 *                   HTTP CON REINTENTO ACOTADO Y AUTO-DESACTIVACIÓN
 *
 * VISION HIPER-HOLÍSTICA:
 * Un único worker en segundo plano posee todo el estado mutable (colas,
 * credencial, bandera disabled); Publish/Flush/ReplaceCredential/Close
 * son mensajes sobre un mpsc, nunca locks compartidos. El cuerpo de
 * cada lote se comprime con gzip antes de salir a la red, tanto para
 * el reenvío verbatim como para la salida del resumidor.
 * =================================================================
 */

use crate::errors::PublisherError;
use relay_core_models::{Credential, EventPayloadMetadata};
use reqwest::{Client, StatusCode};
use std::collections::{HashMap, HashSet};
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{error, instrument, warn};

/// Bounded-attempt delivery policy, mirrored by the control-plane bootstrap
/// fetch so both outbound paths fail at the same pace.
const DELIVERY_RETRY_ATTEMPTS: u32 = 2;
const DELIVERY_RETRY_BACKOFF: [Duration; 2] = [Duration::from_secs(1), Duration::from_secs(2)];

#[derive(Debug, Clone)]
pub struct HttpEventPublisherConfig {
    pub events_uri: String,
    pub queue_capacity: usize,
    pub flush_interval: Duration,
    pub input_channel_capacity: usize,
    pub user_agent: String,
}

impl Default for HttpEventPublisherConfig {
    fn default() -> Self {
        Self {
            events_uri: String::new(),
            queue_capacity: 10_000,
            flush_interval: Duration::from_secs(5),
            input_channel_capacity: 1_000,
            user_agent: "relay-event-publisher/1.0".to_string(),
        }
    }
}

enum PublisherCommand {
    Publish(EventPayloadMetadata, Vec<serde_json::Value>),
    Flush,
    ReplaceCredential(Credential),
    Close(oneshot::Sender<()>),
}

/// Handle the rest of the environment talks to. Cloning is cheap (an
/// `mpsc::Sender` clone); every clone shares the same background worker.
#[derive(Clone)]
pub struct HttpEventPublisher {
    input_tx: mpsc::Sender<PublisherCommand>,
    closed: Arc<AtomicBool>,
}

impl HttpEventPublisher {
    pub fn spawn(config: HttpEventPublisherConfig, http: Client, credential: Credential) -> Self {
        let (input_tx, input_rx) = mpsc::channel(config.input_channel_capacity);
        let (disable_tx, disable_rx) = mpsc::channel(8);
        let closed = Arc::new(AtomicBool::new(false));

        tokio::spawn(Worker {
            http,
            config,
            credential,
            queues: HashMap::new(),
            overflow_warned: HashSet::new(),
            disabled: false,
            inflight: Vec::new(),
            disable_tx,
        }
        .run(input_rx, disable_rx));

        Self { input_tx, closed }
    }

    /// Non-blocking in practice: the input channel is generously sized, so
    /// producers only ever wait briefly under sustained overload rather than
    /// failing. A closed publisher silently drops the batch.
    pub async fn publish(&self, metadata: EventPayloadMetadata, events: Vec<serde_json::Value>) {
        if self.closed.load(Ordering::SeqCst) {
            return;
        }
        let _ = self.input_tx.send(PublisherCommand::Publish(metadata, events)).await;
    }

    pub async fn flush(&self) {
        if self.closed.load(Ordering::SeqCst) {
            return;
        }
        let _ = self.input_tx.send(PublisherCommand::Flush).await;
    }

    pub async fn replace_credential(&self, new: Credential) {
        if self.closed.load(Ordering::SeqCst) {
            return;
        }
        let _ = self.input_tx.send(PublisherCommand::ReplaceCredential(new)).await;
    }

    /// Idempotent. Waits for every in-flight delivery the worker had
    /// started before this call to finish.
    pub async fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        let (tx, rx) = oneshot::channel();
        if self.input_tx.send(PublisherCommand::Close(tx)).await.is_ok() {
            let _ = rx.await;
        }
    }
}

struct Worker {
    http: Client,
    config: HttpEventPublisherConfig,
    credential: Credential,
    queues: HashMap<EventPayloadMetadata, Vec<serde_json::Value>>,
    overflow_warned: HashSet<EventPayloadMetadata>,
    disabled: bool,
    inflight: Vec<JoinHandle<()>>,
    disable_tx: mpsc::Sender<()>,
}

impl Worker {
    async fn run(mut self, mut input_rx: mpsc::Receiver<PublisherCommand>, mut disable_rx: mpsc::Receiver<()>) {
        let mut ticker = tokio::time::interval(self.config.flush_interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                maybe_cmd = input_rx.recv() => {
                    match maybe_cmd {
                        Some(PublisherCommand::Publish(metadata, events)) => self.append(metadata, events),
                        Some(PublisherCommand::Flush) => self.flush_all(),
                        Some(PublisherCommand::ReplaceCredential(new)) => self.replace_credential(new),
                        Some(PublisherCommand::Close(done)) => {
                            self.flush_all();
                            for handle in self.inflight.drain(..) {
                                let _ = handle.await;
                            }
                            let _ = done.send(());
                            return;
                        }
                        None => return,
                    }
                }
                Some(()) = disable_rx.recv() => {
                    warn!("upstream rejected credential; publisher disabled, queues discarded");
                    self.disabled = true;
                    self.queues.clear();
                }
                _ = ticker.tick() => self.flush_all(),
            }
        }
    }

    fn append(&mut self, metadata: EventPayloadMetadata, mut events: Vec<serde_json::Value>) {
        if self.disabled || events.is_empty() {
            return;
        }
        let queue = self.queues.entry(metadata.clone()).or_insert_with(Vec::new);
        let available = self.config.queue_capacity.saturating_sub(queue.len());

        if events.len() > available {
            if self.overflow_warned.insert(metadata.clone()) {
                warn!(?metadata, dropped = events.len() - available, "event queue overflow, truncating batch");
            }
            events.truncate(available);
        } else {
            self.overflow_warned.remove(&metadata);
        }

        queue.extend(events);
    }

    fn replace_credential(&mut self, new: Credential) {
        if new.kind() == self.credential.kind() {
            self.credential = new;
        }
    }

    fn flush_all(&mut self) {
        if self.disabled {
            return;
        }
        let keep_empty_entry = self.queues.len() == 1;
        let metadatas: Vec<EventPayloadMetadata> = self.queues.keys().cloned().collect();

        for metadata in metadatas {
            let events = if keep_empty_entry {
                std::mem::take(self.queues.get_mut(&metadata).expect("key present"))
            } else {
                match self.queues.remove(&metadata) {
                    Some(events) => events,
                    None => continue,
                }
            };
            if events.is_empty() {
                continue;
            }
            self.spawn_delivery(metadata, events);
        }
    }

    fn spawn_delivery(&mut self, metadata: EventPayloadMetadata, events: Vec<serde_json::Value>) {
        let http = self.http.clone();
        let url = self.config.events_uri.clone();
        let user_agent = self.config.user_agent.clone();
        let credential = self.credential.clone();
        let disable_tx = self.disable_tx.clone();

        let handle = tokio::spawn(async move {
            match deliver_with_retry(&http, &url, &user_agent, &credential, &metadata, events).await {
                Ok(()) => {}
                Err(PublisherError::Unauthorized) => {
                    let _ = disable_tx.send(()).await;
                }
                Err(fault) => error!(?metadata, error = %fault, "event batch delivery abandoned"),
            }
        });
        self.inflight.push(handle);
        self.inflight.retain(|h| !h.is_finished());
    }
}

#[instrument(skip(http, events), fields(count = events.len()))]
async fn deliver_with_retry(
    http: &Client,
    url: &str,
    user_agent: &str,
    credential: &Credential,
    metadata: &EventPayloadMetadata,
    events: Vec<serde_json::Value>,
) -> Result<(), PublisherError> {
    let body = gzip_encode(&events)?;
    let mut last_error = None;

    for attempt in 0..=DELIVERY_RETRY_ATTEMPTS {
        match deliver_once(http, url, user_agent, credential, metadata, &body).await {
            Ok(()) => return Ok(()),
            Err(PublisherError::Unauthorized) => return Err(PublisherError::Unauthorized),
            Err(fault) => {
                warn!(attempt, error = %fault, "event batch delivery attempt failed");
                last_error = Some(fault);
                if let Some(backoff) = DELIVERY_RETRY_BACKOFF.get(attempt as usize) {
                    tokio::time::sleep(*backoff).await;
                }
            }
        }
    }

    Err(last_error.expect("loop always records a failure before exhausting retries"))
}

async fn deliver_once(
    http: &Client,
    url: &str,
    user_agent: &str,
    credential: &Credential,
    metadata: &EventPayloadMetadata,
    body: &[u8],
) -> Result<(), PublisherError> {
    let mut request = http
        .post(url)
        .header(reqwest::header::CONTENT_TYPE, "application/json")
        .header(reqwest::header::CONTENT_ENCODING, "gzip")
        .header(reqwest::header::USER_AGENT, user_agent)
        .header(reqwest::header::AUTHORIZATION, credential.authorization_header_value())
        .header("X-LaunchDarkly-Event-Schema", metadata.schema_version.to_string())
        .body(body.to_vec());

    if let Some(tags) = &metadata.tags {
        request = request.header("X-LaunchDarkly-Tags", tags.clone());
    }

    let response = request.send().await?;
    match response.status() {
        status if status.is_success() => Ok(()),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(PublisherError::Unauthorized),
        status => Err(PublisherError::ServerRejection(format!("HTTP_{status}"))),
    }
}

fn gzip_encode(events: &[serde_json::Value]) -> Result<Vec<u8>, PublisherError> {
    let json = serde_json::to_vec(events)?;
    let mut encoder = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
    encoder.write_all(&json).map_err(|io| PublisherError::ServerRejection(format!("GZIP_FAULT: {io}")))?;
    encoder.finish().map_err(|io| PublisherError::ServerRejection(format!("GZIP_FAULT: {io}")))
}

// FIN DEL ARCHIVO [libs/infra/event-pipeline/src/publisher.rs]
