// INICIO DEL ARCHIVO [libs/infra/event-pipeline/src/dispatcher.rs]
/*!
 * =================================================================
 * APARATO: EVENT DISPATCHER (V1.0)
 * CLASIFICACIÓN: APPLICATION SERVICE (ESTRATO L2)
 * RESPONSABILIDAD: HASTA SEIS MANEJADORES {ServerSDK,MobileSDK,
 *                   JSClientSDK} x {Analytics,Diagnostic} POR ENTORNO
 *
 * VISION HIPER-HOLÍSTICA:
 * Este módulo deliberadamente no sabe nada de axum: `DispatchOutcome`
 * es neutral a HTTP, igual que SseEvent en el adaptador de broadcast.
 * La capa de transporte (apps/relay-gateway) traduce el resultado a
 * una respuesta concreta. El reenvío de analítica siempre usa la
 * credencial ServerKey del ambiente — el SDK de origen (móvil o JS)
 * solo decide si el handler existe, nunca con qué credencial se
 * reenvía aguas arriba (así lo hace el relay real de LaunchDarkly).
 * =================================================================
 */

use crate::errors::DispatchError;
use crate::summarizer::SummarizingRelay;
use bytes::Bytes;
use relay_core_models::{Credential, CredentialKind, EventPayloadMetadata, SUMMARY_SCHEMA_THRESHOLD};
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{oneshot, Mutex, RwLock};
use tracing::{instrument, warn};

use crate::publisher::HttpEventPublisher;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SdkKind {
    Server,
    Mobile,
    JsClient,
}

/// HTTP-agnostic result of dispatching one inbound request. The gateway
/// layer maps this onto a concrete response.
#[derive(Debug)]
pub enum DispatchOutcome {
    Accepted,
    BadRequest(&'static str),
    Proxied { status: u16, body: Bytes, content_type: Option<String> },
}

struct HandlerPair {
    credential: RwLock<Credential>,
}

impl HandlerPair {
    fn new(credential: Credential) -> Self {
        Self { credential: RwLock::new(credential) }
    }
}

/// Owns up to three `{credential-kind}` handler pairs. The analytics path
/// for every pair shares the same publisher/summarizer, since upstream
/// ingestion is always authorized with the environment's ServerKey
/// regardless of which SDK kind produced the event.
pub struct EventDispatcher {
    server: Option<HandlerPair>,
    mobile: Option<HandlerPair>,
    js_client: Option<HandlerPair>,
    publisher: Arc<HttpEventPublisher>,
    summarizer: Arc<SummarizingRelay>,
    diagnostic_http: Client,
    diagnostic_upstream_url: String,
    summarizer_cleanup_stop: Mutex<Option<oneshot::Sender<()>>>,
    summarizer_cleanup_done: Mutex<Option<oneshot::Receiver<()>>>,
}

impl EventDispatcher {
    /// `summarizer_cleanup_interval` drives the idle-tag sweep documented on
    /// `SummarizingRelay::spawn_cleanup_loop`; the dispatcher owns that
    /// daemon's lifecycle since it is the summarizer's only caller.
    pub fn new(
        server_key: Option<Credential>,
        mobile_key: Option<Credential>,
        environment_id: Option<Credential>,
        publisher: Arc<HttpEventPublisher>,
        summarizer: Arc<SummarizingRelay>,
        diagnostic_upstream_url: impl Into<String>,
        summarizer_cleanup_interval: Duration,
    ) -> Self {
        let (stop_tx, stop_rx) = oneshot::channel();
        let done_rx = Arc::clone(&summarizer).spawn_cleanup_loop(summarizer_cleanup_interval, stop_rx);

        Self {
            server: server_key.map(HandlerPair::new),
            mobile: mobile_key.map(HandlerPair::new),
            js_client: environment_id.map(HandlerPair::new),
            publisher,
            summarizer,
            diagnostic_http: Client::builder()
                .timeout(Duration::from_secs(10))
                .build()
                .expect("diagnostic client must build with a static configuration"),
            diagnostic_upstream_url: diagnostic_upstream_url.into(),
            summarizer_cleanup_stop: Mutex::new(Some(stop_tx)),
            summarizer_cleanup_done: Mutex::new(Some(done_rx)),
        }
    }

    fn pair(&self, sdk: SdkKind) -> Option<&HandlerPair> {
        match sdk {
            SdkKind::Server => self.server.as_ref(),
            SdkKind::Mobile => self.mobile.as_ref(),
            SdkKind::JsClient => self.js_client.as_ref(),
        }
    }

    pub fn handles(&self, sdk: SdkKind) -> bool {
        self.pair(sdk).is_some()
    }

    /// Reads and validates the body synchronously, then spawns translation
    /// and summarization as a background task so the caller can answer 202
    /// immediately.
    #[instrument(skip(self, body))]
    pub fn dispatch_analytics(&self, sdk: SdkKind, schema: u32, tags: Option<String>, body: Bytes) -> DispatchOutcome {
        if self.pair(sdk).is_none() {
            return DispatchOutcome::BadRequest("NO_HANDLER_FOR_CREDENTIAL_KIND");
        }
        if body.is_empty() {
            return DispatchOutcome::BadRequest("EMPTY_BODY");
        }

        let publisher = Arc::clone(&self.publisher);
        let summarizer = Arc::clone(&self.summarizer);
        tokio::spawn(async move {
            if let Err(fault) = process_analytics_batch(body, schema, tags, publisher, summarizer).await {
                warn!(error = %fault, "analytics batch dropped after 202 was already returned");
            }
        });

        DispatchOutcome::Accepted
    }

    /// Reverse-proxies the request to the upstream diagnostic endpoint,
    /// preserving `Authorization`/`User-Agent` verbatim, with one retry on
    /// network error or HTTP >= 400.
    #[instrument(skip(self, body, authorization))]
    pub async fn dispatch_diagnostic(
        &self,
        sdk: SdkKind,
        authorization: &str,
        user_agent: &str,
        body: Bytes,
    ) -> DispatchOutcome {
        if self.pair(sdk).is_none() {
            return DispatchOutcome::BadRequest("NO_HANDLER_FOR_CREDENTIAL_KIND");
        }

        match proxy_diagnostic_with_retry(&self.diagnostic_http, &self.diagnostic_upstream_url, authorization, user_agent, body).await {
            Ok((status, body, content_type)) => DispatchOutcome::Proxied { status, body, content_type },
            Err(fault) => {
                warn!(error = %fault, "diagnostic proxy exhausted its retry");
                DispatchOutcome::Proxied { status: 502, body: Bytes::new(), content_type: None }
            }
        }
    }

    /// Updates whichever handler pairs share `new`'s credential kind. A
    /// mismatched kind is a silent no-op — this only ever needs to no-op at
    /// most one of the three kinds it's ever called with.
    pub async fn replace_credential(&self, new: Credential) {
        for pair in [&self.server, &self.mobile, &self.js_client].into_iter().flatten() {
            if pair.credential.read().await.kind() == new.kind() {
                *pair.credential.write().await = new.clone();
            }
        }
        if new.kind() == CredentialKind::ServerKey {
            self.publisher.replace_credential(new).await;
        }
    }

    pub async fn close(&self) {
        if let Some(stop) = self.summarizer_cleanup_stop.lock().await.take() {
            let _ = stop.send(());
        }
        if let Some(done) = self.summarizer_cleanup_done.lock().await.take() {
            let _ = done.await;
        }
        self.publisher.close().await;
    }
}

async fn process_analytics_batch(
    body: Bytes,
    schema: u32,
    tags: Option<String>,
    publisher: Arc<HttpEventPublisher>,
    summarizer: Arc<SummarizingRelay>,
) -> Result<(), DispatchError> {
    let events: Vec<serde_json::Value> = serde_json::from_slice(&body).map_err(|_| DispatchError::Unparseable)?;
    if events.is_empty() {
        return Ok(());
    }

    if schema >= SUMMARY_SCHEMA_THRESHOLD {
        publisher.publish(EventPayloadMetadata::new(schema, tags), events).await;
    } else {
        summarizer.ingest(tags, schema, events).await;
    }
    Ok(())
}

async fn proxy_diagnostic_with_retry(
    http: &Client,
    url: &str,
    authorization: &str,
    user_agent: &str,
    body: Bytes,
) -> Result<(u16, Bytes, Option<String>), reqwest::Error> {
    match proxy_diagnostic_once(http, url, authorization, user_agent, body.clone()).await {
        Ok((status, response_body, content_type)) if status < 400 => Ok((status, response_body, content_type)),
        Ok(_) | Err(_) => {
            tokio::time::sleep(Duration::from_secs(1)).await;
            proxy_diagnostic_once(http, url, authorization, user_agent, body).await
        }
    }
}

async fn proxy_diagnostic_once(
    http: &Client,
    url: &str,
    authorization: &str,
    user_agent: &str,
    body: Bytes,
) -> Result<(u16, Bytes, Option<String>), reqwest::Error> {
    let response = http
        .post(url)
        .header(reqwest::header::AUTHORIZATION, authorization)
        .header(reqwest::header::USER_AGENT, user_agent)
        .header(reqwest::header::CONTENT_TYPE, "application/json")
        .body(body)
        .send()
        .await?;

    let status = response.status().as_u16();
    let content_type = response.headers().get(reqwest::header::CONTENT_TYPE).and_then(|v| v.to_str().ok()).map(|s| s.to_string());
    let body = response.bytes().await?;
    Ok((status, body, content_type))
}

// FIN DEL ARCHIVO [libs/infra/event-pipeline/src/dispatcher.rs]
