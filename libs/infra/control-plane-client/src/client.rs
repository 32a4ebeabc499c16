// INICIO DEL ARCHIVO [libs/infra/control-plane-client/src/client.rs]
/*!
 * =================================================================
 * APARATO: CONTROL PLANE UPLINK (V1.0)
 * CLASIFICACIÓN: INFRASTRUCTURE ADAPTER (ESTRATO L3)
 * RESPONSABILIDAD: HANDSHAKE INICIAL Y SEÑAL DE DISPONIBILIDAD POR ENTORNO
 *
 * VISION HIPER-HOLÍSTICA:
 * El cliente no interpreta los datos de flags/segmentos (la evaluación
 * queda fuera de este aparato); su única responsabilidad es obtener el
 * snapshot inicial, entregarlo al store envuelto, y señalar "ready" una
 * sola vez (éxito o fallo) sin bloquear al constructor del entorno.
 * =================================================================
 */

use crate::errors::ControlPlaneError;
use relay_core_models::{AllData, Credential};
use reqwest::{Client, StatusCode};
use std::sync::RwLock;
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::{error, info, instrument, warn};

/// Bounded-attempt delivery policy, mirrored by the event publisher's
/// outbound delivery so both network paths fail at the same pace.
const BOOTSTRAP_RETRY_ATTEMPTS: u32 = 2;
const BOOTSTRAP_RETRY_BACKOFF: [Duration; 2] = [Duration::from_secs(1), Duration::from_secs(2)];

/// One streaming subscription to the control plane, bound to a single
/// active ServerKey. The Environment Context owns one of these per active
/// key and swaps it out on rotation.
pub struct ControlPlaneClient {
    http: Client,
    stream_base_url: String,
    credential: RwLock<Credential>,
}

impl ControlPlaneClient {
    pub fn new(stream_base_url: impl Into<String>, credential: Credential) -> Self {
        Self {
            http: Client::builder()
                .user_agent("relay-control-plane-client/1.0")
                .timeout(Duration::from_secs(30))
                .build()
                .expect("control plane client must build with a static configuration"),
            stream_base_url: stream_base_url.into().trim_end_matches('/').to_string(),
            credential: RwLock::new(credential),
        }
    }

    /// Performs the initial bootstrap fetch (`GET {base}/all`) with bounded
    /// retry and returns the full snapshot the broadcast data store adapter
    /// should `Init` with. Spawned on a background task by the caller so
    /// the Environment Context constructor returns immediately; the result
    /// is delivered exactly once over the returned channel.
    pub fn spawn_bootstrap(&self) -> oneshot::Receiver<Result<AllData, ControlPlaneError>> {
        let (tx, rx) = oneshot::channel();
        let http = self.http.clone();
        let url = format!("{}/all", self.stream_base_url);
        let auth = self.current_authorization_header();

        tokio::spawn(async move {
            let result = Self::fetch_snapshot_with_retry(&http, &url, &auth).await;
            let _ = tx.send(result);
        });

        rx
    }

    #[instrument(skip(http, authorization_header), fields(url = %url))]
    async fn fetch_snapshot_with_retry(
        http: &Client,
        url: &str,
        authorization_header: &str,
    ) -> Result<AllData, ControlPlaneError> {
        let mut last_error = None;

        for attempt in 0..=BOOTSTRAP_RETRY_ATTEMPTS {
            match Self::fetch_snapshot_once(http, url, authorization_header).await {
                Ok(snapshot) => return Ok(snapshot),
                Err(ControlPlaneError::Unauthorized) => {
                    // Non-recoverable: retrying will not change the outcome.
                    return Err(ControlPlaneError::Unauthorized);
                }
                Err(fault) => {
                    warn!(attempt, error = %fault, "control plane bootstrap attempt failed");
                    last_error = Some(fault);
                    if let Some(backoff) = BOOTSTRAP_RETRY_BACKOFF.get(attempt as usize) {
                        tokio::time::sleep(*backoff).await;
                    }
                }
            }
        }

        let fault = last_error.expect("loop always records a failure before exhausting retries");
        error!(error = %fault, "control plane bootstrap exhausted retries");
        Err(fault)
    }

    async fn fetch_snapshot_once(
        http: &Client,
        url: &str,
        authorization_header: &str,
    ) -> Result<AllData, ControlPlaneError> {
        let response = http
            .get(url)
            .header(reqwest::header::AUTHORIZATION, authorization_header)
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => Ok(response.json::<AllData>().await?),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(ControlPlaneError::Unauthorized),
            status => Err(ControlPlaneError::ServerRejection(format!("HTTP_{status}"))),
        }
    }

    /// Atomically swaps the credential used for subsequent requests. Called
    /// when the Environment Context rotates the primary ServerKey bound to
    /// this client.
    pub fn replace_credential(&self, new: Credential) {
        info!(credential = %new.masked(), "control plane client credential replaced");
        *self.credential.write().expect("credential lock poisoned") = new;
    }

    fn current_authorization_header(&self) -> String {
        self.credential.read().expect("credential lock poisoned").authorization_header_value().to_string()
    }

    /// No in-flight persistent connection is held beyond the bootstrap
    /// fetch, so close is a documentation point rather than teardown work;
    /// kept as an explicit method so the Environment Context's `Close` has
    /// a single uniform call site across every client it owns.
    pub fn close(&self) {
        info!("control plane client closed");
    }
}

// FIN DEL ARCHIVO [libs/infra/control-plane-client/src/client.rs]
