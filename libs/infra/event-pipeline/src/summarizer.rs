// INICIO DEL ARCHIVO [libs/infra/event-pipeline/src/summarizer.rs]
/*!
 * =================================================================
 * APARATO: SUMMARIZING RELAY (V1.0)
 * CLASIFICACIÓN: DOMAIN SERVICE (ESTRATO L2)
 * RESPONSABILIDAD: PARTICIÓN POR TAG, DELEGACIÓN A EventProcessor, Y
 *                   LIMPIEZA DE PROCESADORES INACTIVOS
 *
 * VISION HIPER-HOLÍSTICA:
 * El ciclo de limpieza hace dos trabajos en el mismo tick: a los
 * procesadores activos les extrae (flush) y publica su lote; a los
 * inactivos los elimina del mapa. Un tag nunca queda huérfano: la
 * próxima ingesta con ese tag recrea su EventProcessor perezosamente.
 * =================================================================
 */

use crate::flag_lookup::FlagLookup;
use crate::processor::EventProcessorState;
use crate::publisher::HttpEventPublisher;
use chrono::Utc;
use relay_core_models::{EventPayloadMetadata, CURRENT_OUTPUT_SCHEMA};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{oneshot, Mutex, RwLock};
use tracing::{trace, warn};

pub struct SummarizingRelay {
    processors: RwLock<HashMap<Option<String>, Arc<Mutex<EventProcessorState>>>>,
    flag_lookup: Arc<dyn FlagLookup>,
    publisher: Arc<HttpEventPublisher>,
}

impl SummarizingRelay {
    pub fn new(flag_lookup: Arc<dyn FlagLookup>, publisher: Arc<HttpEventPublisher>) -> Arc<Self> {
        Arc::new(Self { processors: RwLock::new(HashMap::new()), flag_lookup, publisher })
    }

    async fn processor_for(&self, tag: &Option<String>) -> Arc<Mutex<EventProcessorState>> {
        if let Some(existing) = self.processors.read().await.get(tag) {
            return Arc::clone(existing);
        }
        let mut processors = self.processors.write().await;
        Arc::clone(processors.entry(tag.clone()).or_insert_with(|| Arc::new(Mutex::new(EventProcessorState::new()))))
    }

    /// Translates and accumulates a raw batch of event objects under `tag`.
    /// Unparseable objects (not a JSON object, or no recognizable `kind`)
    /// are logged and dropped; they never fail the batch.
    pub async fn ingest(&self, tag: Option<String>, schema: u32, raw_events: Vec<Value>) {
        let processor = self.processor_for(&tag).await;
        let mut state = processor.lock().await;

        for event in raw_events {
            let kind = event.get("kind").and_then(|v| v.as_str()).map(|s| s.to_string());
            match kind.as_deref() {
                Some("identify") => state.ingest_identify(event),
                Some("custom") => state.ingest_custom(event),
                Some("feature") => state.ingest_feature(event, schema, self.flag_lookup.as_ref()).await,
                _ => warn!(?tag, "dropping unparseable event object"),
            }
        }
    }

    /// Spawns the idle-cleanup daemon: each tick, non-idle processors flush
    /// and publish their accumulated batch; idle ones are removed from the
    /// map entirely. Stops when `stop` resolves.
    pub fn spawn_cleanup_loop(self: Arc<Self>, interval: Duration, mut stop: oneshot::Receiver<()>) -> oneshot::Receiver<()> {
        let (done_tx, done_rx) = oneshot::channel();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                tokio::select! {
                    _ = ticker.tick() => self.sweep().await,
                    _ = &mut stop => {
                        trace!("summarizer cleanup loop received stop signal");
                        break;
                    }
                }
            }
            let _ = done_tx.send(());
        });
        done_rx
    }

    async fn sweep(&self) {
        let start_date = Utc::now().timestamp_millis();
        let snapshot: Vec<(Option<String>, Arc<Mutex<EventProcessorState>>)> =
            self.processors.read().await.iter().map(|(tag, processor)| (tag.clone(), Arc::clone(processor))).collect();

        let mut idle_candidates = Vec::new();
        for (tag, processor) in snapshot {
            let mut state = processor.lock().await;
            if state.is_idle() {
                idle_candidates.push((tag, processor));
                continue;
            }
            let end_date = Utc::now().timestamp_millis();
            if let Some(batch) = state.flush(start_date, end_date) {
                drop(state);
                self.publisher.publish(EventPayloadMetadata::new(CURRENT_OUTPUT_SCHEMA, tag), batch).await;
            }
        }

        if !idle_candidates.is_empty() {
            let mut processors = self.processors.write().await;
            for (tag, processor) in idle_candidates {
                let state = processor.lock().await;
                // Re-check under the map's write lock: an ingest() between the
                // read snapshot above and here may have cloned this Arc and be
                // about to (or just did) write into it. Two holders are
                // expected here — the map's own entry and this loop's local
                // `processor` — a third means someone else is still holding
                // the processor and eviction would orphan their write.
                if state.is_idle() && Arc::strong_count(&processor) == 2 {
                    drop(state);
                    processors.remove(&tag);
                }
            }
        }
    }
}

// FIN DEL ARCHIVO [libs/infra/event-pipeline/src/summarizer.rs]
