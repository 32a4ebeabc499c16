// INICIO DEL ARCHIVO [libs/infra/event-pipeline/src/processor.rs]
/*!
 * =================================================================
 * APARATO: EVENT PROCESSOR (V1.0 - PER-TAG SUMMARIZATION COLLABORATOR)
 * CLASIFICACIÓN: DOMAIN SERVICE (ESTRATO L2)
 * RESPONSABILIDAD: TRADUCCIÓN feature/identify/custom, CONTADORES POR
 *                   flag/variation/version, Y DEDUPLICACIÓN DE ÍNDICES
 *
 * VISION HIPER-HOLÍSTICA:
 * La política de tres casos existe para no penalizar a los SDKs
 * modernos (schema >= 2) con una búsqueda de flag que ya trajeron
 * resuelta (trackEvents/debugEventsUntilDate propios); solo los SDKs
 * antiguos o incompletos pagan el costo de la consulta.
 * =================================================================
 */

use crate::flag_lookup::FlagLookup;
use relay_core_models::FlagItem;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use tracing::trace;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CounterKey {
    flag_key: String,
    variation: Option<u64>,
    version: Option<u64>,
}

#[derive(Debug, Clone, Default)]
struct Counter {
    count: u64,
    sum: f64,
}

/// Accumulates translated events for a single observed `X-LaunchDarkly-Tags`
/// value between two flushes. Owned exclusively by the summarizing relay's
/// tag map — never shared, so no internal locking.
#[derive(Default)]
pub struct EventProcessorState {
    output_events: Vec<Value>,
    counters: HashMap<CounterKey, Counter>,
    indexed_context_keys: HashSet<String>,
    touched_since_flush: bool,
}

impl EventProcessorState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_idle(&self) -> bool {
        !self.touched_since_flush
    }

    pub fn ingest_identify(&mut self, event: Value) {
        self.note_context_if_new(&event);
        self.output_events.push(event);
        self.touched_since_flush = true;
    }

    pub fn ingest_custom(&mut self, event: Value) {
        self.note_context_if_new(&event);
        self.output_events.push(event);
        self.touched_since_flush = true;
    }

    pub async fn ingest_feature(&mut self, event: Value, schema: u32, flag_lookup: &dyn FlagLookup) {
        self.note_context_if_new(&event);
        let translated = translate_feature(event, schema, flag_lookup).await;

        let flag_key = translated.get("key").and_then(|v| v.as_str()).unwrap_or_default().to_string();
        let variation = translated.get("variation").and_then(|v| v.as_u64());
        let version = translated.get("version").and_then(|v| v.as_u64());
        let counter = self
            .counters
            .entry(CounterKey { flag_key: flag_key.clone(), variation, version })
            .or_default();
        counter.count += 1;
        if let Some(value) = translated.get("value").and_then(|v| v.as_f64()) {
            if value != 0.0 {
                counter.sum += value;
            }
        }

        let track_events = translated.get("trackEvents").and_then(|v| v.as_bool()).unwrap_or(false);
        let debug_active = translated.get("debugEventsUntilDate").and_then(|v| v.as_i64()).map(|v| v != 0).unwrap_or(false);
        if track_events || debug_active {
            self.output_events.push(translated);
        }

        self.touched_since_flush = true;
    }

    /// Emits a synthetic `index` event the first time a context key is seen
    /// since the processor was created or last flushed.
    fn note_context_if_new(&mut self, event: &Value) {
        if let Some(key) = extract_context_key(event) {
            if self.indexed_context_keys.insert(key.clone()) {
                self.output_events.push(serde_json::json!({
                    "kind": "index",
                    "creationDate": event.get("creationDate").cloned().unwrap_or(Value::Null),
                    "context": event.get("context").or_else(|| event.get("user")).cloned().unwrap_or(Value::Null),
                }));
            }
        }
    }

    /// Drains accumulated state into a single JSON array (events followed by
    /// one summary record, if any counters were observed). Returns `None`
    /// when nothing was ingested since the previous flush.
    pub fn flush(&mut self, start_date_ms: i64, end_date_ms: i64) -> Option<Vec<Value>> {
        if !self.touched_since_flush {
            return None;
        }

        let mut batch = std::mem::take(&mut self.output_events);
        if !self.counters.is_empty() {
            batch.push(build_summary_record(&self.counters, start_date_ms, end_date_ms));
        }

        self.counters.clear();
        self.indexed_context_keys.clear();
        self.touched_since_flush = false;
        Some(batch)
    }
}

fn extract_context_key(event: &Value) -> Option<String> {
    event
        .get("context")
        .and_then(|c| c.get("key"))
        .or_else(|| event.get("user").and_then(|u| u.get("key")))
        .or_else(|| event.get("userKey"))
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
}

fn build_summary_record(counters: &HashMap<CounterKey, Counter>, start_date_ms: i64, end_date_ms: i64) -> Value {
    let mut features: HashMap<String, Vec<Value>> = HashMap::new();
    for (key, counter) in counters {
        features.entry(key.flag_key.clone()).or_default().push(serde_json::json!({
            "variation": key.variation,
            "version": key.version,
            "count": counter.count,
            "sum": counter.sum,
        }));
    }
    serde_json::json!({
        "kind": "summary",
        "startDate": start_date_ms,
        "endDate": end_date_ms,
        "features": features,
    })
}

/// Implements the three-case translation policy. `event` is
/// mutated in place and returned so callers can chain it into a counter key
/// derivation without re-parsing.
async fn translate_feature(mut event: Value, schema: u32, flag_lookup: &dyn FlagLookup) -> Value {
    let flag_key = event.get("key").and_then(|v| v.as_str()).map(|s| s.to_string());
    let version = event.get("version").and_then(|v| v.as_u64());

    if version.is_none() {
        event["version"] = Value::Null;
        event["variation"] = Value::Null;
        return event;
    }

    let has_track = event.get("trackEvents").is_some();
    let has_debug = event.get("debugEventsUntilDate").is_some();
    let own_track_true = event.get("trackEvents").and_then(|v| v.as_bool()).unwrap_or(false);
    let own_debug_nonzero = event.get("debugEventsUntilDate").and_then(|v| v.as_i64()).map(|v| v != 0).unwrap_or(false);

    let case1 = schema <= 1;
    let case2a = schema == 2 && !has_track && !has_debug;
    let case2b = own_track_true || own_debug_nonzero;

    if case2b && !case1 {
        trace!(?flag_key, "feature event carries its own track/debug policy; skipping flag lookup");
        return event;
    }

    if !(case1 || case2a) {
        return event;
    }

    let Some(key) = flag_key else { return event };
    let Some(flag) = flag_lookup.get_flag(&key).await else { return event };
    let Some(payload) = &flag.payload else { return event };

    if let Some(track_events) = payload.get("trackEvents") {
        event["trackEvents"] = track_events.clone();
    }
    if let Some(debug_until) = payload.get("debugEventsUntilDate") {
        event["debugEventsUntilDate"] = debug_until.clone();
    }

    if case1 && event.get("variation").and_then(|v| v.as_u64()).is_none() {
        if let Some(value) = event.get("value").cloned() {
            if let Some(variations) = payload.get("variations").and_then(|v| v.as_array()) {
                if let Some(index) = variations.iter().position(|candidate| *candidate == value) {
                    event["variation"] = serde_json::json!(index as u64);
                }
            }
        }
    }

    event
}

// FIN DEL ARCHIVO [libs/infra/event-pipeline/src/processor.rs]
