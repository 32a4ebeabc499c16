// INICIO DEL ARCHIVO [libs/infra/event-pipeline/src/flag_lookup.rs]
/*!
 * =================================================================
 * APARATO: FLAG LOOKUP PORT (V1.0)
 * CLASIFICACIÓN: INFRASTRUCTURE PORT (ESTRATO L3)
 * RESPONSABILIDAD: LECTURA DE DEFINICIONES DE FLAG PARA LA POLÍTICA DE
 *                   track_events/debug_events_until_date DEL RESUMIDOR
 *
 * VISION HIPER-HOLÍSTICA:
 * El resumidor no conoce el adaptador de broadcast ni el store opaco:
 * solo necesita "dado un key, dame la última definición conocida". El
 * trait se define aquí (no en relay-infra-data-store) para que este
 * crate no dependa de la mecánica de difusión SSE, solo de lectura.
 * =================================================================
 */

use relay_core_models::FlagItem;
use std::future::Future;
use std::pin::Pin;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub trait FlagLookup: Send + Sync {
    fn get_flag(&self, key: &str) -> BoxFuture<'_, Option<FlagItem>>;
}

/// A lookup that never resolves a flag. Useful for standalone tests of the
/// summarizer's counter bookkeeping, where the track/debug policy is not
/// under test.
pub struct NoFlagLookup;

impl FlagLookup for NoFlagLookup {
    fn get_flag(&self, _key: &str) -> BoxFuture<'_, Option<FlagItem>> {
        Box::pin(async { None })
    }
}
// FIN DEL ARCHIVO [libs/infra/event-pipeline/src/flag_lookup.rs]
