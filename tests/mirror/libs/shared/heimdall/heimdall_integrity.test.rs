// [tests/mirror/libs/shared/heimdall/heimdall_integrity.test.rs]
/**
 * =================================================================
 * APARATO: HEIMDALL INTEGRITY CERTIFIER (V1.1 - HYGIENE FIXED)
 * CLASIFICACIÓN: TRINITY EVIDENCE // ESTRATO L4-SHARED
 * RESPONSABILIDAD: VALIDACIÓN DE TRAZADO E INTERCEPCIÓN DE PÁNICOS
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. HYGIENE: Resolución definitiva de 'unused import: error'.
 * 2. MACRO SYNC: Validación de instrumentación nominal nivel L1.
 * 3. ZERO ABBREVIATIONS: Nomenclatura descriptiva para el rastro de pánico.
 * =================================================================
 */

use relay_shared_heimdall::init_tracing;
use tracing::{info, instrument}; // ✅ RESOLUCIÓN: 'error' eliminado por ser redundante en este scope
use std::panic;

/**
 * Operación micro-instrumentada para validar la inyección de Spans.
 */
#[instrument(name = "test_instrumentation_strata")]
fn simulate_instrumented_operation() {
    info!("📡 [SIGNAL]: Executing traced micro-operation.");
}

/**
 * CERTIFICACIÓN: Validación del sistema nervioso y el escudo de pánicos.
 */
#[tokio::test]
async fn certify_heimdall_macro_and_panic_strata() {
    println!("\n👁️  [PROVING_GROUNDS]: Initiating Heimdall Observability Audit...");

    // 1. FASE DE IGNICIÓN SOBERANA
    init_tracing("heimdall_integrity_test");

    // 2. FASE DE MACRO SYNC
    println!("   🧪 Phase 1: Verifying macro visibility (#[instrument])...");
    simulate_instrumented_operation();
    println!("      ✅ Macro Dispatch: OK.");

    // 3. FASE PHOENIX SHIELD (Intercepción de colapso)
    println!("   🧪 Phase 2: Auditing Phoenix Shield (Global Panic Hook)...");

    let panic_capture_result = panic::catch_unwind(|| {
        println!("      🔥 Simulating thread collapse for forensic validation...");
        panic!("INTENTIONAL_STRATA_FAILURE_FOR_TESTING");
    });

    assert!(panic_capture_result.is_err(), "CRITICAL: The panic hook failed to isolate the thread collapse.");
    println!("      ✅ Phoenix Shield: Interception confirmed. Rastro forense generado.");

    println!("🏁 [COMPLETE]: Heimdall observability strata certified with ZERO warnings.\n");
}
