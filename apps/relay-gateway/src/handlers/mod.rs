// INICIO DEL ARCHIVO [apps/relay-gateway/src/handlers/mod.rs]
/*!
 * =================================================================
 * APARATO: SERVICE ORCHESTRATION HUB (V1.0)
 * CLASIFICACIÓN: APPLICATION ADAPTERS (ESTRATO L4)
 * RESPONSABILIDAD: EXPOSICIÓN NOMINAL DE PUNTOS DE ENTRADA (HANDLERS)
 *
 * # Topología de Módulos:
 * - analytics:  Ingesta de ráfagas {server,mobile,JS}.
 * - diagnostic: Reenvío transparente de diagnósticos SDK.
 * - stream:     Túneles SSE de datos por canal.
 * =================================================================
 */

pub mod analytics;
pub mod diagnostic;
pub mod stream;
// FIN DEL ARCHIVO [apps/relay-gateway/src/handlers/mod.rs]
