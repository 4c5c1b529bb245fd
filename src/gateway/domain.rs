//! Estado operativo del gateway.
//!
//! Agrupa registro, historial, contadores y sincronización de hora en una sola
//! estructura. El bucle del gateway es el único que la modifica durante el
//! procesamiento de tramas; la superficie de monitoreo la lee concurrentemente,
//! por eso vive detrás de un `Mutex` que nunca se mantiene a través de un `await`.


use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use serde::Serialize;
use crate::clock::domain::TimeSync;
use crate::connectivity::domain::ConnectivityState;
use crate::history::logic::PacketHistory;
use crate::registry::logic::DeviceRegistry;
use crate::status::domain::StatusOutcome;


#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Counters {
    pub received: u64,
    pub forwarded: u64,
    pub errors: u64,
}


#[derive(Debug)]
pub struct GatewayState {
    pub registry: DeviceRegistry,
    pub history: PacketHistory,
    pub counters: Counters,
    pub time_sync: TimeSync,
    pub connectivity: ConnectivityState,
    pub uplink_rssi: i32,
}


impl Default for GatewayState {
    fn default() -> Self {
        Self {
            registry: DeviceRegistry::default(),
            history: PacketHistory::default(),
            counters: Counters::default(),
            time_sync: TimeSync::default(),
            connectivity: ConnectivityState::Disconnected,
            uplink_rssi: 0,
        }
    }
}


pub type SharedState = Arc<Mutex<GatewayState>>;


pub fn new_shared_state(state: GatewayState) -> SharedState {
    Arc::new(Mutex::new(state))
}


/// Toma el lock del estado. Un pánico previo con el lock tomado no invalida los
/// contadores, así que se recupera el contenido en lugar de propagar el envenenamiento.
pub fn lock_state(state: &SharedState) -> MutexGuard<'_, GatewayState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}


/// Motivo por el que un paquete registrado no llegó al backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForwardFailure {
    Disconnected,
    UplinkFailed,
}


/// Resultado del pipeline para una trama.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameOutcome {
    /// Señal débil o payload vacío.
    Rejected,
    /// Falló la validación o la decodificación.
    Invalid,
    /// Registrado localmente pero no reenviado.
    NotForwarded(ForwardFailure),
    /// Reenviado al backend; `acked` indica si el ACK salió por radio.
    Forwarded { acked: bool },
}


/// Resumen de una iteración del bucle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickReport {
    pub connectivity: ConnectivityState,
    pub frame: Option<FrameOutcome>,
    pub status: Option<StatusOutcome>,
}
