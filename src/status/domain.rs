use std::time::Duration;


/// Contadores y lecturas que alimentan un reporte de estado.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusSnapshot {
    pub uptime: Duration,
    pub uplink_rssi: i32,
    pub packets_rx: u64,
    pub packets_fwd: u64,
    pub packets_err: u64,
    pub free_heap: u64,
}


/// Resultado de un disparo del reportero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusOutcome {
    /// El backend aceptó el reporte.
    Sent,
    /// El POST falló.
    Failed,
    /// Sin conexión: el reporte solo quedó en el log.
    Skipped,
}
