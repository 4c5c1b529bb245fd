use async_trait::async_trait;
use serde::Serialize;


/// Estado del enlace hacia el backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectivityState {
    Disconnected,
    Connecting,
    Connected,
    Error,
}


/// Vista de la red que tiene el monitor de conectividad.
#[async_trait]
pub trait LinkProbe: Send {
    /// Intenta establecer el enlace. El monitor acota la espera con su propio timeout.
    async fn connect(&mut self) -> bool;

    /// Comprueba si el enlace sigue disponible.
    async fn is_up(&mut self) -> bool;

    /// Intensidad de señal del uplink en dBm (`0` si no se conoce).
    fn rssi(&self) -> i32;
}
