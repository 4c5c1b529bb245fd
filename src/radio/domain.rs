use std::net::SocketAddr;
use std::time::Duration;
use serde::{Deserialize, Serialize};
use thiserror::Error;


/// Trama recibida por radio con sus métricas de señal.
#[derive(Debug, Clone, PartialEq)]
pub struct RadioFrame {
    pub payload: Vec<u8>,
    pub rssi: i32,
    pub snr: f32,
    pub received_at: Duration,
}


impl RadioFrame {
    /// Admisión: señal por encima del umbral y payload no vacío.
    pub fn is_accepted(&self, rssi_threshold: i32) -> bool {
        self.rssi >= rssi_threshold && !self.payload.is_empty()
    }
}


/// Capacidad de radio que consume el gateway. El driver del transceptor queda fuera.
pub trait RadioTransport: Send {
    /// Transmite una trama. `false` si no se pudo encolar/enviar.
    fn send_frame(&mut self, bytes: &[u8]) -> bool;

    /// Devuelve la siguiente trama pendiente sin bloquear.
    fn poll_frame(&mut self) -> Option<RadioFrame>;

    /// Vuelve al modo de recepción continua.
    fn enter_receive_mode(&mut self);
}


/// Datagrama que entrega el módem de radio por UDP.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModemUplink {
    pub payload: String,
    pub rssi: i32,
    pub snr: f32,
}


/// Datagrama que el gateway devuelve al módem para transmitir.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ModemDownlink {
    pub payload: String,
}


/// Trama recibida junto con la dirección del módem que la entregó.
#[derive(Debug, Clone)]
pub struct InboundFrame {
    pub modem: SocketAddr,
    pub payload: Vec<u8>,
    pub rssi: i32,
    pub snr: f32,
}


/// Trama a transmitir por el módem indicado.
#[derive(Debug, Clone)]
pub struct OutboundFrame {
    pub modem: SocketAddr,
    pub payload: Vec<u8>,
}


#[derive(Debug, Error)]
pub enum RadioError {
    #[error("no se pudo abrir el socket del módem en {addr}: {source}")]
    Bind { addr: String, source: std::io::Error },
}
