use std::time::Duration;
use serde::Serialize;


/// Última foto conocida de un nodo.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceEntry {
    pub id: String,
    #[serde(rename = "type")]
    pub device_type: String,
    pub rssi: i32,
    pub snr: f32,
    #[serde(rename = "packets")]
    pub packet_count: u32,
    #[serde(rename = "last_seen_ms", serialize_with = "as_millis")]
    pub last_seen: Duration,
    #[serde(skip)]
    pub active: bool,
}


/// Resultado de registrar un avistamiento.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sighting {
    /// Nodo ya conocido, actualizado.
    Updated,
    /// Nodo nuevo ocupando el slot indicado.
    Registered(usize),
    /// Registro lleno: el avistamiento se ignora.
    Dropped,
}


pub(crate) fn as_millis<S: serde::Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(value.as_millis() as u64)
}
