use std::time::Duration;
use serde::Serialize;
use serde_json::Value;
use crate::registry::domain::as_millis;


/// Paquete aceptado, tal como se muestra en el monitoreo. Inmutable una vez escrito.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryEntry {
    pub node_id: String,
    pub rssi: i32,
    pub snr: f32,
    #[serde(rename = "timestamp_ms", serialize_with = "as_millis")]
    pub received_at: Duration,
    pub data: Value,
}


impl HistoryEntry {
    /// Copia el mapa `data` del paquete; cualquier otro valor se guarda como objeto vacío.
    pub fn new(node_id: &str, data: Option<&Value>, rssi: i32, snr: f32, received_at: Duration) -> Self {
        let data = match data {
            Some(Value::Object(map)) => Value::Object(map.clone()),
            _ => Value::Object(Default::default()),
        };
        Self {
            node_id: node_id.to_string(),
            rssi,
            snr,
            received_at,
            data,
        }
    }
}
