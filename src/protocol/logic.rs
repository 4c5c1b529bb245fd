//! Codificación y decodificación del protocolo del gateway.
//!
//! Todas las operaciones son transformaciones puras sobre sus entradas; el único
//! efecto colateral es el log.


use std::time::Duration;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};
use crate::config::gateway::MAX_PACKET_SIZE;
use super::domain::{AckMessage, GatewayStats, MessageType, ProtocolError, RfMetrics,
                    SensorRecord, StatusEnvelope, UplinkEnvelope};


#[derive(Debug, Clone)]
pub struct Protocol {
    gateway_id: String,
    max_packet_size: usize,
}


impl Protocol {
    pub fn new(gateway_id: impl Into<String>) -> Self {
        Self {
            gateway_id: gateway_id.into(),
            max_packet_size: MAX_PACKET_SIZE,
        }
    }

    pub fn gateway_id(&self) -> &str {
        &self.gateway_id
    }

    /// Decodifica el payload crudo de un nodo.
    ///
    /// # Errores
    /// * `Empty` / `TooLarge`: el tamaño está fuera de rango.
    /// * `Malformed`: no es JSON válido.
    /// * `MissingFields`: falta `id` o `type` (o no son texto/número).
    ///
    /// `seq` toma `0` si está ausente o no es un entero de 32 bits sin signo.
    pub fn decode(&self, raw: &[u8]) -> Result<SensorRecord, ProtocolError> {
        let doc = self.parse(raw).map_err(|e| {
            warn!("Warning: paquete descartado: {}", e);
            e
        })?;

        let (Some(id), Some(device_type)) = (identity_field(&doc, "id"), identity_field(&doc, "type")) else {
            warn!("Warning: campos obligatorios ausentes (id, type)");
            return Err(ProtocolError::MissingFields);
        };

        let seq = doc.get("seq")
            .and_then(Value::as_u64)
            .and_then(|n| u32::try_from(n).ok())
            .unwrap_or(0);

        let data = doc.get("data").filter(|value| !value.is_null()).cloned();

        debug!(node = %id, kind = %device_type, seq, "Debug: paquete decodificado");

        Ok(SensorRecord { id, device_type, seq, data })
    }

    /// Verificación rápida previa a `decode`: tamaño, sintaxis y campos mínimos.
    pub fn validate(&self, raw: &[u8]) -> bool {
        match self.parse(raw) {
            Ok(doc) => identity_field(&doc, "id").is_some() && identity_field(&doc, "type").is_some(),
            Err(_) => false,
        }
    }

    /// Clasifica un payload por su campo `type`.
    pub fn message_type(&self, raw: &[u8]) -> MessageType {
        match serde_json::from_slice::<Value>(raw) {
            Ok(doc) => doc.get("type")
                .and_then(Value::as_str)
                .map(MessageType::from_type_field)
                .unwrap_or(MessageType::Unknown),
            Err(_) => MessageType::Unknown,
        }
    }

    /// Construye el sobre para el backend; `timestamp_s` es relativo al arranque.
    pub fn encode_uplink(&self, record: &SensorRecord, rssi: i32, snr: f32, timestamp_s: u64) -> Vec<u8> {
        let envelope = UplinkEnvelope {
            gateway_id: self.gateway_id.clone(),
            timestamp: timestamp_s,
            node: record.clone(),
            rf: RfMetrics { rssi, snr },
        };
        let bytes = to_bytes(&envelope);
        debug!(payload = %String::from_utf8_lossy(&bytes), "Debug: payload para el servidor");
        bytes
    }

    pub fn encode_ack(&self, device_id: &str, seq: u32, ok: bool) -> Vec<u8> {
        to_bytes(&AckMessage {
            kind: "ack".to_string(),
            to: device_id.to_string(),
            seq,
            ok,
            gw: self.gateway_id.clone(),
        })
    }

    pub fn encode_status(&self,
                         uplink_rssi: i32,
                         packets_rx: u64,
                         packets_fwd: u64,
                         uptime: Duration,
                         free_heap: u64) -> Vec<u8> {
        to_bytes(&StatusEnvelope {
            gateway_id: self.gateway_id.clone(),
            kind: "status".to_string(),
            timestamp: uptime.as_secs(),
            stats: GatewayStats {
                uptime_s: uptime.as_secs(),
                packets_rx,
                packets_fwd,
                wifi_rssi: uplink_rssi,
                free_heap,
            },
        })
    }

    fn parse(&self, raw: &[u8]) -> Result<Map<String, Value>, ProtocolError> {
        if raw.is_empty() {
            return Err(ProtocolError::Empty);
        }
        if raw.len() > self.max_packet_size {
            return Err(ProtocolError::TooLarge { size: raw.len(), max: self.max_packet_size });
        }

        match serde_json::from_slice::<Value>(raw) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) => Err(ProtocolError::MissingFields),
            Err(e) => Err(ProtocolError::Malformed(e.to_string())),
        }
    }
}


/// Lee un campo de identificación aceptando texto o número.
fn identity_field(doc: &Map<String, Value>, key: &str) -> Option<String> {
    match doc.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}


// Serializar estructuras propias a JSON no falla: no hay mapas con claves no textuales.
fn to_bytes<T: Serialize>(value: &T) -> Vec<u8> {
    serde_json::to_vec(value).unwrap_or_default()
}
