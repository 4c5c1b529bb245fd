//! Dominio del protocolo JSON del enlace LoRa y del uplink HTTP.
//!
//! Este módulo define las estructuras que se intercambian entre los nodos sensores,
//! el gateway y el backend. El formato es JSON plano; los campos numéricos usan su
//! tipo natural de JSON.
//!


use serde::{Serialize, Deserialize};
use serde_json::Value;
use thiserror::Error;


/// Registro decodificado de un paquete enviado por un nodo.
///
/// `data` se transporta sin interpretar: el gateway no conoce las magnitudes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SensorRecord {
    pub id: String,
    #[serde(rename = "type")]
    pub device_type: String,
    pub seq: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}


/// Métricas de radio asociadas a un paquete.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct RfMetrics {
    pub rssi: i32,
    pub snr: f32,
}


/// Sobre enviado al backend por cada paquete aceptado.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UplinkEnvelope {
    pub gateway_id: String,
    pub timestamp: u64,
    pub node: SensorRecord,
    pub rf: RfMetrics,
}


/// Confirmación enviada por radio al nodo de origen.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AckMessage {
    #[serde(rename = "type")]
    pub kind: String,
    pub to: String,
    pub seq: u32,
    pub ok: bool,
    pub gw: String,
}


/// Estadísticas agregadas del gateway.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GatewayStats {
    pub uptime_s: u64,
    pub packets_rx: u64,
    pub packets_fwd: u64,
    pub wifi_rssi: i32,
    pub free_heap: u64,
}


/// Reporte periódico de estado enviado al backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatusEnvelope {
    pub gateway_id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub timestamp: u64,
    pub stats: GatewayStats,
}


/// Clasificación de un payload según su campo `type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageType {
    Unknown,
    SensorData,
    ActuatorCmd,
    Ack,
    Status,
    Config,
}


impl MessageType {
    pub fn from_type_field(kind: &str) -> Self {
        match kind {
            "sensor" => MessageType::SensorData,
            "actuator" => MessageType::ActuatorCmd,
            "ack" => MessageType::Ack,
            "status" => MessageType::Status,
            "config" => MessageType::Config,
            _ => MessageType::Unknown,
        }
    }
}


/// Motivos por los que un payload no se puede decodificar.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("payload vacío")]
    Empty,
    #[error("payload de {size} bytes excede el máximo de {max}")]
    TooLarge { size: usize, max: usize },
    #[error("JSON inválido: {0}")]
    Malformed(String),
    #[error("campos obligatorios ausentes (id, type)")]
    MissingFields,
}
