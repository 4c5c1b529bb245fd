use serde::Serialize;
use thiserror::Error;
use crate::connectivity::domain::ConnectivityState;
use crate::history::domain::HistoryEntry;
use crate::registry::domain::DeviceEntry;
use crate::system::domain::RadioConfig;


/// Respuesta de `GET /api/stats`.
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    pub gateway_id: String,
    pub uptime_s: u64,
    pub packets_rx: u64,
    pub packets_fwd: u64,
    pub packets_err: u64,
    pub wifi_rssi: i32,
    pub uplink: ConnectivityState,
    pub free_heap: u64,
    pub time_synced: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_time: Option<i64>,
    pub lora: RadioConfig,
}


/// Respuesta de `GET /api/devices`.
#[derive(Debug, Clone, Serialize)]
pub struct DevicesResponse {
    pub uptime_ms: u64,
    pub devices: Vec<DeviceEntry>,
    pub time_synced: bool,
    pub boot_time: i64,
    #[serde(rename = "lastPackets")]
    pub last_packets: Vec<HistoryEntry>,
}


/// Respuesta de `GET /api/time`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeStatus {
    pub synced: bool,
    pub boot_time: i64,
    pub current_time: i64,
    pub uptime_s: u64,
}


#[derive(Debug, Clone, Copy, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
}


/// Motivos de rechazo de `POST /api/time`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TimeRequestError {
    #[error("timestamp required")]
    Missing,
    #[error("invalid timestamp")]
    Invalid,
}


impl TimeRequestError {
    pub fn body(&self) -> ErrorBody {
        match self {
            TimeRequestError::Missing => ErrorBody { error: "timestamp required" },
            TimeRequestError::Invalid => ErrorBody { error: "invalid timestamp" },
        }
    }
}
