//! Gateway LoRa → HTTP.
//!
//! Recibe tramas JSON de nodos sensores a través de un módem de radio, las valida,
//! mantiene un registro de dispositivos y un historial acotado en memoria, reenvía
//! cada lectura a un backend HTTP y responde con un ACK por radio. Una API HTTP
//! local expone estadísticas, dispositivos y la sincronización de hora.

pub mod config;
pub mod system;
pub mod clock;
pub mod context;
pub mod channels;
pub mod protocol;
pub mod registry;
pub mod history;
pub mod connectivity;
pub mod radio;
pub mod uplink;
pub mod status;
pub mod gateway;
pub mod web;
