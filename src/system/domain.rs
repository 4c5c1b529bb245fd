//! Módulo de configuración central y gestión del entorno de ejecución.
//!
//! Este módulo actúa como la fuente única de verdad para la configuración del gateway.
//! Se encarga de leer las variables de entorno, establecer valores por defecto seguros
//! y proveer las estructuras necesarias para iniciar los subsistemas (Radio, Uplink, Logging).
//!
//! # Funcionalidades Principales
//! * **Carga de Configuración:** Lee de `.env` en desarrollo y variables de sistema en producción.
//! * **Observabilidad:** Configura `tracing_subscriber` para logs estructurados o legibles.
//! * **Parámetros de Radio:** Expone la configuración LoRa informada por `/api/stats`.
//!


use std::env;
use std::str::FromStr;
use serde::Serialize;
use thiserror::Error;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};


/// Errores al cargar la configuración del entorno.
#[derive(Debug, Error)]
pub enum SystemError {
    #[error("la variable {name} tiene un valor inválido: {value}")]
    InvalidVar { name: &'static str, value: String },
}


/// Parámetros del transceptor LoRa.
///
/// El gateway no configura el chip directamente (eso es trabajo del módem), pero
/// los reporta en el endpoint de estadísticas y en el banner de arranque.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RadioConfig {
    #[serde(rename = "freq")]
    pub frequency_hz: u64,
    #[serde(rename = "sf")]
    pub spreading_factor: u8,
    #[serde(rename = "bw")]
    pub bandwidth_hz: u64,
    #[serde(rename = "cr")]
    pub coding_rate: u8,
    pub tx_power: i8,
    pub sync_word: u8,
}


impl Default for RadioConfig {
    fn default() -> Self {
        Self {
            frequency_hz: 915_000_000,
            spreading_factor: 7,
            bandwidth_hz: 125_000,
            coding_rate: 5,
            tx_power: 20,
            sync_word: 0x20,
        }
    }
}


/// Representa la configuración global del gateway y el estado del entorno.
#[derive(Debug, Clone)]
pub struct System {
    /// Identificador del gateway incluido en cada mensaje.
    /// Por defecto: `GW001`.
    pub gateway_id: String,

    /// Host del backend HTTP.
    /// Por defecto: `localhost`.
    pub backend_host: String,

    /// Puerto del backend HTTP.
    /// Por defecto: `8081`.
    pub backend_port: u16,

    /// Puerto de la superficie de monitoreo.
    /// Por defecto: `8080`.
    pub web_port: u16,

    /// Dirección UDP donde el módem de radio entrega las tramas.
    /// Por defecto: `0.0.0.0:1700`.
    pub radio_bind_addr: String,

    /// RSSI mínimo (dBm) para admitir una trama.
    /// Por defecto: `-120`.
    pub rssi_threshold: i32,

    /// Interfaz inalámbrica usada para leer la señal del uplink (ej. `wlan0`).
    pub wireless_interface: Option<String>,

    pub radio: RadioConfig,

    /// Entorno de ejecución actual (`development`, `staging`, `production`).
    /// Afecta el formato de logs y la carga de archivos `.env`.
    pub environment: String,

    /// Nivel de detalle de los logs (ej. `info`, `debug`, `warn`).
    /// Se autoconfigura según el `environment` si no se especifica.
    pub rust_log: String,
}


impl Default for System {
    fn default() -> Self {
        Self {
            gateway_id: "GW001".to_string(),
            backend_host: "localhost".to_string(),
            backend_port: 8081,
            web_port: 8080,
            radio_bind_addr: "0.0.0.0:1700".to_string(),
            rssi_threshold: -120,
            wireless_interface: None,
            radio: RadioConfig::default(),
            environment: "development".to_string(),
            rust_log: "debug".to_string(),
        }
    }
}


impl System {

    /// Carga la configuración desde las variables de entorno.
    ///
    /// # Comportamiento
    /// * Si `ENVIRONMENT` es "development", intenta cargar un archivo `.env`.
    /// * Establece valores por defecto para variables ausentes.
    ///
    /// # Errores
    /// * `SystemError::InvalidVar` si una variable numérica no se puede interpretar.
    pub fn new() -> Result<Self, SystemError> {

        let environment = env::var("ENVIRONMENT")
            .unwrap_or_else(|_| "development".into());

        if environment == "development" {
            dotenv::dotenv().ok();
        }

        let defaults = System::default();
        let radio = RadioConfig {
            frequency_hz: parse_var("LORA_FREQUENCY", defaults.radio.frequency_hz)?,
            spreading_factor: parse_var("LORA_SF", defaults.radio.spreading_factor)?,
            bandwidth_hz: parse_var("LORA_BW", defaults.radio.bandwidth_hz)?,
            coding_rate: parse_var("LORA_CR", defaults.radio.coding_rate)?,
            tx_power: parse_var("LORA_TX_POWER", defaults.radio.tx_power)?,
            sync_word: parse_var("LORA_SYNC_WORD", defaults.radio.sync_word)?,
        };

        Ok(System {
            gateway_id: env::var("GATEWAY_ID")
                .unwrap_or(defaults.gateway_id),

            backend_host: env::var("BACKEND_HOST")
                .unwrap_or(defaults.backend_host),

            backend_port: parse_var("BACKEND_PORT", defaults.backend_port)?,

            web_port: parse_var("WEB_PORT", defaults.web_port)?,

            radio_bind_addr: env::var("RADIO_BIND_ADDR")
                .unwrap_or(defaults.radio_bind_addr),

            rssi_threshold: parse_var("RSSI_THRESHOLD", defaults.rssi_threshold)?,

            wireless_interface: env::var("WIRELESS_INTERFACE").ok()
                .filter(|iface| !iface.is_empty()),

            radio,

            rust_log: env::var("RUST_LOG")
                .unwrap_or_else(|_| {
                    match environment.as_str() {
                        "development" => "debug".to_string(),
                        "staging" => "info".to_string(),
                        _ => "warn".to_string(),
                    }
                }),

            environment,
        })
    }

    /// URL base del backend (`http://host:puerto`).
    pub fn backend_url(&self) -> String {
        format!("http://{}:{}", self.backend_host, self.backend_port)
    }

    /// Registra los parámetros principales al arrancar.
    pub fn log_startup(&self) {
        info!(
            gateway_id = %self.gateway_id,
            frequency_mhz = self.radio.frequency_hz as f64 / 1e6,
            sf = self.radio.spreading_factor,
            bw_khz = self.radio.bandwidth_hz as f64 / 1e3,
            cr = format!("4/{}", self.radio.coding_rate),
            tx_power_dbm = self.radio.tx_power,
            "Info: gateway LoRa iniciando"
        );
    }
}


fn parse_var<T: FromStr>(name: &'static str, default: T) -> Result<T, SystemError> {
    match env::var(name) {
        Ok(value) => parse_value(name, &value),
        Err(_) => Ok(default),
    }
}


/// Acepta valores decimales o hexadecimales con prefijo `0x` (útil para `LORA_SYNC_WORD`).
fn parse_value<T: FromStr>(name: &'static str, value: &str) -> Result<T, SystemError> {
    let trimmed = value.trim();
    let parsed = match trimmed.strip_prefix("0x").or_else(|| trimmed.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16)
            .ok()
            .and_then(|n| n.to_string().parse().ok()),
        None => trimmed.parse().ok(),
    };
    parsed.ok_or_else(|| SystemError::InvalidVar { name, value: value.to_string() })
}


/// Inicializa el sistema de trazabilidad y logs (Tracing).
///
/// Configura el formato de salida basándose en el entorno:
/// * **Production**: Salida JSON (para logs estructurados en la nube).
/// * **Development/Otros**: Salida "Pretty" (colores y formato legible).
pub fn init_tracing(system: &System) {

    let filter = EnvFilter::try_new(&system.rust_log)
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let builder = fmt().with_env_filter(filter).with_target(false);

    if system.environment == "production" {
        builder.json().init();
    } else {
        builder.pretty().init();
    }
}
