//! Superficie de monitoreo HTTP del gateway.
//!
//! * `GET /api/stats`: contadores, señal del uplink y configuración LoRa.
//! * `GET /api/devices`: dispositivos activos e historial reciente (más nuevo primero).
//! * `POST /api/time`: sincroniza el reloj de pared (campo de formulario `timestamp`).
//! * `GET /api/time`: estado de la sincronización.


use std::collections::HashMap;
use std::net::SocketAddr;
use axum::extract::rejection::FormRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Form, Json, Router};
use tokio::net::TcpListener;
use tracing::{error, info};
use crate::clock::domain::SyncedTime;
use crate::context::domain::AppContext;
use crate::gateway::domain::lock_state;
use crate::status::logic::available_memory;
use super::domain::{DevicesResponse, StatsResponse, TimeRequestError, TimeStatus};


pub fn stats_report(ctx: &AppContext) -> StatsResponse {
    let uptime = ctx.clock.uptime();
    let state = lock_state(&ctx.state);

    StatsResponse {
        gateway_id: ctx.system.gateway_id.clone(),
        uptime_s: uptime.as_secs(),
        packets_rx: state.counters.received,
        packets_fwd: state.counters.forwarded,
        packets_err: state.counters.errors,
        wifi_rssi: state.uplink_rssi,
        uplink: state.connectivity,
        free_heap: available_memory(),
        time_synced: state.time_sync.is_synced(),
        current_time: state.time_sync.current_time(uptime),
        lora: ctx.system.radio.clone(),
    }
}


/// Expira dispositivos inactivos antes de responder.
pub fn devices_report(ctx: &AppContext) -> DevicesResponse {
    let uptime = ctx.clock.uptime();
    let mut state = lock_state(&ctx.state);

    DevicesResponse {
        uptime_ms: uptime.as_millis() as u64,
        devices: state.registry.list_active(uptime),
        time_synced: state.time_sync.is_synced(),
        boot_time: state.time_sync.boot_time(),
        last_packets: state.history.recent().cloned().collect(),
    }
}


pub fn time_status(ctx: &AppContext) -> TimeStatus {
    let uptime = ctx.clock.uptime();
    let state = lock_state(&ctx.state);

    TimeStatus {
        synced: state.time_sync.is_synced(),
        boot_time: state.time_sync.boot_time(),
        current_time: state.time_sync.current_time(uptime).unwrap_or(0),
        uptime_s: uptime.as_secs(),
    }
}


pub fn sync_time(ctx: &AppContext, form: &HashMap<String, String>) -> Result<SyncedTime, TimeRequestError> {
    let raw = form.get("timestamp").ok_or(TimeRequestError::Missing)?;
    let unix_secs = leading_integer(raw);
    let uptime = ctx.clock.uptime();

    let mut state = lock_state(&ctx.state);
    let synced = state.time_sync
        .sync(unix_secs, uptime)
        .map_err(|_| TimeRequestError::Invalid)?;

    info!(
        browser = synced.synced_time,
        boot = synced.boot_time,
        now = state.time_sync.current_time_rfc3339(uptime).unwrap_or_default(),
        "Info: tiempo sincronizado"
    );
    Ok(synced)
}


/// Entero inicial del texto (`"1750000000.5"` → `1750000000`); `0` si no empieza con dígitos.
fn leading_integer(raw: &str) -> i64 {
    let trimmed = raw.trim_start();
    let end = trimmed.char_indices()
        .find(|&(i, c)| !(c.is_ascii_digit() || (i == 0 && (c == '-' || c == '+'))))
        .map_or(trimmed.len(), |(i, _)| i);
    trimmed[..end].parse().unwrap_or(0)
}


async fn handle_stats(State(ctx): State<AppContext>) -> Json<StatsResponse> {
    Json(stats_report(&ctx))
}


async fn handle_devices(State(ctx): State<AppContext>) -> Json<DevicesResponse> {
    Json(devices_report(&ctx))
}


async fn handle_time_status(State(ctx): State<AppContext>) -> Json<TimeStatus> {
    Json(time_status(&ctx))
}


// Sin cuerpo de formulario no hay `timestamp`: se responde 400, no el 415 del extractor.
async fn handle_time_sync(State(ctx): State<AppContext>,
                          form: Result<Form<HashMap<String, String>>, FormRejection>) -> Response {
    let form = form.map(|Form(form)| form).unwrap_or_default();
    match sync_time(&ctx, &form) {
        Ok(synced) => (StatusCode::OK, Json(synced)).into_response(),
        Err(e) => (StatusCode::BAD_REQUEST, Json(e.body())).into_response(),
    }
}


async fn handle_not_found() -> (StatusCode, &'static str) {
    (StatusCode::NOT_FOUND, "Página no encontrada")
}


pub fn router(ctx: AppContext) -> Router {
    Router::new()
        .route("/api/stats", get(handle_stats))
        .route("/api/devices", get(handle_devices))
        .route("/api/time", get(handle_time_status).post(handle_time_sync))
        .fallback(handle_not_found)
        .with_state(ctx)
}


/// Abre el puerto de monitoreo y sirve la API en una tarea propia.
pub async fn start_web_server(ctx: AppContext) -> std::io::Result<SocketAddr> {
    let addr = SocketAddr::from(([0, 0, 0, 0], ctx.system.web_port));
    let listener = TcpListener::bind(addr).await?;
    let local = listener.local_addr()?;
    let app = router(ctx);

    info!("Info: servidor web iniciado en http://{}", local);

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            error!("Error: servidor web detenido: {}", e);
        }
    });

    Ok(local)
}
