//! Pipeline de procesamiento de paquetes del gateway.
//!
//! # Etapas (en orden, cada una corta el flujo si falla)
//! 1. **Recepción**: se consulta la radio; sin trama no hay trabajo.
//! 2. **Admisión**: RSSI bajo el umbral o payload vacío → error.
//! 3. **Validación + decodificación** → error si falla.
//! 4. **Registro**: registro de dispositivos + historial (siempre).
//! 5. **Reenvío**: solo con el uplink `Connected`; fallo o sin conexión → error.
//! 6. **ACK**: un único intento por radio; su fallo solo se registra en el log.
//!
//! Una llamada a `tick` procesa como máximo una trama. El POST al backend se espera
//! dentro del tick, así que durante ese tiempo no se drenan tramas nuevas.


use std::sync::Arc;
use tokio::time::sleep;
use tracing::{debug, info, instrument, warn};
use crate::clock::domain::Clock;
use crate::config::gateway::LOOP_YIELD;
use crate::config::http::SENSOR_ENDPOINT;
use crate::connectivity::domain::LinkProbe;
use crate::connectivity::logic::ConnectivityMonitor;
use crate::context::domain::AppContext;
use crate::history::domain::HistoryEntry;
use crate::protocol::logic::Protocol;
use crate::radio::domain::{RadioFrame, RadioTransport};
use crate::status::domain::{StatusOutcome, StatusSnapshot};
use crate::status::logic::{available_memory, StatusReporter};
use crate::uplink::domain::UplinkClient;
use super::domain::{lock_state, ForwardFailure, FrameOutcome, SharedState, TickReport};


pub struct Gateway<R, U, P> {
    radio: R,
    uplink: U,
    connectivity: ConnectivityMonitor<P>,
    protocol: Protocol,
    status: StatusReporter,
    clock: Arc<dyn Clock>,
    state: SharedState,
    rssi_threshold: i32,
}


impl<R, U, P> Gateway<R, U, P>
where
    R: RadioTransport,
    U: UplinkClient,
    P: LinkProbe,
{
    pub fn new(radio: R,
               uplink: U,
               connectivity: ConnectivityMonitor<P>,
               ctx: &AppContext) -> Self {
        Self {
            radio,
            uplink,
            connectivity,
            protocol: Protocol::new(ctx.system.gateway_id.clone()),
            status: StatusReporter::default(),
            clock: ctx.clock.clone(),
            state: ctx.state.clone(),
            rssi_threshold: ctx.system.rssi_threshold,
        }
    }

    pub fn state(&self) -> SharedState {
        self.state.clone()
    }

    /// Una iteración del bucle cooperativo: conectividad, a lo sumo una trama y
    /// el reporte de estado si corresponde.
    pub async fn tick(&mut self) -> TickReport {
        let connectivity = self.connectivity.poll(self.clock.uptime()).await;
        {
            let mut state = lock_state(&self.state);
            state.connectivity = connectivity;
            state.uplink_rssi = self.connectivity.rssi();
        }

        let frame = match self.radio.poll_frame() {
            Some(frame) => Some(self.process_frame(frame).await),
            None => None,
        };

        let status = if self.status.is_due(self.clock.uptime()) {
            Some(self.report_status().await)
        } else {
            None
        };

        TickReport { connectivity, frame, status }
    }

    /// Ejecuta el pipeline completo sobre una trama recibida.
    #[instrument(name = "process_frame", skip_all, fields(rssi = frame.rssi, snr = frame.snr))]
    pub async fn process_frame(&mut self, frame: RadioFrame) -> FrameOutcome {
        if !frame.is_accepted(self.rssi_threshold) {
            warn!("Warning: trama descartada en la admisión");
            self.count_error();
            return FrameOutcome::Rejected;
        }

        debug!(kind = ?self.protocol.message_type(&frame.payload), "Debug: trama admitida");

        if !self.protocol.validate(&frame.payload) {
            warn!("Warning: paquete inválido");
            self.count_error();
            return FrameOutcome::Invalid;
        }

        let record = match self.protocol.decode(&frame.payload) {
            Ok(record) => record,
            Err(e) => {
                warn!("Warning: falla en el parsing: {}", e);
                self.count_error();
                return FrameOutcome::Invalid;
            }
        };

        {
            let mut state = lock_state(&self.state);
            state.registry.record_sighting(&record.id, &record.device_type, frame.rssi, frame.snr, frame.received_at);
            state.history.append(HistoryEntry::new(&record.id, record.data.as_ref(), frame.rssi, frame.snr, frame.received_at));
            state.counters.received += 1;
        }

        if !self.connectivity.is_connected() {
            warn!(node = %record.id, "Warning: uplink desconectado, datos no enviados");
            self.count_error();
            return FrameOutcome::NotForwarded(ForwardFailure::Disconnected);
        }

        let payload = self.protocol.encode_uplink(&record, frame.rssi, frame.snr, self.clock.uptime().as_secs());
        if !self.uplink.post(SENSOR_ENDPOINT, payload).await {
            warn!(node = %record.id, "Warning: falla al enviar al servidor");
            self.count_error();
            return FrameOutcome::NotForwarded(ForwardFailure::UplinkFailed);
        }

        lock_state(&self.state).counters.forwarded += 1;
        info!(node = %record.id, seq = record.seq, "Info: datos enviados con éxito");

        let ack = self.protocol.encode_ack(&record.id, record.seq, true);
        let acked = self.radio.send_frame(&ack);
        if !acked {
            warn!(node = %record.id, "Warning: no se pudo enviar el ACK");
        }

        FrameOutcome::Forwarded { acked }
    }

    async fn report_status(&mut self) -> StatusOutcome {
        let counters = lock_state(&self.state).counters;
        let snapshot = StatusSnapshot {
            uptime: self.clock.uptime(),
            uplink_rssi: self.connectivity.rssi(),
            packets_rx: counters.received,
            packets_fwd: counters.forwarded,
            packets_err: counters.errors,
            free_heap: available_memory(),
        };
        self.status.report(snapshot, self.connectivity.is_connected(), &self.protocol, &self.uplink).await
    }

    fn count_error(&self) {
        lock_state(&self.state).counters.errors += 1;
    }

    /// Bucle principal: `tick` seguido de una pausa corta, indefinidamente.
    pub async fn run(mut self) {
        info!("Info: gateway listo, esperando paquetes LoRa");
        self.radio.enter_receive_mode();
        loop {
            self.tick().await;
            sleep(LOOP_YIELD).await;
        }
    }
}

