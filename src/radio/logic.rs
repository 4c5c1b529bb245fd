//! Puente con el módem de radio.
//!
//! El transceptor LoRa vive detrás de un módem que entrega cada trama recibida como
//! un datagrama UDP JSON (`{"payload": "...", "rssi": -80, "snr": 9.5}`) y transmite
//! lo que el gateway le devuelve (`{"payload": "..."}`).
//!
//! # Arquitectura de Tareas
//! 1. `run_modem_listener` lee datagramas y los publica en el canal hacia el gateway.
//! 2. El bucle del gateway consume el canal a través de `ModemRadio::poll_frame`.
//! 3. `run_modem_sender` envía los ACK encolados por `ModemRadio::send_frame`.


use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::UdpSocket;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TryRecvError;
use tracing::{debug, error, info, warn};
use crate::clock::domain::Clock;
use crate::config::gateway::MAX_PACKET_SIZE;
use crate::config::radio::MAX_DATAGRAM_SIZE;
use super::domain::{InboundFrame, ModemDownlink, ModemUplink, OutboundFrame, RadioError,
                    RadioFrame, RadioTransport};


/// Implementación de `RadioTransport` sobre los canales del puente UDP.
pub struct ModemRadio {
    rx: mpsc::Receiver<InboundFrame>,
    tx: mpsc::Sender<OutboundFrame>,
    clock: Arc<dyn Clock>,
    last_modem: Option<SocketAddr>,
    receiving: bool,
}


impl ModemRadio {
    pub fn new(rx: mpsc::Receiver<InboundFrame>,
               tx: mpsc::Sender<OutboundFrame>,
               clock: Arc<dyn Clock>) -> Self {
        Self {
            rx,
            tx,
            clock,
            last_modem: None,
            receiving: false,
        }
    }
}


impl RadioTransport for ModemRadio {
    fn send_frame(&mut self, bytes: &[u8]) -> bool {
        let Some(modem) = self.last_modem else {
            warn!("Warning: ningún módem conocido para transmitir");
            return false;
        };
        if bytes.len() > MAX_PACKET_SIZE {
            error!("Error: paquete de {} bytes demasiado grande para transmitir", bytes.len());
            return false;
        }

        self.receiving = false;
        let sent = match self.tx.try_send(OutboundFrame { modem, payload: bytes.to_vec() }) {
            Ok(()) => true,
            Err(e) => {
                error!("Error: no se pudo encolar la trama de salida: {}", e);
                false
            }
        };
        self.enter_receive_mode();
        sent
    }

    fn poll_frame(&mut self) -> Option<RadioFrame> {
        if !self.receiving {
            self.enter_receive_mode();
        }
        match self.rx.try_recv() {
            Ok(inbound) => {
                self.last_modem = Some(inbound.modem);
                debug!(bytes = inbound.payload.len(), rssi = inbound.rssi, snr = inbound.snr,
                       "Debug: trama recibida");
                Some(RadioFrame {
                    payload: inbound.payload,
                    rssi: inbound.rssi,
                    snr: inbound.snr,
                    received_at: self.clock.uptime(),
                })
            }
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                warn!("Warning: canal del módem cerrado");
                None
            }
        }
    }

    fn enter_receive_mode(&mut self) {
        if !self.receiving {
            debug!("Debug: radio en modo recepción");
            self.receiving = true;
        }
    }
}


/// Interpreta un datagrama del módem.
pub fn parse_datagram(bytes: &[u8], modem: SocketAddr) -> Result<InboundFrame, serde_json::Error> {
    let uplink: ModemUplink = serde_json::from_slice(bytes)?;
    Ok(InboundFrame {
        modem,
        payload: uplink.payload.into_bytes(),
        rssi: uplink.rssi,
        snr: uplink.snr,
    })
}


pub async fn run_modem_listener(socket: Arc<UdpSocket>,
                                tx: mpsc::Sender<InboundFrame>) {

    info!("Info: listener del módem creado");
    let mut buf = vec![0u8; MAX_DATAGRAM_SIZE];

    loop {
        let (len, modem) = match socket.recv_from(&mut buf).await {
            Ok(received) => received,
            Err(e) => {
                error!("Error: lectura del socket del módem: {}", e);
                continue;
            }
        };

        match parse_datagram(&buf[..len], modem) {
            Ok(frame) => {
                if tx.send(frame).await.is_err() {
                    break;
                }
            }
            Err(e) => warn!("Warning: datagrama inválido de {}: {}", modem, e),
        }
    }
    info!("Info: listener del módem finalizado");
}


pub async fn run_modem_sender(socket: Arc<UdpSocket>,
                              mut rx: mpsc::Receiver<OutboundFrame>) {

    while let Some(frame) = rx.recv().await {
        let downlink = ModemDownlink {
            payload: String::from_utf8_lossy(&frame.payload).into_owned(),
        };
        let bytes = match serde_json::to_vec(&downlink) {
            Ok(bytes) => bytes,
            Err(e) => {
                error!("Error: serializando trama de salida: {}", e);
                continue;
            }
        };
        if let Err(e) = socket.send_to(&bytes, frame.modem).await {
            error!("Error: envío al módem {}: {}", frame.modem, e);
        }
    }
}


/// Abre el socket UDP del módem y lanza las tareas de lectura y escritura.
pub async fn start_modem_bridge(bind_addr: &str,
                                to_gateway: mpsc::Sender<InboundFrame>,
                                from_gateway: mpsc::Receiver<OutboundFrame>) -> Result<SocketAddr, RadioError> {

    let socket = UdpSocket::bind(bind_addr).await
        .map_err(|source| RadioError::Bind { addr: bind_addr.to_string(), source })?;
    let local = socket.local_addr()
        .map_err(|source| RadioError::Bind { addr: bind_addr.to_string(), source })?;
    let socket = Arc::new(socket);

    info!("Info: puente del módem escuchando en {}", local);

    let listener_socket = socket.clone();
    tokio::spawn(async move {
        run_modem_listener(listener_socket, to_gateway).await;
    });

    tokio::spawn(async move {
        run_modem_sender(socket, from_gateway).await;
    });

    Ok(local)
}


#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use crate::channels::domain::Channels;
    use crate::clock::domain::ManualClock;

    fn modem_addr() -> SocketAddr {
        "127.0.0.1:1700".parse().unwrap()
    }

    #[test]
    fn parses_modem_datagram() {
        let frame = parse_datagram(br#"{"payload":"{\"id\":\"N1\"}","rssi":-80,"snr":7.25}"#, modem_addr()).unwrap();
        assert_eq!(frame.payload, br#"{"id":"N1"}"#);
        assert_eq!(frame.rssi, -80);
        assert_eq!(frame.snr, 7.25);

        assert!(parse_datagram(b"{}", modem_addr()).is_err());
    }

    #[test]
    fn admission_requires_signal_and_payload() {
        let frame = RadioFrame { payload: b"x".to_vec(), rssi: -120, snr: 0.0, received_at: Duration::ZERO };
        assert!(frame.is_accepted(-120));
        assert!(!frame.is_accepted(-119));

        let empty = RadioFrame { payload: Vec::new(), ..frame };
        assert!(!empty.is_accepted(-130));
    }

    #[tokio::test]
    async fn modem_radio_polls_and_replies_to_last_modem() {
        let mut channels = Channels::new();
        let clock = ManualClock::new();
        clock.advance(Duration::from_secs(3));
        let mut radio = ModemRadio::new(channels.gateway_from_modem,
                                        channels.gateway_to_modem,
                                        Arc::new(clock));

        assert!(radio.poll_frame().is_none());
        assert!(!radio.send_frame(b"ack"));

        channels.modem_to_gateway.send(InboundFrame {
            modem: modem_addr(),
            payload: b"hola".to_vec(),
            rssi: -70,
            snr: 5.0,
        }).await.unwrap();

        let frame = radio.poll_frame().unwrap();
        assert_eq!(frame.payload, b"hola");
        assert_eq!(frame.received_at, Duration::from_secs(3));

        assert!(radio.send_frame(b"ack"));
        let out = channels.modem_from_gateway.recv().await.unwrap();
        assert_eq!(out.modem, modem_addr());
        assert_eq!(out.payload, b"ack");

        assert!(!radio.send_frame(&[b'x'; 300]));
    }
}
