//! Máquina de estados de conectividad del uplink.
//!
//! ```text
//! Disconnected --request--> Connecting --success--> Connected
//!                           Connecting --timeout--> Error
//! Connected --linkLost--> Disconnected
//! Error --retryElapsed--> Connecting
//! ```
//!
//! Política de reintento: intervalo fijo desde el intento anterior, sin backoff
//! exponencial. El primer intento es inmediato.


use std::path::PathBuf;
use std::time::Duration;
use async_trait::async_trait;
use tokio::net::TcpStream;
use tokio::time::{timeout, Instant};
use tracing::{debug, error, info, warn};
use crate::config::wifi::{CONNECT_TIMEOUT, LINK_CHECK_INTERVAL, RECONNECT_INTERVAL, WIRELESS_STATS_PATH};
use super::domain::{ConnectivityState, LinkProbe};


pub struct ConnectivityMonitor<P> {
    probe: P,
    state: ConnectivityState,
    last_attempt: Option<Duration>,
    retry_interval: Duration,
    connect_timeout: Duration,
}


impl<P: LinkProbe> ConnectivityMonitor<P> {
    pub fn new(probe: P) -> Self {
        Self::with_timing(probe, RECONNECT_INTERVAL, CONNECT_TIMEOUT)
    }

    pub fn with_timing(probe: P, retry_interval: Duration, connect_timeout: Duration) -> Self {
        Self {
            probe,
            state: ConnectivityState::Disconnected,
            last_attempt: None,
            retry_interval,
            connect_timeout,
        }
    }

    pub fn state(&self) -> ConnectivityState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state == ConnectivityState::Connected
    }

    /// Señal del uplink; `0` mientras no haya conexión.
    pub fn rssi(&self) -> i32 {
        if self.is_connected() {
            self.probe.rssi()
        } else {
            0
        }
    }

    pub fn probe(&self) -> &P {
        &self.probe
    }

    /// Avanza la máquina de estados y devuelve el estado resultante.
    ///
    /// `now` es el tiempo desde el arranque según el reloj del gateway.
    pub async fn poll(&mut self, now: Duration) -> ConnectivityState {
        if self.is_connected() {
            if !self.probe.is_up().await {
                warn!("Warning: conexión perdida con el backend");
                self.transition(ConnectivityState::Disconnected);
            }
        } else if self.retry_due(now) {
            self.last_attempt = Some(now);
            self.transition(ConnectivityState::Connecting);
            self.attempt().await;
        }
        self.state
    }

    fn retry_due(&self, now: Duration) -> bool {
        match self.last_attempt {
            None => true,
            Some(last) => now.saturating_sub(last) >= self.retry_interval,
        }
    }

    async fn attempt(&mut self) {
        match timeout(self.connect_timeout, self.probe.connect()).await {
            Ok(true) => {
                info!(rssi = self.probe.rssi(), "Info: uplink conectado");
                self.transition(ConnectivityState::Connected);
            }
            Ok(false) => {
                error!("Error: no se pudo conectar con el backend");
                self.transition(ConnectivityState::Error);
            }
            Err(_) => {
                error!("Error: timeout de conexión ({:?})", self.connect_timeout);
                self.transition(ConnectivityState::Error);
            }
        }
    }

    fn transition(&mut self, next: ConnectivityState) {
        if self.state != next {
            debug!(from = ?self.state, to = ?next, "Debug: cambio de estado de conectividad");
            self.state = next;
        }
    }
}


/// Sonda real: conexión TCP al backend y señal WiFi leída de `/proc/net/wireless`.
///
/// Enlace y señal se refrescan juntos, como mucho una vez por `LINK_CHECK_INTERVAL`;
/// `rssi` siempre devuelve la última lectura.
#[derive(Debug)]
pub struct TcpLinkProbe {
    addr: String,
    wireless_interface: Option<String>,
    wireless_source: PathBuf,
    up: bool,
    signal: i32,
    last_check: Option<Instant>,
}


impl TcpLinkProbe {
    pub fn new(addr: impl Into<String>, wireless_interface: Option<String>) -> Self {
        Self {
            addr: addr.into(),
            wireless_interface,
            wireless_source: PathBuf::from(WIRELESS_STATS_PATH),
            up: false,
            signal: 0,
            last_check: None,
        }
    }

    pub fn with_wireless_source(mut self, path: impl Into<PathBuf>) -> Self {
        self.wireless_source = path.into();
        self
    }

    async fn check(&mut self) -> bool {
        self.last_check = Some(Instant::now());
        self.up = match TcpStream::connect(&self.addr).await {
            Ok(_) => true,
            Err(e) => {
                debug!("Debug: backend {} inalcanzable: {}", self.addr, e);
                false
            }
        };
        self.signal = self.read_signal().await;
        self.up
    }

    async fn read_signal(&self) -> i32 {
        let Some(iface) = self.wireless_interface.as_deref() else {
            return 0;
        };
        tokio::fs::read_to_string(&self.wireless_source).await
            .ok()
            .and_then(|contents| parse_wireless_level(&contents, iface))
            .unwrap_or(0)
    }
}


#[async_trait]
impl LinkProbe for TcpLinkProbe {
    async fn connect(&mut self) -> bool {
        info!("Info: conectando a {}", self.addr);
        self.check().await
    }

    async fn is_up(&mut self) -> bool {
        match self.last_check {
            Some(at) if at.elapsed() < LINK_CHECK_INTERVAL => self.up,
            _ => match timeout(CONNECT_TIMEOUT, self.check()).await {
                Ok(up) => up,
                Err(_) => {
                    self.up = false;
                    false
                }
            },
        }
    }

    fn rssi(&self) -> i32 {
        self.signal
    }
}


/// Extrae el nivel de señal (dBm) de una interfaz en el formato de `/proc/net/wireless`.
pub fn parse_wireless_level(contents: &str, iface: &str) -> Option<i32> {
    contents.lines()
        .map(str::trim)
        .find_map(|line| line.strip_prefix(iface)?.strip_prefix(':'))
        .and_then(|rest| rest.split_whitespace().nth(2))
        .and_then(|level| level.trim_end_matches('.').parse::<f32>().ok())
        .map(|level| level as i32)
}


#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    /// Sonda programable: cada `connect` consume la siguiente respuesta.
    struct ScriptedProbe {
        answers: VecDeque<bool>,
        up: bool,
        connect_calls: usize,
        hang: bool,
    }

    impl ScriptedProbe {
        fn new(answers: &[bool]) -> Self {
            Self {
                answers: answers.iter().copied().collect(),
                up: true,
                connect_calls: 0,
                hang: false,
            }
        }
    }

    #[async_trait]
    impl LinkProbe for ScriptedProbe {
        async fn connect(&mut self) -> bool {
            self.connect_calls += 1;
            if self.hang {
                tokio::time::sleep(Duration::from_secs(3600)).await;
            }
            self.answers.pop_front().unwrap_or(false)
        }

        async fn is_up(&mut self) -> bool {
            self.up
        }

        fn rssi(&self) -> i32 {
            -61
        }
    }

    fn secs(s: u64) -> Duration {
        Duration::from_secs(s)
    }

    #[tokio::test]
    async fn first_poll_connects_immediately() {
        let mut monitor = ConnectivityMonitor::new(ScriptedProbe::new(&[true]));
        assert_eq!(monitor.state(), ConnectivityState::Disconnected);
        assert_eq!(monitor.rssi(), 0);

        assert_eq!(monitor.poll(secs(0)).await, ConnectivityState::Connected);
        assert_eq!(monitor.rssi(), -61);
    }

    #[tokio::test]
    async fn failed_attempt_waits_for_cooldown() {
        let mut monitor = ConnectivityMonitor::new(ScriptedProbe::new(&[false, true]));

        assert_eq!(monitor.poll(secs(0)).await, ConnectivityState::Error);
        assert_eq!(monitor.poll(secs(3)).await, ConnectivityState::Error);
        assert_eq!(monitor.probe().connect_calls, 1);

        assert_eq!(monitor.poll(secs(5)).await, ConnectivityState::Connected);
        assert_eq!(monitor.probe().connect_calls, 2);
    }

    #[tokio::test]
    async fn link_loss_goes_back_to_disconnected_then_retries() {
        let mut monitor = ConnectivityMonitor::new(ScriptedProbe::new(&[true, true]));
        monitor.poll(secs(0)).await;

        monitor.probe.up = false;
        assert_eq!(monitor.poll(secs(2)).await, ConnectivityState::Disconnected);
        assert_eq!(monitor.rssi(), 0);

        // El intento anterior fue en t=0; el enfriamiento ya pasó en t=6.
        monitor.probe.up = true;
        assert_eq!(monitor.poll(secs(6)).await, ConnectivityState::Connected);
        assert_eq!(monitor.probe().connect_calls, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn hanging_connect_times_out_into_error() {
        let mut probe = ScriptedProbe::new(&[true]);
        probe.hang = true;
        let mut monitor = ConnectivityMonitor::with_timing(probe, secs(5), secs(10));

        assert_eq!(monitor.poll(secs(0)).await, ConnectivityState::Error);
    }

    fn wireless_stats(level: i32) -> String {
        format!("Inter-| sta-|   Quality        |   Discarded packets               | Missed | WE\n \
                 face | tus | link level noise |  nwid  crypt   frag  retry   misc | beacon | 22\n \
                 wlan0: 0000   54.  {}.  -256        0      0      0      0      0        0\n", level)
    }

    #[tokio::test]
    async fn tcp_probe_caches_signal_between_checks() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let stats = std::env::temp_dir().join(format!("lora_gw_wireless_{}", std::process::id()));
        std::fs::write(&stats, wireless_stats(-56)).unwrap();

        let mut probe = TcpLinkProbe::new(addr.to_string(), Some("wlan0".to_string()))
            .with_wireless_source(&stats);
        assert_eq!(probe.rssi(), 0);

        assert!(probe.connect().await);
        assert_eq!(probe.rssi(), -56);

        std::fs::write(&stats, wireless_stats(-70)).unwrap();
        assert!(probe.is_up().await);
        assert_eq!(probe.rssi(), -56);

        std::fs::remove_file(&stats).ok();
    }

    #[tokio::test]
    async fn tcp_probe_without_interface_reports_no_signal() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let mut probe = TcpLinkProbe::new(listener.local_addr().unwrap().to_string(), None);

        assert!(probe.connect().await);
        assert_eq!(probe.rssi(), 0);
    }

    #[test]
    fn parses_proc_net_wireless() {
        let contents = "Inter-| sta-|   Quality        |   Discarded packets               | Missed | WE\n \
                        face | tus | link level noise |  nwid  crypt   frag  retry   misc | beacon | 22\n \
                        wlan0: 0000   54.  -56.  -256        0      0      0      0      0        0\n";

        assert_eq!(parse_wireless_level(contents, "wlan0"), Some(-56));
        assert_eq!(parse_wireless_level(contents, "wlan1"), None);
    }
}
