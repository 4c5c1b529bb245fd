//! Reportes periódicos de estado del gateway.
//!
//! Latido del gateway: cada `STATUS_REPORT_INTERVAL` se construye un
//! `StatusEnvelope` con los contadores del pipeline y se envía por el mismo uplink
//! que los paquetes, solo si hay conexión. El resultado no afecta a los contadores.


use std::time::Duration;
use tracing::{info, instrument, warn};
use crate::config::gateway::STATUS_REPORT_INTERVAL;
use crate::config::http::STATUS_ENDPOINT;
use crate::protocol::logic::Protocol;
use crate::uplink::domain::UplinkClient;
use super::domain::{StatusOutcome, StatusSnapshot};


#[derive(Debug, Clone)]
pub struct StatusReporter {
    interval: Duration,
    last_report: Duration,
}


impl Default for StatusReporter {
    fn default() -> Self {
        Self::new(STATUS_REPORT_INTERVAL)
    }
}


impl StatusReporter {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_report: Duration::ZERO,
        }
    }

    pub fn is_due(&self, now: Duration) -> bool {
        now.saturating_sub(self.last_report) > self.interval
    }

    /// Registra el estado y lo envía al backend si `connected`.
    ///
    /// El próximo disparo se programa a partir de `snapshot.uptime`, haya o no envío.
    #[instrument(name = "status_report", skip_all, fields(uptime_s = snapshot.uptime.as_secs()))]
    pub async fn report<U>(&mut self,
                           snapshot: StatusSnapshot,
                           connected: bool,
                           protocol: &Protocol,
                           uplink: &U) -> StatusOutcome
    where
        U: UplinkClient + ?Sized,
    {
        self.last_report = snapshot.uptime;

        info!(
            packets_rx = snapshot.packets_rx,
            packets_fwd = snapshot.packets_fwd,
            packets_err = snapshot.packets_err,
            connected,
            wifi_rssi = snapshot.uplink_rssi,
            free_heap = snapshot.free_heap,
            "Info: estado del gateway"
        );

        if !connected {
            return StatusOutcome::Skipped;
        }

        let payload = protocol.encode_status(snapshot.uplink_rssi,
                                             snapshot.packets_rx,
                                             snapshot.packets_fwd,
                                             snapshot.uptime,
                                             snapshot.free_heap);

        if uplink.post(STATUS_ENDPOINT, payload).await {
            StatusOutcome::Sent
        } else {
            warn!("Warning: no se pudo enviar el reporte de estado");
            StatusOutcome::Failed
        }
    }
}


/// Memoria disponible del host en bytes (`MemAvailable`), `0` si no se puede leer.
pub fn available_memory() -> u64 {
    std::fs::read_to_string("/proc/meminfo")
        .ok()
        .and_then(|contents| parse_mem_available(&contents))
        .unwrap_or(0)
}


pub fn parse_mem_available(contents: &str) -> Option<u64> {
    contents.lines()
        .find_map(|line| line.strip_prefix("MemAvailable:"))
        .and_then(|rest| rest.split_whitespace().next())
        .and_then(|kb| kb.parse::<u64>().ok())
        .map(|kb| kb * 1024)
}


#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use async_trait::async_trait;

    #[derive(Default)]
    struct RecordingUplink {
        posts: Mutex<Vec<(String, Vec<u8>)>>,
        accept: bool,
    }

    #[async_trait]
    impl UplinkClient for RecordingUplink {
        async fn post(&self, path: &str, json: Vec<u8>) -> bool {
            self.posts.lock().unwrap().push((path.to_string(), json));
            self.accept
        }
    }

    fn snapshot(uptime_s: u64) -> StatusSnapshot {
        StatusSnapshot {
            uptime: Duration::from_secs(uptime_s),
            uplink_rssi: -58,
            packets_rx: 4,
            packets_fwd: 3,
            packets_err: 2,
            free_heap: 1024,
        }
    }

    #[test]
    fn due_only_after_the_interval() {
        let mut reporter = StatusReporter::default();
        assert!(!reporter.is_due(Duration::from_secs(60)));
        assert!(reporter.is_due(Duration::from_millis(60_001)));

        reporter.last_report = Duration::from_secs(61);
        assert!(!reporter.is_due(Duration::from_secs(100)));
        assert!(reporter.is_due(Duration::from_secs(122)));
    }

    #[tokio::test]
    async fn posts_status_when_connected() {
        let uplink = RecordingUplink { accept: true, ..Default::default() };
        let mut reporter = StatusReporter::default();
        let protocol = Protocol::new("GW001");

        let outcome = reporter.report(snapshot(61), true, &protocol, &uplink).await;
        assert_eq!(outcome, StatusOutcome::Sent);

        let posts = uplink.posts.lock().unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].0, STATUS_ENDPOINT);
        let body: serde_json::Value = serde_json::from_slice(&posts[0].1).unwrap();
        assert_eq!(body["type"], "status");
        assert_eq!(body["stats"]["packets_rx"], 4);
        assert_eq!(body["stats"]["wifi_rssi"], -58);
        assert!(!reporter.is_due(Duration::from_secs(100)));
    }

    #[tokio::test]
    async fn skips_posting_while_disconnected() {
        let uplink = RecordingUplink::default();
        let mut reporter = StatusReporter::default();

        let outcome = reporter.report(snapshot(61), false, &Protocol::new("GW001"), &uplink).await;
        assert_eq!(outcome, StatusOutcome::Skipped);
        assert!(uplink.posts.lock().unwrap().is_empty());
        assert!(!reporter.is_due(Duration::from_secs(121)));
    }

    #[tokio::test]
    async fn reports_failed_post() {
        let uplink = RecordingUplink::default();
        let mut reporter = StatusReporter::default();

        let outcome = reporter.report(snapshot(61), true, &Protocol::new("GW001"), &uplink).await;
        assert_eq!(outcome, StatusOutcome::Failed);
    }

    #[test]
    fn parses_meminfo() {
        let contents = "MemTotal:       16314388 kB\nMemFree:         1234567 kB\nMemAvailable:    8000000 kB\n";
        assert_eq!(parse_mem_available(contents), Some(8_000_000 * 1024));
        assert_eq!(parse_mem_available("MemTotal: 1 kB\n"), None);
    }
}
