//! Fuentes de tiempo del gateway.
//!
//! Todo el pipeline trabaja con tiempo relativo al arranque (`uptime`), como un
//! contador de milisegundos desde el boot. El reloj de pared
//! solo existe si alguien lo sincroniza mediante `POST /api/time`.


use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use chrono::DateTime;
use serde::Serialize;
use thiserror::Error;
use crate::config::time::MIN_VALID_UNIX_TIME;


/// Reloj inyectable: devuelve el tiempo transcurrido desde el arranque.
pub trait Clock: Send + Sync {
    fn uptime(&self) -> Duration;
}


/// Reloj monotónico real del proceso.
#[derive(Debug, Clone)]
pub struct MonotonicClock {
    boot: Instant,
}


impl MonotonicClock {
    pub fn new() -> Self {
        Self { boot: Instant::now() }
    }
}


impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}


impl Clock for MonotonicClock {
    fn uptime(&self) -> Duration {
        self.boot.elapsed()
    }
}


/// Reloj manual para pruebas: avanza solo cuando se le indica.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    millis: Arc<AtomicU64>,
}


impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, by: Duration) {
        self.millis.fetch_add(by.as_millis() as u64, Ordering::SeqCst);
    }

    pub fn set(&self, uptime: Duration) {
        self.millis.store(uptime.as_millis() as u64, Ordering::SeqCst);
    }
}


impl Clock for ManualClock {
    fn uptime(&self) -> Duration {
        Duration::from_millis(self.millis.load(Ordering::SeqCst))
    }
}


#[derive(Debug, Error, PartialEq, Eq)]
pub enum TimeSyncError {
    #[error("timestamp inválido: {0}")]
    InvalidTimestamp(i64),
}


/// Resultado de una sincronización exitosa.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SyncedTime {
    pub success: bool,
    pub synced_time: i64,
    pub boot_time: i64,
}


/// Desfase entre el reloj de pared y el arranque del gateway.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimeSync {
    boot_time: Option<i64>,
}


impl TimeSync {
    /// Fija el reloj de pared a partir de un timestamp Unix (segundos).
    ///
    /// `boot_time = timestamp - uptime_s`. Se rechazan valores que no superen
    /// `MIN_VALID_UNIX_TIME` o que no representen una fecha válida.
    pub fn sync(&mut self, unix_secs: i64, uptime: Duration) -> Result<SyncedTime, TimeSyncError> {
        if unix_secs <= MIN_VALID_UNIX_TIME || DateTime::from_timestamp(unix_secs, 0).is_none() {
            return Err(TimeSyncError::InvalidTimestamp(unix_secs));
        }

        let boot_time = unix_secs - uptime.as_secs() as i64;
        self.boot_time = Some(boot_time);

        Ok(SyncedTime {
            success: true,
            synced_time: unix_secs,
            boot_time,
        })
    }

    pub fn is_synced(&self) -> bool {
        self.boot_time.is_some()
    }

    /// Instante de arranque en segundos Unix, `0` si nunca se sincronizó.
    pub fn boot_time(&self) -> i64 {
        self.boot_time.unwrap_or(0)
    }

    pub fn current_time(&self, uptime: Duration) -> Option<i64> {
        self.boot_time.map(|boot| boot + uptime.as_secs() as i64)
    }

    /// Hora actual en formato RFC 3339, si el reloj está sincronizado.
    pub fn current_time_rfc3339(&self, uptime: Duration) -> Option<String> {
        self.current_time(uptime)
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .map(|dt| dt.to_rfc3339())
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_only_moves_when_told() {
        let clock = ManualClock::new();
        assert_eq!(clock.uptime(), Duration::ZERO);

        clock.advance(Duration::from_millis(1500));
        let shared = clock.clone();
        shared.advance(Duration::from_millis(500));

        assert_eq!(clock.uptime(), Duration::from_secs(2));
    }

    #[test]
    fn sync_derives_boot_time_from_uptime() {
        let mut sync = TimeSync::default();
        assert!(!sync.is_synced());
        assert_eq!(sync.current_time(Duration::from_secs(10)), None);

        let result = sync.sync(1_750_000_000, Duration::from_secs(120)).unwrap();
        assert_eq!(result.boot_time, 1_750_000_000 - 120);
        assert!(sync.is_synced());
        assert_eq!(sync.current_time(Duration::from_secs(130)), Some(1_750_000_010));
        assert_eq!(
            sync.current_time_rfc3339(Duration::from_secs(120)).as_deref(),
            Some("2025-06-15T15:06:40+00:00")
        );
    }

    #[test]
    fn sync_rejects_old_timestamps() {
        let mut sync = TimeSync::default();
        assert_eq!(
            sync.sync(1_600_000_000, Duration::ZERO),
            Err(TimeSyncError::InvalidTimestamp(1_600_000_000))
        );
        assert_eq!(
            sync.sync(MIN_VALID_UNIX_TIME, Duration::ZERO),
            Err(TimeSyncError::InvalidTimestamp(MIN_VALID_UNIX_TIME))
        );
        assert!(!sync.is_synced());
    }
}
