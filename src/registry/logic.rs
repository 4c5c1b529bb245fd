//! Registro de dispositivos activos.
//!
//! Arena de capacidad fija: cada slot se direcciona por índice y se reutiliza cuando
//! su dispositivo deja de estar activo. La expiración es perezosa: solo ocurre al
//! leer (`list_active`, `active_count`), nunca con un temporizador.


use std::time::Duration;
use tracing::{debug, info, warn};
use crate::config::gateway::{DEVICE_TIMEOUT, MAX_DEVICES};
use super::domain::{DeviceEntry, Sighting};


#[derive(Debug, Clone)]
pub struct DeviceRegistry {
    slots: Vec<Option<DeviceEntry>>,
    live: usize,
    liveness_window: Duration,
}


impl Default for DeviceRegistry {
    fn default() -> Self {
        Self::new(MAX_DEVICES, DEVICE_TIMEOUT)
    }
}


impl DeviceRegistry {
    pub fn new(capacity: usize, liveness_window: Duration) -> Self {
        Self {
            slots: vec![None; capacity],
            live: 0,
            liveness_window,
        }
    }

    /// Registra un paquete válido de `id`.
    ///
    /// Si el nodo está activo actualiza señal, contador y último contacto; si no,
    /// ocupa el primer slot inactivo. Con el registro lleno el avistamiento se descarta.
    pub fn record_sighting(&mut self, id: &str, device_type: &str, rssi: i32, snr: f32, now: Duration) -> Sighting {
        if let Some(entry) = self.find_active_mut(id) {
            entry.rssi = rssi;
            entry.snr = snr;
            entry.packet_count = entry.packet_count.saturating_add(1);
            entry.last_seen = now;
            return Sighting::Updated;
        }

        let Some(index) = self.slots.iter().position(|slot| !is_active(slot)) else {
            warn!(node = %id, "Warning: registro de dispositivos lleno, avistamiento descartado");
            return Sighting::Dropped;
        };

        self.slots[index] = Some(DeviceEntry {
            id: id.to_string(),
            device_type: device_type.to_string(),
            rssi,
            snr,
            packet_count: 1,
            last_seen: now,
            active: true,
        });
        self.live += 1;

        info!(node = %id, slot = index, "Info: nuevo dispositivo registrado");
        Sighting::Registered(index)
    }

    /// Expira los dispositivos silenciosos y devuelve los activos en orden de slot.
    pub fn list_active(&mut self, now: Duration) -> Vec<DeviceEntry> {
        self.evict_stale(now);
        self.slots.iter()
            .flatten()
            .filter(|entry| entry.active)
            .cloned()
            .collect()
    }

    pub fn active_count(&mut self, now: Duration) -> usize {
        self.evict_stale(now);
        self.live
    }

    fn evict_stale(&mut self, now: Duration) {
        for entry in self.slots.iter_mut().flatten() {
            if entry.active && now.saturating_sub(entry.last_seen) > self.liveness_window {
                debug!(node = %entry.id, "Debug: dispositivo marcado como inactivo");
                entry.active = false;
                self.live -= 1;
            }
        }
    }

    fn find_active_mut(&mut self, id: &str) -> Option<&mut DeviceEntry> {
        self.slots.iter_mut()
            .flatten()
            .find(|entry| entry.active && entry.id == id)
    }
}


fn is_active(slot: &Option<DeviceEntry>) -> bool {
    slot.as_ref().is_some_and(|entry| entry.active)
}
