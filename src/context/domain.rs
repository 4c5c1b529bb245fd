//! Definición del Contexto de Aplicación (Shared State).
//!
//! El `AppContext` actúa como un contenedor de "Inyección de Dependencias" manual,
//! agrupando los recursos que comparten el bucle del gateway y la superficie de
//! monitoreo (Configuración, Reloj, Estado operativo en memoria).


use std::sync::Arc;
use crate::clock::domain::{Clock, MonotonicClock};
use crate::gateway::domain::{new_shared_state, GatewayState, SharedState};
use crate::system::domain::System;


#[derive(Clone)]
pub struct AppContext {
    pub system: Arc<System>,
    pub clock: Arc<dyn Clock>,
    pub state: SharedState,
}


impl AppContext {
    pub fn new(system: System) -> Self {
        Self::with_clock(system, Arc::new(MonotonicClock::new()))
    }

    pub fn with_clock(system: System, clock: Arc<dyn Clock>) -> Self {
        Self {
            system: Arc::new(system),
            clock,
            state: new_shared_state(GatewayState::default()),
        }
    }
}
