use tokio::sync::mpsc;
use crate::config::radio::CHANNEL_SIZE;
use crate::radio::domain::{InboundFrame, OutboundFrame};


/// Canales entre las tareas del puente de radio y el bucle del gateway.
pub struct Channels {
    pub modem_to_gateway: mpsc::Sender<InboundFrame>,
    pub gateway_from_modem: mpsc::Receiver<InboundFrame>,

    pub gateway_to_modem: mpsc::Sender<OutboundFrame>,
    pub modem_from_gateway: mpsc::Receiver<OutboundFrame>,
}


impl Channels {
    pub fn new() -> Channels {
        let (m_to_g, g_from_m) = mpsc::channel::<InboundFrame>(CHANNEL_SIZE);
        let (g_to_m, m_from_g) = mpsc::channel::<OutboundFrame>(CHANNEL_SIZE);

        Self {
            modem_to_gateway: m_to_g,
            gateway_from_modem: g_from_m,
            gateway_to_modem: g_to_m,
            modem_from_gateway: m_from_g,
        }
    }
}


impl Default for Channels {
    fn default() -> Self {
        Self::new()
    }
}
