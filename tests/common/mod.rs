#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};
use std::sync::{Arc, Mutex};
use async_trait::async_trait;
use lora_gateway_service::clock::domain::{Clock, ManualClock};
use lora_gateway_service::connectivity::domain::LinkProbe;
use lora_gateway_service::connectivity::logic::ConnectivityMonitor;
use lora_gateway_service::context::domain::AppContext;
use lora_gateway_service::gateway::logic::Gateway;
use lora_gateway_service::radio::domain::{RadioFrame, RadioTransport};
use lora_gateway_service::system::domain::System;
use lora_gateway_service::uplink::domain::UplinkClient;


/// Radio simulada: cola de tramas entrantes y registro de tramas transmitidas.
#[derive(Clone, Default)]
pub struct MockRadio {
    pub clock: ManualClock,
    pub inbound: Arc<Mutex<VecDeque<(Vec<u8>, i32, f32)>>>,
    pub sent: Arc<Mutex<Vec<Vec<u8>>>>,
    pub fail_send: Arc<AtomicBool>,
}


impl MockRadio {
    pub fn new(clock: ManualClock) -> Self {
        Self { clock, ..Self::default() }
    }

    pub fn push(&self, payload: &str, rssi: i32, snr: f32) {
        self.inbound.lock().unwrap().push_back((payload.as_bytes().to_vec(), rssi, snr));
    }

    pub fn sent_json(&self) -> Vec<serde_json::Value> {
        self.sent.lock().unwrap()
            .iter()
            .map(|bytes| serde_json::from_slice(bytes).unwrap())
            .collect()
    }
}


impl RadioTransport for MockRadio {
    fn send_frame(&mut self, bytes: &[u8]) -> bool {
        if self.fail_send.load(Ordering::SeqCst) {
            return false;
        }
        self.sent.lock().unwrap().push(bytes.to_vec());
        true
    }

    fn poll_frame(&mut self) -> Option<RadioFrame> {
        let (payload, rssi, snr) = self.inbound.lock().unwrap().pop_front()?;
        Some(RadioFrame { payload, rssi, snr, received_at: self.clock.uptime() })
    }

    fn enter_receive_mode(&mut self) {}
}


/// Backend simulado: guarda cada POST y responde según `accept`.
#[derive(Clone)]
pub struct MockUplink {
    pub posts: Arc<Mutex<Vec<(String, serde_json::Value)>>>,
    pub accept: Arc<AtomicBool>,
}


impl Default for MockUplink {
    fn default() -> Self {
        Self {
            posts: Arc::new(Mutex::new(Vec::new())),
            accept: Arc::new(AtomicBool::new(true)),
        }
    }
}


impl MockUplink {
    pub fn posts_to(&self, path: &str) -> Vec<serde_json::Value> {
        self.posts.lock().unwrap()
            .iter()
            .filter(|(p, _)| p == path)
            .map(|(_, body)| body.clone())
            .collect()
    }
}


#[async_trait]
impl UplinkClient for MockUplink {
    async fn post(&self, path: &str, json: Vec<u8>) -> bool {
        let body = serde_json::from_slice(&json).unwrap();
        self.posts.lock().unwrap().push((path.to_string(), body));
        self.accept.load(Ordering::SeqCst)
    }
}


/// Enlace simulado con resultados configurables.
#[derive(Clone)]
pub struct MockProbe {
    pub connect_ok: Arc<AtomicBool>,
    pub up: Arc<AtomicBool>,
    pub rssi: Arc<AtomicI32>,
}


impl MockProbe {
    pub fn new(reachable: bool) -> Self {
        Self {
            connect_ok: Arc::new(AtomicBool::new(reachable)),
            up: Arc::new(AtomicBool::new(reachable)),
            rssi: Arc::new(AtomicI32::new(-55)),
        }
    }

    pub fn set_reachable(&self, reachable: bool) {
        self.connect_ok.store(reachable, Ordering::SeqCst);
        self.up.store(reachable, Ordering::SeqCst);
    }
}


#[async_trait]
impl LinkProbe for MockProbe {
    async fn connect(&mut self) -> bool {
        self.connect_ok.load(Ordering::SeqCst)
    }

    async fn is_up(&mut self) -> bool {
        self.up.load(Ordering::SeqCst)
    }

    fn rssi(&self) -> i32 {
        self.rssi.load(Ordering::SeqCst)
    }
}


pub struct Harness {
    pub gateway: Gateway<MockRadio, MockUplink, MockProbe>,
    pub ctx: AppContext,
    pub clock: ManualClock,
    pub radio: MockRadio,
    pub uplink: MockUplink,
    pub probe: MockProbe,
}


/// Gateway completo sobre dobles de prueba. `reachable` define si el backend acepta conexiones.
pub fn harness(reachable: bool) -> Harness {
    let clock = ManualClock::new();
    let ctx = AppContext::with_clock(System::default(), Arc::new(clock.clone()));
    let radio = MockRadio::new(clock.clone());
    let uplink = MockUplink::default();
    let probe = MockProbe::new(reachable);

    let gateway = Gateway::new(radio.clone(),
                               uplink.clone(),
                               ConnectivityMonitor::new(probe.clone()),
                               &ctx);

    Harness { gateway, ctx, clock, radio, uplink, probe }
}


pub fn sensor_payload(id: &str, seq: u32) -> String {
    format!(r#"{{"id":"{}","type":"sensor","seq":{},"data":{{"temp":21.5}}}}"#, id, seq)
}
