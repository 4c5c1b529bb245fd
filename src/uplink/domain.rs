use async_trait::async_trait;


/// Cliente del backend: `true` si y solo si la respuesta fue 2xx.
#[async_trait]
pub trait UplinkClient: Send + Sync {
    async fn post(&self, path: &str, json: Vec<u8>) -> bool;
}
