use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use tracing::{debug, error, warn};
use crate::config::http::TIMEOUT;
use super::domain::UplinkClient;


/// Uplink HTTP hacia el backend con timeout fijo.
#[derive(Debug, Clone)]
pub struct HttpUplink {
    client: Client,
    base_url: String,
}


impl HttpUplink {
    pub fn new(base_url: impl Into<String>) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn url_for(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}


#[async_trait]
impl UplinkClient for HttpUplink {
    async fn post(&self, path: &str, json: Vec<u8>) -> bool {
        let url = self.url_for(path);
        debug!("Debug: POST {}", url);

        match self.client.post(&url)
            .header(CONTENT_TYPE, "application/json")
            .body(json)
            .send()
            .await
        {
            Ok(response) if response.status().is_success() => {
                debug!(status = %response.status(), "Debug: respuesta del backend");
                true
            }
            Ok(response) => {
                warn!("Warning: el backend respondió {} en {}", response.status(), path);
                false
            }
            Err(e) => {
                error!("Error: POST {} falló: {}", url, e);
                false
            }
        }
    }
}
