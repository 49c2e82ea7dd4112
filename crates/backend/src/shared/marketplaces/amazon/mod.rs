//! Тонкий клиент Amazon Selling Partner API.
//!
//! Используются только Reports API (создание/статус/документ), Orders API
//! (заказы и позиции) и LWA token endpoint.

pub mod client;
pub mod document;
pub mod lwa;
pub mod models;

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use contracts::domain::a001_amazon_sp_settings::aggregate::AmazonSpSettings;

use crate::shared::config::SpApiConfig;
pub use client::SpApiClient;
pub use document::DocumentError;
use models::{CreateReportSpecification, OrderItemsPage, OrdersPage, OrdersQuery, Report};

#[derive(Debug, thiserror::Error)]
pub enum SpApiError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("SP-API returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to decode SP-API response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("LWA token request failed: {0}")]
    Auth(String),

    #[error("Settings '{0}' have no refresh token, authorize the application first")]
    NotAuthorized(String),

    #[error("Report document error: {0}")]
    Document(#[from] DocumentError),
}

/// Reports API 2021-06-30
#[async_trait]
pub trait ReportsApi: Send + Sync {
    /// Запросить отчёт, вернуть reportId
    async fn create_report(&self, spec: &CreateReportSpecification) -> Result<String, SpApiError>;

    async fn get_report(&self, report_id: &str) -> Result<Report, SpApiError>;

    /// Скачать документ отчёта и вернуть содержимое уже расшифрованным,
    /// распакованным и без zip-обёртки
    async fn download_report_document(&self, document_id: &str) -> Result<Vec<u8>, SpApiError>;
}

/// Orders API v0
#[async_trait]
pub trait OrdersApi: Send + Sync {
    async fn get_orders(
        &self,
        query: &OrdersQuery,
        next_token: Option<&str>,
    ) -> Result<OrdersPage, SpApiError>;

    async fn get_order_items(
        &self,
        amazon_order_id: &str,
        next_token: Option<&str>,
    ) -> Result<OrderItemsPage, SpApiError>;
}

/// Клиенты SP-API для настроек продавца
pub trait SpApiFactory: Send + Sync {
    fn reports(&self, settings: &AmazonSpSettings) -> Result<Arc<dyn ReportsApi>, SpApiError>;

    fn orders(&self, settings: &AmazonSpSettings) -> Result<Arc<dyn OrdersApi>, SpApiError>;
}

/// Фабрика `SpApiClient` с общим HTTP-клиентом.
///
/// Клиент продавца переиспользуется, пока не сменились его учётные данные
/// (client id/secret, refresh token, endpoint'ы), вместе с ним живёт кеш
/// access token.
pub struct ClientFactory {
    http: reqwest::Client,
    config: SpApiConfig,
    clients: Mutex<HashMap<String, Arc<SpApiClient>>>,
}

impl ClientFactory {
    pub fn new(config: &SpApiConfig) -> Result<Self, SpApiError> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.http_timeout_secs))
            .build()?;
        Ok(Self {
            http,
            config: config.clone(),
            clients: Mutex::new(HashMap::new()),
        })
    }

    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    fn client(&self, settings: &AmazonSpSettings) -> Result<Arc<SpApiClient>, SpApiError> {
        let key = format!(
            "{}|{}",
            settings.base.code,
            credentials_fingerprint(settings)
        );
        let mut clients = self
            .clients
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(client) = clients.get(&key) {
            return Ok(client.clone());
        }
        let client = Arc::new(SpApiClient::from_settings(
            self.http.clone(),
            &self.config,
            settings,
        )?);
        clients.retain(|k, _| !k.starts_with(&format!("{}|", settings.base.code)));
        clients.insert(key, client.clone());
        Ok(client)
    }
}

fn credentials_fingerprint(settings: &AmazonSpSettings) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    for part in [
        settings.client_id.as_str(),
        settings.client_secret.as_str(),
        settings.refresh_token.as_deref().unwrap_or_default(),
        settings.oauth_token_url.as_deref().unwrap_or_default(),
        settings.sp_api_endpoint.as_deref().unwrap_or_default(),
    ] {
        hasher.update(part.as_bytes());
        hasher.update([0u8]);
    }
    format!("{:x}", hasher.finalize())
}

impl SpApiFactory for ClientFactory {
    fn reports(&self, settings: &AmazonSpSettings) -> Result<Arc<dyn ReportsApi>, SpApiError> {
        let client: Arc<dyn ReportsApi> = self.client(settings)?;
        Ok(client)
    }

    fn orders(&self, settings: &AmazonSpSettings) -> Result<Arc<dyn OrdersApi>, SpApiError> {
        let client: Arc<dyn OrdersApi> = self.client(settings)?;
        Ok(client)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> AmazonSpSettings {
        let mut s = AmazonSpSettings::new_for_insert(
            "IN-MAIN".into(),
            "India".into(),
            "Test Co".into(),
            "client".into(),
            "secret".into(),
            "app".into(),
            "A21TJRUUN4KGV".into(),
        );
        s.refresh_token = Some("Atzr|token".into());
        s
    }

    #[test]
    fn test_client_reused_for_same_credentials() {
        let factory = ClientFactory::new(&SpApiConfig::default()).unwrap();
        let first = factory.client(&settings()).unwrap();
        let second = factory.client(&settings()).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_changed_secret_gives_new_client() {
        let factory = ClientFactory::new(&SpApiConfig::default()).unwrap();
        let first = factory.client(&settings()).unwrap();

        let mut rotated = settings();
        rotated.client_secret = "rotated".into();
        let second = factory.client(&rotated).unwrap();
        assert!(!Arc::ptr_eq(&first, &second));

        let mut moved = rotated.clone();
        moved.sp_api_endpoint = Some("https://sellingpartnerapi-fe.amazon.com".into());
        let third = factory.client(&moved).unwrap();
        assert!(!Arc::ptr_eq(&second, &third));

        assert_eq!(factory.clients.lock().unwrap().len(), 1);
    }
}
