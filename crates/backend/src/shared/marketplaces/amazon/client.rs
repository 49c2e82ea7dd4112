use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use contracts::domain::a001_amazon_sp_settings::aggregate::AmazonSpSettings;
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;

use super::document::decode_report_document;
use super::lwa::refresh_access_token;
use super::models::{
    CreateReportResponse, CreateReportSpecification, OrderItemsEnvelope, OrderItemsPage,
    OrdersEnvelope, OrdersPage, OrdersQuery, Report, ReportDocument,
};
use super::{OrdersApi, ReportsApi, SpApiError};
use crate::shared::config::SpApiConfig;
use crate::shared::marketplaces::TestConnectionResult;

const REPORTS_PATH: &str = "/reports/2021-06-30/reports";
const DOCUMENTS_PATH: &str = "/reports/2021-06-30/documents";
const ORDERS_PATH: &str = "/orders/v0/orders";

/// Запас до истечения access token, после которого он обновляется заранее
const TOKEN_REFRESH_MARGIN_SECS: i64 = 60;

#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    expires_at: DateTime<Utc>,
}

/// Клиент SP-API одного продавца.
///
/// Access token получается по refresh token и кешируется до истечения.
pub struct SpApiClient {
    http: reqwest::Client,
    endpoint: String,
    token_url: String,
    settings_code: String,
    client_id: String,
    client_secret: String,
    refresh_token: String,
    token: Mutex<Option<CachedToken>>,
}

impl SpApiClient {
    /// Клиент по настройкам продавца. Без refresh token работать нельзя.
    pub fn from_settings(
        http: reqwest::Client,
        config: &SpApiConfig,
        settings: &AmazonSpSettings,
    ) -> Result<Self, SpApiError> {
        let refresh_token = settings
            .refresh_token
            .clone()
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| SpApiError::NotAuthorized(settings.base.code.clone()))?;

        let endpoint = settings
            .sp_api_endpoint
            .clone()
            .filter(|e| !e.trim().is_empty())
            .unwrap_or_else(|| config.endpoint.clone());
        let token_url = settings
            .oauth_token_url
            .clone()
            .filter(|u| !u.trim().is_empty())
            .unwrap_or_else(|| config.token_url.clone());

        Ok(Self {
            http,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            token_url,
            settings_code: settings.base.code.clone(),
            client_id: settings.client_id.clone(),
            client_secret: settings.client_secret.clone(),
            refresh_token,
            token: Mutex::new(None),
        })
    }

    async fn access_token(&self) -> Result<String, SpApiError> {
        let mut guard = self.token.lock().await;
        let now = Utc::now();
        if let Some(cached) = guard.as_ref() {
            if cached.expires_at > now {
                return Ok(cached.access_token.clone());
            }
        }

        tracing::debug!("Refreshing SP-API access token for '{}'", self.settings_code);
        let response = refresh_access_token(
            &self.http,
            &self.token_url,
            &self.client_id,
            &self.client_secret,
            &self.refresh_token,
        )
        .await?;

        let lifetime = (response.expires_in - TOKEN_REFRESH_MARGIN_SECS).max(0);
        let cached = CachedToken {
            access_token: response.access_token,
            expires_at: now + Duration::seconds(lifetime),
        };
        let token = cached.access_token.clone();
        *guard = Some(cached);
        Ok(token)
    }

    /// Проверить, что refresh token принимается LWA
    pub async fn test_connection(&self) -> TestConnectionResult {
        match self.access_token().await {
            Ok(_) => TestConnectionResult {
                success: true,
                message: "Access token received".into(),
                details: Some(format!("Endpoint: {}", self.endpoint)),
            },
            Err(e) => TestConnectionResult {
                success: false,
                message: "LWA rejected the stored credentials".into(),
                details: Some(e.to_string()),
            },
        }
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, SpApiError> {
        let token = self.access_token().await?;
        let response = request
            .header("x-amz-access-token", token)
            .header("Accept", "application/json")
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            tracing::error!("SP-API request failed with status {}: {}", status, body);
            return Err(SpApiError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(serde_json::from_str(&body)?)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.endpoint, path)
    }
}

#[async_trait]
impl ReportsApi for SpApiClient {
    async fn create_report(&self, spec: &CreateReportSpecification) -> Result<String, SpApiError> {
        let request = self.http.post(self.url(REPORTS_PATH)).json(spec);
        let response: CreateReportResponse = self.send_json(request).await?;
        tracing::info!(
            "Requested report {} for '{}': reportId={}",
            spec.report_type,
            self.settings_code,
            response.report_id
        );
        Ok(response.report_id)
    }

    async fn get_report(&self, report_id: &str) -> Result<Report, SpApiError> {
        let path = format!("{}/{}", REPORTS_PATH, urlencoding::encode(report_id));
        self.send_json(self.http.get(self.url(&path))).await
    }

    async fn download_report_document(&self, document_id: &str) -> Result<Vec<u8>, SpApiError> {
        let path = format!("{}/{}", DOCUMENTS_PATH, urlencoding::encode(document_id));
        let document: ReportDocument = self.send_json(self.http.get(self.url(&path))).await?;

        // Ссылка на документ pre-signed, токен не нужен
        let response = self.http.get(&document.url).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SpApiError::Status {
                status: status.as_u16(),
                body,
            });
        }
        let raw = response.bytes().await?.to_vec();
        tracing::info!(
            "Downloaded report document {} ({} bytes)",
            document.report_document_id,
            raw.len()
        );
        Ok(decode_report_document(raw, &document)?)
    }
}

#[async_trait]
impl OrdersApi for SpApiClient {
    async fn get_orders(
        &self,
        query: &OrdersQuery,
        next_token: Option<&str>,
    ) -> Result<OrdersPage, SpApiError> {
        let mut params: Vec<(&str, String)> = vec![
            ("MarketplaceIds", query.marketplace_ids.join(",")),
            ("CreatedAfter", query.created_after.clone()),
            ("MaxResultsPerPage", query.max_results_per_page.to_string()),
        ];
        if !query.order_statuses.is_empty() {
            params.push(("OrderStatuses", query.order_statuses.join(",")));
        }
        if !query.fulfillment_channels.is_empty() {
            params.push(("FulfillmentChannels", query.fulfillment_channels.join(",")));
        }
        if let Some(token) = next_token {
            params.push(("NextToken", token.to_string()));
        }

        let request = self.http.get(self.url(ORDERS_PATH)).query(&params);
        let envelope: OrdersEnvelope = self.send_json(request).await?;
        Ok(envelope.payload)
    }

    async fn get_order_items(
        &self,
        amazon_order_id: &str,
        next_token: Option<&str>,
    ) -> Result<OrderItemsPage, SpApiError> {
        let path = format!(
            "{}/{}/orderItems",
            ORDERS_PATH,
            urlencoding::encode(amazon_order_id)
        );
        let mut request = self.http.get(self.url(&path));
        if let Some(token) = next_token {
            request = request.query(&[("NextToken", token)]);
        }
        let envelope: OrderItemsEnvelope = self.send_json(request).await?;
        Ok(envelope.payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(refresh_token: Option<&str>) -> AmazonSpSettings {
        let mut s = AmazonSpSettings::new_for_insert(
            "IN-MAIN".into(),
            "India".into(),
            "Test Co".into(),
            "amzn1.application-oa2-client.x".into(),
            "secret".into(),
            "amzn1.sp.solution.x".into(),
            "A21TJRUUN4KGV".into(),
        );
        s.refresh_token = refresh_token.map(str::to_string);
        s
    }

    #[test]
    fn test_requires_refresh_token() {
        let result = SpApiClient::from_settings(
            reqwest::Client::new(),
            &SpApiConfig::default(),
            &settings(None),
        );
        assert!(matches!(result, Err(SpApiError::NotAuthorized(code)) if code == "IN-MAIN"));
    }

    #[test]
    fn test_endpoint_override() {
        let mut s = settings(Some("Atzr|x"));
        s.sp_api_endpoint = Some("https://sandbox.sellingpartnerapi-eu.amazon.com/".into());
        let client =
            SpApiClient::from_settings(reqwest::Client::new(), &SpApiConfig::default(), &s).unwrap();
        assert_eq!(
            client.url(REPORTS_PATH),
            "https://sandbox.sellingpartnerapi-eu.amazon.com/reports/2021-06-30/reports"
        );
    }
}
