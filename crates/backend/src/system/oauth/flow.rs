use contracts::domain::a001_amazon_sp_settings::aggregate::AmazonSpSettings;
use sea_orm::DatabaseConnection;
use serde::Deserialize;

use super::state::OAuthStateStore;
use crate::domain::a001_amazon_sp_settings;
use crate::shared::config::SpApiConfig;
use crate::shared::logger;
use crate::shared::marketplaces::amazon::lwa::exchange_authorization_code;
use crate::shared::marketplaces::amazon::SpApiError;

const LOG_SOURCE: &str = "oauth";

#[derive(Debug, thiserror::Error)]
pub enum OAuthError {
    #[error("Authorization code is missing in the redirect")]
    MissingCode,

    #[error("State is missing in the redirect")]
    MissingState,

    #[error("Unknown or expired OAuth state")]
    InvalidState,

    #[error("Amazon SP settings '{0}' not found")]
    SettingsNotFound(String),

    #[error("LWA response contains no refresh token")]
    NoRefreshToken,

    #[error(transparent)]
    Api(#[from] SpApiError),

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

/// Параметры редиректа Seller Central
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OAuthCallback {
    pub code: Option<String>,
    pub spapi_oauth_code: Option<String>,
    pub state: Option<String>,
    pub selling_partner_id: Option<String>,
}

impl OAuthCallback {
    pub fn authorization_code(&self) -> Option<&str> {
        self.spapi_oauth_code
            .as_deref()
            .or(self.code.as_deref())
            .filter(|c| !c.is_empty())
    }
}

/// Абсолютный redirect_uri. Относительный путь из настроек дополняется
/// внешним адресом сервиса.
pub fn redirect_uri(settings: &AmazonSpSettings, public_base_url: &str) -> String {
    let uri = settings.oauth_redirect_uri.trim();
    if uri.starts_with("https://") || uri.starts_with("http://") {
        return uri.to_string();
    }
    let base = settings
        .public_base_url
        .as_deref()
        .filter(|b| !b.trim().is_empty())
        .unwrap_or(public_base_url)
        .trim_end_matches('/');
    format!("{}/{}", base, uri.trim_start_matches('/'))
}

pub fn build_consent_url(settings: &AmazonSpSettings, state: &str, redirect_uri: &str) -> String {
    format!(
        "{}{}?application_id={}&state={}&redirect_uri={}&version=beta",
        settings.seller_central_url.trim_end_matches('/'),
        settings.oauth_path,
        urlencoding::encode(&settings.application_id),
        urlencoding::encode(state),
        urlencoding::encode(redirect_uri),
    )
}

/// Обменять authorization code на refresh token и сохранить его в настройках.
///
/// Возвращает код настроек продавца.
pub async fn complete_authorization(
    db: &DatabaseConnection,
    http: &reqwest::Client,
    sp_api: &SpApiConfig,
    states: &OAuthStateStore,
    callback: &OAuthCallback,
) -> Result<String, OAuthError> {
    let code = callback.authorization_code().ok_or(OAuthError::MissingCode)?;
    let state = callback
        .state
        .as_deref()
        .filter(|s| !s.is_empty())
        .ok_or(OAuthError::MissingState)?;
    let settings_code = states.take(state).ok_or(OAuthError::InvalidState)?;

    let settings = a001_amazon_sp_settings::repository::get_by_code(db, &settings_code)
        .await?
        .ok_or_else(|| OAuthError::SettingsNotFound(settings_code.clone()))?;
    let token_url = settings
        .oauth_token_url
        .as_deref()
        .filter(|u| !u.trim().is_empty())
        .unwrap_or(&sp_api.token_url);

    let response = match exchange_authorization_code(
        http,
        token_url,
        &settings.client_id,
        &settings.client_secret,
        code,
    )
    .await
    {
        Ok(response) => response,
        Err(e) => {
            logger::log_error(db, LOG_SOURCE, &format!("Amazon Oauth Response: {}", e)).await;
            return Err(e.into());
        }
    };
    logger::log_error(
        db,
        LOG_SOURCE,
        &format!("Amazon Oauth Response: {}", response.redacted()),
    )
    .await;

    let refresh_token = response
        .refresh_token
        .filter(|t| !t.trim().is_empty())
        .ok_or(OAuthError::NoRefreshToken)?;
    a001_amazon_sp_settings::repository::set_refresh_token(db, &settings.base.code, &refresh_token)
        .await?;

    tracing::info!(
        "Stored refresh token for '{}' (selling partner {})",
        settings.base.code,
        callback.selling_partner_id.as_deref().unwrap_or("-")
    );
    Ok(settings.base.code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::logger::repository::get_all_logs;
    use crate::usecases::fixtures::{seeded_db, SETTINGS_CODE};
    use axum::routing::post;
    use axum::{Form, Json, Router};
    use std::collections::HashMap;
    use std::time::Duration;

    /// Локальный LWA token endpoint
    async fn spawn_token_endpoint() -> String {
        async fn token(Form(form): Form<HashMap<String, String>>) -> Json<serde_json::Value> {
            assert_eq!(form.get("grant_type").map(String::as_str), Some("authorization_code"));
            assert_eq!(form.get("code").map(String::as_str), Some("ANcode"));
            Json(serde_json::json!({
                "access_token": "Atza|access",
                "refresh_token": "Atzr|fresh",
                "token_type": "bearer",
                "expires_in": 3600
            }))
        }

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, Router::new().route("/auth/o2/token", post(token)))
                .await
                .unwrap();
        });
        format!("http://{}/auth/o2/token", addr)
    }

    #[tokio::test]
    async fn test_consent_url() {
        let (_, settings) = seeded_db().await;
        let redirect = redirect_uri(&settings, "https://erp.example.com/");
        assert_eq!(redirect, "https://erp.example.com/oauth/redirect");

        let url = build_consent_url(&settings, "abc123", &redirect);
        assert_eq!(
            url,
            "https://sellercentral.amazon.in/apps/authorize/consent?application_id=amzn1.sp.solution.x\
             &state=abc123&redirect_uri=https%3A%2F%2Ferp.example.com%2Foauth%2Fredirect&version=beta"
        );
    }

    #[tokio::test]
    async fn test_callback_stores_refresh_token() {
        let (db, _) = seeded_db().await;
        let sp_api = SpApiConfig {
            token_url: spawn_token_endpoint().await,
            ..SpApiConfig::default()
        };
        let states = OAuthStateStore::new(Duration::from_secs(120));
        let state = states.issue(SETTINGS_CODE);
        let callback = OAuthCallback {
            spapi_oauth_code: Some("ANcode".into()),
            state: Some(state),
            selling_partner_id: Some("A3SELLER".into()),
            ..Default::default()
        };

        let code = complete_authorization(&db, &reqwest::Client::new(), &sp_api, &states, &callback)
            .await
            .unwrap();
        assert_eq!(code, SETTINGS_CODE);

        let settings = a001_amazon_sp_settings::repository::get_by_code(&db, SETTINGS_CODE)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(settings.refresh_token.as_deref(), Some("Atzr|fresh"));

        let logs = get_all_logs(&db, 10).await.unwrap();
        let entry = logs
            .iter()
            .find(|l| l.message.starts_with("Amazon Oauth Response"))
            .unwrap();
        assert!(!entry.message.contains("Atzr|fresh"));
        assert!(!entry.message.contains("Atza|access"));

        // Повторный редирект с тем же state отклоняется
        let replay = complete_authorization(&db, &reqwest::Client::new(), &sp_api, &states, &callback).await;
        assert!(matches!(replay, Err(OAuthError::InvalidState)));
    }

    #[tokio::test]
    async fn test_callback_requires_code_and_state() {
        let (db, _) = seeded_db().await;
        let states = OAuthStateStore::new(Duration::from_secs(120));
        let http = reqwest::Client::new();
        let sp_api = SpApiConfig::default();

        let no_code = OAuthCallback {
            state: Some(states.issue(SETTINGS_CODE)),
            ..Default::default()
        };
        assert!(matches!(
            complete_authorization(&db, &http, &sp_api, &states, &no_code).await,
            Err(OAuthError::MissingCode)
        ));

        let forged = OAuthCallback {
            code: Some("ANcode".into()),
            state: Some("not-issued".into()),
            ..Default::default()
        };
        assert!(matches!(
            complete_authorization(&db, &http, &sp_api, &states, &forged).await,
            Err(OAuthError::InvalidState)
        ));
    }
}
