use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use serde::Deserialize;

use crate::domain::a001_amazon_sp_settings;
use crate::state::AppState;
use crate::system::oauth::{self, OAuthCallback, OAuthError};

#[derive(Debug, Default, Deserialize)]
pub struct AuthorizeParams {
    /// Код настроек продавца; без него берутся основные
    pub settings: Option<String>,
}

/// GET /authorize
///
/// Перенаправляет на страницу согласия Seller Central с одноразовым state.
pub async fn authorize(
    State(state): State<AppState>,
    Query(params): Query<AuthorizeParams>,
) -> Response {
    let settings =
        match a001_amazon_sp_settings::service::resolve(&state.db, params.settings.as_deref()).await
        {
            Ok(settings) => settings,
            Err(e) => {
                tracing::error!("Cannot start OAuth: {}", e);
                return page(StatusCode::NOT_FOUND, "Authorization failed", &e.to_string());
            }
        };

    let nonce = state.oauth_states.issue(&settings.base.code);
    let redirect = oauth::redirect_uri(&settings, &state.config.server.public_base_url);
    let url = oauth::build_consent_url(&settings, &nonce, &redirect);
    tracing::info!("Redirecting '{}' to Seller Central consent", settings.base.code);

    (StatusCode::FOUND, [(header::LOCATION, url)]).into_response()
}

/// GET /oauth/redirect
pub async fn redirect(
    State(state): State<AppState>,
    Query(callback): Query<OAuthCallback>,
) -> Response {
    let result = oauth::complete_authorization(
        &state.db,
        &state.http,
        &state.config.sp_api,
        &state.oauth_states,
        &callback,
    )
    .await;

    match result {
        Ok(code) => page(
            StatusCode::OK,
            "Authorization complete",
            &format!("Amazon SP-API access for '{}' has been granted. You can close this page.", code),
        ),
        Err(e) => {
            tracing::error!("OAuth callback failed: {}", e);
            let status = match &e {
                OAuthError::MissingCode | OAuthError::MissingState | OAuthError::InvalidState => {
                    StatusCode::BAD_REQUEST
                }
                OAuthError::SettingsNotFound(_) => StatusCode::NOT_FOUND,
                OAuthError::NoRefreshToken | OAuthError::Api(_) => StatusCode::BAD_GATEWAY,
                OAuthError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            };
            page(status, "Authorization failed", &e.to_string())
        }
    }
}

fn page(status: StatusCode, title: &str, message: &str) -> Response {
    let body = format!(
        "<!DOCTYPE html><html><head><meta charset=\"utf-8\"><title>{title}</title></head>\
         <body><h2>{title}</h2><p>{message}</p></body></html>",
        title = ammonia::clean_text(title),
        message = ammonia::clean_text(message),
    );
    (status, Html(body)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::test_state;
    use crate::usecases::fixtures::SETTINGS_CODE;

    #[tokio::test]
    async fn test_authorize_redirects_with_issued_state() {
        let state = test_state().await;
        let response = authorize(
            State(state.clone()),
            Query(AuthorizeParams {
                settings: Some(SETTINGS_CODE.into()),
            }),
        )
        .await;

        assert_eq!(response.status(), StatusCode::FOUND);
        let location = response
            .headers()
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .unwrap()
            .to_string();
        assert!(location.starts_with("https://sellercentral.amazon.in/apps/authorize/consent?"));

        let nonce = location
            .split('&')
            .find_map(|part| part.strip_prefix("state="))
            .unwrap();
        assert_eq!(state.oauth_states.take(nonce).as_deref(), Some(SETTINGS_CODE));
    }

    #[tokio::test]
    async fn test_authorize_unknown_settings() {
        let state = test_state().await;
        let response = authorize(
            State(state),
            Query(AuthorizeParams {
                settings: Some("NOPE".into()),
            }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_redirect_rejects_forged_state() {
        let state = test_state().await;
        let response = redirect(
            State(state),
            Query(OAuthCallback {
                code: Some("ANcode".into()),
                state: Some("forged".into()),
                ..Default::default()
            }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_page_escapes_message() {
        let response = page(StatusCode::BAD_REQUEST, "Failed", "<script>'x' & \"y\"</script>");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let html = String::from_utf8(body.to_vec()).unwrap();
        assert!(!html.contains("<script>"));
        assert!(!html.contains("'x'"));
        assert!(html.contains("&lt;script&gt;"));
    }
}
