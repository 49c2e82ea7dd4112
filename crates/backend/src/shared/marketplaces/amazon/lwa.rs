//! Login with Amazon: обмен authorization code и refresh token на токены.

use serde::{Deserialize, Serialize};

use super::SpApiError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LwaTokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default = "default_expires_in")]
    pub expires_in: i64,
}

fn default_expires_in() -> i64 {
    3600
}

impl LwaTokenResponse {
    /// Копия ответа для журнала: токены заменены маской
    pub fn redacted(&self) -> serde_json::Value {
        serde_json::json!({
            "access_token": "****",
            "refresh_token": self.refresh_token.as_ref().map(|_| "****"),
            "token_type": self.token_type,
            "expires_in": self.expires_in,
        })
    }
}

/// grant_type=authorization_code: код из OAuth-редиректа → refresh token
pub async fn exchange_authorization_code(
    http: &reqwest::Client,
    token_url: &str,
    client_id: &str,
    client_secret: &str,
    code: &str,
) -> Result<LwaTokenResponse, SpApiError> {
    let form = [
        ("grant_type", "authorization_code"),
        ("code", code),
        ("client_id", client_id),
        ("client_secret", client_secret),
    ];
    request_token(http, token_url, &form).await
}

/// grant_type=refresh_token: access token для вызовов SP-API
pub async fn refresh_access_token(
    http: &reqwest::Client,
    token_url: &str,
    client_id: &str,
    client_secret: &str,
    refresh_token: &str,
) -> Result<LwaTokenResponse, SpApiError> {
    let form = [
        ("grant_type", "refresh_token"),
        ("refresh_token", refresh_token),
        ("client_id", client_id),
        ("client_secret", client_secret),
    ];
    request_token(http, token_url, &form).await
}

async fn request_token(
    http: &reqwest::Client,
    token_url: &str,
    form: &[(&str, &str)],
) -> Result<LwaTokenResponse, SpApiError> {
    let response = http.post(token_url).form(form).send().await?;
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        tracing::error!("LWA token request failed with status {}: {}", status, body);
        return Err(SpApiError::Auth(format!("HTTP {}: {}", status, body)));
    }

    let token: LwaTokenResponse = serde_json::from_str(&body)?;
    if token.access_token.is_empty() {
        return Err(SpApiError::Auth("empty access_token in LWA response".to_string()));
    }
    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redacted_hides_tokens() {
        let token = LwaTokenResponse {
            access_token: "Atza|secret".into(),
            refresh_token: Some("Atzr|secret".into()),
            token_type: Some("bearer".into()),
            expires_in: 3600,
        };
        let text = token.redacted().to_string();
        assert!(!text.contains("secret"));
        assert!(text.contains("bearer"));
    }

    #[test]
    fn test_expires_in_defaults() {
        let token: LwaTokenResponse =
            serde_json::from_str(r#"{"access_token":"a"}"#).unwrap();
        assert_eq!(token.expires_in, 3600);
    }
}
