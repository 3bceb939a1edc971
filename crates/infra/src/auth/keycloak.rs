//! Keycloak (OpenID Connect) identity provider
//!
//! Public client: every call carries `client_id` only. Token and logout
//! requests are form-encoded against the realm's OpenID Connect endpoints.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, Response};
use spatialbias_common::auth::{
    CredentialError, IdentityProvider, OAuthError, SessionCheck, TokenResponse, TokenSet,
};
use spatialbias_domain::{AuthSettings, SpatialBiasError};
use tracing::{debug, info, warn};

use crate::http::HttpClient;

const IDENTITY_TIMEOUT: Duration = Duration::from_secs(30);

/// OpenID Connect endpoints of one Keycloak realm
pub struct KeycloakProvider {
    http: HttpClient,
    client_id: String,
    token_url: String,
    logout_url: String,
}

impl KeycloakProvider {
    /// Provider for the realm described by `settings`
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be created
    pub fn new(settings: &AuthSettings) -> Result<Self, SpatialBiasError> {
        let http = HttpClient::builder().timeout(IDENTITY_TIMEOUT).max_attempts(2).build()?;
        Ok(Self::with_client(settings, http))
    }

    /// Provider using an existing HTTP client
    pub fn with_client(settings: &AuthSettings, http: HttpClient) -> Self {
        let realm_base = format!(
            "{}/realms/{}/protocol/openid-connect",
            settings.url.trim_end_matches('/'),
            settings.realm
        );
        Self {
            http,
            client_id: settings.client_id.clone(),
            token_url: format!("{realm_base}/token"),
            logout_url: format!("{realm_base}/logout"),
        }
    }

    /// Token endpoint URL
    pub fn token_url(&self) -> &str {
        &self.token_url
    }

    /// End-session endpoint URL
    pub fn logout_url(&self) -> &str {
        &self.logout_url
    }

    async fn post_form(
        &self,
        url: &str,
        params: &[(&str, &str)],
    ) -> Result<Response, CredentialError> {
        let request = self.http.request(Method::POST, url).form(params);
        self.http
            .send(request)
            .await
            .map_err(|e| CredentialError::Provider(format!("identity provider unreachable: {e}")))
    }
}

/// Turn an unsuccessful token endpoint answer into a credential error
async fn rejection(response: Response) -> CredentialError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    match serde_json::from_str::<OAuthError>(&body) {
        Ok(error) if error.is_invalid_grant() => CredentialError::InvalidGrant(error.to_string()),
        Ok(error) => CredentialError::Provider(format!("token endpoint returned {status}: {error}")),
        Err(_) => CredentialError::Provider(format!("token endpoint returned {status}")),
    }
}

#[async_trait]
impl IdentityProvider for KeycloakProvider {
    async fn check_session(
        &self,
        stored: Option<&TokenSet>,
    ) -> Result<SessionCheck, CredentialError> {
        let Some(tokens) = stored else {
            debug!("No stored session");
            return Ok(SessionCheck::NotAuthenticated);
        };

        if !tokens.is_expired(0) {
            debug!("Stored access token still valid");
            return Ok(SessionCheck::Authenticated(tokens.clone()));
        }

        let Some(refresh_token) = tokens.refresh_token.as_deref() else {
            debug!("Stored session expired without refresh token");
            return Ok(SessionCheck::NotAuthenticated);
        };

        match self.refresh(refresh_token).await {
            Ok(fresh) => Ok(SessionCheck::Authenticated(fresh)),
            Err(CredentialError::InvalidGrant(reason)) => {
                info!(reason = %reason, "Stored session no longer valid");
                Ok(SessionCheck::NotAuthenticated)
            }
            Err(e) => Err(e),
        }
    }

    async fn refresh(&self, refresh_token: &str) -> Result<TokenSet, CredentialError> {
        if refresh_token.is_empty() {
            return Err(CredentialError::NoRefreshToken);
        }

        let params = [
            ("grant_type", "refresh_token"),
            ("client_id", self.client_id.as_str()),
            ("refresh_token", refresh_token),
        ];
        let response = self.post_form(&self.token_url, &params).await?;

        if !response.status().is_success() {
            return Err(rejection(response).await);
        }

        let token_response: TokenResponse = response
            .json()
            .await
            .map_err(|e| CredentialError::Provider(format!("invalid token response: {e}")))?;

        let mut tokens = TokenSet::from(token_response);
        if tokens.refresh_token.is_none() {
            tokens.refresh_token = Some(refresh_token.to_string());
        }
        Ok(tokens)
    }

    async fn end_session(&self, tokens: &TokenSet) -> Result<(), CredentialError> {
        let Some(refresh_token) = tokens.refresh_token.as_deref() else {
            warn!("No refresh token, skipping provider logout");
            return Ok(());
        };

        let params = [("client_id", self.client_id.as_str()), ("refresh_token", refresh_token)];
        let response = self.post_form(&self.logout_url, &params).await?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(CredentialError::Provider(format!("logout endpoint returned {status}")))
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use spatialbias_common::testing::token_set;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    const TOKEN_PATH: &str = "/realms/fairness/protocol/openid-connect/token";
    const LOGOUT_PATH: &str = "/realms/fairness/protocol/openid-connect/logout";

    fn provider(server: &MockServer) -> KeycloakProvider {
        let settings = AuthSettings {
            url: format!("{}/", server.uri()),
            realm: "fairness".into(),
            client_id: "spatialbias-ui".into(),
            landing_url: "https://example.org".into(),
        };
        let http = HttpClient::builder().max_attempts(1).build().unwrap();
        KeycloakProvider::with_client(&settings, http)
    }

    fn token_body(access: &str) -> serde_json::Value {
        json!({
            "access_token": access,
            "refresh_token": format!("refresh-{access}"),
            "id_token": format!("id-{access}"),
            "token_type": "Bearer",
            "expires_in": 300,
            "scope": "openid"
        })
    }

    #[tokio::test]
    async fn refresh_posts_refresh_grant() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(TOKEN_PATH))
            .and(body_string_contains("grant_type=refresh_token"))
            .and(body_string_contains("client_id=spatialbias-ui"))
            .and(body_string_contains("refresh_token=r1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(token_body("a2")))
            .expect(1)
            .mount(&server)
            .await;

        let tokens = provider(&server).refresh("r1").await.unwrap();

        assert_eq!(tokens.access_token, "a2");
        assert_eq!(tokens.refresh_token.as_deref(), Some("refresh-a2"));
        assert!(!tokens.is_expired(30));
    }

    #[tokio::test]
    async fn invalid_grant_is_reported_as_such() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(TOKEN_PATH))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": "invalid_grant",
                "error_description": "Token is not active"
            })))
            .mount(&server)
            .await;

        let err = provider(&server).refresh("stale").await.unwrap_err();

        assert_eq!(err, CredentialError::InvalidGrant("invalid_grant: Token is not active".into()));
    }

    #[tokio::test]
    async fn other_token_errors_are_provider_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(TOKEN_PATH))
            .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
            .mount(&server)
            .await;

        let err = provider(&server).refresh("r1").await.unwrap_err();

        assert!(matches!(err, CredentialError::Provider(_)));
    }

    #[tokio::test]
    async fn silent_check_without_stored_tokens_is_not_authenticated() {
        let server = MockServer::start().await;

        let check = provider(&server).check_session(None).await.unwrap();

        assert_eq!(check, SessionCheck::NotAuthenticated);
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn silent_check_reuses_valid_tokens() {
        let server = MockServer::start().await;
        let stored = token_set("a1", 300);

        let check = provider(&server).check_session(Some(&stored)).await.unwrap();

        assert_eq!(check, SessionCheck::Authenticated(stored));
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn silent_check_refreshes_expired_tokens() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(TOKEN_PATH))
            .and(body_string_contains("refresh_token=refresh-a1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(token_body("a2")))
            .expect(1)
            .mount(&server)
            .await;
        let stored = token_set("a1", -5);

        let check = provider(&server).check_session(Some(&stored)).await.unwrap();

        match check {
            SessionCheck::Authenticated(tokens) => assert_eq!(tokens.access_token, "a2"),
            SessionCheck::NotAuthenticated => panic!("expected a refreshed session"),
        }
    }

    #[tokio::test]
    async fn silent_check_with_rejected_refresh_is_not_authenticated() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(TOKEN_PATH))
            .respond_with(
                ResponseTemplate::new(400).set_body_json(json!({ "error": "invalid_grant" })),
            )
            .mount(&server)
            .await;
        let stored = token_set("a1", -5);

        let check = provider(&server).check_session(Some(&stored)).await.unwrap();

        assert_eq!(check, SessionCheck::NotAuthenticated);
    }

    #[tokio::test]
    async fn end_session_posts_refresh_token_to_logout() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(LOGOUT_PATH))
            .and(body_string_contains("refresh_token=refresh-a1"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        provider(&server).end_session(&token_set("a1", 300)).await.unwrap();
    }

    #[test]
    fn endpoints_follow_realm_layout() {
        let settings = AuthSettings {
            url: "https://sso.example.org/".into(),
            realm: "fairness".into(),
            client_id: "ui".into(),
            landing_url: "https://example.org".into(),
        };
        let provider = KeycloakProvider::new(&settings).unwrap();

        assert_eq!(
            provider.token_url(),
            "https://sso.example.org/realms/fairness/protocol/openid-connect/token"
        );
        assert_eq!(
            provider.logout_url(),
            "https://sso.example.org/realms/fairness/protocol/openid-connect/logout"
        );
    }
}
