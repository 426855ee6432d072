use super::Identity;
use crate::config::RemoteConfig;
use crate::error::SessionError;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, info};

/// Client for a GoTrue-style identity provider (email + password)
pub struct AuthClient {
    client: Client,
    base_url: String,
    anon_key: String,
}

#[derive(Debug, PartialEq)]
pub enum SignUpOutcome {
    SignedIn(Identity),
    /// The provider wants the address confirmed before issuing a session
    ConfirmationPending,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    user: UserInfo,
}

#[derive(Deserialize)]
struct UserInfo {
    id: String,
    #[serde(default)]
    email: Option<String>,
}

impl AuthClient {
    pub fn new(remote: &RemoteConfig) -> Result<Self, SessionError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(remote.timeout_sec))
            .build()?;
        Ok(Self {
            client,
            base_url: remote.url.trim_end_matches('/').to_string(),
            anon_key: remote.anon_key.clone(),
        })
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Identity, SessionError> {
        let url = format!("{}/auth/v1/token?grant_type=password", self.base_url);
        debug!("Signing in {} via {}", email, url);

        let response = self
            .client
            .post(&url)
            .header("apikey", &self.anon_key)
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;

        if !response.status().is_success() {
            let body: Value = response.json().await.unwrap_or(Value::Null);
            return Err(SessionError::SignIn(provider_message(&body)));
        }

        let token: TokenResponse = response.json().await?;
        info!("Signed in as {}", token.user.id);
        Ok(token.into_identity())
    }

    pub async fn sign_up(&self, email: &str, password: &str) -> Result<SignUpOutcome, SessionError> {
        let url = format!("{}/auth/v1/signup", self.base_url);
        debug!("Signing up {} via {}", email, url);

        let response = self
            .client
            .post(&url)
            .header("apikey", &self.anon_key)
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;

        let ok = response.status().is_success();
        let body: Value = response.json().await.unwrap_or(Value::Null);
        if !ok {
            return Err(SessionError::SignUp(provider_message(&body)));
        }

        match serde_json::from_value::<TokenResponse>(body) {
            Ok(token) => Ok(SignUpOutcome::SignedIn(token.into_identity())),
            Err(_) => Ok(SignUpOutcome::ConfirmationPending),
        }
    }

    /// Revoke the session server-side. The caller forgets it locally either way.
    pub async fn sign_out(&self, identity: &Identity) -> Result<(), SessionError> {
        let url = format!("{}/auth/v1/logout", self.base_url);
        self.client
            .post(&url)
            .header("apikey", &self.anon_key)
            .bearer_auth(&identity.access_token)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

impl TokenResponse {
    fn into_identity(self) -> Identity {
        Identity {
            user_id: self.user.id,
            email: self.user.email,
            access_token: self.access_token,
        }
    }
}

/// Pull a readable message out of a provider error body
pub(crate) fn provider_message(body: &Value) -> String {
    ["msg", "error_description", "message", "error"]
        .iter()
        .find_map(|key| body.get(*key).and_then(Value::as_str))
        .unwrap_or("unknown error")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn remote(url: &str) -> RemoteConfig {
        RemoteConfig {
            url: url.to_string(),
            anon_key: "anon".to_string(),
            table: "plans".to_string(),
            waitlist_table: "pro_waitlist".to_string(),
            timeout_sec: 5,
        }
    }

    #[tokio::test]
    async fn test_sign_in_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/token"))
            .and(query_param("grant_type", "password"))
            .and(header("apikey", "anon"))
            .and(body_json(json!({"email": "ana@example.com", "password": "secret"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "jwt-1",
                "token_type": "bearer",
                "user": {"id": "user-1", "email": "ana@example.com"}
            })))
            .mount(&server)
            .await;

        let client = AuthClient::new(&remote(&server.uri())).unwrap();
        let identity = client.sign_in("ana@example.com", "secret").await.unwrap();
        assert_eq!(identity.user_id, "user-1");
        assert_eq!(identity.access_token, "jwt-1");
        assert_eq!(identity.email.as_deref(), Some("ana@example.com"));
    }

    #[tokio::test]
    async fn test_sign_in_surfaces_provider_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/token"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": "invalid_grant",
                "error_description": "Invalid login credentials"
            })))
            .mount(&server)
            .await;

        let client = AuthClient::new(&remote(&server.uri())).unwrap();
        let err = client.sign_in("ana@example.com", "nope").await.unwrap_err();
        assert_eq!(err.to_string(), "Sign-in failed: Invalid login credentials");
    }

    #[tokio::test]
    async fn test_sign_up_pending_confirmation() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/signup"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "user-2",
                "email": "leo@example.com",
                "confirmation_sent_at": "2024-01-01T00:00:00Z"
            })))
            .mount(&server)
            .await;

        let client = AuthClient::new(&remote(&server.uri())).unwrap();
        let outcome = client.sign_up("leo@example.com", "secret").await.unwrap();
        assert_eq!(outcome, SignUpOutcome::ConfirmationPending);
    }

    #[tokio::test]
    async fn test_sign_up_with_immediate_session() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/signup"))
            .and(header("apikey", "anon"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "jwt-3",
                "token_type": "bearer",
                "user": {"id": "user-3", "email": "eva@example.com"}
            })))
            .mount(&server)
            .await;

        let client = AuthClient::new(&remote(&server.uri())).unwrap();
        let outcome = client.sign_up("eva@example.com", "secret").await.unwrap();
        assert_eq!(
            outcome,
            SignUpOutcome::SignedIn(Identity {
                user_id: "user-3".to_string(),
                email: Some("eva@example.com".to_string()),
                access_token: "jwt-3".to_string(),
            })
        );
    }

    #[tokio::test]
    async fn test_sign_out_revokes_with_bearer_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/logout"))
            .and(header("apikey", "anon"))
            .and(header("authorization", "Bearer jwt-1"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let client = AuthClient::new(&remote(&server.uri())).unwrap();
        let identity = Identity {
            user_id: "user-1".to_string(),
            email: None,
            access_token: "jwt-1".to_string(),
        };
        client.sign_out(&identity).await.unwrap();
    }

    #[tokio::test]
    async fn test_sign_out_rejected_token_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/logout"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let client = AuthClient::new(&remote(&server.uri())).unwrap();
        let identity = Identity {
            user_id: "user-1".to_string(),
            email: None,
            access_token: "stale".to_string(),
        };
        assert!(client.sign_out(&identity).await.is_err());
    }

    #[test]
    fn test_provider_message_fallback() {
        assert_eq!(provider_message(&json!({"msg": "m"})), "m");
        assert_eq!(provider_message(&Value::Null), "unknown error");
    }
}
