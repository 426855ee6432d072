//! PRO waitlist sign-ups, stored in their own table next to the plans

use super::rest::check;
use crate::config::RemoteConfig;
use crate::error::StoreError;
use reqwest::Client;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, info};

pub struct WaitlistClient {
    client: Client,
    endpoint: String,
    anon_key: String,
}

/// Reject addresses without an `@` before anything goes out
pub fn validate_email(email: &str) -> Result<&str, StoreError> {
    let email = email.trim();
    if email.contains('@') {
        Ok(email)
    } else {
        Err(StoreError::Validation("Ingresa un correo válido.".to_string()))
    }
}

impl WaitlistClient {
    pub fn new(remote: &RemoteConfig) -> Result<Self, StoreError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(remote.timeout_sec))
            .build()?;
        Ok(Self {
            client,
            endpoint: format!(
                "{}/rest/v1/{}",
                remote.url.trim_end_matches('/'),
                remote.waitlist_table
            ),
            anon_key: remote.anon_key.clone(),
        })
    }

    /// Add an address to the waitlist. Signing in is not required.
    pub async fn join(&self, email: &str, source: &str) -> Result<(), StoreError> {
        let email = validate_email(email)?;

        debug!("Adding {} to {}", email, self.endpoint);
        let request = self
            .client
            .post(&self.endpoint)
            .header("apikey", &self.anon_key)
            .bearer_auth(&self.anon_key)
            .header("Prefer", "return=minimal")
            .json(&json!({ "email": email, "source": source }));
        check(request.send().await?).await?;

        info!("Joined the PRO waitlist from {}", source);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path};
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
    async fn test_join_inserts_email_and_source() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/pro_waitlist"))
            .and(header("apikey", "anon"))
            .and(body_json(json!({"email": "ana@example.com", "source": "cli"})))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        let client = WaitlistClient::new(&remote(&server.uri())).unwrap();
        client.join("  ana@example.com ", "cli").await.unwrap();
    }

    #[tokio::test]
    async fn test_invalid_email_never_reaches_the_server() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(201))
            .expect(0)
            .mount(&server)
            .await;

        let client = WaitlistClient::new(&remote(&server.uri())).unwrap();
        let err = client.join("ana.example.com", "cli").await.unwrap_err();
        assert_eq!(err, StoreError::Validation("Ingresa un correo válido.".to_string()));
    }

    #[tokio::test]
    async fn test_duplicate_surfaces_provider_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(409).set_body_json(json!({
                "message": "duplicate key value violates unique constraint"
            })))
            .mount(&server)
            .await;

        let client = WaitlistClient::new(&remote(&server.uri())).unwrap();
        let err = client.join("ana@example.com", "cli").await.unwrap_err();
        assert_eq!(
            err,
            StoreError::Rejected {
                status: 409,
                message: "duplicate key value violates unique constraint".to_string()
            }
        );
    }
}
