use super::{validate_for_insert, ListQuery, PlanListing, PlanStore};
use crate::config::RemoteConfig;
use crate::error::StoreError;
use crate::plan::Plan;
use crate::session::{provider_message, SessionProvider};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// PostgREST-style table endpoint (what Supabase exposes under /rest/v1)
pub struct RestPlanStore {
    client: Client,
    endpoint: String,
    anon_key: String,
    session: Arc<dyn SessionProvider>,
}

impl RestPlanStore {
    pub fn new(remote: &RemoteConfig, session: Arc<dyn SessionProvider>) -> Result<Self, StoreError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(remote.timeout_sec))
            .build()?;
        Ok(Self {
            client,
            endpoint: format!(
                "{}/rest/v1/{}",
                remote.url.trim_end_matches('/'),
                remote.table
            ),
            anon_key: remote.anon_key.clone(),
            session,
        })
    }

    /// Attach the api key and the caller's bearer token
    fn authorized(&self, request: RequestBuilder) -> Result<RequestBuilder, StoreError> {
        let identity = self
            .session
            .current_identity()
            .ok_or_else(|| StoreError::Auth("sign in to sync plans".to_string()))?;
        Ok(request
            .header("apikey", &self.anon_key)
            .bearer_auth(&identity.access_token))
    }
}

#[async_trait]
impl PlanStore for RestPlanStore {
    fn name(&self) -> &'static str {
        "rest"
    }

    async fn create(&self, plan: &Plan) -> Result<Plan, StoreError> {
        validate_for_insert(plan)?;

        // created_at is left to the server
        let body = json!({
            "id": plan.id,
            "user_id": plan.owner_id,
            "name": plan.name,
            "inputs_json": plan.payload,
        });

        debug!("Inserting plan {} into {}", plan.id, self.endpoint);
        let request = self
            .authorized(self.client.post(&self.endpoint))?
            .header("Prefer", "return=representation")
            .json(&body);
        let response = check(request.send().await?).await?;

        let mut rows: Vec<Plan> = response.json().await?;
        let created = rows
            .pop()
            .ok_or_else(|| StoreError::Decode("insert returned no rows".to_string()))?;
        ensure_supported(&created)?;
        Ok(created)
    }

    async fn list(&self, owner_id: &str, query: ListQuery) -> Result<PlanListing, StoreError> {
        let direction = if query.newest_first { "desc" } else { "asc" };
        let mut params = vec![
            ("select".to_string(), "*".to_string()),
            ("user_id".to_string(), format!("eq.{}", owner_id)),
            ("order".to_string(), format!("created_at.{}", direction)),
        ];
        if let Some(limit) = query.limit {
            params.push(("limit".to_string(), limit.to_string()));
        }

        debug!("Listing plans for {} ({:?})", owner_id, query);
        let request = self
            .authorized(self.client.get(&self.endpoint))?
            .query(&params);
        let response = check(request.send().await?).await?;

        // Rows are checked one by one; other clients write to the same table
        let rows: Vec<Value> = response.json().await?;
        let total = rows.len();
        let plans: Vec<Plan> = rows
            .into_iter()
            .filter_map(|row| match serde_json::from_value::<Plan>(row) {
                Ok(plan) => match ensure_supported(&plan) {
                    Ok(()) => Some(plan),
                    Err(e) => {
                        warn!("Skipping remote plan: {}", e);
                        None
                    }
                },
                Err(e) => {
                    warn!("Skipping unreadable remote plan row: {}", e);
                    None
                }
            })
            .collect();

        Ok(PlanListing {
            skipped: total - plans.len(),
            plans,
        })
    }

    async fn delete(&self, plan_id: &str) -> Result<(), StoreError> {
        debug!("Deleting plan {}", plan_id);
        let request = self
            .authorized(self.client.delete(&self.endpoint))?
            .query(&[("id", format!("eq.{}", plan_id))]);
        // PostgREST answers 204 whether or not a row matched
        check(request.send().await?).await?;
        Ok(())
    }
}

pub(super) async fn check(response: Response) -> Result<Response, StoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body: Value = response.json().await.unwrap_or(Value::Null);
    let message = provider_message(&body);
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(StoreError::Auth(message)),
        _ => Err(StoreError::Rejected {
            status: status.as_u16(),
            message,
        }),
    }
}

fn ensure_supported(plan: &Plan) -> Result<(), StoreError> {
    if plan.payload.is_supported() {
        Ok(())
    } else {
        Err(StoreError::Decode(format!(
            "plan {} uses payload schema {}, which this version cannot read",
            plan.id, plan.payload.schema_version
        )))
    }
}
