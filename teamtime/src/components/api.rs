//! The external save boundary for the editable team profile.

use anyhow::Result;
use futures::future::BoxFuture;
use reqwest::header;
use serde_json::Value;
use tracing::debug;

/// The one network operation this core performs.
///
/// Implementations issue a single write for the team resource and resolve
/// with the parsed response body. Failures are returned unmodified; the
/// controller never retries, rolls back, or de-duplicates saves.
pub trait TeamApi: Send + Sync {
    fn save_team_info(&self, team_id: &str, body: Value) -> BoxFuture<'static, Result<Value>>;
}

/// `PUT {base}/api/team/{id}` with a JSON body and JSON accept/content types.
///
/// Session credentials ride on the supplied `reqwest::Client` (cookie jar,
/// default headers); the CSRF field is injected into the body by the
/// controller before the call.
#[derive(Debug, Clone)]
pub struct HttpTeamApi {
    client: reqwest::Client,
    base: String,
}

impl HttpTeamApi {
    pub fn new(base: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base)
    }

    /// Uses a preconfigured client, e.g. one carrying a session cookie jar.
    pub fn with_client(client: reqwest::Client, base: impl Into<String>) -> Self {
        Self {
            client,
            base: base.into(),
        }
    }
}

impl TeamApi for HttpTeamApi {
    fn save_team_info(&self, team_id: &str, body: Value) -> BoxFuture<'static, Result<Value>> {
        let url = format!("{}/api/team/{}", self.base, team_id);
        let client = self.client.clone();
        Box::pin(async move {
            debug!(%url, "saving team info");
            let response = client
                .put(&url)
                .header(header::ACCEPT, "application/json")
                .json(&body)
                .send()
                .await?
                .error_for_status()?;
            Ok(response.json::<Value>().await?)
        })
    }
}
