//! Backend API probe suite
//!
//! Each probe is one bounded request classified purely by status code
//! (200/201), plus the absence of an `errors` array for GraphQL. Probes never
//! propagate transport errors; everything becomes a [`ProbeOutcome`]. The
//! login probe yields a bearer token that is threaded explicitly into the
//! probes that follow it - when login fails they still run, unauthenticated,
//! so every category is covered on every run.

use reqwest::{Method, StatusCode};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{info, warn};

use paasport_common::{ApiReport, ProbeOutcome, Result};

/// Configuration for the probe suite
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Backend base URL, no trailing slash required
    pub base_url: String,

    /// Credentials for the login probe
    pub username: String,
    pub password: String,

    /// Per-probe request timeout
    pub timeout: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            username: "testuser".to_string(),
            password: "testpass123".to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

/// Bearer token obtained from a successful login probe
#[derive(Debug, Clone)]
pub struct BearerToken(String);

impl BearerToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Drives the HTTP/GraphQL probe set against a running backend
pub struct ApiProber {
    client: reqwest::Client,
    config: ApiConfig,
}

impl ApiProber {
    pub fn new(config: ApiConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;
        Ok(Self { client, config })
    }

    /// Run every probe category in order and collect the results
    ///
    /// A failure in one category never aborts the ones after it.
    pub async fn run_all(&self) -> ApiReport {
        info!("Probing backend at {}", self.config.base_url);

        let connectivity = self.probe_health().await;
        let (authentication, token) = self.probe_login().await;
        if token.is_none() {
            warn!("No bearer token; authenticated probes will run unauthenticated");
        }

        let applications = self.probe_applications(token.as_ref()).await;
        let deployments = self.probe_deployments(token.as_ref()).await;
        let analytics = self.probe_analytics(token.as_ref()).await;
        let graphql = self.probe_graphql(token.as_ref()).await;

        let report = ApiReport {
            connectivity,
            authentication,
            applications,
            deployments,
            analytics,
            graphql,
        };
        info!("API probes: {}/{} passed", report.passed(), report.total());
        report
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    /// Issue one request and require a 200/201 response
    async fn expect_status(
        &self,
        method: Method,
        path: &str,
        token: Option<&BearerToken>,
        body: Option<&Value>,
    ) -> std::result::Result<reqwest::Response, String> {
        let mut req = self.client.request(method.clone(), self.url(path));
        if let Some(token) = token {
            req = req.bearer_auth(token.as_str());
        }
        if let Some(body) = body {
            req = req.json(body);
        }

        match req.send().await {
            Ok(resp) if status_ok(resp.status()) => Ok(resp),
            Ok(resp) => Err(format!("{} {} returned {}", method, path, resp.status())),
            Err(e) => Err(format!("{} {} failed: {}", method, path, e)),
        }
    }

    async fn probe_health(&self) -> ProbeOutcome {
        match self.expect_status(Method::GET, "/health", None, None).await {
            Ok(_) => ProbeOutcome::ok(),
            Err(e) => ProbeOutcome::fail(e),
        }
    }

    /// Login and extract the bearer token from the response body
    async fn probe_login(&self) -> (ProbeOutcome, Option<BearerToken>) {
        let credentials = json!({
            "username": self.config.username,
            "password": self.config.password,
        });

        let resp = match self
            .expect_status(Method::POST, "/auth/login", None, Some(&credentials))
            .await
        {
            Ok(resp) => resp,
            Err(e) => return (ProbeOutcome::fail(e), None),
        };

        let body: Value = match resp.json().await {
            Ok(body) => body,
            Err(e) => {
                return (
                    ProbeOutcome::fail(format!("login response was not JSON: {}", e)),
                    None,
                )
            }
        };

        match body.get("token").and_then(Value::as_str) {
            Some(token) => (ProbeOutcome::ok(), Some(BearerToken(token.to_string()))),
            None => (
                ProbeOutcome::fail("login response has no token field"),
                None,
            ),
        }
    }

    /// CRUD round against the applications collection and singleton
    async fn probe_applications(&self, token: Option<&BearerToken>) -> ProbeOutcome {
        let create = json!({
            "name": "harness-probe-app",
            "runtime": "node20",
            "region": "local",
        });

        let resp = match self
            .expect_status(Method::POST, "/api/v1/applications", token, Some(&create))
            .await
        {
            Ok(resp) => resp,
            Err(e) => return ProbeOutcome::fail(e),
        };

        let created: Value = match resp.json().await {
            Ok(body) => body,
            Err(e) => {
                return ProbeOutcome::fail(format!("create application response was not JSON: {}", e))
            }
        };

        let id = match created.get("id") {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => return ProbeOutcome::fail("create application response has no id"),
        };

        if let Err(e) = self
            .expect_status(Method::GET, "/api/v1/applications", token, None)
            .await
        {
            return ProbeOutcome::fail(e);
        }

        let singleton = format!("/api/v1/applications/{}", id);
        if let Err(e) = self
            .expect_status(Method::GET, &singleton, token, None)
            .await
        {
            return ProbeOutcome::fail(e);
        }

        let update = json!({ "name": "harness-probe-app-v2" });
        if let Err(e) = self
            .expect_status(Method::PUT, &singleton, token, Some(&update))
            .await
        {
            return ProbeOutcome::fail(e);
        }

        if let Err(e) = self
            .expect_status(Method::DELETE, &singleton, token, None)
            .await
        {
            return ProbeOutcome::fail(e);
        }

        ProbeOutcome::ok()
    }

    async fn probe_deployments(&self, token: Option<&BearerToken>) -> ProbeOutcome {
        match self
            .expect_status(Method::GET, "/api/v1/deployments", token, None)
            .await
        {
            Ok(_) => ProbeOutcome::ok(),
            Err(e) => ProbeOutcome::fail(e),
        }
    }

    /// Both analytics endpoints must answer
    async fn probe_analytics(&self, token: Option<&BearerToken>) -> ProbeOutcome {
        for path in ["/api/v1/analytics/usage", "/api/v1/analytics/performance"] {
            if let Err(e) = self.expect_status(Method::GET, path, token, None).await {
                return ProbeOutcome::fail(e);
            }
        }
        ProbeOutcome::ok()
    }

    /// GraphQL succeeds on 200 with no `errors` array in the body
    async fn probe_graphql(&self, token: Option<&BearerToken>) -> ProbeOutcome {
        let query = json!({ "query": "{ applications { id name status } }" });

        let resp = match self
            .expect_status(Method::POST, "/graphql", token, Some(&query))
            .await
        {
            Ok(resp) => resp,
            Err(e) => return ProbeOutcome::fail(e),
        };

        let body: Value = match resp.json().await {
            Ok(body) => body,
            Err(e) => return ProbeOutcome::fail(format!("graphql response was not JSON: {}", e)),
        };

        match body.get("errors") {
            None | Some(Value::Null) => ProbeOutcome::ok(),
            Some(errors) => ProbeOutcome::fail(format!("graphql response has errors: {}", errors)),
        }
    }
}

fn status_ok(status: StatusCode) -> bool {
    matches!(status.as_u16(), 200 | 201)
}
