//! Authenticated request pipeline.
//!
//! Every call carries the session's bearer token. A 401 from a non-auth
//! endpoint triggers one refresh through the cookie-backed refresh endpoint
//! and one replay. Concurrent 401s share a single refresh: whoever takes the
//! lock first refreshes, the others reuse its outcome.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use reqwest::{Method, StatusCode};
use resume_domain::account::TokenResponse;
use serde::{de::DeserializeOwned, Serialize};
use tokio::sync::Mutex;

use crate::config::ClientConfig;
use crate::error::{self, ClientError};
use crate::session::SessionStore;
use crate::transport::{HttpRequest, HttpResponse, HttpTransport, ReqwestTransport};

pub const REFRESH_PATH: &str = "/api/auth/refresh";

/// Endpoints whose 401 means "bad credentials", not "stale token".
const NO_REFRESH: &[&str] = &[
    "/api/auth/login",
    "/api/auth/register",
    REFRESH_PATH,
    "/api/auth/logout",
    "/api/auth/verify-otp",
    "/api/auth/resend-verification",
    "/api/auth/forgot-password",
    "/api/auth/verify-password-reset-otp",
    "/api/auth/reset-password",
];

fn refreshable(path: &str) -> bool {
    !NO_REFRESH.contains(&path)
}

/// Outcome of the most recent refresh. `None` means it failed.
#[derive(Default)]
struct RefreshSlot {
    token: Option<String>,
}

pub struct ApiClient {
    transport: Arc<dyn HttpTransport>,
    session: Arc<SessionStore>,
    refresh: Mutex<RefreshSlot>,
    /// Bumped once per completed refresh attempt.
    refresh_epoch: AtomicU64,
}

impl ApiClient {
    pub fn new(transport: Arc<dyn HttpTransport>, session: Arc<SessionStore>) -> Self {
        Self {
            transport,
            session,
            refresh: Mutex::new(RefreshSlot::default()),
            refresh_epoch: AtomicU64::new(0),
        }
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self, ClientError> {
        let transport = ReqwestTransport::new(config)?;
        Ok(Self::new(Arc::new(transport), Arc::new(SessionStore::new())))
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    /// Sends `request` and returns the successful response, mapping every
    /// other status to a [`ClientError`].
    pub async fn send(&self, mut request: HttpRequest) -> Result<HttpResponse, ClientError> {
        let epoch = self.refresh_epoch.load(Ordering::Acquire);
        request.bearer = self.session.token();
        let response = self.transport.send(request.clone()).await?;

        if response.status != StatusCode::UNAUTHORIZED || !refreshable(&request.path) {
            return self.check(response);
        }

        tracing::debug!("401 on {}, refreshing session", request.path);
        let token = self.refresh_after(epoch).await?;
        request.bearer = Some(token);
        let replay = self.transport.send(request).await?;
        if replay.status == StatusCode::UNAUTHORIZED {
            self.session.clear();
            return Err(ClientError::SessionExpired);
        }
        self.check(replay)
    }

    /// Restores a session from the refresh cookie at startup. A missing or
    /// expired cookie just leaves the client logged out.
    pub async fn hydrate(&self) -> Result<bool, ClientError> {
        let response = self
            .transport
            .send(HttpRequest::new(Method::POST, REFRESH_PATH))
            .await?;
        if !response.status.is_success() {
            return Ok(false);
        }
        let token: TokenResponse = serde_json::from_slice(&response.body)?;
        self.session.establish(&token);
        Ok(true)
    }

    async fn refresh_after(&self, seen_epoch: u64) -> Result<String, ClientError> {
        let mut slot = self.refresh.lock().await;
        if self.refresh_epoch.load(Ordering::Acquire) != seen_epoch {
            // Someone refreshed while this request was in flight.
            return slot.token.clone().ok_or(ClientError::SessionExpired);
        }

        let outcome = self.call_refresh().await;
        slot.token = outcome.as_ref().ok().cloned();
        self.refresh_epoch.fetch_add(1, Ordering::AcqRel);
        if outcome.is_err() {
            tracing::info!("session refresh failed, logging out");
            self.session.clear();
        }
        outcome
    }

    async fn call_refresh(&self) -> Result<String, ClientError> {
        let response = self
            .transport
            .send(HttpRequest::new(Method::POST, REFRESH_PATH))
            .await?;
        if !response.status.is_success() {
            return Err(ClientError::SessionExpired);
        }
        let token: TokenResponse =
            serde_json::from_slice(&response.body).map_err(|_| ClientError::SessionExpired)?;
        self.session.establish(&token);
        Ok(token.access_token)
    }

    fn check(&self, response: HttpResponse) -> Result<HttpResponse, ClientError> {
        if response.status.is_success() {
            return Ok(response);
        }
        let err = error::from_response(response.status, &response.body);
        if let ClientError::InsufficientCredits { credits, .. } = &err {
            self.session.set_credits(*credits);
        }
        Err(err)
    }

    pub(crate) async fn get<R: DeserializeOwned>(&self, path: &str) -> Result<R, ClientError> {
        let response = self.send(HttpRequest::new(Method::GET, path)).await?;
        Ok(serde_json::from_slice(&response.body)?)
    }

    pub(crate) async fn post<B, R>(&self, path: &str, body: &B) -> Result<R, ClientError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        self.with_body(Method::POST, path, body).await
    }

    pub(crate) async fn put<B, R>(&self, path: &str, body: &B) -> Result<R, ClientError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        self.with_body(Method::PUT, path, body).await
    }

    /// POST without a body, e.g. generate or revoke.
    pub(crate) async fn post_empty<R: DeserializeOwned>(&self, path: &str) -> Result<R, ClientError> {
        let response = self.send(HttpRequest::new(Method::POST, path)).await?;
        Ok(serde_json::from_slice(&response.body)?)
    }

    pub(crate) async fn delete(&self, path: &str) -> Result<(), ClientError> {
        self.send(HttpRequest::new(Method::DELETE, path)).await?;
        Ok(())
    }

    pub(crate) async fn delete_json<R: DeserializeOwned>(&self, path: &str) -> Result<R, ClientError> {
        let response = self.send(HttpRequest::new(Method::DELETE, path)).await?;
        Ok(serde_json::from_slice(&response.body)?)
    }

    async fn with_body<B, R>(&self, method: Method, path: &str, body: &B) -> Result<R, ClientError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let request = HttpRequest::new(method, path).json(serde_json::to_value(body)?);
        let response = self.send(request).await?;
        Ok(serde_json::from_slice(&response.body)?)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! A transport driven by a closure, recording every request it sees.

    use std::sync::Mutex as StdMutex;

    use async_trait::async_trait;
    use bytes::Bytes;
    use serde_json::Value;

    use super::*;

    type Handler = dyn Fn(&HttpRequest, usize) -> (StatusCode, Value) + Send + Sync;

    pub struct ScriptedTransport {
        handler: Box<Handler>,
        pub seen: StdMutex<Vec<HttpRequest>>,
    }

    impl ScriptedTransport {
        /// `handler` gets the request and how many requests came before it.
        pub fn new(
            handler: impl Fn(&HttpRequest, usize) -> (StatusCode, Value) + Send + Sync + 'static,
        ) -> Arc<Self> {
            Arc::new(Self {
                handler: Box::new(handler),
                seen: StdMutex::new(Vec::new()),
            })
        }

        pub fn paths(&self) -> Vec<String> {
            self.seen.lock().unwrap().iter().map(|r| r.path.clone()).collect()
        }

        pub fn count(&self, path: &str) -> usize {
            self.paths().iter().filter(|p| *p == path).count()
        }
    }

    #[async_trait]
    impl HttpTransport for ScriptedTransport {
        async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ClientError> {
            let index = {
                let mut seen = self.seen.lock().unwrap();
                seen.push(request.clone());
                seen.len() - 1
            };
            // Let other in-flight requests reach the transport too.
            tokio::task::yield_now().await;
            let (status, body) = (self.handler)(&request, index);
            let body = if body.is_null() {
                Bytes::new()
            } else {
                Bytes::from(body.to_string())
            };
            Ok(HttpResponse { status, body })
        }
    }

    pub fn token_body(token: &str, credits: i64) -> Value {
        serde_json::json!({
            "access_token": token,
            "token_type": "bearer",
            "email": "ada@example.com",
            "first_name": "Ada",
            "last_name": "Lovelace",
            "credits": credits,
            "is_admin": false
        })
    }

    pub fn client(transport: Arc<ScriptedTransport>) -> ApiClient {
        ApiClient::new(transport, Arc::new(SessionStore::new()))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};

    use super::testing::*;
    use super::*;
    use crate::session::SessionEvent;

    fn bearer_is(request: &HttpRequest, token: &str) -> bool {
        request.bearer.as_deref() == Some(token)
    }

    #[tokio::test]
    async fn test_bearer_is_attached() {
        let transport = ScriptedTransport::new(|req, _| {
            assert!(bearer_is(req, "t1"));
            (StatusCode::OK, json!({"ok": true}))
        });
        let client = client(transport.clone());
        client.session().establish(&serde_json::from_value(token_body("t1", 3)).unwrap());
        let body: Value = client.get("/api/dashboard/").await.unwrap();
        assert_eq!(body["ok"], true);
    }

    #[tokio::test]
    async fn test_401_refreshes_once_and_replays() {
        let transport = ScriptedTransport::new(|req, _| {
            if req.path == REFRESH_PATH {
                return (StatusCode::OK, token_body("fresh", 7));
            }
            if bearer_is(req, "fresh") {
                (StatusCode::OK, json!([]))
            } else {
                (StatusCode::UNAUTHORIZED, json!({"detail": "Token expired"}))
            }
        });
        let client = client(transport.clone());
        client.session().establish(&serde_json::from_value(token_body("stale", 7)).unwrap());

        let items: Vec<Value> = client.get("/api/project/").await.unwrap();
        assert!(items.is_empty());
        assert_eq!(transport.count(REFRESH_PATH), 1);
        assert_eq!(transport.count("/api/project/"), 2);
        assert_eq!(client.session().token().as_deref(), Some("fresh"));
    }

    #[tokio::test]
    async fn test_second_401_logs_out_without_looping() {
        let transport = ScriptedTransport::new(|req, _| {
            if req.path == REFRESH_PATH {
                (StatusCode::OK, token_body("fresh", 1))
            } else {
                (StatusCode::UNAUTHORIZED, json!({"detail": "nope"}))
            }
        });
        let client = client(transport.clone());
        let mut events = client.session().subscribe();

        let err = client.get::<Value>("/api/skill/").await.unwrap_err();
        assert!(matches!(err, ClientError::SessionExpired));
        assert_eq!(transport.count(REFRESH_PATH), 1);
        assert_eq!(transport.count("/api/skill/"), 2);
        assert!(!client.session().is_authenticated());

        let mut saw_logout = false;
        while let Ok(event) = events.try_recv() {
            if let SessionEvent::LoggedOut { redirect_to } = event {
                assert_eq!(redirect_to, "/login");
                saw_logout = true;
            }
        }
        assert!(saw_logout);
    }

    #[tokio::test]
    async fn test_failed_refresh_clears_session() {
        let transport = ScriptedTransport::new(|req, _| {
            if req.path == REFRESH_PATH {
                (StatusCode::UNAUTHORIZED, json!({"detail": "Refresh token expired"}))
            } else {
                (StatusCode::UNAUTHORIZED, json!({"detail": "Token expired"}))
            }
        });
        let client = client(transport.clone());
        client.session().establish(&serde_json::from_value(token_body("stale", 2)).unwrap());

        let err = client.get::<Value>("/api/award/").await.unwrap_err();
        assert!(matches!(err, ClientError::SessionExpired));
        assert_eq!(transport.count("/api/award/"), 1);
        assert!(client.session().token().is_none());
    }

    #[tokio::test]
    async fn test_login_401_is_not_refreshed() {
        let transport = ScriptedTransport::new(|_, _| {
            (StatusCode::UNAUTHORIZED, json!({"detail": "Invalid email or password"}))
        });
        let client = client(transport.clone());
        let err = client
            .post::<_, Value>("/api/auth/login", &json!({"email": "a@b.co", "password": "x"}))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Invalid email or password");
        assert_eq!(transport.count(REFRESH_PATH), 0);
    }

    #[tokio::test]
    async fn test_concurrent_401s_share_one_refresh() {
        let transport = ScriptedTransport::new(|req, _| {
            if req.path == REFRESH_PATH {
                return (StatusCode::OK, token_body("fresh", 5));
            }
            if bearer_is(req, "fresh") {
                (StatusCode::OK, json!([]))
            } else {
                (StatusCode::UNAUTHORIZED, json!({"detail": "Token expired"}))
            }
        });
        let client = client(transport.clone());
        client.session().establish(&serde_json::from_value(token_body("stale", 5)).unwrap());

        let (a, b, c) = tokio::join!(
            client.get::<Vec<Value>>("/api/project/"),
            client.get::<Vec<Value>>("/api/skill/"),
            client.get::<Vec<Value>>("/api/award/"),
        );
        assert!(a.is_ok() && b.is_ok() && c.is_ok());
        assert_eq!(transport.count(REFRESH_PATH), 1);
    }

    #[tokio::test]
    async fn test_credit_error_resyncs_balance() {
        let transport = ScriptedTransport::new(|_, _| {
            (
                StatusCode::BAD_REQUEST,
                json!({"detail": "Insufficient credits. Required: 5, available: 1", "credits": 1, "required": 5}),
            )
        });
        let client = client(transport);
        client.session().establish(&serde_json::from_value(token_body("t", 9)).unwrap());
        let err = client
            .post::<_, Value>("/api/ai/rephrase-title", &json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::InsufficientCredits { credits: 1, .. }));
        assert_eq!(client.session().credits(), Some(1));
    }

    #[tokio::test]
    async fn test_hydrate_without_cookie_stays_logged_out() {
        let transport = ScriptedTransport::new(|_, _| {
            (StatusCode::UNAUTHORIZED, json!({"detail": "Refresh token not found"}))
        });
        let client = client(transport);
        let mut events = client.session().subscribe();
        assert!(!client.hydrate().await.unwrap());
        assert!(events.try_recv().is_err());
    }
}
