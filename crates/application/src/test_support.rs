//! Scripted in-process backend and token store used by the unit tests.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use pms_domain::{AccessToken, ApiRequest, ApiResponse, RefreshToken, RequestBody, TokenPair};
use serde_json::{Value, json};
use tokio::sync::{Barrier, Notify};

use crate::auth::{MemoryTokenStore, TOKEN_REFRESH_PATH};
use crate::ports::{HttpClient, HttpClientError, TokenStore, TokenStoreError};

#[derive(Clone)]
enum RefreshReply {
    Issue {
        access: String,
        refresh: Option<String>,
    },
    Status(u16),
    Unreachable,
}

struct Gate {
    barrier: Arc<Barrier>,
    remaining: usize,
}

struct Script {
    valid: HashSet<String>,
    refresh: RefreshReply,
    refresh_delay: Duration,
    gate: Option<Gate>,
    always_unauthorized: HashSet<String>,
    public: HashMap<String, ApiResponse>,
    protected: HashMap<String, ApiResponse>,
    log: Vec<ApiRequest>,
}

/// Answers like the backend: protected paths need a valid bearer token,
/// `token/refresh/` follows the scripted reply.
pub struct FakeServer {
    script: Mutex<Script>,
    refresh_calls: AtomicUsize,
}

impl FakeServer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(Script {
                valid: HashSet::new(),
                refresh: RefreshReply::Status(401),
                refresh_delay: Duration::ZERO,
                gate: None,
                always_unauthorized: HashSet::new(),
                public: HashMap::new(),
                protected: HashMap::new(),
                log: Vec::new(),
            }),
            refresh_calls: AtomicUsize::new(0),
        })
    }

    pub fn refresh_with(self: Arc<Self>, access: &str, refresh: Option<&str>) -> Arc<Self> {
        self.set_refresh_with(access, refresh);
        self
    }

    pub fn set_refresh_with(&self, access: &str, refresh: Option<&str>) {
        self.script.lock().refresh = RefreshReply::Issue {
            access: access.to_string(),
            refresh: refresh.map(str::to_string),
        };
    }

    pub fn refresh_status(self: Arc<Self>, status: u16) -> Arc<Self> {
        self.script.lock().refresh = RefreshReply::Status(status);
        self
    }

    pub fn refresh_unreachable(self: Arc<Self>) -> Arc<Self> {
        self.script.lock().refresh = RefreshReply::Unreachable;
        self
    }

    pub fn slow_refresh(self: Arc<Self>) -> Arc<Self> {
        self.script.lock().refresh_delay = Duration::from_millis(20);
        self
    }

    pub fn accept(self: Arc<Self>, token: &str) -> Arc<Self> {
        self.script.lock().valid.insert(token.to_string());
        self
    }

    pub fn revoke(&self, token: &str) {
        self.script.lock().valid.remove(token);
    }

    pub fn always_unauthorized(self: Arc<Self>, path: &str) -> Arc<Self> {
        self.script.lock().always_unauthorized.insert(path.to_string());
        self
    }

    /// Serves `response` at `path` without checking credentials.
    pub fn public_route(self: Arc<Self>, path: &str, response: ApiResponse) -> Arc<Self> {
        self.script.lock().public.insert(path.to_string(), response);
        self
    }

    /// Serves `response` at `path` to callers with a valid token.
    pub fn route(self: Arc<Self>, path: &str, response: ApiResponse) -> Arc<Self> {
        self.script.lock().protected.insert(path.to_string(), response);
        self
    }

    /// Holds the next `replies` 401 answers at a barrier of `parties`.
    pub fn hold_unauthorized(&self, replies: usize, parties: usize) -> Arc<Barrier> {
        let barrier = Arc::new(Barrier::new(parties));
        self.script.lock().gate = Some(Gate {
            barrier: Arc::clone(&barrier),
            remaining: replies,
        });
        barrier
    }

    pub fn refresh_calls(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.script.lock().log.clone()
    }

    /// Bearer tokens sent to `path`, in arrival order.
    pub fn bearers_for(&self, path: &str) -> Vec<Option<String>> {
        self.requests()
            .iter()
            .filter(|r| r.path == path)
            .map(|r| r.bearer().map(str::to_string))
            .collect()
    }

    /// JSON body of the latest request to `path`.
    pub fn last_request_body(&self, path: &str) -> Option<Value> {
        self.requests()
            .iter()
            .rev()
            .find(|r| r.path == path)
            .and_then(|r| match &r.body {
                RequestBody::Json(value) => Some(value.clone()),
                _ => None,
            })
    }

    pub fn last_refresh_body(&self) -> Option<Value> {
        self.last_request_body(TOKEN_REFRESH_PATH)
    }

    async fn refresh(&self) -> Result<ApiResponse, HttpClientError> {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        let delay = self.script.lock().refresh_delay;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let reply = self.script.lock().refresh.clone();
        match reply {
            RefreshReply::Issue { access, refresh } => {
                let body = match refresh {
                    Some(refresh) => json!({ "access": access, "refresh": refresh }),
                    None => json!({ "access": access }),
                };
                self.script.lock().valid.insert(access);
                Ok(ApiResponse::json(200, &body))
            }
            RefreshReply::Status(status) => Ok(ApiResponse::json(
                status,
                &json!({ "detail": "Token is invalid or expired", "code": "token_not_valid" }),
            )),
            RefreshReply::Unreachable => Err(HttpClientError::ConnectionRefused {
                host: "localhost".to_string(),
                port: 8000,
            }),
        }
    }
}

#[async_trait]
impl HttpClient for FakeServer {
    async fn execute(&self, request: &ApiRequest) -> Result<ApiResponse, HttpClientError> {
        self.script.lock().log.push(request.clone());

        if request.path == TOKEN_REFRESH_PATH {
            return self.refresh().await;
        }

        let gate = {
            let mut script = self.script.lock();
            if let Some(response) = script.public.get(&request.path) {
                return Ok(response.clone());
            }
            let authorized = !script.always_unauthorized.contains(&request.path)
                && request
                    .bearer()
                    .is_some_and(|token| script.valid.contains(token));
            if authorized {
                return Ok(script
                    .protected
                    .get(&request.path)
                    .cloned()
                    .unwrap_or_else(|| ApiResponse::json(200, &json!({ "path": request.path }))));
            }
            match script.gate.as_mut() {
                Some(gate) if gate.remaining > 0 => {
                    gate.remaining -= 1;
                    Some(Arc::clone(&gate.barrier))
                }
                _ => None,
            }
        };

        if let Some(barrier) = gate {
            barrier.wait().await;
        }
        Ok(ApiResponse::json(
            401,
            &json!({
                "detail": "Given token not valid for any token type",
                "code": "token_not_valid"
            }),
        ))
    }
}

/// A write parked inside [`TestTokenStore`] until released.
pub struct HeldWrite {
    /// Notified once the write has started.
    pub entered: Arc<Notify>,
    /// Notify to let the write finish.
    pub release: Arc<Notify>,
}

/// Memory store whose writes can be made to fail or to wait.
pub struct TestTokenStore {
    inner: MemoryTokenStore,
    fail_writes: AtomicBool,
    held: Mutex<Option<HeldWrite>>,
}

impl TestTokenStore {
    pub fn new() -> Arc<Self> {
        Self::from_inner(MemoryTokenStore::new())
    }

    pub fn with_tokens(tokens: TokenPair) -> Arc<Self> {
        Self::from_inner(MemoryTokenStore::with_tokens(tokens))
    }

    fn from_inner(inner: MemoryTokenStore) -> Arc<Self> {
        Arc::new(Self {
            inner,
            fail_writes: AtomicBool::new(false),
            held: Mutex::new(None),
        })
    }

    /// Makes every later `set_*` call fail. `clear` keeps working.
    pub fn fail_writes(&self) {
        self.fail_writes.store(true, Ordering::SeqCst);
    }

    /// Parks the next `set_*` call until the returned handle is released.
    pub fn hold_next_write(&self) -> HeldWrite {
        let entered = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());
        *self.held.lock() = Some(HeldWrite {
            entered: Arc::clone(&entered),
            release: Arc::clone(&release),
        });
        HeldWrite { entered, release }
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    async fn before_write(&self) -> Result<(), TokenStoreError> {
        let held = self.held.lock().take();
        if let Some(held) = held {
            held.entered.notify_one();
            held.release.notified().await;
        }
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(TokenStoreError::Io("No space left on device".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl TokenStore for TestTokenStore {
    fn access_token(&self) -> Option<AccessToken> {
        self.inner.access_token()
    }

    fn refresh_token(&self) -> Option<RefreshToken> {
        self.inner.refresh_token()
    }

    async fn set_tokens(&self, tokens: TokenPair) -> Result<(), TokenStoreError> {
        self.before_write().await?;
        self.inner.set_tokens(tokens).await
    }

    async fn set_access_token(&self, token: AccessToken) -> Result<(), TokenStoreError> {
        self.before_write().await?;
        self.inner.set_access_token(token).await
    }

    async fn clear(&self) -> Result<(), TokenStoreError> {
        self.inner.clear().await
    }
}
