//! Single-flight access-token refresh.
//!
//! However many requests fault with 401 at the same time, at most one call to
//! the refresh endpoint is in flight. Every caller that asks for a refresh
//! while one is outstanding awaits the same shared future and receives the
//! same outcome.
//!
//! Store writes never happen under the state mutex. They are serialised with
//! login and logout by a separate async lock, and the session epoch is only
//! changed while that lock is held.

use std::sync::Arc;

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use parking_lot::Mutex;
use pms_domain::{
    AccessToken, ApiRequest, RefreshRequest, RefreshResponse, RefreshToken, RequestBody,
    SessionEvent, SessionState, StatusCode, TerminationReason, TokenPair,
};
use tracing::{debug, info, warn};

use super::SessionEvents;
use crate::ports::{HttpClient, HttpClientError, TokenStore, TokenStoreError};

/// Path of the refresh endpoint, relative to the API root.
pub const TOKEN_REFRESH_PATH: &str = "token/refresh/";

/// Why a refresh did not produce a new access token.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RefreshError {
    /// Nobody is logged in; there is no session to refresh.
    #[error("not logged in")]
    NotLoggedIn,

    /// An access token was stored without a refresh token.
    #[error("no refresh token available")]
    MissingRefreshToken,

    /// The session already expired; a new login is required.
    #[error("session expired; log in again")]
    SessionExpired,

    /// The refresh endpoint answered with an error status.
    #[error("refresh rejected with status {0}")]
    Rejected(StatusCode),

    /// The refresh endpoint could not be reached.
    #[error("refresh transport error: {0}")]
    Transport(#[from] HttpClientError),

    /// The refresh endpoint answered 2xx with an unexpected body.
    #[error("invalid refresh response: {0}")]
    InvalidResponse(String),

    /// The new token could not be persisted.
    #[error("could not store refreshed token: {0}")]
    Store(#[from] TokenStoreError),

    /// A login or logout happened while the refresh was in flight.
    #[error("session changed while refreshing")]
    Superseded,
}

impl RefreshError {
    const fn termination_reason(&self) -> TerminationReason {
        match self {
            Self::MissingRefreshToken => TerminationReason::MissingRefreshToken,
            _ => TerminationReason::RefreshFailed,
        }
    }
}

type RefreshOutcome = Result<AccessToken, RefreshError>;
type PendingRefresh = Shared<BoxFuture<'static, RefreshOutcome>>;

enum Phase {
    Idle,
    Refreshing(PendingRefresh),
    Expired,
}

struct State {
    phase: Phase,
    /// Bumped by login and logout so a refresh started under an older session
    /// cannot write its result into the new one.
    epoch: u64,
}

struct Inner {
    http: Arc<dyn HttpClient>,
    store: Arc<dyn TokenStore>,
    events: SessionEvents,
    state: Mutex<State>,
    /// Held across every store write and every epoch change.
    writes: tokio::sync::Mutex<()>,
}

/// Coordinates token refreshes so only one is ever in flight.
///
/// Cloning is cheap and clones share state.
#[derive(Clone)]
pub struct RefreshCoordinator {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for RefreshCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshCoordinator")
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl RefreshCoordinator {
    /// Creates an idle coordinator.
    #[must_use]
    pub fn new(
        http: Arc<dyn HttpClient>,
        store: Arc<dyn TokenStore>,
        events: SessionEvents,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                http,
                store,
                events,
                state: Mutex::new(State {
                    phase: Phase::Idle,
                    epoch: 0,
                }),
                writes: tokio::sync::Mutex::new(()),
            }),
        }
    }

    /// Returns the current phase of the refresh state machine.
    #[must_use]
    pub fn state(&self) -> SessionState {
        match self.inner.state.lock().phase {
            Phase::Idle => SessionState::Idle,
            Phase::Refreshing(_) => SessionState::Refreshing,
            Phase::Expired => SessionState::Expired,
        }
    }

    /// Obtains a new access token, joining the outstanding refresh if any.
    ///
    /// # Errors
    ///
    /// Returns an error if nobody is logged in, the session is expired, or
    /// the refresh fails. When a refresh fails both tokens have been cleared
    /// and a `Terminated` event published.
    pub async fn request_refresh(&self) -> Result<AccessToken, RefreshError> {
        let pending = {
            let mut state = self.inner.state.lock();
            match &state.phase {
                Phase::Refreshing(pending) => {
                    debug!("joining outstanding token refresh");
                    pending.clone()
                }
                Phase::Expired => return Err(RefreshError::SessionExpired),
                Phase::Idle => {
                    if self.inner.store.access_token().is_none()
                        && self.inner.store.refresh_token().is_none()
                    {
                        debug!("401 without a session; nothing to refresh");
                        return Err(RefreshError::NotLoggedIn);
                    }
                    debug!("starting token refresh");
                    let pending = Inner::start(Arc::clone(&self.inner), state.epoch);
                    state.phase = Phase::Refreshing(pending.clone());
                    pending
                }
            }
        };
        pending.await
    }

    /// Stores the tokens of a fresh login and returns to `Idle`.
    ///
    /// The store write and the session switch are one step. A refresh from
    /// the previous session, whether in flight or about to start, finishes
    /// with [`RefreshError::Superseded`] and never writes to the store.
    ///
    /// # Errors
    ///
    /// Returns an error if the tokens cannot be stored; the previous session
    /// is then left as it was.
    pub async fn begin_session(&self, tokens: TokenPair) -> Result<(), TokenStoreError> {
        let _writes = self.inner.writes.lock().await;
        self.inner.store.set_tokens(tokens).await?;
        self.inner.switch(Phase::Idle);
        Ok(())
    }

    /// Clears the tokens after an explicit logout and moves to `Expired`.
    ///
    /// # Errors
    ///
    /// Returns an error if persisted tokens cannot be removed. The
    /// coordinator is expired either way.
    pub async fn end_session(&self) -> Result<(), TokenStoreError> {
        let _writes = self.inner.writes.lock().await;
        self.inner.switch(Phase::Expired);
        self.inner.store.clear().await
    }
}

impl Inner {
    fn start(inner: Arc<Self>, epoch: u64) -> PendingRefresh {
        async move {
            let refresh = {
                let _writes = inner.writes.lock().await;
                if inner.epoch() != epoch {
                    return Err(RefreshError::Superseded);
                }
                inner.store.refresh_token()
            };
            let exchanged = match refresh {
                Some(refresh) => inner.exchange(refresh).await,
                None => {
                    warn!("access token rejected and no refresh token stored");
                    Err(RefreshError::MissingRefreshToken)
                }
            };

            let _writes = inner.writes.lock().await;
            if inner.epoch() != epoch {
                debug!("discarding refresh result from a previous session");
                return Err(RefreshError::Superseded);
            }
            let outcome = match exchanged {
                Ok(response) => inner.persist(response).await,
                Err(error) => Err(error),
            };
            match &outcome {
                Ok(_) => {
                    info!("access token refreshed");
                    inner.set_phase(Phase::Idle);
                    inner.events.publish(SessionEvent::Refreshed);
                }
                Err(error) => {
                    warn!(%error, "token refresh failed; ending session");
                    inner.clear_store().await;
                    inner.set_phase(Phase::Expired);
                    inner.events.publish(SessionEvent::Terminated {
                        reason: error.termination_reason(),
                    });
                }
            }
            outcome
        }
        .boxed()
        .shared()
    }

    fn epoch(&self) -> u64 {
        self.state.lock().epoch
    }

    fn set_phase(&self, phase: Phase) {
        self.state.lock().phase = phase;
    }

    /// Starts a new session epoch in `phase`. Callers hold `writes`.
    fn switch(&self, phase: Phase) {
        let mut state = self.state.lock();
        state.epoch = state.epoch.wrapping_add(1);
        state.phase = phase;
    }

    async fn exchange(&self, refresh: RefreshToken) -> Result<RefreshResponse, RefreshError> {
        let body = RequestBody::json(&RefreshRequest { refresh })
            .map_err(|e| RefreshError::InvalidResponse(e.to_string()))?;
        let request = ApiRequest::post(TOKEN_REFRESH_PATH).with_body(body);

        let response = self.http.execute(&request).await?;
        if !response.is_success() {
            return Err(RefreshError::Rejected(response.status));
        }
        response
            .json_body()
            .map_err(|e| RefreshError::InvalidResponse(e.to_string()))
    }

    async fn persist(&self, response: RefreshResponse) -> RefreshOutcome {
        let access = response.access;
        match response.refresh {
            Some(refresh) => {
                self.store
                    .set_tokens(TokenPair {
                        access: access.clone(),
                        refresh,
                    })
                    .await?;
            }
            None => self.store.set_access_token(access.clone()).await?,
        }
        Ok(access)
    }

    async fn clear_store(&self) {
        if let Err(error) = self.store.clear().await {
            warn!(%error, "could not clear stored tokens");
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::auth::MemoryTokenStore;
    use crate::test_support::{FakeServer, TestTokenStore};
    use pretty_assertions::assert_eq;

    fn coordinator(server: &Arc<FakeServer>, store: &Arc<MemoryTokenStore>) -> RefreshCoordinator {
        RefreshCoordinator::new(server.clone(), store.clone(), SessionEvents::new())
    }

    #[tokio::test]
    async fn concurrent_callers_share_one_refresh_call() {
        let server = FakeServer::new().refresh_with("tok2", None).slow_refresh();
        let store = Arc::new(MemoryTokenStore::with_tokens(TokenPair::new("tok1", "r1")));
        let coordinator = coordinator(&server, &store);

        let (a, b, c) = tokio::join!(
            coordinator.request_refresh(),
            coordinator.request_refresh(),
            coordinator.request_refresh()
        );

        assert_eq!(server.refresh_calls(), 1);
        for outcome in [a, b, c] {
            assert_eq!(outcome.unwrap(), AccessToken::new("tok2"));
        }
        assert_eq!(store.access_token(), Some(AccessToken::new("tok2")));
        assert_eq!(coordinator.state(), SessionState::Idle);
    }

    #[tokio::test]
    async fn rotated_refresh_token_is_stored() {
        let server = FakeServer::new().refresh_with("tok2", Some("r2"));
        let store = Arc::new(MemoryTokenStore::with_tokens(TokenPair::new("tok1", "r1")));

        coordinator(&server, &store).request_refresh().await.unwrap();

        assert_eq!(store.refresh_token(), Some(RefreshToken::new("r2")));
        assert_eq!(
            server.last_refresh_body(),
            Some(serde_json::json!({ "refresh": "r1" }))
        );
    }

    #[tokio::test]
    async fn completed_refresh_is_not_reused() {
        let server = FakeServer::new().refresh_with("tok2", None);
        let store = Arc::new(MemoryTokenStore::with_tokens(TokenPair::new("tok1", "r1")));
        let coordinator = coordinator(&server, &store);

        coordinator.request_refresh().await.unwrap();
        assert_eq!(coordinator.state(), SessionState::Idle);
        coordinator.request_refresh().await.unwrap();

        assert_eq!(server.refresh_calls(), 2);
    }

    #[tokio::test]
    async fn rejected_refresh_clears_tokens_and_expires() {
        let server = FakeServer::new().refresh_status(400);
        let store = Arc::new(MemoryTokenStore::with_tokens(TokenPair::new("tok1", "r1")));
        let events = SessionEvents::new();
        let mut rx = events.subscribe();
        let coordinator = RefreshCoordinator::new(server.clone(), store.clone(), events);

        let error = coordinator.request_refresh().await.unwrap_err();

        assert_eq!(error, RefreshError::Rejected(StatusCode::BAD_REQUEST));
        assert!(store.is_empty());
        assert_eq!(coordinator.state(), SessionState::Expired);
        assert_eq!(
            rx.recv().await.unwrap(),
            SessionEvent::Terminated {
                reason: TerminationReason::RefreshFailed
            }
        );
    }

    #[tokio::test]
    async fn expired_state_fails_fast_until_a_new_session() {
        let server = FakeServer::new().refresh_status(401);
        let store = Arc::new(MemoryTokenStore::with_tokens(TokenPair::new("tok1", "r1")));
        let coordinator = coordinator(&server, &store);

        assert!(coordinator.request_refresh().await.is_err());
        assert_eq!(
            coordinator.request_refresh().await,
            Err(RefreshError::SessionExpired)
        );
        assert_eq!(server.refresh_calls(), 1);

        coordinator
            .begin_session(TokenPair::new("tok3", "r3"))
            .await
            .unwrap();
        server.set_refresh_with("tok4", None);

        assert_eq!(
            coordinator.request_refresh().await,
            Ok(AccessToken::new("tok4"))
        );
        assert_eq!(server.last_refresh_body(), Some(serde_json::json!({ "refresh": "r3" })));
        assert_eq!(server.refresh_calls(), 2);
    }

    #[tokio::test]
    async fn missing_refresh_token_fails_without_network() {
        let server = FakeServer::new();
        let store = Arc::new(MemoryTokenStore::new());
        store.set_access_token(AccessToken::new("tok1")).await.unwrap();
        let events = SessionEvents::new();
        let mut rx = events.subscribe();
        let coordinator = RefreshCoordinator::new(server.clone(), store.clone(), events);

        assert_eq!(
            coordinator.request_refresh().await,
            Err(RefreshError::MissingRefreshToken)
        );
        assert_eq!(server.refresh_calls(), 0);
        assert!(store.is_empty());
        assert_eq!(coordinator.state(), SessionState::Expired);
        assert_eq!(
            rx.recv().await.unwrap(),
            SessionEvent::Terminated {
                reason: TerminationReason::MissingRefreshToken
            }
        );
    }

    #[tokio::test]
    async fn no_session_is_not_treated_as_expiry() {
        let server = FakeServer::new();
        let store = Arc::new(MemoryTokenStore::new());
        let events = SessionEvents::new();
        let mut rx = events.subscribe();
        let coordinator = RefreshCoordinator::new(server.clone(), store.clone(), events);

        assert_eq!(
            coordinator.request_refresh().await,
            Err(RefreshError::NotLoggedIn)
        );
        assert_eq!(server.refresh_calls(), 0);
        assert_eq!(coordinator.state(), SessionState::Idle);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn new_session_during_refresh_discards_the_stale_result() {
        let server = FakeServer::new().refresh_with("stale", None).slow_refresh();
        let store = Arc::new(MemoryTokenStore::with_tokens(TokenPair::new("tok1", "r1")));
        let coordinator = coordinator(&server, &store);

        let relogin = async {
            tokio::task::yield_now().await;
            coordinator
                .begin_session(TokenPair::new("fresh", "r9"))
                .await
                .unwrap();
        };
        let (outcome, ()) = tokio::join!(coordinator.request_refresh(), relogin);

        assert_eq!(outcome, Err(RefreshError::Superseded));
        assert_eq!(store.access_token(), Some(AccessToken::new("fresh")));
        assert_eq!(store.refresh_token(), Some(RefreshToken::new("r9")));
        assert_eq!(coordinator.state(), SessionState::Idle);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn refresh_started_while_a_login_is_stored_never_mixes_sessions() {
        let server = FakeServer::new().refresh_with("old-session", None).slow_refresh();
        let store = TestTokenStore::with_tokens(TokenPair::new("tok1", "r1"));
        let coordinator = RefreshCoordinator::new(server.clone(), store.clone(), SessionEvents::new());

        let held = store.hold_next_write();
        let login = tokio::spawn({
            let coordinator = coordinator.clone();
            async move { coordinator.begin_session(TokenPair::new("fresh", "r9")).await }
        });
        held.entered.notified().await;

        let refresh = tokio::spawn({
            let coordinator = coordinator.clone();
            async move { coordinator.request_refresh().await }
        });
        while coordinator.state() != SessionState::Refreshing {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
        held.release.notify_one();

        login.await.unwrap().unwrap();
        assert_eq!(refresh.await.unwrap(), Err(RefreshError::Superseded));
        assert_eq!(server.refresh_calls(), 0);
        assert_eq!(store.access_token(), Some(AccessToken::new("fresh")));
        assert_eq!(store.refresh_token(), Some(RefreshToken::new("r9")));
        assert_eq!(coordinator.state(), SessionState::Idle);
    }

    #[tokio::test]
    async fn refresh_that_cannot_be_stored_ends_the_session() {
        let server = FakeServer::new().refresh_with("tok2", None);
        let store = TestTokenStore::with_tokens(TokenPair::new("tok1", "r1"));
        store.fail_writes();
        let events = SessionEvents::new();
        let mut rx = events.subscribe();
        let coordinator = RefreshCoordinator::new(server.clone(), store.clone(), events);

        let error = coordinator.request_refresh().await.unwrap_err();

        assert!(matches!(error, RefreshError::Store(TokenStoreError::Io(_))));
        assert_eq!(server.refresh_calls(), 1);
        assert!(store.is_empty());
        assert_eq!(coordinator.state(), SessionState::Expired);
        assert_eq!(
            rx.recv().await.unwrap(),
            SessionEvent::Terminated {
                reason: TerminationReason::RefreshFailed
            }
        );
    }

    #[tokio::test]
    async fn end_session_expires_and_clears() {
        let server = FakeServer::new().refresh_with("tok2", None);
        let store = Arc::new(MemoryTokenStore::with_tokens(TokenPair::new("tok1", "r1")));
        let coordinator = coordinator(&server, &store);

        coordinator.end_session().await.unwrap();

        assert!(store.is_empty());
        assert_eq!(
            coordinator.request_refresh().await,
            Err(RefreshError::SessionExpired)
        );
        assert_eq!(server.refresh_calls(), 0);
    }
}
