//! Wiring of adapters and services for one console invocation.

use std::sync::Arc;

use anyhow::Context as _;
use pms_application::{
    AuthenticatedClient, HealthClient, MemoryTokenStore, ReportsClient, ResourceClient,
    SessionEvents, SessionService, TemplatesClient, TokenStore,
};
use pms_domain::{ClientSettings, SessionEvent};
use pms_infrastructure::{FileTokenStore, ReqwestHttpClient};
use tokio::sync::broadcast::Receiver;

/// Services sharing one token store and one refresh coordinator.
#[derive(Debug)]
pub struct Console {
    /// Settings the console was built from.
    pub settings: ClientSettings,
    /// Authenticated request layer.
    pub client: AuthenticatedClient,
    /// Login and logout.
    pub session: SessionService,
    /// Collection CRUD.
    pub resources: ResourceClient,
    /// Reports endpoints.
    pub reports: ReportsClient,
    /// Document templates.
    pub templates: TemplatesClient,
    /// Liveness and readiness checks.
    pub health: HealthClient,
    events: Receiver<SessionEvent>,
}

impl Console {
    /// Builds the console from `settings`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub async fn new(settings: ClientSettings) -> anyhow::Result<Self> {
        let http = ReqwestHttpClient::new(&settings).context("could not create HTTP client")?;
        let store: Arc<dyn TokenStore> = match &settings.token_file {
            Some(path) => Arc::new(FileTokenStore::open(path).await),
            None => Arc::new(MemoryTokenStore::new()),
        };
        let events = SessionEvents::new();
        let receiver = events.subscribe();
        let client = AuthenticatedClient::new(Arc::new(http), store, events);

        Ok(Self {
            session: SessionService::new(client.clone()),
            resources: ResourceClient::new(client.clone()),
            reports: ReportsClient::new(client.clone()),
            templates: TemplatesClient::new(client.clone()),
            health: HealthClient::new(client.clone()),
            client,
            settings,
            events: receiver,
        })
    }

    /// Returns the notice for a session that ended on its own, if any.
    ///
    /// Explicit logouts produce no notice.
    pub fn session_notice(&mut self) -> Option<&'static str> {
        let mut notice = None;
        while let Ok(event) = self.events.try_recv() {
            if event.requires_login() {
                notice = Some("Your session has expired. Run `pms login` to sign in again.");
            } else if matches!(event, SessionEvent::Terminated { .. }) {
                notice = None;
            }
        }
        notice
    }
}
