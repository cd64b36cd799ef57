use crate::api::{AuthService, CompoundSource, EnvConfig};
use crate::pages::{PageDeps, RouteTable};
use crate::router::{BrowserNavigator, Mounted, Router, SignalMount};
use crate::session::Session;
use crate::storage::{RunStore, WebStorage};
use crate::util::BrowserIntervals;
use leptos::logging::{error, log};
use leptos::prelude::*;
use leptos::task::spawn_local;
use std::sync::Arc;

/// Everything the views need: the router that owns the pages, and the
/// signal holding whatever is currently mounted.
#[derive(Clone)]
pub(crate) struct AppContext {
    pub router: Arc<Router>,
    pub mounted: RwSignal<Option<Mounted>>,
    store: RunStore,
}

impl AppContext {
    pub fn new() -> Self {
        let config = EnvConfig::new();
        log!(
            "[config] auth={} molecule={}",
            if config.use_mock_auth { "mock" } else { config.auth_api_url.as_str() },
            config.molecule_api_url.as_deref().unwrap_or("mock"),
        );

        let session = Session::new(Arc::new(WebStorage::session()));
        let store = RunStore::new(Arc::new(WebStorage::local()));
        let deps = PageDeps {
            session: session.clone(),
            store: store.clone(),
            auth: AuthService::from_config(&config),
            generator: Arc::new(CompoundSource::from_config(&config)),
            navigator: Arc::new(BrowserNavigator),
            intervals: Arc::new(BrowserIntervals),
        };

        let mounted = RwSignal::new(None);
        let router = Router::new(
            RouteTable::new(&deps),
            session,
            deps.navigator.clone(),
            Arc::new(SignalMount(mounted)),
        );

        Self {
            router: Arc::new(router),
            mounted,
            store,
        }
    }

    /// Prepares the run store, then renders the initial fragment.
    pub fn start(&self) {
        let router = self.router.clone();
        let store = self.store.clone();
        spawn_local(async move {
            if let Err(e) = store.initialize().await {
                error!("[store] could not initialize: {e}");
            }
            router.render_page().await;
        });
    }

    /// Re-renders after a fragment change.
    pub fn render(&self) {
        let router = self.router.clone();
        spawn_local(async move {
            router.render_page().await;
        });
    }

    pub fn logout(&self) {
        let router = self.router.clone();
        spawn_local(async move {
            router.logout().await;
        });
    }
}
