//! Page objects, their view models and the route table.
//!
//! Each page is a singleton built once at startup. The router asks it for
//! markup (a view model, see [`PageMarkup`]), mounts that, then calls
//! `activate` with a handle on the mounted content. Page actions edit the
//! mounted model through that handle and never look anything up in the
//! document.

mod discovery;
mod history;
mod home;
mod login;
mod register;
mod static_pages;

pub(crate) use discovery::{DiscoveryModel, DiscoveryPage, DiscoveryView};
pub(crate) use history::{HistoryModel, HistoryPage, HistoryView};
pub(crate) use home::{HomeModel, HomePage, HomeView};
pub(crate) use login::{LoginModel, LoginPage, LoginView};
pub(crate) use register::{RegisterModel, RegisterPage, RegisterView};
pub(crate) use static_pages::{StaticKind, StaticPage, StaticView};

use crate::api::{AuthService, CompoundGenerator, CompoundSource};
use crate::router::{NavigatorHandle, RootHandle};
use crate::routes::AppRoute;
use crate::session::Session;
use crate::state::AppContext;
use crate::storage::RunStore;
use crate::util::IntervalScheduler;
use leptos::prelude::*;
use std::sync::{Arc, Mutex};

/// View model of whatever page is mounted.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum PageMarkup {
    Home(HomeModel),
    Static(StaticKind),
    Login(LoginModel),
    Register(RegisterModel),
    Discovery(DiscoveryModel),
    History(HistoryModel),
}

/// Result of asking a page for its markup.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Rendered {
    Markup(PageMarkup),
    /// The page refused to render and sent the user elsewhere.
    Redirect(AppRoute),
}

pub(crate) trait Page {
    async fn render_markup(&self) -> Rendered;
    /// Runs once the markup is mounted. `root` stays valid until the next
    /// render replaces it.
    async fn activate(&self, root: RootHandle);
}

/// The root a page was last activated against.
#[derive(Default)]
pub(crate) struct BoundRoot(Mutex<Option<RootHandle>>);

impl BoundRoot {
    pub fn bind(&self, root: RootHandle) {
        if let Ok(mut slot) = self.0.lock() {
            *slot = Some(root);
        }
    }

    pub fn get(&self) -> Option<RootHandle> {
        self.0.lock().ok().and_then(|r| r.clone())
    }
}

/// Collaborators handed to every page at construction.
pub(crate) struct PageDeps<G = CompoundSource> {
    pub session: Session,
    pub store: RunStore,
    pub auth: AuthService,
    pub generator: Arc<G>,
    pub navigator: NavigatorHandle,
    pub intervals: Arc<dyn IntervalScheduler>,
}

/// Fixed association between route keys and page instances.
pub(crate) struct RouteTable<G = CompoundSource> {
    pub home: HomePage<G>,
    pub about: StaticPage,
    pub tutorial: StaticPage,
    pub not_found: StaticPage,
    pub login: LoginPage,
    pub register: RegisterPage,
    pub discovery: DiscoveryPage<G>,
    pub history: HistoryPage,
}

impl<G: CompoundGenerator> RouteTable<G> {
    pub fn new(deps: &PageDeps<G>) -> Self {
        Self {
            home: HomePage::new(deps.session.clone(), deps.generator.clone()),
            about: StaticPage::new(StaticKind::About),
            tutorial: StaticPage::new(StaticKind::Tutorial),
            not_found: StaticPage::new(StaticKind::NotFound),
            login: LoginPage::new(
                deps.session.clone(),
                deps.auth.clone(),
                deps.navigator.clone(),
            ),
            register: RegisterPage::new(deps.auth.clone(), deps.navigator.clone()),
            discovery: DiscoveryPage::new(
                deps.session.clone(),
                deps.generator.clone(),
                deps.store.clone(),
                deps.intervals.clone(),
            ),
            history: HistoryPage::new(deps.session.clone(), deps.store.clone()),
        }
    }

    pub fn page(&self, route: AppRoute) -> PageVariant<'_, G> {
        match route {
            AppRoute::Home => PageVariant::Home(&self.home),
            AppRoute::About => PageVariant::Static(&self.about),
            AppRoute::Tutorial => PageVariant::Static(&self.tutorial),
            AppRoute::NotFound => PageVariant::Static(&self.not_found),
            AppRoute::Login => PageVariant::Login(&self.login),
            AppRoute::Register => PageVariant::Register(&self.register),
            AppRoute::Discovery => PageVariant::Discovery(&self.discovery),
            AppRoute::History => PageVariant::History(&self.history),
        }
    }
}

pub(crate) enum PageVariant<'a, G> {
    Home(&'a HomePage<G>),
    Static(&'a StaticPage),
    Login(&'a LoginPage),
    Register(&'a RegisterPage),
    Discovery(&'a DiscoveryPage<G>),
    History(&'a HistoryPage),
}

impl<G: CompoundGenerator> Page for PageVariant<'_, G> {
    async fn render_markup(&self) -> Rendered {
        match self {
            Self::Home(p) => p.render_markup().await,
            Self::Static(p) => p.render_markup().await,
            Self::Login(p) => p.render_markup().await,
            Self::Register(p) => p.render_markup().await,
            Self::Discovery(p) => p.render_markup().await,
            Self::History(p) => p.render_markup().await,
        }
    }

    async fn activate(&self, root: RootHandle) {
        match self {
            Self::Home(p) => p.activate(root).await,
            Self::Static(p) => p.activate(root).await,
            Self::Login(p) => p.activate(root).await,
            Self::Register(p) => p.activate(root).await,
            Self::Discovery(p) => p.activate(root).await,
            Self::History(p) => p.activate(root).await,
        }
    }
}

/// Reactive slice of the mounted markup for one page view.
pub(crate) fn use_page_model<T>(select: fn(&PageMarkup) -> Option<&T>) -> Memo<Option<T>>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    let mounted = expect_context::<AppContext>().mounted;
    Memo::new(move |_| mounted.with(|m| m.as_ref().and_then(|m| select(&m.markup)).cloned()))
}
