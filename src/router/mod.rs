//! Page lifecycle controller.
//!
//! Flow for every navigation: resolve fragment -> guards -> markup -> mount
//! -> activate. The browser pieces (location hash, the mounted view) sit
//! behind [`Navigator`] and [`MountPoint`] so the whole cycle runs headless.

use crate::api::{CompoundGenerator, CompoundSource};
use crate::pages::{Page, PageMarkup, Rendered, RouteTable};
use crate::routes::{evaluate_guards, resolve_fragment, AppRoute, GuardDecision};
use crate::session::Session;
use leptos::logging::log;
use leptos::prelude::*;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
#[cfg(test)]
use std::sync::Mutex;

// ============================================================================
// Navigation fragment
// ============================================================================

/// Read/write access to the navigation fragment.
pub(crate) trait Navigator: Send + Sync {
    fn fragment(&self) -> String;
    /// Points the fragment at `route`. The browser reports the change back
    /// through `hashchange`, which drives the next render.
    fn assign(&self, route: AppRoute);
}

pub(crate) type NavigatorHandle = Arc<dyn Navigator>;

/// `location.hash` backed navigator.
pub(crate) struct BrowserNavigator;

impl Navigator for BrowserNavigator {
    fn fragment(&self) -> String {
        web_sys::window()
            .and_then(|w| w.location().hash().ok())
            .unwrap_or_default()
    }

    fn assign(&self, route: AppRoute) {
        if let Some(window) = web_sys::window() {
            if let Err(e) = window.location().set_hash(&route.fragment()) {
                leptos::logging::warn!("[router] set hash {route} failed: {e:?}");
            }
        }
    }
}

/// In-process navigator that records every assignment.
#[cfg(test)]
#[derive(Default)]
pub(crate) struct MemoryNavigator {
    fragment: Mutex<String>,
    assigned: Mutex<Vec<AppRoute>>,
}

#[cfg(test)]
impl MemoryNavigator {
    pub fn at(fragment: &str) -> Self {
        Self {
            fragment: Mutex::new(fragment.to_string()),
            assigned: Mutex::new(Vec::new()),
        }
    }

    /// Simulates the user editing the address bar.
    pub fn set_fragment(&self, fragment: &str) {
        if let Ok(mut f) = self.fragment.lock() {
            *f = fragment.to_string();
        }
    }

    pub fn assigned(&self) -> Vec<AppRoute> {
        self.assigned.lock().map(|a| a.clone()).unwrap_or_default()
    }
}

#[cfg(test)]
impl Navigator for MemoryNavigator {
    fn fragment(&self) -> String {
        self.fragment.lock().map(|f| f.clone()).unwrap_or_default()
    }

    fn assign(&self, route: AppRoute) {
        self.set_fragment(&route.fragment());
        if let Ok(mut a) = self.assigned.lock() {
            a.push(route);
        }
    }
}

// ============================================================================
// Mount point
// ============================================================================

/// What currently occupies the mount point.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Mounted {
    pub route: AppRoute,
    /// Render ticket that produced this content.
    pub generation: u64,
    /// Session snapshot taken at render time; drives the navigation bar.
    pub authenticated: bool,
    pub user_name: Option<String>,
    pub markup: PageMarkup,
}

/// The region the current page is rendered into.
pub(crate) trait MountPoint: Send + Sync {
    fn replace(&self, mounted: Mounted);
    /// Edits the mounted view model if it still belongs to `generation`.
    fn update(&self, generation: u64, edit: &mut dyn FnMut(&mut PageMarkup)) -> bool;
    fn current(&self) -> Option<(AppRoute, u64)>;
}

pub(crate) type MountHandle = Arc<dyn MountPoint>;

/// Mount point backed by the signal the app outlet renders from.
#[derive(Clone, Copy)]
pub(crate) struct SignalMount(pub RwSignal<Option<Mounted>>);

impl MountPoint for SignalMount {
    fn replace(&self, mounted: Mounted) {
        self.0.set(Some(mounted));
    }

    fn update(&self, generation: u64, edit: &mut dyn FnMut(&mut PageMarkup)) -> bool {
        let live = self
            .0
            .with_untracked(|m| m.as_ref().map(|m| m.generation) == Some(generation));
        if live {
            self.0.update(|m| {
                if let Some(m) = m.as_mut() {
                    edit(&mut m.markup);
                }
            });
        }
        live
    }

    fn current(&self) -> Option<(AppRoute, u64)> {
        self.0
            .with_untracked(|m| m.as_ref().map(|m| (m.route, m.generation)))
    }
}

/// Mount point holding the content in memory.
#[cfg(test)]
#[derive(Default)]
pub(crate) struct MemoryMount {
    mounted: Mutex<Option<Mounted>>,
    replaced: AtomicU64,
}

#[cfg(test)]
impl MemoryMount {
    pub fn snapshot(&self) -> Option<Mounted> {
        self.mounted.lock().ok().and_then(|m| m.clone())
    }

    pub fn markup(&self) -> Option<PageMarkup> {
        self.snapshot().map(|m| m.markup)
    }

    /// How many times the content has been swapped.
    pub fn replaced(&self) -> u64 {
        self.replaced.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
impl MountPoint for MemoryMount {
    fn replace(&self, mounted: Mounted) {
        if let Ok(mut m) = self.mounted.lock() {
            *m = Some(mounted);
            self.replaced.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn update(&self, generation: u64, edit: &mut dyn FnMut(&mut PageMarkup)) -> bool {
        let Ok(mut guard) = self.mounted.lock() else {
            return false;
        };
        match guard.as_mut() {
            Some(m) if m.generation == generation => {
                edit(&mut m.markup);
                true
            }
            _ => false,
        }
    }

    fn current(&self) -> Option<(AppRoute, u64)> {
        self.mounted
            .lock()
            .ok()
            .and_then(|m| m.as_ref().map(|m| (m.route, m.generation)))
    }
}

/// A page's handle on the content it rendered. Goes stale as soon as
/// another render replaces the mount point.
#[derive(Clone)]
pub(crate) struct RootHandle {
    mount: MountHandle,
    generation: u64,
}

impl RootHandle {
    pub fn new(mount: MountHandle, generation: u64) -> Self {
        Self { mount, generation }
    }

    pub fn is_live(&self) -> bool {
        self.mount.current().map(|(_, g)| g) == Some(self.generation)
    }

    /// Applies `edit` to the mounted markup; a no-op once stale.
    pub fn update(&self, edit: impl FnOnce(&mut PageMarkup)) -> bool {
        let mut edit = Some(edit);
        self.mount.update(self.generation, &mut |markup| {
            if let Some(edit) = edit.take() {
                edit(markup);
            }
        })
    }
}

// ============================================================================
// Controller
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RenderOutcome {
    Rendered(AppRoute),
    Redirected(AppRoute),
    /// A newer render started while this one was waiting for its markup
    /// or still activating.
    Superseded,
}

pub(crate) struct Router<G = CompoundSource> {
    table: RouteTable<G>,
    session: Session,
    navigator: NavigatorHandle,
    mount: MountHandle,
    renders: AtomicU64,
}

impl<G: CompoundGenerator> Router<G> {
    pub fn new(
        table: RouteTable<G>,
        session: Session,
        navigator: NavigatorHandle,
        mount: MountHandle,
    ) -> Self {
        Self {
            table,
            session,
            navigator,
            mount,
            renders: AtomicU64::new(0),
        }
    }

    pub fn table(&self) -> &RouteTable<G> {
        &self.table
    }

    fn is_current(&self, ticket: u64) -> bool {
        self.renders.load(Ordering::SeqCst) == ticket
    }

    fn redirect(&self, from: AppRoute, to: AppRoute) -> RenderOutcome {
        log!("[router] {from} -> {to}");
        self.navigator.assign(to);
        RenderOutcome::Redirected(to)
    }

    /// Renders whatever the fragment currently points at.
    pub async fn render_page(&self) -> RenderOutcome {
        let ticket = self.renders.fetch_add(1, Ordering::SeqCst) + 1;
        let route = resolve_fragment(&self.navigator.fragment());
        let authenticated = self.session.is_authenticated();

        if let GuardDecision::Redirect(target) = evaluate_guards(route, authenticated) {
            return self.redirect(route, target);
        }

        let page = self.table.page(route);
        let markup = match page.render_markup().await {
            Rendered::Markup(markup) => markup,
            Rendered::Redirect(target) => return self.redirect(route, target),
        };

        if !self.is_current(ticket) {
            log!("[router] render #{ticket} of {route} superseded");
            return RenderOutcome::Superseded;
        }

        self.mount.replace(Mounted {
            route,
            generation: ticket,
            authenticated: self.session.is_authenticated(),
            user_name: self.session.name(),
            markup,
        });
        page.activate(RootHandle::new(self.mount.clone(), ticket))
            .await;
        if !self.is_current(ticket) {
            log!("[router] render #{ticket} of {route} superseded while activating");
            return RenderOutcome::Superseded;
        }
        RenderOutcome::Rendered(route)
    }

    /// Ends the session and shows the home page.
    pub async fn logout(&self) -> RenderOutcome {
        self.session.clear_session();
        log!("[router] logged out");
        if resolve_fragment(&self.navigator.fragment()) == AppRoute::Home {
            // No fragment change, so nothing else will trigger the render.
            return self.render_page().await;
        }
        self.navigator.assign(AppRoute::Home);
        RenderOutcome::Redirected(AppRoute::Home)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pages::testing::{harness, Harness, StubGenerator};
    use crate::routes::AppRoute::*;
    use futures::executor::block_on;
    use strum::IntoEnumIterator;

    fn route_after(h: &Harness<StubGenerator>) -> Option<AppRoute> {
        h.mount.snapshot().map(|m| m.route)
    }

    #[test]
    fn test_empty_fragment_renders_home() {
        let h = harness("");
        assert_eq!(block_on(h.router.render_page()), RenderOutcome::Rendered(Home));
        assert_eq!(route_after(&h), Some(Home));
        assert!(matches!(h.mount.markup(), Some(PageMarkup::Home(_))));
    }

    #[test]
    fn test_unknown_fragment_renders_not_found() {
        let h = harness("#/does-not-exist");
        assert_eq!(block_on(h.router.render_page()), RenderOutcome::Rendered(NotFound));
        assert!(h.navigator.assigned().is_empty());
    }

    #[test]
    fn test_protected_route_logged_out_redirects_to_login_without_rendering() {
        let h = harness("#/history");
        assert_eq!(block_on(h.router.render_page()), RenderOutcome::Redirected(Login));
        assert_eq!(h.navigator.assigned(), vec![Login]);
        assert_eq!(h.mount.replaced(), 0);

        // The fragment change comes back as a second render, which settles.
        assert_eq!(block_on(h.router.render_page()), RenderOutcome::Rendered(Login));
        assert_eq!(h.navigator.assigned(), vec![Login]);
    }

    #[test]
    fn test_auth_only_route_logged_in_redirects_to_discovery() {
        let h = harness("#/register");
        h.session.set_session("tok", "Ada").expect("session");
        assert_eq!(block_on(h.router.render_page()), RenderOutcome::Redirected(Discovery));
        assert_eq!(block_on(h.router.render_page()), RenderOutcome::Rendered(Discovery));
        assert_eq!(h.navigator.assigned(), vec![Discovery]);
    }

    #[test]
    fn test_every_route_settles_after_at_most_one_redirect() {
        for authenticated in [false, true] {
            for route in AppRoute::iter() {
                let h = harness(&route.fragment());
                if authenticated {
                    h.session.set_session("tok", "Ada").expect("session");
                }
                let first = block_on(h.router.render_page());
                let second = block_on(h.router.render_page());
                assert!(
                    matches!(second, RenderOutcome::Rendered(_)),
                    "{route} (auth={authenticated}) gave {first:?} then {second:?}"
                );
                assert!(h.navigator.assigned().len() <= 1);
            }
        }
    }

    #[test]
    fn test_mounted_carries_session_snapshot() {
        let h = harness("#/about");
        block_on(h.router.render_page());
        let m = h.mount.snapshot().expect("mounted");
        assert!(!m.authenticated);
        assert!(m.user_name.is_none());

        h.session.set_session("tok", "Ada").expect("session");
        block_on(h.router.render_page());
        let m = h.mount.snapshot().expect("mounted");
        assert!(m.authenticated);
        assert_eq!(m.user_name.as_deref(), Some("Ada"));
        assert!(m.generation > 1);
    }

    #[test]
    fn test_slow_activation_is_superseded_by_newer_navigation() {
        use futures::task::noop_waker_ref;
        use std::future::Future;
        use std::pin::pin;
        use std::task::{Context, Poll};

        let h = harness("#/");
        // Home activation waits on the health check; hold it open.
        h.generator.health_gate.close();

        let mut cx = Context::from_waker(noop_waker_ref());
        let mut slow = pin!(h.router.render_page());
        assert!(slow.as_mut().poll(&mut cx).is_pending());
        assert_eq!(route_after(&h), Some(Home));

        h.navigator.set_fragment("#/about");
        assert_eq!(block_on(h.router.render_page()), RenderOutcome::Rendered(About));

        h.generator.health_gate.open();
        assert_eq!(slow.as_mut().poll(&mut cx), Poll::Ready(RenderOutcome::Superseded));
        assert_eq!(h.mount.replaced(), 2);
        assert_eq!(route_after(&h), Some(About));
        assert!(matches!(h.mount.markup(), Some(PageMarkup::Static(_))));
    }

    #[test]
    fn test_logout_from_home_re_renders_in_place() {
        let h = harness("#/");
        h.session.set_session("tok", "Ada").expect("session");
        block_on(h.router.render_page());

        assert_eq!(block_on(h.router.logout()), RenderOutcome::Rendered(Home));
        assert!(!h.session.is_authenticated());
        assert!(!h.mount.snapshot().expect("mounted").authenticated);
        assert!(h.navigator.assigned().is_empty());
    }

    #[test]
    fn test_logout_elsewhere_navigates_home() {
        let h = harness("#/discovery");
        h.session.set_session("tok", "Ada").expect("session");
        block_on(h.router.render_page());

        assert_eq!(block_on(h.router.logout()), RenderOutcome::Redirected(Home));
        assert_eq!(h.navigator.assigned(), vec![Home]);
    }
}
