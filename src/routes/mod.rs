//! Route keys, fragment resolution and the access guard policy.
//!
//! Pure logic: nothing here touches the DOM.

use std::fmt::Display;
use strum::EnumIter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, EnumIter)]
pub(crate) enum AppRoute {
    #[default]
    Home,
    About,
    Tutorial,
    Login,
    Register,
    Discovery,
    History,
    NotFound,
}

/// Routes that need a session token.
const PROTECTED: &[AppRoute] = &[AppRoute::Discovery, AppRoute::History];

/// Routes only reachable without a session token.
const AUTH_ONLY: &[AppRoute] = &[AppRoute::Login, AppRoute::Register];

impl AppRoute {
    pub fn path(&self) -> &'static str {
        match self {
            Self::Home => "/",
            Self::About => "/about",
            Self::Tutorial => "/tutorial",
            Self::Login => "/login",
            Self::Register => "/register",
            Self::Discovery => "/discovery",
            Self::History => "/history",
            Self::NotFound => "/404",
        }
    }

    /// `#/discovery` style value for `location.hash` and `href`s.
    pub fn fragment(&self) -> String {
        format!("#{}", self.path())
    }

    pub fn from_path(path: &str) -> Self {
        match path {
            "/" => Self::Home,
            "/about" => Self::About,
            "/tutorial" => Self::Tutorial,
            "/login" => Self::Login,
            "/register" => Self::Register,
            "/discovery" => Self::Discovery,
            "/history" => Self::History,
            _ => Self::NotFound,
        }
    }

    pub fn is_protected(&self) -> bool {
        PROTECTED.contains(self)
    }

    pub fn is_auth_only(&self) -> bool {
        AUTH_ONLY.contains(self)
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::Home => "Home",
            Self::About => "About",
            Self::Tutorial => "Tutorial",
            Self::Login => "Login",
            Self::Register => "Register",
            Self::Discovery => "Discovery",
            Self::History => "History",
            Self::NotFound => "Not found",
        }
    }
}

impl Display for AppRoute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.path())
    }
}

/// Canonical route path for a location fragment.
///
/// `""`, `"#"` and `"#/"` give `/`. Only the first path segment names the
/// resource; a trailing id segment is kept as `/:id` so it never matches a
/// plain route. Query strings are ignored.
pub(crate) fn active_path(fragment: &str) -> String {
    let raw = fragment.strip_prefix('#').unwrap_or(fragment);
    let raw = raw.split('?').next().unwrap_or_default();

    let mut segments = raw.split('/').filter(|s| !s.is_empty());
    match (segments.next(), segments.next()) {
        (None, _) => "/".to_string(),
        (Some(resource), None) => format!("/{}", resource.to_ascii_lowercase()),
        (Some(resource), Some(_)) => format!("/{}/:id", resource.to_ascii_lowercase()),
    }
}

/// Resolves a location fragment to the route key the route table holds.
pub(crate) fn resolve_fragment(fragment: &str) -> AppRoute {
    AppRoute::from_path(&active_path(fragment))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum GuardDecision {
    Allow,
    Redirect(AppRoute),
}

/// Where a logged-out visitor to a protected route goes.
pub(crate) const UNAUTHENTICATED_FALLBACK: AppRoute = AppRoute::Login;
/// Where a logged-in visitor to a login/register route goes.
pub(crate) const AUTHENTICATED_FALLBACK: AppRoute = AppRoute::Discovery;

pub(crate) fn evaluate_guards(route: AppRoute, authenticated: bool) -> GuardDecision {
    if route.is_protected() && !authenticated {
        return GuardDecision::Redirect(UNAUTHENTICATED_FALLBACK);
    }
    if route.is_auth_only() && authenticated {
        return GuardDecision::Redirect(AUTHENTICATED_FALLBACK);
    }
    GuardDecision::Allow
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_empty_fragment_is_home() {
        assert_eq!(resolve_fragment(""), AppRoute::Home);
        assert_eq!(resolve_fragment("#"), AppRoute::Home);
        assert_eq!(resolve_fragment("#/"), AppRoute::Home);
    }

    #[test]
    fn test_known_fragments() {
        assert_eq!(resolve_fragment("#/discovery"), AppRoute::Discovery);
        assert_eq!(resolve_fragment("#/history/"), AppRoute::History);
        assert_eq!(resolve_fragment("#/Login"), AppRoute::Login);
        assert_eq!(resolve_fragment("#/about?ref=nav"), AppRoute::About);
        assert_eq!(resolve_fragment("/tutorial"), AppRoute::Tutorial);
    }

    #[test]
    fn test_unknown_and_nested_fragments_are_not_found() {
        assert_eq!(resolve_fragment("#/nope"), AppRoute::NotFound);
        assert_eq!(resolve_fragment("#/history/12"), AppRoute::NotFound);
        assert_eq!(active_path("#/history/12"), "/history/:id");
    }

    #[test]
    fn test_path_roundtrip_for_every_route() {
        for route in AppRoute::iter() {
            assert_eq!(resolve_fragment(&route.fragment()), route);
        }
    }

    #[test]
    fn test_guards() {
        use GuardDecision::*;
        assert_eq!(evaluate_guards(AppRoute::Discovery, false), Redirect(AppRoute::Login));
        assert_eq!(evaluate_guards(AppRoute::History, false), Redirect(AppRoute::Login));
        assert_eq!(evaluate_guards(AppRoute::Login, true), Redirect(AppRoute::Discovery));
        assert_eq!(evaluate_guards(AppRoute::Register, true), Redirect(AppRoute::Discovery));
        assert_eq!(evaluate_guards(AppRoute::Discovery, true), Allow);
        assert_eq!(evaluate_guards(AppRoute::Login, false), Allow);
        assert_eq!(evaluate_guards(AppRoute::Home, true), Allow);
        assert_eq!(evaluate_guards(AppRoute::Home, false), Allow);
    }

    #[test]
    fn test_guard_fallbacks_never_redirect_again() {
        for authenticated in [false, true] {
            for route in AppRoute::iter() {
                if let GuardDecision::Redirect(target) = evaluate_guards(route, authenticated) {
                    assert_eq!(evaluate_guards(target, authenticated), GuardDecision::Allow);
                }
            }
        }
    }
}
