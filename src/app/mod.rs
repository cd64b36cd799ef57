use crate::components::ui::{Button, ButtonSize, ButtonVariant, Spinner};
use crate::pages::{
    DiscoveryView, HistoryView, HomeView, LoginView, RegisterView, StaticView,
};
use crate::router::Mounted;
use crate::routes::AppRoute;
use crate::state::AppContext;
use leptos::ev;
use leptos::prelude::*;

const APP_NAME: &str = "Chemical Discovery Agent";

/// Navigation entries for the current session state, in display order.
pub(crate) fn nav_links(authenticated: bool) -> Vec<AppRoute> {
    let mut links = vec![AppRoute::Home, AppRoute::About, AppRoute::Tutorial];
    if authenticated {
        links.extend([AppRoute::Discovery, AppRoute::History]);
    } else {
        links.extend([AppRoute::Login, AppRoute::Register]);
    }
    links
}

pub(crate) fn document_title(route: AppRoute) -> String {
    format!("{} | {APP_NAME}", route.title())
}

#[component]
fn NavBar() -> impl IntoView {
    let ctx = expect_context::<AppContext>();
    let mounted = ctx.mounted;

    // Session snapshot of the last render; nothing shows until the first one.
    let session = Memo::new(move |_| {
        mounted.with(|m| m.as_ref().map(|m| (m.authenticated, m.user_name.clone(), m.route)))
    });

    view! {
        <header class="border-b bg-background/95">
            <nav class="mx-auto flex h-14 w-full max-w-5xl items-center gap-4 px-4">
                <a href=AppRoute::Home.fragment() class="text-sm font-semibold tracking-tight">
                    {APP_NAME}
                </a>
                {move || {
                    let Some((authenticated, user_name, active)) = session.get() else {
                        return ().into_any();
                    };
                    let ctx = ctx.clone();
                    view! {
                        <ul class="flex flex-1 items-center gap-3 text-sm">
                            {nav_links(authenticated)
                                .into_iter()
                                .map(|route| {
                                    let class = if route == active {
                                        "font-medium text-foreground"
                                    } else {
                                        "text-muted-foreground hover:text-foreground"
                                    };
                                    view! {
                                        <li>
                                            <a href=route.fragment() class=class>{route.title()}</a>
                                        </li>
                                    }
                                })
                                .collect_view()}
                        </ul>
                        {authenticated.then(move || view! {
                            <div class="flex items-center gap-3 text-xs">
                                {user_name.map(|name| view! { <span class="text-muted-foreground">{name}</span> })}
                                <Button
                                    size=ButtonSize::Sm
                                    variant=ButtonVariant::Outline
                                    on:click=move |_| ctx.logout()
                                >
                                    "Logout"
                                </Button>
                            </div>
                        })}
                    }
                    .into_any()
                }}
            </nav>
        </header>
    }
}

/// Renders the view for whichever page the router last mounted.
#[component]
fn Outlet() -> impl IntoView {
    let ctx = expect_context::<AppContext>();
    let mounted = ctx.mounted;

    // Keyed on (route, generation) so edits to the mounted model do not
    // rebuild the view, but a fresh render does.
    let key = Memo::new(move |_| mounted.with(|m| m.as_ref().map(|m| (m.route, m.generation))));

    move || match key.get().map(|(route, _)| route) {
        None => view! {
            <div class="flex justify-center py-16">
                <Spinner class="size-6" />
            </div>
        }
        .into_any(),
        Some(AppRoute::Home) => view! { <HomeView /> }.into_any(),
        Some(AppRoute::About | AppRoute::Tutorial | AppRoute::NotFound) => {
            view! { <StaticView /> }.into_any()
        }
        Some(AppRoute::Login) => view! { <LoginView /> }.into_any(),
        Some(AppRoute::Register) => view! { <RegisterView /> }.into_any(),
        Some(AppRoute::Discovery) => view! { <DiscoveryView /> }.into_any(),
        Some(AppRoute::History) => view! { <HistoryView /> }.into_any(),
    }
}

#[component]
pub fn App() -> impl IntoView {
    let ctx = AppContext::new();
    provide_context(ctx.clone());

    let hash_ctx = ctx.clone();
    let listener = window_event_listener(ev::hashchange, move |_| hash_ctx.render());
    on_cleanup(move || listener.remove());

    let mounted = ctx.mounted;
    Effect::new(move |_| {
        if let Some(route) = mounted.with(|m: &Option<Mounted>| m.as_ref().map(|m| m.route)) {
            document().set_title(&document_title(route));
        }
    });

    ctx.start();

    view! {
        <div class="min-h-screen bg-background text-foreground">
            <NavBar />
            <main class="mx-auto w-full max-w-5xl px-4 py-8">
                <Outlet />
            </main>
        </div>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nav_links_follow_session() {
        let out = nav_links(false);
        assert!(out.contains(&AppRoute::Login));
        assert!(!out.contains(&AppRoute::Discovery));

        let inn = nav_links(true);
        assert!(inn.contains(&AppRoute::History));
        assert!(!inn.contains(&AppRoute::Register));
        assert_eq!(inn[0], AppRoute::Home);
    }

    #[test]
    fn test_document_title() {
        assert_eq!(
            document_title(AppRoute::History),
            "History | Chemical Discovery Agent"
        );
    }
}
