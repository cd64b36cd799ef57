use super::{use_page_model, BoundRoot, Page, PageMarkup, Rendered};
use crate::api::{CompoundGenerator, ServiceHealth};
use crate::state::AppContext;
use crate::components::ui::{
    Alert, AlertDescription, Card, CardDescription, CardHeader, CardTitle, LinkButton, Spinner,
};
use crate::router::RootHandle;
use crate::routes::AppRoute;
use crate::session::Session;
use icons::ChevronDown;
use leptos::prelude::*;
use std::sync::Arc;

const METRICS: &[(&str, &str)] = &[
    ("90% Faster", "Reduce R&D cycles from months to days."),
    ("10k+ Candidates", "Generate and validate thousands of novel compounds automatically."),
    ("75% Cost Reduction", "Lower laboratory and computational screening costs."),
];

pub(crate) const FAQ: &[(&str, &str)] = &[
    (
        "How does the AI work?",
        "Our system uses a proprietary Agentic AI core that composes multiple models and heuristics to propose, prioritize, and justify candidate molecules.",
    ),
    (
        "Is this data secure?",
        "All inputs are processed securely and can be configured to stay on-premises for strict security requirements. This prototype simulates secure handling.",
    ),
    (
        "What is the output?",
        "The agent provides a ranked list of compounds with predicted properties, structure thumbnails, and a short justification for every recommendation.",
    ),
];

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct HomeModel {
    pub authenticated: bool,
    pub user_name: Option<String>,
    /// `None` until the check started on activation comes back.
    pub health: Option<ServiceHealth>,
    /// Index into [`FAQ`] of the one expanded answer.
    pub open: Option<usize>,
}

pub(crate) struct HomePage<G> {
    session: Session,
    generator: Arc<G>,
    root: BoundRoot,
}

fn edit(root: &RootHandle, f: impl FnOnce(&mut HomeModel)) -> bool {
    root.update(|markup| {
        if let PageMarkup::Home(m) = markup {
            f(m);
        }
    })
}

impl<G: CompoundGenerator> HomePage<G> {
    pub fn new(session: Session, generator: Arc<G>) -> Self {
        Self {
            session,
            generator,
            root: BoundRoot::default(),
        }
    }

    /// Expands FAQ entry `index`, collapsing any other; a second click on
    /// the open entry collapses it.
    pub fn toggle(&self, index: usize) {
        if index >= FAQ.len() {
            return;
        }
        if let Some(root) = self.root.get() {
            edit(&root, |m| {
                m.open = if m.open == Some(index) { None } else { Some(index) };
            });
        }
    }
}

impl<G: CompoundGenerator> Page for HomePage<G> {
    async fn render_markup(&self) -> Rendered {
        Rendered::Markup(PageMarkup::Home(HomeModel {
            authenticated: self.session.is_authenticated(),
            user_name: self.session.name(),
            health: None,
            open: None,
        }))
    }

    async fn activate(&self, root: RootHandle) {
        self.root.bind(root.clone());
        let health = self.generator.health().await;
        if let ServiceHealth::Unhealthy(reason) = &health {
            leptos::logging::warn!("[api] generation service unhealthy: {reason}");
        }
        if !edit(&root, |m| m.health = Some(health)) {
            leptos::logging::log!("[api] health result dropped, home no longer mounted");
        }
    }
}

fn select(markup: &PageMarkup) -> Option<&HomeModel> {
    match markup {
        PageMarkup::Home(m) => Some(m),
        _ => None,
    }
}

#[component]
fn ServiceStatus(health: Option<ServiceHealth>) -> impl IntoView {
    let (dot, label) = match &health {
        None => ("bg-muted-foreground animate-pulse", "Checking generation service".to_string()),
        Some(ServiceHealth::Mock) => ("bg-warning", "Mock mode".to_string()),
        Some(ServiceHealth::Healthy) => ("bg-success", "Generation service online".to_string()),
        Some(ServiceHealth::Unhealthy(reason)) => {
            ("bg-destructive", format!("Generation service unavailable: {reason}"))
        }
    };

    view! {
        <div class="inline-flex items-center gap-2 text-xs text-muted-foreground">
            <span class=format!("size-2 rounded-full {dot}")></span>
            {label}
        </div>
    }
}

#[component]
fn FaqEntry(index: usize, open: bool) -> impl IntoView {
    let ctx = expect_context::<AppContext>();
    let (question, answer) = FAQ[index];
    let chevron = if open { "size-4 rotate-180 transition-transform" } else { "size-4 transition-transform" };

    view! {
        <div class="border-b last:border-b-0">
            <button
                type="button"
                class="flex w-full items-center justify-between py-3 text-left text-sm font-medium"
                aria-expanded={open.to_string()}
                on:click=move |_| ctx.router.table().home.toggle(index)
            >
                {question}
                <ChevronDown class=chevron />
            </button>
            <Show when=move || open fallback=|| ().into_view()>
                <p class="pb-3 text-sm text-muted-foreground">{answer}</p>
            </Show>
        </div>
    }
}

#[component]
pub fn HomeView() -> impl IntoView {
    let model = use_page_model(select);

    move || {
        let Some(model) = model.get() else {
            return view! { <Spinner /> }.into_any();
        };
        let logged_in = model.authenticated;
        let greeting = match &model.user_name {
            Some(name) if logged_in => format!("Welcome back, {name}"),
            _ => "Accelerating Chemical Discovery.".to_string(),
        };
        let (cta_route, cta_label) = if logged_in {
            (AppRoute::Discovery, "Launch Discovery Portal")
        } else {
            (AppRoute::Login, "Log in to start")
        };
        let open = model.open;

        view! {
            <div class="flex flex-col gap-6">
                <section class="flex flex-col gap-3 py-6">
                    <h1 class="text-2xl font-semibold tracking-tight">{greeting}</h1>
                    <p class="max-w-prose text-sm text-muted-foreground">
                        "Using Agentic AI to automate R&D, reduce costs, and unlock novel materials faster than ever before."
                    </p>
                    <div class="flex items-center gap-3">
                        <LinkButton attr:href=cta_route.fragment()>{cta_label}</LinkButton>
                        <a class="text-sm text-primary underline-offset-4 hover:underline" href=AppRoute::Tutorial.fragment()>
                            "How it works"
                        </a>
                    </div>
                    <ServiceStatus health=model.health.clone() />
                </section>

                <div class="grid gap-4 sm:grid-cols-3">
                    {METRICS
                        .iter()
                        .map(|(headline, detail)| {
                            view! {
                                <Card>
                                    <CardHeader>
                                        <CardTitle class="text-lg">{*headline}</CardTitle>
                                        <CardDescription class="text-xs">{*detail}</CardDescription>
                                    </CardHeader>
                                </Card>
                            }
                        })
                        .collect_view()}
                </div>

                <section class="flex flex-col gap-2">
                    <h2 class="text-lg font-semibold">"Frequently asked questions"</h2>
                    <div>
                        {(0..FAQ.len())
                            .map(|i| view! { <FaqEntry index=i open={open == Some(i)} /> })
                            .collect_view()}
                    </div>
                </section>

                <Show when=move || !logged_in fallback=|| ().into_view()>
                    <Alert>
                        <AlertDescription class="text-xs">
                            "Discovery and history need an account. "
                            <a class="text-primary underline underline-offset-4" href=AppRoute::Register.fragment()>"Create one"</a>
                            " in a few seconds."
                        </AlertDescription>
                    </Alert>
                </Show>
            </div>
        }
        .into_any()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pages::testing::{harness, logged_in_at, Harness, StubGenerator};
    use futures::executor::block_on;
    use futures::task::noop_waker_ref;
    use std::future::Future;
    use std::pin::pin;
    use std::task::Context;

    fn model(h: &Harness<StubGenerator>) -> HomeModel {
        match h.mount.markup() {
            Some(PageMarkup::Home(m)) => m,
            other => panic!("expected home markup, got {other:?}"),
        }
    }

    #[test]
    fn test_home_markup_reflects_session_and_health() {
        let h = harness("#/");
        block_on(h.router.render_page());
        let m = model(&h);
        assert!(!m.authenticated);
        assert!(m.user_name.is_none());
        assert_eq!(m.health, Some(ServiceHealth::Healthy));
        assert_eq!(m.open, None);

        let h = logged_in_at("#/");
        let m = model(&h);
        assert!(m.authenticated);
        assert_eq!(m.user_name.as_deref(), Some("Ada"));
    }

    #[test]
    fn test_home_mounts_while_health_check_is_outstanding() {
        let h = harness("#/");
        h.generator.health_gate.close();

        let mut cx = Context::from_waker(noop_waker_ref());
        let mut render = pin!(h.router.render_page());
        assert!(render.as_mut().poll(&mut cx).is_pending());
        assert_eq!(model(&h).health, None);

        h.generator.health_gate.open();
        assert!(render.as_mut().poll(&mut cx).is_ready());
        assert_eq!(model(&h).health, Some(ServiceHealth::Healthy));
    }

    #[test]
    fn test_faq_toggle_opens_switches_and_closes() {
        let h = harness("#/");
        block_on(h.router.render_page());
        let home = &h.pages().home;

        home.toggle(0);
        assert_eq!(model(&h).open, Some(0));
        home.toggle(2);
        assert_eq!(model(&h).open, Some(2));
        home.toggle(2);
        assert_eq!(model(&h).open, None);

        home.toggle(FAQ.len());
        assert_eq!(model(&h).open, None);
    }

    #[test]
    fn test_token_without_name_still_counts_as_logged_in() {
        let h = harness("#/");
        h.session.set_session("tok", "").expect("session");
        block_on(h.router.render_page());
        let m = model(&h);
        assert!(m.authenticated);
        assert!(m.user_name.is_none());
    }
}
