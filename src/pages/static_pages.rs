use super::{use_page_model, Page, PageMarkup, Rendered};
use crate::components::ui::{Card, CardContent, CardDescription, CardHeader, CardTitle, LinkButton};
use crate::router::RootHandle;
use crate::routes::AppRoute;
use leptos::prelude::*;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum StaticKind {
    About,
    Tutorial,
    NotFound,
}

/// A page with fixed content and nothing to wire up.
pub(crate) struct StaticPage {
    kind: StaticKind,
}

impl StaticPage {
    pub fn new(kind: StaticKind) -> Self {
        Self { kind }
    }
}

impl Page for StaticPage {
    async fn render_markup(&self) -> Rendered {
        Rendered::Markup(PageMarkup::Static(self.kind))
    }

    async fn activate(&self, _root: RootHandle) {}
}

fn select(markup: &PageMarkup) -> Option<&StaticKind> {
    match markup {
        PageMarkup::Static(kind) => Some(kind),
        _ => None,
    }
}

const TUTORIAL_STEPS: &[(&str, &str)] = &[
    (
        "Create an account",
        "Register with your name and email, then log in. Discovery and history are only available while logged in.",
    ),
    (
        "Set your criteria",
        "On the Discovery page pick a target boiling point (50-200 °C) and viscosity (10-100 cP) with the sliders or by typing, then choose the stability and solubility you need. Out-of-range values snap to the nearest limit.",
    ),
    (
        "Generate candidates",
        "Press Generate. A timer shows how long the run has taken; generation can take a few seconds.",
    ),
    (
        "Read the results",
        "Candidates are ranked. Each card lists the structure, the predicted dipole moment (μ), polarizability (α), HOMO-LUMO gap and heat capacity (Cv), plus a short justification.",
    ),
    (
        "Revisit your history",
        "Every successful run is saved on this device. Open History to review past sessions or delete the ones you no longer need.",
    ),
];

#[component]
fn AboutContent() -> impl IntoView {
    view! {
        <Card>
            <CardHeader>
                <CardTitle class="text-lg">"About"</CardTitle>
                <CardDescription class="text-xs">"Chemical Discovery Agent"</CardDescription>
            </CardHeader>
            <CardContent class="flex flex-col gap-3 text-sm text-muted-foreground">
                <p>
                    "Chemical Discovery Agent suggests candidate compounds for a set of target properties. "
                    "A generative model proposes structures, a property predictor estimates their quantum-chemical descriptors, "
                    "and a language model explains why each candidate fits."
                </p>
                <p>
                    "Predictions are estimates for early screening only. Verify any candidate experimentally before relying on it."
                </p>
                <p>"Your discovery history never leaves this browser."</p>
            </CardContent>
        </Card>
    }
}

#[component]
fn TutorialContent() -> impl IntoView {
    view! {
        <Card>
            <CardHeader>
                <CardTitle class="text-lg">"Tutorial"</CardTitle>
                <CardDescription class="text-xs">"From criteria to candidates in five steps."</CardDescription>
            </CardHeader>
            <CardContent>
                <ol class="flex flex-col gap-4">
                    {TUTORIAL_STEPS
                        .iter()
                        .enumerate()
                        .map(|(i, (title, body))| {
                            view! {
                                <li class="flex gap-3">
                                    <span class="flex size-6 shrink-0 items-center justify-center rounded-full bg-primary text-xs text-primary-foreground">
                                        {i + 1}
                                    </span>
                                    <div class="flex flex-col gap-1">
                                        <span class="text-sm font-medium">{*title}</span>
                                        <span class="text-xs text-muted-foreground">{*body}</span>
                                    </div>
                                </li>
                            }
                        })
                        .collect_view()}
                </ol>
            </CardContent>
        </Card>
    }
}

#[component]
fn NotFoundContent() -> impl IntoView {
    view! {
        <div class="flex flex-col items-center gap-3 py-16 text-center">
            <h1 class="text-2xl font-semibold">"404"</h1>
            <p class="text-sm text-muted-foreground">"There is nothing at this address."</p>
            <LinkButton attr:href=AppRoute::Home.fragment()>"Back to home"</LinkButton>
        </div>
    }
}

#[component]
pub fn StaticView() -> impl IntoView {
    let kind = use_page_model(select);

    move || match kind.get() {
        Some(StaticKind::About) => view! { <AboutContent /> }.into_any(),
        Some(StaticKind::Tutorial) => view! { <TutorialContent /> }.into_any(),
        Some(StaticKind::NotFound) | None => view! { <NotFoundContent /> }.into_any(),
    }
}
