use super::{use_page_model, BoundRoot, Page, PageMarkup, Rendered};
use crate::api::CompoundGenerator;
use crate::components::ui::{
    Alert, AlertDescription, AlertTitle, Badge, Button, Card, CardContent, CardHeader, CardTitle,
    EmptyState, Input, Label, PropertyRow, Spinner,
};
use crate::models::{
    Compound, Criteria, CriteriaForm, DiscoveryRun, FieldBounds, NewDiscoveryRun, Solubility,
    Stability,
};
use crate::router::RootHandle;
use crate::routes::AppRoute;
use crate::session::Session;
use crate::state::AppContext;
use crate::storage::RunStore;
use crate::util::{format_elapsed, now_ms, IntervalGuard, IntervalScheduler};
use leptos::logging::{error, log, warn};
use leptos::prelude::*;
use leptos::task::spawn_local;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use strum::IntoEnumIterator;

/// How often the elapsed-time display refreshes while a run is pending.
pub(crate) const TICK: Duration = Duration::from_millis(100);

const GENERATION_FAILED: &str = "Failed to generate compounds. Please try again.";
const SAVE_FAILED: &str = "Compounds were generated but could not be saved to your history.";

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum DiscoveryState {
    Idle,
    Submitting { elapsed: String },
    Succeeded { run: DiscoveryRun },
    Failed { message: String },
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct DiscoveryModel {
    pub user_name: Option<String>,
    /// Criteria as last submitted, after clamping.
    pub form: CriteriaForm,
    pub state: DiscoveryState,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum SubmitOutcome {
    Saved(DiscoveryRun),
    Failed(String),
    /// A newer submission started before this one finished.
    Superseded,
    /// The page was never activated.
    Unbound,
}

pub(crate) struct DiscoveryPage<G> {
    session: Session,
    generator: Arc<G>,
    store: RunStore,
    intervals: Arc<dyn IntervalScheduler>,
    root: BoundRoot,
    submissions: AtomicU64,
    ticker: Mutex<Option<Box<dyn IntervalGuard>>>,
}

fn edit(root: &RootHandle, f: impl FnOnce(&mut DiscoveryModel)) -> bool {
    root.update(|markup| {
        if let PageMarkup::Discovery(m) = markup {
            f(m);
        }
    })
}

impl<G: CompoundGenerator> DiscoveryPage<G> {
    pub fn new(
        session: Session,
        generator: Arc<G>,
        store: RunStore,
        intervals: Arc<dyn IntervalScheduler>,
    ) -> Self {
        Self {
            session,
            generator,
            store,
            intervals,
            root: BoundRoot::default(),
            submissions: AtomicU64::new(0),
            ticker: Mutex::new(None),
        }
    }

    fn is_latest(&self, ticket: u64) -> bool {
        self.submissions.load(Ordering::SeqCst) == ticket
    }

    /// Starts the elapsed-time display, replacing any ticker still running.
    fn start_ticker(&self, root: &RootHandle, started: i64) {
        let root = root.clone();
        let guard = self.intervals.start(
            TICK,
            Box::new(move || {
                let elapsed = format_elapsed(now_ms() - started);
                edit(&root, |m| {
                    if let DiscoveryState::Submitting { elapsed: shown } = &mut m.state {
                        *shown = elapsed;
                    }
                });
            }),
        );
        if let Ok(mut slot) = self.ticker.lock() {
            if let Some(previous) = slot.replace(guard) {
                previous.stop();
            }
        }
    }

    fn stop_ticker(&self) {
        if let Ok(mut slot) = self.ticker.lock() {
            if let Some(guard) = slot.take() {
                guard.stop();
            }
        }
    }

    /// Runs one submission: generate, persist, then show the results.
    ///
    /// Only the latest submission is allowed to finish; an older one that
    /// resolves late is dropped without saving or rendering.
    pub async fn submit(&self, form: &CriteriaForm) -> SubmitOutcome {
        let Some(root) = self.root.get() else {
            warn!("[discovery] submit before activation");
            return SubmitOutcome::Unbound;
        };

        let criteria = form.to_criteria();
        let ticket = self.submissions.fetch_add(1, Ordering::SeqCst) + 1;
        let started = now_ms();

        edit(&root, |m| {
            m.form = CriteriaForm::from(&criteria);
            m.state = DiscoveryState::Submitting {
                elapsed: format_elapsed(0),
            };
        });
        self.start_ticker(&root, started);
        log!("[discovery] submission #{ticket}: {criteria:?}");

        let generated = self.generator.generate(&criteria).await;
        if !self.is_latest(ticket) {
            log!("[discovery] submission #{ticket} superseded");
            return SubmitOutcome::Superseded;
        }
        self.stop_ticker();
        let duration = format_elapsed(now_ms() - started);

        let result = match generated {
            Ok(results) => {
                let run = NewDiscoveryRun {
                    timestamp: started,
                    criteria,
                    results,
                    duration: Some(duration),
                };
                self.store.save(run).await.map_err(|e| {
                    error!("[store] saving run failed: {e}");
                    SAVE_FAILED.to_string()
                })
            }
            Err(e) => {
                error!("[discovery] generation failed: {e}");
                Err(GENERATION_FAILED.to_string())
            }
        };

        if !self.is_latest(ticket) {
            log!("[discovery] submission #{ticket} superseded after saving");
            return SubmitOutcome::Superseded;
        }

        match result {
            Ok(run) => {
                log!(
                    "[discovery] run {} saved with {} compounds",
                    run.id,
                    run.results.len()
                );
                let shown = run.clone();
                edit(&root, |m| m.state = DiscoveryState::Succeeded { run: shown });
                SubmitOutcome::Saved(run)
            }
            Err(message) => {
                let shown = message.clone();
                edit(&root, |m| m.state = DiscoveryState::Failed { message: shown });
                SubmitOutcome::Failed(message)
            }
        }
    }
}

impl<G: CompoundGenerator> Page for DiscoveryPage<G> {
    async fn render_markup(&self) -> Rendered {
        if !self.session.is_authenticated() {
            return Rendered::Redirect(AppRoute::Login);
        }
        Rendered::Markup(PageMarkup::Discovery(DiscoveryModel {
            user_name: self.session.name(),
            form: CriteriaForm::from(&Criteria::default()),
            state: DiscoveryState::Idle,
        }))
    }

    async fn activate(&self, root: RootHandle) {
        self.root.bind(root);
    }
}

// ============================================================================
// View
// ============================================================================

fn select(markup: &PageMarkup) -> Option<&DiscoveryModel> {
    match markup {
        PageMarkup::Discovery(m) => Some(m),
        _ => None,
    }
}

const SELECT_CLASS: &str = "border-input flex h-8 w-full rounded-md border bg-transparent px-2 text-sm shadow-xs outline-none focus-visible:border-ring focus-visible:ring-2 focus-visible:ring-ring/50";

/// Range slider paired with a free-text field; the text is clamped on blur.
#[component]
fn CriterionSlider(
    id: &'static str,
    label: &'static str,
    bounds: FieldBounds,
    value: RwSignal<String>,
) -> impl IntoView {
    let sanitize = Callback::new(move |_: ()| {
        value.set(bounds.sanitize(&value.get_untracked()).to_string());
    });

    view! {
        <div class="flex flex-col gap-1.5">
            <Label html_for=id class="text-xs">{label}</Label>
            <div class="flex items-center gap-3">
                <input
                    r#type="range"
                    class="flex-1 accent-primary"
                    min=bounds.min.to_string()
                    max=bounds.max.to_string()
                    step="1"
                    aria-label=label
                    prop:value=move || value.get()
                    on:input=move |ev| value.set(event_target_value(&ev))
                />
                <Input
                    id=id
                    class="h-8 w-20 text-sm"
                    placeholder=format!("{}-{}", bounds.min, bounds.max)
                    bind_value=value
                    on_blur=sanitize
                />
            </div>
        </div>
    }
}

/// Select labels for every variant, in declaration order. Each label parses
/// back to its variant in [`CriteriaForm::to_criteria`].
pub(crate) fn choices<E: IntoEnumIterator + std::fmt::Display>() -> Vec<String> {
    E::iter().map(|e| e.to_string()).collect()
}

#[component]
fn OptionSelect(
    id: &'static str,
    label: &'static str,
    options: Vec<String>,
    value: RwSignal<String>,
) -> impl IntoView {
    view! {
        <div class="flex flex-col gap-1.5">
            <Label html_for=id class="text-xs">{label}</Label>
            <select id=id class=SELECT_CLASS on:change=move |ev| value.set(event_target_value(&ev))>
                {options
                    .into_iter()
                    .map(|option| {
                        let attr_value = option.clone();
                        let current = option.clone();
                        view! {
                            <option value=attr_value selected=move || value.get() == current>
                                {option}
                            </option>
                        }
                    })
                    .collect_view()}
            </select>
        </div>
    }
}

#[component]
fn CompoundCard(rank: usize, compound: Compound) -> impl IntoView {
    let p = compound.properties;
    view! {
        <Card class="gap-3 py-4">
            <CardHeader class="px-4">
                <div class="flex w-full items-center justify-between gap-2">
                    <Badge>{format!("#{rank}")}</Badge>
                    <code class="truncate text-xs text-muted-foreground">{compound.formula}</code>
                </div>
                <CardTitle class="text-sm">{compound.name}</CardTitle>
            </CardHeader>
            <CardContent class="flex flex-col gap-3 px-4">
                <div class="grid grid-cols-2 gap-x-4 gap-y-1">
                    <PropertyRow label="μ" value=format!("{:.2} D", p.mu) />
                    <PropertyRow label="α" value=format!("{:.2} a₀³", p.alpha) />
                    <PropertyRow label="Gap" value=format!("{:.2} eV", p.gap) />
                    <PropertyRow label="Cv" value=format!("{:.2} cal/mol·K", p.cv) />
                </div>
                <div class="text-xs">
                    <span class="font-medium">"AI Justification: "</span>
                    <span class="text-muted-foreground">{compound.justification}</span>
                </div>
            </CardContent>
        </Card>
    }
}

#[component]
fn Results(state: DiscoveryState) -> impl IntoView {
    match state {
        DiscoveryState::Idle => view! {
            <EmptyState>
                <h3 class="text-sm font-medium">"No Results Yet"</h3>
                <p class="text-xs text-muted-foreground">
                    "Define your criteria and click \"Generate Compounds\" to start discovery."
                </p>
            </EmptyState>
        }
        .into_any(),
        DiscoveryState::Submitting { elapsed } => view! {
            <EmptyState>
                <Spinner class="size-6" />
                <p class="text-sm">"AI agents are working..."</p>
                <ul class="flex flex-col gap-1 text-xs text-muted-foreground">
                    <li>"Generative agent: creating candidates"</li>
                    <li>"Predictive agent: analyzing properties"</li>
                    <li>"Evaluation agent: ranking results"</li>
                </ul>
                <span class="font-mono text-xs">{elapsed}</span>
            </EmptyState>
        }
        .into_any(),
        DiscoveryState::Failed { message } => view! {
            <Alert class="border-destructive/30">
                <AlertTitle class="text-destructive">"Error"</AlertTitle>
                <AlertDescription class="text-destructive text-xs">{message}</AlertDescription>
            </Alert>
        }
        .into_any(),
        DiscoveryState::Succeeded { run } if run.results.is_empty() => view! {
            <EmptyState>
                <h3 class="text-sm font-medium">"No matching compounds"</h3>
                <p class="text-xs text-muted-foreground">"Try widening your criteria and generate again."</p>
            </EmptyState>
        }
        .into_any(),
        DiscoveryState::Succeeded { run } => {
            let count = run.results.len();
            let took = run.duration.clone().unwrap_or_default();
            view! {
                <div class="flex flex-col gap-4">
                    <div class="flex items-baseline justify-between">
                        <h2 class="text-lg font-semibold">"Discovery Results"</h2>
                        <span class="text-xs text-muted-foreground">
                            {format!("Found {count} candidate compounds in {took}")}
                        </span>
                    </div>
                    <div class="grid gap-4 md:grid-cols-2">
                        {run
                            .results
                            .into_iter()
                            .enumerate()
                            .map(|(i, compound)| view! { <CompoundCard rank=i + 1 compound=compound /> })
                            .collect_view()}
                    </div>
                </div>
            }
            .into_any()
        }
    }
}

#[component]
pub fn DiscoveryView() -> impl IntoView {
    let ctx = expect_context::<AppContext>();
    let model = use_page_model(select);

    let initial = model
        .get_untracked()
        .map(|m| m.form)
        .unwrap_or_else(|| CriteriaForm::from(&Criteria::default()));
    let boiling_point = RwSignal::new(initial.boiling_point);
    let viscosity = RwSignal::new(initial.viscosity);
    let stability = RwSignal::new(initial.stability);
    let solubility = RwSignal::new(initial.solubility);

    let greeting = move || {
        let name = model
            .with(|m| m.as_ref().and_then(|m| m.user_name.clone()))
            .unwrap_or_else(|| "Researcher".to_string());
        format!("Welcome, {name}! Define your criteria and let the agents discover candidate compounds.")
    };
    let submitting = move || {
        model.with(|m| {
            matches!(
                m.as_ref().map(|m| &m.state),
                Some(DiscoveryState::Submitting { .. })
            )
        })
    };
    let state = Memo::new(move |_| model.with(|m| m.as_ref().map(|m| m.state.clone())));

    let on_submit = move |ev: web_sys::SubmitEvent| {
        ev.prevent_default();
        let ctx = ctx.clone();
        let form = CriteriaForm {
            boiling_point: boiling_point.get_untracked(),
            viscosity: viscosity.get_untracked(),
            stability: stability.get_untracked(),
            solubility: solubility.get_untracked(),
        };
        // Show what is actually sent.
        let sent = form.to_criteria();
        boiling_point.set(sent.boiling_point.to_string());
        viscosity.set(sent.viscosity.to_string());
        spawn_local(async move {
            ctx.router.table().discovery.submit(&form).await;
        });
    };

    view! {
        <div class="flex flex-col gap-6">
            <div class="flex flex-col gap-1">
                <h1 class="text-2xl font-semibold tracking-tight">"Chemical Discovery Portal"</h1>
                <p class="text-sm text-muted-foreground">{greeting}</p>
            </div>

            <div class="grid gap-6 lg:grid-cols-[20rem_1fr]">
                <Card class="h-fit">
                    <CardHeader>
                        <CardTitle class="text-sm">"Define Criteria"</CardTitle>
                    </CardHeader>
                    <CardContent>
                        <form class="flex flex-col gap-4" on:submit=on_submit>
                            <CriterionSlider
                                id="boiling-point"
                                label="Boiling Point (°C)"
                                bounds=FieldBounds::BOILING_POINT
                                value=boiling_point
                            />
                            <CriterionSlider
                                id="viscosity"
                                label="Viscosity (cP)"
                                bounds=FieldBounds::VISCOSITY
                                value=viscosity
                            />
                            <OptionSelect
                                id="stability"
                                label="Target Stability"
                                options={choices::<Stability>()}
                                value=stability
                            />
                            <OptionSelect
                                id="solubility"
                                label="Solubility Requirement"
                                options={choices::<Solubility>()}
                                value=solubility
                            />
                            <Button class="w-full" attr:disabled=submitting>
                                {move || if submitting() { "Generating..." } else { "Generate Compounds" }}
                            </Button>
                        </form>
                    </CardContent>
                </Card>

                <section>
                    {move || state.get().map(|state| view! { <Results state=state /> })}
                </section>
            </div>
        </div>
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pages::testing::{compounds, harness, logged_in_at, Gate, Harness, StubGenerator};
    use futures::executor::block_on;
    use futures::task::noop_waker_ref;
    use std::future::Future;
    use std::pin::pin;
    use std::task::{Context, Poll};

    fn model(h: &Harness<StubGenerator>) -> DiscoveryModel {
        match h.mount.markup() {
            Some(PageMarkup::Discovery(m)) => m,
            other => panic!("expected discovery markup, got {other:?}"),
        }
    }

    fn scenario_form() -> CriteriaForm {
        CriteriaForm {
            boiling_point: "100".to_string(),
            viscosity: "45".to_string(),
            stability: "High".to_string(),
            solubility: "Organic-soluble".to_string(),
        }
    }

    #[test]
    fn test_renders_idle_with_defaults() {
        let h = logged_in_at("#/discovery");
        let m = model(&h);
        assert_eq!(m.state, DiscoveryState::Idle);
        assert_eq!(m.user_name.as_deref(), Some("Ada"));
        assert_eq!(m.form.to_criteria(), Criteria::default());
    }

    #[test]
    fn test_unauthenticated_render_redirects_to_login() {
        let h = harness("#/discovery");
        assert_eq!(
            block_on(h.pages().discovery.render_markup()),
            Rendered::Redirect(AppRoute::Login)
        );
    }

    #[test]
    fn test_successful_submission_saves_exactly_one_run() {
        let h = logged_in_at("#/discovery");
        h.generator.respond(Ok(compounds(4)));
        let before = now_ms();

        let outcome = block_on(h.pages().discovery.submit(&scenario_form()));
        let SubmitOutcome::Saved(run) = outcome else {
            panic!("expected a saved run, got {outcome:?}");
        };

        let all = block_on(h.store.get_all()).expect("all");
        assert_eq!(all, vec![run.clone()]);
        assert_eq!(run.results.len(), 4);
        assert!(run.timestamp >= before);
        assert!(run.duration.is_some());
        assert_eq!(run.criteria.stability, Stability::High);
        assert_eq!(model(&h).state, DiscoveryState::Succeeded { run });
    }

    #[test]
    fn test_failed_generation_saves_nothing() {
        let h = logged_in_at("#/discovery");
        h.generator.fail();

        let outcome = block_on(h.pages().discovery.submit(&scenario_form()));
        assert_eq!(outcome, SubmitOutcome::Failed(GENERATION_FAILED.to_string()));
        assert!(block_on(h.store.get_all()).expect("all").is_empty());
        assert_eq!(
            model(&h).state,
            DiscoveryState::Failed {
                message: GENERATION_FAILED.to_string()
            }
        );
    }

    #[test]
    fn test_store_failure_becomes_failed_state() {
        let h = logged_in_at("#/discovery");
        h.storage.set_reject_writes(true);

        let outcome = block_on(h.pages().discovery.submit(&scenario_form()));
        assert_eq!(outcome, SubmitOutcome::Failed(SAVE_FAILED.to_string()));
        assert!(matches!(model(&h).state, DiscoveryState::Failed { .. }));
        h.storage.set_reject_writes(false);
        assert!(block_on(h.store.get_all()).expect("all").is_empty());
    }

    #[test]
    fn test_zero_results_is_a_valid_run() {
        let h = logged_in_at("#/discovery");
        h.generator.respond(Ok(Vec::new()));
        let outcome = block_on(h.pages().discovery.submit(&scenario_form()));
        assert!(matches!(outcome, SubmitOutcome::Saved(ref run) if run.results.is_empty()));
    }

    #[test]
    fn test_out_of_range_input_is_clamped_before_sending() {
        let h = logged_in_at("#/discovery");
        let form = CriteriaForm {
            boiling_point: "900".to_string(),
            viscosity: "thick".to_string(),
            ..scenario_form()
        };
        block_on(h.pages().discovery.submit(&form));

        let seen = h.generator.seen.lock().expect("seen").clone();
        assert_eq!(seen[0].boiling_point, 200.0);
        assert_eq!(seen[0].viscosity, 45.0);
        assert_eq!(model(&h).form.boiling_point, "200");
    }

    #[test]
    fn test_every_select_choice_is_sent_as_chosen() {
        assert_eq!(choices::<Stability>(), vec!["Low", "Medium", "High"]);
        assert_eq!(
            choices::<Solubility>(),
            vec!["Water-soluble", "Organic-soluble", "Both"]
        );

        for (stability, solubility) in choices::<Stability>()
            .into_iter()
            .zip(choices::<Solubility>())
        {
            let form = CriteriaForm {
                stability: stability.clone(),
                solubility: solubility.clone(),
                ..scenario_form()
            };
            let sent = form.to_criteria();
            assert_eq!(sent.stability.to_string(), stability);
            assert_eq!(sent.solubility.to_string(), solubility);
        }
    }

    #[test]
    fn test_ticker_runs_while_pending_and_stops_after() {
        let h = logged_in_at("#/discovery");
        let gate = Gate::closed();
        h.generator.respond_after(gate.clone(), Ok(compounds(1)));

        let form = scenario_form();
        let mut cx = Context::from_waker(noop_waker_ref());
        let mut pending = pin!(h.pages().discovery.submit(&form));
        assert!(pending.as_mut().poll(&mut cx).is_pending());

        assert_eq!(h.intervals.active(), 1);
        h.intervals.fire();
        assert!(matches!(model(&h).state, DiscoveryState::Submitting { .. }));

        gate.open();
        assert!(matches!(pending.as_mut().poll(&mut cx), Poll::Ready(SubmitOutcome::Saved(_))));
        assert_eq!(h.intervals.active(), 0);
    }

    #[test]
    fn test_ticker_stops_on_failure_too() {
        let h = logged_in_at("#/discovery");
        h.generator.fail();
        block_on(h.pages().discovery.submit(&scenario_form()));
        assert_eq!(h.intervals.started(), 1);
        assert_eq!(h.intervals.active(), 0);
    }

    #[test]
    fn test_newer_submission_supersedes_older() {
        let h = logged_in_at("#/discovery");
        let slow = Gate::closed();
        h.generator.respond_after(slow.clone(), Ok(compounds(5)));
        h.generator.respond(Ok(compounds(2)));

        let form = scenario_form();
        let mut cx = Context::from_waker(noop_waker_ref());
        let mut first = pin!(h.pages().discovery.submit(&form));
        assert!(first.as_mut().poll(&mut cx).is_pending());

        let second = block_on(h.pages().discovery.submit(&form));
        assert!(matches!(second, SubmitOutcome::Saved(ref run) if run.results.len() == 2));

        slow.open();
        assert_eq!(first.as_mut().poll(&mut cx), Poll::Ready(SubmitOutcome::Superseded));

        let all = block_on(h.store.get_all()).expect("all");
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].results.len(), 2);
        assert!(matches!(
            model(&h).state,
            DiscoveryState::Succeeded { ref run } if run.results.len() == 2
        ));
        assert_eq!(h.intervals.active(), 0);
    }

    #[test]
    fn test_run_finishing_after_navigation_is_saved_but_not_shown() {
        let h = logged_in_at("#/discovery");
        let gate = Gate::closed();
        h.generator.respond_after(gate.clone(), Ok(compounds(3)));

        let form = scenario_form();
        let mut cx = Context::from_waker(noop_waker_ref());
        let mut pending = pin!(h.pages().discovery.submit(&form));
        assert!(pending.as_mut().poll(&mut cx).is_pending());

        h.navigator.set_fragment("#/about");
        block_on(h.router.render_page());

        gate.open();
        assert!(matches!(pending.as_mut().poll(&mut cx), Poll::Ready(SubmitOutcome::Saved(_))));
        assert_eq!(block_on(h.store.get_all()).expect("all").len(), 1);
        assert!(matches!(h.mount.markup(), Some(PageMarkup::Static(_))));
        assert_eq!(h.intervals.active(), 0);
    }

    #[test]
    fn test_scenario_run_is_listed_first_in_history() {
        let h = logged_in_at("#/discovery");
        block_on(h.store.save(NewDiscoveryRun {
            timestamp: 1,
            criteria: Criteria::default(),
            results: Vec::new(),
            duration: None,
        }))
        .expect("seed older run");
        h.generator.respond(Ok(compounds(6)));

        block_on(h.pages().discovery.submit(&scenario_form()));

        let listed = block_on(h.store.list_newest_first()).expect("list");
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].results.len(), 6);
        assert_eq!(listed[0].criteria, scenario_form().to_criteria());
    }

    #[test]
    fn test_submit_before_activation_is_unbound() {
        let h = harness("#/discovery");
        assert_eq!(
            block_on(h.pages().discovery.submit(&scenario_form())),
            SubmitOutcome::Unbound
        );
    }
}
