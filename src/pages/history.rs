use super::{use_page_model, BoundRoot, Page, PageMarkup, Rendered};
use crate::components::ui::{
    Alert, AlertDescription, Button, ButtonSize, ButtonVariant, Card, CardContent, CardHeader,
    CardTitle, EmptyState, LinkButton,
};
use crate::models::{Criteria, DiscoveryRun};
use crate::router::RootHandle;
use crate::routes::AppRoute;
use crate::session::Session;
use crate::state::AppContext;
use crate::storage::{RunStore, StorageError};
use crate::util::format_timestamp;
use icons::X;
use leptos::logging::{error, log};
use leptos::prelude::*;
use leptos::task::spawn_local;
use std::sync::Mutex;

/// Compounds shown per card before collapsing into "+N more".
pub(crate) const PREVIEW_LIMIT: usize = 3;

const LOAD_FAILED: &str = "Could not load your discovery history.";
const DELETE_FAILED: &str = "Failed to delete session. Please try again.";

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct PreviewItem {
    pub rank: usize,
    pub name: String,
    pub formula: String,
}

/// One history card.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct RunSummary {
    pub id: u64,
    /// Newest run carries the highest number.
    pub session_number: usize,
    pub date: String,
    pub criteria: Criteria,
    pub result_count: usize,
    pub preview: Vec<PreviewItem>,
    pub more: usize,
    pub duration: Option<String>,
}

impl RunSummary {
    fn new(run: &DiscoveryRun, session_number: usize) -> Self {
        let result_count = run.results.len();
        Self {
            id: run.id,
            session_number,
            date: format_timestamp(run.timestamp),
            criteria: run.criteria.clone(),
            result_count,
            preview: run
                .results
                .iter()
                .take(PREVIEW_LIMIT)
                .enumerate()
                .map(|(i, c)| PreviewItem {
                    rank: i + 1,
                    name: c.name.clone(),
                    formula: c.formula.clone(),
                })
                .collect(),
            more: result_count.saturating_sub(PREVIEW_LIMIT),
            duration: run.duration.clone(),
        }
    }
}

/// Cards for runs already sorted newest first.
pub(crate) fn summarize(runs: &[DiscoveryRun]) -> Vec<RunSummary> {
    let total = runs.len();
    runs.iter()
        .enumerate()
        .map(|(i, run)| RunSummary::new(run, total - i))
        .collect()
}

/// A destructive action waiting for the user to confirm it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum PendingAction {
    Delete(u64),
    ClearAll,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct HistoryModel {
    pub runs: Vec<RunSummary>,
    pub pending: Option<PendingAction>,
    pub busy: bool,
    pub error: Option<String>,
}

pub(crate) struct HistoryPage {
    session: Session,
    store: RunStore,
    root: BoundRoot,
    pending: Mutex<Option<PendingAction>>,
}

fn edit(root: &RootHandle, f: impl FnOnce(&mut HistoryModel)) {
    root.update(|markup| {
        if let PageMarkup::History(m) = markup {
            f(m);
        }
    });
}

impl HistoryPage {
    pub fn new(session: Session, store: RunStore) -> Self {
        Self {
            session,
            store,
            root: BoundRoot::default(),
            pending: Mutex::new(None),
        }
    }

    async fn load(&self) -> Result<Vec<RunSummary>, StorageError> {
        let runs = self.store.list_newest_first().await?;
        Ok(summarize(&runs))
    }

    fn set_pending(&self, action: Option<PendingAction>) {
        if let Ok(mut slot) = self.pending.lock() {
            *slot = action;
        }
        if let Some(root) = self.root.get() {
            edit(&root, |m| m.pending = action);
        }
    }

    fn take_pending(&self) -> Option<PendingAction> {
        self.pending.lock().ok().and_then(|mut slot| slot.take())
    }

    pub fn request_delete(&self, id: u64) {
        self.set_pending(Some(PendingAction::Delete(id)));
    }

    pub fn request_clear(&self) {
        self.set_pending(Some(PendingAction::ClearAll));
    }

    pub fn cancel(&self) {
        self.set_pending(None);
    }

    /// Carries out the pending action, then reloads the full list. Does
    /// nothing when no action is waiting for confirmation.
    pub async fn confirm(&self) -> bool {
        let Some(root) = self.root.get() else {
            return false;
        };
        let Some(action) = self.take_pending() else {
            return false;
        };
        edit(&root, |m| {
            m.pending = None;
            m.busy = true;
        });

        let done = match action {
            PendingAction::Delete(id) => self.store.delete(id).await,
            PendingAction::ClearAll => self.store.clear().await,
        };
        if let Err(e) = &done {
            error!("[history] {action:?} failed: {e}");
        } else {
            log!("[history] {action:?} done");
        }

        let reloaded = self.load().await;
        edit(&root, |m| {
            m.busy = false;
            m.error = match (&done, &reloaded) {
                (Err(_), _) => Some(DELETE_FAILED.to_string()),
                (_, Err(_)) => Some(LOAD_FAILED.to_string()),
                _ => None,
            };
            if let Ok(runs) = reloaded {
                m.runs = runs;
            }
        });
        done.is_ok()
    }
}

impl Page for HistoryPage {
    async fn render_markup(&self) -> Rendered {
        if !self.session.is_authenticated() {
            return Rendered::Redirect(AppRoute::Login);
        }
        if let Ok(mut slot) = self.pending.lock() {
            *slot = None;
        }
        let model = match self.load().await {
            Ok(runs) => HistoryModel {
                runs,
                ..HistoryModel::default()
            },
            Err(e) => {
                error!("[history] load failed: {e}");
                HistoryModel {
                    error: Some(LOAD_FAILED.to_string()),
                    ..HistoryModel::default()
                }
            }
        };
        Rendered::Markup(PageMarkup::History(model))
    }

    async fn activate(&self, root: RootHandle) {
        self.root.bind(root);
    }
}

// ============================================================================
// View
// ============================================================================

fn select(markup: &PageMarkup) -> Option<&HistoryModel> {
    match markup {
        PageMarkup::History(m) => Some(m),
        _ => None,
    }
}

fn run_confirm(ctx: &AppContext) {
    let ctx = ctx.clone();
    spawn_local(async move {
        ctx.router.table().history.confirm().await;
    });
}

#[component]
fn ConfirmBar(message: &'static str, busy: bool) -> impl IntoView {
    let ctx = expect_context::<AppContext>();
    let cancel_ctx = ctx.clone();

    view! {
        <div class="flex items-center justify-between gap-3 rounded-md border border-destructive/30 px-3 py-2 text-xs">
            <span>{message}</span>
            <div class="flex items-center gap-2">
                <Button
                    size=ButtonSize::Sm
                    variant=ButtonVariant::Ghost
                    on:click=move |_| cancel_ctx.router.table().history.cancel()
                >
                    "Cancel"
                </Button>
                <Button
                    size=ButtonSize::Sm
                    variant=ButtonVariant::Destructive
                    attr:disabled=busy
                    on:click=move |_| run_confirm(&ctx)
                >
                    "Delete"
                </Button>
            </div>
        </div>
    }
}

#[component]
fn RunCard(summary: RunSummary, confirming: bool, busy: bool) -> impl IntoView {
    let ctx = expect_context::<AppContext>();
    let id = summary.id;
    let c = summary.criteria;

    view! {
        <Card class="gap-3 py-4">
            <CardHeader class="px-4">
                <div class="flex w-full items-start justify-between gap-2">
                    <div class="flex flex-col gap-1">
                        <CardTitle class="text-sm">{format!("Discovery Session #{}", summary.session_number)}</CardTitle>
                        <span class="text-xs text-muted-foreground">{summary.date}</span>
                    </div>
                    <Button
                        size=ButtonSize::Icon
                        variant=ButtonVariant::Ghost
                        attr:aria-label="Delete session"
                        on:click=move |_| ctx.router.table().history.request_delete(id)
                    >
                        <X />
                    </Button>
                </div>
            </CardHeader>
            <CardContent class="flex flex-col gap-3 px-4 text-xs">
                <div class="grid grid-cols-2 gap-1">
                    <span>{format!("Boiling Point: {}°C", c.boiling_point)}</span>
                    <span>{format!("Viscosity: {} cP", c.viscosity)}</span>
                    <span>{format!("Stability: {}", c.stability)}</span>
                    <span>{format!("Solubility: {}", c.solubility)}</span>
                </div>

                <div class="flex flex-col gap-1">
                    <span class="font-medium">{format!("Results: {} compounds", summary.result_count)}</span>
                    {if summary.preview.is_empty() {
                        view! { <p class="text-muted-foreground">"No results available"</p> }.into_any()
                    } else {
                        view! {
                            <ul class="flex flex-col gap-0.5">
                                {summary
                                    .preview
                                    .into_iter()
                                    .map(|p| view! {
                                        <li class="flex gap-2">
                                            <span class="text-muted-foreground">{format!("#{}", p.rank)}</span>
                                            <span>{p.name}</span>
                                            <code class="truncate text-muted-foreground">{p.formula}</code>
                                        </li>
                                    })
                                    .collect_view()}
                            </ul>
                        }
                        .into_any()
                    }}
                    {(summary.more > 0)
                        .then(|| view! { <p class="text-muted-foreground">{format!("+{} more...", summary.more)}</p> })}
                </div>

                {summary.duration.map(|d| view! { <span class="text-muted-foreground">{format!("Duration: {d}")}</span> })}

                {confirming.then(|| view! {
                    <ConfirmBar message="Are you sure you want to delete this discovery session?" busy=busy />
                })}
            </CardContent>
        </Card>
    }
}

#[component]
pub fn HistoryView() -> impl IntoView {
    let ctx = expect_context::<AppContext>();
    let model = use_page_model(select);

    move || {
        let Some(m) = model.get() else {
            return ().into_any();
        };
        let ctx = ctx.clone();
        let has_runs = !m.runs.is_empty();

        let body = if !has_runs {
            view! {
                <EmptyState>
                    <h3 class="text-sm font-medium">"No Discovery Sessions Yet"</h3>
                    <p class="text-xs text-muted-foreground">"Your discovery history will appear here."</p>
                    <LinkButton attr:href=AppRoute::Discovery.fragment()>"Start Discovery"</LinkButton>
                </EmptyState>
            }
            .into_any()
        } else {
            let pending = m.pending;
            let busy = m.busy;
            view! {
                <div class="flex flex-col gap-4">
                    {m.runs
                        .into_iter()
                        .map(|summary| {
                            let confirming = pending == Some(PendingAction::Delete(summary.id));
                            view! { <RunCard summary=summary confirming=confirming busy=busy /> }
                        })
                        .collect_view()}
                </div>
            }
            .into_any()
        };

        view! {
            <div class="flex flex-col gap-6">
                <div class="flex items-end justify-between gap-4">
                    <div class="flex flex-col gap-1">
                        <h1 class="text-2xl font-semibold tracking-tight">"Discovery History"</h1>
                        <p class="text-sm text-muted-foreground">"Review your previous chemical discovery sessions"</p>
                    </div>
                    {has_runs.then(|| view! {
                        <Button
                            size=ButtonSize::Sm
                            variant=ButtonVariant::Outline
                            on:click=move |_| ctx.router.table().history.request_clear()
                        >
                            "Clear all"
                        </Button>
                    })}
                </div>

                {(m.pending == Some(PendingAction::ClearAll)).then(|| view! {
                    <ConfirmBar message="Delete every discovery session? This cannot be undone." busy=m.busy />
                })}

                {m.error.map(|e| view! {
                    <Alert class="border-destructive/30">
                        <AlertDescription class="text-destructive text-xs">{e}</AlertDescription>
                    </Alert>
                })}

                {body}
            </div>
        }
        .into_any()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Compound, NewDiscoveryRun, PredictedProperties};
    use crate::pages::testing::{compounds, harness, logged_in_at, Harness, StubGenerator};
    use crate::storage::KeyValueBackend;
    use futures::executor::block_on;

    fn seed(h: &Harness<StubGenerator>, timestamp: i64, results: usize) -> DiscoveryRun {
        block_on(h.store.save(NewDiscoveryRun {
            timestamp,
            criteria: Criteria::default(),
            results: compounds(results),
            duration: Some("1.0s".to_string()),
        }))
        .expect("seed")
    }

    fn model(h: &Harness<StubGenerator>) -> HistoryModel {
        match h.mount.markup() {
            Some(PageMarkup::History(m)) => m,
            other => panic!("expected history markup, got {other:?}"),
        }
    }

    fn open_history(h: &Harness<StubGenerator>) {
        h.session.set_session("tok", "Ada").expect("session");
        h.navigator.set_fragment("#/history");
        block_on(h.router.render_page());
    }

    #[test]
    fn test_lists_newest_first_with_descending_session_numbers() {
        let h = harness("");
        let a = seed(&h, 200, 1);
        let b = seed(&h, 100, 1);
        let c = seed(&h, 300, 1);
        open_history(&h);

        let runs = model(&h).runs;
        let ids: Vec<u64> = runs.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![c.id, a.id, b.id]);
        let numbers: Vec<usize> = runs.iter().map(|r| r.session_number).collect();
        assert_eq!(numbers, vec![3, 2, 1]);
    }

    #[test]
    fn test_preview_is_truncated_to_three() {
        let h = harness("");
        seed(&h, 1, 5);
        seed(&h, 2, 0);
        seed(&h, 3, 3);
        open_history(&h);

        let runs = model(&h).runs;
        assert_eq!(runs[0].preview.len(), 3);
        assert_eq!(runs[0].more, 0);
        assert_eq!(runs[1].result_count, 0);
        assert!(runs[1].preview.is_empty());
        assert_eq!(runs[2].preview.len(), 3);
        assert_eq!(runs[2].more, 2);
        assert_eq!(runs[2].preview[2].rank, 3);
    }

    #[test]
    fn test_delete_needs_confirmation() {
        let h = harness("");
        let run = seed(&h, 1, 1);
        open_history(&h);
        let page = &h.pages().history;

        // Nothing requested: confirming does not touch the store.
        assert!(!block_on(page.confirm()));
        assert_eq!(block_on(h.store.get_all()).expect("all").len(), 1);

        page.request_delete(run.id);
        assert_eq!(model(&h).pending, Some(PendingAction::Delete(run.id)));
        page.cancel();
        assert_eq!(model(&h).pending, None);
        assert!(!block_on(page.confirm()));
        assert_eq!(block_on(h.store.get_all()).expect("all").len(), 1);
    }

    #[test]
    fn test_confirmed_delete_removes_only_that_run_and_reloads() {
        let h = harness("");
        let a = seed(&h, 1, 1);
        let b = seed(&h, 2, 1);
        open_history(&h);
        let page = &h.pages().history;

        page.request_delete(a.id);
        assert!(block_on(page.confirm()));

        let m = model(&h);
        assert_eq!(m.runs.len(), 1);
        assert_eq!(m.runs[0].id, b.id);
        assert_eq!(m.runs[0].session_number, 1);
        assert!(m.pending.is_none());
        assert!(!m.busy);
        assert!(m.error.is_none());
    }

    #[test]
    fn test_deleting_missing_id_is_treated_as_success() {
        let h = harness("");
        seed(&h, 1, 1);
        open_history(&h);
        let page = &h.pages().history;

        page.request_delete(999);
        assert!(block_on(page.confirm()));
        let m = model(&h);
        assert_eq!(m.runs.len(), 1);
        assert!(m.error.is_none());
    }

    #[test]
    fn test_deleting_last_run_shows_empty_state() {
        let h = harness("");
        let only = seed(&h, 1, 2);
        open_history(&h);
        let page = &h.pages().history;

        page.request_delete(only.id);
        assert!(block_on(page.confirm()));
        let m = model(&h);
        assert!(m.runs.is_empty());
        assert!(m.error.is_none());
    }

    #[test]
    fn test_clear_all_after_confirmation() {
        let h = harness("");
        seed(&h, 1, 1);
        seed(&h, 2, 1);
        open_history(&h);
        let page = &h.pages().history;

        page.request_clear();
        assert_eq!(model(&h).pending, Some(PendingAction::ClearAll));
        assert!(block_on(page.confirm()));
        assert!(model(&h).runs.is_empty());
        assert!(block_on(h.store.get_all()).expect("all").is_empty());
    }

    #[test]
    fn test_failed_delete_surfaces_error_and_keeps_list() {
        let h = harness("");
        let run = seed(&h, 1, 1);
        open_history(&h);
        let page = &h.pages().history;

        h.storage.set_reject_writes(true);
        page.request_delete(run.id);
        assert!(!block_on(page.confirm()));
        let m = model(&h);
        assert_eq!(m.error.as_deref(), Some(DELETE_FAILED));
        assert_eq!(m.runs.len(), 1);
    }

    #[test]
    fn test_corrupt_store_renders_load_error() {
        let h = harness("");
        h.storage
            .set(crate::storage::RUNS_KEY, "{not json")
            .expect("seed");
        open_history(&h);
        let m = model(&h);
        assert_eq!(m.error.as_deref(), Some(LOAD_FAILED));
        assert!(m.runs.is_empty());
    }

    #[test]
    fn test_unauthenticated_render_redirects() {
        let h = harness("#/history");
        assert_eq!(
            block_on(h.pages().history.render_markup()),
            Rendered::Redirect(AppRoute::Login)
        );
    }

    #[test]
    fn test_summary_fields() {
        let run = DiscoveryRun {
            id: 7,
            timestamp: 42,
            criteria: Criteria::default(),
            results: vec![Compound {
                name: "Ethanol Derivative 1".to_string(),
                formula: "C2H7O2".to_string(),
                properties: PredictedProperties::default(),
                justification: String::new(),
            }],
            duration: None,
        };
        let s = &summarize(std::slice::from_ref(&run))[0];
        assert_eq!(s.session_number, 1);
        assert_eq!(s.result_count, 1);
        assert_eq!(s.preview[0].formula, "C2H7O2");
        assert!(s.duration.is_none());
    }

    #[test]
    fn test_history_after_discovery_run() {
        let h = logged_in_at("#/discovery");
        h.generator.respond(Ok(compounds(4)));
        block_on(h.pages().discovery.submit(&crate::models::CriteriaForm::from(
            &Criteria::default(),
        )));

        h.navigator.set_fragment("#/history");
        block_on(h.router.render_page());
        let m = model(&h);
        assert_eq!(m.runs.len(), 1);
        assert_eq!(m.runs[0].result_count, 4);
        assert_eq!(m.runs[0].criteria, Criteria::default());
    }
}
