use super::{use_page_model, BoundRoot, Page, PageMarkup, Rendered};
use crate::api::{ApiError, AuthService};
use crate::components::ui::{
    Alert, AlertDescription, Button, ButtonSize, Card, CardContent, CardDescription, CardHeader,
    CardTitle, Input, Label, Spinner,
};
use crate::router::{NavigatorHandle, RootHandle};
use crate::routes::AppRoute;
use crate::session::Session;
use crate::state::AppContext;
use leptos::logging::{log, warn};
use leptos::prelude::*;
use leptos::task::spawn_local;

#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct LoginModel {
    pub pending: bool,
    pub error: Option<String>,
}

pub(crate) struct LoginPage {
    session: Session,
    auth: AuthService,
    navigator: NavigatorHandle,
    root: BoundRoot,
}

fn edit(root: &RootHandle, f: impl FnOnce(&mut LoginModel)) {
    root.update(|markup| {
        if let PageMarkup::Login(m) = markup {
            f(m);
        }
    });
}

/// Message shown for a failed auth call.
pub(super) fn failure_message(err: &ApiError, fallback: &str) -> String {
    match err {
        ApiError::Service(message) => message.clone(),
        _ => fallback.to_string(),
    }
}

impl LoginPage {
    pub fn new(session: Session, auth: AuthService, navigator: NavigatorHandle) -> Self {
        Self {
            session,
            auth,
            navigator,
            root: BoundRoot::default(),
        }
    }

    /// Logs in and moves on to discovery. Returns whether the session was
    /// established.
    pub async fn submit(&self, email: &str, password: &str) -> bool {
        let Some(root) = self.root.get() else {
            return false;
        };
        edit(&root, |m| {
            m.pending = true;
            m.error = None;
        });

        let result = self.auth.login(email.trim(), password).await;
        let error = match result {
            Ok(login) => match self.session.set_session(&login.token, &login.name) {
                Ok(()) => {
                    log!("[auth] logged in as {}", login.name);
                    self.navigator.assign(AppRoute::Discovery);
                    return true;
                }
                Err(e) => {
                    warn!("[session] could not store session: {e}");
                    "Could not start a session in this browser.".to_string()
                }
            },
            Err(e) => {
                warn!("[auth] login failed: {e}");
                failure_message(&e, "Login failed. Please try again.")
            }
        };

        edit(&root, |m| {
            m.pending = false;
            m.error = Some(error);
        });
        false
    }
}

impl Page for LoginPage {
    async fn render_markup(&self) -> Rendered {
        Rendered::Markup(PageMarkup::Login(LoginModel::default()))
    }

    async fn activate(&self, root: RootHandle) {
        self.root.bind(root);
    }
}

fn select(markup: &PageMarkup) -> Option<&LoginModel> {
    match markup {
        PageMarkup::Login(m) => Some(m),
        _ => None,
    }
}

#[component]
pub fn LoginView() -> impl IntoView {
    let ctx = expect_context::<AppContext>();
    let model = use_page_model(select);
    let email: RwSignal<String> = RwSignal::new(String::new());
    let password: RwSignal<String> = RwSignal::new(String::new());

    let pending = move || model.with(|m| m.as_ref().is_some_and(|m| m.pending));
    let error = move || model.with(|m| m.as_ref().and_then(|m| m.error.clone()));

    let on_submit = move |ev: web_sys::SubmitEvent| {
        ev.prevent_default();
        let ctx = ctx.clone();
        let email_val = email.get_untracked();
        let password_val = password.get_untracked();
        spawn_local(async move {
            ctx.router.table().login.submit(&email_val, &password_val).await;
        });
    };

    view! {
        <div class="mx-auto flex w-full max-w-sm flex-col justify-center py-10">
            <Card>
                <CardHeader>
                    <CardTitle class="text-lg">"Login"</CardTitle>
                    <CardDescription class="text-xs">"Access the Chemical Discovery Portal"</CardDescription>
                </CardHeader>

                <CardContent>
                    <form class="flex flex-col gap-3" on:submit=on_submit>
                        <div class="flex flex-col gap-1.5">
                            <Label html_for="email" class="text-xs">"Email"</Label>
                            <Input
                                id="email"
                                r#type="email"
                                placeholder="you@example.com"
                                bind_value=email
                                required=true
                                class="h-8 text-sm"
                            />
                        </div>

                        <div class="flex flex-col gap-1.5">
                            <Label html_for="password" class="text-xs">"Password"</Label>
                            <Input
                                id="password"
                                r#type="password"
                                placeholder="••••••••"
                                bind_value=password
                                required=true
                                class="h-8 text-sm"
                            />
                        </div>

                        {move || {
                            error().map(|e| {
                                view! {
                                    <Alert class="border-destructive/30">
                                        <AlertDescription class="text-destructive text-xs">{e}</AlertDescription>
                                    </Alert>
                                }
                            })
                        }}

                        <Button class="w-full" size=ButtonSize::Sm attr:disabled=pending>
                            <span class="inline-flex items-center gap-2">
                                <Show when=pending fallback=|| ().into_view()>
                                    <Spinner />
                                </Show>
                                {move || if pending() { "Logging in..." } else { "Login" }}
                            </span>
                        </Button>

                        <div class="pt-1 text-xs text-muted-foreground">
                            "Don't have an account? "
                            <a class="text-primary underline underline-offset-4" href=AppRoute::Register.fragment()>"Register here"</a>
                        </div>
                    </form>
                </CardContent>
            </Card>
        </div>
    }
}
