use super::login::failure_message;
use super::{use_page_model, BoundRoot, Page, PageMarkup, Rendered};
use crate::api::AuthService;
use crate::components::ui::{
    Alert, AlertDescription, Button, ButtonSize, Card, CardContent, CardDescription, CardHeader,
    CardTitle, Input, Label, Spinner,
};
use crate::router::{NavigatorHandle, RootHandle};
use crate::routes::AppRoute;
use crate::state::AppContext;
use crate::util::sleep_ms;
use leptos::logging::{log, warn};
use leptos::prelude::*;
use leptos::task::spawn_local;

pub(crate) const MIN_PASSWORD_LEN: usize = 8;
const REDIRECT_DELAY_MS: u32 = 2000;
pub(crate) const REGISTERED_NOTICE: &str = "Registration successful! Redirecting to login...";

#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct RegisterModel {
    pub pending: bool,
    pub error: Option<String>,
    pub notice: Option<String>,
}

pub(crate) struct RegisterPage {
    auth: AuthService,
    navigator: NavigatorHandle,
    root: BoundRoot,
}

fn edit(root: &RootHandle, f: impl FnOnce(&mut RegisterModel)) {
    root.update(|markup| {
        if let PageMarkup::Register(m) = markup {
            f(m);
        }
    });
}

impl RegisterPage {
    pub fn new(auth: AuthService, navigator: NavigatorHandle) -> Self {
        Self {
            auth,
            navigator,
            root: BoundRoot::default(),
        }
    }

    /// Creates the account, then sends the user to the login page after a
    /// short pause, unless they have already left this page.
    pub async fn submit(&self, name: &str, email: &str, password: &str) -> bool {
        let Some(root) = self.root.get() else {
            return false;
        };

        if password.chars().count() < MIN_PASSWORD_LEN {
            edit(&root, |m| {
                m.error = Some(format!(
                    "Password must be at least {MIN_PASSWORD_LEN} characters"
                ));
            });
            return false;
        }

        edit(&root, |m| {
            m.pending = true;
            m.error = None;
            m.notice = None;
        });

        if let Err(e) = self.auth.register(name.trim(), email.trim(), password).await {
            warn!("[auth] register failed: {e}");
            edit(&root, |m| {
                m.pending = false;
                m.error = Some(failure_message(&e, "Registration failed. Please try again."));
            });
            return false;
        }

        log!("[auth] registered {}", email.trim());
        edit(&root, |m| {
            m.pending = false;
            m.notice = Some(REGISTERED_NOTICE.to_string());
        });

        sleep_ms(REDIRECT_DELAY_MS).await;
        if root.is_live() {
            self.navigator.assign(AppRoute::Login);
        }
        true
    }
}

impl Page for RegisterPage {
    async fn render_markup(&self) -> Rendered {
        Rendered::Markup(PageMarkup::Register(RegisterModel::default()))
    }

    async fn activate(&self, root: RootHandle) {
        self.root.bind(root);
    }
}

fn select(markup: &PageMarkup) -> Option<&RegisterModel> {
    match markup {
        PageMarkup::Register(m) => Some(m),
        _ => None,
    }
}

#[component]
pub fn RegisterView() -> impl IntoView {
    let ctx = expect_context::<AppContext>();
    let model = use_page_model(select);
    let name: RwSignal<String> = RwSignal::new(String::new());
    let email: RwSignal<String> = RwSignal::new(String::new());
    let password: RwSignal<String> = RwSignal::new(String::new());

    let pending = move || model.with(|m| m.as_ref().is_some_and(|m| m.pending));
    let error = move || model.with(|m| m.as_ref().and_then(|m| m.error.clone()));
    let notice = move || model.with(|m| m.as_ref().and_then(|m| m.notice.clone()));

    let on_submit = move |ev: web_sys::SubmitEvent| {
        ev.prevent_default();
        let ctx = ctx.clone();
        let (name_val, email_val, password_val) =
            (name.get_untracked(), email.get_untracked(), password.get_untracked());
        spawn_local(async move {
            ctx.router
                .table()
                .register
                .submit(&name_val, &email_val, &password_val)
                .await;
        });
    };

    view! {
        <div class="mx-auto flex w-full max-w-sm flex-col justify-center py-10">
            <Card>
                <CardHeader>
                    <CardTitle class="text-lg">"Register"</CardTitle>
                    <CardDescription class="text-xs">"Create an account to start discovering."</CardDescription>
                </CardHeader>
                <CardContent>
                    <form class="flex flex-col gap-3" on:submit=on_submit>
                        <div class="flex flex-col gap-1.5">
                            <Label html_for="name" class="text-xs">"Name"</Label>
                            <Input id="name" placeholder="Ada Lovelace" bind_value=name required=true class="h-8 text-sm" />
                        </div>

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
                                placeholder="At least 8 characters"
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
                        {move || {
                            notice().map(|n| {
                                view! {
                                    <Alert class="border-success/30">
                                        <AlertDescription class="text-success text-xs">{n}</AlertDescription>
                                    </Alert>
                                }
                            })
                        }}

                        <Button class="w-full" size=ButtonSize::Sm attr:disabled=move || pending() || notice().is_some()>
                            <span class="inline-flex items-center gap-2">
                                <Show when=pending fallback=|| ().into_view()>
                                    <Spinner />
                                </Show>
                                {move || if pending() { "Registering..." } else { "Register" }}
                            </span>
                        </Button>

                        <div class="pt-1 text-xs text-muted-foreground">
                            "Already have an account? "
                            <a class="text-primary underline underline-offset-4" href=AppRoute::Login.fragment()>"Login here"</a>
                        </div>
                    </form>
                </CardContent>
            </Card>
        </div>
    }
}
