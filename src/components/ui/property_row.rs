use leptos::prelude::*;

/// One predicted descriptor: symbol on the left, value with unit on the right.
#[component]
pub fn PropertyRow(label: &'static str, #[prop(into)] value: String) -> impl IntoView {
    view! {
        <div class="flex items-baseline justify-between gap-2 rounded-md bg-muted/50 px-2 py-1">
            <span class="text-muted-foreground">{label}</span>
            <span class="font-mono tabular-nums">{value}</span>
        </div>
    }
}
