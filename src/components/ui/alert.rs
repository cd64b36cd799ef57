use leptos::prelude::*;
use leptos_ui::clx;

mod components {
    use super::*;
    clx! {Alert, div, "relative w-full rounded-lg border bg-card px-4 py-3 text-sm", "flex flex-col gap-1"}
    clx! {AlertTitle, h4, "font-medium tracking-tight leading-none"}
    clx! {AlertDescription, p, "text-sm leading-relaxed"}
}

pub use components::*;
