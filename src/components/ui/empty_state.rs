use leptos::prelude::*;
use leptos_ui::clx;

mod components {
    use super::*;
    clx! {EmptyState, div, "flex flex-col items-center justify-center gap-3 rounded-xl border border-dashed px-6 py-12 text-center"}
}

pub use components::*;
