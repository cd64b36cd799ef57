use leptos::prelude::*;
use leptos_ui::clx;

mod components {
    use super::*;
    // Rank chip on result cards.
    clx! {Badge, span, "inline-flex w-fit shrink-0 items-center justify-center rounded-md border border-transparent bg-primary px-2 py-0.5 text-xs font-medium text-primary-foreground whitespace-nowrap"}
}

pub use components::*;
