use leptos::prelude::*;
use leptos_ui::{clx, variants};

variants! {
    Button {
        base: "inline-flex items-center justify-center gap-2 whitespace-nowrap rounded-md text-sm font-medium transition-all disabled:pointer-events-none disabled:opacity-50 [&_svg]:pointer-events-none [&_svg:not([class*='size-'])]:size-4 shrink-0 [&_svg]:shrink-0 outline-none focus-visible:border-ring focus-visible:ring-ring/50 focus-visible:ring-[3px] w-fit hover:cursor-pointer active:scale-[0.98] touch-manipulation select-none",
        variants: {
            variant: {
                Default: "bg-primary text-primary-foreground shadow-xs hover:bg-primary/90",
                Destructive: "bg-destructive text-white shadow-xs hover:bg-destructive/90 focus-visible:ring-destructive/20",
                Outline: "border bg-border/30 shadow-xs hover:bg-border/50 hover:text-foreground",
                Ghost: "hover:bg-accent hover:text-accent-foreground",
            },
            size: {
                Default: "h-9 px-4 py-2 has-[>svg]:px-3",
                Sm: "h-8 rounded-md gap-1.5 px-3 has-[>svg]:px-2.5",
                Icon: "size-8",
            }
        },
        component: {
            element: button,
            support_href: true
        }
    }
}

mod components {
    use super::*;
    // Navigation styled as a primary button; takes `attr:href`.
    clx! {LinkButton, a, "inline-flex h-9 w-fit items-center justify-center gap-2 rounded-md bg-primary px-4 py-2 text-sm font-medium text-primary-foreground shadow-xs transition-all hover:bg-primary/90"}
}

pub use components::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_button_class_merges_variant_size_and_override() {
        let class = ButtonClass {
            variant: ButtonVariant::Destructive,
            size: ButtonSize::Sm,
        }
        .with_class("w-full");
        assert!(class.contains("bg-destructive"));
        assert!(class.contains("h-8"));
        assert!(class.contains("w-full"));
        assert!(!class.contains("w-fit"));
    }

    #[test]
    fn test_button_defaults() {
        let class = ButtonClass {
            variant: ButtonVariant::default(),
            size: ButtonSize::default(),
        }
        .to_class();
        assert!(class.contains("bg-primary"));
        assert!(class.contains("h-9"));
    }
}
