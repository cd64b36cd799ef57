mod api;
mod app;
mod components;
mod models;
mod pages;
mod router;
mod routes;
mod session;
mod state;
mod storage;
mod util;

use crate::app::App;
use leptos::prelude::*;

// Needed for `#[wasm_bindgen(start)]` on the wasm entrypoint.
#[cfg(all(target_arch = "wasm32", not(test)))]
use wasm_bindgen::prelude::wasm_bindgen;

// WASM-only tests (run with `cargo test --target wasm32-unknown-unknown` + wasm-bindgen-test-runner)
#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use crate::models::{Criteria, NewDiscoveryRun};
    use crate::session::Session;
    use crate::storage::{KeyValueBackend, RunStore, WebStorage, RUNS_KEY};
    use futures::executor::block_on;
    use std::sync::Arc;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn test_session_roundtrip_in_session_storage() {
        let session = Session::new(Arc::new(WebStorage::session()));
        session.clear_session();
        assert!(!session.is_authenticated());

        session.set_session("t1", "Ada").expect("set");
        let reloaded = Session::new(Arc::new(WebStorage::session()));
        assert_eq!(reloaded.token().as_deref(), Some("t1"));
        assert_eq!(reloaded.name().as_deref(), Some("Ada"));

        reloaded.clear_session();
        assert!(!session.is_authenticated());
    }

    #[wasm_bindgen_test]
    fn test_run_store_persists_in_local_storage() {
        let backend = Arc::new(WebStorage::local());
        backend.remove(RUNS_KEY).expect("reset");

        let store = RunStore::new(backend.clone());
        block_on(store.initialize()).expect("init");
        let saved = block_on(store.save(NewDiscoveryRun {
            timestamp: 1,
            criteria: Criteria::default(),
            results: vec![],
            duration: None,
        }))
        .expect("save");

        let again = RunStore::new(backend.clone());
        assert_eq!(block_on(again.get_one(saved.id)).expect("get"), Some(saved));
        backend.remove(RUNS_KEY).expect("cleanup");
    }
}

// Only register the WASM start function for normal builds (not for tests),
// otherwise wasm-bindgen-test will end up with multiple entry symbols.
#[cfg_attr(all(target_arch = "wasm32", not(test)), wasm_bindgen(start))]
pub fn main() {
    console_error_panic_hook::set_once();
    mount_to_body(App);
}
