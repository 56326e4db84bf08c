#![allow(dead_code)]
//! Signal Form Frontend Entry Point
//!
//! Attribute-path suggestions for the signal admin change form.

mod api;
mod config;
mod console;
mod controller;
mod dom;
mod flatten;
mod registry;

use std::rc::Rc;

use gloo_timers::future::TimeoutFuture;
use leptos_autocomplete::AutocompleteSet;

use config::{InputMode, PageConfig};
use controller::{ContentTypeController, InputSource};
use dom::WebForm;
use registry::{FormDom, ParamField, RowRegistry};

fn main() {
    console_error_panic_hook::set_once();
    wasm_bindgen_futures::spawn_local(async {
        if let Err(e) = boot().await {
            console::error(&format!("[Boot] {}", e));
        }
    });
}

async fn boot() -> Result<(), String> {
    let document = web_sys::window()
        .and_then(|w| w.document())
        .ok_or_else(|| "no document".to_string())?;
    let config = Rc::new(PageConfig::from_document(&document));
    console::log(&format!(
        "[Boot] mode={:?}, enabled={}",
        config.mode,
        config.is_enabled()
    ));

    // the admin inlines are rendered by their own script after load
    TimeoutFuture::new(config.boot_delay_ms).await;

    let form = Rc::new(WebForm::new(document, config.clone()));
    let (inputs, registry) = match config.mode {
        InputMode::Formset => {
            let registry = RowRegistry::new(form.clone());
            let rows = registry.clone();
            let inputs: InputSource<web_sys::HtmlInputElement> = Box::new(move || rows.borrow().list_inputs());
            (inputs, Some(registry))
        }
        InputMode::SingleInput => {
            let form = form.clone();
            let inputs: InputSource<web_sys::HtmlInputElement> =
                Box::new(move || form.param_input(0, ParamField::First).into_iter().collect());
            (inputs, None)
        }
    };

    let controller = ContentTypeController::new(form, config, inputs, AutocompleteSet::new());
    if let Some(registry) = registry {
        // deleted rows release their dropdowns right away
        let weak = Rc::downgrade(&controller);
        registry.borrow_mut().on_rebuild(Rc::new(move || {
            if let Some(controller) = weak.upgrade() {
                controller.prune();
            }
        }));
    }
    controller.set_up_event_listeners();
    // lives as long as the page
    std::mem::forget(controller);
    Ok(())
}
