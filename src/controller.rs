//! Content Type Controller
//!
//! Re-fetches the attribute tree whenever the content type changes (or a row
//! is added) and installs the flattened paths on every tracked input.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use serde_json::{Map, Value};

use crate::api;
use crate::config::{InputMode, PageConfig};
use crate::console;
use crate::flatten::flatten_attributes;
use crate::registry::FormDom;

/// Receives option lists for inputs (the dropdown widget on the page)
pub trait OptionSink<I> {
    fn install(&mut self, input: &I, options: &[String]) -> Result<(), String>;
    /// Release whatever is attached to inputs not in `live`
    fn retain(&mut self, live: &[I]);
}

/// Produces the inputs that should receive suggestions
pub type InputSource<I> = Box<dyn Fn() -> Vec<I>>;

/// Monotonic request counter; only the latest ticket may install options
#[derive(Debug, Default)]
pub struct RequestSequence {
    latest: Cell<u64>,
}

impl RequestSequence {
    pub fn next(&self) -> u64 {
        let ticket = self.latest.get() + 1;
        self.latest.set(ticket);
        ticket
    }

    pub fn is_current(&self, ticket: u64) -> bool {
        ticket == self.latest.get()
    }

    /// Last ticket handed out, 0 before the first request
    pub fn latest(&self) -> u64 {
        self.latest.get()
    }
}

/// What happened to a schema response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Refresh {
    /// Options installed on this many inputs
    Installed(usize),
    /// A newer request was dispatched meanwhile
    Stale,
    Failed,
}

pub struct ContentTypeController<D: FormDom, S> {
    dom: Rc<D>,
    config: Rc<PageConfig>,
    inputs: InputSource<D::Input>,
    sink: RefCell<S>,
    sequence: RequestSequence,
    options: RefCell<Vec<String>>,
    listeners: RefCell<Vec<D::Listener>>,
}

impl<D, S> ContentTypeController<D, S>
where
    D: FormDom + 'static,
    S: OptionSink<D::Input> + 'static,
{
    pub fn new(dom: Rc<D>, config: Rc<PageConfig>, inputs: InputSource<D::Input>, sink: S) -> Rc<Self> {
        Rc::new(Self {
            dom,
            config,
            inputs,
            sink: RefCell::new(sink),
            sequence: RequestSequence::default(),
            options: RefCell::new(Vec::new()),
            listeners: RefCell::new(Vec::new()),
        })
    }

    /// Bind the triggers and, for the formset, load the initial options
    ///
    /// Does nothing at all when no schema URL is configured. A single input
    /// waits for the first content type change.
    pub fn set_up_event_listeners(self: &Rc<Self>) {
        if !self.config.is_enabled() {
            console::log("[ContentType] No schema URL configured, suggestions disabled");
            return;
        }
        let bound = self.bind();
        console::log(&format!("[ContentType] Bound {} triggers", bound));
        if self.config.mode == InputMode::Formset {
            self.refresh();
        }
    }

    /// Attach the change/add-row listeners, returns how many were bound
    ///
    /// Replaces any listeners from an earlier call.
    fn bind(self: &Rc<Self>) -> usize {
        if !self.config.is_enabled() {
            return 0;
        }
        let this = Rc::downgrade(self);
        let handler: Rc<dyn Fn()> = Rc::new(move || {
            if let Some(controller) = Weak::upgrade(&this) {
                controller.refresh();
            }
        });

        let mut listeners = self.listeners.borrow_mut();
        listeners.clear();
        listeners.extend(self.dom.on_content_type_change(handler.clone()));
        if self.config.mode == InputMode::Formset {
            listeners.extend(self.dom.on_add_row(handler));
        }
        listeners.len()
    }

    /// Dispatch a schema request for the selected content type
    pub fn refresh(self: &Rc<Self>) {
        let Some(content_type_id) = self.dom.content_type_id() else {
            console::warn("[ContentType] Content type selector not found");
            return;
        };
        let ticket = self.sequence.next();
        let url = self.config.attrs_url(&content_type_id);
        console::log(&format!("[ContentType] Request #{}: {}", ticket, url));

        let this = self.clone();
        wasm_bindgen_futures::spawn_local(async move {
            let result = api::fetch_model_attrs(&url).await;
            this.apply(ticket, result);
        });
    }

    /// Install a response's options unless a newer request superseded it
    pub fn apply(&self, ticket: u64, result: Result<Map<String, Value>, String>) -> Refresh {
        if !self.sequence.is_current(ticket) {
            console::log(&format!("[ContentType] Dropping stale response #{}", ticket));
            return Refresh::Stale;
        }
        let attrs = match result {
            Ok(attrs) => attrs,
            Err(e) => {
                console::error(&format!("[ContentType] Request #{} failed: {}", ticket, e));
                return Refresh::Failed;
            }
        };

        let options = flatten_attributes(&attrs, None);
        let inputs = (self.inputs)();
        let mut installed = 0;
        {
            let mut sink = self.sink.borrow_mut();
            sink.retain(&inputs);
            for input in &inputs {
                match sink.install(input, &options) {
                    Ok(()) => installed += 1,
                    Err(e) => console::error(&format!(
                        "[ContentType] Could not attach suggestions to {}: {}",
                        self.dom.input_name(input),
                        e
                    )),
                }
            }
        }
        console::log(&format!("[ContentType] {} options on {} inputs", options.len(), installed));
        *self.options.borrow_mut() = options;
        Refresh::Installed(installed)
    }

    /// Release widgets of inputs that left the page (rows deleted)
    pub fn prune(&self) {
        let inputs = (self.inputs)();
        self.sink.borrow_mut().retain(&inputs);
    }

    /// Options from the last applied response
    pub fn options(&self) -> Vec<String> {
        self.options.borrow().clone()
    }

    pub fn sequence(&self) -> &RequestSequence {
        &self.sequence
    }
}
