//! Row Registry
//!
//! Tracks the param inputs and delete buttons of the repeatable constraint
//! rows. The admin formset adds and removes rows on its own, so the registry
//! is rebuilt from the page on every add/delete click.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crate::console;

/// The two suggestion-enabled fields of a row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamField {
    First,
    Second,
}

impl ParamField {
    pub const ALL: [ParamField; 2] = [ParamField::First, ParamField::Second];

    pub fn as_str(self) -> &'static str {
        match self {
            ParamField::First => "param_1",
            ParamField::Second => "param_2",
        }
    }
}

/// Page access used by the registry and the controller
///
/// Dropping a `Listener` detaches it.
pub trait FormDom {
    type Input: Clone;
    type Button: Clone + PartialEq;
    type Listener;

    /// Value of the formset's row-count field, `None` when absent or invalid
    fn row_count(&self) -> Option<usize>;
    fn param_input(&self, row: usize, field: ParamField) -> Option<Self::Input>;
    fn input_name(&self, input: &Self::Input) -> String;
    fn delete_buttons(&self) -> Vec<Self::Button>;
    fn on_delete_click(&self, button: &Self::Button, handler: Rc<dyn Fn()>) -> Self::Listener;
    fn on_add_row(&self, handler: Rc<dyn Fn()>) -> Option<Self::Listener>;
    fn on_content_type_change(&self, handler: Rc<dyn Fn()>) -> Option<Self::Listener>;
    fn content_type_id(&self) -> Option<String>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryState {
    Empty,
    Populated,
}

struct TrackedInput<I> {
    name: String,
    input: I,
}

struct TrackedButton<D: FormDom> {
    button: D::Button,
    _listener: D::Listener,
}

pub struct RowRegistry<D: FormDom> {
    dom: Rc<D>,
    this: Weak<RefCell<RowRegistry<D>>>,
    inputs: Vec<TrackedInput<D::Input>>,
    delete_buttons: Vec<TrackedButton<D>>,
    state: RegistryState,
    subscribers: Vec<Rc<dyn Fn()>>,
    _add_row: Option<D::Listener>,
}

impl<D: FormDom + 'static> RowRegistry<D> {
    /// Create the registry, hook the add-row control and scan the page
    pub fn new(dom: Rc<D>) -> Rc<RefCell<Self>> {
        let registry = Rc::new_cyclic(|this: &Weak<RefCell<Self>>| {
            let add_row = dom.on_add_row(Self::rebuild_handler(this.clone()));
            if add_row.is_none() {
                console::warn("[Registry] No add-row control found");
            }
            RefCell::new(Self {
                dom: dom.clone(),
                this: this.clone(),
                inputs: Vec::new(),
                delete_buttons: Vec::new(),
                state: RegistryState::Empty,
                subscribers: Vec::new(),
                _add_row: add_row,
            })
        });
        registry.borrow_mut().rebuild_all();
        registry
    }

    fn rebuild_handler(this: Weak<RefCell<Self>>) -> Rc<dyn Fn()> {
        Rc::new(move || {
            let Some(registry) = this.upgrade() else {
                return;
            };
            registry.borrow_mut().rebuild_all();
            // subscribers may read the registry again
            let subscribers = registry.borrow().subscribers.clone();
            for subscriber in subscribers {
                subscriber();
            }
        })
    }

    /// Call `handler` after every rebuild triggered by an add or delete click
    pub fn on_rebuild(&mut self, handler: Rc<dyn Fn()>) {
        self.subscribers.push(handler);
    }

    /// Flush all tracking state and rescan the page
    pub fn rebuild_all(&mut self) {
        self.flush();

        let rows = self.dom.row_count().unwrap_or(0);
        for row in 0..rows {
            for field in ParamField::ALL {
                if let Some(input) = self.dom.param_input(row, field) {
                    self.add_input(input);
                }
            }
        }

        let mut tracked: Vec<TrackedButton<D>> = Vec::new();
        for button in self.dom.delete_buttons() {
            if tracked.iter().any(|t| t.button == button) {
                continue;
            }
            let listener = self.dom.on_delete_click(&button, Self::rebuild_handler(self.this.clone()));
            tracked.push(TrackedButton { button, _listener: listener });
        }
        self.delete_buttons = tracked;
        self.state = RegistryState::Populated;

        console::log(&format!(
            "[Registry] Rebuilt: {} rows, {} inputs, {} delete buttons",
            rows,
            self.inputs.len(),
            self.delete_buttons.len()
        ));
    }
}

impl<D: FormDom> RowRegistry<D> {
    /// Forget every input and detach every delete-button listener
    pub fn flush(&mut self) {
        self.inputs.clear();
        self.delete_buttons.clear();
        self.state = RegistryState::Empty;
    }

    /// Track an input under its name (last write wins)
    pub fn add_input(&mut self, input: D::Input) {
        let name = self.dom.input_name(&input);
        match self.inputs.iter_mut().find(|t| t.name == name) {
            Some(tracked) => tracked.input = input,
            None => self.inputs.push(TrackedInput { name, input }),
        }
    }

    pub fn delete_input(&mut self, name: &str) -> Option<D::Input> {
        let pos = self.inputs.iter().position(|t| t.name == name)?;
        Some(self.inputs.remove(pos).input)
    }

    pub fn get_input(&self, name: &str) -> Option<&D::Input> {
        self.inputs.iter().find(|t| t.name == name).map(|t| &t.input)
    }

    pub fn list_inputs(&self) -> Vec<D::Input> {
        self.inputs.iter().map(|t| t.input.clone()).collect()
    }

    pub fn input_names(&self) -> Vec<String> {
        self.inputs.iter().map(|t| t.name.clone()).collect()
    }

    pub fn input_count(&self) -> usize {
        self.inputs.len()
    }

    pub fn delete_button_count(&self) -> usize {
        self.delete_buttons.len()
    }

    pub fn state(&self) -> RegistryState {
        self.state
    }
}

#[cfg(test)]
pub(crate) mod fake {
    //! In-memory page used by registry and controller tests

    use super::*;
    use std::cell::Cell;

    #[derive(Debug, Clone, PartialEq)]
    pub struct FakeInput {
        pub name: String,
        /// Distinguishes re-rendered elements that reuse a name
        pub generation: u32,
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum Target {
        AddRow,
        ContentType,
        Delete(u32),
    }

    pub struct Registration {
        pub target: Target,
        pub handler: Rc<dyn Fn()>,
        pub active: Rc<Cell<bool>>,
    }

    pub struct FakeListener {
        active: Rc<Cell<bool>>,
    }

    impl Drop for FakeListener {
        fn drop(&mut self) {
            self.active.set(false);
        }
    }

    #[derive(Default)]
    pub struct FakePage {
        pub row_count: RefCell<Option<usize>>,
        pub inputs: RefCell<Vec<FakeInput>>,
        pub delete_buttons: RefCell<Vec<u32>>,
        pub has_add_row: Cell<bool>,
        pub has_content_type: Cell<bool>,
        pub content_type: RefCell<Option<String>>,
        pub registrations: RefCell<Vec<Registration>>,
        pub row_count_reads: Cell<usize>,
    }

    impl FakePage {
        /// Page with `rows` complete rows and a delete button per row
        pub fn with_rows(rows: usize) -> Self {
            let page = Self::default();
            page.has_add_row.set(true);
            page.has_content_type.set(true);
            *page.content_type.borrow_mut() = Some("7".to_string());
            for row in 0..rows {
                page.render_row(row);
            }
            *page.row_count.borrow_mut() = Some(rows);
            page
        }

        pub fn render_row(&self, row: usize) {
            for field in ParamField::ALL {
                self.inputs.borrow_mut().push(FakeInput {
                    name: format!("constraints-{}-{}", row, field.as_str()),
                    generation: 0,
                });
            }
            self.delete_buttons.borrow_mut().push(row as u32);
        }

        pub fn remove_row(&self, row: usize) {
            let prefix = format!("constraints-{}-", row);
            self.inputs.borrow_mut().retain(|i| !i.name.starts_with(&prefix));
            self.delete_buttons.borrow_mut().retain(|b| *b != row as u32);
        }

        pub fn active_listeners(&self, target: Target) -> usize {
            self.registrations
                .borrow()
                .iter()
                .filter(|r| r.target == target && r.active.get())
                .count()
        }

        pub fn total_active_listeners(&self) -> usize {
            self.registrations.borrow().iter().filter(|r| r.active.get()).count()
        }

        /// Run every active handler bound to `target`
        pub fn fire(&self, target: Target) {
            let handlers: Vec<Rc<dyn Fn()>> = self
                .registrations
                .borrow()
                .iter()
                .filter(|r| r.target == target && r.active.get())
                .map(|r| r.handler.clone())
                .collect();
            for handler in handlers {
                handler();
            }
        }

        fn register(&self, target: Target, handler: Rc<dyn Fn()>) -> FakeListener {
            let active = Rc::new(Cell::new(true));
            self.registrations.borrow_mut().push(Registration {
                target,
                handler,
                active: active.clone(),
            });
            FakeListener { active }
        }
    }

    impl FormDom for FakePage {
        type Input = FakeInput;
        type Button = u32;
        type Listener = FakeListener;

        fn row_count(&self) -> Option<usize> {
            self.row_count_reads.set(self.row_count_reads.get() + 1);
            *self.row_count.borrow()
        }

        fn param_input(&self, row: usize, field: ParamField) -> Option<FakeInput> {
            let name = format!("constraints-{}-{}", row, field.as_str());
            self.inputs.borrow().iter().find(|i| i.name == name).cloned()
        }

        fn input_name(&self, input: &FakeInput) -> String {
            input.name.clone()
        }

        fn delete_buttons(&self) -> Vec<u32> {
            self.delete_buttons.borrow().clone()
        }

        fn on_delete_click(&self, button: &u32, handler: Rc<dyn Fn()>) -> FakeListener {
            self.register(Target::Delete(*button), handler)
        }

        fn on_add_row(&self, handler: Rc<dyn Fn()>) -> Option<FakeListener> {
            self.has_add_row.get().then(|| self.register(Target::AddRow, handler))
        }

        fn on_content_type_change(&self, handler: Rc<dyn Fn()>) -> Option<FakeListener> {
            self.has_content_type.get().then(|| self.register(Target::ContentType, handler))
        }

        fn content_type_id(&self) -> Option<String> {
            self.content_type.borrow().clone()
        }
    }
}
