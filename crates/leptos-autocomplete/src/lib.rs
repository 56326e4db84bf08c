//! Leptos Autocomplete
//!
//! Suggestion dropdown for plain `<input>` elements rendered by the server.
//! The list is a Leptos view mounted next to the input; the input's own
//! events are bound with [`EventListener`] guards so re-installing options
//! never stacks listeners.

use std::any::Any;

use leptos::prelude::*;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;

/// Class of the rendered suggestion list
pub const LIST_CLASS: &str = "autocomplete-items";
/// Class of the highlighted suggestion
pub const ACTIVE_CLASS: &str = "autocomplete-active";

// ========================
// Event Listener Guard
// ========================

/// DOM event listener that stays attached until dropped
pub struct EventListener {
    target: web_sys::EventTarget,
    event: &'static str,
    callback: Closure<dyn FnMut(web_sys::Event)>,
}

impl EventListener {
    pub fn new<F>(target: &web_sys::EventTarget, event: &'static str, callback: F) -> Self
    where
        F: FnMut(web_sys::Event) + 'static,
    {
        let callback = Closure::<dyn FnMut(web_sys::Event)>::new(callback);
        let _ = target.add_event_listener_with_callback(event, callback.as_ref().unchecked_ref());
        Self {
            target: target.clone(),
            event,
            callback,
        }
    }

    pub fn event(&self) -> &'static str {
        self.event
    }
}

impl Drop for EventListener {
    fn drop(&mut self) {
        let _ = self
            .target
            .remove_event_listener_with_callback(self.event, self.callback.as_ref().unchecked_ref());
    }
}

// ========================
// Matching
// ========================

/// Case-insensitive prefix match
pub fn prefix_match(query: &str, option: &str) -> bool {
    let mut option_chars = option.chars();
    query.chars().all(|q| match option_chars.next() {
        Some(o) => q.to_uppercase().eq(o.to_uppercase()),
        None => false,
    })
}

/// Split an option into the part covered by the query and the rest
pub fn split_match<'a>(option: &'a str, query: &str) -> (&'a str, &'a str) {
    let end = option
        .char_indices()
        .nth(query.chars().count())
        .map_or(option.len(), |(i, _)| i);
    option.split_at(end)
}

/// Options shown for the current query, in their original order
pub fn visible_options(options: &[String], query: &str) -> Vec<String> {
    if query.is_empty() {
        return vec![];
    }
    options
        .iter()
        .filter(|option| prefix_match(query, option))
        .cloned()
        .collect()
}

/// Move the highlighted row one step, wrapping at both ends
pub fn step_focus(current: Option<usize>, forward: bool, len: usize) -> Option<usize> {
    if len == 0 {
        return None;
    }
    let next = match (current, forward) {
        (None, true) => 0,
        (None, false) => len - 1,
        (Some(i), true) if i + 1 >= len => 0,
        (Some(i), true) => i + 1,
        (Some(i), false) if i == 0 || i > len => len - 1,
        (Some(i), false) => i - 1,
    };
    Some(next)
}

/// DOM id of the suggestion list for an input (falls back to the name)
pub fn list_id_for(id: &str, name: &str) -> String {
    let base = if id.is_empty() { name } else { id };
    format!("{}autocomplete-list", base)
}

// ========================
// Widget
// ========================

/// Suggestion dropdown bound to one input element
pub struct Autocomplete {
    input: web_sys::HtmlInputElement,
    options: RwSignal<Vec<String>>,
    _listeners: Vec<EventListener>,
    _mount: Box<dyn Any>,
    _owner: Owner,
}

impl Autocomplete {
    /// Bind a dropdown to `input`, rendering the list into the input's parent
    pub fn attach(input: &web_sys::HtmlInputElement, options: Vec<String>) -> Result<Self, String> {
        let parent = input
            .parent_element()
            .and_then(|p| p.dyn_into::<web_sys::HtmlElement>().ok())
            .ok_or_else(|| format!("input {} has no parent element", input.name()))?;
        let document = web_sys::window()
            .and_then(|w| w.document())
            .ok_or_else(|| "no document".to_string())?;

        let owner = Owner::new();
        let (options, query, focus, open, picked) = owner.with(|| {
            (
                RwSignal::new(options),
                RwSignal::new(String::new()),
                RwSignal::new(None::<usize>),
                RwSignal::new(false),
                RwSignal::new(None::<String>),
            )
        });

        let visible_len = move || {
            if !open.get_untracked() {
                return 0;
            }
            let q = query.get_untracked();
            options.with_untracked(|opts| visible_options(opts, &q).len())
        };

        let mut listeners = Vec::with_capacity(3);

        let typed = input.clone();
        listeners.push(EventListener::new(input, "input", move |_| {
            query.set(typed.value());
            focus.set(None);
            open.set(true);
        }));

        listeners.push(EventListener::new(input, "keydown", move |ev: web_sys::Event| {
            let Some(ev) = ev.dyn_ref::<web_sys::KeyboardEvent>() else {
                return;
            };
            match ev.key().as_str() {
                "ArrowDown" => {
                    let len = visible_len();
                    focus.update(|f| *f = step_focus(*f, true, len));
                }
                "ArrowUp" => {
                    let len = visible_len();
                    focus.update(|f| *f = step_focus(*f, false, len));
                }
                "Enter" => {
                    // never submit the admin form from the dropdown
                    ev.prevent_default();
                    if let Some(i) = focus.get_untracked() {
                        let q = query.get_untracked();
                        let choice = options.with_untracked(|opts| visible_options(opts, &q).into_iter().nth(i));
                        if let Some(choice) = choice {
                            picked.set(Some(choice));
                        }
                    }
                }
                _ => {}
            }
        }));

        listeners.push(EventListener::new(&document, "click", move |_| {
            open.set(false);
        }));

        let list_id = list_id_for(&input.id(), &input.name());
        let target = input.clone();
        let mount = leptos::mount::mount_to(parent, move || {
            Effect::new(move |_| {
                if let Some(choice) = picked.get() {
                    target.set_value(&choice);
                    open.set(false);
                    focus.set(None);
                }
            });

            view! {
                <Show when=move || open.get() && !query.with(|q| q.is_empty())>
                    <div id=list_id.clone() class=LIST_CLASS>
                        {move || {
                            let q = query.get();
                            let active = focus.get();
                            options.with(|opts| visible_options(opts, &q))
                                .into_iter()
                                .enumerate()
                                .map(|(i, option)| {
                                    let (head, tail) = split_match(&option, &q);
                                    let (head, tail) = (head.to_string(), tail.to_string());
                                    let class = if active == Some(i) { ACTIVE_CLASS } else { "" };
                                    view! {
                                        <div
                                            class=class
                                            on:click=move |_| picked.set(Some(option.clone()))
                                        >
                                            <strong>{head}</strong>
                                            {tail}
                                        </div>
                                    }
                                })
                                .collect_view()
                        }}
                    </div>
                </Show>
            }
        });

        Ok(Self {
            input: input.clone(),
            options,
            _listeners: listeners,
            _mount: Box::new(mount),
            _owner: owner,
        })
    }

    pub fn input(&self) -> &web_sys::HtmlInputElement {
        &self.input
    }

    /// Replace the option list; listeners stay as they are
    pub fn set_options(&self, options: Vec<String>) {
        self.options.set(options);
    }

    pub fn options(&self) -> Vec<String> {
        self.options.get_untracked()
    }
}

/// A dropdown bound to one input element
pub trait InputWidget: Sized {
    type Input: Clone + PartialEq;

    fn attach(input: &Self::Input, options: Vec<String>) -> Result<Self, String>;
    fn input(&self) -> &Self::Input;
    fn set_options(&self, options: Vec<String>);
}

impl InputWidget for Autocomplete {
    type Input = web_sys::HtmlInputElement;

    fn attach(input: &Self::Input, options: Vec<String>) -> Result<Self, String> {
        Autocomplete::attach(input, options)
    }

    fn input(&self) -> &Self::Input {
        Autocomplete::input(self)
    }

    fn set_options(&self, options: Vec<String>) {
        Autocomplete::set_options(self, options)
    }
}

/// One widget per input element
///
/// Widgets are keyed by element identity, not by name: the admin formset
/// renames the remaining rows' inputs when a row is deleted.
pub struct WidgetSet<W: InputWidget> {
    widgets: Vec<W>,
}

impl<W: InputWidget> Default for WidgetSet<W> {
    fn default() -> Self {
        Self { widgets: Vec::new() }
    }
}

impl<W: InputWidget> WidgetSet<W> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install options on `input`, attaching a widget only the first time
    /// this element is seen
    pub fn install(&mut self, input: &W::Input, options: &[String]) -> Result<(), String> {
        match self.widgets.iter().find(|w| w.input() == input) {
            Some(widget) => widget.set_options(options.to_vec()),
            None => self.widgets.push(W::attach(input, options.to_vec())?),
        }
        Ok(())
    }

    /// Drop (and detach) widgets whose input is not in `live`
    pub fn retain_inputs(&mut self, live: &[W::Input]) -> usize {
        let before = self.widgets.len();
        self.widgets.retain(|w| live.contains(w.input()));
        before - self.widgets.len()
    }

    pub fn len(&self) -> usize {
        self.widgets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.widgets.is_empty()
    }
}

pub type AutocompleteSet = WidgetSet<Autocomplete>;
