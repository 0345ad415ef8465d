//! # DOM Events
//!
//! DOM event types and dispatch mechanism implementing the DOM Events spec.
//! Supports capture and bubble phases, stopPropagation, preventDefault and
//! single-slot event handlers (`onclick`-style).

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::{Node, NodeId};

/// Unique identifier for an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EventId(u64);

impl EventId {
    /// Create a new unique EventId.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

/// Event phases as per the DOM spec.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum EventPhase {
    /// No event is being processed.
    None = 0,
    /// Event is propagating through target's ancestors (capture).
    Capturing = 1,
    /// Event has arrived at the event target.
    AtTarget = 2,
    /// Event is propagating back up through ancestors (bubble).
    Bubbling = 3,
}

/// Common event interface for all DOM events.
#[derive(Debug, Clone)]
pub struct Event {
    /// Unique ID for this event.
    pub id: EventId,
    /// Event type (e.g., "click", "submit").
    pub event_type: String,
    /// Whether the event bubbles.
    pub bubbles: bool,
    /// Whether the event is cancelable.
    pub cancelable: bool,
    /// Current phase.
    phase: Cell<EventPhase>,
    /// The target node (where the event originated).
    target: Cell<Option<NodeId>>,
    /// The current target (node currently handling the event).
    current_target: Cell<Option<NodeId>>,
    /// Whether stopPropagation was called.
    propagation_stopped: Cell<bool>,
    /// Whether stopImmediatePropagation was called.
    immediate_propagation_stopped: Cell<bool>,
    /// Whether preventDefault was called.
    default_prevented: Cell<bool>,
    /// Whether the event is trusted (dispatched by the user agent).
    pub is_trusted: bool,
}

impl Event {
    /// Create a new event.
    pub fn new(event_type: &str, bubbles: bool, cancelable: bool) -> Self {
        Self {
            id: EventId::new(),
            event_type: event_type.to_string(),
            bubbles,
            cancelable,
            phase: Cell::new(EventPhase::None),
            target: Cell::new(None),
            current_target: Cell::new(None),
            propagation_stopped: Cell::new(false),
            immediate_propagation_stopped: Cell::new(false),
            default_prevented: Cell::new(false),
            is_trusted: false,
        }
    }

    /// Create a trusted event (from the user agent).
    pub fn new_trusted(event_type: &str, bubbles: bool, cancelable: bool) -> Self {
        let mut event = Self::new(event_type, bubbles, cancelable);
        event.is_trusted = true;
        event
    }

    /// Get the current phase.
    pub fn phase(&self) -> EventPhase {
        self.phase.get()
    }

    /// Get the target node ID.
    pub fn target(&self) -> Option<NodeId> {
        self.target.get()
    }

    /// Get the current target node ID.
    pub fn current_target(&self) -> Option<NodeId> {
        self.current_target.get()
    }

    /// Stop immediate propagation of the event.
    pub fn stop_immediate_propagation(&self) {
        self.propagation_stopped.set(true);
        self.immediate_propagation_stopped.set(true);
    }

    /// Prevent the default action.
    pub fn prevent_default(&self) {
        if self.cancelable {
            self.default_prevented.set(true);
        }
    }

    /// Check if propagation is stopped.
    pub fn propagation_stopped(&self) -> bool {
        self.propagation_stopped.get()
    }

    /// Check if immediate propagation is stopped.
    pub fn immediate_propagation_stopped(&self) -> bool {
        self.immediate_propagation_stopped.get()
    }

    /// Check if the default action was prevented.
    pub fn default_prevented(&self) -> bool {
        self.default_prevented.get()
    }

    pub(crate) fn set_phase(&self, phase: EventPhase) {
        self.phase.set(phase);
    }

    pub(crate) fn set_target(&self, target: NodeId) {
        self.target.set(Some(target));
    }

    pub(crate) fn set_current_target(&self, target: Option<NodeId>) {
        self.current_target.set(target);
    }
}

/// Mouse event data.
#[derive(Debug, Clone, Default)]
pub struct MouseEventData {
    /// X coordinate relative to the viewport.
    pub client_x: f64,
    /// Y coordinate relative to the viewport.
    pub client_y: f64,
    /// Which mouse button triggered the event.
    pub button: i16,
    /// Whether Ctrl key was pressed.
    pub ctrl_key: bool,
    /// Whether Shift key was pressed.
    pub shift_key: bool,
}

/// Focus event data.
#[derive(Debug, Clone, Default)]
pub struct FocusEventData {
    /// The related target (element losing/gaining focus).
    pub related_target: Option<NodeId>,
}

/// DOM event with type-specific data.
#[derive(Debug, Clone)]
pub enum DomEvent {
    /// Generic event (submit, reset, ...).
    Generic(Event),
    /// Mouse event.
    Mouse(Event, MouseEventData),
    /// Focus event.
    Focus(Event, FocusEventData),
}

impl DomEvent {
    /// Get the base event.
    pub fn event(&self) -> &Event {
        match self {
            DomEvent::Generic(e) => e,
            DomEvent::Mouse(e, _) => e,
            DomEvent::Focus(e, _) => e,
        }
    }

    /// Create a bubbling, cancelable submit event.
    pub fn submit() -> Self {
        DomEvent::Generic(Event::new_trusted("submit", true, true))
    }

    /// Create a bubbling, cancelable reset event.
    pub fn reset() -> Self {
        DomEvent::Generic(Event::new_trusted("reset", true, true))
    }

    /// Create a mouse event.
    pub fn mouse(event_type: &str, bubbles: bool, data: MouseEventData) -> Self {
        let event = Event::new_trusted(event_type, bubbles, true);
        DomEvent::Mouse(event, data)
    }

    /// Create a focus event.
    pub fn focus(event_type: &str, data: FocusEventData) -> Self {
        // focus/blur don't bubble, focusin/focusout do
        let bubbles = event_type == "focusin" || event_type == "focusout";
        let event = Event::new_trusted(event_type, bubbles, false);
        DomEvent::Focus(event, data)
    }
}

/// Options for adding an event listener.
#[derive(Debug, Clone, Default)]
pub struct AddEventListenerOptions {
    /// If true, the listener is invoked during capture phase.
    pub capture: bool,
    /// If true, the listener is automatically removed after first invocation.
    pub once: bool,
}

/// An event listener callback.
pub type EventListenerCallback = Box<dyn Fn(&DomEvent) + 'static>;

type SharedCallback = Rc<dyn Fn(&DomEvent) + 'static>;

/// A registered event listener.
struct EventListener {
    callback: SharedCallback,
    options: AddEventListenerOptions,
}

/// Event target mixin - manages event listeners for a node.
///
/// Callbacks are cloned out before they run, so a callback may add or remove
/// listeners (including itself) on the node it is attached to.
#[derive(Default)]
pub struct EventTarget {
    /// Listeners keyed by event type.
    listeners: RefCell<HashMap<String, Vec<EventListener>>>,
    /// `on<type>` handler slots keyed by event type.
    handlers: RefCell<HashMap<String, SharedCallback>>,
}

impl EventTarget {
    /// Create a new event target.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an event listener.
    pub fn add_event_listener(
        &self,
        event_type: &str,
        callback: EventListenerCallback,
        options: AddEventListenerOptions,
    ) {
        let mut listeners = self.listeners.borrow_mut();
        let list = listeners.entry(event_type.to_string()).or_default();
        list.push(EventListener {
            callback: Rc::from(callback),
            options,
        });
    }

    /// Install or clear the handler slot for an event type.
    pub fn set_event_handler(&self, event_type: &str, handler: Option<EventListenerCallback>) {
        let mut handlers = self.handlers.borrow_mut();
        match handler {
            Some(h) => {
                handlers.insert(event_type.to_string(), Rc::from(h));
            }
            None => {
                handlers.remove(event_type);
            }
        }
    }

    /// Check whether a handler slot is set.
    pub fn has_event_handler(&self, event_type: &str) -> bool {
        self.handlers.borrow().contains_key(event_type)
    }

    /// Check if there are any listeners for an event type.
    pub fn has_listeners(&self, event_type: &str) -> bool {
        let listeners = self.listeners.borrow();
        listeners
            .get(event_type)
            .map(|l| !l.is_empty())
            .unwrap_or(false)
    }

    /// Invoke listeners (and the handler slot) for an event.
    pub fn invoke_listeners(&self, event: &DomEvent, phase: EventPhase) {
        let event_type = event.event().event_type.clone();

        let mut to_call: Vec<SharedCallback> = Vec::new();
        {
            let mut listeners = self.listeners.borrow_mut();
            if let Some(list) = listeners.get_mut(&event_type) {
                list.retain(|listener| {
                    let should_fire = match phase {
                        EventPhase::Capturing => listener.options.capture,
                        EventPhase::AtTarget => true,
                        EventPhase::Bubbling => !listener.options.capture,
                        EventPhase::None => false,
                    };
                    if should_fire {
                        to_call.push(listener.callback.clone());
                    }
                    !(should_fire && listener.options.once)
                });
            }
        }

        if matches!(phase, EventPhase::AtTarget | EventPhase::Bubbling) {
            if let Some(handler) = self.handlers.borrow().get(&event_type) {
                to_call.push(handler.clone());
            }
        }

        for callback in to_call {
            callback(event);
            if event.event().immediate_propagation_stopped() {
                break;
            }
        }
    }
}

impl std::fmt::Debug for EventTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventTarget")
            .field("listener_count", &self.listeners.borrow().len())
            .field("handler_count", &self.handlers.borrow().len())
            .finish()
    }
}

/// Event dispatcher for propagating events through the DOM tree.
pub struct EventDispatcher;

impl EventDispatcher {
    /// Dispatch an event to a target node.
    /// Returns true if the event was not prevented.
    pub fn dispatch(event: &mut DomEvent, target: &Rc<Node>, ancestors: &[Rc<Node>]) -> bool {
        let bubbles = event.event().bubbles;

        event.event().set_target(target.id);

        // Ancestors are ordered from root to parent
        let mut path: Vec<&Rc<Node>> = ancestors.iter().collect();
        path.push(target);

        // Capture phase (root to target, excluding target)
        event.event().set_phase(EventPhase::Capturing);
        for node in &path[..path.len() - 1] {
            if event.event().propagation_stopped() {
                break;
            }
            event.event().set_current_target(Some(node.id));
            node.event_target
                .invoke_listeners(event, EventPhase::Capturing);
        }

        // At target phase
        if !event.event().propagation_stopped() {
            event.event().set_phase(EventPhase::AtTarget);
            event.event().set_current_target(Some(target.id));
            target
                .event_target
                .invoke_listeners(event, EventPhase::AtTarget);
        }

        // Bubble phase (target to root, excluding target)
        if bubbles && !event.event().propagation_stopped() {
            event.event().set_phase(EventPhase::Bubbling);
            for node in path[..path.len() - 1].iter().rev() {
                if event.event().propagation_stopped() {
                    break;
                }
                event.event().set_current_target(Some(node.id));
                node.event_target
                    .invoke_listeners(event, EventPhase::Bubbling);
            }
        }

        event.event().set_phase(EventPhase::None);
        event.event().set_current_target(None);

        !event.event().default_prevented()
    }
}
