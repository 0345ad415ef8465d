//! # Form Controls
//!
//! Form control state (value, checkedness, selectedness), form data
//! collection, form reset and the `action`/`method` reflection used when a
//! script takes over submission.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use tracing::debug;
use url::Url;

use crate::{Document, DomError, DomEvent, Node};

/// Input type for HTML input elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputType {
    #[default]
    Text,
    Password,
    Email,
    Url,
    Tel,
    Number,
    Search,
    Hidden,
    Submit,
    Button,
    Reset,
    Checkbox,
    Radio,
    File,
    Image,
    Color,
    Date,
    DatetimeLocal,
    Month,
    Week,
    Time,
    Range,
}

impl InputType {
    /// Parse input type from string (case-insensitive, unknown → text).
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "text" => InputType::Text,
            "password" => InputType::Password,
            "email" => InputType::Email,
            "url" => InputType::Url,
            "tel" => InputType::Tel,
            "number" => InputType::Number,
            "search" => InputType::Search,
            "hidden" => InputType::Hidden,
            "submit" => InputType::Submit,
            "button" => InputType::Button,
            "reset" => InputType::Reset,
            "checkbox" => InputType::Checkbox,
            "radio" => InputType::Radio,
            "file" => InputType::File,
            "image" => InputType::Image,
            "color" => InputType::Color,
            "date" => InputType::Date,
            "datetime-local" => InputType::DatetimeLocal,
            "month" => InputType::Month,
            "week" => InputType::Week,
            "time" => InputType::Time,
            "range" => InputType::Range,
            _ => InputType::Text,
        }
    }

    /// The canonical keyword.
    pub fn as_str(&self) -> &'static str {
        match self {
            InputType::Text => "text",
            InputType::Password => "password",
            InputType::Email => "email",
            InputType::Url => "url",
            InputType::Tel => "tel",
            InputType::Number => "number",
            InputType::Search => "search",
            InputType::Hidden => "hidden",
            InputType::Submit => "submit",
            InputType::Button => "button",
            InputType::Reset => "reset",
            InputType::Checkbox => "checkbox",
            InputType::Radio => "radio",
            InputType::File => "file",
            InputType::Image => "image",
            InputType::Color => "color",
            InputType::Date => "date",
            InputType::DatetimeLocal => "datetime-local",
            InputType::Month => "month",
            InputType::Week => "week",
            InputType::Time => "time",
            InputType::Range => "range",
        }
    }

    /// Check if this is a button type.
    pub fn is_button(&self) -> bool {
        matches!(
            self,
            InputType::Submit | InputType::Button | InputType::Reset | InputType::Image
        )
    }

    /// Check if this is a checkable input.
    pub fn is_checkable(&self) -> bool {
        matches!(self, InputType::Checkbox | InputType::Radio)
    }
}

/// Form submission method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormMethod {
    #[default]
    Get,
    Post,
    Dialog,
}

impl FormMethod {
    /// Parse form method from string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "post" => FormMethod::Post,
            "dialog" => FormMethod::Dialog,
            _ => FormMethod::Get,
        }
    }

    /// The reflected `method` IDL value.
    pub fn as_str(&self) -> &'static str {
        match self {
            FormMethod::Get => "get",
            FormMethod::Post => "post",
            FormMethod::Dialog => "dialog",
        }
    }
}

/// Form data entry for submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormDataEntry {
    pub name: String,
    pub value: String,
}

impl FormDataEntry {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Per-node control state. `None` means "not dirty": the value comes from
/// markup and a form reset returns to it.
#[derive(Debug, Default)]
pub(crate) struct ControlState {
    value: RefCell<Option<String>>,
    checked: Cell<Option<bool>>,
}

impl ControlState {
    fn reset(&self) {
        *self.value.borrow_mut() = None;
        self.checked.set(None);
    }
}

const LISTED_TAGS: &[&str] = &[
    "button", "fieldset", "input", "object", "output", "select", "textarea",
];

/// Listed form-associated elements (the members of `form.elements`).
pub fn is_form_control(node: &Node) -> bool {
    LISTED_TAGS.iter().any(|t| node.is_tag(t))
}

impl Node {
    /// Input type (`text` for non-input elements).
    pub fn input_type(&self) -> InputType {
        if self.is_tag("input") {
            self.get_attribute("type")
                .map(|t| InputType::from_str(&t))
                .unwrap_or_default()
        } else {
            InputType::Text
        }
    }

    /// The raw `type` attribute as a script would read it.
    pub fn control_type(&self) -> String {
        if self.is_tag("input") {
            return self.input_type().as_str().to_string();
        }
        if self.is_tag("button") {
            return match self.get_attribute("type").map(|t| t.to_lowercase()) {
                Some(t) if t == "button" || t == "reset" => t,
                _ => "submit".to_string(),
            };
        }
        if self.is_tag("select") {
            return if self.has_attribute("multiple") {
                "select-multiple".to_string()
            } else {
                "select-one".to_string()
            };
        }
        self.tag_name().unwrap_or_default().to_lowercase()
    }

    /// Disabled via its own attribute or an ancestor `<fieldset disabled>`.
    pub fn is_disabled(&self) -> bool {
        if self.has_attribute("disabled") {
            return true;
        }
        let mut current = self.parent();
        while let Some(node) = current {
            if node.is_tag("fieldset") && node.has_attribute("disabled") {
                return true;
            }
            current = node.parent();
        }
        false
    }

    /// Set or clear the `disabled` attribute.
    pub fn set_disabled(&self, disabled: bool) -> Result<(), DomError> {
        if disabled {
            self.set_attribute("disabled", "disabled")
        } else {
            self.remove_attribute("disabled");
            Ok(())
        }
    }

    /// Current value of a form control.
    pub fn value(&self) -> String {
        if self.is_tag("select") {
            return self
                .selected_options()
                .first()
                .map(|o| o.option_value())
                .unwrap_or_default();
        }
        if let Some(dirty) = self.control.value.borrow().clone() {
            return dirty;
        }
        if self.is_tag("textarea") {
            return self.text_content();
        }
        if self.is_tag("option") {
            return self.option_value();
        }
        match self.get_attribute("value") {
            Some(v) => v,
            None if self.input_type().is_checkable() => "on".to_string(),
            None => String::new(),
        }
    }

    /// Set the value of a form control. On a `<select>` this selects the
    /// first option with a matching value and deselects the others.
    pub fn set_value(&self, value: &str) -> Result<(), DomError> {
        if self.is_tag("select") {
            let mut matched = false;
            for option in self.options() {
                let is_match = !matched && option.option_value() == value;
                matched |= is_match;
                option.control.checked.set(Some(is_match));
            }
            return Ok(());
        }
        if !is_form_control(self) && !self.is_tag("option") {
            return Err(DomError::InvalidOperation(format!(
                "<{}> has no value",
                self.tag_name().unwrap_or("#node")
            )));
        }
        // Hidden, button-like and checkable inputs reflect into the attribute
        if self.is_tag("input") {
            let input_type = self.input_type();
            if input_type == InputType::Hidden || input_type.is_button() || input_type.is_checkable() {
                return self.set_attribute("value", value);
            }
        }
        *self.control.value.borrow_mut() = Some(value.to_string());
        Ok(())
    }

    /// Checkedness of a checkbox/radio.
    pub fn is_checked(&self) -> bool {
        self.control
            .checked
            .get()
            .unwrap_or_else(|| self.has_attribute("checked"))
    }

    /// Set checkedness. Checking a radio unchecks the rest of its group
    /// inside the same form.
    pub fn set_checked(self: &Rc<Self>, checked: bool) {
        self.control.checked.set(Some(checked));
        if !checked || self.input_type() != InputType::Radio {
            return;
        }
        let Some(name) = self.get_attribute("name") else {
            return;
        };
        let scope = self
            .closest("form")
            .or_else(|| self.root_ancestor());
        if let Some(scope) = scope {
            for other in scope.descendants() {
                if !Rc::ptr_eq(&other, self)
                    && other.input_type() == InputType::Radio
                    && other.get_attribute("name").as_deref() == Some(name.as_str())
                {
                    other.control.checked.set(Some(false));
                }
            }
        }
    }

    /// Nearest inclusive ancestor with the given tag.
    pub fn closest(self: &Rc<Self>, tag_name: &str) -> Option<Rc<Node>> {
        let mut current = Some(self.clone());
        while let Some(node) = current {
            if node.is_tag(tag_name) {
                return Some(node);
            }
            current = node.parent();
        }
        None
    }

    fn root_ancestor(&self) -> Option<Rc<Node>> {
        let mut current = self.parent()?;
        while let Some(parent) = current.parent() {
            current = parent;
        }
        Some(current)
    }

    fn options(&self) -> Vec<Rc<Node>> {
        self.descendants()
            .into_iter()
            .filter(|n| n.is_tag("option"))
            .collect()
    }

    fn option_value(&self) -> String {
        self.get_attribute("value").unwrap_or_else(|| {
            self.text_content()
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" ")
        })
    }

    fn option_selected(&self) -> bool {
        self.control
            .checked
            .get()
            .unwrap_or_else(|| self.has_attribute("selected"))
    }

    /// Selected options of a `<select>`. A single-select without an explicit
    /// selection selects its first enabled option.
    pub fn selected_options(&self) -> Vec<Rc<Node>> {
        let options = self.options();
        let selected: Vec<Rc<Node>> = options
            .iter()
            .filter(|o| o.option_selected())
            .cloned()
            .collect();
        if self.has_attribute("multiple") {
            return selected;
        }
        if let Some(first) = selected.into_iter().next() {
            return vec![first];
        }
        options
            .into_iter()
            .find(|o| !o.has_attribute("disabled"))
            .into_iter()
            .collect()
    }
}

impl Document {
    /// Listed controls of `form` in tree order (`form.elements`).
    pub fn form_elements(&self, form: &Rc<Node>) -> Vec<Rc<Node>> {
        form.descendants()
            .into_iter()
            .filter(|n| is_form_control(n) && !(n.is_tag("input") && n.input_type() == InputType::Image))
            .collect()
    }

    /// Construct the entry list a `FormData` built from `form` would hold.
    pub fn form_data(&self, form: &Rc<Node>) -> Vec<FormDataEntry> {
        let mut entries = Vec::new();

        for control in form.descendants() {
            let submittable = ["button", "input", "object", "select", "textarea"]
                .iter()
                .any(|t| control.is_tag(t));
            if !submittable || control.is_disabled() {
                continue;
            }
            let name = match control.get_attribute("name") {
                Some(name) if !name.is_empty() => name,
                _ => continue,
            };
            if control.is_tag("button") || control.is_tag("object") {
                continue;
            }

            if control.is_tag("select") {
                for option in control.selected_options() {
                    if !option.has_attribute("disabled") {
                        entries.push(FormDataEntry::new(name.clone(), option.option_value()));
                    }
                }
                continue;
            }

            if control.is_tag("input") {
                let input_type = control.input_type();
                if input_type.is_button() || input_type == InputType::File {
                    continue;
                }
                if input_type.is_checkable() && !control.is_checked() {
                    continue;
                }
            }

            entries.push(FormDataEntry::new(name, control.value()));
        }

        debug!(count = entries.len(), "Collected form data");
        entries
    }

    /// Reset a form: fire a cancelable `reset` event and, unless prevented,
    /// return every control to its markup state.
    pub fn reset_form(&self, form: &Rc<Node>) -> bool {
        let mut event = DomEvent::reset();
        if !self.dispatch_event(form, &mut event) {
            return false;
        }
        for node in form.descendants() {
            node.control.reset();
        }
        true
    }

    /// The form's `action`, resolved against the document URL.
    /// A missing or empty action resolves to the document URL.
    pub fn form_action(&self, form: &Rc<Node>) -> Result<Url, DomError> {
        let action = form.get_attribute("action").unwrap_or_default();
        let action = action.trim();
        match self.url() {
            Some(base) if action.is_empty() => Ok(base),
            Some(base) => Ok(base.join(action)?),
            None => Ok(Url::parse(action)?),
        }
    }

    /// The form's submission method.
    pub fn form_method(&self, form: &Rc<Node>) -> FormMethod {
        form.get_attribute("method")
            .map(|m| FormMethod::from_str(&m))
            .unwrap_or_default()
    }
}
