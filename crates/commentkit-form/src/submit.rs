//! Comment form submission.
//!
//! The submit listener cancels navigation, locks the submit button and
//! prepares the request synchronously ([`SubmissionHandler::begin`]); the
//! exchange itself is awaited separately ([`SubmissionHandler::send`]).
//! Whatever happens, the button and CAPTCHA are restored afterwards.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use http::Method;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, error, info, warn};

use commentkit_common::{CommentKitError, FormConfig, OptionExt, Result, ResultExt};
use commentkit_dom::{
    AddEventListenerOptions, Dialogs, Document, DomError, DomEvent, LoggingDialogs, Node,
};
use commentkit_http::{Request, RequestMode, Transport};

use crate::captcha::CaptchaWidget;
use crate::payload::Payload;

/// Page elements the submission handler drives, resolved once.
#[derive(Debug, Clone)]
pub struct SubmitUi {
    pub form: Rc<Node>,
    pub submit_button: Rc<Node>,
    pub success_message: Rc<Node>,
    pub close_button: Rc<Node>,
}

impl SubmitUi {
    /// Resolve every element or fail on the first missing one.
    pub fn bind(document: &Document, config: &FormConfig) -> Result<Self> {
        let form = document
            .query_selector(&config.form_selector)
            .ok_or_missing("comment form", config.form_selector.as_str())?;
        if !form.is_tag("form") {
            return Err(CommentKitError::config(format!(
                "{} does not select a <form>",
                config.form_selector
            )));
        }

        let by_id = |role: &'static str, id: &str| {
            document
                .get_element_by_id(id)
                .ok_or_missing(role, format!("#{}", id))
        };

        Ok(Self {
            form,
            submit_button: by_id("submit button", &config.submit_button_id)?,
            success_message: by_id("success message", &config.success_message_id)?,
            close_button: by_id("close button", &config.close_button_id)?,
        })
    }
}

/// How a submission ended.
#[derive(Debug)]
pub enum SubmitOutcome {
    /// The endpoint reported success.
    Accepted,
    /// The endpoint answered with a falsy `success`.
    Rejected {
        error_code: Option<String>,
        message: Option<String>,
    },
    /// No usable answer: bad request, network failure or a non-JSON body.
    Failed(CommentKitError),
}

impl SubmitOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, SubmitOutcome::Accepted)
    }
}

/// Body of the comment endpoint's answer.
#[derive(Debug, Default, Deserialize)]
struct CommentApiResponse {
    #[serde(default)]
    success: Option<Value>,
    #[serde(default, rename = "errorCode")]
    error_code: Option<Value>,
    #[serde(default)]
    message: Option<Value>,
}

impl CommentApiResponse {
    fn into_outcome(self) -> SubmitOutcome {
        if is_truthy(self.success.as_ref()) {
            SubmitOutcome::Accepted
        } else {
            SubmitOutcome::Rejected {
                error_code: self.error_code.map(display_value),
                message: self.message.map(display_value),
            }
        }
    }
}

/// Script truthiness: null, false, zero, NaN and "" are falsy.
pub fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().map(|f| f != 0.0 && !f.is_nan()).unwrap_or(true),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
    }
}

fn display_value(value: Value) -> String {
    match value {
        Value::String(s) => s,
        other => other.to_string(),
    }
}

fn button_label(button: &Node) -> String {
    if button.is_tag("input") {
        button.value()
    } else {
        button.text_content()
    }
}

fn set_button_label(
    document: &Document,
    button: &Rc<Node>,
    label: &str,
) -> std::result::Result<(), DomError> {
    if button.is_tag("input") {
        button.set_attribute("value", label)
    } else {
        document.set_text_content(button, label)
    }
}

struct Pending {
    label: String,
    request: Result<Request>,
}

enum SubmitState {
    Idle,
    Pending(Pending),
    InFlight,
}

/// Posts the comment form as JSON and drives its feedback elements.
pub struct SubmissionHandler<T> {
    document: Rc<Document>,
    ui: SubmitUi,
    config: FormConfig,
    transport: T,
    dialogs: Box<dyn Dialogs>,
    captcha: Option<Box<dyn CaptchaWidget>>,
    state: RefCell<SubmitState>,
}

impl<T: Transport> SubmissionHandler<T> {
    /// Bind to the page. Alerts go to the log until
    /// [`with_dialogs`](Self::with_dialogs) is used.
    pub fn bind(document: Rc<Document>, config: FormConfig, transport: T) -> Result<Self> {
        let ui = SubmitUi::bind(&document, &config)?;
        Ok(Self {
            document,
            ui,
            config,
            transport,
            dialogs: Box::new(LoggingDialogs),
            captcha: None,
            state: RefCell::new(SubmitState::Idle),
        })
    }

    pub fn with_dialogs(mut self, dialogs: impl Dialogs + 'static) -> Self {
        self.dialogs = Box::new(dialogs);
        self
    }

    /// Attach the form's CAPTCHA widget.
    pub fn with_captcha(mut self, captcha: impl CaptchaWidget + 'static) -> Self {
        self.captcha = Some(Box::new(captcha));
        self
    }

    pub fn ui(&self) -> &SubmitUi {
        &self.ui
    }

    pub fn has_captcha(&self) -> bool {
        self.captcha.is_some()
    }

    /// Whether the submit button is locked.
    pub fn is_busy(&self) -> bool {
        self.ui.submit_button.is_disabled()
    }

    /// Listen for form submission and for the close button.
    pub fn install(self: &Rc<Self>)
    where
        T: 'static,
    {
        let weak: Weak<Self> = Rc::downgrade(self);
        self.ui.form.event_target.add_event_listener(
            "submit",
            Box::new(move |event: &DomEvent| {
                if let Some(handler) = weak.upgrade() {
                    handler.begin(event);
                }
            }),
            AddEventListenerOptions::default(),
        );

        let weak: Weak<Self> = Rc::downgrade(self);
        self.ui.close_button.event_target.add_event_listener(
            "click",
            Box::new(move |_: &DomEvent| {
                if let Some(handler) = weak.upgrade() {
                    if let Err(e) = handler.hide_success_message() {
                        warn!(error = %e, "Could not hide success message");
                    }
                }
            }),
            AddEventListenerOptions::default(),
        );

        debug!(selector = %self.config.form_selector, "Comment form handler installed");
    }

    /// Synchronous half of a submission, run from the submit listener.
    /// Returns false when a submission is already under way.
    pub fn begin(&self, event: &DomEvent) -> bool {
        event.event().prevent_default();

        if !matches!(*self.state.borrow(), SubmitState::Idle) {
            debug!("Submission already in progress");
            return false;
        }

        let button = &self.ui.submit_button;
        let label = button_label(button);
        if let Err(e) = button
            .set_disabled(true)
            .and_then(|_| set_button_label(&self.document, button, &self.config.busy_label))
        {
            warn!(error = %e, "Could not lock submit button");
        }

        let entries = self.document.form_data(&self.ui.form);
        let payload = Payload::from_entries(&entries);
        debug!(fields = entries.len(), "Comment payload built");

        let request = self.build_request(&payload);
        *self.state.borrow_mut() = SubmitState::Pending(Pending { label, request });
        true
    }

    /// Asynchronous half: perform the prepared exchange and update the page.
    /// Returns `None` if nothing was prepared.
    pub async fn send(&self) -> Option<SubmitOutcome> {
        let pending = {
            let mut state = self.state.borrow_mut();
            match std::mem::replace(&mut *state, SubmitState::InFlight) {
                SubmitState::Pending(pending) => pending,
                other => {
                    *state = other;
                    return None;
                }
            }
        };

        let outcome = match pending.request {
            Ok(request) => match self.exchange(request).await {
                Ok(answer) => answer.into_outcome(),
                Err(e) => SubmitOutcome::Failed(e),
            },
            Err(e) => SubmitOutcome::Failed(e),
        };

        self.report(&outcome);
        self.finish(&pending.label);
        Some(outcome)
    }

    /// Submit the form the way a click on the submit button would.
    /// Returns `None` while the button is locked or if no listener took
    /// the submission.
    pub async fn submit(&self) -> Option<SubmitOutcome> {
        if self.is_busy() {
            debug!("Submit button is disabled, ignoring submission");
            return None;
        }
        let mut event = DomEvent::submit();
        self.document.dispatch_event(&self.ui.form, &mut event);
        self.send().await
    }

    pub fn hide_success_message(&self) -> Result<()> {
        self.ui
            .success_message
            .add_class(&self.config.hidden_class)
            .dom_context("hide success message")
    }

    fn build_request(&self, payload: &Payload) -> Result<Request> {
        let method = self
            .document
            .form_method(&self.ui.form)
            .as_str()
            .to_ascii_uppercase();
        let method = Method::from_bytes(method.as_bytes())
            .map_err(|e| CommentKitError::config_with_source("form method", e))?;
        let url = self
            .document
            .form_action(&self.ui.form)
            .dom_context("resolve form action")?;

        let mut request = Request::new(method, url)
            .mode(RequestMode::Cors)
            .json(payload)
            .network_context("encode comment payload")?;
        if let Some(page) = self.document.url() {
            request = request.origin(page.origin());
        }
        request.validate().network_context("comment request refused")?;
        Ok(request)
    }

    async fn exchange(&self, request: Request) -> Result<CommentApiResponse> {
        let url = request.url.clone();
        let response = self
            .transport
            .fetch(request)
            .await
            .network_context(format!("comment request to {} failed", url))?;
        debug!(status = %response.status, url = %url, "Comment endpoint answered");
        response
            .json::<CommentApiResponse>()
            .network_context("comment endpoint did not answer with JSON")
    }

    fn report(&self, outcome: &SubmitOutcome) {
        match outcome {
            SubmitOutcome::Accepted => {
                info!("Comment accepted");
                if let Err(e) = self
                    .ui
                    .success_message
                    .remove_class(&self.config.hidden_class)
                {
                    warn!(error = %e, "Could not reveal success message");
                }
                self.document.reset_form(&self.ui.form);
            }
            SubmitOutcome::Rejected {
                error_code,
                message,
            } => {
                error!(error_code = ?error_code, message = ?message, "Comment rejected");
                self.dialogs.alert(&self.config.error_message);
            }
            SubmitOutcome::Failed(e) => {
                error!(error = %e, category = e.category(), "Comment submission failed");
                self.dialogs.alert(&self.config.error_message);
            }
        }
    }

    fn finish(&self, label: &str) {
        let button = &self.ui.submit_button;
        if let Err(e) = button
            .set_disabled(false)
            .and_then(|_| set_button_label(&self.document, button, label))
        {
            warn!(error = %e, "Could not restore submit button");
        }
        if let Some(captcha) = &self.captcha {
            captcha.reset();
        }
        *self.state.borrow_mut() = SubmitState::Idle;
    }
}
