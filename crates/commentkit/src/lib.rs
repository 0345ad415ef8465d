//! # CommentKit
//!
//! Attaches the comment behaviours to a parsed page:
//!
//! - the comment form is submitted as nested JSON through a [`Transport`];
//! - reply links move the form under a comment via [`CommentPage::move_form`].
//!
//! ```no_run
//! use std::rc::Rc;
//! use commentkit::{CommentKitConfig, CommentPage};
//! use commentkit_dom::Document;
//! use commentkit_http::Client;
//!
//! # async fn run(html: &str) -> commentkit_common::Result<()> {
//! let document = Rc::new(Document::parse_html_with_url(html, "https://blog.example/post/")
//!     .map_err(|e| commentkit_common::CommentKitError::dom_with_source("parse page", e))?);
//! let client = commentkit::http_client(&CommentKitConfig::default().http)?;
//! let page = CommentPage::builder(document, CommentKitConfig::default(), client).attach()?;
//! page.move_form("comment-42", "42", "respond", Some("post"));
//! let outcome = page.submit().await;
//! # Ok(())
//! # }
//! ```

use std::path::Path;
use std::rc::Rc;
use std::time::Duration;

use tracing::{debug, info};

pub use commentkit_common::{CommentKitConfig, CommentKitError, Result};
use commentkit_common::{HttpConfig, OptionExt, ResultExt};
use commentkit_dom::{Dialogs, Document, InputType, LoggingDialogs};
use commentkit_form::{CaptchaWidget, SubmissionHandler, SubmitOutcome};
use commentkit_http::{Client, ClientConfig, Transport};
use commentkit_reply::{CancelOutcome, MoveOutcome, ReplyRelocator, SkipReason};

/// Build an HTTP client from the `http` configuration section.
pub fn http_client(config: &HttpConfig) -> Result<Client> {
    Client::with_config(ClientConfig {
        user_agent: config.user_agent.clone(),
        timeout: Duration::from_secs(config.timeout_secs),
        max_redirects: config.max_redirects,
        follow_redirects: true,
        max_body_size: config.max_body_bytes,
    })
    .network_context("create HTTP client")
}

/// Read and parse an HTML page saved at `path`, served from `url`.
pub fn load_page(path: impl AsRef<Path>, url: &str) -> Result<Rc<Document>> {
    let html = std::fs::read_to_string(path.as_ref())?;
    let document = Document::parse_html_with_url(&html, url).dom_context("parse page")?;
    debug!(path = %path.as_ref().display(), url, "Page loaded");
    Ok(Rc::new(document))
}

/// Collects the host hooks before attaching to a page.
pub struct CommentPageBuilder<T> {
    document: Rc<Document>,
    config: CommentKitConfig,
    transport: T,
    dialogs: Rc<dyn Dialogs>,
    captcha: Option<Rc<dyn CaptchaWidget>>,
}

impl<T: Transport + 'static> CommentPageBuilder<T> {
    pub fn dialogs(mut self, dialogs: impl Dialogs + 'static) -> Self {
        self.dialogs = Rc::new(dialogs);
        self
    }

    pub fn captcha(mut self, captcha: impl CaptchaWidget + 'static) -> Self {
        self.captcha = Some(Rc::new(captcha));
        self
    }

    /// Bind both behaviours. The comment form must be present; reply
    /// support is left out when its elements are missing.
    pub fn attach(self) -> Result<CommentPage<T>> {
        let mut handler =
            SubmissionHandler::bind(self.document.clone(), self.config.form, self.transport)?
                .with_dialogs(self.dialogs);
        if let Some(captcha) = self.captcha {
            handler = handler.with_captcha(captcha);
        }
        let submission = Rc::new(handler);
        submission.install();

        let replies = match ReplyRelocator::bind(self.document.clone(), self.config.reply) {
            Ok(relocator) => Some(relocator),
            Err(CommentKitError::MissingElement { role, selector }) => {
                info!(role, %selector, "Reply support disabled");
                None
            }
            Err(e) => return Err(e),
        };

        Ok(CommentPage {
            document: self.document,
            submission,
            replies,
        })
    }
}

/// A page with the comment behaviours attached.
pub struct CommentPage<T> {
    document: Rc<Document>,
    submission: Rc<SubmissionHandler<T>>,
    replies: Option<Rc<ReplyRelocator>>,
}

impl<T: Transport + 'static> CommentPage<T> {
    pub fn builder(
        document: Rc<Document>,
        config: CommentKitConfig,
        transport: T,
    ) -> CommentPageBuilder<T> {
        CommentPageBuilder {
            document,
            config,
            transport,
            dialogs: Rc::new(LoggingDialogs),
            captcha: None,
        }
    }

    pub fn document(&self) -> &Rc<Document> {
        &self.document
    }

    pub fn submission(&self) -> &Rc<SubmissionHandler<T>> {
        &self.submission
    }

    pub fn replies(&self) -> Option<&Rc<ReplyRelocator>> {
        self.replies.as_ref()
    }

    /// Submit the comment form. See [`SubmissionHandler::submit`].
    pub async fn submit(&self) -> Option<SubmitOutcome> {
        self.submission.submit().await
    }

    /// Reply-link entry point: move the reply form under `comment_id`.
    pub fn move_form(
        &self,
        comment_id: &str,
        parent_id: &str,
        respond_id: &str,
        post_id: Option<&str>,
    ) -> MoveOutcome {
        match &self.replies {
            Some(relocator) => relocator.move_form(comment_id, parent_id, respond_id, post_id),
            None => MoveOutcome::Skipped(SkipReason::Unavailable),
        }
    }

    pub fn cancel_reply(&self) -> CancelOutcome {
        self.replies
            .as_ref()
            .map(|r| r.cancel())
            .unwrap_or(CancelOutcome::NotActive)
    }

    /// Fill the comment form control called `name`, the way a visitor
    /// would. Checkboxes and radios are checked when `value` matches
    /// their value.
    pub fn set_field(&self, name: &str, value: &str) -> Result<()> {
        let form = &self.submission.ui().form;
        let controls: Vec<_> = self
            .document
            .form_elements(form)
            .into_iter()
            .filter(|c| c.get_attribute("name").as_deref() == Some(name))
            .collect();
        let first = controls
            .first()
            .cloned()
            .ok_or_missing("form field", format!("[name=\"{}\"]", name))?;

        if first.is_tag("input") && first.input_type().is_checkable() {
            for control in &controls {
                let checked = control.value() == value;
                if checked || control.input_type() == InputType::Checkbox {
                    control.set_checked(checked);
                }
            }
            return Ok(());
        }
        first.set_value(value).dom_context(format!("set field {}", name))
    }
}
