//! Moving the reply form under the comment being answered.
//!
//! The form's home is marked by a hidden placeholder created on the first
//! move. Cancelling puts the form back in front of the placeholder and
//! removes it, so the page returns to its original shape.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use commentkit_common::{OptionExt, ReplyConfig, Result};
use commentkit_dom::{Document, DomEvent, Node};
use tracing::{debug, warn};

use crate::focus::focus_first_control;

/// Elements the relocator drives, resolved once.
#[derive(Debug, Clone)]
pub struct ReplyUi {
    pub cancel_link: Rc<Node>,
    pub replying_to: Rc<Node>,
    pub post_slug: Option<Rc<Node>>,
}

impl ReplyUi {
    pub fn bind(document: &Document, config: &ReplyConfig) -> Result<Self> {
        let cancel_link = document
            .get_element_by_id(&config.cancel_link_id)
            .ok_or_missing("cancel reply link", format!("#{}", config.cancel_link_id))?;
        let replying_to = document
            .get_element_by_id(&config.replying_to_id)
            .ok_or_missing("replying-to field", format!("#{}", config.replying_to_id))?;
        Ok(Self {
            cancel_link,
            replying_to,
            post_slug: document.get_element_by_id(&config.post_slug_id),
        })
    }
}

/// Where the reply container currently sits.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ReplyPosition {
    #[default]
    Original,
    /// Right after the comment with this id.
    AfterComment(String),
}

/// Why a move request was ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    CommentNotFound,
    RespondNotFound,
    FormNotFound,
    CancelLinkDetached,
    ReplyingToDetached,
    /// The comment sits inside the reply container itself.
    CommentInsideRespond,
    /// The reply container is the document root.
    RespondHasNoParent,
    /// Reply support is not set up on this page.
    Unavailable,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveOutcome {
    Moved,
    Skipped(SkipReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelOutcome {
    Restored,
    /// No relocation to undo.
    NotActive,
}

struct Targets {
    comment: Rc<Node>,
    comment_parent: Rc<Node>,
    respond: Rc<Node>,
    home: Rc<Node>,
    form: Rc<Node>,
}

#[derive(Debug, Default)]
struct ReplyState {
    respond: Option<Rc<Node>>,
    placeholder: Option<Rc<Node>>,
    position: ReplyPosition,
}

/// Moves the reply form next to a comment and back.
pub struct ReplyRelocator {
    document: Rc<Document>,
    ui: ReplyUi,
    config: ReplyConfig,
    state: RefCell<ReplyState>,
}

impl ReplyRelocator {
    pub fn bind(document: Rc<Document>, config: ReplyConfig) -> Result<Rc<Self>> {
        let ui = ReplyUi::bind(&document, &config)?;
        Ok(Rc::new(Self {
            document,
            ui,
            config,
            state: RefCell::new(ReplyState::default()),
        }))
    }

    pub fn ui(&self) -> &ReplyUi {
        &self.ui
    }

    pub fn position(&self) -> ReplyPosition {
        self.state.borrow().position.clone()
    }

    /// The placeholder marking the form's home, while relocated.
    pub fn placeholder(&self) -> Option<Rc<Node>> {
        self.state.borrow().placeholder.clone()
    }

    /// Move the reply container `respond_id` right after `comment_id` and
    /// point the form at `parent_id`.
    ///
    /// Nothing is touched unless every element involved is in the document.
    pub fn move_form(
        self: &Rc<Self>,
        comment_id: &str,
        parent_id: &str,
        respond_id: &str,
        post_id: Option<&str>,
    ) -> MoveOutcome {
        let doc = &self.document;

        let Targets {
            comment,
            comment_parent,
            respond,
            home,
            form,
        } = match self.resolve(comment_id, respond_id) {
            Ok(targets) => targets,
            Err(reason) => {
                debug!(comment = comment_id, respond = respond_id, ?reason, "Reply move skipped");
                return MoveOutcome::Skipped(reason);
            }
        };

        {
            let mut state = self.state.borrow_mut();

            let placeholder_live = state
                .placeholder
                .as_ref()
                .map(|p| doc.is_connected(p))
                .unwrap_or(false);
            // the container's current slot, captured before it moves
            let home_slot = (!placeholder_live).then(|| respond.next_sibling());

            let mut next = comment.next_sibling();
            if next.as_ref().is_some_and(|n| Rc::ptr_eq(n, &respond)) {
                next = respond.next_sibling();
            }
            if let Err(e) = comment_parent.insert_before(respond.clone(), next.as_ref()) {
                warn!(error = %e, "Could not move reply form");
                return MoveOutcome::Skipped(SkipReason::CommentInsideRespond);
            }

            if let Some(slot) = home_slot {
                match self.create_placeholder(&home, slot.as_ref()) {
                    Ok(placeholder) => state.placeholder = Some(placeholder),
                    Err(e) => warn!(error = %e, "Could not mark reply form position"),
                }
            }

            state.respond = Some(respond);
            state.position = ReplyPosition::AfterComment(comment_id.to_string());
        }

        let post = self.ui.post_slug.as_ref().filter(|p| doc.is_connected(p));
        if let (Some(post), Some(post_id)) = (post, post_id.filter(|p| !p.is_empty())) {
            if let Err(e) = post.set_value(post_id) {
                warn!(error = %e, "Could not set post id");
            }
        }
        if let Err(e) = self.ui.replying_to.set_value(parent_id) {
            warn!(error = %e, "Could not set replying-to field");
        }

        if let Err(e) = self.ui.cancel_link.set_style_property("display", "") {
            warn!(error = %e, "Could not reveal cancel link");
        }
        self.arm_cancel_link();

        debug!(comment = comment_id, parent = parent_id, "Reply form moved");
        focus_first_control(doc, &form);
        MoveOutcome::Moved
    }

    /// Put the reply container back where it started.
    pub fn cancel(&self) -> CancelOutcome {
        let doc = &self.document;
        let mut state = self.state.borrow_mut();

        let (Some(placeholder), Some(respond)) = (state.placeholder.clone(), state.respond.clone())
        else {
            return CancelOutcome::NotActive;
        };
        if !doc.is_connected(&respond) {
            return CancelOutcome::NotActive;
        }
        let Some(home) = placeholder.parent().filter(|_| doc.is_connected(&placeholder)) else {
            return CancelOutcome::NotActive;
        };

        if let Err(e) = self.ui.replying_to.set_value("") {
            warn!(error = %e, "Could not clear replying-to field");
        }
        if let Err(e) = home.insert_before(respond, Some(&placeholder)) {
            warn!(error = %e, "Could not restore reply form");
            return CancelOutcome::NotActive;
        }
        placeholder.detach();

        state.placeholder = None;
        state.position = ReplyPosition::Original;

        let cancel = &self.ui.cancel_link;
        if let Err(e) = cancel.set_style_property("display", "none") {
            warn!(error = %e, "Could not hide cancel link");
        }
        cancel.event_target.set_event_handler("click", None);

        debug!("Reply form restored");
        CancelOutcome::Restored
    }

    fn resolve(
        &self,
        comment_id: &str,
        respond_id: &str,
    ) -> std::result::Result<Targets, SkipReason> {
        let doc = &self.document;
        let comment = doc
            .get_element_by_id(comment_id)
            .ok_or(SkipReason::CommentNotFound)?;
        let respond = doc
            .get_element_by_id(respond_id)
            .ok_or(SkipReason::RespondNotFound)?;
        if !doc.is_connected(&self.ui.cancel_link) {
            return Err(SkipReason::CancelLinkDetached);
        }
        if !doc.is_connected(&self.ui.replying_to) {
            return Err(SkipReason::ReplyingToDetached);
        }
        let form = respond
            .first_descendant_by_tag("form")
            .ok_or(SkipReason::FormNotFound)?;
        if respond.contains(&comment) {
            return Err(SkipReason::CommentInsideRespond);
        }
        let home = respond.parent().ok_or(SkipReason::RespondHasNoParent)?;
        let comment_parent = comment.parent().ok_or(SkipReason::CommentNotFound)?;
        Ok(Targets {
            comment,
            comment_parent,
            respond,
            home,
            form,
        })
    }

    fn create_placeholder(
        &self,
        home: &Rc<Node>,
        before: Option<&Rc<Node>>,
    ) -> std::result::Result<Rc<Node>, commentkit_dom::DomError> {
        let placeholder = self.document.create_element("div");
        placeholder.add_class(&self.config.placeholder_class)?;
        placeholder.set_style_property("display", "none")?;
        home.insert_before(placeholder.clone(), before)?;
        Ok(placeholder)
    }

    fn arm_cancel_link(self: &Rc<Self>) {
        let weak: Weak<Self> = Rc::downgrade(self);
        self.ui.cancel_link.event_target.set_event_handler(
            "click",
            Some(Box::new(move |event: &DomEvent| {
                let Some(relocator) = weak.upgrade() else {
                    return;
                };
                if relocator.cancel() == CancelOutcome::Restored {
                    event.event().prevent_default();
                }
            })),
        );
    }
}
