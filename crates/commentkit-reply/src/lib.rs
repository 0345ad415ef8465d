//! # CommentKit Reply
//!
//! "Reply to comment" support: the page's reply form is moved right under
//! the comment being answered, and a cancel link puts it back.
//!
//! All state lives in a [`ReplyRelocator`]; page ids are only used to find
//! elements, never to remember them.

pub mod focus;
pub mod relocate;

pub use focus::{first_focusable, focus_first_control, is_css_hidden};
pub use relocate::{
    CancelOutcome, MoveOutcome, ReplyPosition, ReplyRelocator, ReplyUi, SkipReason,
};
