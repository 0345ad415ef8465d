//! # CommentKit Form
//!
//! Asynchronous submission of a static site's comment form.
//!
//! Bracketed field names (`fields[name]`, `options[slug]`) are folded into a
//! nested JSON object and posted to the form's action in CORS mode. The
//! success message, submit button and CAPTCHA are updated around the
//! exchange.

pub mod captcha;
pub mod payload;
pub mod submit;

pub use captcha::{CaptchaWidget, CountingCaptcha};
pub use payload::{key_path, set_path, Payload};
pub use submit::{is_truthy, SubmissionHandler, SubmitOutcome, SubmitUi};
