//! CAPTCHA widget hook.

use std::cell::Cell;
use std::rc::Rc;

/// A CAPTCHA widget embedded in the comment form.
///
/// A solved challenge is single-use, so it is reset after every submission
/// attempt whatever the outcome.
pub trait CaptchaWidget {
    fn reset(&self);
}

impl<C: CaptchaWidget + ?Sized> CaptchaWidget for Rc<C> {
    fn reset(&self) {
        (**self).reset()
    }
}

/// Widget that only counts resets.
#[derive(Debug, Default)]
pub struct CountingCaptcha {
    resets: Cell<usize>,
}

impl CountingCaptcha {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn resets(&self) -> usize {
        self.resets.get()
    }
}

impl CaptchaWidget for CountingCaptcha {
    fn reset(&self) {
        self.resets.set(self.resets.get() + 1);
    }
}
