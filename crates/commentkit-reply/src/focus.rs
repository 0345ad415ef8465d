//! Initial focus for a relocated form.

use std::rc::Rc;

use commentkit_dom::{Document, DomError, Node, Visibility};
use tracing::trace;

/// Whether CSS keeps `control` off screen: no layout box, or a computed
/// `visibility` of `hidden`.
pub fn is_css_hidden(document: &Document, control: &Rc<Node>) -> Result<bool, DomError> {
    let rendered = document.is_rendered(control)?;
    let visibility = document.computed_visibility(control)?;
    Ok(!rendered || visibility == Visibility::Hidden)
}

/// First control of `form`, in tree order, that can take focus: not
/// `type=hidden`, not disabled and not hidden by CSS.
pub fn first_focusable(document: &Document, form: &Rc<Node>) -> Result<Option<Rc<Node>>, DomError> {
    for control in document.form_elements(form) {
        let css_hidden = is_css_hidden(document, &control)?;
        if control.control_type() == "hidden" || control.is_disabled() || css_hidden {
            continue;
        }
        return Ok(Some(control));
    }
    Ok(None)
}

/// Focus the first focusable control of `form`. Style failures end the
/// scan quietly.
pub fn focus_first_control(document: &Document, form: &Rc<Node>) -> Option<Rc<Node>> {
    match first_focusable(document, form) {
        Ok(Some(control)) => {
            document.focus(&control);
            Some(control)
        }
        Ok(None) => None,
        Err(e) => {
            trace!(error = %e, "Focus scan stopped");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form_of(doc: &Document) -> Rc<Node> {
        doc.get_elements_by_tag_name("form").remove(0)
    }

    #[test]
    fn test_skips_hidden_disabled_and_invisible() {
        let html = r#"<html><body><form>
<input type="hidden" name="a">
<input name="b" disabled>
<fieldset disabled><input name="c"></fieldset>
<div style="display: none"><input name="d"></div>
<input name="e" style="visibility: hidden">
<textarea name="f"></textarea>
<input name="g">
</form></body></html>"#;
        let doc = Document::parse_html(html).unwrap();
        let form = form_of(&doc);

        let focused = focus_first_control(&doc, &form).unwrap();
        assert_eq!(focused.get_attribute("name").as_deref(), Some("f"));
        assert!(Rc::ptr_eq(&doc.active_element().unwrap(), &focused));
    }

    #[test]
    fn test_nothing_focusable() {
        let html = r#"<html><body><form>
<input type="hidden" name="a"><input name="b" disabled>
</form></body></html>"#;
        let doc = Document::parse_html(html).unwrap();
        assert!(focus_first_control(&doc, &form_of(&doc)).is_none());
        assert!(doc.active_element().is_none());
    }

    #[test]
    fn test_detached_form_stops_quietly() {
        let html = r#"<html><body><form><input name="a"></form></body></html>"#;
        let doc = Document::parse_html(html).unwrap();
        let form = form_of(&doc);
        form.detach();

        assert!(first_focusable(&doc, &form).is_err());
        assert!(focus_first_control(&doc, &form).is_none());
    }
}
