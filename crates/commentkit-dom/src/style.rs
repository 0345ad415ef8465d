//! Inline style declarations and the small slice of computed style the
//! comment behaviours need: whether an element gets a layout box and its
//! effective `visibility`.

use std::rc::Rc;

use crate::{Document, DomError, Node};

/// `display` as far as box generation is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Display {
    None,
    Other,
}

/// Computed `visibility`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Visibility {
    #[default]
    Visible,
    Hidden,
    Collapse,
}

impl Visibility {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "visible" => Some(Visibility::Visible),
            "hidden" => Some(Visibility::Hidden),
            "collapse" => Some(Visibility::Collapse),
            _ => None,
        }
    }
}

/// Parse a `style` attribute into `(property, value)` pairs.
/// Property names are lowercased; later duplicates win on lookup.
pub fn parse_declarations(style: &str) -> Vec<(String, String)> {
    style
        .split(';')
        .filter_map(|decl| {
            let (name, value) = decl.split_once(':')?;
            let name = name.trim().to_ascii_lowercase();
            let value = value.trim();
            if name.is_empty() {
                None
            } else {
                Some((name, value.to_string()))
            }
        })
        .collect()
}

fn serialize_declarations(decls: &[(String, String)]) -> String {
    decls
        .iter()
        .map(|(name, value)| format!("{}: {};", name, value))
        .collect::<Vec<_>>()
        .join(" ")
}

impl Node {
    /// Read an inline style property.
    pub fn style_property(&self, name: &str) -> Option<String> {
        let style = self.get_attribute("style")?;
        parse_declarations(&style)
            .into_iter()
            .rev()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v)
    }

    /// Set an inline style property; an empty value removes it.
    pub fn set_style_property(&self, name: &str, value: &str) -> Result<(), DomError> {
        let name = name.to_ascii_lowercase();
        let mut decls: Vec<(String, String)> = self
            .get_attribute("style")
            .map(|s| parse_declarations(&s))
            .unwrap_or_default()
            .into_iter()
            .filter(|(n, _)| *n != name)
            .collect();
        if !value.is_empty() {
            decls.push((name, value.to_string()));
        }
        if decls.is_empty() && !self.has_attribute("style") {
            return Ok(());
        }
        self.set_attribute("style", serialize_declarations(&decls))
    }

    /// Inline `display` of this element alone.
    pub fn inline_display(&self) -> Display {
        match self.style_property("display") {
            Some(v) if v.eq_ignore_ascii_case("none") => Display::None,
            _ if self.has_attribute("hidden") => Display::None,
            _ => Display::Other,
        }
    }
}

impl Document {
    /// Whether `node` generates a layout box (non-zero offset size).
    /// Fails for nodes outside the document: they have no computed style.
    pub fn is_rendered(&self, node: &Rc<Node>) -> Result<bool, DomError> {
        if !self.is_connected(node) {
            return Err(DomError::InvalidOperation(
                "no computed style for a node outside the document".to_string(),
            ));
        }
        let mut current = Some(node.clone());
        while let Some(n) = current {
            if n.is_element() && n.inline_display() == Display::None {
                return Ok(false);
            }
            current = n.parent();
        }
        Ok(true)
    }

    /// Computed `visibility`: the nearest inline value on the element or an
    /// ancestor, `inherit` deferring further up.
    pub fn computed_visibility(&self, node: &Rc<Node>) -> Result<Visibility, DomError> {
        if !self.is_connected(node) {
            return Err(DomError::InvalidOperation(
                "no computed style for a node outside the document".to_string(),
            ));
        }
        let mut current = Some(node.clone());
        while let Some(n) = current {
            if let Some(value) = n.style_property("visibility") {
                if let Some(visibility) = Visibility::parse(&value) {
                    return Ok(visibility);
                }
            }
            current = n.parent();
        }
        Ok(Visibility::Visible)
    }
}
