//! # CommentKit DOM
//!
//! In-memory document model the comment behaviours run against.
//! Uses html5ever for HTML parsing and constructs a mutable DOM tree.
//!
//! ## Design Goals
//!
//! 1. **Spec-compliant parsing**: html5ever implements the HTML5 parsing algorithm
//! 2. **Live tree**: lookups walk the current tree, so they see every mutation
//! 3. **Query support**: Element lookup by ID, class, tag name
//! 4. **Mutation support**: Node insertion, removal, attribute modification
//! 5. **Event dispatch**: DOM Events with capture/bubble phases

pub mod events;
pub mod forms;
pub mod style;
pub mod window;

pub use events::{
    AddEventListenerOptions, DomEvent, Event, EventDispatcher, EventId, EventListenerCallback,
    EventPhase, EventTarget, FocusEventData, MouseEventData,
};
pub use forms::{FormDataEntry, FormMethod, InputType};
pub use style::{Display, Visibility};
pub use window::{Dialogs, LoggingDialogs, RecordingDialogs};

use html5ever::parse_document;
use html5ever::tendril::TendrilSink;
use markup5ever_rcdom::{Handle, NodeData, RcDom};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::{Rc, Weak};
use thiserror::Error;
use tracing::{debug, trace};
use url::Url;

/// Errors that can occur in DOM operations.
#[derive(Error, Debug)]
pub enum DomError {
    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Node not found")]
    NodeNotFound,

    #[error("Hierarchy request error: {0}")]
    HierarchyRequest(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

/// Unique identifier for a DOM node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

impl NodeId {
    /// Create a new NodeId.
    pub fn new(id: usize) -> Self {
        Self(id)
    }

    /// Get the raw ID value.
    pub fn raw(&self) -> usize {
        self.0
    }
}

/// Type of DOM node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeType {
    Document,
    DocumentType {
        name: String,
        public_id: String,
        system_id: String,
    },
    Element {
        tag_name: String,
        namespace: String,
        attributes: RefCell<HashMap<String, String>>,
    },
    Text(RefCell<String>),
    Comment(String),
    ProcessingInstruction {
        target: String,
        data: String,
    },
}

/// A DOM node.
#[derive(Debug)]
pub struct Node {
    /// Unique ID for this node.
    pub id: NodeId,
    /// Node type and associated data.
    pub node_type: NodeType,
    /// Parent node (weak reference to avoid cycles).
    parent: RefCell<Option<Weak<Node>>>,
    /// Child nodes.
    children: RefCell<Vec<Rc<Node>>>,
    /// Dirty value/checkedness for form controls.
    pub(crate) control: forms::ControlState,
    /// Event target mixin for event handling.
    pub event_target: EventTarget,
}

impl Node {
    /// Create a new node.
    pub fn new(id: NodeId, node_type: NodeType) -> Rc<Self> {
        Rc::new(Self {
            id,
            node_type,
            parent: RefCell::new(None),
            children: RefCell::new(Vec::new()),
            control: forms::ControlState::default(),
            event_target: EventTarget::new(),
        })
    }

    /// Get the tag name for element nodes.
    pub fn tag_name(&self) -> Option<&str> {
        match &self.node_type {
            NodeType::Element { tag_name, .. } => Some(tag_name),
            _ => None,
        }
    }

    /// Check the tag name (ASCII case-insensitive).
    pub fn is_tag(&self, name: &str) -> bool {
        self.tag_name()
            .map(|t| t.eq_ignore_ascii_case(name))
            .unwrap_or(false)
    }

    /// Get an attribute value.
    pub fn get_attribute(&self, name: &str) -> Option<String> {
        match &self.node_type {
            NodeType::Element { attributes, .. } => attributes.borrow().get(name).cloned(),
            _ => None,
        }
    }

    /// Check whether an attribute is present.
    pub fn has_attribute(&self, name: &str) -> bool {
        match &self.node_type {
            NodeType::Element { attributes, .. } => attributes.borrow().contains_key(name),
            _ => false,
        }
    }

    /// Set an attribute value.
    pub fn set_attribute(&self, name: &str, value: impl Into<String>) -> Result<(), DomError> {
        match &self.node_type {
            NodeType::Element { attributes, .. } => {
                attributes
                    .borrow_mut()
                    .insert(name.to_ascii_lowercase(), value.into());
                Ok(())
            }
            _ => Err(DomError::InvalidOperation(
                "attributes exist only on elements".to_string(),
            )),
        }
    }

    /// Remove an attribute. Returns the previous value.
    pub fn remove_attribute(&self, name: &str) -> Option<String> {
        match &self.node_type {
            NodeType::Element { attributes, .. } => attributes.borrow_mut().remove(name),
            _ => None,
        }
    }

    /// The `id` attribute.
    pub fn element_id(&self) -> Option<String> {
        self.get_attribute("id")
    }

    /// Class names from the `class` attribute.
    pub fn class_list(&self) -> Vec<String> {
        self.get_attribute("class")
            .map(|c| c.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default()
    }

    /// Check for a class name.
    pub fn has_class(&self, class_name: &str) -> bool {
        self.get_attribute("class")
            .map(|c| c.split_whitespace().any(|cls| cls == class_name))
            .unwrap_or(false)
    }

    /// Add a class name if absent.
    pub fn add_class(&self, class_name: &str) -> Result<(), DomError> {
        let mut classes = self.class_list();
        if classes.iter().any(|c| c == class_name) {
            return Ok(());
        }
        classes.push(class_name.to_string());
        self.set_attribute("class", classes.join(" "))
    }

    /// Remove every occurrence of a class name.
    pub fn remove_class(&self, class_name: &str) -> Result<(), DomError> {
        if !self.has_attribute("class") {
            return Ok(());
        }
        let classes: Vec<String> = self
            .class_list()
            .into_iter()
            .filter(|c| c != class_name)
            .collect();
        self.set_attribute("class", classes.join(" "))
    }

    /// Get the text content.
    pub fn text_content(&self) -> String {
        let mut result = String::new();
        self.collect_text(&mut result);
        result
    }

    fn collect_text(&self, result: &mut String) {
        match &self.node_type {
            NodeType::Text(text) => result.push_str(&text.borrow()),
            NodeType::Comment(_) | NodeType::ProcessingInstruction { .. } => {}
            _ => {
                for child in self.children.borrow().iter() {
                    child.collect_text(result);
                }
            }
        }
    }

    /// Get parent node.
    pub fn parent(&self) -> Option<Rc<Node>> {
        self.parent.borrow().as_ref().and_then(|w| w.upgrade())
    }

    /// Get child nodes.
    pub fn children(&self) -> Vec<Rc<Node>> {
        self.children.borrow().clone()
    }

    /// Get element children only.
    pub fn element_children(&self) -> Vec<Rc<Node>> {
        self.children
            .borrow()
            .iter()
            .filter(|n| n.is_element())
            .cloned()
            .collect()
    }

    /// Position of this node among its parent's children.
    pub fn index_in_parent(&self) -> Option<usize> {
        let parent = self.parent()?;
        let index = parent
            .children
            .borrow()
            .iter()
            .position(|c| std::ptr::eq(Rc::as_ptr(c), self));
        index
    }

    /// Get previous sibling.
    pub fn previous_sibling(&self) -> Option<Rc<Node>> {
        let parent = self.parent()?;
        let index = self.index_in_parent()?;
        let sibling = index
            .checked_sub(1)
            .and_then(|i| parent.children.borrow().get(i).cloned());
        sibling
    }

    /// Get next sibling.
    pub fn next_sibling(&self) -> Option<Rc<Node>> {
        let parent = self.parent()?;
        let index = self.index_in_parent()?;
        let sibling = parent.children.borrow().get(index + 1).cloned();
        sibling
    }

    /// Check if this is an element node.
    pub fn is_element(&self) -> bool {
        matches!(self.node_type, NodeType::Element { .. })
    }

    /// Inclusive descendant check.
    pub fn contains(&self, other: &Rc<Node>) -> bool {
        let mut current = Some(other.clone());
        while let Some(node) = current {
            if std::ptr::eq(Rc::as_ptr(&node), self) {
                return true;
            }
            current = node.parent();
        }
        false
    }

    /// Descendants in tree order, excluding this node.
    pub fn descendants(&self) -> Vec<Rc<Node>> {
        let mut out = Vec::new();
        for child in self.children.borrow().iter() {
            out.push(child.clone());
            out.extend(child.descendants());
        }
        out
    }

    /// First descendant element with the given tag name.
    pub fn first_descendant_by_tag(&self, tag_name: &str) -> Option<Rc<Node>> {
        self.descendants().into_iter().find(|n| n.is_tag(tag_name))
    }

    /// Remove this node from its parent, if any.
    pub fn detach(&self) {
        if let Some(parent) = self.parent() {
            parent
                .children
                .borrow_mut()
                .retain(|c| !std::ptr::eq(Rc::as_ptr(c), self));
        }
        *self.parent.borrow_mut() = None;
    }

    /// Append a child node, moving it from its current parent.
    pub fn append_child(self: &Rc<Self>, child: Rc<Node>) -> Result<(), DomError> {
        self.insert_before(child, None)
    }

    /// Insert `child` before `reference`, or at the end when `reference` is None.
    /// A child that already has a parent is moved.
    pub fn insert_before(
        self: &Rc<Self>,
        child: Rc<Node>,
        reference: Option<&Rc<Node>>,
    ) -> Result<(), DomError> {
        if child.contains(self) {
            return Err(DomError::HierarchyRequest(
                "a node cannot be inserted into itself or its descendants".to_string(),
            ));
        }
        if let Some(reference) = reference {
            if Rc::ptr_eq(reference, &child) {
                return Ok(());
            }
            let is_child = reference
                .parent()
                .map(|p| Rc::ptr_eq(&p, self))
                .unwrap_or(false);
            if !is_child {
                return Err(DomError::NodeNotFound);
            }
        }

        child.detach();

        let mut children = self.children.borrow_mut();
        let index = match reference {
            Some(reference) => children
                .iter()
                .position(|c| Rc::ptr_eq(c, reference))
                .ok_or(DomError::NodeNotFound)?,
            None => children.len(),
        };
        children.insert(index, child.clone());
        *child.parent.borrow_mut() = Some(Rc::downgrade(self));
        Ok(())
    }

    /// Remove a child node.
    pub fn remove_child(&self, child: &Rc<Node>) -> Result<Rc<Node>, DomError> {
        let is_child = child
            .parent()
            .map(|p| std::ptr::eq(Rc::as_ptr(&p), self))
            .unwrap_or(false);
        if !is_child {
            return Err(DomError::NodeNotFound);
        }
        child.detach();
        Ok(child.clone())
    }
}

const MIN_PRUNE_AT: usize = 64;

/// A complete DOM document.
pub struct Document {
    /// Root node of the document.
    root: Rc<Node>,
    /// Nodes created by this document, indexed by ID. Entries for dropped
    /// nodes are pruned as the table grows.
    nodes: RefCell<HashMap<NodeId, Weak<Node>>>,
    /// Table size that triggers the next prune.
    prune_at: Cell<usize>,
    /// Next node ID.
    next_id: Cell<usize>,
    /// Document URL, used to resolve form actions.
    url: RefCell<Option<Url>>,
    /// Currently focused element.
    focused: RefCell<Option<Weak<Node>>>,
}

impl Document {
    /// Create a new empty document.
    pub fn new() -> Self {
        let root = Node::new(NodeId::new(0), NodeType::Document);
        let mut nodes = HashMap::new();
        nodes.insert(NodeId::new(0), Rc::downgrade(&root));

        Self {
            root,
            nodes: RefCell::new(nodes),
            prune_at: Cell::new(MIN_PRUNE_AT),
            next_id: Cell::new(1),
            url: RefCell::new(None),
            focused: RefCell::new(None),
        }
    }

    /// Parse HTML and create a document.
    pub fn parse_html(html: &str) -> Result<Self, DomError> {
        debug!(len = html.len(), "Parsing HTML");

        let dom = parse_document(RcDom::default(), Default::default())
            .from_utf8()
            .read_from(&mut html.as_bytes())
            .map_err(|e| DomError::ParseError(e.to_string()))?;

        let doc = Document::new();
        doc.convert_rcdom(&dom.document, &doc.root.clone());

        debug!(node_count = doc.node_count(), "HTML parsed");
        Ok(doc)
    }

    /// Parse HTML served from `url`.
    pub fn parse_html_with_url(html: &str, url: &str) -> Result<Self, DomError> {
        let doc = Self::parse_html(html)?;
        doc.set_url(Url::parse(url)?);
        Ok(doc)
    }

    fn convert_rcdom(&self, handle: &Handle, parent: &Rc<Node>) {
        for child_handle in handle.children.borrow().iter() {
            let node_type = match &child_handle.data {
                NodeData::Document => continue, // Skip document node itself
                NodeData::Doctype {
                    name,
                    public_id,
                    system_id,
                } => NodeType::DocumentType {
                    name: name.to_string(),
                    public_id: public_id.to_string(),
                    system_id: system_id.to_string(),
                },
                NodeData::Element { name, attrs, .. } => {
                    let mut attributes = HashMap::new();
                    for attr in attrs.borrow().iter() {
                        attributes.insert(attr.name.local.to_string(), attr.value.to_string());
                    }
                    NodeType::Element {
                        tag_name: name.local.to_string(),
                        namespace: name.ns.to_string(),
                        attributes: RefCell::new(attributes),
                    }
                }
                NodeData::Text { contents } => {
                    NodeType::Text(RefCell::new(contents.borrow().to_string()))
                }
                NodeData::Comment { contents } => NodeType::Comment(contents.to_string()),
                NodeData::ProcessingInstruction { target, contents } => {
                    NodeType::ProcessingInstruction {
                        target: target.to_string(),
                        data: contents.to_string(),
                    }
                }
            };

            let node = self.alloc(node_type);
            // Freshly allocated nodes have no parent, insertion cannot fail
            let _ = parent.append_child(node.clone());

            // Recurse for children
            self.convert_rcdom(child_handle, &node);
        }
    }

    fn alloc(&self, node_type: NodeType) -> Rc<Node> {
        let id = NodeId::new(self.next_id.get());
        self.next_id.set(self.next_id.get() + 1);
        let node = Node::new(id, node_type);
        let mut nodes = self.nodes.borrow_mut();
        if nodes.len() >= self.prune_at.get() {
            nodes.retain(|_, n| n.strong_count() > 0);
            self.prune_at.set((nodes.len() * 2).max(MIN_PRUNE_AT));
        }
        nodes.insert(id, Rc::downgrade(&node));
        node
    }

    /// Number of live nodes created by this document.
    pub fn node_count(&self) -> usize {
        self.nodes
            .borrow()
            .values()
            .filter(|n| n.strong_count() > 0)
            .count()
    }

    /// Create a detached element.
    pub fn create_element(&self, tag_name: &str) -> Rc<Node> {
        self.alloc(NodeType::Element {
            tag_name: tag_name.to_ascii_lowercase(),
            namespace: "http://www.w3.org/1999/xhtml".to_string(),
            attributes: RefCell::new(HashMap::new()),
        })
    }

    /// Create a detached text node.
    pub fn create_text_node(&self, text: &str) -> Rc<Node> {
        self.alloc(NodeType::Text(RefCell::new(text.to_string())))
    }

    /// Replace the children of `node` with a single text node.
    pub fn set_text_content(&self, node: &Rc<Node>, text: &str) -> Result<(), DomError> {
        if let NodeType::Text(contents) = &node.node_type {
            *contents.borrow_mut() = text.to_string();
            return Ok(());
        }
        for child in node.children() {
            child.detach();
        }
        if !text.is_empty() {
            node.append_child(self.create_text_node(text))?;
        }
        Ok(())
    }

    /// Document URL.
    pub fn url(&self) -> Option<Url> {
        self.url.borrow().clone()
    }

    /// Set the document URL.
    pub fn set_url(&self, url: Url) {
        *self.url.borrow_mut() = Some(url);
    }

    /// Get the document root.
    pub fn root(&self) -> &Rc<Node> {
        &self.root
    }

    /// Get the document element (<html>).
    pub fn document_element(&self) -> Option<Rc<Node>> {
        self.root
            .children()
            .into_iter()
            .find(|n| n.tag_name() == Some("html"))
    }

    /// Get the <head> element.
    pub fn head(&self) -> Option<Rc<Node>> {
        self.document_element()?
            .children()
            .into_iter()
            .find(|n| n.tag_name() == Some("head"))
    }

    /// Get the <body> element.
    pub fn body(&self) -> Option<Rc<Node>> {
        self.document_element()?
            .children()
            .into_iter()
            .find(|n| n.tag_name() == Some("body"))
    }

    /// Check whether a node is part of this document's tree.
    pub fn is_connected(&self, node: &Rc<Node>) -> bool {
        self.root.contains(node)
    }

    /// Ancestors of `node`, ordered from the root down to its parent.
    pub fn ancestors(&self, node: &Rc<Node>) -> Vec<Rc<Node>> {
        let mut ancestors = Vec::new();
        let mut current = node.parent();
        while let Some(n) = current {
            current = n.parent();
            ancestors.push(n);
        }
        ancestors.reverse();
        ancestors
    }

    /// Get the first element in tree order with the given ID.
    pub fn get_element_by_id(&self, id: &str) -> Option<Rc<Node>> {
        if id.is_empty() {
            return None;
        }
        self.root
            .descendants()
            .into_iter()
            .find(|n| n.get_attribute("id").as_deref() == Some(id))
    }

    /// Get elements by tag name, in tree order.
    pub fn get_elements_by_tag_name(&self, tag_name: &str) -> Vec<Rc<Node>> {
        self.root
            .descendants()
            .into_iter()
            .filter(|n| n.is_tag(tag_name))
            .collect()
    }

    /// Get elements by class name, in tree order.
    pub fn get_elements_by_class_name(&self, class_name: &str) -> Vec<Rc<Node>> {
        self.root
            .descendants()
            .into_iter()
            .filter(|n| n.has_class(class_name))
            .collect()
    }

    /// First element matching a simple selector.
    pub fn query_selector(&self, selector: &str) -> Option<Rc<Node>> {
        QuerySelector::select(self, selector).into_iter().next()
    }

    /// Get node by ID.
    pub fn get_node(&self, id: NodeId) -> Option<Rc<Node>> {
        self.nodes.borrow().get(&id).and_then(Weak::upgrade)
    }

    /// Get the title of the document.
    pub fn title(&self) -> Option<String> {
        let head = self.head()?;
        let title_elem = head
            .children()
            .into_iter()
            .find(|n| n.tag_name() == Some("title"))?;
        Some(title_elem.text_content())
    }

    /// Dispatch an event at `target`.
    /// Returns true if the default action was not prevented.
    pub fn dispatch_event(&self, target: &Rc<Node>, event: &mut DomEvent) -> bool {
        let ancestors = self.ancestors(target);
        trace!(event_type = %event.event().event_type, target = target.id.raw(), "Dispatching event");
        EventDispatcher::dispatch(event, target, &ancestors)
    }

    /// Simulate a user click. Disabled form controls ignore clicks.
    /// Returns true if the default action was not prevented.
    pub fn click(&self, target: &Rc<Node>) -> bool {
        if forms::is_form_control(target) && target.is_disabled() {
            debug!(target = target.id.raw(), "Click on disabled control ignored");
            return false;
        }
        let mut event = DomEvent::mouse("click", true, MouseEventData::default());
        self.dispatch_event(target, &mut event)
    }

    /// Move focus to `target`. Only connected elements can take focus.
    pub fn focus(&self, target: &Rc<Node>) -> bool {
        if !target.is_element() || !self.is_connected(target) {
            return false;
        }
        let previous = self.active_element();
        if let Some(previous) = &previous {
            if Rc::ptr_eq(previous, target) {
                return true;
            }
            let mut blur = DomEvent::focus(
                "blur",
                FocusEventData {
                    related_target: Some(target.id),
                },
            );
            self.dispatch_event(previous, &mut blur);
        }

        *self.focused.borrow_mut() = Some(Rc::downgrade(target));
        let mut focus = DomEvent::focus(
            "focus",
            FocusEventData {
                related_target: previous.map(|p| p.id),
            },
        );
        self.dispatch_event(target, &mut focus);
        true
    }

    /// The focused element, if it is still in the document.
    pub fn active_element(&self) -> Option<Rc<Node>> {
        let focused = self.focused.borrow().as_ref().and_then(|w| w.upgrade())?;
        if self.is_connected(&focused) {
            Some(focused)
        } else {
            None
        }
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("url", &self.url.borrow().as_ref().map(Url::as_str))
            .field("node_count", &self.node_count())
            .finish()
    }
}

/// Query selector support (basic).
pub struct QuerySelector;

impl QuerySelector {
    /// Select elements matching a simple selector.
    /// Supports: tag, #id, .class
    pub fn select(doc: &Document, selector: &str) -> Vec<Rc<Node>> {
        let selector = selector.trim();

        if let Some(id) = selector.strip_prefix('#') {
            // ID selector
            doc.get_element_by_id(id).into_iter().collect()
        } else if let Some(class) = selector.strip_prefix('.') {
            // Class selector
            doc.get_elements_by_class_name(class)
        } else {
            // Tag selector
            doc.get_elements_by_tag_name(selector)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(nodes: &[Rc<Node>]) -> Vec<String> {
        nodes
            .iter()
            .filter_map(|n| n.element_id())
            .collect()
    }

    #[test]
    fn test_parse_simple_html() {
        let html = r#"<!DOCTYPE html>
<html>
<head><title>Test</title></head>
<body><p id="main">Hello, world!</p></body>
</html>"#;

        let doc = Document::parse_html(html).unwrap();

        assert!(doc.document_element().is_some());
        assert!(doc.head().is_some());
        assert!(doc.body().is_some());
        assert_eq!(doc.title(), Some("Test".to_string()));

        let main = doc.get_element_by_id("main").unwrap();
        assert_eq!(main.tag_name(), Some("p"));
        assert_eq!(main.text_content(), "Hello, world!");
    }

    #[test]
    fn test_query_selector_tree_order() {
        let html = r#"<html>
<body>
    <div class="container">
        <p id="first">First</p>
        <p id="second" class="highlight">Second</p>
        <span id="third" class="highlight">Third</span>
    </div>
</body>
</html>"#;

        let doc = Document::parse_html(html).unwrap();

        let by_id = QuerySelector::select(&doc, "#first");
        assert_eq!(by_id.len(), 1);
        assert_eq!(by_id[0].text_content(), "First");

        let by_class = QuerySelector::select(&doc, ".highlight");
        assert_eq!(ids(&by_class), vec!["second", "third"]);

        let by_tag = QuerySelector::select(&doc, "p");
        assert_eq!(ids(&by_tag), vec!["first", "second"]);

        assert!(doc.query_selector(".missing").is_none());
    }

    #[test]
    fn test_sibling_navigation() {
        let html = "<html><body><p id=a>A</p><p id=b>B</p><p id=c>C</p></body></html>";
        let doc = Document::parse_html(html).unwrap();

        let b = doc.get_element_by_id("b").unwrap();
        assert_eq!(b.previous_sibling().unwrap().element_id().as_deref(), Some("a"));
        assert_eq!(b.next_sibling().unwrap().element_id().as_deref(), Some("c"));
        assert_eq!(b.index_in_parent(), Some(1));

        let c = doc.get_element_by_id("c").unwrap();
        assert!(c.next_sibling().is_none());
    }

    #[test]
    fn test_insert_before_moves_node() {
        let html = "<html><body><div id=x></div><p id=a></p><p id=b></p></body></html>";
        let doc = Document::parse_html(html).unwrap();
        let body = doc.body().unwrap();
        let x = doc.get_element_by_id("x").unwrap();
        let b = doc.get_element_by_id("b").unwrap();

        body.insert_before(x.clone(), Some(&b)).unwrap();
        assert_eq!(ids(&body.element_children()), vec!["a", "x", "b"]);

        body.insert_before(x.clone(), None).unwrap();
        assert_eq!(ids(&body.element_children()), vec!["a", "b", "x"]);
    }

    #[test]
    fn test_insert_into_descendant_rejected() {
        let html = "<html><body><div id=outer><div id=inner></div></div></body></html>";
        let doc = Document::parse_html(html).unwrap();
        let outer = doc.get_element_by_id("outer").unwrap();
        let inner = doc.get_element_by_id("inner").unwrap();

        let err = inner.append_child(outer.clone()).unwrap_err();
        assert!(matches!(err, DomError::HierarchyRequest(_)));
        assert!(doc.is_connected(&outer));
    }

    #[test]
    fn test_insert_before_foreign_reference() {
        let html = "<html><body><div id=a></div><div id=b><span id=s></span></div></body></html>";
        let doc = Document::parse_html(html).unwrap();
        let a = doc.get_element_by_id("a").unwrap();
        let s = doc.get_element_by_id("s").unwrap();
        let body = doc.body().unwrap();

        let node = doc.create_element("em");
        assert!(matches!(
            body.insert_before(node, Some(&s)),
            Err(DomError::NodeNotFound)
        ));
        assert!(matches!(body.remove_child(&s), Err(DomError::NodeNotFound)));
        assert!(doc.is_connected(&a));
    }

    #[test]
    fn test_remove_child_disconnects() {
        let html = "<html><body><div id=gone></div></body></html>";
        let doc = Document::parse_html(html).unwrap();
        let gone = doc.get_element_by_id("gone").unwrap();
        let body = doc.body().unwrap();

        body.remove_child(&gone).unwrap();
        assert!(!doc.is_connected(&gone));
        assert!(doc.get_element_by_id("gone").is_none());
        assert!(doc.get_node(gone.id).is_some());

        let id = gone.id;
        drop(gone);
        assert!(doc.get_node(id).is_none());
    }

    #[test]
    fn test_dropped_nodes_leave_the_registry() {
        let doc = Document::parse_html("<html><body></body></html>").unwrap();
        let body = doc.body().unwrap();
        let live = doc.node_count();

        for _ in 0..1000 {
            let div = doc.create_element("div");
            body.append_child(div.clone()).unwrap();
            div.detach();
        }
        assert_eq!(doc.node_count(), live);
        assert!(doc.nodes.borrow().len() < live + 2 * MIN_PRUNE_AT);
    }

    #[test]
    fn test_created_element_found_after_insert() {
        let doc = Document::parse_html("<html><body></body></html>").unwrap();
        let div = doc.create_element("DIV");
        div.set_attribute("id", "fresh").unwrap();
        assert!(doc.get_element_by_id("fresh").is_none());

        doc.body().unwrap().append_child(div.clone()).unwrap();
        let found = doc.get_element_by_id("fresh").unwrap();
        assert!(Rc::ptr_eq(&found, &div));
        assert_eq!(found.tag_name(), Some("div"));
    }

    #[test]
    fn test_class_list_mutation() {
        let html = r#"<html><body><div id=msg class="notice hide"></div></body></html>"#;
        let doc = Document::parse_html(html).unwrap();
        let msg = doc.get_element_by_id("msg").unwrap();

        msg.remove_class("hide").unwrap();
        assert!(!msg.has_class("hide"));
        assert!(msg.has_class("notice"));

        msg.add_class("hide").unwrap();
        msg.add_class("hide").unwrap();
        assert_eq!(msg.class_list(), vec!["notice", "hide"]);
    }

    #[test]
    fn test_set_text_content() {
        let html = "<html><body><button id=b>Sub<b>mit</b></button></body></html>";
        let doc = Document::parse_html(html).unwrap();
        let button = doc.get_element_by_id("b").unwrap();
        assert_eq!(button.text_content(), "Submit");

        doc.set_text_content(&button, "Please wait...").unwrap();
        assert_eq!(button.text_content(), "Please wait...");
        assert_eq!(button.children().len(), 1);
    }

    #[test]
    fn test_focus_tracking() {
        let html = "<html><body><input id=a><input id=b></body></html>";
        let doc = Document::parse_html(html).unwrap();
        let a = doc.get_element_by_id("a").unwrap();
        let b = doc.get_element_by_id("b").unwrap();

        assert!(doc.focus(&a));
        assert!(Rc::ptr_eq(&doc.active_element().unwrap(), &a));
        assert!(doc.focus(&b));
        assert!(Rc::ptr_eq(&doc.active_element().unwrap(), &b));

        b.detach();
        assert!(doc.active_element().is_none());
        assert!(!doc.focus(&b));
    }

    #[test]
    fn test_click_skips_disabled_controls() {
        let html = "<html><body><button id=b disabled>Go</button></body></html>";
        let doc = Document::parse_html(html).unwrap();
        let button = doc.get_element_by_id("b").unwrap();

        let clicked = Rc::new(Cell::new(0));
        let counter = clicked.clone();
        button.event_target.add_event_listener(
            "click",
            Box::new(move |_| counter.set(counter.get() + 1)),
            AddEventListenerOptions::default(),
        );

        assert!(!doc.click(&button));
        assert_eq!(clicked.get(), 0);

        button.remove_attribute("disabled");
        assert!(doc.click(&button));
        assert_eq!(clicked.get(), 1);
    }

    #[test]
    fn test_parse_with_url() {
        let doc =
            Document::parse_html_with_url("<p>x</p>", "https://blog.example/posts/1/").unwrap();
        assert_eq!(doc.url().unwrap().as_str(), "https://blog.example/posts/1/");
        assert!(matches!(
            Document::parse_html_with_url("<p>x</p>", "not a url"),
            Err(DomError::InvalidUrl(_))
        ));
    }
}
