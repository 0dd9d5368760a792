//! Content tree capability surface and the arena-backed `Document`
//!
//! The scanner and applier only talk to a [`ContentTree`]: enumerate children,
//! read or write the text of a leaf, classify a node, and replace a node with a
//! fragment. [`Document`] is the in-crate implementation, an arena of nodes
//! addressed by stable [`NodeId`]s, so the engine can be exercised without any
//! rendering environment.

use crate::substitution::SubstitutionRecord;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

/// Stable handle of a node inside a content tree
pub type NodeId = usize;

/// CSS class carried by rendered substitution markers
pub const MARKER_CLASS: &str = "german-sprinkle-word";

/// Classification of a node as seen by the scanner
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind<'a> {
    Element { tag: &'a str, editable: bool },
    Text,
    Marker,
}

/// A piece of content that replaces a single node
#[derive(Debug, Clone, PartialEq)]
pub enum Fragment {
    Text(String),
    Marker(SubstitutionRecord),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    /// No node with this id exists
    UnknownNode(NodeId),
    /// The node has no parent, it was replaced or never attached
    Detached(NodeId),
    /// A text operation was attempted on a non-text node
    NotText(NodeId),
    /// Children can only be appended to element nodes
    NotElement(NodeId),
    /// Element names must be an ASCII letter followed by letters, digits or `-`
    InvalidTag(String),
}

impl fmt::Display for TreeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TreeError::UnknownNode(id) => write!(f, "Unknown node {}", id),
            TreeError::Detached(id) => write!(f, "Node {} is detached from the tree", id),
            TreeError::NotText(id) => write!(f, "Node {} is not a text node", id),
            TreeError::NotElement(id) => write!(f, "Node {} is not an element", id),
            TreeError::InvalidTag(tag) => write!(f, "Invalid element name {:?}", tag),
        }
    }
}

impl std::error::Error for TreeError {}

/// Whether `tag` is safe to use as an element name
pub fn is_valid_tag(tag: &str) -> bool {
    let mut chars = tag.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '-')
}

/// Capability surface the engine needs from a content tree
pub trait ContentTree {
    fn root(&self) -> NodeId;

    /// Children in document order, empty for leaves
    fn children(&self, node: NodeId) -> Vec<NodeId>;

    fn parent(&self, node: NodeId) -> Option<NodeId>;

    fn kind(&self, node: NodeId) -> Option<NodeKind<'_>>;

    /// Text of a text leaf, `None` for any other node
    fn text(&self, node: NodeId) -> Option<&str>;

    fn set_text(&mut self, node: NodeId, text: &str) -> Result<(), TreeError>;

    /// Replace `node` in its parent with the fragment pieces, in order.
    ///
    /// Returns the ids of the inserted nodes. The replaced node is detached.
    fn replace_with_fragment(
        &mut self,
        node: NodeId,
        fragment: Vec<Fragment>,
    ) -> Result<Vec<NodeId>, TreeError>;

    /// Substitution record of a marker node
    fn marker(&self, node: NodeId) -> Option<&SubstitutionRecord>;

    /// Every marker reachable from the root, in document order
    fn markers(&self) -> Vec<NodeId> {
        let mut found = Vec::new();
        let mut stack = vec![self.root()];
        while let Some(node) = stack.pop() {
            match self.kind(node) {
                Some(NodeKind::Marker) => found.push(node),
                Some(NodeKind::Element { .. }) => {
                    stack.extend(self.children(node).into_iter().rev());
                }
                _ => {}
            }
        }
        found
    }
}

#[derive(Debug, Clone)]
enum NodeData {
    Element {
        tag: String,
        editable: bool,
        children: Vec<NodeId>,
    },
    Text(String),
    Marker(SubstitutionRecord),
}

#[derive(Debug, Clone)]
struct Node {
    parent: Option<NodeId>,
    data: NodeData,
}

/// Arena content tree
///
/// Nodes are never removed from the arena; replaced nodes are only unlinked,
/// so ids stay valid for the lifetime of the document.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
    root: NodeId,
}

/// Serializable description of a content tree
///
/// ```json
/// {"type": "element", "tag": "body", "children": [
///     {"type": "element", "tag": "p", "children": [{"type": "text", "text": "I see a house."}]},
///     {"type": "element", "tag": "textarea", "editable": true, "children": []}
/// ]}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Outline {
    Element {
        tag: String,
        #[serde(default)]
        editable: bool,
        #[serde(default)]
        children: Vec<Outline>,
    },
    Text {
        text: String,
    },
}

impl Document {
    /// An empty document with a `body` root
    pub fn new() -> Self {
        Document {
            nodes: vec![Node {
                parent: None,
                data: NodeData::Element {
                    tag: "body".to_string(),
                    editable: false,
                    children: Vec::new(),
                },
            }],
            root: 0,
        }
    }

    /// One `p` element per blank-line separated paragraph
    pub fn from_plain_text(text: &str) -> Self {
        let mut document = Document::new();
        let root = document.root;
        for paragraph in text.split("\n\n").filter(|p| !p.trim().is_empty()) {
            // Appending to the freshly created root cannot fail
            if let Ok(p) = document.append_element(root, "p") {
                let _ = document.append_text(p, paragraph.trim_matches('\n'));
            }
        }
        document
    }

    /// Build a document from an outline.
    ///
    /// Elements with an invalid name are dropped and their children hoisted
    /// into the parent; an invalid root name keeps the default `body`.
    pub fn from_outline(outline: &Outline) -> Self {
        let mut document = Document::new();
        match outline {
            Outline::Element {
                tag,
                editable,
                children,
            } => {
                if let NodeData::Element {
                    tag: root_tag,
                    editable: root_editable,
                    ..
                } = &mut document.nodes[0].data
                {
                    if is_valid_tag(tag) {
                        *root_tag = tag.clone();
                    } else {
                        warn!("Ignoring invalid root element name {:?}", tag);
                    }
                    *root_editable = *editable;
                }
                for child in children {
                    document.append_outline(0, child);
                }
            }
            Outline::Text { .. } => document.append_outline(0, outline),
        }
        document
    }

    fn append_outline(&mut self, parent: NodeId, outline: &Outline) {
        match outline {
            Outline::Element {
                tag,
                editable,
                children,
            } => match self.append_element(parent, tag) {
                Ok(element) => {
                    let _ = self.set_editable(element, *editable);
                    for child in children {
                        self.append_outline(element, child);
                    }
                }
                Err(e) => {
                    warn!("Hoisting children of rejected element: {}", e);
                    for child in children {
                        self.append_outline(parent, child);
                    }
                }
            },
            Outline::Text { text } => {
                let _ = self.append_text(parent, text);
            }
        }
    }

    fn push_node(&mut self, parent: Option<NodeId>, data: NodeData) -> NodeId {
        self.nodes.push(Node { parent, data });
        self.nodes.len() - 1
    }

    fn append_child(&mut self, parent: NodeId, data: NodeData) -> Result<NodeId, TreeError> {
        match self.nodes.get(parent).map(|node| &node.data) {
            Some(NodeData::Element { .. }) => {}
            Some(_) => return Err(TreeError::NotElement(parent)),
            None => return Err(TreeError::UnknownNode(parent)),
        }
        let id = self.push_node(Some(parent), data);
        if let NodeData::Element { children, .. } = &mut self.nodes[parent].data {
            children.push(id);
        }
        Ok(id)
    }

    pub fn append_element(&mut self, parent: NodeId, tag: &str) -> Result<NodeId, TreeError> {
        if !is_valid_tag(tag) {
            return Err(TreeError::InvalidTag(tag.to_string()));
        }
        self.append_child(
            parent,
            NodeData::Element {
                tag: tag.to_string(),
                editable: false,
                children: Vec::new(),
            },
        )
    }

    pub fn append_text(&mut self, parent: NodeId, text: &str) -> Result<NodeId, TreeError> {
        self.append_child(parent, NodeData::Text(text.to_string()))
    }

    pub fn set_editable(&mut self, node: NodeId, value: bool) -> Result<(), TreeError> {
        match self.nodes.get_mut(node).map(|node| &mut node.data) {
            Some(NodeData::Element { editable, .. }) => {
                *editable = value;
                Ok(())
            }
            Some(_) => Err(TreeError::NotElement(node)),
            None => Err(TreeError::UnknownNode(node)),
        }
    }

    /// Concatenated text of the subtree, markers contribute their rendered text
    pub fn text_content_of(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(node, &mut out);
        out
    }

    pub fn text_content(&self) -> String {
        self.text_content_of(self.root)
    }

    fn collect_text(&self, node: NodeId, out: &mut String) {
        match self.nodes.get(node).map(|node| &node.data) {
            Some(NodeData::Element { children, .. }) => {
                for child in children {
                    self.collect_text(*child, out);
                }
            }
            Some(NodeData::Text(text)) => out.push_str(text),
            Some(NodeData::Marker(record)) => out.push_str(&record.rendered_text),
            None => {}
        }
    }

    /// Top-level blocks separated by blank lines, the inverse of `from_plain_text`
    pub fn to_plain_text(&self) -> String {
        self.children(self.root)
            .into_iter()
            .map(|child| self.text_content_of(child))
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Inner HTML of the root
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        for child in self.children(self.root) {
            self.write_html(child, &mut out);
        }
        out
    }

    fn write_html(&self, node: NodeId, out: &mut String) {
        match self.nodes.get(node).map(|node| &node.data) {
            Some(NodeData::Element {
                tag,
                editable,
                children,
            }) => {
                out.push('<');
                out.push_str(tag);
                if *editable {
                    out.push_str(" contenteditable=\"true\"");
                }
                out.push('>');
                for child in children {
                    self.write_html(*child, out);
                }
                out.push_str("</");
                out.push_str(tag);
                out.push('>');
            }
            Some(NodeData::Text(text)) => out.push_str(&escape_html(text)),
            Some(NodeData::Marker(record)) => {
                out.push_str(&format!(
                    "<span class=\"{}\" data-original=\"{}\" data-german=\"{}\"",
                    MARKER_CLASS,
                    escape_html(&record.original_text),
                    escape_html(&record.rendered_text)
                ));
                if let Some(article) = &record.article {
                    out.push_str(&format!(" data-article=\"{}\"", escape_html(article)));
                }
                out.push('>');
                out.push_str(&escape_html(&record.rendered_text));
                out.push_str("</span>");
            }
            None => {}
        }
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

impl ContentTree for Document {
    fn root(&self) -> NodeId {
        self.root
    }

    fn children(&self, node: NodeId) -> Vec<NodeId> {
        match self.nodes.get(node).map(|node| &node.data) {
            Some(NodeData::Element { children, .. }) => children.clone(),
            _ => Vec::new(),
        }
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(node).and_then(|node| node.parent)
    }

    fn kind(&self, node: NodeId) -> Option<NodeKind<'_>> {
        self.nodes.get(node).map(|node| match &node.data {
            NodeData::Element { tag, editable, .. } => NodeKind::Element {
                tag: tag.as_str(),
                editable: *editable,
            },
            NodeData::Text(_) => NodeKind::Text,
            NodeData::Marker(_) => NodeKind::Marker,
        })
    }

    fn text(&self, node: NodeId) -> Option<&str> {
        match self.nodes.get(node).map(|node| &node.data) {
            Some(NodeData::Text(text)) => Some(text.as_str()),
            _ => None,
        }
    }

    fn set_text(&mut self, node: NodeId, text: &str) -> Result<(), TreeError> {
        match self.nodes.get_mut(node).map(|node| &mut node.data) {
            Some(NodeData::Text(current)) => {
                *current = text.to_string();
                Ok(())
            }
            Some(_) => Err(TreeError::NotText(node)),
            None => Err(TreeError::UnknownNode(node)),
        }
    }

    fn replace_with_fragment(
        &mut self,
        node: NodeId,
        fragment: Vec<Fragment>,
    ) -> Result<Vec<NodeId>, TreeError> {
        if node >= self.nodes.len() {
            return Err(TreeError::UnknownNode(node));
        }
        let parent = self.parent(node).ok_or(TreeError::Detached(node))?;
        let position = self
            .children(parent)
            .iter()
            .position(|child| *child == node)
            .ok_or(TreeError::Detached(node))?;

        let inserted: Vec<NodeId> = fragment
            .into_iter()
            .map(|piece| {
                let data = match piece {
                    Fragment::Text(text) => NodeData::Text(text),
                    Fragment::Marker(record) => NodeData::Marker(record),
                };
                self.push_node(Some(parent), data)
            })
            .collect();

        if let NodeData::Element { children, .. } = &mut self.nodes[parent].data {
            children.splice(position..=position, inserted.iter().copied());
        }
        self.nodes[node].parent = None;
        Ok(inserted)
    }

    fn marker(&self, node: NodeId) -> Option<&SubstitutionRecord> {
        match self.nodes.get(node).map(|node| &node.data) {
            Some(NodeData::Marker(record)) => Some(record),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(original: &str, rendered: &str) -> SubstitutionRecord {
        SubstitutionRecord {
            original_text: original.to_string(),
            rendered_text: rendered.to_string(),
            article: Some("das".to_string()),
            gender: None,
            part_of_speech: None,
        }
    }

    #[test]
    fn test_plain_text_paragraphs() {
        let document = Document::from_plain_text("First paragraph.\n\nSecond one.\n");
        assert_eq!(document.children(document.root()).len(), 2);
        assert_eq!(document.to_plain_text(), "First paragraph.\n\nSecond one.");
    }

    #[test]
    fn test_replace_with_fragment_splices_in_place() {
        let mut document = Document::new();
        let p = document.append_element(document.root(), "p").unwrap();
        let text = document.append_text(p, "a house here").unwrap();
        let tail = document.append_text(p, "!").unwrap();

        let inserted = document
            .replace_with_fragment(
                text,
                vec![
                    Fragment::Text("a ".to_string()),
                    Fragment::Marker(record("house", "Haus")),
                    Fragment::Text(" here".to_string()),
                ],
            )
            .unwrap();

        assert_eq!(inserted.len(), 3);
        assert_eq!(document.children(p)[3], tail);
        assert_eq!(document.parent(text), None);
        assert_eq!(document.text_content(), "a Haus here!");
        assert_eq!(document.markers(), vec![inserted[1]]);
    }

    #[test]
    fn test_replace_detached_node_fails() {
        let mut document = Document::new();
        let p = document.append_element(document.root(), "p").unwrap();
        let text = document.append_text(p, "word").unwrap();
        document
            .replace_with_fragment(text, vec![Fragment::Text("word".to_string())])
            .unwrap();

        let err = document
            .replace_with_fragment(text, vec![Fragment::Text("again".to_string())])
            .unwrap_err();
        assert_eq!(err, TreeError::Detached(text));
        assert_eq!(
            document.replace_with_fragment(999, vec![]).unwrap_err(),
            TreeError::UnknownNode(999)
        );
    }

    #[test]
    fn test_append_to_text_node_fails() {
        let mut document = Document::new();
        let text = document.append_text(document.root(), "leaf").unwrap();
        assert_eq!(
            document.append_text(text, "child").unwrap_err(),
            TreeError::NotElement(text)
        );
    }

    #[test]
    fn test_outline_round_trip_structure() {
        let outline: Outline = serde_json::from_str(
            r#"{"type":"element","tag":"body","children":[
                {"type":"element","tag":"p","children":[{"type":"text","text":"Hello"}]},
                {"type":"element","tag":"div","editable":true,"children":[{"type":"text","text":"draft"}]}
            ]}"#,
        )
        .unwrap();
        let document = Document::from_outline(&outline);
        let blocks = document.children(document.root());
        assert_eq!(blocks.len(), 2);
        assert_eq!(
            document.kind(blocks[1]),
            Some(NodeKind::Element {
                tag: "div",
                editable: true
            })
        );
        assert_eq!(document.text_content(), "Hellodraft");
    }

    #[test]
    fn test_html_rendering_escapes_and_marks() {
        let mut document = Document::new();
        let p = document.append_element(document.root(), "p").unwrap();
        let text = document.append_text(p, "<house>").unwrap();
        document
            .replace_with_fragment(
                text,
                vec![
                    Fragment::Text("<".to_string()),
                    Fragment::Marker(record("house", "Haus")),
                    Fragment::Text(">".to_string()),
                ],
            )
            .unwrap();

        assert_eq!(
            document.to_html(),
            "<p>&lt;<span class=\"german-sprinkle-word\" data-original=\"house\" \
             data-german=\"Haus\" data-article=\"das\">Haus</span>&gt;</p>"
        );
    }

    #[test]
    fn test_invalid_element_names_rejected() {
        let mut document = Document::new();
        let root = document.root();
        assert_eq!(
            document.append_element(root, "img src=x onerror=alert(1)"),
            Err(TreeError::InvalidTag("img src=x onerror=alert(1)".to_string()))
        );
        assert!(document.append_element(root, "").is_err());
        assert!(document.append_element(root, "1p").is_err());
        assert!(document.append_element(root, "my-widget2").is_ok());
    }

    #[test]
    fn test_outline_cannot_inject_markup() {
        let outline: Outline = serde_json::from_str(
            r#"{"type":"element","tag":"body onload=x","children":[
                {"type":"element","tag":"img src=x onerror=alert(1)","children":[
                    {"type":"text","text":"kept"}
                ]},
                {"type":"element","tag":"p></p><script","children":[]}
            ]}"#,
        )
        .unwrap();
        let document = Document::from_outline(&outline);

        let html = document.to_html();
        assert_eq!(html, "kept");
        assert!(!html.contains("onerror"));
        assert_eq!(
            document.kind(document.root()),
            Some(NodeKind::Element {
                tag: "body",
                editable: false
            })
        );
    }
}
