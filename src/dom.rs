//! Mutable HTML tree on top of html5ever's reference DOM.

use std::rc::{Rc, Weak};

use html5ever::tendril::TendrilSink;
use html5ever::tree_builder::{ElementFlags, NodeOrText, TreeSink};
use html5ever::{local_name, namespace_url, ns, parse_document, serialize, Attribute, LocalName, ParseOpts, QualName};
use markup5ever_rcdom::{Handle, NodeData, RcDom, SerializableHandle};

use crate::error::MirrorError;

pub struct Document {
    dom: RcDom,
}

impl Document {
    pub fn parse(html: &str) -> Result<Self, MirrorError> {
        let dom = parse_document(RcDom::default(), ParseOpts::default())
            .from_utf8()
            .read_from(&mut html.as_bytes())
            .map_err(MirrorError::Parse)?;

        Ok(Self { dom })
    }

    /// All elements in document order.
    pub fn elements(&self) -> Vec<Element> {
        let mut elements = Vec::new();
        let mut stack = vec![self.dom.document.clone()];

        while let Some(node) = stack.pop() {
            if let NodeData::Element { .. } = node.data {
                elements.push(Element(node.clone()));
            }
            for child in node.children.borrow().iter().rev() {
                stack.push(child.clone());
            }
        }

        elements
    }

    pub fn select<P>(&self, predicate: P) -> Vec<Element>
    where
        P: Fn(&Element) -> bool,
    {
        self.elements().into_iter().filter(|el| predicate(el)).collect()
    }

    pub fn first(&self, name: &str) -> Option<Element> {
        self.elements().into_iter().find(|el| el.name() == name)
    }

    /// The `href` of the first `<base>` element, if any.
    pub fn base_href(&self) -> Option<String> {
        self.first("base").and_then(|base| base.attr("href"))
    }

    /// Makes the first `<base>` point at `href`, creating it as the first
    /// child of `<head>` when the document has none. Returns true if an
    /// element was inserted.
    ///
    /// An existing `<base>` is not left alone: its href is overwritten, so
    /// a page that pointed at a remote base resolves the rewritten local
    /// paths against `href` instead.
    pub fn ensure_base_href(&mut self, href: &str) -> bool {
        if let Some(base) = self.first("base") {
            base.set_attr("href", href);
            return false;
        }

        let Some(head) = self.first("head") else {
            return false;
        };

        let name = QualName::new(None, ns!(html), local_name!("base"));
        let attrs = vec![Attribute {
            name: QualName::new(None, ns!(), local_name!("href")),
            value: href.into(),
        }];
        let base = self.dom.create_element(name, attrs, ElementFlags::default());

        let first_child = head.0.children.borrow().first().cloned();
        match first_child {
            Some(sibling) => self.dom.append_before_sibling(&sibling, NodeOrText::AppendNode(base)),
            None => self.dom.append(&head.0, NodeOrText::AppendNode(base)),
        }
        true
    }

    pub fn to_html(&self) -> Result<String, MirrorError> {
        let mut out = Vec::new();
        let document: SerializableHandle = self.dom.document.clone().into();
        serialize(&mut out, &document, Default::default()).map_err(MirrorError::Serialize)?;

        Ok(String::from_utf8_lossy(&out).into_owned())
    }
}

/// Handle to an element node. Cloning is cheap and shares the node.
#[derive(Clone)]
pub struct Element(Handle);

impl Element {
    /// Lowercase local tag name.
    pub fn name(&self) -> &str {
        match self.0.data {
            NodeData::Element { ref name, .. } => &*name.local,
            _ => "",
        }
    }

    pub fn attr(&self, name: &str) -> Option<String> {
        match self.0.data {
            NodeData::Element { ref attrs, .. } => attrs
                .borrow()
                .iter()
                .find(|attr| &*attr.name.local == name)
                .map(|attr| String::from(&*attr.value)),
            _ => None,
        }
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attr(name).is_some()
    }

    pub fn set_attr(&self, name: &str, value: &str) {
        if let NodeData::Element { ref attrs, .. } = self.0.data {
            let mut attrs = attrs.borrow_mut();
            match attrs.iter_mut().find(|attr| &*attr.name.local == name) {
                Some(attr) => attr.value = value.into(),
                None => attrs.push(Attribute {
                    name: QualName::new(None, ns!(), LocalName::from(name)),
                    value: value.into(),
                }),
            }
        }
    }

    pub fn parent(&self) -> Option<Element> {
        let weak = self.0.parent.take();
        let parent = weak.as_ref().and_then(Weak::upgrade);
        self.0.parent.set(weak);

        parent
            .filter(|node| matches!(node.data, NodeData::Element { .. }))
            .map(Element)
    }

    pub fn has_ancestor(&self, names: &[&str]) -> bool {
        let mut current = self.parent();
        while let Some(el) = current {
            if names.contains(&el.name()) {
                return true;
            }
            current = el.parent();
        }
        false
    }

    /// Concatenated text of all descendant text nodes.
    pub fn text(&self) -> String {
        let mut text = String::new();
        collect_text(&self.0, &mut text);
        text
    }

    pub fn same_node(&self, other: &Element) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl std::fmt::Debug for Element {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Element").field(&self.name()).finish()
    }
}

fn collect_text(node: &Handle, out: &mut String) {
    for child in node.children.borrow().iter() {
        match child.data {
            NodeData::Text { ref contents } => out.push_str(&contents.borrow()),
            NodeData::Element { .. } => collect_text(child, out),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_elements_in_document_order() {
        let doc = Document::parse("<html><head><title>t</title></head><body><p><img src=a.png></p><div></div></body></html>").unwrap();
        let names: Vec<_> = doc.elements().iter().map(|el| el.name().to_string()).collect();
        assert_eq!(names, ["html", "head", "title", "body", "p", "img", "div"]);
    }

    #[test]
    fn test_attributes_roundtrip_through_serializer() {
        let doc = Document::parse(r#"<img src="a.png" alt="x">"#).unwrap();
        let img = doc.first("img").unwrap();
        assert_eq!(img.attr("src").as_deref(), Some("a.png"));
        assert!(!img.has_attr("srcset"));

        img.set_attr("src", "images/a.png");
        img.set_attr("data-local", "1");

        let html = doc.to_html().unwrap();
        assert!(html.contains(r#"<img src="images/a.png" alt="x" data-local="1">"#));
    }

    #[test]
    fn test_ancestors() {
        let doc = Document::parse("<video><source src=a.mp4></video><picture><source srcset=b.jpg></picture>").unwrap();
        let sources = doc.select(|el| el.name() == "source");
        assert_eq!(sources.len(), 2);
        assert!(sources[0].has_ancestor(&["video", "audio"]));
        assert!(!sources[1].has_ancestor(&["video", "audio"]));
        assert_eq!(sources[1].parent().unwrap().name(), "picture");
    }

    #[test]
    fn test_text() {
        let doc = Document::parse("<style>body { color: red }</style><p>a <b>b</b></p>").unwrap();
        assert_eq!(doc.first("style").unwrap().text(), "body { color: red }");
        assert_eq!(doc.first("p").unwrap().text(), "a b");
    }

    #[test]
    fn test_base_href_inserted_first_in_head() {
        let mut doc = Document::parse("<html><head><title>t</title></head><body></body></html>").unwrap();
        assert_eq!(doc.base_href(), None);
        assert!(doc.ensure_base_href("./"));
        assert!(!doc.ensure_base_href("./"));

        let html = doc.to_html().unwrap();
        assert!(html.contains(r#"<head><base href="./"><title>t</title></head>"#));
        assert_eq!(html.matches("<base").count(), 1);
    }

    #[test]
    fn test_existing_base_href_is_normalized() {
        let mut doc = Document::parse(r#"<head><base href="https://x.test/app/"></head>"#).unwrap();
        assert_eq!(doc.base_href().as_deref(), Some("https://x.test/app/"));
        assert!(!doc.ensure_base_href("./"));
        assert_eq!(doc.base_href().as_deref(), Some("./"));
    }

    #[test]
    fn test_doctype_is_kept() {
        let doc = Document::parse("<!DOCTYPE html><html><head></head><body></body></html>").unwrap();
        assert!(doc.to_html().unwrap().starts_with("<!DOCTYPE html>"));
    }
}
