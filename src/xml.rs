use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::reader::Reader;
use quick_xml::writer::Writer;

/// Mutable element tree for one feed document.
///
/// Supplier feeds are routinely broken (unescaped ampersands, stray end
/// tags), so parsing is best-effort: bad fragments are repaired or dropped
/// and everything parsed up to an unrecoverable error is kept.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Document {
    pub children: Vec<Node>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
    CData(String),
    Comment(String),
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Document {
    pub fn parse_lenient(content: &str) -> Self {
        let mut reader = Reader::from_str(content);
        reader.config_mut().check_end_names = false;

        let mut top = Vec::new();
        // Open elements; the last one receives new nodes.
        let mut stack: Vec<Element> = Vec::new();

        loop {
            match reader.read_event() {
                Ok(Event::Start(e)) => stack.push(element_from_start(&e)),
                Ok(Event::Empty(e)) => {
                    push_node(&mut stack, &mut top, Node::Element(element_from_start(&e)))
                }
                Ok(Event::Text(e)) => {
                    let text = match e.unescape() {
                        Ok(t) => t.into_owned(),
                        // Bad entity, keep the raw text as-is.
                        Err(_) => String::from_utf8_lossy(&e).into_owned(),
                    };
                    push_node(&mut stack, &mut top, Node::Text(text));
                }
                Ok(Event::CData(e)) => {
                    let text = String::from_utf8_lossy(&e).into_owned();
                    push_node(&mut stack, &mut top, Node::CData(text));
                }
                Ok(Event::Comment(e)) => {
                    let text = String::from_utf8_lossy(&e).into_owned();
                    push_node(&mut stack, &mut top, Node::Comment(text));
                }
                Ok(Event::End(_)) => {
                    // Name checks are off; a stray end tag closes nothing.
                    if let Some(el) = stack.pop() {
                        push_node(&mut stack, &mut top, Node::Element(el));
                    }
                }
                Ok(Event::Decl(_) | Event::PI(_) | Event::DocType(_)) => {}
                Ok(Event::Eof) => break,
                Err(err) => {
                    log::warn!(
                        "Malformed XML at position {}, keeping what parsed so far: {err}",
                        reader.buffer_position()
                    );
                    break;
                }
            }
        }
        // Unclosed elements at EOF or after an error are closed implicitly.
        while let Some(el) = stack.pop() {
            push_node(&mut stack, &mut top, Node::Element(el));
        }
        Self { children: top }
    }

    pub fn root(&self) -> Option<&Element> {
        self.children.iter().find_map(|n| match n {
            Node::Element(el) => Some(el),
            _ => None,
        })
    }

    pub fn root_mut(&mut self) -> Option<&mut Element> {
        self.children.iter_mut().find_map(|n| match n {
            Node::Element(el) => Some(el),
            _ => None,
        })
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, anyhow::Error> {
        let mut writer = Writer::new(Vec::new());
        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        for node in &self.children {
            write_node(&mut writer, node)?;
        }
        Ok(writer.into_inner())
    }
}

fn element_from_start(e: &BytesStart) -> Element {
    let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
    let attrs = e
        .attributes()
        .with_checks(false)
        .flatten()
        .map(|a| {
            let key = String::from_utf8_lossy(a.key.as_ref()).into_owned();
            let value = match a.unescape_value() {
                Ok(v) => v.into_owned(),
                Err(_) => String::from_utf8_lossy(&a.value).into_owned(),
            };
            (key, value)
        })
        .collect();
    Element {
        name,
        attrs,
        children: Vec::new(),
    }
}

fn push_node(stack: &mut Vec<Element>, top: &mut Vec<Node>, node: Node) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(node),
        None => top.push(node),
    }
}

fn write_node(writer: &mut Writer<Vec<u8>>, node: &Node) -> Result<(), anyhow::Error> {
    match node {
        Node::Element(el) => {
            let mut start = BytesStart::new(el.name.as_str());
            for (key, value) in &el.attrs {
                start.push_attribute((key.as_str(), value.as_str()));
            }
            if el.children.is_empty() {
                writer.write_event(Event::Empty(start))?;
            } else {
                writer.write_event(Event::Start(start))?;
                for child in &el.children {
                    write_node(writer, child)?;
                }
                writer.write_event(Event::End(BytesEnd::new(el.name.as_str())))?;
            }
        }
        Node::Text(text) => writer.write_event(Event::Text(BytesText::new(text)))?,
        Node::CData(text) => writer.write_event(Event::CData(BytesCData::new(text.as_str())))?,
        Node::Comment(text) => {
            writer.write_event(Event::Comment(BytesText::from_escaped(text.as_str())))?
        }
    }
    Ok(())
}

impl Element {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find_map(|n| match n {
            Node::Element(el) if el.name == name => Some(el),
            _ => None,
        })
    }

    pub fn child_mut(&mut self, name: &str) -> Option<&mut Element> {
        self.children.iter_mut().find_map(|n| match n {
            Node::Element(el) if el.name == name => Some(el),
            _ => None,
        })
    }

    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> {
        self.children.iter().filter_map(move |n| match n {
            Node::Element(el) if el.name == name => Some(el),
            _ => None,
        })
    }

    pub fn children_named_mut<'a>(
        &'a mut self,
        name: &'a str,
    ) -> impl Iterator<Item = &'a mut Element> {
        self.children.iter_mut().filter_map(move |n| match n {
            Node::Element(el) if el.name == name => Some(el),
            _ => None,
        })
    }

    pub fn remove_children(&mut self, name: &str) {
        self.children.retain(|n| match n {
            Node::Element(el) => el.name != name,
            _ => true,
        });
    }

    pub fn push_element(&mut self, el: Element) {
        self.children.push(Node::Element(el));
    }

    /// Concatenated text and CDATA directly under this element.
    pub fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|n| match n {
                Node::Text(t) | Node::CData(t) => Some(t.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn set_text<S: Into<String>>(&mut self, text: S) {
        self.children = vec![Node::Text(text.into())];
    }

    /// Text of the first child with this name, empty string when absent.
    pub fn child_text(&self, name: &str) -> String {
        self.child(name).map(|el| el.text()).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_well_formed_feed() {
        let doc = Document::parse_lenient(
            "<yml_catalog date=\"2024-01-01\"><shop><offers>\
             <offer id=\"1\"><name>Test</name></offer>\
             </offers></shop></yml_catalog>",
        );
        let root = doc.root().unwrap();
        assert_eq!(root.name, "yml_catalog");
        assert_eq!(root.attr("date"), Some("2024-01-01"));
        let shop = root.child("shop").unwrap();
        let offer = shop.child("offers").unwrap().child("offer").unwrap();
        assert_eq!(offer.attr("id"), Some("1"));
        assert_eq!(offer.child_text("name"), "Test");
    }

    #[test]
    fn child_lookup_outlives_the_name_string() {
        let mut doc =
            Document::parse_lenient("<shop><offers><offer id=\"1\"/></offers></shop>");
        let found = {
            let tag = format!("off{}", "ers");
            doc.root().unwrap().child(&tag).is_some()
        };
        assert!(found);
        let offers = {
            let tag = String::from("offers");
            doc.root_mut().unwrap().child_mut(&tag)
        };
        offers.unwrap().push_element(Element::new("offer"));
        let root = doc.root().unwrap();
        assert_eq!(root.child("offers").unwrap().children_named("offer").count(), 2);
    }

    #[test]
    fn recovers_from_stray_end_tags() {
        let doc = Document::parse_lenient(
            "<shop><offers><offer id=\"1\"><name>A</другое></name></offer></offers></shop>",
        );
        let shop = doc.root().unwrap();
        let offer = shop.child("offers").unwrap().child("offer").unwrap();
        assert_eq!(offer.child_text("name"), "A");
    }

    #[test]
    fn closes_unterminated_elements_at_eof() {
        let doc = Document::parse_lenient("<shop><offers><offer id=\"1\"><name>A");
        let shop = doc.root().unwrap();
        assert_eq!(shop.name, "shop");
        let offer = shop.child("offers").unwrap().child("offer").unwrap();
        assert_eq!(offer.child_text("name"), "A");
    }

    #[test]
    fn keeps_raw_text_on_bad_entities() {
        let doc = Document::parse_lenient("<shop><name>Black&nbsp;Power</name></shop>");
        assert_eq!(doc.root().unwrap().child_text("name"), "Black&nbsp;Power");
    }

    #[test]
    fn serializes_with_declaration_and_escaping() {
        let mut root = Element::new("shop");
        let mut name = Element::new("name");
        name.set_text("M&M");
        root.push_element(name);
        root.push_element(Element::new("offers"));
        let doc = Document {
            children: vec![Node::Element(root)],
        };
        let out = String::from_utf8(doc.to_bytes().unwrap()).unwrap();
        assert_eq!(
            out,
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
             <shop><name>M&amp;M</name><offers/></shop>"
        );
    }

    #[test]
    fn preserves_cdata_through_roundtrip() {
        let src = "<shop><description><![CDATA[<b>Смак</b> & ціна]]></description></shop>";
        let doc = Document::parse_lenient(src);
        let out = String::from_utf8(doc.to_bytes().unwrap()).unwrap();
        assert!(out.contains("<![CDATA[<b>Смак</b> & ціна]]>"));
    }
}
