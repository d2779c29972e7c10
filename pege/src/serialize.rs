/*!
Debugging dumps of a match tree: JSON via `serde_json`, XML via
`quick-xml`. Neither is meant to round-trip back into a grammar —
they exist so a host can eyeball what the recognizer actually matched.
*/

use std::io::Write;

use pege_core::grammar::Grammar;
use pege_core::match_tree::{Match, MatchOrigin};
use pege_core::reference::Cardinality;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use serde_json::{json, Value as Json};
use thiserror::Error;

/// Errors raised while writing a match tree out as XML.
#[derive(Debug, Error)]
pub enum XmlWriteError {
    /// The underlying writer or encoder failed.
    #[error("failed to write XML: {0}")]
    Io(#[from] quick_xml::Error),
}

fn cardinality_tag(cardinality: Cardinality) -> &'static str {
    match cardinality {
        Cardinality::One => "one",
        Cardinality::Optional => "optional",
        Cardinality::ZeroOrMore => "zero_or_more",
        Cardinality::OneOrMore => "one_or_more",
        Cardinality::NotEmpty => "not_empty",
    }
}

/// Render a match tree as a `serde_json::Value`. Each node carries its
/// element type tag, id, optional name, `[offset, length]`, and ordered
/// children; reference nodes additionally carry cardinality and slot
/// name.
pub fn to_json(m: &Match, grammar: &Grammar) -> Json {
    match m.origin() {
        MatchOrigin::Element(id) => {
            let element = grammar.element(id);
            let mut node = json!({
                "kind": "element",
                "type": element.kind().tag(),
                "id": id.index(),
                "offset": m.offset(),
                "length": m.length(),
            });
            if let Some(name) = element.name() {
                node["name"] = json!(name);
            }
            if let Some(captures) = m.captures() {
                node["captures"] = Json::Array(
                    captures
                        .iter()
                        .map(|c| match c {
                            Some(bytes) => json!(String::from_utf8_lossy(bytes)),
                            None => Json::Null,
                        })
                        .collect(),
                );
            }
            node["children"] = Json::Array(m.children().iter().map(|c| to_json(c, grammar)).collect());
            node
        }
        MatchOrigin::Reference(reference_id) => {
            let reference = grammar.reference(reference_id);
            let mut node = json!({
                "kind": "reference",
                "cardinality": cardinality_tag(reference.cardinality()),
                "offset": m.offset(),
                "length": m.length(),
            });
            if let Some(name) = reference.name() {
                node["name"] = json!(name);
            }
            node["children"] = Json::Array(m.children().iter().map(|c| to_json(c, grammar)).collect());
            node
        }
    }
}

/// Render a match tree as pretty-printed JSON text.
pub fn to_json_string(m: &Match, grammar: &Grammar) -> String {
    serde_json::to_string_pretty(&to_json(m, grammar)).expect("match tree JSON is always serializable")
}

/// Write a match tree to `writer` as indented XML.
pub fn to_xml(m: &Match, grammar: &Grammar, writer: impl Write) -> Result<(), XmlWriteError> {
    let mut xml = Writer::new_with_indent(writer, b' ', 2);
    write_node(&mut xml, m, grammar)?;
    Ok(())
}

fn write_node<W: Write>(xml: &mut Writer<W>, m: &Match, grammar: &Grammar) -> Result<(), XmlWriteError> {
    match m.origin() {
        MatchOrigin::Element(id) => {
            let element = grammar.element(id);
            let mut start = BytesStart::new(element.kind().tag());
            start.push_attribute(("id", id.index().to_string().as_str()));
            start.push_attribute(("offset", m.offset().to_string().as_str()));
            start.push_attribute(("length", m.length().to_string().as_str()));
            if let Some(name) = element.name() {
                start.push_attribute(("name", name));
            }
            xml.write_event(Event::Start(start))?;
            if let Some(captures) = m.captures() {
                for capture in captures.iter().flatten() {
                    let text = String::from_utf8_lossy(capture);
                    xml.write_event(Event::Text(BytesText::new(text.as_ref())))?;
                }
            }
            for child in m.children() {
                write_node(xml, child, grammar)?;
            }
            xml.write_event(Event::End(BytesEnd::new(element.kind().tag())))?;
        }
        MatchOrigin::Reference(reference_id) => {
            let reference = grammar.reference(reference_id);
            let mut start = BytesStart::new("reference");
            start.push_attribute(("cardinality", cardinality_tag(reference.cardinality())));
            if let Some(name) = reference.name() {
                start.push_attribute(("name", name));
            }
            xml.write_event(Event::Start(start))?;
            for child in m.children() {
                write_node(xml, child, grammar)?;
            }
            xml.write_event(Event::End(BytesEnd::new("reference")))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use pege_core::grammar::{Child, Grammar};
    use pege_core::reference::Reference;

    use super::*;

    /// `Pair -> [left: A, right: B]`, matching `"ab"`.
    fn build_pair_grammar() -> Grammar {
        let mut g = Grammar::new();
        let a = g.word("A", "a").unwrap();
        let b = g.word("B", "b").unwrap();
        let pair = g
            .rule(
                "Pair",
                vec![
                    Child::from(Reference::new(a).as_name("left")),
                    Child::from(Reference::new(b).as_name("right")),
                ],
            )
            .unwrap();
        g.set_axiom(pair);
        g.prepare().unwrap();
        g
    }

    #[test]
    fn json_reports_element_shape_and_named_children() {
        let g = build_pair_grammar();
        let result = g.parse_string("ab");
        assert!(result.is_success());
        let root = result.root_match().unwrap();

        let node = to_json(root, &g);
        assert_eq!(node["kind"], "element");
        assert_eq!(node["type"], "rule");
        assert_eq!(node["name"], "Pair");
        assert_eq!(node["offset"], 0);
        assert_eq!(node["length"], 2);

        let children = node["children"].as_array().unwrap();
        assert_eq!(children.len(), 2);
        assert_eq!(children[0]["kind"], "reference");
        assert_eq!(children[0]["name"], "left");
        assert_eq!(children[0]["cardinality"], "one");
        assert_eq!(children[0]["children"][0]["name"], "A");
        assert_eq!(children[1]["name"], "right");
        assert_eq!(children[1]["children"][0]["name"], "B");
    }

    #[test]
    fn xml_writes_nested_tags_with_names_and_cardinality() {
        let g = build_pair_grammar();
        let result = g.parse_string("ab");
        let root = result.root_match().unwrap();

        let mut buf = Vec::new();
        to_xml(root, &g, &mut buf).unwrap();
        let xml = String::from_utf8(buf).unwrap();

        assert!(xml.contains("<rule"));
        assert!(xml.contains("name=\"Pair\""));
        assert!(xml.contains("<reference"));
        assert!(xml.contains("name=\"left\""));
        assert!(xml.contains("cardinality=\"one\""));
        assert!(xml.contains("name=\"A\""));
        assert!(xml.contains("</rule>"));
    }
}
