//! End-to-end scenarios exercising the recognizer across element types,
//! skip handling, named references, and context-driven indentation.

use pege_core::context::Value;
use pege_core::grammar::{Child, Grammar};
use pege_core::reference::Reference;

fn text(bytes: Option<&[u8]>) -> &str {
    std::str::from_utf8(bytes.expect("capture group present")).unwrap()
}

#[test]
fn word_axiom_matches_exactly() {
    let mut g = Grammar::new();
    let axiom = g.word("pouet", "pouet").unwrap();
    g.set_axiom(axiom);
    g.prepare().unwrap();

    let result = g.parse_string("pouet");
    assert!(result.is_success());
    let m = result.root_match().unwrap();
    assert_eq!(m.offset(), 0);
    assert_eq!(m.length(), 5);
    assert!(m.children().is_empty());
}

#[test]
fn rule_reports_partial_on_trailing_input() {
    let mut g = Grammar::new();
    let a = g.anon_word("a").unwrap();
    let b = g.anon_word("b").unwrap();
    let rule = g.anon_rule(vec![Child::Element(a), Child::Element(b)]).unwrap();
    g.set_axiom(rule);
    g.prepare().unwrap();

    let mut result = g.parse_string("abab");
    assert!(result.is_partial());
    assert_eq!(result.root_match().unwrap().length(), 2);
    assert_eq!(result.remaining_bytes(), 2);
}

#[test]
fn named_references_bind_operator_operands() {
    let mut g = Grammar::new();
    let number = g.token("NUMBER", r"\d+").unwrap();
    let variable = g.token("VARIABLE", r"\w+").unwrap();
    let operator = g.token("OPERATOR", r"[+\-*/]").unwrap();
    let value = g
        .group("Value", vec![Child::Element(number), Child::Element(variable)])
        .unwrap();

    let left = Reference::new(value).as_name("left");
    let op = Reference::new(operator).as_name("op");
    let right = Reference::new(value).as_name("right");
    let operation = g
        .rule(
            "Operation",
            vec![Child::Reference(left), Child::Reference(op), Child::Reference(right)],
        )
        .unwrap();
    g.set_axiom(operation);
    g.prepare().unwrap();

    let result = g.parse_string("1+10");
    assert!(result.is_success());
    let root = result.root_match().unwrap();

    // named_child -> reference wrapper -> Value group match -> inner
    // alternative's reference wrapper -> the token match itself.
    let left_value = root.named_child("left", &g).unwrap().children()[0]
        .children()[0]
        .children()[0]
        .captures()
        .unwrap()[0]
        .clone();
    // `op` targets the OPERATOR token directly, so only one wrapper deep.
    let op_value = root.named_child("op", &g).unwrap().children()[0].captures().unwrap()[0].clone();
    let right_value = root.named_child("right", &g).unwrap().children()[0]
        .children()[0]
        .children()[0]
        .captures()
        .unwrap()[0]
        .clone();

    assert_eq!(text(left_value.as_deref()), "1");
    assert_eq!(text(op_value.as_deref()), "+");
    assert_eq!(text(right_value.as_deref()), "10");
}

#[test]
fn whitespace_skip_between_rule_children() {
    let mut g = Grammar::new();
    let number = g.token("NUMBER", r"\d+").unwrap();
    let variable = g.token("VARIABLE", r"[A-Za-z]+").unwrap();
    let operator = g.token("OPERATOR", r"[+\-*/]").unwrap();
    let ws = g.token("WS", r"\s+").unwrap();
    let value = g
        .group("Value", vec![Child::Element(number), Child::Element(variable)])
        .unwrap();

    let suffix = g
        .rule("Suffix", vec![Child::Element(operator), Child::Element(value)])
        .unwrap();
    let suffix_ref = Reference::new(suffix).zero_or_more();
    let expression = g
        .rule(
            "Expression",
            vec![Child::Element(value), Child::Reference(suffix_ref)],
        )
        .unwrap();
    g.set_skip(ws);
    g.set_axiom(expression);
    g.prepare().unwrap();

    let result = g.parse_string("10 + VAR");
    assert!(result.is_success());
    let root = result.root_match().unwrap();
    // children: [Value-reference, Suffix*-reference]
    assert_eq!(root.children().len(), 2);
    let suffixes = &root.children()[1];
    assert_eq!(suffixes.children().len(), 1, "expected exactly one Suffix");
}

#[test]
fn indentation_sensitive_block() {
    let mut g = Grammar::new();

    let check_indent = g
        .condition("CheckIndent", |_element, ctx| {
            let expected = match ctx.get("indent") {
                Some(Value::Int(n)) => *n,
                _ => 0,
            };
            let mut tabs = 0i64;
            let mut offset = ctx.current_offset();
            while ctx.char_at(offset) == Some(b'\t') {
                tabs += 1;
                offset += 1;
            }
            Ok(tabs == expected)
        })
        .unwrap();

    let indent = g
        .procedure("Indent", |_element, ctx| {
            let n = match ctx.get("indent") {
                Some(Value::Int(n)) => *n,
                _ => 0,
            };
            ctx.set("indent", Value::Int(n + 1));
            Ok(())
        })
        .unwrap();

    let dedent = g
        .procedure("Dedent", |_element, ctx| {
            let n = match ctx.get("indent") {
                Some(Value::Int(n)) => *n,
                _ => 0,
            };
            ctx.set("indent", Value::Int(n - 1));
            Ok(())
        })
        .unwrap();

    let tab = g.anon_word("\t").unwrap();
    let name = g.token("NAME", r"[A-Za-z]+").unwrap();
    let value = g.token("VALUE", r"[A-Za-z]+").unwrap();
    let eol = g.anon_word("\n").unwrap();
    let colon = g.anon_word(":").unwrap();
    let equals = g.anon_word("=").unwrap();

    // Line = CheckIndent Tab* NAME '=' VALUE EOL
    let line = g
        .rule(
            "Line",
            vec![
                Child::Element(check_indent),
                Child::Reference(Reference::new(tab).zero_or_more()),
                Child::Element(name),
                Child::Element(equals),
                Child::Element(value),
                Child::Element(eol),
            ],
        )
        .unwrap();

    // Block = NAME ':' EOL Indent (Block|Line)+ Dedent
    let block_or_line_placeholder = g.anon_group(Vec::new()).unwrap();
    let block = g
        .rule(
            "Block",
            vec![
                Child::Element(name),
                Child::Element(colon),
                Child::Element(eol),
                Child::Element(indent),
                Child::Reference(Reference::new(block_or_line_placeholder).one_or_more()),
                Child::Element(dedent),
            ],
        )
        .unwrap();
    g.add_child(block_or_line_placeholder, Child::Element(block)).unwrap();
    g.add_child(block_or_line_placeholder, Child::Element(line)).unwrap();

    g.set_axiom(block);
    g.prepare().unwrap();

    let result = g.parse_string("block:\n\tproperty=value\n");
    assert!(result.is_success(), "{:?}", result.status());
}

#[test]
fn quantified_parens_reject_empty_one_or_more() {
    let mut g = Grammar::new();
    let lparen = g.anon_word("(").unwrap();
    let rparen = g.anon_word(")").unwrap();
    let value = g.token("VALUE", r"[A-Za-z]+").unwrap();

    let star_values = Reference::new(value).zero_or_more();
    let star_rule = g
        .rule("StarParens", vec![Child::Element(lparen), Child::Reference(star_values), Child::Element(rparen)])
        .unwrap();
    g.set_axiom(star_rule);
    g.prepare().unwrap();
    assert!(g.parse_string("()").is_success());

    let mut g2 = Grammar::new();
    let lparen2 = g2.anon_word("(").unwrap();
    let rparen2 = g2.anon_word(")").unwrap();
    let value2 = g2.token("VALUE", r"[A-Za-z]+").unwrap();
    let plus_values = Reference::new(value2).one_or_more();
    let plus_rule = g2
        .rule("PlusParens", vec![Child::Element(lparen2), Child::Reference(plus_values), Child::Element(rparen2)])
        .unwrap();
    g2.set_axiom(plus_rule);
    g2.prepare().unwrap();
    assert!(!g2.parse_string("()").is_success());
}
