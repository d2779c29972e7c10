//! The two demo grammars from the worked examples: arithmetic
//! expressions with whitespace skipping, and an indentation-sensitive
//! block language.

use pege_core::context::Value;
use pege_core::error::GrammarError;
use pege_core::grammar::{Child, Grammar};
use pege_core::reference::Reference;

/// `Expression = Value Suffix*`, `Suffix = OPERATOR Value`,
/// `Value = NUMBER | VARIABLE`, skipping `WS` between rule children.
pub fn arithmetic() -> Result<Grammar, GrammarError> {
    let mut g = Grammar::new();

    let number = g.token("NUMBER", r"\d+(\.\d+)?")?;
    let variable = g.token("VARIABLE", r"[A-Za-z_][A-Za-z0-9_]*")?;
    let operator = g.token("OPERATOR", r"[+\-*/]")?;
    let ws = g.token("WS", r"\s+")?;

    let value = g.group("Value", vec![Child::Element(number), Child::Element(variable)])?;
    let suffix = g.rule(
        "Suffix",
        vec![
            Child::Reference(Reference::new(operator).as_name("op")),
            Child::Reference(Reference::new(value).as_name("rhs")),
        ],
    )?;
    let expression = g.rule(
        "Expression",
        vec![
            Child::Reference(Reference::new(value).as_name("lhs")),
            Child::Reference(Reference::new(suffix).as_name("suffix").zero_or_more()),
        ],
    )?;

    g.set_skip(ws);
    g.set_axiom(expression);
    g.prepare()?;
    Ok(g)
}

/// `Block = NAME ':' EOL Indent (Block | Line)+ Dedent`,
/// `Line = CheckIndent Tab* NAME '=' VALUE EOL`.
///
/// Indentation is tracked entirely through context variables: `Indent`
/// bumps a counter on the way into a block, `CheckIndent` refuses to
/// match unless the current line's leading tabs equal that counter,
/// and `Dedent` restores it on the way out.
pub fn indentation() -> Result<Grammar, GrammarError> {
    let mut g = Grammar::new();

    let indent_depth = |ctx: &pege_core::context::ParsingContext| match ctx.get("indent") {
        Some(Value::Int(n)) => *n,
        _ => 0,
    };

    let check_indent = g.condition("CheckIndent", move |_element, ctx| {
        let expected = indent_depth(ctx);
        let mut tabs = 0i64;
        let mut offset = ctx.current_offset();
        while ctx.char_at(offset) == Some(b'\t') {
            tabs += 1;
            offset += 1;
        }
        Ok(tabs == expected)
    })?;

    let indent = g.procedure("Indent", move |_element, ctx| {
        let depth = indent_depth(ctx);
        ctx.set("indent", Value::Int(depth + 1));
        Ok(())
    })?;

    let dedent = g.procedure("Dedent", move |_element, ctx| {
        let depth = indent_depth(ctx);
        ctx.set("indent", Value::Int(depth - 1));
        Ok(())
    })?;

    let tab = g.anon_word("\t")?;
    let name = g.token("NAME", r"[A-Za-z_][A-Za-z0-9_]*")?;
    let value = g.token("VALUE", r"[A-Za-z0-9_]+")?;
    let colon = g.anon_word(":")?;
    let equals = g.anon_word("=")?;
    let eol = g.anon_word("\n")?;

    let line = g.rule(
        "Line",
        vec![
            Child::Element(check_indent),
            Child::Reference(Reference::new(tab).zero_or_more()),
            Child::Reference(Reference::new(name).as_name("key")),
            Child::Element(equals),
            Child::Reference(Reference::new(value).as_name("value")),
            Child::Element(eol),
        ],
    )?;

    // `Block` recurses through this placeholder group so it can appear
    // as one of its own descendants (nested blocks); the group's
    // children are filled in below via `add_child`, after `Block`
    // itself exists.
    let body_item = g.anon_group(Vec::new())?;
    let block = g.rule(
        "Block",
        vec![
            Child::Reference(Reference::new(name).as_name("name")),
            Child::Element(colon),
            Child::Element(eol),
            Child::Element(indent),
            Child::Reference(Reference::new(body_item).as_name("body").one_or_more()),
            Child::Element(dedent),
        ],
    )?;
    g.add_child(body_item, Child::Element(block))?;
    g.add_child(body_item, Child::Element(line))?;

    g.set_axiom(block);
    g.prepare()?;
    Ok(g)
}
