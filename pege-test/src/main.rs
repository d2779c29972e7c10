use std::io::{self, Read};

use anyhow::{bail, Context};

mod grammars;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let which = std::env::args().nth(1).unwrap_or_else(|| "arithmetic".to_string());
    let grammar = match which.as_str() {
        "arithmetic" => grammars::arithmetic().context("failed to build the arithmetic grammar")?,
        "indentation" => grammars::indentation().context("failed to build the indentation grammar")?,
        other => bail!("unknown demo grammar {other:?}; expected \"arithmetic\" or \"indentation\""),
    };

    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf).context("failed to read from stdin")?;

    let mut result = grammar.parse_string(buf);
    if result.is_failure() {
        eprint!("{}", result.describe_error());
        bail!("parse failed");
    }
    if result.is_partial() {
        eprint!("{}", result.describe_error());
    }

    let root = result.root_match().expect("non-failure result always has a root match");
    println!("{}", pege::serialize::to_json_string(root, &grammar));
    println!("{}", pege::diagnostics::report_table(result.stats(), &grammar));

    Ok(())
}
