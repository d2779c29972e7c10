/*!
Host-facing formatting glue over `pege_core::stats`: a per-symbol table
and a textual error pointer, the "primary aid for grammar debugging".
*/

use pege_core::grammar::Grammar;
use pege_core::stats::Stats;

/// Render a per-symbol report: one row per element attempted at least
/// once, sorted by element id, as a fixed-width table.
pub fn report_table(stats: &Stats, grammar: &Grammar) -> String {
    let mut rows = stats.report_rows(grammar);
    rows.sort_by_key(|row| row.id.index());

    let mut out = String::new();
    out.push_str(&format!("{:>6}  {:<24}  {:>10}  {:>10}  {:>8}\n", "id", "name", "successes", "failures", "hit%"));
    for row in &rows {
        let name = row.name.as_deref().unwrap_or("<anon>");
        out.push_str(&format!(
            "{:>6}  {:<24}  {:>10}  {:>10}  {:>7.1}%\n",
            row.id.index(),
            name,
            row.successes,
            row.failures,
            row.hit_ratio * 100.0,
        ));
    }
    out
}
