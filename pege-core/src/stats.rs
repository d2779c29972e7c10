/*!
Per-symbol success/failure counters and deepest-failure tracking, the
primary aid for grammar debugging (spec'd in the original `libparsing`'s
`Stats`/report machinery).
*/

use crate::element::ElementId;
use crate::grammar::Grammar;

#[derive(Debug, Clone, Copy, Default)]
struct Counters {
    successes: u64,
    failures: u64,
}

/// Per-element counters, plus the cursor positions a host needs to
/// render a useful parse-failure diagnostic.
#[derive(Debug)]
pub struct Stats {
    counters: Vec<Counters>,
    deepest_failure_offset: usize,
    deepest_failure_element: Option<ElementId>,
    last_match_offset: usize,
    last_match_length: usize,
    last_match_element: Option<ElementId>,
}

impl Stats {
    pub(crate) fn new(element_count: usize) -> Self {
        Stats {
            counters: vec![Counters::default(); element_count],
            deepest_failure_offset: 0,
            deepest_failure_element: None,
            last_match_offset: 0,
            last_match_length: 0,
            last_match_element: None,
        }
    }

    pub(crate) fn record(&mut self, element: ElementId, offset: usize, success: bool, end: usize) {
        if let Some(counters) = self.counters.get_mut(element.index() as usize) {
            if success {
                counters.successes += 1;
            } else {
                counters.failures += 1;
            }
        }
        if success {
            if end >= self.last_match_offset + self.last_match_length || self.last_match_element.is_none() {
                self.last_match_offset = offset;
                self.last_match_length = end - offset;
                self.last_match_element = Some(element);
            }
        } else if offset >= self.deepest_failure_offset || self.deepest_failure_element.is_none() {
            self.deepest_failure_offset = offset;
            self.deepest_failure_element = Some(element);
        }
    }

    /// Successes and failures recorded for `element`.
    pub fn counts(&self, element: ElementId) -> (u64, u64) {
        self.counters
            .get(element.index() as usize)
            .map(|c| (c.successes, c.failures))
            .unwrap_or_default()
    }

    /// The offset of the deepest recognition failure seen so far.
    pub fn deepest_failure_offset(&self) -> usize {
        self.deepest_failure_offset
    }

    /// The element that was being attempted at the deepest failure.
    pub fn deepest_failure_element(&self) -> Option<ElementId> {
        self.deepest_failure_element
    }

    /// Offset, length, and element of the last successful match.
    pub fn last_match(&self) -> (usize, usize, Option<ElementId>) {
        (self.last_match_offset, self.last_match_length, self.last_match_element)
    }

    /// One row per element that was attempted at least once: name/id,
    /// successes, failures, hit ratio.
    pub fn report_rows(&self, grammar: &Grammar) -> Vec<ReportRow> {
        grammar
            .elements()
            .filter(|e| e.reachable_id().is_some())
            .filter_map(|e| {
                let (successes, failures) = self.counts(e.id());
                let attempts = successes + failures;
                (attempts > 0).then(|| ReportRow {
                    id: e.id(),
                    name: e.name().map(str::to_owned),
                    successes,
                    failures,
                    hit_ratio: successes as f64 / attempts as f64,
                })
            })
            .collect()
    }
}

/// One row of a per-symbol diagnostic report.
#[derive(Debug, Clone)]
pub struct ReportRow {
    /// The element this row describes.
    pub id: ElementId,
    /// Its human name, if any.
    pub name: Option<String>,
    /// Successful recognition attempts.
    pub successes: u64,
    /// Failed recognition attempts.
    pub failures: u64,
    /// `successes / (successes + failures)`.
    pub hit_ratio: f64,
}

/// Render a window of `input` around `offset`, with a `^` pointer under
/// the exact byte, for textual error reporting.
pub fn render_pointer(input: &[u8], offset: usize, context_lines: usize) -> String {
    let text = String::from_utf8_lossy(input);
    let mut line_starts = vec![0usize];
    for (i, b) in text.bytes().enumerate() {
        if b == b'\n' {
            line_starts.push(i + 1);
        }
    }
    let line_index = line_starts.partition_point(|&start| start <= offset).saturating_sub(1);
    let first = line_index.saturating_sub(context_lines);
    let last = (line_index + context_lines).min(line_starts.len() - 1);

    let lines: Vec<&str> = text.lines().collect();
    let mut out = String::new();
    for i in first..=last {
        if let Some(line) = lines.get(i) {
            out.push_str(&format!("{:>5} | {}\n", i + 1, line));
            if i == line_index {
                let col = offset - line_starts[i];
                out.push_str(&format!("      | {}^\n", " ".repeat(col)));
            }
        }
    }
    out
}
