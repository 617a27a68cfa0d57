//! Turning selector matches into printed output.

use crate::cli::Query;
use ladle_common::text::collapse_whitespace;
use ladle_dom::{Document, DomError};
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::{self, Write};

#[derive(Debug, Serialize)]
pub struct QueryReport {
    pub selector: String,
    pub count: usize,
    pub matches: Vec<MatchReport>,
    #[serde(skip)]
    pub show_attributes: bool,
}

#[derive(Debug, Serialize)]
pub struct MatchReport {
    pub tag: String,
    pub text: String,
    pub attributes: BTreeMap<String, String>,
}

/// Run one query. `raw` keeps text exactly as in the document.
pub fn collect(doc: &Document, query: &Query, raw: bool) -> Result<QueryReport, DomError> {
    let hits = doc.select_with(&query.selector);
    let mut matches = Vec::with_capacity(hits.len());
    for node in &hits {
        let text = node.text_content();
        matches.push(MatchReport {
            tag: node.tag_name()?.to_string(),
            text: if raw { text } else { collapse_whitespace(&text) },
            attributes: node
                .attributes()
                .iter()
                .map(|a| (a.name.clone(), a.value.clone()))
                .collect(),
        });
    }
    tracing::debug!(selector = %query.selector, count = matches.len(), "ladle.query");
    Ok(QueryReport {
        selector: query.selector.to_string(),
        count: matches.len(),
        matches,
        show_attributes: query.attributes,
    })
}

/// `<selector>: <n> match(es)`, then one indented line per match.
pub fn write_text<W: Write>(out: &mut W, report: &QueryReport) -> io::Result<()> {
    let noun = if report.count == 1 { "match" } else { "matches" };
    writeln!(out, "{}: {} {noun}", report.selector, report.count)?;
    for m in &report.matches {
        writeln!(out, "  {}", m.text)?;
        if report.show_attributes {
            for (name, value) in &m.attributes {
                writeln!(out, "    @{name}={value:?}")?;
            }
        }
    }
    Ok(())
}

/// One JSON object per line.
pub fn write_json<W: Write>(out: &mut W, report: &QueryReport) -> io::Result<()> {
    serde_json::to_writer(&mut *out, report)?;
    writeln!(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ladle_dom::Selector;
    use serde_json::{Value, json};

    const PAGE: &str = r#"<div id="x"><h1 class="a b">Hello</h1></div>
<ul>
  <li>A</li>
  <li data-n="2">  B
    two </li>
</ul>"#;

    fn query(sel: &str, attributes: bool) -> Query {
        Query {
            selector: Selector::parse(sel).unwrap(),
            attributes,
        }
    }

    fn text_output(sel: &str, attributes: bool, raw: bool) -> String {
        let doc = ladle_dom::parse(PAGE);
        let report = collect(&doc, &query(sel, attributes), raw).unwrap();
        let mut buf = Vec::new();
        write_text(&mut buf, &report).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn text_lists_collapsed_matches() {
        assert_eq!(text_output("li", false, false), "li: 2 matches\n  A\n  B two\n");
        assert_eq!(text_output(".a.b", false, false), ".a.b: 1 match\n  Hello\n");
        assert_eq!(text_output("table", false, false), "table: 0 matches\n");
    }

    #[test]
    fn raw_keeps_whitespace() {
        let out = text_output("li", false, true);
        assert_eq!(out, "li: 2 matches\n  A\n    B\n    two \n");
    }

    #[test]
    fn attributes_are_printed_when_asked() {
        assert_eq!(
            text_output("h1", true, false),
            "h1: 1 match\n  Hello\n    @class=\"a b\"\n"
        );
    }

    #[test]
    fn json_shape() {
        let doc = ladle_dom::parse(PAGE);
        let report = collect(&doc, &query("#x", false), false).unwrap();
        let mut buf = Vec::new();
        write_json(&mut buf, &report).unwrap();
        assert_eq!(buf.last(), Some(&b'\n'));

        let v: Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(
            v,
            json!({
                "selector": "#x",
                "count": 1,
                "matches": [{"tag": "div", "text": "Hello", "attributes": {"id": "x"}}]
            })
        );
    }
}
