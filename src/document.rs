//! Read-only view over a parsed course page
//!
//! Wraps a `scraper::Html` with the traversals the extractors need:
//! CSS queries, visible text, table rows, definition lists and
//! label/value containers.

use std::cell::OnceCell;
use std::sync::LazyLock;

use regex::Regex;
use scraper::node::Node;
use scraper::{ElementRef, Html, Selector};
use serde_json::Value;
use tracing::debug;

use crate::error::{ConfigError, Result};
use crate::profiles::normalize_host;

/// Elements whose text is never shown to a reader
const HIDDEN_ELEMENTS: &[&str] = &["head", "script", "style", "noscript", "template"];

static JSONLD: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"script[type="application/ld+json"]"#).unwrap());
static TABLE: LazyLock<Selector> = LazyLock::new(|| Selector::parse("table").unwrap());
static ROW: LazyLock<Selector> = LazyLock::new(|| Selector::parse("tr").unwrap());
static DL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("dl").unwrap());
static DT_DD: LazyLock<Selector> = LazyLock::new(|| Selector::parse("dt, dd").unwrap());
static CONTAINER: LazyLock<Selector> = LazyLock::new(|| Selector::parse("div, li, p").unwrap());
static LABEL_CHILD: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("span, strong, b, h3, h4, h5, dt").unwrap());
static VALUE_CHILD: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("span, p, dd, div").unwrap());

static CONTAINER_CLASS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)key-info|detail|fact|stat").unwrap());
static LABEL_CLASS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)label|title|key").unwrap());
static VALUE_CLASS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)value|content|data").unwrap());

/// Longest text still treated as a label by the structural heuristics
const MAX_LABEL_CHARS: usize = 48;
const MAX_LABEL_WORDS: usize = 6;

/// How a query turns a matched element into text
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Accessor {
    /// Visible text, whitespace-collapsed
    Text,
    /// Attribute value
    Attr(String),
}

/// Compiled selector expression, optionally suffixed with `::text` or `::attr(name)`
#[derive(Debug, Clone)]
pub struct Query {
    expression: String,
    selector: Selector,
    accessor: Accessor,
}

impl Query {
    pub fn parse(expression: &str) -> Result<Self> {
        let (css, accessor) = split_accessor(expression);
        let selector = Selector::parse(css).map_err(|e| ConfigError::InvalidSelector {
            selector: expression.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            expression: expression.to_string(),
            selector,
            accessor,
        })
    }

    pub fn expression(&self) -> &str {
        &self.expression
    }

    pub fn selector(&self) -> &Selector {
        &self.selector
    }

    pub fn accessor(&self) -> &Accessor {
        &self.accessor
    }
}

// Split `div.fees::attr(content)` into the CSS part and its accessor
fn split_accessor(input: &str) -> (&str, Accessor) {
    let input = input.trim();
    if let Some(css) = input.strip_suffix("::text") {
        return (css.trim_end(), Accessor::Text);
    }
    if let Some(pos) = input.rfind("::attr(") {
        let attr_start = pos + 7;
        if let Some(attr_end) = input[attr_start..].find(')') {
            let attr = input[attr_start..attr_start + attr_end].trim();
            return (input[..pos].trim_end(), Accessor::Attr(attr.to_string()));
        }
    }
    (input, Accessor::Text)
}

/// A parsed page plus its canonical URL
pub struct CoursePage {
    document: Html,
    url: String,
    host: Option<String>,
    visible_text: OnceCell<String>,
    structured_data: OnceCell<Vec<Value>>,
    key_value_pairs: OnceCell<Vec<(String, String)>>,
}

impl CoursePage {
    /// Parse HTML leniently; malformed markup still yields a document
    pub fn parse(html: &str, url: &str) -> Self {
        Self::from_document(Html::parse_document(html), url)
    }

    pub fn from_document(document: Html, url: &str) -> Self {
        Self {
            document,
            url: url.to_string(),
            host: normalize_host(url),
            visible_text: OnceCell::new(),
            structured_data: OnceCell::new(),
            key_value_pairs: OnceCell::new(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Lowercased host without a leading `www.`
    pub fn host(&self) -> Option<&str> {
        self.host.as_deref()
    }

    pub fn document(&self) -> &Html {
        &self.document
    }

    /// All elements matching `selector`, in document order
    pub fn query(&self, selector: &Selector) -> Vec<ElementRef<'_>> {
        self.document.select(selector).collect()
    }

    /// Visible text of an element, whitespace-collapsed
    pub fn text(element: ElementRef<'_>) -> String {
        let mut out = String::new();
        push_visible_text(element, &mut out);
        collapse_whitespace(&out)
    }

    /// Non-empty values produced by `query`, in document order
    pub fn read(&self, query: &Query) -> Vec<String> {
        self.document
            .select(query.selector())
            .filter_map(|el| match query.accessor() {
                Accessor::Text => Some(Self::text(el)),
                Accessor::Attr(name) => el.value().attr(name).map(collapse_whitespace),
            })
            .filter(|v| !v.is_empty())
            .collect()
    }

    /// Values of the first query that yields anything
    pub fn first_match(&self, queries: &[Query]) -> Vec<String> {
        queries
            .iter()
            .map(|q| self.read(q))
            .find(|values| !values.is_empty())
            .unwrap_or_default()
    }

    /// Visible text of the whole page; computed on first use
    pub fn visible_text(&self) -> &str {
        self.visible_text
            .get_or_init(|| Self::text(self.document.root_element()))
    }

    /// Raw contents of every `application/ld+json` script block
    pub fn structured_data_blocks(&self) -> Vec<String> {
        self.document
            .select(&JSONLD)
            .map(|el| el.text().collect::<String>())
            .filter(|s| !s.trim().is_empty())
            .collect()
    }

    /// Parsed JSON-LD blocks in document order; malformed blocks are skipped.
    /// Parsed on first use.
    pub fn structured_data(&self) -> &[Value] {
        self.structured_data.get_or_init(|| {
            self.structured_data_blocks()
                .iter()
                .enumerate()
                .filter_map(|(index, block)| match serde_json::from_str(block.trim()) {
                    Ok(json) => Some(json),
                    Err(err) => {
                        debug!(url = %self.url, block = index, %err, "skipping malformed JSON-LD block");
                        None
                    }
                })
                .collect()
        })
    }

    /// Every (label, value) pair on the page: table rows, then definition
    /// lists, then label/value containers. Collected on first use.
    pub fn key_value_pairs(&self) -> &[(String, String)] {
        self.key_value_pairs.get_or_init(|| {
            self.tables()
                .into_iter()
                .flatten()
                .chain(self.definition_lists())
                .chain(self.label_value_containers())
                .collect()
        })
    }

    /// Rows of every table as (header cell, value cell) pairs
    pub fn tables(&self) -> Vec<Vec<(String, String)>> {
        self.document
            .select(&TABLE)
            .map(|table| {
                table
                    .select(&ROW)
                    .filter_map(|row| {
                        let cells: Vec<ElementRef<'_>> = row
                            .children()
                            .filter_map(ElementRef::wrap)
                            .filter(|c| matches!(c.value().name(), "th" | "td"))
                            .collect();
                        if cells.len() < 2 {
                            return None;
                        }
                        Some((Self::text(cells[0]), Self::text(cells[1])))
                    })
                    .collect()
            })
            .collect()
    }

    /// (term, definition) pairs; a term applies to every definition until the next term
    pub fn definition_lists(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();

        for dl in self.document.select(&DL) {
            let mut term: Option<String> = None;
            for item in dl.select(&DT_DD) {
                match item.value().name() {
                    "dt" => term = Some(Self::text(item)),
                    _ => {
                        if let Some(label) = &term {
                            pairs.push((label.clone(), Self::text(item)));
                        }
                    }
                }
            }
        }

        pairs
    }

    /// (label, value) pairs found through structural heuristics
    pub fn label_value_containers(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();

        for container in self.document.select(&CONTAINER) {
            if let Some(pair) = class_marked_pair(container)
                .or_else(|| sibling_pair(container))
                .or_else(|| inline_label_pair(container))
            {
                pairs.push(pair);
            }
        }

        pairs
    }
}

fn has_class_matching(element: ElementRef<'_>, pattern: &Regex) -> bool {
    element
        .value()
        .attr("class")
        .is_some_and(|class| pattern.is_match(class))
}

// <div class="key-info"><span class="label">Duration</span><span class="value">3 years</span></div>
fn class_marked_pair(container: ElementRef<'_>) -> Option<(String, String)> {
    if !matches!(container.value().name(), "div" | "li")
        || !has_class_matching(container, &CONTAINER_CLASS)
    {
        return None;
    }

    let label = container
        .select(&LABEL_CHILD)
        .find(|el| has_class_matching(*el, &LABEL_CLASS))?;
    let value = container
        .select(&VALUE_CHILD)
        .find(|el| el.id() != label.id() && has_class_matching(*el, &VALUE_CLASS))?;

    let value_text = CoursePage::text(value);
    if value_text.is_empty() {
        return None;
    }
    Some((CoursePage::text(label), value_text))
}

// <div><h4>Duration</h4><p>3 years</p></div>
fn sibling_pair(container: ElementRef<'_>) -> Option<(String, String)> {
    let has_loose_text = container.children().any(|child| match child.value() {
        Node::Text(text) => !text.trim().is_empty(),
        _ => false,
    });
    if has_loose_text {
        return None;
    }

    let children: Vec<ElementRef<'_>> = container.children().filter_map(ElementRef::wrap).collect();
    let [label, value] = children.as_slice() else {
        return None;
    };

    let label_text = CoursePage::text(*label);
    let value_text = CoursePage::text(*value);
    if !is_label_like(&label_text) || value_text.is_empty() {
        return None;
    }
    Some((label_text, value_text))
}

// <p><strong>Duration:</strong> 3 years</p>
fn inline_label_pair(container: ElementRef<'_>) -> Option<(String, String)> {
    let mut children = container.children().filter(|child| match child.value() {
        Node::Text(text) => !text.trim().is_empty(),
        Node::Element(_) => true,
        _ => false,
    });

    let label = ElementRef::wrap(children.next()?)?;
    if !matches!(label.value().name(), "strong" | "b") {
        return None;
    }

    let mut rest = String::new();
    for child in children {
        match child.value() {
            Node::Text(text) => rest.push_str(text),
            Node::Element(_) => {
                if let Some(el) = ElementRef::wrap(child) {
                    push_visible_text(el, &mut rest);
                }
            }
            _ => {}
        }
        rest.push(' ');
    }

    let label_text = CoursePage::text(label);
    let value_text = collapse_whitespace(&rest);
    if !is_label_like(&label_text) || value_text.is_empty() {
        return None;
    }
    Some((label_text, value_text))
}

fn is_label_like(text: &str) -> bool {
    !text.is_empty()
        && text.chars().count() <= MAX_LABEL_CHARS
        && text.split_whitespace().count() <= MAX_LABEL_WORDS
        && text.chars().any(char::is_alphabetic)
}

fn push_visible_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(el) if HIDDEN_ELEMENTS.contains(&el.name()) => {}
            Node::Element(_) => {
                if let Some(child_el) = ElementRef::wrap(child) {
                    out.push(' ');
                    push_visible_text(child_el, out);
                    out.push(' ');
                }
            }
            _ => {}
        }
    }
}

pub(crate) fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
    <html>
    <head>
        <title>Bachelor of Nursing</title>
        <script type="application/ld+json">{"@type": "Course", "name": "Nursing"}</script>
        <style>.fees { color: red; }</style>
    </head>
    <body>
        <h1 class="course-title">Bachelor of   Nursing</h1>
        <table>
            <tr><th>Duration</th><td>3 years</td></tr>
            <tr><th>Credit Points</th><td>144</td></tr>
            <tr><td colspan="2">Footnote only</td></tr>
        </table>
        <dl>
            <dt>Campus</dt><dd>Brisbane</dd><dd>Melbourne</dd>
            <div><dt>Course code</dt><dd>BN01</dd></div>
        </dl>
        <div class="key-info__item">
            <span class="key-info__label">Study mode</span>
            <span class="key-info__value">Full-time</span>
        </div>
        <div><h4>Intake</h4><p>Semester 1</p></div>
        <p><strong>ATAR:</strong> 70.00 <em>(2025)</em></p>
        <script>var hidden = "not text";</script>
    </body>
    </html>
    "#;

    #[test]
    fn test_query_and_text() {
        let page = CoursePage::parse(PAGE, "https://www.acu.edu.au/course/bachelor-of-nursing");
        let selector = Selector::parse("h1.course-title").unwrap();
        let found = page.query(&selector);

        assert_eq!(found.len(), 1);
        assert_eq!(CoursePage::text(found[0]), "Bachelor of Nursing");
        assert_eq!(page.host(), Some("acu.edu.au"));
    }

    #[test]
    fn test_visible_text_skips_scripts_and_styles() {
        let page = CoursePage::parse(PAGE, "https://example.edu");
        let text = page.visible_text();

        assert!(text.contains("Bachelor of Nursing"));
        assert!(text.contains("Credit Points 144"));
        assert!(!text.contains("not text"));
        assert!(!text.contains("color: red"));
    }

    #[test]
    fn test_tables_pairs_first_two_cells() {
        let page = CoursePage::parse(PAGE, "https://example.edu");
        let tables = page.tables();

        assert_eq!(tables.len(), 1);
        assert_eq!(
            tables[0],
            vec![
                ("Duration".to_string(), "3 years".to_string()),
                ("Credit Points".to_string(), "144".to_string()),
            ]
        );
    }

    #[test]
    fn test_definition_lists() {
        let page = CoursePage::parse(PAGE, "https://example.edu");
        let pairs = page.definition_lists();

        assert_eq!(
            pairs,
            vec![
                ("Campus".to_string(), "Brisbane".to_string()),
                ("Campus".to_string(), "Melbourne".to_string()),
                ("Course code".to_string(), "BN01".to_string()),
            ]
        );
    }

    #[test]
    fn test_label_value_containers() {
        let page = CoursePage::parse(PAGE, "https://example.edu");
        let pairs = page.label_value_containers();

        assert!(pairs.contains(&("Study mode".to_string(), "Full-time".to_string())));
        assert!(pairs.contains(&("Intake".to_string(), "Semester 1".to_string())));
        assert!(pairs.contains(&("ATAR:".to_string(), "70.00 (2025)".to_string())));
    }

    #[test]
    fn test_read_with_accessors() {
        let html = r#"
        <meta name="description" content="  Study   nursing ">
        <div class="fees">$12,000</div>
        "#;
        let page = CoursePage::parse(html, "https://example.edu");

        let meta = Query::parse(r#"meta[name="description"]::attr(content)"#).unwrap();
        assert_eq!(meta.accessor(), &Accessor::Attr("content".to_string()));
        assert_eq!(page.read(&meta), vec!["Study nursing".to_string()]);

        let fees = Query::parse("div.fees::text").unwrap();
        assert_eq!(page.read(&fees), vec!["$12,000".to_string()]);

        let missing = Query::parse(".nothing").unwrap();
        assert_eq!(page.first_match(&[missing, fees]), vec!["$12,000".to_string()]);
    }

    #[test]
    fn test_invalid_selector_is_config_error() {
        let err = Query::parse("div[[").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidSelector { .. }));
    }

    #[test]
    fn test_structured_data_blocks() {
        let page = CoursePage::parse(PAGE, "https://example.edu");
        let blocks = page.structured_data_blocks();

        assert_eq!(blocks.len(), 1);
        assert!(blocks[0].contains("\"Course\""));
    }

    #[test]
    fn test_structured_data_parsed_once() {
        let html = r#"
        <script type="application/ld+json">{ "@type": "Course", "name": </script>
        <script type="application/ld+json">{"@type": "Course", "name": "Nursing"}</script>
        "#;
        let page = CoursePage::parse(html, "https://example.edu");

        let first = page.structured_data();
        assert_eq!(first.len(), 1);
        assert_eq!(first[0]["name"], "Nursing");
        assert!(std::ptr::eq(first, page.structured_data()));
    }

    #[test]
    fn test_key_value_pairs_cached_in_source_order() {
        let page = CoursePage::parse(PAGE, "https://example.edu");

        let pairs = page.key_value_pairs();
        assert_eq!(pairs[0], ("Duration".to_string(), "3 years".to_string()));
        assert_eq!(pairs[2], ("Campus".to_string(), "Brisbane".to_string()));
        assert!(pairs.contains(&("Intake".to_string(), "Semester 1".to_string())));
        assert!(std::ptr::eq(pairs, page.key_value_pairs()));
    }
}
