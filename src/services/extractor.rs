// src/services/extractor.rs

//! Selection extraction.
//!
//! A selection is produced in four stages:
//! 1. the CSS selector picks subtrees (the whole document when empty),
//! 2. filters rewrite the serialized markup in configured order,
//! 3. the include pattern keeps only its matches, one per line,
//! 4. the exclude pattern removes its matches.

use regex::Regex;
use scraper::{Html, Selector};

use crate::models::{Extraction, Filter};
use crate::services::render::apply_filter;

/// Extract the selection of a parsed document.
pub fn extract(document: &Html, rules: &Extraction) -> String {
    let mut selection = select(document, rules.selector.as_ref());

    for filter in &rules.filters {
        selection = apply_filter(&selection, *filter, &rules.newline);
    }

    if let Some(include) = &rules.include {
        selection = keep_matches(&selection, include, &rules.newline);
    }

    if let Some(exclude) = &rules.exclude {
        selection = exclude.replace_all(&selection, "").into_owned();
    }

    selection
}

/// Parse markup and extract its selection.
///
/// The parsed document never outlives this call.
pub fn extract_markup(markup: &str, rules: &Extraction) -> String {
    let document = Html::parse_document(markup);
    extract(&document, rules)
}

/// Serialize every subtree matching the selector, in document order.
fn select(document: &Html, selector: Option<&Selector>) -> String {
    match selector {
        None => document.html(),
        Some(selector) => document
            .select(selector)
            .map(|element| element.html())
            .collect(),
    }
}

/// Concatenate all non-overlapping matches, each followed by `newline`.
fn keep_matches(selection: &str, pattern: &Regex, newline: &str) -> String {
    pattern
        .find_iter(selection)
        .fold(String::new(), |mut out, m| {
            out.push_str(m.as_str());
            out.push_str(newline);
            out
        })
}
