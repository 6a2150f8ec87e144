// src/services/render.rs

//! Markup filters.
//!
//! `numbers`, `attrs` and `scripts` edit the parsed tree and let scraper
//! serialize it, so filtered markup is written exactly like the unfiltered
//! selection. `html` reduces the fragment to its text lines.

use scraper::{ElementRef, Html, Node};

use crate::models::Filter;

/// Re-parse a fragment and serialize it with one filter applied.
pub fn apply_filter(fragment: &str, filter: Filter, newline: &str) -> String {
    let mut document = Html::parse_fragment(fragment);
    match filter {
        Filter::Html => {
            let mut out = String::with_capacity(fragment.len());
            write_text_lines(document.root_element(), newline, &mut out);
            return out;
        }
        Filter::Numbers => strip_numbers(&mut document),
        Filter::Attrs => strip_attrs(&mut document),
        Filter::Scripts => detach_scripts(&mut document),
    }
    document.root_element().inner_html()
}

/// Remove numeric chars from every text node, script and style bodies included.
fn strip_numbers(document: &mut Html) {
    for node in document.tree.values_mut() {
        if let Node::Text(text) = node {
            if text.text.chars().any(char::is_numeric) {
                let kept: String = text.text.chars().filter(|c| !c.is_numeric()).collect();
                text.text = kept.as_str().into();
            }
        }
    }
}

fn strip_attrs(document: &mut Html) {
    for node in document.tree.values_mut() {
        if let Node::Element(element) = node {
            element.attrs.clear();
        }
    }
}

fn detach_scripts(document: &mut Html) {
    let scripts: Vec<_> = document
        .tree
        .nodes()
        .filter(|node| matches!(node.value(), Node::Element(e) if e.name() == "script"))
        .map(|node| node.id())
        .collect();
    for id in scripts {
        if let Some(mut node) = document.tree.get_mut(id) {
            node.detach();
        }
    }
}

/// Collect every non-blank text node, trimmed and followed by `newline`.
///
/// Script and style bodies are not text and are skipped.
fn write_text_lines(parent: ElementRef<'_>, newline: &str, out: &mut String) {
    for child in parent.children() {
        match child.value() {
            Node::Text(text) => {
                let line = text.trim();
                if !line.is_empty() {
                    out.push_str(line);
                    out.push_str(newline);
                }
            }
            Node::Element(element) => {
                if matches!(element.name(), "script" | "style") {
                    continue;
                }
                if let Some(element) = ElementRef::wrap(child) {
                    write_text_lines(element, newline, out);
                }
            }
            _ => {}
        }
    }
}
