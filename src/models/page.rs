// src/models/page.rs

//! Monitored pages and the rules used to extract their selection.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use regex::Regex;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use scraper::Selector;
use serde::Deserialize;
use url::Url;

use crate::error::{AppError, Result};
use crate::models::ProgramSettings;
use crate::models::settings::validate_address;
use crate::utils::filename;

/// Text mutation applied to a selection before comparison.
///
/// Filters exist to remove false positives such as comment counters or
/// rotating attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub enum Filter {
    /// Remove every digit from text
    Numbers,
    /// Drop all attributes from elements
    Attrs,
    /// Collapse markup to plain text lines
    Html,
    /// Remove `<script>` elements
    Scripts,
}

impl Filter {
    pub fn as_str(&self) -> &'static str {
        match self {
            Filter::Numbers => "numbers",
            Filter::Attrs => "attrs",
            Filter::Html => "html",
            Filter::Scripts => "scripts",
        }
    }
}

impl FromStr for Filter {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "numbers" => Ok(Filter::Numbers),
            "attrs" => Ok(Filter::Attrs),
            "html" => Ok(Filter::Html),
            "scripts" => Ok(Filter::Scripts),
            other => Err(AppError::config(format!("unknown filter `{other}`"))),
        }
    }
}

impl TryFrom<String> for Filter {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Compiled selection rules for one page.
#[derive(Debug, Clone)]
pub struct Extraction {
    /// Source text of the selector; empty selects the whole document
    pub selector_source: String,
    pub selector: Option<Selector>,
    pub filters: Vec<Filter>,
    pub include: Option<Regex>,
    pub exclude: Option<Regex>,
    /// Line separator appended after include matches and text lines
    pub newline: String,
}

impl Extraction {
    /// Compile selection rules, failing on an invalid selector or pattern.
    pub fn compile(
        selector: &str,
        filters: Vec<Filter>,
        include: Option<&str>,
        exclude: Option<&str>,
        newline: impl Into<String>,
    ) -> Result<Self> {
        let selector_source = selector.trim().to_string();
        let selector = if selector_source.is_empty() {
            None
        } else {
            Some(parse_selector(&selector_source)?)
        };

        Ok(Self {
            selector_source,
            selector,
            filters,
            include: compile_pattern(include)?,
            exclude: compile_pattern(exclude)?,
            newline: newline.into(),
        })
    }

    /// Rules used to build a notification body.
    ///
    /// Filters and the include pattern are dropped; selector and exclude stay.
    pub fn readable(&self) -> Self {
        Self {
            filters: Vec::new(),
            include: None,
            ..self.clone()
        }
    }
}

fn parse_selector(s: &str) -> Result<Selector> {
    Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
}

fn compile_pattern(pattern: Option<&str>) -> Result<Option<Regex>> {
    match pattern {
        Some(p) if !p.is_empty() => Ok(Some(Regex::new(p)?)),
        _ => Ok(None),
    }
}

/// A monitored page with its validated settings.
#[derive(Debug, Clone)]
pub struct Page {
    pub url: Url,
    pub interval: Duration,
    /// Distance above which the page counts as changed
    pub threshold: f64,
    pub extraction: Extraction,
    /// Extra request headers
    pub headers: HeaderMap,
    /// Address notified by mail when the page changes
    pub notify: Option<String>,
}

impl Page {
    /// Interval expressed in scheduler ticks of one second, never zero.
    pub fn interval_ticks(&self) -> u64 {
        self.interval.as_secs().max(1)
    }
}

/// One `[[page]]` table of `pages.toml`.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PageConfig {
    pub url: String,
    /// Seconds between checks, defaults to the global interval
    #[serde(default)]
    pub interval: Option<u64>,
    #[serde(default)]
    pub threshold: f64,
    #[serde(default, alias = "sel")]
    pub selector: String,
    #[serde(default, alias = "regexp")]
    pub include: Option<String>,
    #[serde(default, alias = "negexp")]
    pub exclude: Option<String>,
    #[serde(default, alias = "strip")]
    pub filters: Option<Vec<Filter>>,
    #[serde(default, alias = "header")]
    pub headers: BTreeMap<String, String>,
    #[serde(default, alias = "recvmail")]
    pub notify: Option<String>,
}

impl PageConfig {
    /// Validate this entry and resolve defaults from the global settings.
    pub fn resolve(self, settings: &ProgramSettings) -> Result<Page> {
        let url = Url::parse(self.url.trim())?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(AppError::config(format!(
                "{url}: only http and https pages can be watched"
            )));
        }
        filename::cache_file_name(url.as_str())?;

        let interval_secs = self.interval.unwrap_or(settings.interval_secs);
        if interval_secs == 0 {
            return Err(AppError::config(format!("{url}: interval must be > 0")));
        }

        if !self.threshold.is_finite() || self.threshold < 0.0 {
            return Err(AppError::config(format!(
                "{url}: threshold {} must be a finite value >= 0",
                self.threshold
            )));
        }

        let headers = parse_headers(&url, &self.headers)?;

        let notify = self
            .notify
            .filter(|addr| !addr.is_empty())
            .or_else(|| settings.notify.clone());
        if let Some(addr) = &notify {
            validate_address(addr)?;
        }

        let filters = self.filters.unwrap_or_else(|| settings.filters.clone());
        let extraction = Extraction::compile(
            &self.selector,
            filters,
            self.include.as_deref(),
            self.exclude.as_deref(),
            settings.newline.clone(),
        )?;

        Ok(Page {
            url,
            interval: Duration::from_secs(interval_secs),
            threshold: self.threshold,
            extraction,
            headers,
            notify,
        })
    }
}

/// Build the request headers of a page, rejecting invalid names and values.
fn parse_headers(url: &Url, raw: &BTreeMap<String, String>) -> Result<HeaderMap> {
    let mut headers = HeaderMap::with_capacity(raw.len());
    for (name, value) in raw {
        let header_name = HeaderName::from_bytes(name.trim().as_bytes())
            .map_err(|e| AppError::config(format!("{url}: header name `{name}`: {e}")))?;
        let header_value = HeaderValue::from_str(value)
            .map_err(|e| AppError::config(format!("{url}: header `{name}` value: {e}")))?;
        headers.insert(header_name, header_value);
    }
    Ok(headers)
}

/// Root of `pages.toml`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PagesFile {
    #[serde(default, rename = "page")]
    pub pages: Vec<PageConfig>,
}

impl PagesFile {
    /// Parse and validate every page of a `pages.toml` document.
    pub fn parse(content: &str, settings: &ProgramSettings) -> Result<Vec<Page>> {
        let file: PagesFile = toml::from_str(content)?;
        file.pages
            .into_iter()
            .map(|page| page.resolve(settings))
            .collect()
    }

    /// Load pages from a file.
    pub fn load(path: impl AsRef<Path>, settings: &ProgramSettings) -> Result<Vec<Page>> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content, settings)
    }
}
