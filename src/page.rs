//! HTML scanning and the network fetch boundary.

use std::time::Duration;

use html5ever::parse_document;
use html5ever::tendril::TendrilSink;
use markup5ever_rcdom::{Handle, NodeData, RcDom};
use reqwest::blocking::{Client, Response};
use reqwest::header::CONTENT_TYPE;
use tracing::{debug, trace};
use url::Url;

use crate::error::{Error, Result};

/// A `style="..."` attribute and the element carrying it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineStyle {
    pub tag: String,
    pub classes: Vec<String>,
    pub style: String,
}

impl InlineStyle {
    /// `tag.class1.class2`, the element part of an inline-style selector.
    pub fn element(&self) -> String {
        let mut element = self.tag.clone();
        for class in &self.classes {
            element.push('.');
            element.push_str(class);
        }
        element
    }
}

/// Style sources found in one HTML document, in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageDocument {
    pub inline_styles: Vec<InlineStyle>,
    pub style_blocks: Vec<String>,
    pub stylesheet_links: Vec<String>,
}

impl PageDocument {
    pub fn parse(html: &str) -> Self {
        let dom = parse_document(RcDom::default(), Default::default()).one(html);
        let mut doc = PageDocument::default();
        doc.walk(&dom.document);
        debug!(
            inline = doc.inline_styles.len(),
            blocks = doc.style_blocks.len(),
            links = doc.stylesheet_links.len(),
            "scanned document"
        );
        doc
    }

    fn walk(&mut self, node: &Handle) {
        if let NodeData::Element { name, attrs, .. } = &node.data {
            let tag = name.local.to_string();
            let attrs = attrs.borrow();
            let attr = |wanted: &str| {
                attrs
                    .iter()
                    .find(|a| (*a.name.local).eq_ignore_ascii_case(wanted))
                    .map(|a| a.value.to_string())
            };

            if let Some(style) = attr("style").filter(|s| !s.trim().is_empty()) {
                let classes = attr("class")
                    .map(|c| c.split_whitespace().map(str::to_string).collect())
                    .unwrap_or_default();
                self.inline_styles.push(InlineStyle { tag: tag.clone(), classes, style });
            }

            match tag.as_str() {
                "style" => {
                    let css = text_content(node);
                    if !css.trim().is_empty() {
                        self.style_blocks.push(css);
                    }
                }
                "link" => {
                    let is_stylesheet = attr("rel").is_some_and(|rel| {
                        rel.split_whitespace()
                            .any(|r| r.eq_ignore_ascii_case("stylesheet"))
                    });
                    // an empty href resolves to the page itself
                    let href = attr("href").filter(|h| is_stylesheet && !h.trim().is_empty());
                    if let Some(href) = href {
                        self.stylesheet_links.push(href);
                    }
                }
                _ => {}
            }
        }

        for child in node.children.borrow().iter() {
            self.walk(child);
        }
    }
}

fn text_content(node: &Handle) -> String {
    let mut text = String::new();
    for child in node.children.borrow().iter() {
        if let NodeData::Text { contents } = &child.data {
            text.push_str(&contents.borrow());
        }
    }
    text
}

/// Origins match when scheme, host and port all match.
pub fn is_same_origin(a: &Url, b: &Url) -> bool {
    a.origin() == b.origin()
}

/// Resolve stylesheet hrefs against the page and keep the same-origin ones.
pub fn same_origin_stylesheets(page: &Url, hrefs: &[String]) -> Vec<Url> {
    hrefs
        .iter()
        .filter(|href| !href.trim().is_empty())
        .filter_map(|href| match page.join(href) {
            Ok(url) => Some(url),
            Err(err) => {
                trace!(href = %href, %err, "unresolvable stylesheet href");
                None
            }
        })
        .filter(|url| {
            let same = is_same_origin(page, url);
            if !same {
                debug!(%url, "skipping cross-origin stylesheet");
            }
            same
        })
        .collect()
}

/// Source of raw page and stylesheet text.
pub trait ResourceFetcher {
    /// Fetch an HTML page. Non-HTML responses are errors.
    fn fetch_page(&self, url: &Url) -> Result<String>;

    fn fetch_stylesheet(&self, url: &Url) -> Result<String>;
}

/// Blocking HTTP fetcher.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(Error::Client)?;
        Ok(Self { client })
    }

    fn get(&self, url: &Url) -> Result<Response> {
        debug!(%url, "GET");
        let response = self
            .client
            .get(url.clone())
            .send()
            .map_err(|source| Error::Http { url: url.to_string(), source })?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::Status { url: url.to_string(), status: status.as_u16() });
        }
        Ok(response)
    }

    fn body(url: &Url, response: Response) -> Result<String> {
        response
            .text()
            .map_err(|source| Error::Http { url: url.to_string(), source })
    }
}

impl ResourceFetcher for HttpFetcher {
    fn fetch_page(&self, url: &Url) -> Result<String> {
        let response = self.get(url)?;
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        if !content_type.to_ascii_lowercase().contains("text/html") {
            return Err(Error::NotHtml { url: url.to_string(), content_type });
        }
        Self::body(url, response)
    }

    fn fetch_stylesheet(&self, url: &Url) -> Result<String> {
        let response = self.get(url)?;
        Self::body(url, response)
    }
}
