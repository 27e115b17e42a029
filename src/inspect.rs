//! Structural and resource metadata of a single page, without mirroring it.

use select::document::Document;
use select::predicate::{Attr, Name, Predicate};
use serde::Serialize;
use url::Url;

use crate::fetcher::FetchedPage;

#[derive(Debug, Clone, Default, Serialize)]
pub struct PageSummary {
    pub url: String,
    pub status: u16,
    pub content_type: Option<String>,
    pub title: String,
    pub description: String,
    pub keywords: String,
    /// Absolute targets of every `<a href>`, in document order.
    pub links: Vec<String>,
    pub images: Vec<String>,
    pub external_css: Vec<String>,
    pub external_js: Vec<String>,
    pub inline_css: Vec<String>,
    pub inline_js: Vec<String>,
    pub text_length: usize,
}

impl PageSummary {
    pub fn from_page(page: &FetchedPage) -> Self {
        let mut summary = Self::from_html(&page.html, &page.url);
        summary.status = page.status;
        summary.content_type = page.content_type.as_ref().map(|mime| mime.to_string());
        summary
    }

    pub fn from_html(html: &str, base: &Url) -> Self {
        let document = Document::from(html);
        let resolve = |value: &str| base.join(value.trim()).ok().map(|url| url.to_string());
        let meta = |name: &str| {
            document
                .find(Name("meta").and(Attr("name", name)))
                .next()
                .and_then(|node| node.attr("content"))
                .unwrap_or_default()
                .to_string()
        };

        let title = document
            .find(Name("title"))
            .next()
            .map(|node| node.text().trim().to_string())
            .unwrap_or_default();

        let links = document
            .find(Name("a"))
            .filter_map(|node| node.attr("href"))
            .filter_map(|href| resolve(href))
            .collect();

        let images = document
            .find(Name("img"))
            .filter_map(|node| node.attr("src"))
            .filter_map(|src| resolve(src))
            .collect();

        let external_css = document
            .find(Name("link"))
            .filter(|node| {
                node.attr("rel")
                    .is_some_and(|rel| rel.trim().eq_ignore_ascii_case("stylesheet"))
            })
            .filter_map(|node| node.attr("href"))
            .filter_map(|href| resolve(href))
            .collect();

        let external_js = document
            .find(Name("script"))
            .filter_map(|node| node.attr("src"))
            .filter_map(|src| resolve(src))
            .collect();

        let inline_css = document.find(Name("style")).map(|node| node.text()).collect();

        let inline_js = document
            .find(Name("script"))
            .filter(|node| node.attr("src").is_none())
            .map(|node| node.text())
            .filter(|code| !code.trim().is_empty())
            .collect();

        let text_length = document
            .find(Name("body"))
            .next()
            .map(|body| body.text().split_whitespace().map(str::len).sum())
            .unwrap_or(0);

        Self {
            url: base.to_string(),
            title,
            description: meta("description"),
            keywords: meta("keywords"),
            links,
            images,
            external_css,
            external_js,
            inline_css,
            inline_js,
            text_length,
            ..Default::default()
        }
    }

    pub fn asset_count(&self) -> usize {
        self.images.len() + self.external_css.len() + self.external_js.len()
    }
}
