//! Enumerates every asset reference in a parsed page.
//!
//! The reference shapes are a closed list rather than a generic "any URL
//! attribute" rule, and the rewriter walks the very same list.

use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

use crate::classifier::AssetCategory;
use crate::dom::{Document, Element};
use crate::fetcher::is_downloadable;

/// `url(...)` inside a `style` attribute, optionally quoted.
pub(crate) static STYLE_URL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)url\(['"]?([^'")]*)['"]?\)"#).expect("style URL pattern is valid"));

pub(crate) static SRCSET_SEPARATOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*,\s*").expect("srcset separator pattern is valid"));

const FONT_EXTENSIONS: [&str; 5] = [".woff", ".woff2", ".ttf", ".eot", ".otf"];
const MEDIA_ELEMENTS: [&str; 2] = ["video", "audio"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceKind {
    Attribute,
    SrcsetEntry,
    StyleUrl,
}

/// A place in HTML where an asset URL can live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// `<link rel="stylesheet" href>`
    StylesheetLink,
    /// `<script src>`
    Script,
    /// `<img src>`
    Image,
    /// `<link rel="... icon ..." href>`, touch icons included
    Icon,
    /// `<video src>`, `<audio src>` and their `<source src>` children
    Media,
    /// `<source srcset>`, inside `<picture>` or not
    Srcset,
    /// `url(...)` in a `style` attribute
    InlineStyle,
    /// `<link href>` pointing at a font file
    FontLink,
}

impl Shape {
    /// Scan order.
    pub const ALL: [Shape; 8] = [
        Shape::StylesheetLink,
        Shape::Script,
        Shape::Image,
        Shape::Icon,
        Shape::Media,
        Shape::Srcset,
        Shape::InlineStyle,
        Shape::FontLink,
    ];

    pub fn category(self) -> AssetCategory {
        match self {
            Shape::StylesheetLink => AssetCategory::Css,
            Shape::Script => AssetCategory::Js,
            Shape::Image | Shape::Icon | Shape::Srcset | Shape::InlineStyle => AssetCategory::Images,
            Shape::Media => AssetCategory::Media,
            Shape::FontLink => AssetCategory::Fonts,
        }
    }

    pub fn attribute(self) -> &'static str {
        match self {
            Shape::StylesheetLink | Shape::Icon | Shape::FontLink => "href",
            Shape::Script | Shape::Image | Shape::Media => "src",
            Shape::Srcset => "srcset",
            Shape::InlineStyle => "style",
        }
    }

    pub fn kind(self) -> ReferenceKind {
        match self {
            Shape::Srcset => ReferenceKind::SrcsetEntry,
            Shape::InlineStyle => ReferenceKind::StyleUrl,
            _ => ReferenceKind::Attribute,
        }
    }

    pub fn matches(self, el: &Element) -> bool {
        let name = el.name();
        match self {
            Shape::StylesheetLink => {
                name == "link"
                    && el.has_attr("href")
                    && el
                        .attr("rel")
                        .is_some_and(|rel| rel.trim().eq_ignore_ascii_case("stylesheet"))
            }
            Shape::Script => name == "script" && el.has_attr("src"),
            Shape::Image => name == "img" && el.has_attr("src"),
            Shape::Icon => {
                name == "link"
                    && el.has_attr("href")
                    && el
                        .attr("rel")
                        .is_some_and(|rel| rel.to_ascii_lowercase().contains("icon"))
            }
            Shape::Media => {
                el.has_attr("src")
                    && (MEDIA_ELEMENTS.contains(&name)
                        || (name == "source" && el.has_ancestor(&MEDIA_ELEMENTS)))
            }
            Shape::Srcset => name == "source" && el.has_attr("srcset"),
            Shape::InlineStyle => el
                .attr("style")
                .is_some_and(|style| style.to_ascii_lowercase().contains("url(")),
            Shape::FontLink => {
                name == "link"
                    && el.attr("href").is_some_and(|href| {
                        let href = href.to_ascii_lowercase();
                        FONT_EXTENSIONS.iter().any(|ext| href.contains(ext))
                    })
            }
        }
    }

    /// Raw, unresolved URL tokens this shape carries on `el`.
    pub fn raw_urls(self, el: &Element) -> Vec<String> {
        let Some(value) = el.attr(self.attribute()) else {
            return Vec::new();
        };
        match self.kind() {
            ReferenceKind::Attribute => vec![value],
            ReferenceKind::SrcsetEntry => srcset_urls(&value).into_iter().map(str::to_string).collect(),
            ReferenceKind::StyleUrl => style_urls(&value).into_iter().map(str::to_string).collect(),
        }
    }
}

/// Leading URL token of every `srcset` entry, descriptors dropped.
pub fn srcset_urls(srcset: &str) -> Vec<&str> {
    SRCSET_SEPARATOR
        .split(srcset.trim())
        .filter_map(|entry| entry.split_whitespace().next())
        .collect()
}

/// Every `url(...)` target in a style value, minus inline data and fragments.
pub fn style_urls(style: &str) -> Vec<&str> {
    STYLE_URL
        .captures_iter(style)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str())
        .filter(|url| !url.is_empty() && !url.starts_with("data:") && !url.starts_with('#'))
        .collect()
}

/// Resolves reference values against the page's effective base URL.
#[derive(Debug, Clone)]
pub struct UrlResolver {
    base: Url,
}

impl UrlResolver {
    pub fn new(base: Url) -> Self {
        Self { base }
    }

    /// Uses the document's `<base href>` when present, otherwise the URL the
    /// page was served from.
    pub fn for_document(page_url: &Url, document: &Document) -> Self {
        let base = document
            .base_href()
            .and_then(|href| page_url.join(href.trim()).ok())
            .unwrap_or_else(|| page_url.clone());
        Self { base }
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    /// Absolute form of `raw`, or `None` when it is not downloadable or
    /// cannot be resolved.
    pub fn resolve(&self, raw: &str) -> Option<String> {
        let raw = raw.trim();
        if !is_downloadable(raw) {
            return None;
        }
        let absolute = self.base.join(raw).ok()?.to_string();
        is_downloadable(&absolute).then_some(absolute)
    }
}

/// One asset URL found in the document.
#[derive(Debug, Clone)]
pub struct AssetReference {
    /// Absolute URL.
    pub url: String,
    pub kind: ReferenceKind,
    pub shape: Shape,
    pub category: AssetCategory,
    pub element: Element,
    /// The whole attribute value as it was when scanned.
    pub value: String,
}

/// Walks the document once and returns every downloadable reference in
/// shape order, then document order. Must run before any rewriting; the
/// rewriter works from the values captured here.
pub fn scan(document: &Document, resolver: &UrlResolver) -> Vec<AssetReference> {
    let elements = document.elements();
    let mut references = Vec::new();

    for shape in Shape::ALL {
        for el in elements.iter().filter(|el| shape.matches(el)) {
            let value = el.attr(shape.attribute()).unwrap_or_default();
            for raw in shape.raw_urls(el) {
                if let Some(url) = resolver.resolve(&raw) {
                    references.push(AssetReference {
                        url,
                        kind: shape.kind(),
                        shape,
                        category: shape.category(),
                        element: el.clone(),
                        value: value.clone(),
                    });
                }
            }
        }
    }

    references
}
