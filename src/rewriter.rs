//! Points every scanned reference at its downloaded local copy.

use regex::Captures;

use crate::dom::Document;
use crate::registry::AssetRegistry;
use crate::scanner::{AssetReference, ReferenceKind, UrlResolver, SRCSET_SEPARATOR, STYLE_URL};

/// Points each scanned reference at the local path recorded for its own
/// URL, then makes sure the head carries `<base href="./">`.
///
/// New values are computed from the attribute value captured at scan time,
/// never from the current one, so a value that already looks like a local
/// path is still mapped through its resolved URL. Unknown or failed URLs
/// keep their original value. Running it again with the same references
/// and registry changes nothing. Returns the number of attributes that
/// changed.
pub fn rewrite(
    document: &mut Document,
    registry: &AssetRegistry,
    resolver: &UrlResolver,
    references: &[AssetReference],
) -> usize {
    let local_for = |raw: &str| resolver.resolve(raw).and_then(|url| registry.lookup(&url));

    let mut changed = 0;
    for reference in references {
        let updated = match reference.kind {
            ReferenceKind::Attribute => registry.lookup(&reference.url),
            ReferenceKind::SrcsetEntry => Some(rewrite_srcset(&reference.value, &local_for)),
            ReferenceKind::StyleUrl => Some(rewrite_style_urls(&reference.value, &local_for)),
        };
        let Some(updated) = updated else {
            continue;
        };

        // Several references can share one attribute (srcset entries, style URLs).
        let attr = reference.shape.attribute();
        if reference.element.attr(attr).as_deref() != Some(updated.as_str()) {
            reference.element.set_attr(attr, &updated);
            changed += 1;
        }
    }

    document.ensure_base_href("./");
    changed
}

/// Replaces the URL of each `srcset` entry, keeping its descriptor, and
/// joins the entries with `", "`.
pub fn rewrite_srcset<F>(srcset: &str, local_for: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    SRCSET_SEPARATOR
        .split(srcset.trim())
        .filter_map(|entry| {
            let mut parts = entry.split_whitespace();
            let url = parts.next()?;
            let mut rewritten = local_for(url).unwrap_or_else(|| url.to_string());
            for descriptor in parts {
                rewritten.push(' ');
                rewritten.push_str(descriptor);
            }
            Some(rewritten)
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Replaces each known `url(...)` with `url('<local path>')`; other matches
/// are left byte for byte.
pub fn rewrite_style_urls<F>(style: &str, local_for: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    STYLE_URL
        .replace_all(style, |caps: &Captures| match local_for(&caps[1]) {
            Some(local) => format!("url('{}')", local),
            None => caps[0].to_string(),
        })
        .into_owned()
}
