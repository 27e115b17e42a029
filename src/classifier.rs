use std::fmt;

use serde::{Deserialize, Serialize};
use url::Url;

/// Where an asset lands in the project layout. The category always comes
/// from the place the reference was found, never from the response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetCategory {
    Css,
    Js,
    Images,
    Fonts,
    Media,
    Other,
}

impl AssetCategory {
    pub const ALL: [AssetCategory; 6] = [
        AssetCategory::Css,
        AssetCategory::Js,
        AssetCategory::Images,
        AssetCategory::Fonts,
        AssetCategory::Media,
        AssetCategory::Other,
    ];

    pub fn dir_name(self) -> &'static str {
        match self {
            AssetCategory::Css => "css",
            AssetCategory::Js => "js",
            AssetCategory::Images => "images",
            AssetCategory::Fonts => "fonts",
            AssetCategory::Media => "media",
            AssetCategory::Other => "other",
        }
    }
}

impl fmt::Display for AssetCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

pub const FALLBACK_EXTENSION: &str = "bin";

// Checked in order against the raw URL; the first substring hit wins.
const KNOWN_EXTENSIONS: &[(&str, &str)] = &[
    (".css", "css"),
    (".js", "js"),
    (".png", "png"),
    (".jpg", "jpg"),
    (".jpeg", "jpg"),
    (".gif", "gif"),
    (".svg", "svg"),
    (".webp", "webp"),
    (".ico", "ico"),
    (".woff", "woff"),
    (".woff2", "woff2"),
    (".ttf", "ttf"),
    (".eot", "eot"),
    (".otf", "otf"),
    (".mp4", "mp4"),
    (".webm", "webm"),
    (".mp3", "mp3"),
    (".wav", "wav"),
];

/// Pairs the structural hint with the extension derived from the URL.
pub fn classify(url: &str, hint: AssetCategory) -> (AssetCategory, String) {
    (hint, file_extension(url))
}

/// Extension of the URL path if it is short and slash-free, else the first
/// known extension mentioned anywhere in the URL, else `bin`.
///
/// Any suffix of up to six characters is accepted, known or not.
pub fn file_extension(url: &str) -> String {
    if url.contains('.') {
        let path = url.split(['?', '#']).next().unwrap_or(url);
        if let Some(dot) = path.rfind('.') {
            let ext = path[dot + 1..].to_lowercase();
            if !ext.is_empty() && ext.chars().count() <= 6 && !ext.contains('/') {
                return ext;
            }
        }
    }

    KNOWN_EXTENSIONS
        .iter()
        .find(|(needle, _)| url.contains(needle))
        .map(|(_, ext)| ext.to_string())
        .unwrap_or_else(|| FALLBACK_EXTENSION.to_string())
}

/// Local file name for an asset. Uses the sanitized path basename when it
/// carries an extension, otherwise `<category>_<id>.<extension>` with an id
/// drawn from `next_id`.
pub fn file_name(
    url: &str,
    category: AssetCategory,
    extension: &str,
    next_id: impl FnOnce() -> u64,
) -> String {
    match path_basename(url) {
        Some(name) if has_extension(&name) => sanitize_file_name(&name),
        _ => format!("{}_{}.{}", category.dir_name(), next_id(), extension),
    }
}

fn path_basename(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let path = parsed.path();
    if path.is_empty() || path == "/" {
        return None;
    }
    path.rsplit('/').next().map(str::to_string)
}

fn has_extension(name: &str) -> bool {
    matches!(name.rfind('.'), Some(dot) if dot + 1 < name.len())
}

pub fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            c if c.is_ascii_alphanumeric() || c == '.' || c == '_' || c == '-' => c,
            _ => '_',
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_from_path() {
        assert_eq!(file_extension("https://x.test/style.css"), "css");
        assert_eq!(file_extension("https://x.test/app.min.js?v=3"), "js");
        assert_eq!(file_extension("https://x.test/font.WOFF2#iefix"), "woff2");
        assert_eq!(file_extension("https://x.test/photo.jpeg"), "jpeg");
    }

    #[test]
    fn test_unknown_short_suffix_is_kept() {
        assert_eq!(file_extension("https://x.test/file.abcd"), "abcd");
    }

    #[test]
    fn test_extension_from_known_table() {
        // Last dot is followed by a slash, so the table decides.
        assert_eq!(file_extension("https://x.test/images.png/raw"), "png");
        assert_eq!(file_extension("https://x.test/a.verylongext"), "bin");
    }

    #[test]
    fn test_extension_fallback() {
        assert_eq!(file_extension("https://x.test/img?v=2"), FALLBACK_EXTENSION);
        assert_eq!(file_extension("noextension"), FALLBACK_EXTENSION);
    }

    #[test]
    fn test_classify_uses_hint() {
        let (category, ext) = classify("https://x.test/img?v=2", AssetCategory::Images);
        assert_eq!(category, AssetCategory::Images);
        assert_eq!(ext, "bin");

        let (category, ext) = classify("https://x.test/thing.png", AssetCategory::Other);
        assert_eq!(category, AssetCategory::Other);
        assert_eq!(ext, "png");
    }

    #[test]
    fn test_file_name_from_basename() {
        let name = file_name("https://x.test/img/logo.png", AssetCategory::Images, "png", || 1);
        assert_eq!(name, "logo.png");
    }

    #[test]
    fn test_file_name_is_sanitized() {
        let name = file_name("https://x.test/img/my logo (1).png", AssetCategory::Images, "png", || 1);
        assert_eq!(name, "my_20logo_20_1_.png");
    }

    #[test]
    fn test_file_name_synthesized() {
        assert_eq!(
            file_name("https://x.test/img?v=2", AssetCategory::Images, "bin", || 7),
            "images_7.bin"
        );
        assert_eq!(
            file_name("https://x.test/", AssetCategory::Css, "bin", || 42),
            "css_42.bin"
        );
        assert_eq!(
            file_name("https://x.test/fonts/", AssetCategory::Fonts, "bin", || 3),
            "fonts_3.bin"
        );
    }

    #[test]
    fn test_category_dirs() {
        let dirs: Vec<_> = AssetCategory::ALL.iter().map(|c| c.dir_name()).collect();
        assert_eq!(dirs, ["css", "js", "images", "fonts", "media", "other"]);
    }
}
