//! Human-readable companions written next to `index.html`.

use std::fmt::Write as _;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::Local;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::dom::Document;
use crate::file_manager::INDEX_FILE;
use crate::registry::AssetRegistryEntry;

pub const README_FILE: &str = "README.md";
pub const STRUCTURE_FILE: &str = "structure_prompt.txt";
pub const SOURCE_FILE: &str = "full_source_code.txt";

static RUNS_OF_SPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s{2,}").expect("pattern is valid"));
static BLANK_LINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n\s*\n").expect("pattern is valid"));

pub struct ReportContext<'a> {
    pub original_url: &'a str,
    pub host: &'a str,
    pub total_files: usize,
    pub assets: &'a [AssetRegistryEntry],
}

pub async fn write_reports(root: &Path, document: &Document, ctx: &ReportContext<'_>) -> Result<()> {
    let folder = root
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    let reports = [
        (SOURCE_FILE, full_source(document, ctx)),
        (STRUCTURE_FILE, structure_prompt(&folder, ctx)),
        (README_FILE, readme(&folder, ctx)),
    ];
    for (name, content) in reports {
        let path = root.join(name);
        tokio::fs::write(&path, content)
            .await
            .with_context(|| format!("Failed to write report: {:?}", path))?;
    }
    Ok(())
}

fn timestamp() -> String {
    Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

/// One tag per line, collapsed whitespace.
pub fn format_html_for_text(html: &str) -> String {
    let split = html.replace("><", ">\n<").replace("/>", "/>\n").replace("</", "\n</");
    let collapsed = RUNS_OF_SPACE.replace_all(&split, " ");
    BLANK_LINES.replace_all(&collapsed, "\n").trim().to_string()
}

fn section(out: &mut String, title: &str) {
    let _ = writeln!(out, "\n{}", title);
    let _ = writeln!(out, "{}", "-".repeat(40));
}

fn full_source(document: &Document, ctx: &ReportContext<'_>) -> String {
    let mut out = String::new();
    let rule = "=".repeat(80);
    let _ = writeln!(out, "{}\nCOMPREHENSIVE WEBSITE SOURCE CODE\n{}", rule, rule);

    section(&mut out, "WEBSITE INFORMATION:");
    let _ = writeln!(out, "URL: {}", ctx.original_url);
    let _ = writeln!(out, "Downloaded: {}", timestamp());
    let _ = writeln!(out, "Total Files: {}", ctx.total_files);

    section(&mut out, "HTML STRUCTURE:");
    let html = document.to_html().unwrap_or_default();
    let _ = writeln!(out, "{}", format_html_for_text(&html));

    section(&mut out, "CSS STYLES:");
    for style in document.select(|el| el.name() == "style") {
        let _ = writeln!(out, "{}", style.text());
    }

    section(&mut out, "JAVASCRIPT CODE:");
    for script in document.select(|el| el.name() == "script" && !el.has_attr("src")) {
        let _ = writeln!(out, "{}", script.text());
    }

    section(&mut out, "META INFORMATION:");
    for meta in document.select(|el| el.name() == "meta") {
        let content = meta.attr("content").unwrap_or_default();
        let key = meta
            .attr("name")
            .filter(|name| !name.is_empty())
            .or_else(|| meta.attr("property").filter(|property| !property.is_empty()));
        if let Some(key) = key {
            let _ = writeln!(out, "{}: {}", key, content);
        }
    }

    section(&mut out, "DOWNLOADED RESOURCES:");
    for asset in ctx.assets {
        let mime = mime_guess::from_path(&asset.local_path).first_or_octet_stream();
        let _ = writeln!(out, "{} -> {} ({}, {} bytes)", asset.url, asset.local_path, mime, asset.size);
    }

    out
}

const FOLDER_TREE: &str = "\
├── index.html              # Main HTML file
├── full_source_code.txt    # Complete source code as text
├── css/                    # All CSS stylesheets
├── js/                     # All JavaScript files
├── images/                 # All images (png, jpg, svg, webp, etc.)
├── fonts/                  # Font files (woff, woff2, ttf, eot, otf)
├── media/                  # Video and audio files
├── other/                  # Other resources
├── structure_prompt.txt    # This file
└── README.md               # Project documentation";

fn structure_prompt(folder: &str, ctx: &ReportContext<'_>) -> String {
    format!(
        "WEBSITE STRUCTURE PROMPT\n\
         ========================\n\n\
         Website: {host}\n\
         Original URL: {url}\n\
         Downloaded: {time}\n\
         Total Files: {files}\n\n\
         FOLDER STRUCTURE:\n\
         ----------------\n\
         {folder}/\n\
         {tree}\n\n\
         HOW TO USE LOCALLY:\n\
         ------------------\n\
         1. Open '{index}' in any modern web browser\n\
         2. All resources are loaded from the local folders\n\
         3. Works with both file:// and a local web server\n\n\
         MODIFICATION INSTRUCTIONS:\n\
         ------------------------\n\
         Layout: Edit HTML structure in {index}\n\
         Design: Modify CSS files in css/\n\
         Scripts: Update JavaScript in js/\n\
         Images: Replace files in images/\n\
         Fonts: Update font files in fonts/\n",
        host = ctx.host,
        url = ctx.original_url,
        time = timestamp(),
        files = ctx.total_files,
        folder = folder,
        tree = FOLDER_TREE,
        index = INDEX_FILE,
    )
}

fn readme(folder: &str, ctx: &ReportContext<'_>) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# {} - Local Copy\n", ctx.host);
    let _ = writeln!(out, "## Project Information");
    let _ = writeln!(out, "- **Original URL**: {}", ctx.original_url);
    let _ = writeln!(out, "- **Download Date**: {}", timestamp());
    let _ = writeln!(out, "- **Local File**: `{}`", INDEX_FILE);
    let _ = writeln!(out, "- **Files**: {} ({} assets)\n", ctx.total_files, ctx.assets.len());
    let _ = writeln!(out, "## How to Use");
    let _ = writeln!(out, "Open `{}` in a web browser. Stylesheets, scripts, images, fonts and media", INDEX_FILE);
    let _ = writeln!(out, "are served from the local folders; references that could not be downloaded");
    let _ = writeln!(out, "still point at the original site.\n");
    let _ = writeln!(out, "## Folder Structure\n```\n{}/\n{}\n```", folder, FOLDER_TREE);
    out
}
