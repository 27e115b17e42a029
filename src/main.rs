use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use colored::*;

use site_mirror::fetcher::PageSource;
use site_mirror::{validator, HttpFetcher, MirrorCommand, MirrorResult, PageSummary, SiteMirror};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = MirrorCommand::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(args.log_filter()))
        .format_timestamp_secs()
        .init();

    if args.inspect {
        return inspect(&args).await;
    }

    let config = args.config();
    if !args.json {
        println!("🚀 Mirroring: {}", validator::sanitize(&args.url).blue());
        println!("📁 Output directory: {:?}", args.output_dir);
        println!("⚡ Max concurrent downloads: {}", config.max_concurrent);
    }

    let mirror = Arc::new(SiteMirror::new(config)?.with_progress(!args.json));
    let result = mirror
        .spawn(args.url.clone(), args.output_dir.clone())
        .await
        .context("Mirror task did not complete")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_result(&result);
    }

    Ok(if result.success { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

fn print_result(result: &MirrorResult) {
    if !result.success {
        eprintln!("❌ {}", result.message.red());
        return;
    }

    for url in &result.failed {
        eprintln!("⚠️  Skipped: {}", url.yellow());
    }
    println!("✅ {}", result.message.green());
    println!(
        "📊 {} files, {} assets, {} skipped in {:.1}s",
        result.total_files,
        result.assets.len(),
        result.failed.len(),
        result.elapsed.as_secs_f64()
    );
}

async fn inspect(args: &MirrorCommand) -> Result<ExitCode> {
    let url = validator::sanitize(&args.url);
    if !validator::is_valid(&url) {
        eprintln!("❌ {}", format!("Invalid URL format: {}", url).red());
        return Ok(ExitCode::FAILURE);
    }

    let client = HttpFetcher::new(&args.config())?;
    let page = client
        .fetch_page(&url)
        .await
        .with_context(|| format!("Error scraping website: {}", url))?;
    let summary = PageSummary::from_page(&page);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(ExitCode::SUCCESS);
    }

    println!("🌐 {} ({})", summary.url.blue(), summary.status);
    println!("Title: {}", summary.title.bold());
    println!("Description: {}", summary.description);
    println!("Keywords: {}", summary.keywords);
    println!(
        "📁 {} links, {} assets ({} images, {} stylesheets, {} scripts), {} inline styles, {} inline scripts",
        summary.links.len(),
        summary.asset_count(),
        summary.images.len(),
        summary.external_css.len(),
        summary.external_js.len(),
        summary.inline_css.len(),
        summary.inline_js.len()
    );
    for link in &summary.links {
        println!("  🔗 {}", link);
    }
    Ok(ExitCode::SUCCESS)
}
