use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::stream::{FuturesUnordered, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info, warn};
use serde::Serialize;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use url::Url;

use crate::classifier::{self, AssetCategory};
use crate::config::MirrorConfig;
use crate::error::{FetchError, MirrorError};
use crate::fetcher::{is_downloadable, ByteFetcher, HttpFetcher, PageSource};
use crate::file_manager::ProjectLayout;
use crate::registry::{AssetRegistry, AssetRegistryEntry};
use crate::report::{self, ReportContext};
use crate::rewriter;
use crate::scanner::{self, UrlResolver};
use crate::validator;

/// Summary of one mirror call.
#[derive(Debug, Clone, Serialize)]
pub struct MirrorResult {
    pub success: bool,
    pub message: String,
    pub project_folder: Option<PathBuf>,
    /// `index.html` plus every stored asset.
    pub total_files: usize,
    pub total_bytes: u64,
    pub elapsed: Duration,
    pub assets: Vec<AssetRegistryEntry>,
    /// Asset URLs that were attempted and skipped.
    pub failed: Vec<String>,
}

#[derive(Default)]
struct Tally {
    files: usize,
    bytes: u64,
    assets: Vec<AssetRegistryEntry>,
    failed: Vec<String>,
}

enum AssetOutcome {
    Stored { bytes: u64 },
    Failed,
}

/// State shared by the fetch tasks of a single mirror call.
struct FetchContext {
    fetcher: Arc<dyn ByteFetcher>,
    registry: Arc<AssetRegistry>,
    layout: ProjectLayout,
    semaphore: Semaphore,
}

pub struct SiteMirror {
    pages: Arc<dyn PageSource>,
    fetcher: Arc<dyn ByteFetcher>,
    config: MirrorConfig,
    show_progress: bool,
}

impl SiteMirror {
    /// Mirror backed by the HTTP client described by `config`.
    pub fn new(config: MirrorConfig) -> Result<Self, MirrorError> {
        let http = Arc::new(HttpFetcher::new(&config)?);
        Ok(Self::with_services(http.clone(), http, config))
    }

    pub fn with_services(
        pages: Arc<dyn PageSource>,
        fetcher: Arc<dyn ByteFetcher>,
        config: MirrorConfig,
    ) -> Self {
        Self {
            pages,
            fetcher,
            config,
            show_progress: false,
        }
    }

    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    pub fn config(&self) -> &MirrorConfig {
        &self.config
    }

    /// Runs `mirror` on a blocking-pool thread so the caller's task stays
    /// free. The handle resolves exactly once. Needs a multi-threaded tokio
    /// runtime.
    pub fn spawn(self: Arc<Self>, url: String, output_dir: PathBuf) -> JoinHandle<MirrorResult> {
        let handle = tokio::runtime::Handle::current();
        tokio::task::spawn_blocking(move || handle.block_on(self.mirror(&url, &output_dir)))
    }

    /// Mirrors one page and its directly referenced assets into a new
    /// project folder under `output_dir`. Never fails: whole-run errors come
    /// back as `success == false`, per-asset errors are skipped.
    pub async fn mirror(&self, url: &str, output_dir: &Path) -> MirrorResult {
        let started = Instant::now();
        let mut tally = Tally::default();

        let outcome = self.run(url, output_dir, &mut tally).await;
        let elapsed = started.elapsed();

        match outcome {
            Ok(project_folder) => MirrorResult {
                success: true,
                message: format!(
                    "Successfully downloaded {} files ({:.2} KB) to: {}",
                    tally.files,
                    tally.bytes as f64 / 1024.0,
                    project_folder.display()
                ),
                project_folder: Some(project_folder),
                total_files: tally.files,
                total_bytes: tally.bytes,
                elapsed,
                assets: tally.assets,
                failed: tally.failed,
            },
            Err(e) => {
                warn!("Mirror of {} failed: {}", url, e);
                MirrorResult {
                    success: false,
                    message: format!("Download failed: {}", e),
                    project_folder: None,
                    total_files: tally.files,
                    total_bytes: tally.bytes,
                    elapsed,
                    assets: tally.assets,
                    failed: tally.failed,
                }
            }
        }
    }

    async fn run(&self, url: &str, output_dir: &Path, tally: &mut Tally) -> Result<PathBuf, MirrorError> {
        // 1. Validate
        let url = validator::sanitize(url);
        if !validator::is_valid(&url) {
            return Err(MirrorError::InvalidUrl(url));
        }
        let parsed = Url::parse(&url).map_err(|e| MirrorError::InvalidUrl(format!("{}: {}", url, e)))?;
        let host = parsed
            .host_str()
            .ok_or_else(|| MirrorError::InvalidUrl(format!("{}: missing host", url)))?
            .to_string();

        // 2. Layout
        let layout = ProjectLayout::create(output_dir, &host).await?;
        info!("Mirroring {} into {:?}", url, layout.root());

        // 3. Entry page
        let page = self
            .pages
            .fetch_page(&url)
            .await
            .map_err(|source| MirrorError::EntryPage { url: url.clone(), source })?;
        if !page.is_html() {
            warn!("{} is served as {:?}, parsing it as HTML anyway", page.url, page.content_type);
        }
        let mut document = page.parse()?;
        let resolver = UrlResolver::for_document(&page.url, &document);

        // 4. Scan, then fetch every unique asset
        let references = scanner::scan(&document, &resolver);
        info!("Found {} asset references", references.len());

        let registry = Arc::new(AssetRegistry::new());
        let context = Arc::new(FetchContext {
            fetcher: self.fetcher.clone(),
            registry: registry.clone(),
            layout: layout.clone(),
            semaphore: Semaphore::new(self.config.max_concurrent.max(1)),
        });

        let mut pending = FuturesUnordered::new();
        for reference in &references {
            if !is_downloadable(&reference.url) || !registry.try_reserve(&reference.url) {
                continue;
            }
            let url = reference.url.clone();
            let task = tokio::spawn(fetch_asset(context.clone(), url.clone(), reference.category));
            pending.push(async move { (url, task.await) });
        }

        let progress = self.progress_bar(pending.len() as u64);
        while let Some((url, joined)) = pending.next().await {
            match joined {
                Ok(AssetOutcome::Stored { bytes }) => {
                    tally.files += 1;
                    tally.bytes += bytes;
                    progress.set_message(url);
                }
                Ok(AssetOutcome::Failed) => tally.failed.push(url),
                Err(e) => {
                    warn!("Task for {} ended abnormally: {}", url, e);
                    tally.failed.push(url);
                }
            }
            progress.inc(1);
        }
        progress.finish_and_clear();
        tally.failed.sort();
        tally.assets = registry.entries();

        // 5. Rewrite
        let changed = rewriter::rewrite(&mut document, &registry, &resolver, &references);
        debug!("Rewrote {} references", changed);

        // 6. Serialize
        let html = document.to_html()?;
        layout.write_index(&html).await?;
        tally.files += 1;
        tally.bytes += html.len() as u64;

        // 7. Reports
        if self.config.write_report {
            let ctx = ReportContext {
                original_url: &url,
                host: &host,
                total_files: tally.files,
                assets: &tally.assets,
            };
            if let Err(e) = report::write_reports(layout.root(), &document, &ctx).await {
                warn!("{:#}", e);
            }
        }

        Ok(layout.root().to_path_buf())
    }

    fn progress_bar(&self, len: u64) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }
        let bar = ProgressBar::new(len);
        if let Ok(style) = ProgressStyle::default_bar().template("{spinner} [{bar:30}] {pos}/{len} {wide_msg}") {
            bar.set_style(style);
        }
        bar
    }
}

/// Classifies, fetches and stores one reserved URL. Errors are logged and
/// reported as `Failed`; they never reach sibling tasks.
async fn fetch_asset(context: Arc<FetchContext>, url: String, hint: AssetCategory) -> AssetOutcome {
    let Ok(_permit) = context.semaphore.acquire().await else {
        return AssetOutcome::Failed;
    };

    let data = match context.fetcher.fetch(&url).await {
        Ok(data) if data.is_empty() => Err(FetchError::EmptyBody),
        other => other,
    };
    let data = match data {
        Ok(data) => data,
        Err(e) => {
            warn!("Failed to download {} {}: {}", hint, url, e);
            return AssetOutcome::Failed;
        }
    };

    let (category, extension) = classifier::classify(&url, hint);
    let file_name = classifier::file_name(&url, category, &extension, || context.registry.next_id());
    let local_path = context.registry.claim_path(category, &file_name);

    if let Err(e) = context.layout.write_file(&local_path, &data).await {
        warn!("{}", e);
        return AssetOutcome::Failed;
    }

    let bytes = data.len() as u64;
    context.registry.record(&url, category, &local_path, bytes);
    debug!("Downloaded {} -> {}", url, local_path);
    AssetOutcome::Stored { bytes }
}
