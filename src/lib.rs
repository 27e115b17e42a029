pub mod classifier;
pub mod cli;
pub mod config;
pub mod dom;
pub mod downloader;
pub mod error;
pub mod fetcher;
pub mod file_manager;
pub mod inspect;
pub mod registry;
pub mod report;
pub mod rewriter;
pub mod scanner;
pub mod validator;

// Re-export main types for convenience
pub use classifier::AssetCategory;
pub use cli::MirrorCommand;
pub use config::MirrorConfig;
pub use dom::{Document, Element};
pub use downloader::{MirrorResult, SiteMirror};
pub use error::{FetchError, MirrorError};
pub use fetcher::{ByteFetcher, FetchedPage, HttpFetcher, PageSource};
pub use file_manager::ProjectLayout;
pub use inspect::PageSummary;
pub use registry::{AssetRegistry, AssetRegistryEntry};
pub use scanner::{AssetReference, ReferenceKind, Shape, UrlResolver};
