//! One handle over every library component, shared by request handlers.

use std::path::PathBuf;
use std::sync::Arc;

use crate::cover::{CoverIngestor, DEFAULT_MAX_COVER_BYTES};
use crate::error::Result;
use crate::frames::FrameSource;
use crate::library::{DEFAULT_METADATA_FILE, DEFAULT_VIDEO_EXTENSIONS, LibraryLayout};
use crate::lifecycle::LifecycleManager;
use crate::metadata::{MetadataFile, MetadataStore};
use crate::resolver::{AssetResolver, VideoAsset};
use crate::slate::{DEFAULT_BRAND, DEFAULT_FALLBACK_TITLE, SlateGenerator, Theme};
use crate::upload::UploadOrchestrator;

pub const DEFAULT_MAX_VIDEO_BYTES: u64 = 2 * 1024 * 1024 * 1024;

/// Everything needed to open a library.
#[derive(Debug, Clone)]
pub struct LibrarySettings {
    pub root: PathBuf,
    pub metadata_file: String,
    pub video_extensions: Vec<String>,
    pub max_video_bytes: u64,
    pub max_cover_bytes: u64,
    pub brand: String,
    pub fallback_title: String,
    pub default_theme: Theme,
}

impl Default for LibrarySettings {
    fn default() -> Self {
        Self {
            root: PathBuf::from("./uploads"),
            metadata_file: DEFAULT_METADATA_FILE.to_string(),
            video_extensions: DEFAULT_VIDEO_EXTENSIONS
                .iter()
                .map(|ext| ext.to_string())
                .collect(),
            max_video_bytes: DEFAULT_MAX_VIDEO_BYTES,
            max_cover_bytes: DEFAULT_MAX_COVER_BYTES,
            brand: DEFAULT_BRAND.to_string(),
            fallback_title: DEFAULT_FALLBACK_TITLE.to_string(),
            default_theme: Theme::default(),
        }
    }
}

impl LibrarySettings {
    pub fn layout(&self) -> LibraryLayout {
        LibraryLayout::new(&self.root)
            .with_metadata_file(&self.metadata_file)
            .with_video_extensions(&self.video_extensions)
    }
}

#[derive(Debug)]
pub struct LibraryService {
    layout: LibraryLayout,
    metadata: MetadataStore,
    resolver: AssetResolver,
    uploads: UploadOrchestrator,
    covers: CoverIngestor,
    lifecycle: LifecycleManager,
    frame_source: &'static str,
}

impl LibraryService {
    /// Create the library root if needed and start the metadata owner.
    pub async fn open(settings: &LibrarySettings, frames: Arc<dyn FrameSource>) -> Result<Self> {
        let layout = settings.layout();
        layout.ensure_root().await?;

        let metadata = MetadataStore::spawn(MetadataFile::new(layout.metadata_path()));
        let slates = SlateGenerator::new(&settings.brand, &settings.fallback_title);
        let frame_source = frames.name();

        Ok(Self {
            resolver: AssetResolver::new(layout.clone()),
            uploads: UploadOrchestrator::new(
                layout.clone(),
                metadata.clone(),
                slates.clone(),
                frames,
                settings.default_theme,
                settings.max_video_bytes,
            ),
            covers: CoverIngestor::new(layout.clone(), settings.max_cover_bytes),
            lifecycle: LifecycleManager::new(layout.clone(), metadata.clone(), slates),
            layout,
            metadata,
            frame_source,
        })
    }

    pub fn layout(&self) -> &LibraryLayout {
        &self.layout
    }

    pub fn metadata(&self) -> &MetadataStore {
        &self.metadata
    }

    pub fn resolver(&self) -> &AssetResolver {
        &self.resolver
    }

    pub fn uploads(&self) -> &UploadOrchestrator {
        &self.uploads
    }

    pub fn covers(&self) -> &CoverIngestor {
        &self.covers
    }

    pub fn lifecycle(&self) -> &LifecycleManager {
        &self.lifecycle
    }

    pub fn frame_source_name(&self) -> &'static str {
        self.frame_source
    }

    /// Every video in the library with its current title and thumbnail.
    pub async fn list(&self) -> Result<Vec<VideoAsset>> {
        let metadata = self.metadata.snapshot().await;
        self.resolver.list(&metadata).await
    }
}
