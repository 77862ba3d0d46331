use async_trait::async_trait;
use tracing::info;
use vitrine_iiif::CapabilityDocument;

/// What the tile renderer is asked to open: a bare address it must fetch
/// itself, or a document that has already been fetched on its behalf.
#[derive(Debug, Clone)]
pub enum TileSource {
    Uri(String),
    Document {
        uri: String,
        document: CapabilityDocument,
    },
}

impl TileSource {
    pub fn uri(&self) -> &str {
        match self {
            TileSource::Uri(uri) => uri,
            TileSource::Document { uri, .. } => uri,
        }
    }
}

/// Rendering collaborator.
///
/// `Ok` means the source opened; `Err` is the renderer's failed-open signal.
/// Authorization decisions never originate here.
#[async_trait]
pub trait Viewer: Send + Sync {
    async fn open(&self, source: TileSource) -> anyhow::Result<()>;
}

/// Stand-in renderer that records the handoff in the log. Actual tile
/// rendering lives outside this crate.
#[derive(Debug, Default)]
pub struct LogViewer;

#[async_trait]
impl Viewer for LogViewer {
    async fn open(&self, source: TileSource) -> anyhow::Result<()> {
        match &source {
            TileSource::Uri(uri) => info!(uri = %uri, "viewer pointed at tile source"),
            TileSource::Document { uri, document } => info!(
                uri = %uri,
                document_id = document.id().unwrap_or("<no @id>"),
                "viewer handed tile source document"
            ),
        }
        Ok(())
    }
}
