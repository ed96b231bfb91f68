use std::path::Path;

/// Anything that accepts library locations onto a search path.
///
/// This is the only operation the downloader needs from a boundary; it must be
/// idempotent per location and safe to call from several tasks at once.
pub trait LibraryTarget: Send + Sync {
    fn add_library(&self, location: &Path);
}
