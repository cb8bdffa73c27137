//! Icon resolution with an in-memory cache
//!
//! `IconResolver` turns registry `DisplayIcon` strings (`"C:\app.exe,1"`) into
//! images. Results are cached per `(path, index)`, including failures, so a
//! path is probed and extracted at most once per resolver. The fallback image
//! is created on first use and shared afterwards.
//!
//! The resolver never fails: a missing file or a failed extraction yields the
//! fallback icon, or [`Icon::Empty`] when the caller opts out of fallbacks.

use super::icon_extractor::{IconImage, IconSource, SystemIconSource};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use tracing::debug;

/// A parsed icon location
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IconLocation {
    /// File containing the icon resource
    pub path: PathBuf,
    /// Icon index; negative values are resource identifiers
    pub index: i32,
}

/// Parse `path[,index]`
///
/// Quotes and whitespace are trimmed from the whole string and from the base
/// path. A non-numeric index is treated as 0. Returns `None` for an empty path.
pub fn parse_icon_location(raw: &str) -> Option<IconLocation> {
    let trimmed = trim_path(raw);

    let (base, index) = match trimmed.rsplit_once(',') {
        Some((base, suffix)) => (trim_path(base), suffix.trim().parse::<i32>().unwrap_or(0)),
        None => (trimmed, 0),
    };

    if base.is_empty() {
        return None;
    }

    Some(IconLocation {
        path: PathBuf::from(base),
        index,
    })
}

fn trim_path(s: &str) -> &str {
    s.trim_matches(|c: char| c.is_whitespace() || c == '"')
}

/// Result of an icon lookup
#[derive(Debug, Clone)]
pub enum Icon {
    /// Extracted from the requested file
    Extracted(Arc<IconImage>),
    /// The shared fallback image
    Fallback(Arc<IconImage>),
    /// No icon; only returned when fallbacks are disabled
    Empty,
}

impl Icon {
    /// The image, if any
    pub fn image(&self) -> Option<&Arc<IconImage>> {
        match self {
            Self::Extracted(image) | Self::Fallback(image) => Some(image),
            Self::Empty => None,
        }
    }

    /// Whether this is the fallback image
    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback(_))
    }

    /// Whether there is no image
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }
}

#[derive(Debug, Clone)]
enum CachedIcon {
    Extracted(Arc<IconImage>),
    Failed,
}

/// Cache statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    /// Number of cached keys
    pub entries: usize,
    /// Keys holding an extracted image
    pub extracted: usize,
    /// Keys cached as failures
    pub failed: usize,
    /// Pixel memory held by extracted images
    pub pixel_bytes: u64,
}

impl CacheStats {
    /// Format pixel memory as a human-readable string
    ///
    /// ```
    /// use dustoff::utils::icon_cache::CacheStats;
    ///
    /// let stats = CacheStats { entries: 10, extracted: 10, failed: 0, pixel_bytes: 40960 };
    /// assert_eq!(stats.size_human_readable(), "40 KB");
    ///
    /// let stats = CacheStats { entries: 100, extracted: 100, failed: 0, pixel_bytes: 2_097_152 };
    /// assert_eq!(stats.size_human_readable(), "2.0 MB");
    /// ```
    #[expect(
        clippy::cast_precision_loss,
        reason = "display only; sub-byte precision is irrelevant"
    )]
    pub fn size_human_readable(&self) -> String {
        const KB: u64 = 1024;
        const MB: u64 = 1024 * KB;

        if self.pixel_bytes >= MB {
            format!("{:.1} MB", self.pixel_bytes as f64 / MB as f64)
        } else if self.pixel_bytes >= KB {
            format!("{} KB", self.pixel_bytes / KB)
        } else {
            format!("{} bytes", self.pixel_bytes)
        }
    }
}

/// Resolves icon locations through a per-instance cache
///
/// The cache lock is held across lookup and population, so concurrent callers
/// never extract the same key twice.
pub struct IconResolver<S: IconSource = SystemIconSource> {
    source: S,
    cache: Mutex<HashMap<IconLocation, CachedIcon>>,
    fallback: OnceLock<Arc<IconImage>>,
}

impl IconResolver<SystemIconSource> {
    /// Resolver backed by the host's filesystem and shell
    pub fn new() -> Self {
        Self::with_source(SystemIconSource)
    }
}

impl Default for IconResolver<SystemIconSource> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: IconSource> IconResolver<S> {
    /// Resolver backed by `source`
    pub fn with_source(source: S) -> Self {
        Self {
            source,
            cache: Mutex::new(HashMap::new()),
            fallback: OnceLock::new(),
        }
    }

    /// The underlying source
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Resolve `icon_path` (`path[,index]`) to an icon
    pub fn resolve(&self, icon_path: &str, allow_fallback: bool) -> Icon {
        let Some(location) = parse_icon_location(icon_path) else {
            return self.failed(allow_fallback);
        };

        let cached = {
            let mut cache = self.cache.lock();
            if let Some(hit) = cache.get(&location) {
                hit.clone()
            } else {
                let loaded = self.load(&location.path, location.index);
                cache.insert(location, loaded.clone());
                loaded
            }
        };

        match cached {
            CachedIcon::Extracted(image) => Icon::Extracted(image),
            CachedIcon::Failed => self.failed(allow_fallback),
        }
    }

    /// The shared fallback image, created on first call
    pub fn fallback_icon(&self) -> Arc<IconImage> {
        Arc::clone(
            self.fallback
                .get_or_init(|| Arc::new(self.source.fallback())),
        )
    }

    /// Snapshot of cache contents
    pub fn stats(&self) -> CacheStats {
        let cache = self.cache.lock();
        let mut stats = CacheStats {
            entries: cache.len(),
            ..CacheStats::default()
        };
        for cached in cache.values() {
            match cached {
                CachedIcon::Extracted(image) => {
                    stats.extracted += 1;
                    stats.pixel_bytes += image.rgba().len() as u64;
                }
                CachedIcon::Failed => stats.failed += 1,
            }
        }
        stats
    }

    /// Drop all cached entries (the fallback image is kept)
    pub fn clear(&self) {
        self.cache.lock().clear();
    }

    fn failed(&self, allow_fallback: bool) -> Icon {
        if allow_fallback {
            Icon::Fallback(self.fallback_icon())
        } else {
            Icon::Empty
        }
    }

    fn load(&self, path: &Path, index: i32) -> CachedIcon {
        if !self.source.exists(path) {
            debug!("Icon file not found: {:?}", path);
            return CachedIcon::Failed;
        }

        if let Some(image) = self.source.extract(path, index) {
            return CachedIcon::Extracted(Arc::new(image));
        }

        if index != 0 {
            debug!("No icon at index {} in {:?}, retrying index 0", index, path);
            if let Some(image) = self.source.extract(path, 0) {
                return CachedIcon::Extracted(Arc::new(image));
            }
        }

        debug!("Icon extraction failed for {:?}", path);
        CachedIcon::Failed
    }
}
