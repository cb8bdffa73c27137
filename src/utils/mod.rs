//! Utility modules
//!
//! Icon extraction and caching, and logging setup.

pub mod icon_cache;
pub mod icon_extractor;
pub mod logging;

pub use icon_cache::{CacheStats, Icon, IconLocation, IconResolver, parse_icon_location};
pub use icon_extractor::{IconImage, IconSource, SystemIconSource};
pub use logging::{LogTarget, init_logging};
