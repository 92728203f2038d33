//! Source resolution and output caching

pub mod cache;
pub mod resolver;

pub use cache::{CachedPdf, OutputCache};
pub use resolver::{resolve_base64, resolve_cache, resolve_json, resolve_path, ResolvedPdf};
