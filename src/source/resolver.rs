//! Source resolution for input documents and JSON payloads

use crate::error::{Error, Result};
use crate::source::OutputCache;
use base64::Engine;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Resolved PDF data
pub struct ResolvedPdf {
    pub data: Vec<u8>,
    pub source_name: String,
}

fn check_header(data: &[u8], what: &str) -> Result<()> {
    if data.len() < 4 || &data[0..4] != b"%PDF" {
        return Err(Error::InvalidPdf {
            reason: format!("{} is not a valid PDF file", what),
        });
    }
    Ok(())
}

/// Resolve a file path to PDF data
pub fn resolve_path<P: AsRef<Path>>(path: P) -> Result<ResolvedPdf> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(Error::PdfNotFound {
            path: path.display().to_string(),
        });
    }

    let data = std::fs::read(path)?;
    check_header(&data, "File")?;

    Ok(ResolvedPdf {
        data,
        source_name: path.display().to_string(),
    })
}

/// Resolve base64 encoded data to PDF data
pub fn resolve_base64(base64_data: &str) -> Result<ResolvedPdf> {
    let data = base64::engine::general_purpose::STANDARD.decode(base64_data.trim())?;
    check_header(&data, "Decoded data")?;

    Ok(ResolvedPdf {
        data,
        source_name: "<base64>".to_string(),
    })
}

/// Resolve the key of an earlier output to its PDF data
pub async fn resolve_cache(
    cache_key: &str,
    cache: &Arc<RwLock<OutputCache>>,
) -> Result<ResolvedPdf> {
    let cached = cache
        .read()
        .await
        .get(cache_key)
        .ok_or_else(|| Error::CacheKeyNotFound {
            key: cache_key.to_string(),
        })?;

    tracing::debug!(key = cache_key, origin = %cached.origin, "resolved cached output");

    Ok(ResolvedPdf {
        data: cached.data,
        source_name: format!("<cache:{}>", cache_key),
    })
}

/// JSON text given either inline or as a file path (exactly one of them)
pub fn resolve_json(inline: Option<&str>, file: Option<&Path>) -> Result<String> {
    match (inline, file) {
        (Some(json), None) => Ok(json.to_string()),
        (None, Some(path)) => {
            if !path.exists() {
                return Err(Error::InvalidInput {
                    reason: format!("JSON file not found: {}", path.display()),
                });
            }
            Ok(std::fs::read_to_string(path)?)
        }
        (Some(_), Some(_)) => Err(Error::InvalidInput {
            reason: "give the JSON inline or as a file, not both".to_string(),
        }),
        (None, None) => Err(Error::InvalidInput {
            reason: "no JSON input given".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_resolve_base64_not_pdf() {
        let result = resolve_base64("SGVsbG8gV29ybGQ="); // "Hello World"
        assert!(matches!(result, Err(Error::InvalidPdf { .. })));
    }

    #[test]
    fn test_resolve_base64_invalid_base64() {
        let result = resolve_base64("not valid base64!!!");
        assert!(matches!(result, Err(Error::Base64Decode(_))));
    }

    #[test]
    fn test_resolve_base64_pdf() {
        let encoded = base64::engine::general_purpose::STANDARD.encode(b"%PDF-1.7\n%%EOF");
        let resolved = resolve_base64(&encoded).unwrap();
        assert_eq!(resolved.source_name, "<base64>");
        assert!(resolved.data.starts_with(b"%PDF"));
    }

    #[test]
    fn test_resolve_path_not_found() {
        let result = resolve_path("/nonexistent/path/file.pdf");
        assert!(matches!(result, Err(Error::PdfNotFound { .. })));
    }

    #[test]
    fn test_resolve_path_checks_header() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"just text").unwrap();
        let result = resolve_path(file.path());
        assert!(matches!(result, Err(Error::InvalidPdf { .. })));
    }

    #[tokio::test]
    async fn test_resolve_cache() {
        let cache = Arc::new(RwLock::new(OutputCache::new(4, 1024)));
        let key = cache
            .write()
            .await
            .insert("fill_form", b"%PDF-1.7".to_vec())
            .unwrap();

        let resolved = resolve_cache(&key, &cache).await.unwrap();
        assert_eq!(resolved.data, b"%PDF-1.7");
        assert_eq!(resolved.source_name, format!("<cache:{}>", key));

        let missing = resolve_cache("nonexistent_key", &cache).await;
        assert!(matches!(missing, Err(Error::CacheKeyNotFound { .. })));
    }

    #[test]
    fn test_resolve_json() {
        assert_eq!(resolve_json(Some("[]"), None).unwrap(), "[]");

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(br#"[{"name": "a"}]"#).unwrap();
        assert_eq!(
            resolve_json(None, Some(file.path())).unwrap(),
            r#"[{"name": "a"}]"#
        );

        assert!(matches!(
            resolve_json(Some("[]"), Some(file.path())),
            Err(Error::InvalidInput { .. })
        ));
        assert!(matches!(
            resolve_json(None, None),
            Err(Error::InvalidInput { .. })
        ));
        assert!(matches!(
            resolve_json(None, Some(Path::new("/nonexistent/fields.json"))),
            Err(Error::InvalidInput { .. })
        ));
    }
}
