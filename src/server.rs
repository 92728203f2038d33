//! MCP Server implementation using rmcp

use crate::config::FillConfig;
use crate::error::Error;
use crate::form::{FieldWarning, FormFieldRecord, PageFields, SkippedField};
use crate::pdf::{extract_form_fields, fill_form, fill_template_pages, ExtractedField};
use crate::source::{resolve_base64, resolve_cache, resolve_path, OutputCache, ResolvedPdf};
use rmcp::{
    handler::server::tool::ToolRouter, handler::server::wrapper::Parameters, model::*,
    schemars::JsonSchema, tool, tool_handler, tool_router, ServerHandler, ServiceExt,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Where a PDF comes from
#[derive(Debug, Clone, Serialize, JsonSchema)]
#[serde(untagged)]
pub enum PdfSource {
    /// File path (absolute or relative)
    Path {
        /// Path to the PDF file
        path: String,
    },
    /// Base64 encoded PDF data
    Base64 {
        /// Base64 encoded PDF content
        base64: String,
    },
    /// Output of an earlier fill
    CacheRef {
        /// Cache key returned by a previous operation
        cache_key: String,
    },
}

const SOURCE_KEYS: [&str; 3] = ["path", "base64", "cache_key"];

impl<'de> serde::Deserialize<'de> for PdfSource {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = serde_json::Value::deserialize(deserializer)?;

        let Some(obj) = value.as_object() else {
            let got = match &value {
                serde_json::Value::Array(_) => "an array",
                serde_json::Value::String(_) => "a string",
                serde_json::Value::Number(_) => "a number",
                serde_json::Value::Bool(_) => "a boolean",
                serde_json::Value::Null => "null",
                serde_json::Value::Object(_) => "an object",
            };
            return Err(serde::de::Error::custom(format!(
                "Invalid source: expected an object with one of \"path\", \"base64\" or \"cache_key\", but got {}",
                got
            )));
        };

        for key in SOURCE_KEYS {
            let Some(v) = obj.get(key) else {
                continue;
            };
            let s = v
                .as_str()
                .ok_or_else(|| serde::de::Error::custom(format!("\"{}\" must be a string", key)))?
                .to_string();
            return Ok(match key {
                "path" => PdfSource::Path { path: s },
                "base64" => PdfSource::Base64 { base64: s },
                _ => PdfSource::CacheRef { cache_key: s },
            });
        }

        let keys: Vec<&String> = obj.keys().collect();
        Err(serde::de::Error::custom(format!(
            "Invalid source: expected an object with one of \"path\", \"base64\" or \"cache_key\", but got keys: {:?}",
            keys
        )))
    }
}

/// Security and resource configuration for the form server
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Directories that path sources and output paths must live in
    pub resource_dirs: Vec<String>,
    /// Maximum total bytes in the output cache (default: 512MB)
    pub cache_max_bytes: usize,
    /// Maximum number of cached outputs (default: 100)
    pub cache_max_entries: usize,
    /// Layout and rendering settings for every fill
    pub fill: FillConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            resource_dirs: Vec::new(),
            cache_max_bytes: 512 * 1024 * 1024, // 512MB
            cache_max_entries: 100,
            fill: FillConfig::default(),
        }
    }
}

/// PDF form filling MCP server
#[derive(Clone)]
pub struct PdfFormServer {
    cache: Arc<RwLock<OutputCache>>,
    tool_router: ToolRouter<Self>,
    config: Arc<ServerConfig>,
}

// ============================================================================
// Request/Response types for fill_form
// ============================================================================

#[derive(Debug, Deserialize, JsonSchema)]
pub struct FillFormParams {
    /// Source PDF containing form fields
    pub source: PdfSource,
    /// Fields to fill, applied in order
    pub fields: Vec<FormFieldRecord>,
    /// Output file path (optional). If provided, saves the filled PDF to this path.
    #[serde(default)]
    pub output_path: Option<String>,
    /// Password for encrypted PDFs
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct FillFormResult {
    /// Source identifier
    pub source: String,
    /// Cache key for the output PDF, usable as a `cache_key` source
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_cache_key: Option<String>,
    /// Number of fields successfully filled
    pub fields_filled: u32,
    /// Fields that could not be filled
    pub fields_skipped: Vec<SkippedField>,
    /// Fields filled with degraded geometry or alignment
    pub warnings: Vec<FieldWarning>,
    /// Path where PDF was saved (if output_path was specified)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

// ============================================================================
// Request/Response types for extract_form_fields
// ============================================================================

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ExtractFormFieldsParams {
    /// PDF sources to inspect
    pub sources: Vec<PdfSource>,
    /// Page range (e.g., "1-3,5"). All pages when omitted.
    #[serde(default)]
    pub pages: Option<String>,
    /// Password for encrypted PDFs
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct ExtractFormFieldsResult {
    pub source: String,
    /// Fields sorted by tab order
    pub fields: Vec<ExtractedField>,
    pub total_fields: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

// ============================================================================
// Request/Response types for fill_template_pages
// ============================================================================

#[derive(Debug, Deserialize, JsonSchema)]
pub struct FillTemplatePagesParams {
    /// Template PDF; its first page is stamped once per entry
    pub template: PdfSource,
    /// One entry per output page, in output order
    pub pages: Vec<PageFields>,
    /// Output file path (optional)
    #[serde(default)]
    pub output_path: Option<String>,
    /// Password for an encrypted template
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct FillTemplatePagesResult {
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_cache_key: Option<String>,
    /// Number of pages in the output PDF
    pub output_page_count: u32,
    pub fields_filled: u32,
    pub fields_skipped: Vec<SkippedField>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

fn join_error(e: tokio::task::JoinError) -> Error {
    Error::Pdfium {
        reason: format!("Task join error: {}", e),
    }
}

fn to_json<T: Serialize>(result: T) -> String {
    let response = serde_json::json!({ "results": [result] });
    serde_json::to_string_pretty(&response).unwrap_or_default()
}

// ============================================================================
// Tool implementations
// ============================================================================

#[tool_router]
impl PdfFormServer {
    pub fn new() -> Self {
        Self::with_config(ServerConfig::default())
    }

    /// Create a server restricted to the given resource directories
    pub fn with_resource_dirs(dirs: Vec<String>) -> Self {
        Self::with_config(ServerConfig {
            resource_dirs: dirs,
            ..ServerConfig::default()
        })
    }

    /// Create a new server with full configuration
    pub fn with_config(config: ServerConfig) -> Self {
        let cache = OutputCache::new(config.cache_max_entries, config.cache_max_bytes);
        Self {
            cache: Arc::new(RwLock::new(cache)),
            tool_router: Self::tool_router(),
            config: Arc::new(config),
        }
    }

    /// Fill form fields by drawing their values onto the pages
    #[tool(
        description = "Fill a PDF form by drawing each value onto its page and produce a new PDF.

Each field entry specifies:
- name: The field name (use extract_form_fields to discover names and geometry)
- value: Text, a checkbox token (true/yes/1/checked/on), or a data:image/<type>;base64,... URI
- field_type: Optional kind; \"checkbox\" draws a checkmark for truthy values
- text_align: Optional 0-8 (0 top-left, 4 center, 8 bottom-right; default bottom-left)
- font_size: Optional, default 10
- left/top/right/bottom or left/top/width/height and page_number: Optional geometry. Without it the field is located by name

Fields are applied in order. A field that cannot be drawn is reported in fields_skipped and the rest continue.
The output is cached (output_cache_key) for chaining with other tools.

Source format: must be one of {\"path\": \"/absolute/path.pdf\"}, {\"base64\": \"...\"}, or {\"cache_key\": \"...\"}"
    )]
    async fn fill_form(&self, Parameters(params): Parameters<FillFormParams>) -> String {
        let result = self
            .process_fill_form(&params)
            .await
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "fill_form failed");
                FillFormResult {
                    source: Self::source_name(&params.source),
                    output_cache_key: None,
                    fields_filled: 0,
                    fields_skipped: vec![],
                    warnings: vec![],
                    output_path: None,
                    error: Some(e.client_message()),
                }
            });

        to_json(result)
    }

    /// Extract form fields from PDF files
    #[tool(
        description = "Extract form fields from PDF files. Returns, per widget, name, field_type, current value or checked state, options, page_number, left/right/top/bottom, width/height and tab_order, sorted by tab order.

The output uses the same keys fill_form accepts, so it can be edited and passed back as fields.

Source format: each element must be one of {\"path\": \"/absolute/path.pdf\"}, {\"base64\": \"...\"}, or {\"cache_key\": \"...\"}"
    )]
    async fn extract_form_fields(
        &self,
        Parameters(params): Parameters<ExtractFormFieldsParams>,
    ) -> String {
        let mut results = Vec::new();

        for source in &params.sources {
            let result = self
                .process_extract_form_fields(source, &params)
                .await
                .unwrap_or_else(|e| {
                    tracing::warn!(error = %e, "extract_form_fields failed");
                    ExtractFormFieldsResult {
                        source: Self::source_name(source),
                        fields: vec![],
                        total_fields: 0,
                        error: Some(e.client_message()),
                    }
                });
            results.push(result);
        }

        let response = serde_json::json!({ "results": results });
        serde_json::to_string_pretty(&response).unwrap_or_default()
    }

    /// Stamp a template once per page entry
    #[tool(
        description = "Build a multi-page PDF from a one-page form template. For every entry in pages, a fresh copy of the template gets its fields set by name, is flattened, and its first page is appended to the output.

Each entry is {\"page_number\": N, \"fields\": [{\"name\": \"...\", \"value\": \"...\"}]}. page_number must be unique.

Source format: template must be one of {\"path\": \"/absolute/path.pdf\"}, {\"base64\": \"...\"}, or {\"cache_key\": \"...\"}"
    )]
    async fn fill_template_pages(
        &self,
        Parameters(params): Parameters<FillTemplatePagesParams>,
    ) -> String {
        let result = self
            .process_fill_template_pages(&params)
            .await
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "fill_template_pages failed");
                FillTemplatePagesResult {
                    source: Self::source_name(&params.template),
                    output_cache_key: None,
                    output_page_count: 0,
                    fields_filled: 0,
                    fields_skipped: vec![],
                    output_path: None,
                    error: Some(e.client_message()),
                }
            });

        to_json(result)
    }
}

impl PdfFormServer {
    fn source_name(source: &PdfSource) -> String {
        match source {
            PdfSource::Path { path } => path.clone(),
            PdfSource::Base64 { .. } => "<base64>".to_string(),
            PdfSource::CacheRef { cache_key } => format!("<cache:{}>", cache_key),
        }
    }

    async fn resolve_source(&self, source: &PdfSource) -> crate::Result<ResolvedPdf> {
        match source {
            PdfSource::Path { path } => {
                let allowed = self.validate_path_access(path)?;
                resolve_path(allowed)
            }
            PdfSource::Base64 { base64 } => resolve_base64(base64),
            PdfSource::CacheRef { cache_key } => resolve_cache(cache_key, &self.cache).await,
        }
    }

    fn is_within_resource_dirs(&self, canonical: &Path) -> bool {
        self.config.resource_dirs.iter().any(|dir| {
            std::fs::canonicalize(dir)
                .map(|canonical_dir| canonical.starts_with(canonical_dir))
                .unwrap_or(false)
        })
    }

    /// Validate that a path is within allowed resource directories.
    /// If no resource_dirs are configured, all paths are allowed.
    fn validate_path_access(&self, path: &str) -> crate::Result<PathBuf> {
        if self.config.resource_dirs.is_empty() {
            return Ok(PathBuf::from(path));
        }

        let denied = || Error::PathAccessDenied {
            path: path.to_string(),
        };
        let canonical = std::fs::canonicalize(path).map_err(|_| denied())?;

        if self.is_within_resource_dirs(&canonical) {
            Ok(canonical)
        } else {
            Err(denied())
        }
    }

    /// Like [`Self::validate_path_access`] for a file that may not exist yet:
    /// the parent directory is canonicalized instead.
    fn validate_output_path_access(&self, path: &str) -> crate::Result<PathBuf> {
        if self.config.resource_dirs.is_empty() {
            return Ok(PathBuf::from(path));
        }

        let denied = || Error::PathAccessDenied {
            path: path.to_string(),
        };
        let target = Path::new(path);
        let file_name = target.file_name().ok_or_else(denied)?;
        let parent = match target.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let canonical = std::fs::canonicalize(parent)
            .map_err(|_| denied())?
            .join(file_name);

        if self.is_within_resource_dirs(&canonical) {
            Ok(canonical)
        } else {
            Err(denied())
        }
    }

    /// Write output data to a file path, with sandbox validation.
    fn write_output(
        &self,
        output_path: Option<&str>,
        data: &[u8],
    ) -> crate::Result<Option<String>> {
        let Some(path_str) = output_path else {
            return Ok(None);
        };
        let path = self.validate_output_path_access(path_str)?;

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        std::fs::write(&path, data)?;
        tracing::info!(path = %path.display(), bytes = data.len(), "wrote output");
        Ok(Some(path_str.to_string()))
    }

    async fn cache_output(&self, origin: &str, data: &[u8]) -> Option<String> {
        self.cache.write().await.insert(origin, data.to_vec())
    }

    pub async fn process_fill_form(
        &self,
        params: &FillFormParams,
    ) -> crate::Result<FillFormResult> {
        if params.fields.is_empty() {
            return Err(Error::EmptyFieldList);
        }

        let resolved = self.resolve_source(&params.source).await?;
        let source_name = resolved.source_name.clone();

        let data = resolved.data;
        let password = params.password.clone();
        let records = params.fields.clone();
        let fill_config = self.config.fill.clone();

        let (output_data, report) = tokio::task::spawn_blocking(move || {
            fill_form(&data, password.as_deref(), &records, &fill_config)
        })
        .await
        .map_err(join_error)??;

        let output_cache_key = self.cache_output("fill_form", &output_data).await;
        let output_path = self.write_output(params.output_path.as_deref(), &output_data)?;

        Ok(FillFormResult {
            source: source_name,
            output_cache_key,
            fields_filled: report.fields_filled,
            fields_skipped: report.fields_skipped,
            warnings: report.warnings,
            output_path,
            error: None,
        })
    }

    pub async fn process_extract_form_fields(
        &self,
        source: &PdfSource,
        params: &ExtractFormFieldsParams,
    ) -> crate::Result<ExtractFormFieldsResult> {
        let resolved = self.resolve_source(source).await?;
        let source_name = resolved.source_name.clone();

        let data = resolved.data;
        let password = params.password.clone();
        let pages = params.pages.clone();

        let fields = tokio::task::spawn_blocking(move || {
            extract_form_fields(&data, password.as_deref(), pages.as_deref())
        })
        .await
        .map_err(join_error)??;

        Ok(ExtractFormFieldsResult {
            source: source_name,
            total_fields: fields.len(),
            fields,
            error: None,
        })
    }

    pub async fn process_fill_template_pages(
        &self,
        params: &FillTemplatePagesParams,
    ) -> crate::Result<FillTemplatePagesResult> {
        let resolved = self.resolve_source(&params.template).await?;
        let source_name = resolved.source_name.clone();

        let template = resolved.data;
        let password = params.password.clone();
        let pages = params.pages.clone();
        let output_page_count = pages.len() as u32;

        let (output_data, report) = tokio::task::spawn_blocking(move || {
            fill_template_pages(&template, password.as_deref(), &pages)
        })
        .await
        .map_err(join_error)??;

        let output_cache_key = self
            .cache_output("fill_template_pages", &output_data)
            .await;
        let output_path = self.write_output(params.output_path.as_deref(), &output_data)?;

        Ok(FillTemplatePagesResult {
            source: source_name,
            output_cache_key,
            output_page_count,
            fields_filled: report.fields_filled,
            fields_skipped: report.fields_skipped,
            output_path,
            error: None,
        })
    }
}

impl Default for PdfFormServer {
    fn default() -> Self {
        Self::new()
    }
}

#[tool_handler]
impl ServerHandler for PdfFormServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation::from_build_env(),
            instructions: Some(
                "PDF Form Filler draws text, images and checkmarks into PDF form fields, \
                 extracts field names and geometry, and stamps one-page templates into \
                 multi-page documents."
                    .into(),
            ),
        }
    }
}

/// Run the MCP server with default configuration
pub async fn run_server() -> anyhow::Result<()> {
    run_server_with_config(ServerConfig::default()).await
}

/// Run the MCP server with full configuration
pub async fn run_server_with_config(config: ServerConfig) -> anyhow::Result<()> {
    let server = PdfFormServer::with_config(config);

    tracing::info!("PDF Form Filler MCP server ready, waiting for connections...");

    let service = server.serve(rmcp::transport::io::stdio()).await?;
    service.waiting().await?;

    Ok(())
}
