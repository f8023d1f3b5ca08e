//! Document upload: the directory bulk pipeline plus the single-file and
//! URL paths.
//!
//! # Directory pipeline
//!
//! ```text
//! walk ──▶ sniff/allow-list ──▶ chunk (≤ BULK_LIMIT) ──▶ per batch:
//!                                                        create ▶ upload ▶ process
//! ```
//!
//! 1. Recursively enumerate regular files (discovery order).
//! 2. Sniff each file's content; drop unsupported types silently.
//! 3. Partition survivors into batches of at most [`BULK_LIMIT`].
//! 4. Per batch, sequentially: one bulk create call, one storage PUT per
//!    item, one bulk process call.
//!
//! The `handle_errors` flag picks the failure policy. Fail-fast (`false`,
//! the default): the first create/upload/process failure aborts the whole
//! run with an error, and records from already-completed batches are not
//! returned. Resilient (`true`): a failed create or process call skips
//! that batch, a failed storage PUT skips that item; both are logged and
//! the run continues. Created records are returned even when their own
//! upload or process step failed — the record exists server-side, possibly
//! with no content and never processed. There is no cleanup for those.
//!
//! Local I/O errors (unreadable file, walk failure) are fatal under either
//! policy; the policy only demotes remote failures.
//!
//! Unlike the single-file path, the directory pipeline enforces no file
//! size ceiling. Files are read whole into memory for transfer.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::client::DocumentCloud;
use crate::documents::Document;
use crate::error::{Error, Result};
use crate::sniff;

/// Maximum number of documents per bulk create/process call.
pub const BULK_LIMIT: usize = 25;

/// Size cap for the single-file upload path. 501MB rather than 500MB to
/// give a little leeway for OS rounding.
pub const MAX_UPLOAD_SIZE: u64 = 501 * 1024 * 1024;

/// Shared creation metadata for uploads.
///
/// `title` applies only to single uploads; the directory pipeline derives
/// a title per file and ignores it.
#[derive(Debug, Clone, Default)]
pub struct UploadOptions {
    pub title: Option<String>,
    pub access: Option<String>,
    pub description: Option<String>,
    pub language: Option<String>,
    pub related_article: Option<String>,
    pub publish_at: Option<String>,
    pub published_url: Option<String>,
    pub source: Option<String>,
    pub data: Option<serde_json::Map<String, serde_json::Value>>,
    /// Projects to associate the documents with.
    pub projects: Option<Vec<i64>>,
    /// Convenience for a single project; `projects` wins if both are set.
    pub project: Option<i64>,
    pub force_ocr: Option<bool>,
    pub delayed_index: Option<bool>,
    /// Not currently supported by the API; warned about and dropped.
    pub secure: bool,
}

impl UploadOptions {
    /// Build the creation parameters, defaulting the title.
    fn to_params(&self, default_title: &str) -> serde_json::Map<String, serde_json::Value> {
        let mut params = serde_json::Map::new();
        params.insert("title".to_string(), default_title.into());
        if let Some(project) = self.project {
            params.insert("projects".to_string(), serde_json::json!([project]));
        }
        if let Some(title) = &self.title {
            params.insert("title".to_string(), title.as_str().into());
        }
        if let Some(access) = &self.access {
            params.insert("access".to_string(), access.as_str().into());
        }
        if let Some(description) = &self.description {
            params.insert("description".to_string(), description.as_str().into());
        }
        if let Some(language) = &self.language {
            params.insert("language".to_string(), language.as_str().into());
        }
        if let Some(related_article) = &self.related_article {
            params.insert("related_article".to_string(), related_article.as_str().into());
        }
        if let Some(publish_at) = &self.publish_at {
            params.insert("publish_at".to_string(), publish_at.as_str().into());
        }
        if let Some(published_url) = &self.published_url {
            params.insert("published_url".to_string(), published_url.as_str().into());
        }
        if let Some(source) = &self.source {
            params.insert("source".to_string(), source.as_str().into());
        }
        if let Some(data) = &self.data {
            params.insert("data".to_string(), serde_json::Value::Object(data.clone()));
        }
        if let Some(projects) = &self.projects {
            params.insert("projects".to_string(), serde_json::json!(projects));
        }
        if let Some(force_ocr) = self.force_ocr {
            params.insert("force_ocr".to_string(), force_ocr.into());
        }
        if let Some(delayed_index) = self.delayed_index {
            params.insert("delayed_index".to_string(), delayed_index.into());
        }
        if self.secure {
            warn!("the `secure` parameter is not currently supported and was ignored");
        }
        params
    }
}

/// A file selected for upload during the directory scan.
#[derive(Debug, Clone)]
pub struct UploadItem {
    pub path: PathBuf,
    /// Canonical sniffed extension, with leading dot.
    pub extension: String,
    /// Title derived from the filename, without its extension.
    pub title: String,
    pub batch_index: usize,
}

/// One record from a bulk create response.
#[derive(Debug, Clone)]
pub struct CreatedDocument {
    pub id: i64,
    /// One-time storage target authorizing the direct content upload.
    pub presigned_url: String,
    /// The full record as returned by the API.
    pub record: serde_json::Value,
}

/// The remote operations the pipeline drives. Implemented by
/// [`DocumentCloud`]; tests substitute their own implementation.
#[async_trait]
pub trait DocumentApi: Send + Sync {
    /// Bulk create: one call, an array body, one record per item.
    async fn create_documents(
        &self,
        payload: &[serde_json::Value],
    ) -> Result<Vec<CreatedDocument>>;

    /// Direct storage upload of a file's bytes to a presigned target.
    async fn upload_to_storage(&self, presigned_url: &str, bytes: Vec<u8>) -> Result<()>;

    /// Bulk processing trigger for previously created records.
    async fn process_documents(&self, ids: &[i64]) -> Result<()>;
}

#[async_trait]
impl DocumentApi for DocumentCloud {
    async fn create_documents(
        &self,
        payload: &[serde_json::Value],
    ) -> Result<Vec<CreatedDocument>> {
        let body = serde_json::Value::Array(payload.to_vec());
        let response = self.post_json("documents/", &body).await?;
        let records: Vec<serde_json::Value> = response.json().await?;
        parse_created(records)
    }

    async fn upload_to_storage(&self, presigned_url: &str, bytes: Vec<u8>) -> Result<()> {
        self.anonymous_put(presigned_url, bytes).await
    }

    async fn process_documents(&self, ids: &[i64]) -> Result<()> {
        self.post_json("documents/process/", &serde_json::json!({ "ids": ids }))
            .await?;
        Ok(())
    }
}

/// Extract ids and storage targets from a bulk create response.
fn parse_created(records: Vec<serde_json::Value>) -> Result<Vec<CreatedDocument>> {
    records
        .into_iter()
        .map(|record| {
            let id = record
                .get("id")
                .and_then(|v| v.as_i64())
                .ok_or_else(|| Error::BadResponse("created record missing 'id'".to_string()))?;
            let presigned_url = record
                .get("presigned_url")
                .and_then(|v| v.as_str())
                .ok_or_else(|| {
                    Error::BadResponse("created record missing 'presigned_url'".to_string())
                })?
                .to_string();
            Ok(CreatedDocument {
                id,
                presigned_url,
                record,
            })
        })
        .collect()
}

/// Default title for a document: the final path component without its
/// last extension.
fn title_from_path(path: &Path) -> String {
    path.file_stem()
        .or_else(|| path.file_name())
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_default()
}

/// All regular files under `root`, in discovery order.
fn collect_files(root: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(root) {
        let entry = entry.map_err(std::io::Error::from)?;
        if entry.file_type().is_file() {
            files.push(entry.path().to_path_buf());
        }
    }
    Ok(files)
}

/// Scan a directory into upload items: sniff every file, drop unsupported
/// types, partition survivors into batches of at most [`BULK_LIMIT`].
fn scan_directory(root: &Path) -> Result<Vec<UploadItem>> {
    let mut items = Vec::new();
    for path in collect_files(root)? {
        let Some(extension) = sniff::sniff_extension(&path)? else {
            continue;
        };
        let batch_index = items.len() / BULK_LIMIT;
        items.push(UploadItem {
            title: title_from_path(&path),
            path,
            extension,
            batch_index,
        });
    }
    Ok(items)
}

/// Bulk-upload the supported files under a directory.
pub async fn upload_directory(
    client: &DocumentCloud,
    path: &Path,
    options: &UploadOptions,
    handle_errors: bool,
) -> Result<Vec<Document>> {
    upload_directory_with(client, path, options, handle_errors).await
}

/// The directory pipeline against any [`DocumentApi`] implementation.
pub async fn upload_directory_with(
    api: &dyn DocumentApi,
    path: &Path,
    options: &UploadOptions,
    handle_errors: bool,
) -> Result<Vec<Document>> {
    // Never set the same title for every document.
    let mut options = options.clone();
    options.title = None;

    let items = scan_directory(path)?;
    info!(
        path = %path.display(),
        files = items.len(),
        "upload directory: found files to upload"
    );

    let mut records: Vec<serde_json::Value> = Vec::new();

    for (batch_number, batch) in items.chunks(BULK_LIMIT).enumerate() {
        let batch_number = batch_number + 1;
        info!(batch = batch_number, files = batch.len(), "creating document records");

        let payload: Vec<serde_json::Value> = batch
            .iter()
            .map(|item| {
                let mut params = options.to_params(&item.title);
                params.insert(
                    "original_extension".to_string(),
                    item.extension.trim_start_matches('.').into(),
                );
                serde_json::Value::Object(params)
            })
            .collect();

        let created = match api.create_documents(&payload).await {
            Ok(created) => created,
            Err(e) if handle_errors => {
                warn!(error = %e, batch = batch_number, "skipping batch: create call failed");
                continue;
            }
            Err(e) => return Err(e),
        };

        // From here the records exist server-side; they are returned even
        // if their own storage upload below fails.
        records.extend(created.iter().map(|c| c.record.clone()));

        for (created_doc, item) in created.iter().zip(batch) {
            info!(file = %item.path.display(), "uploading to storage");
            let bytes = std::fs::read(&item.path)?;
            match api.upload_to_storage(&created_doc.presigned_url, bytes).await {
                Ok(()) => {}
                Err(e) if handle_errors => {
                    warn!(
                        error = %e,
                        file = %item.path.display(),
                        "skipping file: storage upload failed"
                    );
                    continue;
                }
                Err(e) => return Err(e),
            }
        }

        let ids: Vec<i64> = created.iter().map(|c| c.id).collect();
        info!(batch = batch_number, "processing the documents");
        match api.process_documents(&ids).await {
            Ok(()) => {}
            Err(e) if handle_errors => {
                // The batch's records stay unprocessed; there is no cleanup.
                warn!(error = %e, batch = batch_number, "skipping batch: process call failed");
                continue;
            }
            Err(e) => return Err(e),
        }
    }

    info!("upload directory complete");

    records
        .into_iter()
        .map(|record| serde_json::from_value(record).map_err(Error::from))
        .collect()
}

/// Upload a single local file.
///
/// Unlike the directory pipeline this path enforces [`MAX_UPLOAD_SIZE`],
/// before any network call.
pub async fn upload_file(
    client: &DocumentCloud,
    path: &Path,
    options: &UploadOptions,
) -> Result<Document> {
    let size = std::fs::metadata(path)?.len();
    if size >= MAX_UPLOAD_SIZE {
        return Err(Error::FileTooLarge {
            path: path.to_path_buf(),
            size,
        });
    }

    // force_ocr goes to the process call, not the create parameters.
    let mut options = options.clone();
    let force_ocr = options.force_ocr.take().unwrap_or(false);

    let params = serde_json::Value::Object(options.to_params(&title_from_path(path)));
    let response = client.post_json("documents/", &params).await?;
    let record: serde_json::Value = response.json().await?;

    let presigned_url = record
        .get("presigned_url")
        .and_then(|v| v.as_str())
        .ok_or_else(|| Error::BadResponse("created record missing 'presigned_url'".to_string()))?
        .to_string();
    let id = record
        .get("id")
        .and_then(|v| v.as_i64())
        .ok_or_else(|| Error::BadResponse("created record missing 'id'".to_string()))?;

    let bytes = std::fs::read(path)?;
    client.anonymous_put(&presigned_url, bytes).await?;

    client
        .post_json(
            &format!("documents/{id}/process/"),
            &serde_json::json!({ "force_ocr": force_ocr }),
        )
        .await?;

    Ok(serde_json::from_value(record)?)
}

/// Upload a document from a publicly accessible URL.
pub async fn upload_url(
    client: &DocumentCloud,
    file_url: &str,
    options: &UploadOptions,
) -> Result<Document> {
    let mut params = options.to_params(&title_from_path(Path::new(file_url)));
    params.insert("file_url".to_string(), file_url.into());
    let response = client
        .post_json("documents/", &serde_json::Value::Object(params))
        .await?;
    let record: serde_json::Value = response.json().await?;
    Ok(serde_json::from_value(record)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_from_path() {
        assert_eq!(title_from_path(Path::new("/tmp/docs/report.pdf")), "report");
        assert_eq!(title_from_path(Path::new("archive.tar.gz")), "archive.tar");
        assert_eq!(title_from_path(Path::new("README")), "README");
    }

    #[test]
    fn test_to_params_defaults_title() {
        let options = UploadOptions::default();
        let params = options.to_params("report");
        assert_eq!(params.get("title").unwrap(), "report");
        assert_eq!(params.len(), 1);
    }

    #[test]
    fn test_to_params_explicit_title_wins() {
        let options = UploadOptions {
            title: Some("Custom".to_string()),
            ..Default::default()
        };
        let params = options.to_params("report");
        assert_eq!(params.get("title").unwrap(), "Custom");
    }

    #[test]
    fn test_to_params_project_becomes_projects_list() {
        let options = UploadOptions {
            project: Some(2),
            access: Some("private".to_string()),
            secure: true,
            ..Default::default()
        };
        let params = options.to_params("test");
        assert_eq!(params.get("projects").unwrap(), &serde_json::json!([2]));
        assert_eq!(params.get("access").unwrap(), "private");
        // `secure` is unsupported and never sent.
        assert!(!params.contains_key("secure"));
    }

    #[test]
    fn test_to_params_projects_overrides_project() {
        let options = UploadOptions {
            project: Some(2),
            projects: Some(vec![5, 6]),
            ..Default::default()
        };
        let params = options.to_params("test");
        assert_eq!(params.get("projects").unwrap(), &serde_json::json!([5, 6]));
    }

    #[test]
    fn test_parse_created() {
        let created = parse_created(vec![serde_json::json!({
            "id": 9,
            "presigned_url": "https://storage.example.com/9",
            "title": "nine"
        })])
        .unwrap();
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].id, 9);
        assert_eq!(created[0].presigned_url, "https://storage.example.com/9");
    }

    #[test]
    fn test_parse_created_missing_presigned_url() {
        let err = parse_created(vec![serde_json::json!({"id": 9})]).unwrap_err();
        assert!(matches!(err, Error::BadResponse(_)));
    }

    #[test]
    fn test_scan_directory_batches_and_filters() {
        let dir = tempfile::tempdir().unwrap();
        for i in 0..BULK_LIMIT + 3 {
            std::fs::write(dir.path().join(format!("note-{i:03}.txt")), b"some notes\n")
                .unwrap();
        }
        // Unsupported content is silently excluded.
        std::fs::write(dir.path().join("image.png"), b"\x89PNG\r\n\x1a\n\x00\x00").unwrap();

        let items = scan_directory(dir.path()).unwrap();
        assert_eq!(items.len(), BULK_LIMIT + 3);
        assert!(items.iter().all(|item| item.extension == ".txt"));
        assert!(items.iter().all(|item| !item.title.starts_with("image")));
        assert_eq!(items.iter().filter(|i| i.batch_index == 0).count(), BULK_LIMIT);
        assert_eq!(items.iter().filter(|i| i.batch_index == 1).count(), 3);
    }
}
