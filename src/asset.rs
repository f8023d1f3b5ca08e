//! Asset accessor resolution and URL synthesis.
//!
//! A document has a family of derived assets (full text, per-page text,
//! page-position metadata, rendered page images, the original PDF). Callers
//! name the asset they want with a single accessor string, e.g.
//! `"full_text"`, `"get_pdf_url"`, or `"small_image_url_list"`, and the
//! parser maps that name to exactly one [`AssetRequest`] or fails.
//!
//! # Grammar
//!
//! Accessor names are case-sensitive, `_`-separated:
//!
//! * an optional leading `get_` marker (stripped; purely a spelling
//!   convenience),
//! * a core name: `full_text`, `page_text`, `page_position_json`,
//!   `json_text`, `pdf`, or `{size}_image` with size one of `thumbnail`,
//!   `small`, `normal`, `large`,
//! * an optional trailing `_url` — present means the caller wants the URL
//!   itself, absent means they want the content fetched and decoded,
//! * for images, an optional trailing `_list` to get one URL per page.
//!
//! # Resolution precedence
//!
//! Applied in this exact order:
//!
//! 1. Exact match against the fixed accessor names.
//! 2. If the name lacks `get_`, resolve `get_<name>` and delegate.
//! 3. If the name lacks `_url`, resolve `<name>_url` and mark the result
//!    as fetch-and-decode; the decode format comes from the suffix of the
//!    name at this step (`_json`/`_json_text` → JSON, `_text` → UTF-8
//!    text, anything else → raw bytes).
//! 4. Generic image pattern `get_{size}_image_url[_list]`.
//! 5. Otherwise: unknown asset attribute.
//!
//! This module is pure — URL synthesis happens here, fetching lives in
//! [`crate::fetch`].

use crate::error::{Error, Result};

/// Rendered image sizes offered by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSize {
    Thumbnail,
    Small,
    Normal,
    Large,
}

impl ImageSize {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageSize::Thumbnail => "thumbnail",
            ImageSize::Small => "small",
            ImageSize::Normal => "normal",
            ImageSize::Large => "large",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        match name {
            "thumbnail" => Some(ImageSize::Thumbnail),
            "small" => Some(ImageSize::Small),
            "normal" => Some(ImageSize::Normal),
            "large" => Some(ImageSize::Large),
            _ => None,
        }
    }
}

/// The kind of derived asset being addressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    FullText,
    PageText,
    JsonText,
    Pdf,
    Image,
    PagePositionJson,
}

/// How fetched content should be decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetFormat {
    RawBytes,
    Text,
    Json,
}

/// A parsed asset accessor: what to build, and whether the caller wants
/// the URL or the content behind it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssetRequest {
    pub kind: AssetKind,
    /// Decode format when fetching content; unused for URL requests.
    pub format: AssetFormat,
    /// Image size; set only for `kind == Image`.
    pub size: Option<ImageSize>,
    /// One URL per page instead of a single URL.
    pub list: bool,
    /// `true` — resolve to the URL itself; `false` — fetch and decode.
    pub want_url: bool,
}

/// The identity fields needed to synthesize asset URLs for a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentIdentity {
    pub id: i64,
    pub slug: String,
    /// Asset base URL, with a trailing slash.
    pub asset_url: String,
    pub page_count: i64,
}

/// What an accessor ultimately resolves to.
#[derive(Debug, Clone, PartialEq)]
pub enum AssetValue {
    Url(String),
    UrlList(Vec<String>),
    Bytes(Vec<u8>),
    Text(String),
    Json(serde_json::Value),
}

/// Parse an accessor name into an [`AssetRequest`].
///
/// Resolution is total: every input maps to exactly one request or to
/// [`Error::UnknownAsset`] — never two interpretations.
pub fn parse_accessor(name: &str) -> Result<AssetRequest> {
    // 1. Exact match against a fixed accessor name.
    if let Some(kind) = exact_accessor(name) {
        return Ok(AssetRequest {
            kind,
            format: format_for(name),
            size: None,
            list: false,
            want_url: true,
        });
    }

    // 2. Property-style spelling: delegate to the `get_`-prefixed form.
    if !name.starts_with("get_") {
        if let Ok(request) = parse_accessor(&format!("get_{name}")) {
            return Ok(request);
        }
    }

    // 3. Content spelling: resolve the `_url` form, then flip it to
    //    fetch-and-decode. The format comes from this level's suffix.
    if !name.ends_with("_url") {
        if let Ok(mut request) = parse_accessor(&format!("{name}_url")) {
            request.want_url = false;
            request.format = format_for(name);
            return Ok(request);
        }
    }

    // 4. Generic image pattern: get_{size}_image_url[_list].
    if let Some(request) = parse_image_accessor(name) {
        return Ok(request);
    }

    Err(Error::UnknownAsset(name.to_string()))
}

fn exact_accessor(name: &str) -> Option<AssetKind> {
    match name {
        "get_full_text_url" => Some(AssetKind::FullText),
        "get_page_text_url" => Some(AssetKind::PageText),
        "get_page_position_json_url" => Some(AssetKind::PagePositionJson),
        "get_json_text_url" => Some(AssetKind::JsonText),
        "get_pdf_url" => Some(AssetKind::Pdf),
        _ => None,
    }
}

fn parse_image_accessor(name: &str) -> Option<AssetRequest> {
    let rest = name.strip_prefix("get_")?;
    let (rest, list) = match rest.strip_suffix("_list") {
        Some(r) => (r, true),
        None => (rest, false),
    };
    let rest = rest.strip_suffix("_url")?;
    let size = ImageSize::from_name(rest.strip_suffix("_image")?)?;
    Some(AssetRequest {
        kind: AssetKind::Image,
        format: AssetFormat::RawBytes,
        size: Some(size),
        list,
        want_url: true,
    })
}

/// Decode format implied by an accessor name's suffix.
fn format_for(name: &str) -> AssetFormat {
    if name.ends_with("_json") || name.ends_with("_json_text") {
        AssetFormat::Json
    } else if name.ends_with("_text") {
        AssetFormat::Text
    } else {
        AssetFormat::RawBytes
    }
}

impl AssetRequest {
    /// Build the concrete URL for this request against a document.
    ///
    /// `page` is 1-based and only meaningful for per-page kinds
    /// (`PageText`, `PagePositionJson`, `Image`).
    pub fn url(&self, doc: &DocumentIdentity, page: i64) -> String {
        match self.kind {
            AssetKind::FullText => {
                format!("{}documents/{}/{}.txt", doc.asset_url, doc.id, doc.slug)
            }
            AssetKind::PageText => format!(
                "{}documents/{}/pages/{}-p{}.txt",
                doc.asset_url, doc.id, doc.slug, page
            ),
            AssetKind::JsonText => {
                format!("{}documents/{}/{}.txt.json", doc.asset_url, doc.id, doc.slug)
            }
            AssetKind::Pdf => {
                format!("{}documents/{}/{}.pdf", doc.asset_url, doc.id, doc.slug)
            }
            AssetKind::Image => {
                let size = self.size.unwrap_or(ImageSize::Normal);
                format!(
                    "{}documents/{}/pages/{}-p{}-{}.gif",
                    doc.asset_url,
                    doc.id,
                    doc.slug,
                    page,
                    size.as_str()
                )
            }
            AssetKind::PagePositionJson => format!(
                "{}documents/{}/pages/{}-p{}.position.json",
                doc.asset_url, doc.id, doc.slug, page
            ),
        }
    }

    /// Build one URL per page, ascending from 1 to `page_count`.
    pub fn url_list(&self, doc: &DocumentIdentity) -> Vec<String> {
        (1..=doc.page_count).map(|page| self.url(doc, page)).collect()
    }
}
