//! Documents: the record type, asset accessor dispatch, and the documents
//! API surface.
//!
//! [`Document`] is the service's document record. Its derived assets are
//! reached two ways:
//!
//! * typed getters (`get_pdf_url`, `get_image_url`, …) for static call
//!   sites;
//! * [`Document::resolve_asset`] for accessor-name-driven dispatch — the
//!   name grammar from [`crate::asset`] resolves to a URL, a URL list, or
//!   fetched content.
//!
//! [`DocumentClient`] groups the remote operations: fetch by id, the
//! upload paths, and processing triggers.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::asset::{parse_accessor, AssetValue, DocumentIdentity, ImageSize};
use crate::client::DocumentCloud;
use crate::error::{Error, Result};
use crate::fetch;
use crate::models::{Mention, Organization, RemoteRef, User};
use crate::upload::{self, UploadOptions};

/// A single DocumentCloud document.
#[derive(Debug, Clone, Deserialize)]
pub struct Document {
    pub id: i64,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub access: Option<String>,
    /// Base URL for this document's derived assets, with trailing slash.
    #[serde(default)]
    pub asset_url: String,
    #[serde(default)]
    pub canonical_url: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub data: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub page_count: i64,
    #[serde(default)]
    pub page_spec: Option<String>,
    #[serde(default)]
    pub projects: Vec<i64>,
    #[serde(default)]
    pub related_article: Option<String>,
    #[serde(default)]
    pub publish_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub published_url: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    /// Bare id on plain fetches; embedded object with `expand=user`.
    #[serde(default)]
    pub user: Option<RemoteRef<User>>,
    #[serde(default)]
    pub organization: Option<RemoteRef<Organization>>,
    /// Search-highlight mapping: page label → ordered snippets. Present
    /// only on documents returned from a highlighted search.
    #[serde(default)]
    pub highlights: Option<serde_json::Map<String, serde_json::Value>>,
}

impl Document {
    /// The identity fields asset URL synthesis needs.
    pub fn identity(&self) -> DocumentIdentity {
        DocumentIdentity {
            id: self.id,
            slug: self.slug.clone(),
            asset_url: self.asset_url.clone(),
            page_count: self.page_count,
        }
    }

    /// Alias for `page_count`.
    pub fn pages(&self) -> i64 {
        self.page_count
    }

    /// Mentions derived from the highlight mapping, in its iteration
    /// order. Empty when the document carries no highlights.
    pub fn mentions(&self) -> Vec<Mention> {
        let Some(highlights) = &self.highlights else {
            return Vec::new();
        };
        let mut mentions = Vec::new();
        for (page, snippets) in highlights {
            if let serde_json::Value::Array(snippets) = snippets {
                for snippet in snippets {
                    if let serde_json::Value::String(text) = snippet {
                        mentions.push(Mention::new(page, text));
                    }
                }
            }
        }
        mentions
    }

    // ============ Asset accessor dispatch ============

    /// Resolve an accessor name against this document.
    ///
    /// `_url` spellings resolve locally to [`AssetValue::Url`] or
    /// [`AssetValue::UrlList`]; content spellings fetch the URL and decode
    /// per the name's format. Per-page assets use page 1; pass an explicit
    /// page via [`Document::resolve_asset_page`].
    pub async fn resolve_asset(&self, client: &DocumentCloud, name: &str) -> Result<AssetValue> {
        self.resolve_asset_page(client, name, 1).await
    }

    /// [`Document::resolve_asset`] with an explicit 1-based page.
    pub async fn resolve_asset_page(
        &self,
        client: &DocumentCloud,
        name: &str,
        page: i64,
    ) -> Result<AssetValue> {
        let request = parse_accessor(name)?;
        let doc = self.identity();
        if request.want_url {
            if request.list {
                return Ok(AssetValue::UrlList(request.url_list(&doc)));
            }
            return Ok(AssetValue::Url(request.url(&doc, page)));
        }
        let url = request.url(&doc, page);
        fetch::fetch_asset(client, &url, request.format).await
    }

    // ============ Typed asset URL getters ============

    pub fn get_full_text_url(&self) -> String {
        format!("{}documents/{}/{}.txt", self.asset_url, self.id, self.slug)
    }

    pub fn get_page_text_url(&self, page: i64) -> String {
        format!(
            "{}documents/{}/pages/{}-p{}.txt",
            self.asset_url, self.id, self.slug, page
        )
    }

    pub fn get_page_position_json_url(&self, page: i64) -> String {
        format!(
            "{}documents/{}/pages/{}-p{}.position.json",
            self.asset_url, self.id, self.slug, page
        )
    }

    pub fn get_json_text_url(&self) -> String {
        format!("{}documents/{}/{}.txt.json", self.asset_url, self.id, self.slug)
    }

    pub fn get_pdf_url(&self) -> String {
        format!("{}documents/{}/{}.pdf", self.asset_url, self.id, self.slug)
    }

    pub fn get_image_url(&self, page: i64, size: ImageSize) -> String {
        format!(
            "{}documents/{}/pages/{}-p{}-{}.gif",
            self.asset_url,
            self.id,
            self.slug,
            page,
            size.as_str()
        )
    }

    pub fn get_image_url_list(&self, size: ImageSize) -> Vec<String> {
        (1..=self.page_count)
            .map(|page| self.get_image_url(page, size))
            .collect()
    }

    // ============ Related objects ============

    pub fn user_id(&self) -> Option<i64> {
        match &self.user {
            Some(RemoteRef::Unresolved(id)) => Some(*id),
            Some(RemoteRef::Resolved(user)) => Some(user.id),
            None => None,
        }
    }

    pub fn organization_id(&self) -> Option<i64> {
        match &self.organization {
            Some(RemoteRef::Unresolved(id)) => Some(*id),
            Some(RemoteRef::Resolved(org)) => Some(org.id),
            None => None,
        }
    }

    /// The owning user, fetching and caching it on first access.
    pub async fn user(&mut self, client: &DocumentCloud) -> Result<&User> {
        let pending = match &self.user {
            Some(RemoteRef::Unresolved(id)) => Some(*id),
            Some(RemoteRef::Resolved(_)) => None,
            None => {
                return Err(Error::BadResponse(
                    "document carries no user reference".to_string(),
                ))
            }
        };
        if let Some(id) = pending {
            let user: User = client.get_json(&format!("users/{id}/")).await?;
            self.user = Some(RemoteRef::Resolved(user));
        }
        match &self.user {
            Some(RemoteRef::Resolved(user)) => Ok(user),
            _ => Err(Error::BadResponse("user reference not resolved".to_string())),
        }
    }

    /// The owning organization, fetching and caching it on first access.
    pub async fn organization(&mut self, client: &DocumentCloud) -> Result<&Organization> {
        let pending = match &self.organization {
            Some(RemoteRef::Unresolved(id)) => Some(*id),
            Some(RemoteRef::Resolved(_)) => None,
            None => {
                return Err(Error::BadResponse(
                    "document carries no organization reference".to_string(),
                ))
            }
        };
        if let Some(id) = pending {
            let org: Organization = client.get_json(&format!("organizations/{id}/")).await?;
            self.organization = Some(RemoteRef::Resolved(org));
        }
        match &self.organization {
            Some(RemoteRef::Resolved(org)) => Ok(org),
            _ => Err(Error::BadResponse(
                "organization reference not resolved".to_string(),
            )),
        }
    }

    pub async fn contributor(&mut self, client: &DocumentCloud) -> Result<String> {
        Ok(self.user(client).await?.name.clone())
    }

    pub async fn contributor_organization(&mut self, client: &DocumentCloud) -> Result<String> {
        Ok(self.organization(client).await?.name.clone())
    }

    pub async fn contributor_organization_slug(
        &mut self,
        client: &DocumentCloud,
    ) -> Result<String> {
        Ok(self.organization(client).await?.slug.clone())
    }

    /// Trigger reprocessing of this document.
    pub async fn process(&self, client: &DocumentCloud) -> Result<()> {
        client
            .post_json(&format!("documents/{}/process/", self.id), &serde_json::json!({}))
            .await?;
        Ok(())
    }
}

/// Client for the documents API.
pub struct DocumentClient<'a> {
    client: &'a DocumentCloud,
}

impl<'a> DocumentClient<'a> {
    pub(crate) fn new(client: &'a DocumentCloud) -> Self {
        Self { client }
    }

    /// Fetch a document by id.
    pub async fn get(&self, id: i64) -> Result<Document> {
        self.client.get_json(&format!("documents/{id}/")).await
    }

    /// Upload a single local file. Enforces the 500MB size cap before any
    /// network call; the directory pipeline does not.
    pub async fn upload(&self, path: &Path, options: &UploadOptions) -> Result<Document> {
        upload::upload_file(self.client, path, options).await
    }

    /// Upload a document from a publicly accessible URL.
    pub async fn upload_url(&self, file_url: &str, options: &UploadOptions) -> Result<Document> {
        upload::upload_url(self.client, file_url, options).await
    }

    /// Bulk-upload the supported files under a directory. See
    /// [`crate::upload::upload_directory`] for the batching and failure
    /// policy.
    pub async fn upload_directory(
        &self,
        path: &Path,
        options: &UploadOptions,
        handle_errors: bool,
    ) -> Result<Vec<Document>> {
        upload::upload_directory(self.client, path, options, handle_errors).await
    }

    /// Trigger processing of a single document.
    pub async fn process(&self, id: i64, force_ocr: bool) -> Result<()> {
        self.client
            .post_json(
                &format!("documents/{id}/process/"),
                &serde_json::json!({ "force_ocr": force_ocr }),
            )
            .await?;
        Ok(())
    }

    /// Trigger processing of many documents in one call.
    pub async fn process_many(&self, ids: &[i64]) -> Result<()> {
        self.client
            .post_json("documents/process/", &serde_json::json!({ "ids": ids }))
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;

    fn fixture() -> Document {
        serde_json::from_value(serde_json::json!({
            "id": 100,
            "slug": "the-slug",
            "title": "The Document",
            "access": "public",
            "asset_url": "https://assets.documentcloud.org/",
            "page_count": 3,
            "user": 7,
            "organization": {"id": 4, "name": "MuckRock", "slug": "muckrock"},
            "created_at": "2024-05-01T12:00:00Z",
            "updated_at": "2024-05-02T12:00:00Z"
        }))
        .unwrap()
    }

    fn client() -> DocumentCloud {
        DocumentCloud::new(ClientConfig::default()).unwrap()
    }

    #[test]
    fn test_deserialize_mixed_references() {
        let doc = fixture();
        assert_eq!(doc.user_id(), Some(7));
        assert!(doc.user.as_ref().unwrap().resolved().is_none());
        assert_eq!(doc.organization_id(), Some(4));
        let org = doc.organization.as_ref().unwrap().resolved().unwrap();
        assert_eq!(org.slug, "muckrock");
        assert!(doc.created_at.is_some());
    }

    #[test]
    fn test_typed_getters_match_templates() {
        let doc = fixture();
        assert_eq!(
            doc.get_full_text_url(),
            "https://assets.documentcloud.org/documents/100/the-slug.txt"
        );
        assert_eq!(
            doc.get_page_text_url(2),
            "https://assets.documentcloud.org/documents/100/pages/the-slug-p2.txt"
        );
        assert_eq!(
            doc.get_image_url(1, ImageSize::Thumbnail),
            "https://assets.documentcloud.org/documents/100/pages/the-slug-p1-thumbnail.gif"
        );
        assert_eq!(doc.get_image_url_list(ImageSize::Large).len(), 3);
    }

    #[tokio::test]
    async fn test_resolve_asset_url_spellings_agree() {
        let doc = fixture();
        let c = client();
        let a = doc.resolve_asset(&c, "full_text_url").await.unwrap();
        let b = doc.resolve_asset(&c, "get_full_text_url").await.unwrap();
        assert_eq!(a, b);
        assert_eq!(a, AssetValue::Url(doc.get_full_text_url()));
    }

    #[tokio::test]
    async fn test_resolve_asset_image_list() {
        let doc = fixture();
        let c = client();
        let value = doc.resolve_asset(&c, "small_image_url_list").await.unwrap();
        match value {
            AssetValue::UrlList(urls) => {
                assert_eq!(urls.len(), 3);
                assert!(urls[0].ends_with("the-slug-p1-small.gif"));
                assert!(urls[2].ends_with("the-slug-p3-small.gif"));
            }
            other => panic!("expected a URL list, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_resolve_asset_unknown_name() {
        let doc = fixture();
        let c = client();
        let err = doc.resolve_asset(&c, "bogus_field").await.unwrap_err();
        assert!(matches!(err, Error::UnknownAsset(_)));
    }

    #[test]
    fn test_mentions_ordered_and_stripped() {
        let mut doc = fixture();
        doc.highlights = serde_json::from_value(serde_json::json!({
            "page_no_3": ["<em>x</em> y"],
            "page_no_1": ["first", "second"]
        }))
        .unwrap();
        let mentions = doc.mentions();
        assert_eq!(mentions.len(), 3);
        assert_eq!(mentions[0], Mention::new("page_no_3", "<em>x</em> y"));
        assert_eq!(mentions[0].page, "3");
        assert_eq!(mentions[1].page, "1");
        assert_eq!(mentions[2].text, "second");
    }

    #[test]
    fn test_no_highlights_means_no_mentions() {
        let doc = fixture();
        assert!(doc.mentions().is_empty());
    }
}
