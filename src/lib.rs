//! # documentcloud
//!
//! A Rust client for the DocumentCloud document-processing API.
//!
//! The crate wraps the service's REST surface with two subsystems doing
//! the interesting work:
//!
//! ```text
//! ┌────────────┐   ┌───────────┐   ┌─────────────────────┐
//! │  accessor  │──▶│  asset    │──▶│  fetch (auth'd or   │
//! │  name      │   │  URL(s)   │   │  anonymous session) │
//! └────────────┘   └───────────┘   └─────────────────────┘
//!
//! ┌──────┐   ┌───────────────┐   ┌─────────┐   ┌──────────────────────┐
//! │ walk │──▶│ sniff + allow │──▶│ batches │──▶│ create ▶ put ▶ process│
//! └──────┘   └───────────────┘   └─────────┘   └──────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use documentcloud::{ClientConfig, DocumentCloud, UploadOptions};
//!
//! # async fn run() -> documentcloud::Result<()> {
//! let client = DocumentCloud::new(ClientConfig::from_env())?;
//!
//! // Bulk-upload a directory, skipping batches that fail.
//! let options = UploadOptions { project: Some(42), ..Default::default() };
//! let docs = client
//!     .documents()
//!     .upload_directory("./filings".as_ref(), &options, true)
//!     .await?;
//!
//! // Read a derived asset by accessor name.
//! let doc = client.documents().get(docs[0].id).await?;
//! let text = doc.resolve_asset(&client, "full_text").await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML/env client configuration |
//! | [`client`] | Long-lived HTTP session with bounded retries |
//! | [`asset`] | Accessor-name parsing and asset URL synthesis |
//! | [`fetch`] | Asset content fetching and decoding |
//! | [`sniff`] | Byte-level content sniffing and the format allow-list |
//! | [`upload`] | Directory bulk pipeline, single-file and URL uploads |
//! | [`documents`] | The `Document` record and documents API |
//! | [`models`] | Users, organizations, nested references, mentions |
//! | [`error`] | Error taxonomy |

pub mod asset;
pub mod client;
pub mod config;
pub mod documents;
pub mod error;
pub mod fetch;
pub mod models;
pub mod sniff;
pub mod upload;

pub use asset::{AssetFormat, AssetKind, AssetRequest, AssetValue, DocumentIdentity, ImageSize};
pub use client::DocumentCloud;
pub use config::ClientConfig;
pub use documents::{Document, DocumentClient};
pub use error::{Error, Result};
pub use models::{Mention, Organization, RemoteRef, User};
pub use upload::{DocumentApi, UploadOptions, BULK_LIMIT};
