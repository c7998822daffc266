use crate::api::STATIC_PREFIX;
use crate::storage::StoragePath;
use serde::{Deserialize, Serialize};
use url::Url;
use utoipa::ToSchema;

/// Response body for a successful upload
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UploadResponse {
    /// Filename as declared by the client
    #[schema(example = "cat.png")]
    pub name: String,
    /// Absolute URL the stored file is served from
    #[schema(
        example = "https://img.example.com/static/ba7/816/bf8/f01/ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad.png"
    )]
    pub url: String,
}

impl UploadResponse {
    pub fn new(name: String, domain: &Url, path: &StoragePath) -> Self {
        Self {
            name,
            url: public_url(domain, path).to_string(),
        }
    }
}

/// Public URL of a stored file.
///
/// Any path already on `domain` is kept as a prefix, so `https://host/images` yields
/// `https://host/images/static/<shards>/<file>`. Query and fragment are dropped.
pub fn public_url(domain: &Url, path: &StoragePath) -> Url {
    let mut url = domain.clone();
    let base = domain.path().trim_end_matches('/');
    url.set_path(&format!("{base}/{STATIC_PREFIX}/{}", path.url_path()));
    url.set_query(None);
    url.set_fragment(None);
    url
}
