use serde::Deserialize;

/// S3-compatible object storage holding the video assets. `bucket` may be
/// left empty when the bucket is already part of a virtual-hosted
/// endpoint.
#[derive(Deserialize, Debug, Clone)]
pub struct StorageConfig {
    pub endpoint: String,
    pub region: String,
    #[serde(default)]
    pub bucket: String,
    pub access_key: String,
    pub secret_key: String,
}
