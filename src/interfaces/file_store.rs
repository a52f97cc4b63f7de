use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::types::ids::FileId;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Bucket {
    PaymentProofs,
}

impl Bucket {
    pub fn as_str(&self) -> &'static str {
        match self {
            Bucket::PaymentProofs => "payment_proofs",
        }
    }
}

/// Blob storage for proof-of-payment attachments. File identity is opaque
/// metadata; content is never inspected.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FileStore: Send + Sync {
    async fn create_file(&self, bucket: Bucket, bytes: Vec<u8>) -> Result<FileId>;
    fn file_view_url(&self, bucket: Bucket, file_id: FileId) -> String;
    fn file_download_url(&self, bucket: Bucket, file_id: FileId) -> String;
}
