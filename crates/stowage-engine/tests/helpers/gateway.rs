use async_trait::async_trait;
use bytes::Bytes;
use futures::FutureExt;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use stowage_core::stream::collect_body;
use stowage_storage::{
    body_channel, DeleteParams, DeleteReceipt, PendingUpload, StorageBackend, StorageError,
    StorageResult, UploadGateway, UploadParams, UploadReceipt,
};

/// In-memory gateway recording every upload and delete.
#[derive(Default)]
pub struct MemoryGateway {
    /// Keys in the order `begin_upload` was called
    pub begun: Mutex<Vec<String>>,
    /// Stored bodies by key
    pub objects: Arc<Mutex<HashMap<String, Bytes>>>,
    /// Keys in the order `remove` was called
    pub deleted: Mutex<Vec<String>>,
    failing: HashSet<String>,
    failing_deletes: HashSet<String>,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject the upload of `key` after its body has been read.
    pub fn failing_upload(mut self, key: &str) -> Self {
        self.failing.insert(key.to_string());
        self
    }

    pub fn failing_delete(mut self, key: &str) -> Self {
        self.failing_deletes.insert(key.to_string());
        self
    }

    pub fn begun_keys(&self) -> Vec<String> {
        self.begun.lock().unwrap().clone()
    }

    pub fn deleted_keys(&self) -> Vec<String> {
        self.deleted.lock().unwrap().clone()
    }

    pub fn object(&self, key: &str) -> Option<Bytes> {
        self.objects.lock().unwrap().get(key).cloned()
    }
}

#[async_trait]
impl UploadGateway for MemoryGateway {
    fn begin_upload(&self, params: UploadParams) -> StorageResult<PendingUpload> {
        params.validate()?;
        self.begun.lock().unwrap().push(params.key.clone());

        let (writer, body) = body_channel(2);
        let objects = Arc::clone(&self.objects);
        let fail = self.failing.contains(&params.key);
        let completion = async move {
            let data = collect_body(body).await.map_err(StorageError::Body)?;
            if fail {
                return Err(StorageError::UploadFailed(format!(
                    "access denied for {}",
                    params.key
                )));
            }
            let e_tag = format!("\"etag-{}\"", data.len());
            objects.lock().unwrap().insert(params.key.clone(), data);
            Ok(UploadReceipt {
                location: format!("https://s3.test/{}/{}", params.bucket, params.key),
                e_tag,
            })
        }
        .boxed();

        Ok(PendingUpload { writer, completion })
    }

    async fn remove(&self, params: DeleteParams) -> StorageResult<DeleteReceipt> {
        params.validate()?;
        self.deleted.lock().unwrap().push(params.key.clone());
        if self.failing_deletes.contains(&params.key) {
            return Err(StorageError::DeleteFailed(params.key));
        }
        let existed = self.objects.lock().unwrap().remove(&params.key).is_some();
        Ok(DeleteReceipt {
            key: params.key,
            deleted: existed,
        })
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}
