use std::sync::Arc;

use chrono::Utc;
use tokio::task::JoinSet;
use tracing::{debug, info};

use crate::core::config::StorageDefaults;
use crate::core::error::{AppError, Result};
use crate::features::lfs::dtos::{
    BatchResponseDto, BatchResponseObjectDto, ObjectRefDto, Operation, SignedActionDto,
};
use crate::modules::storage::{Presigner, StorageConfig, UrlSigner};

/// Service turning batch requests into presigned transfer actions
pub struct BatchService {
    defaults: StorageDefaults,
}

impl BatchService {
    pub fn new(defaults: StorageDefaults) -> Self {
        Self { defaults }
    }

    pub fn defaults(&self) -> &StorageDefaults {
        &self.defaults
    }

    /// Sign every object of one batch request with its own storage configuration
    pub async fn sign_batch(
        &self,
        config: StorageConfig,
        bucket: &str,
        operation: Operation,
        objects: Vec<ObjectRefDto>,
    ) -> Result<BatchResponseDto> {
        let expires_in = config.expiry.unwrap_or(self.defaults.expires_in_secs);
        let presigner = Presigner::new(
            &config,
            bucket,
            self.defaults.signature_expiry_secs,
            Utc::now(),
        )?;

        info!(
            "Signing batch: operation={:?}, objects={}, bucket={}",
            operation,
            objects.len(),
            bucket
        );

        build_batch_response(Arc::new(presigner), operation, objects, expires_in).await
    }
}

/// Fan the objects out to signing tasks and reassemble them in input order.
///
/// Any failed signature fails the whole batch; remaining tasks are aborted
/// when the join set is dropped.
pub async fn build_batch_response<S>(
    signer: Arc<S>,
    operation: Operation,
    objects: Vec<ObjectRefDto>,
    expires_in: u32,
) -> Result<BatchResponseDto>
where
    S: UrlSigner + 'static,
{
    let method = operation.method();
    let count = objects.len();
    let mut tasks = JoinSet::new();

    for (index, object) in objects.into_iter().enumerate() {
        let signer = Arc::clone(&signer);
        tasks.spawn(async move {
            let href = signer.sign(&object.oid, method)?;
            debug!("Signed {} for object {}", method.as_str(), object.oid);
            Ok::<_, AppError>((index, object, href))
        });
    }

    let mut slots: Vec<Option<BatchResponseObjectDto>> = vec![None; count];
    while let Some(joined) = tasks.join_next().await {
        let (index, object, href) = joined
            .map_err(|e| AppError::Signing(format!("Signing task failed: {}", e)))??;
        slots[index] = Some(BatchResponseObjectDto::signed(
            object,
            operation,
            SignedActionDto { href, expires_in },
        ));
    }

    let objects = slots
        .into_iter()
        .collect::<Option<Vec<_>>>()
        .ok_or_else(|| AppError::Signing("Signing task produced no result".to_string()))?;

    Ok(BatchResponseDto::basic(objects))
}
