// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::checkpoint::ScrapeCheckpoint;
use crate::domain::repositories::storage_repository::{StorageError, StorageRepository};
use std::sync::Arc;
use tracing::warn;

/// 抓取检查点存储
///
/// 检查点以 JSON 形式写入存储仓库，每站点一个键。
/// 损坏的检查点按不存在处理，抓取从头开始而不是报错。
pub struct CheckpointStore {
    storage: Arc<dyn StorageRepository>,
}

impl CheckpointStore {
    pub fn new(storage: Arc<dyn StorageRepository>) -> Self {
        Self { storage }
    }

    fn key(site: &str) -> String {
        format!("checkpoints/{}.json", site)
    }

    /// 读取站点的检查点
    pub async fn load(&self, site: &str) -> Result<Option<ScrapeCheckpoint>, StorageError> {
        let Some(bytes) = self.storage.get(&Self::key(site)).await? else {
            return Ok(None);
        };

        match serde_json::from_slice::<ScrapeCheckpoint>(&bytes) {
            Ok(checkpoint) => Ok(Some(checkpoint)),
            Err(e) => {
                warn!(site, error = %e, "Corrupt checkpoint, restarting from scratch");
                Ok(None)
            }
        }
    }

    /// 持久化检查点，每抓完一页调用一次
    pub async fn save(&self, checkpoint: &ScrapeCheckpoint) -> Result<(), StorageError> {
        let bytes = serde_json::to_vec_pretty(checkpoint)
            .map_err(|e| StorageError::Other(format!("Checkpoint serialize failed: {}", e)))?;
        self.storage.save(&Self::key(&checkpoint.site), &bytes).await
    }

    /// 抓取完整结束后清除检查点
    pub async fn clear(&self, site: &str) -> Result<(), StorageError> {
        self.storage.delete(&Self::key(site)).await
    }
}
