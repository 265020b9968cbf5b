// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use thiserror::Error;

/// 存储错误类型
#[derive(Error, Debug)]
pub enum StorageError {
    /// 底层文件系统 IO 错误
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// 其他存储错误（如未知的存储后端类型）
    #[error("Storage error: {0}")]
    Other(String),
}

/// 诊断产物存储接口
///
/// HTML 片段、失败截图与抓取检查点都走这套接口，
/// 键形如 `naukri/backend-engineer_p3_c12.html`
#[async_trait]
pub trait StorageRepository: Send + Sync {
    /// 按键写入一份产物，键中的目录层级按需创建
    async fn save(&self, key: &str, data: &[u8]) -> Result<(), StorageError>;

    /// 读取指定键的内容，键不存在时返回 `None`
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError>;

    /// 删除指定键，键不存在视为成功
    async fn delete(&self, key: &str) -> Result<(), StorageError>;

    /// 判断指定键是否存在
    async fn exists(&self, key: &str) -> Result<bool, StorageError>;
}
