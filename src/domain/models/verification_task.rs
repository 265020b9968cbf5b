// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// 验证任务实体
///
/// 表示对一个临期职位的活性检查工作单元。任务具有状态、
/// 重试计数与锁定机制，由验证 worker 池消费。
/// 状态转换由任务仓库在数据库内完成：
/// Queued → Active → Completed / Failed(退避重试) / DeadLettered
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationTask {
    /// 任务唯一标识符
    pub id: Uuid,
    /// 关联职位ID
    pub job_id: i32,
    /// 职位详情页URL
    pub job_url: String,
    /// 任务状态
    pub status: VerificationStatus,
    /// 已尝试次数
    pub attempt_count: i32,
    /// 最大重试次数
    pub max_retries: i32,
    /// 计划执行时间，重试退避通过该字段推迟
    pub scheduled_at: Option<DateTime<Utc>>,
    /// 入队时间
    pub enqueued_at: DateTime<Utc>,
    /// 开始执行时间
    pub started_at: Option<DateTime<Utc>>,
    /// 完成时间
    pub completed_at: Option<DateTime<Utc>>,
    /// 最后一次错误信息
    pub last_error: Option<String>,
    /// 锁定令牌
    pub lock_token: Option<Uuid>,
    /// 锁定过期时间
    pub lock_expires_at: Option<DateTime<Utc>>,
    /// 创建时间
    pub created_at: DateTime<Utc>,
    /// 更新时间
    pub updated_at: DateTime<Utc>,
}

/// 验证任务状态枚举
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    /// 已入队，等待 worker 领取
    #[default]
    Queued,
    /// 活跃中，已被 worker 锁定执行
    Active,
    /// 已完成，得出确定结论（职位活跃或已关闭）
    Completed,
    /// 已失败，当前尝试出错，等待重试调度
    Failed,
    /// 死信，重试耗尽仍无结论
    DeadLettered,
}

impl fmt::Display for VerificationStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            VerificationStatus::Queued => write!(f, "queued"),
            VerificationStatus::Active => write!(f, "active"),
            VerificationStatus::Completed => write!(f, "completed"),
            VerificationStatus::Failed => write!(f, "failed"),
            VerificationStatus::DeadLettered => write!(f, "dead_lettered"),
        }
    }
}

impl FromStr for VerificationStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "queued" => Ok(VerificationStatus::Queued),
            "active" => Ok(VerificationStatus::Active),
            "completed" => Ok(VerificationStatus::Completed),
            "failed" => Ok(VerificationStatus::Failed),
            "dead_lettered" => Ok(VerificationStatus::DeadLettered),
            _ => Err(()),
        }
    }
}

impl VerificationTask {
    /// 创建一个新的验证任务
    pub fn new(job_id: i32, job_url: String, max_retries: i32) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            job_id,
            job_url,
            status: VerificationStatus::Queued,
            attempt_count: 0,
            max_retries,
            scheduled_at: None,
            enqueued_at: now,
            started_at: None,
            completed_at: None,
            last_error: None,
            lock_token: None,
            lock_expires_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// 判断任务是否还能重试
    pub fn can_retry(&self) -> bool {
        self.attempt_count < self.max_retries
    }
}
