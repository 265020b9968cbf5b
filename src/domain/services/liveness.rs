// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 判定为已关闭的页面特征短语，全部小写匹配
const CLOSED_PHRASES: [&str; 4] = [
    "job not found",
    "application closed",
    "404",
    "no longer accepting applications",
];

/// 活性判定结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LivenessVerdict {
    /// 职位仍然有效
    Live,
    /// 职位已关闭，附命中的特征短语
    Closed(String),
}

/// 根据详情页文本判定职位是否仍然有效
///
/// 命中任一关闭特征短语即判定为已关闭；页面能正常打开
/// 且无特征短语则判定为有效。网络失败不在此处处理，
/// 那是瞬态错误，由 worker 的重试逻辑负责。
pub fn classify_liveness(page_text: &str) -> LivenessVerdict {
    let lowered = page_text.to_lowercase();
    for phrase in CLOSED_PHRASES {
        if lowered.contains(phrase) {
            return LivenessVerdict::Closed(phrase.to_string());
        }
    }
    LivenessVerdict::Live
}
