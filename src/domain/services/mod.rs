// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 职位摄入服务
pub mod ingestion_service;
/// 职位活性判定
pub mod liveness;
