// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

pub mod helpers;
pub mod ingestion_test;
pub mod queue_test;
pub mod retention_test;
pub mod verification_flow_test;
