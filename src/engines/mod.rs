// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

pub mod auxiliary;
pub mod content_analysis;
pub mod fingerprint;
pub mod probe_engine;
pub mod tls_inspector;
pub mod traits;
