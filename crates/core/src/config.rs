// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Tether Authors

//! Bridge configuration (`<state-dir>/config.json`). Optional; every field
//! has a working default.

use crate::id::ChatId;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgeConfig {
    /// Folder scanned by the launch flow for project checkouts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repos_folder: Option<PathBuf>,
    /// When set, updates from any other chat are dropped before handling.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_chat_id: Option<ChatId>,
}
