// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Engine-side configuration.
//
// Settings that are not carried by individual boundary calls. The original
// engine keeps these in its preference store; here they travel with the
// platform from construction time.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Persistent engine settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformConfig {
    /// Connection-type descriptor handed to the permission callback when the
    /// engine asks whether a subscription download may proceed. `None` means
    /// the embedder never restricted connectivity.
    pub allowed_connection_type: Option<String>,
    /// Storage root used when construction does not override it.
    pub base_path: Option<PathBuf>,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            allowed_connection_type: None,
            base_path: None,
        }
    }
}

impl PlatformConfig {
    /// Load settings from a JSON file, falling back to defaults when the
    /// file does not exist yet.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Persist settings as JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let raw = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), raw)?;
        Ok(())
    }
}
