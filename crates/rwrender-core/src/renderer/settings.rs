// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Tunables for the renderer, loadable from JSON.

use crate::renderer::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A collection of settings that affect how the renderer talks to its backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererSettings {
    /// Skip the scene uniform upload when the scene buffer is still bound and
    /// its content has not changed since the last upload.
    pub elide_redundant_scene_uploads: bool,
    /// Emit backend debug markers around profiling scopes.
    pub debug_markers: bool,
    /// Texture units past this count are ignored by draws.
    pub max_texture_units: u32,
    /// Uniform block binding point of the scene data.
    pub scene_block_binding: u32,
    /// Uniform block binding point of the per-object data.
    pub object_block_binding: u32,
}

impl Default for RendererSettings {
    fn default() -> Self {
        Self {
            elide_redundant_scene_uploads: false,
            debug_markers: true,
            max_texture_units: 16,
            scene_block_binding: 1,
            object_block_binding: 2,
        }
    }
}

impl RendererSettings {
    /// Parses settings from a JSON document. Missing fields take their default value.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads and parses a JSON settings file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let settings = Self::from_json_str(&json)?;
        log::debug!("Loaded renderer settings from '{}'", path.display());
        Ok(settings)
    }
}
