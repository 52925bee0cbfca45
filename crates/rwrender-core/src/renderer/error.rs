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

//! Defines the hierarchy of error types for the rendering subsystem.
//!
//! Backend failures ([`ShaderError`], [`ResourceError`], [`RenderError`]) come from
//! the graphics API. [`UsageError`] reports a contract violation by the calling
//! scene code, such as unbalanced debug groups.

use crate::renderer::api::{AttributeSemantic, BackendTag};
use std::fmt;

/// An error related to the compilation or linking of a shader program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShaderError {
    /// A shader stage failed to compile.
    CompilationError {
        /// The stage that failed (e.g. "vertex").
        stage: String,
        /// Detailed error messages from the shader compiler.
        details: String,
    },
    /// The stages compiled but the program failed to link.
    LinkError {
        /// Detailed error messages from the linker.
        details: String,
    },
    /// The backend could not allocate a shader or program object.
    CreationFailed(String),
}

impl fmt::Display for ShaderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderError::CompilationError { stage, details } => {
                write!(f, "Shader compilation failed for the {stage} stage: {details}")
            }
            ShaderError::LinkError { details } => {
                write!(f, "Shader program link failed: {details}")
            }
            ShaderError::CreationFailed(msg) => {
                write!(f, "Failed to create shader object: {msg}")
            }
        }
    }
}

impl std::error::Error for ShaderError {}

/// An error related to the creation or use of a GPU resource (buffers, programs, etc.).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceError {
    /// No live resource of this backend stands behind the id.
    InvalidHandle(String),
    /// An error originating from the specific graphics backend implementation.
    BackendError(String),
}

impl fmt::Display for ResourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceError::InvalidHandle(what) => write!(f, "No live resource behind {what}"),
            ResourceError::BackendError(msg) => {
                write!(f, "Backend-specific resource error: {msg}")
            }
        }
    }
}

impl std::error::Error for ResourceError {}

/// A misuse of the renderer contract by the calling code.
///
/// These indicate a programming defect: they are logged at error level and
/// returned so tests can assert on them, and the renderer state is left untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UsageError {
    /// `push_debug_group` was called with the stack already at its maximum depth.
    DebugStackOverflow {
        /// Title of the rejected group.
        title: String,
        /// The maximum supported depth.
        max_depth: usize,
    },
    /// `pop_debug_group` was called with no open group.
    DebugStackUnderflow,
    /// The renderer was shut down while debug groups were still open.
    OpenDebugGroups {
        /// Number of groups still open.
        depth: usize,
    },
    /// A uniform was set while no program was bound.
    NoActiveProgram,
    /// A shader handle created by another backend instance was used.
    ForeignHandle {
        /// The tag carried by the handle.
        handle: BackendTag,
        /// The tag of the renderer's backend.
        backend: BackendTag,
    },
}

impl fmt::Display for UsageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UsageError::DebugStackOverflow { title, max_depth } => write!(
                f,
                "Cannot open debug group '{title}': maximum depth of {max_depth} reached"
            ),
            UsageError::DebugStackUnderflow => {
                write!(f, "Cannot close debug group: no group is open")
            }
            UsageError::OpenDebugGroups { depth } => {
                write!(f, "Renderer shut down with {depth} debug group(s) still open")
            }
            UsageError::NoActiveProgram => {
                write!(f, "Cannot set a uniform: no shader program is active")
            }
            UsageError::ForeignHandle { handle, backend } => write!(
                f,
                "Shader handle belongs to {handle} but the renderer uses {backend}"
            ),
        }
    }
}

impl std::error::Error for UsageError {}

/// An invalid vertex layout description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayoutError {
    /// The layout has no attributes.
    Empty,
    /// An attribute has a component count outside `1..=4`.
    InvalidComponentCount {
        /// The offending attribute.
        semantic: AttributeSemantic,
        /// The declared component count.
        size: u32,
    },
    /// Attributes disagree on the vertex stride.
    MismatchedStride {
        /// The offending attribute.
        semantic: AttributeSemantic,
        /// The stride of the first attribute.
        expected: u32,
        /// The stride declared by this attribute.
        found: u32,
    },
    /// An attribute extends past the end of the vertex.
    AttributeOutOfBounds {
        /// The offending attribute.
        semantic: AttributeSemantic,
        /// Byte offset just past the attribute, saturated at `u32::MAX`.
        end: u32,
        /// The vertex stride.
        stride: u32,
    },
}

impl fmt::Display for LayoutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayoutError::Empty => write!(f, "Vertex layout has no attributes"),
            LayoutError::InvalidComponentCount { semantic, size } => {
                write!(f, "Attribute {semantic:?} has {size} components (expected 1 to 4)")
            }
            LayoutError::MismatchedStride {
                semantic,
                expected,
                found,
            } => write!(
                f,
                "Attribute {semantic:?} declares stride {found}, layout stride is {expected}"
            ),
            LayoutError::AttributeOutOfBounds {
                semantic,
                end,
                stride,
            } => write!(
                f,
                "Attribute {semantic:?} ends at byte {end}, past the vertex stride {stride}"
            ),
        }
    }
}

impl std::error::Error for LayoutError {}

/// A failure to load renderer settings.
#[derive(Debug)]
pub enum ConfigError {
    /// The settings file could not be read.
    Io {
        /// The path that failed to load.
        path: String,
        /// The underlying I/O error.
        source: std::io::Error,
    },
    /// The settings document is not valid.
    Parse(serde_json::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io { path, source } => {
                write!(f, "Failed to read renderer settings from '{path}': {source}")
            }
            ConfigError::Parse(err) => write!(f, "Invalid renderer settings: {err}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io { source, .. } => Some(source),
            ConfigError::Parse(err) => Some(err),
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::Parse(err)
    }
}

/// A high-level error that can occur within the renderer or its backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    /// The renderer settings cannot be used to set up a renderer.
    InitializationFailed(String),
    /// An error occurred while managing a GPU resource.
    ResourceError(ResourceError),
    /// The calling code violated the renderer contract.
    Usage(UsageError),
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::InitializationFailed(msg) => {
                write!(f, "Failed to initialize renderer: {msg}")
            }
            RenderError::ResourceError(err) => {
                write!(f, "Graphics resource operation failed: {err}")
            }
            RenderError::Usage(err) => write!(f, "Renderer misuse: {err}"),
        }
    }
}

impl std::error::Error for RenderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RenderError::ResourceError(err) => Some(err),
            RenderError::Usage(err) => Some(err),
            RenderError::InitializationFailed(_) => None,
        }
    }
}

impl From<ResourceError> for RenderError {
    fn from(err: ResourceError) -> Self {
        RenderError::ResourceError(err)
    }
}

impl From<UsageError> for RenderError {
    fn from(err: UsageError) -> Self {
        RenderError::Usage(err)
    }
}
