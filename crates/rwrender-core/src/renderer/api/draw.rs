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

//! Draw call descriptions.

use crate::math::{Mat4, Rgba8};
use crate::renderer::api::resource::{TextureId, VertexArrayId};
use crate::renderer::api::uniforms::ObjectUniformData;

/// How vertices are assembled into primitives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PrimitiveTopology {
    /// Each vertex is a point.
    PointList,
    /// Every two vertices form a line.
    LineList,
    /// Every three vertices form a triangle.
    #[default]
    TriangleList,
    /// Each vertex after the first two forms a triangle with the previous two.
    TriangleStrip,
}

/// Specifies the data type of indices in an index buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum IndexFormat {
    /// Indices are 16-bit unsigned integers.
    Uint16,
    /// Indices are 32-bit unsigned integers.
    #[default]
    Uint32,
}

impl IndexFormat {
    /// Size of one index in bytes.
    #[inline]
    pub fn size(self) -> u32 {
        match self {
            IndexFormat::Uint16 => 2,
            IndexFormat::Uint32 => 4,
        }
    }
}

/// A reference to geometry prepared by buffer construction code.
///
/// The renderer only needs the vertex array that captures the vertex and index
/// bindings, plus how to interpret it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DrawBuffer {
    /// The vertex array holding the attribute and index buffer bindings.
    pub vertex_array: VertexArrayId,
    /// Primitive assembly mode.
    pub topology: PrimitiveTopology,
    /// Type of the indices used by indexed draws.
    pub index_format: IndexFormat,
}

impl DrawBuffer {
    /// Creates a triangle-list draw buffer with 32-bit indices.
    pub fn new(vertex_array: VertexArrayId) -> Self {
        Self {
            vertex_array,
            topology: PrimitiveTopology::default(),
            index_format: IndexFormat::default(),
        }
    }
}

/// Everything a single draw call needs besides the model matrix and geometry.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawParameters {
    /// Textures to bind; the index in the list is the texture unit.
    pub textures: Vec<TextureId>,
    /// Base colour.
    pub colour: Rgba8,
    /// Ambient lighting factor.
    pub ambient: f32,
    /// Diffuse lighting factor.
    pub diffuse: f32,
    /// Visibility (fade) factor.
    pub visibility: f32,
    /// The number of indices (or vertices, for array draws) to draw.
    pub count: u32,
    /// First index (or vertex) to draw.
    pub start: u32,
}

impl DrawParameters {
    /// Creates parameters drawing `count` elements from `start` with neutral material values.
    pub fn new(count: u32, start: u32) -> Self {
        Self {
            textures: Vec::new(),
            colour: Rgba8::WHITE,
            ambient: 1.0,
            diffuse: 1.0,
            visibility: 1.0,
            count,
            start,
        }
    }

    /// Builder-style helper to set the texture list.
    pub fn with_textures(mut self, textures: impl Into<Vec<TextureId>>) -> Self {
        self.textures = textures.into();
        self
    }

    /// The per-object uniform record for a draw with these parameters.
    pub fn object_data(&self, model: &Mat4) -> ObjectUniformData {
        ObjectUniformData {
            model: *model,
            colour: self.colour.to_vec4(),
            diffuse: self.diffuse,
            ambient: self.ambient,
            visibility: self.visibility,
            _padding: 0.0,
        }
    }
}

impl Default for DrawParameters {
    fn default() -> Self {
        Self::new(0, 0)
    }
}
