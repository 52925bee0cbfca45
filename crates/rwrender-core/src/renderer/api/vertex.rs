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

//! Vertex attribute descriptions.
//!
//! This is the only coupling point with buffer construction code: a vertex
//! record describes itself through [`Vertex::ATTRIBUTES`], and whoever builds
//! the vertex array turns the resulting [`VertexLayout`] into backend calls.

use crate::math::Vec3;
use crate::renderer::error::LayoutError;
use std::borrow::Cow;
use std::mem::size_of;

/// The role an attribute plays for the shader.
///
/// Each semantic is bound to a fixed attribute location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeSemantic {
    /// Vertex position.
    Position,
    /// Vertex normal.
    Normal,
    /// Per-vertex colour.
    Colour,
    /// Texture coordinates.
    TexCoord,
}

impl AttributeSemantic {
    /// The shader attribute location for this semantic.
    #[inline]
    pub fn location(self) -> u32 {
        match self {
            AttributeSemantic::Position => 0,
            AttributeSemantic::Normal => 1,
            AttributeSemantic::Colour => 2,
            AttributeSemantic::TexCoord => 3,
        }
    }
}

/// The storage type of each component of an attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AttributeKind {
    /// 32-bit float, passed through as-is.
    #[default]
    Float,
    /// Unsigned byte, normalized to `[0, 1]` by the GPU.
    UnsignedByte,
}

impl AttributeKind {
    /// Size of one component in bytes.
    #[inline]
    pub fn component_size(self) -> u32 {
        match self {
            AttributeKind::Float => 4,
            AttributeKind::UnsignedByte => 1,
        }
    }

    /// Whether integer data is normalized when read by the shader.
    #[inline]
    pub fn normalized(self) -> bool {
        matches!(self, AttributeKind::UnsignedByte)
    }
}

/// Describes one attribute within a vertex record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AttributeDescriptor {
    /// The attribute's semantic role.
    pub semantic: AttributeSemantic,
    /// Number of components (1 to 4).
    pub size: u32,
    /// Byte distance between consecutive vertices.
    pub stride: u32,
    /// Byte offset of the attribute within a vertex.
    pub offset: u32,
    /// Component storage type.
    pub kind: AttributeKind,
}

impl AttributeDescriptor {
    /// Creates a float attribute.
    pub const fn new(semantic: AttributeSemantic, size: u32, stride: u32, offset: u32) -> Self {
        Self {
            semantic,
            size,
            stride,
            offset,
            kind: AttributeKind::Float,
        }
    }

    /// Returns a copy with a different component type.
    pub const fn with_kind(mut self, kind: AttributeKind) -> Self {
        self.kind = kind;
        self
    }

    /// Size of the whole attribute in bytes.
    #[inline]
    pub fn byte_size(&self) -> u32 {
        self.size * self.kind.component_size()
    }
}

/// An ordered, validated list of attributes sharing one stride.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VertexLayout {
    attributes: Cow<'static, [AttributeDescriptor]>,
}

impl VertexLayout {
    /// Builds a layout from a static attribute list, checking that every attribute
    /// fits inside its declared stride.
    pub fn new(
        attributes: impl Into<Cow<'static, [AttributeDescriptor]>>,
    ) -> Result<Self, LayoutError> {
        let attributes = attributes.into();
        let Some(first) = attributes.first() else {
            return Err(LayoutError::Empty);
        };
        let stride = first.stride;

        for attribute in attributes.iter() {
            if !(1..=4).contains(&attribute.size) {
                return Err(LayoutError::InvalidComponentCount {
                    semantic: attribute.semantic,
                    size: attribute.size,
                });
            }
            if attribute.stride != stride {
                return Err(LayoutError::MismatchedStride {
                    semantic: attribute.semantic,
                    expected: stride,
                    found: attribute.stride,
                });
            }
            let end = attribute.offset.checked_add(attribute.byte_size());
            match end {
                Some(end) if end <= stride => {}
                _ => {
                    return Err(LayoutError::AttributeOutOfBounds {
                        semantic: attribute.semantic,
                        end: end.unwrap_or(u32::MAX),
                        stride,
                    })
                }
            }
        }

        Ok(Self { attributes })
    }

    /// The attributes, in declaration order.
    pub fn attributes(&self) -> &[AttributeDescriptor] {
        &self.attributes
    }

    /// Byte size of one vertex.
    pub fn stride(&self) -> u32 {
        // `new` rejects empty layouts.
        self.attributes.first().map_or(0, |a| a.stride)
    }

    /// Looks up the attribute with the given semantic.
    pub fn find(&self, semantic: AttributeSemantic) -> Option<&AttributeDescriptor> {
        self.attributes.iter().find(|a| a.semantic == semantic)
    }
}

/// Implemented by every vertex record the renderer can draw.
pub trait Vertex: bytemuck::Pod {
    /// The static attribute description of the record.
    const ATTRIBUTES: &'static [AttributeDescriptor];

    /// Builds the validated layout for this record.
    fn vertex_layout() -> Result<VertexLayout, LayoutError> {
        VertexLayout::new(Self::ATTRIBUTES)
    }
}

/// A vertex with only a 3D position.
#[derive(Debug, Default, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
#[repr(C)]
pub struct VertexP3 {
    /// The vertex position.
    pub position: Vec3,
}

impl Vertex for VertexP3 {
    const ATTRIBUTES: &'static [AttributeDescriptor] = &[AttributeDescriptor::new(
        AttributeSemantic::Position,
        3,
        size_of::<VertexP3>() as u32,
        0,
    )];
}

/// A vertex with only a 2D position, used for overlays.
#[derive(Debug, Default, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
#[repr(C)]
pub struct VertexP2 {
    /// Horizontal position.
    pub x: f32,
    /// Vertical position.
    pub y: f32,
}

impl Vertex for VertexP2 {
    const ATTRIBUTES: &'static [AttributeDescriptor] = &[AttributeDescriptor::new(
        AttributeSemantic::Position,
        2,
        size_of::<VertexP2>() as u32,
        0,
    )];
}
