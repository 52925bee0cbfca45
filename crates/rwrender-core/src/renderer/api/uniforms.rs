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

//! Uniform block records uploaded verbatim to GPU uniform buffers.
//!
//! The layouts follow std140 rules. The matching GLSL declarations are:
//!
//! ```glsl
//! layout(std140) uniform SceneData {
//!     mat4 projection;
//!     mat4 view;
//!     vec4 ambient;
//!     vec4 dynamic;
//!     vec4 fogColor;
//!     vec4 campos;
//!     float fogStart;
//!     float fogEnd;
//! };
//!
//! layout(std140) uniform ObjectData {
//!     mat4 model;
//!     vec4 colour;
//!     float diffuse;
//!     float ambient;
//!     float visibility;
//! };
//! ```

use crate::math::{Mat4, Vec4};

/// Per-frame values shared by every draw.
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
#[repr(C)]
pub struct SceneUniformData {
    /// Camera projection matrix.
    pub projection: Mat4,
    /// Camera view matrix.
    pub view: Mat4,
    /// Ambient light colour.
    pub ambient: Vec4,
    /// Dynamic (directional) light colour.
    pub dynamic: Vec4,
    /// Fog colour.
    pub fog_colour: Vec4,
    /// Camera position in world space, `w` unused.
    pub campos: Vec4,
    /// Distance at which fog starts.
    pub fog_start: f32,
    /// Distance at which fog is fully opaque.
    pub fog_end: f32,
    /// std140 rounds the block size up to a multiple of 16 bytes.
    pub _padding: [f32; 2],
}

impl Default for SceneUniformData {
    fn default() -> Self {
        Self {
            projection: Mat4::IDENTITY,
            view: Mat4::IDENTITY,
            ambient: Vec4::ZERO,
            dynamic: Vec4::ZERO,
            fog_colour: Vec4::ZERO,
            campos: Vec4::ZERO,
            fog_start: 0.0,
            fog_end: 0.0,
            _padding: [0.0; 2],
        }
    }
}

/// Per-draw values written by the renderer before every draw call.
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
#[repr(C)]
pub struct ObjectUniformData {
    /// Model (object to world) matrix.
    pub model: Mat4,
    /// Base colour, normalized.
    pub colour: Vec4,
    /// Diffuse lighting factor.
    pub diffuse: f32,
    /// Ambient lighting factor.
    pub ambient: f32,
    /// Visibility (fade) factor.
    pub visibility: f32,
    /// std140 tail padding.
    pub _padding: f32,
}

impl Default for ObjectUniformData {
    fn default() -> Self {
        Self {
            model: Mat4::IDENTITY,
            colour: Vec4::ONE,
            diffuse: 1.0,
            ambient: 1.0,
            visibility: 1.0,
            _padding: 0.0,
        }
    }
}

const _: () = assert!(std::mem::size_of::<SceneUniformData>() == 208);
const _: () = assert!(std::mem::size_of::<ObjectUniformData>() == 96);
