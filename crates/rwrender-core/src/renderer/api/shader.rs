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

//! Shader program handles and uniform values.

use crate::math::{Mat4, Vec2, Vec3, Vec4};
use crate::renderer::api::resource::{BackendTag, ProgramId};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

/// The resolved location of a named uniform inside a linked program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UniformLocation(pub i32);

impl UniformLocation {
    /// Sentinel for a name the program does not declare.
    pub const NOT_FOUND: Self = Self(-1);

    /// Returns `true` if the uniform exists in the program.
    #[inline]
    pub fn is_found(self) -> bool {
        self.0 >= 0
    }
}

/// A value that can be written to a plain (non-block) uniform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    /// A signed integer, also used for sampler units.
    Int(i32),
    /// A single float.
    Float(f32),
    /// A `vec2`.
    Vec2(Vec2),
    /// A `vec3`.
    Vec3(Vec3),
    /// A `vec4`.
    Vec4(Vec4),
    /// A column-major `mat4`.
    Mat4(Mat4),
}

impl From<i32> for UniformValue {
    fn from(v: i32) -> Self {
        UniformValue::Int(v)
    }
}

impl From<f32> for UniformValue {
    fn from(v: f32) -> Self {
        UniformValue::Float(v)
    }
}

impl From<Vec2> for UniformValue {
    fn from(v: Vec2) -> Self {
        UniformValue::Vec2(v)
    }
}

impl From<Vec3> for UniformValue {
    fn from(v: Vec3) -> Self {
        UniformValue::Vec3(v)
    }
}

impl From<Vec4> for UniformValue {
    fn from(v: Vec4) -> Self {
        UniformValue::Vec4(v)
    }
}

impl From<Mat4> for UniformValue {
    fn from(v: Mat4) -> Self {
        UniformValue::Mat4(v)
    }
}

#[derive(Debug)]
struct ShaderProgramInner {
    program: ProgramId,
    backend: BackendTag,
    label: Option<String>,
    uniforms: Mutex<HashMap<String, UniformLocation>>,
}

/// An opaque, shareable handle to a linked program owned by one backend.
///
/// Besides the program id, the handle memoizes uniform name lookups. A program's
/// uniform layout is fixed once linked, so entries (including
/// [`UniformLocation::NOT_FOUND`]) are never invalidated while the handle lives.
///
/// Cloning is cheap and all clones share the same lookup cache.
#[derive(Debug, Clone)]
pub struct ShaderHandle {
    inner: Arc<ShaderProgramInner>,
}

impl ShaderHandle {
    /// Wraps a program id allocated by the backend identified by `backend`.
    pub fn new(program: ProgramId, backend: BackendTag, label: Option<String>) -> Self {
        Self {
            inner: Arc::new(ShaderProgramInner {
                program,
                backend,
                label,
                uniforms: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// The backend program id.
    pub fn program(&self) -> ProgramId {
        self.inner.program
    }

    /// The backend instance that owns the program.
    pub fn backend(&self) -> BackendTag {
        self.inner.backend
    }

    /// The debug label given at creation, if any.
    pub fn label(&self) -> Option<&str> {
        self.inner.label.as_deref()
    }

    /// Returns the memoized location of `name`, calling `resolve` only on the first
    /// request for that name.
    pub fn uniform_location_with<F>(&self, name: &str, resolve: F) -> UniformLocation
    where
        F: FnOnce(ProgramId, &str) -> UniformLocation,
    {
        let mut uniforms = self
            .inner
            .uniforms
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(location) = uniforms.get(name) {
            return *location;
        }
        let location = resolve(self.inner.program, name);
        uniforms.insert(name.to_owned(), location);
        location
    }

    /// Number of names resolved so far (found or not).
    pub fn cached_uniform_count(&self) -> usize {
        self.inner
            .uniforms
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl PartialEq for ShaderHandle {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
            || (self.inner.program == other.inner.program
                && self.inner.backend == other.inner.backend)
    }
}

impl Eq for ShaderHandle {}
