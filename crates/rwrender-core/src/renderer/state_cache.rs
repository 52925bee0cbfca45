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

//! Elision of redundant binding calls.
//!
//! The cache remembers the last value bound to each binding slot and only
//! forwards a bind to the backend when it would change that slot. A slot is
//! either unknown (`None`, nothing is assumed about the backend) or holds the
//! last bound id, where the null id is a regular cached value.
//!
//! The cache does not check whether a cached id is still alive. Code that
//! destroys an object must call the matching `forget_*` method, otherwise a
//! recycled id could be elided against a stale entry.

use crate::renderer::api::{BufferId, ProgramId, TextureId, VertexArrayId};
use crate::renderer::counters::FrameCounters;
use crate::renderer::traits::GraphicsBackend;
use std::collections::HashMap;

/// A binding slot together with the object to bind to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BindTarget {
    /// The active shader program.
    Program(ProgramId),
    /// A texture unit.
    Texture {
        /// The texture unit index.
        unit: u32,
        /// The texture to bind.
        texture: TextureId,
    },
    /// The current uniform buffer.
    UniformBuffer(BufferId),
    /// The current vertex array.
    VertexArray(VertexArrayId),
}

/// Last known binding of each slot.
#[derive(Debug, Clone, Default)]
pub struct RenderStateCache {
    program: Option<ProgramId>,
    textures: HashMap<u32, TextureId>,
    uniform_buffer: Option<BufferId>,
    vertex_array: Option<VertexArrayId>,
}

impl RenderStateCache {
    /// Creates a cache with every slot unknown.
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `target` unless the cache shows it is already bound.
    ///
    /// Returns `true` if a backend call was issued. Texture binds count towards
    /// `textures` and vertex array binds towards `buffers`; program and uniform
    /// buffer binds are not counted.
    pub fn ensure_bound<B>(
        &mut self,
        backend: &mut B,
        counters: &mut FrameCounters,
        target: BindTarget,
    ) -> bool
    where
        B: GraphicsBackend + ?Sized,
    {
        let issued = match target {
            BindTarget::Program(program) => {
                update_slot(&mut self.program, program, || backend.bind_program(program))
            }
            BindTarget::Texture { unit, texture } => {
                if self.textures.get(&unit) == Some(&texture) {
                    false
                } else {
                    backend.bind_texture(unit, texture);
                    self.textures.insert(unit, texture);
                    counters.record_texture_bind();
                    true
                }
            }
            BindTarget::UniformBuffer(buffer) => {
                update_slot(&mut self.uniform_buffer, buffer, || {
                    backend.bind_uniform_buffer(buffer)
                })
            }
            BindTarget::VertexArray(vertex_array) => {
                let issued = update_slot(&mut self.vertex_array, vertex_array, || {
                    backend.bind_vertex_array(vertex_array)
                });
                if issued {
                    counters.record_buffer_bind();
                }
                issued
            }
        };

        if !issued {
            log::trace!("Elided redundant bind of {target:?}");
        }
        issued
    }

    /// Makes `program` active if it is not already.
    pub fn ensure_program<B: GraphicsBackend + ?Sized>(
        &mut self,
        backend: &mut B,
        counters: &mut FrameCounters,
        program: ProgramId,
    ) -> bool {
        self.ensure_bound(backend, counters, BindTarget::Program(program))
    }

    /// Binds `texture` to `unit` if it is not already.
    pub fn ensure_texture<B: GraphicsBackend + ?Sized>(
        &mut self,
        backend: &mut B,
        counters: &mut FrameCounters,
        unit: u32,
        texture: TextureId,
    ) -> bool {
        self.ensure_bound(backend, counters, BindTarget::Texture { unit, texture })
    }

    /// Makes `buffer` the current uniform buffer if it is not already.
    pub fn ensure_uniform_buffer<B: GraphicsBackend + ?Sized>(
        &mut self,
        backend: &mut B,
        counters: &mut FrameCounters,
        buffer: BufferId,
    ) -> bool {
        self.ensure_bound(backend, counters, BindTarget::UniformBuffer(buffer))
    }

    /// Binds `vertex_array` if it is not already.
    pub fn ensure_vertex_array<B: GraphicsBackend + ?Sized>(
        &mut self,
        backend: &mut B,
        counters: &mut FrameCounters,
        vertex_array: VertexArrayId,
    ) -> bool {
        self.ensure_bound(backend, counters, BindTarget::VertexArray(vertex_array))
    }

    /// Forgets every binding. The next bind of each slot reaches the backend.
    ///
    /// Call this after anything outside the renderer touched backend state.
    pub fn invalidate(&mut self) {
        *self = Self::default();
    }

    /// Drops the program slot if it refers to `program`.
    pub fn forget_program(&mut self, program: ProgramId) {
        if self.program == Some(program) {
            self.program = None;
        }
    }

    /// Drops every texture unit slot referring to `texture`.
    pub fn forget_texture(&mut self, texture: TextureId) {
        self.textures.retain(|_, bound| *bound != texture);
    }

    /// Drops the uniform buffer slot if it refers to `buffer`.
    pub fn forget_uniform_buffer(&mut self, buffer: BufferId) {
        if self.uniform_buffer == Some(buffer) {
            self.uniform_buffer = None;
        }
    }

    /// Drops the vertex array slot if it refers to `vertex_array`.
    pub fn forget_vertex_array(&mut self, vertex_array: VertexArrayId) {
        if self.vertex_array == Some(vertex_array) {
            self.vertex_array = None;
        }
    }

    /// The cached active program, `None` if unknown.
    pub fn program(&self) -> Option<ProgramId> {
        self.program
    }

    /// The cached texture of `unit`, `None` if unknown.
    pub fn texture(&self, unit: u32) -> Option<TextureId> {
        self.textures.get(&unit).copied()
    }

    /// The cached uniform buffer, `None` if unknown.
    pub fn uniform_buffer(&self) -> Option<BufferId> {
        self.uniform_buffer
    }

    /// The cached vertex array, `None` if unknown.
    pub fn vertex_array(&self) -> Option<VertexArrayId> {
        self.vertex_array
    }
}

fn update_slot<T: PartialEq + Copy>(slot: &mut Option<T>, value: T, bind: impl FnOnce()) -> bool {
    if *slot == Some(value) {
        return false;
    }
    bind();
    *slot = Some(value);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::mock::{MockBackend, MockCall};

    #[test]
    fn repeated_binds_reach_the_backend_once() {
        let mut backend = MockBackend::new();
        let mut counters = FrameCounters::new();
        let mut cache = RenderStateCache::new();

        assert!(cache.ensure_texture(&mut backend, &mut counters, 0, TextureId(5)));
        assert!(!cache.ensure_texture(&mut backend, &mut counters, 0, TextureId(5)));
        assert!(!cache.ensure_texture(&mut backend, &mut counters, 0, TextureId(5)));

        assert_eq!(backend.count(|c| matches!(c, MockCall::BindTexture(..))), 1);
        assert_eq!(counters.frame().textures, 1);
    }

    #[test]
    fn units_are_cached_independently() {
        let mut backend = MockBackend::new();
        let mut counters = FrameCounters::new();
        let mut cache = RenderStateCache::new();

        cache.ensure_texture(&mut backend, &mut counters, 0, TextureId(5));
        cache.ensure_texture(&mut backend, &mut counters, 1, TextureId(5));
        cache.ensure_texture(&mut backend, &mut counters, 0, TextureId(6));

        assert_eq!(counters.frame().textures, 3);
        assert_eq!(cache.texture(0), Some(TextureId(6)));
        assert_eq!(cache.texture(1), Some(TextureId(5)));
        assert_eq!(cache.texture(2), None);
    }

    #[test]
    fn null_binding_is_cached() {
        let mut backend = MockBackend::new();
        let mut counters = FrameCounters::new();
        let mut cache = RenderStateCache::new();

        assert!(cache.ensure_vertex_array(&mut backend, &mut counters, VertexArrayId::NULL));
        assert!(!cache.ensure_vertex_array(&mut backend, &mut counters, VertexArrayId::NULL));
        assert!(cache.ensure_vertex_array(&mut backend, &mut counters, VertexArrayId(2)));

        assert_eq!(counters.frame().buffers, 2);
        assert_eq!(cache.vertex_array(), Some(VertexArrayId(2)));
    }

    #[test]
    fn invalidate_forces_rebinds() {
        let mut backend = MockBackend::new();
        let mut counters = FrameCounters::new();
        let mut cache = RenderStateCache::new();

        cache.ensure_program(&mut backend, &mut counters, ProgramId(1));
        cache.ensure_uniform_buffer(&mut backend, &mut counters, BufferId(4));
        cache.ensure_vertex_array(&mut backend, &mut counters, VertexArrayId(3));
        cache.invalidate();

        assert_eq!(cache.program(), None);
        assert!(cache.ensure_program(&mut backend, &mut counters, ProgramId(1)));
        assert!(cache.ensure_uniform_buffer(&mut backend, &mut counters, BufferId(4)));
        assert!(cache.ensure_vertex_array(&mut backend, &mut counters, VertexArrayId(3)));
        assert_eq!(backend.count(|c| matches!(c, MockCall::BindProgram(_))), 2);
    }

    #[test]
    fn program_and_uniform_buffer_binds_are_not_counted() {
        let mut backend = MockBackend::new();
        let mut counters = FrameCounters::new();
        let mut cache = RenderStateCache::new();

        cache.ensure_program(&mut backend, &mut counters, ProgramId(1));
        cache.ensure_uniform_buffer(&mut backend, &mut counters, BufferId(1));

        assert_eq!(*counters.frame(), Default::default());
    }

    #[test]
    fn forgetting_an_id_drops_only_matching_slots() {
        let mut backend = MockBackend::new();
        let mut counters = FrameCounters::new();
        let mut cache = RenderStateCache::new();

        cache.ensure_program(&mut backend, &mut counters, ProgramId(1));
        cache.ensure_texture(&mut backend, &mut counters, 0, TextureId(5));
        cache.ensure_texture(&mut backend, &mut counters, 1, TextureId(7));
        cache.ensure_uniform_buffer(&mut backend, &mut counters, BufferId(2));

        cache.forget_program(ProgramId(9));
        cache.forget_texture(TextureId(5));
        cache.forget_uniform_buffer(BufferId(2));
        cache.forget_vertex_array(VertexArrayId(1));

        assert_eq!(cache.program(), Some(ProgramId(1)));
        assert_eq!(cache.texture(0), None);
        assert_eq!(cache.texture(1), Some(TextureId(7)));
        assert_eq!(cache.uniform_buffer(), None);
    }
}
