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

use crate::math::{IVec2, Vec4};
use crate::renderer::api::*;
use crate::renderer::error::{ResourceError, ShaderError};

/// The capability set the renderer needs from a graphics API.
///
/// Implementations perform each call unconditionally. Deciding whether a call
/// is redundant is the job of the renderer's state cache, so a backend never
/// has to track what is currently bound.
///
/// All ids passed to a backend were allocated by that same backend instance.
pub trait GraphicsBackend {
    /// Returns a human readable description of the backend and driver.
    fn id_string(&self) -> String;

    /// The tag stamped on every handle created through this backend.
    fn tag(&self) -> BackendTag;

    /// Compiles a vertex and fragment stage and links them into a program.
    /// ## Arguments
    /// * `vertex_source` - GLSL source of the vertex stage.
    /// * `fragment_source` - GLSL source of the fragment stage.
    /// ## Returns
    /// The id of the linked program.
    /// ## Errors
    /// * `ShaderError` - If a stage fails to compile or the program fails to link.
    ///   Intermediate objects are released before returning.
    fn compile_program(
        &mut self,
        vertex_source: &str,
        fragment_source: &str,
    ) -> Result<ProgramId, ShaderError>;

    /// Releases a program.
    /// ## Errors
    /// * `ResourceError::InvalidHandle` - If `program` is not a live program of
    ///   this backend, for example after a double destroy.
    fn destroy_program(&mut self, program: ProgramId) -> Result<(), ResourceError>;

    /// Makes `program` the active program. [`ProgramId::NULL`] unbinds.
    fn bind_program(&mut self, program: ProgramId);

    /// Queries the location of a named uniform.
    /// ## Returns
    /// [`UniformLocation::NOT_FOUND`] if the program does not declare `name`.
    fn uniform_location(&mut self, program: ProgramId, name: &str) -> UniformLocation;

    /// Writes a value to a uniform of the active program.
    fn set_uniform(&mut self, location: UniformLocation, value: &UniformValue);

    /// Assigns the uniform block `block_name` of `program` to a binding point.
    /// Unknown block names are ignored.
    fn uniform_block_binding(&mut self, program: ProgramId, block_name: &str, binding_point: u32);

    /// Binds `texture` to the given texture unit. [`TextureId::NULL`] unbinds.
    fn bind_texture(&mut self, unit: u32, texture: TextureId);

    /// Creates a uniform buffer of `size` bytes attached to `binding_point`.
    /// ## Errors
    /// * `ResourceError` - If the backend cannot allocate the buffer.
    fn create_uniform_buffer(
        &mut self,
        binding_point: u32,
        size: usize,
    ) -> Result<BufferId, ResourceError>;

    /// Releases a buffer.
    /// ## Errors
    /// * `ResourceError::InvalidHandle` - If `buffer` is not a live buffer of this backend.
    fn destroy_buffer(&mut self, buffer: BufferId) -> Result<(), ResourceError>;

    /// Makes `buffer` the current uniform buffer target.
    fn bind_uniform_buffer(&mut self, buffer: BufferId);

    /// Replaces the content of the current uniform buffer.
    fn upload_uniform_buffer(&mut self, data: &[u8]);

    /// Binds a vertex array.
    fn bind_vertex_array(&mut self, vertex_array: VertexArrayId);

    /// Issues an indexed draw of `count` indices starting `byte_offset` bytes into
    /// the bound index buffer.
    fn draw_indexed(
        &mut self,
        topology: PrimitiveTopology,
        index_format: IndexFormat,
        count: u32,
        byte_offset: u32,
    );

    /// Issues a non-indexed draw of `count` vertices starting at `first`.
    fn draw_arrays(&mut self, topology: PrimitiveTopology, first: u32, count: u32);

    /// Clears the colour and/or depth buffers.
    fn clear(&mut self, colour: Vec4, clear_colour: bool, clear_depth: bool);

    /// Sets the viewport rectangle to `(0, 0, size.x, size.y)`.
    fn set_viewport(&mut self, size: IVec2);

    /// Opens a named marker group visible in graphics debuggers.
    fn push_debug_group(&mut self, title: &str);

    /// Closes the innermost marker group.
    fn pop_debug_group(&mut self);

    /// A monotonic timestamp in nanoseconds, used to time profiling scopes.
    fn timestamp_ns(&self) -> u64;
}
