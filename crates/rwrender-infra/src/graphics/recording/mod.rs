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

//! A headless backend that records every call it receives.
//!
//! Used by tests and tools to observe exactly what the renderer sends to a
//! graphics API, with a manually driven clock for deterministic timings.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, PoisonError};

use rwrender_core::math::{IVec2, Vec4};
use rwrender_core::renderer::api::*;
use rwrender_core::renderer::{GraphicsBackend, ResourceError, ShaderError};

/// One call received by a [`RecordingBackend`].
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// A program was linked.
    CompileProgram(ProgramId),
    /// A program was released.
    DestroyProgram(ProgramId),
    /// A program was made active.
    BindProgram(ProgramId),
    /// A uniform location was queried.
    QueryUniform {
        /// The program queried.
        program: ProgramId,
        /// The uniform name.
        name: String,
    },
    /// A uniform of the active program was written.
    SetUniform {
        /// The uniform location.
        location: UniformLocation,
        /// The value written.
        value: UniformValue,
    },
    /// A uniform block was assigned to a binding point.
    UniformBlockBinding {
        /// The program.
        program: ProgramId,
        /// The block name.
        block: String,
        /// The binding point.
        binding_point: u32,
    },
    /// A texture was bound to a unit.
    BindTexture {
        /// The texture unit.
        unit: u32,
        /// The texture.
        texture: TextureId,
    },
    /// A uniform buffer was created.
    CreateUniformBuffer {
        /// The new buffer.
        buffer: BufferId,
        /// Its binding point.
        binding_point: u32,
        /// Its size in bytes.
        size: usize,
    },
    /// A buffer was released.
    DestroyBuffer(BufferId),
    /// A uniform buffer was bound.
    BindUniformBuffer(BufferId),
    /// The bound uniform buffer was filled.
    UploadUniformBuffer {
        /// The buffer bound at upload time.
        buffer: BufferId,
        /// The uploaded bytes.
        data: Vec<u8>,
    },
    /// A vertex array was bound.
    BindVertexArray(VertexArrayId),
    /// An indexed draw was issued.
    DrawIndexed {
        /// Primitive assembly mode.
        topology: PrimitiveTopology,
        /// Index type.
        index_format: IndexFormat,
        /// Number of indices.
        count: u32,
        /// Byte offset into the index buffer.
        byte_offset: u32,
    },
    /// A non-indexed draw was issued.
    DrawArrays {
        /// Primitive assembly mode.
        topology: PrimitiveTopology,
        /// First vertex.
        first: u32,
        /// Number of vertices.
        count: u32,
    },
    /// The framebuffer was cleared.
    Clear {
        /// The clear colour.
        colour: Vec4,
        /// Whether the colour plane was cleared.
        clear_colour: bool,
        /// Whether the depth plane was cleared.
        clear_depth: bool,
    },
    /// The viewport was resized.
    SetViewport(IVec2),
    /// A debug marker group was opened.
    PushDebugGroup(String),
    /// A debug marker group was closed.
    PopDebugGroup,
}

impl Command {
    /// A short name for the kind of call, used when summarizing logs.
    pub fn name(&self) -> &'static str {
        match self {
            Command::CompileProgram(_) => "compile_program",
            Command::DestroyProgram(_) => "destroy_program",
            Command::BindProgram(_) => "bind_program",
            Command::QueryUniform { .. } => "query_uniform",
            Command::SetUniform { .. } => "set_uniform",
            Command::UniformBlockBinding { .. } => "uniform_block_binding",
            Command::BindTexture { .. } => "bind_texture",
            Command::CreateUniformBuffer { .. } => "create_uniform_buffer",
            Command::DestroyBuffer(_) => "destroy_buffer",
            Command::BindUniformBuffer(_) => "bind_uniform_buffer",
            Command::UploadUniformBuffer { .. } => "upload_uniform_buffer",
            Command::BindVertexArray(_) => "bind_vertex_array",
            Command::DrawIndexed { .. } => "draw_indexed",
            Command::DrawArrays { .. } => "draw_arrays",
            Command::Clear { .. } => "clear",
            Command::SetViewport(_) => "set_viewport",
            Command::PushDebugGroup(_) => "push_debug_group",
            Command::PopDebugGroup => "pop_debug_group",
        }
    }
}

/// A shared view of the commands recorded by a backend.
///
/// Clones observe the same log, so it stays readable after the backend has been
/// moved into (or dropped with) a renderer.
#[derive(Debug, Clone, Default)]
pub struct CommandLog {
    commands: Arc<Mutex<Vec<Command>>>,
}

impl CommandLog {
    fn push(&self, command: Command) {
        log::trace!("recorded {command:?}");
        self.commands
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(command);
    }

    /// A copy of every command recorded so far, in order.
    pub fn snapshot(&self) -> Vec<Command> {
        self.commands
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of recorded commands matching `filter`.
    pub fn count(&self, filter: impl Fn(&Command) -> bool) -> usize {
        self.commands
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|&c| filter(c))
            .count()
    }

    /// Number of recorded commands.
    pub fn len(&self) -> usize {
        self.commands
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns `true` if nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Forgets every recorded command.
    pub fn clear(&self) {
        self.commands
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

/// A [`GraphicsBackend`] that performs nothing and records everything.
///
/// Uniform names resolve only if declared with [`RecordingBackend::declare_uniform`].
/// Its clock only moves when advanced explicitly.
#[derive(Debug)]
pub struct RecordingBackend {
    tag: BackendTag,
    log: CommandLog,
    clock_ns: u64,
    next_id: u32,
    uniforms: HashMap<String, i32>,
    compile_error: Option<ShaderError>,
    programs: HashSet<ProgramId>,
    buffers: HashSet<BufferId>,
    bound_uniform_buffer: BufferId,
    marker_depth: usize,
}

impl Default for RecordingBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingBackend {
    /// Creates a backend with an empty log and the clock at zero.
    pub fn new() -> Self {
        Self {
            tag: BackendTag::unique(),
            log: CommandLog::default(),
            clock_ns: 0,
            next_id: 1,
            uniforms: HashMap::new(),
            compile_error: None,
            programs: HashSet::new(),
            buffers: HashSet::new(),
            bound_uniform_buffer: BufferId::NULL,
            marker_depth: 0,
        }
    }

    /// Builder-style helper for [`RecordingBackend::declare_uniform`].
    pub fn with_uniform(mut self, name: &str, location: i32) -> Self {
        self.declare_uniform(name, location);
        self
    }

    /// Makes every program report `name` at `location`.
    pub fn declare_uniform(&mut self, name: &str, location: i32) {
        self.uniforms.insert(name.to_owned(), location);
    }

    /// Makes the next program compilation fail with `error`.
    pub fn fail_next_compile(&mut self, error: ShaderError) {
        self.compile_error = Some(error);
    }

    /// Moves the clock forward.
    pub fn advance_clock(&mut self, nanos: u64) {
        self.clock_ns = self.clock_ns.saturating_add(nanos);
    }

    /// A handle on the command log.
    pub fn log(&self) -> CommandLog {
        self.log.clone()
    }

    /// Programs created and not yet destroyed.
    pub fn live_programs(&self) -> usize {
        self.programs.len()
    }

    /// Buffers created and not yet destroyed.
    pub fn live_buffers(&self) -> usize {
        self.buffers.len()
    }

    /// Debug marker groups currently open.
    pub fn marker_depth(&self) -> usize {
        self.marker_depth
    }

    fn allocate_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

impl GraphicsBackend for RecordingBackend {
    fn id_string(&self) -> String {
        "Recording".to_string()
    }

    fn tag(&self) -> BackendTag {
        self.tag
    }

    fn compile_program(
        &mut self,
        _vertex_source: &str,
        _fragment_source: &str,
    ) -> Result<ProgramId, ShaderError> {
        if let Some(err) = self.compile_error.take() {
            return Err(err);
        }
        let program = ProgramId(self.allocate_id());
        self.programs.insert(program);
        self.log.push(Command::CompileProgram(program));
        Ok(program)
    }

    fn destroy_program(&mut self, program: ProgramId) -> Result<(), ResourceError> {
        self.log.push(Command::DestroyProgram(program));
        if self.programs.remove(&program) {
            Ok(())
        } else {
            Err(ResourceError::InvalidHandle(format!("{program:?}")))
        }
    }

    fn bind_program(&mut self, program: ProgramId) {
        self.log.push(Command::BindProgram(program));
    }

    fn uniform_location(&mut self, program: ProgramId, name: &str) -> UniformLocation {
        self.log.push(Command::QueryUniform {
            program,
            name: name.to_owned(),
        });
        self.uniforms
            .get(name)
            .map_or(UniformLocation::NOT_FOUND, |location| {
                UniformLocation(*location)
            })
    }

    fn set_uniform(&mut self, location: UniformLocation, value: &UniformValue) {
        self.log.push(Command::SetUniform {
            location,
            value: *value,
        });
    }

    fn uniform_block_binding(&mut self, program: ProgramId, block_name: &str, binding_point: u32) {
        self.log.push(Command::UniformBlockBinding {
            program,
            block: block_name.to_owned(),
            binding_point,
        });
    }

    fn bind_texture(&mut self, unit: u32, texture: TextureId) {
        self.log.push(Command::BindTexture { unit, texture });
    }

    fn create_uniform_buffer(
        &mut self,
        binding_point: u32,
        size: usize,
    ) -> Result<BufferId, ResourceError> {
        let buffer = BufferId(self.allocate_id());
        self.buffers.insert(buffer);
        self.log.push(Command::CreateUniformBuffer {
            buffer,
            binding_point,
            size,
        });
        Ok(buffer)
    }

    fn destroy_buffer(&mut self, buffer: BufferId) -> Result<(), ResourceError> {
        self.log.push(Command::DestroyBuffer(buffer));
        if !self.buffers.remove(&buffer) {
            return Err(ResourceError::InvalidHandle(format!("{buffer:?}")));
        }
        if self.bound_uniform_buffer == buffer {
            self.bound_uniform_buffer = BufferId::NULL;
        }
        Ok(())
    }

    fn bind_uniform_buffer(&mut self, buffer: BufferId) {
        self.bound_uniform_buffer = buffer;
        self.log.push(Command::BindUniformBuffer(buffer));
    }

    fn upload_uniform_buffer(&mut self, data: &[u8]) {
        self.log.push(Command::UploadUniformBuffer {
            buffer: self.bound_uniform_buffer,
            data: data.to_vec(),
        });
    }

    fn bind_vertex_array(&mut self, vertex_array: VertexArrayId) {
        self.log.push(Command::BindVertexArray(vertex_array));
    }

    fn draw_indexed(
        &mut self,
        topology: PrimitiveTopology,
        index_format: IndexFormat,
        count: u32,
        byte_offset: u32,
    ) {
        self.log.push(Command::DrawIndexed {
            topology,
            index_format,
            count,
            byte_offset,
        });
    }

    fn draw_arrays(&mut self, topology: PrimitiveTopology, first: u32, count: u32) {
        self.log.push(Command::DrawArrays {
            topology,
            first,
            count,
        });
    }

    fn clear(&mut self, colour: Vec4, clear_colour: bool, clear_depth: bool) {
        self.log.push(Command::Clear {
            colour,
            clear_colour,
            clear_depth,
        });
    }

    fn set_viewport(&mut self, size: IVec2) {
        self.log.push(Command::SetViewport(size));
    }

    fn push_debug_group(&mut self, title: &str) {
        self.marker_depth += 1;
        self.log.push(Command::PushDebugGroup(title.to_owned()));
    }

    fn pop_debug_group(&mut self) {
        match self.marker_depth.checked_sub(1) {
            Some(depth) => self.marker_depth = depth,
            None => log::warn!("Debug group popped with none open"),
        }
        self.log.push(Command::PopDebugGroup);
    }

    fn timestamp_ns(&self) -> u64 {
        self.clock_ns
    }
}
