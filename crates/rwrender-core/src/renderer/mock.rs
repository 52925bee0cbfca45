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

//! A call-logging backend for unit tests.

use crate::math::{IVec2, Vec4};
use crate::renderer::api::*;
use crate::renderer::error::{ResourceError, ShaderError};
use crate::renderer::traits::GraphicsBackend;
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum MockCall {
    CompileProgram(ProgramId),
    DestroyProgram(ProgramId),
    BindProgram(ProgramId),
    UniformLocation(ProgramId, String),
    SetUniform(UniformLocation, UniformValue),
    BlockBinding(ProgramId, String, u32),
    BindTexture(u32, TextureId),
    CreateUniformBuffer(BufferId, u32),
    DestroyBuffer(BufferId),
    BindUniformBuffer(BufferId),
    Upload(Vec<u8>),
    BindVertexArray(VertexArrayId),
    DrawIndexed { count: u32, byte_offset: u32 },
    DrawArrays { first: u32, count: u32 },
    Clear(Vec4, bool, bool),
    Viewport(IVec2),
    PushGroup(String),
    PopGroup,
}

#[derive(Debug)]
pub(crate) struct MockBackend {
    pub tag: BackendTag,
    pub calls: Vec<MockCall>,
    pub uniforms: HashMap<String, i32>,
    pub fail_compile: bool,
    pub now: u64,
    pub fail_buffer_creation_after: Option<usize>,
    live: HashSet<u32>,
    next_id: u32,
}

impl MockBackend {
    pub fn new() -> Self {
        Self {
            tag: BackendTag::unique(),
            calls: Vec::new(),
            uniforms: HashMap::new(),
            fail_compile: false,
            now: 0,
            fail_buffer_creation_after: None,
            live: HashSet::new(),
            next_id: 1,
        }
    }

    pub fn with_uniform(mut self, name: &str, location: i32) -> Self {
        self.uniforms.insert(name.to_owned(), location);
        self
    }

    pub fn count(&self, filter: impl Fn(&MockCall) -> bool) -> usize {
        self.calls.iter().filter(|&c| filter(c)).count()
    }

    fn next(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        self.live.insert(id);
        id
    }

    fn release(&mut self, id: u32, what: String) -> Result<(), ResourceError> {
        if self.live.remove(&id) {
            Ok(())
        } else {
            Err(ResourceError::InvalidHandle(what))
        }
    }
}

impl GraphicsBackend for MockBackend {
    fn id_string(&self) -> String {
        "Mock".to_string()
    }

    fn tag(&self) -> BackendTag {
        self.tag
    }

    fn compile_program(&mut self, _vertex: &str, _fragment: &str) -> Result<ProgramId, ShaderError> {
        if self.fail_compile {
            return Err(ShaderError::CompilationError {
                stage: "vertex".to_string(),
                details: "mock failure".to_string(),
            });
        }
        let program = ProgramId(self.next());
        self.calls.push(MockCall::CompileProgram(program));
        Ok(program)
    }

    fn destroy_program(&mut self, program: ProgramId) -> Result<(), ResourceError> {
        self.calls.push(MockCall::DestroyProgram(program));
        self.release(program.0, format!("{program:?}"))
    }

    fn bind_program(&mut self, program: ProgramId) {
        self.calls.push(MockCall::BindProgram(program));
    }

    fn uniform_location(&mut self, program: ProgramId, name: &str) -> UniformLocation {
        self.calls
            .push(MockCall::UniformLocation(program, name.to_owned()));
        self.uniforms
            .get(name)
            .map_or(UniformLocation::NOT_FOUND, |l| UniformLocation(*l))
    }

    fn set_uniform(&mut self, location: UniformLocation, value: &UniformValue) {
        self.calls.push(MockCall::SetUniform(location, *value));
    }

    fn uniform_block_binding(&mut self, program: ProgramId, block_name: &str, binding_point: u32) {
        self.calls.push(MockCall::BlockBinding(
            program,
            block_name.to_owned(),
            binding_point,
        ));
    }

    fn bind_texture(&mut self, unit: u32, texture: TextureId) {
        self.calls.push(MockCall::BindTexture(unit, texture));
    }

    fn create_uniform_buffer(
        &mut self,
        binding_point: u32,
        _size: usize,
    ) -> Result<BufferId, ResourceError> {
        if let Some(remaining) = self.fail_buffer_creation_after.as_mut() {
            if *remaining == 0 {
                return Err(ResourceError::BackendError("out of memory".to_string()));
            }
            *remaining -= 1;
        }
        let buffer = BufferId(self.next());
        self.calls
            .push(MockCall::CreateUniformBuffer(buffer, binding_point));
        Ok(buffer)
    }

    fn destroy_buffer(&mut self, buffer: BufferId) -> Result<(), ResourceError> {
        self.calls.push(MockCall::DestroyBuffer(buffer));
        self.release(buffer.0, format!("{buffer:?}"))
    }

    fn bind_uniform_buffer(&mut self, buffer: BufferId) {
        self.calls.push(MockCall::BindUniformBuffer(buffer));
    }

    fn upload_uniform_buffer(&mut self, data: &[u8]) {
        self.calls.push(MockCall::Upload(data.to_vec()));
    }

    fn bind_vertex_array(&mut self, vertex_array: VertexArrayId) {
        self.calls.push(MockCall::BindVertexArray(vertex_array));
    }

    fn draw_indexed(
        &mut self,
        _topology: PrimitiveTopology,
        _index_format: IndexFormat,
        count: u32,
        byte_offset: u32,
    ) {
        self.calls.push(MockCall::DrawIndexed { count, byte_offset });
    }

    fn draw_arrays(&mut self, _topology: PrimitiveTopology, first: u32, count: u32) {
        self.calls.push(MockCall::DrawArrays { first, count });
    }

    fn clear(&mut self, colour: Vec4, clear_colour: bool, clear_depth: bool) {
        self.calls
            .push(MockCall::Clear(colour, clear_colour, clear_depth));
    }

    fn set_viewport(&mut self, size: IVec2) {
        self.calls.push(MockCall::Viewport(size));
    }

    fn push_debug_group(&mut self, title: &str) {
        self.calls.push(MockCall::PushGroup(title.to_owned()));
    }

    fn pop_debug_group(&mut self) {
        self.calls.push(MockCall::PopGroup);
    }

    fn timestamp_ns(&self) -> u64 {
        self.now
    }
}
