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

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use glow::HasContext;

use rwrender_core::math::{IVec2, Vec4};
use rwrender_core::renderer::api::*;
use rwrender_core::renderer::{GraphicsBackend, ResourceError, ShaderError};
use rwrender_core::Stopwatch;

use super::conversions::{clear_mask, IntoGl};
use super::locations::UniformLocationTable;

/// Where profiling timestamps come from.
#[derive(Debug)]
enum ProfileClock {
    /// GPU time read back from a `TIMESTAMP` query.
    GpuTimestamp(glow::Query),
    /// CPU time since backend creation, when timer queries are unavailable.
    Wall(Stopwatch),
}

/// Whether the context can record `TIMESTAMP` queries.
fn timer_queries_supported(
    major: u32,
    minor: u32,
    embedded: bool,
    extensions: &HashSet<String>,
) -> bool {
    (!embedded && (major, minor) >= (3, 3))
        || extensions.contains("GL_ARB_timer_query")
        || extensions.contains("GL_EXT_disjoint_timer_query")
}

#[derive(Debug)]
struct GlGeometry {
    vertex_array: glow::VertexArray,
    vertex_buffer: glow::Buffer,
    index_buffer: Option<glow::Buffer>,
}

/// An OpenGL 3.3+ backend built on `glow`.
///
/// GL object names are kept behind the engine's ids, which are allocated from a
/// per-backend counter starting at 1. The context must be current on the calling
/// thread for every call.
pub struct GlBackend {
    gl: Arc<glow::Context>,
    tag: BackendTag,
    clock: ProfileClock,
    id_string: String,
    debug_groups: bool,
    next_id: u32,
    programs: HashMap<ProgramId, glow::Program>,
    textures: HashMap<TextureId, glow::Texture>,
    buffers: HashMap<BufferId, glow::Buffer>,
    geometry: HashMap<VertexArrayId, GlGeometry>,
    uniform_locations: UniformLocationTable<glow::UniformLocation>,
}

impl fmt::Debug for GlBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GlBackend")
            .field("tag", &self.tag)
            .field("id_string", &self.id_string)
            .field("debug_groups", &self.debug_groups)
            .field("gpu_timestamps", &self.gpu_timestamps())
            .field("programs", &self.programs.len())
            .field("textures", &self.textures.len())
            .field("buffers", &self.buffers.len())
            .field("vertex_arrays", &self.geometry.len())
            .field("uniform_locations", &self.uniform_locations.len())
            .finish()
    }
}

impl GlBackend {
    /// Wraps a context that is current on this thread.
    pub fn new(gl: Arc<glow::Context>) -> Self {
        // SAFETY: the caller guarantees the context is current.
        let (version, renderer, debug_groups) = unsafe {
            (
                gl.get_parameter_string(glow::VERSION),
                gl.get_parameter_string(glow::RENDERER),
                gl.supports_debug(),
            )
        };
        let id_string = format!("OpenGL {version} ({renderer})");
        log::info!("Using {id_string}");
        if !debug_groups {
            log::debug!("KHR_debug unavailable, debug groups are disabled");
        }
        let clock = Self::create_profile_clock(&gl);

        Self {
            gl,
            tag: BackendTag::unique(),
            clock,
            id_string,
            debug_groups,
            next_id: 1,
            programs: HashMap::new(),
            textures: HashMap::new(),
            buffers: HashMap::new(),
            geometry: HashMap::new(),
            uniform_locations: UniformLocationTable::new(),
        }
    }

    fn create_profile_clock(gl: &glow::Context) -> ProfileClock {
        let version = gl.version();
        if !timer_queries_supported(
            version.major,
            version.minor,
            version.is_embedded,
            gl.supported_extensions(),
        ) {
            log::debug!("Timer queries unavailable, profiling scopes use CPU time");
            return ProfileClock::Wall(Stopwatch::new());
        }
        // SAFETY: the caller guarantees the context is current.
        match unsafe { gl.create_query() } {
            Ok(query) => ProfileClock::GpuTimestamp(query),
            Err(err) => {
                log::warn!("Failed to create a timestamp query ({err}), using CPU time");
                ProfileClock::Wall(Stopwatch::new())
            }
        }
    }

    /// The shared context.
    pub fn context(&self) -> &Arc<glow::Context> {
        &self.gl
    }

    /// Whether profiling timestamps are GPU time rather than CPU time.
    pub fn gpu_timestamps(&self) -> bool {
        matches!(self.clock, ProfileClock::GpuTimestamp(_))
    }

    fn allocate_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Makes a texture created by asset code bindable through the renderer.
    pub fn register_texture(&mut self, texture: glow::Texture) -> TextureId {
        let id = TextureId(self.allocate_id());
        self.textures.insert(id, texture);
        id
    }

    /// Removes a texture from the backend and hands the GL object back to its
    /// owner. Call [`Renderer::forget_texture`] before deleting it.
    /// ## Errors
    /// * `ResourceError::InvalidHandle` - If `texture` is not registered.
    ///
    /// [`Renderer::forget_texture`]: rwrender_core::renderer::Renderer::forget_texture
    pub fn unregister_texture(
        &mut self,
        texture: TextureId,
    ) -> Result<glow::Texture, ResourceError> {
        self.textures
            .remove(&texture)
            .ok_or_else(|| ResourceError::InvalidHandle(format!("{texture:?}")))
    }

    /// Enables and describes every attribute of `layout` on the currently bound
    /// vertex array, reading from the currently bound array buffer.
    pub fn configure_vertex_layout(&self, layout: &VertexLayout) {
        for attribute in layout.attributes() {
            let location = attribute.semantic.location();
            // SAFETY: the layout was validated to fit within its stride.
            unsafe {
                self.gl.enable_vertex_attrib_array(location);
                self.gl.vertex_attrib_pointer_f32(
                    location,
                    attribute.size as i32,
                    attribute.kind.into_gl(),
                    attribute.kind.normalized(),
                    attribute.stride as i32,
                    attribute.offset as i32,
                );
            }
        }
    }

    /// Uploads vertices (and optionally indices) into a new vertex array.
    ///
    /// This changes GL bindings behind the renderer: call
    /// [`Renderer::invalidate`] afterwards, or create geometry before drawing.
    ///
    /// [`Renderer::invalidate`]: rwrender_core::renderer::Renderer::invalidate
    pub fn create_vertex_array<V: Vertex>(
        &mut self,
        vertices: &[V],
        indices: Option<&[u32]>,
    ) -> Result<VertexArrayId, ResourceError> {
        let layout = V::vertex_layout().map_err(|e| ResourceError::BackendError(e.to_string()))?;
        let gl = Arc::clone(&self.gl);

        // SAFETY: every object created here is either stored or deleted before returning.
        let geometry = unsafe {
            let vertex_array = gl
                .create_vertex_array()
                .map_err(ResourceError::BackendError)?;
            let vertex_buffer = match gl.create_buffer() {
                Ok(buffer) => buffer,
                Err(err) => {
                    gl.delete_vertex_array(vertex_array);
                    return Err(ResourceError::BackendError(err));
                }
            };

            gl.bind_vertex_array(Some(vertex_array));
            gl.bind_buffer(glow::ARRAY_BUFFER, Some(vertex_buffer));
            gl.buffer_data_u8_slice(
                glow::ARRAY_BUFFER,
                bytemuck::cast_slice(vertices),
                glow::STATIC_DRAW,
            );
            self.configure_vertex_layout(&layout);

            let index_buffer = match indices {
                Some(indices) => match gl.create_buffer() {
                    Ok(buffer) => {
                        gl.bind_buffer(glow::ELEMENT_ARRAY_BUFFER, Some(buffer));
                        gl.buffer_data_u8_slice(
                            glow::ELEMENT_ARRAY_BUFFER,
                            bytemuck::cast_slice(indices),
                            glow::STATIC_DRAW,
                        );
                        Some(buffer)
                    }
                    Err(err) => {
                        gl.bind_vertex_array(None);
                        gl.delete_buffer(vertex_buffer);
                        gl.delete_vertex_array(vertex_array);
                        return Err(ResourceError::BackendError(err));
                    }
                },
                None => None,
            };

            gl.bind_vertex_array(None);
            gl.bind_buffer(glow::ARRAY_BUFFER, None);

            GlGeometry {
                vertex_array,
                vertex_buffer,
                index_buffer,
            }
        };

        let id = VertexArrayId(self.allocate_id());
        log::debug!(
            "Created {id:?} with {} vertices and {} indices",
            vertices.len(),
            indices.map_or(0, <[u32]>::len)
        );
        self.geometry.insert(id, geometry);
        Ok(id)
    }

    /// Deletes a vertex array and its buffers. Call
    /// [`Renderer::forget_vertex_array`] first.
    /// ## Errors
    /// * `ResourceError::InvalidHandle` - If `vertex_array` is not live.
    ///
    /// [`Renderer::forget_vertex_array`]: rwrender_core::renderer::Renderer::forget_vertex_array
    pub fn destroy_vertex_array(
        &mut self,
        vertex_array: VertexArrayId,
    ) -> Result<(), ResourceError> {
        let geometry = self
            .geometry
            .remove(&vertex_array)
            .ok_or_else(|| ResourceError::InvalidHandle(format!("{vertex_array:?}")))?;
        // SAFETY: the objects were created by this backend and are no longer referenced.
        unsafe {
            self.gl.delete_vertex_array(geometry.vertex_array);
            self.gl.delete_buffer(geometry.vertex_buffer);
            if let Some(buffer) = geometry.index_buffer {
                self.gl.delete_buffer(buffer);
            }
        }
        Ok(())
    }

    fn compile_stage(
        &self,
        kind: u32,
        stage: &str,
        source: &str,
    ) -> Result<glow::Shader, ShaderError> {
        // SAFETY: the shader is deleted on failure.
        unsafe {
            let shader = self
                .gl
                .create_shader(kind)
                .map_err(ShaderError::CreationFailed)?;
            self.gl.shader_source(shader, source);
            self.gl.compile_shader(shader);
            if !self.gl.get_shader_compile_status(shader) {
                let details = self.gl.get_shader_info_log(shader);
                self.gl.delete_shader(shader);
                return Err(ShaderError::CompilationError {
                    stage: stage.to_owned(),
                    details,
                });
            }
            Ok(shader)
        }
    }
}

/// Looks up the GL object behind an id. The null id maps to `None`; unknown ids
/// are reported and also map to `None`.
fn resolve<K, V>(objects: &HashMap<K, V>, id: K, is_null: bool) -> Option<V>
where
    K: std::hash::Hash + Eq + fmt::Debug,
    V: Copy,
{
    if is_null {
        return None;
    }
    let object = objects.get(&id).copied();
    if object.is_none() {
        log::error!("Unknown GL object {id:?}, binding null instead");
    }
    object
}

impl GraphicsBackend for GlBackend {
    fn id_string(&self) -> String {
        self.id_string.clone()
    }

    fn tag(&self) -> BackendTag {
        self.tag
    }

    fn compile_program(
        &mut self,
        vertex_source: &str,
        fragment_source: &str,
    ) -> Result<ProgramId, ShaderError> {
        let vertex = self.compile_stage(glow::VERTEX_SHADER, "vertex", vertex_source)?;
        let fragment = match self.compile_stage(glow::FRAGMENT_SHADER, "fragment", fragment_source) {
            Ok(shader) => shader,
            Err(err) => {
                // SAFETY: the vertex stage is not attached to anything yet.
                unsafe { self.gl.delete_shader(vertex) };
                return Err(err);
            }
        };

        // SAFETY: both stages are detached and deleted whatever the link outcome.
        let linked = unsafe {
            match self.gl.create_program() {
                Ok(program) => {
                    self.gl.attach_shader(program, vertex);
                    self.gl.attach_shader(program, fragment);
                    self.gl.link_program(program);
                    self.gl.detach_shader(program, vertex);
                    self.gl.detach_shader(program, fragment);
                    if self.gl.get_program_link_status(program) {
                        Ok(program)
                    } else {
                        let details = self.gl.get_program_info_log(program);
                        self.gl.delete_program(program);
                        Err(ShaderError::LinkError { details })
                    }
                }
                Err(err) => Err(ShaderError::CreationFailed(err)),
            }
        };
        // SAFETY: see above.
        unsafe {
            self.gl.delete_shader(vertex);
            self.gl.delete_shader(fragment);
        }

        let program = linked?;
        let id = ProgramId(self.allocate_id());
        self.programs.insert(id, program);
        Ok(id)
    }

    fn destroy_program(&mut self, program: ProgramId) -> Result<(), ResourceError> {
        let native = self
            .programs
            .remove(&program)
            .ok_or_else(|| ResourceError::InvalidHandle(format!("{program:?}")))?;
        let dropped = self.uniform_locations.remove_program(program);
        log::trace!("Dropped {dropped} uniform location(s) of {program:?}");
        // SAFETY: the renderer forgot the program before destroying it.
        unsafe { self.gl.delete_program(native) };
        Ok(())
    }

    fn bind_program(&mut self, program: ProgramId) {
        let native = resolve(&self.programs, program, program.is_null());
        // SAFETY: the program is alive or null.
        unsafe { self.gl.use_program(native) };
    }

    fn uniform_location(&mut self, program: ProgramId, name: &str) -> UniformLocation {
        let Some(native) = resolve(&self.programs, program, program.is_null()) else {
            return UniformLocation::NOT_FOUND;
        };
        // SAFETY: the program is alive.
        match unsafe { self.gl.get_uniform_location(native, name) } {
            Some(location) => self.uniform_locations.insert(program, location),
            None => UniformLocation::NOT_FOUND,
        }
    }

    fn set_uniform(&mut self, location: UniformLocation, value: &UniformValue) {
        let Some(native) = self.uniform_locations.get(location) else {
            return;
        };
        let native = Some(native);
        // SAFETY: locations are only handed out for live programs.
        unsafe {
            match *value {
                UniformValue::Int(v) => self.gl.uniform_1_i32(native, v),
                UniformValue::Float(v) => self.gl.uniform_1_f32(native, v),
                UniformValue::Vec2(v) => self.gl.uniform_2_f32(native, v.x, v.y),
                UniformValue::Vec3(v) => self.gl.uniform_3_f32(native, v.x, v.y, v.z),
                UniformValue::Vec4(v) => self.gl.uniform_4_f32(native, v.x, v.y, v.z, v.w),
                UniformValue::Mat4(m) => {
                    self.gl
                        .uniform_matrix_4_f32_slice(native, false, &m.to_cols_array())
                }
            }
        }
    }

    fn uniform_block_binding(&mut self, program: ProgramId, block_name: &str, binding_point: u32) {
        let Some(native) = resolve(&self.programs, program, program.is_null()) else {
            return;
        };
        // SAFETY: the program is alive.
        unsafe {
            match self.gl.get_uniform_block_index(native, block_name) {
                Some(index) => self.gl.uniform_block_binding(native, index, binding_point),
                None => log::trace!("{program:?} has no uniform block '{block_name}'"),
            }
        }
    }

    fn bind_texture(&mut self, unit: u32, texture: TextureId) {
        let native = resolve(&self.textures, texture, texture.is_null());
        // SAFETY: the texture is alive or null.
        unsafe {
            self.gl.active_texture(glow::TEXTURE0 + unit);
            self.gl.bind_texture(glow::TEXTURE_2D, native);
        }
    }

    fn create_uniform_buffer(
        &mut self,
        binding_point: u32,
        size: usize,
    ) -> Result<BufferId, ResourceError> {
        let size = i32::try_from(size)
            .map_err(|_| ResourceError::BackendError(format!("buffer size {size} too large")))?;
        // SAFETY: the buffer is stored below.
        let native = unsafe {
            let buffer = self
                .gl
                .create_buffer()
                .map_err(ResourceError::BackendError)?;
            self.gl.bind_buffer(glow::UNIFORM_BUFFER, Some(buffer));
            self.gl
                .buffer_data_size(glow::UNIFORM_BUFFER, size, glow::DYNAMIC_DRAW);
            self.gl
                .bind_buffer_base(glow::UNIFORM_BUFFER, binding_point, Some(buffer));
            buffer
        };
        let id = BufferId(self.allocate_id());
        self.buffers.insert(id, native);
        log::debug!("Created uniform {id:?} of {size} bytes on binding {binding_point}");
        Ok(id)
    }

    fn destroy_buffer(&mut self, buffer: BufferId) -> Result<(), ResourceError> {
        let native = self
            .buffers
            .remove(&buffer)
            .ok_or_else(|| ResourceError::InvalidHandle(format!("{buffer:?}")))?;
        // SAFETY: the renderer forgot the buffer before destroying it.
        unsafe { self.gl.delete_buffer(native) };
        Ok(())
    }

    fn bind_uniform_buffer(&mut self, buffer: BufferId) {
        let native = resolve(&self.buffers, buffer, buffer.is_null());
        // SAFETY: the buffer is alive or null.
        unsafe { self.gl.bind_buffer(glow::UNIFORM_BUFFER, native) };
    }

    fn upload_uniform_buffer(&mut self, data: &[u8]) {
        // SAFETY: writes to whatever uniform buffer the renderer bound.
        unsafe {
            self.gl
                .buffer_data_u8_slice(glow::UNIFORM_BUFFER, data, glow::DYNAMIC_DRAW)
        };
    }

    fn bind_vertex_array(&mut self, vertex_array: VertexArrayId) {
        let native = if vertex_array.is_null() {
            None
        } else {
            let native = self.geometry.get(&vertex_array).map(|g| g.vertex_array);
            if native.is_none() {
                log::error!("Unknown GL object {vertex_array:?}, binding null instead");
            }
            native
        };
        // SAFETY: the vertex array is alive or null.
        unsafe { self.gl.bind_vertex_array(native) };
    }

    fn draw_indexed(
        &mut self,
        topology: PrimitiveTopology,
        index_format: IndexFormat,
        count: u32,
        byte_offset: u32,
    ) {
        // SAFETY: the bound vertex array owns an index buffer covering the range.
        unsafe {
            self.gl.draw_elements(
                topology.into_gl(),
                count as i32,
                index_format.into_gl(),
                byte_offset as i32,
            )
        };
    }

    fn draw_arrays(&mut self, topology: PrimitiveTopology, first: u32, count: u32) {
        // SAFETY: the bound vertex array covers the range.
        unsafe {
            self.gl
                .draw_arrays(topology.into_gl(), first as i32, count as i32)
        };
    }

    fn clear(&mut self, colour: Vec4, clear_colour: bool, clear_depth: bool) {
        // SAFETY: plain state calls.
        unsafe {
            self.gl.clear_color(colour.x, colour.y, colour.z, colour.w);
            self.gl.clear(clear_mask(clear_colour, clear_depth));
        }
    }

    fn set_viewport(&mut self, size: IVec2) {
        // SAFETY: plain state call.
        unsafe { self.gl.viewport(0, 0, size.x, size.y) };
    }

    fn push_debug_group(&mut self, title: &str) {
        if self.debug_groups {
            // SAFETY: KHR_debug support was checked at creation.
            unsafe {
                self.gl
                    .push_debug_group(glow::DEBUG_SOURCE_APPLICATION, 0, title)
            };
        }
    }

    fn pop_debug_group(&mut self) {
        if self.debug_groups {
            // SAFETY: KHR_debug support was checked at creation.
            unsafe { self.gl.pop_debug_group() };
        }
    }

    fn timestamp_ns(&self) -> u64 {
        match &self.clock {
            ProfileClock::GpuTimestamp(query) => {
                let mut nanos: u64 = 0;
                // SAFETY: this backend never binds a QUERY_BUFFER, so the offset is
                // taken as a pointer to `nanos`, which outlives the blocking read.
                unsafe {
                    self.gl.query_counter(*query, glow::TIMESTAMP);
                    self.gl.get_query_parameter_u64_with_offset(
                        *query,
                        glow::QUERY_RESULT,
                        std::ptr::addr_of_mut!(nanos) as usize,
                    );
                }
                nanos
            }
            ProfileClock::Wall(stopwatch) => stopwatch.elapsed_nanos().unwrap_or(0),
        }
    }
}
