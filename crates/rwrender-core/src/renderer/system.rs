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

//! The backend-independent renderer used by scene traversal code.

use crate::math::{IVec2, Mat4, Vec4};
use crate::renderer::api::*;
use crate::renderer::counters::{CounterSet, FrameCounters};
use crate::renderer::error::{RenderError, ResourceError, ShaderError, UsageError};
use crate::renderer::profile::{DebugProfileStack, ProfileInfo};
use crate::renderer::settings::RendererSettings;
use crate::renderer::state_cache::RenderStateCache;
use crate::renderer::traits::GraphicsBackend;
use std::mem::size_of;

/// Drives a [`GraphicsBackend`], eliding redundant state changes and keeping
/// frame statistics and profiling scopes.
///
/// The renderer assumes it is the only code changing backend bindings. After
/// anything else touched them (including through [`Renderer::backend_mut`]),
/// call [`Renderer::invalidate`].
///
/// Tear down with [`Renderer::shutdown`]; it releases the uniform buffers and
/// reports debug groups left open.
#[derive(Debug)]
pub struct Renderer<B: GraphicsBackend> {
    backend: B,
    settings: RendererSettings,
    cache: RenderStateCache,
    counters: FrameCounters,
    profile: DebugProfileStack,
    active_program: Option<ShaderHandle>,
    scene_buffer: BufferId,
    object_buffer: BufferId,
    scene_data: SceneUniformData,
    last_scene_upload: Option<SceneUniformData>,
    viewport: IVec2,
    projection_2d: Mat4,
    released: bool,
}

impl<B: GraphicsBackend> Renderer<B> {
    /// Creates a renderer, allocating the scene and object uniform buffers on
    /// their configured binding points.
    /// ## Errors
    /// * `RenderError::InitializationFailed` - If both uniform blocks are configured
    ///   on the same binding point.
    /// * `RenderError::ResourceError` - If a uniform buffer cannot be created.
    pub fn new(mut backend: B, settings: RendererSettings) -> Result<Self, RenderError> {
        if settings.scene_block_binding == settings.object_block_binding {
            return Err(RenderError::InitializationFailed(format!(
                "scene and object uniform blocks share binding point {}",
                settings.scene_block_binding
            )));
        }

        let scene_buffer = backend
            .create_uniform_buffer(settings.scene_block_binding, size_of::<SceneUniformData>())?;
        let object_buffer = match backend
            .create_uniform_buffer(settings.object_block_binding, size_of::<ObjectUniformData>())
        {
            Ok(buffer) => buffer,
            Err(err) => {
                if let Err(cleanup) = backend.destroy_buffer(scene_buffer) {
                    log::warn!("Failed to release the scene uniform buffer: {cleanup}");
                }
                return Err(err.into());
            }
        };

        log::info!("Renderer initialized on {}", backend.id_string());
        log::debug!(
            "Scene uniforms in {scene_buffer:?} (binding {}), object uniforms in {object_buffer:?} (binding {})",
            settings.scene_block_binding,
            settings.object_block_binding
        );

        Ok(Self {
            backend,
            settings,
            cache: RenderStateCache::new(),
            counters: FrameCounters::new(),
            profile: DebugProfileStack::new(),
            active_program: None,
            scene_buffer,
            object_buffer,
            scene_data: SceneUniformData::default(),
            last_scene_upload: None,
            viewport: IVec2::ZERO,
            projection_2d: Mat4::IDENTITY,
            released: false,
        })
    }

    /// The backend's name and version, for diagnostics.
    pub fn id_string(&self) -> String {
        self.backend.id_string()
    }

    /// The settings the renderer was created with.
    pub fn settings(&self) -> &RendererSettings {
        &self.settings
    }

    /// The backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Mutable access to the backend. Call [`Renderer::invalidate`] after changing
    /// any binding through it.
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// The binding cache.
    pub fn state_cache(&self) -> &RenderStateCache {
        &self.cache
    }

    // --- Shaders ---

    /// Compiles and links a program.
    ///
    /// On failure the driver log is returned in the error and logged; callers
    /// typically fall back to a default shader.
    pub fn create_shader(
        &mut self,
        vertex_source: &str,
        fragment_source: &str,
    ) -> Result<ShaderHandle, ShaderError> {
        self.build_shader(None, vertex_source, fragment_source)
    }

    /// Same as [`Renderer::create_shader`], with a label used in logs.
    pub fn create_labeled_shader(
        &mut self,
        label: &str,
        vertex_source: &str,
        fragment_source: &str,
    ) -> Result<ShaderHandle, ShaderError> {
        self.build_shader(Some(label), vertex_source, fragment_source)
    }

    fn build_shader(
        &mut self,
        label: Option<&str>,
        vertex_source: &str,
        fragment_source: &str,
    ) -> Result<ShaderHandle, ShaderError> {
        let name = label.unwrap_or("<unnamed>");
        match self.backend.compile_program(vertex_source, fragment_source) {
            Ok(program) => {
                log::debug!("Created shader '{name}' as {program:?}");
                Ok(ShaderHandle::new(
                    program,
                    self.backend.tag(),
                    label.map(str::to_owned),
                ))
            }
            Err(err) => {
                log::error!("Failed to create shader '{name}': {err}");
                Err(err)
            }
        }
    }

    /// Releases a program. The handle's cached binding is forgotten first so the
    /// id can be safely recycled by the backend.
    /// ## Errors
    /// * `RenderError::Usage` - If the handle belongs to another backend.
    /// * `RenderError::ResourceError` - If the backend no longer knows the program,
    ///   for example because the handle was already destroyed.
    pub fn destroy_shader(&mut self, handle: ShaderHandle) -> Result<(), RenderError> {
        self.check_handle(&handle)?;
        self.cache.forget_program(handle.program());
        if self.active_program.as_ref() == Some(&handle) {
            self.active_program = None;
        }
        self.backend
            .destroy_program(handle.program())
            .inspect_err(|err| log::error!("Failed to destroy shader: {err}"))?;
        log::debug!("Destroyed shader {:?}", handle.program());
        Ok(())
    }

    /// Makes the program active, unless it already is.
    pub fn use_program(&mut self, handle: &ShaderHandle) -> Result<(), UsageError> {
        self.check_handle(handle)?;
        self.cache
            .ensure_program(&mut self.backend, &mut self.counters, handle.program());
        if self.active_program.as_ref() != Some(handle) {
            self.active_program = Some(handle.clone());
        }
        Ok(())
    }

    /// The program made active by the last [`Renderer::use_program`].
    pub fn active_program(&self) -> Option<&ShaderHandle> {
        self.active_program.as_ref()
    }

    /// Location of `name` in the program. The backend is queried at most once per
    /// handle and name.
    pub fn resolve_uniform_location(
        &mut self,
        handle: &ShaderHandle,
        name: &str,
    ) -> Result<UniformLocation, UsageError> {
        self.check_handle(handle)?;
        let backend = &mut self.backend;
        Ok(handle.uniform_location_with(name, |program, name| {
            backend.uniform_location(program, name)
        }))
    }

    /// Assigns a uniform block of the program to a binding point.
    pub fn set_program_block_binding(
        &mut self,
        handle: &ShaderHandle,
        block_name: &str,
        binding_point: u32,
    ) -> Result<(), UsageError> {
        self.check_handle(handle)?;
        self.backend
            .uniform_block_binding(handle.program(), block_name, binding_point);
        Ok(())
    }

    /// Points a sampler uniform at a texture unit.
    pub fn set_uniform_texture(
        &mut self,
        handle: &ShaderHandle,
        name: &str,
        unit: i32,
    ) -> Result<(), UsageError> {
        self.set_uniform(handle, name, UniformValue::Int(unit))
    }

    /// Activates the program and writes a uniform.
    ///
    /// Names the program does not declare are ignored.
    pub fn set_uniform(
        &mut self,
        handle: &ShaderHandle,
        name: &str,
        value: impl Into<UniformValue>,
    ) -> Result<(), UsageError> {
        self.use_program(handle)?;
        let location = self.resolve_uniform_location(handle, name)?;
        if !location.is_found() {
            log::trace!("Ignoring uniform '{name}' absent from {:?}", handle.program());
            return Ok(());
        }
        self.backend.set_uniform(location, &value.into());
        Ok(())
    }

    /// Writes a uniform of the active program.
    /// ## Errors
    /// * `UsageError::NoActiveProgram` - If no program is active.
    pub fn set_active_uniform(
        &mut self,
        name: &str,
        value: impl Into<UniformValue>,
    ) -> Result<(), UsageError> {
        let handle = self
            .active_program
            .clone()
            .ok_or_else(|| report(UsageError::NoActiveProgram))?;
        self.set_uniform(&handle, name, value)
    }

    fn check_handle(&self, handle: &ShaderHandle) -> Result<(), UsageError> {
        let backend = self.backend.tag();
        if handle.backend() != backend {
            return Err(report(UsageError::ForeignHandle {
                handle: handle.backend(),
                backend,
            }));
        }
        Ok(())
    }

    // --- Frame ---

    /// Clears the selected planes. Never elided.
    pub fn clear(&mut self, colour: Vec4, clear_colour: bool, clear_depth: bool) {
        self.backend.clear(colour, clear_colour, clear_depth);
    }

    /// Uploads the per-frame scene uniforms.
    ///
    /// The upload is always issued unless `elide_redundant_scene_uploads` is
    /// set, the scene buffer is still bound and `data` equals the last upload.
    pub fn set_scene_parameters(&mut self, data: &SceneUniformData) {
        self.scene_data = *data;
        let rebound =
            self.cache
                .ensure_uniform_buffer(&mut self.backend, &mut self.counters, self.scene_buffer);

        if self.settings.elide_redundant_scene_uploads
            && !rebound
            && self.last_scene_upload.as_ref() == Some(data)
        {
            log::trace!("Elided unchanged scene upload");
            return;
        }

        self.backend.upload_uniform_buffer(bytemuck::bytes_of(data));
        self.counters.record_upload();
        self.last_scene_upload = Some(*data);
    }

    /// The scene data last passed to [`Renderer::set_scene_parameters`].
    pub fn scene_data(&self) -> &SceneUniformData {
        &self.scene_data
    }

    /// Issues an indexed draw of `params.count` indices starting at index `params.start`.
    ///
    /// A start index whose byte offset does not fit in 32 bits is logged and the
    /// draw is skipped.
    pub fn draw(&mut self, model: &Mat4, buffer: &DrawBuffer, params: &DrawParameters) {
        let Some(byte_offset) = params.start.checked_mul(buffer.index_format.size()) else {
            log::error!(
                "Skipping draw: start index {} overflows the {:?} byte offset",
                params.start,
                buffer.index_format
            );
            return;
        };
        self.prepare_draw(model, buffer, params);
        self.backend.draw_indexed(
            buffer.topology,
            buffer.index_format,
            params.count,
            byte_offset,
        );
        self.counters.record_draw(params.count);
    }

    /// Issues a non-indexed draw of `params.count` vertices starting at vertex `params.start`.
    pub fn draw_arrays(&mut self, model: &Mat4, buffer: &DrawBuffer, params: &DrawParameters) {
        self.prepare_draw(model, buffer, params);
        self.backend
            .draw_arrays(buffer.topology, params.start, params.count);
        self.counters.record_draw(params.count);
    }

    fn prepare_draw(&mut self, model: &Mat4, buffer: &DrawBuffer, params: &DrawParameters) {
        self.cache
            .ensure_vertex_array(&mut self.backend, &mut self.counters, buffer.vertex_array);

        for (unit, texture) in (0u32..).zip(params.textures.iter().copied()) {
            if unit >= self.settings.max_texture_units {
                log::warn!(
                    "Draw uses {} textures, only {} units are available",
                    params.textures.len(),
                    self.settings.max_texture_units
                );
                break;
            }
            self.cache
                .ensure_texture(&mut self.backend, &mut self.counters, unit, texture);
        }

        self.cache
            .ensure_uniform_buffer(&mut self.backend, &mut self.counters, self.object_buffer);
        let object = params.object_data(model);
        self.backend.upload_uniform_buffer(bytemuck::bytes_of(&object));
        self.counters.record_upload();
    }

    /// Sets the viewport and recomputes the 2D projection.
    ///
    /// An empty viewport (a minimized window) keeps the previous projection.
    pub fn set_viewport(&mut self, size: IVec2) {
        self.viewport = size;
        self.backend.set_viewport(size);
        if size.x <= 0 || size.y <= 0 {
            log::debug!("Keeping the 2D projection for empty viewport {size:?}");
            return;
        }
        self.projection_2d =
            Mat4::orthographic_rh_gl(0.0, size.x as f32, size.y as f32, 0.0, -1.0, 1.0);
    }

    /// The current viewport size.
    pub fn viewport(&self) -> IVec2 {
        self.viewport
    }

    /// Orthographic projection mapping viewport pixels (origin top-left) to clip space.
    pub fn projection_2d(&self) -> &Mat4 {
        &self.projection_2d
    }

    /// Forgets every cached binding and the active program.
    pub fn invalidate(&mut self) {
        self.cache.invalidate();
        self.active_program = None;
        self.last_scene_upload = None;
        log::trace!("Render state cache invalidated");
    }

    /// Drops cached bindings of a texture its owner is about to destroy.
    pub fn forget_texture(&mut self, texture: TextureId) {
        self.cache.forget_texture(texture);
    }

    /// Drops the cached binding of a vertex array its owner is about to destroy.
    pub fn forget_vertex_array(&mut self, vertex_array: VertexArrayId) {
        self.cache.forget_vertex_array(vertex_array);
    }

    /// Starts a new frame: clears the per-frame counters. Bindings are kept.
    pub fn swap(&mut self) {
        self.counters.reset_frame();
    }

    // --- Statistics ---

    /// Draw calls issued this frame.
    pub fn draw_count(&self) -> u64 {
        self.counters.frame().draws
    }

    /// Texture binds issued this frame.
    pub fn texture_count(&self) -> u64 {
        self.counters.frame().textures
    }

    /// Uniform buffer uploads issued this frame.
    pub fn buffer_count(&self) -> u64 {
        self.counters.frame().uploads
    }

    /// All counters of the current frame.
    pub fn frame_counters(&self) -> &CounterSet {
        self.counters.frame()
    }

    // --- Profiling ---

    /// Opens a profiling scope.
    /// ## Errors
    /// * `UsageError::DebugStackOverflow` - If the maximum depth is reached. No
    ///   scope is opened.
    pub fn push_debug_group(&mut self, title: &str) -> Result<(), UsageError> {
        let now = self.backend.timestamp_ns();
        self.profile
            .push(title, now, self.counters.lifetime())
            .map_err(report)?;
        if self.settings.debug_markers {
            self.backend.push_debug_group(title);
        }
        Ok(())
    }

    /// Closes the innermost profiling scope.
    ///
    /// The returned info stays readable until the next push.
    /// ## Errors
    /// * `UsageError::DebugStackUnderflow` - If no scope is open.
    pub fn pop_debug_group(&mut self) -> Result<&ProfileInfo, UsageError> {
        if self.profile.depth() > 0 && self.settings.debug_markers {
            self.backend.pop_debug_group();
        }
        let now = self.backend.timestamp_ns();
        self.profile
            .pop(now, self.counters.lifetime())
            .map_err(report)
    }

    /// Number of open profiling scopes.
    pub fn debug_depth(&self) -> usize {
        self.profile.depth()
    }

    /// Releases the uniform buffers.
    /// ## Errors
    /// * `RenderError::Usage` - If profiling scopes are still open. The buffers
    ///   are released regardless.
    /// * `RenderError::ResourceError` - If the backend rejected the release of a
    ///   uniform buffer.
    pub fn shutdown(mut self) -> Result<(), RenderError> {
        let mut release_error: Option<ResourceError> = None;
        for buffer in [self.scene_buffer, self.object_buffer] {
            self.cache.forget_uniform_buffer(buffer);
            if let Err(err) = self.backend.destroy_buffer(buffer) {
                log::error!("Failed to release uniform {buffer:?}: {err}");
                release_error.get_or_insert(err);
            }
        }
        self.released = true;
        log::info!("Renderer on {} shut down", self.backend.id_string());

        match self.profile.depth() {
            0 => match release_error {
                Some(err) => Err(err.into()),
                None => Ok(()),
            },
            depth => Err(report(UsageError::OpenDebugGroups { depth }).into()),
        }
    }
}

impl<B: GraphicsBackend> Drop for Renderer<B> {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        let depth = self.profile.depth();
        if depth > 0 {
            report(UsageError::OpenDebugGroups { depth });
        }
        log::warn!("Renderer dropped without shutdown, its uniform buffers were not released");
    }
}

fn report(err: UsageError) -> UsageError {
    log::error!("{err}");
    err
}
