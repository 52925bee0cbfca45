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

//! Integration tests for the renderer's state tracking against the recording backend.
//!
//! These tests check which calls actually reach the backend: repeated bindings
//! must collapse, invalidation must force rebinds and counters must follow the
//! frame boundary.

use rwrender_core::math::{IVec2, Mat4, Vec3, Vec4};
use rwrender_core::renderer::{
    DrawBuffer, DrawParameters, RenderError, Renderer, RendererSettings, ResourceError,
    SceneUniformData, ShaderError, TextureId, UniformLocation, UniformValue, UsageError,
    VertexArrayId,
};
use rwrender_infra::{Command, CommandLog, RecordingBackend};

/// Helper: a renderer over the given recording backend, plus its command log.
fn setup(backend: RecordingBackend) -> (Renderer<RecordingBackend>, CommandLog) {
    let _ = env_logger::builder().is_test(true).try_init();
    let log = backend.log();
    let renderer =
        Renderer::new(backend, RendererSettings::default()).expect("renderer creation");
    (renderer, log)
}

fn program_binds(log: &CommandLog) -> usize {
    log.count(|c| matches!(c, Command::BindProgram(_)))
}

fn texture_binds(log: &CommandLog) -> usize {
    log.count(|c| matches!(c, Command::BindTexture { .. }))
}

// ─────────────────────────────────────────────────────────────────────────────
// Program binding
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_binding_a_a_b_issues_two_program_binds() {
    // Arrange
    let (mut renderer, log) = setup(RecordingBackend::new());
    let a = renderer.create_shader("a.vert", "a.frag").unwrap();
    let b = renderer.create_shader("b.vert", "b.frag").unwrap();

    // Act
    renderer.use_program(&a).unwrap();
    renderer.use_program(&a).unwrap();
    renderer.use_program(&b).unwrap();

    // Assert
    assert_eq!(program_binds(&log), 2, "The middle bind must be elided");
    let binds: Vec<_> = log
        .snapshot()
        .into_iter()
        .filter(|c| matches!(c, Command::BindProgram(_)))
        .collect();
    assert_eq!(
        binds,
        vec![
            Command::BindProgram(a.program()),
            Command::BindProgram(b.program())
        ]
    );
}

#[test]
fn test_invalidate_forces_every_slot_to_rebind() {
    // Arrange
    let (mut renderer, log) = setup(RecordingBackend::new());
    let shader = renderer.create_shader("vs", "fs").unwrap();
    let buffer = DrawBuffer::new(VertexArrayId(7));
    let params = DrawParameters::new(6, 0).with_textures([TextureId(3)]);
    renderer.use_program(&shader).unwrap();
    renderer.draw(&Mat4::IDENTITY, &buffer, &params);
    log.clear();

    // Act
    renderer.invalidate();
    renderer.use_program(&shader).unwrap();
    renderer.draw(&Mat4::IDENTITY, &buffer, &params);

    // Assert
    assert_eq!(program_binds(&log), 1);
    assert_eq!(texture_binds(&log), 1);
    assert_eq!(
        log.count(|c| matches!(c, Command::BindVertexArray(_))),
        1,
        "Vertex array must be rebound after invalidate"
    );
    assert_eq!(
        log.count(|c| matches!(c, Command::BindUniformBuffer(_))),
        1,
        "Object uniform buffer must be rebound after invalidate"
    );
}

#[test]
fn test_destroy_shader_releases_the_program() {
    let (mut renderer, log) = setup(RecordingBackend::new());
    let shader = renderer.create_shader("vs", "fs").unwrap();
    renderer.use_program(&shader).unwrap();

    renderer.destroy_shader(shader.clone()).unwrap();

    assert_eq!(renderer.backend().live_programs(), 0);
    assert_eq!(renderer.state_cache().program(), None);
    assert!(log
        .snapshot()
        .contains(&Command::DestroyProgram(shader.program())));
}

#[test]
fn test_double_destroy_is_reported_by_the_backend() {
    let (mut renderer, log) = setup(RecordingBackend::new());
    let shader = renderer.create_shader("vs", "fs").unwrap();
    renderer.destroy_shader(shader.clone()).unwrap();

    let result = renderer.destroy_shader(shader.clone());

    assert_eq!(
        result,
        Err(RenderError::ResourceError(ResourceError::InvalidHandle(
            format!("{:?}", shader.program())
        ))),
        "A released program id must not be released twice"
    );
    assert_eq!(log.count(|c| matches!(c, Command::DestroyProgram(_))), 2);
}

#[test]
fn test_compile_failure_is_reported_to_the_caller() {
    let mut backend = RecordingBackend::new();
    backend.fail_next_compile(ShaderError::CompilationError {
        stage: "fragment".to_string(),
        details: "0:12: 'texture2D' : no matching overloaded function found".to_string(),
    });
    let (mut renderer, _log) = setup(backend);

    let result = renderer.create_labeled_shader("world", "vs", "fs");

    assert!(matches!(
        result,
        Err(ShaderError::CompilationError { ref stage, .. }) if stage == "fragment"
    ));
    // The fallback shader still compiles.
    assert!(renderer.create_shader("vs", "fs").is_ok());
}

// ─────────────────────────────────────────────────────────────────────────────
// Uniforms
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_uniform_locations_are_queried_once_per_name() {
    // Arrange
    let backend = RecordingBackend::new().with_uniform("fogColor", 5);
    let (mut renderer, log) = setup(backend);
    let shader = renderer.create_shader("vs", "fs").unwrap();

    // Act
    for _ in 0..10 {
        renderer
            .set_uniform(&shader, "fogColor", Vec3::new(0.5, 0.5, 0.6))
            .unwrap();
        renderer.set_uniform(&shader, "optional", 1.0_f32).unwrap();
    }

    // Assert
    assert_eq!(
        log.count(|c| matches!(c, Command::QueryUniform { .. })),
        2,
        "One query per name, misses included"
    );
    assert_eq!(
        log.count(|c| matches!(c, Command::SetUniform { .. })),
        10,
        "Only the declared uniform is written"
    );
    assert_eq!(shader.cached_uniform_count(), 2);
    assert_eq!(
        renderer.resolve_uniform_location(&shader, "optional").unwrap(),
        UniformLocation::NOT_FOUND
    );
}

#[test]
fn test_uniforms_target_the_active_program() {
    let backend = RecordingBackend::new().with_uniform("tex", 0);
    let (mut renderer, log) = setup(backend);
    let a = renderer.create_shader("vs", "fs").unwrap();
    let b = renderer.create_shader("vs", "fs").unwrap();
    renderer.use_program(&a).unwrap();

    renderer.set_uniform_texture(&b, "tex", 1).unwrap();
    renderer.set_active_uniform("tex", 2_i32).unwrap();

    let tail: Vec<_> = log.snapshot().into_iter().rev().take(2).collect();
    assert_eq!(
        tail,
        vec![
            Command::SetUniform {
                location: UniformLocation(0),
                value: UniformValue::Int(2),
            },
            Command::SetUniform {
                location: UniformLocation(0),
                value: UniformValue::Int(1),
            },
        ]
    );
    assert_eq!(renderer.active_program(), Some(&b));
    assert_eq!(program_binds(&log), 2);
}

#[test]
fn test_foreign_handle_is_a_usage_error() {
    let (mut first, _) = setup(RecordingBackend::new());
    let (mut second, second_log) = setup(RecordingBackend::new());
    let shader = first.create_shader("vs", "fs").unwrap();

    let result = second.set_uniform(&shader, "model", Mat4::IDENTITY);

    assert!(matches!(result, Err(UsageError::ForeignHandle { .. })));
    assert_eq!(program_binds(&second_log), 0);
}

// ─────────────────────────────────────────────────────────────────────────────
// Draws and counters
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_k_draws_count_texture_transitions_not_binds() {
    // Arrange
    let (mut renderer, log) = setup(RecordingBackend::new());
    let buffer = DrawBuffer::new(VertexArrayId(1));
    let params = DrawParameters::new(36, 0).with_textures([TextureId(10), TextureId(11)]);
    const K: u64 = 25;

    // Act
    for _ in 0..K {
        renderer.draw(&Mat4::IDENTITY, &buffer, &params);
    }

    // Assert
    assert_eq!(renderer.draw_count(), K);
    assert_eq!(renderer.texture_count(), 2);
    assert_eq!(texture_binds(&log), 2);
    assert_eq!(renderer.frame_counters().primitives, 36 * K);
    assert_eq!(renderer.buffer_count(), K, "One object upload per draw");
}

#[test]
fn test_swap_zeroes_counters_and_keeps_bindings() {
    // Arrange
    let (mut renderer, log) = setup(RecordingBackend::new());
    let buffer = DrawBuffer::new(VertexArrayId(1));
    let params = DrawParameters::new(3, 0).with_textures([TextureId(10)]);
    renderer.set_scene_parameters(&SceneUniformData::default());
    renderer.draw(&Mat4::IDENTITY, &buffer, &params);

    // Act
    renderer.swap();

    // Assert
    assert_eq!(renderer.draw_count(), 0);
    assert_eq!(renderer.texture_count(), 0);
    assert_eq!(renderer.buffer_count(), 0);
    assert_eq!(*renderer.frame_counters(), Default::default());

    renderer.draw(&Mat4::IDENTITY, &buffer, &params);
    assert_eq!(texture_binds(&log), 1, "Bindings persist across frames");
}

#[test]
fn test_draw_sequence_reaches_the_backend_in_order() {
    let (mut renderer, log) = setup(RecordingBackend::new());
    log.clear();
    let model = Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0));
    let buffer = DrawBuffer::new(VertexArrayId(4));

    renderer.draw(&model, &buffer, &DrawParameters::new(30, 3).with_textures([TextureId(9)]));

    let names: Vec<_> = log.snapshot().iter().map(Command::name).collect();
    assert_eq!(
        names,
        vec![
            "bind_vertex_array",
            "bind_texture",
            "bind_uniform_buffer",
            "upload_uniform_buffer",
            "draw_indexed",
        ]
    );
    assert!(matches!(
        log.snapshot().last(),
        Some(Command::DrawIndexed {
            count: 30,
            byte_offset: 12,
            ..
        })
    ));
}

#[test]
fn test_scene_upload_is_not_elided_by_default() {
    let (mut renderer, log) = setup(RecordingBackend::new());
    let data = SceneUniformData {
        fog_end: 300.0,
        ..Default::default()
    };

    renderer.set_scene_parameters(&data);
    renderer.set_scene_parameters(&data);

    assert_eq!(
        log.count(|c| matches!(c, Command::UploadUniformBuffer { .. })),
        2
    );
    assert_eq!(
        log.count(|c| matches!(c, Command::BindUniformBuffer(_))),
        1,
        "The binding itself is still elided"
    );
    assert_eq!(renderer.scene_data().fog_end, 300.0);
}

#[test]
fn test_scene_upload_elision_when_enabled() {
    let _ = env_logger::builder().is_test(true).try_init();
    let backend = RecordingBackend::new();
    let log = backend.log();
    let settings = RendererSettings::from_json_str(r#"{ "elide_redundant_scene_uploads": true }"#)
        .unwrap();
    let mut renderer = Renderer::new(backend, settings).unwrap();
    let data = SceneUniformData::default();

    renderer.set_scene_parameters(&data);
    renderer.set_scene_parameters(&data);

    assert_eq!(
        log.count(|c| matches!(c, Command::UploadUniformBuffer { .. })),
        1
    );
}

#[test]
fn test_clear_and_viewport() {
    let (mut renderer, log) = setup(RecordingBackend::new());

    renderer.clear(Vec4::new(0.1, 0.2, 0.3, 1.0), true, true);
    renderer.clear(Vec4::new(0.1, 0.2, 0.3, 1.0), true, true);
    renderer.set_viewport(IVec2::new(1024, 768));

    assert_eq!(log.count(|c| matches!(c, Command::Clear { .. })), 2);
    assert_eq!(
        log.snapshot().last(),
        Some(&Command::SetViewport(IVec2::new(1024, 768)))
    );
    assert_eq!(renderer.viewport(), IVec2::new(1024, 768));
    let centre = *renderer.projection_2d() * Vec4::new(512.0, 384.0, 0.0, 1.0);
    approx::assert_relative_eq!(centre.x, 0.0, epsilon = 1e-5);
    approx::assert_relative_eq!(centre.y, 0.0, epsilon = 1e-5);
}

#[test]
fn test_shutdown_releases_uniform_buffers() {
    let (renderer, log) = setup(RecordingBackend::new());
    assert_eq!(renderer.backend().live_buffers(), 2);

    renderer.shutdown().unwrap();

    assert_eq!(log.count(|c| matches!(c, Command::DestroyBuffer(_))), 2);
}
