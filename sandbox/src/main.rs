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

// rwrender Sandbox
// Drives a few scripted frames through the recording backend and reports what
// reached the graphics API.
//
// Usage: sandbox [settings.json]

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use rwrender_core::math::{IVec2, Mat4, Rgba8, Vec3, Vec4};
use rwrender_core::renderer::{
    DrawBuffer, DrawParameters, PrimitiveTopology, Renderer, RendererSettings, SceneUniformData,
    TextureId, Vertex, VertexArrayId, VertexP2, VertexP3,
};
use rwrender_infra::{CommandLog, RecordingBackend};

const FRAMES: u32 = 3;
const FRAME_NANOS: u64 = 16_666_667;

const WORLD_VERT: &str = r#"#version 330
layout(std140) uniform SceneData { mat4 projection; mat4 view; };
layout(std140) uniform ObjectData { mat4 model; };
layout(location = 0) in vec3 position;
void main() { gl_Position = projection * view * model * vec4(position, 1.0); }
"#;
const WORLD_FRAG: &str = r#"#version 330
uniform sampler2D diffuseTexture;
out vec4 colour;
void main() { colour = vec4(1.0); }
"#;
const OVERLAY_VERT: &str = r#"#version 330
uniform mat4 proj;
layout(location = 0) in vec2 position;
void main() { gl_Position = proj * vec4(position, 0.0, 1.0); }
"#;
const OVERLAY_FRAG: &str = r#"#version 330
out vec4 colour;
void main() { colour = vec4(1.0); }
"#;

fn load_settings() -> Result<RendererSettings> {
    match std::env::args().nth(1) {
        Some(path) => RendererSettings::load(&path)
            .with_context(|| format!("loading renderer settings from {path}")),
        None => Ok(RendererSettings::default()),
    }
}

fn report_commands(log: &CommandLog) {
    let mut histogram: BTreeMap<&'static str, usize> = BTreeMap::new();
    for command in log.snapshot() {
        *histogram.entry(command.name()).or_default() += 1;
    }
    log::info!("Backend received {} commands:", log.len());
    for (name, count) in histogram {
        log::info!("  {name:<24} {count}");
    }
}

fn main() -> Result<()> {
    use env_logger::{Builder, Env};

    Builder::from_env(Env::default().default_filter_or("info")).init();

    let settings = load_settings()?;
    log::info!("Renderer settings: {settings:?}");

    let backend = RecordingBackend::new()
        .with_uniform("diffuseTexture", 0)
        .with_uniform("proj", 1);
    let commands = backend.log();
    let mut renderer = Renderer::new(backend, settings)?;
    log::info!("Running on {}", renderer.id_string());

    let world = renderer.create_labeled_shader("world", WORLD_VERT, WORLD_FRAG)?;
    let overlay = renderer.create_labeled_shader("overlay", OVERLAY_VERT, OVERLAY_FRAG)?;
    let scene_binding = renderer.settings().scene_block_binding;
    let object_binding = renderer.settings().object_block_binding;
    renderer.set_program_block_binding(&world, "SceneData", scene_binding)?;
    renderer.set_program_block_binding(&world, "ObjectData", object_binding)?;
    renderer.set_uniform_texture(&world, "diffuseTexture", 0)?;

    let mesh_layout = VertexP3::vertex_layout()?;
    let overlay_layout = VertexP2::vertex_layout()?;
    log::debug!(
        "Mesh vertices are {} bytes, overlay vertices {} bytes",
        mesh_layout.stride(),
        overlay_layout.stride()
    );

    // Geometry would come from buffer construction code; the recording backend
    // accepts any id.
    let buildings = DrawBuffer::new(VertexArrayId(1));
    let vehicle = DrawBuffer::new(VertexArrayId(2));
    let mut hud = DrawBuffer::new(VertexArrayId(3));
    hud.topology = PrimitiveTopology::TriangleStrip;

    renderer.set_viewport(IVec2::new(1280, 720));

    for frame in 0..FRAMES {
        renderer.clear(Vec4::new(0.2, 0.3, 0.5, 1.0), true, true);
        renderer.push_debug_group("frame")?;

        renderer.set_scene_parameters(&SceneUniformData {
            campos: Vec4::from_vec3(Vec3::new(0.0, -10.0, 5.0), 1.0),
            fog_start: 50.0,
            fog_end: 400.0,
            ..Default::default()
        });

        renderer.push_debug_group("world")?;
        renderer.use_program(&world)?;
        for i in 0..8 {
            let model = Mat4::from_translation(Vec3::new(i as f32 * 20.0, 0.0, 0.0));
            let texture = TextureId(10 + i / 4);
            renderer.draw(
                &model,
                &buildings,
                &DrawParameters::new(36, 0).with_textures([texture]),
            );
        }
        let mut car = DrawParameters::new(120, 36).with_textures([TextureId(20), TextureId(21)]);
        car.colour = Rgba8::new(200, 30, 30, 255);
        renderer.draw(
            &Mat4::from_translation(Vec3::new(0.0, frame as f32, 0.0)),
            &vehicle,
            &car,
        );
        renderer.backend_mut().advance_clock(FRAME_NANOS / 2);
        let world_info = renderer.pop_debug_group()?;
        log::info!(
            "frame {frame} world: {} draws, {} primitives, {} texture binds, {} uploads in {} ns",
            world_info.draws,
            world_info.primitives,
            world_info.textures,
            world_info.uploads,
            world_info.duration
        );

        renderer.push_debug_group("overlay")?;
        let projection = *renderer.projection_2d();
        renderer.set_uniform(&overlay, "proj", projection)?;
        renderer.draw_arrays(&Mat4::IDENTITY, &hud, &DrawParameters::new(4, 0));
        renderer.backend_mut().advance_clock(FRAME_NANOS / 2);
        renderer.pop_debug_group()?;

        let frame_info = renderer.pop_debug_group()?;
        log::info!(
            "frame {frame}: {} draws, {} buffer binds in {} ns",
            frame_info.draws,
            frame_info.buffers,
            frame_info.duration
        );
        log::info!(
            "frame {frame} counters: draws={} textures={} uploads={}",
            renderer.draw_count(),
            renderer.texture_count(),
            renderer.buffer_count()
        );
        renderer.swap();
    }

    renderer.destroy_shader(overlay)?;
    renderer.destroy_shader(world)?;
    renderer.shutdown()?;
    report_commands(&commands);
    Ok(())
}
