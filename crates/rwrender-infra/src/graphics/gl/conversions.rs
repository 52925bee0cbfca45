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

use rwrender_core::renderer::api::{AttributeKind, IndexFormat, PrimitiveTopology};

/// A local extension trait to convert our engine's types into OpenGL enums.
/// This avoids Rust's orphan rules while keeping an idiomatic `.into_gl()` syntax.
pub trait IntoGl<T> {
    /// Consumes self and converts it into an OpenGL-compatible value.
    fn into_gl(self) -> T;
}

impl IntoGl<u32> for PrimitiveTopology {
    fn into_gl(self) -> u32 {
        match self {
            PrimitiveTopology::PointList => glow::POINTS,
            PrimitiveTopology::LineList => glow::LINES,
            PrimitiveTopology::TriangleList => glow::TRIANGLES,
            PrimitiveTopology::TriangleStrip => glow::TRIANGLE_STRIP,
        }
    }
}

impl IntoGl<u32> for IndexFormat {
    fn into_gl(self) -> u32 {
        match self {
            IndexFormat::Uint16 => glow::UNSIGNED_SHORT,
            IndexFormat::Uint32 => glow::UNSIGNED_INT,
        }
    }
}

impl IntoGl<u32> for AttributeKind {
    fn into_gl(self) -> u32 {
        match self {
            AttributeKind::Float => glow::FLOAT,
            AttributeKind::UnsignedByte => glow::UNSIGNED_BYTE,
        }
    }
}

/// Builds the `glClear` mask for the selected planes.
pub fn clear_mask(colour: bool, depth: bool) -> u32 {
    let mut mask = 0;
    if colour {
        mask |= glow::COLOR_BUFFER_BIT;
    }
    if depth {
        mask |= glow::DEPTH_BUFFER_BIT;
    }
    mask
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn topologies_map_to_gl_modes() {
        assert_eq!(PrimitiveTopology::TriangleList.into_gl(), glow::TRIANGLES);
        assert_eq!(PrimitiveTopology::TriangleStrip.into_gl(), glow::TRIANGLE_STRIP);
        assert_eq!(PrimitiveTopology::LineList.into_gl(), glow::LINES);
        assert_eq!(PrimitiveTopology::PointList.into_gl(), glow::POINTS);
    }

    #[test]
    fn index_and_attribute_types_map_to_gl_types() {
        assert_eq!(IndexFormat::Uint16.into_gl(), glow::UNSIGNED_SHORT);
        assert_eq!(IndexFormat::Uint32.into_gl(), glow::UNSIGNED_INT);
        assert_eq!(AttributeKind::Float.into_gl(), glow::FLOAT);
        assert_eq!(AttributeKind::UnsignedByte.into_gl(), glow::UNSIGNED_BYTE);
    }

    #[test]
    fn clear_mask_combines_planes() {
        assert_eq!(clear_mask(false, false), 0);
        assert_eq!(clear_mask(true, false), glow::COLOR_BUFFER_BIT);
        assert_eq!(
            clear_mask(true, true),
            glow::COLOR_BUFFER_BIT | glow::DEPTH_BUFFER_BIT
        );
    }
}
