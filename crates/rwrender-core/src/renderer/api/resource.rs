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

//! Opaque identifiers for backend-owned GPU objects.
//!
//! Each id wraps the backend's raw integer name. The value `0` is the null object:
//! binding it is an explicit unbind and is cached like any other binding.

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

/// An opaque handle to a linked shader program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProgramId(pub u32);

/// An opaque handle to a texture object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(pub u32);

/// An opaque handle to a GPU buffer object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BufferId(pub u32);

/// An opaque handle to a vertex array (the backend object behind a draw buffer).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VertexArrayId(pub u32);

macro_rules! null_id {
    ($($ty:ident),*) => {
        $(
            impl $ty {
                /// The null object. Binding it unbinds the slot.
                pub const NULL: Self = Self(0);

                /// Returns `true` if this is the null object.
                #[inline]
                pub fn is_null(self) -> bool {
                    self.0 == 0
                }
            }
        )*
    };
}

null_id!(ProgramId, TextureId, BufferId, VertexArrayId);

/// Identifies the backend instance that created a handle.
///
/// Ids are only meaningful to the backend that allocated them; the tag lets the
/// renderer reject handles coming from a different backend instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BackendTag(u32);

static NEXT_BACKEND_TAG: AtomicU32 = AtomicU32::new(1);

impl BackendTag {
    /// Allocates a tag that is unique for the lifetime of the process.
    pub fn unique() -> Self {
        Self(NEXT_BACKEND_TAG.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the raw tag value.
    pub fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for BackendTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "backend#{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_ids_are_distinct_values() {
        assert!(TextureId::NULL.is_null());
        assert!(!TextureId(3).is_null());
        assert_ne!(TextureId::NULL, TextureId(1));
        assert_eq!(BufferId::NULL, BufferId(0));
    }

    #[test]
    fn backend_tags_are_unique() {
        let a = BackendTag::unique();
        let b = BackendTag::unique();
        assert_ne!(a, b);
        assert_eq!(format!("{a}"), format!("backend#{}", a.get()));
    }
}
