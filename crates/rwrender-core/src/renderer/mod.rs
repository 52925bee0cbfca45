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

//! Backend-agnostic render state tracking.
//!
//! Scene code drives a [`Renderer`], which forwards state changes to a
//! [`GraphicsBackend`] only when they would change what the backend has bound.
//! Concrete backends live in the `rwrender-infra` crate.

pub mod api;
pub mod counters;
pub mod error;
pub mod profile;
pub mod settings;
pub mod state_cache;
pub mod system;
pub mod traits;

#[cfg(test)]
pub(crate) mod mock;

pub use self::api::*;
pub use self::counters::{CounterSet, FrameCounters};
pub use self::error::{ConfigError, LayoutError, RenderError, ResourceError, ShaderError, UsageError};
pub use self::profile::{DebugProfileStack, ProfileInfo, MAX_DEBUG_DEPTH};
pub use self::settings::RendererSettings;
pub use self::state_cache::{BindTarget, RenderStateCache};
pub use self::system::Renderer;
pub use self::traits::GraphicsBackend;
