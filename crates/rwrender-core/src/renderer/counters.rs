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

//! Render statistics gathered by the state cache and the renderer.

/// One set of render statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CounterSet {
    /// Draw calls issued.
    pub draws: u64,
    /// Elements (indices or vertices) submitted by draw calls.
    pub primitives: u64,
    /// Texture binds that reached the backend.
    pub textures: u64,
    /// Vertex array (draw buffer) binds that reached the backend.
    pub buffers: u64,
    /// Uniform buffer uploads.
    pub uploads: u64,
}

impl CounterSet {
    /// The counts accumulated since `baseline` was captured.
    pub fn since(&self, baseline: &CounterSet) -> CounterSet {
        CounterSet {
            draws: self.draws.saturating_sub(baseline.draws),
            primitives: self.primitives.saturating_sub(baseline.primitives),
            textures: self.textures.saturating_sub(baseline.textures),
            buffers: self.buffers.saturating_sub(baseline.buffers),
            uploads: self.uploads.saturating_sub(baseline.uploads),
        }
    }
}

/// Per-frame counters plus their never-reset lifetime totals.
///
/// Every event is recorded in both sets. [`FrameCounters::reset_frame`] only
/// clears the per-frame set, so deltas against a lifetime snapshot stay valid
/// across frame boundaries.
#[derive(Debug, Clone, Default)]
pub struct FrameCounters {
    frame: CounterSet,
    lifetime: CounterSet,
}

impl FrameCounters {
    /// Creates zeroed counters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts for the current frame.
    pub fn frame(&self) -> &CounterSet {
        &self.frame
    }

    /// Counts since the counters were created.
    pub fn lifetime(&self) -> &CounterSet {
        &self.lifetime
    }

    /// Starts a new frame.
    pub fn reset_frame(&mut self) {
        self.frame = CounterSet::default();
    }

    pub(crate) fn record_draw(&mut self, elements: u32) {
        for set in [&mut self.frame, &mut self.lifetime] {
            set.draws += 1;
            set.primitives += u64::from(elements);
        }
    }

    pub(crate) fn record_texture_bind(&mut self) {
        self.frame.textures += 1;
        self.lifetime.textures += 1;
    }

    pub(crate) fn record_buffer_bind(&mut self) {
        self.frame.buffers += 1;
        self.lifetime.buffers += 1;
    }

    pub(crate) fn record_upload(&mut self) {
        self.frame.uploads += 1;
        self.lifetime.uploads += 1;
    }
}
