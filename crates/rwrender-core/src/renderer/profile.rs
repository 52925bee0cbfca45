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

//! Nested profiling scopes measured against the renderer counters.

use crate::renderer::counters::CounterSet;
use crate::renderer::error::UsageError;

/// Maximum number of nested profiling scopes.
pub const MAX_DEBUG_DEPTH: usize = 5;

/// Measurements of one closed profiling scope.
///
/// Counts include everything issued while the scope was open, nested scopes
/// included.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileInfo {
    /// Backend timestamp at which the scope was opened, in nanoseconds.
    pub timer_start: u64,
    /// Time the scope was open, in nanoseconds.
    pub duration: u64,
    /// Elements submitted by draws.
    pub primitives: u64,
    /// Draw calls.
    pub draws: u64,
    /// Texture binds.
    pub textures: u64,
    /// Draw buffer binds.
    pub buffers: u64,
    /// Uniform buffer uploads.
    pub uploads: u64,
}

#[derive(Debug, Clone, Default)]
struct ProfileSlot {
    title: String,
    baseline: CounterSet,
    info: ProfileInfo,
}

/// A fixed-capacity stack of open profiling scopes.
///
/// Slot `i` holds the scope opened at depth `i`. Once popped, the slot keeps
/// the scope's [`ProfileInfo`] until the next push at that depth.
#[derive(Debug, Clone, Default)]
pub struct DebugProfileStack {
    slots: [ProfileSlot; MAX_DEBUG_DEPTH],
    depth: usize,
}

impl DebugProfileStack {
    /// Creates an empty stack.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of currently open scopes.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Title of the innermost open scope.
    pub fn current_title(&self) -> Option<&str> {
        self.depth
            .checked_sub(1)
            .map(|top| self.slots[top].title.as_str())
    }

    /// Opens a scope, capturing `now` and the lifetime `counters` as its baseline.
    ///
    /// At maximum depth the stack is left unchanged and an error is returned.
    pub fn push(&mut self, title: &str, now: u64, counters: &CounterSet) -> Result<(), UsageError> {
        if self.depth >= MAX_DEBUG_DEPTH {
            return Err(UsageError::DebugStackOverflow {
                title: title.to_owned(),
                max_depth: MAX_DEBUG_DEPTH,
            });
        }

        let slot = &mut self.slots[self.depth];
        slot.title.clear();
        slot.title.push_str(title);
        slot.baseline = *counters;
        slot.info = ProfileInfo {
            timer_start: now,
            ..Default::default()
        };
        self.depth += 1;
        Ok(())
    }

    /// Closes the innermost scope and returns its measurements.
    pub fn pop(&mut self, now: u64, counters: &CounterSet) -> Result<&ProfileInfo, UsageError> {
        if self.depth == 0 {
            return Err(UsageError::DebugStackUnderflow);
        }
        self.depth -= 1;

        let slot = &mut self.slots[self.depth];
        let delta = counters.since(&slot.baseline);
        let timer_start = slot.info.timer_start;
        slot.info = ProfileInfo {
            timer_start,
            duration: now.saturating_sub(timer_start),
            primitives: delta.primitives,
            draws: delta.draws,
            textures: delta.textures,
            buffers: delta.buffers,
            uploads: delta.uploads,
        };
        Ok(&slot.info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counters(draws: u64, primitives: u64) -> CounterSet {
        CounterSet {
            draws,
            primitives,
            ..Default::default()
        }
    }

    #[test]
    fn nested_scopes_report_their_own_deltas() {
        let mut stack = DebugProfileStack::new();

        stack.push("frame", 100, &counters(0, 0)).unwrap();
        stack.push("world", 150, &counters(2, 12)).unwrap();
        assert_eq!(stack.depth(), 2);
        assert_eq!(stack.current_title(), Some("world"));

        let inner = stack.pop(400, &counters(5, 30)).unwrap().clone();
        assert_eq!(inner.timer_start, 150);
        assert_eq!(inner.duration, 250);
        assert_eq!(inner.draws, 3);
        assert_eq!(inner.primitives, 18);

        let outer = stack.pop(500, &counters(6, 33)).unwrap();
        assert_eq!(outer.duration, 400);
        assert_eq!(outer.draws, 6);
        assert_eq!(outer.primitives, 33);
        assert_eq!(stack.depth(), 0);
    }

    #[test]
    fn overflow_leaves_the_stack_untouched() {
        let mut stack = DebugProfileStack::new();
        for i in 0..MAX_DEBUG_DEPTH {
            stack.push(&format!("level{i}"), 0, &CounterSet::default()).unwrap();
        }

        let err = stack.push("one too many", 0, &CounterSet::default()).unwrap_err();
        assert_eq!(
            err,
            UsageError::DebugStackOverflow {
                title: "one too many".to_string(),
                max_depth: MAX_DEBUG_DEPTH,
            }
        );
        assert_eq!(stack.depth(), MAX_DEBUG_DEPTH);
        assert_eq!(stack.current_title(), Some("level4"));

        for _ in 0..MAX_DEBUG_DEPTH {
            stack.pop(0, &CounterSet::default()).unwrap();
        }
        assert_eq!(stack.depth(), 0);
    }

    #[test]
    fn pop_on_empty_stack_is_rejected() {
        let mut stack = DebugProfileStack::new();
        assert_eq!(
            stack.pop(0, &CounterSet::default()).unwrap_err(),
            UsageError::DebugStackUnderflow
        );
        assert_eq!(stack.depth(), 0);
        assert_eq!(stack.current_title(), None);
    }

    #[test]
    fn clock_going_backwards_yields_zero_duration() {
        let mut stack = DebugProfileStack::new();
        stack.push("scope", 1_000, &CounterSet::default()).unwrap();
        let info = stack.pop(10, &CounterSet::default()).unwrap();
        assert_eq!(info.duration, 0);
    }
}
