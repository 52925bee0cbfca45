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

//! Wall-clock timing helpers.

use std::time::{Duration, Instant};

/// A simple monotonic stopwatch.
///
/// Backends without a GPU timestamp source use it to stamp profiling scopes
/// in nanoseconds relative to their own creation.
#[derive(Debug, Clone, Copy)]
pub struct Stopwatch {
    start: Option<Instant>,
}

impl Stopwatch {
    /// Creates a stopwatch that starts running immediately.
    pub fn new() -> Self {
        Self {
            start: Some(Instant::now()),
        }
    }

    /// Creates a stopwatch that has not been started yet.
    pub fn stopped() -> Self {
        Self { start: None }
    }

    /// Restarts the stopwatch from zero.
    pub fn restart(&mut self) {
        self.start = Some(Instant::now());
    }

    /// Returns the elapsed time, or `None` if the stopwatch was never started.
    pub fn elapsed(&self) -> Option<Duration> {
        self.start.map(|start| start.elapsed())
    }

    /// Returns the elapsed time in seconds.
    pub fn elapsed_secs_f64(&self) -> Option<f64> {
        self.elapsed().map(|d| d.as_secs_f64())
    }

    /// Returns the elapsed time in whole nanoseconds, saturating at `u64::MAX`.
    pub fn elapsed_nanos(&self) -> Option<u64> {
        self.elapsed()
            .map(|d| u64::try_from(d.as_nanos()).unwrap_or(u64::MAX))
    }
}

impl Default for Stopwatch {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stopped_stopwatch_reports_nothing() {
        let sw = Stopwatch::stopped();
        assert!(sw.elapsed().is_none());
        assert!(sw.elapsed_nanos().is_none());
    }

    #[test]
    fn running_stopwatch_is_monotonic() {
        let sw = Stopwatch::new();
        let a = sw.elapsed_nanos().unwrap();
        let b = sw.elapsed_nanos().unwrap();
        assert!(b >= a);
    }

    #[test]
    fn restart_starts_a_stopped_stopwatch() {
        let mut sw = Stopwatch::stopped();
        sw.restart();
        assert!(sw.elapsed_secs_f64().is_some());
    }
}
