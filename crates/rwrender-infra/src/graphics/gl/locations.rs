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

use std::collections::HashMap;

use rwrender_core::renderer::api::{ProgramId, UniformLocation};

/// Native uniform locations handed out as portable [`UniformLocation`] indices.
///
/// Each entry remembers the program it was queried from, so destroying a program
/// drops its locations. Indices are never reused.
#[derive(Debug)]
pub(crate) struct UniformLocationTable<L> {
    next_index: i32,
    entries: HashMap<i32, (ProgramId, L)>,
}

impl<L> UniformLocationTable<L> {
    pub fn new() -> Self {
        Self {
            next_index: 0,
            entries: HashMap::new(),
        }
    }

    /// Stores `native` for `program`. Returns [`UniformLocation::NOT_FOUND`] once
    /// the index space is exhausted.
    pub fn insert(&mut self, program: ProgramId, native: L) -> UniformLocation {
        let index = self.next_index;
        let Some(next) = index.checked_add(1) else {
            log::error!("Uniform location table exhausted, ignoring location for {program:?}");
            return UniformLocation::NOT_FOUND;
        };
        self.next_index = next;
        self.entries.insert(index, (program, native));
        UniformLocation(index)
    }

    pub fn get(&self, location: UniformLocation) -> Option<&L> {
        self.entries.get(&location.0).map(|(_, native)| native)
    }

    /// Forgets every location of `program` and returns how many were dropped.
    pub fn remove_program(&mut self, program: ProgramId) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, (owner, _)| *owner != program);
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locations_are_dropped_with_their_program() {
        let mut table = UniformLocationTable::new();
        let a = ProgramId(1);
        let b = ProgramId(2);
        let model = table.insert(a, 10u32);
        let colour = table.insert(a, 11u32);
        let fog = table.insert(b, 20u32);

        assert_eq!(table.remove_program(a), 2);

        assert_eq!(table.len(), 1);
        assert_eq!(table.get(model), None);
        assert_eq!(table.get(colour), None);
        assert_eq!(table.get(fog), Some(&20));
    }

    #[test]
    fn create_destroy_cycles_do_not_grow_the_table() {
        let mut table = UniformLocationTable::new();
        let first = table.insert(ProgramId(1), 1);
        table.remove_program(ProgramId(1));
        for id in 2..=100 {
            let program = ProgramId(id);
            table.insert(program, id);
            table.remove_program(program);
        }

        assert_eq!(table.len(), 0);
        assert_eq!(table.get(first), None, "old indices must not resolve");
        assert_eq!(table.insert(ProgramId(101), 0), UniformLocation(100));
    }

    #[test]
    fn not_found_never_resolves() {
        let mut table = UniformLocationTable::new();
        table.insert(ProgramId(1), 5u32);
        assert_eq!(table.get(UniformLocation::NOT_FOUND), None);
    }
}
