// Copyright 2025 strata contributors
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

//! Hazard tracking for read-write (UAV-class) resources.
//!
//! Backends with explicit usage states must transition a resource into the
//! unordered-access state before a descriptor set binds it for read-write
//! use. The tracker keeps, per descriptor set, the resources occupying the
//! set's read-write slots, and a current-state table keyed by resource so
//! that rebinding a set whose resources are already in the right state
//! emits nothing. Barrier records are packed into one count-prefixed buffer
//! with a fixed per-set stride, the same layout discipline as the segment
//! heap and for the same locality reason.

use bytemuck::{Pod, Zeroable};
use std::collections::HashMap;
use strata_core::{BufferId, ResourceState, TransitionCommandList};

/// One packed transition record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Pod, Zeroable)]
#[repr(C)]
struct BarrierRecord {
    /// Widened handle of the resource to transition.
    resource: u64,
    /// Encoded [`ResourceState`] the resource is currently in.
    before: u32,
    /// Encoded [`ResourceState`] the resource must enter.
    after: u32,
}

const RECORD_SIZE: usize = std::mem::size_of::<BarrierRecord>();
/// Each set's region is a `u32` record count followed by up to
/// `uav_slots_per_set` records.
const COUNT_PREFIX_SIZE: usize = std::mem::size_of::<u32>();

fn encode_state(state: ResourceState) -> u32 {
    match state {
        ResourceState::Common => 0,
        ResourceState::ShaderResource => 1,
        ResourceState::UnorderedAccess => 2,
    }
}

fn decode_state(raw: u32) -> ResourceState {
    match raw {
        1 => ResourceState::ShaderResource,
        2 => ResourceState::UnorderedAccess,
        _ => ResourceState::Common,
    }
}

/// Tracks UAV-class resources per descriptor set and emits transition
/// barriers before a set is bound.
#[derive(Debug, Default)]
pub(crate) struct BarrierTracker {
    /// Number of read-write slots in one descriptor set.
    uav_slots_per_set: usize,
    /// The resource currently occupying each read-write slot, set-major:
    /// `resources[set * uav_slots_per_set + uav_index]`.
    resources: Vec<Option<BufferId>>,
    /// Current usage state per resource, across all sets of this heap.
    states: HashMap<BufferId, ResourceState>,
    /// Packed per-set barrier records, rebuilt on each insert call.
    records: Vec<u8>,
}

impl BarrierTracker {
    pub(crate) fn new(uav_slots_per_set: usize, num_sets: usize) -> Self {
        let stride = COUNT_PREFIX_SIZE + uav_slots_per_set * RECORD_SIZE;
        Self {
            uav_slots_per_set,
            resources: vec![None; uav_slots_per_set * num_sets],
            states: HashMap::new(),
            records: if uav_slots_per_set == 0 {
                Vec::new()
            } else {
                vec![0; stride * num_sets]
            },
        }
    }

    /// Byte stride of one set's region in the packed record buffer.
    fn stride(&self) -> usize {
        COUNT_PREFIX_SIZE + self.uav_slots_per_set * RECORD_SIZE
    }

    /// Whether any descriptor set of this heap can require barriers at all.
    pub(crate) fn has_barriers(&self) -> bool {
        self.uav_slots_per_set > 0
    }

    /// Records which resource occupies the `uav_index`-th read-write slot
    /// of `set`. Called while resource-view handles are created or updated.
    pub(crate) fn set_resource(&mut self, set: usize, uav_index: usize, resource: BufferId) {
        debug_assert!(uav_index < self.uav_slots_per_set);
        self.resources[set * self.uav_slots_per_set + uav_index] = Some(resource);
    }

    /// Forgets all tracked usage states.
    ///
    /// After this, the next bind of every set re-emits its transitions.
    /// Intended for callers that transition resources outside the heap's
    /// knowledge (a copy pass, another heap) and need to resynchronize.
    pub(crate) fn reset_states(&mut self) {
        self.states.clear();
    }

    /// Rebuilds the packed barrier list for `set` from the current state
    /// table, then replays it into `list`. Resources already in the
    /// unordered-access state produce no record.
    pub(crate) fn insert_resource_barriers(
        &mut self,
        list: &mut dyn TransitionCommandList,
        set: usize,
    ) {
        if !self.has_barriers() {
            return;
        }

        // Build pass: write records for actual state changes only.
        let mut count = 0u32;
        let region = set * self.stride();
        for uav_index in 0..self.uav_slots_per_set {
            let Some(resource) = self.resources[set * self.uav_slots_per_set + uav_index] else {
                continue;
            };
            let before = self.states.get(&resource).copied().unwrap_or_default();
            if before == ResourceState::UnorderedAccess {
                continue;
            }
            let record = BarrierRecord {
                resource: resource.0 as u64,
                before: encode_state(before),
                after: encode_state(ResourceState::UnorderedAccess),
            };
            let at = region + COUNT_PREFIX_SIZE + count as usize * RECORD_SIZE;
            self.records[at..at + RECORD_SIZE].copy_from_slice(bytemuck::bytes_of(&record));
            self.states.insert(resource, ResourceState::UnorderedAccess);
            count += 1;
        }
        self.records[region..region + COUNT_PREFIX_SIZE]
            .copy_from_slice(&count.to_ne_bytes());

        // Replay pass: apply the packed list.
        for i in 0..count as usize {
            let at = region + COUNT_PREFIX_SIZE + i * RECORD_SIZE;
            let record: BarrierRecord =
                bytemuck::pod_read_unaligned(&self.records[at..at + RECORD_SIZE]);
            list.transition(
                BufferId(record.resource as usize),
                decode_state(record.before),
                decode_state(record.after),
            );
        }
    }
}
