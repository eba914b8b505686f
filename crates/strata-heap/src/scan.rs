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

//! Filtered iteration over one descriptor set's bindings, and collection
//! into slot-sorted tuples ready for segment packing.

use strata_core::{
    BindingSlot, ResourceHeapError, ResourceType, ResourceViewDescriptor, ShaderStageFlags,
};

/// Iterates the (slot, view) pairs of one descriptor set that match a
/// (resource type, stage mask) filter.
///
/// `slots` and `views` are parallel: `views[i]` is the resource assigned to
/// `slots[i]`. Iteration preserves the layout's declaration order, which is
/// independent of slot index values. A filter may legitimately match
/// nothing (a layout with no compute-visible samplers, say).
pub(crate) struct BindingScan<'a> {
    slots: &'a [BindingSlot],
    views: &'a [ResourceViewDescriptor],
    cursor: usize,
    ty: ResourceType,
    stages: ShaderStageFlags,
}

impl<'a> BindingScan<'a> {
    pub(crate) fn new(slots: &'a [BindingSlot], views: &'a [ResourceViewDescriptor]) -> Self {
        debug_assert_eq!(slots.len(), views.len());
        Self {
            slots,
            views,
            cursor: 0,
            ty: ResourceType::Buffer,
            stages: ShaderStageFlags::NONE,
        }
    }

    /// Rearms the scan from the start of the set with a new filter.
    pub(crate) fn reset(&mut self, ty: ResourceType, stages: ShaderStageFlags) {
        self.cursor = 0;
        self.ty = ty;
        self.stages = stages;
    }

    /// Counts the matches for the current filter without consuming the scan.
    pub(crate) fn count_matches(&self) -> usize {
        self.slots
            .iter()
            .filter(|slot| slot.ty == self.ty && slot.stages.intersects(self.stages))
            .count()
    }
}

impl<'a> Iterator for BindingScan<'a> {
    /// The declaration position within the set, its slot, and its view.
    type Item = (usize, &'a BindingSlot, &'a ResourceViewDescriptor);

    fn next(&mut self) -> Option<Self::Item> {
        while self.cursor < self.slots.len() {
            let pos = self.cursor;
            self.cursor += 1;
            let slot = &self.slots[pos];
            if slot.ty == self.ty && slot.stages.intersects(self.stages) {
                return Some((pos, slot, &self.views[pos]));
            }
        }
        None
    }
}

/// One binding gathered for segment packing. Transient: lives only between
/// collection and the segment builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct CollectedBinding {
    /// The slot index the resource binds to.
    pub slot: u32,
    /// Declaration position of the binding within its descriptor set.
    pub view_pos: usize,
    /// The widened native handle value.
    pub handle: u64,
    /// Per-binding auxiliary scalar (byte offset into a buffer); zero for
    /// textures and samplers.
    pub offset: u64,
}

/// Collects all bindings of one descriptor set matching `(ty, stages)`,
/// sorted ascending by slot index.
///
/// Fails if a view's kind does not match its slot's declared class, or if
/// two slots share an index (an upstream layout bug, surfaced here because
/// the sorted list makes it free to detect).
pub(crate) fn collect_bindings(
    slots: &[BindingSlot],
    views: &[ResourceViewDescriptor],
    ty: ResourceType,
    stages: ShaderStageFlags,
) -> Result<Vec<CollectedBinding>, ResourceHeapError> {
    let mut scan = BindingScan::new(slots, views);
    scan.reset(ty, stages);
    let mut collected = Vec::with_capacity(scan.count_matches());

    for (pos, slot, view) in scan {
        if view.resource_type() != slot.ty {
            return Err(ResourceHeapError::ResourceTypeMismatch {
                slot: slot.index,
                expected: slot.ty,
                actual: view.resource_type(),
            });
        }
        let offset = match *view {
            ResourceViewDescriptor::Buffer { offset, .. } => offset,
            _ => 0,
        };
        collected.push(CollectedBinding {
            slot: slot.index,
            view_pos: pos,
            handle: view.raw_handle(),
            offset,
        });
    }

    collected.sort_by_key(|binding| binding.slot);
    for pair in collected.windows(2) {
        if pair[0].slot == pair[1].slot {
            return Err(ResourceHeapError::DuplicateBindingSlot { slot: pair[0].slot });
        }
    }
    Ok(collected)
}
