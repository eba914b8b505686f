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

//! Resource-heap construction and bind dispatch.

use crate::barrier::BarrierTracker;
use crate::scan::collect_bindings;
use crate::segment::{
    consecutive_runs, encode_dual, encode_single, EncodedSegment, SegmentCursor, WORD_SIZE,
};
use strata_core::{
    BindingSlot, BufferId, PipelineLayout, ResourceAccess, ResourceBindingEncoder,
    ResourceHeapError, ResourceType, ResourceViewDescriptor, SamplerId, ShaderStage,
    ShaderStageFlags, TextureViewId, TransitionCommandList,
};

const NUM_STAGES: usize = ShaderStage::ALL.len();
const NUM_RESOURCE_TYPES: usize = ResourceType::ALL.len();

/// Packed header fields are 16-bit: slot indices, run lengths, and the
/// per-set compute-run offset must all stay below this.
const PACKED_FIELD_LIMIT: usize = u16::MAX as usize;

const fn stage_index(stage: ShaderStage) -> usize {
    match stage {
        ShaderStage::Vertex => 0,
        ShaderStage::Fragment => 1,
        ShaderStage::Compute => 2,
    }
}

const fn type_index(ty: ResourceType) -> usize {
    match ty {
        ResourceType::Buffer => 0,
        ResourceType::Texture => 1,
        ResourceType::Sampler => 2,
    }
}

/// Per-descriptor-set segmentation record: how many segments each
/// (stage, resource type) combination contributed, whether each stage has
/// any resource at all, and where the compute-class run starts within the
/// set. Identical across all sets of one heap because every set shares the
/// same binding layout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct SetSegmentation {
    num_segments: [[u16; NUM_RESOURCE_TYPES]; NUM_STAGES],
    has_stage_resources: [bool; NUM_STAGES],
    /// Byte offset of the compute-class segment run, relative to the set's
    /// base. Graphics and compute are bound independently, so each needs to
    /// seek to its own run.
    compute_run_offset: u16,
}

/// Where one resource view's payload words live within a set's segment run.
/// A slot visible to several stages appears in each stage's run, so one
/// view can have multiple locations.
#[derive(Debug, Clone, Copy)]
struct ViewLocation {
    /// Byte offset of the handle word, relative to the set's base.
    handle_offset: usize,
    /// Byte offset of the buffer-offset word, for dual-array segments.
    buffer_offset_offset: Option<usize>,
}

/// Describes a resource heap to be created.
#[derive(Debug, Clone)]
pub struct ResourceHeapDescriptor<'a> {
    /// Optional debug label.
    pub label: Option<&'a str>,
    /// The resolved pipeline layout all descriptor sets share.
    pub layout: &'a PipelineLayout,
    /// The flat resource-view list. Its length must be a non-zero multiple
    /// of the layout's binding count; each consecutive chunk of
    /// `layout.num_bindings()` views forms one descriptor set, assigned to
    /// the layout's slots in declaration order.
    pub resource_views: &'a [ResourceViewDescriptor],
}

/// A compiled resource heap: packed bind segments for N descriptor sets,
/// replayable against a native command encoder.
///
/// The heap is built once from a pipeline layout and a flat resource-view
/// list. Its structure (segment counts, offsets, stride) is immutable
/// afterwards; payload handles can be rewritten in place through
/// [`update_resource_views`](Self::update_resource_views) as long as the
/// type-per-slot occupancy is preserved. The heap holds only non-owning
/// handles; the originating wrapper objects keep ownership of the native
/// resources.
///
/// Construction and update require exclusive access (`&mut self` or by
/// value). Bind dispatch borrows the heap shared and is safe from any
/// thread owning the target recording context, provided the caller does not
/// run a structural rebuild concurrently. Barrier insertion mutates the
/// tracked state table and follows the same single-writer discipline as
/// updates.
#[derive(Debug)]
pub struct ResourceHeap {
    label: Option<String>,
    /// The layout's binding slots, in declaration order.
    bindings: Vec<BindingSlot>,
    num_sets: usize,
    /// Byte distance between consecutive sets' segment runs.
    stride: usize,
    /// The packed segment buffer: `stride * num_sets` bytes.
    buffer: Vec<u8>,
    segmentation: Vec<SetSegmentation>,
    /// Payload locations per declaration position, recorded while building
    /// set 0 and valid for every set (same structure everywhere).
    locations: Vec<Vec<ViewLocation>>,
    /// For each declaration position, its index among the layout's
    /// read-write buffer slots, if it is one.
    uav_index_of: Vec<Option<usize>>,
    barriers: BarrierTracker,
}

impl ResourceHeap {
    /// Builds a heap from a layout and a flat resource-view list.
    ///
    /// Fails on configuration errors (no bindings, no views, a view count
    /// that does not divide into whole sets), on capacity errors (a packed
    /// 16-bit field cannot address the required offset), and on consistency
    /// errors (duplicate slot indices, a view whose kind contradicts its
    /// slot). No partially built heap is ever returned.
    pub fn new(desc: &ResourceHeapDescriptor<'_>) -> Result<Self, ResourceHeapError> {
        let bindings_per_set = desc.layout.num_bindings();
        if bindings_per_set == 0 {
            return Err(ResourceHeapError::NoBindings);
        }
        let views = desc.resource_views;
        if views.is_empty() {
            return Err(ResourceHeapError::NoResourceViews);
        }
        if views.len() % bindings_per_set != 0 {
            return Err(ResourceHeapError::ResourceViewCountMismatch {
                num_views: views.len(),
                bindings_per_set,
            });
        }
        let num_sets = views.len() / bindings_per_set;

        for slot in desc.layout.bindings() {
            if slot.index as usize > PACKED_FIELD_LIMIT {
                return Err(ResourceHeapError::ExceedsAddressingLimit {
                    offset: slot.index as usize,
                    limit: PACKED_FIELD_LIMIT,
                });
            }
        }
        if bindings_per_set > PACKED_FIELD_LIMIT {
            return Err(ResourceHeapError::ExceedsAddressingLimit {
                offset: bindings_per_set,
                limit: PACKED_FIELD_LIMIT,
            });
        }

        // Assign hazard-tracking indices to the read-write buffer slots.
        let mut uav_index_of = vec![None; bindings_per_set];
        let mut num_uav_slots = 0;
        for (pos, slot) in desc.layout.bindings().iter().enumerate() {
            if slot.access != ResourceAccess::ReadWrite {
                continue;
            }
            if slot.ty == ResourceType::Buffer {
                uav_index_of[pos] = Some(num_uav_slots);
                num_uav_slots += 1;
            } else {
                log::warn!(
                    "ResourceHeap: slot {} is declared read-write but is not a buffer; \
                     hazard tracking skipped for it.",
                    slot.index
                );
            }
        }

        let mut heap = Self {
            label: desc.label.map(str::to_owned),
            bindings: desc.layout.bindings().to_vec(),
            num_sets,
            stride: 0,
            buffer: Vec::new(),
            segmentation: Vec::with_capacity(num_sets),
            locations: vec![Vec::new(); bindings_per_set],
            uav_index_of,
            barriers: BarrierTracker::new(num_uav_slots, num_sets),
        };

        for set in 0..num_sets {
            let set_views = &views[set * bindings_per_set..(set + 1) * bindings_per_set];
            let segmentation = heap.build_set(set, set_views)?;
            heap.segmentation.push(segmentation);
            if set == 0 {
                heap.stride = heap.buffer.len();
            }
            debug_assert_eq!(
                heap.buffer.len(),
                heap.stride * (set + 1),
                "all descriptor sets share one layout, so their runs must be stride-sized"
            );
            heap.register_uav_resources(set, set_views);
        }

        log::debug!(
            "Built resource heap '{}': {} descriptor set(s), stride {} byte(s), {} barrier slot(s)/set.",
            heap.label.as_deref().unwrap_or("<unlabeled>"),
            heap.num_sets,
            heap.stride,
            num_uav_slots,
        );
        Ok(heap)
    }

    /// Appends one descriptor set's segment run to the heap buffer:
    /// vertex-class, then fragment-class, then compute-class segments, each
    /// covering buffers, then textures, then samplers.
    fn build_set(
        &mut self,
        set: usize,
        set_views: &[ResourceViewDescriptor],
    ) -> Result<SetSegmentation, ResourceHeapError> {
        let set_start = self.buffer.len();
        let mut segmentation = SetSegmentation::default();

        for stage in ShaderStage::GRAPHICS {
            self.build_stage_run(stage, set, set_start, set_views, &mut segmentation)?;
        }
        let compute_run_offset = self.buffer.len() - set_start;
        segmentation.compute_run_offset = u16::try_from(compute_run_offset).map_err(|_| {
            ResourceHeapError::ExceedsAddressingLimit {
                offset: compute_run_offset,
                limit: PACKED_FIELD_LIMIT,
            }
        })?;
        self.build_stage_run(ShaderStage::Compute, set, set_start, set_views, &mut segmentation)?;

        for stage in 0..NUM_STAGES {
            segmentation.has_stage_resources[stage] =
                segmentation.num_segments[stage].iter().any(|&n| n != 0);
        }
        Ok(segmentation)
    }

    fn build_stage_run(
        &mut self,
        stage: ShaderStage,
        set: usize,
        set_start: usize,
        set_views: &[ResourceViewDescriptor],
        segmentation: &mut SetSegmentation,
    ) -> Result<(), ResourceHeapError> {
        let mask = ShaderStageFlags::from_stage(stage);
        for ty in ResourceType::ALL {
            let collected = collect_bindings(&self.bindings, set_views, ty, mask)?;
            for range in consecutive_runs(&collected) {
                let run = &collected[range];
                let encoded = match ty {
                    ResourceType::Buffer => encode_dual(&mut self.buffer, run),
                    ResourceType::Texture | ResourceType::Sampler => {
                        encode_single(&mut self.buffer, run)
                    }
                };
                if set == 0 {
                    self.record_locations(set_start, run, encoded);
                }
                segmentation.num_segments[stage_index(stage)][type_index(ty)] += 1;
            }
        }
        Ok(())
    }

    fn record_locations(
        &mut self,
        set_start: usize,
        run: &[crate::scan::CollectedBinding],
        encoded: EncodedSegment,
    ) {
        for (i, binding) in run.iter().enumerate() {
            self.locations[binding.view_pos].push(ViewLocation {
                handle_offset: encoded.handles_start + i * WORD_SIZE - set_start,
                buffer_offset_offset: encoded
                    .offsets_start
                    .map(|start| start + i * WORD_SIZE - set_start),
            });
        }
    }

    fn register_uav_resources(&mut self, set: usize, set_views: &[ResourceViewDescriptor]) {
        for (pos, view) in set_views.iter().enumerate() {
            if let (Some(uav_index), ResourceViewDescriptor::Buffer { buffer, .. }) =
                (self.uav_index_of[pos], view)
            {
                self.barriers.set_resource(set, uav_index, *buffer);
            }
        }
    }

    /// Rewrites resource-view payloads in place, starting at the flat view
    /// index `first_view`, and returns how many views were written.
    ///
    /// The heap's structure is preserved: each new view must have the same
    /// resource class as the slot it lands on. Validation runs before any
    /// byte is written, so a failed update leaves the heap unchanged.
    /// Read-write buffer slots re-register their resource with the hazard
    /// tracker.
    pub fn update_resource_views(
        &mut self,
        first_view: u32,
        views: &[ResourceViewDescriptor],
    ) -> Result<u32, ResourceHeapError> {
        if views.is_empty() {
            return Ok(0);
        }
        let bindings_per_set = self.bindings.len();
        let capacity = self.num_sets * bindings_per_set;
        let first = first_view as usize;
        if first + views.len() > capacity {
            return Err(ResourceHeapError::InvalidDescriptorRange {
                first: first_view,
                count: views.len(),
                capacity,
            });
        }

        for (i, view) in views.iter().enumerate() {
            let slot = self.bindings[(first + i) % bindings_per_set];
            if view.resource_type() != slot.ty {
                return Err(ResourceHeapError::ResourceTypeMismatch {
                    slot: slot.index,
                    expected: slot.ty,
                    actual: view.resource_type(),
                });
            }
        }

        for (i, view) in views.iter().enumerate() {
            let global = first + i;
            let set = global / bindings_per_set;
            let pos = global % bindings_per_set;
            let set_base = set * self.stride;

            for location in &self.locations[pos] {
                let at = set_base + location.handle_offset;
                self.buffer[at..at + WORD_SIZE]
                    .copy_from_slice(&view.raw_handle().to_ne_bytes());
                if let Some(offset_at) = location.buffer_offset_offset {
                    let offset = match view {
                        ResourceViewDescriptor::Buffer { offset, .. } => *offset,
                        _ => 0,
                    };
                    let at = set_base + offset_at;
                    self.buffer[at..at + WORD_SIZE].copy_from_slice(&offset.to_ne_bytes());
                }
            }

            if let (Some(uav_index), ResourceViewDescriptor::Buffer { buffer, .. }) =
                (self.uav_index_of[pos], view)
            {
                self.barriers.set_resource(set, uav_index, *buffer);
            }
        }
        Ok(views.len() as u32)
    }

    /// Returns the number of complete descriptor sets this heap holds.
    pub fn num_descriptor_sets(&self) -> u32 {
        self.num_sets as u32
    }

    /// Returns the byte distance between consecutive descriptor sets'
    /// segment runs. The heap buffer is exactly
    /// `stride * num_descriptor_sets` bytes.
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Whether any vertex- or fragment-class segment exists.
    pub fn has_graphics_resources(&self) -> bool {
        let segmentation = &self.segmentation[0];
        segmentation.has_stage_resources[stage_index(ShaderStage::Vertex)]
            || segmentation.has_stage_resources[stage_index(ShaderStage::Fragment)]
    }

    /// Whether any compute-class segment exists.
    pub fn has_compute_resources(&self) -> bool {
        self.segmentation[0].has_stage_resources[stage_index(ShaderStage::Compute)]
    }

    /// Whether any descriptor set of this heap can require transition
    /// barriers.
    pub fn has_barriers(&self) -> bool {
        self.barriers.has_barriers()
    }

    /// Returns the debug label, if any.
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Replaces the debug label.
    pub fn set_label(&mut self, label: Option<&str>) {
        self.label = label.map(str::to_owned);
    }

    /// Replays the graphics-class segments of `set` into `encoder`: the
    /// vertex-stage run, then the fragment-stage run, one ranged bind call
    /// per segment.
    ///
    /// Replay only reads the heap buffer; calling it twice without an
    /// intervening update issues identical calls both times. An
    /// out-of-range set index is logged and ignored.
    pub fn bind_graphics(&self, encoder: &mut dyn ResourceBindingEncoder, set: u32) {
        let Some(segmentation) = self.segmentation.get(set as usize) else {
            self.warn_set_out_of_range(set);
            return;
        };
        let base = set as usize * self.stride;
        let graphics_run = &self.buffer[base..base + segmentation.compute_run_offset as usize];
        let mut cursor = SegmentCursor::new(graphics_run);
        let mut scratch = ReplayScratch::default();
        for stage in ShaderStage::GRAPHICS {
            self.replay_stage_run(&mut cursor, segmentation, stage, encoder, &mut scratch);
        }
    }

    /// Replays the compute-class segments of `set` into `encoder`.
    pub fn bind_compute(&self, encoder: &mut dyn ResourceBindingEncoder, set: u32) {
        let Some(segmentation) = self.segmentation.get(set as usize) else {
            self.warn_set_out_of_range(set);
            return;
        };
        let base = set as usize * self.stride;
        let compute_run =
            &self.buffer[base + segmentation.compute_run_offset as usize..base + self.stride];
        let mut cursor = SegmentCursor::new(compute_run);
        let mut scratch = ReplayScratch::default();
        self.replay_stage_run(
            &mut cursor,
            segmentation,
            ShaderStage::Compute,
            encoder,
            &mut scratch,
        );
    }

    /// Emits the transition barriers required before binding `set`, if any.
    ///
    /// Resources whose tracked state is already unordered-access produce
    /// nothing, so rebinding a set in steady state is free. See
    /// [`reset_barrier_states`](Self::reset_barrier_states) when resource
    /// states are changed outside this heap's knowledge.
    pub fn insert_resource_barriers(&mut self, list: &mut dyn TransitionCommandList, set: u32) {
        if set as usize >= self.num_sets {
            self.warn_set_out_of_range(set);
            return;
        }
        self.barriers.insert_resource_barriers(list, set as usize);
    }

    /// Forgets all tracked resource states, so the next bind of every set
    /// re-emits its transitions.
    pub fn reset_barrier_states(&mut self) {
        self.barriers.reset_states();
    }

    /// Replays one stage's segments in build order: buffers, textures,
    /// samplers.
    fn replay_stage_run(
        &self,
        cursor: &mut SegmentCursor<'_>,
        segmentation: &SetSegmentation,
        stage: ShaderStage,
        encoder: &mut dyn ResourceBindingEncoder,
        scratch: &mut ReplayScratch,
    ) {
        let counts = &segmentation.num_segments[stage_index(stage)];

        for _ in 0..counts[type_index(ResourceType::Buffer)] {
            let header = cursor.next_dual(&mut scratch.offsets, &mut scratch.words);
            scratch.buffers.clear();
            scratch
                .buffers
                .extend(scratch.words.iter().map(|&h| BufferId(h as usize)));
            encoder.bind_buffers(
                stage,
                header.first_slot as u32,
                &scratch.buffers,
                &scratch.offsets,
            );
        }
        for _ in 0..counts[type_index(ResourceType::Texture)] {
            let header = cursor.next_single(&mut scratch.words);
            scratch.textures.clear();
            scratch
                .textures
                .extend(scratch.words.iter().map(|&h| TextureViewId(h as usize)));
            encoder.bind_textures(stage, header.first_slot as u32, &scratch.textures);
        }
        for _ in 0..counts[type_index(ResourceType::Sampler)] {
            let header = cursor.next_single(&mut scratch.words);
            scratch.samplers.clear();
            scratch
                .samplers
                .extend(scratch.words.iter().map(|&h| SamplerId(h as usize)));
            encoder.bind_samplers(stage, header.first_slot as u32, &scratch.samplers);
        }
    }

    fn warn_set_out_of_range(&self, set: u32) {
        log::warn!(
            "ResourceHeap '{}': descriptor set {} is out of range ({} set(s)).",
            self.label.as_deref().unwrap_or("<unlabeled>"),
            set,
            self.num_sets
        );
    }
}

/// Reused decode buffers so replay allocates once per bind call, not per
/// segment.
#[derive(Default)]
struct ReplayScratch {
    words: Vec<u64>,
    offsets: Vec<u64>,
    buffers: Vec<BufferId>,
    textures: Vec<TextureViewId>,
    samplers: Vec<SamplerId>,
}
