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

//! End-to-end properties of heap construction and replay, driven through
//! recording test doubles standing in for a native command encoder and
//! command list.

use strata_core::{
    BindingSlot, BufferId, PipelineLayout, ResourceBindingEncoder, ResourceHeapError,
    ResourceState, ResourceType, ResourceViewDescriptor, SamplerId, ShaderStage,
    ShaderStageFlags, TextureViewId, TransitionCommandList,
};
use strata_heap::{ResourceHeap, ResourceHeapDescriptor};

#[derive(Debug, Clone, PartialEq, Eq)]
enum BindCall {
    Buffers {
        stage: ShaderStage,
        first_slot: u32,
        buffers: Vec<BufferId>,
        offsets: Vec<u64>,
    },
    Textures {
        stage: ShaderStage,
        first_slot: u32,
        textures: Vec<TextureViewId>,
    },
    Samplers {
        stage: ShaderStage,
        first_slot: u32,
        samplers: Vec<SamplerId>,
    },
}

#[derive(Debug, Default)]
struct RecordingEncoder {
    calls: Vec<BindCall>,
}

impl ResourceBindingEncoder for RecordingEncoder {
    fn bind_buffers(
        &mut self,
        stage: ShaderStage,
        first_slot: u32,
        buffers: &[BufferId],
        offsets: &[u64],
    ) {
        self.calls.push(BindCall::Buffers {
            stage,
            first_slot,
            buffers: buffers.to_vec(),
            offsets: offsets.to_vec(),
        });
    }

    fn bind_textures(&mut self, stage: ShaderStage, first_slot: u32, textures: &[TextureViewId]) {
        self.calls.push(BindCall::Textures {
            stage,
            first_slot,
            textures: textures.to_vec(),
        });
    }

    fn bind_samplers(&mut self, stage: ShaderStage, first_slot: u32, samplers: &[SamplerId]) {
        self.calls.push(BindCall::Samplers {
            stage,
            first_slot,
            samplers: samplers.to_vec(),
        });
    }
}

#[derive(Debug, Default)]
struct RecordingList {
    transitions: Vec<(BufferId, ResourceState, ResourceState)>,
}

impl TransitionCommandList for RecordingList {
    fn transition(&mut self, resource: BufferId, before: ResourceState, after: ResourceState) {
        self.transitions.push((resource, before, after));
    }
}

fn heap_from(layout: &PipelineLayout, views: &[ResourceViewDescriptor]) -> ResourceHeap {
    ResourceHeap::new(&ResourceHeapDescriptor {
        label: Some("test heap"),
        layout,
        resource_views: views,
    })
    .unwrap()
}

/// The (slot, handle) pairs a replay produced for one stage, flattened
/// from its ranged calls.
fn flatten_stage(calls: &[BindCall], stage: ShaderStage) -> Vec<(u32, u64)> {
    let mut flat = Vec::new();
    for call in calls {
        match call {
            BindCall::Buffers {
                stage: s,
                first_slot,
                buffers,
                ..
            } if *s == stage => {
                flat.extend(
                    buffers
                        .iter()
                        .enumerate()
                        .map(|(i, b)| (first_slot + i as u32, b.0 as u64)),
                );
            }
            BindCall::Textures {
                stage: s,
                first_slot,
                textures,
            } if *s == stage => {
                flat.extend(
                    textures
                        .iter()
                        .enumerate()
                        .map(|(i, t)| (first_slot + i as u32, t.0 as u64)),
                );
            }
            BindCall::Samplers {
                stage: s,
                first_slot,
                samplers,
            } if *s == stage => {
                flat.extend(
                    samplers
                        .iter()
                        .enumerate()
                        .map(|(i, smp)| (first_slot + i as u32, smp.0 as u64)),
                );
            }
            _ => {}
        }
    }
    flat
}

#[test]
fn round_trip_reconstructs_sorted_bindings_per_stage() {
    // Declaration order is deliberately not slot order.
    let layout = PipelineLayout::new(vec![
        BindingSlot::new(7, ResourceType::Texture, ShaderStageFlags::FRAGMENT),
        BindingSlot::new(1, ResourceType::Buffer, ShaderStageFlags::VERTEX),
        BindingSlot::new(4, ResourceType::Texture, ShaderStageFlags::FRAGMENT),
        BindingSlot::new(0, ResourceType::Buffer, ShaderStageFlags::VERTEX),
        BindingSlot::new(6, ResourceType::Texture, ShaderStageFlags::FRAGMENT),
        BindingSlot::new(2, ResourceType::Sampler, ShaderStageFlags::FRAGMENT),
    ]);
    let views = vec![
        ResourceViewDescriptor::texture(TextureViewId(107)),
        ResourceViewDescriptor::buffer(BufferId(101)),
        ResourceViewDescriptor::texture(TextureViewId(104)),
        ResourceViewDescriptor::buffer(BufferId(100)),
        ResourceViewDescriptor::texture(TextureViewId(106)),
        ResourceViewDescriptor::sampler(SamplerId(102)),
    ];
    let heap = heap_from(&layout, &views);

    let mut encoder = RecordingEncoder::default();
    heap.bind_graphics(&mut encoder, 0);

    // Vertex stage: buffers at slots 0 and 1 exactly once each, sorted.
    assert_eq!(
        flatten_stage(&encoder.calls, ShaderStage::Vertex),
        vec![(0, 100), (1, 101)]
    );
    // Fragment stage: sampler at 2, textures at 4, 6, 7 — full coverage,
    // no slot twice, ascending within each resource class.
    assert_eq!(
        flatten_stage(&encoder.calls, ShaderStage::Fragment),
        vec![(4, 104), (6, 106), (7, 107), (2, 102)]
    );
}

#[test]
fn segments_are_minimal_runs() {
    // Samplers at slots 4, 6, 7: the gap after 4 forces exactly two
    // segments; the adjacent 6 and 7 must share one.
    let layout = PipelineLayout::new(vec![
        BindingSlot::new(4, ResourceType::Sampler, ShaderStageFlags::FRAGMENT),
        BindingSlot::new(6, ResourceType::Sampler, ShaderStageFlags::FRAGMENT),
        BindingSlot::new(7, ResourceType::Sampler, ShaderStageFlags::FRAGMENT),
    ]);
    let views = vec![
        ResourceViewDescriptor::sampler(SamplerId(1)),
        ResourceViewDescriptor::sampler(SamplerId(2)),
        ResourceViewDescriptor::sampler(SamplerId(3)),
    ];
    let heap = heap_from(&layout, &views);

    let mut encoder = RecordingEncoder::default();
    heap.bind_graphics(&mut encoder, 0);
    assert_eq!(
        encoder.calls,
        vec![
            BindCall::Samplers {
                stage: ShaderStage::Fragment,
                first_slot: 4,
                samplers: vec![SamplerId(1)],
            },
            BindCall::Samplers {
                stage: ShaderStage::Fragment,
                first_slot: 6,
                samplers: vec![SamplerId(2), SamplerId(3)],
            },
        ]
    );
}

#[test]
fn adjacent_slots_merge_into_one_segment() {
    let layout = PipelineLayout::new(vec![
        BindingSlot::new(4, ResourceType::Sampler, ShaderStageFlags::FRAGMENT),
        BindingSlot::new(5, ResourceType::Sampler, ShaderStageFlags::FRAGMENT),
        BindingSlot::new(6, ResourceType::Sampler, ShaderStageFlags::FRAGMENT),
    ]);
    let views = vec![
        ResourceViewDescriptor::sampler(SamplerId(1)),
        ResourceViewDescriptor::sampler(SamplerId(2)),
        ResourceViewDescriptor::sampler(SamplerId(3)),
    ];
    let heap = heap_from(&layout, &views);

    let mut encoder = RecordingEncoder::default();
    heap.bind_graphics(&mut encoder, 0);
    assert_eq!(encoder.calls.len(), 1);
}

#[test]
fn stride_is_constant_and_sets_replay_their_own_handles() {
    let layout = PipelineLayout::new(vec![
        BindingSlot::new(0, ResourceType::Buffer, ShaderStageFlags::VERTEX),
        BindingSlot::new(1, ResourceType::Texture, ShaderStageFlags::FRAGMENT),
    ]);
    let views = vec![
        ResourceViewDescriptor::Buffer {
            buffer: BufferId(10),
            offset: 64,
        },
        ResourceViewDescriptor::texture(TextureViewId(11)),
        ResourceViewDescriptor::Buffer {
            buffer: BufferId(20),
            offset: 128,
        },
        ResourceViewDescriptor::texture(TextureViewId(21)),
    ];
    let heap = heap_from(&layout, &views);
    assert_eq!(heap.num_descriptor_sets(), 2);
    assert!(heap.stride() > 0);

    let mut encoder = RecordingEncoder::default();
    heap.bind_graphics(&mut encoder, 0);
    heap.bind_graphics(&mut encoder, 1);

    assert_eq!(
        encoder.calls,
        vec![
            BindCall::Buffers {
                stage: ShaderStage::Vertex,
                first_slot: 0,
                buffers: vec![BufferId(10)],
                offsets: vec![64],
            },
            BindCall::Textures {
                stage: ShaderStage::Fragment,
                first_slot: 1,
                textures: vec![TextureViewId(11)],
            },
            BindCall::Buffers {
                stage: ShaderStage::Vertex,
                first_slot: 0,
                buffers: vec![BufferId(20)],
                offsets: vec![128],
            },
            BindCall::Textures {
                stage: ShaderStage::Fragment,
                first_slot: 1,
                textures: vec![TextureViewId(21)],
            },
        ]
    );
}

#[test]
fn replay_is_idempotent() {
    let layout = PipelineLayout::new(vec![
        BindingSlot::new(0, ResourceType::Buffer, ShaderStageFlags::VERTEX_FRAGMENT),
        BindingSlot::new(2, ResourceType::Buffer, ShaderStageFlags::COMPUTE),
    ]);
    let views = vec![
        ResourceViewDescriptor::buffer(BufferId(1)),
        ResourceViewDescriptor::buffer(BufferId(2)),
    ];
    let heap = heap_from(&layout, &views);

    let mut first = RecordingEncoder::default();
    heap.bind_graphics(&mut first, 0);
    heap.bind_compute(&mut first, 0);
    let mut second = RecordingEncoder::default();
    heap.bind_graphics(&mut second, 0);
    heap.bind_compute(&mut second, 0);
    assert_eq!(first.calls, second.calls);
    assert!(!first.calls.is_empty());
}

#[test]
fn multi_stage_slot_is_replayed_for_each_stage() {
    let layout = PipelineLayout::new(vec![BindingSlot::new(
        3,
        ResourceType::Buffer,
        ShaderStageFlags::VERTEX_FRAGMENT,
    )]);
    let views = vec![ResourceViewDescriptor::buffer(BufferId(9))];
    let heap = heap_from(&layout, &views);

    let mut encoder = RecordingEncoder::default();
    heap.bind_graphics(&mut encoder, 0);
    assert_eq!(flatten_stage(&encoder.calls, ShaderStage::Vertex), vec![(3, 9)]);
    assert_eq!(
        flatten_stage(&encoder.calls, ShaderStage::Fragment),
        vec![(3, 9)]
    );
}

#[test]
fn compute_bind_sees_only_compute_resources() {
    let layout = PipelineLayout::new(vec![
        BindingSlot::new(0, ResourceType::Buffer, ShaderStageFlags::VERTEX),
        BindingSlot::new(1, ResourceType::Buffer, ShaderStageFlags::COMPUTE),
        BindingSlot::new(2, ResourceType::Texture, ShaderStageFlags::COMPUTE),
    ]);
    let views = vec![
        ResourceViewDescriptor::buffer(BufferId(1)),
        ResourceViewDescriptor::buffer(BufferId(2)),
        ResourceViewDescriptor::texture(TextureViewId(3)),
    ];
    let heap = heap_from(&layout, &views);
    assert!(heap.has_graphics_resources());
    assert!(heap.has_compute_resources());

    let mut encoder = RecordingEncoder::default();
    heap.bind_compute(&mut encoder, 0);
    assert_eq!(
        encoder.calls,
        vec![
            BindCall::Buffers {
                stage: ShaderStage::Compute,
                first_slot: 1,
                buffers: vec![BufferId(2)],
                offsets: vec![0],
            },
            BindCall::Textures {
                stage: ShaderStage::Compute,
                first_slot: 2,
                textures: vec![TextureViewId(3)],
            },
        ]
    );
}

#[test]
fn stage_flags_track_segment_presence() {
    let graphics_only = PipelineLayout::new(vec![BindingSlot::new(
        0,
        ResourceType::Texture,
        ShaderStageFlags::FRAGMENT,
    )]);
    let views = vec![ResourceViewDescriptor::texture(TextureViewId(1))];
    let heap = heap_from(&graphics_only, &views);
    assert!(heap.has_graphics_resources());
    assert!(!heap.has_compute_resources());

    let compute_only = PipelineLayout::new(vec![BindingSlot::new(
        0,
        ResourceType::Buffer,
        ShaderStageFlags::COMPUTE,
    )]);
    let views = vec![ResourceViewDescriptor::buffer(BufferId(1))];
    let heap = heap_from(&compute_only, &views);
    assert!(!heap.has_graphics_resources());
    assert!(heap.has_compute_resources());
}

#[test]
fn rejects_view_count_not_divisible_by_binding_count() {
    let layout = PipelineLayout::new(vec![
        BindingSlot::new(0, ResourceType::Buffer, ShaderStageFlags::VERTEX),
        BindingSlot::new(1, ResourceType::Buffer, ShaderStageFlags::VERTEX),
        BindingSlot::new(2, ResourceType::Buffer, ShaderStageFlags::VERTEX),
    ]);
    let views: Vec<_> = (0..7)
        .map(|i| ResourceViewDescriptor::buffer(BufferId(i)))
        .collect();
    let err = ResourceHeap::new(&ResourceHeapDescriptor {
        label: None,
        layout: &layout,
        resource_views: &views,
    })
    .unwrap_err();
    assert_eq!(
        err,
        ResourceHeapError::ResourceViewCountMismatch {
            num_views: 7,
            bindings_per_set: 3,
        }
    );
}

#[test]
fn rejects_layout_without_bindings() {
    let layout = PipelineLayout::default();
    let views = vec![ResourceViewDescriptor::buffer(BufferId(0))];
    let err = ResourceHeap::new(&ResourceHeapDescriptor {
        label: None,
        layout: &layout,
        resource_views: &views,
    })
    .unwrap_err();
    assert_eq!(err, ResourceHeapError::NoBindings);
}

#[test]
fn rejects_graphics_run_beyond_compute_offset_field() {
    // 4100 contiguous vertex buffer slots pack into one dual-array segment
    // of 16 + 4100 * 16 bytes, pushing the compute run past what its
    // 16-bit offset field can address.
    let slots: Vec<_> = (0..4100)
        .map(|i| BindingSlot::new(i, ResourceType::Buffer, ShaderStageFlags::VERTEX))
        .collect();
    let layout = PipelineLayout::new(slots);
    let views: Vec<_> = (0..4100)
        .map(|i| ResourceViewDescriptor::buffer(BufferId(i)))
        .collect();
    let err = ResourceHeap::new(&ResourceHeapDescriptor {
        label: None,
        layout: &layout,
        resource_views: &views,
    })
    .unwrap_err();
    assert!(matches!(
        err,
        ResourceHeapError::ExceedsAddressingLimit { limit, .. } if limit == u16::MAX as usize
    ));
}

#[test]
fn update_rewrites_payloads_in_place() {
    let layout = PipelineLayout::new(vec![
        BindingSlot::new(0, ResourceType::Buffer, ShaderStageFlags::VERTEX),
        BindingSlot::new(1, ResourceType::Texture, ShaderStageFlags::FRAGMENT),
    ]);
    let views = vec![
        ResourceViewDescriptor::buffer(BufferId(1)),
        ResourceViewDescriptor::texture(TextureViewId(2)),
        ResourceViewDescriptor::buffer(BufferId(3)),
        ResourceViewDescriptor::texture(TextureViewId(4)),
    ];
    let mut heap = heap_from(&layout, &views);

    // Rewrite the second set's buffer only (flat view index 2).
    let written = heap
        .update_resource_views(
            2,
            &[ResourceViewDescriptor::Buffer {
                buffer: BufferId(30),
                offset: 512,
            }],
        )
        .unwrap();
    assert_eq!(written, 1);

    let mut encoder = RecordingEncoder::default();
    heap.bind_graphics(&mut encoder, 0);
    heap.bind_graphics(&mut encoder, 1);
    assert_eq!(
        flatten_stage(&encoder.calls, ShaderStage::Vertex),
        vec![(0, 1), (0, 30)]
    );
    assert!(encoder.calls.contains(&BindCall::Buffers {
        stage: ShaderStage::Vertex,
        first_slot: 0,
        buffers: vec![BufferId(30)],
        offsets: vec![512],
    }));
}

#[test]
fn barriers_are_emitted_once_per_state_change() {
    let layout = PipelineLayout::new(vec![
        BindingSlot::read_write(0, ResourceType::Buffer, ShaderStageFlags::COMPUTE),
        BindingSlot::new(1, ResourceType::Buffer, ShaderStageFlags::COMPUTE),
    ]);
    let views = vec![
        ResourceViewDescriptor::buffer(BufferId(7)),
        ResourceViewDescriptor::buffer(BufferId(8)),
    ];
    let mut heap = heap_from(&layout, &views);
    assert!(heap.has_barriers());

    let mut list = RecordingList::default();
    heap.insert_resource_barriers(&mut list, 0);
    assert_eq!(
        list.transitions,
        vec![(
            BufferId(7),
            ResourceState::Common,
            ResourceState::UnorderedAccess
        )]
    );

    // Rebinding the same set in the same states is free.
    heap.insert_resource_barriers(&mut list, 0);
    assert_eq!(list.transitions.len(), 1);

    // Swapping in a different buffer re-barriers the new resource.
    heap.update_resource_views(0, &[ResourceViewDescriptor::buffer(BufferId(9))])
        .unwrap();
    heap.insert_resource_barriers(&mut list, 0);
    assert_eq!(list.transitions.len(), 2);
    assert_eq!(list.transitions[1].0, BufferId(9));

    // A state reset rearms everything.
    heap.reset_barrier_states();
    heap.insert_resource_barriers(&mut list, 0);
    assert_eq!(list.transitions.len(), 3);
}

#[test]
fn read_only_heap_has_no_barriers() {
    let layout = PipelineLayout::new(vec![BindingSlot::new(
        0,
        ResourceType::Buffer,
        ShaderStageFlags::COMPUTE,
    )]);
    let views = vec![ResourceViewDescriptor::buffer(BufferId(1))];
    let mut heap = heap_from(&layout, &views);
    assert!(!heap.has_barriers());

    let mut list = RecordingList::default();
    heap.insert_resource_barriers(&mut list, 0);
    assert!(list.transitions.is_empty());
}

#[test]
fn out_of_range_set_is_ignored() {
    let layout = PipelineLayout::new(vec![BindingSlot::new(
        0,
        ResourceType::Buffer,
        ShaderStageFlags::VERTEX,
    )]);
    let views = vec![ResourceViewDescriptor::buffer(BufferId(1))];
    let heap = heap_from(&layout, &views);

    let mut encoder = RecordingEncoder::default();
    heap.bind_graphics(&mut encoder, 5);
    heap.bind_compute(&mut encoder, 5);
    assert!(encoder.calls.is_empty());
}
