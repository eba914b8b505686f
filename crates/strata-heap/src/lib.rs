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

//! # Strata Heap
//!
//! The resource-heap segment-packing and binding-dispatch engine.
//!
//! A [`ResourceHeap`] takes a backend-agnostic pipeline layout plus a flat
//! list of resource views and compiles them, once, into a tightly packed
//! binary buffer of contiguous-slot-range *segments*. At draw or dispatch
//! time the heap replays a descriptor set's segments against a native
//! command encoder with one ranged bind call per segment, which is
//! O(contiguous runs) rather than O(bound resources). For backends with
//! explicit usage states it also tracks read-write (UAV-class) resources
//! per descriptor set and emits transition barriers before a set is bound.
//!
//! The heap is structurally immutable after construction: segment counts
//! and offsets are fixed, while payload handles may be rewritten in place
//! through [`ResourceHeap::update_resource_views`]. Construction and update
//! follow a single-writer discipline; replay is read-only and may run from
//! any thread that owns the corresponding native recording context.

#![warn(missing_docs)]

mod barrier;
mod heap;
mod scan;
mod segment;

pub use heap::{ResourceHeap, ResourceHeapDescriptor};
