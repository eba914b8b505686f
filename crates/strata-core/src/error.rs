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

//! Error types for resource-heap construction and update.
//!
//! All of these are construction-time failures: a heap either builds
//! completely or yields nothing usable. None of them are retryable, and
//! replay (bind dispatch) has no error surface of its own.

use crate::resource::ResourceType;
use std::fmt;

/// An error raised while constructing or updating a resource heap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceHeapError {
    /// The pipeline layout declares no binding slots, so no descriptor set
    /// can be formed.
    NoBindings,
    /// No resource views were supplied; a heap must contain at least one
    /// complete descriptor set.
    NoResourceViews,
    /// The number of supplied resource views is not an exact multiple of
    /// the layout's binding count, so the views cannot be partitioned into
    /// complete descriptor sets.
    ResourceViewCountMismatch {
        /// How many resource views the caller supplied.
        num_views: usize,
        /// How many bindings one descriptor set requires.
        bindings_per_set: usize,
    },
    /// A packed offset field cannot address the accumulated buffer size.
    /// The heap is not silently truncated; construction fails.
    ExceedsAddressingLimit {
        /// The offset that was required.
        offset: usize,
        /// The largest offset the packed field can represent.
        limit: usize,
    },
    /// Two binding slots in the layout share the same slot index. Slots
    /// must be unique within one layout; this indicates an upstream
    /// layout-resolution bug.
    DuplicateBindingSlot {
        /// The slot index that occurred more than once.
        slot: u32,
    },
    /// A resource view's kind does not match the resource class declared by
    /// the slot it was assigned to.
    ResourceTypeMismatch {
        /// The slot index the view was assigned to.
        slot: u32,
        /// The resource class the slot declares.
        expected: ResourceType,
        /// The resource class of the supplied view.
        actual: ResourceType,
    },
    /// A descriptor update addressed resource views outside the range the
    /// heap was built with.
    InvalidDescriptorRange {
        /// First resource-view index of the update.
        first: u32,
        /// Number of resource views in the update.
        count: usize,
        /// Total number of resource views the heap holds.
        capacity: usize,
    },
}

impl fmt::Display for ResourceHeapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceHeapError::NoBindings => {
                write!(f, "Pipeline layout declares no binding slots.")
            }
            ResourceHeapError::NoResourceViews => {
                write!(f, "No resource views were supplied for the heap.")
            }
            ResourceHeapError::ResourceViewCountMismatch {
                num_views,
                bindings_per_set,
            } => {
                write!(
                    f,
                    "Resource view count {num_views} is not a multiple of the \
                     {bindings_per_set} bindings per descriptor set"
                )
            }
            ResourceHeapError::ExceedsAddressingLimit { offset, limit } => {
                write!(
                    f,
                    "Segment offset {offset} exceeds the addressing limit {limit} \
                     of its packed offset field"
                )
            }
            ResourceHeapError::DuplicateBindingSlot { slot } => {
                write!(f, "Binding slot {slot} is declared more than once")
            }
            ResourceHeapError::ResourceTypeMismatch {
                slot,
                expected,
                actual,
            } => {
                write!(
                    f,
                    "Resource view for slot {slot} is a {actual:?} but the slot \
                     declares a {expected:?}"
                )
            }
            ResourceHeapError::InvalidDescriptorRange {
                first,
                count,
                capacity,
            } => {
                write!(
                    f,
                    "Descriptor update [{first}; {count}) is out of range for a \
                     heap holding {capacity} resource views"
                )
            }
        }
    }
}

impl std::error::Error for ResourceHeapError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn count_mismatch_display() {
        let err = ResourceHeapError::ResourceViewCountMismatch {
            num_views: 7,
            bindings_per_set: 3,
        };
        assert_eq!(
            format!("{err}"),
            "Resource view count 7 is not a multiple of the 3 bindings per descriptor set"
        );
    }

    #[test]
    fn type_mismatch_display() {
        let err = ResourceHeapError::ResourceTypeMismatch {
            slot: 4,
            expected: ResourceType::Texture,
            actual: ResourceType::Sampler,
        };
        assert_eq!(
            format!("{err}"),
            "Resource view for slot 4 is a Sampler but the slot declares a Texture"
        );
    }

    #[test]
    fn addressing_limit_display() {
        let err = ResourceHeapError::ExceedsAddressingLimit {
            offset: 70_000,
            limit: u16::MAX as usize,
        };
        assert_eq!(
            format!("{err}"),
            "Segment offset 70000 exceeds the addressing limit 65535 of its packed offset field"
        );
    }
}
