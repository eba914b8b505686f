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

//! Opaque resource handles and the resource-view descriptors bound by a heap.
//!
//! All handles here are non-owning: lifetime management stays with the
//! buffer/texture/sampler wrapper objects of the owning backend. The heap
//! engine only stores and replays the raw handle values.

/// An opaque, non-owning handle to a GPU buffer owned by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferId(pub usize);

/// An opaque, non-owning handle to a texture view owned by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureViewId(pub usize);

/// An opaque, non-owning handle to a sampler state owned by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SamplerId(pub usize);

/// The class of resource a binding slot accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceType {
    /// A uniform or storage buffer.
    Buffer,
    /// A sampled or storage texture.
    Texture,
    /// A sampler state.
    Sampler,
}

impl ResourceType {
    /// All resource types, in the fixed order the heap engine builds and
    /// replays segments within one stage run.
    pub const ALL: [ResourceType; 3] = [
        ResourceType::Buffer,
        ResourceType::Texture,
        ResourceType::Sampler,
    ];
}

/// How a shader accesses the resource bound at a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ResourceAccess {
    /// The shader only reads the resource.
    #[default]
    ReadOnly,
    /// The shader may read and write the resource (UAV / storage class).
    /// Binding a resource at such a slot requires hazard tracking.
    ReadWrite,
}

/// The usage state of a resource for transition-barrier tracking.
///
/// Only backends that distinguish read-only and read-write usage states
/// (Direct3D 12 style) consume these; on other backends the barrier seam is
/// a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ResourceState {
    /// The initial, unspecialized state of a resource.
    #[default]
    Common,
    /// Bound for read-only shader access.
    ShaderResource,
    /// Bound for read-write (unordered) shader access.
    UnorderedAccess,
}

/// A reference to one concrete resource to bind at one slot of a
/// descriptor set.
///
/// The variant kind must match the [`ResourceType`] declared by the slot the
/// view lands on; a mismatch is rejected when the heap is built or updated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceViewDescriptor {
    /// Binds a buffer, optionally at a byte offset into it.
    Buffer {
        /// The buffer to bind.
        buffer: BufferId,
        /// Byte offset into the buffer at which the binding starts.
        offset: u64,
    },
    /// Binds a texture view.
    Texture {
        /// The texture view to bind.
        texture: TextureViewId,
    },
    /// Binds a sampler state.
    Sampler {
        /// The sampler to bind.
        sampler: SamplerId,
    },
}

impl ResourceViewDescriptor {
    /// Convenience constructor for a whole-buffer view.
    pub const fn buffer(buffer: BufferId) -> Self {
        Self::Buffer { buffer, offset: 0 }
    }

    /// Convenience constructor for a texture view.
    pub const fn texture(texture: TextureViewId) -> Self {
        Self::Texture { texture }
    }

    /// Convenience constructor for a sampler view.
    pub const fn sampler(sampler: SamplerId) -> Self {
        Self::Sampler { sampler }
    }

    /// Returns the resource class of this view.
    pub const fn resource_type(&self) -> ResourceType {
        match self {
            Self::Buffer { .. } => ResourceType::Buffer,
            Self::Texture { .. } => ResourceType::Texture,
            Self::Sampler { .. } => ResourceType::Sampler,
        }
    }

    /// Returns the raw handle value, widened for storage in a packed
    /// segment payload.
    pub const fn raw_handle(&self) -> u64 {
        match self {
            Self::Buffer { buffer, .. } => buffer.0 as u64,
            Self::Texture { texture } => texture.0 as u64,
            Self::Sampler { sampler } => sampler.0 as u64,
        }
    }
}
