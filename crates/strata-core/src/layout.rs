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

//! Pipeline-layout binding declarations.

use crate::resource::{ResourceAccess, ResourceType};
use crate::stage::ShaderStageFlags;

/// One resource-binding declaration point in a pipeline layout.
///
/// A slot is independent of any concrete resource; it only states which slot
/// index, resource class, and shader stages a later-supplied resource view
/// will occupy. Slot indices are unique within one layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BindingSlot {
    /// The binding index (e.g., `@binding(0)` in WGSL, `[[id(0)]]` in MSL).
    pub index: u32,
    /// The class of resource bound at this slot.
    pub ty: ResourceType,
    /// Which shader stages can access this slot.
    pub stages: ShaderStageFlags,
    /// How shaders access the bound resource.
    pub access: ResourceAccess,
}

impl BindingSlot {
    /// Helper to create a read-only slot.
    pub const fn new(index: u32, ty: ResourceType, stages: ShaderStageFlags) -> Self {
        Self {
            index,
            ty,
            stages,
            access: ResourceAccess::ReadOnly,
        }
    }

    /// Helper to create a read-write (UAV / storage class) slot.
    pub const fn read_write(index: u32, ty: ResourceType, stages: ShaderStageFlags) -> Self {
        Self {
            index,
            ty,
            stages,
            access: ResourceAccess::ReadWrite,
        }
    }
}

/// A resolved pipeline layout: the ordered list of binding slots a pipeline
/// can access.
///
/// The order of `bindings` is the declaration order and is the order the
/// heap engine scans when collecting resources, independent of slot index
/// values. Validation of slot uniqueness is the responsibility of the layer
/// that resolves the layout; the heap engine reports violations it detects
/// as consistency errors.
#[derive(Debug, Clone, Default)]
pub struct PipelineLayout {
    /// An optional debug label.
    pub label: Option<String>,
    /// The binding slots, in declaration order.
    pub bindings: Vec<BindingSlot>,
}

impl PipelineLayout {
    /// Creates an unlabeled layout from a list of binding slots.
    pub fn new(bindings: Vec<BindingSlot>) -> Self {
        Self {
            label: None,
            bindings,
        }
    }

    /// Returns the number of binding slots (bindings per descriptor set).
    pub fn num_bindings(&self) -> usize {
        self.bindings.len()
    }

    /// Returns the binding slots in declaration order.
    pub fn bindings(&self) -> &[BindingSlot] {
        &self.bindings
    }

    /// Returns the union of all stage masks declared by this layout.
    pub fn stage_flags(&self) -> ShaderStageFlags {
        self.bindings
            .iter()
            .fold(ShaderStageFlags::NONE, |acc, slot| acc | slot.stages)
    }
}
