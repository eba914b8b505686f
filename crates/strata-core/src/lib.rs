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

//! # Strata Core
//!
//! Foundational crate containing the backend-agnostic binding model, trait
//! contracts, and error types shared by all Strata graphics backends.
//!
//! This crate defines the "common language" of resource binding: pipeline
//! layouts made of [`BindingSlot`]s, [`ResourceViewDescriptor`]s referencing
//! concrete GPU resources through opaque handles, and the trait seams
//! ([`ResourceBindingEncoder`], [`TransitionCommandList`]) through which a
//! backend's native command recorder receives the bind and barrier calls
//! prepared by the `strata-heap` engine. It defines the 'what' of binding,
//! while the 'how' lives in the backend crates that implement these traits.

#![warn(missing_docs)]

pub mod error;
pub mod layout;
pub mod resource;
pub mod stage;
pub mod traits;

// Re-export the most important traits and types for easier use.
pub use self::error::ResourceHeapError;
pub use self::layout::{BindingSlot, PipelineLayout};
pub use self::resource::{
    BufferId, ResourceAccess, ResourceState, ResourceType, ResourceViewDescriptor, SamplerId,
    TextureViewId,
};
pub use self::stage::{ShaderStage, ShaderStageFlags};
pub use self::traits::{ResourceBindingEncoder, TransitionCommandList};
