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

use crate::resource::{BufferId, ResourceState};

/// A trait for a native command list that records resource state
/// transitions (barriers).
///
/// Backends without explicit usage states (OpenGL, Metal with tracked
/// resources) can implement this as a no-op; the Direct3D 12 style backends
/// map each call onto one transition barrier.
pub trait TransitionCommandList {
    /// Records a transition of `resource` from the `before` state to the
    /// `after` state.
    fn transition(&mut self, resource: BufferId, before: ResourceState, after: ResourceState);
}
