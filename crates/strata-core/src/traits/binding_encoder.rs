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

use crate::resource::{BufferId, SamplerId, TextureViewId};
use crate::stage::ShaderStage;

/// A trait for a native command encoder that receives ranged bind calls.
///
/// The heap engine replays one call per packed segment, so each call covers
/// a contiguous range of binding slots starting at `first_slot`. This is the
/// shape of Metal's `setVertexBuffers:offsets:withRange:` family and of a
/// Direct3D 12 root-table bind; a backend whose native API binds one slot at
/// a time can fan the range out itself.
///
/// Implementations must not retain the slices past the call; they borrow
/// scratch storage owned by the dispatcher.
pub trait ResourceBindingEncoder {
    /// Binds a contiguous range of buffers, each with a byte offset into it.
    ///
    /// `buffers` and `offsets` have the same length; `offsets[i]` applies to
    /// `buffers[i]` at slot `first_slot + i`.
    fn bind_buffers(
        &mut self,
        stage: ShaderStage,
        first_slot: u32,
        buffers: &[BufferId],
        offsets: &[u64],
    );

    /// Binds a contiguous range of texture views.
    fn bind_textures(&mut self, stage: ShaderStage, first_slot: u32, textures: &[TextureViewId]);

    /// Binds a contiguous range of sampler states.
    fn bind_samplers(&mut self, stage: ShaderStage, first_slot: u32, samplers: &[SamplerId]);
}
