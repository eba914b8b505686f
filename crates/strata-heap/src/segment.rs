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

//! The packed segment records of the heap buffer.
//!
//! A segment is one self-describing binary record covering a maximal run of
//! contiguous binding slots of one resource class. Two shapes exist: the
//! single-array shape (one handle word per slot, used for textures and
//! samplers) and the dual-array shape (one byte-offset word plus one handle
//! word per slot, used for buffers). Records are explicit `Pod` structs
//! encoded and decoded through a byte cursor; nothing in the heap relies on
//! pointer reinterpretation, and decoding uses unaligned reads so the
//! backing `Vec<u8>` needs no alignment guarantee.

use crate::scan::CollectedBinding;
use bytemuck::{Pod, Zeroable};

/// Size in bytes of one payload word (a widened native handle or a byte
/// offset).
pub(crate) const WORD_SIZE: usize = std::mem::size_of::<u64>();

/// Header of a single-array segment: `num_slots` handle words follow it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Pod, Zeroable)]
#[repr(C)]
pub(crate) struct SegmentHeader {
    /// Total byte size of the segment including this header. Advancing a
    /// cursor by `size` lands on the next segment.
    pub size: u32,
    /// First slot index of the contiguous run.
    pub first_slot: u16,
    /// Number of slots (and handle words) in the run.
    pub num_slots: u16,
}

/// Header of a dual-array segment: `num_slots` offset words follow it, then
/// `num_slots` handle words starting at `payload_offset` bytes from the
/// segment start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Pod, Zeroable)]
#[repr(C)]
pub(crate) struct DualSegmentHeader {
    /// Total byte size of the segment including this header.
    pub size: u32,
    /// First slot index of the contiguous run.
    pub first_slot: u16,
    /// Number of slots (and offset/handle word pairs) in the run.
    pub num_slots: u16,
    /// Byte offset of the handle word array, relative to the segment start.
    pub payload_offset: u32,
    /// Keeps the header at a whole number of payload words.
    pub reserved: u32,
}

pub(crate) const SEGMENT_HEADER_SIZE: usize = std::mem::size_of::<SegmentHeader>();
pub(crate) const DUAL_SEGMENT_HEADER_SIZE: usize = std::mem::size_of::<DualSegmentHeader>();

/// Splits a slot-sorted binding list into maximal runs of consecutive slot
/// indices. Each returned range indexes into `bindings`. An empty input
/// yields no runs.
pub(crate) fn consecutive_runs(bindings: &[CollectedBinding]) -> Vec<std::ops::Range<usize>> {
    let mut runs = Vec::new();
    let mut start = 0;
    for i in 1..bindings.len() {
        if bindings[i].slot != bindings[i - 1].slot + 1 {
            runs.push(start..i);
            start = i;
        }
    }
    if start < bindings.len() {
        runs.push(start..bindings.len());
    }
    runs
}

/// Byte positions of the encoded arrays of one segment, relative to the
/// start of the buffer the segment was appended to. The heap uses these to
/// build its descriptor-location map for in-place payload updates.
#[derive(Debug, Clone, Copy)]
pub(crate) struct EncodedSegment {
    /// Where the offset-word array starts; `None` for single-array segments.
    pub offsets_start: Option<usize>,
    /// Where the handle-word array starts.
    pub handles_start: usize,
}

/// Appends a single-array segment (header + handle words) for `run`.
///
/// The header is written first at the recorded append position, then the
/// payload is filled in a second pass over the run; sizes are known up
/// front, so the two passes stay trivially in sync.
pub(crate) fn encode_single(buf: &mut Vec<u8>, run: &[CollectedBinding]) -> EncodedSegment {
    debug_assert!(!run.is_empty());
    let size = SEGMENT_HEADER_SIZE + run.len() * WORD_SIZE;
    let header = SegmentHeader {
        size: size as u32,
        first_slot: run[0].slot as u16,
        num_slots: run.len() as u16,
    };
    buf.extend_from_slice(bytemuck::bytes_of(&header));

    let handles_start = buf.len();
    for binding in run {
        buf.extend_from_slice(&binding.handle.to_ne_bytes());
    }
    EncodedSegment {
        offsets_start: None,
        handles_start,
    }
}

/// Appends a dual-array segment (header + offset words + handle words) for
/// `run`.
pub(crate) fn encode_dual(buf: &mut Vec<u8>, run: &[CollectedBinding]) -> EncodedSegment {
    debug_assert!(!run.is_empty());
    let payload_offset = DUAL_SEGMENT_HEADER_SIZE + run.len() * WORD_SIZE;
    let size = payload_offset + run.len() * WORD_SIZE;
    let header = DualSegmentHeader {
        size: size as u32,
        first_slot: run[0].slot as u16,
        num_slots: run.len() as u16,
        payload_offset: payload_offset as u32,
        reserved: 0,
    };
    buf.extend_from_slice(bytemuck::bytes_of(&header));

    let offsets_start = buf.len();
    for binding in run {
        buf.extend_from_slice(&binding.offset.to_ne_bytes());
    }
    let handles_start = buf.len();
    for binding in run {
        buf.extend_from_slice(&binding.handle.to_ne_bytes());
    }
    EncodedSegment {
        offsets_start: Some(offsets_start),
        handles_start,
    }
}

/// A forward-only reader over one descriptor set's segment run.
pub(crate) struct SegmentCursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> SegmentCursor<'a> {
    pub(crate) fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn read_words(&self, start: usize, count: usize, out: &mut Vec<u64>) {
        out.clear();
        for i in 0..count {
            let at = start + i * WORD_SIZE;
            out.push(bytemuck::pod_read_unaligned(
                &self.bytes[at..at + WORD_SIZE],
            ));
        }
    }

    /// Decodes the next segment as single-array, filling `handles`, and
    /// advances past it.
    pub(crate) fn next_single(&mut self, handles: &mut Vec<u64>) -> SegmentHeader {
        let header: SegmentHeader =
            bytemuck::pod_read_unaligned(&self.bytes[self.pos..self.pos + SEGMENT_HEADER_SIZE]);
        self.read_words(
            self.pos + SEGMENT_HEADER_SIZE,
            header.num_slots as usize,
            handles,
        );
        self.pos += header.size as usize;
        header
    }

    /// Decodes the next segment as dual-array, filling `offsets` and
    /// `handles`, and advances past it.
    pub(crate) fn next_dual(
        &mut self,
        offsets: &mut Vec<u64>,
        handles: &mut Vec<u64>,
    ) -> DualSegmentHeader {
        let header: DualSegmentHeader = bytemuck::pod_read_unaligned(
            &self.bytes[self.pos..self.pos + DUAL_SEGMENT_HEADER_SIZE],
        );
        let count = header.num_slots as usize;
        self.read_words(self.pos + DUAL_SEGMENT_HEADER_SIZE, count, offsets);
        self.read_words(self.pos + header.payload_offset as usize, count, handles);
        self.pos += header.size as usize;
        header
    }
}
