// Copyright (c) 2016 The vulkano developers
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or https://opensource.org/licenses/MIT>,
// at your option. All files in the project carrying such
// notice may not be copied, modified, or distributed except
// according to those terms.

//! Queue family ownership transfers.
//!
//! Transferring ownership of a resource with exclusive sharing from one queue family to another
//! takes two barriers with identical parameters: a *release* recorded in a command buffer of the
//! source queue family, and an *acquire* recorded in a command buffer of the destination queue
//! family. The release must be submitted before the acquire.
//!
//! Each command buffer keeps the releases and acquires it recorded in [`QueueFamilyTransfers`].
//! When command buffers are submitted, their releases are added to the device-wide
//! [`PendingReleases`], and their acquires are matched against it.

use crate::{
    image::ImageSubresourceRange,
    sync::{is_special_queue_family, BufferMemoryBarrier, ImageMemoryBarrier},
    DeviceSize, ValidationError,
};
use foldhash::{HashMap, HashSet};
use smallvec::SmallVec;
use std::{fmt::Debug, hash::Hash};

/// The part of an ownership transfer barrier that identifies it.
///
/// A release and the acquire that completes it compare equal.
pub trait TransferBarrier: Clone + Debug + Eq + Hash {
    /// The type of resource being transferred.
    type Handle: Copy + Debug + Eq + Hash;

    /// The name of the barrier type, used in messages.
    const BARRIER_NAME: &'static str;

    /// The name of the resource type, used in messages.
    const HANDLE_NAME: &'static str;

    const DUPLICATE_IN_COMMAND_BUFFER_VUIDS: &'static [&'static str];
    const DUPLICATE_IN_SUBMIT_VUIDS: &'static [&'static str];
    const DUPLICATE_RELEASE_VUIDS: &'static [&'static str];
    const MISSING_RELEASE_VUIDS: &'static [&'static str];

    fn handle(&self) -> Self::Handle;

    fn src_queue_family_index(&self) -> u32;

    fn dst_queue_family_index(&self) -> u32;
}

/// An ownership transfer of a range of an image.
///
/// The layouts are kept for messages, but are not part of the identity of the transfer.
#[derive(Clone, Debug)]
pub struct ImageTransferBarrier {
    pub image: ash::vk::Image,
    pub src_queue_family_index: u32,
    pub dst_queue_family_index: u32,
    pub subresource_range: ImageSubresourceRange,
    pub old_layout: crate::image::ImageLayout,
    pub new_layout: crate::image::ImageLayout,
}

impl From<&ImageMemoryBarrier> for ImageTransferBarrier {
    #[inline]
    fn from(barrier: &ImageMemoryBarrier) -> Self {
        ImageTransferBarrier {
            image: barrier.image,
            src_queue_family_index: barrier.src_queue_family_index,
            dst_queue_family_index: barrier.dst_queue_family_index,
            subresource_range: barrier.subresource_range.clone(),
            old_layout: barrier.old_layout,
            new_layout: barrier.new_layout,
        }
    }
}

impl PartialEq for ImageTransferBarrier {
    fn eq(&self, other: &Self) -> bool {
        self.image == other.image
            && self.src_queue_family_index == other.src_queue_family_index
            && self.dst_queue_family_index == other.dst_queue_family_index
            && self.subresource_range == other.subresource_range
    }
}

impl Eq for ImageTransferBarrier {}

impl Hash for ImageTransferBarrier {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.image.hash(state);
        self.src_queue_family_index.hash(state);
        self.dst_queue_family_index.hash(state);
        self.subresource_range.hash(state);
    }
}

impl TransferBarrier for ImageTransferBarrier {
    type Handle = ash::vk::Image;

    const BARRIER_NAME: &'static str = "VkImageMemoryBarrier";
    const HANDLE_NAME: &'static str = "VkImage";

    const DUPLICATE_IN_COMMAND_BUFFER_VUIDS: &'static [&'static str] =
        &["UNASSIGNED-VkImageMemoryBarrier-image-00001"];
    const DUPLICATE_IN_SUBMIT_VUIDS: &'static [&'static str] =
        &["UNASSIGNED-VkImageMemoryBarrier-image-00002"];
    const DUPLICATE_RELEASE_VUIDS: &'static [&'static str] =
        &["UNASSIGNED-VkImageMemoryBarrier-image-00003"];
    const MISSING_RELEASE_VUIDS: &'static [&'static str] =
        &["UNASSIGNED-VkImageMemoryBarrier-image-00004"];

    #[inline]
    fn handle(&self) -> ash::vk::Image {
        self.image
    }

    #[inline]
    fn src_queue_family_index(&self) -> u32 {
        self.src_queue_family_index
    }

    #[inline]
    fn dst_queue_family_index(&self) -> u32 {
        self.dst_queue_family_index
    }
}

/// An ownership transfer of a range of a buffer.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct BufferTransferBarrier {
    pub buffer: ash::vk::Buffer,
    pub src_queue_family_index: u32,
    pub dst_queue_family_index: u32,
    pub offset: DeviceSize,
    pub size: DeviceSize,
}

impl From<&BufferMemoryBarrier> for BufferTransferBarrier {
    #[inline]
    fn from(barrier: &BufferMemoryBarrier) -> Self {
        BufferTransferBarrier {
            buffer: barrier.buffer,
            src_queue_family_index: barrier.src_queue_family_index,
            dst_queue_family_index: barrier.dst_queue_family_index,
            offset: barrier.offset,
            size: barrier.size,
        }
    }
}

impl TransferBarrier for BufferTransferBarrier {
    type Handle = ash::vk::Buffer;

    const BARRIER_NAME: &'static str = "VkBufferMemoryBarrier";
    const HANDLE_NAME: &'static str = "VkBuffer";

    const DUPLICATE_IN_COMMAND_BUFFER_VUIDS: &'static [&'static str] =
        &["UNASSIGNED-VkBufferMemoryBarrier-buffer-00001"];
    const DUPLICATE_IN_SUBMIT_VUIDS: &'static [&'static str] =
        &["UNASSIGNED-VkBufferMemoryBarrier-buffer-00002"];
    const DUPLICATE_RELEASE_VUIDS: &'static [&'static str] =
        &["UNASSIGNED-VkBufferMemoryBarrier-buffer-00003"];
    const MISSING_RELEASE_VUIDS: &'static [&'static str] =
        &["UNASSIGNED-VkBufferMemoryBarrier-buffer-00004"];

    #[inline]
    fn handle(&self) -> ash::vk::Buffer {
        self.buffer
    }

    #[inline]
    fn src_queue_family_index(&self) -> u32 {
        self.src_queue_family_index
    }

    #[inline]
    fn dst_queue_family_index(&self) -> u32 {
        self.dst_queue_family_index
    }
}

/// Whether a transfer barrier is the release or the acquire half.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransferOperation {
    Release,
    Acquire,
}

impl TransferOperation {
    /// Returns the operation that a barrier performs when recorded in a command buffer whose pool
    /// belongs to `queue_family_index`, if it is an ownership transfer at all.
    pub fn of<T: TransferBarrier>(barrier: &T, queue_family_index: u32) -> Option<Self> {
        let src = barrier.src_queue_family_index();
        let dst = barrier.dst_queue_family_index();

        if src == dst {
            return None;
        }

        if src == queue_family_index && !is_special_queue_family(dst) {
            Some(TransferOperation::Release)
        } else if dst == queue_family_index && !is_special_queue_family(src) {
            Some(TransferOperation::Acquire)
        } else {
            None
        }
    }

    fn name(self) -> &'static str {
        match self {
            TransferOperation::Release => "release",
            TransferOperation::Acquire => "acquire",
        }
    }
}

/// The releases and acquires of one barrier type, recorded in one command buffer.
#[derive(Clone, Debug)]
pub struct TransferScoreboard<T> {
    release: HashSet<T>,
    acquire: HashSet<T>,
}

impl<T> Default for TransferScoreboard<T> {
    #[inline]
    fn default() -> Self {
        TransferScoreboard {
            release: HashSet::default(),
            acquire: HashSet::default(),
        }
    }
}

impl<T: TransferBarrier> TransferScoreboard<T> {
    #[inline]
    pub fn releases(&self) -> &HashSet<T> {
        &self.release
    }

    #[inline]
    pub fn acquires(&self) -> &HashSet<T> {
        &self.acquire
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.release.is_empty() && self.acquire.is_empty()
    }

    fn set(&self, operation: TransferOperation) -> &HashSet<T> {
        match operation {
            TransferOperation::Release => &self.release,
            TransferOperation::Acquire => &self.acquire,
        }
    }

    fn set_mut(&mut self, operation: TransferOperation) -> &mut HashSet<T> {
        match operation {
            TransferOperation::Release => &mut self.release,
            TransferOperation::Acquire => &mut self.acquire,
        }
    }

    /// Checks that `barrier` was not already recorded in the command buffer. A duplicate is not
    /// invalid, but it is reported as a warning.
    pub(crate) fn validate_barrier(
        &self,
        barrier: &T,
        operation: TransferOperation,
    ) -> Result<(), Box<ValidationError>> {
        if self.set(operation).contains(barrier) {
            return Err(Box::new(ValidationError {
                problem: format!(
                    "{} queue family ownership transfer for {} {:?} duplicates an existing \
                    barrier recorded in this command buffer (source queue family {}, \
                    destination queue family {})",
                    operation.name(),
                    T::HANDLE_NAME,
                    barrier.handle(),
                    barrier.src_queue_family_index(),
                    barrier.dst_queue_family_index(),
                )
                .into(),
                vuids: T::DUPLICATE_IN_COMMAND_BUFFER_VUIDS,
                ..Default::default()
            }));
        }

        Ok(())
    }

    /// Records `barrier` in the command buffer.
    pub(crate) fn record_barrier(&mut self, barrier: T, operation: TransferOperation) {
        self.set_mut(operation).insert(barrier);
    }

    /// Adds the barriers of a secondary command buffer.
    pub(crate) fn update_from(&mut self, other: &Self) {
        self.release.extend(other.release.iter().cloned());
        self.acquire.extend(other.acquire.iter().cloned());
    }

    pub(crate) fn clear(&mut self) {
        self.release.clear();
        self.acquire.clear();
    }
}

/// The ownership transfers recorded in a command buffer.
#[derive(Clone, Debug, Default)]
pub struct QueueFamilyTransfers {
    pub images: TransferScoreboard<ImageTransferBarrier>,
    pub buffers: TransferScoreboard<BufferTransferBarrier>,
}

impl QueueFamilyTransfers {
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.images.is_empty() && self.buffers.is_empty()
    }

    pub(crate) fn update_from(&mut self, other: &Self) {
        self.images.update_from(&other.images);
        self.buffers.update_from(&other.buffers);
    }

    pub(crate) fn clear(&mut self) {
        self.images.clear();
        self.buffers.clear();
    }
}

/// The release barriers that were submitted, and are not yet matched by an acquire.
#[derive(Debug)]
pub struct PendingReleases<T: TransferBarrier> {
    releases: HashMap<T::Handle, HashSet<T>>,
}

impl<T: TransferBarrier> Default for PendingReleases<T> {
    #[inline]
    fn default() -> Self {
        PendingReleases {
            releases: HashMap::default(),
        }
    }
}

impl<T: TransferBarrier> PendingReleases<T> {
    /// Returns whether `barrier` was released and not yet acquired.
    pub fn contains(&self, barrier: &T) -> bool {
        self.releases
            .get(&barrier.handle())
            .is_some_and(|set| set.contains(barrier))
    }

    /// Returns the total number of pending releases.
    pub fn len(&self) -> usize {
        self.releases.values().map(HashSet::len).sum()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.releases.is_empty()
    }

    /// Removes all pending releases of `handle`, when the resource is destroyed.
    pub fn remove_handle(&mut self, handle: T::Handle) {
        self.releases.remove(&handle);
    }

    /// Checks the transfers of a command buffer that is about to be submitted. `scoreboard` holds
    /// the transfers of the command buffers that come before it in the same submission, mapped
    /// to the command buffer that recorded them.
    ///
    /// Returns warnings and errors, in the order they were found.
    pub(crate) fn validate_command_buffer(
        &self,
        command_buffer: ash::vk::CommandBuffer,
        transfers: &TransferScoreboard<T>,
        scoreboard: &mut SubmitScoreboard<T>,
    ) -> SmallVec<[(crate::Severity, Box<ValidationError>); 2]> {
        let mut messages = SmallVec::new();

        for release in &transfers.release {
            if let Some(error) = scoreboard.insert(
                release,
                command_buffer,
                TransferOperation::Release,
            ) {
                messages.push((crate::Severity::Warning, error));
            }

            if self.contains(release) {
                messages.push((
                    crate::Severity::Warning,
                    Box::new(ValidationError {
                        problem: format!(
                            "{} releases ownership of {} {:?} from queue family {} to {}, \
                            duplicating a release operation that was submitted and not yet \
                            acquired",
                            T::BARRIER_NAME,
                            T::HANDLE_NAME,
                            release.handle(),
                            release.src_queue_family_index(),
                            release.dst_queue_family_index(),
                        )
                        .into(),
                        vuids: T::DUPLICATE_RELEASE_VUIDS,
                        ..Default::default()
                    }),
                ));
            }
        }

        for acquire in &transfers.acquire {
            if let Some(error) = scoreboard.insert(
                acquire,
                command_buffer,
                TransferOperation::Acquire,
            ) {
                messages.push((crate::Severity::Warning, error));
            }

            if !self.contains(acquire) {
                messages.push((
                    crate::Severity::Error,
                    Box::new(ValidationError {
                        problem: format!(
                            "{} acquires ownership of {} {:?} from queue family {} to {}, but \
                            no matching release operation was submitted",
                            T::BARRIER_NAME,
                            T::HANDLE_NAME,
                            acquire.handle(),
                            acquire.src_queue_family_index(),
                            acquire.dst_queue_family_index(),
                        )
                        .into(),
                        vuids: T::MISSING_RELEASE_VUIDS,
                        ..Default::default()
                    }),
                ));
            }
        }

        messages
    }

    /// Records the transfers of a submitted command buffer: releases become pending, and
    /// acquires complete the release they match.
    pub(crate) fn record_command_buffer(&mut self, transfers: &TransferScoreboard<T>) {
        for release in &transfers.release {
            self.releases
                .entry(release.handle())
                .or_default()
                .insert(release.clone());
        }

        for acquire in &transfers.acquire {
            let handle = acquire.handle();

            if let Some(set) = self.releases.get_mut(&handle) {
                set.remove(acquire);

                if set.is_empty() {
                    self.releases.remove(&handle);
                }
            }
        }
    }
}

/// The transfers of one barrier type seen so far in one submission.
#[derive(Debug)]
pub(crate) struct SubmitScoreboard<T> {
    release: HashMap<T, ash::vk::CommandBuffer>,
    acquire: HashMap<T, ash::vk::CommandBuffer>,
}

impl<T> Default for SubmitScoreboard<T> {
    #[inline]
    fn default() -> Self {
        SubmitScoreboard {
            release: HashMap::default(),
            acquire: HashMap::default(),
        }
    }
}

impl<T: TransferBarrier> SubmitScoreboard<T> {
    /// Adds a barrier of `command_buffer`. If another command buffer of the submission already
    /// has the same barrier, returns a warning.
    fn insert(
        &mut self,
        barrier: &T,
        command_buffer: ash::vk::CommandBuffer,
        operation: TransferOperation,
    ) -> Option<Box<ValidationError>> {
        let map = match operation {
            TransferOperation::Release => &mut self.release,
            TransferOperation::Acquire => &mut self.acquire,
        };

        match map.get(barrier).copied() {
            Some(other) if other != command_buffer => Some(Box::new(ValidationError {
                problem: format!(
                    "{} {} of {} {:?} from queue family {} to {} in command buffer {:?} \
                    duplicates the same operation in command buffer {:?} of the same submission",
                    T::BARRIER_NAME,
                    operation.name(),
                    T::HANDLE_NAME,
                    barrier.handle(),
                    barrier.src_queue_family_index(),
                    barrier.dst_queue_family_index(),
                    command_buffer,
                    other,
                )
                .into(),
                vuids: T::DUPLICATE_IN_SUBMIT_VUIDS,
                ..Default::default()
            })),
            Some(_) => None,
            None => {
                map.insert(barrier.clone(), command_buffer);
                None
            }
        }
    }
}

/// The submit scoreboards of both barrier types.
#[derive(Debug, Default)]
pub(crate) struct SubmitScoreboards {
    pub(crate) images: SubmitScoreboard<ImageTransferBarrier>,
    pub(crate) buffers: SubmitScoreboard<BufferTransferBarrier>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Severity;
    use ash::vk::Handle;

    fn buffer_transfer(buffer: u64, src: u32, dst: u32) -> BufferTransferBarrier {
        BufferTransferBarrier {
            buffer: ash::vk::Buffer::from_raw(buffer),
            src_queue_family_index: src,
            dst_queue_family_index: dst,
            offset: 0,
            size: crate::WHOLE_SIZE,
        }
    }

    #[test]
    fn operation() {
        let barrier = buffer_transfer(1, 0, 1);

        assert_eq!(
            TransferOperation::of(&barrier, 0),
            Some(TransferOperation::Release),
        );
        assert_eq!(
            TransferOperation::of(&barrier, 1),
            Some(TransferOperation::Acquire),
        );
        assert_eq!(TransferOperation::of(&barrier, 2), None);
        assert_eq!(TransferOperation::of(&buffer_transfer(1, 1, 1), 1), None);
        assert_eq!(
            TransferOperation::of(&buffer_transfer(1, 0, crate::sync::QUEUE_FAMILY_EXTERNAL), 0),
            None,
        );
    }

    #[test]
    fn image_identity_ignores_layouts() {
        let image = ash::vk::Image::from_raw(3);
        let range = ImageSubresourceRange::whole(crate::image::ImageAspects::COLOR);
        let mut a = ImageTransferBarrier {
            image,
            src_queue_family_index: 0,
            dst_queue_family_index: 1,
            subresource_range: range,
            old_layout: crate::image::ImageLayout::General,
            new_layout: crate::image::ImageLayout::TransferSrcOptimal,
        };
        let b = ImageTransferBarrier {
            old_layout: crate::image::ImageLayout::Undefined,
            ..a.clone()
        };
        assert_eq!(a, b);

        a.dst_queue_family_index = 2;
        assert_ne!(a, b);
    }

    #[test]
    fn duplicate_in_command_buffer() {
        let mut scoreboard = TransferScoreboard::default();
        let barrier = buffer_transfer(1, 0, 1);

        assert!(scoreboard
            .validate_barrier(&barrier, TransferOperation::Release)
            .is_ok());
        scoreboard.record_barrier(barrier.clone(), TransferOperation::Release);

        let err = scoreboard
            .validate_barrier(&barrier, TransferOperation::Release)
            .unwrap_err();
        assert_eq!(err.vuid(), "UNASSIGNED-VkBufferMemoryBarrier-buffer-00001");

        // The acquire half is tracked separately.
        assert!(scoreboard
            .validate_barrier(&barrier, TransferOperation::Acquire)
            .is_ok());
    }

    #[test]
    fn acquire_without_release() {
        let pending = PendingReleases::default();
        let mut transfers = TransferScoreboard::default();
        transfers.record_barrier(buffer_transfer(1, 1, 2), TransferOperation::Acquire);

        let messages = pending.validate_command_buffer(
            ash::vk::CommandBuffer::from_raw(10),
            &transfers,
            &mut SubmitScoreboard::default(),
        );
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].0, Severity::Error);
        assert_eq!(
            messages[0].1.vuid(),
            "UNASSIGNED-VkBufferMemoryBarrier-buffer-00004",
        );
    }

    #[test]
    fn release_then_acquire() {
        let mut pending = PendingReleases::default();
        let barrier = buffer_transfer(1, 0, 1);

        let mut release = TransferScoreboard::default();
        release.record_barrier(barrier.clone(), TransferOperation::Release);
        let mut acquire = TransferScoreboard::default();
        acquire.record_barrier(barrier.clone(), TransferOperation::Acquire);

        let cb0 = ash::vk::CommandBuffer::from_raw(10);
        let cb1 = ash::vk::CommandBuffer::from_raw(11);

        assert!(pending
            .validate_command_buffer(cb0, &release, &mut SubmitScoreboard::default())
            .is_empty());
        pending.record_command_buffer(&release);
        assert_eq!(pending.len(), 1);

        // Submitting the same release again is a warning.
        let messages =
            pending.validate_command_buffer(cb0, &release, &mut SubmitScoreboard::default());
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].0, Severity::Warning);
        assert_eq!(
            messages[0].1.vuid(),
            "UNASSIGNED-VkBufferMemoryBarrier-buffer-00003",
        );

        assert!(pending
            .validate_command_buffer(cb1, &acquire, &mut SubmitScoreboard::default())
            .is_empty());
        pending.record_command_buffer(&acquire);
        assert_eq!(pending.len(), 0);
        assert!(pending.is_empty());
    }

    #[test]
    fn duplicate_in_submit() {
        let pending = PendingReleases::default();
        let mut release = TransferScoreboard::default();
        release.record_barrier(buffer_transfer(1, 0, 1), TransferOperation::Release);

        let mut scoreboard = SubmitScoreboard::default();
        let cb0 = ash::vk::CommandBuffer::from_raw(10);
        let cb1 = ash::vk::CommandBuffer::from_raw(11);

        assert!(pending
            .validate_command_buffer(cb0, &release, &mut scoreboard)
            .is_empty());

        let messages = pending.validate_command_buffer(cb1, &release, &mut scoreboard);
        assert_eq!(messages.len(), 1);
        assert_eq!(
            messages[0].1.vuid(),
            "UNASSIGNED-VkBufferMemoryBarrier-buffer-00002",
        );
    }

    #[test]
    fn pending_count_is_releases_minus_acquires() {
        let mut pending = PendingReleases::default();
        let mut releases = TransferScoreboard::default();
        let mut acquires = TransferScoreboard::default();

        for buffer in 1..=4 {
            releases.record_barrier(buffer_transfer(buffer, 0, 1), TransferOperation::Release);
        }

        for buffer in [2, 4, 5] {
            acquires.record_barrier(buffer_transfer(buffer, 0, 1), TransferOperation::Acquire);
        }

        pending.record_command_buffer(&releases);
        pending.record_command_buffer(&acquires);

        // Buffer 5 was never released, so its acquire matches nothing.
        assert_eq!(pending.len(), 4 - 2);

        pending.remove_handle(ash::vk::Buffer::from_raw(1));
        assert_eq!(pending.len(), 1);
    }
}
