// Copyright (c) 2016 The vulkano developers
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or https://opensource.org/licenses/MIT>,
// at your option. All files in the project carrying such
// notice may not be copied, modified, or distributed except
// according to those terms.

//! Queue family sharing and pipeline barriers.
//!
//! A barrier whose source and destination queue family indices differ, and are neither
//! [`QUEUE_FAMILY_IGNORED`] nor a special external index, is a *queue family ownership transfer*.
//! It must be recorded twice: once as a *release* in a command buffer of the source queue family,
//! and once as an *acquire* in a command buffer of the destination queue family.

use crate::{
    image::{ImageLayout, ImageSubresourceRange},
    DeviceSize, WHOLE_SIZE,
};
use smallvec::SmallVec;

/// Special queue family index, meaning that no ownership transfer takes place.
pub const QUEUE_FAMILY_IGNORED: u32 = ash::vk::QUEUE_FAMILY_IGNORED;

/// Special queue family index, meaning any queue family outside the instance that shares memory
/// with the device.
pub const QUEUE_FAMILY_EXTERNAL: u32 = ash::vk::QUEUE_FAMILY_EXTERNAL;

/// Special queue family index, meaning any queue family outside the device.
pub const QUEUE_FAMILY_FOREIGN: u32 = ash::vk::QUEUE_FAMILY_FOREIGN_EXT;

/// Returns whether `index` is one of the special queue family indices.
#[inline]
pub fn is_special_queue_family(index: u32) -> bool {
    matches!(
        index,
        QUEUE_FAMILY_IGNORED | QUEUE_FAMILY_EXTERNAL | QUEUE_FAMILY_FOREIGN
    )
}

/// Returns whether `index` refers to a queue family outside the device.
#[inline]
pub fn is_external_queue_family(index: u32) -> bool {
    matches!(index, QUEUE_FAMILY_EXTERNAL | QUEUE_FAMILY_FOREIGN)
}

/// Declares in which queue(s) a resource can be used.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Sharing {
    /// The resource is used in only one queue family at a time.
    #[default]
    Exclusive,

    /// The resource is used in multiple queue families simultaneously.
    /// The indices of the queue families are an owned copy of the application's array.
    Concurrent(SmallVec<[u32; 4]>),
}

impl Sharing {
    #[inline]
    pub fn is_exclusive(&self) -> bool {
        matches!(self, Sharing::Exclusive)
    }

    pub(crate) fn validate(&self) -> Result<(), Box<crate::ValidationError>> {
        if let Sharing::Concurrent(queue_family_indices) = self {
            let mut unique = queue_family_indices.clone();
            unique.sort_unstable();
            unique.dedup();

            if unique.len() < 2 {
                return Err(Box::new(crate::ValidationError {
                    context: "sharing".into(),
                    problem: "is `Sharing::Concurrent`, but contains less than 2 unique queue \
                        family indices"
                        .into(),
                    vuids: &["VUID-VkImageCreateInfo-sharingMode-00942"],
                    ..Default::default()
                }));
            }
        }

        Ok(())
    }
}

/// A memory barrier that applies to a single image.
#[derive(Clone, Debug)]
pub struct ImageMemoryBarrier {
    pub image: ash::vk::Image,
    pub old_layout: ImageLayout,
    pub new_layout: ImageLayout,
    pub src_queue_family_index: u32,
    pub dst_queue_family_index: u32,
    pub subresource_range: ImageSubresourceRange,
    pub _ne: crate::NonExhaustive,
}

impl ImageMemoryBarrier {
    /// Returns a barrier covering `subresource_range` of `image`, without ownership transfer.
    #[inline]
    pub fn image(image: ash::vk::Image, subresource_range: ImageSubresourceRange) -> Self {
        Self {
            image,
            old_layout: ImageLayout::Undefined,
            new_layout: ImageLayout::Undefined,
            src_queue_family_index: QUEUE_FAMILY_IGNORED,
            dst_queue_family_index: QUEUE_FAMILY_IGNORED,
            subresource_range,
            _ne: crate::NonExhaustive(()),
        }
    }

    /// Returns whether the barrier transfers ownership between queue families.
    #[inline]
    pub fn is_ownership_transfer(&self) -> bool {
        is_ownership_transfer(self.src_queue_family_index, self.dst_queue_family_index)
    }
}

/// A memory barrier that applies to a range of a single buffer.
#[derive(Clone, Debug)]
pub struct BufferMemoryBarrier {
    pub buffer: ash::vk::Buffer,
    pub src_queue_family_index: u32,
    pub dst_queue_family_index: u32,
    pub offset: DeviceSize,
    pub size: DeviceSize,
    pub _ne: crate::NonExhaustive,
}

impl BufferMemoryBarrier {
    /// Returns a barrier covering the whole of `buffer`, without ownership transfer.
    #[inline]
    pub fn buffer(buffer: ash::vk::Buffer) -> Self {
        Self {
            buffer,
            src_queue_family_index: QUEUE_FAMILY_IGNORED,
            dst_queue_family_index: QUEUE_FAMILY_IGNORED,
            offset: 0,
            size: WHOLE_SIZE,
            _ne: crate::NonExhaustive(()),
        }
    }

    #[inline]
    pub fn is_ownership_transfer(&self) -> bool {
        is_ownership_transfer(self.src_queue_family_index, self.dst_queue_family_index)
    }
}

/// Returns whether a barrier with these queue family indices is an ownership transfer between
/// two queue families of the device.
#[inline]
pub fn is_ownership_transfer(src_queue_family_index: u32, dst_queue_family_index: u32) -> bool {
    src_queue_family_index != dst_queue_family_index
        && !is_special_queue_family(src_queue_family_index)
        && !is_special_queue_family(dst_queue_family_index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use smallvec::smallvec;

    #[test]
    fn ownership_transfer() {
        assert!(is_ownership_transfer(0, 1));
        assert!(!is_ownership_transfer(1, 1));
        assert!(!is_ownership_transfer(QUEUE_FAMILY_IGNORED, 1));
        assert!(!is_ownership_transfer(QUEUE_FAMILY_EXTERNAL, 1));
        assert!(is_special_queue_family(QUEUE_FAMILY_FOREIGN));
        assert!(!is_special_queue_family(3));
    }

    #[test]
    fn concurrent_needs_two_families() {
        assert!(Sharing::Concurrent(smallvec![0, 0]).validate().is_err());
        assert!(Sharing::Concurrent(smallvec![0, 1]).validate().is_ok());
        assert!(Sharing::Exclusive.validate().is_ok());
    }
}
