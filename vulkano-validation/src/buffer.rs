// Copyright (c) 2016 The vulkano developers
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or https://opensource.org/licenses/MIT>,
// at your option. All files in the project carrying such
// notice may not be copied, modified, or distributed except
// according to those terms.

//! Buffers and buffer views.
//!
//! A buffer is a linear region of device memory. Uniform and storage buffer descriptors refer to
//! a range of a buffer directly, while texel buffer descriptors refer to a *buffer view*, which
//! interprets a range of the buffer as an array of texels of a given format.

use crate::{
    format::Format,
    macros::vulkan_bitflags,
    memory::BoundMemory,
    sync::Sharing,
    DeviceSize, ValidationError, WHOLE_SIZE,
};
use foldhash::HashSet;

vulkan_bitflags! {
    /// Flags specifying additional properties of a buffer.
    BufferCreateFlags = BufferCreateFlags(u32);

    /// The buffer will be backed by sparse memory binding.
    SPARSE_BINDING = SPARSE_BINDING,

    /// The buffer can be used without being fully resident in memory.
    SPARSE_RESIDENCY = SPARSE_RESIDENCY,

    /// The buffer's memory can alias with another buffer or a different part of the same buffer.
    SPARSE_ALIASED = SPARSE_ALIASED,
}

vulkan_bitflags! {
    /// Describes how a buffer is going to be used.
    BufferUsage = BufferUsageFlags(u32);

    /// The buffer can be used as a source for transfer commands.
    TRANSFER_SRC = TRANSFER_SRC,

    /// The buffer can be used as a destination for transfer commands.
    TRANSFER_DST = TRANSFER_DST,

    /// The buffer can be used as a uniform texel buffer in a descriptor set.
    UNIFORM_TEXEL_BUFFER = UNIFORM_TEXEL_BUFFER,

    /// The buffer can be used as a storage texel buffer in a descriptor set.
    STORAGE_TEXEL_BUFFER = STORAGE_TEXEL_BUFFER,

    /// The buffer can be used as a uniform buffer in a descriptor set.
    UNIFORM_BUFFER = UNIFORM_BUFFER,

    /// The buffer can be used as a storage buffer in a descriptor set.
    STORAGE_BUFFER = STORAGE_BUFFER,

    /// The buffer can be used as an index buffer.
    INDEX_BUFFER = INDEX_BUFFER,

    /// The buffer can be used as a vertex or instance buffer.
    VERTEX_BUFFER = VERTEX_BUFFER,

    /// The buffer can be used as an indirect buffer.
    INDIRECT_BUFFER = INDIRECT_BUFFER,
}

/// Parameters to create a new buffer.
#[derive(Clone, Debug)]
pub struct BufferCreateInfo {
    /// Additional properties of the buffer.
    ///
    /// The default value is empty.
    pub flags: BufferCreateFlags,

    /// The size in bytes of the buffer.
    ///
    /// The default value is `0`, which must be overridden.
    pub size: DeviceSize,

    /// How the buffer is going to be used.
    ///
    /// The default value is empty, which must be overridden.
    pub usage: BufferUsage,

    /// Whether the buffer can be shared across multiple queues, or is limited to a single queue.
    ///
    /// The default value is [`Sharing::Exclusive`].
    pub sharing: Sharing,

    pub _ne: crate::NonExhaustive,
}

impl Default for BufferCreateInfo {
    #[inline]
    fn default() -> Self {
        Self {
            flags: BufferCreateFlags::empty(),
            size: 0,
            usage: BufferUsage::empty(),
            sharing: Sharing::Exclusive,
            _ne: crate::NonExhaustive(()),
        }
    }
}

impl BufferCreateInfo {
    pub(crate) fn validate(&self) -> Result<(), Box<ValidationError>> {
        let &Self {
            flags: _,
            size,
            usage,
            ref sharing,
            _ne: _,
        } = self;

        if size == 0 {
            return Err(Box::new(ValidationError {
                context: "size".into(),
                problem: "is zero".into(),
                vuids: &["VUID-VkBufferCreateInfo-size-00912"],
                ..Default::default()
            }));
        }

        if usage.is_empty() {
            return Err(Box::new(ValidationError {
                context: "usage".into(),
                problem: "is empty".into(),
                vuids: &["VUID-VkBufferCreateInfo-usage-requiredbitmask"],
                ..Default::default()
            }));
        }

        sharing.validate()?;

        Ok(())
    }
}

/// The state tracked for a buffer.
#[derive(Debug)]
pub struct BufferState {
    handle: ash::vk::Buffer,
    create_info: BufferCreateInfo,
    pub(crate) memory: BoundMemory,
    pub(crate) command_buffers: HashSet<ash::vk::CommandBuffer>,
}

impl BufferState {
    pub fn new(handle: ash::vk::Buffer, create_info: BufferCreateInfo) -> Self {
        let sparse = create_info.flags.intersects(
            BufferCreateFlags::SPARSE_BINDING
                | BufferCreateFlags::SPARSE_RESIDENCY
                | BufferCreateFlags::SPARSE_ALIASED,
        );

        BufferState {
            handle,
            create_info,
            memory: BoundMemory::new(sparse),
            command_buffers: HashSet::default(),
        }
    }

    #[inline]
    pub fn handle(&self) -> ash::vk::Buffer {
        self.handle
    }

    #[inline]
    pub fn size(&self) -> DeviceSize {
        self.create_info.size
    }

    #[inline]
    pub fn usage(&self) -> BufferUsage {
        self.create_info.usage
    }

    #[inline]
    pub fn sharing(&self) -> &Sharing {
        &self.create_info.sharing
    }

    #[inline]
    pub fn is_memory_bound(&self) -> bool {
        self.memory.is_bound()
    }

    /// Checks that the buffer was created with at least one of `usage`.
    pub(crate) fn validate_usage(
        &self,
        usage: BufferUsage,
        vuids: &'static [&'static str],
    ) -> Result<(), Box<ValidationError>> {
        if !self.usage().intersects(usage) {
            return Err(Box::new(ValidationError {
                problem: format!(
                    "the buffer was not created with any of the following usages: {:?}",
                    usage,
                )
                .into(),
                vuids,
                ..Default::default()
            }));
        }

        Ok(())
    }
}

/// Parameters to create a new buffer view.
#[derive(Clone, Debug)]
pub struct BufferViewCreateInfo {
    /// The format of the buffer view.
    ///
    /// The default value is `Format::UNDEFINED`.
    pub format: Format,

    /// The offset in bytes from the start of the buffer.
    ///
    /// The default value is `0`.
    pub offset: DeviceSize,

    /// The size in bytes of the view, or [`WHOLE_SIZE`].
    ///
    /// The default value is [`WHOLE_SIZE`].
    pub range: DeviceSize,

    pub _ne: crate::NonExhaustive,
}

impl Default for BufferViewCreateInfo {
    #[inline]
    fn default() -> Self {
        Self {
            format: Format::UNDEFINED,
            offset: 0,
            range: WHOLE_SIZE,
            _ne: crate::NonExhaustive(()),
        }
    }
}

impl BufferViewCreateInfo {
    pub(crate) fn validate(&self, buffer: &BufferState) -> Result<(), Box<ValidationError>> {
        let &Self {
            format,
            offset,
            range,
            _ne: _,
        } = self;

        buffer
            .validate_usage(
                BufferUsage::UNIFORM_TEXEL_BUFFER | BufferUsage::STORAGE_TEXEL_BUFFER,
                &["VUID-VkBufferViewCreateInfo-buffer-00932"],
            )
            .map_err(|err| err.add_context("buffer"))?;

        if offset >= buffer.size() {
            return Err(Box::new(ValidationError {
                context: "create_info.offset".into(),
                problem: "is not less than the size of the buffer".into(),
                vuids: &["VUID-VkBufferViewCreateInfo-offset-00925"],
                ..Default::default()
            }));
        }

        let element_size = match format.block_size() {
            Some(size) if format.is_color() && !format.is_compressed() => size,
            _ => {
                return Err(Box::new(ValidationError {
                    context: "create_info.format".into(),
                    problem: "is not a format that can be used in a texel buffer".into(),
                    vuids: &["VUID-VkBufferViewCreateInfo-buffer-00933"],
                    ..Default::default()
                }));
            }
        };

        if range != WHOLE_SIZE {
            if range == 0 {
                return Err(Box::new(ValidationError {
                    context: "create_info.range".into(),
                    problem: "is zero".into(),
                    vuids: &["VUID-VkBufferViewCreateInfo-range-00928"],
                    ..Default::default()
                }));
            }

            if range % element_size != 0 {
                return Err(Box::new(ValidationError {
                    context: "create_info.range".into(),
                    problem: "is not a multiple of the texel block size of `create_info.format`"
                        .into(),
                    vuids: &["VUID-VkBufferViewCreateInfo-range-00929"],
                    ..Default::default()
                }));
            }

            if offset.saturating_add(range) > buffer.size() {
                return Err(Box::new(ValidationError {
                    problem: "`create_info.offset + create_info.range` is greater than the size \
                        of the buffer"
                        .into(),
                    vuids: &["VUID-VkBufferViewCreateInfo-offset-00931"],
                    ..Default::default()
                }));
            }
        }

        Ok(())
    }
}

/// The state tracked for a buffer view.
#[derive(Debug)]
pub struct BufferViewState {
    handle: ash::vk::BufferView,
    buffer: ash::vk::Buffer,
    format: Format,
    offset: DeviceSize,
    range: DeviceSize,
    pub(crate) command_buffers: HashSet<ash::vk::CommandBuffer>,
}

impl BufferViewState {
    /// Creates the record of a view of `buffer`, resolving [`WHOLE_SIZE`].
    pub fn new(
        handle: ash::vk::BufferView,
        buffer: &BufferState,
        create_info: &BufferViewCreateInfo,
    ) -> Self {
        let range = if create_info.range == WHOLE_SIZE {
            buffer.size().saturating_sub(create_info.offset)
        } else {
            create_info.range
        };

        BufferViewState {
            handle,
            buffer: buffer.handle(),
            format: create_info.format,
            offset: create_info.offset,
            range,
            command_buffers: HashSet::default(),
        }
    }

    #[inline]
    pub fn handle(&self) -> ash::vk::BufferView {
        self.handle
    }

    #[inline]
    pub fn buffer(&self) -> ash::vk::Buffer {
        self.buffer
    }

    #[inline]
    pub fn format(&self) -> Format {
        self.format
    }

    #[inline]
    pub fn offset(&self) -> DeviceSize {
        self.offset
    }

    #[inline]
    pub fn range(&self) -> DeviceSize {
        self.range
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ash::vk::Handle;

    fn buffer(size: DeviceSize, usage: BufferUsage) -> BufferState {
        BufferState::new(
            ash::vk::Buffer::from_raw(1),
            BufferCreateInfo {
                size,
                usage,
                ..Default::default()
            },
        )
    }

    #[test]
    fn create_info() {
        assert!(BufferCreateInfo::default().validate().is_err());
        assert!(BufferCreateInfo {
            size: 16,
            usage: BufferUsage::UNIFORM_BUFFER,
            ..Default::default()
        }
        .validate()
        .is_ok());
    }

    #[test]
    fn view_range() {
        let buffer = buffer(256, BufferUsage::UNIFORM_TEXEL_BUFFER);
        let create_info = BufferViewCreateInfo {
            format: Format::R32_UINT,
            offset: 64,
            ..Default::default()
        };
        assert!(create_info.validate(&buffer).is_ok());

        let view = BufferViewState::new(ash::vk::BufferView::from_raw(2), &buffer, &create_info);
        assert_eq!(view.range(), 192);

        let create_info = BufferViewCreateInfo {
            range: 6,
            ..create_info
        };
        assert_eq!(
            create_info.validate(&buffer).unwrap_err().vuid(),
            "VUID-VkBufferViewCreateInfo-range-00929",
        );

        let create_info = BufferViewCreateInfo {
            range: 256,
            ..create_info
        };
        assert_eq!(
            create_info.validate(&buffer).unwrap_err().vuid(),
            "VUID-VkBufferViewCreateInfo-offset-00931",
        );
    }

    #[test]
    fn view_usage() {
        let buffer = buffer(256, BufferUsage::UNIFORM_BUFFER);
        let create_info = BufferViewCreateInfo {
            format: Format::R32_UINT,
            ..Default::default()
        };

        assert_eq!(
            create_info
                .validate(&buffer)
                .unwrap_err()
                .vuid(),
            "VUID-VkBufferViewCreateInfo-buffer-00932",
        );
    }
}
