// Copyright (c) 2016 The vulkano developers
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or https://opensource.org/licenses/MIT>,
// at your option. All files in the project carrying such
// notice may not be copied, modified, or distributed except
// according to those terms.

use crate::{
    buffer::{BufferCreateInfo, BufferUsage},
    command_buffer::CommandBufferLevel,
    config::ValidationConfig,
    descriptor_set::{
        layout::{DescriptorSetLayoutCreateInfo, DescriptorType},
        DescriptorPoolCreateFlags, DescriptorPoolCreateInfo, DescriptorSetAllocateInfo,
    },
    format::Format,
    image::{view::ImageViewCreateInfo, ImageCreateInfo, ImageUsage},
    render_pass::{FramebufferCreateInfo, RenderPassCreateInfo},
    validator::DeviceValidator,
    CollectingSink, DeviceSize,
};
use ash::vk::Handle;
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

static NEXT_HANDLE: AtomicU64 = AtomicU64::new(0x1000);

/// Returns a raw handle that no other test object uses.
fn next_handle<H: Handle>() -> H {
    H::from_raw(NEXT_HANDLE.fetch_add(1, Ordering::Relaxed))
}

/// Creates a validator with the default configuration, that collects its messages.
pub(crate) fn test_validator() -> (DeviceValidator, Arc<CollectingSink>) {
    test_validator_with(ValidationConfig::default())
}

pub(crate) fn test_validator_with(
    config: ValidationConfig,
) -> (DeviceValidator, Arc<CollectingSink>) {
    let sink = Arc::new(CollectingSink::new());
    let validator = DeviceValidator::new(config, sink.clone());

    (validator, sink)
}

/// Create infos of single-sample 2D color images.
pub(crate) struct ColorImage;

impl ColorImage {
    fn create_info(width: u32, height: u32, usage: ImageUsage) -> ImageCreateInfo {
        ImageCreateInfo {
            format: Format::R8G8B8A8_UNORM,
            extent: [width, height, 1],
            usage,
            ..Default::default()
        }
    }

    pub(crate) fn transfer(width: u32, height: u32) -> ImageCreateInfo {
        Self::create_info(width, height, ImageUsage::TRANSFER_SRC | ImageUsage::TRANSFER_DST)
    }

    pub(crate) fn attachment(width: u32, height: u32, array_layers: u32) -> ImageCreateInfo {
        ImageCreateInfo {
            array_layers,
            ..Self::create_info(
                width,
                height,
                ImageUsage::COLOR_ATTACHMENT | ImageUsage::TRANSFER_DST,
            )
        }
    }

    pub(crate) fn sampled(width: u32, height: u32) -> ImageCreateInfo {
        Self::create_info(width, height, ImageUsage::SAMPLED | ImageUsage::TRANSFER_DST)
    }
}

/// Objects created without going through validation, for tests that exercise something else.
///
/// Images and buffers come with memory bound to them.
impl DeviceValidator {
    pub(crate) fn test_image(&mut self, create_info: ImageCreateInfo) -> ash::vk::Image {
        assert!(!self.validate_create_image(&create_info));

        self.test_image_with(create_info)
    }

    /// Like `test_image`, but `create_info` is not validated.
    pub(crate) fn test_image_with(&mut self, create_info: ImageCreateInfo) -> ash::vk::Image {
        let image = next_handle();
        self.record_create_image(image, create_info);
        self.record_bind_image_memory(image, next_handle(), 0);

        image
    }

    /// Creates a view of the whole of `image`.
    pub(crate) fn test_view(&mut self, image: ash::vk::Image) -> ash::vk::ImageView {
        let create_info = ImageViewCreateInfo::from_image(self.image(image).unwrap());
        let image_view = next_handle();
        self.record_create_image_view(image_view, image, &create_info);

        image_view
    }

    pub(crate) fn test_buffer(&mut self, size: DeviceSize, usage: BufferUsage) -> ash::vk::Buffer {
        let buffer = next_handle();
        self.record_create_buffer(
            buffer,
            BufferCreateInfo {
                size,
                usage,
                ..Default::default()
            },
        );
        self.record_bind_buffer_memory(buffer, next_handle(), 0);

        buffer
    }

    pub(crate) fn test_render_pass(
        &mut self,
        create_info: RenderPassCreateInfo,
    ) -> ash::vk::RenderPass {
        let render_pass = next_handle();
        self.record_create_render_pass(render_pass, create_info);

        render_pass
    }

    pub(crate) fn test_framebuffer(
        &mut self,
        create_info: FramebufferCreateInfo,
    ) -> ash::vk::Framebuffer {
        let framebuffer = next_handle();
        self.record_create_framebuffer(framebuffer, create_info);

        framebuffer
    }

    /// Allocates a primary command buffer for `queue_family_index`, and begins it.
    pub(crate) fn test_command_buffer(
        &mut self,
        queue_family_index: u32,
    ) -> ash::vk::CommandBuffer {
        let command_buffer = next_handle();
        self.record_allocate_command_buffers(
            next_handle(),
            queue_family_index,
            CommandBufferLevel::Primary,
            &[command_buffer],
        );
        self.record_begin_command_buffer(command_buffer);

        command_buffer
    }

    pub(crate) fn test_descriptor_set_layout(
        &mut self,
        create_info: DescriptorSetLayoutCreateInfo,
    ) -> ash::vk::DescriptorSetLayout {
        let layout = next_handle();
        self.record_create_descriptor_set_layout(layout, &create_info);

        layout
    }

    /// Creates a pool with room for 64 sets, and 64 descriptors of every type except storage
    /// images.
    pub(crate) fn test_descriptor_pool(
        &mut self,
        flags: DescriptorPoolCreateFlags,
    ) -> ash::vk::DescriptorPool {
        let pool = next_handle();
        let pool_sizes = [
            DescriptorType::Sampler,
            DescriptorType::CombinedImageSampler,
            DescriptorType::SampledImage,
            DescriptorType::UniformTexelBuffer,
            DescriptorType::StorageTexelBuffer,
            DescriptorType::UniformBuffer,
            DescriptorType::StorageBuffer,
            DescriptorType::UniformBufferDynamic,
            DescriptorType::StorageBufferDynamic,
            DescriptorType::InputAttachment,
        ]
        .into_iter()
        .map(|descriptor_type| (descriptor_type, 64))
        .collect();

        self.record_create_descriptor_pool(
            pool,
            DescriptorPoolCreateInfo {
                flags,
                max_sets: 64,
                pool_sizes,
                ..Default::default()
            },
        );

        pool
    }

    /// Creates a layout from `create_info`, and allocates a set with it from a new pool that
    /// allows freeing sets.
    pub(crate) fn test_descriptor_set(
        &mut self,
        create_info: DescriptorSetLayoutCreateInfo,
    ) -> (ash::vk::DescriptorSetLayout, ash::vk::DescriptorSet) {
        let layout = self.test_descriptor_set_layout(create_info);
        let pool = self.test_descriptor_pool(DescriptorPoolCreateFlags::FREE_DESCRIPTOR_SET);
        let set = next_handle();
        self.record_allocate_descriptor_sets(
            &DescriptorSetAllocateInfo::new(pool, [layout]),
            &[set],
        );

        (layout, set)
    }
}
