// Copyright (c) 2016 The vulkano developers
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or https://opensource.org/licenses/MIT>,
// at your option. All files in the project carrying such
// notice may not be copied, modified, or distributed except
// according to those terms.

//! Pipeline barriers.

use super::{
    image_layout::first_layout_mismatch,
    qfo::{BufferTransferBarrier, ImageTransferBarrier, TransferOperation},
    CommandBufferState,
};
use crate::{
    buffer::BufferState,
    config::ValidationConfig,
    image::{ImageAspects, ImageLayout, ImageState, RangeVuids},
    sync::{
        is_external_queue_family, BufferMemoryBarrier, ImageMemoryBarrier, Sharing,
        QUEUE_FAMILY_IGNORED,
    },
    validator::{lookup, ObjectTables},
    ObjectHandle, Report, ValidationError, WHOLE_SIZE,
};
use smallvec::SmallVec;

/// The memory barriers of a pipeline barrier command.
#[derive(Clone, Debug)]
pub struct DependencyInfo {
    pub image_memory_barriers: SmallVec<[ImageMemoryBarrier; 2]>,
    pub buffer_memory_barriers: SmallVec<[BufferMemoryBarrier; 1]>,
    pub _ne: crate::NonExhaustive,
}

impl Default for DependencyInfo {
    #[inline]
    fn default() -> Self {
        Self {
            image_memory_barriers: SmallVec::new(),
            buffer_memory_barriers: SmallVec::new(),
            _ne: crate::NonExhaustive(()),
        }
    }
}

impl DependencyInfo {
    pub(crate) fn validate(
        &self,
        command_buffer: &CommandBufferState,
        objects: &ObjectTables,
        config: &ValidationConfig,
        report: &mut Report,
    ) {
        let &Self {
            ref image_memory_barriers,
            ref buffer_memory_barriers,
            _ne: _,
        } = self;

        for (barrier_index, barrier) in image_memory_barriers.iter().enumerate() {
            let object = ObjectHandle::new(barrier.image);

            let image = match lookup(
                &objects.images,
                barrier.image,
                "image",
                &["VUID-VkImageMemoryBarrier-image-parameter"],
            ) {
                Ok(image) => image,
                Err(err) => {
                    report.error(
                        object,
                        Err(err.add_context(format!("image_memory_barriers[{}]", barrier_index))),
                    );
                    continue;
                }
            };

            let result = validate_image_barrier(barrier, image, command_buffer, config).map_err(
                |err| err.add_context(format!("image_memory_barriers[{}]", barrier_index)),
            );

            if report.error(object, result) {
                continue;
            }

            let transfer = ImageTransferBarrier::from(barrier);

            if let Some(operation) =
                TransferOperation::of(&transfer, command_buffer.queue_family_index())
            {
                report.warning(
                    ObjectHandle::new(command_buffer.handle()),
                    command_buffer
                        .qfo_transfers()
                        .images
                        .validate_barrier(&transfer, operation),
                );
            }
        }

        for (barrier_index, barrier) in buffer_memory_barriers.iter().enumerate() {
            let object = ObjectHandle::new(barrier.buffer);

            let result = lookup(
                &objects.buffers,
                barrier.buffer,
                "buffer",
                &["VUID-VkBufferMemoryBarrier-buffer-parameter"],
            )
            .and_then(|buffer| validate_buffer_barrier(barrier, buffer))
            .map_err(|err| err.add_context(format!("buffer_memory_barriers[{}]", barrier_index)));

            if report.error(object, result) {
                continue;
            }

            let transfer = BufferTransferBarrier::from(barrier);

            if let Some(operation) =
                TransferOperation::of(&transfer, command_buffer.queue_family_index())
            {
                report.warning(
                    ObjectHandle::new(command_buffer.handle()),
                    command_buffer
                        .qfo_transfers()
                        .buffers
                        .validate_barrier(&transfer, operation),
                );
            }
        }
    }

    pub(crate) fn record(
        &self,
        command_buffer: &mut CommandBufferState,
        objects: &mut ObjectTables,
    ) {
        let queue_family_index = command_buffer.queue_family_index();

        for barrier in &self.image_memory_barriers {
            command_buffer.bind_image(&mut objects.images, barrier.image);

            let Some(image) = objects.images.get(&barrier.image) else {
                continue;
            };

            command_buffer.set_image_layout(
                image,
                &barrier.subresource_range,
                barrier.new_layout,
                Some(barrier.old_layout),
            );

            let transfer = ImageTransferBarrier::from(barrier);

            if let Some(operation) = TransferOperation::of(&transfer, queue_family_index) {
                command_buffer
                    .qfo_transfers
                    .images
                    .record_barrier(transfer, operation);
            }
        }

        for barrier in &self.buffer_memory_barriers {
            command_buffer.bind_buffer(&mut objects.buffers, barrier.buffer);

            let transfer = BufferTransferBarrier::from(barrier);

            if let Some(operation) = TransferOperation::of(&transfer, queue_family_index) {
                command_buffer
                    .qfo_transfers
                    .buffers
                    .record_barrier(transfer, operation);
            }
        }
    }
}

fn layout_usage_vuids(layout: ImageLayout) -> &'static [&'static str] {
    match layout {
        ImageLayout::ColorAttachmentOptimal => &["VUID-VkImageMemoryBarrier-oldLayout-01208"],
        ImageLayout::DepthStencilReadOnlyOptimal => {
            &["VUID-VkImageMemoryBarrier-oldLayout-01210"]
        }
        ImageLayout::ShaderReadOnlyOptimal => &["VUID-VkImageMemoryBarrier-oldLayout-01211"],
        ImageLayout::TransferSrcOptimal => &["VUID-VkImageMemoryBarrier-oldLayout-01212"],
        ImageLayout::TransferDstOptimal => &["VUID-VkImageMemoryBarrier-oldLayout-01213"],
        _ => &["VUID-VkImageMemoryBarrier-oldLayout-01209"],
    }
}

fn validate_sharing_queue_families(
    sharing: &Sharing,
    src_queue_family_index: u32,
    dst_queue_family_index: u32,
    vuids: &'static [&'static str],
) -> Result<(), Box<ValidationError>> {
    if sharing.is_exclusive() {
        return Ok(());
    }

    let is_allowed = |index: u32| index == QUEUE_FAMILY_IGNORED || is_external_queue_family(index);

    if !is_allowed(src_queue_family_index) && !is_allowed(dst_queue_family_index) {
        return Err(Box::new(ValidationError {
            problem: format!(
                "the resource was created with concurrent sharing, but the barrier has \
                queue family indices {} and {}, where at least one of them must be \
                `QUEUE_FAMILY_IGNORED`, `QUEUE_FAMILY_EXTERNAL` or `QUEUE_FAMILY_FOREIGN`",
                src_queue_family_index, dst_queue_family_index,
            )
            .into(),
            vuids,
            ..Default::default()
        }));
    }

    Ok(())
}

fn validate_image_barrier(
    barrier: &ImageMemoryBarrier,
    image: &ImageState,
    command_buffer: &CommandBufferState,
    config: &ValidationConfig,
) -> Result<(), Box<ValidationError>> {
    let &ImageMemoryBarrier {
        image: _,
        old_layout,
        new_layout,
        src_queue_family_index,
        dst_queue_family_index,
        ref subresource_range,
        _ne: _,
    } = barrier;

    image
        .validate_subresource_range(subresource_range, RangeVuids::BARRIER)
        .map_err(|err| err.add_context("subresource_range"))?;

    let format = image.format();

    if format.is_depth_and_stencil() {
        let aspects = subresource_range.aspects;
        let both = ImageAspects::DEPTH | ImageAspects::STENCIL;

        if !aspects.contains(both) && !config.features.separate_depth_stencil_layouts {
            return Err(Box::new(ValidationError {
                context: "subresource_range.aspects".into(),
                problem: "the image has a format with both a depth and a stencil component, \
                    but the aspects do not contain both `ImageAspects::DEPTH` and \
                    `ImageAspects::STENCIL`"
                    .into(),
                requires_one_of: crate::RequiresOneOf(&[crate::RequiresAllOf(&[
                    crate::Requires::DeviceFeature("separate_depth_stencil_layouts"),
                ])]),
                vuids: &["VUID-VkImageMemoryBarrier-image-03320"],
                ..Default::default()
            }));
        }

        if !aspects.intersects(both) {
            return Err(Box::new(ValidationError {
                context: "subresource_range.aspects".into(),
                problem: "contains neither `ImageAspects::DEPTH` nor `ImageAspects::STENCIL`"
                    .into(),
                vuids: &["VUID-VkImageMemoryBarrier-image-03319"],
                ..Default::default()
            }));
        }
    }

    if matches!(
        new_layout,
        ImageLayout::Undefined | ImageLayout::Preinitialized
    ) {
        return Err(Box::new(ValidationError {
            context: "new_layout".into(),
            problem: "is `ImageLayout::Undefined` or `ImageLayout::Preinitialized`".into(),
            vuids: &["VUID-VkImageMemoryBarrier-newLayout-01198"],
            ..Default::default()
        }));
    }

    for (layout, context) in [(old_layout, "old_layout"), (new_layout, "new_layout")] {
        if let Some(required_usage) = layout.required_usage() {
            if !image.usage().intersects(required_usage) {
                return Err(Box::new(ValidationError {
                    context: context.into(),
                    problem: format!(
                        "is `ImageLayout::{:?}`, but the image was not created with any of \
                        the usages {:?}",
                        layout, required_usage,
                    )
                    .into(),
                    vuids: layout_usage_vuids(layout),
                    ..Default::default()
                }));
            }
        }
    }

    validate_sharing_queue_families(
        &image.create_info().sharing,
        src_queue_family_index,
        dst_queue_family_index,
        &["VUID-VkImageMemoryBarrier-image-04071"],
    )?;

    if old_layout != ImageLayout::Undefined && !config.disabled.image_layout_validation {
        let range = image.normalize_range(subresource_range);

        if let Some(mismatch) = command_buffer
            .image_layout_map(image.handle())
            .and_then(|map| {
                first_layout_mismatch(
                    map,
                    &range,
                    old_layout,
                    range.aspects,
                    image.is_shared_presentable(),
                )
            })
        {
            return Err(Box::new(ValidationError {
                context: "old_layout".into(),
                problem: format!(
                    "is `ImageLayout::{:?}`, but the {} layout of image {:?} (aspect {:?}, mip \
                    level {}, array layer {}) in the command buffer is `ImageLayout::{:?}`",
                    old_layout,
                    mismatch.describe(),
                    image.handle(),
                    mismatch.subresource.aspects,
                    mismatch.subresource.mip_level,
                    mismatch.subresource.array_layer,
                    mismatch.layout,
                )
                .into(),
                vuids: &["VUID-VkImageMemoryBarrier-oldLayout-01197"],
                ..Default::default()
            }));
        }
    }

    Ok(())
}

fn validate_buffer_barrier(
    barrier: &BufferMemoryBarrier,
    buffer: &BufferState,
) -> Result<(), Box<ValidationError>> {
    let &BufferMemoryBarrier {
        buffer: _,
        src_queue_family_index,
        dst_queue_family_index,
        offset,
        size,
        _ne: _,
    } = barrier;

    if offset >= buffer.size() {
        return Err(Box::new(ValidationError {
            context: "offset".into(),
            problem: "is not less than the size of the buffer".into(),
            vuids: &["VUID-VkBufferMemoryBarrier-offset-01187"],
            ..Default::default()
        }));
    }

    if size != WHOLE_SIZE {
        if size == 0 {
            return Err(Box::new(ValidationError {
                context: "size".into(),
                problem: "is zero".into(),
                vuids: &["VUID-VkBufferMemoryBarrier-size-01188"],
                ..Default::default()
            }));
        }

        if offset + size > buffer.size() {
            return Err(Box::new(ValidationError {
                problem: "`offset + size` is greater than the size of the buffer".into(),
                vuids: &["VUID-VkBufferMemoryBarrier-size-01189"],
                ..Default::default()
            }));
        }
    }

    validate_sharing_queue_families(
        buffer.sharing(),
        src_queue_family_index,
        dst_queue_family_index,
        &["VUID-VkBufferMemoryBarrier-buffer-04088"],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        buffer::BufferUsage,
        format::Format,
        image::{ImageCreateInfo, ImageSubresourceRange, ImageUsage},
        tests_util::{test_validator, ColorImage},
        Severity,
    };

    #[test]
    fn old_layout_mismatch() {
        let (mut validator, sink) = test_validator();
        let image = validator.test_image(ColorImage::transfer(8, 8));
        let cb = validator.test_command_buffer(0);
        let whole = ImageSubresourceRange::whole(ImageAspects::COLOR);

        let mut to_dst = ImageMemoryBarrier::image(image, whole.clone());
        to_dst.new_layout = ImageLayout::TransferDstOptimal;
        let dependency_info = DependencyInfo {
            image_memory_barriers: smallvec::smallvec![to_dst],
            ..Default::default()
        };
        assert!(!validator.validate_cmd_pipeline_barrier(cb, &dependency_info));
        validator.record_cmd_pipeline_barrier(cb, &dependency_info);

        let mut wrong_old = ImageMemoryBarrier::image(image, whole);
        wrong_old.old_layout = ImageLayout::TransferSrcOptimal;
        wrong_old.new_layout = ImageLayout::General;
        let dependency_info = DependencyInfo {
            image_memory_barriers: smallvec::smallvec![wrong_old],
            ..Default::default()
        };
        assert!(validator.validate_cmd_pipeline_barrier(cb, &dependency_info));
        assert!(sink.contains_vuid("VUID-VkImageMemoryBarrier-oldLayout-01197"));
    }

    #[test]
    fn new_layout_and_usage() {
        let (mut validator, sink) = test_validator();
        let image = validator.test_image(ColorImage::transfer(8, 8));
        let cb = validator.test_command_buffer(0);
        let whole = ImageSubresourceRange::whole(ImageAspects::COLOR);

        let barrier = ImageMemoryBarrier::image(image, whole.clone());
        let dependency_info = DependencyInfo {
            image_memory_barriers: smallvec::smallvec![barrier],
            ..Default::default()
        };
        assert!(validator.validate_cmd_pipeline_barrier(cb, &dependency_info));
        assert!(sink.contains_vuid("VUID-VkImageMemoryBarrier-newLayout-01198"));

        let mut barrier = ImageMemoryBarrier::image(image, whole);
        barrier.new_layout = ImageLayout::ColorAttachmentOptimal;
        let dependency_info = DependencyInfo {
            image_memory_barriers: smallvec::smallvec![barrier],
            ..Default::default()
        };
        assert!(validator.validate_cmd_pipeline_barrier(cb, &dependency_info));
        assert!(sink.contains_vuid("VUID-VkImageMemoryBarrier-oldLayout-01208"));
    }

    #[test]
    fn depth_stencil_aspects() {
        let (mut validator, sink) = test_validator();
        let image = validator.test_image_with(ImageCreateInfo {
            format: Format::D24_UNORM_S8_UINT,
            extent: [8, 8, 1],
            usage: ImageUsage::DEPTH_STENCIL_ATTACHMENT,
            ..Default::default()
        });
        let cb = validator.test_command_buffer(0);

        let mut barrier =
            ImageMemoryBarrier::image(image, ImageSubresourceRange::whole(ImageAspects::DEPTH));
        barrier.new_layout = ImageLayout::DepthStencilAttachmentOptimal;
        let dependency_info = DependencyInfo {
            image_memory_barriers: smallvec::smallvec![barrier],
            ..Default::default()
        };
        assert!(validator.validate_cmd_pipeline_barrier(cb, &dependency_info));
        assert!(sink.contains_vuid("VUID-VkImageMemoryBarrier-image-03320"));
    }

    #[test]
    fn duplicate_release_is_warning() {
        let (mut validator, sink) = test_validator();
        let buffer = validator.test_buffer(64, BufferUsage::TRANSFER_SRC);
        let cb = validator.test_command_buffer(1);

        let mut barrier = BufferMemoryBarrier::buffer(buffer);
        barrier.src_queue_family_index = 1;
        barrier.dst_queue_family_index = 2;
        let dependency_info = DependencyInfo {
            buffer_memory_barriers: smallvec::smallvec![barrier],
            ..Default::default()
        };

        assert!(!validator.validate_cmd_pipeline_barrier(cb, &dependency_info));
        validator.record_cmd_pipeline_barrier(cb, &dependency_info);
        assert!(sink.take().is_empty());

        assert!(!validator.validate_cmd_pipeline_barrier(cb, &dependency_info));
        let messages = sink.take();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].severity, Severity::Warning);
        assert_eq!(
            messages[0].vuid,
            "UNASSIGNED-VkBufferMemoryBarrier-buffer-00001",
        );
    }

    #[test]
    fn buffer_barrier_range() {
        let (mut validator, sink) = test_validator();
        let buffer = validator.test_buffer(64, BufferUsage::TRANSFER_SRC);
        let cb = validator.test_command_buffer(0);

        let mut barrier = BufferMemoryBarrier::buffer(buffer);
        barrier.offset = 32;
        barrier.size = 64;
        let dependency_info = DependencyInfo {
            buffer_memory_barriers: smallvec::smallvec![barrier],
            ..Default::default()
        };

        assert!(validator.validate_cmd_pipeline_barrier(cb, &dependency_info));
        assert!(sink.contains_vuid("VUID-VkBufferMemoryBarrier-size-01189"));
    }
}
