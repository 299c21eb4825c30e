// Copyright (c) 2016 The vulkano developers
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or https://opensource.org/licenses/MIT>,
// at your option. All files in the project carrying such
// notice may not be copied, modified, or distributed except
// according to those terms.

//! Beginning, advancing and ending render pass instances.
//!
//! Beginning a render pass checks that each attachment image is in the attachment's initial
//! layout, as far as the command buffer knows, and records that layout as the initial layout of
//! the attachment's subresources. Each subpass then transitions its attachments to the layouts of
//! its attachment references, and ending the render pass transitions every attachment to its
//! final layout.

use super::{CommandBufferState, RenderPassInstance};
use crate::{
    config::ValidationConfig,
    image::{layout::layouts_equivalent, view::ImageViewState, ImageLayout, ImageUsage},
    render_pass::{
        AttachmentDescription, FramebufferAttachmentImageInfo, FramebufferState, RenderPassState,
    },
    validator::{lookup, ObjectTables},
    ObjectHandle, Report, ValidationError,
};
use foldhash::HashSet;
use smallvec::SmallVec;

/// Parameters to begin a new render pass.
#[derive(Clone, Debug)]
pub struct RenderPassBeginInfo {
    pub render_pass: ash::vk::RenderPass,
    pub framebuffer: ash::vk::Framebuffer,

    /// The attachment image views, if `framebuffer` is imageless. Must be empty otherwise.
    ///
    /// The default value is empty.
    pub attachments: SmallVec<[ash::vk::ImageView; 4]>,

    pub _ne: crate::NonExhaustive,
}

impl RenderPassBeginInfo {
    #[inline]
    pub fn framebuffer(
        render_pass: ash::vk::RenderPass,
        framebuffer: ash::vk::Framebuffer,
    ) -> Self {
        Self {
            render_pass,
            framebuffer,
            attachments: SmallVec::new(),
            _ne: crate::NonExhaustive(()),
        }
    }

    /// Returns the image views used as attachments.
    fn attachment_views<'a>(
        &'a self,
        framebuffer: &'a FramebufferState,
    ) -> &'a [ash::vk::ImageView] {
        if framebuffer.is_imageless() {
            &self.attachments
        } else {
            framebuffer.attachments()
        }
    }

    pub(crate) fn validate(
        &self,
        command_buffer: &CommandBufferState,
        objects: &ObjectTables,
        config: &ValidationConfig,
        report: &mut Report,
    ) {
        let object = ObjectHandle::new(command_buffer.handle());
        let result = self.validate_begin(command_buffer, objects, config);
        report.error(object, result.map_err(|err| err.add_context("render_pass_begin_info")));
    }

    fn validate_begin(
        &self,
        command_buffer: &CommandBufferState,
        objects: &ObjectTables,
        config: &ValidationConfig,
    ) -> Result<(), Box<ValidationError>> {
        if command_buffer.render_pass().is_some() {
            return Err(Box::new(ValidationError {
                problem: "a render pass instance is already active".into(),
                vuids: &["VUID-vkCmdBeginRenderPass-renderpass"],
                ..Default::default()
            }));
        }

        let render_pass = lookup(
            &objects.render_passes,
            self.render_pass,
            "render_pass",
            &["VUID-VkRenderPassBeginInfo-renderPass-parameter"],
        )?;
        let framebuffer = lookup(
            &objects.framebuffers,
            self.framebuffer,
            "framebuffer",
            &["VUID-VkRenderPassBeginInfo-framebuffer-parameter"],
        )?;

        let attachment_count = render_pass.attachments().len();

        if framebuffer.is_imageless() {
            let image_infos = framebuffer.attachment_image_infos();

            if self.attachments.len() != image_infos.len() {
                return Err(Box::new(ValidationError {
                    problem: "the framebuffer is imageless, and the length of `attachments` does \
                        not equal the number of attachment image infos of the framebuffer"
                        .into(),
                    vuids: &["VUID-VkRenderPassBeginInfo-framebuffer-03208"],
                    ..Default::default()
                }));
            }
        } else {
            if !self.attachments.is_empty() {
                return Err(Box::new(ValidationError {
                    context: "attachments".into(),
                    problem: "is not empty, but the framebuffer is not imageless".into(),
                    vuids: &["VUID-VkRenderPassBeginInfo-framebuffer-03207"],
                    ..Default::default()
                }));
            }
        }

        let views = self.attachment_views(framebuffer);

        if views.len() != attachment_count {
            return Err(Box::new(ValidationError {
                problem: "the number of attachments of the framebuffer does not equal the \
                    number of attachments of the render pass"
                    .into(),
                vuids: &["VUID-VkRenderPassBeginInfo-renderPass-00904"],
                ..Default::default()
            }));
        }

        for (attachment_index, (&view, description)) in
            views.iter().zip(render_pass.attachments()).enumerate()
        {
            let view = lookup(
                &objects.image_views,
                view,
                format!("attachments[{}]", attachment_index),
                &["VUID-VkRenderPassAttachmentBeginInfo-pAttachments-parameter"],
            )?;

            if framebuffer.is_imageless() {
                if let Some(image_info) = framebuffer.attachment_image_infos().get(attachment_index)
                {
                    validate_imageless_attachment(view, image_info, description).map_err(
                        |err| err.add_context(format!("attachments[{}]", attachment_index)),
                    )?;
                }
            }

            validate_initial_layout_usage(view, description).map_err(|err| {
                err.add_context(format!("render_pass.attachments[{}]", attachment_index))
            })?;

            if !config.disabled.image_layout_validation {
                validate_initial_layout(command_buffer, objects, view, description).map_err(
                    |err| err.add_context(format!("render_pass.attachments[{}]", attachment_index)),
                )?;
            }
        }

        Ok(())
    }

    pub(crate) fn record(
        &self,
        command_buffer: &mut CommandBufferState,
        objects: &mut ObjectTables,
    ) {
        let (Some(render_pass), Some(framebuffer)) = (
            objects.render_passes.get(&self.render_pass),
            objects.framebuffers.get_mut(&self.framebuffer),
        ) else {
            return;
        };

        framebuffer.command_buffers.insert(command_buffer.handle());
        command_buffer.add_object(ObjectHandle::new(self.framebuffer));

        let attachments: SmallVec<[ash::vk::ImageView; 4]> =
            self.attachment_views(framebuffer).iter().copied().collect();

        for (&view, description) in attachments.iter().zip(render_pass.attachments()) {
            command_buffer.bind_image_view(&mut objects.image_views, view);

            let Some(view_state) = objects.image_views.get(&view) else {
                continue;
            };
            command_buffer.bind_image(&mut objects.images, view_state.image());

            if let Some(image) = objects.images.get(&view_state.image()) {
                command_buffer.set_image_view_initial_layout(
                    view_state,
                    image,
                    description.initial_layout,
                );
            }
        }

        command_buffer.render_pass = Some(RenderPassInstance {
            render_pass: self.render_pass,
            framebuffer: self.framebuffer,
            subpass: 0,
            attachments,
        });

        transition_subpass_layouts(command_buffer, objects);
    }
}

fn validate_imageless_attachment(
    view: &ImageViewState,
    image_info: &FramebufferAttachmentImageInfo,
    description: &AttachmentDescription,
) -> Result<(), Box<ValidationError>> {
    let &FramebufferAttachmentImageInfo {
        flags,
        usage,
        width,
        height,
        layer_count,
        ref view_formats,
        _ne: _,
    } = image_info;

    if view.image_flags() != flags {
        return Err(Box::new(ValidationError {
            problem: "the creation flags of the image of the view do not equal the flags of \
                the corresponding attachment image info of the framebuffer"
                .into(),
            vuids: &["VUID-VkRenderPassBeginInfo-framebuffer-03210"],
            ..Default::default()
        }));
    }

    if view.image_usage() != usage {
        return Err(Box::new(ValidationError {
            problem: "the usage of the image of the view does not equal the usage of the \
                corresponding attachment image info of the framebuffer"
                .into(),
            vuids: &["VUID-VkRenderPassBeginInfo-framebuffer-03211"],
            ..Default::default()
        }));
    }

    let [view_width, view_height, _] = view.extent();

    if view_width != width {
        return Err(Box::new(ValidationError {
            problem: format!(
                "the width of the view ({}) does not equal the width of the corresponding \
                attachment image info of the framebuffer ({})",
                view_width, width,
            )
            .into(),
            vuids: &["VUID-VkRenderPassBeginInfo-framebuffer-03212"],
            ..Default::default()
        }));
    }

    if view_height != height {
        return Err(Box::new(ValidationError {
            problem: format!(
                "the height of the view ({}) does not equal the height of the corresponding \
                attachment image info of the framebuffer ({})",
                view_height, height,
            )
            .into(),
            vuids: &["VUID-VkRenderPassBeginInfo-framebuffer-03213"],
            ..Default::default()
        }));
    }

    if view.layer_count() != layer_count {
        return Err(Box::new(ValidationError {
            problem: format!(
                "the number of layers of the view ({}) does not equal the layer count of the \
                corresponding attachment image info of the framebuffer ({})",
                view.layer_count(),
                layer_count,
            )
            .into(),
            vuids: &["VUID-VkRenderPassBeginInfo-framebuffer-03214"],
            ..Default::default()
        }));
    }

    let image_view_formats = view.image_view_formats();

    if image_view_formats.len() != view_formats.len() {
        return Err(Box::new(ValidationError {
            problem: "the number of view formats of the image of the view does not equal the \
                number of view formats of the corresponding attachment image info of the \
                framebuffer"
                .into(),
            vuids: &["VUID-VkRenderPassBeginInfo-framebuffer-03215"],
            ..Default::default()
        }));
    }

    let expected: HashSet<_> = view_formats.iter().copied().collect();

    if !image_view_formats
        .iter()
        .all(|format| expected.contains(format))
    {
        return Err(Box::new(ValidationError {
            problem: "the view formats of the image of the view are not the view formats of \
                the corresponding attachment image info of the framebuffer"
                .into(),
            vuids: &["VUID-VkRenderPassBeginInfo-framebuffer-03216"],
            ..Default::default()
        }));
    }

    if view.format() != description.format {
        return Err(Box::new(ValidationError {
            problem: format!(
                "the format of the view ({:?}) does not equal the format of the render pass \
                attachment ({:?})",
                view.format(),
                description.format,
            )
            .into(),
            vuids: &["VUID-VkRenderPassBeginInfo-framebuffer-03217"],
            ..Default::default()
        }));
    }

    if view.samples() != description.samples {
        return Err(Box::new(ValidationError {
            problem: format!(
                "the sample count of the view ({:?}) does not equal the sample count of the \
                render pass attachment ({:?})",
                view.samples(),
                description.samples,
            )
            .into(),
            vuids: &["VUID-VkRenderPassBeginInfo-framebuffer-09047"],
            ..Default::default()
        }));
    }

    if view.subresource_range().mip_levels.len() != 1 {
        return Err(Box::new(ValidationError {
            problem: "the view has more than one mip level".into(),
            vuids: &["VUID-VkRenderPassAttachmentBeginInfo-pAttachments-03218"],
            ..Default::default()
        }));
    }

    if !view.component_mapping().is_identity() {
        return Err(Box::new(ValidationError {
            problem: "the view does not have an identity component mapping".into(),
            vuids: &["VUID-VkRenderPassAttachmentBeginInfo-pAttachments-03219"],
            ..Default::default()
        }));
    }

    Ok(())
}

fn validate_initial_layout_usage(
    view: &ImageViewState,
    description: &AttachmentDescription,
) -> Result<(), Box<ValidationError>> {
    let initial_layout = description.initial_layout;

    let (required_usage, vuids): (ImageUsage, &'static [&'static str]) = match initial_layout {
        ImageLayout::ColorAttachmentOptimal => (
            ImageUsage::COLOR_ATTACHMENT,
            &["VUID-vkCmdBeginRenderPass-initialLayout-00895"],
        ),
        ImageLayout::ShaderReadOnlyOptimal => (
            ImageUsage::SAMPLED | ImageUsage::INPUT_ATTACHMENT,
            &["VUID-vkCmdBeginRenderPass-initialLayout-00897"],
        ),
        ImageLayout::TransferSrcOptimal => (
            ImageUsage::TRANSFER_SRC,
            &["VUID-vkCmdBeginRenderPass-initialLayout-00898"],
        ),
        ImageLayout::TransferDstOptimal => (
            ImageUsage::TRANSFER_DST,
            &["VUID-vkCmdBeginRenderPass-initialLayout-00899"],
        ),
        layout if layout.is_depth_stencil() => match layout.required_usage() {
            Some(usage) => (usage, &["VUID-vkCmdBeginRenderPass-initialLayout-00896"]),
            None => return Ok(()),
        },
        _ => return Ok(()),
    };

    if !view.image_usage().intersects(required_usage) {
        return Err(Box::new(ValidationError {
            context: "initial_layout".into(),
            problem: format!(
                "is `ImageLayout::{:?}`, but the image of the attachment view was not created \
                with any of the usages {:?}",
                initial_layout, required_usage,
            )
            .into(),
            vuids,
            ..Default::default()
        }));
    }

    Ok(())
}

/// Checks the attachment's initial layout against what the command buffer knows about the
/// subresources of the view.
fn validate_initial_layout(
    command_buffer: &CommandBufferState,
    objects: &ObjectTables,
    view: &ImageViewState,
    description: &AttachmentDescription,
) -> Result<(), Box<ValidationError>> {
    let initial_layout = description.initial_layout;

    if initial_layout == ImageLayout::Undefined {
        return Ok(());
    }

    let Some(map) = command_buffer.image_layout_map(view.image()) else {
        return Ok(());
    };
    let shared_presentable = objects
        .images
        .get(&view.image())
        .is_some_and(|image| image.is_shared_presentable());
    let range = view.layout_range();

    for entry in map.for_range(&range) {
        let Some(known) = entry
            .current
            .or_else(|| entry.initial.map(|initial| initial.layout))
        else {
            continue;
        };

        if !layouts_equivalent(range.aspects, initial_layout, known, shared_presentable) {
            return Err(Box::new(ValidationError {
                context: "initial_layout".into(),
                problem: format!(
                    "is `ImageLayout::{:?}`, but the layout of image {:?} (aspect {:?}, mip level \
                    {}, array layer {}) in the command buffer is `ImageLayout::{:?}`",
                    initial_layout,
                    view.image(),
                    entry.subresource.aspects,
                    entry.subresource.mip_level,
                    entry.subresource.array_layer,
                    known,
                )
                .into(),
                vuids: &["VUID-vkCmdBeginRenderPass-initialLayout-00900"],
                ..Default::default()
            }));
        }
    }

    Ok(())
}

/// Transitions the attachments that the current subpass references to the layouts of the
/// references.
fn transition_subpass_layouts(command_buffer: &mut CommandBufferState, objects: &ObjectTables) {
    let Some(instance) = command_buffer.render_pass.clone() else {
        return;
    };
    let Some(render_pass) = objects.render_passes.get(&instance.render_pass) else {
        return;
    };
    let Some(subpass) = render_pass.subpasses().get(instance.subpass as usize) else {
        return;
    };

    for reference in subpass.attachment_references() {
        let Some(view) = instance
            .attachments
            .get(reference.attachment as usize)
            .and_then(|view| objects.image_views.get(view))
        else {
            continue;
        };
        let Some(image) = objects.images.get(&view.image()) else {
            continue;
        };

        command_buffer.set_image_view_layout(view, image, reference.layout, None);
    }
}

fn validate_inside_render_pass<'a>(
    command_buffer: &'a CommandBufferState,
    vuids: &'static [&'static str],
) -> Result<&'a RenderPassInstance, Box<ValidationError>> {
    command_buffer.render_pass().ok_or_else(|| {
        Box::new(ValidationError {
            problem: "no render pass instance is active".into(),
            vuids,
            ..Default::default()
        })
    })
}

fn subpass_count(objects: &ObjectTables, instance: &RenderPassInstance) -> u32 {
    objects
        .render_passes
        .get(&instance.render_pass)
        .map_or(0, |render_pass: &RenderPassState| {
            render_pass.subpasses().len() as u32
        })
}

pub(crate) fn validate_next_subpass(
    command_buffer: &CommandBufferState,
    objects: &ObjectTables,
    report: &mut Report,
) {
    let result = validate_inside_render_pass(command_buffer, &["VUID-vkCmdNextSubpass-renderpass"])
        .and_then(|instance| {
            if instance.subpass + 1 >= subpass_count(objects, instance) {
                return Err(Box::new(ValidationError {
                    problem: "the current subpass is the last subpass of the render pass".into(),
                    vuids: &["VUID-vkCmdNextSubpass-None-00909"],
                    ..Default::default()
                }));
            }

            Ok(())
        });

    report.error(ObjectHandle::new(command_buffer.handle()), result);
}

pub(crate) fn record_next_subpass(command_buffer: &mut CommandBufferState, objects: &ObjectTables) {
    if let Some(instance) = command_buffer.render_pass.as_mut() {
        instance.subpass += 1;
    }

    transition_subpass_layouts(command_buffer, objects);
}

pub(crate) fn validate_end_render_pass(
    command_buffer: &CommandBufferState,
    objects: &ObjectTables,
    report: &mut Report,
) {
    let result =
        validate_inside_render_pass(command_buffer, &["VUID-vkCmdEndRenderPass-renderpass"])
            .and_then(|instance| {
                if instance.subpass + 1 != subpass_count(objects, instance) {
                    return Err(Box::new(ValidationError {
                        problem: "the current subpass is not the last subpass of the render pass"
                            .into(),
                        vuids: &["VUID-vkCmdEndRenderPass-None-00910"],
                        ..Default::default()
                    }));
                }

                Ok(())
            });

    report.error(ObjectHandle::new(command_buffer.handle()), result);
}

/// Transitions every attachment to its final layout and ends the render pass instance.
pub(crate) fn record_end_render_pass(
    command_buffer: &mut CommandBufferState,
    objects: &ObjectTables,
) {
    let Some(instance) = command_buffer.render_pass.take() else {
        return;
    };
    let Some(render_pass) = objects.render_passes.get(&instance.render_pass) else {
        return;
    };

    for (view, description) in instance.attachments.iter().zip(render_pass.attachments()) {
        let Some(view) = objects.image_views.get(view) else {
            continue;
        };
        let Some(image) = objects.images.get(&view.image()) else {
            continue;
        };

        command_buffer.set_image_view_layout(view, image, description.final_layout, None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::ValidationConfig,
        format::Format,
        image::{ImageAspects, ImageCreateInfo, ImageSubresource},
        render_pass::{
            AttachmentReference, FramebufferCreateFlags, FramebufferCreateInfo,
            RenderPassCreateInfo, SubpassDescription,
        },
        tests_util::{test_validator, test_validator_with, ColorImage},
    };

    fn color_render_pass(initial_layout: ImageLayout) -> RenderPassCreateInfo {
        RenderPassCreateInfo {
            attachments: vec![AttachmentDescription {
                format: Format::R8G8B8A8_UNORM,
                initial_layout,
                final_layout: ImageLayout::ShaderReadOnlyOptimal,
                ..Default::default()
            }],
            subpasses: vec![SubpassDescription {
                color_attachments: vec![AttachmentReference {
                    attachment: 0,
                    layout: ImageLayout::ColorAttachmentOptimal,
                }],
                ..Default::default()
            }],
        }
    }

    const COLOR_0: ImageSubresource = ImageSubresource {
        aspects: ImageAspects::COLOR,
        mip_level: 0,
        array_layer: 0,
    };

    #[test]
    fn layouts_through_render_pass() {
        let (mut validator, sink) = test_validator();
        let image = validator.test_image(ColorImage::attachment(8, 8, 1));
        let view = validator.test_view(image);
        let render_pass = validator.test_render_pass(color_render_pass(ImageLayout::Undefined));
        let framebuffer = validator.test_framebuffer(FramebufferCreateInfo {
            render_pass,
            attachments: vec![view],
            extent: [8, 8],
            ..Default::default()
        });
        let cb = validator.test_command_buffer(0);

        let begin_info = RenderPassBeginInfo::framebuffer(render_pass, framebuffer);
        assert!(!validator.validate_cmd_begin_render_pass(cb, &begin_info));
        validator.record_cmd_begin_render_pass(cb, &begin_info);

        let map = validator.command_buffer(cb).unwrap().image_layout_map(image).unwrap();
        assert_eq!(map.layout(COLOR_0), Some(ImageLayout::ColorAttachmentOptimal));

        assert!(validator.validate_cmd_next_subpass(cb));
        assert!(sink.contains_vuid("VUID-vkCmdNextSubpass-None-00909"));

        assert!(!validator.validate_cmd_end_render_pass(cb));
        validator.record_cmd_end_render_pass(cb);

        let cb_state = validator.command_buffer(cb).unwrap();
        assert!(cb_state.render_pass().is_none());
        assert_eq!(
            cb_state.image_layout_map(image).unwrap().layout(COLOR_0),
            Some(ImageLayout::ShaderReadOnlyOptimal),
        );
    }

    #[test]
    fn requires_render_pass_instance() {
        let (mut validator, sink) = test_validator();
        let cb = validator.test_command_buffer(0);

        assert!(validator.validate_cmd_next_subpass(cb));
        assert!(sink.contains_vuid("VUID-vkCmdNextSubpass-renderpass"));
        assert!(validator.validate_cmd_end_render_pass(cb));
        assert!(sink.contains_vuid("VUID-vkCmdEndRenderPass-renderpass"));
    }

    #[test]
    fn initial_layout_mismatch() {
        let (mut validator, sink) = test_validator();
        let image = validator.test_image(ColorImage::attachment(8, 8, 1));
        let view = validator.test_view(image);
        let render_pass =
            validator.test_render_pass(color_render_pass(ImageLayout::ColorAttachmentOptimal));
        let framebuffer = validator.test_framebuffer(FramebufferCreateInfo {
            render_pass,
            attachments: vec![view],
            extent: [8, 8],
            ..Default::default()
        });
        let cb = validator.test_command_buffer(0);

        let mut barrier = crate::sync::ImageMemoryBarrier::image(
            image,
            crate::image::ImageSubresourceRange::whole(ImageAspects::COLOR),
        );
        barrier.new_layout = ImageLayout::ShaderReadOnlyOptimal;
        let dependency_info = crate::command_buffer::barrier::DependencyInfo {
            image_memory_barriers: smallvec::smallvec![barrier],
            ..Default::default()
        };
        validator.record_cmd_pipeline_barrier(cb, &dependency_info);

        let begin_info = RenderPassBeginInfo::framebuffer(render_pass, framebuffer);
        assert!(validator.validate_cmd_begin_render_pass(cb, &begin_info));
        assert!(sink.contains_vuid("VUID-vkCmdBeginRenderPass-initialLayout-00900"));
    }

    #[test]
    fn initial_layout_usage() {
        let (mut validator, sink) = test_validator();
        let image = validator.test_image_with(ImageCreateInfo {
            format: Format::R8G8B8A8_UNORM,
            extent: [8, 8, 1],
            usage: ImageUsage::COLOR_ATTACHMENT,
            ..Default::default()
        });
        let view = validator.test_view(image);
        let render_pass =
            validator.test_render_pass(color_render_pass(ImageLayout::TransferDstOptimal));
        let framebuffer = validator.test_framebuffer(FramebufferCreateInfo {
            render_pass,
            attachments: vec![view],
            extent: [8, 8],
            ..Default::default()
        });
        let cb = validator.test_command_buffer(0);

        let begin_info = RenderPassBeginInfo::framebuffer(render_pass, framebuffer);
        assert!(validator.validate_cmd_begin_render_pass(cb, &begin_info));
        assert!(sink.contains_vuid("VUID-vkCmdBeginRenderPass-initialLayout-00899"));
    }

    #[test]
    fn imageless_layer_count_mismatch() {
        let mut config = ValidationConfig::default();
        config.features.imageless_framebuffer = true;
        let (mut validator, sink) = test_validator_with(config);

        let image = validator.test_image(ColorImage::attachment(8, 8, 1));
        let view = validator.test_view(image);
        let render_pass = validator.test_render_pass(color_render_pass(ImageLayout::Undefined));
        let framebuffer = validator.test_framebuffer(FramebufferCreateInfo {
            flags: FramebufferCreateFlags::IMAGELESS,
            render_pass,
            attachment_image_infos: vec![FramebufferAttachmentImageInfo {
                usage: ColorImage::attachment(8, 8, 1).usage,
                width: 8,
                height: 8,
                layer_count: 2,
                ..Default::default()
            }],
            extent: [8, 8],
            ..Default::default()
        });
        let cb = validator.test_command_buffer(0);

        let begin_info = RenderPassBeginInfo {
            attachments: smallvec::smallvec![view],
            ..RenderPassBeginInfo::framebuffer(render_pass, framebuffer)
        };
        assert!(validator.validate_cmd_begin_render_pass(cb, &begin_info));
        assert!(sink.contains_vuid("VUID-VkRenderPassBeginInfo-framebuffer-03214"));
    }
}
