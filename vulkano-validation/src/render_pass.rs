// Copyright (c) 2016 The vulkano developers
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or https://opensource.org/licenses/MIT>,
// at your option. All files in the project carrying such
// notice may not be copied, modified, or distributed except
// according to those terms.

//! Render passes and framebuffers.
//!
//! A render pass declares, for each attachment, the layout it must be in when the render pass
//! begins, the layout each subpass uses it in, and the layout it is left in when the render pass
//! ends. A framebuffer binds image views to these attachments. An *imageless* framebuffer only
//! describes the views it will be used with, and the views themselves are supplied when the
//! render pass begins.

use crate::{
    config::ValidationConfig,
    format::Format,
    image::{
        view::ImageViewState, ImageCreateFlags, ImageLayout, ImageUsage, SampleCount,
    },
    macros::vulkan_bitflags,
    ValidationError,
};
use foldhash::{HashMap, HashSet};

/// Value for an attachment reference, meaning that no attachment is used.
pub const ATTACHMENT_UNUSED: u32 = ash::vk::ATTACHMENT_UNUSED;

/// Describes an attachment that will be used in a render pass.
#[derive(Clone, Copy, Debug)]
pub struct AttachmentDescription {
    /// The format of the image that is going to be bound.
    pub format: Format,

    /// The number of samples of the image that is going to be bound.
    pub samples: SampleCount,

    /// The layout that the image must be in at the start of the render pass.
    pub initial_layout: ImageLayout,

    /// The layout that the image will be transitioned to at the end of the render pass.
    pub final_layout: ImageLayout,

    pub _ne: crate::NonExhaustive,
}

impl Default for AttachmentDescription {
    #[inline]
    fn default() -> Self {
        Self {
            format: Format::UNDEFINED,
            samples: SampleCount::Sample1,
            initial_layout: ImageLayout::Undefined,
            final_layout: ImageLayout::Undefined,
            _ne: crate::NonExhaustive(()),
        }
    }
}

/// A reference in a subpass description to a particular attachment of the render pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AttachmentReference {
    /// The number of the attachment being referred to, or [`ATTACHMENT_UNUSED`].
    pub attachment: u32,

    /// The image layout that the attachment should be transitioned to at the start of the
    /// subpass.
    pub layout: ImageLayout,
}

/// Describes one of the subpasses of a render pass.
#[derive(Clone, Debug, Default)]
pub struct SubpassDescription {
    pub input_attachments: Vec<AttachmentReference>,
    pub color_attachments: Vec<AttachmentReference>,
    pub resolve_attachments: Vec<AttachmentReference>,
    pub depth_stencil_attachment: Option<AttachmentReference>,
}

impl SubpassDescription {
    /// Returns an iterator over every attachment reference of the subpass.
    pub fn attachment_references(&self) -> impl Iterator<Item = &AttachmentReference> {
        self.input_attachments
            .iter()
            .chain(&self.color_attachments)
            .chain(&self.resolve_attachments)
            .chain(&self.depth_stencil_attachment)
            .filter(|reference| reference.attachment != ATTACHMENT_UNUSED)
    }
}

/// Parameters to create a new render pass.
#[derive(Clone, Debug, Default)]
pub struct RenderPassCreateInfo {
    pub attachments: Vec<AttachmentDescription>,
    pub subpasses: Vec<SubpassDescription>,
}

impl RenderPassCreateInfo {
    pub(crate) fn validate(&self, config: &ValidationConfig) -> Result<(), Box<ValidationError>> {
        let Self {
            attachments,
            subpasses,
        } = self;

        if subpasses.is_empty() {
            return Err(Box::new(ValidationError {
                context: "create_info.subpasses".into(),
                problem: "is empty".into(),
                vuids: &["VUID-VkRenderPassCreateInfo-subpassCount-arraylength"],
                ..Default::default()
            }));
        }

        for (attachment_index, attachment) in attachments.iter().enumerate() {
            for layout in [attachment.initial_layout, attachment.final_layout] {
                layout
                    .validate_device(&config.features, &config.extensions)
                    .map_err(|err| {
                        err.add_context(format!("create_info.attachments[{}]", attachment_index))
                    })?;
            }

            if matches!(
                attachment.final_layout,
                ImageLayout::Undefined | ImageLayout::Preinitialized
            ) {
                return Err(Box::new(ValidationError {
                    context: format!("create_info.attachments[{}].final_layout", attachment_index)
                        .into(),
                    problem: "is `ImageLayout::Undefined` or `ImageLayout::Preinitialized`".into(),
                    vuids: &["VUID-VkAttachmentDescription-finalLayout-00843"],
                    ..Default::default()
                }));
            }
        }

        for (subpass_index, subpass) in subpasses.iter().enumerate() {
            for reference in subpass.attachment_references() {
                if reference.attachment as usize >= attachments.len() {
                    return Err(Box::new(ValidationError {
                        problem: format!(
                            "`create_info.subpasses[{}]` refers to attachment {}, which is not \
                            less than the number of attachments",
                            subpass_index, reference.attachment,
                        )
                        .into(),
                        vuids: &["VUID-VkRenderPassCreateInfo-attachment-00834"],
                        ..Default::default()
                    }));
                }

                if matches!(
                    reference.layout,
                    ImageLayout::Undefined | ImageLayout::Preinitialized | ImageLayout::PresentSrc
                ) {
                    return Err(Box::new(ValidationError {
                        problem: format!(
                            "`create_info.subpasses[{}]` refers to attachment {} with layout \
                            {:?}",
                            subpass_index, reference.attachment, reference.layout,
                        )
                        .into(),
                        vuids: &["VUID-VkAttachmentReference-layout-00857"],
                        ..Default::default()
                    }));
                }
            }
        }

        Ok(())
    }
}

/// The state tracked for a render pass.
#[derive(Debug)]
pub struct RenderPassState {
    handle: ash::vk::RenderPass,
    create_info: RenderPassCreateInfo,
}

impl RenderPassState {
    #[inline]
    pub fn new(handle: ash::vk::RenderPass, create_info: RenderPassCreateInfo) -> Self {
        RenderPassState {
            handle,
            create_info,
        }
    }

    #[inline]
    pub fn handle(&self) -> ash::vk::RenderPass {
        self.handle
    }

    #[inline]
    pub fn attachments(&self) -> &[AttachmentDescription] {
        &self.create_info.attachments
    }

    #[inline]
    pub fn subpasses(&self) -> &[SubpassDescription] {
        &self.create_info.subpasses
    }

    /// Returns the layout that attachment `attachment` is used in by subpass `subpass`, if the
    /// subpass uses it.
    pub fn subpass_layout(&self, subpass: u32, attachment: u32) -> Option<ImageLayout> {
        self.create_info
            .subpasses
            .get(subpass as usize)?
            .attachment_references()
            .find(|reference| reference.attachment == attachment)
            .map(|reference| reference.layout)
    }
}

vulkan_bitflags! {
    /// Flags specifying additional properties of a framebuffer.
    FramebufferCreateFlags = FramebufferCreateFlags(u32);

    /// The attachment image views are not provided when the framebuffer is created, but when it
    /// is used in a render pass.
    IMAGELESS = IMAGELESS
    RequiresOneOf([
        RequiresAllOf([DeviceFeature(imageless_framebuffer)]),
        RequiresAllOf([DeviceExtension(khr_imageless_framebuffer)]),
    ]),
}

/// The properties of an image view that will be provided as an attachment of an imageless
/// framebuffer.
#[derive(Clone, Debug)]
pub struct FramebufferAttachmentImageInfo {
    /// The creation flags of the image.
    pub flags: ImageCreateFlags,

    /// The usage of the image.
    pub usage: ImageUsage,

    /// The width of the view's first mip level.
    pub width: u32,

    /// The height of the view's first mip level.
    pub height: u32,

    /// The number of array layers of the view.
    pub layer_count: u32,

    /// The view formats the image was created with.
    pub view_formats: Vec<Format>,

    pub _ne: crate::NonExhaustive,
}

impl Default for FramebufferAttachmentImageInfo {
    #[inline]
    fn default() -> Self {
        Self {
            flags: ImageCreateFlags::empty(),
            usage: ImageUsage::empty(),
            width: 0,
            height: 0,
            layer_count: 1,
            view_formats: Vec::new(),
            _ne: crate::NonExhaustive(()),
        }
    }
}

/// Parameters to create a new framebuffer.
#[derive(Clone, Debug)]
pub struct FramebufferCreateInfo {
    /// Additional properties of the framebuffer.
    ///
    /// The default value is empty.
    pub flags: FramebufferCreateFlags,

    /// The render pass that the framebuffer is compatible with.
    pub render_pass: ash::vk::RenderPass,

    /// The attachment image views, if the framebuffer is not imageless.
    pub attachments: Vec<ash::vk::ImageView>,

    /// The descriptions of the attachment image views, if the framebuffer is imageless.
    pub attachment_image_infos: Vec<FramebufferAttachmentImageInfo>,

    /// The width and height of the framebuffer.
    pub extent: [u32; 2],

    /// The number of layers of the framebuffer.
    pub layers: u32,

    pub _ne: crate::NonExhaustive,
}

impl Default for FramebufferCreateInfo {
    #[inline]
    fn default() -> Self {
        Self {
            flags: FramebufferCreateFlags::empty(),
            render_pass: ash::vk::RenderPass::null(),
            attachments: Vec::new(),
            attachment_image_infos: Vec::new(),
            extent: [0; 2],
            layers: 1,
            _ne: crate::NonExhaustive(()),
        }
    }
}

impl FramebufferCreateInfo {
    #[inline]
    pub fn is_imageless(&self) -> bool {
        self.flags.intersects(FramebufferCreateFlags::IMAGELESS)
    }

    pub(crate) fn validate(
        &self,
        render_pass: &RenderPassState,
        image_views: &HashMap<ash::vk::ImageView, ImageViewState>,
        config: &ValidationConfig,
    ) -> Result<(), Box<ValidationError>> {
        self.flags
            .validate_device(&config.features, &config.extensions)
            .map_err(|err| {
                err.add_context("create_info.flags")
                    .set_vuids(&["VUID-VkFramebufferCreateInfo-flags-parameter"])
            })?;

        let attachment_count = render_pass.attachments().len();

        if self.is_imageless() {
            if self.attachment_image_infos.len() != attachment_count {
                return Err(Box::new(ValidationError {
                    problem: "`create_info.flags` contains `FramebufferCreateFlags::IMAGELESS`, \
                        but the length of `create_info.attachment_image_infos` does not equal the \
                        number of attachments of the render pass"
                        .into(),
                    vuids: &["VUID-VkFramebufferCreateInfo-flags-03191"],
                    ..Default::default()
                }));
            }

            return Ok(());
        }

        if self.attachments.len() != attachment_count {
            return Err(Box::new(ValidationError {
                problem: "the length of `create_info.attachments` does not equal the number of \
                    attachments of the render pass"
                    .into(),
                vuids: &["VUID-VkFramebufferCreateInfo-attachmentCount-00876"],
                ..Default::default()
            }));
        }

        for (attachment_index, (image_view, description)) in self
            .attachments
            .iter()
            .zip(render_pass.attachments())
            .enumerate()
        {
            let image_view = image_views.get(image_view).ok_or_else(|| {
                Box::new(ValidationError {
                    context: format!("create_info.attachments[{}]", attachment_index).into(),
                    problem: "is not a valid image view handle".into(),
                    vuids: &["VUID-VkFramebufferCreateInfo-flags-02778"],
                    ..Default::default()
                })
            })?;

            if image_view.format() != description.format {
                return Err(Box::new(ValidationError {
                    problem: format!(
                        "the format of `create_info.attachments[{0}]` does not equal the format \
                        of attachment {0} of the render pass",
                        attachment_index,
                    )
                    .into(),
                    vuids: &["VUID-VkFramebufferCreateInfo-pAttachments-00880"],
                    ..Default::default()
                }));
            }

            if image_view.samples() != description.samples {
                return Err(Box::new(ValidationError {
                    problem: format!(
                        "the sample count of `create_info.attachments[{0}]` does not equal the \
                        sample count of attachment {0} of the render pass",
                        attachment_index,
                    )
                    .into(),
                    vuids: &["VUID-VkFramebufferCreateInfo-pAttachments-00881"],
                    ..Default::default()
                }));
            }

            let [width, height, _] = image_view.extent();

            if width < self.extent[0] || height < self.extent[1] {
                return Err(Box::new(ValidationError {
                    problem: format!(
                        "`create_info.attachments[{}]` is smaller than `create_info.extent`",
                        attachment_index,
                    )
                    .into(),
                    vuids: &["VUID-VkFramebufferCreateInfo-flags-04533"],
                    ..Default::default()
                }));
            }
        }

        Ok(())
    }
}

/// The state tracked for a framebuffer.
#[derive(Debug)]
pub struct FramebufferState {
    handle: ash::vk::Framebuffer,
    create_info: FramebufferCreateInfo,
    pub(crate) command_buffers: HashSet<ash::vk::CommandBuffer>,
}

impl FramebufferState {
    #[inline]
    pub fn new(handle: ash::vk::Framebuffer, create_info: FramebufferCreateInfo) -> Self {
        FramebufferState {
            handle,
            create_info,
            command_buffers: HashSet::default(),
        }
    }

    #[inline]
    pub fn handle(&self) -> ash::vk::Framebuffer {
        self.handle
    }

    #[inline]
    pub fn render_pass(&self) -> ash::vk::RenderPass {
        self.create_info.render_pass
    }

    #[inline]
    pub fn is_imageless(&self) -> bool {
        self.create_info.is_imageless()
    }

    #[inline]
    pub fn attachments(&self) -> &[ash::vk::ImageView] {
        &self.create_info.attachments
    }

    #[inline]
    pub fn attachment_image_infos(&self) -> &[FramebufferAttachmentImageInfo] {
        &self.create_info.attachment_image_infos
    }

    #[inline]
    pub fn extent(&self) -> [u32; 2] {
        self.create_info.extent
    }

    #[inline]
    pub fn layers(&self) -> u32 {
        self.create_info.layers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn color_attachment() -> AttachmentDescription {
        AttachmentDescription {
            format: Format::R8G8B8A8_UNORM,
            initial_layout: ImageLayout::Undefined,
            final_layout: ImageLayout::ShaderReadOnlyOptimal,
            ..Default::default()
        }
    }

    #[test]
    fn attachment_out_of_range() {
        let create_info = RenderPassCreateInfo {
            attachments: vec![color_attachment()],
            subpasses: vec![SubpassDescription {
                color_attachments: vec![AttachmentReference {
                    attachment: 1,
                    layout: ImageLayout::ColorAttachmentOptimal,
                }],
                ..Default::default()
            }],
        };

        assert_eq!(
            create_info
                .validate(&ValidationConfig::default())
                .unwrap_err()
                .vuid(),
            "VUID-VkRenderPassCreateInfo-attachment-00834",
        );
    }

    #[test]
    fn subpass_layout() {
        let create_info = RenderPassCreateInfo {
            attachments: vec![color_attachment()],
            subpasses: vec![
                SubpassDescription {
                    color_attachments: vec![AttachmentReference {
                        attachment: 0,
                        layout: ImageLayout::ColorAttachmentOptimal,
                    }],
                    ..Default::default()
                },
                SubpassDescription::default(),
            ],
        };
        assert!(create_info.validate(&ValidationConfig::default()).is_ok());

        let render_pass = RenderPassState::new(ash::vk::RenderPass::null(), create_info);
        assert_eq!(
            render_pass.subpass_layout(0, 0),
            Some(ImageLayout::ColorAttachmentOptimal),
        );
        assert_eq!(render_pass.subpass_layout(1, 0), None);
    }

    #[test]
    fn imageless_requires_feature() {
        let render_pass = RenderPassState::new(
            ash::vk::RenderPass::null(),
            RenderPassCreateInfo {
                attachments: vec![color_attachment()],
                subpasses: vec![SubpassDescription::default()],
            },
        );
        let create_info = FramebufferCreateInfo {
            flags: FramebufferCreateFlags::IMAGELESS,
            attachment_image_infos: vec![FramebufferAttachmentImageInfo::default()],
            extent: [8, 8],
            ..Default::default()
        };
        let mut config = ValidationConfig::default();

        let err = create_info
            .validate(&render_pass, &HashMap::default(), &config)
            .unwrap_err();
        assert!(!err.requires_one_of.is_empty());

        config.features.imageless_framebuffer = true;
        assert!(create_info
            .validate(&render_pass, &HashMap::default(), &config)
            .is_ok());
    }
}
