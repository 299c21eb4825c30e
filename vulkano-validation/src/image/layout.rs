// Copyright (c) 2016 The vulkano developers
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or https://opensource.org/licenses/MIT>,
// at your option. All files in the project carrying such
// notice may not be copied, modified, or distributed except
// according to those terms.

use super::{ImageAspects, ImageUsage};
use crate::{
    config::ValidationConfig, descriptor_set::layout::DescriptorType, macros::vulkan_enum,
};

vulkan_enum! {
    /// In-memory layout of the pixel data of an image.
    ///
    /// The pixel data of a Vulkan image is arranged in a particular way, which is called its
    /// *layout*. Each image subresource (aspect, mipmap level and array layer) in an image can
    /// have a different layout. Every operation that can be performed on an image is only possible
    /// with specific layouts, so before the operation is performed, the application must perform
    /// a *layout transition* on the image, as part of a pipeline barrier or a render pass.
    ///
    /// Vulkan does not keep track of layouts itself. The validator tracks, for each command buffer,
    /// the layouts each subresource is expected to be in when the command buffer starts executing
    /// and the layouts it is left in, and compares these against the layouts declared by commands.
    ImageLayout = ImageLayout(i32);

    /// The layout of the data is unknown, and the image is treated as containing no valid data.
    /// Transitioning from `Undefined` will discard any existing pixel data.
    Undefined = UNDEFINED,

    /// A general-purpose layout that can be used for any operation.
    General = GENERAL,

    /// For a color image used as a color or resolve attachment in a framebuffer.
    ColorAttachmentOptimal = COLOR_ATTACHMENT_OPTIMAL,

    /// For a depth/stencil image used as a depth/stencil attachment in a framebuffer.
    DepthStencilAttachmentOptimal = DEPTH_STENCIL_ATTACHMENT_OPTIMAL,

    /// For a depth/stencil image used as a read-only depth/stencil attachment in a framebuffer, or
    /// as a (combined) sampled image or input attachment in a shader.
    DepthStencilReadOnlyOptimal = DEPTH_STENCIL_READ_ONLY_OPTIMAL,

    /// For a color image used as a (combined) sampled image or input attachment in a shader.
    ShaderReadOnlyOptimal = SHADER_READ_ONLY_OPTIMAL,

    /// For operations that transfer data from an image (copy, blit).
    TransferSrcOptimal = TRANSFER_SRC_OPTIMAL,

    /// For operations that transfer data to an image (copy, blit, clear).
    TransferDstOptimal = TRANSFER_DST_OPTIMAL,

    /// When creating an image, this specifies that the initial data is going to be directly
    /// written to from the CPU.
    Preinitialized = PREINITIALIZED,

    /// A combination of `DepthStencilReadOnlyOptimal` for the depth aspect of the image,
    /// and `DepthStencilAttachmentOptimal` for the stencil aspect of the image.
    DepthReadOnlyStencilAttachmentOptimal = DEPTH_READ_ONLY_STENCIL_ATTACHMENT_OPTIMAL
    RequiresOneOf([
        RequiresAllOf([DeviceExtension(khr_maintenance2)]),
    ]),

    /// A combination of `DepthStencilAttachmentOptimal` for the depth aspect of the image,
    /// and `DepthStencilReadOnlyOptimal` for the stencil aspect of the image.
    DepthAttachmentStencilReadOnlyOptimal = DEPTH_ATTACHMENT_STENCIL_READ_ONLY_OPTIMAL
    RequiresOneOf([
        RequiresAllOf([DeviceExtension(khr_maintenance2)]),
    ]),

    /// For a depth image used as a depth attachment.
    DepthAttachmentOptimal = DEPTH_ATTACHMENT_OPTIMAL
    RequiresOneOf([
        RequiresAllOf([DeviceFeature(separate_depth_stencil_layouts)]),
    ]),

    /// For a depth image used as a read-only depth attachment or as a sampled image.
    DepthReadOnlyOptimal = DEPTH_READ_ONLY_OPTIMAL
    RequiresOneOf([
        RequiresAllOf([DeviceFeature(separate_depth_stencil_layouts)]),
    ]),

    /// For a stencil image used as a stencil attachment.
    StencilAttachmentOptimal = STENCIL_ATTACHMENT_OPTIMAL
    RequiresOneOf([
        RequiresAllOf([DeviceFeature(separate_depth_stencil_layouts)]),
    ]),

    /// For a stencil image used as a read-only stencil attachment or as a sampled image.
    StencilReadOnlyOptimal = STENCIL_READ_ONLY_OPTIMAL
    RequiresOneOf([
        RequiresAllOf([DeviceFeature(separate_depth_stencil_layouts)]),
    ]),

    /// The layout of images that are about to be presented to a surface.
    PresentSrc = PRESENT_SRC_KHR,

    /// The layout of images of a swapchain with a shared present mode, in which the presentation
    /// engine and the application access the image concurrently.
    SharedPresent = SHARED_PRESENT_KHR
    RequiresOneOf([
        RequiresAllOf([DeviceExtension(khr_shared_presentable_image)]),
    ]),
}

impl Default for ImageLayout {
    #[inline]
    fn default() -> Self {
        ImageLayout::Undefined
    }
}

impl ImageLayout {
    /// Returns whether the depth aspect is read-only in this layout.
    #[inline]
    pub fn is_depth_read_only(self) -> bool {
        matches!(
            self,
            ImageLayout::DepthStencilReadOnlyOptimal
                | ImageLayout::DepthReadOnlyStencilAttachmentOptimal
                | ImageLayout::DepthReadOnlyOptimal
        )
    }

    /// Returns whether the depth aspect is writable as an attachment in this layout.
    #[inline]
    pub fn is_depth_attachment(self) -> bool {
        matches!(
            self,
            ImageLayout::DepthStencilAttachmentOptimal
                | ImageLayout::DepthAttachmentStencilReadOnlyOptimal
                | ImageLayout::DepthAttachmentOptimal
        )
    }

    /// Returns whether the stencil aspect is read-only in this layout.
    #[inline]
    pub fn is_stencil_read_only(self) -> bool {
        matches!(
            self,
            ImageLayout::DepthStencilReadOnlyOptimal
                | ImageLayout::DepthAttachmentStencilReadOnlyOptimal
                | ImageLayout::StencilReadOnlyOptimal
        )
    }

    /// Returns whether the stencil aspect is writable as an attachment in this layout.
    #[inline]
    pub fn is_stencil_attachment(self) -> bool {
        matches!(
            self,
            ImageLayout::DepthStencilAttachmentOptimal
                | ImageLayout::DepthReadOnlyStencilAttachmentOptimal
                | ImageLayout::StencilAttachmentOptimal
        )
    }

    /// Returns whether this layout is one of the layouts that only exist for depth/stencil
    /// images.
    #[inline]
    pub fn is_depth_stencil(self) -> bool {
        self.is_depth_read_only()
            || self.is_depth_attachment()
            || self.is_stencil_read_only()
            || self.is_stencil_attachment()
    }

    /// Returns the image usage that an image must have been created with to be used in this
    /// layout. The image must have at least one of the returned usages.
    ///
    /// Returns `None` for layouts that don't require a particular usage.
    pub fn required_usage(self) -> Option<ImageUsage> {
        match self {
            ImageLayout::ColorAttachmentOptimal => Some(ImageUsage::COLOR_ATTACHMENT),
            ImageLayout::ShaderReadOnlyOptimal => {
                Some(ImageUsage::SAMPLED | ImageUsage::INPUT_ATTACHMENT)
            }
            ImageLayout::TransferSrcOptimal => Some(ImageUsage::TRANSFER_SRC),
            ImageLayout::TransferDstOptimal => Some(ImageUsage::TRANSFER_DST),
            ImageLayout::DepthStencilReadOnlyOptimal => Some(
                ImageUsage::DEPTH_STENCIL_ATTACHMENT
                    | ImageUsage::SAMPLED
                    | ImageUsage::INPUT_ATTACHMENT,
            ),
            layout if layout.is_depth_stencil() => Some(ImageUsage::DEPTH_STENCIL_ATTACHMENT),
            _ => None,
        }
    }

    /// Returns whether an image descriptor of type `descriptor_type` may have been written with
    /// this layout.
    pub(crate) fn is_valid_for_descriptor(
        self,
        descriptor_type: DescriptorType,
        shared_presentable: bool,
        config: &ValidationConfig,
    ) -> bool {
        let shared_present =
            config.extensions.khr_shared_presentable_image && self == ImageLayout::SharedPresent;

        match descriptor_type {
            DescriptorType::CombinedImageSampler
            | DescriptorType::SampledImage
            | DescriptorType::InputAttachment => match self {
                ImageLayout::DepthStencilReadOnlyOptimal
                | ImageLayout::ShaderReadOnlyOptimal
                | ImageLayout::General => true,
                ImageLayout::DepthReadOnlyStencilAttachmentOptimal
                | ImageLayout::DepthAttachmentStencilReadOnlyOptimal => {
                    config.extensions.khr_maintenance2
                }
                ImageLayout::DepthReadOnlyOptimal | ImageLayout::StencilReadOnlyOptimal => {
                    config.features.separate_depth_stencil_layouts
                }
                _ => shared_present,
            },
            DescriptorType::StorageImage => {
                self == ImageLayout::General || (shared_present && shared_presentable)
            }
            _ => true,
        }
    }
}

fn normalize_depth_layout(layout: ImageLayout) -> ImageLayout {
    if layout.is_depth_read_only() {
        ImageLayout::DepthReadOnlyOptimal
    } else if layout.is_depth_attachment() {
        ImageLayout::DepthAttachmentOptimal
    } else {
        layout
    }
}

fn normalize_stencil_layout(layout: ImageLayout) -> ImageLayout {
    if layout.is_stencil_read_only() {
        ImageLayout::StencilReadOnlyOptimal
    } else if layout.is_stencil_attachment() {
        ImageLayout::StencilAttachmentOptimal
    } else {
        layout
    }
}

/// Returns whether layout `a` matches layout `b` for the subresources of `aspects`.
///
/// When `aspects` is exactly `DEPTH` or exactly `STENCIL`, two combined depth/stencil layouts
/// match if they agree on that one aspect.
pub fn image_layout_matches(aspects: ImageAspects, a: ImageLayout, b: ImageLayout) -> bool {
    if a == b {
        return true;
    }

    if aspects == ImageAspects::DEPTH {
        normalize_depth_layout(a) == normalize_depth_layout(b)
    } else if aspects == ImageAspects::STENCIL {
        normalize_stencil_layout(a) == normalize_stencil_layout(b)
    } else {
        false
    }
}

/// Returns whether two layouts are equivalent for validation of previously recorded layouts.
///
/// On top of [`image_layout_matches`], `Undefined` on either side is equivalent to anything,
/// and `SharedPresent` is equivalent to `General` on shared-presentable images.
pub fn layouts_equivalent(
    aspects: ImageAspects,
    a: ImageLayout,
    b: ImageLayout,
    shared_presentable: bool,
) -> bool {
    if a == ImageLayout::Undefined || b == ImageLayout::Undefined {
        return true;
    }

    if image_layout_matches(aspects, a, b) {
        return true;
    }

    shared_presentable
        && matches!(
            (a, b),
            (ImageLayout::General, ImageLayout::SharedPresent)
                | (ImageLayout::SharedPresent, ImageLayout::General)
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relaxed_depth_matching() {
        let a = ImageLayout::DepthStencilReadOnlyOptimal;
        let b = ImageLayout::DepthReadOnlyStencilAttachmentOptimal;

        assert!(image_layout_matches(ImageAspects::DEPTH, a, b));
        assert!(!image_layout_matches(ImageAspects::STENCIL, a, b));
        assert!(!image_layout_matches(
            ImageAspects::DEPTH | ImageAspects::STENCIL,
            a,
            b,
        ));

        let c = ImageLayout::DepthAttachmentStencilReadOnlyOptimal;
        assert!(image_layout_matches(ImageAspects::STENCIL, a, c));
        assert!(!image_layout_matches(ImageAspects::DEPTH, a, c));
    }

    #[test]
    fn equivalence() {
        let color = ImageAspects::COLOR;

        assert!(layouts_equivalent(
            color,
            ImageLayout::Undefined,
            ImageLayout::TransferDstOptimal,
            false,
        ));
        assert!(!layouts_equivalent(
            color,
            ImageLayout::General,
            ImageLayout::TransferDstOptimal,
            false,
        ));
        assert!(!layouts_equivalent(
            color,
            ImageLayout::General,
            ImageLayout::SharedPresent,
            false,
        ));
        assert!(layouts_equivalent(
            color,
            ImageLayout::General,
            ImageLayout::SharedPresent,
            true,
        ));
    }

    #[test]
    fn required_usage() {
        assert_eq!(
            ImageLayout::TransferSrcOptimal.required_usage(),
            Some(ImageUsage::TRANSFER_SRC),
        );
        assert_eq!(
            ImageLayout::DepthAttachmentOptimal.required_usage(),
            Some(ImageUsage::DEPTH_STENCIL_ATTACHMENT),
        );
        assert_eq!(ImageLayout::General.required_usage(), None);
    }

    #[test]
    fn descriptor_layouts() {
        let mut config = ValidationConfig::default();

        assert!(ImageLayout::ShaderReadOnlyOptimal.is_valid_for_descriptor(
            DescriptorType::SampledImage,
            false,
            &config,
        ));
        assert!(!ImageLayout::ShaderReadOnlyOptimal.is_valid_for_descriptor(
            DescriptorType::StorageImage,
            false,
            &config,
        ));
        assert!(!ImageLayout::DepthReadOnlyOptimal.is_valid_for_descriptor(
            DescriptorType::SampledImage,
            false,
            &config,
        ));

        config.extensions.khr_shared_presentable_image = true;
        assert!(!ImageLayout::SharedPresent.is_valid_for_descriptor(
            DescriptorType::StorageImage,
            false,
            &config,
        ));
        assert!(ImageLayout::SharedPresent.is_valid_for_descriptor(
            DescriptorType::StorageImage,
            true,
            &config,
        ));
    }
}
