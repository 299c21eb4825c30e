// Copyright (c) 2016 The vulkano developers
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or https://opensource.org/licenses/MIT>,
// at your option. All files in the project carrying such
// notice may not be copied, modified, or distributed except
// according to those terms.

//! Image views.
//!
//! An image view describes how the GPU should interpret the data of an image: which subresources
//! are visible, with which dimensionality and through which format. Descriptors and framebuffer
//! attachments refer to images through views.

use super::{
    ImageAspects, ImageCreateFlags, ImageState, ImageSubresourceRange, ImageType, ImageUsage,
    RangeVuids, SampleCount, REMAINING_ARRAY_LAYERS,
};
use crate::{
    config::ValidationConfig,
    descriptor_set::requirements::ComponentTypes,
    format::Format,
    macros::vulkan_enum,
    ValidationError,
};
use foldhash::HashSet;

vulkan_enum! {
    /// The geometry type of an image view.
    ImageViewType = ImageViewType(i32);

    Dim1d = TYPE_1D,
    Dim2d = TYPE_2D,
    Dim3d = TYPE_3D,
    Cube = CUBE,
    Dim1dArray = TYPE_1D_ARRAY,
    Dim2dArray = TYPE_2D_ARRAY,
    CubeArray = CUBE_ARRAY,
}

impl ImageViewType {
    /// Returns whether the type is arrayed.
    #[inline]
    pub fn is_arrayed(self) -> bool {
        matches!(
            self,
            Self::Dim1dArray | Self::Dim2dArray | Self::CubeArray
        )
    }

    /// Returns whether `self` is compatible with the given `image_type`.
    #[inline]
    pub fn is_compatible_with(self, image_type: ImageType) -> bool {
        matches!(
            (self, image_type),
            (
                ImageViewType::Dim1d | ImageViewType::Dim1dArray,
                ImageType::Dim1d
            ) | (
                ImageViewType::Dim2d | ImageViewType::Dim2dArray,
                ImageType::Dim2d | ImageType::Dim3d
            ) | (
                ImageViewType::Cube | ImageViewType::CubeArray,
                ImageType::Dim2d
            ) | (ImageViewType::Dim3d, ImageType::Dim3d)
        )
    }
}

vulkan_enum! {
    /// Describes the value that an individual component must return when being accessed.
    ComponentSwizzle = ComponentSwizzle(i32);

    /// Returns the value that this component should normally have.
    Identity = IDENTITY,

    /// Always return zero.
    Zero = ZERO,

    /// Always return one.
    One = ONE,

    /// Returns the value of the first component.
    Red = R,

    /// Returns the value of the second component.
    Green = G,

    /// Returns the value of the third component.
    Blue = B,

    /// Returns the value of the fourth component.
    Alpha = A,
}

impl Default for ComponentSwizzle {
    #[inline]
    fn default() -> ComponentSwizzle {
        ComponentSwizzle::Identity
    }
}

/// Specifies how the components of an image must be mapped.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ComponentMapping {
    pub r: ComponentSwizzle,
    pub g: ComponentSwizzle,
    pub b: ComponentSwizzle,
    pub a: ComponentSwizzle,
}

impl ComponentMapping {
    /// Returns `true` if the component mapping is identity swizzled,
    /// meaning that all the members are `Identity` or the name of the member itself.
    #[inline]
    pub fn is_identity(&self) -> bool {
        self.r_is_identity() && self.g_is_identity() && self.b_is_identity() && self.a_is_identity()
    }

    #[inline]
    pub fn r_is_identity(&self) -> bool {
        matches!(self.r, ComponentSwizzle::Identity | ComponentSwizzle::Red)
    }

    #[inline]
    pub fn g_is_identity(&self) -> bool {
        matches!(self.g, ComponentSwizzle::Identity | ComponentSwizzle::Green)
    }

    #[inline]
    pub fn b_is_identity(&self) -> bool {
        matches!(self.b, ComponentSwizzle::Identity | ComponentSwizzle::Blue)
    }

    #[inline]
    pub fn a_is_identity(&self) -> bool {
        matches!(self.a, ComponentSwizzle::Identity | ComponentSwizzle::Alpha)
    }
}

/// Parameters to create a new `ImageView`.
#[derive(Clone, Debug)]
pub struct ImageViewCreateInfo {
    /// The image view type.
    ///
    /// The view type must be compatible with the dimensions of the image and the selected array
    /// layers.
    ///
    /// The default value is [`ImageViewType::Dim2d`].
    pub view_type: ImageViewType,

    /// The format of the image view.
    ///
    /// The default value is `Format::UNDEFINED`.
    pub format: Format,

    /// How to map components of each pixel.
    ///
    /// The default value is [`ComponentMapping::default()`].
    pub component_mapping: ComponentMapping,

    /// The subresource range of the image that the view should cover.
    ///
    /// The default value is empty, which must be overridden.
    pub subresource_range: ImageSubresourceRange,

    /// The sampler YCbCr conversion to be used with the image view.
    ///
    /// The default value is `None`.
    pub sampler_ycbcr_conversion: Option<ash::vk::SamplerYcbcrConversion>,

    pub _ne: crate::NonExhaustive,
}

impl Default for ImageViewCreateInfo {
    #[inline]
    fn default() -> Self {
        Self {
            view_type: ImageViewType::Dim2d,
            format: Format::UNDEFINED,
            component_mapping: ComponentMapping::default(),
            subresource_range: ImageSubresourceRange {
                aspects: ImageAspects::empty(),
                mip_levels: 0..0,
                array_layers: 0..0,
            },
            sampler_ycbcr_conversion: None,
            _ne: crate::NonExhaustive(()),
        }
    }
}

impl ImageViewCreateInfo {
    /// Returns an `ImageViewCreateInfo` with the `view_type` determined from the image type and
    /// array layers, and `subresource_range` covering the whole image.
    pub fn from_image(image: &ImageState) -> Self {
        let view_type = match image.image_type() {
            ImageType::Dim1d if image.array_layers() == 1 => ImageViewType::Dim1d,
            ImageType::Dim1d => ImageViewType::Dim1dArray,
            ImageType::Dim2d if image.array_layers() == 1 => ImageViewType::Dim2d,
            ImageType::Dim2d => ImageViewType::Dim2dArray,
            ImageType::Dim3d => ImageViewType::Dim3d,
        };

        Self {
            view_type,
            format: image.format(),
            subresource_range: ImageSubresourceRange::whole(
                image.format().aspects() - ImageAspects::PLANES,
            ),
            ..Default::default()
        }
    }

    pub(crate) fn validate(
        &self,
        image: &ImageState,
        config: &ValidationConfig,
    ) -> Result<(), Box<ValidationError>> {
        let &Self {
            view_type,
            format,
            component_mapping: _,
            ref subresource_range,
            sampler_ycbcr_conversion,
            _ne: _,
        } = self;

        image
            .validate_subresource_range(subresource_range, RangeVuids::VIEW)
            .map_err(|err| err.add_context("create_info.subresource_range"))?;

        let image_type = image.image_type();

        if !view_type.is_compatible_with(image_type) {
            return Err(Box::new(ValidationError {
                problem: format!(
                    "`create_info.view_type` ({:?}) is not compatible with the type of the image \
                    ({:?})",
                    view_type, image_type,
                )
                .into(),
                vuids: &["VUID-VkImageViewCreateInfo-subResourceRange-01021"],
                ..Default::default()
            }));
        }

        let normalized = image.normalize_range(subresource_range);
        let layer_count = if image_type == ImageType::Dim3d
            && matches!(view_type, ImageViewType::Dim2d | ImageViewType::Dim2dArray)
        {
            normalized.array_layers.len() as u32
        } else if subresource_range.array_layers.end == REMAINING_ARRAY_LAYERS {
            image.array_layers() - subresource_range.array_layers.start
        } else {
            subresource_range.array_layers.len() as u32
        };

        if image_type == ImageType::Dim3d
            && matches!(view_type, ImageViewType::Dim2d | ImageViewType::Dim2dArray)
        {
            if !image
                .flags()
                .intersects(ImageCreateFlags::TYPE_2D_ARRAY_COMPATIBLE)
            {
                return Err(Box::new(ValidationError {
                    problem: "`create_info.view_type` is `ImageViewType::Dim2d` or \
                        `ImageViewType::Dim2dArray`, and the image is a 3D image, but the image \
                        was not created with `ImageCreateFlags::TYPE_2D_ARRAY_COMPATIBLE`"
                        .into(),
                    vuids: &["VUID-VkImageViewCreateInfo-image-06723"],
                    ..Default::default()
                }));
            }

            if normalized.mip_levels.len() != 1 {
                return Err(Box::new(ValidationError {
                    problem: "`create_info.view_type` is `ImageViewType::Dim2d` or \
                        `ImageViewType::Dim2dArray`, and the image is a 3D image, but \
                        `create_info.subresource_range.mip_levels` does not contain exactly \
                        one level"
                        .into(),
                    vuids: &["VUID-VkImageViewCreateInfo-image-04970"],
                    ..Default::default()
                }));
            }
        }

        if matches!(view_type, ImageViewType::Cube | ImageViewType::CubeArray) {
            if !image.flags().intersects(ImageCreateFlags::CUBE_COMPATIBLE) {
                return Err(Box::new(ValidationError {
                    problem: "`create_info.view_type` is `ImageViewType::Cube` or \
                        `ImageViewType::CubeArray`, but the image was not created with \
                        `ImageCreateFlags::CUBE_COMPATIBLE`"
                        .into(),
                    vuids: &["VUID-VkImageViewCreateInfo-image-01003"],
                    ..Default::default()
                }));
            }

            if view_type == ImageViewType::Cube && layer_count != 6 {
                return Err(Box::new(ValidationError {
                    problem: "`create_info.view_type` is `ImageViewType::Cube`, but \
                        `create_info.subresource_range.array_layers` does not contain exactly \
                        6 layers"
                        .into(),
                    vuids: &["VUID-VkImageViewCreateInfo-viewType-02960"],
                    ..Default::default()
                }));
            }

            if view_type == ImageViewType::CubeArray && layer_count % 6 != 0 {
                return Err(Box::new(ValidationError {
                    problem: "`create_info.view_type` is `ImageViewType::CubeArray`, but the \
                        number of layers in `create_info.subresource_range.array_layers` is not \
                        a multiple of 6"
                        .into(),
                    vuids: &["VUID-VkImageViewCreateInfo-viewType-02961"],
                    ..Default::default()
                }));
            }
        }

        if !view_type.is_arrayed() && layer_count != 1 {
            return Err(Box::new(ValidationError {
                problem: "`create_info.view_type` is not arrayed, but \
                    `create_info.subresource_range.array_layers` does not contain exactly one \
                    layer"
                    .into(),
                vuids: &["VUID-VkImageViewCreateInfo-imageViewType-04973"],
                ..Default::default()
            }));
        }

        if image.has_external_format() {
            return Ok(());
        }

        let image_format = image.format();
        let aspects = subresource_range.aspects;

        if format == Format::UNDEFINED {
            return Err(Box::new(ValidationError {
                context: "create_info.format".into(),
                problem: "is `Format::UNDEFINED`".into(),
                vuids: &["VUID-VkImageViewCreateInfo-image-01019"],
                ..Default::default()
            }));
        }

        if image_format.is_multi_planar() {
            if let Some(plane) = aspects.plane_index() {
                let plane_format = image_format.plane_compatible_format(plane);

                if !image.flags().intersects(ImageCreateFlags::MUTABLE_FORMAT)
                    && Some(format) != plane_format
                {
                    return Err(Box::new(ValidationError {
                        problem: "the image has a multi-planar format, and \
                            `create_info.subresource_range.aspects` selects a single plane, but \
                            `create_info.format` is not the format of that plane"
                            .into(),
                        vuids: &["VUID-VkImageViewCreateInfo-image-01586"],
                        ..Default::default()
                    }));
                }

                if plane_format.map(Format::compatibility) != Some(format.compatibility()) {
                    return Err(Box::new(ValidationError {
                        problem: "the image has a multi-planar format, and \
                            `create_info.subresource_range.aspects` selects a single plane, but \
                            `create_info.format` is not compatible with the format of that plane"
                            .into(),
                        vuids: &["VUID-VkImageViewCreateInfo-image-01586"],
                        ..Default::default()
                    }));
                }
            } else if format != image_format {
                return Err(Box::new(ValidationError {
                    problem: "the image has a multi-planar format, and \
                        `create_info.subresource_range.aspects` does not select a single plane, \
                        but `create_info.format` is not the format of the image"
                        .into(),
                    vuids: &["VUID-VkImageViewCreateInfo-image-01762"],
                    ..Default::default()
                }));
            }
        } else if format != image_format {
            if !image.flags().intersects(ImageCreateFlags::MUTABLE_FORMAT) {
                return Err(Box::new(ValidationError {
                    problem: "the image was not created with `ImageCreateFlags::MUTABLE_FORMAT`, \
                        but `create_info.format` is not the format of the image"
                        .into(),
                    vuids: &["VUID-VkImageViewCreateInfo-image-01762"],
                    ..Default::default()
                }));
            }

            if image
                .flags()
                .intersects(ImageCreateFlags::BLOCK_TEXEL_VIEW_COMPATIBLE)
                && !format.is_compressed()
            {
                if format.block_size() != image_format.block_size() {
                    return Err(Box::new(ValidationError {
                        problem: "the image was created with \
                            `ImageCreateFlags::BLOCK_TEXEL_VIEW_COMPATIBLE`, and \
                            `create_info.format` is uncompressed, but the block size of \
                            `create_info.format` does not equal the block size of the image's \
                            format"
                            .into(),
                        vuids: &["VUID-VkImageViewCreateInfo-image-01583"],
                        ..Default::default()
                    }));
                }
            } else if format.compatibility() != image_format.compatibility()
                || format.block_extent() != image_format.block_extent()
            {
                return Err(Box::new(ValidationError {
                    problem: "`create_info.format` is not compatible with the format of the \
                        image"
                        .into(),
                    vuids: &["VUID-VkImageViewCreateInfo-image-01761"],
                    ..Default::default()
                }));
            }
        }

        if format.requires_sampler_ycbcr_conversion() && sampler_ycbcr_conversion.is_none() {
            return Err(Box::new(ValidationError {
                problem: "`create_info.format` requires a sampler YCbCr conversion, but \
                    `create_info.sampler_ycbcr_conversion` is `None`"
                    .into(),
                vuids: &["VUID-VkImageViewCreateInfo-format-06415"],
                ..Default::default()
            }));
        }

        if sampler_ycbcr_conversion.is_some()
            && !(config.features.sampler_ycbcr_conversion
                || config.extensions.khr_sampler_ycbcr_conversion)
        {
            return Err(Box::new(ValidationError {
                context: "create_info.sampler_ycbcr_conversion".into(),
                problem: "is `Some`".into(),
                requires_one_of: crate::RequiresOneOf(&[
                    crate::RequiresAllOf(&[crate::Requires::DeviceFeature(
                        "sampler_ycbcr_conversion",
                    )]),
                    crate::RequiresAllOf(&[crate::Requires::DeviceExtension(
                        "khr_sampler_ycbcr_conversion",
                    )]),
                ]),
                ..Default::default()
            }));
        }

        Ok(())
    }
}

/// The state tracked for an image view.
#[derive(Debug)]
pub struct ImageViewState {
    handle: ash::vk::ImageView,
    image: ash::vk::Image,
    view_type: ImageViewType,
    format: Format,
    component_mapping: ComponentMapping,
    subresource_range: ImageSubresourceRange,
    samples: SampleCount,
    sampler_ycbcr_conversion: Option<ash::vk::SamplerYcbcrConversion>,
    format_components: ComponentTypes,

    image_type: ImageType,
    image_flags: ImageCreateFlags,
    image_usage: ImageUsage,
    image_extent: [u32; 3],
    image_view_formats: Vec<Format>,

    pub(crate) command_buffers: HashSet<ash::vk::CommandBuffer>,
}

impl ImageViewState {
    /// Creates the record of a newly created image view of `image`.
    pub fn new(
        handle: ash::vk::ImageView,
        image: &ImageState,
        create_info: &ImageViewCreateInfo,
    ) -> Self {
        let mut subresource_range = image.normalize_range(&create_info.subresource_range);

        // A 2D view of a 3D image covers the depth slices of one level.
        if image.image_type() == ImageType::Dim3d
            && matches!(
                create_info.view_type,
                ImageViewType::Dim2d | ImageViewType::Dim2dArray
            )
            && create_info.subresource_range.array_layers.end == REMAINING_ARRAY_LAYERS
        {
            subresource_range.array_layers.end = image.extent()[2];
        }

        ImageViewState {
            handle,
            image: image.handle(),
            view_type: create_info.view_type,
            format: create_info.format,
            component_mapping: create_info.component_mapping,
            subresource_range,
            samples: image.samples(),
            sampler_ycbcr_conversion: create_info.sampler_ycbcr_conversion,
            format_components: ComponentTypes::from_format(create_info.format),
            image_type: image.image_type(),
            image_flags: image.flags(),
            image_usage: image.usage(),
            image_extent: image.extent(),
            image_view_formats: image.create_info().view_formats.clone(),
            command_buffers: HashSet::default(),
        }
    }

    #[inline]
    pub fn handle(&self) -> ash::vk::ImageView {
        self.handle
    }

    /// Returns the image that the view was created from.
    #[inline]
    pub fn image(&self) -> ash::vk::Image {
        self.image
    }

    #[inline]
    pub fn view_type(&self) -> ImageViewType {
        self.view_type
    }

    #[inline]
    pub fn format(&self) -> Format {
        self.format
    }

    #[inline]
    pub fn component_mapping(&self) -> ComponentMapping {
        self.component_mapping
    }

    /// Returns the normalized subresource range of the view.
    #[inline]
    pub fn subresource_range(&self) -> &ImageSubresourceRange {
        &self.subresource_range
    }

    #[inline]
    pub fn samples(&self) -> SampleCount {
        self.samples
    }

    #[inline]
    pub fn sampler_ycbcr_conversion(&self) -> Option<ash::vk::SamplerYcbcrConversion> {
        self.sampler_ycbcr_conversion
    }

    /// Returns the component types that shaders read from this view.
    #[inline]
    pub fn format_components(&self) -> ComponentTypes {
        self.format_components
    }

    #[inline]
    pub fn image_type(&self) -> ImageType {
        self.image_type
    }

    #[inline]
    pub fn image_flags(&self) -> ImageCreateFlags {
        self.image_flags
    }

    #[inline]
    pub fn image_usage(&self) -> ImageUsage {
        self.image_usage
    }

    #[inline]
    pub fn image_view_formats(&self) -> &[Format] {
        &self.image_view_formats
    }

    /// Returns the extent of the first mip level of the view.
    pub fn extent(&self) -> [u32; 3] {
        super::mip_level_extent(self.image_extent, self.subresource_range.mip_levels.start)
            .unwrap_or([1, 1, 1])
    }

    /// Returns the number of array layers of the view.
    #[inline]
    pub fn layer_count(&self) -> u32 {
        self.subresource_range.array_layers.len() as u32
    }

    /// Returns whether this is a 2D or 2D array view of a 3D image.
    #[inline]
    pub fn is_2d_view_of_3d_image(&self) -> bool {
        self.image_type == ImageType::Dim3d
            && matches!(
                self.view_type,
                ImageViewType::Dim2d | ImageViewType::Dim2dArray
            )
    }

    /// Returns the range of the image that a layout transition through this view affects.
    ///
    /// For 2D views of 3D images, this covers every depth slice of the view's mip levels.
    pub fn layout_range(&self) -> ImageSubresourceRange {
        let mut range = self.subresource_range.clone();

        if self.is_2d_view_of_3d_image() {
            let depth = super::mip_level_extent(
                self.image_extent,
                self.subresource_range.mip_levels.start,
            )
            .map_or(1, |extent| extent[2]);
            range.array_layers = 0..depth;
        }

        range
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::{ImageCreateInfo, REMAINING_MIP_LEVELS};
    use ash::vk::Handle;

    fn image(create_info: ImageCreateInfo) -> ImageState {
        ImageState::new(ash::vk::Image::from_raw(1), create_info)
    }

    #[test]
    fn view_of_3d_image() {
        let image = image(ImageCreateInfo {
            flags: ImageCreateFlags::TYPE_2D_ARRAY_COMPATIBLE,
            image_type: ImageType::Dim3d,
            format: Format::R8G8B8A8_UNORM,
            extent: [16, 16, 4],
            usage: ImageUsage::COLOR_ATTACHMENT,
            ..Default::default()
        });
        let mut config = ValidationConfig::default();
        config.extensions.khr_maintenance1 = true;

        let create_info = ImageViewCreateInfo {
            view_type: ImageViewType::Dim2dArray,
            format: Format::R8G8B8A8_UNORM,
            subresource_range: ImageSubresourceRange {
                aspects: ImageAspects::COLOR,
                mip_levels: 0..1,
                array_layers: 1..2,
            },
            ..Default::default()
        };
        assert!(create_info.validate(&image, &config).is_ok());

        let view = ImageViewState::new(ash::vk::ImageView::from_raw(2), &image, &create_info);
        assert!(view.is_2d_view_of_3d_image());
        assert_eq!(view.subresource_range().array_layers, 1..2);
        assert_eq!(view.layout_range().array_layers, 0..4);
    }

    #[test]
    fn range_out_of_bounds() {
        let image = image(ImageCreateInfo {
            format: Format::R8G8B8A8_UNORM,
            extent: [16, 16, 1],
            mip_levels: 2,
            usage: ImageUsage::SAMPLED,
            ..Default::default()
        });
        let config = ValidationConfig::default();

        let create_info = ImageViewCreateInfo {
            format: Format::R8G8B8A8_UNORM,
            subresource_range: ImageSubresourceRange {
                aspects: ImageAspects::COLOR,
                mip_levels: 2..REMAINING_MIP_LEVELS,
                array_layers: 0..1,
            },
            ..Default::default()
        };
        assert_eq!(
            create_info.validate(&image, &config).unwrap_err().vuid(),
            "VUID-VkImageViewCreateInfo-subresourceRange-01478",
        );
    }

    #[test]
    fn format_compatibility() {
        let image = image(ImageCreateInfo {
            flags: ImageCreateFlags::MUTABLE_FORMAT,
            format: Format::R8G8B8A8_UNORM,
            extent: [16, 16, 1],
            usage: ImageUsage::SAMPLED,
            ..Default::default()
        });
        let config = ValidationConfig::default();

        let mut create_info = ImageViewCreateInfo::from_image(&image);
        create_info.format = Format::R32_UINT;
        assert!(create_info.validate(&image, &config).is_ok());

        create_info.format = Format::R16G16B16A16_SFLOAT;
        assert_eq!(
            create_info.validate(&image, &config).unwrap_err().vuid(),
            "VUID-VkImageViewCreateInfo-image-01761",
        );
    }

    #[test]
    fn cube_needs_six_layers() {
        let image = image(ImageCreateInfo {
            flags: ImageCreateFlags::CUBE_COMPATIBLE,
            format: Format::R8G8B8A8_UNORM,
            extent: [16, 16, 1],
            array_layers: 12,
            usage: ImageUsage::SAMPLED,
            ..Default::default()
        });
        let config = ValidationConfig::default();

        let create_info = ImageViewCreateInfo {
            view_type: ImageViewType::Cube,
            format: Format::R8G8B8A8_UNORM,
            subresource_range: ImageSubresourceRange {
                aspects: ImageAspects::COLOR,
                mip_levels: 0..1,
                array_layers: 0..REMAINING_ARRAY_LAYERS,
            },
            ..Default::default()
        };
        assert_eq!(
            create_info.validate(&image, &config).unwrap_err().vuid(),
            "VUID-VkImageViewCreateInfo-viewType-02960",
        );

        let create_info = ImageViewCreateInfo {
            view_type: ImageViewType::CubeArray,
            ..create_info
        };
        assert!(create_info.validate(&image, &config).is_ok());
    }
}
