// Copyright (c) 2016 The vulkano developers
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or https://opensource.org/licenses/MIT>,
// at your option. All files in the project carrying such
// notice may not be copied, modified, or distributed except
// according to those terms.

//! Image state records and subresource ranges.
//!
//! An image is made of *subresources*: one per combination of aspect, mip level and array layer.
//! Commands and barriers refer to a rectangular block of subresources with an
//! [`ImageSubresourceRange`]. The application may leave the end of the level and layer ranges
//! open by passing [`REMAINING_MIP_LEVELS`] or [`REMAINING_ARRAY_LAYERS`]. Before a range is used
//! for tracking it is *normalized* against the image with [`ImageState::normalize_range`]:
//!
//! - open-ended ranges are resolved against the image's level count and layer limit;
//! - for a 3D image created with [`ImageCreateFlags::TYPE_2D_ARRAY_COMPATIBLE`], the layer limit
//!   is the depth of the image, since its depth slices can be viewed as array layers;
//! - for a multi-planar format, the `COLOR` aspect is replaced with the `PLANE_n` aspects.

pub use self::layout::ImageLayout;
use crate::{
    config::ValidationConfig,
    format::Format,
    macros::{vulkan_bitflags, vulkan_bitflags_enum, vulkan_enum},
    memory::BoundMemory,
    sync::Sharing,
    ValidationError,
};
use foldhash::HashSet;
use std::{cmp::max, ops::Range};

pub mod layout;
pub mod view;

/// Value for the end of a mip level range, meaning "all the remaining levels".
pub const REMAINING_MIP_LEVELS: u32 = ash::vk::REMAINING_MIP_LEVELS;

/// Value for the end of an array layer range, meaning "all the remaining layers".
pub const REMAINING_ARRAY_LAYERS: u32 = ash::vk::REMAINING_ARRAY_LAYERS;

vulkan_bitflags! {
    /// A set of [`ImageAspect`] values.
    ImageAspects
    impl {
        /// Returns the index of the plane selected by `self`, if `self` is a single `PLANE_n`
        /// aspect.
        #[inline]
        pub fn plane_index(self) -> Option<usize> {
            if self == Self::PLANE_0 {
                Some(0)
            } else if self == Self::PLANE_1 {
                Some(1)
            } else if self == Self::PLANE_2 {
                Some(2)
            } else {
                None
            }
        }

        /// Returns an iterator over the individual aspects in `self`, from the lowest bit.
        #[inline]
        pub fn iter(self) -> impl Iterator<Item = ImageAspects> {
            let bits = self.0;
            (0..u32::BITS)
                .map(|bit| 1u32 << bit)
                .filter(move |bit| bits & bit != 0)
                .map(Self)
        }
    }
    = ImageAspectFlags(u32);

    /// The single aspect of images with a color format, or a combined aspect covering all planes
    /// of a multi-planar format.
    COLOR = COLOR,

    /// The depth component of a depth/stencil format.
    DEPTH = DEPTH,

    /// The stencil component of a depth/stencil format.
    STENCIL = STENCIL,

    /// An aspect used with sparse memory on some implementations.
    METADATA = METADATA,

    /// The first plane of a multi-planar format.
    PLANE_0 = PLANE_0
    RequiresOneOf([
        RequiresAllOf([DeviceFeature(sampler_ycbcr_conversion)]),
        RequiresAllOf([DeviceExtension(khr_sampler_ycbcr_conversion)]),
    ]),

    /// The second plane of a multi-planar format.
    PLANE_1 = PLANE_1
    RequiresOneOf([
        RequiresAllOf([DeviceFeature(sampler_ycbcr_conversion)]),
        RequiresAllOf([DeviceExtension(khr_sampler_ycbcr_conversion)]),
    ]),

    /// The third plane of a three-plane format.
    PLANE_2 = PLANE_2
    RequiresOneOf([
        RequiresAllOf([DeviceFeature(sampler_ycbcr_conversion)]),
        RequiresAllOf([DeviceExtension(khr_sampler_ycbcr_conversion)]),
    ]),
}

impl ImageAspects {
    /// All the plane aspects.
    pub const PLANES: Self = Self::PLANE_0.union(Self::PLANE_1).union(Self::PLANE_2);
}

vulkan_bitflags! {
    /// Flags specifying additional properties of an image.
    ImageCreateFlags = ImageCreateFlags(u32);

    /// The image will be backed by sparse memory binding.
    SPARSE_BINDING = SPARSE_BINDING,

    /// The image can be partially backed by sparse memory.
    SPARSE_RESIDENCY = SPARSE_RESIDENCY,

    /// The image's sparse memory may alias other resources.
    SPARSE_ALIASED = SPARSE_ALIASED,

    /// For non-multi-planar formats, whether an image view wrapping the image can have a
    /// different format.
    MUTABLE_FORMAT = MUTABLE_FORMAT,

    /// For 2D images, whether an image view of type `ImageViewType::Cube` or
    /// `ImageViewType::CubeArray` can be created from the image.
    CUBE_COMPATIBLE = CUBE_COMPATIBLE,

    /// For 3D images, whether an image view of type `ImageViewType::Dim2d` or
    /// `ImageViewType::Dim2dArray` can be created from the image.
    TYPE_2D_ARRAY_COMPATIBLE = TYPE_2D_ARRAY_COMPATIBLE
    RequiresOneOf([
        RequiresAllOf([DeviceExtension(khr_maintenance1)]),
    ]),

    /// For images with a compressed format, whether an image view with an uncompressed
    /// format can be created from the image, where each texel in the view will correspond to a
    /// compressed texel block in the image.
    BLOCK_TEXEL_VIEW_COMPATIBLE = BLOCK_TEXEL_VIEW_COMPATIBLE
    RequiresOneOf([
        RequiresAllOf([DeviceExtension(khr_maintenance2)]),
    ]),

    /// Views of the image may have usage flags that are not supported by the view's format.
    EXTENDED_USAGE = EXTENDED_USAGE
    RequiresOneOf([
        RequiresAllOf([DeviceExtension(khr_maintenance2)]),
    ]),

    /// For images with a multi-planar format, whether each plane will have its memory bound
    /// separately.
    DISJOINT = DISJOINT
    RequiresOneOf([
        RequiresAllOf([DeviceExtension(khr_sampler_ycbcr_conversion)]),
    ]),
}

vulkan_bitflags! {
    /// Describes how an image is going to be used.
    ImageUsage = ImageUsageFlags(u32);

    /// The image can be used as a source for transfer, blit, resolve and clear commands.
    TRANSFER_SRC = TRANSFER_SRC,

    /// The image can be used as a destination for transfer, blit, resolve and clear commands.
    TRANSFER_DST = TRANSFER_DST,

    /// The image can be used as a sampled image in a shader.
    SAMPLED = SAMPLED,

    /// The image can be used as a storage image in a shader.
    STORAGE = STORAGE,

    /// The image can be used as a color attachment in a render pass/framebuffer.
    COLOR_ATTACHMENT = COLOR_ATTACHMENT,

    /// The image can be used as a depth/stencil attachment in a render pass/framebuffer.
    DEPTH_STENCIL_ATTACHMENT = DEPTH_STENCIL_ATTACHMENT,

    /// The image will be used as an attachment, and will only ever be used temporarily.
    TRANSIENT_ATTACHMENT = TRANSIENT_ATTACHMENT,

    /// The image can be used as an input attachment in a render pass/framebuffer.
    INPUT_ATTACHMENT = INPUT_ATTACHMENT,
}

vulkan_bitflags_enum! {
    /// A set of [`SampleCount`] values.
    SampleCounts,

    /// The number of samples per texel of an image.
    SampleCount,

    = SampleCountFlags(u32);

    /// 1 sample per texel.
    SAMPLE_1, Sample1 = TYPE_1,

    /// 2 samples per texel.
    SAMPLE_2, Sample2 = TYPE_2,

    /// 4 samples per texel.
    SAMPLE_4, Sample4 = TYPE_4,

    /// 8 samples per texel.
    SAMPLE_8, Sample8 = TYPE_8,

    /// 16 samples per texel.
    SAMPLE_16, Sample16 = TYPE_16,

    /// 32 samples per texel.
    SAMPLE_32, Sample32 = TYPE_32,

    /// 64 samples per texel.
    SAMPLE_64, Sample64 = TYPE_64,
}

impl Default for SampleCount {
    #[inline]
    fn default() -> Self {
        SampleCount::Sample1
    }
}

vulkan_enum! {
    /// The basic dimensionality of an image.
    ImageType = ImageType(i32);

    /// A one-dimensional image, consisting of only a width, with a height and depth of 1.
    Dim1d = TYPE_1D,

    /// A two-dimensional image, consisting of a width and height, with a depth of 1.
    Dim2d = TYPE_2D,

    /// A three-dimensional image, consisting of a width, height and depth.
    Dim3d = TYPE_3D,
}

vulkan_enum! {
    /// The arrangement of texels or texel blocks in an image.
    ImageTiling = ImageTiling(i32);

    /// The arrangement is optimized for access in an implementation-defined way.
    Optimal = OPTIMAL,

    /// The texels are laid out in row-major order.
    Linear = LINEAR,
}

/// Returns the maximum number of mipmap levels for the given image extent.
///
/// The returned value is always at least 1.
#[inline]
pub fn max_mip_levels(extent: [u32; 3]) -> u32 {
    // This calculates `floor(log2(max(width, height, depth))) + 1` using fast integer operations.
    32 - (extent[0] | extent[1] | extent[2]).leading_zeros()
}

/// Returns the extent of the `level`th mipmap level.
/// If `level` is 0, then it returns `extent` back unchanged.
///
/// Returns `None` if `level` is not less than `max_mip_levels(extent)`.
#[inline]
pub fn mip_level_extent(extent: [u32; 3], level: u32) -> Option<[u32; 3]> {
    if level == 0 {
        return Some(extent);
    }

    if level >= max_mip_levels(extent) {
        return None;
    }

    Some(extent.map(|x| max(1, x >> level)))
}

/// One or more subresources of an image, that should be accessed by a command.
///
/// The end of `mip_levels` may be [`REMAINING_MIP_LEVELS`], and the end of `array_layers` may be
/// [`REMAINING_ARRAY_LAYERS`].
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ImageSubresourceRange {
    /// Selects the aspects that will be included.
    pub aspects: ImageAspects,

    /// Selects the range of the mip levels that will be included.
    pub mip_levels: Range<u32>,

    /// Selects the range of array layers that will be included.
    pub array_layers: Range<u32>,
}

impl ImageSubresourceRange {
    /// Returns a range covering every level and layer of `aspects`.
    #[inline]
    pub fn whole(aspects: ImageAspects) -> Self {
        Self {
            aspects,
            mip_levels: 0..REMAINING_MIP_LEVELS,
            array_layers: 0..REMAINING_ARRAY_LAYERS,
        }
    }

    pub(crate) fn validate(&self) -> Result<(), Box<ValidationError>> {
        let &Self {
            aspects,
            ref mip_levels,
            ref array_layers,
        } = self;

        if aspects.is_empty() {
            return Err(Box::new(ValidationError {
                context: "aspects".into(),
                problem: "is empty".into(),
                vuids: &["VUID-VkImageSubresourceRange-aspectMask-requiredbitmask"],
                ..Default::default()
            }));
        }

        if aspects.intersects(ImageAspects::COLOR)
            && aspects.intersects(ImageAspects::DEPTH | ImageAspects::STENCIL)
        {
            return Err(Box::new(ValidationError {
                context: "aspects".into(),
                problem: "contains both `ImageAspects::COLOR`, and either \
                    `ImageAspects::DEPTH` or `ImageAspects::STENCIL`"
                    .into(),
                vuids: &["VUID-VkImageSubresourceRange-aspectMask-00167"],
                ..Default::default()
            }));
        }

        if aspects.intersects(ImageAspects::METADATA) && aspects != ImageAspects::METADATA {
            return Err(Box::new(ValidationError {
                context: "aspects".into(),
                problem: "contains `ImageAspects::METADATA` together with other aspects".into(),
                vuids: &["VUID-VkImageSubresourceRange-aspectMask-00168"],
                ..Default::default()
            }));
        }

        if aspects.intersects(ImageAspects::COLOR) && aspects.intersects(ImageAspects::PLANES) {
            return Err(Box::new(ValidationError {
                context: "aspects".into(),
                problem: "contains both `ImageAspects::COLOR` and a `PLANE_n` aspect".into(),
                vuids: &["VUID-VkImageSubresourceRange-aspectMask-01670"],
                ..Default::default()
            }));
        }

        if mip_levels.is_empty() {
            return Err(Box::new(ValidationError {
                context: "mip_levels".into(),
                problem: "is empty".into(),
                vuids: &["VUID-VkImageSubresourceRange-levelCount-01720"],
                ..Default::default()
            }));
        }

        if array_layers.is_empty() {
            return Err(Box::new(ValidationError {
                context: "array_layers".into(),
                problem: "is empty".into(),
                vuids: &["VUID-VkImageSubresourceRange-layerCount-01721"],
                ..Default::default()
            }));
        }

        Ok(())
    }
}

impl From<ash::vk::ImageSubresourceRange> for ImageSubresourceRange {
    #[inline]
    fn from(val: ash::vk::ImageSubresourceRange) -> Self {
        let end = |base: u32, count: u32, remaining: u32| {
            if count == remaining {
                remaining
            } else {
                base.saturating_add(count)
            }
        };

        Self {
            aspects: val.aspect_mask.into(),
            mip_levels: val.base_mip_level
                ..end(val.base_mip_level, val.level_count, REMAINING_MIP_LEVELS),
            array_layers: val.base_array_layer
                ..end(
                    val.base_array_layer,
                    val.layer_count,
                    REMAINING_ARRAY_LAYERS,
                ),
        }
    }
}

/// One or more subresources of an image, spanning a single mip level, that should be accessed by a
/// command.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ImageSubresourceLayers {
    /// Selects the aspects that will be included.
    pub aspects: ImageAspects,

    /// Selects mip level that will be included.
    pub mip_level: u32,

    /// Selects the range of array layers that will be included.
    pub array_layers: Range<u32>,
}

impl From<ImageSubresourceLayers> for ImageSubresourceRange {
    #[inline]
    fn from(val: ImageSubresourceLayers) -> Self {
        Self {
            aspects: val.aspects,
            mip_levels: val.mip_level..val.mip_level + 1,
            array_layers: val.array_layers,
        }
    }
}

/// A single subresource of an image: one aspect, mip level and array layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ImageSubresource {
    pub aspects: ImageAspects,
    pub mip_level: u32,
    pub array_layer: u32,
}

impl PartialOrd for ImageAspects {
    #[inline]
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ImageAspects {
    #[inline]
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.cmp(&other.0)
    }
}

/// Parameters to create a new image.
#[derive(Clone, Debug)]
pub struct ImageCreateInfo {
    /// Additional properties of the image.
    ///
    /// The default value is empty.
    pub flags: ImageCreateFlags,

    /// The basic image dimensionality to create the image with.
    ///
    /// The default value is `ImageType::Dim2d`.
    pub image_type: ImageType,

    /// The format used to store the image data.
    ///
    /// The default value is `Format::UNDEFINED`.
    pub format: Format,

    /// The width, height and depth of the image.
    ///
    /// If `image_type` is `ImageType::Dim2d`, then the depth must be 1.
    /// If `image_type` is `ImageType::Dim1d`, then the height and depth must be 1.
    ///
    /// The default value is `[0; 3]`, which must be overridden.
    pub extent: [u32; 3],

    /// The formats that views of the image may be created with, if it was created with a
    /// format list.
    ///
    /// The default value is empty.
    pub view_formats: Vec<Format>,

    /// The number of array layers to create the image with.
    ///
    /// The default value is `1`.
    pub array_layers: u32,

    /// The number of mip levels to create the image with.
    ///
    /// The default value is `1`.
    pub mip_levels: u32,

    /// The number of samples per texel that the image should use.
    ///
    /// The default value is [`SampleCount::Sample1`].
    pub samples: SampleCount,

    /// The memory arrangement of the texel blocks.
    ///
    /// The default value is [`ImageTiling::Optimal`].
    pub tiling: ImageTiling,

    /// How the image is going to be used.
    ///
    /// The default value is empty, which must be overridden.
    pub usage: ImageUsage,

    /// Whether the image can be shared across multiple queues, or is limited to a single queue.
    ///
    /// The default value is [`Sharing::Exclusive`].
    pub sharing: Sharing,

    /// The image layout that the image will have when it is created.
    ///
    /// The default value is [`ImageLayout::Undefined`].
    pub initial_layout: ImageLayout,

    /// Whether the image uses an external, implementation-defined format. The format checks that
    /// depend on the format are skipped for such images.
    ///
    /// The default value is `false`.
    pub external_format: bool,

    pub _ne: crate::NonExhaustive,
}

impl Default for ImageCreateInfo {
    #[inline]
    fn default() -> Self {
        Self {
            flags: ImageCreateFlags::empty(),
            image_type: ImageType::Dim2d,
            format: Format::UNDEFINED,
            extent: [0; 3],
            view_formats: Vec::new(),
            array_layers: 1,
            mip_levels: 1,
            samples: SampleCount::Sample1,
            tiling: ImageTiling::Optimal,
            usage: ImageUsage::empty(),
            sharing: Sharing::Exclusive,
            initial_layout: ImageLayout::Undefined,
            external_format: false,
            _ne: crate::NonExhaustive(()),
        }
    }
}

impl ImageCreateInfo {
    pub(crate) fn validate(&self, config: &ValidationConfig) -> Result<(), Box<ValidationError>> {
        let &Self {
            flags,
            image_type,
            format,
            extent,
            ref view_formats,
            array_layers,
            mip_levels,
            samples,
            tiling,
            usage,
            ref sharing,
            initial_layout,
            external_format,
            _ne: _,
        } = self;

        flags
            .validate_device(&config.features, &config.extensions)
            .map_err(|err| {
                err.add_context("flags")
                    .set_vuids(&["VUID-VkImageCreateInfo-flags-parameter"])
            })?;

        if usage.is_empty() {
            return Err(Box::new(ValidationError {
                context: "usage".into(),
                problem: "is empty".into(),
                vuids: &["VUID-VkImageCreateInfo-usage-requiredbitmask"],
                ..Default::default()
            }));
        }

        sharing.validate()?;

        if !matches!(
            initial_layout,
            ImageLayout::Undefined | ImageLayout::Preinitialized
        ) {
            return Err(Box::new(ValidationError {
                context: "initial_layout".into(),
                problem: "is not `ImageLayout::Undefined` or `ImageLayout::Preinitialized`"
                    .into(),
                vuids: &["VUID-VkImageCreateInfo-initialLayout-00993"],
                ..Default::default()
            }));
        }

        if extent.contains(&0) {
            return Err(Box::new(ValidationError {
                context: "extent".into(),
                problem: "one or more elements are zero".into(),
                vuids: &[
                    "VUID-VkImageCreateInfo-extent-00944",
                    "VUID-VkImageCreateInfo-extent-00945",
                    "VUID-VkImageCreateInfo-extent-00946",
                ],
                ..Default::default()
            }));
        }

        if array_layers == 0 {
            return Err(Box::new(ValidationError {
                context: "array_layers".into(),
                problem: "is zero".into(),
                vuids: &["VUID-VkImageCreateInfo-arrayLayers-00948"],
                ..Default::default()
            }));
        }

        if mip_levels == 0 {
            return Err(Box::new(ValidationError {
                context: "mip_levels".into(),
                problem: "is zero".into(),
                vuids: &["VUID-VkImageCreateInfo-mipLevels-00947"],
                ..Default::default()
            }));
        }

        let limits = &config.limits;

        match image_type {
            ImageType::Dim1d => {
                if extent[1..] != [1, 1] {
                    return Err(Box::new(ValidationError {
                        problem: "`image_type` is `ImageType::Dim1d`, but `extent[1]` and \
                            `extent[2]` are not both 1"
                            .into(),
                        vuids: &["VUID-VkImageCreateInfo-imageType-00956"],
                        ..Default::default()
                    }));
                }

                if extent[0] > limits.max_image_dimension1_d {
                    return Err(Box::new(ValidationError {
                        problem: "`image_type` is `ImageType::Dim1d`, but `extent[0]` exceeds \
                            the `max_image_dimension1_d` limit"
                            .into(),
                        vuids: &["VUID-VkImageCreateInfo-extent-02252"],
                        ..Default::default()
                    }));
                }
            }
            ImageType::Dim2d => {
                if extent[2] != 1 {
                    return Err(Box::new(ValidationError {
                        problem: "`image_type` is `ImageType::Dim2d`, but `extent[2]` is not 1"
                            .into(),
                        vuids: &["VUID-VkImageCreateInfo-imageType-00957"],
                        ..Default::default()
                    }));
                }

                if extent[0] > limits.max_image_dimension2_d
                    || extent[1] > limits.max_image_dimension2_d
                {
                    return Err(Box::new(ValidationError {
                        problem: "`image_type` is `ImageType::Dim2d`, but `extent[0]` or \
                            `extent[1]` exceeds the `max_image_dimension2_d` limit"
                            .into(),
                        vuids: &["VUID-VkImageCreateInfo-extent-02253"],
                        ..Default::default()
                    }));
                }
            }
            ImageType::Dim3d => {
                if extent.iter().any(|&e| e > limits.max_image_dimension3_d) {
                    return Err(Box::new(ValidationError {
                        problem: "`image_type` is `ImageType::Dim3d`, but an element of \
                            `extent` exceeds the `max_image_dimension3_d` limit"
                            .into(),
                        vuids: &["VUID-VkImageCreateInfo-extent-02254"],
                        ..Default::default()
                    }));
                }

                if array_layers != 1 {
                    return Err(Box::new(ValidationError {
                        problem: "`image_type` is `ImageType::Dim3d`, but `array_layers` is \
                            not 1"
                            .into(),
                        vuids: &["VUID-VkImageCreateInfo-imageType-00961"],
                        ..Default::default()
                    }));
                }
            }
        }

        if array_layers > limits.max_image_array_layers {
            return Err(Box::new(ValidationError {
                context: "array_layers".into(),
                problem: "exceeds the `max_image_array_layers` limit".into(),
                vuids: &["VUID-VkImageCreateInfo-arrayLayers-02256"],
                ..Default::default()
            }));
        }

        if mip_levels > max_mip_levels(extent) {
            return Err(Box::new(ValidationError {
                problem: "`mip_levels` is greater than the maximum allowed number of mip levels \
                    for `extent`"
                    .into(),
                vuids: &["VUID-VkImageCreateInfo-mipLevels-00958"],
                ..Default::default()
            }));
        }

        if flags.intersects(ImageCreateFlags::TYPE_2D_ARRAY_COMPATIBLE)
            && image_type != ImageType::Dim3d
        {
            return Err(Box::new(ValidationError {
                problem: "`flags` contains `ImageCreateFlags::TYPE_2D_ARRAY_COMPATIBLE`, but \
                    `image_type` is not `ImageType::Dim3d`"
                    .into(),
                vuids: &["VUID-VkImageCreateInfo-flags-00950"],
                ..Default::default()
            }));
        }

        if flags.intersects(ImageCreateFlags::CUBE_COMPATIBLE) {
            if image_type != ImageType::Dim2d {
                return Err(Box::new(ValidationError {
                    problem: "`flags` contains `ImageCreateFlags::CUBE_COMPATIBLE`, but \
                        `image_type` is not `ImageType::Dim2d`"
                        .into(),
                    vuids: &["VUID-VkImageCreateInfo-flags-00949"],
                    ..Default::default()
                }));
            }

            if extent[0] != extent[1] {
                return Err(Box::new(ValidationError {
                    problem: "`flags` contains `ImageCreateFlags::CUBE_COMPATIBLE`, but \
                        `extent[0]` does not equal `extent[1]`"
                        .into(),
                    vuids: &["VUID-VkImageCreateInfo-imageType-00954"],
                    ..Default::default()
                }));
            }

            if array_layers < 6 {
                return Err(Box::new(ValidationError {
                    problem: "`flags` contains `ImageCreateFlags::CUBE_COMPATIBLE`, but \
                        `array_layers` is less than 6"
                        .into(),
                    vuids: &["VUID-VkImageCreateInfo-imageType-00954"],
                    ..Default::default()
                }));
            }
        }

        if samples != SampleCount::Sample1 {
            if image_type != ImageType::Dim2d {
                return Err(Box::new(ValidationError {
                    problem: "`samples` is not `SampleCount::Sample1`, but `image_type` is not \
                        `ImageType::Dim2d`"
                        .into(),
                    vuids: &["VUID-VkImageCreateInfo-samples-02257"],
                    ..Default::default()
                }));
            }

            if tiling != ImageTiling::Optimal {
                return Err(Box::new(ValidationError {
                    problem: "`samples` is not `SampleCount::Sample1`, but `tiling` is not \
                        `ImageTiling::Optimal`"
                        .into(),
                    vuids: &["VUID-VkImageCreateInfo-samples-02257"],
                    ..Default::default()
                }));
            }

            if mip_levels != 1 {
                return Err(Box::new(ValidationError {
                    problem: "`samples` is not `SampleCount::Sample1`, but `mip_levels` is not 1"
                        .into(),
                    vuids: &["VUID-VkImageCreateInfo-samples-02257"],
                    ..Default::default()
                }));
            }

            if flags.intersects(ImageCreateFlags::CUBE_COMPATIBLE) {
                return Err(Box::new(ValidationError {
                    problem: "`samples` is not `SampleCount::Sample1`, but `flags` contains \
                        `ImageCreateFlags::CUBE_COMPATIBLE`"
                        .into(),
                    vuids: &["VUID-VkImageCreateInfo-samples-02257"],
                    ..Default::default()
                }));
            }
        }

        if external_format {
            return Ok(());
        }

        if format == Format::UNDEFINED {
            return Err(Box::new(ValidationError {
                context: "format".into(),
                problem: "is `Format::UNDEFINED`".into(),
                vuids: &["VUID-VkImageCreateInfo-format-00943"],
                ..Default::default()
            }));
        }

        if format.is_multi_planar() || format.is_single_plane_422() {
            if format.is_multi_planar() {
                if mip_levels != 1 || array_layers != 1 || samples != SampleCount::Sample1 {
                    return Err(Box::new(ValidationError {
                        problem: "`format` is a multi-planar format, but `mip_levels`, \
                            `array_layers` or `samples` is not 1"
                            .into(),
                        vuids: &["VUID-VkImageCreateInfo-format-06410"],
                        ..Default::default()
                    }));
                }

                if image_type != ImageType::Dim2d {
                    return Err(Box::new(ValidationError {
                        problem: "`format` is a multi-planar format, but `image_type` is not \
                            `ImageType::Dim2d`"
                            .into(),
                        vuids: &["VUID-VkImageCreateInfo-format-06410"],
                        ..Default::default()
                    }));
                }
            }

            let [divisor_width, divisor_height] = format
                .ycbcr_chroma_sampling()
                .map_or([1, 1], |chroma_sampling| chroma_sampling.subsampled_divisors());

            if extent[0] % divisor_width != 0 {
                return Err(Box::new(ValidationError {
                    problem: "`format` is a YCbCr format with horizontal chroma subsampling, \
                        but `extent[0]` is not a multiple of 2"
                        .into(),
                    vuids: &["VUID-VkImageCreateInfo-format-04712"],
                    ..Default::default()
                }));
            }

            if extent[1] % divisor_height != 0 {
                return Err(Box::new(ValidationError {
                    problem: "`format` is a YCbCr format with vertical chroma subsampling, \
                        but `extent[1]` is not a multiple of 2"
                        .into(),
                    vuids: &["VUID-VkImageCreateInfo-format-04713"],
                    ..Default::default()
                }));
            }
        } else if flags.intersects(ImageCreateFlags::DISJOINT) {
            return Err(Box::new(ValidationError {
                problem: "`flags` contains `ImageCreateFlags::DISJOINT`, but `format` is not \
                    a multi-planar format"
                    .into(),
                vuids: &["VUID-VkImageCreateInfo-format-01577"],
                ..Default::default()
            }));
        }

        if view_formats.len() > 1 && !flags.intersects(ImageCreateFlags::MUTABLE_FORMAT) {
            return Err(Box::new(ValidationError {
                problem: "`view_formats` has more than one element, but `flags` does not \
                    contain `ImageCreateFlags::MUTABLE_FORMAT`"
                    .into(),
                vuids: &["VUID-VkImageCreateInfo-flags-04738"],
                ..Default::default()
            }));
        }

        if flags.intersects(ImageCreateFlags::BLOCK_TEXEL_VIEW_COMPATIBLE) {
            if !format.is_compressed() {
                return Err(Box::new(ValidationError {
                    problem: "`flags` contains `ImageCreateFlags::BLOCK_TEXEL_VIEW_COMPATIBLE`, \
                        but `format` is not a compressed format"
                        .into(),
                    vuids: &["VUID-VkImageCreateInfo-flags-01572"],
                    ..Default::default()
                }));
            }

            if !flags.intersects(ImageCreateFlags::MUTABLE_FORMAT) {
                return Err(Box::new(ValidationError {
                    problem: "`flags` contains `ImageCreateFlags::BLOCK_TEXEL_VIEW_COMPATIBLE`, \
                        but does not also contain `ImageCreateFlags::MUTABLE_FORMAT`"
                        .into(),
                    vuids: &["VUID-VkImageCreateInfo-flags-01573"],
                    ..Default::default()
                }));
            }
        }

        if format.is_compressed() && image_type == ImageType::Dim1d {
            return Err(Box::new(ValidationError {
                problem: "`format` is a compressed format, but `image_type` is \
                    `ImageType::Dim1d`"
                    .into(),
                vuids: &["VUID-VkImageCreateInfo-imageCreateMaxMipLevels-02251"],
                ..Default::default()
            }));
        }

        if format.is_depth_or_stencil() && image_type == ImageType::Dim3d {
            return Err(Box::new(ValidationError {
                problem: "`format` is a depth/stencil format, but `image_type` is \
                    `ImageType::Dim3d`"
                    .into(),
                vuids: &["VUID-VkImageCreateInfo-imageCreateMaxMipLevels-02251"],
                ..Default::default()
            }));
        }

        Ok(())
    }
}

/// Swapchain linkage of an image.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SwapchainBinding {
    pub swapchain: ash::vk::SwapchainKHR,
    pub image_index: u32,
}

/// The state tracked for an image.
#[derive(Debug)]
pub struct ImageState {
    handle: ash::vk::Image,
    create_info: ImageCreateInfo,
    full_range: ImageSubresourceRange,
    sparse: bool,

    pub(crate) memory: BoundMemory,
    pub(crate) shared_presentable: bool,
    pub(crate) layout_locked: bool,
    pub(crate) create_from_swapchain: Option<ash::vk::SwapchainKHR>,
    pub(crate) bind_swapchain: Option<SwapchainBinding>,

    /// Command buffers that recorded a command using this image.
    pub(crate) command_buffers: HashSet<ash::vk::CommandBuffer>,
}

impl ImageState {
    /// Creates the record of a newly created image.
    ///
    /// `create_info` should already have been validated.
    pub fn new(handle: ash::vk::Image, create_info: ImageCreateInfo) -> Self {
        let sparse = create_info.flags.intersects(
            ImageCreateFlags::SPARSE_BINDING
                | ImageCreateFlags::SPARSE_RESIDENCY
                | ImageCreateFlags::SPARSE_ALIASED,
        );

        let mut state = ImageState {
            handle,
            create_info,
            full_range: ImageSubresourceRange::whole(ImageAspects::empty()),
            sparse,
            memory: BoundMemory::new(sparse),
            shared_presentable: false,
            layout_locked: false,
            create_from_swapchain: None,
            bind_swapchain: None,
            command_buffers: HashSet::default(),
        };

        let aspects = state.format().aspects() - ImageAspects::PLANES;
        state.full_range = state.normalize_range(&ImageSubresourceRange::whole(aspects));

        state
    }

    /// Creates the record of an image owned by a swapchain. Such images are always backed, and
    /// shared-presentable when the swapchain uses a shared present mode.
    pub fn from_swapchain(
        handle: ash::vk::Image,
        create_info: ImageCreateInfo,
        swapchain: ash::vk::SwapchainKHR,
        image_index: u32,
        shared_presentable: bool,
    ) -> Self {
        let mut state = Self::new(handle, create_info);
        state.create_from_swapchain = Some(swapchain);
        state.bind_swapchain = Some(SwapchainBinding {
            swapchain,
            image_index,
        });
        state.shared_presentable = shared_presentable;

        state
    }

    #[inline]
    pub fn handle(&self) -> ash::vk::Image {
        self.handle
    }

    #[inline]
    pub fn create_info(&self) -> &ImageCreateInfo {
        &self.create_info
    }

    #[inline]
    pub fn format(&self) -> Format {
        self.create_info.format
    }

    #[inline]
    pub fn image_type(&self) -> ImageType {
        self.create_info.image_type
    }

    #[inline]
    pub fn extent(&self) -> [u32; 3] {
        self.create_info.extent
    }

    #[inline]
    pub fn mip_levels(&self) -> u32 {
        self.create_info.mip_levels
    }

    #[inline]
    pub fn array_layers(&self) -> u32 {
        self.create_info.array_layers
    }

    #[inline]
    pub fn samples(&self) -> SampleCount {
        self.create_info.samples
    }

    #[inline]
    pub fn usage(&self) -> ImageUsage {
        self.create_info.usage
    }

    #[inline]
    pub fn flags(&self) -> ImageCreateFlags {
        self.create_info.flags
    }

    #[inline]
    pub fn is_sparse(&self) -> bool {
        self.sparse
    }

    #[inline]
    pub fn is_shared_presentable(&self) -> bool {
        self.shared_presentable
    }

    #[inline]
    pub fn is_layout_locked(&self) -> bool {
        self.layout_locked
    }

    #[inline]
    pub fn has_external_format(&self) -> bool {
        self.create_info.external_format
    }

    #[inline]
    pub fn swapchain_binding(&self) -> Option<SwapchainBinding> {
        self.bind_swapchain
    }

    /// Returns whether the image is backed by memory, or belongs to a swapchain.
    #[inline]
    pub fn is_memory_bound(&self) -> bool {
        self.memory.is_bound() || self.bind_swapchain.is_some()
    }

    /// Returns the normalized range covering the whole image.
    #[inline]
    pub fn full_range(&self) -> &ImageSubresourceRange {
        &self.full_range
    }

    /// Returns the number of array layers that a subresource range can address.
    ///
    /// This is the depth of the image for 3D images created with
    /// `ImageCreateFlags::TYPE_2D_ARRAY_COMPATIBLE`, and the array layer count otherwise.
    #[inline]
    pub fn layer_limit(&self) -> u32 {
        if self.image_type() == ImageType::Dim3d
            && self
                .flags()
                .intersects(ImageCreateFlags::TYPE_2D_ARRAY_COMPATIBLE)
        {
            self.extent()[2]
        } else {
            self.array_layers()
        }
    }

    /// Resolves the open ends of `range`, clamps it to the image, and expands the `COLOR` aspect
    /// of a multi-planar format to the aspects of its planes.
    pub fn normalize_range(&self, range: &ImageSubresourceRange) -> ImageSubresourceRange {
        let mip_levels = self.mip_levels();
        let layer_limit = self.layer_limit();

        let mip_start = range.mip_levels.start.min(mip_levels);
        let mip_end = if range.mip_levels.end == REMAINING_MIP_LEVELS {
            mip_levels
        } else {
            range.mip_levels.end.clamp(mip_start, mip_levels)
        };

        let layer_start = range.array_layers.start.min(layer_limit);
        let layer_end = if range.array_layers.end == REMAINING_ARRAY_LAYERS {
            layer_limit
        } else {
            range.array_layers.end.clamp(layer_start, layer_limit)
        };

        let mut aspects = range.aspects;
        let format = self.format();

        if format.is_multi_planar() && aspects.intersects(ImageAspects::COLOR) {
            aspects -= ImageAspects::COLOR;
            aspects |= ImageAspects::PLANE_0 | ImageAspects::PLANE_1;

            if format.plane_count() > 2 {
                aspects |= ImageAspects::PLANE_2;
            }
        }

        ImageSubresourceRange {
            aspects,
            mip_levels: mip_start..mip_end,
            array_layers: layer_start..layer_end,
        }
    }

    /// Checks that `range` lies within the image. `range` is the range as given by the
    /// application, before normalization.
    pub(crate) fn validate_subresource_range(
        &self,
        range: &ImageSubresourceRange,
        vuids: RangeVuids,
    ) -> Result<(), Box<ValidationError>> {
        range.validate()?;

        let &ImageSubresourceRange {
            aspects,
            ref mip_levels,
            ref array_layers,
        } = range;

        if !self.has_external_format() {
            let allowed = self.format().aspects();

            if !allowed.contains(aspects - ImageAspects::METADATA) {
                return Err(Box::new(ValidationError {
                    context: "aspects".into(),
                    problem: format!(
                        "contains aspects ({:?}) that are not present in the format of the \
                        image ({:?})",
                        aspects - allowed,
                        self.format(),
                    )
                    .into(),
                    vuids: vuids.aspects,
                    ..Default::default()
                }));
            }
        }

        if mip_levels.start >= self.mip_levels() {
            return Err(Box::new(ValidationError {
                context: "mip_levels.start".into(),
                problem: "is not less than the number of mip levels of the image".into(),
                vuids: vuids.base_mip_level,
                ..Default::default()
            }));
        }

        if mip_levels.end != REMAINING_MIP_LEVELS && mip_levels.end > self.mip_levels() {
            return Err(Box::new(ValidationError {
                context: "mip_levels.end".into(),
                problem: "is greater than the number of mip levels of the image".into(),
                vuids: vuids.level_count,
                ..Default::default()
            }));
        }

        let layer_limit = self.layer_limit();

        if array_layers.start >= layer_limit {
            return Err(Box::new(ValidationError {
                context: "array_layers.start".into(),
                problem: "is not less than the number of array layers of the image".into(),
                vuids: vuids.base_array_layer,
                ..Default::default()
            }));
        }

        if array_layers.end != REMAINING_ARRAY_LAYERS && array_layers.end > layer_limit {
            return Err(Box::new(ValidationError {
                context: "array_layers.end".into(),
                problem: "is greater than the number of array layers of the image".into(),
                vuids: vuids.layer_count,
                ..Default::default()
            }));
        }

        Ok(())
    }

    /// Returns the extent of a mip level of `aspect`, taking plane subsampling into account.
    pub fn subresource_extent(&self, mip_level: u32, aspect: ImageAspects) -> Option<[u32; 3]> {
        let mut extent = mip_level_extent(self.extent(), mip_level)?;

        if let Some(plane) = aspect.plane_index() {
            let [divisor_width, divisor_height] = self.format().plane_extent_divisors(plane);
            extent[0] /= divisor_width;
            extent[1] /= divisor_height;
        }

        Some(extent)
    }
}

/// The VUIDs reported when a subresource range is outside the image, which depend on the
/// command.
#[derive(Clone, Copy, Debug)]
pub(crate) struct RangeVuids {
    pub(crate) aspects: &'static [&'static str],
    pub(crate) base_mip_level: &'static [&'static str],
    pub(crate) level_count: &'static [&'static str],
    pub(crate) base_array_layer: &'static [&'static str],
    pub(crate) layer_count: &'static [&'static str],
}

impl RangeVuids {
    pub(crate) const BARRIER: Self = Self {
        aspects: &["VUID-VkImageMemoryBarrier-image-01672"],
        base_mip_level: &["VUID-VkImageMemoryBarrier-subresourceRange-01486"],
        level_count: &["VUID-VkImageMemoryBarrier-subresourceRange-01724"],
        base_array_layer: &["VUID-VkImageMemoryBarrier-subresourceRange-01488"],
        layer_count: &["VUID-VkImageMemoryBarrier-subresourceRange-01725"],
    };

    pub(crate) const CLEAR_COLOR: Self = Self {
        aspects: &["VUID-vkCmdClearColorImage-aspectMask-02498"],
        base_mip_level: &["VUID-vkCmdClearColorImage-baseMipLevel-01470"],
        level_count: &["VUID-vkCmdClearColorImage-pRanges-01692"],
        base_array_layer: &["VUID-vkCmdClearColorImage-baseArrayLayer-01472"],
        layer_count: &["VUID-vkCmdClearColorImage-pRanges-01693"],
    };

    pub(crate) const CLEAR_DEPTH_STENCIL: Self = Self {
        aspects: &["VUID-vkCmdClearDepthStencilImage-image-02825"],
        base_mip_level: &["VUID-vkCmdClearDepthStencilImage-baseMipLevel-01474"],
        level_count: &["VUID-vkCmdClearDepthStencilImage-pRanges-01694"],
        base_array_layer: &["VUID-vkCmdClearDepthStencilImage-baseArrayLayer-01476"],
        layer_count: &["VUID-vkCmdClearDepthStencilImage-pRanges-01695"],
    };

    pub(crate) const VIEW: Self = Self {
        aspects: &["VUID-VkImageViewCreateInfo-subresourceRange-09594"],
        base_mip_level: &["VUID-VkImageViewCreateInfo-subresourceRange-01478"],
        level_count: &["VUID-VkImageViewCreateInfo-subresourceRange-01718"],
        base_array_layer: &["VUID-VkImageViewCreateInfo-image-01482"],
        layer_count: &["VUID-VkImageViewCreateInfo-subresourceRange-01483"],
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use ash::vk::Handle;

    fn image(create_info: ImageCreateInfo) -> ImageState {
        ImageState::new(ash::vk::Image::from_raw(1), create_info)
    }

    #[test]
    fn max_mip_levels() {
        assert_eq!(super::max_mip_levels([2, 1, 1]), 2);
        assert_eq!(super::max_mip_levels([2, 3, 1]), 2);
        assert_eq!(super::max_mip_levels([512, 512, 1]), 10);
        assert_eq!(super::max_mip_levels([1, 1, 1]), 1);
        assert_eq!(super::max_mip_levels([7, 1, 300]), 9);
    }

    #[test]
    fn mip_level_extent() {
        let extent = [963, 256, 1];

        assert_eq!(super::mip_level_extent(extent, 0), Some(extent));
        assert_eq!(super::mip_level_extent(extent, 1), Some([481, 128, 1]));
        assert_eq!(super::mip_level_extent(extent, 6), Some([15, 4, 1]));
        assert_eq!(super::mip_level_extent(extent, 9), Some([1, 1, 1]));
        assert_eq!(super::mip_level_extent(extent, 11), None);
    }

    #[test]
    fn normalize_remaining() {
        let image = image(ImageCreateInfo {
            format: Format::R8G8B8A8_UNORM,
            extent: [64, 64, 1],
            mip_levels: 7,
            array_layers: 4,
            usage: ImageUsage::SAMPLED,
            ..Default::default()
        });

        let range = image.normalize_range(&ImageSubresourceRange {
            aspects: ImageAspects::COLOR,
            mip_levels: 2..REMAINING_MIP_LEVELS,
            array_layers: 1..REMAINING_ARRAY_LAYERS,
        });
        assert_eq!(range.mip_levels, 2..7);
        assert_eq!(range.array_layers, 1..4);

        // Out of bounds ranges are clamped.
        let range = image.normalize_range(&ImageSubresourceRange {
            aspects: ImageAspects::COLOR,
            mip_levels: 5..12,
            array_layers: 9..10,
        });
        assert_eq!(range.mip_levels, 5..7);
        assert!(range.array_layers.is_empty());

        assert_eq!(image.full_range().mip_levels, 0..7);
        assert_eq!(image.full_range().aspects, ImageAspects::COLOR);
    }

    #[test]
    fn normalize_3d_array_compatible() {
        let image = image(ImageCreateInfo {
            flags: ImageCreateFlags::TYPE_2D_ARRAY_COMPATIBLE,
            image_type: ImageType::Dim3d,
            format: Format::R8G8B8A8_UNORM,
            extent: [16, 16, 8],
            usage: ImageUsage::COLOR_ATTACHMENT,
            ..Default::default()
        });

        assert_eq!(image.layer_limit(), 8);
        assert_eq!(image.full_range().array_layers, 0..8);
    }

    #[test]
    fn normalize_multi_planar() {
        let image = image(ImageCreateInfo {
            format: Format::G8_B8_R8_3PLANE_420_UNORM,
            extent: [16, 16, 1],
            usage: ImageUsage::SAMPLED,
            ..Default::default()
        });

        let range = image.normalize_range(&ImageSubresourceRange::whole(ImageAspects::COLOR));
        assert!(!range.aspects.intersects(ImageAspects::COLOR));
        assert_eq!(range.aspects, ImageAspects::PLANES);
        assert_eq!(range.aspects.count(), 3);

        assert_eq!(
            image.subresource_extent(0, ImageAspects::PLANE_1),
            Some([8, 8, 1]),
        );
    }

    #[test]
    fn full_range_depth_stencil() {
        let image = image(ImageCreateInfo {
            format: Format::D24_UNORM_S8_UINT,
            extent: [16, 16, 1],
            usage: ImageUsage::DEPTH_STENCIL_ATTACHMENT,
            ..Default::default()
        });

        assert_eq!(
            image.full_range().aspects,
            ImageAspects::DEPTH | ImageAspects::STENCIL,
        );
    }

    #[test]
    fn subresource_range_bounds() {
        let image = image(ImageCreateInfo {
            format: Format::R8G8B8A8_UNORM,
            extent: [8, 8, 1],
            mip_levels: 2,
            usage: ImageUsage::SAMPLED,
            ..Default::default()
        });

        let in_bounds = ImageSubresourceRange {
            aspects: ImageAspects::COLOR,
            mip_levels: 1..2,
            array_layers: 0..1,
        };
        assert!(image
            .validate_subresource_range(&in_bounds, RangeVuids::BARRIER)
            .is_ok());

        let err = image
            .validate_subresource_range(
                &ImageSubresourceRange {
                    mip_levels: 1..3,
                    ..in_bounds.clone()
                },
                RangeVuids::BARRIER,
            )
            .unwrap_err();
        assert_eq!(
            err.vuid(),
            "VUID-VkImageMemoryBarrier-subresourceRange-01724",
        );

        let err = image
            .validate_subresource_range(
                &ImageSubresourceRange {
                    aspects: ImageAspects::DEPTH,
                    ..in_bounds
                },
                RangeVuids::BARRIER,
            )
            .unwrap_err();
        assert_eq!(err.vuid(), "VUID-VkImageMemoryBarrier-image-01672");
    }

    #[test]
    fn create_info_validation() {
        let config = ValidationConfig::default();

        let valid = ImageCreateInfo {
            format: Format::R8G8B8A8_UNORM,
            extent: [8, 8, 1],
            mip_levels: 4,
            usage: ImageUsage::SAMPLED,
            ..Default::default()
        };
        assert!(valid.validate(&config).is_ok());

        let too_many_levels = ImageCreateInfo {
            mip_levels: 5,
            ..valid.clone()
        };
        assert!(too_many_levels.validate(&config).is_err());

        let cube = ImageCreateInfo {
            flags: ImageCreateFlags::CUBE_COMPATIBLE,
            extent: [8, 4, 1],
            array_layers: 6,
            mip_levels: 1,
            ..valid.clone()
        };
        assert!(cube.validate(&config).is_err());

        let array_2d = ImageCreateInfo {
            flags: ImageCreateFlags::TYPE_2D_ARRAY_COMPATIBLE,
            image_type: ImageType::Dim3d,
            extent: [8, 8, 8],
            ..valid.clone()
        };
        let err = array_2d.validate(&config).unwrap_err();
        assert!(!err.requires_one_of.is_empty());

        let mut config = config;
        config.extensions.khr_maintenance1 = true;
        assert!(array_2d.validate(&config).is_ok());

        let planar = ImageCreateInfo {
            format: Format::G8_B8R8_2PLANE_420_UNORM,
            extent: [7, 8, 1],
            mip_levels: 1,
            ..valid
        };
        assert_eq!(
            planar.validate(&config).unwrap_err().vuid(),
            "VUID-VkImageCreateInfo-format-04712",
        );
    }

    #[test]
    fn aspects_iter() {
        let aspects = ImageAspects::DEPTH | ImageAspects::STENCIL;
        let collected: Vec<_> = aspects.iter().collect();
        assert_eq!(collected, [ImageAspects::DEPTH, ImageAspects::STENCIL]);
        assert_eq!(ImageAspects::PLANE_2.plane_index(), Some(2));
        assert_eq!(ImageAspects::COLOR.plane_index(), None);
    }
}
