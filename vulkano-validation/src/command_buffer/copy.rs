// Copyright (c) 2016 The vulkano developers
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or https://opensource.org/licenses/MIT>,
// at your option. All files in the project carrying such
// notice may not be copied, modified, or distributed except
// according to those terms.

//! Clear, copy, blit and resolve commands.
//!
//! Each command checks its images against their create parameters, checks every region
//! separately, and checks the layout the application declares for each image against the layout
//! that the command buffer has recorded for the subresources of the regions. Recording a command
//! records the declared layouts as the initial layouts of subresources the command buffer did not
//! use before.

use super::{image_layout::first_layout_mismatch, CommandBufferState};
use crate::{
    buffer::BufferUsage,
    config::ValidationConfig,
    format::{Format, NumericType},
    image::{
        ImageAspects, ImageLayout, ImageState, ImageSubresourceLayers, ImageSubresourceRange,
        ImageTiling, ImageType, ImageUsage, RangeVuids, SampleCount,
    },
    validator::{lookup, ObjectTables},
    DeviceSize, ObjectHandle, Report, ValidationError,
};
use smallvec::SmallVec;

/// The VUIDs reported for the layout that a command uses an image in.
#[derive(Clone, Copy, Debug)]
pub(crate) struct LayoutVuids {
    /// The layout does not match the layout recorded in the command buffer.
    pub(crate) mismatch: &'static [&'static str],

    /// The layout is not allowed for the command.
    pub(crate) invalid: &'static [&'static str],
}

/// Checks that `layout` is an allowed layout for a command whose preferred layout is
/// `optimal_layout`, and that it matches the layouts recorded for each of `ranges` of `image`.
///
/// `ranges` must be normalized. Only the first mismatching subresource of each range is reported.
pub(crate) fn verify_image_layout(
    command_buffer: &CommandBufferState,
    image: &ImageState,
    ranges: &[ImageSubresourceRange],
    layout: ImageLayout,
    optimal_layout: ImageLayout,
    context: &'static str,
    vuids: LayoutVuids,
    config: &ValidationConfig,
    report: &mut Report,
) {
    if config.disabled.image_layout_validation {
        return;
    }

    let object = ObjectHandle::new(command_buffer.handle());

    if let Some(map) = command_buffer.image_layout_map(image.handle()) {
        for range in ranges {
            if let Some(mismatch) = first_layout_mismatch(
                map,
                range,
                layout,
                range.aspects,
                image.is_shared_presentable(),
            ) {
                report.push(
                    crate::Severity::Error,
                    object,
                    Box::new(ValidationError {
                        context: context.into(),
                        problem: format!(
                            "cannot use image {:?} (aspect {:?}, mip level {}, array layer {}) \
                            with specific layout {:?} that doesn't match the {} layout {:?}",
                            image.handle(),
                            mismatch.subresource.aspects,
                            mismatch.subresource.mip_level,
                            mismatch.subresource.array_layer,
                            layout,
                            mismatch.describe(),
                            mismatch.layout,
                        )
                        .into(),
                        vuids: vuids.mismatch,
                        ..Default::default()
                    }),
                );
            }
        }
    }

    if layout == optimal_layout {
        return;
    }

    match layout {
        ImageLayout::General => {
            if image.create_info().tiling == ImageTiling::Optimal {
                report.perf_warning(
                    object,
                    Box::new(ValidationError {
                        context: context.into(),
                        problem: format!(
                            "is `ImageLayout::General` for an image with optimal tiling, which \
                            is slower than `ImageLayout::{:?}`",
                            optimal_layout,
                        )
                        .into(),
                        vuids: &["UNASSIGNED-CoreValidation-DrawState-InvalidImageLayout"],
                        ..Default::default()
                    }),
                );
            }
        }
        ImageLayout::SharedPresent if config.extensions.khr_shared_presentable_image => {
            if !image.is_shared_presentable() {
                report.push(
                    crate::Severity::Error,
                    object,
                    Box::new(ValidationError {
                        context: context.into(),
                        problem: "is `ImageLayout::SharedPresent`, but the image is not a \
                            shared presentable image"
                            .into(),
                        vuids: vuids.invalid,
                        ..Default::default()
                    }),
                );
            }
        }
        _ => {
            report.push(
                crate::Severity::Error,
                object,
                Box::new(ValidationError {
                    context: context.into(),
                    problem: format!(
                        "is `ImageLayout::{:?}`, but must be `ImageLayout::{:?}`, \
                        `ImageLayout::General` or `ImageLayout::SharedPresent`",
                        layout, optimal_layout,
                    )
                    .into(),
                    vuids: vuids.invalid,
                    ..Default::default()
                }),
            );
        }
    }
}

fn validate_not_in_render_pass(
    command_buffer: &CommandBufferState,
    vuids: &'static [&'static str],
) -> Result<(), Box<ValidationError>> {
    if command_buffer.render_pass().is_some() {
        return Err(Box::new(ValidationError {
            problem: "a render pass instance is active".into(),
            vuids,
            ..Default::default()
        }));
    }

    Ok(())
}

fn validate_image_usage(
    image: &ImageState,
    usage: ImageUsage,
    context: &'static str,
    vuids: &'static [&'static str],
) -> Result<(), Box<ValidationError>> {
    if !image.usage().intersects(usage) {
        return Err(Box::new(ValidationError {
            context: context.into(),
            problem: format!("was not created with `ImageUsage::{:?}`", usage).into(),
            vuids,
            ..Default::default()
        }));
    }

    Ok(())
}

#[derive(Clone, Copy, Debug)]
struct SubresourceVuids {
    aspects: &'static [&'static str],
    mip_level: &'static [&'static str],
    array_layers: &'static [&'static str],
}

#[derive(Clone, Copy, Debug)]
struct ExtentVuids {
    x: &'static [&'static str],
    y: &'static [&'static str],
    z: &'static [&'static str],
    y_1d: &'static [&'static str],
    z_2d: &'static [&'static str],
}

#[derive(Clone, Copy, Debug)]
struct BlockVuids {
    offset: &'static [&'static str],
    width: &'static [&'static str],
    height: &'static [&'static str],
    depth: &'static [&'static str],
}

#[derive(Clone, Copy, Debug)]
struct RegionVuids {
    subresource: SubresourceVuids,
    extent: ExtentVuids,
    block: Option<BlockVuids>,
}

fn validate_subresource_layers(
    image: &ImageState,
    subresource: &ImageSubresourceLayers,
    vuids: &SubresourceVuids,
) -> Result<(), Box<ValidationError>> {
    let ImageSubresourceLayers {
        aspects,
        mip_level,
        ref array_layers,
    } = *subresource;

    if aspects.is_empty() {
        return Err(Box::new(ValidationError {
            context: "aspects".into(),
            problem: "is empty".into(),
            vuids: &["VUID-VkImageSubresourceLayers-aspectMask-requiredbitmask"],
            ..Default::default()
        }));
    }

    if !image.format().aspects().contains(aspects) {
        return Err(Box::new(ValidationError {
            context: "aspects".into(),
            problem: format!(
                "contains aspects that are not present in the format of the image ({:?})",
                image.format(),
            )
            .into(),
            vuids: vuids.aspects,
            ..Default::default()
        }));
    }

    if mip_level >= image.mip_levels() {
        return Err(Box::new(ValidationError {
            context: "mip_level".into(),
            problem: "is not less than the number of mip levels of the image".into(),
            vuids: vuids.mip_level,
            ..Default::default()
        }));
    }

    if array_layers.is_empty() {
        return Err(Box::new(ValidationError {
            context: "array_layers".into(),
            problem: "is empty".into(),
            vuids: &["VUID-VkImageSubresourceLayers-layerCount-01700"],
            ..Default::default()
        }));
    }

    if array_layers.end > image.array_layers() {
        return Err(Box::new(ValidationError {
            context: "array_layers.end".into(),
            problem: "is greater than the number of array layers of the image".into(),
            vuids: vuids.array_layers,
            ..Default::default()
        }));
    }

    Ok(())
}

/// Returns the format that the texels of `aspects` are stored in: the plane format for a plane
/// aspect, the format itself otherwise.
fn aspect_format(format: Format, aspects: ImageAspects) -> Format {
    aspects
        .plane_index()
        .and_then(|plane| format.plane_compatible_format(plane))
        .unwrap_or(format)
}

/// Checks that a region of `offset` and `extent`, in texels, lies within the subresource, and
/// that its corners are aligned to texel blocks. Returns the extent of the subresource.
fn validate_region_extent(
    image: &ImageState,
    subresource: &ImageSubresourceLayers,
    offset: [u32; 3],
    extent: [u32; 3],
    vuids: &RegionVuids,
    context: &'static str,
) -> Result<[u32; 3], Box<ValidationError>> {
    let level_extent = image
        .subresource_extent(subresource.mip_level, subresource.aspects)
        .ok_or_else(|| {
            Box::new(ValidationError {
                context: "mip_level".into(),
                problem: "is not less than the number of mip levels of the image".into(),
                vuids: vuids.subresource.mip_level,
                ..Default::default()
            })
        })?;

    let image_type = image.image_type();

    if image_type == ImageType::Dim1d && (offset[1] != 0 || extent[1] != 1) {
        return Err(Box::new(ValidationError {
            context: context.into(),
            problem: "the image is 1D, but the region's y offset is not 0 or its height is \
                not 1"
                .into(),
            vuids: vuids.extent.y_1d,
            ..Default::default()
        }));
    }

    if matches!(image_type, ImageType::Dim1d | ImageType::Dim2d)
        && (offset[2] != 0 || extent[2] != 1)
    {
        return Err(Box::new(ValidationError {
            context: context.into(),
            problem: "the image is 1D or 2D, but the region's z offset is not 0 or its depth is \
                not 1"
                .into(),
            vuids: vuids.extent.z_2d,
            ..Default::default()
        }));
    }

    let axis_vuids = [vuids.extent.x, vuids.extent.y, vuids.extent.z];

    for axis in 0..3 {
        if offset[axis] as u64 + extent[axis] as u64 > level_extent[axis] as u64 {
            return Err(Box::new(ValidationError {
                context: context.into(),
                problem: format!(
                    "the region's offset ({}) plus extent ({}) along axis {} is greater than \
                    the extent of the subresource ({})",
                    offset[axis], extent[axis], axis, level_extent[axis],
                )
                .into(),
                vuids: axis_vuids[axis],
                ..Default::default()
            }));
        }
    }

    if let Some(block_vuids) = vuids.block {
        let format = aspect_format(image.format(), subresource.aspects);
        validate_block_alignment(format, level_extent, offset, extent, &block_vuids, context)?;
    }

    Ok(level_extent)
}

/// Checks that a region starts on a texel block boundary, and that each dimension of its extent
/// is a multiple of the block size or reaches the edge of the subresource.
fn validate_block_alignment(
    format: Format,
    level_extent: [u32; 3],
    offset: [u32; 3],
    extent: [u32; 3],
    vuids: &BlockVuids,
    context: &'static str,
) -> Result<(), Box<ValidationError>> {
    let block_extent = format.block_extent();

    if block_extent == [1, 1, 1] {
        return Ok(());
    }

    if (0..3).any(|axis| offset[axis] % block_extent[axis] != 0) {
        return Err(Box::new(ValidationError {
            context: context.into(),
            problem: format!(
                "the region's offset {:?} is not a multiple of the texel block extent {:?} of \
                the format {:?}",
                offset, block_extent, format,
            )
            .into(),
            vuids: vuids.offset,
            ..Default::default()
        }));
    }

    let axis_vuids = [vuids.width, vuids.height, vuids.depth];
    let axis_names = ["width", "height", "depth"];

    for axis in 0..3 {
        if extent[axis] % block_extent[axis] != 0
            && offset[axis] + extent[axis] != level_extent[axis]
        {
            return Err(Box::new(ValidationError {
                context: context.into(),
                problem: format!(
                    "the region's {} ({}) is not a multiple of the texel block {} ({}) of the \
                    format {:?}, and the region does not reach the edge of the subresource",
                    axis_names[axis],
                    extent[axis],
                    axis_names[axis],
                    block_extent[axis],
                    format,
                )
                .into(),
                vuids: axis_vuids[axis],
                ..Default::default()
            }));
        }
    }

    Ok(())
}

/// Parameters to clear a color image.
#[derive(Clone, Debug)]
pub struct ClearColorImageInfo {
    pub image: ash::vk::Image,

    /// The layout used for `image` during the clear.
    ///
    /// The default value is [`ImageLayout::TransferDstOptimal`].
    pub image_layout: ImageLayout,

    /// The subresource ranges to clear, as given by the application.
    pub regions: SmallVec<[ImageSubresourceRange; 1]>,

    pub _ne: crate::NonExhaustive,
}

impl ClearColorImageInfo {
    /// Returns a `ClearColorImageInfo` that clears the whole of `image`.
    #[inline]
    pub fn image(image: ash::vk::Image) -> Self {
        Self {
            image,
            image_layout: ImageLayout::TransferDstOptimal,
            regions: smallvec::smallvec![ImageSubresourceRange::whole(ImageAspects::COLOR)],
            _ne: crate::NonExhaustive(()),
        }
    }

    fn validate_image(&self, image: &ImageState) -> Result<(), Box<ValidationError>> {
        validate_image_usage(
            image,
            ImageUsage::TRANSFER_DST,
            "image",
            &["VUID-vkCmdClearColorImage-image-00002"],
        )?;

        let format = image.format();

        if format.is_depth_or_stencil() {
            return Err(Box::new(ValidationError {
                context: "image.format()".into(),
                problem: "is a depth/stencil format".into(),
                vuids: &["VUID-vkCmdClearColorImage-image-00007"],
                ..Default::default()
            }));
        }

        if format.is_compressed() {
            return Err(Box::new(ValidationError {
                context: "image.format()".into(),
                problem: "is a compressed format".into(),
                vuids: &["VUID-vkCmdClearColorImage-image-00007"],
                ..Default::default()
            }));
        }

        if format.ycbcr_chroma_sampling().is_some() {
            return Err(Box::new(ValidationError {
                context: "image.format()".into(),
                problem: "is a YCbCr format".into(),
                vuids: &["VUID-vkCmdClearColorImage-image-01545"],
                ..Default::default()
            }));
        }

        Ok(())
    }

    pub(crate) fn validate(
        &self,
        command_buffer: &CommandBufferState,
        objects: &ObjectTables,
        config: &ValidationConfig,
        report: &mut Report,
    ) {
        let object = ObjectHandle::new(command_buffer.handle());

        if report.error(
            object,
            validate_not_in_render_pass(command_buffer, &["VUID-vkCmdClearColorImage-renderpass"]),
        ) {
            return;
        }

        let image = match lookup(
            &objects.images,
            self.image,
            "image",
            &["VUID-vkCmdClearColorImage-image-parameter"],
        ) {
            Ok(image) => image,
            Err(err) => {
                report.error(object, Err(err));
                return;
            }
        };

        if report.error(object, self.validate_image(image)) {
            return;
        }

        let mut ranges: SmallVec<[ImageSubresourceRange; 1]> = SmallVec::new();

        for (region_index, range) in self.regions.iter().enumerate() {
            let result = image
                .validate_subresource_range(range, RangeVuids::CLEAR_COLOR)
                .and_then(|()| {
                    if range.aspects != ImageAspects::COLOR {
                        return Err(Box::new(ValidationError {
                            context: "aspects".into(),
                            problem: "is not `ImageAspects::COLOR`".into(),
                            vuids: &["VUID-vkCmdClearColorImage-aspectMask-02498"],
                            ..Default::default()
                        }));
                    }

                    Ok(())
                })
                .map_err(|err| err.add_context(format!("regions[{}]", region_index)));

            if !report.error(object, result) {
                ranges.push(image.normalize_range(range));
            }
        }

        verify_image_layout(
            command_buffer,
            image,
            &ranges,
            self.image_layout,
            ImageLayout::TransferDstOptimal,
            "image_layout",
            LayoutVuids {
                mismatch: &["VUID-vkCmdClearColorImage-imageLayout-00004"],
                invalid: &["VUID-vkCmdClearColorImage-imageLayout-01394"],
            },
            config,
            report,
        );
    }

    pub(crate) fn record(
        &self,
        command_buffer: &mut CommandBufferState,
        objects: &mut ObjectTables,
    ) {
        command_buffer.bind_image(&mut objects.images, self.image);

        if let Some(image) = objects.images.get(&self.image) {
            for range in &self.regions {
                command_buffer.set_image_initial_layout(image, range, self.image_layout);
            }
        }
    }
}

/// Parameters to clear a depth/stencil image.
#[derive(Clone, Debug)]
pub struct ClearDepthStencilImageInfo {
    pub image: ash::vk::Image,

    /// The default value is [`ImageLayout::TransferDstOptimal`].
    pub image_layout: ImageLayout,

    pub regions: SmallVec<[ImageSubresourceRange; 1]>,

    pub _ne: crate::NonExhaustive,
}

impl ClearDepthStencilImageInfo {
    /// Returns a `ClearDepthStencilImageInfo` that clears every aspect of the whole of `image`.
    #[inline]
    pub fn image(image: ash::vk::Image, aspects: ImageAspects) -> Self {
        Self {
            image,
            image_layout: ImageLayout::TransferDstOptimal,
            regions: smallvec::smallvec![ImageSubresourceRange::whole(aspects)],
            _ne: crate::NonExhaustive(()),
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

        if report.error(
            object,
            validate_not_in_render_pass(
                command_buffer,
                &["VUID-vkCmdClearDepthStencilImage-renderpass"],
            ),
        ) {
            return;
        }

        let image = match lookup(
            &objects.images,
            self.image,
            "image",
            &["VUID-vkCmdClearDepthStencilImage-image-parameter"],
        ) {
            Ok(image) => image,
            Err(err) => {
                report.error(object, Err(err));
                return;
            }
        };

        if !image.format().is_depth_or_stencil() {
            report.error(
                object,
                Err(Box::new(ValidationError {
                    context: "image.format()".into(),
                    problem: "is not a depth/stencil format".into(),
                    vuids: &["VUID-vkCmdClearDepthStencilImage-image-00014"],
                    ..Default::default()
                })),
            );
            return;
        }

        if report.error(
            object,
            validate_image_usage(
                image,
                ImageUsage::TRANSFER_DST,
                "image",
                &["VUID-vkCmdClearDepthStencilImage-pRanges-02660"],
            ),
        ) {
            return;
        }

        let mut ranges: SmallVec<[ImageSubresourceRange; 1]> = SmallVec::new();

        for (region_index, range) in self.regions.iter().enumerate() {
            let result = (|| {
                if !(ImageAspects::DEPTH | ImageAspects::STENCIL).contains(range.aspects) {
                    return Err(Box::new(ValidationError {
                        context: "aspects".into(),
                        problem: "contains aspects other than `ImageAspects::DEPTH` and \
                            `ImageAspects::STENCIL`"
                            .into(),
                        vuids: &["VUID-vkCmdClearDepthStencilImage-aspectMask-02824"],
                        ..Default::default()
                    }));
                }

                image.validate_subresource_range(range, RangeVuids::CLEAR_DEPTH_STENCIL)
            })()
            .map_err(|err| err.add_context(format!("regions[{}]", region_index)));

            if !report.error(object, result) {
                ranges.push(image.normalize_range(range));
            }
        }

        verify_image_layout(
            command_buffer,
            image,
            &ranges,
            self.image_layout,
            ImageLayout::TransferDstOptimal,
            "image_layout",
            LayoutVuids {
                mismatch: &["VUID-vkCmdClearDepthStencilImage-imageLayout-00011"],
                invalid: &["VUID-vkCmdClearDepthStencilImage-imageLayout-00012"],
            },
            config,
            report,
        );
    }

    pub(crate) fn record(
        &self,
        command_buffer: &mut CommandBufferState,
        objects: &mut ObjectTables,
    ) {
        command_buffer.bind_image(&mut objects.images, self.image);

        if let Some(image) = objects.images.get(&self.image) {
            for range in &self.regions {
                command_buffer.set_image_initial_layout(image, range, self.image_layout);
            }
        }
    }
}

/// A region of an image copy.
#[derive(Clone, Debug)]
pub struct ImageCopy {
    pub src_subresource: ImageSubresourceLayers,
    pub src_offset: [u32; 3],
    pub dst_subresource: ImageSubresourceLayers,
    pub dst_offset: [u32; 3],

    /// The extent of the region, in texels of the source image.
    pub extent: [u32; 3],

    pub _ne: crate::NonExhaustive,
}

impl Default for ImageCopy {
    #[inline]
    fn default() -> Self {
        Self {
            src_subresource: ImageSubresourceLayers {
                aspects: ImageAspects::COLOR,
                mip_level: 0,
                array_layers: 0..1,
            },
            src_offset: [0; 3],
            dst_subresource: ImageSubresourceLayers {
                aspects: ImageAspects::COLOR,
                mip_level: 0,
                array_layers: 0..1,
            },
            dst_offset: [0; 3],
            extent: [0; 3],
            _ne: crate::NonExhaustive(()),
        }
    }
}

const COPY_SRC_REGION_VUIDS: RegionVuids = RegionVuids {
    subresource: SubresourceVuids {
        aspects: &["VUID-vkCmdCopyImage-aspectMask-00142"],
        mip_level: &["VUID-vkCmdCopyImage-srcSubresource-07967"],
        array_layers: &["VUID-vkCmdCopyImage-srcSubresource-07968"],
    },
    extent: ExtentVuids {
        x: &["VUID-vkCmdCopyImage-srcOffset-00144"],
        y: &["VUID-vkCmdCopyImage-srcOffset-00145"],
        z: &["VUID-vkCmdCopyImage-srcOffset-00147"],
        y_1d: &["VUID-vkCmdCopyImage-srcImage-00146"],
        z_2d: &["VUID-vkCmdCopyImage-srcImage-01785"],
    },
    block: Some(BlockVuids {
        offset: &["VUID-VkImageCopy-srcOffset-00157"],
        width: &["VUID-VkImageCopy-extent-00158"],
        height: &["VUID-VkImageCopy-extent-00159"],
        depth: &["VUID-VkImageCopy-extent-00160"],
    }),
};

const COPY_DST_REGION_VUIDS: RegionVuids = RegionVuids {
    subresource: SubresourceVuids {
        aspects: &["VUID-vkCmdCopyImage-aspectMask-00143"],
        mip_level: &["VUID-vkCmdCopyImage-dstSubresource-07967"],
        array_layers: &["VUID-vkCmdCopyImage-dstSubresource-07968"],
    },
    extent: ExtentVuids {
        x: &["VUID-vkCmdCopyImage-dstOffset-00150"],
        y: &["VUID-vkCmdCopyImage-dstOffset-00151"],
        z: &["VUID-vkCmdCopyImage-dstOffset-00153"],
        y_1d: &["VUID-vkCmdCopyImage-dstImage-00152"],
        z_2d: &["VUID-vkCmdCopyImage-dstImage-01786"],
    },
    block: Some(BlockVuids {
        offset: &["VUID-VkImageCopy-dstOffset-00162"],
        width: &["VUID-VkImageCopy-extent-00163"],
        height: &["VUID-VkImageCopy-extent-00164"],
        depth: &["VUID-VkImageCopy-extent-00165"],
    }),
};

/// Parameters to copy data between two images.
#[derive(Clone, Debug)]
pub struct CopyImageInfo {
    pub src_image: ash::vk::Image,

    /// The default value is [`ImageLayout::TransferSrcOptimal`].
    pub src_image_layout: ImageLayout,

    pub dst_image: ash::vk::Image,

    /// The default value is [`ImageLayout::TransferDstOptimal`].
    pub dst_image_layout: ImageLayout,

    pub regions: SmallVec<[ImageCopy; 1]>,

    pub _ne: crate::NonExhaustive,
}

impl CopyImageInfo {
    #[inline]
    pub fn images(src_image: ash::vk::Image, dst_image: ash::vk::Image) -> Self {
        Self {
            src_image,
            src_image_layout: ImageLayout::TransferSrcOptimal,
            dst_image,
            dst_image_layout: ImageLayout::TransferDstOptimal,
            regions: SmallVec::new(),
            _ne: crate::NonExhaustive(()),
        }
    }

    fn validate_images(
        &self,
        src_image: &ImageState,
        dst_image: &ImageState,
    ) -> Result<(), Box<ValidationError>> {
        validate_image_usage(
            src_image,
            ImageUsage::TRANSFER_SRC,
            "src_image",
            &["VUID-vkCmdCopyImage-srcImage-00126"],
        )?;
        validate_image_usage(
            dst_image,
            ImageUsage::TRANSFER_DST,
            "dst_image",
            &["VUID-vkCmdCopyImage-dstImage-00131"],
        )?;

        if src_image.samples() != dst_image.samples() {
            return Err(Box::new(ValidationError {
                problem: format!(
                    "the sample count of `src_image` ({:?}) is not equal to the sample count of \
                    `dst_image` ({:?})",
                    src_image.samples(),
                    dst_image.samples(),
                )
                .into(),
                vuids: &["VUID-vkCmdCopyImage-srcImage-00136"],
                ..Default::default()
            }));
        }

        Ok(())
    }

    fn validate_region(
        region: &ImageCopy,
        src_image: &ImageState,
        dst_image: &ImageState,
        config: &ValidationConfig,
    ) -> Result<(), Box<ValidationError>> {
        let ImageCopy {
            ref src_subresource,
            src_offset,
            ref dst_subresource,
            dst_offset,
            extent,
            _ne: _,
        } = *region;

        validate_subresource_layers(src_image, src_subresource, &COPY_SRC_REGION_VUIDS.subresource)
            .map_err(|err| err.add_context("src_subresource"))?;
        validate_subresource_layers(dst_image, dst_subresource, &COPY_DST_REGION_VUIDS.subresource)
            .map_err(|err| err.add_context("dst_subresource"))?;

        let src_format = aspect_format(src_image.format(), src_subresource.aspects);
        let dst_format = aspect_format(dst_image.format(), dst_subresource.aspects);

        // The extent is given in source texels. Between formats with different block extents it
        // covers the same number of blocks in the destination.
        let src_block_extent = src_format.block_extent();
        let dst_block_extent = dst_format.block_extent();
        let dst_extent = if src_block_extent == dst_block_extent {
            extent
        } else {
            [0, 1, 2].map(|axis| {
                extent[axis].div_ceil(src_block_extent[axis]) * dst_block_extent[axis]
            })
        };

        validate_region_extent(
            src_image,
            src_subresource,
            src_offset,
            extent,
            &COPY_SRC_REGION_VUIDS,
            "src_offset",
        )?;
        validate_region_extent(
            dst_image,
            dst_subresource,
            dst_offset,
            dst_extent,
            &COPY_DST_REGION_VUIDS,
            "dst_offset",
        )?;

        let src_multi_planar = src_image.format().is_multi_planar();
        let dst_multi_planar = dst_image.format().is_multi_planar();

        if !src_multi_planar && !dst_multi_planar {
            if src_subresource.aspects != dst_subresource.aspects {
                return Err(Box::new(ValidationError {
                    problem: "`src_subresource.aspects` does not equal `dst_subresource.aspects`"
                        .into(),
                    vuids: &["VUID-vkCmdCopyImage-srcImage-01551"],
                    ..Default::default()
                }));
            }

            if (src_format.is_depth_or_stencil() || dst_format.is_depth_or_stencil())
                && src_format != dst_format
            {
                return Err(Box::new(ValidationError {
                    problem: format!(
                        "one of the formats is a depth/stencil format, and the formats \
                        ({:?} and {:?}) are not equal",
                        src_format, dst_format,
                    )
                    .into(),
                    vuids: &["VUID-vkCmdCopyImage-srcImage-01548"],
                    ..Default::default()
                }));
            }
        }

        if src_format.block_size_for_aspect(src_subresource.aspects)
            != dst_format.block_size_for_aspect(dst_subresource.aspects)
        {
            return Err(Box::new(ValidationError {
                problem: format!(
                    "the texel block size of the source format {:?} is not equal to the texel \
                    block size of the destination format {:?}",
                    src_format, dst_format,
                )
                .into(),
                vuids: if src_multi_planar || dst_multi_planar {
                    &["VUID-vkCmdCopyImage-None-01549"]
                } else {
                    &["VUID-vkCmdCopyImage-srcImage-01548"]
                },
                ..Default::default()
            }));
        }

        let src_is_3d = src_image.image_type() == ImageType::Dim3d;
        let dst_is_3d = dst_image.image_type() == ImageType::Dim3d;
        let src_layer_count = src_subresource.array_layers.len() as u32;
        let dst_layer_count = dst_subresource.array_layers.len() as u32;

        match (src_is_3d, dst_is_3d) {
            (false, false) => {
                if src_layer_count != dst_layer_count {
                    return Err(Box::new(ValidationError {
                        problem: "the number of layers of `src_subresource` and \
                            `dst_subresource` are not equal"
                            .into(),
                        vuids: &["VUID-vkCmdCopyImage-srcImage-08793"],
                        ..Default::default()
                    }));
                }
            }
            (true, true) => (),
            (true, false) | (false, true) => {
                if !config.extensions.khr_maintenance1 {
                    return Err(Box::new(ValidationError {
                        problem: "one image is 3D and the other is not".into(),
                        requires_one_of: crate::RequiresOneOf(&[crate::RequiresAllOf(&[
                            crate::Requires::DeviceExtension("khr_maintenance1"),
                        ])]),
                        vuids: &["VUID-vkCmdCopyImage-apiVersion-07933"],
                        ..Default::default()
                    }));
                }

                if src_is_3d && extent[2] != dst_layer_count {
                    return Err(Box::new(ValidationError {
                        problem: "`src_image` is 3D, and the depth of the region does not equal \
                            the number of layers of `dst_subresource`"
                            .into(),
                        vuids: &["VUID-vkCmdCopyImage-srcImage-01791"],
                        ..Default::default()
                    }));
                }

                if dst_is_3d && dst_extent[2] != src_layer_count {
                    return Err(Box::new(ValidationError {
                        problem: "`dst_image` is 3D, and the depth of the region does not equal \
                            the number of layers of `src_subresource`"
                            .into(),
                        vuids: &["VUID-vkCmdCopyImage-dstImage-01792"],
                        ..Default::default()
                    }));
                }
            }
        }

        Ok(())
    }

    pub(crate) fn validate(
        &self,
        command_buffer: &CommandBufferState,
        objects: &ObjectTables,
        config: &ValidationConfig,
        report: &mut Report,
    ) {
        let object = ObjectHandle::new(command_buffer.handle());

        if report.error(
            object,
            validate_not_in_render_pass(command_buffer, &["VUID-vkCmdCopyImage-renderpass"]),
        ) {
            return;
        }

        let images = lookup(
            &objects.images,
            self.src_image,
            "src_image",
            &["VUID-vkCmdCopyImage-srcImage-parameter"],
        )
        .and_then(|src_image| {
            lookup(
                &objects.images,
                self.dst_image,
                "dst_image",
                &["VUID-vkCmdCopyImage-dstImage-parameter"],
            )
            .map(|dst_image| (src_image, dst_image))
        });
        let (src_image, dst_image) = match images {
            Ok(images) => images,
            Err(err) => {
                report.error(object, Err(err));
                return;
            }
        };

        if report.error(object, self.validate_images(src_image, dst_image)) {
            return;
        }

        let mut src_ranges: SmallVec<[ImageSubresourceRange; 1]> = SmallVec::new();
        let mut dst_ranges: SmallVec<[ImageSubresourceRange; 1]> = SmallVec::new();

        for (region_index, region) in self.regions.iter().enumerate() {
            let result = Self::validate_region(region, src_image, dst_image, config)
                .map_err(|err| err.add_context(format!("regions[{}]", region_index)));

            if !report.error(object, result) {
                src_ranges.push(src_image.normalize_range(&region.src_subresource.clone().into()));
                dst_ranges.push(dst_image.normalize_range(&region.dst_subresource.clone().into()));
            }
        }

        verify_image_layout(
            command_buffer,
            src_image,
            &src_ranges,
            self.src_image_layout,
            ImageLayout::TransferSrcOptimal,
            "src_image_layout",
            LayoutVuids {
                mismatch: &["VUID-vkCmdCopyImage-srcImageLayout-00128"],
                invalid: &["VUID-vkCmdCopyImage-srcImageLayout-01917"],
            },
            config,
            report,
        );
        verify_image_layout(
            command_buffer,
            dst_image,
            &dst_ranges,
            self.dst_image_layout,
            ImageLayout::TransferDstOptimal,
            "dst_image_layout",
            LayoutVuids {
                mismatch: &["VUID-vkCmdCopyImage-dstImageLayout-00133"],
                invalid: &["VUID-vkCmdCopyImage-dstImageLayout-01395"],
            },
            config,
            report,
        );
    }

    pub(crate) fn record(
        &self,
        command_buffer: &mut CommandBufferState,
        objects: &mut ObjectTables,
    ) {
        command_buffer.bind_image(&mut objects.images, self.src_image);
        command_buffer.bind_image(&mut objects.images, self.dst_image);

        for region in &self.regions {
            if let Some(src_image) = objects.images.get(&self.src_image) {
                command_buffer.set_image_initial_layout(
                    src_image,
                    &region.src_subresource.clone().into(),
                    self.src_image_layout,
                );
            }

            if let Some(dst_image) = objects.images.get(&self.dst_image) {
                command_buffer.set_image_initial_layout(
                    dst_image,
                    &region.dst_subresource.clone().into(),
                    self.dst_image_layout,
                );
            }
        }
    }
}

/// A region of an image blit.
#[derive(Clone, Debug)]
pub struct ImageBlit {
    pub src_subresource: ImageSubresourceLayers,

    /// Two opposite corners of the source region.
    pub src_offsets: [[u32; 3]; 2],

    pub dst_subresource: ImageSubresourceLayers,

    /// Two opposite corners of the destination region.
    pub dst_offsets: [[u32; 3]; 2],

    pub _ne: crate::NonExhaustive,
}

impl Default for ImageBlit {
    #[inline]
    fn default() -> Self {
        Self {
            src_subresource: ImageSubresourceLayers {
                aspects: ImageAspects::COLOR,
                mip_level: 0,
                array_layers: 0..1,
            },
            src_offsets: [[0; 3]; 2],
            dst_subresource: ImageSubresourceLayers {
                aspects: ImageAspects::COLOR,
                mip_level: 0,
                array_layers: 0..1,
            },
            dst_offsets: [[0; 3]; 2],
            _ne: crate::NonExhaustive(()),
        }
    }
}

const BLIT_SRC_REGION_VUIDS: RegionVuids = RegionVuids {
    subresource: SubresourceVuids {
        aspects: &["VUID-vkCmdBlitImage-aspectMask-00241"],
        mip_level: &["VUID-vkCmdBlitImage-srcSubresource-01705"],
        array_layers: &["VUID-vkCmdBlitImage-srcSubresource-01707"],
    },
    extent: ExtentVuids {
        x: &["VUID-vkCmdBlitImage-srcOffset-00243"],
        y: &["VUID-vkCmdBlitImage-srcOffset-00244"],
        z: &["VUID-vkCmdBlitImage-srcOffset-00246"],
        y_1d: &["VUID-vkCmdBlitImage-srcImage-00245"],
        z_2d: &["VUID-vkCmdBlitImage-srcImage-00247"],
    },
    block: None,
};

const BLIT_DST_REGION_VUIDS: RegionVuids = RegionVuids {
    subresource: SubresourceVuids {
        aspects: &["VUID-vkCmdBlitImage-aspectMask-00242"],
        mip_level: &["VUID-vkCmdBlitImage-dstSubresource-01706"],
        array_layers: &["VUID-vkCmdBlitImage-dstSubresource-01708"],
    },
    extent: ExtentVuids {
        x: &["VUID-vkCmdBlitImage-dstOffset-00248"],
        y: &["VUID-vkCmdBlitImage-dstOffset-00249"],
        z: &["VUID-vkCmdBlitImage-dstOffset-00251"],
        y_1d: &["VUID-vkCmdBlitImage-dstImage-00250"],
        z_2d: &["VUID-vkCmdBlitImage-dstImage-00252"],
    },
    block: None,
};

/// Converts two opposite corners into an offset and extent.
fn corners_to_region(corners: [[u32; 3]; 2]) -> ([u32; 3], [u32; 3]) {
    let [a, b] = corners;
    let offset = [0, 1, 2].map(|axis| a[axis].min(b[axis]));
    let extent = [0, 1, 2].map(|axis| a[axis].abs_diff(b[axis]));

    (offset, extent)
}

/// Parameters to blit between two images.
#[derive(Clone, Debug)]
pub struct BlitImageInfo {
    pub src_image: ash::vk::Image,

    /// The default value is [`ImageLayout::TransferSrcOptimal`].
    pub src_image_layout: ImageLayout,

    pub dst_image: ash::vk::Image,

    /// The default value is [`ImageLayout::TransferDstOptimal`].
    pub dst_image_layout: ImageLayout,

    pub regions: SmallVec<[ImageBlit; 1]>,

    pub _ne: crate::NonExhaustive,
}

impl BlitImageInfo {
    #[inline]
    pub fn images(src_image: ash::vk::Image, dst_image: ash::vk::Image) -> Self {
        Self {
            src_image,
            src_image_layout: ImageLayout::TransferSrcOptimal,
            dst_image,
            dst_image_layout: ImageLayout::TransferDstOptimal,
            regions: SmallVec::new(),
            _ne: crate::NonExhaustive(()),
        }
    }

    fn validate_images(
        &self,
        src_image: &ImageState,
        dst_image: &ImageState,
    ) -> Result<(), Box<ValidationError>> {
        validate_image_usage(
            src_image,
            ImageUsage::TRANSFER_SRC,
            "src_image",
            &["VUID-vkCmdBlitImage-srcImage-00219"],
        )?;
        validate_image_usage(
            dst_image,
            ImageUsage::TRANSFER_DST,
            "dst_image",
            &["VUID-vkCmdBlitImage-dstImage-00224"],
        )?;

        if src_image.samples() != SampleCount::Sample1 {
            return Err(Box::new(ValidationError {
                context: "src_image.samples()".into(),
                problem: "is not `SampleCount::Sample1`".into(),
                vuids: &["VUID-vkCmdBlitImage-srcImage-00233"],
                ..Default::default()
            }));
        }

        if dst_image.samples() != SampleCount::Sample1 {
            return Err(Box::new(ValidationError {
                context: "dst_image.samples()".into(),
                problem: "is not `SampleCount::Sample1`".into(),
                vuids: &["VUID-vkCmdBlitImage-dstImage-00234"],
                ..Default::default()
            }));
        }

        let src_format = src_image.format();
        let dst_format = dst_image.format();

        if (src_format.is_depth_or_stencil() || dst_format.is_depth_or_stencil())
            && src_format != dst_format
        {
            return Err(Box::new(ValidationError {
                problem: "one of the images has a depth/stencil format, and the formats of the \
                    images are not equal"
                    .into(),
                vuids: &["VUID-vkCmdBlitImage-srcImage-00231"],
                ..Default::default()
            }));
        }

        let is_sint = |format: Format| format.type_color() == Some(NumericType::SINT);
        let is_uint = |format: Format| format.type_color() == Some(NumericType::UINT);

        if is_sint(src_format) != is_sint(dst_format) {
            return Err(Box::new(ValidationError {
                problem: "one of the images has a signed integer format, but the other does not"
                    .into(),
                vuids: &["VUID-vkCmdBlitImage-srcImage-00229"],
                ..Default::default()
            }));
        }

        if is_uint(src_format) != is_uint(dst_format) {
            return Err(Box::new(ValidationError {
                problem: "one of the images has an unsigned integer format, but the other does \
                    not"
                .into(),
                vuids: &["VUID-vkCmdBlitImage-srcImage-00230"],
                ..Default::default()
            }));
        }

        Ok(())
    }

    fn validate_region(
        region: &ImageBlit,
        src_image: &ImageState,
        dst_image: &ImageState,
    ) -> Result<(), Box<ValidationError>> {
        let ImageBlit {
            ref src_subresource,
            src_offsets,
            ref dst_subresource,
            dst_offsets,
            _ne: _,
        } = *region;

        validate_subresource_layers(src_image, src_subresource, &BLIT_SRC_REGION_VUIDS.subresource)
            .map_err(|err| err.add_context("src_subresource"))?;
        validate_subresource_layers(dst_image, dst_subresource, &BLIT_DST_REGION_VUIDS.subresource)
            .map_err(|err| err.add_context("dst_subresource"))?;

        if src_subresource.aspects != dst_subresource.aspects {
            return Err(Box::new(ValidationError {
                problem: "`src_subresource.aspects` does not equal `dst_subresource.aspects`"
                    .into(),
                vuids: &["VUID-VkImageBlit-aspectMask-00238"],
                ..Default::default()
            }));
        }

        let (src_offset, src_extent) = corners_to_region(src_offsets);
        let (dst_offset, dst_extent) = corners_to_region(dst_offsets);

        // A blit of a 1D or 2D image covers exactly one texel along the unused axes.
        let unit = |image: &ImageState, mut extent: [u32; 3]| {
            if image.image_type() == ImageType::Dim1d && extent[1] == 0 {
                extent[1] = 1;
            }
            if image.image_type() != ImageType::Dim3d && extent[2] == 0 {
                extent[2] = 1;
            }
            extent
        };

        validate_region_extent(
            src_image,
            src_subresource,
            src_offset,
            unit(src_image, src_extent),
            &BLIT_SRC_REGION_VUIDS,
            "src_offsets",
        )?;
        validate_region_extent(
            dst_image,
            dst_subresource,
            dst_offset,
            unit(dst_image, dst_extent),
            &BLIT_DST_REGION_VUIDS,
            "dst_offsets",
        )?;

        if src_image.image_type() != ImageType::Dim3d
            && dst_image.image_type() != ImageType::Dim3d
            && src_subresource.array_layers.len() != dst_subresource.array_layers.len()
        {
            return Err(Box::new(ValidationError {
                problem: "the number of layers of `src_subresource` and `dst_subresource` are \
                    not equal"
                    .into(),
                vuids: &["VUID-VkImageBlit-layerCount-08800"],
                ..Default::default()
            }));
        }

        Ok(())
    }

    pub(crate) fn validate(
        &self,
        command_buffer: &CommandBufferState,
        objects: &ObjectTables,
        config: &ValidationConfig,
        report: &mut Report,
    ) {
        let object = ObjectHandle::new(command_buffer.handle());

        if report.error(
            object,
            validate_not_in_render_pass(command_buffer, &["VUID-vkCmdBlitImage-renderpass"]),
        ) {
            return;
        }

        let images = lookup(
            &objects.images,
            self.src_image,
            "src_image",
            &["VUID-vkCmdBlitImage-srcImage-parameter"],
        )
        .and_then(|src_image| {
            lookup(
                &objects.images,
                self.dst_image,
                "dst_image",
                &["VUID-vkCmdBlitImage-dstImage-parameter"],
            )
            .map(|dst_image| (src_image, dst_image))
        });
        let (src_image, dst_image) = match images {
            Ok(images) => images,
            Err(err) => {
                report.error(object, Err(err));
                return;
            }
        };

        if report.error(object, self.validate_images(src_image, dst_image)) {
            return;
        }

        let mut src_ranges: SmallVec<[ImageSubresourceRange; 1]> = SmallVec::new();
        let mut dst_ranges: SmallVec<[ImageSubresourceRange; 1]> = SmallVec::new();

        for (region_index, region) in self.regions.iter().enumerate() {
            let result = Self::validate_region(region, src_image, dst_image)
                .map_err(|err| err.add_context(format!("regions[{}]", region_index)));

            if !report.error(object, result) {
                src_ranges.push(src_image.normalize_range(&region.src_subresource.clone().into()));
                dst_ranges.push(dst_image.normalize_range(&region.dst_subresource.clone().into()));
            }
        }

        verify_image_layout(
            command_buffer,
            src_image,
            &src_ranges,
            self.src_image_layout,
            ImageLayout::TransferSrcOptimal,
            "src_image_layout",
            LayoutVuids {
                mismatch: &["VUID-vkCmdBlitImage-srcImageLayout-00221"],
                invalid: &["VUID-vkCmdBlitImage-srcImageLayout-01398"],
            },
            config,
            report,
        );
        verify_image_layout(
            command_buffer,
            dst_image,
            &dst_ranges,
            self.dst_image_layout,
            ImageLayout::TransferDstOptimal,
            "dst_image_layout",
            LayoutVuids {
                mismatch: &["VUID-vkCmdBlitImage-dstImageLayout-00226"],
                invalid: &["VUID-vkCmdBlitImage-dstImageLayout-01399"],
            },
            config,
            report,
        );
    }

    pub(crate) fn record(
        &self,
        command_buffer: &mut CommandBufferState,
        objects: &mut ObjectTables,
    ) {
        command_buffer.bind_image(&mut objects.images, self.src_image);
        command_buffer.bind_image(&mut objects.images, self.dst_image);

        for region in &self.regions {
            if let Some(src_image) = objects.images.get(&self.src_image) {
                command_buffer.set_image_initial_layout(
                    src_image,
                    &region.src_subresource.clone().into(),
                    self.src_image_layout,
                );
            }

            if let Some(dst_image) = objects.images.get(&self.dst_image) {
                command_buffer.set_image_initial_layout(
                    dst_image,
                    &region.dst_subresource.clone().into(),
                    self.dst_image_layout,
                );
            }
        }
    }
}

/// A region of a multisample resolve.
#[derive(Clone, Debug)]
pub struct ImageResolve {
    pub src_subresource: ImageSubresourceLayers,
    pub src_offset: [u32; 3],
    pub dst_subresource: ImageSubresourceLayers,
    pub dst_offset: [u32; 3],
    pub extent: [u32; 3],
    pub _ne: crate::NonExhaustive,
}

impl Default for ImageResolve {
    #[inline]
    fn default() -> Self {
        Self {
            src_subresource: ImageSubresourceLayers {
                aspects: ImageAspects::COLOR,
                mip_level: 0,
                array_layers: 0..1,
            },
            src_offset: [0; 3],
            dst_subresource: ImageSubresourceLayers {
                aspects: ImageAspects::COLOR,
                mip_level: 0,
                array_layers: 0..1,
            },
            dst_offset: [0; 3],
            extent: [0; 3],
            _ne: crate::NonExhaustive(()),
        }
    }
}

const RESOLVE_SRC_REGION_VUIDS: RegionVuids = RegionVuids {
    subresource: SubresourceVuids {
        aspects: &["VUID-VkImageResolve-aspectMask-00266"],
        mip_level: &["VUID-vkCmdResolveImage-srcSubresource-01709"],
        array_layers: &["VUID-vkCmdResolveImage-srcSubresource-01711"],
    },
    extent: ExtentVuids {
        x: &["VUID-vkCmdResolveImage-srcOffset-00269"],
        y: &["VUID-vkCmdResolveImage-srcOffset-00270"],
        z: &["VUID-vkCmdResolveImage-srcOffset-00272"],
        y_1d: &["VUID-vkCmdResolveImage-srcImage-00271"],
        z_2d: &["VUID-vkCmdResolveImage-srcImage-00273"],
    },
    block: None,
};

const RESOLVE_DST_REGION_VUIDS: RegionVuids = RegionVuids {
    subresource: SubresourceVuids {
        aspects: &["VUID-VkImageResolve-aspectMask-00266"],
        mip_level: &["VUID-vkCmdResolveImage-dstSubresource-01710"],
        array_layers: &["VUID-vkCmdResolveImage-dstSubresource-01712"],
    },
    extent: ExtentVuids {
        x: &["VUID-vkCmdResolveImage-dstOffset-00274"],
        y: &["VUID-vkCmdResolveImage-dstOffset-00275"],
        z: &["VUID-vkCmdResolveImage-dstOffset-00277"],
        y_1d: &["VUID-vkCmdResolveImage-dstImage-00276"],
        z_2d: &["VUID-vkCmdResolveImage-dstImage-00278"],
    },
    block: None,
};

/// Parameters to resolve a multisampled image into a single-sampled one.
#[derive(Clone, Debug)]
pub struct ResolveImageInfo {
    pub src_image: ash::vk::Image,

    /// The default value is [`ImageLayout::TransferSrcOptimal`].
    pub src_image_layout: ImageLayout,

    pub dst_image: ash::vk::Image,

    /// The default value is [`ImageLayout::TransferDstOptimal`].
    pub dst_image_layout: ImageLayout,

    pub regions: SmallVec<[ImageResolve; 1]>,

    pub _ne: crate::NonExhaustive,
}

impl ResolveImageInfo {
    #[inline]
    pub fn images(src_image: ash::vk::Image, dst_image: ash::vk::Image) -> Self {
        Self {
            src_image,
            src_image_layout: ImageLayout::TransferSrcOptimal,
            dst_image,
            dst_image_layout: ImageLayout::TransferDstOptimal,
            regions: SmallVec::new(),
            _ne: crate::NonExhaustive(()),
        }
    }

    fn validate_images(
        &self,
        src_image: &ImageState,
        dst_image: &ImageState,
    ) -> Result<(), Box<ValidationError>> {
        if src_image.samples() == SampleCount::Sample1 {
            return Err(Box::new(ValidationError {
                context: "src_image.samples()".into(),
                problem: "is `SampleCount::Sample1`".into(),
                vuids: &["VUID-vkCmdResolveImage-srcImage-00257"],
                ..Default::default()
            }));
        }

        if dst_image.samples() != SampleCount::Sample1 {
            return Err(Box::new(ValidationError {
                context: "dst_image.samples()".into(),
                problem: "is not `SampleCount::Sample1`".into(),
                vuids: &["VUID-vkCmdResolveImage-dstImage-00259"],
                ..Default::default()
            }));
        }

        if src_image.format() != dst_image.format() {
            return Err(Box::new(ValidationError {
                problem: "`src_image.format()` does not equal `dst_image.format()`".into(),
                vuids: &["VUID-vkCmdResolveImage-srcImage-01386"],
                ..Default::default()
            }));
        }

        Ok(())
    }

    fn validate_region(
        region: &ImageResolve,
        src_image: &ImageState,
        dst_image: &ImageState,
    ) -> Result<(), Box<ValidationError>> {
        let ImageResolve {
            ref src_subresource,
            src_offset,
            ref dst_subresource,
            dst_offset,
            extent,
            _ne: _,
        } = *region;

        for (subresource, context) in [
            (src_subresource, "src_subresource.aspects"),
            (dst_subresource, "dst_subresource.aspects"),
        ] {
            if subresource.aspects != ImageAspects::COLOR {
                return Err(Box::new(ValidationError {
                    context: context.into(),
                    problem: "is not `ImageAspects::COLOR`".into(),
                    vuids: &["VUID-VkImageResolve-aspectMask-00266"],
                    ..Default::default()
                }));
            }
        }

        validate_subresource_layers(
            src_image,
            src_subresource,
            &RESOLVE_SRC_REGION_VUIDS.subresource,
        )
        .map_err(|err| err.add_context("src_subresource"))?;
        validate_subresource_layers(
            dst_image,
            dst_subresource,
            &RESOLVE_DST_REGION_VUIDS.subresource,
        )
        .map_err(|err| err.add_context("dst_subresource"))?;

        if src_subresource.array_layers.len() != dst_subresource.array_layers.len() {
            return Err(Box::new(ValidationError {
                problem: "the number of layers of `src_subresource` and `dst_subresource` are \
                    not equal"
                    .into(),
                vuids: &["VUID-VkImageResolve-layerCount-08803"],
                ..Default::default()
            }));
        }

        validate_region_extent(
            src_image,
            src_subresource,
            src_offset,
            extent,
            &RESOLVE_SRC_REGION_VUIDS,
            "src_offset",
        )?;
        validate_region_extent(
            dst_image,
            dst_subresource,
            dst_offset,
            extent,
            &RESOLVE_DST_REGION_VUIDS,
            "dst_offset",
        )?;

        Ok(())
    }

    pub(crate) fn validate(
        &self,
        command_buffer: &CommandBufferState,
        objects: &ObjectTables,
        config: &ValidationConfig,
        report: &mut Report,
    ) {
        let object = ObjectHandle::new(command_buffer.handle());

        if report.error(
            object,
            validate_not_in_render_pass(command_buffer, &["VUID-vkCmdResolveImage-renderpass"]),
        ) {
            return;
        }

        let images = lookup(
            &objects.images,
            self.src_image,
            "src_image",
            &["VUID-vkCmdResolveImage-srcImage-parameter"],
        )
        .and_then(|src_image| {
            lookup(
                &objects.images,
                self.dst_image,
                "dst_image",
                &["VUID-vkCmdResolveImage-dstImage-parameter"],
            )
            .map(|dst_image| (src_image, dst_image))
        });
        let (src_image, dst_image) = match images {
            Ok(images) => images,
            Err(err) => {
                report.error(object, Err(err));
                return;
            }
        };

        if report.error(object, self.validate_images(src_image, dst_image)) {
            return;
        }

        let mut src_ranges: SmallVec<[ImageSubresourceRange; 1]> = SmallVec::new();
        let mut dst_ranges: SmallVec<[ImageSubresourceRange; 1]> = SmallVec::new();

        for (region_index, region) in self.regions.iter().enumerate() {
            let result = Self::validate_region(region, src_image, dst_image)
                .map_err(|err| err.add_context(format!("regions[{}]", region_index)));

            if !report.error(object, result) {
                src_ranges.push(src_image.normalize_range(&region.src_subresource.clone().into()));
                dst_ranges.push(dst_image.normalize_range(&region.dst_subresource.clone().into()));
            }
        }

        verify_image_layout(
            command_buffer,
            src_image,
            &src_ranges,
            self.src_image_layout,
            ImageLayout::TransferSrcOptimal,
            "src_image_layout",
            LayoutVuids {
                mismatch: &["VUID-vkCmdResolveImage-srcImageLayout-00260"],
                invalid: &["VUID-vkCmdResolveImage-srcImageLayout-01400"],
            },
            config,
            report,
        );
        verify_image_layout(
            command_buffer,
            dst_image,
            &dst_ranges,
            self.dst_image_layout,
            ImageLayout::TransferDstOptimal,
            "dst_image_layout",
            LayoutVuids {
                mismatch: &["VUID-vkCmdResolveImage-dstImageLayout-00262"],
                invalid: &["VUID-vkCmdResolveImage-dstImageLayout-01401"],
            },
            config,
            report,
        );
    }

    pub(crate) fn record(
        &self,
        command_buffer: &mut CommandBufferState,
        objects: &mut ObjectTables,
    ) {
        command_buffer.bind_image(&mut objects.images, self.src_image);
        command_buffer.bind_image(&mut objects.images, self.dst_image);

        for region in &self.regions {
            if let Some(src_image) = objects.images.get(&self.src_image) {
                command_buffer.set_image_initial_layout(
                    src_image,
                    &region.src_subresource.clone().into(),
                    self.src_image_layout,
                );
            }

            if let Some(dst_image) = objects.images.get(&self.dst_image) {
                command_buffer.set_image_initial_layout(
                    dst_image,
                    &region.dst_subresource.clone().into(),
                    self.dst_image_layout,
                );
            }
        }
    }
}

/// A region of a copy between a buffer and an image.
#[derive(Clone, Debug)]
pub struct BufferImageCopy {
    pub buffer_offset: DeviceSize,

    /// The number of texels in a row of the buffer data, or 0 if rows are tightly packed.
    pub buffer_row_length: u32,

    /// The number of rows in an image of the buffer data, or 0 if images are tightly packed.
    pub buffer_image_height: u32,

    pub image_subresource: ImageSubresourceLayers,
    pub image_offset: [u32; 3],
    pub image_extent: [u32; 3],

    pub _ne: crate::NonExhaustive,
}

impl Default for BufferImageCopy {
    #[inline]
    fn default() -> Self {
        Self {
            buffer_offset: 0,
            buffer_row_length: 0,
            buffer_image_height: 0,
            image_subresource: ImageSubresourceLayers {
                aspects: ImageAspects::COLOR,
                mip_level: 0,
                array_layers: 0..1,
            },
            image_offset: [0; 3],
            image_extent: [0; 3],
            _ne: crate::NonExhaustive(()),
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct BufferImageVuids {
    region: RegionVuids,
    offset_alignment: &'static [&'static str],
    depth_stencil_offset_alignment: &'static [&'static str],
    buffer_size: &'static [&'static str],
}

const COPY_BUFFER_TO_IMAGE_VUIDS: BufferImageVuids = BufferImageVuids {
    region: RegionVuids {
        subresource: SubresourceVuids {
            aspects: &["VUID-vkCmdCopyBufferToImage-aspectMask-00211"],
            mip_level: &["VUID-vkCmdCopyBufferToImage-imageSubresource-07967"],
            array_layers: &["VUID-vkCmdCopyBufferToImage-imageSubresource-07968"],
        },
        extent: ExtentVuids {
            x: &["VUID-vkCmdCopyBufferToImage-pRegions-06223"],
            y: &["VUID-vkCmdCopyBufferToImage-pRegions-06224"],
            z: &["VUID-vkCmdCopyBufferToImage-imageOffset-00200"],
            y_1d: &["VUID-vkCmdCopyBufferToImage-dstImage-07979"],
            z_2d: &["VUID-vkCmdCopyBufferToImage-dstImage-07980"],
        },
        block: Some(BlockVuids {
            offset: &["VUID-vkCmdCopyBufferToImage-pRegions-07274"],
            width: &["VUID-vkCmdCopyBufferToImage-imageExtent-00207"],
            height: &["VUID-vkCmdCopyBufferToImage-imageExtent-00208"],
            depth: &["VUID-vkCmdCopyBufferToImage-imageExtent-00209"],
        }),
    },
    offset_alignment: &["VUID-vkCmdCopyBufferToImage-dstImage-07975"],
    depth_stencil_offset_alignment: &["VUID-vkCmdCopyBufferToImage-dstImage-07978"],
    buffer_size: &["VUID-vkCmdCopyBufferToImage-pRegions-00171"],
};

const COPY_IMAGE_TO_BUFFER_VUIDS: BufferImageVuids = BufferImageVuids {
    region: RegionVuids {
        subresource: SubresourceVuids {
            aspects: &["VUID-vkCmdCopyImageToBuffer-aspectMask-00211"],
            mip_level: &["VUID-vkCmdCopyImageToBuffer-imageSubresource-07967"],
            array_layers: &["VUID-vkCmdCopyImageToBuffer-imageSubresource-07968"],
        },
        extent: ExtentVuids {
            x: &["VUID-vkCmdCopyImageToBuffer-pRegions-06221"],
            y: &["VUID-vkCmdCopyImageToBuffer-pRegions-06222"],
            z: &["VUID-vkCmdCopyImageToBuffer-imageOffset-00200"],
            y_1d: &["VUID-vkCmdCopyImageToBuffer-srcImage-07979"],
            z_2d: &["VUID-vkCmdCopyImageToBuffer-srcImage-07980"],
        },
        block: Some(BlockVuids {
            offset: &["VUID-vkCmdCopyImageToBuffer-pRegions-07274"],
            width: &["VUID-vkCmdCopyImageToBuffer-imageExtent-00207"],
            height: &["VUID-vkCmdCopyImageToBuffer-imageExtent-00208"],
            depth: &["VUID-vkCmdCopyImageToBuffer-imageExtent-00209"],
        }),
    },
    offset_alignment: &["VUID-vkCmdCopyImageToBuffer-srcImage-07975"],
    depth_stencil_offset_alignment: &["VUID-vkCmdCopyImageToBuffer-srcImage-07978"],
    buffer_size: &["VUID-vkCmdCopyImageToBuffer-pRegions-00183"],
};

/// Checks a region of a copy between `buffer_size` bytes of buffer memory and `image`.
fn validate_buffer_image_region(
    region: &BufferImageCopy,
    buffer_size: DeviceSize,
    image: &ImageState,
    vuids: &BufferImageVuids,
) -> Result<(), Box<ValidationError>> {
    let BufferImageCopy {
        buffer_offset,
        buffer_row_length,
        buffer_image_height,
        ref image_subresource,
        image_offset,
        image_extent,
        _ne: _,
    } = *region;

    validate_subresource_layers(image, image_subresource, &vuids.region.subresource)
        .map_err(|err| err.add_context("image_subresource"))?;

    if image_subresource.aspects.count() != 1 {
        return Err(Box::new(ValidationError {
            context: "image_subresource.aspects".into(),
            problem: "does not contain exactly one aspect".into(),
            vuids: &["VUID-VkBufferImageCopy-aspectMask-09103"],
            ..Default::default()
        }));
    }

    validate_region_extent(
        image,
        image_subresource,
        image_offset,
        image_extent,
        &vuids.region,
        "image_offset",
    )?;

    if buffer_row_length != 0 && buffer_row_length < image_extent[0] {
        return Err(Box::new(ValidationError {
            context: "buffer_row_length".into(),
            problem: "is not 0, and is less than `image_extent[0]`".into(),
            vuids: &["VUID-VkBufferImageCopy-bufferRowLength-09101"],
            ..Default::default()
        }));
    }

    if buffer_image_height != 0 && buffer_image_height < image_extent[1] {
        return Err(Box::new(ValidationError {
            context: "buffer_image_height".into(),
            problem: "is not 0, and is less than `image_extent[1]`".into(),
            vuids: &["VUID-VkBufferImageCopy-bufferImageHeight-09102"],
            ..Default::default()
        }));
    }

    let aspect = image_subresource.aspects;
    let format = aspect_format(image.format(), aspect);
    let block_size = format.block_size_for_aspect(aspect).unwrap_or(1);

    if aspect.intersects(ImageAspects::DEPTH | ImageAspects::STENCIL) {
        if buffer_offset % 4 != 0 {
            return Err(Box::new(ValidationError {
                context: "buffer_offset".into(),
                problem: "the region accesses a depth or stencil aspect, and the offset is not \
                    a multiple of 4"
                    .into(),
                vuids: vuids.depth_stencil_offset_alignment,
                ..Default::default()
            }));
        }
    } else if buffer_offset % block_size != 0 {
        return Err(Box::new(ValidationError {
            context: "buffer_offset".into(),
            problem: format!(
                "is not a multiple of the texel block size of the format ({})",
                block_size,
            )
            .into(),
            vuids: vuids.offset_alignment,
            ..Default::default()
        }));
    }

    let [block_width, block_height, block_depth] = format.block_extent();
    let row_length = if buffer_row_length == 0 {
        image_extent[0]
    } else {
        buffer_row_length
    };
    let image_height = if buffer_image_height == 0 {
        image_extent[1]
    } else {
        buffer_image_height
    };

    let blocks_per_row = row_length.div_ceil(block_width) as DeviceSize;
    let rows_per_slice = image_height.div_ceil(block_height) as DeviceSize;
    let extent_blocks = [
        image_extent[0].div_ceil(block_width) as DeviceSize,
        image_extent[1].div_ceil(block_height) as DeviceSize,
        image_extent[2].div_ceil(block_depth) as DeviceSize,
    ];
    let slice_count = extent_blocks[2] * image_subresource.array_layers.len() as DeviceSize;

    if extent_blocks.contains(&0) || slice_count == 0 {
        return Ok(());
    }

    let block_count = (slice_count - 1) * rows_per_slice * blocks_per_row
        + (extent_blocks[1] - 1) * blocks_per_row
        + extent_blocks[0];
    let required_size = buffer_offset + block_count * block_size;

    if required_size > buffer_size {
        return Err(Box::new(ValidationError {
            problem: format!(
                "the region requires {} bytes of the buffer, but the buffer is only {} bytes \
                large",
                required_size, buffer_size,
            )
            .into(),
            vuids: vuids.buffer_size,
            ..Default::default()
        }));
    }

    Ok(())
}

/// Parameters to copy data from a buffer to an image.
#[derive(Clone, Debug)]
pub struct CopyBufferToImageInfo {
    pub src_buffer: ash::vk::Buffer,
    pub dst_image: ash::vk::Image,

    /// The default value is [`ImageLayout::TransferDstOptimal`].
    pub dst_image_layout: ImageLayout,

    pub regions: SmallVec<[BufferImageCopy; 1]>,

    pub _ne: crate::NonExhaustive,
}

impl CopyBufferToImageInfo {
    #[inline]
    pub fn buffer_image(src_buffer: ash::vk::Buffer, dst_image: ash::vk::Image) -> Self {
        Self {
            src_buffer,
            dst_image,
            dst_image_layout: ImageLayout::TransferDstOptimal,
            regions: SmallVec::new(),
            _ne: crate::NonExhaustive(()),
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

        if report.error(
            object,
            validate_not_in_render_pass(
                command_buffer,
                &["VUID-vkCmdCopyBufferToImage-renderpass"],
            ),
        ) {
            return;
        }

        let resources = lookup(
            &objects.buffers,
            self.src_buffer,
            "src_buffer",
            &["VUID-vkCmdCopyBufferToImage-srcBuffer-parameter"],
        )
        .and_then(|buffer| {
            lookup(
                &objects.images,
                self.dst_image,
                "dst_image",
                &["VUID-vkCmdCopyBufferToImage-dstImage-parameter"],
            )
            .map(|image| (buffer, image))
        });
        let (buffer, image) = match resources {
            Ok(resources) => resources,
            Err(err) => {
                report.error(object, Err(err));
                return;
            }
        };

        let result = buffer
            .validate_usage(
                BufferUsage::TRANSFER_SRC,
                &["VUID-vkCmdCopyBufferToImage-srcBuffer-00174"],
            )
            .map_err(|err| err.add_context("src_buffer"))
            .and_then(|()| {
                validate_image_usage(
                    image,
                    ImageUsage::TRANSFER_DST,
                    "dst_image",
                    &["VUID-vkCmdCopyBufferToImage-dstImage-00177"],
                )
            })
            .and_then(|()| {
                if image.samples() != SampleCount::Sample1 {
                    return Err(Box::new(ValidationError {
                        context: "dst_image.samples()".into(),
                        problem: "is not `SampleCount::Sample1`".into(),
                        vuids: &["VUID-vkCmdCopyBufferToImage-dstImage-07973"],
                        ..Default::default()
                    }));
                }

                Ok(())
            });

        if report.error(object, result) {
            return;
        }

        let mut ranges: SmallVec<[ImageSubresourceRange; 1]> = SmallVec::new();

        for (region_index, region) in self.regions.iter().enumerate() {
            let result = validate_buffer_image_region(
                region,
                buffer.size(),
                image,
                &COPY_BUFFER_TO_IMAGE_VUIDS,
            )
            .map_err(|err| err.add_context(format!("regions[{}]", region_index)));

            if !report.error(object, result) {
                ranges.push(image.normalize_range(&region.image_subresource.clone().into()));
            }
        }

        verify_image_layout(
            command_buffer,
            image,
            &ranges,
            self.dst_image_layout,
            ImageLayout::TransferDstOptimal,
            "dst_image_layout",
            LayoutVuids {
                mismatch: &["VUID-vkCmdCopyBufferToImage-dstImageLayout-00180"],
                invalid: &["VUID-vkCmdCopyBufferToImage-dstImageLayout-01396"],
            },
            config,
            report,
        );
    }

    pub(crate) fn record(
        &self,
        command_buffer: &mut CommandBufferState,
        objects: &mut ObjectTables,
    ) {
        command_buffer.bind_buffer(&mut objects.buffers, self.src_buffer);
        command_buffer.bind_image(&mut objects.images, self.dst_image);

        if let Some(image) = objects.images.get(&self.dst_image) {
            for region in &self.regions {
                command_buffer.set_image_initial_layout(
                    image,
                    &region.image_subresource.clone().into(),
                    self.dst_image_layout,
                );
            }
        }
    }
}

/// Parameters to copy data from an image to a buffer.
#[derive(Clone, Debug)]
pub struct CopyImageToBufferInfo {
    pub src_image: ash::vk::Image,

    /// The default value is [`ImageLayout::TransferSrcOptimal`].
    pub src_image_layout: ImageLayout,

    pub dst_buffer: ash::vk::Buffer,

    pub regions: SmallVec<[BufferImageCopy; 1]>,

    pub _ne: crate::NonExhaustive,
}

impl CopyImageToBufferInfo {
    #[inline]
    pub fn image_buffer(src_image: ash::vk::Image, dst_buffer: ash::vk::Buffer) -> Self {
        Self {
            src_image,
            src_image_layout: ImageLayout::TransferSrcOptimal,
            dst_buffer,
            regions: SmallVec::new(),
            _ne: crate::NonExhaustive(()),
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

        if report.error(
            object,
            validate_not_in_render_pass(
                command_buffer,
                &["VUID-vkCmdCopyImageToBuffer-renderpass"],
            ),
        ) {
            return;
        }

        let resources = lookup(
            &objects.images,
            self.src_image,
            "src_image",
            &["VUID-vkCmdCopyImageToBuffer-srcImage-parameter"],
        )
        .and_then(|image| {
            lookup(
                &objects.buffers,
                self.dst_buffer,
                "dst_buffer",
                &["VUID-vkCmdCopyImageToBuffer-dstBuffer-parameter"],
            )
            .map(|buffer| (image, buffer))
        });
        let (image, buffer) = match resources {
            Ok(resources) => resources,
            Err(err) => {
                report.error(object, Err(err));
                return;
            }
        };

        let result = validate_image_usage(
            image,
            ImageUsage::TRANSFER_SRC,
            "src_image",
            &["VUID-vkCmdCopyImageToBuffer-srcImage-00186"],
        )
        .and_then(|()| {
            buffer
                .validate_usage(
                    BufferUsage::TRANSFER_DST,
                    &["VUID-vkCmdCopyImageToBuffer-dstBuffer-00191"],
                )
                .map_err(|err| err.add_context("dst_buffer"))
        })
        .and_then(|()| {
            if image.samples() != SampleCount::Sample1 {
                return Err(Box::new(ValidationError {
                    context: "src_image.samples()".into(),
                    problem: "is not `SampleCount::Sample1`".into(),
                    vuids: &["VUID-vkCmdCopyImageToBuffer-srcImage-07973"],
                    ..Default::default()
                }));
            }

            Ok(())
        });

        if report.error(object, result) {
            return;
        }

        let mut ranges: SmallVec<[ImageSubresourceRange; 1]> = SmallVec::new();

        for (region_index, region) in self.regions.iter().enumerate() {
            let result = validate_buffer_image_region(
                region,
                buffer.size(),
                image,
                &COPY_IMAGE_TO_BUFFER_VUIDS,
            )
            .map_err(|err| err.add_context(format!("regions[{}]", region_index)));

            if !report.error(object, result) {
                ranges.push(image.normalize_range(&region.image_subresource.clone().into()));
            }
        }

        verify_image_layout(
            command_buffer,
            image,
            &ranges,
            self.src_image_layout,
            ImageLayout::TransferSrcOptimal,
            "src_image_layout",
            LayoutVuids {
                mismatch: &["VUID-vkCmdCopyImageToBuffer-srcImageLayout-00189"],
                invalid: &["VUID-vkCmdCopyImageToBuffer-srcImageLayout-01397"],
            },
            config,
            report,
        );
    }

    pub(crate) fn record(
        &self,
        command_buffer: &mut CommandBufferState,
        objects: &mut ObjectTables,
    ) {
        command_buffer.bind_image(&mut objects.images, self.src_image);
        command_buffer.bind_buffer(&mut objects.buffers, self.dst_buffer);

        if let Some(image) = objects.images.get(&self.src_image) {
            for region in &self.regions {
                command_buffer.set_image_initial_layout(
                    image,
                    &region.image_subresource.clone().into(),
                    self.src_image_layout,
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        image::{ImageCreateInfo, ImageSubresource},
        tests_util::{test_validator, ColorImage},
        Severity,
    };

    fn layers(aspects: ImageAspects) -> ImageSubresourceLayers {
        ImageSubresourceLayers {
            aspects,
            mip_level: 0,
            array_layers: 0..1,
        }
    }

    #[test]
    fn copy_layout_mismatch() {
        let (mut validator, sink) = test_validator();
        let a = validator.test_image(ColorImage::transfer(8, 8));
        let b = validator.test_image(ColorImage::transfer(8, 8));
        let cb = validator.test_command_buffer(0);
        let whole = ImageSubresourceRange::whole(ImageAspects::COLOR);

        // A is expected in TransferSrcOptimal on entry. B is transitioned from Undefined.
        let mut barrier_a = crate::sync::ImageMemoryBarrier::image(a, whole.clone());
        barrier_a.old_layout = ImageLayout::TransferSrcOptimal;
        barrier_a.new_layout = ImageLayout::TransferSrcOptimal;
        let mut barrier_b = crate::sync::ImageMemoryBarrier::image(b, whole);
        barrier_b.new_layout = ImageLayout::TransferDstOptimal;
        let dependency_info = crate::command_buffer::barrier::DependencyInfo {
            image_memory_barriers: smallvec::smallvec![barrier_a, barrier_b],
            ..Default::default()
        };
        assert!(!validator.validate_cmd_pipeline_barrier(cb, &dependency_info));
        validator.record_cmd_pipeline_barrier(cb, &dependency_info);

        let copy_info = CopyImageInfo {
            src_image_layout: ImageLayout::TransferSrcOptimal,
            dst_image_layout: ImageLayout::General,
            regions: smallvec::smallvec![ImageCopy {
                src_subresource: layers(ImageAspects::COLOR),
                dst_subresource: layers(ImageAspects::COLOR),
                extent: [8, 8, 1],
                ..Default::default()
            }],
            ..CopyImageInfo::images(a, b)
        };

        assert!(validator.validate_cmd_copy_image(cb, &copy_info));
        assert!(sink.contains_vuid("VUID-vkCmdCopyImage-dstImageLayout-00133"));
        assert!(!sink.contains_vuid("VUID-vkCmdCopyImage-srcImageLayout-00128"));
    }

    #[test]
    fn copy_extent_block_alignment() {
        let (mut validator, sink) = test_validator();
        let compressed = validator.test_image_with(ImageCreateInfo {
            format: Format::BC1_RGBA_UNORM_BLOCK,
            extent: [8, 8, 1],
            usage: ImageUsage::TRANSFER_SRC | ImageUsage::TRANSFER_DST,
            ..Default::default()
        });
        let uncompressed = validator.test_image(ColorImage::transfer(8, 8));
        let cb = validator.test_command_buffer(0);

        let copy_info = CopyImageInfo {
            regions: smallvec::smallvec![ImageCopy {
                src_subresource: layers(ImageAspects::COLOR),
                dst_subresource: layers(ImageAspects::COLOR),
                extent: [7, 4, 1],
                ..Default::default()
            }],
            ..CopyImageInfo::images(compressed, uncompressed)
        };

        assert!(validator.validate_cmd_copy_image(cb, &copy_info));
        assert!(sink.contains_vuid("VUID-VkImageCopy-extent-00158"));
    }

    #[test]
    fn copy_extent_reaching_edge_is_aligned() {
        let format = Format::BC1_RGBA_UNORM_BLOCK;
        let offset = [4, 0, 0];

        assert!(validate_block_alignment(
            format,
            [6, 8, 1],
            offset,
            [2, 4, 1],
            &COPY_SRC_REGION_VUIDS.block.unwrap(),
            "src_offset",
        )
        .is_ok());
        assert!(validate_block_alignment(
            format,
            [8, 8, 1],
            [2, 0, 0],
            [4, 4, 1],
            &COPY_SRC_REGION_VUIDS.block.unwrap(),
            "src_offset",
        )
        .is_err_and(|err| err.vuid() == "VUID-VkImageCopy-srcOffset-00157"));
    }

    #[test]
    fn regions_accumulate() {
        let (mut validator, sink) = test_validator();
        let a = validator.test_image(ColorImage::transfer(8, 8));
        let b = validator.test_image(ColorImage::transfer(8, 8));
        let cb = validator.test_command_buffer(0);

        let out_of_bounds = ImageCopy {
            src_subresource: layers(ImageAspects::COLOR),
            dst_subresource: layers(ImageAspects::COLOR),
            extent: [16, 8, 1],
            ..Default::default()
        };
        let copy_info = CopyImageInfo {
            regions: smallvec::smallvec![out_of_bounds.clone(), out_of_bounds],
            ..CopyImageInfo::images(a, b)
        };

        assert!(validator.validate_cmd_copy_image(cb, &copy_info));
        let messages = sink.take();
        assert_eq!(messages.len(), 2);
        assert!(messages
            .iter()
            .all(|message| message.vuid == "VUID-vkCmdCopyImage-srcOffset-00144"));
    }

    #[test]
    fn clear_general_is_perf_warning() {
        let (mut validator, sink) = test_validator();
        let image = validator.test_image(ColorImage::transfer(8, 8));
        let cb = validator.test_command_buffer(0);

        let clear_info = ClearColorImageInfo {
            image_layout: ImageLayout::General,
            ..ClearColorImageInfo::image(image)
        };

        assert!(!validator.validate_cmd_clear_color_image(cb, &clear_info));
        let messages = sink.take();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].severity, Severity::PerformanceWarning);

        validator.record_cmd_clear_color_image(cb, &clear_info);
        let map = validator.command_buffer(cb).unwrap().image_layout_map(image).unwrap();
        let subresource = ImageSubresource {
            aspects: ImageAspects::COLOR,
            mip_level: 0,
            array_layer: 0,
        };
        assert_eq!(
            map.initial_layout(subresource).map(|initial| initial.layout),
            Some(ImageLayout::General),
        );
        assert_eq!(map.layout(subresource), None);
    }

    #[test]
    fn clear_color_rejects_depth_and_bad_layout() {
        let (mut validator, sink) = test_validator();
        let depth = validator.test_image_with(ImageCreateInfo {
            format: Format::D32_SFLOAT,
            extent: [8, 8, 1],
            usage: ImageUsage::TRANSFER_DST,
            ..Default::default()
        });
        let color = validator.test_image(ColorImage::transfer(8, 8));
        let cb = validator.test_command_buffer(0);

        assert!(validator.validate_cmd_clear_color_image(cb, &ClearColorImageInfo::image(depth)));
        assert!(sink.contains_vuid("VUID-vkCmdClearColorImage-image-00007"));

        let clear_info = ClearColorImageInfo {
            image_layout: ImageLayout::ShaderReadOnlyOptimal,
            ..ClearColorImageInfo::image(color)
        };
        assert!(validator.validate_cmd_clear_color_image(cb, &clear_info));
        assert!(sink.contains_vuid("VUID-vkCmdClearColorImage-imageLayout-01394"));
    }

    #[test]
    fn buffer_image_copy_size() {
        let (mut validator, sink) = test_validator();
        let image = validator.test_image(ColorImage::transfer(8, 8));
        let buffer = validator.test_buffer(
            200,
            BufferUsage::TRANSFER_SRC | BufferUsage::TRANSFER_DST,
        );
        let cb = validator.test_command_buffer(0);

        let copy_info = CopyBufferToImageInfo {
            regions: smallvec::smallvec![BufferImageCopy {
                image_subresource: layers(ImageAspects::COLOR),
                image_extent: [8, 8, 1],
                ..Default::default()
            }],
            ..CopyBufferToImageInfo::buffer_image(buffer, image)
        };

        // 8 * 8 texels of 4 bytes do not fit in 200 bytes.
        assert!(validator.validate_cmd_copy_buffer_to_image(cb, &copy_info));
        assert!(sink.contains_vuid("VUID-vkCmdCopyBufferToImage-pRegions-00171"));

        let copy_info = CopyBufferToImageInfo {
            regions: smallvec::smallvec![BufferImageCopy {
                buffer_offset: 2,
                image_subresource: layers(ImageAspects::COLOR),
                image_extent: [4, 4, 1],
                ..Default::default()
            }],
            ..CopyBufferToImageInfo::buffer_image(buffer, image)
        };
        assert!(validator.validate_cmd_copy_buffer_to_image(cb, &copy_info));
        assert!(sink.contains_vuid("VUID-vkCmdCopyBufferToImage-dstImage-07975"));
    }

    #[test]
    fn resolve_requires_multisampled_source() {
        let (mut validator, sink) = test_validator();
        let a = validator.test_image(ColorImage::transfer(8, 8));
        let b = validator.test_image(ColorImage::transfer(8, 8));
        let cb = validator.test_command_buffer(0);

        assert!(validator.validate_cmd_resolve_image(cb, &ResolveImageInfo::images(a, b)));
        assert!(sink.contains_vuid("VUID-vkCmdResolveImage-srcImage-00257"));
    }
}
