// Copyright (c) 2016 The vulkano developers
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or https://opensource.org/licenses/MIT>,
// at your option. All files in the project carrying such
// notice may not be copied, modified, or distributed except
// according to those terms.

//! The formats known to the validator, and the properties of each format that validation needs.
//!
//! # Special format types
//!
//! ## Depth/stencil formats
//!
//! Depth/stencil formats can be identified by the `D` and `S` components in their names. Some
//! formats have only a depth or stencil component, while others combine both. The two components
//! are represented as separate *aspects*. When copying to or from a buffer, each aspect is
//! accessed individually, and has its own element size, returned by
//! [`Format::block_size_for_aspect`].
//!
//! ## Block-compressed formats
//!
//! A block-compressed format encodes a larger block of texels into a smaller number of bytes.
//! Copies of these images must be aligned to whole blocks, except where the region reaches the
//! edge of the subresource.
//!
//! ## YCbCr formats
//!
//! Most YCbCr formats are **multi-planar**: the components of a texel are stored in separate
//! *planes*, each with its own single-plane format and, with chroma subsampling, its own reduced
//! resolution. A plane is accessed as a `PLANE_n` aspect of the image. The `422` single-plane
//! formats instead store a 2x1 block of texels together, and behave like a block format with a
//! block extent of `[2, 1, 1]`.

use crate::{image::ImageAspects, macros::vulkan_enum, DeviceSize};

vulkan_enum! {
    /// An image or texel buffer format.
    Format = Format(i32);

    UNDEFINED = UNDEFINED,
    R4G4_UNORM_PACK8 = R4G4_UNORM_PACK8,
    R4G4B4A4_UNORM_PACK16 = R4G4B4A4_UNORM_PACK16,
    B4G4R4A4_UNORM_PACK16 = B4G4R4A4_UNORM_PACK16,
    R5G6B5_UNORM_PACK16 = R5G6B5_UNORM_PACK16,
    B5G6R5_UNORM_PACK16 = B5G6R5_UNORM_PACK16,
    R5G5B5A1_UNORM_PACK16 = R5G5B5A1_UNORM_PACK16,
    B5G5R5A1_UNORM_PACK16 = B5G5R5A1_UNORM_PACK16,
    A1R5G5B5_UNORM_PACK16 = A1R5G5B5_UNORM_PACK16,
    R8_UNORM = R8_UNORM,
    R8_SNORM = R8_SNORM,
    R8_USCALED = R8_USCALED,
    R8_SSCALED = R8_SSCALED,
    R8_UINT = R8_UINT,
    R8_SINT = R8_SINT,
    R8_SRGB = R8_SRGB,
    R8G8_UNORM = R8G8_UNORM,
    R8G8_SNORM = R8G8_SNORM,
    R8G8_USCALED = R8G8_USCALED,
    R8G8_SSCALED = R8G8_SSCALED,
    R8G8_UINT = R8G8_UINT,
    R8G8_SINT = R8G8_SINT,
    R8G8_SRGB = R8G8_SRGB,
    R8G8B8_UNORM = R8G8B8_UNORM,
    R8G8B8_SNORM = R8G8B8_SNORM,
    R8G8B8_USCALED = R8G8B8_USCALED,
    R8G8B8_SSCALED = R8G8B8_SSCALED,
    R8G8B8_UINT = R8G8B8_UINT,
    R8G8B8_SINT = R8G8B8_SINT,
    R8G8B8_SRGB = R8G8B8_SRGB,
    B8G8R8_UNORM = B8G8R8_UNORM,
    B8G8R8_SNORM = B8G8R8_SNORM,
    B8G8R8_USCALED = B8G8R8_USCALED,
    B8G8R8_SSCALED = B8G8R8_SSCALED,
    B8G8R8_UINT = B8G8R8_UINT,
    B8G8R8_SINT = B8G8R8_SINT,
    B8G8R8_SRGB = B8G8R8_SRGB,
    R8G8B8A8_UNORM = R8G8B8A8_UNORM,
    R8G8B8A8_SNORM = R8G8B8A8_SNORM,
    R8G8B8A8_USCALED = R8G8B8A8_USCALED,
    R8G8B8A8_SSCALED = R8G8B8A8_SSCALED,
    R8G8B8A8_UINT = R8G8B8A8_UINT,
    R8G8B8A8_SINT = R8G8B8A8_SINT,
    R8G8B8A8_SRGB = R8G8B8A8_SRGB,
    B8G8R8A8_UNORM = B8G8R8A8_UNORM,
    B8G8R8A8_SNORM = B8G8R8A8_SNORM,
    B8G8R8A8_USCALED = B8G8R8A8_USCALED,
    B8G8R8A8_SSCALED = B8G8R8A8_SSCALED,
    B8G8R8A8_UINT = B8G8R8A8_UINT,
    B8G8R8A8_SINT = B8G8R8A8_SINT,
    B8G8R8A8_SRGB = B8G8R8A8_SRGB,
    A8B8G8R8_UNORM_PACK32 = A8B8G8R8_UNORM_PACK32,
    A8B8G8R8_SNORM_PACK32 = A8B8G8R8_SNORM_PACK32,
    A8B8G8R8_USCALED_PACK32 = A8B8G8R8_USCALED_PACK32,
    A8B8G8R8_SSCALED_PACK32 = A8B8G8R8_SSCALED_PACK32,
    A8B8G8R8_UINT_PACK32 = A8B8G8R8_UINT_PACK32,
    A8B8G8R8_SINT_PACK32 = A8B8G8R8_SINT_PACK32,
    A8B8G8R8_SRGB_PACK32 = A8B8G8R8_SRGB_PACK32,
    A2R10G10B10_UNORM_PACK32 = A2R10G10B10_UNORM_PACK32,
    A2R10G10B10_SNORM_PACK32 = A2R10G10B10_SNORM_PACK32,
    A2R10G10B10_USCALED_PACK32 = A2R10G10B10_USCALED_PACK32,
    A2R10G10B10_SSCALED_PACK32 = A2R10G10B10_SSCALED_PACK32,
    A2R10G10B10_UINT_PACK32 = A2R10G10B10_UINT_PACK32,
    A2R10G10B10_SINT_PACK32 = A2R10G10B10_SINT_PACK32,
    A2B10G10R10_UNORM_PACK32 = A2B10G10R10_UNORM_PACK32,
    A2B10G10R10_SNORM_PACK32 = A2B10G10R10_SNORM_PACK32,
    A2B10G10R10_USCALED_PACK32 = A2B10G10R10_USCALED_PACK32,
    A2B10G10R10_SSCALED_PACK32 = A2B10G10R10_SSCALED_PACK32,
    A2B10G10R10_UINT_PACK32 = A2B10G10R10_UINT_PACK32,
    A2B10G10R10_SINT_PACK32 = A2B10G10R10_SINT_PACK32,
    R16_UNORM = R16_UNORM,
    R16_SNORM = R16_SNORM,
    R16_USCALED = R16_USCALED,
    R16_SSCALED = R16_SSCALED,
    R16_UINT = R16_UINT,
    R16_SINT = R16_SINT,
    R16_SFLOAT = R16_SFLOAT,
    R16G16_UNORM = R16G16_UNORM,
    R16G16_SNORM = R16G16_SNORM,
    R16G16_USCALED = R16G16_USCALED,
    R16G16_SSCALED = R16G16_SSCALED,
    R16G16_UINT = R16G16_UINT,
    R16G16_SINT = R16G16_SINT,
    R16G16_SFLOAT = R16G16_SFLOAT,
    R16G16B16_UNORM = R16G16B16_UNORM,
    R16G16B16_SNORM = R16G16B16_SNORM,
    R16G16B16_USCALED = R16G16B16_USCALED,
    R16G16B16_SSCALED = R16G16B16_SSCALED,
    R16G16B16_UINT = R16G16B16_UINT,
    R16G16B16_SINT = R16G16B16_SINT,
    R16G16B16_SFLOAT = R16G16B16_SFLOAT,
    R16G16B16A16_UNORM = R16G16B16A16_UNORM,
    R16G16B16A16_SNORM = R16G16B16A16_SNORM,
    R16G16B16A16_USCALED = R16G16B16A16_USCALED,
    R16G16B16A16_SSCALED = R16G16B16A16_SSCALED,
    R16G16B16A16_UINT = R16G16B16A16_UINT,
    R16G16B16A16_SINT = R16G16B16A16_SINT,
    R16G16B16A16_SFLOAT = R16G16B16A16_SFLOAT,
    R32_UINT = R32_UINT,
    R32_SINT = R32_SINT,
    R32_SFLOAT = R32_SFLOAT,
    R32G32_UINT = R32G32_UINT,
    R32G32_SINT = R32G32_SINT,
    R32G32_SFLOAT = R32G32_SFLOAT,
    R32G32B32_UINT = R32G32B32_UINT,
    R32G32B32_SINT = R32G32B32_SINT,
    R32G32B32_SFLOAT = R32G32B32_SFLOAT,
    R32G32B32A32_UINT = R32G32B32A32_UINT,
    R32G32B32A32_SINT = R32G32B32A32_SINT,
    R32G32B32A32_SFLOAT = R32G32B32A32_SFLOAT,
    R64_UINT = R64_UINT,
    R64_SINT = R64_SINT,
    R64_SFLOAT = R64_SFLOAT,
    R64G64_UINT = R64G64_UINT,
    R64G64_SINT = R64G64_SINT,
    R64G64_SFLOAT = R64G64_SFLOAT,
    R64G64B64_UINT = R64G64B64_UINT,
    R64G64B64_SINT = R64G64B64_SINT,
    R64G64B64_SFLOAT = R64G64B64_SFLOAT,
    R64G64B64A64_UINT = R64G64B64A64_UINT,
    R64G64B64A64_SINT = R64G64B64A64_SINT,
    R64G64B64A64_SFLOAT = R64G64B64A64_SFLOAT,
    B10G11R11_UFLOAT_PACK32 = B10G11R11_UFLOAT_PACK32,
    E5B9G9R9_UFLOAT_PACK32 = E5B9G9R9_UFLOAT_PACK32,
    D16_UNORM = D16_UNORM,
    X8_D24_UNORM_PACK32 = X8_D24_UNORM_PACK32,
    D32_SFLOAT = D32_SFLOAT,
    S8_UINT = S8_UINT,
    D16_UNORM_S8_UINT = D16_UNORM_S8_UINT,
    D24_UNORM_S8_UINT = D24_UNORM_S8_UINT,
    D32_SFLOAT_S8_UINT = D32_SFLOAT_S8_UINT,
    BC1_RGB_UNORM_BLOCK = BC1_RGB_UNORM_BLOCK,
    BC1_RGB_SRGB_BLOCK = BC1_RGB_SRGB_BLOCK,
    BC1_RGBA_UNORM_BLOCK = BC1_RGBA_UNORM_BLOCK,
    BC1_RGBA_SRGB_BLOCK = BC1_RGBA_SRGB_BLOCK,
    BC2_UNORM_BLOCK = BC2_UNORM_BLOCK,
    BC2_SRGB_BLOCK = BC2_SRGB_BLOCK,
    BC3_UNORM_BLOCK = BC3_UNORM_BLOCK,
    BC3_SRGB_BLOCK = BC3_SRGB_BLOCK,
    BC4_UNORM_BLOCK = BC4_UNORM_BLOCK,
    BC4_SNORM_BLOCK = BC4_SNORM_BLOCK,
    BC5_UNORM_BLOCK = BC5_UNORM_BLOCK,
    BC5_SNORM_BLOCK = BC5_SNORM_BLOCK,
    BC6H_UFLOAT_BLOCK = BC6H_UFLOAT_BLOCK,
    BC6H_SFLOAT_BLOCK = BC6H_SFLOAT_BLOCK,
    BC7_UNORM_BLOCK = BC7_UNORM_BLOCK,
    BC7_SRGB_BLOCK = BC7_SRGB_BLOCK,
    ETC2_R8G8B8_UNORM_BLOCK = ETC2_R8G8B8_UNORM_BLOCK,
    ETC2_R8G8B8_SRGB_BLOCK = ETC2_R8G8B8_SRGB_BLOCK,
    ETC2_R8G8B8A1_UNORM_BLOCK = ETC2_R8G8B8A1_UNORM_BLOCK,
    ETC2_R8G8B8A1_SRGB_BLOCK = ETC2_R8G8B8A1_SRGB_BLOCK,
    ETC2_R8G8B8A8_UNORM_BLOCK = ETC2_R8G8B8A8_UNORM_BLOCK,
    ETC2_R8G8B8A8_SRGB_BLOCK = ETC2_R8G8B8A8_SRGB_BLOCK,
    EAC_R11_UNORM_BLOCK = EAC_R11_UNORM_BLOCK,
    EAC_R11_SNORM_BLOCK = EAC_R11_SNORM_BLOCK,
    EAC_R11G11_UNORM_BLOCK = EAC_R11G11_UNORM_BLOCK,
    EAC_R11G11_SNORM_BLOCK = EAC_R11G11_SNORM_BLOCK,
    ASTC_4x4_UNORM_BLOCK = ASTC_4X4_UNORM_BLOCK,
    ASTC_4x4_SRGB_BLOCK = ASTC_4X4_SRGB_BLOCK,
    ASTC_5x4_UNORM_BLOCK = ASTC_5X4_UNORM_BLOCK,
    ASTC_5x4_SRGB_BLOCK = ASTC_5X4_SRGB_BLOCK,
    ASTC_5x5_UNORM_BLOCK = ASTC_5X5_UNORM_BLOCK,
    ASTC_5x5_SRGB_BLOCK = ASTC_5X5_SRGB_BLOCK,
    ASTC_6x5_UNORM_BLOCK = ASTC_6X5_UNORM_BLOCK,
    ASTC_6x5_SRGB_BLOCK = ASTC_6X5_SRGB_BLOCK,
    ASTC_6x6_UNORM_BLOCK = ASTC_6X6_UNORM_BLOCK,
    ASTC_6x6_SRGB_BLOCK = ASTC_6X6_SRGB_BLOCK,
    ASTC_8x5_UNORM_BLOCK = ASTC_8X5_UNORM_BLOCK,
    ASTC_8x5_SRGB_BLOCK = ASTC_8X5_SRGB_BLOCK,
    ASTC_8x6_UNORM_BLOCK = ASTC_8X6_UNORM_BLOCK,
    ASTC_8x6_SRGB_BLOCK = ASTC_8X6_SRGB_BLOCK,
    ASTC_8x8_UNORM_BLOCK = ASTC_8X8_UNORM_BLOCK,
    ASTC_8x8_SRGB_BLOCK = ASTC_8X8_SRGB_BLOCK,
    ASTC_10x5_UNORM_BLOCK = ASTC_10X5_UNORM_BLOCK,
    ASTC_10x5_SRGB_BLOCK = ASTC_10X5_SRGB_BLOCK,
    ASTC_10x6_UNORM_BLOCK = ASTC_10X6_UNORM_BLOCK,
    ASTC_10x6_SRGB_BLOCK = ASTC_10X6_SRGB_BLOCK,
    ASTC_10x8_UNORM_BLOCK = ASTC_10X8_UNORM_BLOCK,
    ASTC_10x8_SRGB_BLOCK = ASTC_10X8_SRGB_BLOCK,
    ASTC_10x10_UNORM_BLOCK = ASTC_10X10_UNORM_BLOCK,
    ASTC_10x10_SRGB_BLOCK = ASTC_10X10_SRGB_BLOCK,
    ASTC_12x10_UNORM_BLOCK = ASTC_12X10_UNORM_BLOCK,
    ASTC_12x10_SRGB_BLOCK = ASTC_12X10_SRGB_BLOCK,
    ASTC_12x12_UNORM_BLOCK = ASTC_12X12_UNORM_BLOCK,
    ASTC_12x12_SRGB_BLOCK = ASTC_12X12_SRGB_BLOCK,
    G8B8G8R8_422_UNORM = G8B8G8R8_422_UNORM,
    B8G8R8G8_422_UNORM = B8G8R8G8_422_UNORM,
    G8_B8_R8_3PLANE_420_UNORM = G8_B8_R8_3PLANE_420_UNORM,
    G8_B8R8_2PLANE_420_UNORM = G8_B8R8_2PLANE_420_UNORM,
    G8_B8_R8_3PLANE_422_UNORM = G8_B8_R8_3PLANE_422_UNORM,
    G8_B8R8_2PLANE_422_UNORM = G8_B8R8_2PLANE_422_UNORM,
    G8_B8_R8_3PLANE_444_UNORM = G8_B8_R8_3PLANE_444_UNORM,
    R10X6_UNORM_PACK16 = R10X6_UNORM_PACK16,
    R10X6G10X6_UNORM_2PACK16 = R10X6G10X6_UNORM_2PACK16,
    R10X6G10X6B10X6A10X6_UNORM_4PACK16 = R10X6G10X6B10X6A10X6_UNORM_4PACK16,
    G10X6B10X6G10X6R10X6_422_UNORM_4PACK16 = G10X6B10X6G10X6R10X6_422_UNORM_4PACK16,
    B10X6G10X6R10X6G10X6_422_UNORM_4PACK16 = B10X6G10X6R10X6G10X6_422_UNORM_4PACK16,
    G10X6_B10X6_R10X6_3PLANE_420_UNORM_3PACK16 = G10X6_B10X6_R10X6_3PLANE_420_UNORM_3PACK16,
    G10X6_B10X6R10X6_2PLANE_420_UNORM_3PACK16 = G10X6_B10X6R10X6_2PLANE_420_UNORM_3PACK16,
    G10X6_B10X6_R10X6_3PLANE_422_UNORM_3PACK16 = G10X6_B10X6_R10X6_3PLANE_422_UNORM_3PACK16,
    G10X6_B10X6R10X6_2PLANE_422_UNORM_3PACK16 = G10X6_B10X6R10X6_2PLANE_422_UNORM_3PACK16,
    G10X6_B10X6_R10X6_3PLANE_444_UNORM_3PACK16 = G10X6_B10X6_R10X6_3PLANE_444_UNORM_3PACK16,
    R12X4_UNORM_PACK16 = R12X4_UNORM_PACK16,
    R12X4G12X4_UNORM_2PACK16 = R12X4G12X4_UNORM_2PACK16,
    R12X4G12X4B12X4A12X4_UNORM_4PACK16 = R12X4G12X4B12X4A12X4_UNORM_4PACK16,
    G12X4B12X4G12X4R12X4_422_UNORM_4PACK16 = G12X4B12X4G12X4R12X4_422_UNORM_4PACK16,
    B12X4G12X4R12X4G12X4_422_UNORM_4PACK16 = B12X4G12X4R12X4G12X4_422_UNORM_4PACK16,
    G12X4_B12X4_R12X4_3PLANE_420_UNORM_3PACK16 = G12X4_B12X4_R12X4_3PLANE_420_UNORM_3PACK16,
    G12X4_B12X4R12X4_2PLANE_420_UNORM_3PACK16 = G12X4_B12X4R12X4_2PLANE_420_UNORM_3PACK16,
    G12X4_B12X4_R12X4_3PLANE_422_UNORM_3PACK16 = G12X4_B12X4_R12X4_3PLANE_422_UNORM_3PACK16,
    G12X4_B12X4R12X4_2PLANE_422_UNORM_3PACK16 = G12X4_B12X4R12X4_2PLANE_422_UNORM_3PACK16,
    G12X4_B12X4_R12X4_3PLANE_444_UNORM_3PACK16 = G12X4_B12X4_R12X4_3PLANE_444_UNORM_3PACK16,
    G16B16G16R16_422_UNORM = G16B16G16R16_422_UNORM,
    B16G16R16G16_422_UNORM = B16G16R16G16_422_UNORM,
    G16_B16_R16_3PLANE_420_UNORM = G16_B16_R16_3PLANE_420_UNORM,
    G16_B16R16_2PLANE_420_UNORM = G16_B16R16_2PLANE_420_UNORM,
    G16_B16_R16_3PLANE_422_UNORM = G16_B16_R16_3PLANE_422_UNORM,
    G16_B16R16_2PLANE_422_UNORM = G16_B16R16_2PLANE_422_UNORM,
    G16_B16_R16_3PLANE_444_UNORM = G16_B16_R16_3PLANE_444_UNORM,
    G8_B8R8_2PLANE_444_UNORM = G8_B8R8_2PLANE_444_UNORM,
    G10X6_B10X6R10X6_2PLANE_444_UNORM_3PACK16 = G10X6_B10X6R10X6_2PLANE_444_UNORM_3PACK16,
    G12X4_B12X4R12X4_2PLANE_444_UNORM_3PACK16 = G12X4_B12X4R12X4_2PLANE_444_UNORM_3PACK16,
    G16_B16R16_2PLANE_444_UNORM = G16_B16R16_2PLANE_444_UNORM,
    A4R4G4B4_UNORM_PACK16 = A4R4G4B4_UNORM_PACK16,
    A4B4G4R4_UNORM_PACK16 = A4B4G4R4_UNORM_PACK16,
    ASTC_4x4_SFLOAT_BLOCK = ASTC_4X4_SFLOAT_BLOCK,
    ASTC_5x4_SFLOAT_BLOCK = ASTC_5X4_SFLOAT_BLOCK,
    ASTC_5x5_SFLOAT_BLOCK = ASTC_5X5_SFLOAT_BLOCK,
    ASTC_6x5_SFLOAT_BLOCK = ASTC_6X5_SFLOAT_BLOCK,
    ASTC_6x6_SFLOAT_BLOCK = ASTC_6X6_SFLOAT_BLOCK,
    ASTC_8x5_SFLOAT_BLOCK = ASTC_8X5_SFLOAT_BLOCK,
    ASTC_8x6_SFLOAT_BLOCK = ASTC_8X6_SFLOAT_BLOCK,
    ASTC_8x8_SFLOAT_BLOCK = ASTC_8X8_SFLOAT_BLOCK,
    ASTC_10x5_SFLOAT_BLOCK = ASTC_10X5_SFLOAT_BLOCK,
    ASTC_10x6_SFLOAT_BLOCK = ASTC_10X6_SFLOAT_BLOCK,
    ASTC_10x8_SFLOAT_BLOCK = ASTC_10X8_SFLOAT_BLOCK,
    ASTC_10x10_SFLOAT_BLOCK = ASTC_10X10_SFLOAT_BLOCK,
    ASTC_12x10_SFLOAT_BLOCK = ASTC_12X10_SFLOAT_BLOCK,
    ASTC_12x12_SFLOAT_BLOCK = ASTC_12X12_SFLOAT_BLOCK,
}

impl Default for Format {
    #[inline]
    fn default() -> Self {
        Format::UNDEFINED
    }
}

/// The block compression scheme used in a format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[allow(non_camel_case_types)]
pub enum CompressionType {
    /// Adaptive Scalable Texture Compression, low dynamic range.
    ASTC_LDR,
    /// Adaptive Scalable Texture Compression, high dynamic range.
    ASTC_HDR,
    /// S3TC Block Compression.
    BC,
    /// Ericsson Texture Compression 2.
    ETC2,
    /// ETC2 Alpha Compression.
    EAC,
}

/// For YCbCr formats, the type of chroma sampling used.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChromaSampling {
    /// The chroma components are represented at the same resolution as the luma component.
    Mode444,
    /// The chroma components have half the horizontal resolution as the luma component.
    Mode422,
    /// The chroma components have half the horizontal and vertical resolution as the luma
    /// component.
    Mode420,
}

impl ChromaSampling {
    /// Returns the factors by which the width and height of a chroma plane are divided.
    #[inline]
    pub fn subsampled_divisors(self) -> [u32; 2] {
        match self {
            ChromaSampling::Mode444 => [1, 1],
            ChromaSampling::Mode422 => [2, 1],
            ChromaSampling::Mode420 => [2, 2],
        }
    }
}

/// The numeric type that represents data of a format in memory.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[allow(clippy::upper_case_acronyms)]
pub enum NumericType {
    /// Signed floating-point number.
    SFLOAT,
    /// Unsigned floating-point number.
    UFLOAT,
    /// Signed integer.
    SINT,
    /// Unsigned integer.
    UINT,
    /// Signed integer that represents a normalized floating-point value in the range \[-1,1].
    SNORM,
    /// Unsigned integer that represents a normalized floating-point value in the range \[0,1].
    UNORM,
    /// Signed integer that is converted to a floating-point value directly.
    SSCALED,
    /// Unsigned integer that is converted to a floating-point value directly.
    USCALED,
    /// Unsigned normalized integer in the sRGB color space.
    SRGB,
}

/// An opaque type that represents a format compatibility class.
///
/// Two formats are compatible if their compatibility classes compare equal, which is the case
/// when their texel blocks have the same size in bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FormatCompatibility(DeviceSize);

#[derive(Clone, Copy)]
struct FormatInfo {
    block_size: DeviceSize,
    block_extent: [u32; 3],
    aspects: ImageAspects,
    type_color: Option<NumericType>,
    type_depth: Option<NumericType>,
    depth_size: DeviceSize,
    compression: Option<CompressionType>,
    planes: &'static [Format],
    chroma_sampling: Option<ChromaSampling>,
}

impl FormatInfo {
    const NONE: Self = Self {
        block_size: 0,
        block_extent: [1, 1, 1],
        aspects: ImageAspects::empty(),
        type_color: None,
        type_depth: None,
        depth_size: 0,
        compression: None,
        planes: &[],
        chroma_sampling: None,
    };

    const fn color(block_size: DeviceSize, numeric_type: NumericType) -> Self {
        Self {
            block_size,
            aspects: ImageAspects::COLOR,
            type_color: Some(numeric_type),
            ..Self::NONE
        }
    }

    const fn compressed(
        block_size: DeviceSize,
        block_extent: [u32; 2],
        compression: CompressionType,
        numeric_type: NumericType,
    ) -> Self {
        Self {
            block_size,
            block_extent: [block_extent[0], block_extent[1], 1],
            compression: Some(compression),
            ..Self::color(block_size, numeric_type)
        }
    }

    const fn depth(block_size: DeviceSize, numeric_type: NumericType) -> Self {
        Self {
            block_size,
            aspects: ImageAspects::DEPTH,
            type_depth: Some(numeric_type),
            depth_size: block_size,
            ..Self::NONE
        }
    }

    const fn stencil(block_size: DeviceSize) -> Self {
        Self {
            block_size,
            aspects: ImageAspects::STENCIL,
            ..Self::NONE
        }
    }

    const fn depth_stencil(
        block_size: DeviceSize,
        depth_size: DeviceSize,
        numeric_type: NumericType,
    ) -> Self {
        Self {
            block_size,
            aspects: ImageAspects::DEPTH.union(ImageAspects::STENCIL),
            type_depth: Some(numeric_type),
            depth_size,
            ..Self::NONE
        }
    }

    const fn ycbcr_422(block_size: DeviceSize) -> Self {
        Self {
            block_extent: [2, 1, 1],
            chroma_sampling: Some(ChromaSampling::Mode422),
            ..Self::color(block_size, NumericType::UNORM)
        }
    }

    const fn multi_planar(planes: &'static [Format], chroma_sampling: ChromaSampling) -> Self {
        let plane_aspects = if planes.len() == 3 {
            ImageAspects::PLANE_0
                .union(ImageAspects::PLANE_1)
                .union(ImageAspects::PLANE_2)
        } else {
            ImageAspects::PLANE_0.union(ImageAspects::PLANE_1)
        };

        Self {
            block_size: 0,
            aspects: ImageAspects::COLOR.union(plane_aspects),
            planes,
            chroma_sampling: Some(chroma_sampling),
            ..Self::color(0, NumericType::UNORM)
        }
    }
}

impl Format {
    fn info(self) -> FormatInfo {
        use self::{CompressionType as C, NumericType as N};

        match self {
            Format::UNDEFINED => FormatInfo::NONE,
            Format::R4G4_UNORM_PACK8 => FormatInfo::color(1, N::UNORM),
            Format::R4G4B4A4_UNORM_PACK16
            | Format::B4G4R4A4_UNORM_PACK16
            | Format::R5G6B5_UNORM_PACK16
            | Format::B5G6R5_UNORM_PACK16
            | Format::R5G5B5A1_UNORM_PACK16
            | Format::B5G5R5A1_UNORM_PACK16
            | Format::A1R5G5B5_UNORM_PACK16 => {
                FormatInfo::color(2, N::UNORM)
            }
            Format::R8_UNORM => FormatInfo::color(1, N::UNORM),
            Format::R8_SNORM => FormatInfo::color(1, N::SNORM),
            Format::R8_USCALED => FormatInfo::color(1, N::USCALED),
            Format::R8_SSCALED => FormatInfo::color(1, N::SSCALED),
            Format::R8_UINT => FormatInfo::color(1, N::UINT),
            Format::R8_SINT => FormatInfo::color(1, N::SINT),
            Format::R8_SRGB => FormatInfo::color(1, N::SRGB),
            Format::R8G8_UNORM => FormatInfo::color(2, N::UNORM),
            Format::R8G8_SNORM => FormatInfo::color(2, N::SNORM),
            Format::R8G8_USCALED => FormatInfo::color(2, N::USCALED),
            Format::R8G8_SSCALED => FormatInfo::color(2, N::SSCALED),
            Format::R8G8_UINT => FormatInfo::color(2, N::UINT),
            Format::R8G8_SINT => FormatInfo::color(2, N::SINT),
            Format::R8G8_SRGB => FormatInfo::color(2, N::SRGB),
            Format::R8G8B8_UNORM => FormatInfo::color(3, N::UNORM),
            Format::R8G8B8_SNORM => FormatInfo::color(3, N::SNORM),
            Format::R8G8B8_USCALED => FormatInfo::color(3, N::USCALED),
            Format::R8G8B8_SSCALED => FormatInfo::color(3, N::SSCALED),
            Format::R8G8B8_UINT => FormatInfo::color(3, N::UINT),
            Format::R8G8B8_SINT => FormatInfo::color(3, N::SINT),
            Format::R8G8B8_SRGB => FormatInfo::color(3, N::SRGB),
            Format::B8G8R8_UNORM => FormatInfo::color(3, N::UNORM),
            Format::B8G8R8_SNORM => FormatInfo::color(3, N::SNORM),
            Format::B8G8R8_USCALED => FormatInfo::color(3, N::USCALED),
            Format::B8G8R8_SSCALED => FormatInfo::color(3, N::SSCALED),
            Format::B8G8R8_UINT => FormatInfo::color(3, N::UINT),
            Format::B8G8R8_SINT => FormatInfo::color(3, N::SINT),
            Format::B8G8R8_SRGB => FormatInfo::color(3, N::SRGB),
            Format::R8G8B8A8_UNORM => FormatInfo::color(4, N::UNORM),
            Format::R8G8B8A8_SNORM => FormatInfo::color(4, N::SNORM),
            Format::R8G8B8A8_USCALED => FormatInfo::color(4, N::USCALED),
            Format::R8G8B8A8_SSCALED => FormatInfo::color(4, N::SSCALED),
            Format::R8G8B8A8_UINT => FormatInfo::color(4, N::UINT),
            Format::R8G8B8A8_SINT => FormatInfo::color(4, N::SINT),
            Format::R8G8B8A8_SRGB => FormatInfo::color(4, N::SRGB),
            Format::B8G8R8A8_UNORM => FormatInfo::color(4, N::UNORM),
            Format::B8G8R8A8_SNORM => FormatInfo::color(4, N::SNORM),
            Format::B8G8R8A8_USCALED => FormatInfo::color(4, N::USCALED),
            Format::B8G8R8A8_SSCALED => FormatInfo::color(4, N::SSCALED),
            Format::B8G8R8A8_UINT => FormatInfo::color(4, N::UINT),
            Format::B8G8R8A8_SINT => FormatInfo::color(4, N::SINT),
            Format::B8G8R8A8_SRGB => FormatInfo::color(4, N::SRGB),
            Format::A8B8G8R8_UNORM_PACK32 => FormatInfo::color(4, N::UNORM),
            Format::A8B8G8R8_SNORM_PACK32 => FormatInfo::color(4, N::SNORM),
            Format::A8B8G8R8_USCALED_PACK32 => FormatInfo::color(4, N::USCALED),
            Format::A8B8G8R8_SSCALED_PACK32 => FormatInfo::color(4, N::SSCALED),
            Format::A8B8G8R8_UINT_PACK32 => FormatInfo::color(4, N::UINT),
            Format::A8B8G8R8_SINT_PACK32 => FormatInfo::color(4, N::SINT),
            Format::A8B8G8R8_SRGB_PACK32 => FormatInfo::color(4, N::SRGB),
            Format::A2R10G10B10_UNORM_PACK32 => FormatInfo::color(4, N::UNORM),
            Format::A2R10G10B10_SNORM_PACK32 => FormatInfo::color(4, N::SNORM),
            Format::A2R10G10B10_USCALED_PACK32 => FormatInfo::color(4, N::USCALED),
            Format::A2R10G10B10_SSCALED_PACK32 => FormatInfo::color(4, N::SSCALED),
            Format::A2R10G10B10_UINT_PACK32 => FormatInfo::color(4, N::UINT),
            Format::A2R10G10B10_SINT_PACK32 => FormatInfo::color(4, N::SINT),
            Format::A2B10G10R10_UNORM_PACK32 => FormatInfo::color(4, N::UNORM),
            Format::A2B10G10R10_SNORM_PACK32 => FormatInfo::color(4, N::SNORM),
            Format::A2B10G10R10_USCALED_PACK32 => FormatInfo::color(4, N::USCALED),
            Format::A2B10G10R10_SSCALED_PACK32 => FormatInfo::color(4, N::SSCALED),
            Format::A2B10G10R10_UINT_PACK32 => FormatInfo::color(4, N::UINT),
            Format::A2B10G10R10_SINT_PACK32 => FormatInfo::color(4, N::SINT),
            Format::R16_UNORM => FormatInfo::color(2, N::UNORM),
            Format::R16_SNORM => FormatInfo::color(2, N::SNORM),
            Format::R16_USCALED => FormatInfo::color(2, N::USCALED),
            Format::R16_SSCALED => FormatInfo::color(2, N::SSCALED),
            Format::R16_UINT => FormatInfo::color(2, N::UINT),
            Format::R16_SINT => FormatInfo::color(2, N::SINT),
            Format::R16_SFLOAT => FormatInfo::color(2, N::SFLOAT),
            Format::R16G16_UNORM => FormatInfo::color(4, N::UNORM),
            Format::R16G16_SNORM => FormatInfo::color(4, N::SNORM),
            Format::R16G16_USCALED => FormatInfo::color(4, N::USCALED),
            Format::R16G16_SSCALED => FormatInfo::color(4, N::SSCALED),
            Format::R16G16_UINT => FormatInfo::color(4, N::UINT),
            Format::R16G16_SINT => FormatInfo::color(4, N::SINT),
            Format::R16G16_SFLOAT => FormatInfo::color(4, N::SFLOAT),
            Format::R16G16B16_UNORM => FormatInfo::color(6, N::UNORM),
            Format::R16G16B16_SNORM => FormatInfo::color(6, N::SNORM),
            Format::R16G16B16_USCALED => FormatInfo::color(6, N::USCALED),
            Format::R16G16B16_SSCALED => FormatInfo::color(6, N::SSCALED),
            Format::R16G16B16_UINT => FormatInfo::color(6, N::UINT),
            Format::R16G16B16_SINT => FormatInfo::color(6, N::SINT),
            Format::R16G16B16_SFLOAT => FormatInfo::color(6, N::SFLOAT),
            Format::R16G16B16A16_UNORM => FormatInfo::color(8, N::UNORM),
            Format::R16G16B16A16_SNORM => FormatInfo::color(8, N::SNORM),
            Format::R16G16B16A16_USCALED => FormatInfo::color(8, N::USCALED),
            Format::R16G16B16A16_SSCALED => FormatInfo::color(8, N::SSCALED),
            Format::R16G16B16A16_UINT => FormatInfo::color(8, N::UINT),
            Format::R16G16B16A16_SINT => FormatInfo::color(8, N::SINT),
            Format::R16G16B16A16_SFLOAT => FormatInfo::color(8, N::SFLOAT),
            Format::R32_UINT => FormatInfo::color(4, N::UINT),
            Format::R32_SINT => FormatInfo::color(4, N::SINT),
            Format::R32_SFLOAT => FormatInfo::color(4, N::SFLOAT),
            Format::R32G32_UINT => FormatInfo::color(8, N::UINT),
            Format::R32G32_SINT => FormatInfo::color(8, N::SINT),
            Format::R32G32_SFLOAT => FormatInfo::color(8, N::SFLOAT),
            Format::R32G32B32_UINT => FormatInfo::color(12, N::UINT),
            Format::R32G32B32_SINT => FormatInfo::color(12, N::SINT),
            Format::R32G32B32_SFLOAT => FormatInfo::color(12, N::SFLOAT),
            Format::R32G32B32A32_UINT => FormatInfo::color(16, N::UINT),
            Format::R32G32B32A32_SINT => FormatInfo::color(16, N::SINT),
            Format::R32G32B32A32_SFLOAT => FormatInfo::color(16, N::SFLOAT),
            Format::R64_UINT => FormatInfo::color(8, N::UINT),
            Format::R64_SINT => FormatInfo::color(8, N::SINT),
            Format::R64_SFLOAT => FormatInfo::color(8, N::SFLOAT),
            Format::R64G64_UINT => FormatInfo::color(16, N::UINT),
            Format::R64G64_SINT => FormatInfo::color(16, N::SINT),
            Format::R64G64_SFLOAT => FormatInfo::color(16, N::SFLOAT),
            Format::R64G64B64_UINT => FormatInfo::color(24, N::UINT),
            Format::R64G64B64_SINT => FormatInfo::color(24, N::SINT),
            Format::R64G64B64_SFLOAT => FormatInfo::color(24, N::SFLOAT),
            Format::R64G64B64A64_UINT => FormatInfo::color(32, N::UINT),
            Format::R64G64B64A64_SINT => FormatInfo::color(32, N::SINT),
            Format::R64G64B64A64_SFLOAT => FormatInfo::color(32, N::SFLOAT),
            Format::B10G11R11_UFLOAT_PACK32 | Format::E5B9G9R9_UFLOAT_PACK32 => {
                FormatInfo::color(4, N::UFLOAT)
            }
            Format::D16_UNORM => FormatInfo::depth(2, N::UNORM),
            Format::X8_D24_UNORM_PACK32 => FormatInfo::depth(4, N::UNORM),
            Format::D32_SFLOAT => FormatInfo::depth(4, N::SFLOAT),
            Format::S8_UINT => FormatInfo::stencil(1),
            Format::D16_UNORM_S8_UINT => FormatInfo::depth_stencil(3, 2, N::UNORM),
            Format::D24_UNORM_S8_UINT => FormatInfo::depth_stencil(4, 4, N::UNORM),
            Format::D32_SFLOAT_S8_UINT => FormatInfo::depth_stencil(8, 4, N::SFLOAT),
            Format::BC1_RGB_UNORM_BLOCK => FormatInfo::compressed(8, [4, 4], C::BC, N::UNORM),
            Format::BC1_RGB_SRGB_BLOCK => FormatInfo::compressed(8, [4, 4], C::BC, N::SRGB),
            Format::BC1_RGBA_UNORM_BLOCK => FormatInfo::compressed(8, [4, 4], C::BC, N::UNORM),
            Format::BC1_RGBA_SRGB_BLOCK => FormatInfo::compressed(8, [4, 4], C::BC, N::SRGB),
            Format::BC2_UNORM_BLOCK => FormatInfo::compressed(16, [4, 4], C::BC, N::UNORM),
            Format::BC2_SRGB_BLOCK => FormatInfo::compressed(16, [4, 4], C::BC, N::SRGB),
            Format::BC3_UNORM_BLOCK => FormatInfo::compressed(16, [4, 4], C::BC, N::UNORM),
            Format::BC3_SRGB_BLOCK => FormatInfo::compressed(16, [4, 4], C::BC, N::SRGB),
            Format::BC4_UNORM_BLOCK => FormatInfo::compressed(8, [4, 4], C::BC, N::UNORM),
            Format::BC4_SNORM_BLOCK => FormatInfo::compressed(8, [4, 4], C::BC, N::SNORM),
            Format::BC5_UNORM_BLOCK => FormatInfo::compressed(16, [4, 4], C::BC, N::UNORM),
            Format::BC5_SNORM_BLOCK => FormatInfo::compressed(16, [4, 4], C::BC, N::SNORM),
            Format::BC6H_UFLOAT_BLOCK => FormatInfo::compressed(16, [4, 4], C::BC, N::UFLOAT),
            Format::BC6H_SFLOAT_BLOCK => FormatInfo::compressed(16, [4, 4], C::BC, N::SFLOAT),
            Format::BC7_UNORM_BLOCK => FormatInfo::compressed(16, [4, 4], C::BC, N::UNORM),
            Format::BC7_SRGB_BLOCK => FormatInfo::compressed(16, [4, 4], C::BC, N::SRGB),
            Format::ETC2_R8G8B8_UNORM_BLOCK => FormatInfo::compressed(8, [4, 4], C::ETC2, N::UNORM),
            Format::ETC2_R8G8B8_SRGB_BLOCK => FormatInfo::compressed(8, [4, 4], C::ETC2, N::SRGB),
            Format::ETC2_R8G8B8A1_UNORM_BLOCK => {
                FormatInfo::compressed(8, [4, 4], C::ETC2, N::UNORM)
            }
            Format::ETC2_R8G8B8A1_SRGB_BLOCK => FormatInfo::compressed(8, [4, 4], C::ETC2, N::SRGB),
            Format::ETC2_R8G8B8A8_UNORM_BLOCK => {
                FormatInfo::compressed(16, [4, 4], C::ETC2, N::UNORM)
            }
            Format::ETC2_R8G8B8A8_SRGB_BLOCK => {
                FormatInfo::compressed(16, [4, 4], C::ETC2, N::SRGB)
            }
            Format::EAC_R11_UNORM_BLOCK => FormatInfo::compressed(8, [4, 4], C::EAC, N::UNORM),
            Format::EAC_R11_SNORM_BLOCK => FormatInfo::compressed(8, [4, 4], C::EAC, N::SNORM),
            Format::EAC_R11G11_UNORM_BLOCK => FormatInfo::compressed(16, [4, 4], C::EAC, N::UNORM),
            Format::EAC_R11G11_SNORM_BLOCK => FormatInfo::compressed(16, [4, 4], C::EAC, N::SNORM),
            Format::ASTC_4x4_UNORM_BLOCK => {
                FormatInfo::compressed(16, [4, 4], C::ASTC_LDR, N::UNORM)
            }
            Format::ASTC_4x4_SRGB_BLOCK => FormatInfo::compressed(16, [4, 4], C::ASTC_LDR, N::SRGB),
            Format::ASTC_5x4_UNORM_BLOCK => {
                FormatInfo::compressed(16, [5, 4], C::ASTC_LDR, N::UNORM)
            }
            Format::ASTC_5x4_SRGB_BLOCK => FormatInfo::compressed(16, [5, 4], C::ASTC_LDR, N::SRGB),
            Format::ASTC_5x5_UNORM_BLOCK => {
                FormatInfo::compressed(16, [5, 5], C::ASTC_LDR, N::UNORM)
            }
            Format::ASTC_5x5_SRGB_BLOCK => FormatInfo::compressed(16, [5, 5], C::ASTC_LDR, N::SRGB),
            Format::ASTC_6x5_UNORM_BLOCK => {
                FormatInfo::compressed(16, [6, 5], C::ASTC_LDR, N::UNORM)
            }
            Format::ASTC_6x5_SRGB_BLOCK => FormatInfo::compressed(16, [6, 5], C::ASTC_LDR, N::SRGB),
            Format::ASTC_6x6_UNORM_BLOCK => {
                FormatInfo::compressed(16, [6, 6], C::ASTC_LDR, N::UNORM)
            }
            Format::ASTC_6x6_SRGB_BLOCK => FormatInfo::compressed(16, [6, 6], C::ASTC_LDR, N::SRGB),
            Format::ASTC_8x5_UNORM_BLOCK => {
                FormatInfo::compressed(16, [8, 5], C::ASTC_LDR, N::UNORM)
            }
            Format::ASTC_8x5_SRGB_BLOCK => FormatInfo::compressed(16, [8, 5], C::ASTC_LDR, N::SRGB),
            Format::ASTC_8x6_UNORM_BLOCK => {
                FormatInfo::compressed(16, [8, 6], C::ASTC_LDR, N::UNORM)
            }
            Format::ASTC_8x6_SRGB_BLOCK => FormatInfo::compressed(16, [8, 6], C::ASTC_LDR, N::SRGB),
            Format::ASTC_8x8_UNORM_BLOCK => {
                FormatInfo::compressed(16, [8, 8], C::ASTC_LDR, N::UNORM)
            }
            Format::ASTC_8x8_SRGB_BLOCK => FormatInfo::compressed(16, [8, 8], C::ASTC_LDR, N::SRGB),
            Format::ASTC_10x5_UNORM_BLOCK => {
                FormatInfo::compressed(16, [10, 5], C::ASTC_LDR, N::UNORM)
            }
            Format::ASTC_10x5_SRGB_BLOCK => {
                FormatInfo::compressed(16, [10, 5], C::ASTC_LDR, N::SRGB)
            }
            Format::ASTC_10x6_UNORM_BLOCK => {
                FormatInfo::compressed(16, [10, 6], C::ASTC_LDR, N::UNORM)
            }
            Format::ASTC_10x6_SRGB_BLOCK => {
                FormatInfo::compressed(16, [10, 6], C::ASTC_LDR, N::SRGB)
            }
            Format::ASTC_10x8_UNORM_BLOCK => {
                FormatInfo::compressed(16, [10, 8], C::ASTC_LDR, N::UNORM)
            }
            Format::ASTC_10x8_SRGB_BLOCK => {
                FormatInfo::compressed(16, [10, 8], C::ASTC_LDR, N::SRGB)
            }
            Format::ASTC_10x10_UNORM_BLOCK => {
                FormatInfo::compressed(16, [10, 10], C::ASTC_LDR, N::UNORM)
            }
            Format::ASTC_10x10_SRGB_BLOCK => {
                FormatInfo::compressed(16, [10, 10], C::ASTC_LDR, N::SRGB)
            }
            Format::ASTC_12x10_UNORM_BLOCK => {
                FormatInfo::compressed(16, [12, 10], C::ASTC_LDR, N::UNORM)
            }
            Format::ASTC_12x10_SRGB_BLOCK => {
                FormatInfo::compressed(16, [12, 10], C::ASTC_LDR, N::SRGB)
            }
            Format::ASTC_12x12_UNORM_BLOCK => {
                FormatInfo::compressed(16, [12, 12], C::ASTC_LDR, N::UNORM)
            }
            Format::ASTC_12x12_SRGB_BLOCK => {
                FormatInfo::compressed(16, [12, 12], C::ASTC_LDR, N::SRGB)
            }
            Format::G8B8G8R8_422_UNORM | Format::B8G8R8G8_422_UNORM => FormatInfo::ycbcr_422(4),
            Format::G8_B8_R8_3PLANE_420_UNORM => FormatInfo::multi_planar(
                &[Format::R8_UNORM, Format::R8_UNORM, Format::R8_UNORM],
                ChromaSampling::Mode420,
            ),
            Format::G8_B8R8_2PLANE_420_UNORM => FormatInfo::multi_planar(
                &[Format::R8_UNORM, Format::R8G8_UNORM],
                ChromaSampling::Mode420,
            ),
            Format::G8_B8_R8_3PLANE_422_UNORM => FormatInfo::multi_planar(
                &[Format::R8_UNORM, Format::R8_UNORM, Format::R8_UNORM],
                ChromaSampling::Mode422,
            ),
            Format::G8_B8R8_2PLANE_422_UNORM => FormatInfo::multi_planar(
                &[Format::R8_UNORM, Format::R8G8_UNORM],
                ChromaSampling::Mode422,
            ),
            Format::G8_B8_R8_3PLANE_444_UNORM => FormatInfo::multi_planar(
                &[Format::R8_UNORM, Format::R8_UNORM, Format::R8_UNORM],
                ChromaSampling::Mode444,
            ),
            Format::R10X6_UNORM_PACK16 => FormatInfo::color(2, N::UNORM),
            Format::R10X6G10X6_UNORM_2PACK16 => FormatInfo::color(4, N::UNORM),
            Format::R10X6G10X6B10X6A10X6_UNORM_4PACK16 => FormatInfo::color(8, N::UNORM),
            Format::G10X6B10X6G10X6R10X6_422_UNORM_4PACK16
            | Format::B10X6G10X6R10X6G10X6_422_UNORM_4PACK16 => {
                FormatInfo::ycbcr_422(8)
            }
            Format::G10X6_B10X6_R10X6_3PLANE_420_UNORM_3PACK16 => FormatInfo::multi_planar(
                &[
                    Format::R10X6_UNORM_PACK16,
                    Format::R10X6_UNORM_PACK16,
                    Format::R10X6_UNORM_PACK16,
                ],
                ChromaSampling::Mode420,
            ),
            Format::G10X6_B10X6R10X6_2PLANE_420_UNORM_3PACK16 => FormatInfo::multi_planar(
                &[Format::R10X6_UNORM_PACK16, Format::R10X6G10X6_UNORM_2PACK16],
                ChromaSampling::Mode420,
            ),
            Format::G10X6_B10X6_R10X6_3PLANE_422_UNORM_3PACK16 => FormatInfo::multi_planar(
                &[
                    Format::R10X6_UNORM_PACK16,
                    Format::R10X6_UNORM_PACK16,
                    Format::R10X6_UNORM_PACK16,
                ],
                ChromaSampling::Mode422,
            ),
            Format::G10X6_B10X6R10X6_2PLANE_422_UNORM_3PACK16 => FormatInfo::multi_planar(
                &[Format::R10X6_UNORM_PACK16, Format::R10X6G10X6_UNORM_2PACK16],
                ChromaSampling::Mode422,
            ),
            Format::G10X6_B10X6_R10X6_3PLANE_444_UNORM_3PACK16 => FormatInfo::multi_planar(
                &[
                    Format::R10X6_UNORM_PACK16,
                    Format::R10X6_UNORM_PACK16,
                    Format::R10X6_UNORM_PACK16,
                ],
                ChromaSampling::Mode444,
            ),
            Format::R12X4_UNORM_PACK16 => FormatInfo::color(2, N::UNORM),
            Format::R12X4G12X4_UNORM_2PACK16 => FormatInfo::color(4, N::UNORM),
            Format::R12X4G12X4B12X4A12X4_UNORM_4PACK16 => FormatInfo::color(8, N::UNORM),
            Format::G12X4B12X4G12X4R12X4_422_UNORM_4PACK16
            | Format::B12X4G12X4R12X4G12X4_422_UNORM_4PACK16 => {
                FormatInfo::ycbcr_422(8)
            }
            Format::G12X4_B12X4_R12X4_3PLANE_420_UNORM_3PACK16 => FormatInfo::multi_planar(
                &[
                    Format::R12X4_UNORM_PACK16,
                    Format::R12X4_UNORM_PACK16,
                    Format::R12X4_UNORM_PACK16,
                ],
                ChromaSampling::Mode420,
            ),
            Format::G12X4_B12X4R12X4_2PLANE_420_UNORM_3PACK16 => FormatInfo::multi_planar(
                &[Format::R12X4_UNORM_PACK16, Format::R12X4G12X4_UNORM_2PACK16],
                ChromaSampling::Mode420,
            ),
            Format::G12X4_B12X4_R12X4_3PLANE_422_UNORM_3PACK16 => FormatInfo::multi_planar(
                &[
                    Format::R12X4_UNORM_PACK16,
                    Format::R12X4_UNORM_PACK16,
                    Format::R12X4_UNORM_PACK16,
                ],
                ChromaSampling::Mode422,
            ),
            Format::G12X4_B12X4R12X4_2PLANE_422_UNORM_3PACK16 => FormatInfo::multi_planar(
                &[Format::R12X4_UNORM_PACK16, Format::R12X4G12X4_UNORM_2PACK16],
                ChromaSampling::Mode422,
            ),
            Format::G12X4_B12X4_R12X4_3PLANE_444_UNORM_3PACK16 => FormatInfo::multi_planar(
                &[
                    Format::R12X4_UNORM_PACK16,
                    Format::R12X4_UNORM_PACK16,
                    Format::R12X4_UNORM_PACK16,
                ],
                ChromaSampling::Mode444,
            ),
            Format::G16B16G16R16_422_UNORM | Format::B16G16R16G16_422_UNORM => {
                FormatInfo::ycbcr_422(8)
            }
            Format::G16_B16_R16_3PLANE_420_UNORM => FormatInfo::multi_planar(
                &[Format::R16_UNORM, Format::R16_UNORM, Format::R16_UNORM],
                ChromaSampling::Mode420,
            ),
            Format::G16_B16R16_2PLANE_420_UNORM => FormatInfo::multi_planar(
                &[Format::R16_UNORM, Format::R16G16_UNORM],
                ChromaSampling::Mode420,
            ),
            Format::G16_B16_R16_3PLANE_422_UNORM => FormatInfo::multi_planar(
                &[Format::R16_UNORM, Format::R16_UNORM, Format::R16_UNORM],
                ChromaSampling::Mode422,
            ),
            Format::G16_B16R16_2PLANE_422_UNORM => FormatInfo::multi_planar(
                &[Format::R16_UNORM, Format::R16G16_UNORM],
                ChromaSampling::Mode422,
            ),
            Format::G16_B16_R16_3PLANE_444_UNORM => FormatInfo::multi_planar(
                &[Format::R16_UNORM, Format::R16_UNORM, Format::R16_UNORM],
                ChromaSampling::Mode444,
            ),
            Format::G8_B8R8_2PLANE_444_UNORM => FormatInfo::multi_planar(
                &[Format::R8_UNORM, Format::R8G8_UNORM],
                ChromaSampling::Mode444,
            ),
            Format::G10X6_B10X6R10X6_2PLANE_444_UNORM_3PACK16 => FormatInfo::multi_planar(
                &[Format::R10X6_UNORM_PACK16, Format::R10X6G10X6_UNORM_2PACK16],
                ChromaSampling::Mode444,
            ),
            Format::G12X4_B12X4R12X4_2PLANE_444_UNORM_3PACK16 => FormatInfo::multi_planar(
                &[Format::R12X4_UNORM_PACK16, Format::R12X4G12X4_UNORM_2PACK16],
                ChromaSampling::Mode444,
            ),
            Format::G16_B16R16_2PLANE_444_UNORM => FormatInfo::multi_planar(
                &[Format::R16_UNORM, Format::R16G16_UNORM],
                ChromaSampling::Mode444,
            ),
            Format::A4R4G4B4_UNORM_PACK16 | Format::A4B4G4R4_UNORM_PACK16 => {
                FormatInfo::color(2, N::UNORM)
            }
            Format::ASTC_4x4_SFLOAT_BLOCK => {
                FormatInfo::compressed(16, [4, 4], C::ASTC_HDR, N::SFLOAT)
            }
            Format::ASTC_5x4_SFLOAT_BLOCK => {
                FormatInfo::compressed(16, [5, 4], C::ASTC_HDR, N::SFLOAT)
            }
            Format::ASTC_5x5_SFLOAT_BLOCK => {
                FormatInfo::compressed(16, [5, 5], C::ASTC_HDR, N::SFLOAT)
            }
            Format::ASTC_6x5_SFLOAT_BLOCK => {
                FormatInfo::compressed(16, [6, 5], C::ASTC_HDR, N::SFLOAT)
            }
            Format::ASTC_6x6_SFLOAT_BLOCK => {
                FormatInfo::compressed(16, [6, 6], C::ASTC_HDR, N::SFLOAT)
            }
            Format::ASTC_8x5_SFLOAT_BLOCK => {
                FormatInfo::compressed(16, [8, 5], C::ASTC_HDR, N::SFLOAT)
            }
            Format::ASTC_8x6_SFLOAT_BLOCK => {
                FormatInfo::compressed(16, [8, 6], C::ASTC_HDR, N::SFLOAT)
            }
            Format::ASTC_8x8_SFLOAT_BLOCK => {
                FormatInfo::compressed(16, [8, 8], C::ASTC_HDR, N::SFLOAT)
            }
            Format::ASTC_10x5_SFLOAT_BLOCK => {
                FormatInfo::compressed(16, [10, 5], C::ASTC_HDR, N::SFLOAT)
            }
            Format::ASTC_10x6_SFLOAT_BLOCK => {
                FormatInfo::compressed(16, [10, 6], C::ASTC_HDR, N::SFLOAT)
            }
            Format::ASTC_10x8_SFLOAT_BLOCK => {
                FormatInfo::compressed(16, [10, 8], C::ASTC_HDR, N::SFLOAT)
            }
            Format::ASTC_10x10_SFLOAT_BLOCK => {
                FormatInfo::compressed(16, [10, 10], C::ASTC_HDR, N::SFLOAT)
            }
            Format::ASTC_12x10_SFLOAT_BLOCK => {
                FormatInfo::compressed(16, [12, 10], C::ASTC_HDR, N::SFLOAT)
            }
            Format::ASTC_12x12_SFLOAT_BLOCK => {
                FormatInfo::compressed(16, [12, 12], C::ASTC_HDR, N::SFLOAT)
            }
        }
    }

    /// Returns the aspects that images of this format have.
    ///
    /// For multi-planar formats, this includes `COLOR` and one `PLANE_n` aspect per plane.
    #[inline]
    pub fn aspects(self) -> ImageAspects {
        self.info().aspects
    }

    /// Returns the size in bytes of a single texel block, or `None` for `UNDEFINED` and
    /// multi-planar formats, which have no single block size.
    ///
    /// For depth/stencil formats, this is the combined size of both aspects.
    #[inline]
    pub fn block_size(self) -> Option<DeviceSize> {
        let size = self.info().block_size;
        (size != 0).then_some(size)
    }

    /// Returns the size in bytes of a single texel block of `aspect`.
    ///
    /// For combined depth/stencil formats this is the size of the depth or stencil component
    /// alone. For multi-planar formats with a `PLANE_n` aspect, this is the block size of the
    /// plane's format.
    pub fn block_size_for_aspect(self, aspect: ImageAspects) -> Option<DeviceSize> {
        let info = self.info();

        if info.aspects.contains(ImageAspects::DEPTH | ImageAspects::STENCIL) {
            if aspect == ImageAspects::DEPTH {
                return Some(info.depth_size);
            } else if aspect == ImageAspects::STENCIL {
                return Some(1);
            }
        }

        if !info.planes.is_empty() {
            if let Some(plane) = aspect.plane_index() {
                return info.planes.get(plane).and_then(|format| format.block_size());
            }
        }

        self.block_size()
    }

    /// Returns the dimensions in texels (horizontally, vertically and depth) of a single texel
    /// block of this format. A texel block is a rectangle of texels that is always stored and
    /// accessed as a whole.
    ///
    /// For normal formats, the block extent is `[1, 1, 1]`, meaning that each texel is its own
    /// block. For compressed formats, each block consists of multiple texels.
    #[inline]
    pub fn block_extent(self) -> [u32; 3] {
        self.info().block_extent
    }

    /// Returns the compatibility class of the format.
    #[inline]
    pub fn compatibility(self) -> FormatCompatibility {
        FormatCompatibility(self.info().block_size)
    }

    /// Returns the block compression scheme of the format, if any.
    #[inline]
    pub fn compression(self) -> Option<CompressionType> {
        self.info().compression
    }

    /// Returns the single-plane formats of the planes of a multi-planar format, or an empty
    /// slice for other formats.
    #[inline]
    pub fn planes(self) -> &'static [Format] {
        self.info().planes
    }

    /// Returns the number of planes: 1 for single-plane formats, 2 or 3 for multi-planar ones.
    #[inline]
    pub fn plane_count(self) -> u32 {
        self.planes().len().max(1) as u32
    }

    /// Returns the format that is compatible with plane `plane` of a multi-planar format.
    #[inline]
    pub fn plane_compatible_format(self, plane: usize) -> Option<Format> {
        self.planes().get(plane).copied()
    }

    /// Returns the factors by which the width and height of plane `plane` are divided relative
    /// to the image extent.
    pub fn plane_extent_divisors(self, plane: usize) -> [u32; 2] {
        match self.info().chroma_sampling {
            Some(chroma_sampling) if plane != 0 && !self.planes().is_empty() => {
                chroma_sampling.subsampled_divisors()
            }
            _ => [1, 1],
        }
    }

    /// For YCbCr formats, returns the type of chroma sampling used.
    #[inline]
    pub fn ycbcr_chroma_sampling(self) -> Option<ChromaSampling> {
        self.info().chroma_sampling
    }

    /// Returns the numeric type of the color components, if any.
    #[inline]
    pub fn type_color(self) -> Option<NumericType> {
        self.info().type_color
    }

    /// Returns the numeric type of the depth component, if any.
    #[inline]
    pub fn type_depth(self) -> Option<NumericType> {
        self.info().type_depth
    }

    /// Returns the numeric type of the stencil component, if any.
    #[inline]
    pub fn type_stencil(self) -> Option<NumericType> {
        self.aspects()
            .intersects(ImageAspects::STENCIL)
            .then_some(NumericType::UINT)
    }

    #[inline]
    pub fn is_color(self) -> bool {
        self.aspects().intersects(ImageAspects::COLOR)
    }

    #[inline]
    pub fn is_depth_only(self) -> bool {
        self.aspects() == ImageAspects::DEPTH
    }

    #[inline]
    pub fn is_stencil_only(self) -> bool {
        self.aspects() == ImageAspects::STENCIL
    }

    #[inline]
    pub fn is_depth_and_stencil(self) -> bool {
        self.aspects() == ImageAspects::DEPTH | ImageAspects::STENCIL
    }

    /// Returns whether the format has a depth or a stencil component, or both.
    #[inline]
    pub fn is_depth_or_stencil(self) -> bool {
        self.aspects()
            .intersects(ImageAspects::DEPTH | ImageAspects::STENCIL)
    }

    /// Returns whether the format is block-compressed (BC, ETC2/EAC or ASTC).
    #[inline]
    pub fn is_compressed(self) -> bool {
        self.compression().is_some()
    }

    #[inline]
    pub fn is_multi_planar(self) -> bool {
        !self.planes().is_empty()
    }

    /// Returns whether the format is a single-plane format with 422 chroma subsampling.
    #[inline]
    pub fn is_single_plane_422(self) -> bool {
        self.planes().is_empty() && self.ycbcr_chroma_sampling() == Some(ChromaSampling::Mode422)
    }

    /// Returns whether the format has a block extent other than `[1, 1, 1]`.
    #[inline]
    pub fn has_block_extent(self) -> bool {
        self.block_extent() != [1, 1, 1]
    }

    /// Returns whether images of this format require a sampler YCbCr conversion to be sampled.
    #[inline]
    pub fn requires_sampler_ycbcr_conversion(self) -> bool {
        self.ycbcr_chroma_sampling().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification() {
        assert!(Format::R8G8B8A8_UNORM.is_color());
        assert!(Format::D32_SFLOAT.is_depth_only());
        assert!(Format::S8_UINT.is_stencil_only());
        assert!(Format::D24_UNORM_S8_UINT.is_depth_and_stencil());
        assert!(Format::BC7_SRGB_BLOCK.is_compressed());
        assert!(Format::ASTC_5x4_UNORM_BLOCK.is_compressed());
        assert!(!Format::G8B8G8R8_422_UNORM.is_compressed());
        assert!(Format::G8B8G8R8_422_UNORM.is_single_plane_422());
        assert!(!Format::G8_B8R8_2PLANE_422_UNORM.is_single_plane_422());
        assert!(Format::G8_B8R8_2PLANE_420_UNORM.is_multi_planar());
    }

    #[test]
    fn block_extent() {
        assert_eq!(Format::R8_UNORM.block_extent(), [1, 1, 1]);
        assert_eq!(Format::BC1_RGB_UNORM_BLOCK.block_extent(), [4, 4, 1]);
        assert_eq!(Format::ASTC_12x12_UNORM_BLOCK.block_extent(), [12, 12, 1]);
        assert_eq!(Format::B8G8R8G8_422_UNORM.block_extent(), [2, 1, 1]);
    }

    #[test]
    fn block_size() {
        assert_eq!(Format::UNDEFINED.block_size(), None);
        assert_eq!(Format::R32G32B32_SFLOAT.block_size(), Some(12));
        assert_eq!(Format::G8_B8_R8_3PLANE_420_UNORM.block_size(), None);
        assert_eq!(Format::D32_SFLOAT_S8_UINT.block_size(), Some(8));
        assert_eq!(
            Format::D32_SFLOAT_S8_UINT.block_size_for_aspect(ImageAspects::DEPTH),
            Some(4),
        );
        assert_eq!(
            Format::D16_UNORM_S8_UINT.block_size_for_aspect(ImageAspects::STENCIL),
            Some(1),
        );
        assert_eq!(
            Format::G16_B16R16_2PLANE_420_UNORM.block_size_for_aspect(ImageAspects::PLANE_1),
            Some(4),
        );
    }

    #[test]
    fn compatibility() {
        assert_eq!(
            Format::R8G8B8A8_UNORM.compatibility(),
            Format::R32_SFLOAT.compatibility(),
        );
        assert_eq!(
            Format::BC1_RGBA_SRGB_BLOCK.compatibility(),
            Format::R32G32_UINT.compatibility(),
        );
        assert_ne!(
            Format::R8G8B8A8_UNORM.compatibility(),
            Format::R16G16B16A16_UNORM.compatibility(),
        );
    }

    #[test]
    fn planes() {
        let format = Format::G8_B8_R8_3PLANE_420_UNORM;
        assert_eq!(format.plane_count(), 3);
        assert_eq!(format.plane_compatible_format(2), Some(Format::R8_UNORM));
        assert_eq!(format.plane_extent_divisors(0), [1, 1]);
        assert_eq!(format.plane_extent_divisors(1), [2, 2]);
        assert_eq!(Format::G8_B8R8_2PLANE_422_UNORM.plane_extent_divisors(1), [2, 1]);
        assert_eq!(Format::G8_B8_R8_3PLANE_444_UNORM.plane_extent_divisors(2), [1, 1]);
        assert_eq!(Format::R8_UNORM.plane_count(), 1);
        assert_eq!(Format::R8_UNORM.plane_extent_divisors(0), [1, 1]);
    }

    #[test]
    fn extended_formats() {
        assert_eq!(Format::R16G16_UINT.block_size(), Some(4));
        assert_eq!(Format::R8G8_SNORM.type_color(), Some(NumericType::SNORM));
        assert_eq!(Format::A2R10G10B10_SINT_PACK32.type_color(), Some(NumericType::SINT));
        assert_eq!(Format::B8G8R8_USCALED.block_size(), Some(3));

        assert_eq!(Format::BC3_SRGB_BLOCK.compression(), Some(CompressionType::BC));
        assert_eq!(Format::ETC2_R8G8B8A1_SRGB_BLOCK.block_size(), Some(8));
        assert_eq!(Format::ASTC_10x10_SRGB_BLOCK.block_extent(), [10, 10, 1]);
        assert_eq!(
            Format::ASTC_6x5_SFLOAT_BLOCK.compression(),
            Some(CompressionType::ASTC_HDR),
        );

        let format = Format::G12X4_B12X4_R12X4_3PLANE_422_UNORM_3PACK16;
        assert!(format.is_multi_planar());
        assert_eq!(format.plane_count(), 3);
        assert_eq!(
            format.plane_compatible_format(1),
            Some(Format::R12X4_UNORM_PACK16),
        );
        assert_eq!(format.plane_extent_divisors(1), [2, 1]);

        let format = Format::G16_B16R16_2PLANE_444_UNORM;
        assert_eq!(
            format.block_size_for_aspect(ImageAspects::PLANE_1),
            Some(4),
        );
        assert_eq!(format.plane_extent_divisors(1), [1, 1]);
        assert!(Format::G10X6B10X6G10X6R10X6_422_UNORM_4PACK16.is_single_plane_422());
    }

    #[test]
    fn conversion() {
        assert_eq!(
            ash::vk::Format::from(Format::D24_UNORM_S8_UINT),
            ash::vk::Format::D24_UNORM_S8_UINT,
        );
        assert_eq!(
            Format::try_from(ash::vk::Format::ASTC_8X8_SRGB_BLOCK),
            Ok(Format::ASTC_8x8_SRGB_BLOCK),
        );
        assert!(Format::try_from(ash::vk::Format::PVRTC1_2BPP_UNORM_BLOCK_IMG).is_err());
    }
}
