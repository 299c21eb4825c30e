// Copyright (c) 2016 The vulkano developers
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or https://opensource.org/licenses/MIT>,
// at your option. All files in the project carrying such
// notice may not be copied, modified, or distributed except
// according to those terms.

//! Settings that control which checks run, and the device properties they check against.
//!
//! The validator does not query the physical device. The layer fills in a [`ValidationConfig`]
//! from the enabled features, enabled extensions and properties of the device when it is created.

use crate::DeviceSize;

/// All the settings of a [`DeviceValidator`](crate::validator::DeviceValidator).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ValidationConfig {
    /// Subsystems that should not run.
    pub disabled: DisabledChecks,

    /// The device features that were enabled when the device was created.
    pub features: DeviceFeatures,

    /// The device extensions that were enabled when the device was created.
    pub extensions: DeviceExtensions,

    /// The limits of the physical device.
    pub limits: DeviceLimits,
}

/// Each option, when `true`, disables the corresponding subsystem.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DisabledChecks {
    /// Disables tracking and checking of image layouts, both at recording and at submission.
    pub image_layout_validation: bool,

    /// Disables checking the lifecycle state of command buffers at submission.
    pub command_buffer_state: bool,
}

/// Device features that affect validation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DeviceFeatures {
    pub descriptor_binding_uniform_buffer_update_after_bind: bool,
    pub descriptor_binding_sampled_image_update_after_bind: bool,
    pub descriptor_binding_storage_image_update_after_bind: bool,
    pub descriptor_binding_storage_buffer_update_after_bind: bool,
    pub descriptor_binding_uniform_texel_buffer_update_after_bind: bool,
    pub descriptor_binding_storage_texel_buffer_update_after_bind: bool,
    pub descriptor_binding_inline_uniform_block_update_after_bind: bool,
    pub descriptor_binding_acceleration_structure_update_after_bind: bool,
    pub descriptor_binding_update_unused_while_pending: bool,
    pub descriptor_binding_partially_bound: bool,
    pub descriptor_binding_variable_descriptor_count: bool,
    pub inline_uniform_block: bool,
    pub imageless_framebuffer: bool,
    pub sampler_ycbcr_conversion: bool,
    pub separate_depth_stencil_layouts: bool,
}

/// Device extensions that affect validation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DeviceExtensions {
    pub khr_maintenance1: bool,
    pub khr_maintenance2: bool,
    pub khr_shared_presentable_image: bool,
    pub khr_sampler_ycbcr_conversion: bool,
    pub khr_push_descriptor: bool,
    pub khr_imageless_framebuffer: bool,
    pub khr_separate_depth_stencil_layouts: bool,
    pub ext_inline_uniform_block: bool,
    pub ext_descriptor_indexing: bool,
}

/// Limits of the physical device.
///
/// The default values are the minimums that every implementation must support.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DeviceLimits {
    pub max_image_dimension1_d: u32,
    pub max_image_dimension2_d: u32,
    pub max_image_dimension3_d: u32,
    pub max_image_array_layers: u32,
    pub max_uniform_buffer_range: u32,
    pub max_storage_buffer_range: u32,
    pub max_push_descriptors: u32,
    pub max_inline_uniform_block_size: u32,
    pub min_uniform_buffer_offset_alignment: DeviceSize,
    pub min_storage_buffer_offset_alignment: DeviceSize,
}

impl Default for DeviceLimits {
    #[inline]
    fn default() -> Self {
        Self {
            max_image_dimension1_d: 4096,
            max_image_dimension2_d: 4096,
            max_image_dimension3_d: 256,
            max_image_array_layers: 256,
            max_uniform_buffer_range: 16384,
            max_storage_buffer_range: 1 << 27,
            max_push_descriptors: 32,
            max_inline_uniform_block_size: 256,
            min_uniform_buffer_offset_alignment: 256,
            min_storage_buffer_offset_alignment: 256,
        }
    }
}
