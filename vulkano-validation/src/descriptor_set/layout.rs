// Copyright (c) 2016 The vulkano developers
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or https://opensource.org/licenses/MIT>,
// at your option. All files in the project carrying such
// notice may not be copied, modified, or distributed except
// according to those terms.

//! Describes the layout of all descriptors within a descriptor set.
//!
//! When a descriptor set layout is created, its bindings are sorted by binding number and turned
//! into a [`DescriptorSetLayoutDef`]. Definitions are canonicalized process-wide through the
//! [dictionary](super::dictionary), so that layouts created with identical parameters share one
//! definition, and compatibility between them is a pointer comparison.

use super::dictionary;
use crate::{
    config::{DeviceFeatures, ValidationConfig},
    macros::{vulkan_bitflags, vulkan_enum},
    sampler::SamplerState,
    validator::lookup,
    Requires, RequiresAllOf, RequiresOneOf, ValidationError,
};
use foldhash::HashMap;
use std::{
    collections::{BTreeMap, BTreeSet},
    hash::{Hash, Hasher},
    ops::Range,
    sync::Arc,
};

/// Parameters to create a new descriptor set layout.
#[derive(Clone, Debug)]
pub struct DescriptorSetLayoutCreateInfo {
    /// Specifies how to create the descriptor set layout.
    pub flags: DescriptorSetLayoutCreateFlags,

    /// The bindings of the desriptor set layout, in any order.
    ///
    /// The default value is empty.
    pub bindings: Vec<DescriptorSetLayoutBinding>,

    pub _ne: crate::NonExhaustive,
}

impl Default for DescriptorSetLayoutCreateInfo {
    #[inline]
    fn default() -> Self {
        Self {
            flags: DescriptorSetLayoutCreateFlags::empty(),
            bindings: Vec::new(),
            _ne: crate::NonExhaustive(()),
        }
    }
}

impl DescriptorSetLayoutCreateInfo {
    pub(crate) fn validate(
        &self,
        config: &ValidationConfig,
        samplers: &HashMap<ash::vk::Sampler, SamplerState>,
    ) -> Result<(), Box<ValidationError>> {
        let &Self {
            flags,
            ref bindings,
            _ne: _,
        } = self;

        flags
            .validate_device(&config.features, &config.extensions)
            .map_err(|err| {
                err.add_context("flags")
                    .set_vuids(&["VUID-VkDescriptorSetLayoutCreateInfo-flags-parameter"])
            })?;

        let mut binding_nums = BTreeSet::new();

        for (index, binding) in bindings.iter().enumerate() {
            if !binding_nums.insert(binding.binding) {
                return Err(Box::new(ValidationError {
                    problem: format!(
                        "`bindings[{}].binding` is {}, which is also the binding number of an \
                        earlier element of `bindings`",
                        index, binding.binding,
                    )
                    .into(),
                    vuids: &["VUID-VkDescriptorSetLayoutCreateInfo-binding-00279"],
                    ..Default::default()
                }));
            }
        }

        let highest_binding_num = binding_nums.last().copied();
        let is_push_descriptor = flags.intersects(DescriptorSetLayoutCreateFlags::PUSH_DESCRIPTOR);
        let mut total_descriptor_count: u32 = 0;
        let mut update_after_bind_binding = None;
        let mut buffer_dynamic_binding = None;

        for (index, binding) in bindings.iter().enumerate() {
            binding
                .validate(config, samplers)
                .map_err(|err| err.add_context(format!("bindings[{}]", index)))?;

            let &DescriptorSetLayoutBinding {
                binding: binding_num,
                descriptor_type,
                descriptor_count,
                stages: _,
                immutable_samplers: _,
                binding_flags,
                _ne: _,
            } = binding;

            total_descriptor_count = total_descriptor_count
                .checked_add(descriptor_count)
                .ok_or_else(|| {
                    Box::new(ValidationError {
                        problem: format!(
                            "the sum of `descriptor_count` over `bindings[..={}]` overflows a \
                            `u32`",
                            index,
                        )
                        .into(),
                        ..Default::default()
                    })
                })?;

            if is_push_descriptor {
                if descriptor_type.is_dynamic() {
                    return Err(Box::new(ValidationError {
                        problem: format!(
                            "`flags` contains `DescriptorSetLayoutCreateFlags::PUSH_DESCRIPTOR`, \
                            and `bindings[{}].descriptor_type` is \
                            `DescriptorType::UniformBufferDynamic` or \
                            `DescriptorType::StorageBufferDynamic`",
                            index,
                        )
                        .into(),
                        vuids: &["VUID-VkDescriptorSetLayoutCreateInfo-flags-00280"],
                        ..Default::default()
                    }));
                }

                if descriptor_type == DescriptorType::InlineUniformBlock {
                    return Err(Box::new(ValidationError {
                        problem: format!(
                            "`flags` contains `DescriptorSetLayoutCreateFlags::PUSH_DESCRIPTOR`, \
                            and `bindings[{}].descriptor_type` is \
                            `DescriptorType::InlineUniformBlock`",
                            index,
                        )
                        .into(),
                        vuids: &["VUID-VkDescriptorSetLayoutCreateInfo-flags-02208"],
                        ..Default::default()
                    }));
                }

                if binding_flags.intersects(
                    DescriptorBindingFlags::UPDATE_AFTER_BIND
                        | DescriptorBindingFlags::UPDATE_UNUSED_WHILE_PENDING
                        | DescriptorBindingFlags::VARIABLE_DESCRIPTOR_COUNT,
                ) {
                    return Err(Box::new(ValidationError {
                        problem: format!(
                            "`flags` contains `DescriptorSetLayoutCreateFlags::PUSH_DESCRIPTOR`, \
                            and `bindings[{}].binding_flags` contains \
                            `DescriptorBindingFlags::UPDATE_AFTER_BIND`, \
                            `DescriptorBindingFlags::UPDATE_UNUSED_WHILE_PENDING` or \
                            `DescriptorBindingFlags::VARIABLE_DESCRIPTOR_COUNT`",
                            index,
                        )
                        .into(),
                        vuids: &["VUID-VkDescriptorSetLayoutBindingFlagsCreateInfo-flags-03003"],
                        ..Default::default()
                    }));
                }
            }

            if binding_flags.intersects(DescriptorBindingFlags::VARIABLE_DESCRIPTOR_COUNT)
                && Some(binding_num) != highest_binding_num
            {
                return Err(Box::new(ValidationError {
                    problem: format!(
                        "`bindings[{}].binding_flags` contains \
                        `DescriptorBindingFlags::VARIABLE_DESCRIPTOR_COUNT`, but {} is not the \
                        highest binding number in `bindings`",
                        index, binding_num,
                    )
                    .into(),
                    vuids: &[
                        "VUID-VkDescriptorSetLayoutBindingFlagsCreateInfo-pBindingFlags-03004",
                    ],
                    ..Default::default()
                }));
            }

            if binding_flags.intersects(DescriptorBindingFlags::UPDATE_AFTER_BIND) {
                if !flags.intersects(DescriptorSetLayoutCreateFlags::UPDATE_AFTER_BIND_POOL) {
                    return Err(Box::new(ValidationError {
                        problem: format!(
                            "`bindings[{}].binding_flags` contains \
                            `DescriptorBindingFlags::UPDATE_AFTER_BIND`, but `flags` does not \
                            contain `DescriptorSetLayoutCreateFlags::UPDATE_AFTER_BIND_POOL`",
                            index,
                        )
                        .into(),
                        vuids: &["VUID-VkDescriptorSetLayoutCreateInfo-flags-03000"],
                        ..Default::default()
                    }));
                }

                update_after_bind_binding.get_or_insert(index);
            }

            if descriptor_type.is_dynamic() {
                buffer_dynamic_binding.get_or_insert(index);
            }
        }

        if is_push_descriptor && total_descriptor_count > config.limits.max_push_descriptors {
            return Err(Box::new(ValidationError {
                problem: format!(
                    "`flags` contains `DescriptorSetLayoutCreateFlags::PUSH_DESCRIPTOR`, and the \
                    total number of descriptors in `bindings` ({}) exceeds the \
                    `max_push_descriptors` limit ({})",
                    total_descriptor_count, config.limits.max_push_descriptors,
                )
                .into(),
                vuids: &["VUID-VkDescriptorSetLayoutCreateInfo-flags-00281"],
                ..Default::default()
            }));
        }

        if let (Some(update_after_bind_binding), Some(buffer_dynamic_binding)) =
            (update_after_bind_binding, buffer_dynamic_binding)
        {
            return Err(Box::new(ValidationError {
                problem: format!(
                    "`bindings[{}].binding_flags` contains \
                    `DescriptorBindingFlags::UPDATE_AFTER_BIND`, and \
                    `bindings[{}].descriptor_type` is `DescriptorType::UniformBufferDynamic` or \
                    `DescriptorType::StorageBufferDynamic`",
                    update_after_bind_binding, buffer_dynamic_binding,
                )
                .into(),
                vuids: &["VUID-VkDescriptorSetLayoutCreateInfo-descriptorType-03001"],
                ..Default::default()
            }));
        }

        Ok(())
    }
}

vulkan_bitflags! {
    /// Flags that control how a descriptor set layout is created.
    DescriptorSetLayoutCreateFlags = DescriptorSetLayoutCreateFlags(u32);

    /// Descriptor sets with this layout must be allocated from a pool with
    /// [`DescriptorPoolCreateFlags::UPDATE_AFTER_BIND`]. Required when any binding has
    /// [`DescriptorBindingFlags::UPDATE_AFTER_BIND`].
    ///
    /// [`DescriptorPoolCreateFlags::UPDATE_AFTER_BIND`]: super::DescriptorPoolCreateFlags::UPDATE_AFTER_BIND
    UPDATE_AFTER_BIND_POOL = UPDATE_AFTER_BIND_POOL
    RequiresOneOf([
        RequiresAllOf([DeviceExtension(ext_descriptor_indexing)]),
    ]),

    /// The layout can only be used for push descriptors, and not to allocate descriptor sets.
    PUSH_DESCRIPTOR = PUSH_DESCRIPTOR_KHR
    RequiresOneOf([
        RequiresAllOf([DeviceExtension(khr_push_descriptor)]),
    ]),
}

vulkan_bitflags! {
    /// Flags that control how a binding in a descriptor set layout is created.
    DescriptorBindingFlags = DescriptorBindingFlags(u32);

    /// Descriptors in this binding can be updated after a command buffer that binds the set was
    /// recorded, as long as the command buffer is not executing.
    UPDATE_AFTER_BIND = UPDATE_AFTER_BIND
    RequiresOneOf([
        RequiresAllOf([DeviceExtension(ext_descriptor_indexing)]),
    ]),

    /// Descriptors in this binding that are not used by a pending command buffer can be updated.
    UPDATE_UNUSED_WHILE_PENDING = UPDATE_UNUSED_WHILE_PENDING
    RequiresOneOf([
        RequiresAllOf([DeviceExtension(ext_descriptor_indexing)]),
    ]),

    /// Descriptors in this binding can be left invalid as long as they are not dynamically used.
    /// They are not checked at draw time.
    PARTIALLY_BOUND = PARTIALLY_BOUND
    RequiresOneOf([
        RequiresAllOf([DeviceExtension(ext_descriptor_indexing)]),
    ]),

    /// The binding has a variable number of descriptors, chosen when a set is allocated. Only the
    /// binding with the highest binding number may have this flag.
    VARIABLE_DESCRIPTOR_COUNT = VARIABLE_DESCRIPTOR_COUNT
    RequiresOneOf([
        RequiresAllOf([DeviceExtension(ext_descriptor_indexing)]),
    ]),
}

vulkan_bitflags! {
    /// A set of shader stages.
    ShaderStages = ShaderStageFlags(u32);

    VERTEX = VERTEX,

    TESSELLATION_CONTROL = TESSELLATION_CONTROL,

    TESSELLATION_EVALUATION = TESSELLATION_EVALUATION,

    GEOMETRY = GEOMETRY,

    FRAGMENT = FRAGMENT,

    COMPUTE = COMPUTE,
}

/// A binding in a descriptor set layout.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct DescriptorSetLayoutBinding {
    /// The binding number.
    ///
    /// The default value is `0`.
    pub binding: u32,

    /// The content of each array element of the binding.
    ///
    /// There is no default value.
    pub descriptor_type: DescriptorType,

    /// How many descriptors (array elements) the binding is made of.
    ///
    /// For [`DescriptorType::InlineUniformBlock`], this is instead the size in bytes of the
    /// block, and must be a multiple of 4.
    ///
    /// The default value is `1`.
    pub descriptor_count: u32,

    /// Which shader stages access the descriptors of the binding.
    ///
    /// The default value is [`ShaderStages::empty()`].
    pub stages: ShaderStages,

    /// Samplers that are a fixed part of the layout. Either empty, or exactly
    /// `descriptor_count` samplers for a sampler or combined image sampler binding.
    ///
    /// The default value is empty.
    pub immutable_samplers: Vec<ash::vk::Sampler>,

    /// Specifies how to create the binding.
    ///
    /// The default value is empty.
    pub binding_flags: DescriptorBindingFlags,

    pub _ne: crate::NonExhaustive,
}

impl DescriptorSetLayoutBinding {
    /// Returns a `DescriptorSetLayoutBinding` with the given type.
    #[inline]
    pub fn descriptor_type(descriptor_type: DescriptorType) -> Self {
        Self {
            binding: 0,
            descriptor_type,
            descriptor_count: 1,
            stages: ShaderStages::empty(),
            immutable_samplers: Vec::new(),
            binding_flags: DescriptorBindingFlags::empty(),
            _ne: crate::NonExhaustive(()),
        }
    }

    /// Returns whether the binding has immutable samplers.
    #[inline]
    pub fn has_immutable_samplers(&self) -> bool {
        !self.immutable_samplers.is_empty()
    }

    pub(crate) fn validate(
        &self,
        config: &ValidationConfig,
        samplers: &HashMap<ash::vk::Sampler, SamplerState>,
    ) -> Result<(), Box<ValidationError>> {
        let &Self {
            binding: _,
            descriptor_type,
            descriptor_count,
            stages,
            ref immutable_samplers,
            binding_flags,
            _ne: _,
        } = self;

        binding_flags
            .validate_device(&config.features, &config.extensions)
            .map_err(|err| {
                err.add_context("binding_flags").set_vuids(&[
                    "VUID-VkDescriptorSetLayoutBindingFlagsCreateInfo-pBindingFlags-parameter",
                ])
            })?;

        descriptor_type
            .validate_device(&config.features, &config.extensions)
            .map_err(|err| {
                err.add_context("descriptor_type")
                    .set_vuids(&["VUID-VkDescriptorSetLayoutBinding-descriptorType-parameter"])
            })?;

        if descriptor_type == DescriptorType::InlineUniformBlock {
            if !config.features.inline_uniform_block {
                return Err(Box::new(ValidationError {
                    context: "descriptor_type".into(),
                    problem: "`DescriptorType::InlineUniformBlock`".into(),
                    requires_one_of: RequiresOneOf(&[RequiresAllOf(&[Requires::DeviceFeature(
                        "inline_uniform_block",
                    )])]),
                    vuids: &["VUID-VkDescriptorSetLayoutBinding-descriptorType-04604"],
                }));
            }

            if descriptor_count % 4 != 0 {
                return Err(Box::new(ValidationError {
                    problem: "`descriptor_type` is `DescriptorType::InlineUniformBlock`, and \
                        `descriptor_count` is not a multiple of 4"
                        .into(),
                    vuids: &["VUID-VkDescriptorSetLayoutBinding-descriptorType-02209"],
                    ..Default::default()
                }));
            }

            if descriptor_count > config.limits.max_inline_uniform_block_size {
                return Err(Box::new(ValidationError {
                    problem: "`descriptor_type` is `DescriptorType::InlineUniformBlock`, and \
                        `descriptor_count` is greater than the `max_inline_uniform_block_size` \
                        limit"
                        .into(),
                    vuids: &["VUID-VkDescriptorSetLayoutBinding-descriptorType-08004"],
                    ..Default::default()
                }));
            }
        }

        if descriptor_count != 0 {
            stages
                .validate_device(&config.features, &config.extensions)
                .map_err(|err| {
                    err.add_context("stages")
                        .set_vuids(&["VUID-VkDescriptorSetLayoutBinding-descriptorCount-00283"])
                })?;
        }

        if !immutable_samplers.is_empty() {
            if !matches!(
                descriptor_type,
                DescriptorType::Sampler | DescriptorType::CombinedImageSampler
            ) {
                return Err(Box::new(ValidationError {
                    problem: "`immutable_samplers` is not empty, but `descriptor_type` is not \
                        `DescriptorType::Sampler` or `DescriptorType::CombinedImageSampler`"
                        .into(),
                    vuids: &["VUID-VkDescriptorSetLayoutBinding-descriptorType-00282"],
                    ..Default::default()
                }));
            }

            if descriptor_count != immutable_samplers.len() as u32 {
                return Err(Box::new(ValidationError {
                    problem: "`immutable_samplers` is not empty, but its length does not equal \
                        `descriptor_count`"
                        .into(),
                    vuids: &["VUID-VkDescriptorSetLayoutBinding-descriptorType-00282"],
                    ..Default::default()
                }));
            }

            for (index, &sampler) in immutable_samplers.iter().enumerate() {
                let sampler = lookup(
                    samplers,
                    sampler,
                    format!("immutable_samplers[{}]", index),
                    &["VUID-VkDescriptorSetLayoutBinding-descriptorType-00282"],
                )?;

                if sampler.sampler_ycbcr_conversion().is_some()
                    && descriptor_type != DescriptorType::CombinedImageSampler
                {
                    return Err(Box::new(ValidationError {
                        problem: format!(
                            "`immutable_samplers[{}]` has a sampler YCbCr conversion, but \
                            `descriptor_type` is not `DescriptorType::CombinedImageSampler`",
                            index,
                        )
                        .into(),
                        vuids: &["VUID-VkDescriptorSetLayoutBinding-descriptorType-00282"],
                        ..Default::default()
                    }));
                }
            }
        }

        if binding_flags.intersects(DescriptorBindingFlags::UPDATE_AFTER_BIND) {
            descriptor_type.validate_update_after_bind(&config.features)?;
        }

        if binding_flags.intersects(DescriptorBindingFlags::UPDATE_UNUSED_WHILE_PENDING)
            && !config.features.descriptor_binding_update_unused_while_pending
        {
            return Err(Box::new(ValidationError {
                context: "binding_flags".into(),
                problem: "contains `DescriptorBindingFlags::UPDATE_UNUSED_WHILE_PENDING`".into(),
                requires_one_of: RequiresOneOf(&[RequiresAllOf(&[Requires::DeviceFeature(
                    "descriptor_binding_update_unused_while_pending",
                )])]),
                vuids: &["VUID-VkDescriptorSetLayoutBindingFlagsCreateInfo-descriptorBindingUpdateUnusedWhilePending-03012"],
            }));
        }

        if binding_flags.intersects(DescriptorBindingFlags::PARTIALLY_BOUND)
            && !config.features.descriptor_binding_partially_bound
        {
            return Err(Box::new(ValidationError {
                context: "binding_flags".into(),
                problem: "contains `DescriptorBindingFlags::PARTIALLY_BOUND`".into(),
                requires_one_of: RequiresOneOf(&[RequiresAllOf(&[Requires::DeviceFeature(
                    "descriptor_binding_partially_bound",
                )])]),
                vuids: &["VUID-VkDescriptorSetLayoutBindingFlagsCreateInfo-descriptorBindingPartiallyBound-03013"],
            }));
        }

        if binding_flags.intersects(DescriptorBindingFlags::VARIABLE_DESCRIPTOR_COUNT) {
            if !config.features.descriptor_binding_variable_descriptor_count {
                return Err(Box::new(ValidationError {
                    context: "binding_flags".into(),
                    problem: "contains `DescriptorBindingFlags::VARIABLE_DESCRIPTOR_COUNT`".into(),
                    requires_one_of: RequiresOneOf(&[RequiresAllOf(&[Requires::DeviceFeature(
                        "descriptor_binding_variable_descriptor_count",
                    )])]),
                    vuids: &["VUID-VkDescriptorSetLayoutBindingFlagsCreateInfo-descriptorBindingVariableDescriptorCount-03014"],
                }));
            }

            if descriptor_type.is_dynamic() {
                return Err(Box::new(ValidationError {
                    problem: "`binding_flags` contains \
                        `DescriptorBindingFlags::VARIABLE_DESCRIPTOR_COUNT`, and \
                        `descriptor_type` is `DescriptorType::UniformBufferDynamic` or \
                        `DescriptorType::StorageBufferDynamic`"
                        .into(),
                    vuids: &[
                        "VUID-VkDescriptorSetLayoutBindingFlagsCreateInfo-pBindingFlags-03015",
                    ],
                    ..Default::default()
                }));
            }
        }

        Ok(())
    }
}

vulkan_enum! {
    /// Describes what kind of resource may later be bound to a descriptor.
    DescriptorType = DescriptorType(i32);

    /// Describes how a `SampledImage` descriptor should be read.
    Sampler = SAMPLER,

    /// Combines `SampledImage` and `Sampler` in one descriptor.
    CombinedImageSampler = COMBINED_IMAGE_SAMPLER,

    /// Gives read-only access to an image via a sampler.
    SampledImage = SAMPLED_IMAGE,

    /// Gives read and/or write access to individual pixels in an image.
    StorageImage = STORAGE_IMAGE,

    /// Gives read-only access to the content of a buffer, interpreted as an array of texel data.
    UniformTexelBuffer = UNIFORM_TEXEL_BUFFER,

    /// Gives read and/or write access to the content of a buffer, interpreted as an array of texel
    /// data.
    StorageTexelBuffer = STORAGE_TEXEL_BUFFER,

    /// Gives read-only access to the content of a buffer, interpreted as a structure.
    UniformBuffer = UNIFORM_BUFFER,

    /// Gives read and/or write access to the content of a buffer, interpreted as a structure.
    StorageBuffer = STORAGE_BUFFER,

    /// As `UniformBuffer`, but the offset within the buffer is specified at the time the
    /// descriptor set is bound.
    UniformBufferDynamic = UNIFORM_BUFFER_DYNAMIC,

    /// As `StorageBuffer`, but the offset within the buffer is specified at the time the
    /// descriptor set is bound.
    StorageBufferDynamic = STORAGE_BUFFER_DYNAMIC,

    /// Gives access to an image inside a fragment shader via a render pass.
    InputAttachment = INPUT_ATTACHMENT,

    /// Provides uniform data directly in the descriptor set, without a buffer.
    InlineUniformBlock = INLINE_UNIFORM_BLOCK
    RequiresOneOf([
        RequiresAllOf([DeviceFeature(inline_uniform_block)]),
        RequiresAllOf([DeviceExtension(ext_inline_uniform_block)]),
    ]),

    /// Gives read access to an acceleration structure, for performing ray queries and ray tracing.
    AccelerationStructure = ACCELERATION_STRUCTURE_KHR,
}

impl DescriptorType {
    /// Returns the class of descriptor that stores this type.
    #[inline]
    pub fn class(self) -> DescriptorClass {
        match self {
            DescriptorType::Sampler => DescriptorClass::PlainSampler,
            DescriptorType::CombinedImageSampler => DescriptorClass::ImageSampler,
            DescriptorType::SampledImage
            | DescriptorType::StorageImage
            | DescriptorType::InputAttachment => DescriptorClass::Image,
            DescriptorType::UniformTexelBuffer | DescriptorType::StorageTexelBuffer => {
                DescriptorClass::TexelBuffer
            }
            DescriptorType::UniformBuffer
            | DescriptorType::StorageBuffer
            | DescriptorType::UniformBufferDynamic
            | DescriptorType::StorageBufferDynamic => DescriptorClass::GeneralBuffer,
            DescriptorType::InlineUniformBlock => DescriptorClass::InlineUniform,
            DescriptorType::AccelerationStructure => DescriptorClass::AccelerationStructure,
        }
    }

    /// Returns whether the type takes a dynamic offset when the set is bound.
    #[inline]
    pub fn is_dynamic(self) -> bool {
        matches!(
            self,
            DescriptorType::UniformBufferDynamic | DescriptorType::StorageBufferDynamic
        )
    }

    fn validate_update_after_bind(
        self,
        features: &DeviceFeatures,
    ) -> Result<(), Box<ValidationError>> {
        let (enabled, requires_one_of, vuids): (bool, RequiresOneOf, &'static [&'static str]) =
            match self {
                DescriptorType::UniformBuffer => (
                    features.descriptor_binding_uniform_buffer_update_after_bind,
                    RequiresOneOf(&[RequiresAllOf(&[Requires::DeviceFeature(
                        "descriptor_binding_uniform_buffer_update_after_bind",
                    )])]),
                    &["VUID-VkDescriptorSetLayoutBindingFlagsCreateInfo-descriptorBindingUniformBufferUpdateAfterBind-03005"],
                ),
                DescriptorType::Sampler
                | DescriptorType::CombinedImageSampler
                | DescriptorType::SampledImage => (
                    features.descriptor_binding_sampled_image_update_after_bind,
                    RequiresOneOf(&[RequiresAllOf(&[Requires::DeviceFeature(
                        "descriptor_binding_sampled_image_update_after_bind",
                    )])]),
                    &["VUID-VkDescriptorSetLayoutBindingFlagsCreateInfo-descriptorBindingSampledImageUpdateAfterBind-03006"],
                ),
                DescriptorType::StorageImage => (
                    features.descriptor_binding_storage_image_update_after_bind,
                    RequiresOneOf(&[RequiresAllOf(&[Requires::DeviceFeature(
                        "descriptor_binding_storage_image_update_after_bind",
                    )])]),
                    &["VUID-VkDescriptorSetLayoutBindingFlagsCreateInfo-descriptorBindingStorageImageUpdateAfterBind-03007"],
                ),
                DescriptorType::StorageBuffer => (
                    features.descriptor_binding_storage_buffer_update_after_bind,
                    RequiresOneOf(&[RequiresAllOf(&[Requires::DeviceFeature(
                        "descriptor_binding_storage_buffer_update_after_bind",
                    )])]),
                    &["VUID-VkDescriptorSetLayoutBindingFlagsCreateInfo-descriptorBindingStorageBufferUpdateAfterBind-03008"],
                ),
                DescriptorType::UniformTexelBuffer => (
                    features.descriptor_binding_uniform_texel_buffer_update_after_bind,
                    RequiresOneOf(&[RequiresAllOf(&[Requires::DeviceFeature(
                        "descriptor_binding_uniform_texel_buffer_update_after_bind",
                    )])]),
                    &["VUID-VkDescriptorSetLayoutBindingFlagsCreateInfo-descriptorBindingUniformTexelBufferUpdateAfterBind-03009"],
                ),
                DescriptorType::StorageTexelBuffer => (
                    features.descriptor_binding_storage_texel_buffer_update_after_bind,
                    RequiresOneOf(&[RequiresAllOf(&[Requires::DeviceFeature(
                        "descriptor_binding_storage_texel_buffer_update_after_bind",
                    )])]),
                    &["VUID-VkDescriptorSetLayoutBindingFlagsCreateInfo-descriptorBindingStorageTexelBufferUpdateAfterBind-03010"],
                ),
                DescriptorType::InlineUniformBlock => (
                    features.descriptor_binding_inline_uniform_block_update_after_bind,
                    RequiresOneOf(&[RequiresAllOf(&[Requires::DeviceFeature(
                        "descriptor_binding_inline_uniform_block_update_after_bind",
                    )])]),
                    &["VUID-VkDescriptorSetLayoutBindingFlagsCreateInfo-descriptorBindingInlineUniformBlockUpdateAfterBind-02211"],
                ),
                DescriptorType::AccelerationStructure => (
                    features.descriptor_binding_acceleration_structure_update_after_bind,
                    RequiresOneOf(&[RequiresAllOf(&[Requires::DeviceFeature(
                        "descriptor_binding_acceleration_structure_update_after_bind",
                    )])]),
                    &["VUID-VkDescriptorSetLayoutBindingFlagsCreateInfo-descriptorBindingAccelerationStructureUpdateAfterBind-03570"],
                ),
                DescriptorType::InputAttachment
                | DescriptorType::UniformBufferDynamic
                | DescriptorType::StorageBufferDynamic => {
                    return Err(Box::new(ValidationError {
                        problem: format!(
                            "`binding_flags` contains \
                            `DescriptorBindingFlags::UPDATE_AFTER_BIND`, and `descriptor_type` \
                            is `DescriptorType::{:?}`",
                            self,
                        )
                        .into(),
                        vuids: &["VUID-VkDescriptorSetLayoutBindingFlagsCreateInfo-None-03011"],
                        ..Default::default()
                    }));
                }
            };

        if !enabled {
            return Err(Box::new(ValidationError {
                problem: format!(
                    "`binding_flags` contains `DescriptorBindingFlags::UPDATE_AFTER_BIND`, and \
                    `descriptor_type` is `DescriptorType::{:?}`",
                    self,
                )
                .into(),
                requires_one_of,
                vuids,
                ..Default::default()
            }));
        }

        Ok(())
    }
}

/// The kind of state a descriptor stores, which decides how it is written and validated.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DescriptorClass {
    PlainSampler,
    ImageSampler,
    Image,
    TexelBuffer,
    GeneralBuffer,
    InlineUniform,
    AccelerationStructure,
}

/// How many bindings of a layout fall into each bucket.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BindingTypeStats {
    pub dynamic_buffer_count: u32,
    pub non_dynamic_buffer_count: u32,
    pub image_sampler_count: u32,
}

/// The handle-independent definition of a descriptor set layout.
///
/// Bindings are sorted by binding number. Each binding owns a contiguous range of *global
/// indices*, which index into the descriptors of a set allocated with the layout.
#[derive(Debug)]
pub struct DescriptorSetLayoutDef {
    flags: DescriptorSetLayoutCreateFlags,
    bindings: Vec<DescriptorSetLayoutBinding>,

    binding_to_index: HashMap<u32, usize>,
    global_index_ranges: Vec<Range<u32>>,
    dynamic_offset_indices: HashMap<u32, u32>,
    non_empty_bindings: BTreeSet<u32>,
    descriptor_count: u32,
    dynamic_descriptor_count: u32,
    binding_type_stats: BindingTypeStats,
}

impl DescriptorSetLayoutDef {
    /// Builds the definition of a layout. Bindings are sorted by number; if a binding number is
    /// given more than once, the last one wins.
    pub fn new(create_info: &DescriptorSetLayoutCreateInfo) -> Self {
        let sorted: BTreeMap<u32, &DescriptorSetLayoutBinding> = create_info
            .bindings
            .iter()
            .map(|binding| (binding.binding, binding))
            .collect();

        let mut def = DescriptorSetLayoutDef {
            flags: create_info.flags,
            bindings: Vec::with_capacity(sorted.len()),
            binding_to_index: HashMap::default(),
            global_index_ranges: Vec::with_capacity(sorted.len()),
            dynamic_offset_indices: HashMap::default(),
            non_empty_bindings: BTreeSet::new(),
            descriptor_count: 0,
            dynamic_descriptor_count: 0,
            binding_type_stats: BindingTypeStats::default(),
        };

        for (index, (&binding_num, &binding)) in sorted.iter().enumerate() {
            def.binding_to_index.insert(binding_num, index);

            // Saturates for layouts that were recorded despite failing validation.
            let start = def.descriptor_count;
            def.descriptor_count = start.saturating_add(binding.descriptor_count);
            def.global_index_ranges.push(start..def.descriptor_count);

            if binding.descriptor_count > 0 {
                def.non_empty_bindings.insert(binding_num);
            }

            match binding.descriptor_type {
                DescriptorType::UniformBufferDynamic | DescriptorType::StorageBufferDynamic => {
                    def.dynamic_offset_indices
                        .insert(binding_num, def.dynamic_descriptor_count);
                    def.dynamic_descriptor_count = def
                        .dynamic_descriptor_count
                        .saturating_add(binding.descriptor_count);
                    def.binding_type_stats.dynamic_buffer_count += 1;
                }
                DescriptorType::UniformBuffer | DescriptorType::StorageBuffer => {
                    def.binding_type_stats.non_dynamic_buffer_count += 1;
                }
                _ => def.binding_type_stats.image_sampler_count += 1,
            }

            def.bindings.push(binding.clone());
        }

        def
    }

    /// Builds the definition of a layout and returns the canonical instance shared by all
    /// layouts with the same definition.
    #[inline]
    pub fn canonical(create_info: &DescriptorSetLayoutCreateInfo) -> Arc<Self> {
        dictionary::canonicalize(Self::new(create_info))
    }

    #[inline]
    pub fn flags(&self) -> DescriptorSetLayoutCreateFlags {
        self.flags
    }

    /// Returns the bindings, sorted by binding number.
    #[inline]
    pub fn bindings(&self) -> &[DescriptorSetLayoutBinding] {
        &self.bindings
    }

    #[inline]
    pub fn binding_count(&self) -> usize {
        self.bindings.len()
    }

    /// Returns the index in [`bindings`](Self::bindings) of binding number `binding`.
    #[inline]
    pub fn binding_index(&self, binding: u32) -> Option<usize> {
        self.binding_to_index.get(&binding).copied()
    }

    #[inline]
    pub fn binding(&self, binding: u32) -> Option<&DescriptorSetLayoutBinding> {
        self.binding_index(binding).map(|index| &self.bindings[index])
    }

    /// Returns the descriptor count of binding number `binding`, or `0` if there is no such
    /// binding.
    #[inline]
    pub fn descriptor_count_of(&self, binding: u32) -> u32 {
        self.binding(binding)
            .map_or(0, |binding| binding.descriptor_count)
    }

    /// Returns the range of global indices of binding number `binding`.
    #[inline]
    pub fn global_index_range(&self, binding: u32) -> Option<Range<u32>> {
        self.binding_index(binding)
            .map(|index| self.global_index_ranges[index].clone())
    }

    /// Returns the number of descriptors across all bindings.
    #[inline]
    pub fn total_descriptor_count(&self) -> u32 {
        self.descriptor_count
    }

    /// Returns the number of dynamic offsets that binding a set with this layout takes.
    #[inline]
    pub fn dynamic_descriptor_count(&self) -> u32 {
        self.dynamic_descriptor_count
    }

    /// Returns the index of the first dynamic offset of binding number `binding`.
    #[inline]
    pub fn dynamic_offset_index(&self, binding: u32) -> Option<u32> {
        self.dynamic_offset_indices.get(&binding).copied()
    }

    #[inline]
    pub fn binding_type_stats(&self) -> BindingTypeStats {
        self.binding_type_stats
    }

    /// Returns the highest binding number, if there are bindings.
    #[inline]
    pub fn max_binding(&self) -> Option<u32> {
        self.bindings.last().map(|binding| binding.binding)
    }

    /// If the highest-numbered binding has a variable count, returns its `descriptor_count`.
    pub fn variable_descriptor_count(&self) -> Option<u32> {
        self.bindings
            .last()
            .filter(|binding| {
                binding
                    .binding_flags
                    .intersects(DescriptorBindingFlags::VARIABLE_DESCRIPTOR_COUNT)
            })
            .map(|binding| binding.descriptor_count)
    }

    #[inline]
    pub fn is_push_descriptor(&self) -> bool {
        self.flags
            .intersects(DescriptorSetLayoutCreateFlags::PUSH_DESCRIPTOR)
    }

    #[inline]
    pub fn is_update_after_bind_pool(&self) -> bool {
        self.flags
            .intersects(DescriptorSetLayoutCreateFlags::UPDATE_AFTER_BIND_POOL)
    }

    /// Returns the first binding number after `binding` that has at least one descriptor.
    #[inline]
    pub fn next_non_empty_binding(&self, binding: u32) -> Option<u32> {
        self.non_empty_bindings
            .range(binding.saturating_add(1)..)
            .next()
            .copied()
            .filter(|&next| next > binding)
    }

    /// Returns whether the bindings at indices `a` and `b` agree on everything that an update
    /// crossing from one into the other relies on.
    pub(crate) fn is_consistent(&self, a: usize, b: usize) -> bool {
        let (a, b) = (&self.bindings[a], &self.bindings[b]);

        a.descriptor_type == b.descriptor_type
            && a.stages == b.stages
            && a.has_immutable_samplers() == b.has_immutable_samplers()
            && a.binding_flags == b.binding_flags
    }

    /// Returns whether the binding after binding number `binding` exists, is numbered
    /// `binding + 1`, and is consistent with it.
    pub fn is_next_binding_consistent(&self, binding: u32) -> bool {
        let (Some(index), Some(next)) = (
            self.binding_index(binding),
            binding.checked_add(1).and_then(|next| self.binding_index(next)),
        ) else {
            return false;
        };

        self.is_consistent(index, next)
    }

    /// Checks that `self` and `other` are compatible for binding a set created with one through
    /// a pipeline layout created with the other. Returns the reason otherwise.
    pub fn is_compatible(self: &Arc<Self>, other: &Arc<Self>) -> Result<(), String> {
        if Arc::ptr_eq(self, other) || **self == **other {
            return Ok(());
        }

        if self.descriptor_count != other.descriptor_count {
            return Err(format!(
                "the layout has {} descriptors, but the other layout has {} descriptors",
                self.descriptor_count, other.descriptor_count,
            ));
        }

        for binding in &self.bindings {
            let Some(other_binding) = other.binding(binding.binding) else {
                return Err(format!(
                    "binding {} exists in the layout, but not in the other layout",
                    binding.binding,
                ));
            };

            if binding.descriptor_count != other_binding.descriptor_count {
                return Err(format!(
                    "binding {} has a descriptor count of {}, but the same binding of the other \
                    layout has a descriptor count of {}",
                    binding.binding, binding.descriptor_count, other_binding.descriptor_count,
                ));
            }

            if binding.descriptor_type != other_binding.descriptor_type {
                return Err(format!(
                    "binding {} is of type {:?}, but the same binding of the other layout is of \
                    type {:?}",
                    binding.binding, binding.descriptor_type, other_binding.descriptor_type,
                ));
            }

            if binding.stages != other_binding.stages {
                return Err(format!(
                    "binding {} has stages {:?}, but the same binding of the other layout has \
                    stages {:?}",
                    binding.binding, binding.stages, other_binding.stages,
                ));
            }

            if binding.has_immutable_samplers() != other_binding.has_immutable_samplers() {
                return Err(format!(
                    "binding {} differs in the use of immutable samplers from the same binding \
                    of the other layout",
                    binding.binding,
                ));
            }
        }

        Ok(())
    }
}

impl PartialEq for DescriptorSetLayoutDef {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.flags == other.flags && self.bindings == other.bindings
    }
}

impl Eq for DescriptorSetLayoutDef {}

impl Hash for DescriptorSetLayoutDef {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.flags.hash(state);
        self.bindings.hash(state);
    }
}

/// The state tracked for a descriptor set layout.
#[derive(Debug)]
pub struct DescriptorSetLayoutState {
    handle: ash::vk::DescriptorSetLayout,
    def: Arc<DescriptorSetLayoutDef>,
}

impl DescriptorSetLayoutState {
    #[inline]
    pub fn new(
        handle: ash::vk::DescriptorSetLayout,
        create_info: &DescriptorSetLayoutCreateInfo,
    ) -> Self {
        DescriptorSetLayoutState {
            handle,
            def: DescriptorSetLayoutDef::canonical(create_info),
        }
    }

    #[inline]
    pub fn handle(&self) -> ash::vk::DescriptorSetLayout {
        self.handle
    }

    /// Returns the canonical definition of the layout.
    #[inline]
    pub fn def(&self) -> &Arc<DescriptorSetLayoutDef> {
        &self.def
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn binding(
        binding: u32,
        descriptor_type: DescriptorType,
        count: u32,
    ) -> DescriptorSetLayoutBinding {
        DescriptorSetLayoutBinding {
            binding,
            descriptor_count: count,
            stages: ShaderStages::FRAGMENT,
            ..DescriptorSetLayoutBinding::descriptor_type(descriptor_type)
        }
    }

    #[test]
    fn def_index_ranges() {
        let def = DescriptorSetLayoutDef::new(&DescriptorSetLayoutCreateInfo {
            bindings: vec![
                binding(3, DescriptorType::UniformBufferDynamic, 2),
                binding(0, DescriptorType::SampledImage, 4),
                binding(1, DescriptorType::StorageBufferDynamic, 1),
                binding(2, DescriptorType::UniformBuffer, 0),
            ],
            ..Default::default()
        });

        assert_eq!(def.bindings()[0].binding, 0);
        assert_eq!(def.global_index_range(0), Some(0..4));
        assert_eq!(def.global_index_range(1), Some(4..5));
        assert_eq!(def.global_index_range(2), Some(5..5));
        assert_eq!(def.global_index_range(3), Some(5..7));
        assert_eq!(def.total_descriptor_count(), 7);
        assert_eq!(def.dynamic_descriptor_count(), 3);
        assert_eq!(def.dynamic_offset_index(1), Some(0));
        assert_eq!(def.dynamic_offset_index(3), Some(1));
        assert_eq!(def.next_non_empty_binding(1), Some(3));
        assert_eq!(def.next_non_empty_binding(3), None);
        assert_eq!(
            def.binding_type_stats(),
            BindingTypeStats {
                dynamic_buffer_count: 2,
                non_dynamic_buffer_count: 1,
                image_sampler_count: 1,
            },
        );
    }

    #[test]
    fn duplicate_binding_later_wins() {
        let def = DescriptorSetLayoutDef::new(&DescriptorSetLayoutCreateInfo {
            bindings: vec![
                binding(0, DescriptorType::SampledImage, 4),
                binding(0, DescriptorType::Sampler, 2),
            ],
            ..Default::default()
        });

        assert_eq!(def.binding_count(), 1);
        assert_eq!(def.bindings()[0].descriptor_type, DescriptorType::Sampler);

        let create_info = DescriptorSetLayoutCreateInfo {
            bindings: vec![
                binding(0, DescriptorType::SampledImage, 4),
                binding(0, DescriptorType::Sampler, 2),
            ],
            ..Default::default()
        };
        let err = create_info
            .validate(&ValidationConfig::default(), &HashMap::default())
            .unwrap_err();
        assert_eq!(err.vuid(), "VUID-VkDescriptorSetLayoutCreateInfo-binding-00279");
    }

    #[test]
    fn next_binding_consistency() {
        let def = DescriptorSetLayoutDef::new(&DescriptorSetLayoutCreateInfo {
            bindings: vec![
                binding(0, DescriptorType::SampledImage, 2),
                binding(1, DescriptorType::SampledImage, 2),
                binding(2, DescriptorType::Sampler, 2),
                binding(4, DescriptorType::Sampler, 2),
            ],
            ..Default::default()
        });

        assert!(def.is_next_binding_consistent(0));
        assert!(!def.is_next_binding_consistent(1));
        assert!(!def.is_next_binding_consistent(2));
        assert!(!def.is_next_binding_consistent(4));
    }

    #[test]
    fn push_descriptor_rules() {
        let mut config = ValidationConfig::default();
        config.extensions.khr_push_descriptor = true;

        let create_info = DescriptorSetLayoutCreateInfo {
            flags: DescriptorSetLayoutCreateFlags::PUSH_DESCRIPTOR,
            bindings: vec![binding(0, DescriptorType::UniformBufferDynamic, 1)],
            ..Default::default()
        };
        let err = create_info.validate(&config, &HashMap::default()).unwrap_err();
        assert_eq!(err.vuid(), "VUID-VkDescriptorSetLayoutCreateInfo-flags-00280");

        let create_info = DescriptorSetLayoutCreateInfo {
            flags: DescriptorSetLayoutCreateFlags::PUSH_DESCRIPTOR,
            bindings: vec![binding(0, DescriptorType::SampledImage, 33)],
            ..Default::default()
        };
        let err = create_info.validate(&config, &HashMap::default()).unwrap_err();
        assert_eq!(err.vuid(), "VUID-VkDescriptorSetLayoutCreateInfo-flags-00281");

        config.extensions.khr_push_descriptor = false;
        let err = create_info.validate(&config, &HashMap::default()).unwrap_err();
        assert_eq!(err.vuid(), "VUID-VkDescriptorSetLayoutCreateInfo-flags-parameter");
    }

    #[test]
    fn update_after_bind_requires_feature() {
        let mut config = ValidationConfig::default();
        config.extensions.ext_descriptor_indexing = true;

        let create_info = DescriptorSetLayoutCreateInfo {
            flags: DescriptorSetLayoutCreateFlags::UPDATE_AFTER_BIND_POOL,
            bindings: vec![DescriptorSetLayoutBinding {
                binding_flags: DescriptorBindingFlags::UPDATE_AFTER_BIND,
                ..binding(0, DescriptorType::StorageImage, 1)
            }],
            ..Default::default()
        };
        let err = create_info.validate(&config, &HashMap::default()).unwrap_err();
        assert_eq!(
            err.vuid(),
            "VUID-VkDescriptorSetLayoutBindingFlagsCreateInfo-descriptorBindingStorageImageUpdateAfterBind-03007",
        );
        assert!(!err.requires_one_of.is_empty());

        config.features.descriptor_binding_storage_image_update_after_bind = true;
        assert!(create_info.validate(&config, &HashMap::default()).is_ok());

        let create_info = DescriptorSetLayoutCreateInfo {
            flags: DescriptorSetLayoutCreateFlags::UPDATE_AFTER_BIND_POOL,
            bindings: vec![DescriptorSetLayoutBinding {
                binding_flags: DescriptorBindingFlags::UPDATE_AFTER_BIND,
                ..binding(0, DescriptorType::InputAttachment, 1)
            }],
            ..Default::default()
        };
        let err = create_info.validate(&config, &HashMap::default()).unwrap_err();
        assert_eq!(
            err.vuid(),
            "VUID-VkDescriptorSetLayoutBindingFlagsCreateInfo-None-03011",
        );
    }

    #[test]
    fn variable_count_must_be_last() {
        let mut config = ValidationConfig::default();
        config.extensions.ext_descriptor_indexing = true;
        config.features.descriptor_binding_variable_descriptor_count = true;

        let create_info = DescriptorSetLayoutCreateInfo {
            bindings: vec![
                DescriptorSetLayoutBinding {
                    binding_flags: DescriptorBindingFlags::VARIABLE_DESCRIPTOR_COUNT,
                    ..binding(0, DescriptorType::SampledImage, 8)
                },
                binding(1, DescriptorType::Sampler, 1),
            ],
            ..Default::default()
        };
        let err = create_info.validate(&config, &HashMap::default()).unwrap_err();
        assert_eq!(
            err.vuid(),
            "VUID-VkDescriptorSetLayoutBindingFlagsCreateInfo-pBindingFlags-03004",
        );
    }

    #[test]
    fn inline_uniform_block_size() {
        let mut config = ValidationConfig::default();
        config.features.inline_uniform_block = true;

        let create_info = DescriptorSetLayoutCreateInfo {
            bindings: vec![binding(0, DescriptorType::InlineUniformBlock, 6)],
            ..Default::default()
        };
        let err = create_info.validate(&config, &HashMap::default()).unwrap_err();
        assert_eq!(
            err.vuid(),
            "VUID-VkDescriptorSetLayoutBinding-descriptorType-02209",
        );
        assert_eq!(err.context, "bindings[0]");

        let create_info = DescriptorSetLayoutCreateInfo {
            bindings: vec![binding(0, DescriptorType::InlineUniformBlock, 512)],
            ..Default::default()
        };
        let err = create_info.validate(&config, &HashMap::default()).unwrap_err();
        assert_eq!(
            err.vuid(),
            "VUID-VkDescriptorSetLayoutBinding-descriptorType-08004",
        );
    }

    #[test]
    fn total_descriptor_count_overflow() {
        let create_info = DescriptorSetLayoutCreateInfo {
            bindings: vec![
                binding(0, DescriptorType::SampledImage, u32::MAX),
                binding(1, DescriptorType::SampledImage, 2),
            ],
            ..Default::default()
        };
        let err = create_info
            .validate(&ValidationConfig::default(), &HashMap::default())
            .unwrap_err();
        assert!(err.problem.contains("overflows"));

        let def = DescriptorSetLayoutDef::new(&create_info);
        assert_eq!(def.total_descriptor_count(), u32::MAX);
        assert_eq!(def.global_index_range(1), Some(u32::MAX..u32::MAX));
    }

    #[test]
    fn compatibility() {
        let a = Arc::new(DescriptorSetLayoutDef::new(&DescriptorSetLayoutCreateInfo {
            bindings: vec![binding(0, DescriptorType::UniformBuffer, 1)],
            ..Default::default()
        }));
        let b = Arc::new(DescriptorSetLayoutDef::new(&DescriptorSetLayoutCreateInfo {
            bindings: vec![binding(0, DescriptorType::UniformBuffer, 1)],
            ..Default::default()
        }));
        let c = Arc::new(DescriptorSetLayoutDef::new(&DescriptorSetLayoutCreateInfo {
            bindings: vec![binding(0, DescriptorType::StorageBuffer, 1)],
            ..Default::default()
        }));
        let d = Arc::new(DescriptorSetLayoutDef::new(&DescriptorSetLayoutCreateInfo {
            bindings: vec![binding(0, DescriptorType::UniformBuffer, 2)],
            ..Default::default()
        }));

        assert!(a.is_compatible(&a).is_ok());
        assert!(a.is_compatible(&b).is_ok());
        assert!(a.is_compatible(&c).unwrap_err().contains("type"));
        assert!(a.is_compatible(&d).unwrap_err().contains("descriptors"));
    }
}
