// Copyright (c) 2016 The vulkano developers
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or https://opensource.org/licenses/MIT>,
// at your option. All files in the project carrying such
// notice may not be copied, modified, or distributed except
// according to those terms.

//! Write and copy updates of descriptor sets.
//!
//! An update of `descriptor_count` descriptors that starts at `dst_array_element` of
//! `dst_binding` can run past the end of that binding. The remaining descriptors are then taken
//! from the next bindings, which must be numbered consecutively and be consistent with the first
//! one: same descriptor type, same stages, same use of immutable samplers and same binding flags.
//! Since the descriptors of a set are stored in binding order, the descriptors that an update
//! touches are always a contiguous run of global indices.

use super::{
    descriptor::{Descriptor, DescriptorKind},
    layout::{DescriptorClass, DescriptorSetLayoutDef, DescriptorType},
    DescriptorPoolCreateFlags, DescriptorSetState,
};
use crate::{
    buffer::BufferUsage,
    config::ValidationConfig,
    image::{ImageAspects, ImageLayout, ImageUsage},
    validator::{lookup, ObjectTables},
    DeviceSize, ValidationError, WHOLE_SIZE,
};
use std::ops::Range;

/// The resources written to an image, sampler or combined image sampler descriptor.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DescriptorImageInfo {
    /// Ignored unless the descriptor is a sampler or combined image sampler without an immutable
    /// sampler.
    pub sampler: ash::vk::Sampler,

    /// Ignored for sampler descriptors.
    pub image_view: ash::vk::ImageView,

    /// The layout that the image view will be in when the descriptor is accessed.
    pub image_layout: ImageLayout,
}

impl DescriptorImageInfo {
    #[inline]
    pub fn sampler(sampler: ash::vk::Sampler) -> Self {
        Self {
            sampler,
            ..Default::default()
        }
    }

    #[inline]
    pub fn image_view(image_view: ash::vk::ImageView, image_layout: ImageLayout) -> Self {
        Self {
            sampler: ash::vk::Sampler::null(),
            image_view,
            image_layout,
        }
    }
}

/// The buffer range written to a uniform or storage buffer descriptor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DescriptorBufferInfo {
    pub buffer: ash::vk::Buffer,
    pub offset: DeviceSize,

    /// The size of the range, or [`WHOLE_SIZE`] for the rest of the buffer.
    pub range: DeviceSize,
}

/// The elements of a write, one per descriptor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WriteDescriptorSetElements {
    Image(Vec<DescriptorImageInfo>),
    Buffer(Vec<DescriptorBufferInfo>),
    TexelBufferView(Vec<ash::vk::BufferView>),

    /// The raw data of an inline uniform block. Its length is the number of bytes written.
    InlineUniformBlock(Vec<u8>),

    AccelerationStructure(Vec<ash::vk::AccelerationStructureKHR>),
}

impl WriteDescriptorSetElements {
    /// Returns the number of elements, or bytes for an inline uniform block.
    #[inline]
    pub fn len(&self) -> usize {
        match self {
            Self::Image(elements) => elements.len(),
            Self::Buffer(elements) => elements.len(),
            Self::TexelBufferView(elements) => elements.len(),
            Self::InlineUniformBlock(data) => data.len(),
            Self::AccelerationStructure(elements) => elements.len(),
        }
    }

    fn describe(&self) -> &'static str {
        match self {
            Self::Image(_) => "image infos",
            Self::Buffer(_) => "buffer infos",
            Self::TexelBufferView(_) => "texel buffer views",
            Self::InlineUniformBlock(_) => "inline uniform block data",
            Self::AccelerationStructure(_) => "acceleration structures",
        }
    }
}

/// A write update of a descriptor set.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WriteDescriptorSet {
    /// The set to update. Ignored for push descriptors.
    pub dst_set: ash::vk::DescriptorSet,
    pub dst_binding: u32,

    /// The first array element to write, or for an inline uniform block, the byte offset.
    pub dst_array_element: u32,

    /// The number of descriptors to write, or for an inline uniform block, the number of bytes.
    pub descriptor_count: u32,

    pub descriptor_type: DescriptorType,
    pub elements: WriteDescriptorSetElements,

    pub _ne: crate::NonExhaustive,
}

impl WriteDescriptorSet {
    fn new(
        dst_set: ash::vk::DescriptorSet,
        dst_binding: u32,
        dst_array_element: u32,
        descriptor_type: DescriptorType,
        elements: WriteDescriptorSetElements,
    ) -> Self {
        Self {
            dst_set,
            dst_binding,
            dst_array_element,
            descriptor_count: elements.len() as u32,
            descriptor_type,
            elements,
            _ne: crate::NonExhaustive(()),
        }
    }

    /// Writes samplers, image views or both, depending on `descriptor_type`.
    #[inline]
    pub fn images(
        dst_set: ash::vk::DescriptorSet,
        dst_binding: u32,
        dst_array_element: u32,
        descriptor_type: DescriptorType,
        elements: impl IntoIterator<Item = DescriptorImageInfo>,
    ) -> Self {
        Self::new(
            dst_set,
            dst_binding,
            dst_array_element,
            descriptor_type,
            WriteDescriptorSetElements::Image(elements.into_iter().collect()),
        )
    }

    #[inline]
    pub fn buffers(
        dst_set: ash::vk::DescriptorSet,
        dst_binding: u32,
        dst_array_element: u32,
        descriptor_type: DescriptorType,
        elements: impl IntoIterator<Item = DescriptorBufferInfo>,
    ) -> Self {
        Self::new(
            dst_set,
            dst_binding,
            dst_array_element,
            descriptor_type,
            WriteDescriptorSetElements::Buffer(elements.into_iter().collect()),
        )
    }

    #[inline]
    pub fn texel_buffer_views(
        dst_set: ash::vk::DescriptorSet,
        dst_binding: u32,
        dst_array_element: u32,
        descriptor_type: DescriptorType,
        elements: impl IntoIterator<Item = ash::vk::BufferView>,
    ) -> Self {
        Self::new(
            dst_set,
            dst_binding,
            dst_array_element,
            descriptor_type,
            WriteDescriptorSetElements::TexelBufferView(elements.into_iter().collect()),
        )
    }

    /// Writes `data` at byte `offset` of an inline uniform block binding.
    #[inline]
    pub fn inline_uniform_block(
        dst_set: ash::vk::DescriptorSet,
        dst_binding: u32,
        offset: u32,
        data: Vec<u8>,
    ) -> Self {
        Self::new(
            dst_set,
            dst_binding,
            offset,
            DescriptorType::InlineUniformBlock,
            WriteDescriptorSetElements::InlineUniformBlock(data),
        )
    }

    #[inline]
    pub fn acceleration_structures(
        dst_set: ash::vk::DescriptorSet,
        dst_binding: u32,
        dst_array_element: u32,
        elements: impl IntoIterator<Item = ash::vk::AccelerationStructureKHR>,
    ) -> Self {
        Self::new(
            dst_set,
            dst_binding,
            dst_array_element,
            DescriptorType::AccelerationStructure,
            WriteDescriptorSetElements::AccelerationStructure(elements.into_iter().collect()),
        )
    }

    /// Validates the write against the state of `set`. `in_use` is whether a command buffer that
    /// has the set bound is executing.
    pub(crate) fn validate(
        &self,
        set: &DescriptorSetState,
        in_use: bool,
        objects: &ObjectTables,
        config: &ValidationConfig,
    ) -> Result<(), Box<ValidationError>> {
        let &Self {
            dst_set: _,
            dst_binding,
            dst_array_element,
            descriptor_count,
            descriptor_type,
            ref elements,
            _ne: _,
        } = self;

        if !objects.descriptor_set_layouts.contains_key(&set.layout()) {
            return Err(Box::new(ValidationError {
                context: "dst_set".into(),
                problem: "was allocated with a descriptor set layout that has been destroyed"
                    .into(),
                vuids: &["VUID-VkWriteDescriptorSet-dstSet-00320"],
                ..Default::default()
            }));
        }

        if descriptor_count == 0 {
            return Err(Box::new(ValidationError {
                context: "descriptor_count".into(),
                problem: "is zero".into(),
                vuids: &["VUID-VkWriteDescriptorSet-descriptorCount-arraylength"],
                ..Default::default()
            }));
        }

        let def = set.def();

        let Some(binding) = def.binding(dst_binding) else {
            return Err(Box::new(ValidationError {
                context: "dst_binding".into(),
                problem: format!(
                    "binding {} does not exist in the layout of `dst_set`",
                    dst_binding,
                )
                .into(),
                vuids: &["VUID-VkWriteDescriptorSet-dstBinding-00315"],
                ..Default::default()
            }));
        };

        if binding.descriptor_count == 0 {
            return Err(Box::new(ValidationError {
                context: "dst_binding".into(),
                problem: format!("binding {} has a descriptor count of zero", dst_binding).into(),
                vuids: &["VUID-VkWriteDescriptorSet-dstBinding-00316"],
                ..Default::default()
            }));
        }

        if in_use && !set.is_update_while_pending_allowed(dst_binding) {
            return Err(Box::new(ValidationError {
                context: "dst_set".into(),
                problem: "is in use by a command buffer, and `dst_binding` does not have \
                    `DescriptorBindingFlags::UPDATE_UNUSED_WHILE_PENDING` or \
                    `DescriptorBindingFlags::UPDATE_AFTER_BIND`"
                    .into(),
                vuids: &["VUID-vkFreeDescriptorSets-pDescriptorSets-00309"],
                ..Default::default()
            }));
        }

        if descriptor_type != binding.descriptor_type {
            return Err(Box::new(ValidationError {
                context: "descriptor_type".into(),
                problem: format!(
                    "is `DescriptorType::{:?}`, but binding {} has type `DescriptorType::{:?}`",
                    descriptor_type, dst_binding, binding.descriptor_type,
                )
                .into(),
                vuids: &["VUID-VkWriteDescriptorSet-descriptorType-00319"],
                ..Default::default()
            }));
        }

        let dst_range = set
            .update_range(dst_binding, dst_array_element, descriptor_count)
            .ok_or_else(|| {
                Box::new(ValidationError {
                    problem: format!(
                        "`dst_array_element` + `descriptor_count` ({} + {}) is greater than the \
                        number of descriptors from binding {} to the end of `dst_set`",
                        dst_array_element, descriptor_count, dst_binding,
                    )
                    .into(),
                    vuids: &["VUID-VkWriteDescriptorSet-dstArrayElement-00321"],
                    ..Default::default()
                })
            })?;

        if descriptor_type == DescriptorType::InlineUniformBlock {
            validate_inline_write(dst_array_element, descriptor_count, elements)?;
        }

        verify_update_consistency(def, dst_binding, dst_array_element, descriptor_count).map_err(
            |problem| {
                Box::new(ValidationError {
                    problem: problem.into(),
                    vuids: &["VUID-VkWriteDescriptorSet-dstArrayElement-00321"],
                    ..Default::default()
                })
            },
        )?;

        if descriptor_type == DescriptorType::InlineUniformBlock {
            return Ok(());
        }

        validate_elements_kind(descriptor_type, descriptor_count, elements)?;

        let descriptors = &set.descriptors()[dst_range];

        match elements {
            WriteDescriptorSetElements::Image(image_infos) => {
                for (index, (info, descriptor)) in image_infos.iter().zip(descriptors).enumerate()
                {
                    validate_image_info(descriptor_type, info, descriptor, objects, config)
                        .map_err(|err| err.add_context(format!("elements[{}]", index)))?;
                }
            }
            WriteDescriptorSetElements::Buffer(buffer_infos) => {
                for (index, info) in buffer_infos.iter().enumerate() {
                    validate_buffer_update(descriptor_type, info, objects, config)
                        .map_err(|err| err.add_context(format!("elements[{}]", index)))?;
                }
            }
            WriteDescriptorSetElements::TexelBufferView(buffer_views) => {
                for (index, &buffer_view) in buffer_views.iter().enumerate() {
                    validate_texel_buffer_update(descriptor_type, buffer_view, objects)
                        .map_err(|err| err.add_context(format!("elements[{}]", index)))?;
                }
            }
            WriteDescriptorSetElements::InlineUniformBlock(_)
            | WriteDescriptorSetElements::AccelerationStructure(_) => (),
        }

        Ok(())
    }
}

/// A copy update between descriptor sets.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CopyDescriptorSet {
    pub src_set: ash::vk::DescriptorSet,
    pub src_binding: u32,
    pub src_array_element: u32,
    pub dst_set: ash::vk::DescriptorSet,
    pub dst_binding: u32,
    pub dst_array_element: u32,
    pub descriptor_count: u32,
}

impl CopyDescriptorSet {
    /// Validates the copy from `src` to `dst`, which may be the same set. `dst_in_use` is whether
    /// a command buffer that has `dst` bound is executing.
    pub(crate) fn validate(
        &self,
        src: &DescriptorSetState,
        dst: &DescriptorSetState,
        dst_in_use: bool,
        objects: &ObjectTables,
        config: &ValidationConfig,
    ) -> Result<(), Box<ValidationError>> {
        let &Self {
            src_set,
            src_binding,
            src_array_element,
            dst_set,
            dst_binding,
            dst_array_element,
            descriptor_count,
        } = self;

        let (src_def, dst_def) = (src.def(), dst.def());

        let Some(dst_layout_binding) = dst_def.binding(dst_binding) else {
            return Err(Box::new(ValidationError {
                context: "dst_binding".into(),
                problem: format!(
                    "binding {} does not exist in the layout of `dst_set`",
                    dst_binding,
                )
                .into(),
                vuids: &["VUID-VkCopyDescriptorSet-dstBinding-00347"],
                ..Default::default()
            }));
        };

        let Some(src_layout_binding) = src_def.binding(src_binding) else {
            return Err(Box::new(ValidationError {
                context: "src_binding".into(),
                problem: format!(
                    "binding {} does not exist in the layout of `src_set`",
                    src_binding,
                )
                .into(),
                vuids: &["VUID-VkCopyDescriptorSet-srcBinding-00345"],
                ..Default::default()
            }));
        };

        if dst_in_use && !dst.is_update_while_pending_allowed(dst_binding) {
            return Err(Box::new(ValidationError {
                context: "dst_set".into(),
                problem: "is in use by a command buffer, and `dst_binding` does not have \
                    `DescriptorBindingFlags::UPDATE_UNUSED_WHILE_PENDING` or \
                    `DescriptorBindingFlags::UPDATE_AFTER_BIND`"
                    .into(),
                vuids: &["VUID-vkFreeDescriptorSets-pDescriptorSets-00309"],
                ..Default::default()
            }));
        }

        let src_range = src
            .update_range(src_binding, src_array_element, descriptor_count)
            .ok_or_else(|| {
                Box::new(ValidationError {
                    problem: format!(
                        "`src_array_element` + `descriptor_count` ({} + {}) is greater than the \
                        number of descriptors from binding {} to the end of `src_set`",
                        src_array_element, descriptor_count, src_binding,
                    )
                    .into(),
                    vuids: &["VUID-VkCopyDescriptorSet-srcArrayElement-00346"],
                    ..Default::default()
                })
            })?;

        let dst_range = dst
            .update_range(dst_binding, dst_array_element, descriptor_count)
            .ok_or_else(|| {
                Box::new(ValidationError {
                    problem: format!(
                        "`dst_array_element` + `descriptor_count` ({} + {}) is greater than the \
                        number of descriptors from binding {} to the end of `dst_set`",
                        dst_array_element, descriptor_count, dst_binding,
                    )
                    .into(),
                    vuids: &["VUID-VkCopyDescriptorSet-dstArrayElement-00348"],
                    ..Default::default()
                })
            })?;

        if src_set == dst_set
            && src_range.start < dst_range.end
            && dst_range.start < src_range.end
        {
            return Err(Box::new(ValidationError {
                problem: "`src_set` equals `dst_set`, and the source and destination ranges of \
                    descriptors overlap"
                    .into(),
                vuids: &["VUID-VkCopyDescriptorSet-srcSet-00349"],
                ..Default::default()
            }));
        }

        let descriptor_type = src_layout_binding.descriptor_type;

        if dst_layout_binding.descriptor_type != descriptor_type {
            return Err(Box::new(ValidationError {
                problem: format!(
                    "binding {} of `src_set` has type `DescriptorType::{:?}`, but binding {} of \
                    `dst_set` has type `DescriptorType::{:?}`",
                    src_binding, descriptor_type, dst_binding, dst_layout_binding.descriptor_type,
                )
                .into(),
                vuids: &["VUID-VkCopyDescriptorSet-dstBinding-02632"],
                ..Default::default()
            }));
        }

        verify_update_consistency(src_def, src_binding, src_array_element, descriptor_count)
            .map_err(|problem| {
                Box::new(ValidationError {
                    context: "src_set".into(),
                    problem: problem.into(),
                    vuids: &["VUID-VkCopyDescriptorSet-srcArrayElement-00346"],
                    ..Default::default()
                })
            })?;

        verify_update_consistency(dst_def, dst_binding, dst_array_element, descriptor_count)
            .map_err(|problem| {
                Box::new(ValidationError {
                    context: "dst_set".into(),
                    problem: problem.into(),
                    vuids: &["VUID-VkCopyDescriptorSet-dstArrayElement-00348"],
                    ..Default::default()
                })
            })?;

        match (
            src_def.is_update_after_bind_pool(),
            dst_def.is_update_after_bind_pool(),
        ) {
            (true, false) => {
                return Err(Box::new(ValidationError {
                    problem: "the layout of `src_set` was created with \
                        `DescriptorSetLayoutCreateFlags::UPDATE_AFTER_BIND_POOL`, but the layout \
                        of `dst_set` was not"
                        .into(),
                    vuids: &["VUID-VkCopyDescriptorSet-srcSet-01918"],
                    ..Default::default()
                }));
            }
            (false, true) => {
                return Err(Box::new(ValidationError {
                    problem: "the layout of `src_set` was not created with \
                        `DescriptorSetLayoutCreateFlags::UPDATE_AFTER_BIND_POOL`, but the layout \
                        of `dst_set` was"
                        .into(),
                    vuids: &["VUID-VkCopyDescriptorSet-srcSet-01919"],
                    ..Default::default()
                }));
            }
            _ => (),
        }

        let pool_is_update_after_bind = |set: &DescriptorSetState| {
            objects
                .descriptor_pools
                .get(&set.pool())
                .is_some_and(|pool| {
                    pool.flags()
                        .intersects(DescriptorPoolCreateFlags::UPDATE_AFTER_BIND)
                })
        };

        match (pool_is_update_after_bind(src), pool_is_update_after_bind(dst)) {
            (true, false) => {
                return Err(Box::new(ValidationError {
                    problem: "`src_set` was allocated from a pool created with \
                        `DescriptorPoolCreateFlags::UPDATE_AFTER_BIND`, but `dst_set` was not"
                        .into(),
                    vuids: &["VUID-VkCopyDescriptorSet-srcSet-01920"],
                    ..Default::default()
                }));
            }
            (false, true) => {
                return Err(Box::new(ValidationError {
                    problem: "`src_set` was not allocated from a pool created with \
                        `DescriptorPoolCreateFlags::UPDATE_AFTER_BIND`, but `dst_set` was"
                        .into(),
                    vuids: &["VUID-VkCopyDescriptorSet-srcSet-01921"],
                    ..Default::default()
                }));
            }
            _ => (),
        }

        if descriptor_type == DescriptorType::InlineUniformBlock {
            if src_array_element % 4 != 0 {
                return Err(Box::new(ValidationError {
                    problem: "the source binding is an inline uniform block, and \
                        `src_array_element` is not a multiple of 4"
                        .into(),
                    vuids: &["VUID-VkCopyDescriptorSet-srcBinding-02223"],
                    ..Default::default()
                }));
            }

            if dst_array_element % 4 != 0 {
                return Err(Box::new(ValidationError {
                    problem: "the destination binding is an inline uniform block, and \
                        `dst_array_element` is not a multiple of 4"
                        .into(),
                    vuids: &["VUID-VkCopyDescriptorSet-dstBinding-02224"],
                    ..Default::default()
                }));
            }

            if descriptor_count % 4 != 0 {
                return Err(Box::new(ValidationError {
                    problem: "the source binding is an inline uniform block, and \
                        `descriptor_count` is not a multiple of 4"
                        .into(),
                    vuids: &["VUID-VkCopyDescriptorSet-srcBinding-02225"],
                    ..Default::default()
                }));
            }

            return Ok(());
        }

        let src_descriptors = &src.descriptors()[src_range];
        let dst_descriptors = &dst.descriptors()[dst_range];

        for (index, (src_descriptor, dst_descriptor)) in
            src_descriptors.iter().zip(dst_descriptors).enumerate()
        {
            if !src_descriptor.updated {
                continue;
            }

            validate_copied_descriptor(
                descriptor_type,
                src_descriptor,
                dst_descriptor,
                objects,
                config,
            )
            .map_err(|err| {
                err.add_context(format!(
                    "src_set.descriptors[{}]",
                    src_array_element + index as u32,
                ))
            })?;
        }

        Ok(())
    }
}

/// Checks that an update of `count` descriptors starting at `array_element` of `binding` only
/// overflows into bindings that are consistent with the binding before them. Returns the problem
/// otherwise.
pub(crate) fn verify_update_consistency(
    def: &DescriptorSetLayoutDef,
    binding: u32,
    array_element: u32,
    count: u32,
) -> Result<(), String> {
    let bindings = def.bindings();
    let Some(mut index) = def.binding_index(binding) else {
        return Err(format!("binding {} does not exist", binding));
    };

    let mut offset = array_element;
    let mut remaining = bindings[index].descriptor_count;

    // An offset past the end of the binding starts the update in a later binding.
    while offset >= remaining && remaining != 0 {
        offset -= remaining;
        index += 1;

        let Some(next) = bindings.get(index) else {
            return Err(format!(
                "array element {} is past the last descriptor of binding {} and the bindings \
                after it",
                array_element, binding,
            ));
        };

        remaining = next.descriptor_count;
    }

    remaining = remaining.saturating_sub(offset);
    let mut count = count;

    while count > remaining {
        let current = &bindings[index];
        let next = index + 1;

        let is_consistent_successor = bindings.get(next).is_some_and(|next_binding| {
            Some(next_binding.binding) == current.binding.checked_add(1)
        }) && def.is_consistent(index, next);

        if !is_consistent_successor {
            return Err(format!(
                "binding {} has {} descriptors being updated, but the update oversteps the \
                bounds of this binding and the next binding is not consistent with it",
                current.binding, count,
            ));
        }

        count -= remaining;
        index = next;
        remaining = bindings[index].descriptor_count;
    }

    Ok(())
}

fn validate_inline_write(
    dst_array_element: u32,
    descriptor_count: u32,
    elements: &WriteDescriptorSetElements,
) -> Result<(), Box<ValidationError>> {
    if dst_array_element % 4 != 0 {
        return Err(Box::new(ValidationError {
            problem: "`descriptor_type` is `DescriptorType::InlineUniformBlock`, and \
                `dst_array_element` is not a multiple of 4"
                .into(),
            vuids: &["VUID-VkWriteDescriptorSet-descriptorType-02219"],
            ..Default::default()
        }));
    }

    if descriptor_count % 4 != 0 {
        return Err(Box::new(ValidationError {
            problem: "`descriptor_type` is `DescriptorType::InlineUniformBlock`, and \
                `descriptor_count` is not a multiple of 4"
                .into(),
            vuids: &["VUID-VkWriteDescriptorSet-descriptorType-02220"],
            ..Default::default()
        }));
    }

    let WriteDescriptorSetElements::InlineUniformBlock(data) = elements else {
        return Err(Box::new(ValidationError {
            problem: format!(
                "`descriptor_type` is `DescriptorType::InlineUniformBlock`, but `elements` \
                contains {}",
                elements.describe(),
            )
            .into(),
            vuids: &["VUID-VkWriteDescriptorSet-descriptorType-02221"],
            ..Default::default()
        }));
    };

    if data.len() as u32 != descriptor_count {
        return Err(Box::new(ValidationError {
            problem: "`descriptor_type` is `DescriptorType::InlineUniformBlock`, and the length \
                of the inline data does not equal `descriptor_count`"
                .into(),
            vuids: &["VUID-VkWriteDescriptorSet-descriptorType-02221"],
            ..Default::default()
        }));
    }

    if data.len() % 4 != 0 {
        return Err(Box::new(ValidationError {
            problem: "the length of the inline data is not a multiple of 4".into(),
            vuids: &["VUID-VkWriteDescriptorSetInlineUniformBlockEXT-dataSize-02222"],
            ..Default::default()
        }));
    }

    Ok(())
}

fn validate_elements_kind(
    descriptor_type: DescriptorType,
    descriptor_count: u32,
    elements: &WriteDescriptorSetElements,
) -> Result<(), Box<ValidationError>> {
    let vuids: &'static [&'static str] = match (descriptor_type.class(), elements) {
        (
            DescriptorClass::PlainSampler | DescriptorClass::ImageSampler | DescriptorClass::Image,
            WriteDescriptorSetElements::Image(_),
        )
        | (DescriptorClass::GeneralBuffer, WriteDescriptorSetElements::Buffer(_))
        | (DescriptorClass::TexelBuffer, WriteDescriptorSetElements::TexelBufferView(_))
        | (
            DescriptorClass::AccelerationStructure,
            WriteDescriptorSetElements::AccelerationStructure(_),
        ) => {
            if elements.len() as u32 == descriptor_count {
                return Ok(());
            }

            match elements {
                WriteDescriptorSetElements::Image(_) => {
                    &["VUID-VkWriteDescriptorSet-descriptorType-00322"]
                }
                WriteDescriptorSetElements::Buffer(_) => {
                    &["VUID-VkWriteDescriptorSet-descriptorType-00324"]
                }
                WriteDescriptorSetElements::TexelBufferView(_) => {
                    &["VUID-VkWriteDescriptorSet-descriptorType-00323"]
                }
                _ => &["VUID-VkWriteDescriptorSet-descriptorType-02382"],
            }
        }
        (DescriptorClass::GeneralBuffer, _) => &["VUID-VkWriteDescriptorSet-descriptorType-00324"],
        (DescriptorClass::TexelBuffer, _) => &["VUID-VkWriteDescriptorSet-descriptorType-00323"],
        (DescriptorClass::AccelerationStructure, _) => {
            &["VUID-VkWriteDescriptorSet-descriptorType-02382"]
        }
        _ => &["VUID-VkWriteDescriptorSet-descriptorType-00322"],
    };

    Err(Box::new(ValidationError {
        problem: format!(
            "`descriptor_type` is `DescriptorType::{:?}` and `descriptor_count` is {}, but \
            `elements` contains {} {}",
            descriptor_type,
            descriptor_count,
            elements.len(),
            elements.describe(),
        )
        .into(),
        vuids,
        ..Default::default()
    }))
}

fn validate_image_info(
    descriptor_type: DescriptorType,
    info: &DescriptorImageInfo,
    descriptor: &Descriptor,
    objects: &ObjectTables,
    config: &ValidationConfig,
) -> Result<(), Box<ValidationError>> {
    match descriptor_type.class() {
        DescriptorClass::PlainSampler => {
            if !descriptor.is_immutable_sampler() {
                validate_sampler(info.sampler, objects)?;
            }
        }
        DescriptorClass::ImageSampler => {
            validate_image_update(
                descriptor_type,
                info.image_view,
                info.image_layout,
                objects,
                config,
            )?;
            validate_sampler_ycbcr_conversion(info.image_view, descriptor, objects, config)?;

            if !descriptor.is_immutable_sampler() {
                validate_sampler(info.sampler, objects)?;
            }
        }
        _ => validate_image_update(
            descriptor_type,
            info.image_view,
            info.image_layout,
            objects,
            config,
        )?,
    }

    Ok(())
}

/// Validates the source descriptor of a copy as if it were written to `dst_descriptor`.
fn validate_copied_descriptor(
    descriptor_type: DescriptorType,
    src_descriptor: &Descriptor,
    dst_descriptor: &Descriptor,
    objects: &ObjectTables,
    config: &ValidationConfig,
) -> Result<(), Box<ValidationError>> {
    match src_descriptor.kind {
        DescriptorKind::PlainSampler { sampler, .. } => {
            if !dst_descriptor.is_immutable_sampler() {
                validate_sampler(sampler, objects)?;
            }
        }
        DescriptorKind::ImageSampler {
            sampler,
            image_view,
            image_layout,
            ..
        } => {
            validate_image_update(descriptor_type, image_view, image_layout, objects, config)?;

            if !dst_descriptor.is_immutable_sampler() {
                validate_sampler(sampler, objects)?;
            }
        }
        DescriptorKind::Image {
            image_view,
            image_layout,
        } => {
            validate_image_update(descriptor_type, image_view, image_layout, objects, config)?;
        }
        DescriptorKind::TexelBuffer { buffer_view } => {
            validate_texel_buffer_update(descriptor_type, buffer_view, objects)?;
        }
        DescriptorKind::Buffer {
            buffer,
            offset,
            range,
            ..
        } => {
            validate_buffer_update(
                descriptor_type,
                &DescriptorBufferInfo {
                    buffer,
                    offset,
                    range,
                },
                objects,
                config,
            )?;
        }
        DescriptorKind::InlineUniform
        | DescriptorKind::AccelerationStructure { .. } => (),
    }

    Ok(())
}

fn validate_sampler(
    sampler: ash::vk::Sampler,
    objects: &ObjectTables,
) -> Result<(), Box<ValidationError>> {
    lookup(
        &objects.samplers,
        sampler,
        "sampler",
        &["VUID-VkWriteDescriptorSet-descriptorType-00325"],
    )?;

    Ok(())
}

/// Checks the sampler YCbCr conversion of `image_view` against the sampler of a combined image
/// sampler descriptor.
fn validate_sampler_ycbcr_conversion(
    image_view: ash::vk::ImageView,
    descriptor: &Descriptor,
    objects: &ObjectTables,
    config: &ValidationConfig,
) -> Result<(), Box<ValidationError>> {
    if !(config.features.sampler_ycbcr_conversion
        || config.extensions.khr_sampler_ycbcr_conversion)
    {
        return Ok(());
    }

    let Some(view) = objects.image_views.get(&image_view) else {
        return Ok(());
    };

    if descriptor.is_immutable_sampler() {
        let sampler = descriptor
            .sampler()
            .and_then(|sampler| objects.samplers.get(&sampler));

        if let Some(sampler) = sampler {
            if sampler.sampler_ycbcr_conversion() != view.sampler_ycbcr_conversion() {
                return Err(Box::new(ValidationError {
                    problem: "the sampler YCbCr conversion of the image view is not identical \
                        to the sampler YCbCr conversion of the immutable sampler of the binding"
                        .into(),
                    vuids: &["VUID-VkWriteDescriptorSet-descriptorType-01948"],
                    ..Default::default()
                }));
            }
        }
    } else if view.sampler_ycbcr_conversion().is_some() {
        return Err(Box::new(ValidationError {
            problem: "the image view has a sampler YCbCr conversion, but the binding does not \
                have an immutable sampler"
                .into(),
            vuids: &["VUID-VkWriteDescriptorSet-descriptorType-02738"],
            ..Default::default()
        }));
    }

    Ok(())
}

/// Validates writing `image_view` in `image_layout` to a descriptor of type `descriptor_type`.
pub(crate) fn validate_image_update(
    descriptor_type: DescriptorType,
    image_view: ash::vk::ImageView,
    image_layout: ImageLayout,
    objects: &ObjectTables,
    config: &ValidationConfig,
) -> Result<(), Box<ValidationError>> {
    let view = lookup(
        &objects.image_views,
        image_view,
        "image_view",
        &["VUID-VkWriteDescriptorSet-descriptorType-00326"],
    )?;
    let image = lookup(
        &objects.images,
        view.image(),
        "image_view.image",
        &["VUID-VkWriteDescriptorSet-descriptorType-00326"],
    )?;

    if !image.is_memory_bound() {
        return Err(Box::new(ValidationError {
            context: "image_view".into(),
            problem: "the image of the view is not bound to memory".into(),
            vuids: &["VUID-VkImageViewCreateInfo-image-01020"],
            ..Default::default()
        }));
    }

    if view.is_2d_view_of_3d_image() {
        return Err(Box::new(ValidationError {
            context: "image_view".into(),
            problem: "is a 2D or 2D array view of a 3D image".into(),
            vuids: &["VUID-VkDescriptorImageInfo-imageView-00343"],
            ..Default::default()
        }));
    }

    let format = image.format();
    let aspects = view.subresource_range().aspects;

    if format.is_depth_or_stencil() {
        if aspects.contains(ImageAspects::DEPTH | ImageAspects::STENCIL) {
            return Err(Box::new(ValidationError {
                context: "image_view".into(),
                problem: "has a depth/stencil format, and its aspects contain both \
                    `ImageAspects::DEPTH` and `ImageAspects::STENCIL`"
                    .into(),
                vuids: &["VUID-VkDescriptorImageInfo-imageView-01976"],
                ..Default::default()
            }));
        }

        if !aspects.intersects(ImageAspects::DEPTH | ImageAspects::STENCIL) {
            return Err(Box::new(ValidationError {
                context: "image_view".into(),
                problem: "has a depth/stencil format, but its aspects contain neither \
                    `ImageAspects::DEPTH` nor `ImageAspects::STENCIL`"
                    .into(),
                vuids: &["UNASSIGNED-CoreValidation-DrawState-InvalidImageView"],
                ..Default::default()
            }));
        }
    } else if format.is_multi_planar() {
        if aspects.is_empty() || !format.aspects().contains(aspects) {
            return Err(Box::new(ValidationError {
                context: "image_view".into(),
                problem: "has aspects that are not aspects of its format".into(),
                vuids: &["UNASSIGNED-CoreValidation-DrawState-InvalidImageView"],
                ..Default::default()
            }));
        }
    } else if aspects != ImageAspects::COLOR {
        return Err(Box::new(ValidationError {
            context: "image_view".into(),
            problem: "has a color format, but its aspects are not `ImageAspects::COLOR`".into(),
            vuids: &["UNASSIGNED-CoreValidation-DrawState-InvalidImageView"],
            ..Default::default()
        }));
    }

    let (required_usage, vuids): (ImageUsage, &'static [&'static str]) = match descriptor_type {
        DescriptorType::SampledImage | DescriptorType::CombinedImageSampler => (
            ImageUsage::SAMPLED,
            &["VUID-VkWriteDescriptorSet-descriptorType-00337"],
        ),
        DescriptorType::StorageImage => (
            ImageUsage::STORAGE,
            &["VUID-VkWriteDescriptorSet-descriptorType-00339"],
        ),
        DescriptorType::InputAttachment => (
            ImageUsage::INPUT_ATTACHMENT,
            &["VUID-VkWriteDescriptorSet-descriptorType-00338"],
        ),
        _ => (ImageUsage::empty(), &[]),
    };

    if !image.usage().contains(required_usage) {
        return Err(Box::new(ValidationError {
            context: "image_view".into(),
            problem: format!(
                "the descriptor type is `DescriptorType::{:?}`, but the image of the view was \
                not created with `ImageUsage::{:?}`",
                descriptor_type, required_usage,
            )
            .into(),
            vuids,
            ..Default::default()
        }));
    }

    if !image_layout.is_valid_for_descriptor(
        descriptor_type,
        image.is_shared_presentable(),
        config,
    ) {
        return Err(Box::new(ValidationError {
            context: "image_layout".into(),
            problem: format!(
                "`ImageLayout::{:?}` is not a valid layout for a descriptor of type \
                `DescriptorType::{:?}`",
                image_layout, descriptor_type,
            )
            .into(),
            vuids: &["VUID-VkWriteDescriptorSet-descriptorType-01403"],
            ..Default::default()
        }));
    }

    Ok(())
}

/// Validates writing `buffer_view` to a texel buffer descriptor.
pub(crate) fn validate_texel_buffer_update(
    descriptor_type: DescriptorType,
    buffer_view: ash::vk::BufferView,
    objects: &ObjectTables,
) -> Result<(), Box<ValidationError>> {
    let view = lookup(
        &objects.buffer_views,
        buffer_view,
        "buffer_view",
        &["VUID-VkWriteDescriptorSet-descriptorType-00323"],
    )?;
    let buffer = lookup(
        &objects.buffers,
        view.buffer(),
        "buffer_view.buffer",
        &["VUID-VkWriteDescriptorSet-descriptorType-00323"],
    )?;

    match descriptor_type {
        DescriptorType::UniformTexelBuffer => buffer.validate_usage(
            BufferUsage::UNIFORM_TEXEL_BUFFER,
            &["VUID-VkWriteDescriptorSet-descriptorType-00334"],
        ),
        DescriptorType::StorageTexelBuffer => buffer.validate_usage(
            BufferUsage::STORAGE_TEXEL_BUFFER,
            &["VUID-VkWriteDescriptorSet-descriptorType-00335"],
        ),
        _ => Ok(()),
    }
    .map_err(|err| err.add_context("buffer_view"))
}

/// Validates writing the range in `info` to a uniform or storage buffer descriptor.
pub(crate) fn validate_buffer_update(
    descriptor_type: DescriptorType,
    info: &DescriptorBufferInfo,
    objects: &ObjectTables,
    config: &ValidationConfig,
) -> Result<(), Box<ValidationError>> {
    let &DescriptorBufferInfo {
        buffer,
        offset,
        range,
    } = info;

    let buffer = lookup(
        &objects.buffers,
        buffer,
        "buffer",
        &["VUID-VkDescriptorBufferInfo-buffer-parameter"],
    )?;

    if !buffer.is_memory_bound() {
        return Err(Box::new(ValidationError {
            context: "buffer".into(),
            problem: "is not bound to memory".into(),
            vuids: &["VUID-VkWriteDescriptorSet-descriptorType-00329"],
            ..Default::default()
        }));
    }

    let is_uniform = matches!(
        descriptor_type,
        DescriptorType::UniformBuffer | DescriptorType::UniformBufferDynamic
    );

    if is_uniform {
        buffer.validate_usage(
            BufferUsage::UNIFORM_BUFFER,
            &["VUID-VkWriteDescriptorSet-descriptorType-00330"],
        )
    } else {
        buffer.validate_usage(
            BufferUsage::STORAGE_BUFFER,
            &["VUID-VkWriteDescriptorSet-descriptorType-00331"],
        )
    }
    .map_err(|err| err.add_context("buffer"))?;

    let size = buffer.size();

    if offset >= size {
        return Err(Box::new(ValidationError {
            problem: format!(
                "`offset` ({}) is not less than the size of the buffer ({})",
                offset, size,
            )
            .into(),
            vuids: &["VUID-VkDescriptorBufferInfo-offset-00340"],
            ..Default::default()
        }));
    }

    let effective_range = if range == WHOLE_SIZE {
        size - offset
    } else {
        if range == 0 {
            return Err(Box::new(ValidationError {
                context: "range".into(),
                problem: "is zero".into(),
                vuids: &["VUID-VkDescriptorBufferInfo-range-00341"],
                ..Default::default()
            }));
        }

        if range > size - offset {
            return Err(Box::new(ValidationError {
                problem: format!(
                    "`range` ({}) is greater than the size of the buffer ({}) minus `offset` \
                    ({})",
                    range, size, offset,
                )
                .into(),
                vuids: &["VUID-VkDescriptorBufferInfo-range-00342"],
                ..Default::default()
            }));
        }

        range
    };

    let limits = &config.limits;

    if is_uniform && effective_range > DeviceSize::from(limits.max_uniform_buffer_range) {
        return Err(Box::new(ValidationError {
            problem: format!(
                "the effective range ({}) is greater than the `max_uniform_buffer_range` limit \
                ({})",
                effective_range, limits.max_uniform_buffer_range,
            )
            .into(),
            vuids: &["VUID-VkWriteDescriptorSet-descriptorType-00332"],
            ..Default::default()
        }));
    }

    if !is_uniform && effective_range > DeviceSize::from(limits.max_storage_buffer_range) {
        return Err(Box::new(ValidationError {
            problem: format!(
                "the effective range ({}) is greater than the `max_storage_buffer_range` limit \
                ({})",
                effective_range, limits.max_storage_buffer_range,
            )
            .into(),
            vuids: &["VUID-VkWriteDescriptorSet-descriptorType-00333"],
            ..Default::default()
        }));
    }

    Ok(())
}

/// Applies `write` to `descriptors`, the descriptors the write covers.
pub(crate) fn apply_write(descriptors: &mut [Descriptor], write: &WriteDescriptorSet) {
    match &write.elements {
        WriteDescriptorSetElements::Image(infos) => {
            for (descriptor, info) in descriptors.iter_mut().zip(infos) {
                descriptor.write_image(info);
            }
        }
        WriteDescriptorSetElements::Buffer(infos) => {
            for (descriptor, info) in descriptors.iter_mut().zip(infos) {
                descriptor.write_buffer(info);
            }
        }
        WriteDescriptorSetElements::TexelBufferView(views) => {
            for (descriptor, &view) in descriptors.iter_mut().zip(views) {
                descriptor.write_texel_buffer_view(view);
            }
        }
        WriteDescriptorSetElements::InlineUniformBlock(_) => {
            for descriptor in descriptors
                .iter_mut()
                .take(write.descriptor_count as usize)
            {
                descriptor.write_inline();
            }
        }
        WriteDescriptorSetElements::AccelerationStructure(handles) => {
            for (descriptor, &handle) in descriptors.iter_mut().zip(handles) {
                descriptor.write_acceleration_structure(handle);
            }
        }
    }
}

/// Returns the global indices of an update of `count` descriptors starting at `array_element`
/// of the binding whose global indices start at `binding_start`, if the set has that many.
pub(crate) fn global_update_range(
    binding_start: u32,
    array_element: u32,
    count: u32,
    total: usize,
) -> Option<Range<usize>> {
    let start = binding_start as usize + array_element as usize;
    let end = start.checked_add(count as usize)?;

    (end <= total).then_some(start..end)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor_set::layout::{
        DescriptorSetLayoutBinding, DescriptorSetLayoutCreateInfo, ShaderStages,
    };

    fn def(bindings: &[(u32, DescriptorType, u32)]) -> DescriptorSetLayoutDef {
        DescriptorSetLayoutDef::new(&DescriptorSetLayoutCreateInfo {
            bindings: bindings
                .iter()
                .map(|&(binding, descriptor_type, descriptor_count)| {
                    DescriptorSetLayoutBinding {
                        binding,
                        descriptor_count,
                        stages: ShaderStages::FRAGMENT,
                        ..DescriptorSetLayoutBinding::descriptor_type(descriptor_type)
                    }
                })
                .collect(),
            ..Default::default()
        })
    }

    #[test]
    fn overflow_into_consistent_binding() {
        let def = def(&[
            (0, DescriptorType::SampledImage, 4),
            (1, DescriptorType::SampledImage, 2),
        ]);

        assert!(verify_update_consistency(&def, 0, 3, 2).is_ok());
        assert!(verify_update_consistency(&def, 0, 0, 6).is_ok());
        // An array element past the end of binding 0 starts in binding 1.
        assert!(verify_update_consistency(&def, 0, 5, 1).is_ok());
    }

    #[test]
    fn overflow_into_inconsistent_binding() {
        let def = def(&[
            (0, DescriptorType::SampledImage, 2),
            (1, DescriptorType::Sampler, 2),
        ]);

        assert!(verify_update_consistency(&def, 0, 0, 2).is_ok());
        assert!(verify_update_consistency(&def, 0, 0, 3)
            .unwrap_err()
            .contains("not consistent"));
    }

    #[test]
    fn overflow_requires_consecutive_binding_numbers() {
        let def = def(&[
            (0, DescriptorType::UniformBuffer, 1),
            (2, DescriptorType::UniformBuffer, 1),
        ]);

        assert!(verify_update_consistency(&def, 0, 0, 2).is_err());
    }

    #[test]
    fn update_range_bounds() {
        assert_eq!(global_update_range(4, 1, 2, 8), Some(5..7));
        assert_eq!(global_update_range(4, 1, 3, 8), Some(5..8));
        assert_eq!(global_update_range(4, 1, 4, 8), None);
    }
}
