// Copyright (c) 2016 The vulkano developers
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or https://opensource.org/licenses/MIT>,
// at your option. All files in the project carrying such
// notice may not be copied, modified, or distributed except
// according to those terms.

//! What a pipeline requires of the descriptors it accesses, and the draw-time validation of bound
//! descriptor sets against those requirements.
//!
//! Every draw or dispatch names, for each set index the pipeline uses, a [`BindingRequirementMap`]
//! from binding number to the [`BindingRequirement`] of that binding. The descriptors of each
//! required binding must have been written, must still refer to live resources, and image
//! descriptors must be in the layout they were written with, according to the command buffer.
//!
//! Sets with many descriptors keep a per-command-buffer cache of the bindings that were already
//! validated, so that repeated draws only revalidate what may have changed since: dynamic buffers
//! after each bind, and image bindings after each layout change.

use super::{
    descriptor::{Descriptor, DescriptorKind},
    layout::{DescriptorBindingFlags, DescriptorType},
    DescriptorSetState,
};
use crate::{
    command_buffer::{image_layout::first_layout_mismatch, CommandBufferState, PipelineBindPoint},
    config::ValidationConfig,
    format::{Format, NumericType},
    image::{view::ImageViewType, SampleCount},
    validator::ObjectTables,
    ObjectHandle, Report, ValidationError, WHOLE_SIZE,
};
use foldhash::HashMap;
use smallvec::SmallVec;
use std::{
    borrow::Cow,
    collections::{BTreeMap, BTreeSet},
    ops::BitOr,
};

/// Sets with more descriptors than this cache their draw-time validation.
pub const MANY_DESCRIPTORS_THRESHOLD: u32 = 64;

/// A set of numeric component types that a shader reads from a resource.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ComponentTypes(u8);

impl ComponentTypes {
    pub const FLOAT: Self = Self(1 << 0);
    pub const SINT: Self = Self(1 << 1);
    pub const UINT: Self = Self(1 << 2);

    #[inline]
    pub const fn empty() -> Self {
        Self(0)
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    #[inline]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Returns the component types that shaders can read from a resource of `format`.
    ///
    /// Normalized, scaled and floating-point formats are all read as floats. Combined
    /// depth/stencil formats can be read as either.
    pub fn from_format(format: Format) -> Self {
        if format == Format::UNDEFINED {
            return Self::empty();
        }

        if format.is_depth_and_stencil() {
            return Self::FLOAT | Self::UINT;
        }

        match format.type_color().or(format.type_stencil()) {
            Some(NumericType::SINT) => Self::SINT,
            Some(NumericType::UINT) => Self::UINT,
            _ => Self::FLOAT,
        }
    }
}

impl BitOr for ComponentTypes {
    type Output = Self;

    #[inline]
    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

/// Whether the images accessed through a binding must be multisampled.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SampleRequirement {
    #[default]
    Any,
    Single,
    Multi,
}

/// The requirements of a pipeline on the descriptors of one binding.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BindingRequirement {
    /// The image view types that the shader can access. If empty, neither the view type nor the
    /// component types of image descriptors are checked.
    pub view_types: SmallVec<[ImageViewType; 2]>,

    /// The component types that the shader reads. Ignored if empty.
    pub component_types: ComponentTypes,

    pub samples: SampleRequirement,
}

/// The requirements of a pipeline on the bindings of one descriptor set, by binding number.
pub type BindingRequirementMap = BTreeMap<u32, BindingRequirement>;

/// The rule identifiers of the draw-time checks, for the command being validated.
pub(crate) struct DrawVuids {
    not_bound: &'static [&'static str],
    descriptor_valid: &'static [&'static str],
    view_type: &'static [&'static str],
    format: &'static [&'static str],
}

impl DrawVuids {
    pub(crate) fn for_bind_point(bind_point: PipelineBindPoint) -> Self {
        match bind_point {
            PipelineBindPoint::Graphics => DrawVuids {
                not_bound: &["VUID-vkCmdDraw-None-02697"],
                descriptor_valid: &["VUID-vkCmdDraw-None-02699"],
                view_type: &["VUID-vkCmdDraw-viewType-07752"],
                format: &["VUID-vkCmdDraw-format-07753"],
            },
            PipelineBindPoint::Compute => DrawVuids {
                not_bound: &["VUID-vkCmdDispatch-None-02697"],
                descriptor_valid: &["VUID-vkCmdDispatch-None-02699"],
                view_type: &["VUID-vkCmdDispatch-viewType-07752"],
                format: &["VUID-vkCmdDispatch-format-07753"],
            },
        }
    }
}

/// A draw or dispatch, as far as descriptor validation is concerned.
#[derive(Clone, Debug)]
pub struct DrawInfo {
    pub bind_point: PipelineBindPoint,

    /// The bound pipeline. Used to key the validation cache of image bindings.
    pub pipeline: ash::vk::Pipeline,

    /// The bindings that the pipeline accesses, by set index.
    ///
    /// The default value is empty.
    pub set_requirements: BTreeMap<u32, BindingRequirementMap>,

    pub _ne: crate::NonExhaustive,
}

impl DrawInfo {
    #[inline]
    pub fn new(bind_point: PipelineBindPoint, pipeline: ash::vk::Pipeline) -> Self {
        Self {
            bind_point,
            pipeline,
            set_requirements: BTreeMap::new(),
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
        let vuids = DrawVuids::for_bind_point(self.bind_point);

        for (&set_index, requirements) in &self.set_requirements {
            let result = self
                .validate_set(set_index, requirements, command_buffer, objects, config, &vuids)
                .map_err(|err| err.add_context(format!("set_requirements[{}]", set_index)));
            report.error(ObjectHandle::new(command_buffer.handle()), result);
        }
    }

    fn validate_set(
        &self,
        set_index: u32,
        requirements: &BindingRequirementMap,
        command_buffer: &CommandBufferState,
        objects: &ObjectTables,
        config: &ValidationConfig,
        vuids: &DrawVuids,
    ) -> Result<(), Box<ValidationError>> {
        let Some(bound) = command_buffer.bound_descriptor_set(self.bind_point, set_index) else {
            return Err(Box::new(ValidationError {
                problem: format!(
                    "the pipeline accesses descriptor set {}, but no descriptor set is bound at \
                    that index",
                    set_index,
                )
                .into(),
                vuids: vuids.not_bound,
                ..Default::default()
            }));
        };

        let set = match bound.set {
            Some(handle) => objects.descriptor_sets.get(&handle).ok_or_else(|| {
                Box::new(ValidationError {
                    problem: format!(
                        "the descriptor set {:?} bound at index {} has been freed or its pool \
                        destroyed",
                        handle, set_index,
                    )
                    .into(),
                    vuids: vuids.descriptor_valid,
                    ..Default::default()
                })
            })?,
            None => command_buffer
                .push_descriptor_sets
                .get(&(self.bind_point, set_index))
                .ok_or_else(|| {
                    Box::new(ValidationError {
                        problem: format!(
                            "the pipeline accesses push descriptor set {}, but no descriptors \
                            were pushed to it",
                            set_index,
                        )
                        .into(),
                        vuids: vuids.descriptor_valid,
                        ..Default::default()
                    })
                })?,
        };

        let requirements = filter_requirements(
            set,
            command_buffer.handle(),
            command_buffer.image_layout_change_count(),
            self.pipeline,
            requirements,
        );

        validate_draw_state(
            set,
            &bound.dynamic_offsets,
            &requirements,
            command_buffer,
            objects,
            config,
            vuids,
        )
    }

    /// Updates the validation caches of the accessed sets, and links the command buffer with
    /// the resources of the accessed descriptors.
    pub(crate) fn record(
        &self,
        command_buffer: &mut CommandBufferState,
        objects: &mut ObjectTables,
        config: &ValidationConfig,
    ) {
        let handle = command_buffer.handle();
        let change_count = command_buffer.image_layout_change_count();

        for (&set_index, requirements) in &self.set_requirements {
            let Some(bound_set) = command_buffer
                .bound_descriptor_set(self.bind_point, set_index)
                .map(|bound| bound.set)
            else {
                continue;
            };

            let set = match bound_set {
                Some(set) => objects.descriptor_sets.get_mut(&set),
                None => command_buffer
                    .push_descriptor_sets
                    .get_mut(&(self.bind_point, set_index)),
            };
            let Some(set) = set else {
                continue;
            };

            let descriptors = record_set(set, handle, change_count, self.pipeline, requirements);
            bind_descriptor_resources(command_buffer, objects, &descriptors, config);
        }
    }
}

/// Validates the descriptors of `set` that `requirements` name, for a draw recorded in
/// `command_buffer`. `dynamic_offsets` are the offsets that the set was bound with.
pub(crate) fn validate_draw_state(
    set: &DescriptorSetState,
    dynamic_offsets: &[u32],
    requirements: &BindingRequirementMap,
    command_buffer: &CommandBufferState,
    objects: &ObjectTables,
    config: &ValidationConfig,
    vuids: &DrawVuids,
) -> Result<(), Box<ValidationError>> {
    let def = set.def();

    for (&binding_num, requirement) in requirements {
        let Some(binding) = def.binding(binding_num) else {
            return Err(Box::new(ValidationError {
                problem: format!(
                    "the pipeline accesses binding {}, which does not exist in the layout of the \
                    descriptor set",
                    binding_num,
                )
                .into(),
                vuids: vuids.descriptor_valid,
                ..Default::default()
            }));
        };

        if binding.binding_flags.intersects(
            DescriptorBindingFlags::PARTIALLY_BOUND | DescriptorBindingFlags::UPDATE_AFTER_BIND,
        ) {
            continue;
        }

        let dynamic_offset_start = def.dynamic_offset_index(binding_num).unwrap_or(0);

        for (index, descriptor) in set.binding_descriptors(binding_num).iter().enumerate() {
            let index = index as u32;

            validate_descriptor(
                descriptor,
                requirement,
                dynamic_offsets
                    .get((dynamic_offset_start + index) as usize)
                    .copied()
                    .unwrap_or(0),
                command_buffer,
                objects,
                config,
                vuids,
            )
            .map_err(|err| {
                err.add_context(format!("bindings[{}].descriptors[{}]", binding_num, index))
            })?;
        }
    }

    Ok(())
}

fn validate_descriptor(
    descriptor: &Descriptor,
    requirement: &BindingRequirement,
    dynamic_offset: u32,
    command_buffer: &CommandBufferState,
    objects: &ObjectTables,
    config: &ValidationConfig,
    vuids: &DrawVuids,
) -> Result<(), Box<ValidationError>> {
    if let DescriptorKind::InlineUniform = descriptor.kind {
        return Ok(());
    }

    if !descriptor.updated {
        return Err(Box::new(ValidationError {
            problem: "the descriptor is accessed by the pipeline, but was never written".into(),
            vuids: vuids.descriptor_valid,
            ..Default::default()
        }));
    }

    match descriptor.kind {
        DescriptorKind::Buffer {
            buffer,
            offset,
            range,
            dynamic,
        } => {
            let buffer_state = objects.buffers.get(&buffer).ok_or_else(|| {
                Box::new(ValidationError {
                    problem: format!("the buffer {:?} has been destroyed", buffer).into(),
                    vuids: vuids.descriptor_valid,
                    ..Default::default()
                })
            })?;

            if !buffer_state.is_memory_bound() {
                return Err(Box::new(ValidationError {
                    problem: format!("the buffer {:?} has no memory bound to it", buffer).into(),
                    vuids: vuids.descriptor_valid,
                    ..Default::default()
                }));
            }

            if dynamic {
                let size = buffer_state.size();
                let effective_range = if range == WHOLE_SIZE {
                    size.saturating_sub(offset)
                } else {
                    range
                };
                let end = u64::from(dynamic_offset)
                    .saturating_add(offset)
                    .saturating_add(effective_range);

                if end > size {
                    return Err(Box::new(ValidationError {
                        problem: format!(
                            "the dynamic offset ({}) plus the offset ({}) and range ({}) of the \
                            descriptor is greater than the size of the buffer ({})",
                            dynamic_offset, offset, effective_range, size,
                        )
                        .into(),
                        vuids: &["VUID-vkCmdBindDescriptorSets-pDynamicOffsets-01979"],
                        ..Default::default()
                    }));
                }
            }
        }
        DescriptorKind::ImageSampler {
            image_view,
            image_layout,
            ..
        }
        | DescriptorKind::Image {
            image_view,
            image_layout,
        } => {
            let view = objects.image_views.get(&image_view).ok_or_else(|| {
                Box::new(ValidationError {
                    problem: format!("the image view {:?} has been destroyed", image_view).into(),
                    vuids: vuids.descriptor_valid,
                    ..Default::default()
                })
            })?;

            if !requirement.view_types.is_empty() {
                if !requirement.view_types.contains(&view.view_type()) {
                    return Err(Box::new(ValidationError {
                        problem: format!(
                            "the pipeline requires an image view of type {:?}, but the view has \
                            type `ImageViewType::{:?}`",
                            requirement.view_types,
                            view.view_type(),
                        )
                        .into(),
                        vuids: vuids.view_type,
                        ..Default::default()
                    }));
                }

                if !requirement
                    .component_types
                    .intersects(view.format_components())
                {
                    return Err(Box::new(ValidationError {
                        problem: format!(
                            "the pipeline reads components of type {:?}, but the format of the \
                            image view is `Format::{:?}`",
                            requirement.component_types,
                            view.format(),
                        )
                        .into(),
                        vuids: vuids.format,
                        ..Default::default()
                    }));
                }
            }

            if !config.disabled.image_layout_validation {
                let shared_presentable = objects
                    .images
                    .get(&view.image())
                    .is_some_and(|image| image.is_shared_presentable());
                let mismatch = command_buffer
                    .image_layout_map(view.image())
                    .and_then(|map| {
                        first_layout_mismatch(
                            map,
                            &view.layout_range(),
                            image_layout,
                            view.subresource_range().aspects,
                            shared_presentable,
                        )
                    });

                if let Some(mismatch) = mismatch {
                    return Err(Box::new(ValidationError {
                        problem: format!(
                            "the descriptor was written with layout `ImageLayout::{:?}`, but \
                            subresource {:?} of the image has the {} layout \
                            `ImageLayout::{:?}` in the command buffer",
                            image_layout,
                            mismatch.subresource,
                            mismatch.describe(),
                            mismatch.layout,
                        )
                        .into(),
                        vuids: &["VUID-VkDescriptorImageInfo-imageLayout-00344"],
                        ..Default::default()
                    }));
                }
            }

            match requirement.samples {
                SampleRequirement::Single if view.samples() != SampleCount::Sample1 => {
                    return Err(Box::new(ValidationError {
                        problem: format!(
                            "the pipeline requires a single-sampled image, but the image view \
                            has `SampleCount::{:?}`",
                            view.samples(),
                        )
                        .into(),
                        vuids: vuids.descriptor_valid,
                        ..Default::default()
                    }));
                }
                SampleRequirement::Multi if view.samples() == SampleCount::Sample1 => {
                    return Err(Box::new(ValidationError {
                        problem: "the pipeline requires a multisampled image, but the image \
                            view has one sample"
                            .into(),
                        vuids: vuids.descriptor_valid,
                        ..Default::default()
                    }));
                }
                _ => (),
            }
        }
        DescriptorKind::TexelBuffer { buffer_view } => {
            let view = objects.buffer_views.get(&buffer_view).ok_or_else(|| {
                Box::new(ValidationError {
                    problem: format!("the buffer view {:?} has been destroyed", buffer_view)
                        .into(),
                    vuids: vuids.descriptor_valid,
                    ..Default::default()
                })
            })?;

            if !objects.buffers.contains_key(&view.buffer()) {
                return Err(Box::new(ValidationError {
                    problem: format!(
                        "the buffer {:?} of the buffer view has been destroyed",
                        view.buffer(),
                    )
                    .into(),
                    vuids: vuids.descriptor_valid,
                    ..Default::default()
                }));
            }

            if !requirement.component_types.is_empty()
                && !requirement
                    .component_types
                    .intersects(ComponentTypes::from_format(view.format()))
            {
                return Err(Box::new(ValidationError {
                    problem: format!(
                        "the pipeline reads components of type {:?}, but the format of the \
                        buffer view is `Format::{:?}`",
                        requirement.component_types,
                        view.format(),
                    )
                    .into(),
                    vuids: vuids.format,
                    ..Default::default()
                }));
            }
        }
        _ => (),
    }

    if let Some(sampler) = descriptor.sampler() {
        let sampler_state = objects.samplers.get(&sampler).ok_or_else(|| {
            Box::new(ValidationError {
                problem: format!("the sampler {:?} has been destroyed", sampler).into(),
                vuids: vuids.descriptor_valid,
                ..Default::default()
            })
        })?;

        if sampler_state.sampler_ycbcr_conversion().is_some()
            && !descriptor.is_immutable_sampler()
        {
            return Err(Box::new(ValidationError {
                problem: format!(
                    "the sampler {:?} has a sampler YCbCr conversion, but is not an immutable \
                    sampler of the binding",
                    sampler,
                )
                .into(),
                vuids: vuids.descriptor_valid,
                ..Default::default()
            }));
        }
    }

    Ok(())
}

/// What was already validated for one command buffer that has a set bound.
#[derive(Clone, Debug, Default)]
pub(crate) struct CachedValidation {
    /// Bindings whose resources are already linked with the command buffer.
    pub(crate) command_binding_and_usage: BTreeSet<u32>,

    /// Non-dynamic buffer bindings validated during this recording.
    pub(crate) non_dynamic_buffers: BTreeSet<u32>,

    /// Dynamic buffer bindings validated since the set was last bound.
    pub(crate) dynamic_buffers: BTreeSet<u32>,

    /// For each pipeline, the image layout change count of the command buffer when each image or
    /// sampler binding was last validated.
    pub(crate) image_samplers: HashMap<ash::vk::Pipeline, HashMap<u32, u64>>,
}

/// Returns the requirements that still need validating, given what the cache of `set` knows.
///
/// Sets with few descriptors are always validated in full.
pub(crate) fn filter_requirements<'a>(
    set: &DescriptorSetState,
    command_buffer: ash::vk::CommandBuffer,
    image_layout_change_count: u64,
    pipeline: ash::vk::Pipeline,
    requirements: &'a BindingRequirementMap,
) -> Cow<'a, BindingRequirementMap> {
    let def = set.def();

    if def.total_descriptor_count() <= MANY_DESCRIPTORS_THRESHOLD {
        return Cow::Borrowed(requirements);
    }

    let Some(cached) = set.cached_validation.get(&command_buffer) else {
        return Cow::Borrowed(requirements);
    };

    let stats = def.binding_type_stats();
    let versions = cached.image_samplers.get(&pipeline);

    let filtered = requirements
        .iter()
        .filter(|&(&binding_num, _)| {
            let Some(binding) = def.binding(binding_num) else {
                return false;
            };

            match binding.descriptor_type {
                DescriptorType::UniformBufferDynamic | DescriptorType::StorageBufferDynamic => {
                    (cached.dynamic_buffers.len() as u32) < stats.dynamic_buffer_count
                        && !cached.dynamic_buffers.contains(&binding_num)
                }
                DescriptorType::UniformBuffer | DescriptorType::StorageBuffer => {
                    (cached.non_dynamic_buffers.len() as u32) < stats.non_dynamic_buffer_count
                        && !cached.non_dynamic_buffers.contains(&binding_num)
                }
                _ => versions
                    .and_then(|versions| versions.get(&binding_num))
                    .is_none_or(|&version| version != image_layout_change_count),
            }
        })
        .map(|(&binding_num, requirement)| (binding_num, requirement.clone()))
        .collect();

    Cow::Owned(filtered)
}

/// Records that the bindings of `validated` passed validation for `command_buffer`.
pub(crate) fn update_validation_cache(
    set: &mut DescriptorSetState,
    command_buffer: ash::vk::CommandBuffer,
    image_layout_change_count: u64,
    pipeline: ash::vk::Pipeline,
    validated: &BindingRequirementMap,
) {
    let def = set.def().clone();
    let cached = set.cached_validation.entry(command_buffer).or_default();

    for &binding_num in validated.keys() {
        let Some(binding) = def.binding(binding_num) else {
            continue;
        };

        match binding.descriptor_type {
            DescriptorType::UniformBufferDynamic | DescriptorType::StorageBufferDynamic => {
                cached.dynamic_buffers.insert(binding_num);
            }
            DescriptorType::UniformBuffer | DescriptorType::StorageBuffer => {
                cached.non_dynamic_buffers.insert(binding_num);
            }
            _ => {
                cached
                    .image_samplers
                    .entry(pipeline)
                    .or_default()
                    .insert(binding_num, image_layout_change_count);
            }
        }
    }
}

/// Updates the cache of `set` after a draw, and returns the descriptors whose resources are not
/// yet linked with the command buffer.
fn record_set(
    set: &mut DescriptorSetState,
    command_buffer: ash::vk::CommandBuffer,
    image_layout_change_count: u64,
    pipeline: ash::vk::Pipeline,
    requirements: &BindingRequirementMap,
) -> Vec<Descriptor> {
    let filtered = filter_requirements(
        set,
        command_buffer,
        image_layout_change_count,
        pipeline,
        requirements,
    )
    .into_owned();
    update_validation_cache(
        set,
        command_buffer,
        image_layout_change_count,
        pipeline,
        &filtered,
    );

    let def = set.def().clone();
    let mut newly_used = SmallVec::<[u32; 8]>::new();

    if let Some(cached) = set.cached_validation.get_mut(&command_buffer) {
        for &binding_num in requirements.keys() {
            let skipped = def.binding(binding_num).is_none_or(|binding| {
                binding.binding_flags.intersects(
                    DescriptorBindingFlags::PARTIALLY_BOUND
                        | DescriptorBindingFlags::UPDATE_AFTER_BIND,
                )
            });

            if !skipped && cached.command_binding_and_usage.insert(binding_num) {
                newly_used.push(binding_num);
            }
        }
    }

    newly_used
        .into_iter()
        .flat_map(|binding_num| set.binding_descriptors(binding_num).iter())
        .filter(|descriptor| descriptor.updated)
        .cloned()
        .collect()
}

/// Links the command buffer with the resources of `descriptors`, and records the layouts that
/// image descriptors expect as the initial layouts of their subresources.
fn bind_descriptor_resources(
    command_buffer: &mut CommandBufferState,
    objects: &mut ObjectTables,
    descriptors: &[Descriptor],
    config: &ValidationConfig,
) {
    for descriptor in descriptors {
        if let Some(sampler) = descriptor.sampler() {
            if !descriptor.is_immutable_sampler() {
                command_buffer.bind_sampler(&mut objects.samplers, sampler);
            }
        }

        match descriptor.kind {
            DescriptorKind::ImageSampler {
                image_view,
                image_layout,
                ..
            }
            | DescriptorKind::Image {
                image_view,
                image_layout,
            } => {
                command_buffer.bind_image_view(&mut objects.image_views, image_view);

                let Some(view) = objects.image_views.get(&image_view) else {
                    continue;
                };
                command_buffer.bind_image(&mut objects.images, view.image());

                if !config.disabled.image_layout_validation {
                    if let Some(image) = objects.images.get(&view.image()) {
                        command_buffer.set_image_view_initial_layout(view, image, image_layout);
                    }
                }
            }
            DescriptorKind::Buffer { buffer, .. } => {
                command_buffer.bind_buffer(&mut objects.buffers, buffer);
            }
            DescriptorKind::TexelBuffer { buffer_view } => {
                command_buffer.bind_buffer_view(&mut objects.buffer_views, buffer_view);

                if let Some(buffer) = objects.buffer_views.get(&buffer_view).map(|v| v.buffer()) {
                    command_buffer.bind_buffer(&mut objects.buffers, buffer);
                }
            }
            _ => (),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        buffer::BufferUsage,
        command_buffer::bind_push::BindDescriptorSetsInfo,
        descriptor_set::{
            layout::{DescriptorSetLayoutBinding, DescriptorSetLayoutCreateInfo},
            update::{DescriptorBufferInfo, DescriptorImageInfo, WriteDescriptorSet},
        },
        image::{ImageAspects, ImageLayout, ImageSubresourceRange},
        sync::ImageMemoryBarrier,
        config::ValidationConfig,
        tests_util::{test_validator, test_validator_with, ColorImage},
    };
    use ash::vk::Handle;

    #[test]
    fn component_types_from_format() {
        assert_eq!(
            ComponentTypes::from_format(Format::R8G8B8A8_UNORM),
            ComponentTypes::FLOAT,
        );
        assert_eq!(
            ComponentTypes::from_format(Format::R32_SINT),
            ComponentTypes::SINT,
        );
        assert_eq!(
            ComponentTypes::from_format(Format::R16G16_UINT),
            ComponentTypes::UINT,
        );
        assert_eq!(
            ComponentTypes::from_format(Format::D24_UNORM_S8_UINT),
            ComponentTypes::FLOAT | ComponentTypes::UINT,
        );
        assert!(ComponentTypes::from_format(Format::UNDEFINED).is_empty());
    }

    fn graphics_draw(set_requirements: BindingRequirementMap) -> DrawInfo {
        let mut draw_info = DrawInfo::new(
            PipelineBindPoint::Graphics,
            ash::vk::Pipeline::from_raw(0x900),
        );
        draw_info.set_requirements.insert(0, set_requirements);
        draw_info
    }

    #[test]
    fn dynamic_offset_past_end_of_buffer() {
        let (mut validator, sink) = test_validator();
        let buffer = validator.test_buffer(256, BufferUsage::UNIFORM_BUFFER);
        let (layout, set) = validator.test_descriptor_set(DescriptorSetLayoutCreateInfo {
            bindings: vec![DescriptorSetLayoutBinding::descriptor_type(
                DescriptorType::UniformBufferDynamic,
            )],
            ..Default::default()
        });

        let write = WriteDescriptorSet::buffers(
            set,
            0,
            0,
            DescriptorType::UniformBufferDynamic,
            [DescriptorBufferInfo {
                buffer,
                offset: 0,
                range: WHOLE_SIZE,
            }],
        );
        assert!(!validator.validate_update_descriptor_sets(&[write.clone()], &[]));
        validator.record_update_descriptor_sets(&[write], &[]);

        let cb = validator.test_command_buffer(0);
        let bind_info = BindDescriptorSetsInfo {
            dynamic_offsets: smallvec::smallvec![256],
            ..BindDescriptorSetsInfo::sets(PipelineBindPoint::Graphics, vec![layout], 0, [set])
        };
        assert!(!validator.validate_cmd_bind_descriptor_sets(cb, &bind_info));
        validator.record_cmd_bind_descriptor_sets(cb, &bind_info);

        let mut requirements = BindingRequirementMap::new();
        requirements.insert(0, BindingRequirement::default());
        let draw_info = graphics_draw(requirements);

        // A range of the whole buffer leaves no room for any dynamic offset.
        let bind_info = BindDescriptorSetsInfo {
            dynamic_offsets: smallvec::smallvec![0],
            ..bind_info
        };
        validator.record_cmd_bind_descriptor_sets(cb, &bind_info);
        assert!(!validator.validate_cmd_draw(cb, &draw_info));

        let bind_info = BindDescriptorSetsInfo {
            dynamic_offsets: smallvec::smallvec![200],
            ..bind_info
        };
        validator.record_cmd_bind_descriptor_sets(cb, &bind_info);
        assert!(validator.validate_cmd_draw(cb, &draw_info));
        assert!(sink.contains_vuid("VUID-vkCmdBindDescriptorSets-pDynamicOffsets-01979"));
    }

    #[test]
    fn unwritten_descriptor() {
        let (mut validator, sink) = test_validator();
        let (layout, set) = validator.test_descriptor_set(DescriptorSetLayoutCreateInfo {
            bindings: vec![DescriptorSetLayoutBinding::descriptor_type(
                DescriptorType::SampledImage,
            )],
            ..Default::default()
        });
        let cb = validator.test_command_buffer(0);

        let bind_info =
            BindDescriptorSetsInfo::sets(PipelineBindPoint::Graphics, vec![layout], 0, [set]);
        validator.record_cmd_bind_descriptor_sets(cb, &bind_info);

        let mut requirements = BindingRequirementMap::new();
        requirements.insert(0, BindingRequirement::default());
        assert!(validator.validate_cmd_draw(cb, &graphics_draw(requirements)));
        assert!(sink.contains_vuid("VUID-vkCmdDraw-None-02699"));
    }

    #[test]
    fn set_not_bound() {
        let (mut validator, sink) = test_validator();
        let cb = validator.test_command_buffer(0);

        let mut requirements = BindingRequirementMap::new();
        requirements.insert(0, BindingRequirement::default());
        assert!(validator.validate_cmd_draw(cb, &graphics_draw(requirements)));
        assert!(sink.contains_vuid("VUID-vkCmdDraw-None-02697"));
    }

    #[test]
    fn image_layout_and_view_type() {
        let (mut validator, sink) = test_validator();
        let image = validator.test_image(ColorImage::sampled(8, 8));
        let view = validator.test_view(image);
        let (layout, set) = validator.test_descriptor_set(DescriptorSetLayoutCreateInfo {
            bindings: vec![DescriptorSetLayoutBinding::descriptor_type(
                DescriptorType::SampledImage,
            )],
            ..Default::default()
        });

        let write = WriteDescriptorSet::images(
            set,
            0,
            0,
            DescriptorType::SampledImage,
            [DescriptorImageInfo::image_view(
                view,
                ImageLayout::ShaderReadOnlyOptimal,
            )],
        );
        assert!(!validator.validate_update_descriptor_sets(&[write.clone()], &[]));
        validator.record_update_descriptor_sets(&[write], &[]);

        let cb = validator.test_command_buffer(0);
        let bind_info =
            BindDescriptorSetsInfo::sets(PipelineBindPoint::Graphics, vec![layout], 0, [set]);
        validator.record_cmd_bind_descriptor_sets(cb, &bind_info);

        let mut requirements = BindingRequirementMap::new();
        requirements.insert(
            0,
            BindingRequirement {
                view_types: smallvec::smallvec![ImageViewType::Dim2d],
                component_types: ComponentTypes::FLOAT,
                samples: SampleRequirement::Single,
            },
        );
        let draw_info = graphics_draw(requirements);

        assert!(!validator.validate_cmd_draw(cb, &draw_info));
        validator.record_cmd_draw(cb, &draw_info);

        // The first draw recorded the layout the descriptor expects.
        let subresource = crate::image::ImageSubresource {
            aspects: ImageAspects::COLOR,
            mip_level: 0,
            array_layer: 0,
        };
        let map = validator
            .command_buffer(cb)
            .unwrap()
            .image_layout_map(image)
            .unwrap();
        assert_eq!(
            map.initial_layout(subresource).map(|initial| initial.layout),
            Some(ImageLayout::ShaderReadOnlyOptimal),
        );

        let mut barrier =
            ImageMemoryBarrier::image(image, ImageSubresourceRange::whole(ImageAspects::COLOR));
        barrier.old_layout = ImageLayout::ShaderReadOnlyOptimal;
        barrier.new_layout = ImageLayout::General;
        let dependency_info = crate::command_buffer::barrier::DependencyInfo {
            image_memory_barriers: smallvec::smallvec![barrier],
            ..Default::default()
        };
        validator.record_cmd_pipeline_barrier(cb, &dependency_info);

        assert!(validator.validate_cmd_draw(cb, &draw_info));
        assert!(sink.contains_vuid("VUID-VkDescriptorImageInfo-imageLayout-00344"));

        let mut requirements = BindingRequirementMap::new();
        requirements.insert(
            0,
            BindingRequirement {
                view_types: smallvec::smallvec![ImageViewType::Cube],
                component_types: ComponentTypes::FLOAT,
                samples: SampleRequirement::Any,
            },
        );
        assert!(validator.validate_cmd_draw(cb, &graphics_draw(requirements)));
        assert!(sink.contains_vuid("VUID-vkCmdDraw-viewType-07752"));
    }

    #[test]
    fn shared_present_matches_general() {
        let mut config = ValidationConfig::default();
        config.extensions.khr_shared_presentable_image = true;
        let (mut validator, sink) = test_validator_with(config);

        let image = ash::vk::Image::from_raw(0x700);
        validator.record_create_swapchain_images(
            ash::vk::SwapchainKHR::from_raw(0x701),
            &ColorImage::sampled(8, 8),
            &[image],
            true,
        );
        let view = validator.test_view(image);
        let (layout, set) = validator.test_descriptor_set(DescriptorSetLayoutCreateInfo {
            bindings: vec![DescriptorSetLayoutBinding::descriptor_type(
                DescriptorType::SampledImage,
            )],
            ..Default::default()
        });

        let write = WriteDescriptorSet::images(
            set,
            0,
            0,
            DescriptorType::SampledImage,
            [DescriptorImageInfo::image_view(view, ImageLayout::SharedPresent)],
        );
        assert!(!validator.validate_update_descriptor_sets(&[write.clone()], &[]));
        validator.record_update_descriptor_sets(&[write], &[]);

        let cb = validator.test_command_buffer(0);
        let mut barrier =
            ImageMemoryBarrier::image(image, ImageSubresourceRange::whole(ImageAspects::COLOR));
        barrier.old_layout = ImageLayout::Undefined;
        barrier.new_layout = ImageLayout::General;
        let dependency_info = crate::command_buffer::barrier::DependencyInfo {
            image_memory_barriers: smallvec::smallvec![barrier],
            ..Default::default()
        };
        validator.record_cmd_pipeline_barrier(cb, &dependency_info);

        let bind_info =
            BindDescriptorSetsInfo::sets(PipelineBindPoint::Graphics, vec![layout], 0, [set]);
        validator.record_cmd_bind_descriptor_sets(cb, &bind_info);

        let mut requirements = BindingRequirementMap::new();
        requirements.insert(0, BindingRequirement::default());
        assert!(!validator.validate_cmd_draw(cb, &graphics_draw(requirements)));
        assert!(!sink.contains_vuid("VUID-VkDescriptorImageInfo-imageLayout-00344"));
    }

    #[test]
    fn cache_skips_validated_bindings() {
        let (mut validator, _sink) = test_validator();
        let (layout, set) = validator.test_descriptor_set(DescriptorSetLayoutCreateInfo {
            bindings: vec![
                DescriptorSetLayoutBinding {
                    binding: 0,
                    descriptor_count: 100,
                    ..DescriptorSetLayoutBinding::descriptor_type(DescriptorType::StorageBuffer)
                },
                DescriptorSetLayoutBinding {
                    binding: 1,
                    ..DescriptorSetLayoutBinding::descriptor_type(
                        DescriptorType::StorageBufferDynamic,
                    )
                },
            ],
            ..Default::default()
        });
        let cb = validator.test_command_buffer(0);
        let cb_handle = cb;

        let bind_info = BindDescriptorSetsInfo {
            dynamic_offsets: smallvec::smallvec![0],
            ..BindDescriptorSetsInfo::sets(PipelineBindPoint::Graphics, vec![layout], 0, [set])
        };
        validator.record_cmd_bind_descriptor_sets(cb, &bind_info);

        let mut requirements = BindingRequirementMap::new();
        requirements.insert(0, BindingRequirement::default());
        requirements.insert(1, BindingRequirement::default());

        let pipeline = ash::vk::Pipeline::from_raw(0x900);
        let set_state = validator.descriptor_set(set).unwrap();

        // Nothing is cached before the first draw.
        let filtered = filter_requirements(set_state, cb_handle, 1, pipeline, &requirements);
        assert_eq!(filtered.len(), 2);

        let set_state = validator.descriptor_set_mut(set).unwrap();
        update_validation_cache(set_state, cb_handle, 1, pipeline, &requirements);
        let filtered = filter_requirements(set_state, cb_handle, 1, pipeline, &requirements);
        assert!(filtered.is_empty());

        // Binding again dirties the dynamic buffers only.
        validator.record_cmd_bind_descriptor_sets(cb, &bind_info);
        let set_state = validator.descriptor_set(set).unwrap();
        let filtered = filter_requirements(set_state, cb_handle, 1, pipeline, &requirements);
        assert_eq!(filtered.keys().copied().collect::<Vec<_>>(), vec![1]);
    }
}
