// Copyright (c) 2016 The vulkano developers
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or https://opensource.org/licenses/MIT>,
// at your option. All files in the project carrying such
// notice may not be copied, modified, or distributed except
// according to those terms.

//! Descriptor set layouts, descriptor pools and the state of allocated descriptor sets.
//!
//! A descriptor set holds one [`Descriptor`] per array element of each binding of its layout,
//! stored densely in binding order. Write and copy updates are validated against that state, and
//! the descriptors that a draw accesses are validated against the state of the command buffer
//! the draw is recorded in.
//!
//! Descriptor sets either come from a pool, or are pushed directly to a command buffer. Pushed
//! sets are owned by the command buffer, and live until it is reset.

use self::{
    descriptor::Descriptor,
    layout::{
        DescriptorBindingFlags, DescriptorSetLayoutDef, DescriptorSetLayoutState, DescriptorType,
    },
    requirements::CachedValidation,
    update::{apply_write, global_update_range, WriteDescriptorSet},
};
use crate::{
    config::ValidationConfig,
    macros::vulkan_bitflags,
    validator::{lookup, ObjectTables},
    ValidationError,
};
use foldhash::{HashMap, HashSet};
use smallvec::SmallVec;
use std::{ops::Range, sync::Arc};

pub mod descriptor;
pub mod dictionary;
pub mod layout;
pub mod requirements;
pub mod template;
pub mod update;

vulkan_bitflags! {
    /// Flags that control how a descriptor pool is created.
    DescriptorPoolCreateFlags = DescriptorPoolCreateFlags(u32);

    /// Individual descriptor sets can be freed from the pool. Otherwise you must reset or destroy
    /// the whole pool at once.
    FREE_DESCRIPTOR_SET = FREE_DESCRIPTOR_SET,

    /// The pool can allocate descriptor sets with a layout whose flags include
    /// [`DescriptorSetLayoutCreateFlags::UPDATE_AFTER_BIND_POOL`].
    ///
    /// [`DescriptorSetLayoutCreateFlags::UPDATE_AFTER_BIND_POOL`]: layout::DescriptorSetLayoutCreateFlags::UPDATE_AFTER_BIND_POOL
    UPDATE_AFTER_BIND = UPDATE_AFTER_BIND
    RequiresOneOf([
        RequiresAllOf([DeviceExtension(ext_descriptor_indexing)]),
    ]),
}

/// Parameters to create a new descriptor pool.
#[derive(Clone, Debug)]
pub struct DescriptorPoolCreateInfo {
    /// Additional properties of the descriptor pool.
    ///
    /// The default value is empty.
    pub flags: DescriptorPoolCreateFlags,

    /// The maximum number of descriptor sets that can be allocated from the pool.
    ///
    /// The default value is `0`, which must be overridden.
    pub max_sets: u32,

    /// The number of descriptors of each type that the pool can hold. For inline uniform blocks,
    /// this is the number of bytes.
    ///
    /// The default value is empty, which must be overridden.
    pub pool_sizes: HashMap<DescriptorType, u32>,

    pub _ne: crate::NonExhaustive,
}

impl Default for DescriptorPoolCreateInfo {
    #[inline]
    fn default() -> Self {
        Self {
            flags: DescriptorPoolCreateFlags::empty(),
            max_sets: 0,
            pool_sizes: HashMap::default(),
            _ne: crate::NonExhaustive(()),
        }
    }
}

impl DescriptorPoolCreateInfo {
    pub(crate) fn validate(&self, config: &ValidationConfig) -> Result<(), Box<ValidationError>> {
        let &Self {
            flags,
            max_sets,
            ref pool_sizes,
            _ne: _,
        } = self;

        flags
            .validate_device(&config.features, &config.extensions)
            .map_err(|err| {
                err.add_context("flags")
                    .set_vuids(&["VUID-VkDescriptorPoolCreateInfo-flags-parameter"])
            })?;

        if max_sets == 0 {
            return Err(Box::new(ValidationError {
                context: "max_sets".into(),
                problem: "is zero".into(),
                vuids: &["VUID-VkDescriptorPoolCreateInfo-maxSets-00301"],
                ..Default::default()
            }));
        }

        if pool_sizes.is_empty() {
            return Err(Box::new(ValidationError {
                context: "pool_sizes".into(),
                problem: "is empty".into(),
                vuids: &["VUID-VkDescriptorPoolCreateInfo-poolSizeCount-arraylength"],
                ..Default::default()
            }));
        }

        for (&descriptor_type, &descriptor_count) in pool_sizes {
            if descriptor_count == 0 {
                return Err(Box::new(ValidationError {
                    context: format!("pool_sizes[DescriptorType::{:?}]", descriptor_type).into(),
                    problem: "is zero".into(),
                    vuids: &["VUID-VkDescriptorPoolSize-descriptorCount-00302"],
                    ..Default::default()
                }));
            }

            if descriptor_type == DescriptorType::InlineUniformBlock && descriptor_count % 4 != 0 {
                return Err(Box::new(ValidationError {
                    context: "pool_sizes[DescriptorType::InlineUniformBlock]".into(),
                    problem: "is not a multiple of 4".into(),
                    vuids: &["VUID-VkDescriptorPoolSize-type-02218"],
                    ..Default::default()
                }));
            }
        }

        Ok(())
    }
}

/// The state tracked for a descriptor pool: its capacity, and the sets allocated from it.
#[derive(Debug)]
pub struct DescriptorPoolState {
    handle: ash::vk::DescriptorPool,
    create_info: DescriptorPoolCreateInfo,
    available_sets: u32,
    available_descriptors: HashMap<DescriptorType, u32>,
    pub(crate) sets: HashSet<ash::vk::DescriptorSet>,
}

impl DescriptorPoolState {
    pub fn new(handle: ash::vk::DescriptorPool, create_info: DescriptorPoolCreateInfo) -> Self {
        DescriptorPoolState {
            handle,
            available_sets: create_info.max_sets,
            available_descriptors: create_info.pool_sizes.clone(),
            create_info,
            sets: HashSet::default(),
        }
    }

    #[inline]
    pub fn handle(&self) -> ash::vk::DescriptorPool {
        self.handle
    }

    #[inline]
    pub fn flags(&self) -> DescriptorPoolCreateFlags {
        self.create_info.flags
    }

    #[inline]
    pub fn max_sets(&self) -> u32 {
        self.create_info.max_sets
    }

    /// Returns the number of sets that can still be allocated.
    #[inline]
    pub fn available_sets(&self) -> u32 {
        self.available_sets
    }

    /// Returns the number of descriptors of `descriptor_type` that can still be allocated.
    #[inline]
    pub fn available_descriptors(&self, descriptor_type: DescriptorType) -> u32 {
        self.available_descriptors
            .get(&descriptor_type)
            .copied()
            .unwrap_or(0)
    }

    /// Returns the sets currently allocated from the pool.
    #[inline]
    pub fn sets(&self) -> &HashSet<ash::vk::DescriptorSet> {
        &self.sets
    }

    pub(crate) fn allocate(&mut self, set: &DescriptorSetState) {
        self.available_sets = self.available_sets.saturating_sub(1);

        for (descriptor_type, count) in set.descriptor_counts() {
            let available = self.available_descriptors.entry(descriptor_type).or_insert(0);
            *available = available.saturating_sub(count);
        }

        self.sets.insert(set.handle());
    }

    pub(crate) fn free(&mut self, set: &DescriptorSetState) {
        if !self.sets.remove(&set.handle()) {
            return;
        }

        self.available_sets = (self.available_sets + 1).min(self.create_info.max_sets);

        for (descriptor_type, count) in set.descriptor_counts() {
            let max = self.create_info.pool_sizes.get(&descriptor_type).copied().unwrap_or(0);
            let available = self.available_descriptors.entry(descriptor_type).or_insert(0);
            *available = available.saturating_add(count).min(max);
        }
    }

    /// Frees every set allocated from the pool, returning their handles.
    pub(crate) fn reset(&mut self) -> HashSet<ash::vk::DescriptorSet> {
        self.available_sets = self.create_info.max_sets;
        self.available_descriptors = self.create_info.pool_sizes.clone();

        std::mem::take(&mut self.sets)
    }
}

/// Parameters to allocate new descriptor sets.
#[derive(Clone, Debug)]
pub struct DescriptorSetAllocateInfo {
    pub descriptor_pool: ash::vk::DescriptorPool,

    /// The layout of each set to allocate.
    pub set_layouts: SmallVec<[ash::vk::DescriptorSetLayout; 4]>,

    /// For each set, the number of descriptors to allocate for the variable-count binding of the
    /// layout. If empty, every variable-count binding gets zero descriptors.
    ///
    /// The default value is empty.
    pub variable_descriptor_counts: SmallVec<[u32; 4]>,

    pub _ne: crate::NonExhaustive,
}

impl DescriptorSetAllocateInfo {
    #[inline]
    pub fn new(
        descriptor_pool: ash::vk::DescriptorPool,
        set_layouts: impl IntoIterator<Item = ash::vk::DescriptorSetLayout>,
    ) -> Self {
        Self {
            descriptor_pool,
            set_layouts: set_layouts.into_iter().collect(),
            variable_descriptor_counts: SmallVec::new(),
            _ne: crate::NonExhaustive(()),
        }
    }

    /// Returns the variable descriptor count given for the set at `index`.
    #[inline]
    pub fn variable_descriptor_count(&self, index: usize) -> Option<u32> {
        if self.variable_descriptor_counts.is_empty() {
            None
        } else {
            self.variable_descriptor_counts.get(index).copied()
        }
    }

    pub(crate) fn validate(&self, objects: &ObjectTables) -> Result<(), Box<ValidationError>> {
        let Self {
            descriptor_pool,
            set_layouts,
            variable_descriptor_counts,
            _ne: _,
        } = self;

        let pool = lookup(
            &objects.descriptor_pools,
            *descriptor_pool,
            "descriptor_pool",
            &["VUID-VkDescriptorSetAllocateInfo-descriptorPool-parameter"],
        )?;

        if set_layouts.is_empty() {
            return Err(Box::new(ValidationError {
                context: "set_layouts".into(),
                problem: "is empty".into(),
                vuids: &["VUID-VkDescriptorSetAllocateInfo-descriptorSetCount-arraylength"],
                ..Default::default()
            }));
        }

        if !variable_descriptor_counts.is_empty()
            && variable_descriptor_counts.len() != set_layouts.len()
        {
            return Err(Box::new(ValidationError {
                problem: "`variable_descriptor_counts` is not empty, and its length does not \
                    equal the length of `set_layouts`"
                    .into(),
                vuids: &[
                    "VUID-VkDescriptorSetVariableDescriptorCountAllocateInfo-descriptorSetCount-03045",
                ],
                ..Default::default()
            }));
        }

        for (index, &set_layout) in set_layouts.iter().enumerate() {
            let layout = lookup(
                &objects.descriptor_set_layouts,
                set_layout,
                format!("set_layouts[{}]", index),
                &["VUID-VkDescriptorSetAllocateInfo-pSetLayouts-parameter"],
            )?;
            let def = layout.def();

            if def.is_push_descriptor() {
                return Err(Box::new(ValidationError {
                    context: format!("set_layouts[{}]", index).into(),
                    problem: "was created with `DescriptorSetLayoutCreateFlags::PUSH_DESCRIPTOR`"
                        .into(),
                    vuids: &["VUID-VkDescriptorSetAllocateInfo-pSetLayouts-00308"],
                    ..Default::default()
                }));
            }

            if def.is_update_after_bind_pool()
                && !pool
                    .flags()
                    .intersects(DescriptorPoolCreateFlags::UPDATE_AFTER_BIND)
            {
                return Err(Box::new(ValidationError {
                    problem: format!(
                        "`set_layouts[{}]` was created with \
                        `DescriptorSetLayoutCreateFlags::UPDATE_AFTER_BIND_POOL`, but \
                        `descriptor_pool` was not created with \
                        `DescriptorPoolCreateFlags::UPDATE_AFTER_BIND`",
                        index,
                    )
                    .into(),
                    vuids: &["VUID-VkDescriptorSetAllocateInfo-pSetLayouts-03044"],
                    ..Default::default()
                }));
            }

            if let (Some(count), Some(max)) = (
                self.variable_descriptor_count(index),
                def.variable_descriptor_count(),
            ) {
                if count > max {
                    return Err(Box::new(ValidationError {
                        problem: format!(
                            "`variable_descriptor_counts[{0}]` ({1}) is greater than the \
                            descriptor count of the variable-count binding of \
                            `set_layouts[{0}]` ({2})",
                            index, count, max,
                        )
                        .into(),
                        vuids: &[
                            "VUID-VkDescriptorSetVariableDescriptorCountAllocateInfo-pSetLayouts-03046",
                        ],
                        ..Default::default()
                    }));
                }
            }
        }

        Ok(())
    }

    /// Checks that the pool has room for the sets. A pool that runs out may still succeed on some
    /// implementations, so this is reported as a warning.
    pub(crate) fn validate_capacity(
        &self,
        objects: &ObjectTables,
    ) -> Result<(), Box<ValidationError>> {
        let Some(pool) = objects.descriptor_pools.get(&self.descriptor_pool) else {
            return Ok(());
        };

        if pool.available_sets() < self.set_layouts.len() as u32 {
            return Err(Box::new(ValidationError {
                problem: format!(
                    "{} sets are allocated, but `descriptor_pool` only has room for {} more sets",
                    self.set_layouts.len(),
                    pool.available_sets(),
                )
                .into(),
                vuids: &["VUID-VkDescriptorSetAllocateInfo-descriptorSetCount-00306"],
                ..Default::default()
            }));
        }

        let mut required: HashMap<DescriptorType, u32> = HashMap::default();

        for (index, set_layout) in self.set_layouts.iter().enumerate() {
            let Some(layout) = objects.descriptor_set_layouts.get(set_layout) else {
                continue;
            };

            let counts = descriptor_counts(layout.def(), self.variable_descriptor_count(index));

            for (descriptor_type, count) in counts {
                *required.entry(descriptor_type).or_insert(0) += count;
            }
        }

        for (descriptor_type, count) in required {
            let available = pool.available_descriptors(descriptor_type);

            if count > available {
                return Err(Box::new(ValidationError {
                    problem: format!(
                        "{} descriptors of type `DescriptorType::{:?}` are allocated, but \
                        `descriptor_pool` only has room for {} more",
                        count, descriptor_type, available,
                    )
                    .into(),
                    vuids: &["VUID-VkDescriptorSetAllocateInfo-descriptorPool-00307"],
                    ..Default::default()
                }));
            }
        }

        Ok(())
    }
}

/// Returns the number of descriptors of each type in a set with layout `def`.
fn descriptor_counts(
    def: &DescriptorSetLayoutDef,
    variable_count: Option<u32>,
) -> impl Iterator<Item = (DescriptorType, u32)> + '_ {
    let variable_binding = def.variable_descriptor_count().and(def.max_binding());

    def.bindings().iter().map(move |binding| {
        let count = if Some(binding.binding) == variable_binding {
            variable_count.unwrap_or(0).min(binding.descriptor_count)
        } else {
            binding.descriptor_count
        };

        (binding.descriptor_type, count)
    })
}

/// The state tracked for a descriptor set.
#[derive(Debug)]
pub struct DescriptorSetState {
    handle: ash::vk::DescriptorSet,
    pool: ash::vk::DescriptorPool,
    layout: ash::vk::DescriptorSetLayout,
    def: Arc<DescriptorSetLayoutDef>,
    variable_count: Option<u32>,
    descriptors: Vec<Descriptor>,
    change_count: u64,
    some_update: bool,

    /// Command buffers that have the set bound.
    pub(crate) command_buffers: HashSet<ash::vk::CommandBuffer>,

    /// What was validated at draw time, per command buffer that has the set bound.
    pub(crate) cached_validation: HashMap<ash::vk::CommandBuffer, CachedValidation>,
}

impl DescriptorSetState {
    /// Creates the state of a newly allocated set.
    ///
    /// If the layout has a variable-count binding, it gets `variable_count` descriptors, or none
    /// if `None`.
    pub fn new(
        handle: ash::vk::DescriptorSet,
        pool: ash::vk::DescriptorPool,
        layout: &DescriptorSetLayoutState,
        variable_count: Option<u32>,
    ) -> Self {
        let def = layout.def().clone();
        let variable_binding = def.variable_descriptor_count().and(def.max_binding());
        let variable_count = variable_binding.map(|_| variable_count.unwrap_or(0));

        let descriptors = def
            .bindings()
            .iter()
            .flat_map(|binding| {
                let count = match variable_count {
                    Some(count) if Some(binding.binding) == variable_binding => {
                        count.min(binding.descriptor_count)
                    }
                    _ => binding.descriptor_count,
                };

                Descriptor::for_binding(binding).take(count as usize)
            })
            .collect();

        DescriptorSetState {
            handle,
            pool,
            layout: layout.handle(),
            def,
            variable_count,
            descriptors,
            change_count: 0,
            some_update: false,
            command_buffers: HashSet::default(),
            cached_validation: HashMap::default(),
        }
    }

    /// Creates the transient set that descriptors pushed to a command buffer are written to.
    pub fn push(layout: &DescriptorSetLayoutState) -> Self {
        Self::new(
            ash::vk::DescriptorSet::null(),
            ash::vk::DescriptorPool::null(),
            layout,
            None,
        )
    }

    /// Returns the handle, or a null handle for a push descriptor set.
    #[inline]
    pub fn handle(&self) -> ash::vk::DescriptorSet {
        self.handle
    }

    /// Returns the pool the set was allocated from, or a null handle for a push descriptor set.
    #[inline]
    pub fn pool(&self) -> ash::vk::DescriptorPool {
        self.pool
    }

    #[inline]
    pub fn layout(&self) -> ash::vk::DescriptorSetLayout {
        self.layout
    }

    #[inline]
    pub fn def(&self) -> &Arc<DescriptorSetLayoutDef> {
        &self.def
    }

    #[inline]
    pub fn descriptors(&self) -> &[Descriptor] {
        &self.descriptors
    }

    /// Returns the number of descriptors of the variable-count binding, if the layout has one.
    #[inline]
    pub fn variable_descriptor_count(&self) -> Option<u32> {
        self.variable_count
    }

    /// Returns a number that increases with every update of the set.
    #[inline]
    pub fn change_count(&self) -> u64 {
        self.change_count
    }

    /// Returns whether the set was ever updated.
    #[inline]
    pub fn is_updated(&self) -> bool {
        self.some_update
    }

    /// Returns whether any command buffer has the set bound.
    #[inline]
    pub fn is_bound(&self) -> bool {
        !self.command_buffers.is_empty()
    }

    /// Returns whether descriptors of `binding` may be updated while the set is in use.
    pub fn is_update_while_pending_allowed(&self, binding: u32) -> bool {
        self.def.binding(binding).is_some_and(|binding| {
            binding.binding_flags.intersects(
                DescriptorBindingFlags::UPDATE_UNUSED_WHILE_PENDING
                    | DescriptorBindingFlags::UPDATE_AFTER_BIND,
            )
        })
    }

    /// Returns the global indices of an update of `count` descriptors starting at `array_element`
    /// of `binding`, if the set has that many descriptors from there on.
    pub fn update_range(
        &self,
        binding: u32,
        array_element: u32,
        count: u32,
    ) -> Option<Range<usize>> {
        let binding_range = self.def.global_index_range(binding)?;

        global_update_range(
            binding_range.start,
            array_element,
            count,
            self.descriptors.len(),
        )
    }

    /// Returns the descriptors of `binding`. The variable-count binding only has as many as were
    /// allocated.
    pub fn binding_descriptors(&self, binding: u32) -> &[Descriptor] {
        let Some(range) = self.def.global_index_range(binding) else {
            return &[];
        };
        let len = self.descriptors.len();

        &self.descriptors[(range.start as usize).min(len)..(range.end as usize).min(len)]
    }

    /// Applies a validated write. Returns whether command buffers that have the set bound must
    /// be invalidated.
    pub(crate) fn perform_write(&mut self, write: &WriteDescriptorSet) -> bool {
        let Some(range) =
            self.update_range(write.dst_binding, write.dst_array_element, write.descriptor_count)
        else {
            return false;
        };

        apply_write(&mut self.descriptors[range], write);
        self.some_update = true;
        self.change_count += 1;

        !self.is_update_while_pending_allowed(write.dst_binding)
    }

    /// Applies a validated copy of `src` to the descriptors starting at `dst_array_element` of
    /// `dst_binding`. Returns whether command buffers that have the set bound must be
    /// invalidated.
    pub(crate) fn perform_copy(
        &mut self,
        dst_binding: u32,
        dst_array_element: u32,
        src: &[Descriptor],
    ) -> bool {
        let Some(range) = self.update_range(dst_binding, dst_array_element, src.len() as u32)
        else {
            return false;
        };

        for (dst, src) in self.descriptors[range].iter_mut().zip(src) {
            dst.copy_from(src);
        }

        self.some_update = true;
        self.change_count += 1;

        !self.is_update_while_pending_allowed(dst_binding)
    }

    /// Returns the number of descriptors of each type that the set holds.
    fn descriptor_counts(&self) -> impl Iterator<Item = (DescriptorType, u32)> + '_ {
        descriptor_counts(&self.def, self.variable_count)
    }

    /// Forgets the dynamic buffers validated for `command_buffer`, when the set is bound again
    /// with new dynamic offsets.
    pub(crate) fn clear_dynamic_cache(&mut self, command_buffer: ash::vk::CommandBuffer) {
        if let Some(cached) = self.cached_validation.get_mut(&command_buffer) {
            cached.dynamic_buffers.clear();
        }
    }

    /// Forgets everything about `command_buffer`, when it is reset or freed.
    pub(crate) fn remove_command_buffer(&mut self, command_buffer: ash::vk::CommandBuffer) {
        self.command_buffers.remove(&command_buffer);
        self.cached_validation.remove(&command_buffer);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        buffer::BufferUsage,
        command_buffer::{bind_push::BindDescriptorSetsInfo, PipelineBindPoint},
        descriptor_set::{
            layout::{DescriptorSetLayoutBinding, DescriptorSetLayoutCreateInfo, ShaderStages},
            update::{CopyDescriptorSet, DescriptorBufferInfo, DescriptorImageInfo},
        },
        tests_util::{test_validator, ColorImage},
        image::ImageLayout,
        Severity, WHOLE_SIZE,
    };
    use ash::vk::Handle;

    fn layout_info(bindings: &[(u32, DescriptorType, u32)]) -> DescriptorSetLayoutCreateInfo {
        DescriptorSetLayoutCreateInfo {
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
        }
    }

    fn uniform_buffers(
        set: ash::vk::DescriptorSet,
        binding: u32,
        array_element: u32,
        buffer: ash::vk::Buffer,
        count: usize,
    ) -> WriteDescriptorSet {
        WriteDescriptorSet::buffers(
            set,
            binding,
            array_element,
            DescriptorType::UniformBuffer,
            (0..count).map(|index| DescriptorBufferInfo {
                buffer,
                offset: 0,
                range: 16 * (index as u64 + 1),
            }),
        )
    }

    #[test]
    fn write_rolls_over_into_next_binding() {
        let (mut validator, _sink) = test_validator();
        let buffer = validator.test_buffer(256, BufferUsage::UNIFORM_BUFFER);
        let (_, set) = validator.test_descriptor_set(layout_info(&[
            (0, DescriptorType::UniformBuffer, 4),
            (1, DescriptorType::UniformBuffer, 2),
        ]));

        let write = uniform_buffers(set, 0, 3, buffer, 2);
        assert!(!validator.validate_update_descriptor_sets(&[write.clone()], &[]));
        validator.record_update_descriptor_sets(&[write], &[]);

        let state = validator.descriptor_set(set).unwrap();
        let updated: Vec<_> = state.descriptors().iter().map(|d| d.updated).collect();
        assert_eq!(updated, [false, false, false, true, true, false]);
        assert!(state.binding_descriptors(0)[3].updated);
        assert!(state.binding_descriptors(1)[0].updated);
        assert!(state.is_updated());
    }

    #[test]
    fn write_rolls_over_into_inconsistent_binding() {
        let (mut validator, sink) = test_validator();
        let image = validator.test_image(ColorImage::sampled(8, 8));
        let view = validator.test_view(image);
        let (_, set) = validator.test_descriptor_set(layout_info(&[
            (0, DescriptorType::SampledImage, 2),
            (1, DescriptorType::Sampler, 2),
        ]));

        let write = WriteDescriptorSet::images(
            set,
            0,
            0,
            DescriptorType::SampledImage,
            [DescriptorImageInfo::image_view(view, ImageLayout::ShaderReadOnlyOptimal); 3],
        );
        assert!(validator.validate_update_descriptor_sets(&[write], &[]));
        assert!(sink.contains_vuid("VUID-VkWriteDescriptorSet-dstArrayElement-00321"));
    }

    #[test]
    fn change_count_increases() {
        let (mut validator, _sink) = test_validator();
        let buffer = validator.test_buffer(256, BufferUsage::UNIFORM_BUFFER);
        let (_, set) = validator
            .test_descriptor_set(layout_info(&[(0, DescriptorType::UniformBuffer, 2)]));
        let (_, other) = validator
            .test_descriptor_set(layout_info(&[(0, DescriptorType::UniformBuffer, 2)]));

        let mut last = validator.descriptor_set(set).unwrap().change_count();

        for array_element in 0..2 {
            let write = uniform_buffers(set, 0, array_element, buffer, 1);
            validator.record_update_descriptor_sets(&[write], &[]);

            let count = validator.descriptor_set(set).unwrap().change_count();
            assert!(count > last);
            last = count;
        }

        let copy = CopyDescriptorSet {
            src_set: set,
            src_binding: 0,
            src_array_element: 0,
            dst_set: other,
            dst_binding: 0,
            dst_array_element: 0,
            descriptor_count: 2,
        };
        let before = validator.descriptor_set(other).unwrap().change_count();
        assert!(!validator.validate_update_descriptor_sets(&[], &[copy]));
        validator.record_update_descriptor_sets(&[], &[copy]);
        assert!(validator.descriptor_set(other).unwrap().change_count() > before);
    }

    #[test]
    fn copy_of_unwritten_descriptors() {
        let (mut validator, _sink) = test_validator();
        let buffer = validator.test_buffer(256, BufferUsage::UNIFORM_BUFFER);
        let info = layout_info(&[(0, DescriptorType::UniformBuffer, 2)]);
        let (_, src) = validator.test_descriptor_set(info.clone());
        let (_, dst) = validator.test_descriptor_set(info);

        validator.record_update_descriptor_sets(&[uniform_buffers(src, 0, 0, buffer, 1)], &[]);
        validator.record_update_descriptor_sets(&[uniform_buffers(dst, 0, 0, buffer, 2)], &[]);

        let copy = CopyDescriptorSet {
            src_set: src,
            src_binding: 0,
            src_array_element: 0,
            dst_set: dst,
            dst_binding: 0,
            dst_array_element: 0,
            descriptor_count: 2,
        };
        validator.record_update_descriptor_sets(&[], &[copy]);

        let src_state = validator.descriptor_set(src).unwrap();
        let dst_state = validator.descriptor_set(dst).unwrap();
        assert_eq!(dst_state.descriptors()[0], src_state.descriptors()[0]);
        assert!(!dst_state.descriptors()[1].updated);
    }

    #[test]
    fn write_to_bound_set_invalidates_command_buffer() {
        let (mut validator, _sink) = test_validator();
        let buffer = validator.test_buffer(256, BufferUsage::UNIFORM_BUFFER);
        let (layout, set) = validator
            .test_descriptor_set(layout_info(&[(0, DescriptorType::UniformBuffer, 1)]));
        let cb = validator.test_command_buffer(0);

        validator.record_cmd_bind_descriptor_sets(
            cb,
            &BindDescriptorSetsInfo::sets(PipelineBindPoint::Compute, vec![layout], 0, [set]),
        );
        validator.record_update_descriptor_sets(&[uniform_buffers(set, 0, 0, buffer, 1)], &[]);

        let cb_state = validator.command_buffer(cb).unwrap();
        assert_eq!(
            cb_state.state(),
            crate::command_buffer::RecordingState::Invalid,
        );
        assert_eq!(
            cb_state.broken_bindings(),
            &[crate::ObjectHandle::new(set)],
        );
    }

    #[test]
    fn variable_descriptor_count() {
        let (mut validator, sink) = test_validator();
        let mut info = layout_info(&[
            (0, DescriptorType::UniformBuffer, 1),
            (1, DescriptorType::SampledImage, 8),
        ]);
        info.bindings[1].binding_flags = DescriptorBindingFlags::VARIABLE_DESCRIPTOR_COUNT;
        let layout = validator.test_descriptor_set_layout(info);
        let pool = validator.test_descriptor_pool(DescriptorPoolCreateFlags::empty());

        let mut allocate_info = DescriptorSetAllocateInfo::new(pool, [layout]);
        allocate_info.variable_descriptor_counts = smallvec::smallvec![3];
        assert!(!validator.validate_allocate_descriptor_sets(&allocate_info));

        let set = ash::vk::DescriptorSet::from_raw(0xd5);
        validator.record_allocate_descriptor_sets(&allocate_info, &[set]);
        let state = validator.descriptor_set(set).unwrap();
        assert_eq!(state.descriptors().len(), 4);
        assert_eq!(state.binding_descriptors(1).len(), 3);
        assert!(state.update_range(1, 2, 2).is_none());

        allocate_info.variable_descriptor_counts = smallvec::smallvec![9];
        assert!(validator.validate_allocate_descriptor_sets(&allocate_info));
        assert!(sink.contains_vuid(
            "VUID-VkDescriptorSetVariableDescriptorCountAllocateInfo-pSetLayouts-03046",
        ));
    }

    #[test]
    fn allocate_push_descriptor_layout() {
        let (mut validator, sink) = test_validator_with_push();
        let mut info = layout_info(&[(0, DescriptorType::UniformBuffer, 1)]);
        info.flags = layout::DescriptorSetLayoutCreateFlags::PUSH_DESCRIPTOR;
        let layout = validator.test_descriptor_set_layout(info);
        let pool = validator.test_descriptor_pool(DescriptorPoolCreateFlags::empty());

        let allocate_info = DescriptorSetAllocateInfo::new(pool, [layout]);
        assert!(validator.validate_allocate_descriptor_sets(&allocate_info));
        assert!(sink.contains_vuid("VUID-VkDescriptorSetAllocateInfo-pSetLayouts-00308"));
    }

    fn test_validator_with_push() -> (
        crate::validator::DeviceValidator,
        Arc<crate::CollectingSink>,
    ) {
        let mut config = ValidationConfig::default();
        config.extensions.khr_push_descriptor = true;
        crate::tests_util::test_validator_with(config)
    }

    #[test]
    fn pool_capacity_is_a_warning() {
        let (mut validator, sink) = test_validator();
        let layout = validator
            .test_descriptor_set_layout(layout_info(&[(0, DescriptorType::StorageImage, 1)]));
        let pool = validator.test_descriptor_pool(DescriptorPoolCreateFlags::empty());

        // The test pool has no storage images.
        let allocate_info = DescriptorSetAllocateInfo::new(pool, [layout]);
        assert!(!validator.validate_allocate_descriptor_sets(&allocate_info));

        let messages = sink.messages();
        let message = messages
            .iter()
            .find(|message| message.vuid == "VUID-VkDescriptorSetAllocateInfo-descriptorPool-00307")
            .unwrap();
        assert_eq!(message.severity, Severity::Warning);
    }

    #[test]
    fn free_requires_flag_and_idle_set() {
        let (mut validator, sink) = test_validator();
        let (layout, set) = validator
            .test_descriptor_set(layout_info(&[(0, DescriptorType::UniformBuffer, 1)]));
        let pool = validator.descriptor_set(set).unwrap().pool();

        // Test pools are created with `FREE_DESCRIPTOR_SET`.
        assert!(!validator.validate_free_descriptor_sets(pool, &[set]));

        let cb = validator.test_command_buffer(0);
        validator.record_cmd_bind_descriptor_sets(
            cb,
            &BindDescriptorSetsInfo::sets(PipelineBindPoint::Graphics, vec![layout], 0, [set]),
        );
        validator.record_end_command_buffer(cb);
        validator.record_queue_submit(&[cb]);

        assert!(validator.validate_free_descriptor_sets(pool, &[set]));
        assert!(sink.contains_vuid("VUID-vkFreeDescriptorSets-pDescriptorSets-00309"));

        validator.record_command_buffers_completed(&[cb]);
        validator.record_free_descriptor_sets(pool, &[set]);
        assert!(validator.descriptor_set(set).is_none());
        assert!(validator
            .command_buffer(cb)
            .unwrap()
            .broken_bindings()
            .contains(&crate::ObjectHandle::new(set)));

        let no_free_pool = validator.test_descriptor_pool(DescriptorPoolCreateFlags::empty());
        let set = ash::vk::DescriptorSet::from_raw(0xd6);
        let allocate_info = DescriptorSetAllocateInfo::new(no_free_pool, [layout]);
        validator.record_allocate_descriptor_sets(&allocate_info, &[set]);
        assert!(validator.validate_free_descriptor_sets(no_free_pool, &[set]));
        assert!(sink.contains_vuid("VUID-vkFreeDescriptorSets-descriptorPool-00312"));
    }

    #[test]
    fn whole_size_buffer_write() {
        let (mut validator, sink) = test_validator();
        let buffer = validator.test_buffer(64, BufferUsage::UNIFORM_BUFFER);
        let (_, set) = validator
            .test_descriptor_set(layout_info(&[(0, DescriptorType::UniformBuffer, 1)]));

        let write = WriteDescriptorSet::buffers(
            set,
            0,
            0,
            DescriptorType::UniformBuffer,
            [DescriptorBufferInfo {
                buffer,
                offset: 64,
                range: WHOLE_SIZE,
            }],
        );
        assert!(validator.validate_update_descriptor_sets(&[write], &[]));
        assert!(sink.contains_vuid("VUID-VkDescriptorBufferInfo-offset-00340"));
    }
}
