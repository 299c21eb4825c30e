// Copyright (c) 2016 The vulkano developers
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or https://opensource.org/licenses/MIT>,
// at your option. All files in the project carrying such
// notice may not be copied, modified, or distributed except
// according to those terms.

//! Binding descriptor sets, and pushing descriptors.

use super::{BoundDescriptorSet, CommandBufferState, PipelineBindPoint};
use crate::{
    config::ValidationConfig,
    descriptor_set::{
        layout::{DescriptorSetLayoutDef, DescriptorType},
        template::{DescriptorUpdateTemplateState, DescriptorUpdateTemplateType},
        update::WriteDescriptorSet,
        DescriptorSetState,
    },
    validator::{lookup, ObjectTables},
    ObjectHandle, Report, Requires, RequiresAllOf, RequiresOneOf, ValidationError,
};
use smallvec::SmallVec;
use std::sync::Arc;

/// Parameters of a `vkCmdBindDescriptorSets` command.
#[derive(Clone, Debug)]
pub struct BindDescriptorSetsInfo {
    pub bind_point: PipelineBindPoint,

    /// The set layouts of the pipeline layout, by set index.
    pub set_layouts: Vec<ash::vk::DescriptorSetLayout>,

    /// The set index of the first element of `descriptor_sets`.
    pub first_set: u32,

    pub descriptor_sets: SmallVec<[ash::vk::DescriptorSet; 4]>,

    /// One offset for every dynamic buffer descriptor in `descriptor_sets`, in set order and
    /// then binding order.
    ///
    /// The default value is empty.
    pub dynamic_offsets: SmallVec<[u32; 4]>,

    pub _ne: crate::NonExhaustive,
}

impl BindDescriptorSetsInfo {
    #[inline]
    pub fn sets(
        bind_point: PipelineBindPoint,
        set_layouts: Vec<ash::vk::DescriptorSetLayout>,
        first_set: u32,
        descriptor_sets: impl IntoIterator<Item = ash::vk::DescriptorSet>,
    ) -> Self {
        Self {
            bind_point,
            set_layouts,
            first_set,
            descriptor_sets: descriptor_sets.into_iter().collect(),
            dynamic_offsets: SmallVec::new(),
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
        let cb_object = ObjectHandle::new(command_buffer.handle());
        let &Self {
            bind_point: _,
            ref set_layouts,
            first_set,
            ref descriptor_sets,
            ref dynamic_offsets,
            _ne: _,
        } = self;

        if descriptor_sets.is_empty() {
            report.error(
                cb_object,
                Err(Box::new(ValidationError {
                    context: "descriptor_sets".into(),
                    problem: "is empty".into(),
                    vuids: &["VUID-vkCmdBindDescriptorSets-descriptorSetCount-arraylength"],
                    ..Default::default()
                })),
            );
            return;
        }

        if first_set as usize + descriptor_sets.len() > set_layouts.len() {
            report.error(
                cb_object,
                Err(Box::new(ValidationError {
                    problem: format!(
                        "`first_set` + the length of `descriptor_sets` ({}) is greater than the \
                        number of set layouts in the pipeline layout ({})",
                        first_set as usize + descriptor_sets.len(),
                        set_layouts.len(),
                    )
                    .into(),
                    vuids: &["VUID-vkCmdBindDescriptorSets-firstSet-00360"],
                    ..Default::default()
                })),
            );
            return;
        }

        let mut dynamic_descriptor_types: SmallVec<[DescriptorType; 4]> = SmallVec::new();

        for (index, &handle) in descriptor_sets.iter().enumerate() {
            let set_index = first_set + index as u32;
            let object = ObjectHandle::new(handle);

            let set = match lookup(
                &objects.descriptor_sets,
                handle,
                format!("descriptor_sets[{}]", index),
                &["VUID-vkCmdBindDescriptorSets-pDescriptorSets-parameter"],
            ) {
                Ok(set) => set,
                Err(err) => {
                    report.error(object, Err(err));
                    continue;
                }
            };

            for binding in set.def().bindings() {
                if binding.descriptor_type.is_dynamic() {
                    dynamic_descriptor_types.extend(
                        std::iter::repeat(binding.descriptor_type)
                            .take(binding.descriptor_count as usize),
                    );
                }
            }

            let result = lookup(
                &objects.descriptor_set_layouts,
                set_layouts[set_index as usize],
                format!("set_layouts[{}]", set_index),
                &["VUID-vkCmdBindDescriptorSets-layout-parameter"],
            )
            .and_then(|layout| {
                set.def().is_compatible(layout.def()).map_err(|reason| {
                    Box::new(ValidationError {
                        problem: format!(
                            "`descriptor_sets[{}]` is not compatible with the set layout at \
                            index {} of the pipeline layout: {}",
                            index, set_index, reason,
                        )
                        .into(),
                        vuids: &["VUID-vkCmdBindDescriptorSets-pDescriptorSets-00358"],
                        ..Default::default()
                    })
                })
            });

            if report.error(object, result) {
                continue;
            }

            if !set.is_updated() && set.def().total_descriptor_count() != 0 {
                report.warning(
                    object,
                    Err(Box::new(ValidationError {
                        context: format!("descriptor_sets[{}]", index).into(),
                        problem: "was never updated".into(),
                        vuids: &["UNASSIGNED-CoreValidation-DrawState-DescriptorSetNotUpdated"],
                        ..Default::default()
                    })),
                );
            }
        }

        if report.has_errors() {
            return;
        }

        if dynamic_offsets.len() != dynamic_descriptor_types.len() {
            report.error(
                cb_object,
                Err(Box::new(ValidationError {
                    problem: format!(
                        "the length of `dynamic_offsets` ({}) does not equal the number of \
                        dynamic buffer descriptors in `descriptor_sets` ({})",
                        dynamic_offsets.len(),
                        dynamic_descriptor_types.len(),
                    )
                    .into(),
                    vuids: &["VUID-vkCmdBindDescriptorSets-dynamicOffsetCount-00359"],
                    ..Default::default()
                })),
            );
            return;
        }

        for (index, (&offset, &descriptor_type)) in dynamic_offsets
            .iter()
            .zip(&dynamic_descriptor_types)
            .enumerate()
        {
            let (alignment, vuids): (_, &'static [&'static str]) = match descriptor_type {
                DescriptorType::UniformBufferDynamic => (
                    config.limits.min_uniform_buffer_offset_alignment,
                    &["VUID-vkCmdBindDescriptorSets-pDynamicOffsets-01971"],
                ),
                _ => (
                    config.limits.min_storage_buffer_offset_alignment,
                    &["VUID-vkCmdBindDescriptorSets-pDynamicOffsets-01972"],
                ),
            };

            if alignment != 0 && u64::from(offset) % alignment != 0 {
                report.error(
                    cb_object,
                    Err(Box::new(ValidationError {
                        context: format!("dynamic_offsets[{}]", index).into(),
                        problem: format!(
                            "is not a multiple of the offset alignment limit for \
                            `DescriptorType::{:?}` ({})",
                            descriptor_type, alignment,
                        )
                        .into(),
                        vuids,
                        ..Default::default()
                    })),
                );
            }
        }
    }

    pub(crate) fn record(
        &self,
        command_buffer: &mut CommandBufferState,
        objects: &mut ObjectTables,
    ) {
        let layout_defs: SmallVec<[Option<Arc<DescriptorSetLayoutDef>>; 4]> = self
            .set_layouts
            .iter()
            .map(|layout| {
                objects
                    .descriptor_set_layouts
                    .get(layout)
                    .map(|state| state.def().clone())
            })
            .collect();

        let mut dynamic_offsets = self.dynamic_offsets.iter().copied();
        let mut new_sets: SmallVec<[(u32, BoundDescriptorSet); 4]> = SmallVec::new();

        for (index, &handle) in self.descriptor_sets.iter().enumerate() {
            let set_index = self.first_set + index as u32;

            let Some(set) = objects.descriptor_sets.get_mut(&handle) else {
                continue;
            };

            set.command_buffers.insert(command_buffer.handle());
            set.clear_dynamic_cache(command_buffer.handle());
            command_buffer.add_object(ObjectHandle::new(handle));

            let def = set.def().clone();
            let offsets = dynamic_offsets
                .by_ref()
                .take(def.dynamic_descriptor_count() as usize)
                .collect();
            let layout = layout_defs
                .get(set_index as usize)
                .cloned()
                .flatten()
                .unwrap_or(def);

            new_sets.push((
                set_index,
                BoundDescriptorSet {
                    set: Some(handle),
                    layout,
                    dynamic_offsets: offsets,
                },
            ));
        }

        let bound = command_buffer
            .bound_descriptor_sets
            .entry(self.bind_point)
            .or_default();
        disturb_bound_sets(bound, &layout_defs);

        for (set_index, new) in new_sets {
            let set_index = set_index as usize;

            if bound.len() <= set_index {
                bound.resize(set_index + 1, None);
            }

            bound[set_index] = Some(new);
        }
    }
}

/// Unbinds the sets that are not compatible with the set layouts of the pipeline layout that new
/// sets are bound with.
fn disturb_bound_sets(
    bound: &mut SmallVec<[Option<BoundDescriptorSet>; 4]>,
    layout_defs: &[Option<Arc<DescriptorSetLayoutDef>>],
) {
    for (set_index, slot) in bound.iter_mut().enumerate() {
        let compatible = slot.as_ref().is_some_and(|current| {
            layout_defs
                .get(set_index)
                .and_then(Option::as_ref)
                .is_some_and(|def| current.layout.is_compatible(def).is_ok())
        });

        if !compatible {
            *slot = None;
        }
    }
}

/// Parameters of a `vkCmdPushDescriptorSetKHR` command.
#[derive(Clone, Debug)]
pub struct PushDescriptorSetInfo {
    pub bind_point: PipelineBindPoint,

    /// The set layout of the pipeline layout at index `set`. It must have been created with
    /// `DescriptorSetLayoutCreateFlags::PUSH_DESCRIPTOR`.
    pub set_layout: ash::vk::DescriptorSetLayout,

    pub set: u32,

    /// The writes to apply. Their `dst_set` is ignored.
    pub descriptor_writes: SmallVec<[WriteDescriptorSet; 2]>,

    pub _ne: crate::NonExhaustive,
}

impl PushDescriptorSetInfo {
    #[inline]
    pub fn new(
        bind_point: PipelineBindPoint,
        set_layout: ash::vk::DescriptorSetLayout,
        set: u32,
        descriptor_writes: impl IntoIterator<Item = WriteDescriptorSet>,
    ) -> Self {
        Self {
            bind_point,
            set_layout,
            set,
            descriptor_writes: descriptor_writes.into_iter().collect(),
            _ne: crate::NonExhaustive(()),
        }
    }

    /// Decodes the data of a `vkCmdPushDescriptorSetWithTemplateKHR` command into the writes it
    /// performs.
    pub fn from_template(
        template: &DescriptorUpdateTemplateState,
        data: &[u8],
    ) -> Result<Self, Box<ValidationError>> {
        if template.template_type() != DescriptorUpdateTemplateType::PushDescriptors {
            return Err(Box::new(ValidationError {
                context: "descriptor_update_template".into(),
                problem: "was not created with `DescriptorUpdateTemplateType::PushDescriptors`"
                    .into(),
                vuids: &[
                    "VUID-vkCmdPushDescriptorSetWithTemplateKHR-descriptorUpdateTemplate-07994",
                ],
                ..Default::default()
            }));
        }

        let create_info = template.create_info();
        let writes = template
            .decode(ash::vk::DescriptorSet::null(), data)
            .map_err(|err| err.add_context("data"))?;

        Ok(Self::new(
            create_info.pipeline_bind_point,
            create_info.descriptor_set_layout,
            create_info.set,
            writes,
        ))
    }

    pub(crate) fn validate(
        &self,
        command_buffer: &CommandBufferState,
        objects: &ObjectTables,
        config: &ValidationConfig,
        report: &mut Report,
    ) {
        let cb_object = ObjectHandle::new(command_buffer.handle());

        if !config.extensions.khr_push_descriptor {
            report.error(
                cb_object,
                Err(Box::new(ValidationError {
                    requires_one_of: RequiresOneOf(&[RequiresAllOf(&[
                        Requires::DeviceExtension("khr_push_descriptor"),
                    ])]),
                    ..Default::default()
                })),
            );
            return;
        }

        let layout = match lookup(
            &objects.descriptor_set_layouts,
            self.set_layout,
            "set_layout",
            &["VUID-vkCmdPushDescriptorSetKHR-layout-parameter"],
        ) {
            Ok(layout) => layout,
            Err(err) => {
                report.error(cb_object, Err(err));
                return;
            }
        };

        if !layout.def().is_push_descriptor() {
            report.error(
                cb_object,
                Err(Box::new(ValidationError {
                    context: "set_layout".into(),
                    problem: "was not created with \
                        `DescriptorSetLayoutCreateFlags::PUSH_DESCRIPTOR`"
                        .into(),
                    vuids: &["VUID-vkCmdPushDescriptorSetKHR-set-00366"],
                    ..Default::default()
                })),
            );
            return;
        }

        let current = command_buffer
            .push_descriptor_sets
            .get(&(self.bind_point, self.set))
            .filter(|state| Arc::ptr_eq(state.def(), layout.def()));
        let transient;
        let state = match current {
            Some(state) => state,
            None => {
                transient = DescriptorSetState::push(layout);
                &transient
            }
        };

        for (index, write) in self.descriptor_writes.iter().enumerate() {
            report.error(
                cb_object,
                write
                    .validate(state, false, objects, config)
                    .map_err(|err| err.add_context(format!("descriptor_writes[{}]", index))),
            );
        }
    }

    pub(crate) fn record(&self, command_buffer: &mut CommandBufferState, objects: &ObjectTables) {
        let Some(layout) = objects.descriptor_set_layouts.get(&self.set_layout) else {
            return;
        };
        let def = layout.def().clone();

        let state = command_buffer
            .push_descriptor_sets
            .entry((self.bind_point, self.set))
            .or_insert_with(|| DescriptorSetState::push(layout));

        if !Arc::ptr_eq(state.def(), &def) {
            *state = DescriptorSetState::push(layout);
        }

        for write in &self.descriptor_writes {
            state.perform_write(write);
        }

        // Pushed descriptors are validated again at the next draw.
        state.cached_validation.clear();

        let bound = command_buffer
            .bound_descriptor_sets
            .entry(self.bind_point)
            .or_default();
        let set_index = self.set as usize;

        if bound.len() <= set_index {
            bound.resize(set_index + 1, None);
        }

        bound[set_index] = Some(BoundDescriptorSet {
            set: None,
            layout: def,
            dynamic_offsets: SmallVec::new(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        buffer::BufferUsage,
        descriptor_set::{
            layout::{
                DescriptorSetLayoutBinding, DescriptorSetLayoutCreateFlags,
                DescriptorSetLayoutCreateInfo, ShaderStages,
            },
            update::DescriptorBufferInfo,
        },
        tests_util::{test_validator, test_validator_with},
    };
    use ash::vk::Handle;
    use smallvec::smallvec;

    fn single_binding(descriptor_type: DescriptorType) -> DescriptorSetLayoutCreateInfo {
        DescriptorSetLayoutCreateInfo {
            bindings: vec![DescriptorSetLayoutBinding {
                stages: ShaderStages::COMPUTE,
                ..DescriptorSetLayoutBinding::descriptor_type(descriptor_type)
            }],
            ..Default::default()
        }
    }

    #[test]
    fn incompatible_set_layout() {
        let (mut validator, sink) = test_validator();
        let (_, set) = validator.test_descriptor_set(single_binding(DescriptorType::UniformBuffer));
        let other_layout =
            validator.test_descriptor_set_layout(single_binding(DescriptorType::StorageBuffer));
        let cb = validator.test_command_buffer(0);

        let info =
            BindDescriptorSetsInfo::sets(PipelineBindPoint::Compute, vec![other_layout], 0, [set]);
        assert!(validator.validate_cmd_bind_descriptor_sets(cb, &info));
        assert!(sink.contains_vuid("VUID-vkCmdBindDescriptorSets-pDescriptorSets-00358"));
    }

    #[test]
    fn dynamic_offset_count_and_alignment() {
        let (mut validator, sink) = test_validator();
        let buffer = validator.test_buffer(1024, BufferUsage::UNIFORM_BUFFER);
        let (layout, set) =
            validator.test_descriptor_set(single_binding(DescriptorType::UniformBufferDynamic));
        validator.record_update_descriptor_sets(
            &[WriteDescriptorSet::buffers(
                set,
                0,
                0,
                DescriptorType::UniformBufferDynamic,
                [DescriptorBufferInfo {
                    buffer,
                    offset: 0,
                    range: 64,
                }],
            )],
            &[],
        );
        let cb = validator.test_command_buffer(0);

        let info = BindDescriptorSetsInfo::sets(PipelineBindPoint::Compute, vec![layout], 0, [set]);
        assert!(validator.validate_cmd_bind_descriptor_sets(cb, &info));
        assert!(sink.contains_vuid("VUID-vkCmdBindDescriptorSets-dynamicOffsetCount-00359"));

        let info = BindDescriptorSetsInfo {
            dynamic_offsets: smallvec![100],
            ..info
        };
        assert!(validator.validate_cmd_bind_descriptor_sets(cb, &info));
        assert!(sink.contains_vuid("VUID-vkCmdBindDescriptorSets-pDynamicOffsets-01971"));

        let info = BindDescriptorSetsInfo {
            dynamic_offsets: smallvec![256],
            ..info
        };
        assert!(!validator.validate_cmd_bind_descriptor_sets(cb, &info));
        validator.record_cmd_bind_descriptor_sets(cb, &info);

        let bound = validator
            .command_buffer(cb)
            .unwrap()
            .bound_descriptor_set(PipelineBindPoint::Compute, 0)
            .unwrap();
        assert_eq!(bound.set, Some(set));
        assert_eq!(bound.dynamic_offsets.as_slice(), &[256]);
    }

    #[test]
    fn binding_disturbs_incompatible_sets() {
        let (mut validator, _sink) = test_validator();
        let (uniform_layout, uniform_set) =
            validator.test_descriptor_set(single_binding(DescriptorType::UniformBuffer));
        let (storage_layout, storage_set) =
            validator.test_descriptor_set(single_binding(DescriptorType::StorageBuffer));
        let cb = validator.test_command_buffer(0);

        validator.record_cmd_bind_descriptor_sets(
            cb,
            &BindDescriptorSetsInfo::sets(
                PipelineBindPoint::Compute,
                vec![uniform_layout, uniform_layout],
                0,
                [uniform_set, uniform_set],
            ),
        );
        validator.record_cmd_bind_descriptor_sets(
            cb,
            &BindDescriptorSetsInfo::sets(
                PipelineBindPoint::Compute,
                vec![storage_layout, storage_layout],
                0,
                [storage_set],
            ),
        );

        let state = validator.command_buffer(cb).unwrap();
        assert_eq!(
            state
                .bound_descriptor_set(PipelineBindPoint::Compute, 0)
                .unwrap()
                .set,
            Some(storage_set),
        );
        assert!(state
            .bound_descriptor_set(PipelineBindPoint::Compute, 1)
            .is_none());
    }

    #[test]
    fn push_descriptor_set() {
        let mut config = ValidationConfig::default();
        config.extensions.khr_push_descriptor = true;
        let (mut validator, sink) = test_validator_with(config);
        let buffer = validator.test_buffer(256, BufferUsage::UNIFORM_BUFFER);

        let plain_layout =
            validator.test_descriptor_set_layout(single_binding(DescriptorType::UniformBuffer));
        let push_layout = validator.test_descriptor_set_layout(DescriptorSetLayoutCreateInfo {
            flags: DescriptorSetLayoutCreateFlags::PUSH_DESCRIPTOR,
            ..single_binding(DescriptorType::UniformBuffer)
        });
        let cb = validator.test_command_buffer(0);

        let write = WriteDescriptorSet::buffers(
            ash::vk::DescriptorSet::null(),
            0,
            0,
            DescriptorType::UniformBuffer,
            [DescriptorBufferInfo {
                buffer,
                offset: 0,
                range: 64,
            }],
        );

        let info = PushDescriptorSetInfo::new(
            PipelineBindPoint::Compute,
            plain_layout,
            0,
            [write.clone()],
        );
        assert!(validator.validate_cmd_push_descriptor_set(cb, &info));
        assert!(sink.contains_vuid("VUID-vkCmdPushDescriptorSetKHR-set-00366"));

        let info = PushDescriptorSetInfo::new(PipelineBindPoint::Compute, push_layout, 0, [write]);
        assert!(!validator.validate_cmd_push_descriptor_set(cb, &info));
        validator.record_cmd_push_descriptor_set(cb, &info);

        let state = validator.command_buffer(cb).unwrap();
        let bound = state
            .bound_descriptor_set(PipelineBindPoint::Compute, 0)
            .unwrap();
        assert_eq!(bound.set, None);
        let pushed = &state.push_descriptor_sets[&(PipelineBindPoint::Compute, 0)];
        assert!(pushed.descriptors()[0].updated);
    }

    #[test]
    fn push_requires_extension() {
        let (mut validator, sink) = test_validator();
        let layout = validator.test_descriptor_set_layout(single_binding(DescriptorType::Sampler));
        let cb = validator.test_command_buffer(0);

        let info = PushDescriptorSetInfo::new(PipelineBindPoint::Graphics, layout, 0, []);
        assert!(validator.validate_cmd_push_descriptor_set(cb, &info));
        assert_eq!(sink.messages().len(), 1);
    }
}
