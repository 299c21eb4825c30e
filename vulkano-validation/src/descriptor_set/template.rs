// Copyright (c) 2016 The vulkano developers
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or https://opensource.org/licenses/MIT>,
// at your option. All files in the project carrying such
// notice may not be copied, modified, or distributed except
// according to those terms.

//! Descriptor update templates.
//!
//! A template describes where, in a block of raw application memory, the resources of a series
//! of descriptor writes are found. Applying a template decodes that memory into ordinary
//! [`WriteDescriptorSet`]s, one per descriptor, which are then validated and applied exactly
//! like direct writes.

use super::{
    layout::{DescriptorClass, DescriptorSetLayoutDef, DescriptorType},
    update::{
        global_update_range, DescriptorBufferInfo, DescriptorImageInfo, WriteDescriptorSet,
    },
};
use crate::{
    command_buffer::PipelineBindPoint,
    image::ImageLayout,
    macros::vulkan_enum,
    validator::{lookup, ObjectTables},
    ValidationError,
};
use ash::vk::Handle;
use bytemuck::{Pod, Zeroable};
use std::{mem::size_of, sync::Arc};

vulkan_enum! {
    /// What a descriptor update template is used to update.
    DescriptorUpdateTemplateType = DescriptorUpdateTemplateType(i32);

    /// The template updates descriptor sets allocated from a pool.
    DescriptorSet = DESCRIPTOR_SET,

    /// The template pushes descriptors to a command buffer.
    PushDescriptors = PUSH_DESCRIPTORS_KHR,
}

/// Where the resources of a range of descriptors are found in the template data.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DescriptorUpdateTemplateEntry {
    pub dst_binding: u32,

    /// The first array element, or for an inline uniform block, the byte offset.
    pub dst_array_element: u32,

    /// The number of descriptors, or for an inline uniform block, the number of bytes.
    pub descriptor_count: u32,

    pub descriptor_type: DescriptorType,

    /// The byte offset of the first descriptor's resources in the data.
    pub offset: usize,

    /// The distance in bytes between the resources of consecutive descriptors. Ignored for
    /// inline uniform blocks.
    pub stride: usize,
}

/// Parameters to create a new `DescriptorUpdateTemplate`.
#[derive(Clone, Debug)]
pub struct DescriptorUpdateTemplateCreateInfo {
    pub template_type: DescriptorUpdateTemplateType,

    /// The default value is empty, which must be overridden.
    pub entries: Vec<DescriptorUpdateTemplateEntry>,

    /// The layout of the sets the template updates. For a push descriptor template, this is the
    /// layout that the pipeline layout uses at set index `set`.
    pub descriptor_set_layout: ash::vk::DescriptorSetLayout,

    /// Only used for push descriptor templates.
    ///
    /// The default value is [`PipelineBindPoint::Graphics`].
    pub pipeline_bind_point: PipelineBindPoint,

    /// Only used for push descriptor templates.
    ///
    /// The default value is `0`.
    pub set: u32,

    pub _ne: crate::NonExhaustive,
}

impl DescriptorUpdateTemplateCreateInfo {
    #[inline]
    pub fn descriptor_set(descriptor_set_layout: ash::vk::DescriptorSetLayout) -> Self {
        Self {
            template_type: DescriptorUpdateTemplateType::DescriptorSet,
            entries: Vec::new(),
            descriptor_set_layout,
            pipeline_bind_point: PipelineBindPoint::Graphics,
            set: 0,
            _ne: crate::NonExhaustive(()),
        }
    }

    pub(crate) fn validate(&self, objects: &ObjectTables) -> Result<(), Box<ValidationError>> {
        let &Self {
            template_type,
            ref entries,
            descriptor_set_layout,
            pipeline_bind_point: _,
            set: _,
            _ne: _,
        } = self;

        if entries.is_empty() {
            return Err(Box::new(ValidationError {
                context: "entries".into(),
                problem: "is empty".into(),
                vuids: &[
                    "VUID-VkDescriptorUpdateTemplateCreateInfo-descriptorUpdateEntryCount-arraylength",
                ],
                ..Default::default()
            }));
        }

        let layout = lookup(
            &objects.descriptor_set_layouts,
            descriptor_set_layout,
            "descriptor_set_layout",
            &["VUID-VkDescriptorUpdateTemplateCreateInfo-templateType-00350"],
        )?;
        let def = layout.def();

        if template_type == DescriptorUpdateTemplateType::PushDescriptors
            && !def.is_push_descriptor()
        {
            return Err(Box::new(ValidationError {
                problem: "`template_type` is `DescriptorUpdateTemplateType::PushDescriptors`, \
                    but `descriptor_set_layout` was not created with \
                    `DescriptorSetLayoutCreateFlags::PUSH_DESCRIPTOR`"
                    .into(),
                vuids: &["VUID-VkDescriptorUpdateTemplateCreateInfo-templateType-00353"],
                ..Default::default()
            }));
        }

        for (index, entry) in entries.iter().enumerate() {
            validate_entry(entry, def)
                .map_err(|err| err.add_context(format!("entries[{}]", index)))?;
        }

        Ok(())
    }
}

fn validate_entry(
    entry: &DescriptorUpdateTemplateEntry,
    def: &DescriptorSetLayoutDef,
) -> Result<(), Box<ValidationError>> {
    let &DescriptorUpdateTemplateEntry {
        dst_binding,
        dst_array_element,
        descriptor_count,
        descriptor_type,
        offset: _,
        stride: _,
    } = entry;

    let Some(binding_range) = def.global_index_range(dst_binding) else {
        return Err(Box::new(ValidationError {
            context: "dst_binding".into(),
            problem: format!(
                "binding {} does not exist in `descriptor_set_layout`",
                dst_binding,
            )
            .into(),
            vuids: &["VUID-VkDescriptorUpdateTemplateEntry-dstBinding-00354"],
            ..Default::default()
        }));
    };

    if global_update_range(
        binding_range.start,
        dst_array_element,
        descriptor_count,
        def.total_descriptor_count() as usize,
    )
    .is_none()
    {
        return Err(Box::new(ValidationError {
            problem: format!(
                "`dst_array_element` + `descriptor_count` ({} + {}) is greater than the number \
                of descriptors from binding {} to the end of the set",
                dst_array_element, descriptor_count, dst_binding,
            )
            .into(),
            vuids: &["VUID-VkDescriptorUpdateTemplateEntry-dstArrayElement-00355"],
            ..Default::default()
        }));
    }

    if descriptor_type == DescriptorType::InlineUniformBlock {
        if dst_array_element % 4 != 0 {
            return Err(Box::new(ValidationError {
                context: "dst_array_element".into(),
                problem: "is not a multiple of 4, but `descriptor_type` is \
                    `DescriptorType::InlineUniformBlock`"
                    .into(),
                vuids: &["VUID-VkDescriptorUpdateTemplateEntry-descriptor-02226"],
                ..Default::default()
            }));
        }

        if descriptor_count % 4 != 0 {
            return Err(Box::new(ValidationError {
                context: "descriptor_count".into(),
                problem: "is not a multiple of 4, but `descriptor_type` is \
                    `DescriptorType::InlineUniformBlock`"
                    .into(),
                vuids: &["VUID-VkDescriptorUpdateTemplateEntry-descriptor-02227"],
                ..Default::default()
            }));
        }
    }

    Ok(())
}

/// The memory layout of `VkDescriptorImageInfo`.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, Zeroable, Pod)]
struct RawDescriptorImageInfo {
    sampler: u64,
    image_view: u64,
    image_layout: i32,
    _pad: u32,
}

/// The memory layout of `VkDescriptorBufferInfo`.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, Zeroable, Pod)]
struct RawDescriptorBufferInfo {
    buffer: u64,
    offset: u64,
    range: u64,
}

/// A descriptor update template.
#[derive(Debug)]
pub struct DescriptorUpdateTemplateState {
    handle: ash::vk::DescriptorUpdateTemplate,
    create_info: DescriptorUpdateTemplateCreateInfo,
    def: Arc<DescriptorSetLayoutDef>,
}

impl DescriptorUpdateTemplateState {
    /// `def` is the definition of `create_info.descriptor_set_layout`.
    pub fn new(
        handle: ash::vk::DescriptorUpdateTemplate,
        create_info: DescriptorUpdateTemplateCreateInfo,
        def: Arc<DescriptorSetLayoutDef>,
    ) -> Self {
        DescriptorUpdateTemplateState {
            handle,
            create_info,
            def,
        }
    }

    #[inline]
    pub fn handle(&self) -> ash::vk::DescriptorUpdateTemplate {
        self.handle
    }

    #[inline]
    pub fn template_type(&self) -> DescriptorUpdateTemplateType {
        self.create_info.template_type
    }

    #[inline]
    pub fn create_info(&self) -> &DescriptorUpdateTemplateCreateInfo {
        &self.create_info
    }

    /// Returns the definition of the layout that the template was created for.
    #[inline]
    pub fn def(&self) -> &Arc<DescriptorSetLayoutDef> {
        &self.def
    }

    /// Decodes `data` into the writes that the template describes, with `dst_set` as their
    /// destination.
    ///
    /// Each descriptor becomes its own write. When the array element of an entry runs past the
    /// end of its binding, decoding continues at element 0 of the next non-empty binding.
    /// Inline uniform block entries become a single write of their bytes.
    pub fn decode(
        &self,
        dst_set: ash::vk::DescriptorSet,
        data: &[u8],
    ) -> Result<Vec<WriteDescriptorSet>, Box<ValidationError>> {
        let mut writes = Vec::new();

        for (entry_index, entry) in self.create_info.entries.iter().enumerate() {
            self.decode_entry(dst_set, entry, data, &mut writes)
                .map_err(|err| err.add_context(format!("entries[{}]", entry_index)))?;
        }

        Ok(writes)
    }

    fn decode_entry(
        &self,
        dst_set: ash::vk::DescriptorSet,
        entry: &DescriptorUpdateTemplateEntry,
        data: &[u8],
        writes: &mut Vec<WriteDescriptorSet>,
    ) -> Result<(), Box<ValidationError>> {
        if entry.descriptor_type == DescriptorType::InlineUniformBlock {
            let bytes = entry
                .offset
                .checked_add(entry.descriptor_count as usize)
                .and_then(|end| data.get(entry.offset..end))
                .ok_or_else(|| data_too_short(entry.offset, entry.descriptor_count as usize))?;

            writes.push(WriteDescriptorSet::inline_uniform_block(
                dst_set,
                entry.dst_binding,
                entry.dst_array_element,
                bytes.to_vec(),
            ));

            return Ok(());
        }

        let mut dst_binding = entry.dst_binding;
        let mut dst_array_element = entry.dst_array_element;

        for index in 0..entry.descriptor_count as usize {
            while dst_array_element >= self.def.descriptor_count_of(dst_binding) {
                let Some(next) = self.def.next_non_empty_binding(dst_binding) else {
                    break;
                };

                dst_array_element -= self.def.descriptor_count_of(dst_binding);
                dst_binding = next;
            }

            let offset = index
                .checked_mul(entry.stride)
                .and_then(|offset| offset.checked_add(entry.offset))
                .ok_or_else(|| data_too_short(entry.offset, index))?;

            let write = decode_descriptor(
                dst_set,
                dst_binding,
                dst_array_element,
                entry.descriptor_type,
                data,
                offset,
            )
            .map_err(|err| err.add_context(format!("descriptors[{}]", index)))?;
            writes.push(write);

            dst_array_element += 1;
        }

        Ok(())
    }
}

fn decode_descriptor(
    dst_set: ash::vk::DescriptorSet,
    dst_binding: u32,
    dst_array_element: u32,
    descriptor_type: DescriptorType,
    data: &[u8],
    offset: usize,
) -> Result<WriteDescriptorSet, Box<ValidationError>> {
    let write = match descriptor_type.class() {
        DescriptorClass::PlainSampler | DescriptorClass::ImageSampler | DescriptorClass::Image => {
            let raw: RawDescriptorImageInfo = read(data, offset)?;
            let image_layout =
                ImageLayout::try_from(ash::vk::ImageLayout::from_raw(raw.image_layout))
                    .map_err(|_| {
                        Box::new(ValidationError {
                            context: "image_layout".into(),
                            problem: format!("{} is not a valid image layout", raw.image_layout)
                                .into(),
                            vuids: &["VUID-VkDescriptorImageInfo-imageLayout-parameter"],
                            ..Default::default()
                        })
                    })?;

            WriteDescriptorSet::images(
                dst_set,
                dst_binding,
                dst_array_element,
                descriptor_type,
                [DescriptorImageInfo {
                    sampler: ash::vk::Sampler::from_raw(raw.sampler),
                    image_view: ash::vk::ImageView::from_raw(raw.image_view),
                    image_layout,
                }],
            )
        }
        DescriptorClass::TexelBuffer => {
            let raw: u64 = read(data, offset)?;

            WriteDescriptorSet::texel_buffer_views(
                dst_set,
                dst_binding,
                dst_array_element,
                descriptor_type,
                [ash::vk::BufferView::from_raw(raw)],
            )
        }
        DescriptorClass::GeneralBuffer => {
            let raw: RawDescriptorBufferInfo = read(data, offset)?;

            WriteDescriptorSet::buffers(
                dst_set,
                dst_binding,
                dst_array_element,
                descriptor_type,
                [DescriptorBufferInfo {
                    buffer: ash::vk::Buffer::from_raw(raw.buffer),
                    offset: raw.offset,
                    range: raw.range,
                }],
            )
        }
        DescriptorClass::AccelerationStructure => {
            let raw: u64 = read(data, offset)?;

            WriteDescriptorSet::acceleration_structures(
                dst_set,
                dst_binding,
                dst_array_element,
                [ash::vk::AccelerationStructureKHR::from_raw(raw)],
            )
        }
        DescriptorClass::InlineUniform => unreachable!(),
    };

    Ok(write)
}

fn read<T: Pod>(data: &[u8], offset: usize) -> Result<T, Box<ValidationError>> {
    offset
        .checked_add(size_of::<T>())
        .and_then(|end| data.get(offset..end))
        .map(bytemuck::pod_read_unaligned)
        .ok_or_else(|| data_too_short(offset, size_of::<T>()))
}

fn data_too_short(offset: usize, size: usize) -> Box<ValidationError> {
    Box::new(ValidationError {
        context: "data".into(),
        problem: format!(
            "is too short to contain {} bytes at offset {}",
            size, offset,
        )
        .into(),
        vuids: &["VUID-vkUpdateDescriptorSetWithTemplate-pData-01685"],
        ..Default::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        buffer::BufferUsage,
        descriptor_set::{
            layout::{
                DescriptorSetLayoutBinding, DescriptorSetLayoutCreateInfo,
                DescriptorSetLayoutState,
            },
            DescriptorSetState,
        },
        tests_util::test_validator,
        WHOLE_SIZE,
    };

    fn layout() -> DescriptorSetLayoutState {
        DescriptorSetLayoutState::new(
            ash::vk::DescriptorSetLayout::from_raw(0x10),
            &DescriptorSetLayoutCreateInfo {
                bindings: vec![
                    DescriptorSetLayoutBinding {
                        binding: 0,
                        descriptor_count: 2,
                        ..DescriptorSetLayoutBinding::descriptor_type(DescriptorType::SampledImage)
                    },
                    DescriptorSetLayoutBinding {
                        binding: 1,
                        descriptor_count: 2,
                        ..DescriptorSetLayoutBinding::descriptor_type(DescriptorType::SampledImage)
                    },
                    DescriptorSetLayoutBinding {
                        binding: 2,
                        ..DescriptorSetLayoutBinding::descriptor_type(
                            DescriptorType::UniformBuffer,
                        )
                    },
                ],
                ..Default::default()
            },
        )
    }

    fn image_info(image_view: u64) -> RawDescriptorImageInfo {
        RawDescriptorImageInfo {
            sampler: 0,
            image_view,
            image_layout: ash::vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL.as_raw(),
            _pad: 0,
        }
    }

    #[test]
    fn decoded_writes_match_direct_writes() {
        let layout = layout();
        let set = ash::vk::DescriptorSet::from_raw(0x20);
        let pool = ash::vk::DescriptorPool::from_raw(0x30);

        // Three image infos followed by one buffer info, rolling over from binding 0 into 1.
        let mut data = Vec::new();
        for view in [0x41, 0x42, 0x43] {
            data.extend_from_slice(bytemuck::bytes_of(&image_info(view)));
        }
        let buffer_offset = data.len();
        data.extend_from_slice(bytemuck::bytes_of(&RawDescriptorBufferInfo {
            buffer: 0x50,
            offset: 0,
            range: WHOLE_SIZE,
        }));

        let mut create_info = DescriptorUpdateTemplateCreateInfo::descriptor_set(layout.handle());
        create_info.entries = vec![
            DescriptorUpdateTemplateEntry {
                dst_binding: 0,
                dst_array_element: 1,
                descriptor_count: 3,
                descriptor_type: DescriptorType::SampledImage,
                offset: 0,
                stride: size_of::<RawDescriptorImageInfo>(),
            },
            DescriptorUpdateTemplateEntry {
                dst_binding: 2,
                dst_array_element: 0,
                descriptor_count: 1,
                descriptor_type: DescriptorType::UniformBuffer,
                offset: buffer_offset,
                stride: 0,
            },
        ];
        let template = DescriptorUpdateTemplateState::new(
            ash::vk::DescriptorUpdateTemplate::from_raw(0x60),
            create_info,
            layout.def().clone(),
        );

        let writes = template.decode(set, &data).unwrap();
        assert_eq!(writes.len(), 4);
        assert_eq!((writes[1].dst_binding, writes[1].dst_array_element), (1, 0));

        let mut decoded = DescriptorSetState::new(set, pool, &layout, None);
        for write in &writes {
            decoded.perform_write(write);
        }

        let layout_read_only = ImageLayout::ShaderReadOnlyOptimal;
        let mut direct = DescriptorSetState::new(set, pool, &layout, None);
        direct.perform_write(&WriteDescriptorSet::images(
            set,
            0,
            1,
            DescriptorType::SampledImage,
            [0x41, 0x42, 0x43].map(|view| {
                DescriptorImageInfo::image_view(
                    ash::vk::ImageView::from_raw(view),
                    layout_read_only,
                )
            }),
        ));
        direct.perform_write(&WriteDescriptorSet::buffers(
            set,
            2,
            0,
            DescriptorType::UniformBuffer,
            [DescriptorBufferInfo {
                buffer: ash::vk::Buffer::from_raw(0x50),
                offset: 0,
                range: WHOLE_SIZE,
            }],
        ));

        assert_eq!(decoded.descriptors(), direct.descriptors());
    }

    #[test]
    fn short_data() {
        let layout = layout();
        let mut create_info = DescriptorUpdateTemplateCreateInfo::descriptor_set(layout.handle());
        create_info.entries = vec![DescriptorUpdateTemplateEntry {
            dst_binding: 0,
            dst_array_element: 0,
            descriptor_count: 2,
            descriptor_type: DescriptorType::SampledImage,
            offset: 0,
            stride: size_of::<RawDescriptorImageInfo>(),
        }];
        let template = DescriptorUpdateTemplateState::new(
            ash::vk::DescriptorUpdateTemplate::from_raw(0x60),
            create_info,
            layout.def().clone(),
        );

        let data = bytemuck::bytes_of(&image_info(0x41)).to_vec();
        let err = template
            .decode(ash::vk::DescriptorSet::from_raw(0x20), &data)
            .unwrap_err();
        assert_eq!(
            err.vuids,
            &["VUID-vkUpdateDescriptorSetWithTemplate-pData-01685"],
        );
    }

    #[test]
    fn template_update_is_validated_like_writes() {
        let (mut validator, sink) = test_validator();
        let buffer = validator.test_buffer(64, BufferUsage::STORAGE_BUFFER);
        let (layout, set) = validator.test_descriptor_set(DescriptorSetLayoutCreateInfo {
            bindings: vec![DescriptorSetLayoutBinding::descriptor_type(
                DescriptorType::UniformBuffer,
            )],
            ..Default::default()
        });

        let mut create_info = DescriptorUpdateTemplateCreateInfo::descriptor_set(layout);
        create_info.entries = vec![DescriptorUpdateTemplateEntry {
            dst_binding: 0,
            dst_array_element: 0,
            descriptor_count: 1,
            descriptor_type: DescriptorType::UniformBuffer,
            offset: 0,
            stride: 0,
        }];
        let template = ash::vk::DescriptorUpdateTemplate::from_raw(0x70);
        assert!(!validator.validate_create_descriptor_update_template(&create_info));
        validator.record_create_descriptor_update_template(template, create_info);

        let data = bytemuck::bytes_of(&RawDescriptorBufferInfo {
            buffer: buffer.as_raw(),
            offset: 0,
            range: WHOLE_SIZE,
        })
        .to_vec();

        // The buffer lacks uniform buffer usage.
        assert!(validator.validate_update_descriptor_set_with_template(set, template, &data));
        assert!(sink.contains_vuid("VUID-VkWriteDescriptorSet-descriptorType-00330"));
    }
}
