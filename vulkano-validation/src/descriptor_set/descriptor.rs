// Copyright (c) 2016 The vulkano developers
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or https://opensource.org/licenses/MIT>,
// at your option. All files in the project carrying such
// notice may not be copied, modified, or distributed except
// according to those terms.

//! The state of a single descriptor in a descriptor set.

use super::{
    layout::{DescriptorClass, DescriptorSetLayoutBinding, DescriptorType},
    update::{DescriptorBufferInfo, DescriptorImageInfo},
};
use crate::{image::ImageLayout, DeviceSize};

/// One array element of a binding in a descriptor set.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Descriptor {
    /// Whether the descriptor was written, or copied from a written descriptor.
    pub updated: bool,
    pub kind: DescriptorKind,
}

/// The resources a descriptor refers to, by descriptor class.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DescriptorKind {
    PlainSampler {
        sampler: ash::vk::Sampler,
        immutable: bool,
    },
    ImageSampler {
        sampler: ash::vk::Sampler,
        immutable: bool,
        image_view: ash::vk::ImageView,
        image_layout: ImageLayout,
    },
    Image {
        image_view: ash::vk::ImageView,
        image_layout: ImageLayout,
    },
    TexelBuffer {
        buffer_view: ash::vk::BufferView,
    },
    Buffer {
        buffer: ash::vk::Buffer,
        offset: DeviceSize,
        range: DeviceSize,
        dynamic: bool,
    },
    InlineUniform,
    AccelerationStructure {
        acceleration_structure: ash::vk::AccelerationStructureKHR,
    },
}

impl Descriptor {
    /// Creates the descriptors of `binding`. Descriptors with an immutable sampler and no other
    /// resources start out updated.
    pub(crate) fn for_binding(
        binding: &DescriptorSetLayoutBinding,
    ) -> impl Iterator<Item = Self> + '_ {
        (0..binding.descriptor_count as usize).map(move |index| {
            let immutable_sampler = binding.immutable_samplers.get(index).copied();
            Self::new(binding.descriptor_type, immutable_sampler)
        })
    }

    fn new(descriptor_type: DescriptorType, immutable_sampler: Option<ash::vk::Sampler>) -> Self {
        let kind = match descriptor_type.class() {
            DescriptorClass::PlainSampler => DescriptorKind::PlainSampler {
                sampler: immutable_sampler.unwrap_or_default(),
                immutable: immutable_sampler.is_some(),
            },
            DescriptorClass::ImageSampler => DescriptorKind::ImageSampler {
                sampler: immutable_sampler.unwrap_or_default(),
                immutable: immutable_sampler.is_some(),
                image_view: ash::vk::ImageView::null(),
                image_layout: ImageLayout::Undefined,
            },
            DescriptorClass::Image => DescriptorKind::Image {
                image_view: ash::vk::ImageView::null(),
                image_layout: ImageLayout::Undefined,
            },
            DescriptorClass::TexelBuffer => DescriptorKind::TexelBuffer {
                buffer_view: ash::vk::BufferView::null(),
            },
            DescriptorClass::GeneralBuffer => DescriptorKind::Buffer {
                buffer: ash::vk::Buffer::null(),
                offset: 0,
                range: 0,
                dynamic: descriptor_type.is_dynamic(),
            },
            DescriptorClass::InlineUniform => DescriptorKind::InlineUniform,
            DescriptorClass::AccelerationStructure => DescriptorKind::AccelerationStructure {
                acceleration_structure: ash::vk::AccelerationStructureKHR::null(),
            },
        };

        // A combined image sampler still needs its image written.
        let updated = matches!(kind, DescriptorKind::PlainSampler { immutable: true, .. });

        Descriptor { updated, kind }
    }

    #[inline]
    pub fn class(&self) -> DescriptorClass {
        match self.kind {
            DescriptorKind::PlainSampler { .. } => DescriptorClass::PlainSampler,
            DescriptorKind::ImageSampler { .. } => DescriptorClass::ImageSampler,
            DescriptorKind::Image { .. } => DescriptorClass::Image,
            DescriptorKind::TexelBuffer { .. } => DescriptorClass::TexelBuffer,
            DescriptorKind::Buffer { .. } => DescriptorClass::GeneralBuffer,
            DescriptorKind::InlineUniform => DescriptorClass::InlineUniform,
            DescriptorKind::AccelerationStructure { .. } => DescriptorClass::AccelerationStructure,
        }
    }

    /// Returns whether the sampler of the descriptor is part of the layout.
    #[inline]
    pub fn is_immutable_sampler(&self) -> bool {
        matches!(
            self.kind,
            DescriptorKind::PlainSampler { immutable: true, .. }
                | DescriptorKind::ImageSampler { immutable: true, .. }
        )
    }

    #[inline]
    pub fn is_dynamic(&self) -> bool {
        matches!(self.kind, DescriptorKind::Buffer { dynamic: true, .. })
    }

    /// Returns the sampler, for sampler and combined image sampler descriptors.
    #[inline]
    pub fn sampler(&self) -> Option<ash::vk::Sampler> {
        match self.kind {
            DescriptorKind::PlainSampler { sampler, .. }
            | DescriptorKind::ImageSampler { sampler, .. } => Some(sampler),
            _ => None,
        }
    }

    /// Returns the image view and the layout it was written with, for image descriptors.
    #[inline]
    pub fn image_view(&self) -> Option<(ash::vk::ImageView, ImageLayout)> {
        match self.kind {
            DescriptorKind::ImageSampler {
                image_view,
                image_layout,
                ..
            }
            | DescriptorKind::Image {
                image_view,
                image_layout,
            } => Some((image_view, image_layout)),
            _ => None,
        }
    }

    /// Writes an image info. The sampler is ignored if it is immutable.
    pub(crate) fn write_image(&mut self, info: &DescriptorImageInfo) {
        match &mut self.kind {
            DescriptorKind::PlainSampler { sampler, immutable } => {
                if !*immutable {
                    *sampler = info.sampler;
                }
            }
            DescriptorKind::ImageSampler {
                sampler,
                immutable,
                image_view,
                image_layout,
            } => {
                if !*immutable {
                    *sampler = info.sampler;
                }

                *image_view = info.image_view;
                *image_layout = info.image_layout;
            }
            DescriptorKind::Image {
                image_view,
                image_layout,
            } => {
                *image_view = info.image_view;
                *image_layout = info.image_layout;
            }
            _ => return,
        }

        self.updated = true;
    }

    pub(crate) fn write_buffer(&mut self, info: &DescriptorBufferInfo) {
        if let DescriptorKind::Buffer {
            buffer,
            offset,
            range,
            dynamic: _,
        } = &mut self.kind
        {
            *buffer = info.buffer;
            *offset = info.offset;
            *range = info.range;
            self.updated = true;
        }
    }

    pub(crate) fn write_texel_buffer_view(&mut self, view: ash::vk::BufferView) {
        if let DescriptorKind::TexelBuffer { buffer_view } = &mut self.kind {
            *buffer_view = view;
            self.updated = true;
        }
    }

    pub(crate) fn write_acceleration_structure(
        &mut self,
        handle: ash::vk::AccelerationStructureKHR,
    ) {
        if let DescriptorKind::AccelerationStructure {
            acceleration_structure,
        } = &mut self.kind
        {
            *acceleration_structure = handle;
            self.updated = true;
        }
    }

    pub(crate) fn write_inline(&mut self) {
        if let DescriptorKind::InlineUniform = self.kind {
            self.updated = true;
        }
    }

    /// Copies the state of `src`, keeping the immutable sampler of `self`. If `src` was never
    /// updated, `self` becomes not updated.
    pub(crate) fn copy_from(&mut self, src: &Descriptor) {
        if !src.updated {
            self.updated = false;
            return;
        }

        match (&mut self.kind, &src.kind) {
            (
                DescriptorKind::PlainSampler { sampler, immutable },
                &DescriptorKind::PlainSampler {
                    sampler: src_sampler,
                    ..
                },
            ) => {
                if !*immutable {
                    *sampler = src_sampler;
                }
            }
            (
                DescriptorKind::ImageSampler {
                    sampler,
                    immutable,
                    image_view,
                    image_layout,
                },
                &DescriptorKind::ImageSampler {
                    sampler: src_sampler,
                    image_view: src_image_view,
                    image_layout: src_image_layout,
                    ..
                },
            ) => {
                if !*immutable {
                    *sampler = src_sampler;
                }

                *image_view = src_image_view;
                *image_layout = src_image_layout;
            }
            (kind, src_kind) => *kind = src_kind.clone(),
        }

        self.updated = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ash::vk::Handle;

    #[test]
    fn immutable_samplers() {
        let samplers = vec![
            ash::vk::Sampler::from_raw(1),
            ash::vk::Sampler::from_raw(2),
        ];
        let binding = DescriptorSetLayoutBinding {
            descriptor_count: 2,
            immutable_samplers: samplers.clone(),
            ..DescriptorSetLayoutBinding::descriptor_type(DescriptorType::Sampler)
        };

        let descriptors: Vec<_> = Descriptor::for_binding(&binding).collect();
        assert_eq!(descriptors.len(), 2);
        assert!(descriptors.iter().all(|d| d.updated && d.is_immutable_sampler()));
        assert_eq!(descriptors[1].sampler(), Some(ash::vk::Sampler::from_raw(2)));

        // The image of a combined image sampler must still be written.
        let binding = DescriptorSetLayoutBinding {
            descriptor_count: 2,
            immutable_samplers: samplers,
            ..DescriptorSetLayoutBinding::descriptor_type(DescriptorType::CombinedImageSampler)
        };

        let descriptors: Vec<_> = Descriptor::for_binding(&binding).collect();
        assert!(descriptors.iter().all(|d| !d.updated && d.is_immutable_sampler()));
        assert_eq!(descriptors[0].sampler(), Some(ash::vk::Sampler::from_raw(1)));
    }

    #[test]
    fn write_keeps_immutable_sampler() {
        let mut descriptor = Descriptor::new(
            DescriptorType::CombinedImageSampler,
            Some(ash::vk::Sampler::from_raw(1)),
        );

        descriptor.write_image(&DescriptorImageInfo {
            sampler: ash::vk::Sampler::from_raw(9),
            image_view: ash::vk::ImageView::from_raw(5),
            image_layout: ImageLayout::ShaderReadOnlyOptimal,
        });

        assert_eq!(descriptor.sampler(), Some(ash::vk::Sampler::from_raw(1)));
        assert_eq!(
            descriptor.image_view(),
            Some((
                ash::vk::ImageView::from_raw(5),
                ImageLayout::ShaderReadOnlyOptimal,
            )),
        );
    }

    #[test]
    fn copy_of_unwritten_descriptor_clears_updated() {
        let mut dst = Descriptor::new(DescriptorType::UniformBuffer, None);
        dst.write_buffer(&DescriptorBufferInfo {
            buffer: ash::vk::Buffer::from_raw(3),
            offset: 0,
            range: 64,
        });
        assert!(dst.updated);

        let src = Descriptor::new(DescriptorType::UniformBuffer, None);
        dst.copy_from(&src);
        assert!(!dst.updated);

        let mut src = Descriptor::new(DescriptorType::UniformBuffer, None);
        src.write_buffer(&DescriptorBufferInfo {
            buffer: ash::vk::Buffer::from_raw(4),
            offset: 16,
            range: 32,
        });
        dst.copy_from(&src);
        assert_eq!(dst, src);
    }
}
