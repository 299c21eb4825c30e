// Copyright (c) 2016 The vulkano developers
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or https://opensource.org/licenses/MIT>,
// at your option. All files in the project carrying such
// notice may not be copied, modified, or distributed except
// according to those terms.

//! Command buffer state.
//!
//! A [`CommandBufferState`] is created for every allocated command buffer. While it is recorded,
//! the validator keeps in it:
//!
//! - an [`ImageLayoutMap`] per image that a command used, with the layouts the command buffer
//!   expects on entry and the layouts it leaves behind;
//! - the [queue family ownership transfers](qfo) it releases and acquires;
//! - the descriptor sets bound to each pipeline bind point, and the push descriptor sets;
//! - the render pass instance that is active, if any;
//! - every object that a command referenced, so that the command buffer can be invalidated when
//!   one of them is destroyed.
//!
//! The commands themselves are validated and recorded in the submodules.

use self::{image_layout::ImageLayoutMap, qfo::QueueFamilyTransfers};
use crate::{
    buffer::{BufferState, BufferViewState},
    descriptor_set::{layout::DescriptorSetLayoutDef, DescriptorSetState},
    image::{view::ImageViewState, ImageLayout, ImageState, ImageSubresourceRange},
    macros::vulkan_enum,
    sampler::SamplerState,
    ObjectHandle,
};
use foldhash::{HashMap, HashSet};
use smallvec::SmallVec;
use std::sync::Arc;

pub mod barrier;
pub mod bind_push;
pub mod copy;
pub mod image_layout;
pub mod qfo;
pub mod render_pass;

vulkan_enum! {
    /// Whether a command buffer can be submitted directly to a queue, or executed from another
    /// command buffer.
    CommandBufferLevel = CommandBufferLevel(i32);

    /// The command buffer is submitted to queues.
    Primary = PRIMARY,

    /// The command buffer is executed from a primary command buffer.
    Secondary = SECONDARY,
}

vulkan_enum! {
    /// The pipeline type that descriptor sets are bound for.
    PipelineBindPoint = PipelineBindPoint(i32);

    Compute = COMPUTE,

    Graphics = GRAPHICS,
}

/// The lifecycle state of a command buffer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RecordingState {
    /// Allocated or reset, nothing recorded.
    #[default]
    Initial,

    /// Between begin and end.
    Recording,

    /// Ended, ready to be submitted.
    Executable,

    /// An object that a command referenced was destroyed or modified.
    Invalid,
}

/// A descriptor set bound at one set index of a bind point.
#[derive(Clone, Debug)]
pub struct BoundDescriptorSet {
    /// The bound set, or `None` for a push descriptor set.
    pub set: Option<ash::vk::DescriptorSet>,

    /// The layout the set is bound with, which decides compatibility with later binds.
    pub layout: Arc<DescriptorSetLayoutDef>,

    /// The dynamic offsets given for the set's dynamic buffer bindings, in binding order.
    pub dynamic_offsets: SmallVec<[u32; 4]>,
}

/// The render pass instance that a command buffer is recording into.
#[derive(Clone, Debug)]
pub struct RenderPassInstance {
    pub render_pass: ash::vk::RenderPass,
    pub framebuffer: ash::vk::Framebuffer,
    pub subpass: u32,

    /// The image views used as attachments, from the framebuffer or given at begin time for an
    /// imageless framebuffer.
    pub attachments: SmallVec<[ash::vk::ImageView; 4]>,
}

/// The state tracked for a command buffer.
#[derive(Debug)]
pub struct CommandBufferState {
    handle: ash::vk::CommandBuffer,
    pool: ash::vk::CommandPool,
    queue_family_index: u32,
    level: CommandBufferLevel,
    state: RecordingState,
    in_flight: u32,

    pub(crate) image_layouts: HashMap<ash::vk::Image, ImageLayoutMap>,
    image_layout_change_count: u64,
    pub(crate) qfo_transfers: QueueFamilyTransfers,

    pub(crate) bound_descriptor_sets:
        HashMap<PipelineBindPoint, SmallVec<[Option<BoundDescriptorSet>; 4]>>,
    pub(crate) push_descriptor_sets: HashMap<(PipelineBindPoint, u32), DescriptorSetState>,
    pub(crate) render_pass: Option<RenderPassInstance>,

    broken_bindings: Vec<ObjectHandle>,
    pub(crate) objects: HashSet<ObjectHandle>,
}

impl CommandBufferState {
    pub fn new(
        handle: ash::vk::CommandBuffer,
        pool: ash::vk::CommandPool,
        queue_family_index: u32,
        level: CommandBufferLevel,
    ) -> Self {
        CommandBufferState {
            handle,
            pool,
            queue_family_index,
            level,
            state: RecordingState::Initial,
            in_flight: 0,
            image_layouts: HashMap::default(),
            image_layout_change_count: 1,
            qfo_transfers: QueueFamilyTransfers::default(),
            bound_descriptor_sets: HashMap::default(),
            push_descriptor_sets: HashMap::default(),
            render_pass: None,
            broken_bindings: Vec::new(),
            objects: HashSet::default(),
        }
    }

    #[inline]
    pub fn handle(&self) -> ash::vk::CommandBuffer {
        self.handle
    }

    #[inline]
    pub fn pool(&self) -> ash::vk::CommandPool {
        self.pool
    }

    /// Returns the queue family of the pool the command buffer was allocated from.
    #[inline]
    pub fn queue_family_index(&self) -> u32 {
        self.queue_family_index
    }

    #[inline]
    pub fn level(&self) -> CommandBufferLevel {
        self.level
    }

    #[inline]
    pub fn state(&self) -> RecordingState {
        self.state
    }

    /// Returns whether the command buffer was submitted and has not yet been reported as
    /// completed.
    #[inline]
    pub fn is_in_flight(&self) -> bool {
        self.in_flight > 0
    }

    /// Returns the objects whose destruction or modification invalidated the command buffer.
    #[inline]
    pub fn broken_bindings(&self) -> &[ObjectHandle] {
        &self.broken_bindings
    }

    /// Returns a counter that changes every time a recorded command changes the layout of a
    /// subresource.
    #[inline]
    pub fn image_layout_change_count(&self) -> u64 {
        self.image_layout_change_count
    }

    #[inline]
    pub fn image_layout_map(&self, image: ash::vk::Image) -> Option<&ImageLayoutMap> {
        self.image_layouts.get(&image)
    }

    #[inline]
    pub fn qfo_transfers(&self) -> &QueueFamilyTransfers {
        &self.qfo_transfers
    }

    #[inline]
    pub fn render_pass(&self) -> Option<&RenderPassInstance> {
        self.render_pass.as_ref()
    }

    /// Returns the descriptor set bound at `set` for `bind_point`.
    pub fn bound_descriptor_set(
        &self,
        bind_point: PipelineBindPoint,
        set: u32,
    ) -> Option<&BoundDescriptorSet> {
        self.bound_descriptor_sets
            .get(&bind_point)
            .and_then(|sets| sets.get(set as usize))
            .and_then(Option::as_ref)
    }

    /// Starts recording. A command buffer that was already recorded is implicitly reset.
    pub fn begin(&mut self) {
        if self.state != RecordingState::Initial {
            self.reset();
        }

        self.state = RecordingState::Recording;
    }

    pub fn end(&mut self) {
        if self.state == RecordingState::Recording {
            self.state = RecordingState::Executable;
        }
    }

    /// Returns the command buffer to the initial state, forgetting everything recorded.
    pub fn reset(&mut self) {
        self.state = RecordingState::Initial;
        self.image_layouts.clear();
        self.image_layout_change_count += 1;
        self.qfo_transfers.clear();
        self.bound_descriptor_sets.clear();
        self.push_descriptor_sets.clear();
        self.render_pass = None;
        self.broken_bindings.clear();
        self.objects.clear();
    }

    /// Marks the command buffer invalid, because `object` was destroyed or modified.
    pub fn invalidate(&mut self, object: ObjectHandle) {
        if matches!(
            self.state,
            RecordingState::Recording | RecordingState::Executable | RecordingState::Invalid
        ) {
            self.state = RecordingState::Invalid;
            self.broken_bindings.push(object);
        }
    }

    pub(crate) fn mark_submitted(&mut self) {
        self.in_flight += 1;
    }

    pub(crate) fn mark_completed(&mut self) {
        self.in_flight = self.in_flight.saturating_sub(1);
    }

    /// Records that a command referenced `object`.
    #[inline]
    pub fn add_object(&mut self, object: ObjectHandle) {
        self.objects.insert(object);
    }

    /// Links the command buffer and `image` both ways, if the image exists.
    pub(crate) fn bind_image(
        &mut self,
        images: &mut HashMap<ash::vk::Image, ImageState>,
        image: ash::vk::Image,
    ) {
        if let Some(state) = images.get_mut(&image) {
            state.command_buffers.insert(self.handle);
            self.objects.insert(ObjectHandle::new(image));
        }
    }

    pub(crate) fn bind_image_view(
        &mut self,
        image_views: &mut HashMap<ash::vk::ImageView, ImageViewState>,
        image_view: ash::vk::ImageView,
    ) {
        if let Some(state) = image_views.get_mut(&image_view) {
            state.command_buffers.insert(self.handle);
            self.objects.insert(ObjectHandle::new(image_view));
        }
    }

    pub(crate) fn bind_buffer(
        &mut self,
        buffers: &mut HashMap<ash::vk::Buffer, BufferState>,
        buffer: ash::vk::Buffer,
    ) {
        if let Some(state) = buffers.get_mut(&buffer) {
            state.command_buffers.insert(self.handle);
            self.objects.insert(ObjectHandle::new(buffer));
        }
    }

    pub(crate) fn bind_buffer_view(
        &mut self,
        buffer_views: &mut HashMap<ash::vk::BufferView, BufferViewState>,
        buffer_view: ash::vk::BufferView,
    ) {
        if let Some(state) = buffer_views.get_mut(&buffer_view) {
            state.command_buffers.insert(self.handle);
            self.objects.insert(ObjectHandle::new(buffer_view));
        }
    }

    pub(crate) fn bind_sampler(
        &mut self,
        samplers: &mut HashMap<ash::vk::Sampler, SamplerState>,
        sampler: ash::vk::Sampler,
    ) {
        if let Some(state) = samplers.get_mut(&sampler) {
            state.command_buffers.insert(self.handle);
            self.objects.insert(ObjectHandle::new(sampler));
        }
    }

    fn layout_map_mut(&mut self, image: &ImageState) -> &mut ImageLayoutMap {
        self.image_layouts
            .entry(image.handle())
            .or_insert_with(|| ImageLayoutMap::new(image))
    }

    /// Records that `range` of `image` is transitioned to `layout`. If the command buffer did
    /// not use these subresources before, it expects them to be in `expected_layout` on entry,
    /// or in `layout` if there is none.
    pub fn set_image_layout(
        &mut self,
        image: &ImageState,
        range: &ImageSubresourceRange,
        layout: ImageLayout,
        expected_layout: Option<ImageLayout>,
    ) {
        let range = image.normalize_range(range);

        if self
            .layout_map_mut(image)
            .set_layout(&range, layout, expected_layout)
        {
            self.image_layout_change_count += 1;
        }
    }

    /// Records that `range` of `image` is used in `layout`, without transition.
    pub fn set_image_initial_layout(
        &mut self,
        image: &ImageState,
        range: &ImageSubresourceRange,
        layout: ImageLayout,
    ) {
        let range = image.normalize_range(range);
        self.layout_map_mut(image)
            .set_initial_layout(&range, layout, None);
    }

    /// Records that the subresources of `view` are transitioned to `layout`.
    pub fn set_image_view_layout(
        &mut self,
        view: &ImageViewState,
        image: &ImageState,
        layout: ImageLayout,
        expected_layout: Option<ImageLayout>,
    ) {
        let range = view.layout_range();

        if self
            .layout_map_mut(image)
            .set_layout(&range, layout, expected_layout)
        {
            self.image_layout_change_count += 1;
        }
    }

    /// Records that the subresources of `view` are used in `layout`, without transition. The
    /// aspects of the view are kept with the initial layout.
    pub fn set_image_view_initial_layout(
        &mut self,
        view: &ImageViewState,
        image: &ImageState,
        layout: ImageLayout,
    ) {
        let range = view.layout_range();
        let aspects = range.aspects;
        self.layout_map_mut(image)
            .set_initial_layout(&range, layout, Some(aspects));
    }

    /// Merges the state of a secondary command buffer that is executed by this one.
    pub fn execute_secondary(&mut self, secondary: &CommandBufferState) {
        for (image, secondary_map) in &secondary.image_layouts {
            let changed = match self.image_layouts.get_mut(image) {
                Some(map) => map.update_from(secondary_map),
                None => {
                    self.image_layouts.insert(*image, secondary_map.clone());
                    true
                }
            };

            if changed {
                self.image_layout_change_count += 1;
            }
        }

        self.qfo_transfers.update_from(&secondary.qfo_transfers);
        self.objects.extend(secondary.objects.iter().copied());
        self.objects.insert(ObjectHandle::new(secondary.handle));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        format::Format,
        image::{ImageAspects, ImageCreateInfo, ImageUsage},
    };
    use ash::vk::Handle;

    fn command_buffer() -> CommandBufferState {
        CommandBufferState::new(
            ash::vk::CommandBuffer::from_raw(1),
            ash::vk::CommandPool::from_raw(1),
            0,
            CommandBufferLevel::Primary,
        )
    }

    fn image() -> ImageState {
        ImageState::new(
            ash::vk::Image::from_raw(10),
            ImageCreateInfo {
                format: Format::R8G8B8A8_UNORM,
                extent: [8, 8, 1],
                usage: ImageUsage::TRANSFER_SRC | ImageUsage::TRANSFER_DST,
                ..Default::default()
            },
        )
    }

    #[test]
    fn change_count_only_on_change() {
        let mut cb = command_buffer();
        let image = image();
        let range = ImageSubresourceRange::whole(ImageAspects::COLOR);

        let start = cb.image_layout_change_count();
        cb.set_image_layout(&image, &range, ImageLayout::TransferDstOptimal, None);
        let after_first = cb.image_layout_change_count();
        assert!(after_first > start);

        cb.set_image_layout(&image, &range, ImageLayout::TransferDstOptimal, None);
        assert_eq!(cb.image_layout_change_count(), after_first);

        cb.set_image_layout(&image, &range, ImageLayout::General, None);
        assert!(cb.image_layout_change_count() > after_first);
    }

    #[test]
    fn lifecycle() {
        let mut cb = command_buffer();
        let image = image();

        cb.begin();
        assert_eq!(cb.state(), RecordingState::Recording);
        cb.set_image_initial_layout(
            &image,
            &ImageSubresourceRange::whole(ImageAspects::COLOR),
            ImageLayout::General,
        );
        cb.end();
        assert_eq!(cb.state(), RecordingState::Executable);

        cb.invalidate(ObjectHandle::new(image.handle()));
        assert_eq!(cb.state(), RecordingState::Invalid);
        assert_eq!(cb.broken_bindings().len(), 1);

        cb.begin();
        assert_eq!(cb.state(), RecordingState::Recording);
        assert!(cb.image_layout_map(image.handle()).is_none());
        assert!(cb.broken_bindings().is_empty());
    }

    #[test]
    fn execute_secondary_merges_layouts() {
        let image = image();
        let range = ImageSubresourceRange::whole(ImageAspects::COLOR);

        let mut primary = command_buffer();
        primary.set_image_layout(&image, &range, ImageLayout::TransferDstOptimal, None);

        let mut secondary = CommandBufferState::new(
            ash::vk::CommandBuffer::from_raw(2),
            ash::vk::CommandPool::from_raw(1),
            0,
            CommandBufferLevel::Secondary,
        );
        secondary.set_image_layout(
            &image,
            &range,
            ImageLayout::ShaderReadOnlyOptimal,
            Some(ImageLayout::TransferDstOptimal),
        );

        primary.execute_secondary(&secondary);

        let map = primary.image_layout_map(image.handle()).unwrap();
        let subresource = crate::image::ImageSubresource {
            aspects: ImageAspects::COLOR,
            mip_level: 0,
            array_layer: 0,
        };
        assert_eq!(
            map.layout(subresource),
            Some(ImageLayout::ShaderReadOnlyOptimal),
        );
        assert_eq!(
            map.initial_layout(subresource).map(|initial| initial.layout),
            Some(ImageLayout::TransferDstOptimal),
        );
    }
}
