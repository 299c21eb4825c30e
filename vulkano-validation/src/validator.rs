// Copyright (c) 2016 The vulkano developers
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or https://opensource.org/licenses/MIT>,
// at your option. All files in the project carrying such
// notice may not be copied, modified, or distributed except
// according to those terms.

//! The per-device validator.
//!
//! A [`DeviceValidator`] owns every object record of one logical device, and exposes a pair of
//! entry points per intercepted host call:
//!
//! - `validate_*` checks the parameters against the tracked state, hands any problem to the
//!   [`LogSink`], and returns whether the call should be skipped.
//! - `record_*` updates the tracked state after the call was forwarded to the driver.
//!
//! Object records own their data. Cross-references between objects are sets of handles, which
//! are resolved through the [`ObjectTables`] when needed. Destroying an object walks its set of
//! command buffers and invalidates each of them.

use crate::{
    buffer::{BufferCreateInfo, BufferState, BufferViewCreateInfo, BufferViewState},
    command_buffer::{
        barrier::DependencyInfo,
        bind_push::{BindDescriptorSetsInfo, PushDescriptorSetInfo},
        copy::{
            BlitImageInfo, ClearColorImageInfo, ClearDepthStencilImageInfo, CopyBufferToImageInfo,
            CopyImageInfo, CopyImageToBufferInfo, ResolveImageInfo,
        },
        image_layout::{GlobalImageLayoutMap, LayoutOverlay},
        qfo::{BufferTransferBarrier, ImageTransferBarrier, PendingReleases, SubmitScoreboards},
        render_pass::{
            record_end_render_pass, record_next_subpass, validate_end_render_pass,
            validate_next_subpass, RenderPassBeginInfo,
        },
        CommandBufferLevel, CommandBufferState, RecordingState,
    },
    config::ValidationConfig,
    descriptor_set::{
        layout::{DescriptorSetLayoutCreateInfo, DescriptorSetLayoutState},
        requirements::DrawInfo,
        template::{
            DescriptorUpdateTemplateCreateInfo, DescriptorUpdateTemplateState,
            DescriptorUpdateTemplateType,
        },
        update::{CopyDescriptorSet, WriteDescriptorSet},
        DescriptorPoolCreateFlags, DescriptorPoolCreateInfo, DescriptorPoolState,
        DescriptorSetAllocateInfo, DescriptorSetState,
    },
    image::{
        view::{ImageViewCreateInfo, ImageViewState},
        ImageCreateInfo, ImageLayout, ImageState,
    },
    memory::MemoryBinding,
    render_pass::{FramebufferCreateInfo, FramebufferState, RenderPassCreateInfo, RenderPassState},
    sampler::{SamplerCreateInfo, SamplerState},
    DeviceSize, LogSink, ObjectHandle, Report, TracingSink, ValidationError,
};
use foldhash::{HashMap, HashSet};
use parking_lot::{Mutex, MutexGuard};
use smallvec::SmallVec;
use std::{borrow::Cow, fmt::Debug, hash::Hash, sync::Arc};

/// Looks up the record of `handle`, or returns an error if the handle is unknown.
pub(crate) fn lookup<'a, K, V>(
    map: &'a HashMap<K, V>,
    handle: K,
    context: impl Into<Cow<'static, str>>,
    vuids: &'static [&'static str],
) -> Result<&'a V, Box<ValidationError>>
where
    K: Copy + Eq + Hash + Debug,
{
    map.get(&handle).ok_or_else(|| {
        Box::new(ValidationError {
            context: context.into(),
            problem: format!(
                "{:?} is not a valid handle, or refers to an object that was destroyed",
                handle,
            )
            .into(),
            vuids,
            ..Default::default()
        })
    })
}

/// The records of every object of a device, except command buffers.
#[derive(Debug, Default)]
pub struct ObjectTables {
    pub(crate) images: HashMap<ash::vk::Image, ImageState>,
    pub(crate) image_views: HashMap<ash::vk::ImageView, ImageViewState>,
    pub(crate) buffers: HashMap<ash::vk::Buffer, BufferState>,
    pub(crate) buffer_views: HashMap<ash::vk::BufferView, BufferViewState>,
    pub(crate) samplers: HashMap<ash::vk::Sampler, SamplerState>,
    pub(crate) render_passes: HashMap<ash::vk::RenderPass, RenderPassState>,
    pub(crate) framebuffers: HashMap<ash::vk::Framebuffer, FramebufferState>,
    pub(crate) descriptor_set_layouts:
        HashMap<ash::vk::DescriptorSetLayout, DescriptorSetLayoutState>,
    pub(crate) descriptor_pools: HashMap<ash::vk::DescriptorPool, DescriptorPoolState>,
    pub(crate) descriptor_sets: HashMap<ash::vk::DescriptorSet, DescriptorSetState>,
    pub(crate) update_templates:
        HashMap<ash::vk::DescriptorUpdateTemplate, DescriptorUpdateTemplateState>,
}

impl ObjectTables {
    /// Removes the back-references to `command_buffer` from the objects it `recorded`, when it
    /// is reset or freed.
    pub(crate) fn remove_command_buffer(
        &mut self,
        command_buffer: ash::vk::CommandBuffer,
        recorded: &HashSet<ObjectHandle>,
    ) {
        use ash::vk::{Handle, ObjectType};

        for object in recorded {
            let handle = object.handle;

            match object.object_type {
                ObjectType::IMAGE => {
                    if let Some(image) = self.images.get_mut(&Handle::from_raw(handle)) {
                        image.command_buffers.remove(&command_buffer);
                    }
                }
                ObjectType::IMAGE_VIEW => {
                    if let Some(view) = self.image_views.get_mut(&Handle::from_raw(handle)) {
                        view.command_buffers.remove(&command_buffer);
                    }
                }
                ObjectType::BUFFER => {
                    if let Some(buffer) = self.buffers.get_mut(&Handle::from_raw(handle)) {
                        buffer.command_buffers.remove(&command_buffer);
                    }
                }
                ObjectType::BUFFER_VIEW => {
                    if let Some(view) = self.buffer_views.get_mut(&Handle::from_raw(handle)) {
                        view.command_buffers.remove(&command_buffer);
                    }
                }
                ObjectType::SAMPLER => {
                    if let Some(sampler) = self.samplers.get_mut(&Handle::from_raw(handle)) {
                        sampler.command_buffers.remove(&command_buffer);
                    }
                }
                ObjectType::FRAMEBUFFER => {
                    if let Some(framebuffer) = self.framebuffers.get_mut(&Handle::from_raw(handle))
                    {
                        framebuffer.command_buffers.remove(&command_buffer);
                    }
                }
                ObjectType::DESCRIPTOR_SET => {
                    if let Some(set) = self.descriptor_sets.get_mut(&Handle::from_raw(handle)) {
                        set.remove_command_buffer(command_buffer);
                    }
                }
                _ => (),
            }
        }
    }
}

/// The rule identifiers shared by every `vkCmd*` command.
struct CmdVuids {
    command_buffer: &'static [&'static str],
    recording: &'static [&'static str],
}

macro_rules! cmd_vuids {
    ($command:literal) => {
        CmdVuids {
            command_buffer: &[concat!("VUID-", $command, "-commandBuffer-parameter")],
            recording: &[concat!("VUID-", $command, "-commandBuffer-recording")],
        }
    };
}

/// Marks every command buffer in `bound` invalid, because `object` was destroyed or modified.
fn invalidate_command_buffers<'a>(
    command_buffers: &mut HashMap<ash::vk::CommandBuffer, CommandBufferState>,
    bound: impl IntoIterator<Item = &'a ash::vk::CommandBuffer>,
    object: ObjectHandle,
) {
    let mut secondaries: SmallVec<[ObjectHandle; 4]> = SmallVec::new();

    for command_buffer in bound {
        if let Some(state) = command_buffers.get_mut(command_buffer) {
            tracing::trace!(?command_buffer, %object, "invalidated command buffer");
            state.invalidate(object);

            if state.level() == CommandBufferLevel::Secondary {
                secondaries.push(ObjectHandle::new(*command_buffer));
            }
        }
    }

    // Primaries that execute an invalidated secondary are invalid too.
    if !secondaries.is_empty() {
        for state in command_buffers.values_mut() {
            if secondaries
                .iter()
                .any(|secondary| state.objects.contains(secondary))
            {
                state.invalidate(object);
            }
        }
    }
}

/// Returns whether any command buffer in `bound` is executing.
fn any_in_flight<'a>(
    command_buffers: &HashMap<ash::vk::CommandBuffer, CommandBufferState>,
    bound: impl IntoIterator<Item = &'a ash::vk::CommandBuffer>,
) -> bool {
    bound.into_iter().any(|command_buffer| {
        command_buffers
            .get(command_buffer)
            .is_some_and(CommandBufferState::is_in_flight)
    })
}

fn in_use_error(
    context: &'static str,
    vuids: &'static [&'static str],
) -> Result<(), Box<ValidationError>> {
    Err(Box::new(ValidationError {
        context: context.into(),
        problem: "is in use by a command buffer that has not completed execution".into(),
        vuids,
        ..Default::default()
    }))
}

/// Validates and records the calls made on one logical device.
pub struct DeviceValidator {
    config: ValidationConfig,
    sink: Arc<dyn LogSink>,
    objects: ObjectTables,
    command_buffers: HashMap<ash::vk::CommandBuffer, CommandBufferState>,
    global_image_layouts: GlobalImageLayoutMap,
    image_releases: PendingReleases<ImageTransferBarrier>,
    buffer_releases: PendingReleases<BufferTransferBarrier>,
}

impl DeviceValidator {
    /// Creates a validator that reports to `sink`.
    pub fn new(config: ValidationConfig, sink: Arc<dyn LogSink>) -> Self {
        DeviceValidator {
            config,
            sink,
            objects: ObjectTables::default(),
            command_buffers: HashMap::default(),
            global_image_layouts: GlobalImageLayoutMap::new(),
            image_releases: PendingReleases::default(),
            buffer_releases: PendingReleases::default(),
        }
    }

    /// Creates a validator that reports through `tracing`.
    #[inline]
    pub fn with_tracing(config: ValidationConfig) -> Self {
        Self::new(config, Arc::new(TracingSink))
    }

    #[inline]
    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    #[inline]
    pub fn image(&self, image: ash::vk::Image) -> Option<&ImageState> {
        self.objects.images.get(&image)
    }

    #[inline]
    pub fn image_view(&self, image_view: ash::vk::ImageView) -> Option<&ImageViewState> {
        self.objects.image_views.get(&image_view)
    }

    #[inline]
    pub fn buffer(&self, buffer: ash::vk::Buffer) -> Option<&BufferState> {
        self.objects.buffers.get(&buffer)
    }

    #[inline]
    pub fn descriptor_pool(&self, pool: ash::vk::DescriptorPool) -> Option<&DescriptorPoolState> {
        self.objects.descriptor_pools.get(&pool)
    }

    #[inline]
    pub fn descriptor_set(&self, set: ash::vk::DescriptorSet) -> Option<&DescriptorSetState> {
        self.objects.descriptor_sets.get(&set)
    }

    #[inline]
    pub fn descriptor_set_mut(
        &mut self,
        set: ash::vk::DescriptorSet,
    ) -> Option<&mut DescriptorSetState> {
        self.objects.descriptor_sets.get_mut(&set)
    }

    #[inline]
    pub fn command_buffer(
        &self,
        command_buffer: ash::vk::CommandBuffer,
    ) -> Option<&CommandBufferState> {
        self.command_buffers.get(&command_buffer)
    }

    /// Returns the layouts that submitted command buffers left images in.
    #[inline]
    pub fn global_image_layouts(&self) -> &GlobalImageLayoutMap {
        &self.global_image_layouts
    }

    /// Returns the image ownership releases that were submitted and not yet acquired.
    #[inline]
    pub fn pending_image_releases(&self) -> &PendingReleases<ImageTransferBarrier> {
        &self.image_releases
    }

    /// Returns the buffer ownership releases that were submitted and not yet acquired.
    #[inline]
    pub fn pending_buffer_releases(&self) -> &PendingReleases<BufferTransferBarrier> {
        &self.buffer_releases
    }

    fn emit(&self, report: Report) -> bool {
        report.emit(&*self.sink)
    }

    fn validate_one(&self, object: ObjectHandle, result: Result<(), Box<ValidationError>>) -> bool {
        let mut report = Report::new();
        report.error(object, result);
        self.emit(report)
    }

    fn is_set_in_use(&self, set: &DescriptorSetState) -> bool {
        any_in_flight(&self.command_buffers, &set.command_buffers)
    }

    /* Images */

    pub fn validate_create_image(&self, create_info: &ImageCreateInfo) -> bool {
        let result = create_info
            .validate(&self.config)
            .map_err(|err| err.add_context("create_info"));

        self.validate_one(ObjectHandle::NULL, result)
    }

    pub fn record_create_image(&mut self, image: ash::vk::Image, create_info: ImageCreateInfo) {
        tracing::trace!(image = ?image, "created image");

        self.global_image_layouts
            .insert_image(image, create_info.initial_layout);
        self.objects
            .images
            .insert(image, ImageState::new(image, create_info));
    }

    /// Records the images owned by a newly created swapchain. All of them are created with
    /// `create_info`, in the undefined layout.
    pub fn record_create_swapchain_images(
        &mut self,
        swapchain: ash::vk::SwapchainKHR,
        create_info: &ImageCreateInfo,
        images: &[ash::vk::Image],
        shared_presentable: bool,
    ) {
        for (image_index, &image) in images.iter().enumerate() {
            tracing::trace!(image = ?image, swapchain = ?swapchain, "created swapchain image");

            let state = ImageState::from_swapchain(
                image,
                create_info.clone(),
                swapchain,
                image_index as u32,
                shared_presentable,
            );
            self.global_image_layouts
                .insert_image(image, ImageLayout::Undefined);
            self.objects.images.insert(image, state);
        }
    }

    pub fn validate_destroy_image(&self, image: ash::vk::Image) -> bool {
        let Some(state) = self.objects.images.get(&image) else {
            return false;
        };

        let result = if state.create_from_swapchain.is_some() {
            Err(Box::new(ValidationError {
                context: "image".into(),
                problem: "is owned by a swapchain".into(),
                vuids: &["VUID-vkDestroyImage-image-04882"],
                ..Default::default()
            }))
        } else if any_in_flight(&self.command_buffers, &state.command_buffers) {
            in_use_error("image", &["VUID-vkDestroyImage-image-01000"])
        } else {
            Ok(())
        };

        self.validate_one(ObjectHandle::new(image), result)
    }

    pub fn record_destroy_image(&mut self, image: ash::vk::Image) {
        let Some(state) = self.objects.images.remove(&image) else {
            return;
        };

        tracing::trace!(image = ?image, "destroyed image");

        invalidate_command_buffers(
            &mut self.command_buffers,
            &state.command_buffers,
            ObjectHandle::new(image),
        );
        self.global_image_layouts.remove_image(image);
        self.image_releases.remove_handle(image);
    }

    /// Records the destruction of a swapchain, along with the images it owns.
    pub fn record_destroy_swapchain(&mut self, swapchain: ash::vk::SwapchainKHR) {
        let images: SmallVec<[ash::vk::Image; 4]> = self
            .objects
            .images
            .values()
            .filter(|image| image.create_from_swapchain == Some(swapchain))
            .map(ImageState::handle)
            .collect();

        for image in images {
            self.record_destroy_image(image);
        }
    }

    pub fn validate_bind_image_memory(
        &self,
        image: ash::vk::Image,
        memory: ash::vk::DeviceMemory,
        offset: DeviceSize,
    ) -> bool {
        let result = lookup(
            &self.objects.images,
            image,
            "image",
            &["VUID-vkBindImageMemory-image-parameter"],
        )
        .and_then(|state| {
            state
                .memory
                .clone()
                .bind(
                    MemoryBinding { memory, offset },
                    &["VUID-vkBindImageMemory-image-07460"],
                )
                .map_err(|err| err.add_context("image"))
        });

        self.validate_one(ObjectHandle::new(image), result)
    }

    pub fn record_bind_image_memory(
        &mut self,
        image: ash::vk::Image,
        memory: ash::vk::DeviceMemory,
        offset: DeviceSize,
    ) {
        if let Some(state) = self.objects.images.get_mut(&image) {
            // A rejected bind leaves the bindings unchanged.
            let _ = state.memory.bind(MemoryBinding { memory, offset }, &[]);
        }
    }

    pub fn validate_create_image_view(
        &self,
        image: ash::vk::Image,
        create_info: &ImageViewCreateInfo,
    ) -> bool {
        let result = lookup(
            &self.objects.images,
            image,
            "image",
            &["VUID-VkImageViewCreateInfo-image-parameter"],
        )
        .and_then(|image| {
            create_info
                .validate(image, &self.config)
                .map_err(|err| err.add_context("create_info"))
        });

        self.validate_one(ObjectHandle::new(image), result)
    }

    pub fn record_create_image_view(
        &mut self,
        image_view: ash::vk::ImageView,
        image: ash::vk::Image,
        create_info: &ImageViewCreateInfo,
    ) {
        let Some(image) = self.objects.images.get(&image) else {
            return;
        };

        tracing::trace!(image_view = ?image_view, image = ?image.handle(), "created image view");

        self.objects.image_views.insert(
            image_view,
            ImageViewState::new(image_view, image, create_info),
        );
    }

    pub fn validate_destroy_image_view(&self, image_view: ash::vk::ImageView) -> bool {
        let Some(state) = self.objects.image_views.get(&image_view) else {
            return false;
        };

        let result = if any_in_flight(&self.command_buffers, &state.command_buffers) {
            in_use_error("image_view", &["VUID-vkDestroyImageView-imageView-01026"])
        } else {
            Ok(())
        };

        self.validate_one(ObjectHandle::new(image_view), result)
    }

    pub fn record_destroy_image_view(&mut self, image_view: ash::vk::ImageView) {
        let Some(state) = self.objects.image_views.remove(&image_view) else {
            return;
        };

        tracing::trace!(image_view = ?image_view, "destroyed image view");

        invalidate_command_buffers(
            &mut self.command_buffers,
            &state.command_buffers,
            ObjectHandle::new(image_view),
        );
    }

    /* Buffers */

    pub fn validate_create_buffer(&self, create_info: &BufferCreateInfo) -> bool {
        let result = create_info
            .validate()
            .map_err(|err| err.add_context("create_info"));

        self.validate_one(ObjectHandle::NULL, result)
    }

    pub fn record_create_buffer(&mut self, buffer: ash::vk::Buffer, create_info: BufferCreateInfo) {
        tracing::trace!(buffer = ?buffer, "created buffer");

        self.objects
            .buffers
            .insert(buffer, BufferState::new(buffer, create_info));
    }

    pub fn validate_destroy_buffer(&self, buffer: ash::vk::Buffer) -> bool {
        let Some(state) = self.objects.buffers.get(&buffer) else {
            return false;
        };

        let result = if any_in_flight(&self.command_buffers, &state.command_buffers) {
            in_use_error("buffer", &["VUID-vkDestroyBuffer-buffer-00922"])
        } else {
            Ok(())
        };

        self.validate_one(ObjectHandle::new(buffer), result)
    }

    pub fn record_destroy_buffer(&mut self, buffer: ash::vk::Buffer) {
        let Some(state) = self.objects.buffers.remove(&buffer) else {
            return;
        };

        tracing::trace!(buffer = ?buffer, "destroyed buffer");

        invalidate_command_buffers(
            &mut self.command_buffers,
            &state.command_buffers,
            ObjectHandle::new(buffer),
        );
        self.buffer_releases.remove_handle(buffer);
    }

    pub fn validate_bind_buffer_memory(
        &self,
        buffer: ash::vk::Buffer,
        memory: ash::vk::DeviceMemory,
        offset: DeviceSize,
    ) -> bool {
        let result = lookup(
            &self.objects.buffers,
            buffer,
            "buffer",
            &["VUID-vkBindBufferMemory-buffer-parameter"],
        )
        .and_then(|state| {
            state
                .memory
                .clone()
                .bind(
                    MemoryBinding { memory, offset },
                    &["VUID-vkBindBufferMemory-buffer-07459"],
                )
                .map_err(|err| err.add_context("buffer"))
        });

        self.validate_one(ObjectHandle::new(buffer), result)
    }

    pub fn record_bind_buffer_memory(
        &mut self,
        buffer: ash::vk::Buffer,
        memory: ash::vk::DeviceMemory,
        offset: DeviceSize,
    ) {
        if let Some(state) = self.objects.buffers.get_mut(&buffer) {
            let _ = state.memory.bind(MemoryBinding { memory, offset }, &[]);
        }
    }

    /// Records that `memory` was freed. Images and buffers bound to it are no longer backed, and
    /// the command buffers that use them are invalidated.
    pub fn record_free_memory(&mut self, memory: ash::vk::DeviceMemory) {
        let object = ObjectHandle::new(memory);

        for image in self.objects.images.values_mut() {
            if image
                .memory
                .bindings()
                .iter()
                .any(|binding| binding.memory == memory)
            {
                image.memory.unbind(memory);
                invalidate_command_buffers(
                    &mut self.command_buffers,
                    &image.command_buffers,
                    object,
                );
            }
        }

        for buffer in self.objects.buffers.values_mut() {
            if buffer
                .memory
                .bindings()
                .iter()
                .any(|binding| binding.memory == memory)
            {
                buffer.memory.unbind(memory);
                invalidate_command_buffers(
                    &mut self.command_buffers,
                    &buffer.command_buffers,
                    object,
                );
            }
        }
    }

    pub fn validate_create_buffer_view(
        &self,
        buffer: ash::vk::Buffer,
        create_info: &BufferViewCreateInfo,
    ) -> bool {
        let result = lookup(
            &self.objects.buffers,
            buffer,
            "buffer",
            &["VUID-VkBufferViewCreateInfo-buffer-parameter"],
        )
        .and_then(|buffer| {
            create_info
                .validate(buffer)
                .map_err(|err| err.add_context("create_info"))
        });

        self.validate_one(ObjectHandle::new(buffer), result)
    }

    pub fn record_create_buffer_view(
        &mut self,
        buffer_view: ash::vk::BufferView,
        buffer: ash::vk::Buffer,
        create_info: &BufferViewCreateInfo,
    ) {
        let Some(buffer) = self.objects.buffers.get(&buffer) else {
            return;
        };

        tracing::trace!(?buffer_view, buffer = ?buffer.handle(), "created buffer view");

        self.objects.buffer_views.insert(
            buffer_view,
            BufferViewState::new(buffer_view, buffer, create_info),
        );
    }

    pub fn validate_destroy_buffer_view(&self, buffer_view: ash::vk::BufferView) -> bool {
        let Some(state) = self.objects.buffer_views.get(&buffer_view) else {
            return false;
        };

        let result = if any_in_flight(&self.command_buffers, &state.command_buffers) {
            in_use_error("buffer_view", &["VUID-vkDestroyBufferView-bufferView-00936"])
        } else {
            Ok(())
        };

        self.validate_one(ObjectHandle::new(buffer_view), result)
    }

    pub fn record_destroy_buffer_view(&mut self, buffer_view: ash::vk::BufferView) {
        let Some(state) = self.objects.buffer_views.remove(&buffer_view) else {
            return;
        };

        tracing::trace!(buffer_view = ?buffer_view, "destroyed buffer view");

        invalidate_command_buffers(
            &mut self.command_buffers,
            &state.command_buffers,
            ObjectHandle::new(buffer_view),
        );
    }

    /* Samplers */

    pub fn validate_create_sampler(&self, create_info: &SamplerCreateInfo) -> bool {
        let result = create_info
            .validate(&self.config)
            .map_err(|err| err.add_context("create_info"));

        self.validate_one(ObjectHandle::NULL, result)
    }

    pub fn record_create_sampler(
        &mut self,
        sampler: ash::vk::Sampler,
        create_info: &SamplerCreateInfo,
    ) {
        tracing::trace!(sampler = ?sampler, "created sampler");

        self.objects
            .samplers
            .insert(sampler, SamplerState::new(sampler, create_info));
    }

    pub fn validate_destroy_sampler(&self, sampler: ash::vk::Sampler) -> bool {
        let Some(state) = self.objects.samplers.get(&sampler) else {
            return false;
        };

        let result = if any_in_flight(&self.command_buffers, &state.command_buffers) {
            in_use_error("sampler", &["VUID-vkDestroySampler-sampler-01082"])
        } else {
            Ok(())
        };

        self.validate_one(ObjectHandle::new(sampler), result)
    }

    pub fn record_destroy_sampler(&mut self, sampler: ash::vk::Sampler) {
        let Some(state) = self.objects.samplers.remove(&sampler) else {
            return;
        };

        tracing::trace!(sampler = ?sampler, "destroyed sampler");

        invalidate_command_buffers(
            &mut self.command_buffers,
            &state.command_buffers,
            ObjectHandle::new(sampler),
        );
    }

    /* Render passes and framebuffers */

    pub fn validate_create_render_pass(&self, create_info: &RenderPassCreateInfo) -> bool {
        let result = create_info
            .validate(&self.config)
            .map_err(|err| err.add_context("create_info"));

        self.validate_one(ObjectHandle::NULL, result)
    }

    pub fn record_create_render_pass(
        &mut self,
        render_pass: ash::vk::RenderPass,
        create_info: RenderPassCreateInfo,
    ) {
        tracing::trace!(render_pass = ?render_pass, "created render pass");

        self.objects
            .render_passes
            .insert(render_pass, RenderPassState::new(render_pass, create_info));
    }

    pub fn record_destroy_render_pass(&mut self, render_pass: ash::vk::RenderPass) {
        if self.objects.render_passes.remove(&render_pass).is_some() {
            tracing::trace!(render_pass = ?render_pass, "destroyed render pass");
        }
    }

    pub fn validate_create_framebuffer(&self, create_info: &FramebufferCreateInfo) -> bool {
        let result = lookup(
            &self.objects.render_passes,
            create_info.render_pass,
            "create_info.render_pass",
            &["VUID-VkFramebufferCreateInfo-renderPass-parameter"],
        )
        .and_then(|render_pass| {
            create_info
                .validate(render_pass, &self.objects.image_views, &self.config)
                .map_err(|err| err.add_context("create_info"))
        });

        self.validate_one(ObjectHandle::NULL, result)
    }

    pub fn record_create_framebuffer(
        &mut self,
        framebuffer: ash::vk::Framebuffer,
        create_info: FramebufferCreateInfo,
    ) {
        tracing::trace!(framebuffer = ?framebuffer, "created framebuffer");

        self.objects
            .framebuffers
            .insert(framebuffer, FramebufferState::new(framebuffer, create_info));
    }

    pub fn validate_destroy_framebuffer(&self, framebuffer: ash::vk::Framebuffer) -> bool {
        let Some(state) = self.objects.framebuffers.get(&framebuffer) else {
            return false;
        };

        let result = if any_in_flight(&self.command_buffers, &state.command_buffers) {
            in_use_error("framebuffer", &["VUID-vkDestroyFramebuffer-framebuffer-00892"])
        } else {
            Ok(())
        };

        self.validate_one(ObjectHandle::new(framebuffer), result)
    }

    pub fn record_destroy_framebuffer(&mut self, framebuffer: ash::vk::Framebuffer) {
        let Some(state) = self.objects.framebuffers.remove(&framebuffer) else {
            return;
        };

        tracing::trace!(framebuffer = ?framebuffer, "destroyed framebuffer");

        invalidate_command_buffers(
            &mut self.command_buffers,
            &state.command_buffers,
            ObjectHandle::new(framebuffer),
        );
    }

    /* Descriptor set layouts, pools and sets */

    pub fn validate_create_descriptor_set_layout(
        &self,
        create_info: &DescriptorSetLayoutCreateInfo,
    ) -> bool {
        let result = create_info
            .validate(&self.config, &self.objects.samplers)
            .map_err(|err| err.add_context("create_info"));

        self.validate_one(ObjectHandle::NULL, result)
    }

    pub fn record_create_descriptor_set_layout(
        &mut self,
        layout: ash::vk::DescriptorSetLayout,
        create_info: &DescriptorSetLayoutCreateInfo,
    ) {
        tracing::trace!(layout = ?layout, "created descriptor set layout");

        self.objects
            .descriptor_set_layouts
            .insert(layout, DescriptorSetLayoutState::new(layout, create_info));
    }

    /// Sets that were allocated with the layout keep its definition.
    pub fn record_destroy_descriptor_set_layout(&mut self, layout: ash::vk::DescriptorSetLayout) {
        if self.objects.descriptor_set_layouts.remove(&layout).is_some() {
            tracing::trace!(layout = ?layout, "destroyed descriptor set layout");
        }
    }

    pub fn validate_create_descriptor_pool(&self, create_info: &DescriptorPoolCreateInfo) -> bool {
        let result = create_info
            .validate(&self.config)
            .map_err(|err| err.add_context("create_info"));

        self.validate_one(ObjectHandle::NULL, result)
    }

    pub fn record_create_descriptor_pool(
        &mut self,
        pool: ash::vk::DescriptorPool,
        create_info: DescriptorPoolCreateInfo,
    ) {
        tracing::trace!(pool = ?pool, "created descriptor pool");

        self.objects
            .descriptor_pools
            .insert(pool, DescriptorPoolState::new(pool, create_info));
    }

    fn validate_pool_sets_idle(
        &self,
        pool: ash::vk::DescriptorPool,
        vuids: &'static [&'static str],
    ) -> bool {
        let Some(state) = self.objects.descriptor_pools.get(&pool) else {
            return false;
        };

        let in_use = state.sets().iter().any(|set| {
            self.objects
                .descriptor_sets
                .get(set)
                .is_some_and(|set| self.is_set_in_use(set))
        });
        let result = if in_use {
            Err(Box::new(ValidationError {
                context: "descriptor_pool".into(),
                problem: "has a descriptor set that is in use by a command buffer that has not \
                    completed execution"
                    .into(),
                vuids,
                ..Default::default()
            }))
        } else {
            Ok(())
        };

        self.validate_one(ObjectHandle::new(pool), result)
    }

    pub fn validate_destroy_descriptor_pool(&self, pool: ash::vk::DescriptorPool) -> bool {
        self.validate_pool_sets_idle(pool, &["VUID-vkDestroyDescriptorPool-descriptorPool-00303"])
    }

    pub fn record_destroy_descriptor_pool(&mut self, pool: ash::vk::DescriptorPool) {
        let Some(mut state) = self.objects.descriptor_pools.remove(&pool) else {
            return;
        };

        tracing::trace!(pool = ?pool, "destroyed descriptor pool");

        for set in state.reset() {
            self.remove_descriptor_set(set);
        }
    }

    pub fn validate_reset_descriptor_pool(&self, pool: ash::vk::DescriptorPool) -> bool {
        self.validate_pool_sets_idle(pool, &["VUID-vkResetDescriptorPool-descriptorPool-00313"])
    }

    pub fn record_reset_descriptor_pool(&mut self, pool: ash::vk::DescriptorPool) {
        let Some(state) = self.objects.descriptor_pools.get_mut(&pool) else {
            return;
        };

        for set in state.reset() {
            self.remove_descriptor_set(set);
        }
    }

    fn remove_descriptor_set(&mut self, set: ash::vk::DescriptorSet) {
        let Some(state) = self.objects.descriptor_sets.remove(&set) else {
            return;
        };

        tracing::trace!(set = ?set, "freed descriptor set");

        invalidate_command_buffers(
            &mut self.command_buffers,
            &state.command_buffers,
            ObjectHandle::new(set),
        );
    }

    pub fn validate_allocate_descriptor_sets(
        &self,
        allocate_info: &DescriptorSetAllocateInfo,
    ) -> bool {
        let object = ObjectHandle::new(allocate_info.descriptor_pool);
        let mut report = Report::new();

        if !report.error(object, allocate_info.validate(&self.objects)) {
            report.warning(object, allocate_info.validate_capacity(&self.objects));
        }

        self.emit(report)
    }

    pub fn record_allocate_descriptor_sets(
        &mut self,
        allocate_info: &DescriptorSetAllocateInfo,
        sets: &[ash::vk::DescriptorSet],
    ) {
        let Some(pool) = self
            .objects
            .descriptor_pools
            .get_mut(&allocate_info.descriptor_pool)
        else {
            return;
        };

        for (index, (&set, layout)) in sets.iter().zip(&allocate_info.set_layouts).enumerate() {
            let Some(layout) = self.objects.descriptor_set_layouts.get(layout) else {
                continue;
            };

            tracing::trace!(set = ?set, pool = ?pool.handle(), "allocated descriptor set");

            let state = DescriptorSetState::new(
                set,
                allocate_info.descriptor_pool,
                layout,
                allocate_info.variable_descriptor_count(index),
            );
            pool.allocate(&state);
            self.objects.descriptor_sets.insert(set, state);
        }
    }

    pub fn validate_free_descriptor_sets(
        &self,
        pool: ash::vk::DescriptorPool,
        sets: &[ash::vk::DescriptorSet],
    ) -> bool {
        let object = ObjectHandle::new(pool);
        let mut report = Report::new();

        let pool_state = match lookup(
            &self.objects.descriptor_pools,
            pool,
            "descriptor_pool",
            &["VUID-vkFreeDescriptorSets-descriptorPool-parameter"],
        ) {
            Ok(pool_state) => pool_state,
            Err(err) => {
                report.error(object, Err(err));
                return self.emit(report);
            }
        };

        if !pool_state
            .flags()
            .intersects(DescriptorPoolCreateFlags::FREE_DESCRIPTOR_SET)
        {
            report.error(
                object,
                Err(Box::new(ValidationError {
                    context: "descriptor_pool.flags".into(),
                    problem: "does not contain `DescriptorPoolCreateFlags::FREE_DESCRIPTOR_SET`"
                        .into(),
                    vuids: &["VUID-vkFreeDescriptorSets-descriptorPool-00312"],
                    ..Default::default()
                })),
            );
        }

        for (index, &set) in sets.iter().enumerate() {
            if set == ash::vk::DescriptorSet::null() {
                continue;
            }

            let result = match self.objects.descriptor_sets.get(&set) {
                Some(state) if state.pool() != pool => Err(Box::new(ValidationError {
                    context: format!("descriptor_sets[{}]", index).into(),
                    problem: "was not allocated from `descriptor_pool`".into(),
                    vuids: &["VUID-vkFreeDescriptorSets-pDescriptorSets-parent"],
                    ..Default::default()
                })),
                Some(state) if self.is_set_in_use(state) => Err(Box::new(ValidationError {
                    context: format!("descriptor_sets[{}]", index).into(),
                    problem: "is in use by a command buffer that has not completed execution"
                        .into(),
                    vuids: &["VUID-vkFreeDescriptorSets-pDescriptorSets-00309"],
                    ..Default::default()
                })),
                Some(_) => Ok(()),
                None => Err(Box::new(ValidationError {
                    context: format!("descriptor_sets[{}]", index).into(),
                    problem: "is not a valid descriptor set".into(),
                    vuids: &["VUID-vkFreeDescriptorSets-pDescriptorSets-00310"],
                    ..Default::default()
                })),
            };
            report.error(ObjectHandle::new(set), result);
        }

        self.emit(report)
    }

    pub fn record_free_descriptor_sets(
        &mut self,
        pool: ash::vk::DescriptorPool,
        sets: &[ash::vk::DescriptorSet],
    ) {
        for &set in sets {
            if let (Some(pool), Some(state)) = (
                self.objects.descriptor_pools.get_mut(&pool),
                self.objects.descriptor_sets.get(&set),
            ) {
                pool.free(state);
            }

            self.remove_descriptor_set(set);
        }
    }

    fn validate_writes(&self, writes: &[WriteDescriptorSet], context: &str, report: &mut Report) {
        for (index, write) in writes.iter().enumerate() {
            let result = lookup(
                &self.objects.descriptor_sets,
                write.dst_set,
                "dst_set",
                &["VUID-VkWriteDescriptorSet-dstSet-parameter"],
            )
            .and_then(|set| {
                write.validate(set, self.is_set_in_use(set), &self.objects, &self.config)
            })
            .map_err(|err| err.add_context(format!("{}[{}]", context, index)));

            report.error(ObjectHandle::new(write.dst_set), result);
        }
    }

    pub fn validate_update_descriptor_sets(
        &self,
        descriptor_writes: &[WriteDescriptorSet],
        descriptor_copies: &[CopyDescriptorSet],
    ) -> bool {
        let mut report = Report::new();
        self.validate_writes(descriptor_writes, "descriptor_writes", &mut report);

        for (index, copy) in descriptor_copies.iter().enumerate() {
            let result = lookup(
                &self.objects.descriptor_sets,
                copy.src_set,
                "src_set",
                &["VUID-VkCopyDescriptorSet-srcSet-parameter"],
            )
            .and_then(|src| {
                let dst = lookup(
                    &self.objects.descriptor_sets,
                    copy.dst_set,
                    "dst_set",
                    &["VUID-VkCopyDescriptorSet-dstSet-parameter"],
                )?;

                copy.validate(src, dst, self.is_set_in_use(dst), &self.objects, &self.config)
            })
            .map_err(|err| err.add_context(format!("descriptor_copies[{}]", index)));

            report.error(ObjectHandle::new(copy.dst_set), result);
        }

        self.emit(report)
    }

    pub fn record_update_descriptor_sets(
        &mut self,
        descriptor_writes: &[WriteDescriptorSet],
        descriptor_copies: &[CopyDescriptorSet],
    ) {
        for write in descriptor_writes {
            let Some(set) = self.objects.descriptor_sets.get_mut(&write.dst_set) else {
                continue;
            };

            if set.perform_write(write) {
                invalidate_command_buffers(
                    &mut self.command_buffers,
                    &set.command_buffers,
                    ObjectHandle::new(write.dst_set),
                );
            }
        }

        for copy in descriptor_copies {
            let Some(src) = self
                .objects
                .descriptor_sets
                .get(&copy.src_set)
                .and_then(|src| {
                    let range = src.update_range(
                        copy.src_binding,
                        copy.src_array_element,
                        copy.descriptor_count,
                    )?;

                    Some(src.descriptors()[range].to_vec())
                })
            else {
                continue;
            };

            let Some(dst) = self.objects.descriptor_sets.get_mut(&copy.dst_set) else {
                continue;
            };

            if dst.perform_copy(copy.dst_binding, copy.dst_array_element, &src) {
                invalidate_command_buffers(
                    &mut self.command_buffers,
                    &dst.command_buffers,
                    ObjectHandle::new(copy.dst_set),
                );
            }
        }
    }

    pub fn validate_create_descriptor_update_template(
        &self,
        create_info: &DescriptorUpdateTemplateCreateInfo,
    ) -> bool {
        let result = create_info
            .validate(&self.objects)
            .map_err(|err| err.add_context("create_info"));

        self.validate_one(ObjectHandle::new(create_info.descriptor_set_layout), result)
    }

    pub fn record_create_descriptor_update_template(
        &mut self,
        template: ash::vk::DescriptorUpdateTemplate,
        create_info: DescriptorUpdateTemplateCreateInfo,
    ) {
        let Some(layout) = self
            .objects
            .descriptor_set_layouts
            .get(&create_info.descriptor_set_layout)
        else {
            return;
        };

        tracing::trace!(template = ?template, "created descriptor update template");

        let def = layout.def().clone();
        self.objects.update_templates.insert(
            template,
            DescriptorUpdateTemplateState::new(template, create_info, def),
        );
    }

    pub fn record_destroy_descriptor_update_template(
        &mut self,
        template: ash::vk::DescriptorUpdateTemplate,
    ) {
        if self.objects.update_templates.remove(&template).is_some() {
            tracing::trace!(template = ?template, "destroyed descriptor update template");
        }
    }

    /// Decodes the data of a template update into writes.
    fn template_writes(
        &self,
        set: ash::vk::DescriptorSet,
        template: ash::vk::DescriptorUpdateTemplate,
        data: &[u8],
    ) -> Result<Vec<WriteDescriptorSet>, Box<ValidationError>> {
        let template = lookup(
            &self.objects.update_templates,
            template,
            "descriptor_update_template",
            &["VUID-vkUpdateDescriptorSetWithTemplate-descriptorUpdateTemplate-parameter"],
        )?;

        if template.template_type() != DescriptorUpdateTemplateType::DescriptorSet {
            return Err(Box::new(ValidationError {
                context: "descriptor_update_template".into(),
                problem: "was not created with `DescriptorUpdateTemplateType::DescriptorSet`"
                    .into(),
                vuids: &["VUID-vkUpdateDescriptorSetWithTemplate-descriptorUpdateTemplate-parameter"],
                ..Default::default()
            }));
        }

        template
            .decode(set, data)
            .map_err(|err| err.add_context("data"))
    }

    pub fn validate_update_descriptor_set_with_template(
        &self,
        set: ash::vk::DescriptorSet,
        template: ash::vk::DescriptorUpdateTemplate,
        data: &[u8],
    ) -> bool {
        let mut report = Report::new();

        match self.template_writes(set, template, data) {
            Ok(writes) => self.validate_writes(&writes, "data", &mut report),
            Err(err) => {
                report.error(ObjectHandle::new(set), Err(err));
            }
        }

        self.emit(report)
    }

    pub fn record_update_descriptor_set_with_template(
        &mut self,
        set: ash::vk::DescriptorSet,
        template: ash::vk::DescriptorUpdateTemplate,
        data: &[u8],
    ) {
        if let Ok(writes) = self.template_writes(set, template, data) {
            self.record_update_descriptor_sets(&writes, &[]);
        }
    }

    /* Command buffer lifecycle */

    pub fn record_allocate_command_buffers(
        &mut self,
        pool: ash::vk::CommandPool,
        queue_family_index: u32,
        level: CommandBufferLevel,
        command_buffers: &[ash::vk::CommandBuffer],
    ) {
        for &command_buffer in command_buffers {
            tracing::trace!(?command_buffer, ?pool, "allocated command buffer");

            self.command_buffers.insert(
                command_buffer,
                CommandBufferState::new(command_buffer, pool, queue_family_index, level),
            );
        }
    }

    fn validate_idle_command_buffers<'a>(
        &self,
        command_buffers: impl IntoIterator<Item = &'a ash::vk::CommandBuffer>,
        vuids: &'static [&'static str],
    ) -> bool {
        let mut report = Report::new();

        for command_buffer in command_buffers {
            if any_in_flight(&self.command_buffers, [command_buffer]) {
                report.error(
                    ObjectHandle::new(*command_buffer),
                    in_use_error("command_buffer", vuids),
                );
            }
        }

        self.emit(report)
    }

    /// Forgets what `command_buffer` recorded, and invalidates the primary command buffers that
    /// execute it.
    fn forget_command_buffer(
        &mut self,
        command_buffer: ash::vk::CommandBuffer,
        recorded: &HashSet<ObjectHandle>,
    ) {
        let object = ObjectHandle::new(command_buffer);
        self.objects.remove_command_buffer(command_buffer, recorded);

        for state in self.command_buffers.values_mut() {
            if state.handle() != command_buffer && state.objects.contains(&object) {
                state.invalidate(object);
            }
        }
    }

    pub fn validate_free_command_buffers(
        &self,
        command_buffers: &[ash::vk::CommandBuffer],
    ) -> bool {
        self.validate_idle_command_buffers(
            command_buffers,
            &["VUID-vkFreeCommandBuffers-pCommandBuffers-00047"],
        )
    }

    pub fn record_free_command_buffers(&mut self, command_buffers: &[ash::vk::CommandBuffer]) {
        for &command_buffer in command_buffers {
            if let Some(state) = self.command_buffers.remove(&command_buffer) {
                tracing::trace!(command_buffer = ?command_buffer, "freed command buffer");
                self.forget_command_buffer(command_buffer, &state.objects);
            }
        }
    }

    fn pool_command_buffers(&self, pool: ash::vk::CommandPool) -> Vec<ash::vk::CommandBuffer> {
        self.command_buffers
            .values()
            .filter(|state| state.pool() == pool)
            .map(CommandBufferState::handle)
            .collect()
    }

    pub fn validate_reset_command_pool(&self, pool: ash::vk::CommandPool) -> bool {
        self.validate_idle_command_buffers(
            &self.pool_command_buffers(pool),
            &["VUID-vkResetCommandPool-commandPool-00040"],
        )
    }

    pub fn record_reset_command_pool(&mut self, pool: ash::vk::CommandPool) {
        for command_buffer in self.pool_command_buffers(pool) {
            self.record_reset_command_buffer(command_buffer);
        }
    }

    pub fn validate_destroy_command_pool(&self, pool: ash::vk::CommandPool) -> bool {
        self.validate_idle_command_buffers(
            &self.pool_command_buffers(pool),
            &["VUID-vkDestroyCommandPool-commandPool-00041"],
        )
    }

    pub fn record_destroy_command_pool(&mut self, pool: ash::vk::CommandPool) {
        let command_buffers = self.pool_command_buffers(pool);
        self.record_free_command_buffers(&command_buffers);
    }

    pub fn validate_begin_command_buffer(&self, command_buffer: ash::vk::CommandBuffer) -> bool {
        let result = lookup(
            &self.command_buffers,
            command_buffer,
            "command_buffer",
            &["VUID-vkBeginCommandBuffer-commandBuffer-parameter"],
        )
        .and_then(|state| {
            if state.is_in_flight() || state.state() == RecordingState::Recording {
                return Err(Box::new(ValidationError {
                    context: "command_buffer".into(),
                    problem: "is in the recording or pending state".into(),
                    vuids: &["VUID-vkBeginCommandBuffer-commandBuffer-00049"],
                    ..Default::default()
                }));
            }

            Ok(())
        });

        self.validate_one(ObjectHandle::new(command_buffer), result)
    }

    pub fn record_begin_command_buffer(&mut self, command_buffer: ash::vk::CommandBuffer) {
        let Some(state) = self.command_buffers.get_mut(&command_buffer) else {
            return;
        };

        let recorded = std::mem::take(&mut state.objects);
        self.forget_command_buffer(command_buffer, &recorded);

        if let Some(state) = self.command_buffers.get_mut(&command_buffer) {
            state.begin();
        }
    }

    pub fn validate_end_command_buffer(&self, command_buffer: ash::vk::CommandBuffer) -> bool {
        let result = lookup(
            &self.command_buffers,
            command_buffer,
            "command_buffer",
            &["VUID-vkEndCommandBuffer-commandBuffer-parameter"],
        )
        .and_then(|state| {
            if state.state() != RecordingState::Recording {
                return Err(Box::new(ValidationError {
                    context: "command_buffer".into(),
                    problem: "is not in the recording state".into(),
                    vuids: &["VUID-vkEndCommandBuffer-commandBuffer-00059"],
                    ..Default::default()
                }));
            }

            if state.level() == CommandBufferLevel::Primary && state.render_pass().is_some() {
                return Err(Box::new(ValidationError {
                    context: "command_buffer".into(),
                    problem: "has a render pass instance that was not ended".into(),
                    vuids: &["VUID-vkEndCommandBuffer-commandBuffer-00060"],
                    ..Default::default()
                }));
            }

            Ok(())
        });

        self.validate_one(ObjectHandle::new(command_buffer), result)
    }

    pub fn record_end_command_buffer(&mut self, command_buffer: ash::vk::CommandBuffer) {
        if let Some(state) = self.command_buffers.get_mut(&command_buffer) {
            state.end();
        }
    }

    pub fn validate_reset_command_buffer(&self, command_buffer: ash::vk::CommandBuffer) -> bool {
        self.validate_idle_command_buffers(
            [&command_buffer],
            &["VUID-vkResetCommandBuffer-commandBuffer-00045"],
        )
    }

    pub fn record_reset_command_buffer(&mut self, command_buffer: ash::vk::CommandBuffer) {
        let Some(state) = self.command_buffers.get_mut(&command_buffer) else {
            return;
        };

        let recorded = std::mem::take(&mut state.objects);
        self.forget_command_buffer(command_buffer, &recorded);

        if let Some(state) = self.command_buffers.get_mut(&command_buffer) {
            state.reset();
        }
    }

    /* Commands */

    fn validate_cmd(
        &self,
        command_buffer: ash::vk::CommandBuffer,
        vuids: CmdVuids,
        validate: impl FnOnce(&CommandBufferState, &ObjectTables, &ValidationConfig, &mut Report),
    ) -> bool {
        let object = ObjectHandle::new(command_buffer);
        let mut report = Report::new();

        let state = match lookup(
            &self.command_buffers,
            command_buffer,
            "command_buffer",
            vuids.command_buffer,
        ) {
            Ok(state) => state,
            Err(err) => {
                report.error(object, Err(err));
                return self.emit(report);
            }
        };

        if state.state() != RecordingState::Recording {
            report.error(
                object,
                Err(Box::new(ValidationError {
                    context: "command_buffer".into(),
                    problem: "is not in the recording state".into(),
                    vuids: vuids.recording,
                    ..Default::default()
                })),
            );
        }

        validate(state, &self.objects, &self.config, &mut report);

        self.emit(report)
    }

    fn record_cmd(
        &mut self,
        command_buffer: ash::vk::CommandBuffer,
        record: impl FnOnce(&mut CommandBufferState, &mut ObjectTables, &ValidationConfig),
    ) {
        if let Some(state) = self.command_buffers.get_mut(&command_buffer) {
            record(state, &mut self.objects, &self.config);
        }
    }

    pub fn validate_cmd_pipeline_barrier(
        &self,
        command_buffer: ash::vk::CommandBuffer,
        dependency_info: &DependencyInfo,
    ) -> bool {
        self.validate_cmd(
            command_buffer,
            cmd_vuids!("vkCmdPipelineBarrier"),
            |cb, objects, config, report| dependency_info.validate(cb, objects, config, report),
        )
    }

    pub fn record_cmd_pipeline_barrier(
        &mut self,
        command_buffer: ash::vk::CommandBuffer,
        dependency_info: &DependencyInfo,
    ) {
        self.record_cmd(command_buffer, |cb, objects, _| dependency_info.record(cb, objects));
    }

    pub fn validate_cmd_clear_color_image(
        &self,
        command_buffer: ash::vk::CommandBuffer,
        clear_info: &ClearColorImageInfo,
    ) -> bool {
        self.validate_cmd(
            command_buffer,
            cmd_vuids!("vkCmdClearColorImage"),
            |cb, objects, config, report| clear_info.validate(cb, objects, config, report),
        )
    }

    pub fn record_cmd_clear_color_image(
        &mut self,
        command_buffer: ash::vk::CommandBuffer,
        clear_info: &ClearColorImageInfo,
    ) {
        self.record_cmd(command_buffer, |cb, objects, _| clear_info.record(cb, objects));
    }

    pub fn validate_cmd_clear_depth_stencil_image(
        &self,
        command_buffer: ash::vk::CommandBuffer,
        clear_info: &ClearDepthStencilImageInfo,
    ) -> bool {
        self.validate_cmd(
            command_buffer,
            cmd_vuids!("vkCmdClearDepthStencilImage"),
            |cb, objects, config, report| clear_info.validate(cb, objects, config, report),
        )
    }

    pub fn record_cmd_clear_depth_stencil_image(
        &mut self,
        command_buffer: ash::vk::CommandBuffer,
        clear_info: &ClearDepthStencilImageInfo,
    ) {
        self.record_cmd(command_buffer, |cb, objects, _| clear_info.record(cb, objects));
    }

    pub fn validate_cmd_copy_image(
        &self,
        command_buffer: ash::vk::CommandBuffer,
        copy_image_info: &CopyImageInfo,
    ) -> bool {
        self.validate_cmd(
            command_buffer,
            cmd_vuids!("vkCmdCopyImage"),
            |cb, objects, config, report| copy_image_info.validate(cb, objects, config, report),
        )
    }

    pub fn record_cmd_copy_image(
        &mut self,
        command_buffer: ash::vk::CommandBuffer,
        copy_image_info: &CopyImageInfo,
    ) {
        self.record_cmd(command_buffer, |cb, objects, _| copy_image_info.record(cb, objects));
    }

    pub fn validate_cmd_blit_image(
        &self,
        command_buffer: ash::vk::CommandBuffer,
        blit_image_info: &BlitImageInfo,
    ) -> bool {
        self.validate_cmd(
            command_buffer,
            cmd_vuids!("vkCmdBlitImage"),
            |cb, objects, config, report| blit_image_info.validate(cb, objects, config, report),
        )
    }

    pub fn record_cmd_blit_image(
        &mut self,
        command_buffer: ash::vk::CommandBuffer,
        blit_image_info: &BlitImageInfo,
    ) {
        self.record_cmd(command_buffer, |cb, objects, _| blit_image_info.record(cb, objects));
    }

    pub fn validate_cmd_resolve_image(
        &self,
        command_buffer: ash::vk::CommandBuffer,
        resolve_image_info: &ResolveImageInfo,
    ) -> bool {
        self.validate_cmd(
            command_buffer,
            cmd_vuids!("vkCmdResolveImage"),
            |cb, objects, config, report| resolve_image_info.validate(cb, objects, config, report),
        )
    }

    pub fn record_cmd_resolve_image(
        &mut self,
        command_buffer: ash::vk::CommandBuffer,
        resolve_image_info: &ResolveImageInfo,
    ) {
        self.record_cmd(command_buffer, |cb, objects, _| resolve_image_info.record(cb, objects));
    }

    pub fn validate_cmd_copy_buffer_to_image(
        &self,
        command_buffer: ash::vk::CommandBuffer,
        copy_info: &CopyBufferToImageInfo,
    ) -> bool {
        self.validate_cmd(
            command_buffer,
            cmd_vuids!("vkCmdCopyBufferToImage"),
            |cb, objects, config, report| copy_info.validate(cb, objects, config, report),
        )
    }

    pub fn record_cmd_copy_buffer_to_image(
        &mut self,
        command_buffer: ash::vk::CommandBuffer,
        copy_info: &CopyBufferToImageInfo,
    ) {
        self.record_cmd(command_buffer, |cb, objects, _| copy_info.record(cb, objects));
    }

    pub fn validate_cmd_copy_image_to_buffer(
        &self,
        command_buffer: ash::vk::CommandBuffer,
        copy_info: &CopyImageToBufferInfo,
    ) -> bool {
        self.validate_cmd(
            command_buffer,
            cmd_vuids!("vkCmdCopyImageToBuffer"),
            |cb, objects, config, report| copy_info.validate(cb, objects, config, report),
        )
    }

    pub fn record_cmd_copy_image_to_buffer(
        &mut self,
        command_buffer: ash::vk::CommandBuffer,
        copy_info: &CopyImageToBufferInfo,
    ) {
        self.record_cmd(command_buffer, |cb, objects, _| copy_info.record(cb, objects));
    }

    pub fn validate_cmd_begin_render_pass(
        &self,
        command_buffer: ash::vk::CommandBuffer,
        begin_info: &RenderPassBeginInfo,
    ) -> bool {
        self.validate_cmd(
            command_buffer,
            cmd_vuids!("vkCmdBeginRenderPass"),
            |cb, objects, config, report| begin_info.validate(cb, objects, config, report),
        )
    }

    pub fn record_cmd_begin_render_pass(
        &mut self,
        command_buffer: ash::vk::CommandBuffer,
        begin_info: &RenderPassBeginInfo,
    ) {
        self.record_cmd(command_buffer, |cb, objects, _| begin_info.record(cb, objects));
    }

    pub fn validate_cmd_next_subpass(&self, command_buffer: ash::vk::CommandBuffer) -> bool {
        self.validate_cmd(
            command_buffer,
            cmd_vuids!("vkCmdNextSubpass"),
            |cb, objects, _, report| validate_next_subpass(cb, objects, report),
        )
    }

    pub fn record_cmd_next_subpass(&mut self, command_buffer: ash::vk::CommandBuffer) {
        self.record_cmd(command_buffer, |cb, objects, _| record_next_subpass(cb, objects));
    }

    pub fn validate_cmd_end_render_pass(&self, command_buffer: ash::vk::CommandBuffer) -> bool {
        self.validate_cmd(
            command_buffer,
            cmd_vuids!("vkCmdEndRenderPass"),
            |cb, objects, _, report| validate_end_render_pass(cb, objects, report),
        )
    }

    pub fn record_cmd_end_render_pass(&mut self, command_buffer: ash::vk::CommandBuffer) {
        self.record_cmd(command_buffer, |cb, objects, _| record_end_render_pass(cb, objects));
    }

    pub fn validate_cmd_bind_descriptor_sets(
        &self,
        command_buffer: ash::vk::CommandBuffer,
        bind_info: &BindDescriptorSetsInfo,
    ) -> bool {
        self.validate_cmd(
            command_buffer,
            cmd_vuids!("vkCmdBindDescriptorSets"),
            |cb, objects, config, report| bind_info.validate(cb, objects, config, report),
        )
    }

    pub fn record_cmd_bind_descriptor_sets(
        &mut self,
        command_buffer: ash::vk::CommandBuffer,
        bind_info: &BindDescriptorSetsInfo,
    ) {
        self.record_cmd(command_buffer, |cb, objects, _| bind_info.record(cb, objects));
    }

    pub fn validate_cmd_push_descriptor_set(
        &self,
        command_buffer: ash::vk::CommandBuffer,
        push_info: &PushDescriptorSetInfo,
    ) -> bool {
        self.validate_cmd(
            command_buffer,
            cmd_vuids!("vkCmdPushDescriptorSetKHR"),
            |cb, objects, config, report| push_info.validate(cb, objects, config, report),
        )
    }

    pub fn record_cmd_push_descriptor_set(
        &mut self,
        command_buffer: ash::vk::CommandBuffer,
        push_info: &PushDescriptorSetInfo,
    ) {
        self.record_cmd(command_buffer, |cb, objects, _| push_info.record(cb, objects));
    }

    fn push_template_info(
        &self,
        template: ash::vk::DescriptorUpdateTemplate,
        data: &[u8],
    ) -> Result<PushDescriptorSetInfo, Box<ValidationError>> {
        let template = lookup(
            &self.objects.update_templates,
            template,
            "descriptor_update_template",
            &["VUID-vkCmdPushDescriptorSetWithTemplateKHR-descriptorUpdateTemplate-parameter"],
        )?;

        PushDescriptorSetInfo::from_template(template, data)
    }

    pub fn validate_cmd_push_descriptor_set_with_template(
        &self,
        command_buffer: ash::vk::CommandBuffer,
        template: ash::vk::DescriptorUpdateTemplate,
        data: &[u8],
    ) -> bool {
        self.validate_cmd(
            command_buffer,
            cmd_vuids!("vkCmdPushDescriptorSetWithTemplateKHR"),
            |cb, objects, config, report| match self.push_template_info(template, data) {
                Ok(push_info) => push_info.validate(cb, objects, config, report),
                Err(err) => {
                    report.error(ObjectHandle::new(cb.handle()), Err(err));
                }
            },
        )
    }

    pub fn record_cmd_push_descriptor_set_with_template(
        &mut self,
        command_buffer: ash::vk::CommandBuffer,
        template: ash::vk::DescriptorUpdateTemplate,
        data: &[u8],
    ) {
        if let Ok(push_info) = self.push_template_info(template, data) {
            self.record_cmd_push_descriptor_set(command_buffer, &push_info);
        }
    }

    /// Validates the descriptors that a draw or dispatch accesses. The bind point of
    /// `draw_info` decides which of the two it is.
    pub fn validate_cmd_draw(
        &self,
        command_buffer: ash::vk::CommandBuffer,
        draw_info: &DrawInfo,
    ) -> bool {
        self.validate_cmd(
            command_buffer,
            cmd_vuids!("vkCmdDraw"),
            |cb, objects, config, report| draw_info.validate(cb, objects, config, report),
        )
    }

    pub fn record_cmd_draw(
        &mut self,
        command_buffer: ash::vk::CommandBuffer,
        draw_info: &DrawInfo,
    ) {
        self.record_cmd(command_buffer, |cb, objects, config| {
            draw_info.record(cb, objects, config)
        });
    }

    pub fn validate_cmd_execute_commands(
        &self,
        command_buffer: ash::vk::CommandBuffer,
        secondaries: &[ash::vk::CommandBuffer],
    ) -> bool {
        self.validate_cmd(
            command_buffer,
            cmd_vuids!("vkCmdExecuteCommands"),
            |cb, _, _, report| {
                let object = ObjectHandle::new(cb.handle());

                if cb.level() != CommandBufferLevel::Primary {
                    report.error(
                        object,
                        Err(Box::new(ValidationError {
                            context: "command_buffer".into(),
                            problem: "is not a primary command buffer".into(),
                            vuids: &["VUID-vkCmdExecuteCommands-bufferlevel"],
                            ..Default::default()
                        })),
                    );
                }

                for (index, &secondary) in secondaries.iter().enumerate() {
                    let result = lookup(
                        &self.command_buffers,
                        secondary,
                        format!("command_buffers[{}]", index),
                        &["VUID-vkCmdExecuteCommands-pCommandBuffers-parameter"],
                    )
                    .and_then(|state| {
                        if state.level() != CommandBufferLevel::Secondary {
                            return Err(Box::new(ValidationError {
                                context: format!("command_buffers[{}]", index).into(),
                                problem: "is not a secondary command buffer".into(),
                                vuids: &["VUID-vkCmdExecuteCommands-pCommandBuffers-00088"],
                                ..Default::default()
                            }));
                        }

                        if state.state() != RecordingState::Executable {
                            return Err(Box::new(ValidationError {
                                context: format!("command_buffers[{}]", index).into(),
                                problem: "is not in the executable state".into(),
                                vuids: &["VUID-vkCmdExecuteCommands-pCommandBuffers-00089"],
                                ..Default::default()
                            }));
                        }

                        Ok(())
                    });

                    report.error(object, result);
                }
            },
        )
    }

    pub fn record_cmd_execute_commands(
        &mut self,
        command_buffer: ash::vk::CommandBuffer,
        secondaries: &[ash::vk::CommandBuffer],
    ) {
        let Some(mut primary) = self.command_buffers.remove(&command_buffer) else {
            return;
        };

        for secondary in secondaries {
            if let Some(secondary) = self.command_buffers.get(secondary) {
                primary.execute_secondary(secondary);
            }
        }

        self.command_buffers.insert(command_buffer, primary);
    }

    /* Queue submission */

    /// Validates a batch of command buffers submitted together, in submission order.
    ///
    /// The layouts each command buffer expects are checked against those left by the command
    /// buffers before it in the batch, then against the device-global layouts. Ownership
    /// acquires must match a release that was submitted earlier.
    pub fn validate_queue_submit(&self, command_buffers: &[ash::vk::CommandBuffer]) -> bool {
        let mut report = Report::new();
        let mut overlay = LayoutOverlay::default();
        let mut scoreboards = SubmitScoreboards::default();

        for (index, &command_buffer) in command_buffers.iter().enumerate() {
            let object = ObjectHandle::new(command_buffer);

            let state = match lookup(
                &self.command_buffers,
                command_buffer,
                format!("command_buffers[{}]", index),
                &["VUID-VkSubmitInfo-pCommandBuffers-parameter"],
            ) {
                Ok(state) => state,
                Err(err) => {
                    report.error(object, Err(err));
                    continue;
                }
            };

            if state.level() != CommandBufferLevel::Primary {
                report.error(
                    object,
                    Err(Box::new(ValidationError {
                        context: format!("command_buffers[{}]", index).into(),
                        problem: "is not a primary command buffer".into(),
                        vuids: &["VUID-VkSubmitInfo-pCommandBuffers-00075"],
                        ..Default::default()
                    })),
                );
            }

            if !self.config.disabled.command_buffer_state {
                report.error(object, validate_submit_state(state, index));
            }

            if !self.config.disabled.image_layout_validation {
                for (image, error) in self.global_image_layouts.validate_command_buffer(
                    &overlay,
                    state.image_layouts.iter(),
                    &self.objects.images,
                ) {
                    report.error(ObjectHandle::new(image), Err(error));
                }

                overlay.record(state.image_layouts.iter());
            }

            for (severity, error) in self.image_releases.validate_command_buffer(
                command_buffer,
                &state.qfo_transfers.images,
                &mut scoreboards.images,
            ) {
                report.push(severity, object, error);
            }

            for (severity, error) in self.buffer_releases.validate_command_buffer(
                command_buffer,
                &state.qfo_transfers.buffers,
                &mut scoreboards.buffers,
            ) {
                report.push(severity, object, error);
            }
        }

        self.emit(report)
    }

    /// Records a batch of submitted command buffers. Their layouts become the device-global
    /// layouts, their releases become pending, and they are in flight until
    /// [`record_command_buffers_completed`](Self::record_command_buffers_completed).
    pub fn record_queue_submit(&mut self, command_buffers: &[ash::vk::CommandBuffer]) {
        for command_buffer in command_buffers {
            let Some(state) = self.command_buffers.get_mut(command_buffer) else {
                continue;
            };

            if !self.config.disabled.image_layout_validation {
                self.global_image_layouts
                    .record_command_buffer(state.image_layouts.iter());
            }

            self.image_releases
                .record_command_buffer(&state.qfo_transfers.images);
            self.buffer_releases
                .record_command_buffer(&state.qfo_transfers.buffers);

            tracing::trace!(command_buffer = ?command_buffer, "submitted command buffer");
            state.mark_submitted();
        }
    }

    /// Records that the given submitted command buffers finished executing, as observed through
    /// a fence or a queue wait.
    pub fn record_command_buffers_completed(&mut self, command_buffers: &[ash::vk::CommandBuffer]) {
        for command_buffer in command_buffers {
            if let Some(state) = self.command_buffers.get_mut(command_buffer) {
                state.mark_completed();
            }
        }
    }
}

fn validate_submit_state(
    state: &CommandBufferState,
    index: usize,
) -> Result<(), Box<ValidationError>> {
    match state.state() {
        RecordingState::Executable => Ok(()),
        RecordingState::Invalid => {
            let broken: Vec<String> = state
                .broken_bindings()
                .iter()
                .map(ToString::to_string)
                .collect();

            Err(Box::new(ValidationError {
                context: format!("command_buffers[{}]", index).into(),
                problem: format!(
                    "is invalid, because the following objects it uses were destroyed or \
                    modified: {}",
                    broken.join(", "),
                )
                .into(),
                vuids: &["VUID-vkQueueSubmit-pCommandBuffers-00070"],
                ..Default::default()
            }))
        }
        RecordingState::Initial | RecordingState::Recording => Err(Box::new(ValidationError {
            context: format!("command_buffers[{}]", index).into(),
            problem: "is not in the executable state".into(),
            vuids: &["VUID-vkQueueSubmit-pCommandBuffers-00072"],
            ..Default::default()
        })),
    }
}

/// A [`DeviceValidator`] behind the device-level lock.
///
/// Every entry point of the validator must be called with the lock held.
pub struct SharedDeviceValidator {
    inner: Mutex<DeviceValidator>,
}

impl SharedDeviceValidator {
    #[inline]
    pub fn new(validator: DeviceValidator) -> Self {
        SharedDeviceValidator {
            inner: Mutex::new(validator),
        }
    }

    #[inline]
    pub fn lock(&self) -> MutexGuard<'_, DeviceValidator> {
        self.inner.lock()
    }

    #[inline]
    pub fn into_inner(self) -> DeviceValidator {
        self.inner.into_inner()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ash::vk::Handle;
    use crate::{
        buffer::BufferUsage,
        image::{ImageAspects, ImageSubresourceRange},
        sync::{BufferMemoryBarrier, ImageMemoryBarrier},
        tests_util::{test_validator, test_validator_with, ColorImage},
        Severity,
    };

    fn transition(
        image: ash::vk::Image,
        old_layout: ImageLayout,
        new_layout: ImageLayout,
    ) -> DependencyInfo {
        let mut barrier =
            ImageMemoryBarrier::image(image, ImageSubresourceRange::whole(ImageAspects::COLOR));
        barrier.old_layout = old_layout;
        barrier.new_layout = new_layout;

        DependencyInfo {
            image_memory_barriers: smallvec::smallvec![barrier],
            ..Default::default()
        }
    }

    #[test]
    fn acquire_without_release() {
        let (mut validator, sink) = test_validator();
        let buffer =
            validator.test_buffer(64, BufferUsage::TRANSFER_SRC | BufferUsage::TRANSFER_DST);
        let cb = validator.test_command_buffer(2);

        let mut barrier = BufferMemoryBarrier::buffer(buffer);
        barrier.src_queue_family_index = 1;
        barrier.dst_queue_family_index = 2;
        let dependency_info = DependencyInfo {
            buffer_memory_barriers: smallvec::smallvec![barrier],
            ..Default::default()
        };
        validator.record_cmd_pipeline_barrier(cb, &dependency_info);
        validator.record_end_command_buffer(cb);

        assert!(validator.validate_queue_submit(&[cb]));
        let messages = sink.take();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].severity, Severity::Error);
        assert_eq!(messages[0].vuid, "UNASSIGNED-VkBufferMemoryBarrier-buffer-00004");
    }

    #[test]
    fn release_then_acquire() {
        let (mut validator, sink) = test_validator();
        let buffer =
            validator.test_buffer(64, BufferUsage::TRANSFER_SRC | BufferUsage::TRANSFER_DST);

        let mut barrier = BufferMemoryBarrier::buffer(buffer);
        barrier.src_queue_family_index = 1;
        barrier.dst_queue_family_index = 2;
        let dependency_info = DependencyInfo {
            buffer_memory_barriers: smallvec::smallvec![barrier],
            ..Default::default()
        };

        let release = validator.test_command_buffer(1);
        validator.record_cmd_pipeline_barrier(release, &dependency_info);
        validator.record_end_command_buffer(release);
        assert!(!validator.validate_queue_submit(&[release]));
        validator.record_queue_submit(&[release]);
        assert_eq!(validator.pending_buffer_releases().len(), 1);

        // Submitting the release again duplicates it.
        assert!(!validator.validate_queue_submit(&[release]));
        assert!(sink.contains_vuid("UNASSIGNED-VkBufferMemoryBarrier-buffer-00003"));
        sink.take();

        let acquire = validator.test_command_buffer(2);
        validator.record_cmd_pipeline_barrier(acquire, &dependency_info);
        validator.record_end_command_buffer(acquire);
        assert!(!validator.validate_queue_submit(&[acquire]));
        assert!(sink.take().is_empty());
        validator.record_queue_submit(&[acquire]);
        assert!(validator.pending_buffer_releases().is_empty());
    }

    #[test]
    fn layout_mismatch_at_submit() {
        let (mut validator, sink) = test_validator();
        let image = validator.test_image(ColorImage::transfer(8, 8));

        let first = validator.test_command_buffer(0);
        validator.record_cmd_pipeline_barrier(
            first,
            &transition(image, ImageLayout::Undefined, ImageLayout::TransferDstOptimal),
        );
        validator.record_end_command_buffer(first);

        let second = validator.test_command_buffer(0);
        validator.record_cmd_pipeline_barrier(
            second,
            &transition(image, ImageLayout::TransferSrcOptimal, ImageLayout::General),
        );
        validator.record_end_command_buffer(second);

        // The second command buffer expects a layout the first does not leave behind.
        assert!(validator.validate_queue_submit(&[first, second]));
        assert_eq!(sink.take().len(), 1);

        // In the right order, across two submissions, the layouts match.
        let third = validator.test_command_buffer(0);
        validator.record_cmd_pipeline_barrier(
            third,
            &transition(image, ImageLayout::TransferDstOptimal, ImageLayout::TransferSrcOptimal),
        );
        validator.record_end_command_buffer(third);

        assert!(!validator.validate_queue_submit(&[first]));
        validator.record_queue_submit(&[first]);
        assert!(!validator.validate_queue_submit(&[third, second]));
        assert!(sink.take().is_empty());
    }

    #[test]
    fn layout_checks_can_be_disabled() {
        let mut config = ValidationConfig::default();
        config.disabled.image_layout_validation = true;
        let (mut validator, sink) = test_validator_with(config);
        let image = validator.test_image(ColorImage::transfer(8, 8));

        let cb = validator.test_command_buffer(0);
        validator.record_cmd_pipeline_barrier(
            cb,
            &transition(image, ImageLayout::TransferSrcOptimal, ImageLayout::General),
        );
        validator.record_end_command_buffer(cb);

        assert!(!validator.validate_queue_submit(&[cb]));
        assert!(sink.take().is_empty());
    }

    #[test]
    fn destroyed_image_invalidates_command_buffer() {
        let (mut validator, sink) = test_validator();
        let image = validator.test_image(ColorImage::transfer(8, 8));
        let cb = validator.test_command_buffer(0);

        validator.record_cmd_pipeline_barrier(
            cb,
            &transition(image, ImageLayout::Undefined, ImageLayout::TransferDstOptimal),
        );
        validator.record_end_command_buffer(cb);

        assert!(!validator.validate_destroy_image(image));
        validator.record_destroy_image(image);

        let state = validator.command_buffer(cb).unwrap();
        assert_eq!(state.state(), RecordingState::Invalid);
        assert_eq!(state.broken_bindings(), &[ObjectHandle::new(image)]);
        assert!(!validator.global_image_layouts().contains_image(image));

        assert!(validator.validate_queue_submit(&[cb]));
        assert!(sink.contains_vuid("VUID-vkQueueSubmit-pCommandBuffers-00070"));
    }

    #[test]
    fn reset_releases_back_references() {
        let (mut validator, _sink) = test_validator();
        let image = validator.test_image(ColorImage::transfer(8, 8));
        let other = validator.test_image(ColorImage::transfer(8, 8));
        let cb = validator.test_command_buffer(0);
        let kept = validator.test_command_buffer(0);

        let dependency_info =
            transition(image, ImageLayout::Undefined, ImageLayout::TransferDstOptimal);
        validator.record_cmd_pipeline_barrier(cb, &dependency_info);
        validator.record_cmd_pipeline_barrier(kept, &dependency_info);
        validator.record_cmd_pipeline_barrier(
            cb,
            &transition(other, ImageLayout::Undefined, ImageLayout::TransferDstOptimal),
        );
        assert!(validator.image(image).unwrap().command_buffers.contains(&cb));

        validator.record_reset_command_buffer(cb);
        assert!(!validator.image(image).unwrap().command_buffers.contains(&cb));
        assert!(!validator.image(other).unwrap().command_buffers.contains(&cb));
        assert!(validator.image(image).unwrap().command_buffers.contains(&kept));

        // The reset command buffer no longer depends on the image.
        validator.record_begin_command_buffer(cb);
        validator.record_destroy_image(other);
        assert_eq!(
            validator.command_buffer(cb).unwrap().state(),
            RecordingState::Recording,
        );

        validator.record_free_command_buffers(&[kept]);
        assert!(validator.image(image).unwrap().command_buffers.is_empty());
    }

    #[test]
    fn destroyed_image_invalidates_executing_primary() {
        let (mut validator, _sink) = test_validator();
        let image = validator.test_image(ColorImage::transfer(8, 8));
        let primary = validator.test_command_buffer(0);

        let secondary = ash::vk::CommandBuffer::from_raw(0x904);
        validator.record_allocate_command_buffers(
            ash::vk::CommandPool::from_raw(0x905),
            0,
            CommandBufferLevel::Secondary,
            &[secondary],
        );
        validator.record_begin_command_buffer(secondary);
        validator.record_cmd_pipeline_barrier(
            secondary,
            &transition(image, ImageLayout::Undefined, ImageLayout::TransferDstOptimal),
        );
        validator.record_end_command_buffer(secondary);
        validator.record_cmd_execute_commands(primary, &[secondary]);
        validator.record_end_command_buffer(primary);

        validator.record_destroy_image(image);

        for command_buffer in [secondary, primary] {
            let state = validator.command_buffer(command_buffer).unwrap();
            assert_eq!(state.state(), RecordingState::Invalid);
            assert!(state.broken_bindings().contains(&ObjectHandle::new(image)));
        }
    }

    #[test]
    fn invalid_submit_can_be_disabled() {
        let mut config = ValidationConfig::default();
        config.disabled.command_buffer_state = true;
        let (mut validator, sink) = test_validator_with(config);
        let cb = validator.test_command_buffer(0);

        // Still recording.
        assert!(!validator.validate_queue_submit(&[cb]));
        assert!(sink.take().is_empty());
    }

    #[test]
    fn destroy_in_use() {
        let (mut validator, sink) = test_validator();
        let image = validator.test_image(ColorImage::transfer(8, 8));
        let cb = validator.test_command_buffer(0);

        validator.record_cmd_pipeline_barrier(
            cb,
            &transition(image, ImageLayout::Undefined, ImageLayout::TransferDstOptimal),
        );
        validator.record_end_command_buffer(cb);
        validator.record_queue_submit(&[cb]);

        assert!(validator.validate_destroy_image(image));
        assert!(sink.contains_vuid("VUID-vkDestroyImage-image-01000"));
        assert!(validator.validate_reset_command_buffer(cb));
        assert!(validator.validate_begin_command_buffer(cb));

        validator.record_command_buffers_completed(&[cb]);
        sink.take();
        assert!(!validator.validate_destroy_image(image));
        assert!(!validator.validate_reset_command_buffer(cb));
        assert!(sink.take().is_empty());
    }

    #[test]
    fn commands_require_recording() {
        let (mut validator, sink) = test_validator();
        let image = validator.test_image(ColorImage::transfer(8, 8));
        let cb = validator.test_command_buffer(0);
        validator.record_end_command_buffer(cb);

        let dependency_info =
            transition(image, ImageLayout::Undefined, ImageLayout::TransferDstOptimal);
        assert!(validator.validate_cmd_pipeline_barrier(cb, &dependency_info));
        assert!(sink.contains_vuid("VUID-vkCmdPipelineBarrier-commandBuffer-recording"));

        let unknown = ash::vk::CommandBuffer::from_raw(0x900);
        assert!(validator.validate_cmd_pipeline_barrier(unknown, &dependency_info));
        assert!(sink.contains_vuid("VUID-vkCmdPipelineBarrier-commandBuffer-parameter"));
    }

    #[test]
    fn bind_memory_once() {
        let (mut validator, sink) = test_validator();
        let image = validator.test_image(ColorImage::transfer(8, 8));

        // Test images are already bound.
        let memory = ash::vk::DeviceMemory::from_raw(0x901);
        assert!(validator.validate_bind_image_memory(image, memory, 0));
        assert!(sink.contains_vuid("VUID-vkBindImageMemory-image-07460"));
    }

    #[test]
    fn execute_secondary() {
        let (mut validator, sink) = test_validator();
        let image = validator.test_image(ColorImage::transfer(8, 8));
        let primary = validator.test_command_buffer(0);

        let secondary = ash::vk::CommandBuffer::from_raw(0x902);
        validator.record_allocate_command_buffers(
            ash::vk::CommandPool::from_raw(0x903),
            0,
            CommandBufferLevel::Secondary,
            &[secondary],
        );
        validator.record_begin_command_buffer(secondary);
        validator.record_cmd_pipeline_barrier(
            secondary,
            &transition(image, ImageLayout::Undefined, ImageLayout::TransferDstOptimal),
        );

        assert!(validator.validate_cmd_execute_commands(primary, &[secondary]));
        assert!(sink.contains_vuid("VUID-vkCmdExecuteCommands-pCommandBuffers-00089"));

        validator.record_end_command_buffer(secondary);
        sink.take();
        assert!(!validator.validate_cmd_execute_commands(primary, &[secondary]));
        validator.record_cmd_execute_commands(primary, &[secondary]);

        let map = validator
            .command_buffer(primary)
            .unwrap()
            .image_layout_map(image)
            .unwrap();
        assert_eq!(
            map.layout(crate::image::ImageSubresource {
                aspects: ImageAspects::COLOR,
                mip_level: 0,
                array_layer: 0,
            }),
            Some(ImageLayout::TransferDstOptimal),
        );

        // Resetting the secondary invalidates the primary that executes it.
        validator.record_reset_command_buffer(secondary);
        assert_eq!(
            validator.command_buffer(primary).unwrap().state(),
            RecordingState::Invalid,
        );
    }

    #[test]
    fn shared_validator() {
        let (validator, _) = test_validator();
        let shared = SharedDeviceValidator::new(validator);
        let cb = shared.lock().test_command_buffer(0);

        assert_eq!(
            shared.lock().command_buffer(cb).unwrap().state(),
            RecordingState::Recording,
        );
    }
}
