// Copyright (c) 2016 The vulkano developers
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or https://opensource.org/licenses/MIT>,
// at your option. All files in the project carrying such
// notice may not be copied, modified, or distributed except
// according to those terms.

//! Image layout, queue family ownership and descriptor set validation for Vulkan.
//!
//! This crate is the state-tracking core of a Vulkan validation layer. It does not call into
//! Vulkan itself: the surrounding layer forwards the parameters of each intercepted call, and
//! the core records state and reports misuse.
//!
//! # Brief summary
//!
//! - The [`DeviceValidator`](crate::validator::DeviceValidator) holds all the state tracked for
//!   one logical device: images, buffers, views, samplers, descriptor set layouts, descriptor
//!   sets, render passes, framebuffers and command buffers.
//!
//! - Every host call has a `validate_*` entry point that returns a *skip* boolean (`true` means
//!   the call should not be forwarded to the driver), and a `record_*` entry point that updates
//!   the tracked state after the call was forwarded.
//!
//! - Each [command buffer](crate::command_buffer) keeps a per-image
//!   [layout map](crate::command_buffer::image_layout) of the layouts it expects on entry and
//!   the layouts it leaves behind. These are reconciled against the device-global layout map on
//!   queue submission.
//!
//! - [Queue family ownership transfers](crate::command_buffer::qfo) are matched across command
//!   buffers and submissions, so that every acquire has a queued release.
//!
//! - [Descriptor set layouts](crate::descriptor_set::layout) are canonicalized process-wide,
//!   and [descriptor sets](crate::descriptor_set) track typed descriptor state, validate write
//!   and copy updates, and validate bound descriptors at draw time.
//!
//! Problems are reported through a [`LogSink`], which defaults to [`TracingSink`].

pub use ash::vk::Handle;
use parking_lot::Mutex;
use smallvec::SmallVec;
use std::{
    borrow::Cow,
    error::Error,
    fmt::{Display, Error as FmtError, Formatter},
};

mod macros;
pub mod buffer;
pub mod command_buffer;
pub mod config;
pub mod descriptor_set;
pub mod format;
pub mod image;
pub mod memory;
pub mod render_pass;
pub mod sampler;
pub mod sync;
#[cfg(test)]
mod tests_util;
pub mod validator;

/// Represents memory size and offset values on a Vulkan device.
/// Analogous to the Rust `usize` type on the host.
pub use ash::vk::DeviceSize;

/// Special value for `DeviceSize` ranges, meaning "until the end of the resource".
pub const WHOLE_SIZE: DeviceSize = ash::vk::WHOLE_SIZE;

/// A helper type for non-exhaustive structs.
///
/// This type cannot be constructed outside this crate. Structures with a field of this type can
/// only be constructed by calling a constructor function or `Default::default()`. The effect is
/// similar to the standard Rust `#[non_exhaustive]` attribute, except that it does not prevent
/// update syntax from being used.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)] // add traits as needed
pub struct NonExhaustive(pub(crate) ());

/// A validation rule was violated.
#[derive(Clone, Debug, Default)]
pub struct ValidationError {
    /// The context in which the problem exists (e.g. a specific parameter).
    pub context: Cow<'static, str>,

    /// A description of the problem.
    pub problem: Cow<'static, str>,

    /// If applicable, settings that the user could enable to avoid the problem in the future.
    pub requires_one_of: RequiresOneOf,

    /// *Valid Usage IDs* (VUIDs) in the Vulkan specification that relate to the problem.
    pub vuids: &'static [&'static str],
}

impl ValidationError {
    pub(crate) fn add_context(
        mut self: Box<Self>,
        context: impl Into<Cow<'static, str>>,
    ) -> Box<Self> {
        if self.context.is_empty() {
            self.context = context.into();
        } else {
            self.context = format!("{}.{}", context.into(), self.context).into();
        }

        self
    }

    pub(crate) fn set_vuids(mut self: Box<Self>, vuids: &'static [&'static str]) -> Box<Self> {
        self.vuids = vuids;
        self
    }

    /// Returns the first VUID, which is used as the message identifier when logging.
    #[inline]
    pub fn vuid(&self) -> &'static str {
        self.vuids.first().copied().unwrap_or("UNASSIGNED-CoreValidation")
    }
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), FmtError> {
        if self.context.is_empty() {
            write!(f, "{}", self.problem)?;
        } else {
            write!(f, "{}: {}", self.context, self.problem)?;
        }

        if !self.requires_one_of.is_empty() {
            if self.context.is_empty() && self.problem.is_empty() {
                write!(f, "{}", self.requires_one_of)?;
            } else {
                write!(f, " -- {}", self.requires_one_of)?;
            }
        }

        if let Some((first, rest)) = self.vuids.split_first() {
            write!(f, " (Vulkan VUIDs: {}", first)?;

            for vuid in rest {
                write!(f, ", {}", vuid)?;
            }

            write!(f, ")")?;
        }

        Ok(())
    }
}

impl Error for ValidationError {}

/// Used in errors to indicate a set of alternatives that needs to be available/enabled to allow
/// a given operation.
#[derive(Clone, Copy, Default, PartialEq, Eq)]
pub struct RequiresOneOf(pub &'static [RequiresAllOf]);

impl RequiresOneOf {
    /// Returns the number of alternatives.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns whether there are any alternatives.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Debug for RequiresOneOf {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), FmtError> {
        write!(f, "{}", self)
    }
}

impl Display for RequiresOneOf {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), FmtError> {
        write!(f, "requires")?;

        match self.0 {
            [] => (),
            [requires_all_of] => write!(f, " {}", requires_all_of)?,
            [first, rest @ ..] => {
                write!(f, " one of: ({})", first)?;

                for rest in rest {
                    write!(f, " or ({})", rest)?;
                }
            }
        }

        Ok(())
    }
}

/// Used in errors to indicate a set of requirements that all need to be available/enabled to
/// allow a given operation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RequiresAllOf(pub &'static [Requires]);

impl Display for RequiresAllOf {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), FmtError> {
        if let Some((first, rest)) = self.0.split_first() {
            write!(f, "{}", first)?;

            for rest in rest {
                write!(f, " + {}", rest)?;
            }
        }

        Ok(())
    }
}

/// Something that needs to be supported or enabled to allow a particular operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Requires {
    DeviceFeature(&'static str),
    DeviceExtension(&'static str),
}

impl Display for Requires {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), FmtError> {
        match self {
            Requires::DeviceFeature(device_feature) => {
                write!(f, "device feature `{}`", device_feature)
            }
            Requires::DeviceExtension(device_extension) => {
                write!(f, "device extension `{}`", device_extension)
            }
        }
    }
}

/// How serious a reported problem is.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Severity {
    /// The API was misused. Behavior of the call is undefined.
    Error,
    /// The usage is valid but likely a mistake.
    Warning,
    /// The usage is valid but has a performance cost.
    PerformanceWarning,
    /// Informational.
    Info,
}

/// A typed Vulkan object handle, used to identify the object a message is about.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ObjectHandle {
    pub object_type: ash::vk::ObjectType,
    pub handle: u64,
}

impl ObjectHandle {
    #[inline]
    pub fn new<H: Handle>(handle: H) -> Self {
        Self {
            object_type: H::TYPE,
            handle: handle.as_raw(),
        }
    }

    /// A handle that refers to no particular object.
    pub const NULL: Self = Self {
        object_type: ash::vk::ObjectType::UNKNOWN,
        handle: 0,
    };
}

impl Display for ObjectHandle {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), FmtError> {
        write!(f, "{:?} {:#x}", self.object_type, self.handle)
    }
}

/// A message produced by the validator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogMessage {
    pub severity: Severity,
    pub object: ObjectHandle,
    pub vuid: &'static str,
    pub text: String,
}

/// Receives the messages produced by the validator.
pub trait LogSink: Send + Sync {
    fn log(&self, message: LogMessage);
}

/// Forwards messages to the `tracing` facade.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn log(&self, message: LogMessage) {
        let LogMessage {
            severity,
            object,
            vuid,
            text,
        } = message;

        match severity {
            Severity::Error => tracing::error!(
                vuid,
                object_type = ?object.object_type,
                handle = object.handle,
                "{}",
                text
            ),
            Severity::Warning | Severity::PerformanceWarning => tracing::warn!(
                vuid,
                object_type = ?object.object_type,
                handle = object.handle,
                performance = severity == Severity::PerformanceWarning,
                "{}",
                text
            ),
            Severity::Info => tracing::info!(
                vuid,
                object_type = ?object.object_type,
                handle = object.handle,
                "{}",
                text
            ),
        }
    }
}

/// Stores every message, so that they can be inspected afterwards.
#[derive(Debug, Default)]
pub struct CollectingSink {
    messages: Mutex<Vec<LogMessage>>,
}

impl CollectingSink {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of all messages received so far.
    pub fn messages(&self) -> Vec<LogMessage> {
        self.messages.lock().clone()
    }

    /// Removes and returns all messages received so far.
    pub fn take(&self) -> Vec<LogMessage> {
        std::mem::take(&mut *self.messages.lock())
    }

    /// Returns whether a message with the given VUID was received.
    pub fn contains_vuid(&self, vuid: &str) -> bool {
        self.messages.lock().iter().any(|message| message.vuid == vuid)
    }
}

impl LogSink for CollectingSink {
    fn log(&self, message: LogMessage) {
        self.messages.lock().push(message);
    }
}

impl<T: LogSink + ?Sized> LogSink for std::sync::Arc<T> {
    fn log(&self, message: LogMessage) {
        (**self).log(message)
    }
}

/// The problems found while validating one host call.
///
/// Multi-region commands keep validating after a failing region, so a call can produce several
/// messages.
#[derive(Debug, Default)]
pub(crate) struct Report {
    messages: SmallVec<[(Severity, ObjectHandle, Box<ValidationError>); 2]>,
}

impl Report {
    #[inline]
    pub(crate) fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub(crate) fn push(
        &mut self,
        severity: Severity,
        object: ObjectHandle,
        error: Box<ValidationError>,
    ) {
        self.messages.push((severity, object, error));
    }

    /// Adds the error of `result`, if any. Returns whether there was one.
    #[inline]
    pub(crate) fn error(
        &mut self,
        object: ObjectHandle,
        result: Result<(), Box<ValidationError>>,
    ) -> bool {
        match result {
            Ok(()) => false,
            Err(error) => {
                self.push(Severity::Error, object, error);
                true
            }
        }
    }

    #[inline]
    pub(crate) fn warning(
        &mut self,
        object: ObjectHandle,
        result: Result<(), Box<ValidationError>>,
    ) {
        if let Err(error) = result {
            self.push(Severity::Warning, object, error);
        }
    }

    #[inline]
    pub(crate) fn perf_warning(&mut self, object: ObjectHandle, error: Box<ValidationError>) {
        self.push(Severity::PerformanceWarning, object, error);
    }

    /// Returns whether any message is an error.
    #[inline]
    pub(crate) fn has_errors(&self) -> bool {
        self.messages
            .iter()
            .any(|(severity, _, _)| *severity == Severity::Error)
    }

    /// Hands every message to `sink`. Returns whether the call should be skipped.
    pub(crate) fn emit(self, sink: &dyn LogSink) -> bool {
        let skip = self.has_errors();

        for (severity, object, error) in self.messages {
            sink.log(LogMessage {
                severity,
                object,
                vuid: error.vuid(),
                text: error.to_string(),
            });
        }

        skip
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_display() {
        let err = Box::new(ValidationError {
            context: "range".into(),
            problem: "is empty".into(),
            vuids: &["VUID-a", "VUID-b"],
            ..Default::default()
        })
        .add_context("create_info");

        assert_eq!(
            err.to_string(),
            "create_info.range: is empty (Vulkan VUIDs: VUID-a, VUID-b)",
        );
        assert_eq!(err.vuid(), "VUID-a");
    }

    #[test]
    fn requires_display() {
        let err = ValidationError {
            problem: "uses update-after-bind".into(),
            requires_one_of: RequiresOneOf(&[
                RequiresAllOf(&[Requires::DeviceFeature("a")]),
                RequiresAllOf(&[Requires::DeviceExtension("b")]),
            ]),
            ..Default::default()
        };

        assert_eq!(
            err.to_string(),
            "uses update-after-bind -- requires one of: (device feature `a`) or \
            (device extension `b`)",
        );
    }

    #[test]
    fn report_skips_on_errors_only() {
        let sink = CollectingSink::new();
        let object = ObjectHandle::new(ash::vk::Image::from_raw(7));

        let mut report = Report::new();
        report.warning(
            object,
            Err(Box::new(ValidationError {
                vuids: &["VUID-w"],
                ..Default::default()
            })),
        );
        assert!(!report.emit(&sink));

        let mut report = Report::new();
        assert!(report.error(
            object,
            Err(Box::new(ValidationError {
                vuids: &["VUID-e"],
                ..Default::default()
            })),
        ));
        assert!(report.emit(&sink));

        let messages = sink.take();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].severity, Severity::Warning);
        assert_eq!(messages[1].vuid, "VUID-e");
    }

    #[test]
    fn collecting_sink() {
        let sink = CollectingSink::new();
        sink.log(LogMessage {
            severity: Severity::Warning,
            object: ObjectHandle::new(ash::vk::Image::from_raw(7)),
            vuid: "VUID-x",
            text: String::new(),
        });

        assert!(sink.contains_vuid("VUID-x"));
        assert_eq!(sink.take().len(), 1);
        assert!(sink.messages().is_empty());
    }
}
