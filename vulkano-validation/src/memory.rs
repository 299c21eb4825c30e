// Copyright (c) 2016 The vulkano developers
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or https://opensource.org/licenses/MIT>,
// at your option. All files in the project carrying such
// notice may not be copied, modified, or distributed except
// according to those terms.

//! Device memory bound to images and buffers.
//!
//! Allocation itself is not tracked. Only which memory objects back a resource are recorded, so
//! that descriptor updates and copies can check that the resource is backed.

use crate::{DeviceSize, ValidationError};
use smallvec::SmallVec;

/// A range of device memory bound to a resource.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MemoryBinding {
    pub memory: ash::vk::DeviceMemory,
    pub offset: DeviceSize,
}

/// The memory bindings of a resource. Sparse resources may have several.
#[derive(Clone, Debug, Default)]
pub struct BoundMemory {
    bindings: SmallVec<[MemoryBinding; 1]>,
    sparse: bool,
}

impl BoundMemory {
    #[inline]
    pub(crate) fn new(sparse: bool) -> Self {
        Self {
            bindings: SmallVec::new(),
            sparse,
        }
    }

    /// Appends a binding. A non-sparse resource can only be bound once.
    pub(crate) fn bind(
        &mut self,
        binding: MemoryBinding,
        vuids: &'static [&'static str],
    ) -> Result<(), Box<ValidationError>> {
        if !self.sparse && !self.bindings.is_empty() {
            return Err(Box::new(ValidationError {
                problem: "the resource is not sparse, and already has memory bound to it".into(),
                vuids,
                ..Default::default()
            }));
        }

        self.bindings.push(binding);

        Ok(())
    }

    /// Removes every binding to `memory`, when the memory is freed.
    pub(crate) fn unbind(&mut self, memory: ash::vk::DeviceMemory) {
        self.bindings.retain(|binding| binding.memory != memory);
    }

    /// Returns whether the resource can be accessed by the device.
    ///
    /// Sparse resources are considered backed, as residency is not tracked.
    #[inline]
    pub fn is_bound(&self) -> bool {
        self.sparse || !self.bindings.is_empty()
    }

    #[inline]
    pub fn bindings(&self) -> &[MemoryBinding] {
        &self.bindings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ash::vk::Handle;

    #[test]
    fn non_sparse_binds_once() {
        let mut bound = BoundMemory::new(false);
        let binding = MemoryBinding {
            memory: ash::vk::DeviceMemory::from_raw(1),
            offset: 0,
        };

        assert!(!bound.is_bound());
        assert!(bound.bind(binding, &[]).is_ok());
        assert!(bound.is_bound());
        assert!(bound.bind(binding, &[]).is_err());

        bound.unbind(binding.memory);
        assert!(!bound.is_bound());
    }

    #[test]
    fn sparse_binds_many() {
        let mut bound = BoundMemory::new(true);
        assert!(bound.is_bound());

        for i in 1..4 {
            let binding = MemoryBinding {
                memory: ash::vk::DeviceMemory::from_raw(i),
                offset: 0,
            };
            assert!(bound.bind(binding, &[]).is_ok());
        }

        assert_eq!(bound.bindings().len(), 3);
    }
}
