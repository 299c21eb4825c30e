// Copyright (c) 2016 The vulkano developers
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or https://opensource.org/licenses/MIT>,
// at your option. All files in the project carrying such
// notice may not be copied, modified, or distributed except
// according to those terms.

//! The process-wide dictionary of descriptor set layout definitions.
//!
//! Every layout definition is looked up here when the layout is created. Identical definitions
//! share one `Arc`, so two layouts are compatible exactly when their definitions are the same
//! allocation. Definitions are never evicted.

use super::layout::DescriptorSetLayoutDef;
use foldhash::HashSet;
use parking_lot::Mutex;
use std::sync::{Arc, OnceLock};

static DICTIONARY: OnceLock<Mutex<HashSet<Arc<DescriptorSetLayoutDef>>>> = OnceLock::new();

/// Returns the canonical instance of `def`, inserting it if this is the first time it is seen.
pub fn canonicalize(def: DescriptorSetLayoutDef) -> Arc<DescriptorSetLayoutDef> {
    let mut dictionary = DICTIONARY
        .get_or_init(|| Mutex::new(HashSet::default()))
        .lock();

    if let Some(existing) = dictionary.get(&def) {
        return existing.clone();
    }

    let def = Arc::new(def);
    dictionary.insert(def.clone());

    def
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor_set::layout::{
        DescriptorSetLayoutBinding, DescriptorSetLayoutCreateInfo, DescriptorType, ShaderStages,
    };

    fn create_info(descriptor_count: u32) -> DescriptorSetLayoutCreateInfo {
        DescriptorSetLayoutCreateInfo {
            bindings: vec![DescriptorSetLayoutBinding {
                binding: 7,
                descriptor_count,
                stages: ShaderStages::COMPUTE,
                ..DescriptorSetLayoutBinding::descriptor_type(DescriptorType::StorageImage)
            }],
            ..Default::default()
        }
    }

    #[test]
    fn identical_definitions_share_identity() {
        let a = DescriptorSetLayoutDef::canonical(&create_info(3));
        let b = DescriptorSetLayoutDef::canonical(&create_info(3));
        let c = DescriptorSetLayoutDef::canonical(&create_info(5));

        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &c));
    }
}
