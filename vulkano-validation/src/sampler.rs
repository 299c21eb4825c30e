// Copyright (c) 2016 The vulkano developers
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or https://opensource.org/licenses/MIT>,
// at your option. All files in the project carrying such
// notice may not be copied, modified, or distributed except
// according to those terms.

//! Samplers and sampler YCbCr conversions.
//!
//! Only the properties that affect descriptor validation are tracked. A sampler that was created
//! with a YCbCr conversion can only be used as an immutable sampler, and the views it samples
//! must carry an identical conversion.

use crate::{config::ValidationConfig, ValidationError};
use foldhash::HashSet;

/// Parameters to create a new sampler.
#[derive(Clone, Debug)]
pub struct SamplerCreateInfo {
    /// The sampler YCbCr conversion to be used with the sampler.
    ///
    /// The default value is `None`.
    pub sampler_ycbcr_conversion: Option<ash::vk::SamplerYcbcrConversion>,

    pub _ne: crate::NonExhaustive,
}

impl Default for SamplerCreateInfo {
    #[inline]
    fn default() -> Self {
        Self {
            sampler_ycbcr_conversion: None,
            _ne: crate::NonExhaustive(()),
        }
    }
}

impl SamplerCreateInfo {
    pub(crate) fn validate(&self, config: &ValidationConfig) -> Result<(), Box<ValidationError>> {
        if self.sampler_ycbcr_conversion.is_some()
            && !(config.features.sampler_ycbcr_conversion
                || config.extensions.khr_sampler_ycbcr_conversion)
        {
            return Err(Box::new(ValidationError {
                context: "create_info.sampler_ycbcr_conversion".into(),
                problem: "is `Some`".into(),
                requires_one_of: crate::RequiresOneOf(&[
                    crate::RequiresAllOf(&[crate::Requires::DeviceFeature(
                        "sampler_ycbcr_conversion",
                    )]),
                    crate::RequiresAllOf(&[crate::Requires::DeviceExtension(
                        "khr_sampler_ycbcr_conversion",
                    )]),
                ]),
                vuids: &["VUID-VkSamplerYcbcrConversionInfo-conversion-parameter"],
                ..Default::default()
            }));
        }

        Ok(())
    }
}

/// The state tracked for a sampler.
#[derive(Debug)]
pub struct SamplerState {
    handle: ash::vk::Sampler,
    sampler_ycbcr_conversion: Option<ash::vk::SamplerYcbcrConversion>,
    pub(crate) command_buffers: HashSet<ash::vk::CommandBuffer>,
}

impl SamplerState {
    #[inline]
    pub fn new(handle: ash::vk::Sampler, create_info: &SamplerCreateInfo) -> Self {
        SamplerState {
            handle,
            sampler_ycbcr_conversion: create_info.sampler_ycbcr_conversion,
            command_buffers: HashSet::default(),
        }
    }

    #[inline]
    pub fn handle(&self) -> ash::vk::Sampler {
        self.handle
    }

    /// Returns the YCbCr conversion the sampler was created with, if any.
    #[inline]
    pub fn sampler_ycbcr_conversion(&self) -> Option<ash::vk::SamplerYcbcrConversion> {
        self.sampler_ycbcr_conversion
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ash::vk::Handle;

    #[test]
    fn conversion_requires_feature() {
        let create_info = SamplerCreateInfo {
            sampler_ycbcr_conversion: Some(ash::vk::SamplerYcbcrConversion::from_raw(3)),
            ..Default::default()
        };

        let mut config = ValidationConfig::default();
        assert!(create_info.validate(&config).is_err());

        config.features.sampler_ycbcr_conversion = true;
        assert!(create_info.validate(&config).is_ok());

        let sampler = SamplerState::new(ash::vk::Sampler::from_raw(1), &create_info);
        assert_eq!(
            sampler.sampler_ycbcr_conversion(),
            create_info.sampler_ycbcr_conversion,
        );
    }
}
