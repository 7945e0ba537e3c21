//! Driver resolution
//!
//! Intersects the supported driver list with what the host has installed.

use harbor_core::{DriverDescriptor, DriverRegistry, HarborError, Result, SupportedDrivers};

/// Picks a usable client driver from the supported set.
///
/// When several supported drivers are installed, the one listed first in
/// [`SupportedDrivers`] wins, so resolution is reproducible across hosts and
/// runs. Reorder the supported list to change the preference.
pub struct DriverResolver<'a> {
    supported: &'a SupportedDrivers,
    registry: &'a dyn DriverRegistry,
}

impl<'a> DriverResolver<'a> {
    pub fn new(supported: &'a SupportedDrivers, registry: &'a dyn DriverRegistry) -> Self {
        Self {
            supported,
            registry,
        }
    }

    /// Resolve the preferred installed driver.
    ///
    /// Fails with [`HarborError::NoDriverFound`] when no supported driver
    /// is installed.
    pub fn resolve(&self) -> Result<DriverDescriptor> {
        let available = self.registry.list_available_drivers()?;
        tracing::debug!(available = ?available, "drivers reported by host");

        let found = self
            .supported
            .names()
            .iter()
            .find(|name| available.iter().any(|a| a.trim() == name.as_str()));

        match found {
            Some(name) => {
                tracing::debug!(driver = %name, "resolved driver");
                Ok(DriverDescriptor::new(name.clone()))
            }
            None => Err(HarborError::NoDriverFound {
                supported: self.supported.names().to_vec(),
            }),
        }
    }
}
