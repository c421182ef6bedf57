//! Concrete adapter implementations.

pub mod native;

use crate::oracle::HarnessConfig;
use crate::registry::AdapterRegistry;

pub use native::NativeAdapter;

/// Build the default registry: the built-in adapter registers first, making
/// it the default write oracle. No discovery; additional adapters are pushed
/// by the caller.
pub fn build_registry(_config: &HarnessConfig) -> AdapterRegistry {
    let mut registry = AdapterRegistry::new();
    registry.register(Box::new(NativeAdapter::new()));
    registry
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn default_registry_has_native_oracle() {
        let registry = build_registry(&HarnessConfig::default());
        assert_eq!(registry.names(), ["native"]);
        let oracle = registry.default_oracle().unwrap();
        assert!(oracle.can_read());
        assert!(oracle.can_write());
        assert!(!oracle.is_interactive());
    }
}
