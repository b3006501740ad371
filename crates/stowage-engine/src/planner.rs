//! Variant planning
//!
//! Expands the configured `sizes` list into the ordered variant plan a session dispatches.

use stowage_core::{EngineConfig, ResizeOptions, SizeConfig, VariantSpec};

/// Expand `config` into one [`VariantSpec`] per configured size, in order.
///
/// An entry's own `fit` overrides the global one; a web alternate is produced when either
/// the global or the entry's `webP` flag is set. An empty `sizes` list gives an empty plan.
pub fn expand(config: &EngineConfig) -> Vec<VariantSpec> {
    config
        .sizes
        .iter()
        .map(|size| variant_for(config, size))
        .collect()
}

fn variant_for(config: &EngineConfig, size: &SizeConfig) -> VariantSpec {
    VariantSpec {
        label: size.name.clone().filter(|name| !name.is_empty()),
        width: size.width,
        height: size.height,
        resize: ResizeOptions {
            fit: size.options.fit.unwrap_or(config.fit),
            position: size.options.position.unwrap_or_default(),
        },
        produces_web_alternate: config.web_p || size.web_p,
    }
}
