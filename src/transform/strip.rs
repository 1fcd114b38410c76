//! Keep-or-strip decision for one call site.
//!
//! Precedence, lowest to highest: the `strip` option, the environment-name
//! match, then the three `TRACE_*` escape hatches.

use crate::environment::Environment;
use crate::options::Options;
use crate::transform::metadata::Metadata;

/// True when the labeled statement `label` should be deleted.
pub fn should_strip(label: &str, metadata: &Metadata, options: &Options, env: &Environment) -> bool {
    let Some(strip) = &options.strip else {
        return false;
    };
    if !strip.applies_to(env.name.as_deref()) {
        return false;
    }
    let overridden = env
        .overrides
        .matches(&metadata.context(), &metadata.filename, label);
    if overridden {
        tracing::debug!(
            label,
            line = metadata.line,
            "strip policy overridden by environment"
        );
    }
    !overridden
}
