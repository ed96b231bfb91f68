use std::any::Any;

const BOOTSTRAP_SUFFIX: &str = "Bootstrap";

/// The statically linked half of a plugin.
///
/// The host is passed to the implementation's constructor as its second
/// argument, so implementations downcast it back to the concrete host type.
pub trait BootstrapHost: Any + Send + Sync {
    /// Fully qualified symbol name of the host type, e.g. `demo::ChatBootstrap`.
    fn symbol_name(&self) -> &str;
}

/// Name of the implementation type bootstrapped for `host_name`.
///
/// A trailing `Bootstrap` is removed from the last path segment. Names
/// without the suffix are returned unchanged.
pub fn derive_target_name(host_name: &str) -> String {
    let (module, last) = match host_name.rfind("::") {
        Some(i) => host_name.split_at(i + 2),
        None => ("", host_name),
    };
    let last = last
        .strip_suffix(BOOTSTRAP_SUFFIX)
        .filter(|stem| !stem.is_empty())
        .unwrap_or(last);
    format!("{module}{last}")
}
