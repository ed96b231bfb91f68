use parking_lot::RwLock;
use std::any::Any;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::host::{BootstrapHost, derive_target_name};
use isoload_boundary::{
    Args, BindError, BoundaryLoader, LibraryCatalog, ParamType, Symbol, SymbolSource, Value,
};
use isoload_core::{ConstructionCause, IsoError, Result};

/// A constructed plugin together with the symbol it was built from.
#[derive(Clone)]
pub struct PluginInstance {
    symbol: Symbol,
    object: Value,
}

impl PluginInstance {
    pub fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    pub fn object(&self) -> &Value {
        &self.object
    }

    /// The instance as its concrete Rust type, if it is one.
    pub fn downcast<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        Arc::clone(&self.object).downcast::<T>().ok()
    }
}

impl std::fmt::Debug for PluginInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginInstance")
            .field("symbol", &self.symbol)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapState {
    Uninitialized,
    Bootstrapped,
}

/// Holds the boundary a plugin lives in and the most recently bootstrapped
/// instance. Each successful [`initialize_plugin`](Self::initialize_plugin)
/// replaces the stored instance.
pub struct BootstrapContext {
    loader: Arc<BoundaryLoader>,
    required: Option<String>,
    current: RwLock<Option<PluginInstance>>,
}

impl BootstrapContext {
    pub fn new(loader: Arc<BoundaryLoader>) -> Self {
        Self {
            loader,
            required: None,
            current: RwLock::new(None),
        }
    }

    /// A context whose boundary reuses the parent's copies of `namespace`
    /// and always delegates `namespace::api`.
    pub fn for_namespace(
        parent: Arc<dyn SymbolSource>,
        catalog: Arc<dyn LibraryCatalog>,
        namespace: &str,
    ) -> Self {
        let loader = BoundaryLoader::new(parent, catalog)
            .share_prefix(format!("{namespace}::"))
            .never_local(format!("{namespace}::api::"));
        Self::new(Arc::new(loader))
    }

    /// Every constructed instance must satisfy `capability`.
    pub fn require(mut self, capability: impl Into<String>) -> Self {
        self.required = Some(capability.into());
        self
    }

    pub fn loader(&self) -> &Arc<BoundaryLoader> {
        &self.loader
    }

    pub fn required(&self) -> Option<&str> {
        self.required.as_deref()
    }

    pub fn state(&self) -> BootstrapState {
        if self.current.read().is_some() {
            BootstrapState::Bootstrapped
        } else {
            BootstrapState::Uninitialized
        }
    }

    pub fn plugin(&self) -> Option<PluginInstance> {
        self.current.read().clone()
    }

    pub fn plugin_symbol(&self) -> Option<Symbol> {
        self.current.read().as_ref().map(|p| p.symbol.clone())
    }

    /// Construct the implementation belonging to `host`.
    ///
    /// The constructor receives `[loader, host, ...extra]`. On any failure the
    /// previously stored instance is kept.
    pub fn initialize_plugin<H: BootstrapHost>(
        &self,
        host: Arc<H>,
        extra: Vec<Value>,
    ) -> Result<PluginInstance> {
        let target = derive_target_name(host.symbol_name());

        let mut args: Vec<Value> = Vec::with_capacity(extra.len() + 2);
        args.push(Arc::clone(&self.loader) as Value);
        args.push(host as Value);
        args.extend(extra);

        let instance = construct(&self.loader, &target, args)?;

        if let Some(required) = &self.required {
            if !instance.symbol.satisfies(required) {
                warn!(plugin = %target, required = %required, "plugin rejected by capability check");
                return Err(IsoError::TypeMismatch {
                    actual: instance.symbol.name().to_string(),
                    required: required.clone(),
                });
            }
        }

        info!(plugin = %target, boundary = %self.loader.id(), "plugin bootstrapped");
        *self.current.write() = Some(instance.clone());
        Ok(instance)
    }

    /// Invoke `name` with exactly `param_types` on the current instance.
    ///
    /// Errors raised by the method body are returned as they were raised.
    /// Structural failures (no instance, no such method, bad arguments) are
    /// an [`IsoError::MethodDispatch`] inside the returned error.
    pub fn call_method(
        &self,
        name: &str,
        param_types: &[ParamType],
        params: Vec<Value>,
    ) -> anyhow::Result<Option<Value>> {
        let Some(instance) = self.plugin() else {
            return Err(IsoError::dispatch(name, "<none>", "no plugin has been bootstrapped").into());
        };
        let owner = instance.symbol.name();

        let method = instance
            .symbol
            .def()
            .method(name, param_types)
            .ok_or_else(|| {
                IsoError::dispatch(name, owner, format!("no method with parameters {param_types:?}"))
            })?;

        if params.len() != param_types.len() {
            return Err(IsoError::dispatch(
                name,
                owner,
                format!("expected {} arguments, got {}", param_types.len(), params.len()),
            )
            .into());
        }
        if let Some(index) = param_types
            .iter()
            .zip(&params)
            .position(|(p, v)| !p.accepts(v))
        {
            return Err(IsoError::dispatch(
                name,
                owner,
                format!("argument type mismatch at position {index}"),
            )
            .into());
        }

        debug!(method = name, owner, "dispatching");
        match method.invoke(&instance.object, Args::new(params)) {
            Err(e) if e.is::<BindError>() => Err(IsoError::dispatch(name, owner, e.to_string()).into()),
            other => other,
        }
    }

    /// Shorthand for a method without parameters.
    pub fn call(&self, name: &str) -> anyhow::Result<Option<Value>> {
        self.call_method(name, &[], Vec::new())
    }
}

/// Resolve `type_name` through `loader` and construct it from `args`.
///
/// The first constructor whose parameter count equals `args.len()` is used;
/// overloads of equal arity are not told apart. Arguments are then checked
/// against that constructor's declared parameter types.
pub fn construct(loader: &BoundaryLoader, type_name: &str, args: Vec<Value>) -> Result<PluginInstance> {
    let symbol = loader.resolve_symbol(type_name, true)?;
    let constructors = symbol.def().constructors();

    let constructor = constructors
        .iter()
        .find(|c| c.arity() == args.len())
        .ok_or_else(|| IsoError::Construction {
            type_name: type_name.to_string(),
            cause: ConstructionCause::ArityMismatch {
                wanted: args.len(),
                available: constructors.iter().map(|c| c.arity()).collect(),
            },
        })?;

    if let Some((index, param)) = constructor
        .params()
        .iter()
        .zip(&args)
        .enumerate()
        .find_map(|(i, (p, v))| (!p.accepts(v)).then_some((i, p)))
    {
        return Err(IsoError::Construction {
            type_name: type_name.to_string(),
            cause: ConstructionCause::ArgumentTypeMismatch {
                index,
                expected: param.name().to_string(),
            },
        });
    }

    let object = constructor.invoke(Args::new(args)).map_err(|source| {
        match source.downcast_ref::<BindError>() {
            Some(bind) => IsoError::Construction {
                type_name: type_name.to_string(),
                cause: ConstructionCause::Binding(bind.to_string()),
            },
            None => IsoError::Invocation {
                type_name: type_name.to_string(),
                source,
            },
        }
    })?;

    Ok(PluginInstance { symbol, object })
}
