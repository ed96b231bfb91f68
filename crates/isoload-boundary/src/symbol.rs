use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// A dynamically typed value passed across the boundary.
pub type Value = Arc<dyn Any + Send + Sync>;

/// Wrap any value for passing across the boundary.
pub fn value<T: Any + Send + Sync>(v: T) -> Value {
    Arc::new(v)
}

type ConstructFn = dyn Fn(Args) -> anyhow::Result<Value> + Send + Sync;
type MethodFn = dyn Fn(&Value, Args) -> anyhow::Result<Option<Value>> + Send + Sync;

/// The declared type of one constructor or method parameter.
#[derive(Clone, Copy)]
pub struct ParamType {
    id: Option<TypeId>,
    name: &'static str,
}

impl ParamType {
    pub fn of<T: Any>() -> Self {
        Self {
            id: Some(TypeId::of::<T>()),
            name: std::any::type_name::<T>(),
        }
    }

    /// Accepts a value of any type.
    pub fn any() -> Self {
        Self { id: None, name: "any" }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn accepts(&self, v: &Value) -> bool {
        match self.id {
            None => true,
            Some(id) => (**v).type_id() == id,
        }
    }
}

impl PartialEq for ParamType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ParamType {}

impl fmt::Debug for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Positional arguments handed to a constructor or method body.
pub struct Args {
    values: Vec<Value>,
}

impl Args {
    pub fn new(values: Vec<Value>) -> Self {
        Self { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn raw(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// Typed access to argument `index`.
    pub fn get<T: Any + Send + Sync>(&self, index: usize) -> Result<Arc<T>, BindError> {
        let v = self.values.get(index).ok_or(BindError::Missing { index })?;
        Arc::clone(v).downcast::<T>().map_err(|_| BindError::WrongType {
            index,
            expected: std::any::type_name::<T>(),
        })
    }
}

/// An argument could not be bound to the type a body asked for.
///
/// Bodies usually propagate this with `?`; callers recognise it by
/// downcasting and report it as a binding failure rather than a user error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BindError {
    #[error("missing argument {index}")]
    Missing { index: usize },

    #[error("argument {index} is not a {expected}")]
    WrongType { index: usize, expected: &'static str },
}

/// One way of constructing a type. Selection happens by parameter count only.
#[derive(Clone)]
pub struct ConstructorDef {
    params: Vec<ParamType>,
    body: Arc<ConstructFn>,
}

impl ConstructorDef {
    pub fn arity(&self) -> usize {
        self.params.len()
    }

    pub fn params(&self) -> &[ParamType] {
        &self.params
    }

    pub fn invoke(&self, args: Args) -> anyhow::Result<Value> {
        (self.body)(args)
    }
}

/// A method callable on instances, looked up by name and exact signature.
#[derive(Clone)]
pub struct MethodDef {
    name: String,
    params: Vec<ParamType>,
    body: Arc<MethodFn>,
}

impl MethodDef {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &[ParamType] {
        &self.params
    }

    pub fn invoke(&self, receiver: &Value, args: Args) -> anyhow::Result<Option<Value>> {
        (self.body)(receiver, args)
    }
}

/// The definition a library exports under a symbol name.
pub struct TypeDef {
    name: String,
    constructors: Vec<ConstructorDef>,
    methods: Vec<MethodDef>,
    capabilities: Vec<String>,
    links: Vec<String>,
}

impl TypeDef {
    pub fn builder(name: impl Into<String>) -> TypeDefBuilder {
        TypeDefBuilder {
            def: TypeDef {
                name: name.into(),
                constructors: Vec::new(),
                methods: Vec::new(),
                capabilities: Vec::new(),
                links: Vec::new(),
            },
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Constructors in declaration order.
    pub fn constructors(&self) -> &[ConstructorDef] {
        &self.constructors
    }

    pub fn methods(&self) -> &[MethodDef] {
        &self.methods
    }

    /// Capability names this type satisfies, besides its own name.
    pub fn capabilities(&self) -> &[String] {
        &self.capabilities
    }

    /// Other symbols this type refers to; resolved when linking eagerly.
    pub fn links(&self) -> &[String] {
        &self.links
    }

    pub fn method(&self, name: &str, params: &[ParamType]) -> Option<&MethodDef> {
        self.methods
            .iter()
            .find(|m| m.name == name && m.params.as_slice() == params)
    }
}

impl fmt::Debug for TypeDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDef")
            .field("name", &self.name)
            .field("constructors", &self.constructors.len())
            .field("methods", &self.methods.iter().map(|m| &m.name).collect::<Vec<_>>())
            .field("capabilities", &self.capabilities)
            .finish()
    }
}

pub struct TypeDefBuilder {
    def: TypeDef,
}

impl TypeDefBuilder {
    pub fn constructor<F>(mut self, params: Vec<ParamType>, body: F) -> Self
    where
        F: Fn(Args) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        self.def.constructors.push(ConstructorDef {
            params,
            body: Arc::new(body),
        });
        self
    }

    pub fn method<F>(mut self, name: impl Into<String>, params: Vec<ParamType>, body: F) -> Self
    where
        F: Fn(&Value, Args) -> anyhow::Result<Option<Value>> + Send + Sync + 'static,
    {
        self.def.methods.push(MethodDef {
            name: name.into(),
            params,
            body: Arc::new(body),
        });
        self
    }

    pub fn implements(mut self, capability: impl Into<String>) -> Self {
        self.def.capabilities.push(capability.into());
        self
    }

    pub fn links(mut self, symbol: impl Into<String>) -> Self {
        self.def.links.push(symbol.into());
        self
    }

    pub fn build(self) -> Arc<TypeDef> {
        Arc::new(self.def)
    }
}

/// Identity of a boundary loader, recorded on every symbol it defines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BoundaryId(u64);

impl BoundaryId {
    pub(crate) fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for BoundaryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "boundary#{}", self.0)
    }
}

/// Who defined a symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Ambient,
    Boundary(BoundaryId),
}

/// A resolved type. Two symbols are the same type only if they are the same
/// object, so identically named definitions from different boundaries differ.
#[derive(Clone)]
pub struct Symbol(Arc<SymbolInner>);

struct SymbolInner {
    def: Arc<TypeDef>,
    origin: Origin,
}

impl Symbol {
    pub(crate) fn define(def: Arc<TypeDef>, origin: Origin) -> Self {
        Self(Arc::new(SymbolInner { def, origin }))
    }

    pub fn name(&self) -> &str {
        self.0.def.name()
    }

    pub fn def(&self) -> &TypeDef {
        &self.0.def
    }

    pub fn origin(&self) -> Origin {
        self.0.origin
    }

    pub fn same(&self, other: &Symbol) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Whether this type can be used where `capability` is required.
    pub fn satisfies(&self, capability: &str) -> bool {
        self.name() == capability || self.def().capabilities().iter().any(|c| c == capability)
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Symbol")
            .field("name", &self.name())
            .field("origin", &self.origin())
            .finish()
    }
}
