//! # isoload-boundary
//!
//! The isolation boundary. A [`BoundaryLoader`] owns a search path of injected
//! libraries and resolves symbol names against it *before* asking its parent,
//! so a plugin always sees the library versions it shipped with even when the
//! host already has conflicting definitions. A small set of namespaces is
//! always taken from the parent so shared contract types stay identical on
//! both sides.
//!
//! ```text
//!   resolve("demo::Config")
//!        │
//!        ├─ cached here? ──────────────► yes: same Symbol as before
//!        ├─ shared prefix & parent has it ► parent's Symbol
//!        ├─ never-local prefix? ────────► skip local search
//!        ├─ injected libraries ─────────► defined by this boundary
//!        └─ parent.resolve() ───────────► parent's Symbol or ResolutionError
//! ```

pub mod ambient;
pub mod library;
pub mod loader;
pub mod symbol;

pub use ambient::{AmbientRuntime, SymbolSource};
pub use library::{Library, LibraryCatalog, StaticCatalog};
pub use loader::BoundaryLoader;
pub use symbol::{
    Args, BindError, BoundaryId, ConstructorDef, MethodDef, Origin, ParamType, Symbol, TypeDef,
    TypeDefBuilder, Value, value,
};
