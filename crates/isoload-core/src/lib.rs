//! # isoload-core
//!
//! Shared vocabulary for isolated dependency loading: the artifact coordinate
//! model and the unified error taxonomy used by every other crate in the
//! workspace.

pub mod coordinate;
pub mod error;
pub mod target;

pub use coordinate::{ArtifactIdentity, CoordinateBuilder, DependencyCoordinate, ExclusionPattern, Repository};
pub use error::{ConstructionCause, IsoError, Result};
pub use target::LibraryTarget;
