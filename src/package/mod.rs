//! Package model
//!
//! Package documents, their targets, target resolution into concrete paths,
//! exclusion rules, and version constraints used for catalog lookups.

mod exclude;
mod spec;
mod target;
pub mod version;

pub use exclude::ExcludeSet;
pub use spec::{ARCHIVE_EXTENSION, Package, PackageCollection, archive_name};
pub use target::{ExcludeRule, ResolveMode, Target, TargetResolver};
pub use version::{Operator, VersionConstraint, satisfies};
