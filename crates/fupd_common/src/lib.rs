//! fupd_common - Shared domain logic for the Factorio updater.
//!
//! Everything here is pure: version numbers, the closed identity enums, the
//! strict readers for the three remote document shapes, the update sequence
//! resolver and the version banner parser. All I/O lives in the `fupd`
//! crate behind collaborator traits.

pub mod credentials;
pub mod feed;
pub mod link;
pub mod local;
pub mod package;
pub mod release;
pub mod sequence;
pub mod version;

pub use credentials::ServiceCredentials;
pub use local::LocalInstall;
pub use package::FactorioPackage;
pub use release::{ReleaseBuild, ReleaseChannel};
pub use sequence::UpdateEdge;
pub use version::FactorioVersion;
