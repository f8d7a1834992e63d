//! Shared vocabulary for romset: regions and their default languages,
//! release status and category, and ordered version tags.

pub mod region;
pub mod release;
pub mod util;
pub mod version;

pub use region::Region;
pub use release::{Category, ReleaseStatus};
pub use version::VersionTag;
