pub mod descriptor;
pub mod metadata;

pub use descriptor::*;
pub use metadata::*;
