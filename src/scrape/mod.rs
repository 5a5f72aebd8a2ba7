pub mod extract;
pub mod paginate;
pub mod regions;

pub use extract::extract;
pub use paginate::expand_all;
pub use regions::{enumerate_regions, select_region};
