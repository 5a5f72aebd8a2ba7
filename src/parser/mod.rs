pub mod pairing;
pub mod template;

pub use pairing::{pair_adjacent, Item};
pub use template::parse_template;
