pub mod document;
pub mod normalize;
pub mod redirect;
pub mod time_serde;

pub use document::{DocumentRef, LogicalDocument};
pub use redirect::RedirectionEntry;
