// Core types and primitives shared by every layer

pub mod pagination;
pub mod strong_types;

pub use pagination::{Page, PageInfo, PageQuery};
pub use strong_types::*;
