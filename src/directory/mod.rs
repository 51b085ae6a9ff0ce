pub mod cache;
pub mod client;
pub mod types;

pub use client::{Directory, DirectoryError, RuzClient};
pub use types::{RawLesson, SearchHit, TargetKind};
