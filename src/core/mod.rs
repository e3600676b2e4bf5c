//! Pattern execution: seeding, selection, transforms, agreement and the
//! composer that ties them together.

pub mod agreement;
pub mod composer;
pub mod context;
pub mod engine;
pub mod parts;
mod resolve;
pub mod seed;
pub mod selector;
pub mod suffix;
pub mod transform;
