pub mod accessor;
pub mod error;
pub mod hierarchy;
pub mod math;
pub mod mixin;
pub mod node;
pub mod registry;
pub mod scene;
pub mod wrapper;

#[cfg(test)]
mod testing;

pub use error::{AdapterError, AdapterResult};
pub use node::{NativeNode, NodeKind};
pub use registry::WrapperRegistry;
pub use wrapper::{NodeWrapper, WrapperRef, WrapperType};
