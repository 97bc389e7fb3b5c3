//! Adapter layer
//!
//! An adapter accepts one typed configuration and asynchronously produces
//! one typed report. Adapters are composed by [`crate::Pipeline`].
//!
//! Built-in adapters:
//! - [`K6Adapter`]: runs a k6 script and sanitizes its event stream
//! - [`StreamAdapter`]: sanitizes an event stream recorded earlier

mod erased;
mod error;
pub mod k6;
pub mod stream;
mod traits;

pub(crate) use erased::{Erased, ErasedAdapter};
pub use error::AdapterError;
pub use k6::{K6Adapter, K6Config};
pub use stream::{StreamAdapter, StreamConfig};
pub use traits::Adapter;
