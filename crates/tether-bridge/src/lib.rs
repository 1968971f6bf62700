//! Tether Bridge - Converters between sink shapes
//!
//! This crate lets code written against one notification style drive code
//! written against the other:
//! - Promise -> simple callback
//! - Result callback -> simple callback
//! - Simple callback -> result callback
//! - Reactor-mediated variants of each, delivering inside `Reactor::process`
//! - A producer guard that turns panics into failure outcomes

pub mod convert;
pub mod deferred;
pub mod producer;

pub use convert::{
    convert_callback, convert_promise, convert_result_callback, PromiseCallback,
    ResultCallbackAdapter, SimpleCallbackAdapter,
};
pub use deferred::*;
pub use producer::*;
