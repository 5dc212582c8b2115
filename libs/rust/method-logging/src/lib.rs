//! Method-level instrumentation for service types.
//!
//! Calls routed through a [`MethodInterceptor`] emit structured
//! `invoked` / `success` / `error` events to the receiver's [`LogSink`],
//! while the original return value or error reaches the caller untouched.
//! A [`ClassInterceptor`] applies one set of options to every method of a
//! type, with per-method overrides and exclusions.
//!
//! ```
//! use method_logging::{
//!     call_args, param_names, Instrumented, LogOptions, LogSink, MethodInterceptor, TracingSink,
//! };
//!
//! struct Users {
//!     logger: TracingSink,
//! }
//!
//! impl Instrumented for Users {
//!     fn logger(&self) -> Option<&dyn LogSink> {
//!         Some(&self.logger)
//!     }
//! }
//!
//! let find = MethodInterceptor::new("find", param_names!(id), LogOptions::default());
//! let users = Users { logger: TracingSink::default() };
//! let id = 7;
//! let found: Result<u32, method_logging::InstrumentError> =
//!     find.call(&users, &call_args![id], || Ok(id));
//! assert_eq!(found.unwrap(), 7);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod args;
pub mod class;
pub mod error;
pub mod interceptor;
pub mod recorder;
pub mod sink;

pub use args::{capture_args, parse_param_names, to_arg_value, ArgsFormatter, CapturedArgs};
pub use class::{ClassInterceptor, ClassInterceptorBuilder, ExclusionSet};
pub use error::InstrumentError;
pub use interceptor::{LogOptions, MethodInterceptor};
pub use recorder::{InvocationRecorder, InvocationState, LogEvent};
pub use sink::{Instrumented, LogSink, TracingSink};
