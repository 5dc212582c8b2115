//! Single-method interception.
//!
//! A [`MethodInterceptor`] is bound to one method name and its parameter
//! names when it is created. Each call captures arguments, resolves the
//! receiver's sink, optionally logs `invoked`, runs the body, and logs
//! `success` or `error`. The body's value or error is handed back as is.

use crate::args::{capture_args, parse_param_names, ArgsFormatter, CapturedArgs};
use crate::error::InstrumentError;
use crate::recorder::InvocationRecorder;
use crate::sink::Instrumented;
use serde_json::Value;
use std::error::Error;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// Per-method logging options.
#[derive(Clone, Default)]
pub struct LogOptions {
    /// Emit an `invoked` event before the body runs
    pub on_invoke: bool,
    /// Replace name-based argument capture
    pub args: Option<ArgsFormatter>,
}

impl LogOptions {
    /// Options that also log method entry.
    #[must_use]
    pub fn on_invoke() -> Self {
        Self {
            on_invoke: true,
            args: None,
        }
    }

    /// Set whether method entry is logged.
    #[must_use]
    pub const fn with_on_invoke(mut self, on_invoke: bool) -> Self {
        self.on_invoke = on_invoke;
        self
    }

    /// Render arguments with a custom formatter.
    #[must_use]
    pub fn with_args_formatter<F>(mut self, formatter: F) -> Self
    where
        F: Fn(&[Value]) -> CapturedArgs + Send + Sync + 'static,
    {
        self.args = Some(Arc::new(formatter));
        self
    }
}

impl fmt::Debug for LogOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogOptions")
            .field("on_invoke", &self.on_invoke)
            .field("args", &self.args.as_ref().map(|_| "<formatter>"))
            .finish()
    }
}

/// Interceptor for one method.
#[derive(Debug, Clone)]
pub struct MethodInterceptor {
    method: String,
    param_names: Vec<String>,
    options: LogOptions,
}

/// Capture and sink resolved for one call, before the body runs.
struct Prepared<'r> {
    recorder: InvocationRecorder<'r>,
    args: CapturedArgs,
}

impl Prepared<'_> {
    fn finish<T, E>(self, outcome: Result<T, E>) -> Result<T, E>
    where
        E: Error + 'static,
    {
        match &outcome {
            Ok(_) => self.recorder.success(&self.args),
            Err(err) => self.recorder.error(&self.args, err),
        }
        outcome
    }
}

impl MethodInterceptor {
    /// Create an interceptor with explicit parameter names.
    #[must_use]
    pub fn new(method: impl Into<String>, param_names: &[&str], options: LogOptions) -> Self {
        Self {
            method: method.into(),
            param_names: param_names.iter().map(ToString::to_string).collect(),
            options,
        }
    }

    /// Create an interceptor whose parameter names are parsed from a
    /// signature string.
    ///
    /// Parsing is best-effort; prefer [`MethodInterceptor::new`] with
    /// [`param_names!`](crate::param_names) where argument names matter.
    #[must_use]
    pub fn from_signature(method: impl Into<String>, signature: &str, options: LogOptions) -> Self {
        Self {
            method: method.into(),
            param_names: parse_param_names(signature),
            options,
        }
    }

    /// Intercepted method name.
    #[must_use]
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Parameter names bound at creation.
    #[must_use]
    pub fn param_names(&self) -> &[String] {
        &self.param_names
    }

    /// Options bound at creation.
    #[must_use]
    pub const fn options(&self) -> &LogOptions {
        &self.options
    }

    /// Capture the arguments of one call.
    #[must_use]
    pub fn capture(&self, args: &[Value]) -> CapturedArgs {
        match &self.options.args {
            Some(formatter) => formatter(args),
            None => capture_args(&self.param_names, args),
        }
    }

    fn prepare<'r, R>(
        &'r self,
        receiver: &'r R,
        args: &[Value],
    ) -> Result<Prepared<'r>, InstrumentError>
    where
        R: Instrumented + ?Sized,
    {
        let args = self.capture(args);
        let sink = receiver.logger().ok_or_else(|| {
            InstrumentError::missing_log_sink(std::any::type_name::<R>(), &self.method)
        })?;
        let recorder = InvocationRecorder::new(sink, &self.method);
        if self.options.on_invoke {
            recorder.invoked(&args);
        }
        Ok(Prepared { recorder, args })
    }

    /// Run a synchronous method body under interception.
    ///
    /// # Errors
    ///
    /// Returns [`InstrumentError::MissingLogSink`] (converted into `E`)
    /// without running the body when the receiver has no sink; otherwise
    /// returns the body's own error unchanged.
    pub fn call<R, T, E, F>(&self, receiver: &R, args: &[Value], body: F) -> Result<T, E>
    where
        R: Instrumented + ?Sized,
        F: FnOnce() -> Result<T, E>,
        E: Error + From<InstrumentError> + 'static,
    {
        let prepared = self.prepare(receiver, args)?;
        prepared.finish(body())
    }

    /// Run an asynchronous method body under interception.
    ///
    /// Argument capture, sink resolution and the `invoked` event happen
    /// before this returns. The returned future awaits `body` directly and
    /// logs its outcome; it adds no suspension points of its own.
    pub fn call_async<'r, R, T, E, Fut>(
        &'r self,
        receiver: &'r R,
        args: &[Value],
        body: Fut,
    ) -> impl Future<Output = Result<T, E>> + use<'r, R, T, E, Fut>
    where
        R: Instrumented + ?Sized,
        Fut: Future<Output = Result<T, E>>,
        E: Error + From<InstrumentError> + 'static,
    {
        let prepared = self.prepare(receiver, args);
        async move {
            let prepared = prepared?;
            prepared.finish(body.await)
        }
    }
}
