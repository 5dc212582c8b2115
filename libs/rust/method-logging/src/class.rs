//! Class-level interception.
//!
//! A [`ClassInterceptor`] holds one [`MethodInterceptor`] per registered
//! method of a type. Options given at class level apply to every method
//! that has no method-level registration; method-level registration wins
//! regardless of the order the two are declared in. Methods marked in the
//! [`ExclusionSet`] are skipped by class-level wrapping only. Marking a
//! method that is never registered has no effect; calls to it are still
//! rejected as unregistered.

use crate::args::parse_param_names;
use crate::error::InstrumentError;
use crate::interceptor::{LogOptions, MethodInterceptor};
use crate::sink::Instrumented;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::error::Error;
use std::future::Future;

/// Methods excluded from class-level wrapping.
#[derive(Debug, Clone, Default)]
pub struct ExclusionSet {
    methods: HashSet<String>,
}

impl ExclusionSet {
    /// Create an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a method as excluded.
    pub fn mark(&mut self, method: impl Into<String>) {
        self.methods.insert(method.into());
    }

    /// Whether a method is excluded.
    #[must_use]
    pub fn is_marked(&self, method: &str) -> bool {
        self.methods.contains(method)
    }

    /// Number of excluded methods.
    #[must_use]
    pub fn len(&self) -> usize {
        self.methods.len()
    }

    /// Whether no method is excluded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }
}

#[derive(Debug)]
struct Registration {
    params: Vec<String>,
    options: Option<LogOptions>,
}

/// Builder for [`ClassInterceptor`].
#[derive(Debug)]
pub struct ClassInterceptorBuilder {
    class: String,
    options: LogOptions,
    class_methods: Vec<(String, Vec<String>)>,
    method_level: Vec<(String, Registration)>,
    exclusions: ExclusionSet,
}

impl ClassInterceptorBuilder {
    /// Register a method under the class-level options.
    #[must_use]
    pub fn method(mut self, name: impl Into<String>, params: &[&str]) -> Self {
        self.class_methods
            .push((name.into(), params.iter().map(ToString::to_string).collect()));
        self
    }

    /// Register a method under the class-level options, parsing its
    /// parameter names from a signature string.
    #[must_use]
    pub fn method_signature(mut self, name: impl Into<String>, signature: &str) -> Self {
        self.class_methods
            .push((name.into(), parse_param_names(signature)));
        self
    }

    /// Register a method with its own options.
    #[must_use]
    pub fn method_with(
        mut self,
        name: impl Into<String>,
        params: &[&str],
        options: LogOptions,
    ) -> Self {
        self.method_level.push((
            name.into(),
            Registration {
                params: params.iter().map(ToString::to_string).collect(),
                options: Some(options),
            },
        ));
        self
    }

    /// Exclude a method from class-level wrapping.
    #[must_use]
    pub fn exclude(mut self, name: impl Into<String>) -> Self {
        self.exclusions.mark(name);
        self
    }

    /// Resolve registrations into interceptors.
    ///
    /// # Errors
    ///
    /// Returns [`InstrumentError::InvalidTarget`] for an empty method name
    /// or a method registered twice with method-level options.
    pub fn build(self) -> Result<ClassInterceptor, InstrumentError> {
        let mut registrations: HashMap<String, Registration> = HashMap::new();
        let mut exclusions = ExclusionSet::new();

        for (name, registration) in self.method_level {
            if name.is_empty() {
                return Err(InstrumentError::invalid_target(
                    &self.class,
                    name,
                    "method name is empty",
                ));
            }
            if registrations.contains_key(&name) {
                return Err(InstrumentError::invalid_target(
                    &self.class,
                    name,
                    "method is already instrumented with method-level options",
                ));
            }
            if self.exclusions.is_marked(&name) {
                exclusions.mark(name.clone());
            }
            registrations.insert(name, registration);
        }

        for (name, params) in self.class_methods {
            if name.is_empty() {
                return Err(InstrumentError::invalid_target(
                    &self.class,
                    name,
                    "method name is empty",
                ));
            }
            if self.exclusions.is_marked(&name) {
                exclusions.mark(name);
                continue;
            }
            registrations.entry(name).or_insert(Registration {
                params,
                options: None,
            });
        }

        let methods = registrations
            .into_iter()
            .map(|(name, registration)| {
                let options = registration
                    .options
                    .unwrap_or_else(|| self.options.clone());
                let params: Vec<&str> =
                    registration.params.iter().map(String::as_str).collect();
                let interceptor = MethodInterceptor::new(name.clone(), &params, options);
                (name, interceptor)
            })
            .collect();

        Ok(ClassInterceptor {
            class: self.class,
            methods,
            exclusions,
        })
    }
}

/// Interceptors for the registered methods of one type.
#[derive(Debug)]
pub struct ClassInterceptor {
    class: String,
    methods: HashMap<String, MethodInterceptor>,
    exclusions: ExclusionSet,
}

impl ClassInterceptor {
    /// Start building an interceptor for `class` with class-level options.
    #[must_use]
    pub fn builder(class: impl Into<String>, options: LogOptions) -> ClassInterceptorBuilder {
        ClassInterceptorBuilder {
            class: class.into(),
            options,
            class_methods: Vec::new(),
            method_level: Vec::new(),
            exclusions: ExclusionSet::new(),
        }
    }

    /// Type name the interceptor was built for.
    #[must_use]
    pub fn class(&self) -> &str {
        &self.class
    }

    /// Interceptor for a wrapped method.
    #[must_use]
    pub fn interceptor(&self, method: &str) -> Option<&MethodInterceptor> {
        self.methods.get(method)
    }

    /// Whether a method is excluded from class-level wrapping.
    #[must_use]
    pub fn is_excluded(&self, method: &str) -> bool {
        self.exclusions.is_marked(method)
    }

    /// Whether calls to `method` are logged.
    #[must_use]
    pub fn is_wrapped(&self, method: &str) -> bool {
        self.methods.contains_key(method)
    }

    fn lookup(&self, method: &str) -> Result<Option<&MethodInterceptor>, InstrumentError> {
        if let Some(interceptor) = self.methods.get(method) {
            return Ok(Some(interceptor));
        }
        if self.exclusions.is_marked(method) {
            return Ok(None);
        }
        Err(InstrumentError::invalid_target(
            &self.class,
            method,
            "method is not registered",
        ))
    }

    /// Run a synchronous method body, logging it if `method` is wrapped.
    ///
    /// Excluded methods run without logging.
    ///
    /// # Errors
    ///
    /// Returns [`InstrumentError`] (converted into `E`) for an unregistered
    /// method or a receiver without a sink; otherwise the body's own error.
    pub fn call<R, T, E, F>(
        &self,
        method: &str,
        receiver: &R,
        args: &[Value],
        body: F,
    ) -> Result<T, E>
    where
        R: Instrumented + ?Sized,
        F: FnOnce() -> Result<T, E>,
        E: Error + From<InstrumentError> + 'static,
    {
        match self.lookup(method)? {
            Some(interceptor) => interceptor.call(receiver, args, body),
            None => body(),
        }
    }

    /// Run an asynchronous method body, logging it if `method` is wrapped.
    ///
    /// Lookup, capture and the `invoked` event happen before this returns.
    pub fn call_async<'r, R, T, E, Fut>(
        &'r self,
        method: &str,
        receiver: &'r R,
        args: &[Value],
        body: Fut,
    ) -> impl Future<Output = Result<T, E>> + use<'r, R, T, E, Fut>
    where
        R: Instrumented + ?Sized,
        Fut: Future<Output = Result<T, E>>,
        E: Error + From<InstrumentError> + 'static,
    {
        let dispatch = match self.lookup(method) {
            Ok(Some(interceptor)) => {
                Dispatch::Logged(interceptor.call_async(receiver, args, body))
            }
            Ok(None) => Dispatch::Direct(body),
            Err(err) => Dispatch::Rejected(err),
        };
        async move {
            match dispatch {
                Dispatch::Logged(wrapped) => wrapped.await,
                Dispatch::Direct(body) => body.await,
                Dispatch::Rejected(err) => Err(err.into()),
            }
        }
    }
}

enum Dispatch<L, D> {
    Logged(L),
    Direct(D),
    Rejected(InstrumentError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recorder::LogEvent;
    use crate::sink::LogSink;
    use crate::{call_args, param_names};
    use serde_json::json;
    use std::sync::Mutex;
    use thiserror::Error;

    #[derive(Default)]
    struct CollectingSink {
        events: Mutex<Vec<Value>>,
    }

    impl LogSink for CollectingSink {
        fn log(&self, event: &LogEvent<'_>) {
            self.events.lock().unwrap().push(event.to_json());
        }

        fn error(&self, event: &LogEvent<'_>) {
            self.events.lock().unwrap().push(event.to_json());
        }
    }

    #[derive(Default)]
    struct Accounts {
        sink: CollectingSink,
    }

    impl Instrumented for Accounts {
        fn logger(&self) -> Option<&dyn LogSink> {
            Some(&self.sink)
        }
    }

    impl Accounts {
        fn states(&self) -> Vec<(String, String)> {
            self.sink
                .events
                .lock()
                .unwrap()
                .iter()
                .map(|event| {
                    (
                        event["method"].as_str().unwrap_or_default().to_string(),
                        event["state"].as_str().unwrap_or_default().to_string(),
                    )
                })
                .collect()
        }
    }

    #[derive(Debug, Error)]
    enum AccountError {
        #[error("account {0} is frozen")]
        Frozen(u64),
        #[error(transparent)]
        Instrument(#[from] InstrumentError),
    }

    fn pair(method: &str, state: &str) -> (String, String) {
        (method.to_string(), state.to_string())
    }

    #[test]
    fn test_class_options_apply_to_all_methods() {
        let interceptor = ClassInterceptor::builder("Accounts", LogOptions::on_invoke())
            .method("open", param_names!(owner))
            .method("close", param_names!(id))
            .build()
            .unwrap();
        let accounts = Accounts::default();

        let _: Result<(), AccountError> =
            interceptor.call("open", &accounts, &call_args!["ann"], || Ok(()));
        let _: Result<(), AccountError> =
            interceptor.call("close", &accounts, &call_args![1], || Ok(()));

        assert_eq!(
            accounts.states(),
            vec![
                pair("open", "invoked"),
                pair("open", "success"),
                pair("close", "invoked"),
                pair("close", "success"),
            ]
        );
    }

    #[test]
    fn test_method_level_wins_in_either_order() {
        let before = ClassInterceptor::builder("Accounts", LogOptions::on_invoke())
            .method_with("balance", param_names!(id), LogOptions::default())
            .method("balance", param_names!(id))
            .build()
            .unwrap();
        let after = ClassInterceptor::builder("Accounts", LogOptions::on_invoke())
            .method("balance", param_names!(id))
            .method_with("balance", param_names!(id), LogOptions::default())
            .build()
            .unwrap();

        for interceptor in [before, after] {
            let options = interceptor.interceptor("balance").unwrap().options();
            assert!(!options.on_invoke);
        }
    }

    #[test]
    fn test_excluded_method_runs_unlogged() {
        let interceptor = ClassInterceptor::builder("Accounts", LogOptions::default())
            .method("open", &[])
            .method("health", &[])
            .exclude("health")
            .build()
            .unwrap();
        let accounts = Accounts::default();

        let result: Result<u8, AccountError> =
            interceptor.call("health", &accounts, &[], || Ok(1));

        assert_eq!(result.unwrap(), 1);
        assert!(accounts.states().is_empty());
        assert!(interceptor.is_excluded("health"));
        assert!(!interceptor.is_wrapped("health"));
    }

    #[test]
    fn test_exclude_before_registration() {
        let interceptor = ClassInterceptor::builder("Accounts", LogOptions::on_invoke())
            .exclude("health")
            .method("health", &[])
            .build()
            .unwrap();
        let accounts = Accounts::default();

        let result: Result<&str, AccountError> =
            interceptor.call("health", &accounts, &[], || Ok("ok"));

        assert_eq!(result.unwrap(), "ok");
        assert!(accounts.states().is_empty());
        assert!(interceptor.is_excluded("health"));
    }

    #[test]
    fn test_excluded_method_error_is_returned() {
        let interceptor = ClassInterceptor::builder("Accounts", LogOptions::default())
            .method("freeze", param_names!(id))
            .exclude("freeze")
            .build()
            .unwrap();
        let accounts = Accounts::default();

        let result: Result<(), AccountError> =
            interceptor.call("freeze", &accounts, &call_args![9], || Err(AccountError::Frozen(9)));

        assert!(matches!(result, Err(AccountError::Frozen(9))));
        assert!(accounts.states().is_empty());
    }

    #[test]
    fn test_excluding_unregistered_method_has_no_effect() {
        let interceptor = ClassInterceptor::builder("Accounts", LogOptions::default())
            .method("open", &[])
            .exclude("ghost")
            .build()
            .unwrap();
        let accounts = Accounts::default();

        let result: Result<(), AccountError> =
            interceptor.call("ghost", &accounts, &[], || Ok(()));

        assert!(!interceptor.is_excluded("ghost"));
        assert!(matches!(
            result,
            Err(AccountError::Instrument(InstrumentError::InvalidTarget { ref method, .. }))
                if method == "ghost"
        ));
    }

    #[test]
    fn test_exclusion_does_not_affect_method_level() {
        let interceptor = ClassInterceptor::builder("Accounts", LogOptions::default())
            .method_with("audit", &[], LogOptions::default())
            .exclude("audit")
            .build()
            .unwrap();
        let accounts = Accounts::default();

        let _: Result<(), AccountError> = interceptor.call("audit", &accounts, &[], || Ok(()));

        assert_eq!(accounts.states(), vec![pair("audit", "success")]);
    }

    #[test]
    fn test_unregistered_method_is_rejected() {
        let interceptor = ClassInterceptor::builder("Accounts", LogOptions::default())
            .build()
            .unwrap();
        let accounts = Accounts::default();

        let result: Result<(), AccountError> =
            interceptor.call("missing", &accounts, &[], || Ok(()));

        assert!(matches!(
            result,
            Err(AccountError::Instrument(InstrumentError::InvalidTarget { ref method, .. }))
                if method == "missing"
        ));
    }

    #[test]
    fn test_build_rejects_bad_registrations() {
        let empty = ClassInterceptor::builder("Accounts", LogOptions::default())
            .method("", &[])
            .build();
        assert!(matches!(empty, Err(InstrumentError::InvalidTarget { .. })));

        let duplicate = ClassInterceptor::builder("Accounts", LogOptions::default())
            .method_with("open", &[], LogOptions::default())
            .method_with("open", &[], LogOptions::on_invoke())
            .build();
        assert!(matches!(duplicate, Err(InstrumentError::InvalidTarget { .. })));
    }

    #[test]
    fn test_method_signature_registration() {
        let interceptor = ClassInterceptor::builder("Accounts", LogOptions::default())
            .method_signature("transfer", "fn transfer(&self, from: u64, to: u64, amount: u64)")
            .build()
            .unwrap();

        assert_eq!(
            interceptor.interceptor("transfer").unwrap().param_names(),
            ["from", "to", "amount"]
        );
    }

    #[tokio::test]
    async fn test_async_dispatch() {
        let interceptor = ClassInterceptor::builder("Accounts", LogOptions::default())
            .method("load", param_names!(id))
            .method("ping", &[])
            .exclude("ping")
            .build()
            .unwrap();
        let accounts = Accounts::default();

        let loaded: Result<Value, AccountError> = interceptor
            .call_async("load", &accounts, &call_args![3], async { Ok(json!({ "id": 3 })) })
            .await;
        let pinged: Result<(), AccountError> = interceptor
            .call_async("ping", &accounts, &[], async { Ok(()) })
            .await;
        let missing: Result<(), AccountError> = interceptor
            .call_async("nope", &accounts, &[], async { Ok(()) })
            .await;

        assert_eq!(loaded.unwrap(), json!({ "id": 3 }));
        assert!(pinged.is_ok());
        assert!(missing.is_err());
        assert_eq!(accounts.states(), vec![pair("load", "success")]);
    }

    #[test]
    fn test_exclusion_set() {
        let mut set = ExclusionSet::new();
        assert!(set.is_empty());
        set.mark("a");
        set.mark("a");
        assert_eq!(set.len(), 1);
        assert!(set.is_marked("a"));
        assert!(!set.is_marked("b"));
    }
}
