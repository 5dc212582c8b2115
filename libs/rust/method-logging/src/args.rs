//! Argument capture.
//!
//! Pairs a method's parameter names with the values of one call. Names are
//! normally supplied at registration time with [`param_names!`]; parsing a
//! signature string with [`parse_param_names`] is a fallback that degrades
//! on destructuring patterns.
//!
//! [`param_names!`]: crate::param_names

use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use std::sync::Arc;

/// A single captured argument value.
pub use serde_json::Value as ArgValue;

/// Arguments of one call as they appear in log events.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CapturedArgs {
    /// No parameters and no arguments
    #[default]
    Empty,
    /// A single value chosen by a formatter
    Scalar(Value),
    /// Parameter name to argument value, in declaration order
    Named(Map<String, Value>),
}

impl CapturedArgs {
    /// Whether this is [`CapturedArgs::Empty`].
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Number of named entries; zero for empty and scalar captures.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Named(map) => map.len(),
            Self::Empty | Self::Scalar(_) => 0,
        }
    }

    /// Look up a named argument.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        match self {
            Self::Named(map) => map.get(name),
            Self::Empty | Self::Scalar(_) => None,
        }
    }

    /// Render as JSON; `Empty` becomes `null`.
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            Self::Empty => Value::Null,
            Self::Scalar(value) => value.clone(),
            Self::Named(map) => Value::Object(map.clone()),
        }
    }
}

impl Serialize for CapturedArgs {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Empty => serializer.serialize_none(),
            Self::Scalar(value) => value.serialize(serializer),
            Self::Named(map) => map.serialize(serializer),
        }
    }
}

/// Replaces name-based capture with a caller-chosen rendering of the raw
/// positional arguments.
pub type ArgsFormatter = Arc<dyn Fn(&[Value]) -> CapturedArgs + Send + Sync>;

/// Pair parameter names with argument values.
///
/// Yields one entry per name that has a matching value: surplus values are
/// dropped and missing values are omitted. No names and no values yields
/// [`CapturedArgs::Empty`].
///
/// # Examples
///
/// ```
/// use method_logging::{capture_args, CapturedArgs};
/// use serde_json::json;
///
/// let args = capture_args(&["id", "name"], &[json!(1), json!("x")]);
/// assert_eq!(args.to_json(), json!({ "id": 1, "name": "x" }));
///
/// assert_eq!(capture_args::<&str>(&[], &[]), CapturedArgs::Empty);
/// ```
#[must_use]
pub fn capture_args<N: AsRef<str>>(names: &[N], values: &[Value]) -> CapturedArgs {
    if names.is_empty() && values.is_empty() {
        return CapturedArgs::Empty;
    }
    CapturedArgs::Named(
        names
            .iter()
            .zip(values)
            .map(|(name, value)| (name.as_ref().to_string(), value.clone()))
            .collect(),
    )
}

/// Convert an argument to a log value.
///
/// Values that fail to serialize are logged as a placeholder string rather
/// than failing the call.
pub fn to_arg_value<T: Serialize + ?Sized>(value: &T) -> Value {
    serde_json::to_value(value)
        .unwrap_or_else(|err| Value::String(format!("<unserializable: {err}>")))
}

/// Best-effort parameter names from a signature string.
///
/// Accepts either a full signature (`fn find(&self, id: u32) -> User`) or a
/// bare parameter list (`id: u32, name: &str`). Splits on top-level commas,
/// strips type annotations and default expressions, and drops receivers and
/// empty entries.
///
/// # Examples
///
/// ```
/// use method_logging::parse_param_names;
///
/// let names = parse_param_names("fn find(&self, id: u32, filter: HashMap<String, u32>) -> User");
/// assert_eq!(names, vec!["id", "filter"]);
/// ```
#[must_use]
pub fn parse_param_names(signature: &str) -> Vec<String> {
    split_top_level(parameter_list(signature))
        .into_iter()
        .filter_map(|param| {
            let name = param.split(':').next().unwrap_or_default();
            let name = name.split('=').next().unwrap_or_default().trim();
            let name = name.strip_prefix("mut ").map_or(name, str::trim);
            (!name.is_empty() && !is_receiver(name)).then(|| name.to_string())
        })
        .collect()
}

fn parameter_list(signature: &str) -> &str {
    let Some(open) = signature.find('(') else {
        return signature;
    };
    let prefix = signature[..open].trim();
    let is_signature = prefix.split_whitespace().any(|token| token == "fn")
        || (!prefix.is_empty() && !prefix.contains([':', ',', '=']));
    if !is_signature {
        return signature;
    }
    let mut depth = 0usize;
    for (offset, ch) in signature[open..].char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return &signature[open + 1..open + offset];
                }
            }
            _ => {}
        }
    }
    &signature[open + 1..]
}

fn split_top_level(params: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;
    let mut prev = '\0';
    for (idx, ch) in params.char_indices() {
        match ch {
            '(' | '[' | '{' | '<' => depth += 1,
            '>' if prev == '-' => {}
            ')' | ']' | '}' | '>' => depth -= 1,
            ',' if depth == 0 => {
                parts.push(&params[start..idx]);
                start = idx + 1;
            }
            _ => {}
        }
        prev = ch;
    }
    parts.push(&params[start..]);
    parts
}

fn is_receiver(name: &str) -> bool {
    name.split(|c: char| c.is_whitespace() || c == '&')
        .filter(|token| !token.is_empty() && !token.starts_with('\'') && *token != "mut")
        .eq(["self"])
}

/// Parameter names captured at compile time.
///
/// ```
/// use method_logging::param_names;
///
/// assert_eq!(param_names!(id, name), &["id", "name"]);
/// ```
#[macro_export]
macro_rules! param_names {
    ($($name:ident),* $(,)?) => {
        &[$(::core::stringify!($name)),*] as &[&'static str]
    };
}

/// Positional argument values for an intercepted call.
///
/// ```
/// use method_logging::call_args;
/// use serde_json::json;
///
/// let id = 1;
/// assert_eq!(call_args![id, "x"], vec![json!(1), json!("x")]);
/// ```
#[macro_export]
macro_rules! call_args {
    ($($arg:expr),* $(,)?) => {
        ::std::vec![$($crate::args::to_arg_value(&$arg)),*]
            as ::std::vec::Vec<$crate::args::ArgValue>
    };
}
