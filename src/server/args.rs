use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Value half of a `--key value` launch argument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArgValue {
    /// Boolean true: emits the bare `--key` flag
    Switch,
    /// Null: the key is left out entirely
    Absent,
    /// Any other value: emits `--key <value>`
    Value(String),
}

impl From<bool> for ArgValue {
    fn from(value: bool) -> Self {
        if value {
            ArgValue::Switch
        } else {
            ArgValue::Value("false".to_string())
        }
    }
}

impl From<&str> for ArgValue {
    fn from(value: &str) -> Self {
        ArgValue::Value(value.to_string())
    }
}

impl From<String> for ArgValue {
    fn from(value: String) -> Self {
        ArgValue::Value(value)
    }
}

macro_rules! arg_value_from_display {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for ArgValue {
                fn from(value: $ty) -> Self {
                    ArgValue::Value(value.to_string())
                }
            }
        )*
    };
}

arg_value_from_display!(i8, i16, i32, i64, u8, u16, u32, u64, usize, f32, f64);

impl<T: Into<ArgValue>> From<Option<T>> for ArgValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(ArgValue::Absent, Into::into)
    }
}

impl From<Value> for ArgValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => ArgValue::Absent,
            Value::Bool(flag) => flag.into(),
            Value::String(s) => ArgValue::Value(s),
            other => ArgValue::Value(other.to_string()),
        }
    }
}

/// Ordered keyword arguments used to build a server's command line.
///
/// Insertion order is preserved so that the generated flags are stable and
/// a restart reproduces the original invocation exactly.
///
/// # Examples
///
/// ```
/// use mcp_server_manager::server::LaunchArgs;
///
/// let args = LaunchArgs::new()
///     .arg("seed", 42)
///     .arg("debug", true)
///     .arg("label", None::<String>);
///
/// assert_eq!(args.to_cli_args(), vec!["--seed", "42", "--debug"]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchArgs {
    entries: Vec<(String, ArgValue)>,
}

impl LaunchArgs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a `(key, value)` pair, builder style.
    pub fn arg(mut self, key: impl Into<String>, value: impl Into<ArgValue>) -> Self {
        self.push(key, value);
        self
    }

    pub fn push(&mut self, key: impl Into<String>, value: impl Into<ArgValue>) {
        self.entries.push((key.into(), value.into()));
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ArgValue)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value))
    }

    /// Renders the arguments as long-form CLI tokens.
    pub fn to_cli_args(&self) -> Vec<String> {
        let mut tokens = Vec::with_capacity(self.entries.len() * 2);
        for (key, value) in &self.entries {
            match value {
                ArgValue::Absent => {}
                ArgValue::Switch => tokens.push(format!("--{}", key)),
                ArgValue::Value(v) => {
                    tokens.push(format!("--{}", key));
                    tokens.push(v.clone());
                }
            }
        }
        tokens
    }
}

impl<K, V> FromIterator<(K, V)> for LaunchArgs
where
    K: Into<String>,
    V: Into<ArgValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut args = LaunchArgs::new();
        for (key, value) in iter {
            args.push(key, value);
        }
        args
    }
}
