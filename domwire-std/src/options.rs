//! Class and method options.
//!
//! Options are given as JSON objects when a class, namespace or directory is
//! registered:
//!
//! ```json
//! {
//!     "separator": "_",
//!     "protected": ["helper"],
//!     "__di": { "repo": "$userRepository" },
//!     "functions": {
//!         "*": { "__before": "checkAuth" },
//!         "save,delete": {
//!             "__after": { "audit": ["write"] },
//!             "confirm": true
//!         }
//!     }
//! }
//! ```
//!
//! `separator`, `protected`, `excluded` and `__di` are class-wide. Under
//! `functions`, each key is a comma-separated list of method names (`*` for
//! every method). Method keys starting with `__` configure the server, every
//! other key is passed through to client code generation.

use domwire_core::{HookCall, Separator, SetupError, is_identifier};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// The method key matching every method.
pub const WILDCARD: &str = "*";

/// Options of one method (or of every method, under [`WILDCARD`]).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MethodOptions {
    /// Hooks run before the method.
    pub before: Option<Vec<HookCall>>,
    /// Hooks run after the method.
    pub after: Option<Vec<HookCall>>,
    /// Attribute name to binding key, injected before the method runs.
    pub di: BTreeMap<String, String>,
    /// Opaque options for client code generation.
    pub client: Map<String, Value>,
}

impl MethodOptions {
    /// Merge `other` on top of `self`.
    ///
    /// Hook lists set in `other` replace those of `self`; maps merge key-wise.
    pub fn merge(mut self, other: MethodOptions) -> Self {
        if other.before.is_some() {
            self.before = other.before;
        }
        if other.after.is_some() {
            self.after = other.after;
        }
        self.di.extend(other.di);
        self.client.extend(other.client);
        self
    }

    fn parse(target: &str, value: &Value) -> Result<Self, SetupError> {
        let Value::Object(map) = value else {
            return Err(invalid(target, "method options must be an object"));
        };
        let mut options = MethodOptions::default();
        for (key, value) in map {
            match key.as_str() {
                "__before" => options.before = Some(parse_hooks(target, key, value)?),
                "__after" => options.after = Some(parse_hooks(target, key, value)?),
                "__di" => options.di = parse_di(target, value)?,
                _ if key.starts_with("__") => {
                    return Err(invalid(target, &format!("unknown server option `{key}`")));
                }
                _ => {
                    options.client.insert(key.clone(), value.clone());
                }
            }
        }
        Ok(options)
    }
}

/// Options of one class.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassOptions {
    /// Client-side separator for this class.
    pub separator: Option<Separator>,
    /// Methods hidden from the client.
    pub protected: Vec<String>,
    /// Leave the class out of client export.
    pub excluded: Option<bool>,
    /// Attribute name to binding key, injected at construction.
    pub di: BTreeMap<String, String>,
    /// Per-method options, keyed by single method name or [`WILDCARD`].
    pub functions: BTreeMap<String, MethodOptions>,
    /// Class-level client options.
    pub client: Map<String, Value>,
}

impl ClassOptions {
    /// Parse options for `target`. `null` means no options.
    pub fn from_value(target: &str, value: &Value) -> Result<Self, SetupError> {
        let map = match value {
            Value::Null => return Ok(Self::default()),
            Value::Object(map) => map,
            _ => return Err(invalid(target, "options must be an object")),
        };
        let mut options = ClassOptions::default();
        for (key, value) in map {
            match key.as_str() {
                "separator" => {
                    let sep = value.as_str().and_then(Separator::parse).ok_or_else(|| {
                        invalid(target, "`separator` must be \".\" or \"_\"")
                    })?;
                    options.separator = Some(sep);
                }
                "protected" => options.protected = parse_names(target, key, value)?,
                "excluded" => {
                    let excluded = value
                        .as_bool()
                        .ok_or_else(|| invalid(target, "`excluded` must be a boolean"))?;
                    options.excluded = Some(excluded);
                }
                "__di" => options.di = parse_di(target, value)?,
                "functions" => options.functions = parse_functions(target, value)?,
                _ if key.starts_with("__") => {
                    return Err(invalid(target, &format!("unknown server option `{key}`")));
                }
                _ => {
                    options.client.insert(key.clone(), value.clone());
                }
            }
        }
        Ok(options)
    }

    /// Merge `explicit` on top of `self`.
    ///
    /// Scalars from `explicit` win, lists concatenate, maps merge key-wise.
    pub fn merge(mut self, explicit: ClassOptions) -> Self {
        self.separator = explicit.separator.or(self.separator);
        self.excluded = explicit.excluded.or(self.excluded);
        for name in explicit.protected {
            if !self.protected.contains(&name) {
                self.protected.push(name);
            }
        }
        self.di.extend(explicit.di);
        for (method, options) in explicit.functions {
            let merged = match self.functions.remove(&method) {
                Some(base) => base.merge(options),
                None => options,
            };
            self.functions.insert(method, merged);
        }
        self.client.extend(explicit.client);
        self
    }

    /// Returns `true` if the class is left out of client export.
    pub fn is_excluded(&self) -> bool {
        self.excluded.unwrap_or(false)
    }

    /// The effective options of `method`: the wildcard entry, then the exact one.
    pub fn method(&self, method: &str) -> MethodOptions {
        let wildcard = self.functions.get(WILDCARD).cloned().unwrap_or_default();
        match self.functions.get(method) {
            Some(exact) => wildcard.merge(exact.clone()),
            None => wildcard,
        }
    }
}

fn invalid(target: &str, reason: &str) -> SetupError {
    SetupError::InvalidOptions {
        target: target.to_string(),
        reason: reason.to_string(),
    }
}

fn split_names(list: &str) -> impl Iterator<Item = &str> {
    list.split(',').map(str::trim).filter(|s| !s.is_empty())
}

fn check_method(target: &str, name: &str) -> Result<(), SetupError> {
    if name == WILDCARD || is_identifier(name) {
        Ok(())
    } else {
        Err(SetupError::InvalidName(format!("{target}::{name}")))
    }
}

fn parse_names(target: &str, key: &str, value: &Value) -> Result<Vec<String>, SetupError> {
    let names: Vec<String> = match value {
        Value::String(list) => split_names(list).map(str::to_string).collect(),
        Value::Array(items) => items
            .iter()
            .map(|item| {
                item.as_str()
                    .map(|s| s.trim().to_string())
                    .ok_or_else(|| invalid(target, &format!("`{key}` entries must be strings")))
            })
            .collect::<Result<_, _>>()?,
        _ => return Err(invalid(target, &format!("`{key}` must be a string or a list"))),
    };
    for name in &names {
        check_method(target, name)?;
    }
    Ok(names)
}

fn parse_hooks(target: &str, key: &str, value: &Value) -> Result<Vec<HookCall>, SetupError> {
    let hooks: Vec<HookCall> = match value {
        Value::String(_) | Value::Array(_) => parse_names(target, key, value)?
            .into_iter()
            .map(HookCall::new)
            .collect(),
        Value::Object(map) => map
            .iter()
            .map(|(method, args)| {
                let args = match args {
                    Value::Null => Vec::new(),
                    Value::Array(args) => args.clone(),
                    other => vec![other.clone()],
                };
                HookCall::with_args(method.trim(), args)
            })
            .collect(),
        _ => return Err(invalid(target, &format!("`{key}` must be a string, a list or a map"))),
    };
    for hook in &hooks {
        if !is_identifier(&hook.method) {
            return Err(SetupError::InvalidName(format!("{target}::{}", hook.method)));
        }
    }
    Ok(hooks)
}

fn parse_di(target: &str, value: &Value) -> Result<BTreeMap<String, String>, SetupError> {
    let Value::Object(map) = value else {
        return Err(invalid(target, "`__di` must map attributes to binding keys"));
    };
    map.iter()
        .map(|(attr, key)| match key.as_str() {
            Some(key) => Ok((attr.clone(), key.to_string())),
            None => Err(invalid(target, &format!("binding key of `{attr}` must be a string"))),
        })
        .collect()
}

fn parse_functions(
    target: &str,
    value: &Value,
) -> Result<BTreeMap<String, MethodOptions>, SetupError> {
    let Value::Object(map) = value else {
        return Err(invalid(target, "`functions` must be an object"));
    };
    let mut functions: BTreeMap<String, MethodOptions> = BTreeMap::new();
    for (list, value) in map {
        let options = MethodOptions::parse(target, value)?;
        for name in split_names(list) {
            check_method(target, name)?;
            let merged = match functions.remove(name) {
                Some(base) => base.merge(options.clone()),
                None => options.clone(),
            };
            functions.insert(name.to_string(), merged);
        }
    }
    Ok(functions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_full_options() {
        let options = ClassOptions::from_value(
            "Sample",
            &json!({
                "separator": "_",
                "protected": "helper, other",
                "__di": {"repo": "$repo"},
                "functions": {
                    "*": {"__before": "auth"},
                    "save,delete": {"__after": {"audit": ["write"]}, "confirm": true}
                },
                "label": "Samples"
            }),
        )
        .unwrap();

        assert_eq!(options.separator, Some(Separator::Underscore));
        assert_eq!(options.protected, ["helper", "other"]);
        assert_eq!(options.di.get("repo").map(String::as_str), Some("$repo"));
        assert_eq!(options.client.get("label"), Some(&json!("Samples")));

        let save = options.method("save");
        assert_eq!(save.before, Some(vec![HookCall::new("auth")]));
        assert_eq!(
            save.after,
            Some(vec![HookCall::with_args("audit", vec![json!("write")])])
        );
        assert_eq!(save.client.get("confirm"), Some(&json!(true)));

        let list = options.method("list");
        assert_eq!(list.before, Some(vec![HookCall::new("auth")]));
        assert!(list.after.is_none());
    }

    #[test]
    fn test_hook_forms() {
        let parse = |v: Value| parse_hooks("T", "__before", &v).unwrap();
        assert_eq!(parse(json!("a")), vec![HookCall::new("a")]);
        assert_eq!(parse(json!("a,b")), vec![HookCall::new("a"), HookCall::new("b")]);
        assert_eq!(parse(json!(["a", "b"])), vec![HookCall::new("a"), HookCall::new("b")]);
        assert_eq!(
            parse(json!({"a": 1})),
            vec![HookCall::with_args("a", vec![json!(1)])]
        );
    }

    #[test]
    fn test_malformed_options() {
        assert!(ClassOptions::from_value("T", &json!(3)).is_err());
        assert!(ClassOptions::from_value("T", &json!({"separator": "/"})).is_err());
        assert!(ClassOptions::from_value("T", &json!({"__bogus": 1})).is_err());
        assert!(ClassOptions::from_value("T", &json!({"functions": {"9x": {}}})).is_err());
        assert!(ClassOptions::from_value("T", &json!({"__di": {"a": 1}})).is_err());
        assert_eq!(
            ClassOptions::from_value("T", &Value::Null).unwrap(),
            ClassOptions::default()
        );
    }

    #[test]
    fn test_merge_rules() {
        let base = ClassOptions::from_value(
            "T",
            &json!({
                "separator": ".",
                "protected": ["a"],
                "__di": {"x": "$x", "y": "$y"},
                "functions": {"m": {"__before": "a", "label": "base"}}
            }),
        )
        .unwrap();
        let explicit = ClassOptions::from_value(
            "T",
            &json!({
                "separator": "_",
                "protected": ["b", "a"],
                "__di": {"y": "$other"},
                "functions": {"m": {"label": "explicit", "icon": "x"}}
            }),
        )
        .unwrap();

        let merged = base.merge(explicit);
        assert_eq!(merged.separator, Some(Separator::Underscore));
        assert_eq!(merged.protected, ["a", "b"]);
        assert_eq!(merged.di.get("y").map(String::as_str), Some("$other"));
        assert_eq!(merged.di.len(), 2);

        let m = merged.method("m");
        assert_eq!(m.before, Some(vec![HookCall::new("a")]));
        assert_eq!(m.client.get("label"), Some(&json!("explicit")));
        assert_eq!(m.client.get("icon"), Some(&json!("x")));
    }
}
