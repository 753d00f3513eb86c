//! Host modules that plugin code may import.

use std::collections::{BTreeSet, HashMap};

/// Name entry that allows importing any name from a module.
pub const WILDCARD: &str = "*";

/// SDK modules plugins build on. Any exported name may be imported.
const SDK_MODULES: &[&str] = &[
    "canvas_sdk.commands",
    "canvas_sdk.effects",
    "canvas_sdk.effects.banner_alert",
    "canvas_sdk.effects.protocol_card",
    "canvas_sdk.effects.task",
    "canvas_sdk.events",
    "canvas_sdk.handlers",
    "canvas_sdk.handlers.base",
    "canvas_sdk.handlers.simple_api",
    "canvas_sdk.protocols",
    "canvas_sdk.templates",
    "canvas_sdk.utils",
    "canvas_sdk.v1.data",
    "canvas_sdk.value_set",
    "canvas_sdk.value_set.v2022",
    "canvas_sdk.views",
    "logger",
];

/// Standard library subset, name by name.
const STANDARD_LIBRARY: &[(&str, &[&str])] = &[
    ("__future__", &["annotations"]),
    ("_strptime", &[]),
    ("base64", &["b64decode", "b64encode"]),
    (
        "datetime",
        &["date", "datetime", "timedelta", "timezone", "UTC"],
    ),
    ("dateutil", &["relativedelta"]),
    ("dateutil.relativedelta", &["relativedelta"]),
    ("decimal", &["Decimal"]),
    ("enum", &["Enum", "StrEnum"]),
    ("functools", &["reduce"]),
    ("hashlib", &["sha256"]),
    ("hmac", &["compare_digest", "new"]),
    ("http", &["HTTPStatus"]),
    ("json", &["dumps", "loads"]),
    ("operator", &["and_"]),
    ("random", &["choices", "uniform", "randint"]),
    (
        "re",
        &["compile", "DOTALL", "IGNORECASE", "match", "search", "split", "sub"],
    ),
    ("string", &["ascii_lowercase", "digits"]),
    ("time", &["time", "sleep"]),
    (
        "typing",
        &[
            "Any",
            "Dict",
            "Final",
            "Iterable",
            "List",
            "NamedTuple",
            "NotRequired",
            "Protocol",
            "Sequence",
            "Tuple",
            "Type",
            "TypedDict",
        ],
    ),
    ("urllib", &["parse"]),
    ("urllib.parse", &["urlencode", "quote"]),
    ("uuid", &["uuid4", "UUID"]),
    ("zoneinfo", &["ZoneInfo"]),
];

/// Third-party libraries the host ships.
const THIRD_PARTY: &[(&str, &[&str])] = &[
    ("arrow", &["get", "now", "utcnow"]),
    ("jwt", &["decode", "encode"]),
    ("pydantic", &["ValidationError"]),
    (
        "requests",
        &[
            "delete",
            "get",
            "patch",
            "post",
            "put",
            "request",
            "RequestException",
            "Response",
        ],
    ),
];

/// Modules importable from inside a plugin, with the names each exposes.
#[derive(Debug, Clone, Default)]
pub struct AllowList {
    modules: HashMap<String, BTreeSet<String>>,
}

impl AllowList {
    /// An allow-list that permits nothing.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The SDK, standard library, and third-party modules the host provides.
    pub fn with_defaults() -> Self {
        let mut list = Self::empty();
        for module in SDK_MODULES {
            list.insert(module, [WILDCARD]);
        }
        for (module, names) in STANDARD_LIBRARY.iter().chain(THIRD_PARTY) {
            list.insert(module, names.iter().copied());
        }
        list
    }

    /// Adds a module with the given importable names (builder form).
    pub fn allow<'a>(mut self, module: &str, names: impl IntoIterator<Item = &'a str>) -> Self {
        self.insert(module, names);
        self
    }

    /// Adds a module with the given importable names. Existing names are kept.
    pub fn insert<'a>(&mut self, module: &str, names: impl IntoIterator<Item = &'a str>) {
        self.modules
            .entry(module.to_string())
            .or_default()
            .extend(names.into_iter().map(str::to_string));
    }

    /// Merges modules from configuration.
    pub fn extend_from(&mut self, extra: &HashMap<String, Vec<String>>) {
        for (module, names) in extra {
            self.insert(module, names.iter().map(String::as_str));
        }
    }

    /// Whether `module` may be imported at all.
    pub fn is_allowed_module(&self, module: &str) -> bool {
        self.modules.contains_key(module)
    }

    /// Whether `name` may be imported from `module`.
    pub fn is_allowed_name(&self, module: &str, name: &str) -> bool {
        self.modules
            .get(module)
            .is_some_and(|names| names.contains(WILDCARD) || names.contains(name))
    }

    /// Allowed module names, sorted.
    pub fn modules(&self) -> Vec<&str> {
        let mut modules: Vec<&str> = self.modules.keys().map(String::as_str).collect();
        modules.sort_unstable();
        modules
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let list = AllowList::with_defaults();
        assert!(list.is_allowed_module("json"));
        assert!(list.is_allowed_name("json", "dumps"));
        assert!(!list.is_allowed_name("json", "JSONDecoder"));
        assert!(list.is_allowed_name("canvas_sdk.effects", "Effect"));
        assert!(!list.is_allowed_module("os"));
        assert!(!list.is_allowed_module("canvas_sdk"));
    }

    #[test]
    fn test_extend_from_config_merges_names() {
        let mut list = AllowList::with_defaults();
        let extra = HashMap::from([(
            "json".to_string(),
            vec!["JSONDecodeError".to_string()],
        )]);
        list.extend_from(&extra);
        assert!(list.is_allowed_name("json", "dumps"));
        assert!(list.is_allowed_name("json", "JSONDecodeError"));
    }
}
