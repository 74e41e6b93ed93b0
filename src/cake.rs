//! Cake: the namespaced context store
//!
//! Entries are stored under fully-qualified keys: the `.`-joined namespace stack
//! followed by the local key. The namespace stack only changes through scoped
//! push/pop and is never serialised.
//!
//! Lookup resolves a key against the current namespace, then each ancestor up to
//! the root, and finally by an unambiguous suffix match over every entry.

use crate::error::CakeError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::ops::{Deref, DerefMut};
use tracing::trace;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Cake {
    entries: Map<String, Value>,
    namespace: Vec<String>,
}

impl Cake {
    pub const SEPARATOR: &'static str = ".";

    pub fn new() -> Self {
        Self::default()
    }

    /// Join sub-keys into a cake key.
    ///
    /// Fails on an empty list, an empty sub-key, or a sub-key containing the separator.
    pub fn key<S: AsRef<str>>(sub_keys: &[S]) -> Result<String, CakeError> {
        if sub_keys.is_empty() {
            return Err(CakeError::InvalidKey(
                "cannot form cake key; no keys supplied".to_string(),
            ));
        }
        for sub_key in sub_keys {
            validate_sub_key(sub_key.as_ref())?;
        }
        Ok(sub_keys
            .iter()
            .map(AsRef::as_ref)
            .collect::<Vec<_>>()
            .join(Self::SEPARATOR))
    }

    /// Store `value` under `key` relative to the current namespace.
    /// A dotted key addresses a nested namespace.
    pub fn publish<T: Serialize>(&mut self, key: &str, value: T) -> Result<(), CakeError> {
        split_key(key)?;
        let value = serde_json::to_value(value).map_err(|e| CakeError::Serialization {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        let full_key = qualify(&self.namespace, key);
        trace!(key = %full_key, "Publishing cake value");
        self.entries.insert(full_key, value);
        Ok(())
    }

    /// Run `body` with every sub-key of `key` pushed onto the namespace stack.
    /// The stack is restored on return, on error and on unwind.
    pub fn in_namespace<T, E, F>(&mut self, key: &str, body: F) -> Result<T, E>
    where
        F: FnOnce(&mut Cake) -> Result<T, E>,
        E: From<CakeError>,
    {
        let mut guard = self.enter_namespace(key)?;
        body(&mut guard)
    }

    /// Push `key` onto the namespace stack until the returned guard drops
    pub fn enter_namespace(&mut self, key: &str) -> Result<NamespaceGuard<'_>, CakeError> {
        let sub_keys = split_key(key)?;
        let depth = self.namespace.len();
        self.namespace
            .extend(sub_keys.into_iter().map(str::to_string));
        Ok(NamespaceGuard { cake: self, depth })
    }

    /// Current namespace, `.`-joined; empty at the root
    pub fn namespace(&self) -> String {
        self.namespace.join(Self::SEPARATOR)
    }

    pub fn get(&self, key: &str) -> Result<&Value, CakeError> {
        self.get_parts(&[key])
    }

    /// Look up a key given as sub-keys; each part may itself be dotted
    pub fn get_parts<S: AsRef<str>>(&self, key: &[S]) -> Result<&Value, CakeError> {
        if key.is_empty() {
            return Err(CakeError::InvalidKey(
                "cannot get value for empty key".to_string(),
            ));
        }
        let mut sub_keys = Vec::new();
        for part in key {
            sub_keys.extend(split_key(part.as_ref())?);
        }
        let full_key = sub_keys.join(Self::SEPARATOR);

        for depth in (0..=self.namespace.len()).rev() {
            let search_key = qualify(&self.namespace[..depth], &full_key);
            if let Some(value) = self.entries.get(&search_key) {
                return Ok(value);
            }
        }

        let candidates: Vec<&String> = self
            .entries
            .keys()
            .filter(|k| {
                let entry_keys: Vec<&str> = k.split(Self::SEPARATOR).collect();
                entry_keys.ends_with(&sub_keys)
            })
            .collect();

        match candidates.len() {
            1 => Ok(&self.entries[candidates[0].as_str()]),
            0 => Err(CakeError::KeyNotFound(full_key)),
            _ => Err(CakeError::AmbiguousKey {
                key: full_key,
                candidates: candidates.into_iter().cloned().collect(),
            }),
        }
    }

    /// Typed lookup
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Result<T, CakeError> {
        let value = self.get(key)?;
        serde_json::from_value(value.clone()).map_err(|e| CakeError::Serialization {
            key: key.to_string(),
            message: e.to_string(),
        })
    }

    /// Value stored under the current namespace itself
    pub fn get_context(&self) -> Result<&Value, CakeError> {
        if self.namespace.is_empty() {
            return Err(CakeError::NoContext(
                "cannot get context in root namespace".to_string(),
            ));
        }
        let context_key = self.namespace();
        self.entries.get(&context_key).ok_or_else(|| {
            CakeError::NoContext(format!(
                "cake does not contain context value for namespace {}",
                context_key
            ))
        })
    }

    pub fn has_context(&self) -> bool {
        self.get_context().is_ok()
    }

    /// `get(key)` when a key is given, falling back to the context value
    pub fn get_or_get_context(&self, key: Option<&str>) -> Result<&Value, CakeError> {
        if let Some(key) = key {
            if let Ok(value) = self.get(key) {
                return Ok(value);
            }
        }
        self.get_context()
    }

    /// Reverse lookup: the single key whose value equals `value`
    pub fn published_key_for_value(
        &self,
        value: &Value,
        fully_qualified: bool,
    ) -> Result<String, CakeError> {
        let matching: Vec<&String> = self
            .entries
            .iter()
            .filter(|(_, v)| *v == value)
            .map(|(k, _)| k)
            .collect();

        match matching.len() {
            1 if fully_qualified => Ok(matching[0].clone()),
            1 => Ok(matching[0]
                .rsplit(Self::SEPARATOR)
                .next()
                .unwrap_or_default()
                .to_string()),
            0 => Err(CakeError::NoSuchValue(value.to_string())),
            _ => Err(CakeError::AmbiguousValue {
                value: value.to_string(),
                keys: matching.into_iter().cloned().collect(),
            }),
        }
    }

    /// Entries without the namespace stack
    pub fn snapshot(&self) -> Cake {
        Cake {
            entries: self.entries.clone(),
            namespace: Vec::new(),
        }
    }

    /// Exact fully-qualified key check; no namespace resolution
    pub fn contains_key(&self, full_key: &str) -> bool {
        self.entries.contains_key(full_key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.entries.iter()
    }
}

/// Restores the namespace depth of its cake on drop
pub struct NamespaceGuard<'a> {
    cake: &'a mut Cake,
    depth: usize,
}

impl Deref for NamespaceGuard<'_> {
    type Target = Cake;

    fn deref(&self) -> &Cake {
        self.cake
    }
}

impl DerefMut for NamespaceGuard<'_> {
    fn deref_mut(&mut self) -> &mut Cake {
        self.cake
    }
}

impl Drop for NamespaceGuard<'_> {
    fn drop(&mut self) {
        self.cake.namespace.truncate(self.depth);
    }
}

impl Serialize for Cake {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.entries.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Cake {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let entries = Option::<Map<String, Value>>::deserialize(deserializer)?;
        Ok(Cake {
            entries: entries.unwrap_or_default(),
            namespace: Vec::new(),
        })
    }
}

fn validate_sub_key(sub_key: &str) -> Result<(), CakeError> {
    if sub_key.is_empty() {
        return Err(CakeError::InvalidKey("keys cannot be empty".to_string()));
    }
    if sub_key.contains(Cake::SEPARATOR) {
        return Err(CakeError::InvalidKey(format!(
            "keys cannot contain the namespace separator: {}",
            Cake::SEPARATOR
        )));
    }
    Ok(())
}

/// Split a dotted key, rejecting empty sub-keys
fn split_key(key: &str) -> Result<Vec<&str>, CakeError> {
    let sub_keys: Vec<&str> = key.split(Cake::SEPARATOR).collect();
    if sub_keys.iter().any(|k| k.is_empty()) {
        return Err(CakeError::InvalidKey(format!("empty sub-key in '{}'", key)));
    }
    Ok(sub_keys)
}

fn qualify<S: AsRef<str>>(namespace: &[S], key: &str) -> String {
    let mut full_key = String::new();
    for part in namespace {
        full_key.push_str(part.as_ref());
        full_key.push_str(Cake::SEPARATOR);
    }
    full_key.push_str(key);
    full_key
}
