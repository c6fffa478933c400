//! Tagged values stored in a run context and their checked accessors.

use crate::storage::StorageObject;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;

/// A value stored in a [`Context`](super::Context).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum ContextValue {
    /// Plain text, typically a URI or a local path.
    Text(String),
    /// A storage object reference.
    Object(StorageObject),
    /// Arbitrary structured data.
    Json(serde_json::Value),
}

impl ContextValue {
    /// Returns the name of the stored variant.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Text(_) => String::TYPE_NAME,
            Self::Object(_) => StorageObject::TYPE_NAME,
            Self::Json(_) => serde_json::Value::TYPE_NAME,
        }
    }

    /// Returns the text if this is a text value.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<String> for ContextValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for ContextValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<StorageObject> for ContextValue {
    fn from(value: StorageObject) -> Self {
        Self::Object(value)
    }
}

impl From<serde_json::Value> for ContextValue {
    fn from(value: serde_json::Value) -> Self {
        Self::Json(value)
    }
}

/// Checked conversion out of a [`ContextValue`].
pub trait FromContextValue: Sized {
    /// Name reported in `TypeMismatch` errors.
    const TYPE_NAME: &'static str;

    /// Returns the converted value, or `None` when the variant does not match.
    fn from_context_value(value: &ContextValue) -> Option<Self>;
}

impl FromContextValue for String {
    const TYPE_NAME: &'static str = "text";

    fn from_context_value(value: &ContextValue) -> Option<Self> {
        value.as_text().map(str::to_string)
    }
}

impl FromContextValue for StorageObject {
    const TYPE_NAME: &'static str = "storage object";

    fn from_context_value(value: &ContextValue) -> Option<Self> {
        match value {
            ContextValue::Object(obj) => Some(obj.clone()),
            _ => None,
        }
    }
}

impl FromContextValue for serde_json::Value {
    const TYPE_NAME: &'static str = "json";

    fn from_context_value(value: &ContextValue) -> Option<Self> {
        match value {
            ContextValue::Json(v) => Some(v.clone()),
            _ => None,
        }
    }
}

/// A well-known context key paired with the type stored under it.
pub struct TypedKey<T> {
    name: &'static str,
    _marker: PhantomData<fn() -> T>,
}

impl<T> TypedKey<T> {
    /// Declares a typed key.
    #[must_use]
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            _marker: PhantomData,
        }
    }

    /// Returns the key string.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }
}

impl<T> Clone for TypedKey<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for TypedKey<T> {}

impl<T> fmt::Debug for TypedKey<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TypedKey").field(&self.name).finish()
    }
}

/// Keys shared by convention across pipelines.
pub mod keys {
    use super::TypedKey;
    use crate::storage::StorageObject;

    /// The pipeline's final externally visible result.
    pub const CTX_OUT: TypedKey<String> = TypedKey::new("__ctx_out__");

    /// The object that triggered the run.
    pub const INPUT_OBJECT: TypedKey<StorageObject> = TypedKey::new("__input_object__");
}
