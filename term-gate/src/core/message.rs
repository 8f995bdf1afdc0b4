//! Custom failure messages.

use crate::path::{lookup, FieldPath};
use crate::DataObject;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Information available when rendering a custom message.
#[derive(Debug, Clone, Copy)]
pub struct MessageContext<'a> {
    /// Innermost key of the field, e.g. `product_id`
    pub field: &'a str,
    /// Full path of the field
    pub path: &'a FieldPath,
    /// Innermost array index on the path, `None` outside arrays
    pub index: Option<usize>,
    /// Value under test
    pub value: &'a Value,
    root: &'a DataObject,
}

impl<'a> MessageContext<'a> {
    /// Creates a context for `value` at `path`.
    pub fn new(path: &'a FieldPath, value: &'a Value, root: &'a DataObject) -> Self {
        Self {
            field: path.field_name().unwrap_or(""),
            path,
            index: path.last_index(),
            value,
            root,
        }
    }

    /// Reads another value of the payload by dotted path.
    pub fn lookup(&self, path: &str) -> Option<&'a Value> {
        lookup(self.root, &FieldPath::parse(path))
    }
}

type MessageFn = dyn Fn(&MessageContext<'_>) -> String + Send + Sync;

/// A failure message: fixed text or rendered from a [`MessageContext`].
#[derive(Clone)]
pub enum Message {
    /// Fixed text
    Text(String),
    /// Rendered per failure
    Dynamic(Arc<MessageFn>),
}

impl Message {
    /// Creates a message rendered by `f`.
    pub fn dynamic<F>(f: F) -> Self
    where
        F: Fn(&MessageContext<'_>) -> String + Send + Sync + 'static,
    {
        Self::Dynamic(Arc::new(f))
    }

    /// Renders the message.
    pub fn render(&self, ctx: &MessageContext<'_>) -> String {
        match self {
            Message::Text(text) => text.clone(),
            Message::Dynamic(f) => f(ctx),
        }
    }
}

impl fmt::Debug for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Message::Text(text) => f.debug_tuple("Text").field(text).finish(),
            Message::Dynamic(_) => f.write_str("Dynamic(..)"),
        }
    }
}

impl From<&str> for Message {
    fn from(value: &str) -> Self {
        Message::Text(value.to_string())
    }
}

impl From<String> for Message {
    fn from(value: String) -> Self {
        Message::Text(value)
    }
}
