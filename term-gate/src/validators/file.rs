//! Uploaded file descriptor validator.

use super::{field_rule_builders, FieldRules, Gate, Validator};
use crate::core::ValidationContext;
use serde_json::Value;

/// Validates an uploaded file descriptor:
///
/// ```json
/// {"name": "avatar.png", "size": 20480, "content_type": "image/png"}
/// ```
///
/// `size` is in bytes. Allowed content types may end in `/*` to accept a whole
/// family (`image/*`).
#[derive(Debug, Clone, Default)]
pub struct FileValidator {
    rules: FieldRules,
    max_size: Option<u64>,
    content_types: Vec<String>,
    extensions: Vec<String>,
}

impl FileValidator {
    /// Creates a validator accepting any well-formed descriptor.
    pub fn new() -> Self {
        Self::default()
    }

    /// Maximum size in bytes.
    pub fn max_size(mut self, bytes: u64) -> Self {
        self.max_size = Some(bytes);
        self
    }

    /// Allowed content types, exact or `family/*`.
    pub fn content_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.content_types
            .extend(types.into_iter().map(|t| t.into().to_ascii_lowercase()));
        self
    }

    /// Allowed file name extensions, without the dot.
    pub fn extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extensions
            .extend(extensions.into_iter().map(|e| e.into().to_ascii_lowercase()));
        self
    }

    fn type_allowed(&self, content_type: &str) -> bool {
        let content_type = content_type.to_ascii_lowercase();
        self.content_types.iter().any(|allowed| match allowed.strip_suffix("/*") {
            Some(family) => content_type
                .split_once('/')
                .is_some_and(|(f, _)| f == family),
            None => *allowed == content_type,
        })
    }

    fn extension_allowed(&self, name: &str) -> bool {
        name.rsplit_once('.')
            .is_some_and(|(_, ext)| self.extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
    }
}

field_rule_builders!(FileValidator);

impl Validator for FileValidator {
    fn validate(&self, ctx: &ValidationContext<'_>, value: Option<&Value>) -> Vec<String> {
        let value = match self.rules.gate(ctx, value) {
            Gate::Present(v) => v,
            Gate::Skip => return Vec::new(),
            Gate::Fail(message) => return vec![message],
        };
        let path = ctx.path();
        let descriptor = value.as_object().and_then(|file| {
            let name = file.get("name")?.as_str()?;
            let size = file.get("size")?.as_u64()?;
            let content_type = file.get("content_type")?.as_str()?;
            Some((name, size, content_type))
        });
        let Some((name, size, content_type)) = descriptor else {
            return vec![format!("{path} must be a file")];
        };

        let mut messages = Vec::new();
        if let Some(max) = self.max_size.filter(|max| size > *max) {
            messages.push(format!("{path} must not be larger than {max} bytes"));
        }
        if !self.content_types.is_empty() && !self.type_allowed(content_type) {
            messages.push(format!(
                "{path} must be a file of type: {}",
                self.content_types.join(", ")
            ));
        }
        if !self.extensions.is_empty() && !self.extension_allowed(name) {
            messages.push(format!(
                "{path} must have one of the extensions: {}",
                self.extensions.join(", ")
            ));
        }
        self.rules.finish(ctx, value, &mut messages);
        messages
    }
}
