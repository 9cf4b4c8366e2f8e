use crate::telemetry::Category;

/// Default key prefix for all HwSight output.
pub const KEY_PREFIX: &str = "hwsight";

/// Builder for flat output keys.
///
/// Keys follow the pattern:
/// `hwsight/<category>/<host>/<reading_key>`
#[derive(Debug, Clone)]
pub struct KeyBuilder {
    prefix: String,
    category: Category,
}

impl KeyBuilder {
    /// Create a new key builder for a category.
    pub fn new(category: Category) -> Self {
        Self {
            prefix: KEY_PREFIX.to_string(),
            category,
        }
    }

    /// Create a builder with a custom prefix.
    pub fn with_prefix(prefix: impl Into<String>, category: Category) -> Self {
        Self {
            prefix: prefix.into(),
            category,
        }
    }

    /// Build the output key for one reading of a host.
    ///
    /// # Example
    /// ```
    /// use hwsight_common::keyexpr::KeyBuilder;
    /// use hwsight_common::telemetry::Category;
    ///
    /// let builder = KeyBuilder::new(Category::Temperature);
    /// let key = builder.build("server01", "0-1");
    /// assert_eq!(key, "hwsight/temperature/server01/0-1");
    /// ```
    pub fn build(&self, host: &str, reading_key: &str) -> String {
        format!(
            "{}/{}/{}/{}",
            self.prefix,
            self.category.as_str(),
            host,
            reading_key
        )
    }

    /// Build the key for the category's error entry.
    ///
    /// # Example
    /// ```
    /// use hwsight_common::keyexpr::KeyBuilder;
    /// use hwsight_common::telemetry::Category;
    ///
    /// let builder = KeyBuilder::new(Category::Oob);
    /// assert_eq!(builder.error_key("server01"), "hwsight/oob/server01/@/error");
    /// ```
    pub fn error_key(&self, host: &str) -> String {
        format!("{}/{}/{}/@/error", self.prefix, self.category.as_str(), host)
    }
}

/// Parse an output key to extract category, host, and reading key.
///
/// Returns `None` if the key doesn't match the expected pattern.
pub fn parse_key(key: &str) -> Option<ParsedKey<'_>> {
    let parts: Vec<&str> = key.split('/').collect();

    if parts.len() < 4 || parts[0] != KEY_PREFIX {
        return None;
    }

    let category = Category::from_str_opt(parts[1])?;
    let host = parts[2];
    let reading = parts[3..].join("/");

    Some(ParsedKey {
        category,
        host,
        reading,
    })
}

/// Parsed components of an output key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedKey<'a> {
    pub category: Category,
    pub host: &'a str,
    pub reading: String,
}
