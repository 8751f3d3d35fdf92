//! Front-matter parsing

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use indexmap::IndexMap;
use serde_yaml::{Mapping, Value};

use crate::error::{Error, Result};

/// Date-time layouts accepted in the `date` field
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%B %e, %Y %l:%M %p",
];

/// Date-only layouts accepted in the `date` field
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%B %e, %Y", "%b %e, %Y"];

/// Metadata parsed from the leading `---` block of a document.
///
/// Values are kept as strings in document order; lists are joined with
/// `", "` so they remain usable as template fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrontMatter {
    fields: IndexMap<String, String>,
}

impl FrontMatter {
    /// Split `content` into its metadata and body.
    ///
    /// A document without a leading `---` line has empty metadata and the
    /// whole text as body. A block that opens but never closes, or holds
    /// something other than a YAML mapping, is an error naming `path`.
    pub fn parse<'a>(path: &str, content: &'a str) -> Result<(Self, &'a str)> {
        let Some(rest) = strip_delimiter_line(content) else {
            return Ok((Self::default(), content));
        };

        let mut offset = 0;
        for line in rest.split_inclusive('\n') {
            if line.trim_end() == "---" || line.trim_end() == "..." {
                let yaml = &rest[..offset];
                let body = &rest[offset + line.len()..];
                let fields = parse_fields(path, yaml)?;
                return Ok((Self { fields }, body.trim_start_matches(['\n', '\r'])));
            }
            offset += line.len();
        }

        Err(Error::InvalidFrontMatter {
            path: path.to_string(),
            source: serde::de::Error::custom("metadata block is never closed with `---`"),
        })
    }

    /// Look up a field
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    /// Look up a field that must be present and non-empty
    pub fn require(&self, path: &str, field: &'static str) -> Result<&str> {
        match self.get(field) {
            Some(value) if !value.trim().is_empty() => Ok(value),
            _ => Err(Error::MissingField {
                path: path.to_string(),
                field,
            }),
        }
    }

    /// Iterate over all fields in document order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Whether no fields were given
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Consume the opening `---` line, if the document starts with one
fn strip_delimiter_line(content: &str) -> Option<&str> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let (first, rest) = match content.split_once('\n') {
        Some((first, rest)) => (first, rest),
        None => (content, ""),
    };
    (first.trim_end() == "---").then_some(rest)
}

fn parse_fields(path: &str, yaml: &str) -> Result<IndexMap<String, String>> {
    let mut fields = IndexMap::new();
    if yaml.trim().is_empty() {
        return Ok(fields);
    }

    let mapping: Mapping =
        serde_yaml::from_str(yaml).map_err(|source| Error::InvalidFrontMatter {
            path: path.to_string(),
            source,
        })?;

    for (key, value) in mapping {
        let Some(key) = scalar_to_string(&key) else {
            continue;
        };
        match value_to_string(&value) {
            Some(value) => {
                fields.insert(key, value);
            }
            None => tracing::debug!("{}: skipping nested metadata field `{}`", path, key),
        }
    }

    Ok(fields)
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null => Some(String::new()),
        _ => None,
    }
}

fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::Sequence(items) => {
            let items: Option<Vec<_>> = items.iter().map(scalar_to_string).collect();
            items.map(|items| items.join(", "))
        }
        Value::Tagged(tagged) => value_to_string(&tagged.value),
        other => scalar_to_string(other),
    }
}

/// Parse a `date` field into a naive date-time.
///
/// Offsets in RFC 3339 and RFC 2822 values are normalised to UTC so the
/// result never depends on the machine's local zone.
pub fn parse_date(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();

    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, fmt) {
            return Some(dt);
        }
    }

    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(value, fmt) {
            return d.and_hms_opt(0, 0, 0);
        }
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_utc());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(value) {
        return Some(dt.naive_utc());
    }

    None
}
