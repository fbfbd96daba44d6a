use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
}

impl PropertyValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            PropertyValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Null => f.write_str("-"),
            PropertyValue::Bool(b) => write!(f, "{b}"),
            PropertyValue::Number(n) => write!(f, "{n}"),
            PropertyValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<f64> for PropertyValue {
    fn from(v: f64) -> Self {
        PropertyValue::Number(v)
    }
}

impl From<Option<f64>> for PropertyValue {
    fn from(v: Option<f64>) -> Self {
        v.map_or(PropertyValue::Null, PropertyValue::Number)
    }
}

impl From<&str> for PropertyValue {
    fn from(v: &str) -> Self {
        PropertyValue::Text(v.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(v: String) -> Self {
        PropertyValue::Text(v)
    }
}

impl From<Option<String>> for PropertyValue {
    fn from(v: Option<String>) -> Self {
        v.map_or(PropertyValue::Null, PropertyValue::Text)
    }
}

/// Ordered attribute bag attached to an entity.
///
/// Keys keep insertion order; setting an existing key overwrites in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyBag {
    pairs: Vec<(String, PropertyValue)>,
}

impl PropertyBag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, value: impl Into<PropertyValue>) -> Self {
        self.set(key, value);
        self
    }

    pub fn set(&mut self, key: &str, value: impl Into<PropertyValue>) {
        let value = value.into();
        match self.pairs.iter_mut().find(|(k, _)| k == key) {
            Some((_, v)) => *v = value,
            None => self.pairs.push((key.to_string(), value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&PropertyValue> {
        self.pairs.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn number(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(PropertyValue::as_f64)
    }

    pub fn text(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(PropertyValue::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropertyValue)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::{PropertyBag, PropertyValue};

    #[test]
    fn set_overwrites_in_place() {
        let mut bag = PropertyBag::new().with("a", 1.0).with("b", "x");
        bag.set("a", 2.0);
        let keys: Vec<&str> = bag.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["a", "b"]);
        assert_eq!(bag.number("a"), Some(2.0));
        assert_eq!(bag.text("b"), Some("x"));
    }

    #[test]
    fn optional_values_become_null() {
        let bag = PropertyBag::new()
            .with("height", None::<f64>)
            .with("transect", None::<String>);
        assert_eq!(bag.get("height"), Some(&PropertyValue::Null));
        assert_eq!(bag.get("transect"), Some(&PropertyValue::Null));
        assert!(bag.number("height").is_none());
    }
}
