//! Decoded record values.


use crate::asset::PPtr;

/// One decoded field value.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Bool(bool),
    UInt8(u8),
    UInt16(u16),
    Int32(i32),
    Int64(i64),
    Float(f32),
    String(String),
    Bytes(Vec<u8>),
    PPtr(PPtr),
    Array(Vec<Value>),
    Record(Record),
}

impl Value {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            Self::UInt8(v) => Some(*v != 0),
            _ => None,
        }
    }

    /// Integer view of any integral variant.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::UInt8(v) => Some(*v as i64),
            Self::UInt16(v) => Some(*v as i64),
            Self::Int32(v) => Some(*v as i64),
            Self::Int64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Self::Int32(v) => Some(*v),
            _ => self.as_i64().and_then(|v| i32::try_from(v).ok()),
        }
    }

    pub fn as_f32(&self) -> Option<f32> {
        match self {
            Self::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Bytes(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_pptr(&self) -> Option<PPtr> {
        match self {
            Self::PPtr(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Self::Array(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Self::Record(v) => Some(v),
            _ => None,
        }
    }
}

/// Ordered field-name to value mapping produced for one object.
///
/// Field order is schema order. Names are the schema's static names.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Record {
    fields: Vec<(&'static str, Value)>,
}

impl Record {
    /// Create an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a field (schema order).
    pub fn push(&mut self, name: &'static str, value: Value) {
        self.fields.push((name, value));
    }

    /// Get a field by name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.iter().find(|(k, _)| *k == name).map(|(_, v)| v)
    }

    /// Check if a field exists.
    pub fn contains(&self, name: &str) -> bool {
        self.fields.iter().any(|(k, _)| *k == name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterate over fields in schema order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &Value)> {
        self.fields.iter().map(|(k, v)| (*k, v))
    }

    /// Field names in schema order.
    pub fn keys(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().map(|(k, _)| *k)
    }

    pub fn str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }

    pub fn f32(&self, name: &str) -> Option<f32> {
        self.get(name).and_then(Value::as_f32)
    }

    pub fn i32(&self, name: &str) -> Option<i32> {
        self.get(name).and_then(Value::as_i32)
    }

    pub fn bool(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(Value::as_bool)
    }

    pub fn pptr(&self, name: &str) -> Option<PPtr> {
        self.get(name).and_then(Value::as_pptr)
    }

    pub fn bytes(&self, name: &str) -> Option<&[u8]> {
        self.get(name).and_then(Value::as_bytes)
    }

    pub fn array(&self, name: &str) -> Option<&[Value]> {
        self.get(name).and_then(Value::as_array)
    }

    pub fn record(&self, name: &str) -> Option<&Record> {
        self.get(name).and_then(Value::as_record)
    }

    /// Array of strings; `None` if the field is missing or any element is not a string.
    pub fn strings(&self, name: &str) -> Option<Vec<String>> {
        self.array(name)?
            .iter()
            .map(|v| v.as_str().map(str::to_string))
            .collect()
    }

    /// Array of floats.
    pub fn floats(&self, name: &str) -> Option<Vec<f32>> {
        self.array(name)?.iter().map(Value::as_f32).collect()
    }

    /// Array of references.
    pub fn pptrs(&self, name: &str) -> Option<Vec<PPtr>> {
        self.array(name)?.iter().map(Value::as_pptr).collect()
    }

    /// Array of nested records.
    pub fn records(&self, name: &str) -> Option<Vec<&Record>> {
        self.array(name)?.iter().map(Value::as_record).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_access() {
        let mut r = Record::new();
        r.push("Name", Value::String("ParamAngleX".into()));
        r.push("Weight", Value::Float(0.5));
        r.push("Link", Value::Array(vec![Value::String("a".into()), Value::String("b".into())]));
        assert_eq!(r.str("Name"), Some("ParamAngleX"));
        assert_eq!(r.f32("Weight"), Some(0.5));
        assert_eq!(r.strings("Link").unwrap(), vec!["a", "b"]);
        assert!(r.floats("Link").is_none());
        assert!(r.get("Missing").is_none());
        assert_eq!(r.keys().collect::<Vec<_>>(), vec!["Name", "Weight", "Link"]);
    }

    #[test]
    fn test_integer_views() {
        assert_eq!(Value::Int64(5).as_i32(), Some(5));
        assert_eq!(Value::Int64(i64::MAX).as_i32(), None);
        assert_eq!(Value::UInt8(1).as_bool(), Some(true));
    }
}
