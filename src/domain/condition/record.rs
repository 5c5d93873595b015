//! Record field resolution
//!
//! Records expose their fields by name through an explicit accessor table
//! built alongside the record type, rather than through reflection.

use std::collections::HashMap;

use super::value::Value;

/// A structured object whose fields can be looked up by name.
///
/// `None` means the record has no such field; `Some(Value::Null)` means the
/// field exists but holds no value.
pub trait Record {
    fn field(&self, name: &str) -> Option<Value>;
}

/// Accessor for one named field of `R`
pub type FieldAccessor<R> = fn(&R) -> Value;

/// Static name → accessor registry for a record type
pub struct FieldTable<R: 'static> {
    entries: &'static [(&'static str, FieldAccessor<R>)],
}

impl<R: 'static> FieldTable<R> {
    pub const fn new(entries: &'static [(&'static str, FieldAccessor<R>)]) -> Self {
        Self { entries }
    }

    /// Resolve `name` against `record`
    pub fn resolve(&self, record: &R, name: &str) -> Option<Value> {
        self.entries
            .iter()
            .find(|(field, _)| *field == name)
            .map(|(_, accessor)| accessor(record))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(field, _)| *field == name)
    }

    /// Registered field names in declaration order
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|(field, _)| *field)
    }
}

impl Record for HashMap<String, Value> {
    fn field(&self, name: &str) -> Option<Value> {
        self.get(name).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Person {
        age: i64,
        nickname: Option<String>,
    }

    static PERSON_FIELDS: FieldTable<Person> = FieldTable::new(&[
        ("age", |p: &Person| Value::Int(p.age)),
        ("nickname", |p: &Person| -> Value { p.nickname.clone().into() }),
    ]);

    #[test]
    fn test_field_table_resolves_registered_names() {
        let person = Person { age: 30, nickname: None };
        assert_eq!(PERSON_FIELDS.resolve(&person, "age"), Some(Value::Int(30)));
        assert_eq!(PERSON_FIELDS.resolve(&person, "nickname"), Some(Value::Null));
        assert_eq!(PERSON_FIELDS.resolve(&person, "height"), None);
    }

    #[test]
    fn test_field_table_names() {
        assert!(PERSON_FIELDS.contains("nickname"));
        assert_eq!(PERSON_FIELDS.names().collect::<Vec<_>>(), vec!["age", "nickname"]);
    }

    #[test]
    fn test_hashmap_record() {
        let mut record = HashMap::new();
        record.insert("status".to_string(), Value::from("active"));
        assert_eq!(record.field("status"), Some(Value::from("active")));
        assert_eq!(record.field("missing"), None);
    }
}
