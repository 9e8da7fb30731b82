//! Bibliography entries and the database that holds them.

use crate::token::Locator;
use crate::value::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Name of the field that links an entry to the entry it inherits fields from.
pub const CROSSREF: &str = "crossref";

/// A bibliographic record.
///
/// An entry consists of:
///
/// - Fields, like `title` or `author`, which are set when the database is loaded.
///     Field names are case insensitive.
///
/// - Entry-local integer and string variables, declared by the style's `ENTRY` command.
///     These are scratch storage for `.bst` functions and are the only part of the
///     entry that changes while a style runs.
///     A variable that was never assigned reads as 0 or the empty string.
///
/// - The locator of the entry in the database source.
#[derive(Debug)]
pub struct Entry {
    entry_type: String,
    key: String,
    fields: HashMap<String, Value>,
    locals: RefCell<Locals>,
    locator: Option<Locator>,
}

#[derive(Debug, Default)]
struct Locals {
    integers: HashMap<String, i64>,
    strings: HashMap<String, String>,
}

impl Entry {
    pub fn new<T: Into<String>, K: Into<String>>(
        entry_type: T,
        key: K,
        locator: Option<Locator>,
    ) -> Entry {
        Entry {
            entry_type: entry_type.into(),
            key: key.into(),
            fields: Default::default(),
            locals: Default::default(),
            locator,
        }
    }

    /// The entry type, e.g. `book`, as written in the database.
    pub fn entry_type(&self) -> &str {
        &self.entry_type
    }

    /// The cite key of the entry.
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn locator(&self) -> Option<&Locator> {
        self.locator.as_ref()
    }

    /// Sets a field, replacing any previous value.
    pub fn set_field<V: Into<Value>>(&mut self, name: &str, value: V) {
        self.fields.insert(name.to_lowercase(), value.into());
    }

    /// Builder-style variant of [Entry::set_field].
    pub fn with_field<V: Into<Value>>(mut self, name: &str, value: V) -> Entry {
        self.set_field(name, value);
        self
    }

    /// Returns the field as stored on this entry, ignoring cross references.
    pub fn field(&self, name: &str) -> &Value {
        static MISSING: Value = Value::Missing;
        self.fields
            .get(&name.to_lowercase())
            .unwrap_or(&MISSING)
    }

    /// The cite key of the entry this entry inherits from, if any.
    pub fn crossref(&self) -> Option<&str> {
        match self.fields.get(CROSSREF) {
            Some(Value::String(key)) if !key.is_empty() => Some(key),
            _ => None,
        }
    }

    /// Returns the field, falling back to the cross-referenced entry in the database.
    ///
    /// Only one level of cross referencing is followed, as in BibTeX.
    pub fn resolve_field(&self, name: &str, database: &Database) -> Value {
        let value = self.field(name);
        if !value.is_null() {
            return value.clone();
        }
        match self.crossref().and_then(|key| database.get(key)) {
            Some(parent) if parent.key() != self.key => parent.field(name).clone(),
            _ => Value::Missing,
        }
    }

    pub fn local_integer(&self, name: &str) -> i64 {
        self.locals
            .borrow()
            .integers
            .get(name)
            .copied()
            .unwrap_or_default()
    }

    pub fn set_local_integer(&self, name: &str, value: i64) {
        self.locals
            .borrow_mut()
            .integers
            .insert(name.to_string(), value);
    }

    pub fn local_string(&self, name: &str) -> String {
        self.locals
            .borrow()
            .strings
            .get(name)
            .cloned()
            .unwrap_or_default()
    }

    pub fn set_local_string<T: Into<String>>(&self, name: &str, value: T) {
        self.locals
            .borrow_mut()
            .strings
            .insert(name.to_string(), value.into());
    }

    /// Forgets the values of all entry-local variables.
    ///
    /// This is done between independent runs of a style over the same entries.
    pub fn reset_locals(&self) {
        *self.locals.borrow_mut() = Default::default();
    }
}

/// The entries of a bibliography, indexed by cite key.
///
/// Cite keys are looked up case insensitively.
/// The database also holds the text of the `@PREAMBLE` commands, in order.
#[derive(Debug, Default)]
pub struct Database {
    entries: Vec<Rc<Entry>>,
    index: HashMap<String, usize>,
    preamble: Vec<String>,
}

impl Database {
    /// Adds an entry to the database and returns the shared handle to it.
    ///
    /// An entry whose key is already present replaces the earlier one.
    pub fn insert(&mut self, entry: Entry) -> Rc<Entry> {
        let entry = Rc::new(entry);
        let key = entry.key().to_lowercase();
        match self.index.get(&key) {
            Some(&i) => self.entries[i] = entry.clone(),
            None => {
                self.index.insert(key, self.entries.len());
                self.entries.push(entry.clone());
            }
        }
        entry
    }

    pub fn get(&self, key: &str) -> Option<&Rc<Entry>> {
        self.index
            .get(&key.to_lowercase())
            .map(|&i| &self.entries[i])
    }

    /// The entries in insertion order.
    pub fn entries(&self) -> &[Rc<Entry>] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn add_preamble<T: Into<String>>(&mut self, text: T) {
        self.preamble.push(text.into());
    }

    pub fn preamble(&self) -> &[String] {
        &self.preamble
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fields_are_case_insensitive() {
        let entry = Entry::new("book", "bible", None).with_field("Title", "The Bible");
        assert_eq!(entry.field("TITLE"), &Value::from("The Bible"));
        assert!(entry.field("author").is_null());
    }

    #[test]
    fn locals_default_and_assign() {
        let entry = Entry::new("book", "bible", None);
        assert_eq!(entry.local_integer("n"), 0);
        assert_eq!(entry.local_string("s"), "");
        entry.set_local_integer("n", 5);
        entry.set_local_string("s", "x");
        assert_eq!(entry.local_integer("n"), 5);
        assert_eq!(entry.local_string("s"), "x");
        entry.reset_locals();
        assert_eq!(entry.local_integer("n"), 0);
        assert_eq!(entry.local_string("s"), "");
    }

    #[test]
    fn crossref_inheritance() {
        let mut database = Database::default();
        database.insert(
            Entry::new("book", "Whole", None)
                .with_field("title", "Whole Book")
                .with_field("year", "1999"),
        );
        let chapter = database.insert(
            Entry::new("inbook", "part", None)
                .with_field("crossref", "WHOLE")
                .with_field("title", "A Chapter"),
        );
        assert_eq!(
            chapter.resolve_field("title", &database),
            Value::from("A Chapter")
        );
        assert_eq!(
            chapter.resolve_field("year", &database),
            Value::from("1999")
        );
        assert!(chapter.resolve_field("author", &database).is_null());
    }

    #[test]
    fn crossref_to_unknown_entry() {
        let mut database = Database::default();
        let entry = database.insert(Entry::new("inbook", "a", None).with_field("crossref", "b"));
        assert!(entry.resolve_field("title", &database).is_null());
    }

    #[test]
    fn database_replaces_duplicate_keys() {
        let mut database = Database::default();
        database.insert(Entry::new("book", "a", None).with_field("title", "1"));
        database.insert(Entry::new("book", "A", None).with_field("title", "2"));
        assert_eq!(database.len(), 1);
        assert_eq!(
            database.get("a").unwrap().field("title"),
            &Value::from("2")
        );
    }

    #[test]
    fn preamble() {
        let mut database = Database::default();
        database.add_preamble("\\def\\a{a}");
        database.add_preamble("\\def\\b{b}");
        assert_eq!(database.preamble().concat(), "\\def\\a{a}\\def\\b{b}");
    }
}
