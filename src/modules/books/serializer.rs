//! Book serializer: JSON representation, field-level validation, and the
//! create/update save path.

use std::collections::BTreeMap;

use serde_json::{Map, Value};
use thiserror::Error;
use time::macros::format_description;
use time::Date;

use folio_store::{Book, BookPatch, BookRepository, NewBook};

/// Fields every inbound draft must carry.
pub const REQUIRED_FIELDS: [&str; 4] = ["title", "author", "publication_date", "available"];

const REQUIRED_MESSAGE: &str = "This field is required.";
const DATE_MESSAGE: &str = "Invalid date format. Use 'YYYY-MM-DD'.";
const BOOLEAN_MESSAGE: &str = "Must be a boolean.";
const NOT_AN_OBJECT_MESSAGE: &str = "Expected a JSON object.";

/// Validation messages keyed by field name.
pub type FieldErrors = BTreeMap<String, String>;

/// Inbound payload: a single draft or an ordered batch.
#[derive(Debug, Clone)]
pub enum Payload {
    One(Value),
    Many(Vec<Value>),
}

/// Outcome of running validation over a payload.
///
/// `validated` is exactly the subset of elements with no errors, order
/// preserved. In batch mode invalid elements are dropped from it; that drop is
/// the contract, callers needing all-or-nothing must check [`Validation::is_valid`].
#[derive(Debug)]
pub struct Validation {
    /// Per-element outcome, `None` for a clean element.
    pub errors: Vec<Option<FieldErrors>>,
    /// The clean drafts, order preserved.
    pub validated: Vec<Map<String, Value>>,
}

impl Validation {
    /// Overall validity: the conjunction of per-element validity.
    pub fn is_valid(&self) -> bool {
        self.errors.iter().all(Option::is_none)
    }
}

/// Records persisted by [`BookSerializer::save`].
#[derive(Debug)]
pub enum Saved {
    One(Book),
    Many(Vec<Book>),
}

#[derive(Debug, Error)]
pub enum SerializerError {
    /// Save was called before validation produced a non-empty validated set.
    #[error("cannot save without validated data")]
    Unvalidated,
    /// A validated draft carries a typed field the store cannot accept
    /// (validation checks presence, not type, for text fields).
    #[error("validated draft has a malformed typed field")]
    Malformed,
    #[error(transparent)]
    Store(#[from] folio_store::StoreError),
}

/// Converts book records to JSON-safe mappings and validated drafts to records.
pub struct BookSerializer {
    instance: Option<Book>,
    payload: Payload,
    validation: Option<Validation>,
}

impl BookSerializer {
    /// Serializer over a single inbound draft (create path).
    pub fn from_draft(draft: Value) -> Self {
        Self {
            instance: None,
            payload: Payload::One(draft),
            validation: None,
        }
    }

    /// Serializer over an ordered batch of drafts (bulk create path).
    pub fn from_drafts(drafts: Vec<Value>) -> Self {
        Self {
            instance: None,
            payload: Payload::Many(drafts),
            validation: None,
        }
    }

    /// Serializer bound to an existing record (update path).
    pub fn for_update(instance: Book, draft: Value) -> Self {
        Self {
            instance: Some(instance),
            payload: Payload::One(draft),
            validation: None,
        }
    }

    /// Render one record as `{title, author, publication_date, available}`.
    pub fn represent(book: &Book) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert("title".to_string(), Value::String(book.title.clone()));
        map.insert("author".to_string(), Value::String(book.author.clone()));
        map.insert(
            "publication_date".to_string(),
            Value::String(format_date(book.publication_date)),
        );
        map.insert("available".to_string(), Value::Bool(book.available));
        map
    }

    /// Render an ordered sequence of records, preserving input order.
    pub fn represent_many<'a>(books: impl IntoIterator<Item = &'a Book>) -> Vec<Value> {
        books
            .into_iter()
            .map(|book| Value::Object(Self::represent(book)))
            .collect()
    }

    /// Run validation, keeping the outcome for [`Self::save`].
    /// Returns overall validity.
    pub fn is_valid(&mut self) -> bool {
        let validation = match &self.payload {
            Payload::One(draft) => validate_all(std::slice::from_ref(draft)),
            Payload::Many(drafts) => validate_all(drafts),
        };
        let valid = validation.is_valid();
        self.validation = Some(validation);
        valid
    }

    /// Validation outcome, present after [`Self::is_valid`] ran.
    pub fn validation(&self) -> Option<&Validation> {
        self.validation.as_ref()
    }

    /// Persist the validated drafts.
    ///
    /// With a bound instance the named fields are overwritten in place;
    /// otherwise a record is created per validated draft. A numeric `rating`
    /// field is honored when present, else new records start unrated.
    pub fn save(&mut self, repo: &dyn BookRepository) -> Result<Saved, SerializerError> {
        let validation = self.validation.as_ref().ok_or(SerializerError::Unvalidated)?;
        if validation.validated.is_empty() {
            return Err(SerializerError::Unvalidated);
        }

        match &self.payload {
            Payload::Many(_) => {
                let mut created = Vec::with_capacity(validation.validated.len());
                for draft in &validation.validated {
                    created.push(repo.insert(new_book_from(draft)?)?);
                }
                Ok(Saved::Many(created))
            }
            Payload::One(_) => {
                let draft = validation
                    .validated
                    .first()
                    .ok_or(SerializerError::Unvalidated)?;

                let saved = match &self.instance {
                    Some(instance) => repo.update(instance.id, patch_from(draft)?)?,
                    None => repo.insert(new_book_from(draft)?)?,
                };
                self.instance = Some(saved.clone());
                Ok(Saved::One(saved))
            }
        }
    }
}

fn validate_all(drafts: &[Value]) -> Validation {
    let mut errors = Vec::with_capacity(drafts.len());
    let mut validated = Vec::new();

    for draft in drafts {
        match validate_single(draft) {
            None => {
                // Checked by validate_single: a clean draft is an object.
                if let Some(object) = draft.as_object() {
                    validated.push(object.clone());
                }
                errors.push(None);
            }
            Some(field_errors) => errors.push(Some(field_errors)),
        }
    }

    Validation { errors, validated }
}

fn validate_single(draft: &Value) -> Option<FieldErrors> {
    let Some(object) = draft.as_object() else {
        let mut errors = FieldErrors::new();
        errors.insert("error".to_string(), NOT_AN_OBJECT_MESSAGE.to_string());
        return Some(errors);
    };

    let mut errors = FieldErrors::new();

    for field in REQUIRED_FIELDS {
        if !object.contains_key(field) {
            errors.insert(field.to_string(), REQUIRED_MESSAGE.to_string());
        }
    }

    if let Some(date) = object.get("publication_date") {
        if parse_date(date).is_none() {
            errors.insert("publication_date".to_string(), DATE_MESSAGE.to_string());
        }
    }

    if let Some(available) = object.get("available") {
        if !available.is_boolean() {
            errors.insert("available".to_string(), BOOLEAN_MESSAGE.to_string());
        }
    }

    if errors.is_empty() {
        None
    } else {
        Some(errors)
    }
}

fn parse_date(value: &Value) -> Option<Date> {
    let raw = value.as_str()?;
    let format = format_description!("[year]-[month]-[day]");
    Date::parse(raw, &format).ok()
}

pub(crate) fn format_date(date: Date) -> String {
    format!(
        "{:04}-{:02}-{:02}",
        date.year(),
        u8::from(date.month()),
        date.day()
    )
}

fn new_book_from(draft: &Map<String, Value>) -> Result<NewBook, SerializerError> {
    Ok(NewBook {
        title: text_field(draft, "title")?,
        author: text_field(draft, "author")?,
        publication_date: date_field(draft)?,
        available: draft
            .get("available")
            .and_then(Value::as_bool)
            .ok_or(SerializerError::Malformed)?,
        rating: draft.get("rating").and_then(Value::as_f64).unwrap_or(0.0),
    })
}

fn patch_from(draft: &Map<String, Value>) -> Result<BookPatch, SerializerError> {
    Ok(BookPatch {
        title: Some(text_field(draft, "title")?),
        author: Some(text_field(draft, "author")?),
        publication_date: Some(date_field(draft)?),
        available: Some(
            draft
                .get("available")
                .and_then(Value::as_bool)
                .ok_or(SerializerError::Malformed)?,
        ),
        rating: draft.get("rating").and_then(Value::as_f64),
    })
}

fn text_field(draft: &Map<String, Value>, field: &str) -> Result<String, SerializerError> {
    draft
        .get(field)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or(SerializerError::Malformed)
}

fn date_field(draft: &Map<String, Value>) -> Result<Date, SerializerError> {
    draft
        .get("publication_date")
        .and_then(parse_date)
        .ok_or(SerializerError::Malformed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_store::MemoryBookStore;
    use serde_json::json;
    use time::macros::date;

    fn test_book() -> Book {
        Book {
            id: 1,
            title: "Test Book".to_string(),
            author: "Test Author".to_string(),
            publication_date: date!(2023 - 01 - 01),
            available: true,
            rating: 0.0,
        }
    }

    #[test]
    fn represent_single() {
        let data = BookSerializer::represent(&test_book());

        assert_eq!(
            Value::Object(data),
            json!({
                "title": "Test Book",
                "author": "Test Author",
                "publication_date": "2023-01-01",
                "available": true,
            })
        );
    }

    #[test]
    fn represent_many_preserves_order() {
        let another = Book {
            id: 2,
            title: "Another Book".to_string(),
            author: "Another Author".to_string(),
            publication_date: date!(2022 - 12 - 31),
            available: false,
            rating: 0.0,
        };

        let data = BookSerializer::represent_many([&test_book(), &another]);

        assert_eq!(
            Value::Array(data),
            json!([
                {
                    "title": "Test Book",
                    "author": "Test Author",
                    "publication_date": "2023-01-01",
                    "available": true,
                },
                {
                    "title": "Another Book",
                    "author": "Another Author",
                    "publication_date": "2022-12-31",
                    "available": false,
                },
            ])
        );
    }

    #[test]
    fn valid_data_passes() {
        let mut serializer = BookSerializer::from_draft(json!({
            "title": "Valid Book",
            "author": "Valid Author",
            "publication_date": "2023-01-01",
            "available": true,
        }));

        assert!(serializer.is_valid());
        let validation = serializer.validation().unwrap();
        assert_eq!(validation.validated.len(), 1);
        assert_eq!(validation.errors, vec![None]);
    }

    #[test]
    fn invalid_date_and_boolean_are_reported_independently() {
        let mut serializer = BookSerializer::from_draft(json!({
            "title": "Invalid Book",
            "author": "Invalid Author",
            "publication_date": "invalid-date",
            "available": "not-a-boolean",
        }));

        assert!(!serializer.is_valid());
        let errors = serializer.validation().unwrap().errors[0].as_ref().unwrap();
        assert_eq!(
            errors.get("publication_date").map(String::as_str),
            Some("Invalid date format. Use 'YYYY-MM-DD'.")
        );
        assert_eq!(
            errors.get("available").map(String::as_str),
            Some("Must be a boolean.")
        );
    }

    #[test]
    fn missing_fields_are_each_reported() {
        let mut serializer = BookSerializer::from_draft(json!({"title": "Missing Fields"}));

        assert!(!serializer.is_valid());
        let errors = serializer.validation().unwrap().errors[0].as_ref().unwrap();
        assert_eq!(errors.len(), 3);
        for field in ["author", "publication_date", "available"] {
            assert_eq!(
                errors.get(field).map(String::as_str),
                Some("This field is required.")
            );
        }
    }

    #[test]
    fn non_object_draft_is_rejected() {
        let mut serializer = BookSerializer::from_draft(json!("not an object"));

        assert!(!serializer.is_valid());
        assert!(serializer.validation().unwrap().errors[0].is_some());
    }

    #[test]
    fn unknown_fields_pass_through() {
        let mut serializer = BookSerializer::from_draft(json!({
            "title": "Valid Book",
            "author": "Valid Author",
            "publication_date": "2023-01-01",
            "available": true,
            "shelf": "A3",
        }));

        assert!(serializer.is_valid());
        let validated = &serializer.validation().unwrap().validated[0];
        assert_eq!(validated.get("shelf"), Some(&json!("A3")));
    }

    #[test]
    fn batch_keeps_only_clean_elements_in_order() {
        let mut serializer = BookSerializer::from_drafts(vec![
            json!({
                "title": "First",
                "author": "A",
                "publication_date": "2020-01-01",
                "available": true,
            }),
            json!({"title": "Broken"}),
            json!({
                "title": "Third",
                "author": "C",
                "publication_date": "2021-01-01",
                "available": false,
            }),
        ]);

        // One invalid element makes the batch invalid overall, but the clean
        // subset survives, in order.
        assert!(!serializer.is_valid());
        let validation = serializer.validation().unwrap();
        assert_eq!(validation.errors.len(), 3);
        assert!(validation.errors[1].is_some());
        assert_eq!(validation.validated.len(), 2);
        assert_eq!(validation.validated[0].get("title"), Some(&json!("First")));
        assert_eq!(validation.validated[1].get("title"), Some(&json!("Third")));
    }

    #[test]
    fn save_creates_a_record() {
        let store = MemoryBookStore::new();
        let mut serializer = BookSerializer::from_draft(json!({
            "title": "New Book",
            "author": "New Author",
            "publication_date": "2023-01-01",
            "available": true,
        }));

        assert!(serializer.is_valid());
        let saved = serializer.save(&store).unwrap();

        match saved {
            Saved::One(book) => {
                assert_eq!(book.title, "New Book");
                assert_eq!(book.author, "New Author");
                assert_eq!(book.rating, 0.0);
            }
            Saved::Many(_) => panic!("expected a single record"),
        }
    }

    #[test]
    fn save_honors_a_numeric_rating_field() {
        let store = MemoryBookStore::new();
        let mut serializer = BookSerializer::from_draft(json!({
            "title": "Rated Book",
            "author": "Author",
            "publication_date": "2023-01-01",
            "available": true,
            "rating": 4.5,
        }));

        assert!(serializer.is_valid());
        match serializer.save(&store).unwrap() {
            Saved::One(book) => assert_eq!(book.rating, 4.5),
            Saved::Many(_) => panic!("expected a single record"),
        }
    }

    #[test]
    fn save_updates_a_bound_instance() {
        let store = MemoryBookStore::new();
        let existing = store
            .insert(NewBook {
                title: "Test Book".to_string(),
                author: "Test Author".to_string(),
                publication_date: date!(2023 - 01 - 01),
                available: true,
                rating: 0.0,
            })
            .unwrap();

        let mut serializer = BookSerializer::for_update(
            existing.clone(),
            json!({
                "title": "Updated Book",
                "author": "Updated Author",
                "publication_date": "2024-01-01",
                "available": false,
            }),
        );

        assert!(serializer.is_valid());
        serializer.save(&store).unwrap();

        let updated = store.get(existing.id).unwrap().unwrap();
        assert_eq!(updated.title, "Updated Book");
        assert_eq!(updated.author, "Updated Author");
        assert_eq!(updated.publication_date, date!(2024 - 01 - 01));
        assert!(!updated.available);
    }

    #[test]
    fn save_creates_one_record_per_clean_batch_element() {
        let store = MemoryBookStore::new();
        let mut serializer = BookSerializer::from_drafts(vec![
            json!({
                "title": "First",
                "author": "A",
                "publication_date": "2020-01-01",
                "available": true,
            }),
            json!({"title": "Broken"}),
            json!({
                "title": "Third",
                "author": "C",
                "publication_date": "2021-01-01",
                "available": false,
            }),
        ]);

        serializer.is_valid();
        match serializer.save(&store).unwrap() {
            Saved::Many(books) => {
                assert_eq!(books.len(), 2);
                assert_eq!(books[0].title, "First");
                assert_eq!(books[1].title, "Third");
            }
            Saved::One(_) => panic!("expected a batch"),
        }
        assert_eq!(store.count().unwrap(), 2);
    }

    #[test]
    fn save_without_validation_fails() {
        let store = MemoryBookStore::new();
        let mut serializer = BookSerializer::from_draft(json!({
            "title": "New Book",
            "author": "New Author",
            "publication_date": "2023-01-01",
            "available": true,
        }));

        assert!(matches!(
            serializer.save(&store),
            Err(SerializerError::Unvalidated)
        ));
    }

    #[test]
    fn save_with_nothing_validated_fails() {
        let store = MemoryBookStore::new();
        let mut serializer = BookSerializer::from_drafts(vec![json!({"title": "Broken"})]);

        serializer.is_valid();
        assert!(matches!(
            serializer.save(&store),
            Err(SerializerError::Unvalidated)
        ));
    }
}
