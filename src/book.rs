use std::collections::HashSet;

use schemars::JsonSchema;
use serde::{de::DeserializeOwned, Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use validator::Validate;

use crate::{error::FieldViolation, traits::Violations};

/// A catalog entry, keyed by its ISBN.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema, sqlx::FromRow)]
pub struct Book {
    pub isbn: String,
    pub amazon_url: String,
    pub author: String,
    pub language: String,
    pub pages: i32,
    pub publisher: String,
    pub title: String,
    pub year: i32,
}

/// Request body for creating a book.
///
/// Every field is optional at the type level so that a missing field is reported
/// together with all other violations instead of failing deserialization on the first one.
/// A field of the wrong JSON type is read as absent and recorded as a `type` violation.
#[derive(Debug, Clone, Default, Serialize, JsonSchema, Validate)]
pub struct NewBook {
    #[validate(required, length(min = 1, message = "Must not be empty"))]
    pub isbn: Option<String>,
    #[validate(required, url(message = "Must be a URL"))]
    pub amazon_url: Option<String>,
    #[validate(required, length(min = 1, message = "Must not be empty"))]
    pub author: Option<String>,
    #[validate(required, length(min = 1, message = "Must not be empty"))]
    pub language: Option<String>,
    #[validate(required, range(min = 1, message = "Must be a positive number"))]
    pub pages: Option<i32>,
    #[validate(required, length(min = 1, message = "Must not be empty"))]
    pub publisher: Option<String>,
    #[validate(required, length(min = 1, message = "Must not be empty"))]
    pub title: Option<String>,
    #[validate(required)]
    pub year: Option<i32>,
    #[serde(skip)]
    #[schemars(skip)]
    pub type_violations: Vec<FieldViolation>,
}

impl<'de> Deserialize<'de> for NewBook {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mut fields = FieldReader::new(Map::deserialize(deserializer)?);

        Ok(NewBook {
            isbn: fields.string("isbn"),
            amazon_url: fields.string("amazon_url"),
            author: fields.string("author"),
            language: fields.string("language"),
            pages: fields.integer("pages"),
            publisher: fields.string("publisher"),
            title: fields.string("title"),
            year: fields.integer("year"),
            type_violations: fields.into_violations(),
        })
    }
}

impl Violations for NewBook {
    /// A mistyped field is not reported again as `required`.
    fn violations(&self) -> Vec<FieldViolation> {
        merge_violations(&self.type_violations, self.validate())
    }
}

impl NewBook {
    /// Returns the book if every field is present.
    ///
    /// Always `Some` when [`Violations::violations`] is empty.
    pub fn into_book(self) -> Option<Book> {
        Some(Book {
            isbn: self.isbn?,
            amazon_url: self.amazon_url?,
            author: self.author?,
            language: self.language?,
            pages: self.pages?,
            publisher: self.publisher?,
            title: self.title?,
            year: self.year?,
        })
    }
}

impl From<Book> for NewBook {
    fn from(book: Book) -> Self {
        NewBook {
            isbn: Some(book.isbn),
            amazon_url: Some(book.amazon_url),
            author: Some(book.author),
            language: Some(book.language),
            pages: Some(book.pages),
            publisher: Some(book.publisher),
            title: Some(book.title),
            year: Some(book.year),
            type_violations: Vec::new(),
        }
    }
}

/// Request body for updating a book.
///
/// Absent (or `null`) fields keep their stored value.
#[derive(Debug, Clone, Default, Serialize, JsonSchema, Validate)]
pub struct BookUpdate {
    #[validate(length(min = 1, message = "Must not be empty"))]
    pub isbn: Option<String>,
    #[validate(url(message = "Must be a URL"))]
    pub amazon_url: Option<String>,
    #[validate(length(min = 1, message = "Must not be empty"))]
    pub author: Option<String>,
    #[validate(length(min = 1, message = "Must not be empty"))]
    pub language: Option<String>,
    #[validate(range(min = 1, message = "Must be a positive number"))]
    pub pages: Option<i32>,
    #[validate(length(min = 1, message = "Must not be empty"))]
    pub publisher: Option<String>,
    #[validate(length(min = 1, message = "Must not be empty"))]
    pub title: Option<String>,
    pub year: Option<i32>,
    #[serde(skip)]
    #[schemars(skip)]
    pub type_violations: Vec<FieldViolation>,
}

impl<'de> Deserialize<'de> for BookUpdate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mut fields = FieldReader::new(Map::deserialize(deserializer)?);

        Ok(BookUpdate {
            isbn: fields.string("isbn"),
            amazon_url: fields.string("amazon_url"),
            author: fields.string("author"),
            language: fields.string("language"),
            pages: fields.integer("pages"),
            publisher: fields.string("publisher"),
            title: fields.string("title"),
            year: fields.integer("year"),
            type_violations: fields.into_violations(),
        })
    }
}

impl BookUpdate {
    /// Validates the present fields and checks that a given `isbn` matches the one being updated.
    ///
    /// All violations are reported together.
    pub fn validate_for(&self, isbn: &str) -> Result<(), Vec<FieldViolation>> {
        let mut violations = merge_violations(&self.type_violations, self.validate());

        if let Some(body_isbn) = &self.isbn {
            if body_isbn != isbn {
                violations.push(FieldViolation::new(
                    "isbn",
                    "isbn_mismatch",
                    format!("Must match the isbn in the path ({isbn})"),
                ));
            }
        }

        if violations.is_empty() {
            return Ok(());
        }

        Err(violations)
    }

    /// Returns `book` with every present field replaced.
    pub fn apply_to(&self, book: &Book) -> Book {
        Book {
            isbn: book.isbn.clone(),
            amazon_url: self.amazon_url.clone().unwrap_or_else(|| book.amazon_url.clone()),
            author: self.author.clone().unwrap_or_else(|| book.author.clone()),
            language: self.language.clone().unwrap_or_else(|| book.language.clone()),
            pages: self.pages.unwrap_or(book.pages),
            publisher: self.publisher.clone().unwrap_or_else(|| book.publisher.clone()),
            title: self.title.clone().unwrap_or_else(|| book.title.clone()),
            year: self.year.unwrap_or(book.year),
        }
    }
}

/// Reads typed fields out of a JSON object, recording every field of the wrong type.
struct FieldReader {
    fields: Map<String, Value>,
    violations: Vec<FieldViolation>,
}

impl FieldReader {
    fn new(fields: Map<String, Value>) -> Self {
        Self {
            fields,
            violations: Vec::new(),
        }
    }

    fn string(&mut self, field: &str) -> Option<String> {
        self.read(field, "Must be a string")
    }

    fn integer(&mut self, field: &str) -> Option<i32> {
        self.read(field, "Must be a 32-bit integer")
    }

    fn read<T: DeserializeOwned>(&mut self, field: &str, message: &str) -> Option<T> {
        match self.fields.remove(field) {
            None | Some(Value::Null) => None,
            Some(value) => match serde_json::from_value(value) {
                Ok(value) => Some(value),
                Err(err) => {
                    tracing::debug!(field, %err, "Mistyped field");

                    self.violations
                        .push(FieldViolation::new(field, "type", message.to_string()));

                    None
                }
            },
        }
    }

    fn into_violations(self) -> Vec<FieldViolation> {
        self.violations
    }
}

fn merge_violations(
    type_violations: &[FieldViolation],
    validation: Result<(), validator::ValidationErrors>,
) -> Vec<FieldViolation> {
    let mistyped: HashSet<&str> = type_violations
        .iter()
        .map(|violation| violation.field.as_str())
        .collect();

    let validated = match validation {
        Ok(()) => Vec::new(),
        Err(errors) => FieldViolation::from_validation_errors(&errors),
    };

    type_violations
        .iter()
        .cloned()
        .chain(
            validated
                .into_iter()
                .filter(|violation| !mistyped.contains(violation.field.as_str())),
        )
        .collect()
}
