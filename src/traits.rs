use crate::{
    error::{ErrorVerbosity, FieldViolation},
    store::BookStore,
};

pub trait StateProvider {
    /// Returns the error verbosity.
    fn error_verbosity(&self) -> ErrorVerbosity;

    /// Returns the store books are read from and written to.
    fn book_store(&self) -> &dyn BookStore;
}

/// Data that reports every violated constraint at once.
pub trait Violations {
    /// Returns every violated constraint, empty if the data is valid.
    fn violations(&self) -> Vec<FieldViolation>;
}
