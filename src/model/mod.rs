//! Catalog records and their input types.

mod image;
mod media;

pub use image::{CreateImage, Image};
pub use media::{CreateMedia, Media};

use crate::error::{Error, FieldError};

/// Shared text-field checks: `required` (non-empty), then `min` (at least
/// three characters). One entry per failed field, in the order given, so
/// clients see a stable list.
pub(crate) fn check_required_min(checks: &[(&str, &str)]) -> Result<(), Error> {
    let mut fields = Vec::new();
    for (name, value) in checks {
        if value.is_empty() {
            fields.push(FieldError::new(name, "required"));
        } else if value.chars().count() < 3 {
            fields.push(FieldError::new(name, "min"));
        }
    }
    if fields.is_empty() { Ok(()) } else { Err(Error::Validation(fields)) }
}
