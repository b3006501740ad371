//! Filename helpers
//!
//! Pure string transforms used to derive variant filenames from a generated base name.
//! The "extension" is always the text after the last `.`.

use crate::error::FilenameError;

/// Return the text after the last `.`, or `None` when the name has no `.` at all.
pub fn extension_of(name: &str) -> Option<&str> {
    name.rsplit_once('.').map(|(_, ext)| ext)
}

/// Replace the extension of `name` with `extension`, appending one if `name` has none.
pub fn with_extension(name: &str, extension: &str) -> Result<String, FilenameError> {
    if name.is_empty() {
        return Err(FilenameError::InvalidArgument(
            "name must be a non-empty string".to_string(),
        ));
    }
    if extension.is_empty() {
        return Err(FilenameError::InvalidArgument(
            "extension must be a non-empty string".to_string(),
        ));
    }

    match name.rsplit_once('.') {
        Some((stem, _)) => Ok(format!("{}.{}", stem, extension)),
        None => Ok(format!("{}.{}", name, extension)),
    }
}

/// Insert `_{suffix}` right before the final extension separator.
///
/// A missing or empty suffix leaves the name untouched.
pub fn with_suffix(name: &str, suffix: Option<&str>) -> Result<String, FilenameError> {
    if name.is_empty() {
        return Err(FilenameError::InvalidArgument(
            "name must be a non-empty string".to_string(),
        ));
    }
    let suffix = match suffix {
        Some(s) if !s.is_empty() => s,
        _ => return Ok(name.to_string()),
    };

    let (stem, extension) = name.rsplit_once('.').ok_or_else(|| {
        FilenameError::InvalidArgument(format!(
            "The name must be a file format (e.g. filename.jpg), got '{}'",
            name
        ))
    })?;

    Ok(format!("{}_{}.{}", stem, suffix, extension))
}
