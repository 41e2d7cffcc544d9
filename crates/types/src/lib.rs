//! Validated text primitives shared by the hospital record crates.

/// Errors that can occur when creating validated text types.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TextError {
    /// The input text was empty or contained only whitespace
    #[error("Text cannot be empty")]
    Empty,
    /// The trimmed input is longer than the column allows
    #[error("Text exceeds maximum length of {max} characters")]
    TooLong { max: usize },
}

/// A string type that guarantees non-empty content.
///
/// This type wraps a `String` and ensures it contains at least one non-whitespace character.
/// The input is automatically trimmed of leading and trailing whitespace during construction.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NonEmptyText(String);

impl NonEmptyText {
    /// Creates a new `NonEmptyText` from the given input.
    ///
    /// The input is trimmed of leading and trailing whitespace. If the trimmed
    /// result is empty, an error is returned.
    ///
    /// # Arguments
    ///
    /// * `input` - Any type that can be converted to a string reference
    ///
    /// # Returns
    ///
    /// Returns `Ok(NonEmptyText)` if the trimmed input is non-empty,
    /// or `Err(TextError::Empty)` if it's empty or contains only whitespace.
    pub fn new(input: impl AsRef<str>) -> Result<Self, TextError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TextError::Empty);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Creates a `NonEmptyText` that also fits a column of `max` characters.
    ///
    /// Length is counted in characters after trimming, matching how the
    /// database measures `TEXT` length.
    pub fn bounded(input: impl AsRef<str>, max: usize) -> Result<Self, TextError> {
        let text = Self::new(input)?;
        if text.0.chars().count() > max {
            return Err(TextError::TooLong { max });
        }
        Ok(text)
    }

    /// Returns the inner string as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the wrapper and returns the owned string.
    pub fn into_inner(self) -> String {
        self.0
    }
}

/// Normalises an optional free-text field.
///
/// Blank input collapses to `None`; anything else must fit in `max` characters.
pub fn optional_bounded(input: Option<&str>, max: usize) -> Result<Option<String>, TextError> {
    match input.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(s) => NonEmptyText::bounded(s, max).map(|t| Some(t.into_inner())),
    }
}

impl std::fmt::Display for NonEmptyText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for NonEmptyText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_trims_input() {
        let text = NonEmptyText::new("  Paludisme ").unwrap();
        assert_eq!(text.as_str(), "Paludisme");
    }

    #[test]
    fn new_rejects_whitespace_only() {
        assert_eq!(NonEmptyText::new(" \t\n").unwrap_err(), TextError::Empty);
    }

    #[test]
    fn bounded_counts_characters_not_bytes() {
        // 'é' is two bytes in UTF-8 but one character.
        assert!(NonEmptyText::bounded("éé", 2).is_ok());
        assert_eq!(
            NonEmptyText::bounded("abc", 2).unwrap_err(),
            TextError::TooLong { max: 2 }
        );
    }

    #[test]
    fn optional_bounded_collapses_blank_to_none() {
        assert_eq!(optional_bounded(None, 3).unwrap(), None);
        assert_eq!(optional_bounded(Some("  "), 3).unwrap(), None);
        assert_eq!(optional_bounded(Some(" O+ "), 3).unwrap(), Some("O+".into()));
        assert!(optional_bounded(Some("ABCD"), 3).is_err());
    }
}
