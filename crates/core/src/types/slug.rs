//! URL slug type for tenant pages.

use core::fmt;

use serde::{Deserialize, Serialize};
use unicode_normalization::{UnicodeNormalization, char::is_combining_mark};

/// Errors that can occur when building or parsing a [`Slug`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SlugError {
    /// Nothing slug-worthy was left after normalization.
    #[error("slug cannot be empty")]
    Empty,
    /// The slug is longer than [`Slug::MAX_LENGTH`].
    #[error("slug must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
    /// The slug contains something other than `a-z`, `0-9` and single hyphens.
    #[error("slug contains invalid characters: {0}")]
    InvalidCharacters(String),
}

/// A lowercase, ASCII, hyphen-separated identifier used in public URLs and as
/// the tenant subdomain label.
///
/// ```
/// use vitrine_core::Slug;
///
/// let slug = Slug::from_name("Hélène  D'Aubigné").unwrap();
/// assert_eq!(slug.as_str(), "helene-d-aubigne");
/// assert_eq!(slug.with_suffix(42).as_str(), "helene-d-aubigne-42");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Slug(String);

impl Slug {
    /// Maximum slug length. Leaves room for a `-9999` suffix inside a DNS label.
    pub const MAX_LENGTH: usize = 58;

    /// Derive a slug from a display name.
    ///
    /// Accents are stripped (NFD decomposition, combining marks dropped), a few
    /// ligatures are expanded, everything is lowercased and each run of
    /// non-alphanumeric characters becomes a single hyphen.
    ///
    /// # Errors
    ///
    /// Returns [`SlugError::Empty`] when the name has no usable character.
    pub fn from_name(name: &str) -> Result<Self, SlugError> {
        let mut slug = String::with_capacity(name.len());
        let mut pending_hyphen = false;

        for c in name.nfd().filter(|c| !is_combining_mark(*c)) {
            let folded: &str = match c {
                'ß' => "ss",
                'æ' | 'Æ' => "ae",
                'œ' | 'Œ' => "oe",
                'ø' | 'Ø' => "o",
                'đ' | 'Đ' => "d",
                'ł' | 'Ł' => "l",
                _ => "",
            };

            if !folded.is_empty() {
                push_word(&mut slug, &mut pending_hyphen, folded);
            } else if c.is_ascii_alphanumeric() {
                if pending_hyphen && !slug.is_empty() {
                    slug.push('-');
                }
                pending_hyphen = false;
                slug.push(c.to_ascii_lowercase());
            } else {
                pending_hyphen = true;
            }
        }

        if slug.is_empty() {
            return Err(SlugError::Empty);
        }

        if slug.len() > Self::MAX_LENGTH {
            slug.truncate(Self::MAX_LENGTH);
            while slug.ends_with('-') {
                slug.pop();
            }
        }

        Ok(Self(slug))
    }

    /// Parse an existing slug (e.g. from a URL path segment).
    ///
    /// # Errors
    ///
    /// Returns an error unless the input is non-empty, short enough and made
    /// of `a-z`, `0-9` and inner single hyphens.
    pub fn parse(s: &str) -> Result<Self, SlugError> {
        if s.is_empty() {
            return Err(SlugError::Empty);
        }
        if s.len() > Self::MAX_LENGTH + 5 {
            return Err(SlugError::TooLong {
                max: Self::MAX_LENGTH + 5,
            });
        }
        let valid_chars = s
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-');
        if !valid_chars || s.starts_with('-') || s.ends_with('-') || s.contains("--") {
            return Err(SlugError::InvalidCharacters(s.to_owned()));
        }
        Ok(Self(s.to_owned()))
    }

    /// Append a numeric collision suffix (`paul-durand` → `paul-durand-417`).
    #[must_use]
    pub fn with_suffix(&self, suffix: u16) -> Self {
        Self(format!("{}-{suffix}", self.0))
    }

    /// Returns the slug as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `Slug` and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

fn push_word(slug: &mut String, pending_hyphen: &mut bool, word: &str) {
    if *pending_hyphen && !slug.is_empty() {
        slug.push('-');
    }
    *pending_hyphen = false;
    slug.push_str(word);
}

impl fmt::Display for Slug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for Slug {
    type Err = SlugError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for Slug {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Slug {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Slug {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <String as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self(s))
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Slug {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <String as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}
