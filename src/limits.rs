use serde::{Deserialize, Serialize};

use crate::error::DirectoryError;

/// Maximum length of the short text columns (city, state, phone, ...).
pub const SHORT_TEXT_MAX: usize = 120;
/// Maximum length of image links and seeking descriptions.
pub const LONG_TEXT_MAX: usize = 500;

/// What to do with a string that exceeds its column's declared length.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LengthPolicy {
    #[default]
    Reject,
    Truncate,
}

impl LengthPolicy {
    /// Applies the policy to `value`. Lengths are counted in chars, not bytes.
    pub fn apply(self, field: &'static str, max: usize, value: String) -> Result<String, DirectoryError> {
        let actual = value.chars().count();
        if actual <= max {
            return Ok(value);
        }

        match self {
            LengthPolicy::Reject => Err(DirectoryError::FieldTooLong { field, max, actual }),
            LengthPolicy::Truncate => {
                log::debug!("Truncating {} from {} to {} chars", field, actual, max);
                Ok(value.chars().take(max).collect())
            }
        }
    }

    pub fn apply_opt(
        self,
        field: &'static str,
        max: usize,
        value: Option<String>,
    ) -> Result<Option<String>, DirectoryError> {
        value.map(|v| self.apply(field, max, v)).transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_within_limit_is_untouched() {
        let city = "a".repeat(SHORT_TEXT_MAX);
        let result = LengthPolicy::Reject.apply("city", SHORT_TEXT_MAX, city.clone());
        assert_eq!(result.unwrap(), city);
    }

    #[test]
    fn test_reject_over_limit() {
        let city = "a".repeat(SHORT_TEXT_MAX + 1);
        let err = LengthPolicy::Reject
            .apply("city", SHORT_TEXT_MAX, city)
            .unwrap_err();
        match err {
            DirectoryError::FieldTooLong { field, max, actual } => {
                assert_eq!(field, "city");
                assert_eq!(max, 120);
                assert_eq!(actual, 121);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_truncate_over_limit() {
        let city = "b".repeat(200);
        let result = LengthPolicy::Truncate
            .apply("city", SHORT_TEXT_MAX, city)
            .unwrap();
        assert_eq!(result.chars().count(), SHORT_TEXT_MAX);
    }

    #[test]
    fn test_truncate_counts_chars_not_bytes() {
        // 'é' is two bytes in UTF-8
        let name = "é".repeat(130);
        let result = LengthPolicy::Truncate
            .apply("state", SHORT_TEXT_MAX, name)
            .unwrap();
        assert_eq!(result.chars().count(), 120);
        assert_eq!(result.len(), 240);
    }

    #[test]
    fn test_apply_opt_passes_none_through() {
        let result = LengthPolicy::Reject
            .apply_opt("phone", SHORT_TEXT_MAX, None)
            .unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_policy_deserializes_lowercase() {
        #[derive(Deserialize)]
        struct Wrapper {
            policy: LengthPolicy,
        }
        let w: Wrapper = toml::from_str("policy = \"truncate\"").unwrap();
        assert_eq!(w.policy, LengthPolicy::Truncate);
    }
}
