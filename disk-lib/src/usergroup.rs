use crate::validation::trimmed_printable;

pub const DEFAULT_NAME: &str = "default";
pub const MIN_NAME_CHARS: usize = 2;
pub const MAX_NAME_CHARS: usize = 32;
pub const MAX_DESCRIPTION_CHARS: usize = 100;

/// does not check for the reserved [`DEFAULT_NAME`]
pub fn name_valid(given: &str) -> bool {
    given.chars().count() >= MIN_NAME_CHARS &&
        trimmed_printable(given, Some(MAX_NAME_CHARS))
}

/// an empty description is allowed
pub fn description_valid(given: &str) -> bool {
    trimmed_printable(given, Some(MAX_DESCRIPTION_CHARS))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn name_validation() {
        assert!(name_valid("qa"));
        assert!(name_valid("release team"));
        assert!(!name_valid("a"));
        assert!(!name_valid(""));
        assert!(!name_valid(" ops"));
        assert!(!name_valid(&crate::string_to_len(MAX_NAME_CHARS + 1)));
    }

    #[test]
    fn description_validation() {
        assert!(description_valid(""));
        assert!(description_valid("people who ship"));
        assert!(!description_valid(&crate::string_to_len(MAX_DESCRIPTION_CHARS + 1)));
    }
}
