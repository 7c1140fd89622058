use crate::validation::{trimmed_printable, printable_no_whitespace};

pub const MAX_GROUP_CHARS: usize = 64;
pub const MAX_TAG_CHARS: usize = 128;
pub const MAX_DESCRIPTION_CHARS: usize = 512;

/// group names are also used as search condition names so they cannot hold
/// whitespace or the `:` separator
pub fn group_name_valid(given: &str) -> bool {
    !given.is_empty() &&
        !given.contains(':') &&
        printable_no_whitespace(given, Some(MAX_GROUP_CHARS))
}

pub fn tag_name_valid(given: &str) -> bool {
    !given.is_empty() && trimmed_printable(given, Some(MAX_TAG_CHARS))
}

pub fn description_valid(given: &str) -> bool {
    trimmed_printable(given, Some(MAX_DESCRIPTION_CHARS))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn group_validation() {
        let valid = [
            String::from("project"),
            String::from("😈"),
        ];

        for test in valid {
            assert!(group_name_valid(&test), "valid string failed {:?}", test);
        }

        let invalid = [
            String::new(),
            String::from("two words"),
            String::from("key:value"),
            crate::string_to_len(MAX_GROUP_CHARS + 1),
        ];

        for test in invalid {
            assert!(!group_name_valid(&test), "invalid string failed {:?}", test);
        }
    }

    #[test]
    fn tag_validation() {
        let valid = [
            String::from("i am tag"),
            String::from("i am also tag 😈"),
        ];

        for test in valid {
            assert!(tag_name_valid(&test), "valid string failed {:?}", test);
        }

        let invalid = [
            String::new(),
            String::from(" padded "),
            crate::string_to_len(MAX_TAG_CHARS + 1),
        ];

        for test in invalid {
            assert!(!tag_name_valid(&test), "invalid string failed {:?}", test);
        }
    }
}
