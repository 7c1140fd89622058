use crate::validation::trimmed_printable;

pub const MAX_GROUP_CHARS: usize = 20;

/// names held by the built in groups of every user
pub const RESERVED_NAMES: [&str; 2] = ["default", "recycle-bin"];

pub fn group_name_valid(given: &str) -> bool {
    !given.is_empty() &&
        !RESERVED_NAMES.contains(&given) &&
        trimmed_printable(given, Some(MAX_GROUP_CHARS))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn group_validation() {
        let valid = [
            String::from("reading list"),
            String::from("Default"),
            crate::string_to_len(MAX_GROUP_CHARS),
        ];

        for test in valid {
            assert!(group_name_valid(&test), "valid string failed {:?}", test);
        }

        let invalid = [
            String::new(),
            String::from("default"),
            String::from("recycle-bin"),
            String::from(" padded"),
            crate::string_to_len(MAX_GROUP_CHARS + 1),
        ];

        for test in invalid {
            assert!(!group_name_valid(&test), "invalid string failed {:?}", test);
        }
    }
}
