/// a share password is either absent or exactly this many characters
pub const PASSWORD_CHARS: usize = 6;

/// length of the random suffix of a share code
pub const CODE_SUFFIX_CHARS: usize = 15;

pub fn password_valid(given: &str) -> bool {
    given.chars().count() == PASSWORD_CHARS &&
        given.chars().all(|ch| !ch.is_control() && !ch.is_whitespace())
}
