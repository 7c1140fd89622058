pub mod error;
pub mod ids;
pub mod validation;
pub mod sql;
pub mod query;

pub mod storage;
pub mod sec;
pub mod tags;
pub mod share;
pub mod search;
pub mod favorites;
pub mod usergroup;

pub fn string_to_len_char(length: usize, ch: char) -> String {
    let mut rtn = String::with_capacity(length);

    for _ in 0..length {
        rtn.push(ch);
    }

    rtn
}

pub fn string_to_len(length: usize) -> String {
    string_to_len_char(length, 'a')
}
