use disk_lib::ids;

pub mod authz;

/// the acting user of a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Operator {
    pub user_id: ids::UserId,
}

impl Operator {
    pub fn new(user_id: ids::UserId) -> Self {
        Operator { user_id }
    }
}
