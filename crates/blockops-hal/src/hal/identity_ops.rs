//! Current user lookup.

use crate::HalResult;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserIdentity {
    pub name: String,
    pub uid: u32,
    pub gid: u32,
}

impl UserIdentity {
    /// `user:user` argument for `chown`.
    pub fn owner_spec(&self) -> String {
        format!("{}:{}", self.name, self.name)
    }
}

pub trait IdentityOps {
    /// Resolve the user the process is running as.
    fn current_user(&self) -> HalResult<UserIdentity>;
}
