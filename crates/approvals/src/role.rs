use serde::{Deserialize, Serialize};

/// Roles that participate in the purchasing workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApproverRole {
    Employee,
    Owner,
    Finance,
    Director,
    Admin,
}

impl ApproverRole {
    /// Whether this role may act on a step assigned to `assigned`.
    ///
    /// Admins may act on any step; everyone else only on their own.
    pub fn may_act_for(&self, assigned: ApproverRole) -> bool {
        *self == ApproverRole::Admin || *self == assigned
    }
}

impl std::fmt::Display for ApproverRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ApproverRole::Employee => "employee",
            ApproverRole::Owner => "owner",
            ApproverRole::Finance => "finance",
            ApproverRole::Director => "director",
            ApproverRole::Admin => "admin",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_acts_for_any_role() {
        assert!(ApproverRole::Admin.may_act_for(ApproverRole::Finance));
        assert!(ApproverRole::Admin.may_act_for(ApproverRole::Director));
    }

    #[test]
    fn non_admin_acts_only_for_itself() {
        assert!(ApproverRole::Finance.may_act_for(ApproverRole::Finance));
        assert!(!ApproverRole::Finance.may_act_for(ApproverRole::Director));
    }
}
