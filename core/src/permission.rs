//! Permission filter (C6): a pure function deciding whether a user may see a
//! catalog object.

use crate::catalog::{Permissioned, User, Visibility};

/// Whether `user` may access `obj`, evaluated in this fixed order:
///
/// 1. `obj` is public → allowed.
/// 2. `user` is anonymous → denied.
/// 3. `user` is a superuser → allowed.
/// 4. `obj` is private → allowed iff `obj.created_by == user.id`.
/// 5. `obj` is internal → allowed iff the user's department is in
///    `obj.allowed_departments`, or any of the user's roles is in
///    `obj.allowed_roles`.
/// 6. Otherwise, denied.
pub fn may(user: &User, obj: &impl Permissioned) -> bool {
    if obj.visibility() == Visibility::Public {
        return true;
    }
    if user.is_anonymous {
        return false;
    }
    if user.is_superuser {
        return true;
    }
    match obj.visibility() {
        Visibility::Private => obj.created_by() == user.id,
        Visibility::Internal => {
            user.department
                .as_deref()
                .map(|d| obj.allowed_departments().iter().any(|ad| ad == d))
                .unwrap_or(false)
                || user.roles.iter().any(|r| obj.allowed_roles().contains(r))
        }
        Visibility::Public => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ServiceConfig, Tool, ToolDefinition, ToolKind};

    fn tool(visibility: Visibility, created_by: &str, departments: &[&str], roles: &[&str]) -> Tool {
        Tool {
            definition: ToolDefinition {
                name: "priv_tool".into(),
                description: String::new(),
                parameters: serde_json::json!({}),
            },
            kind: ToolKind::Builtin,
            service_config: ServiceConfig::default(),
            visibility,
            created_by: created_by.to_string(),
            allowed_departments: departments.iter().map(|s| s.to_string()).collect(),
            allowed_roles: roles.iter().map(|s| s.to_string()).collect(),
            stats: Default::default(),
            status: crate::catalog::ToolStatus::Active,
        }
    }

    #[test]
    fn public_is_always_allowed_even_for_anonymous() {
        let user = User::anonymous();
        assert!(may(&user, &tool(Visibility::Public, "alice", &[], &[])));
    }

    #[test]
    fn anonymous_denied_for_non_public() {
        let user = User::anonymous();
        assert!(!may(&user, &tool(Visibility::Internal, "alice", &["eng"], &[])));
    }

    #[test]
    fn superuser_always_allowed() {
        let user = User {
            id: "bob".into(),
            is_superuser: true,
            ..Default::default()
        };
        assert!(may(&user, &tool(Visibility::Private, "alice", &[], &[])));
    }

    #[test]
    fn private_allowed_only_for_owner() {
        let owner = User {
            id: "alice".into(),
            ..Default::default()
        };
        let stranger = User {
            id: "bob".into(),
            ..Default::default()
        };
        let priv_tool = tool(Visibility::Private, "alice", &[], &[]);
        assert!(may(&owner, &priv_tool));
        assert!(!may(&stranger, &priv_tool));
    }

    #[test]
    fn internal_allowed_by_department_or_role() {
        let by_dept = User {
            id: "bob".into(),
            department: Some("eng".into()),
            ..Default::default()
        };
        let by_role = User {
            id: "carol".into(),
            roles: vec!["reviewer".into()],
            ..Default::default()
        };
        let neither = User {
            id: "dave".into(),
            ..Default::default()
        };
        let internal_tool = tool(Visibility::Internal, "alice", &["eng"], &["reviewer"]);
        assert!(may(&by_dept, &internal_tool));
        assert!(may(&by_role, &internal_tool));
        assert!(!may(&neither, &internal_tool));
    }
}
