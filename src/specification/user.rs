use sqlx::{Postgres, QueryBuilder};
use std::cmp::Ordering;

use super::{contains_ignore_case, like_pattern, Condition, Specification};
use crate::filters::UserFilters;
use crate::models::{Role, User};
use crate::pagination::SortKey;

pub type UserSpecification = Specification<UserCondition>;

/// User fields open to substring matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserField {
    Uuid,
    Username,
}

impl UserField {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "uuid" => Some(UserField::Uuid),
            "username" => Some(UserField::Username),
            _ => None,
        }
    }

    fn column(&self) -> &'static str {
        match self {
            UserField::Uuid => "u.uuid",
            UserField::Username => "u.username",
        }
    }

    fn value<'a>(&self, user: &'a User) -> &'a str {
        match self {
            UserField::Uuid => &user.uuid,
            UserField::Username => &user.username,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum UserCondition {
    FieldLike { field: UserField, needle: String },
    RoleIs(Role),
    ActiveIs(bool),
}

impl Condition for UserCondition {
    type Record = User;

    fn matches(&self, user: &User) -> bool {
        match self {
            UserCondition::FieldLike { field, needle } => {
                contains_ignore_case(field.value(user), needle)
            }
            UserCondition::RoleIs(role) => user.role == *role,
            UserCondition::ActiveIs(active) => user.is_active == *active,
        }
    }

    fn push_sql(&self, builder: &mut QueryBuilder<'_, Postgres>) {
        match self {
            UserCondition::FieldLike { field, needle } => {
                builder
                    .push(format!("UPPER({}) LIKE ", field.column()))
                    .push_bind(like_pattern(needle));
            }
            UserCondition::RoleIs(role) => {
                builder.push("u.role = ").push_bind(role.as_str());
            }
            UserCondition::ActiveIs(active) => {
                builder.push("u.is_active = ").push_bind(*active);
            }
        }
    }
}

/// Substring match on `field`. Unknown field names and blank values are neutral.
pub fn users_field_like(field: &str, value: &str) -> Option<UserCondition> {
    let field = UserField::parse(field)?;
    if value.trim().is_empty() {
        return None;
    }
    Some(UserCondition::FieldLike {
        field,
        needle: value.to_string(),
    })
}

pub fn users_role_is(role: Role) -> Option<UserCondition> {
    Some(UserCondition::RoleIs(role))
}

pub fn users_active_is(active: bool) -> Option<UserCondition> {
    Some(UserCondition::ActiveIs(active))
}

/// Order: uuid, username, role, active flag.
pub fn from_filters(filters: &UserFilters) -> UserSpecification {
    let mut spec = UserSpecification::always();
    if let Some(uuid) = &filters.uuid {
        spec = spec.and(users_field_like("uuid", uuid));
    }
    if let Some(username) = &filters.username {
        spec = spec.and(users_field_like("username", username));
    }
    if let Some(role) = filters.role {
        spec = spec.and(users_role_is(role));
    }
    if let Some(active) = filters.active {
        spec = spec.and(users_active_is(active));
    }
    spec
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserSortField {
    Id,
    Uuid,
    Username,
    Role,
    Active,
}

impl UserSortField {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "id" => Some(UserSortField::Id),
            "uuid" => Some(UserSortField::Uuid),
            "username" => Some(UserSortField::Username),
            "role" => Some(UserSortField::Role),
            "active" | "isActive" => Some(UserSortField::Active),
            _ => None,
        }
    }
}

impl SortKey<User> for UserSortField {
    fn column(&self) -> &'static str {
        match self {
            UserSortField::Id => "u.id",
            UserSortField::Uuid => "u.uuid",
            UserSortField::Username => "u.username",
            UserSortField::Role => "u.role",
            UserSortField::Active => "u.is_active",
        }
    }

    fn compare(&self, a: &User, b: &User) -> Ordering {
        match self {
            UserSortField::Id => a.id.cmp(&b.id),
            UserSortField::Uuid => a.uuid.cmp(&b.uuid),
            UserSortField::Username => a.username.cmp(&b.username),
            UserSortField::Role => a.role.as_str().cmp(b.role.as_str()),
            UserSortField::Active => a.is_active.cmp(&b.is_active),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn user(username: &str, role: Role, is_active: bool) -> User {
        let now = Utc::now();
        User {
            id: 7,
            uuid: "5b1e2c3d-0000-1111-2222-333344445555".to_string(),
            username: username.to_string(),
            password_hash: String::new(),
            is_active,
            role,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_empty_filters_compose_to_neutral() {
        let spec = from_filters(&UserFilters::default());
        assert!(spec.is_neutral());
        assert!(spec.matches(&user("a@example.com", Role::User, false)));
    }

    #[test]
    fn test_only_allow_listed_fields_are_matched() {
        assert!(users_field_like("username", "ali").is_some());
        assert!(users_field_like("uuid", "5b1e").is_some());
        assert!(users_field_like("password_hash", "$2b$").is_none());
    }

    #[test]
    fn test_combined_user_filters() {
        let spec = from_filters(&UserFilters {
            username: Some("ALICE".to_string()),
            role: Some(Role::Admin),
            active: Some(true),
            ..Default::default()
        });

        assert!(spec.matches(&user("alice@example.com", Role::Admin, true)));
        assert!(!spec.matches(&user("alice@example.com", Role::User, true)));
        assert!(!spec.matches(&user("alice@example.com", Role::Admin, false)));
        assert!(!spec.matches(&user("bob@example.com", Role::Admin, true)));
    }

    #[test]
    fn test_sql_rendering() {
        let spec = from_filters(&UserFilters {
            uuid: Some("5b1e".to_string()),
            role: Some(Role::User),
            active: Some(false),
            ..Default::default()
        });
        let mut builder = QueryBuilder::<Postgres>::new("SELECT 1 FROM users u");
        spec.push_where(&mut builder);

        assert_eq!(
            builder.sql(),
            "SELECT 1 FROM users u WHERE UPPER(u.uuid) LIKE $1 AND u.role = $2 AND u.is_active = $3"
        );
    }
}
