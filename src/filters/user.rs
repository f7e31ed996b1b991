use serde::{Deserialize, Serialize};

use super::PageRequest;
use crate::models::Role;
use crate::pagination::Pageable;
use crate::specification::user::UserSortField;

/// Optional criteria for listing users.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserFilters {
    #[serde(flatten)]
    pub paging: PageRequest,
    pub uuid: Option<String>,
    pub username: Option<String>,
    pub role: Option<Role>,
    pub active: Option<bool>,
}

impl UserFilters {
    pub fn pageable(&self) -> Pageable<UserSortField> {
        let sort = UserSortField::parse(self.paging.sort_field()).unwrap_or(UserSortField::Id);
        Pageable::of(
            self.paging.page_index(),
            self.paging.page_size(),
            sort,
            self.paging.sort_direction(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_user_filter() {
        let filters: UserFilters = serde_json::from_str(
            r#"{"username":"ali","role":"ADMIN","active":false,"sortBy":"username","size":-3}"#,
        )
        .unwrap();

        assert_eq!(filters.username.as_deref(), Some("ali"));
        assert_eq!(filters.role, Some(Role::Admin));
        assert_eq!(filters.active, Some(false));

        let pageable = filters.pageable();
        assert_eq!(pageable.sort(), UserSortField::Username);
        assert_eq!(pageable.size(), 10);
    }

    #[test]
    fn test_unknown_role_is_rejected() {
        assert!(serde_json::from_str::<UserFilters>(r#"{"role":"ROOT"}"#).is_err());
    }
}
