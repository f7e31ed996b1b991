mod common;

use std::sync::Arc;

use async_trait::async_trait;
use pretty_assertions::assert_eq;
use taskrest::error::AppError;
use taskrest::filters::{PageRequest, TaskFilters, UserFilters};
use taskrest::models::{NewTask, Role, Task, TaskChanges, TaskStatus};
use taskrest::pagination::{Page, Pageable, SortDirection};
use taskrest::repository::{InMemoryRepository, TaskRepository};
use taskrest::services::TaskService;
use taskrest::specification::task::{TaskSortField, TaskSpecification};

use common::{seed_task, seed_user, state};

fn paging(page: i64, size: i64) -> PageRequest {
    PageRequest::new(Some(page), Some(size))
}

fn with_status(statuses: Vec<TaskStatus>, paging: PageRequest) -> TaskFilters {
    TaskFilters {
        paging,
        status: Some(statuses),
        ..Default::default()
    }
}

/// 25 tasks of one owner, 12 of them OPEN.
async fn twenty_five_tasks(repo: &InMemoryRepository) {
    let owner = seed_user(repo, "owner@example.com", true, Role::User).await;
    for i in 0..25 {
        let status = if i < 12 {
            TaskStatus::Open
        } else if i % 2 == 0 {
            TaskStatus::Completed
        } else {
            TaskStatus::Ongoing
        };
        seed_task(repo, &owner, &format!("Task {:02}", i), status).await;
    }
}

#[test_log::test(actix_rt::test)]
async fn test_status_filter_counts_filtered_population() {
    let (state, repo) = state();
    twenty_five_tasks(&repo).await;

    let page = state
        .tasks()
        .get_filtered_paginated(&with_status(vec![TaskStatus::Open], paging(0, 10)))
        .await
        .unwrap();

    assert_eq!(page.number_of_elements, 10);
    assert_eq!(page.data.len(), 10);
    assert_eq!(page.total_items, 12);
    assert_eq!(page.total_pages, 2);
    assert_eq!(page.current_page, 0);
    assert_eq!(page.page_size, 10);
    assert!(page.data.iter().all(|t| t.status == TaskStatus::Open));

    let second = state
        .tasks()
        .get_filtered_paginated(&with_status(vec![TaskStatus::Open], paging(1, 10)))
        .await
        .unwrap();
    assert_eq!(second.number_of_elements, 2);
    assert_eq!(second.total_items, 12);
}

#[actix_rt::test]
async fn test_title_filter_is_case_insensitive_substring() {
    let (state, repo) = state();
    let owner = seed_user(&repo, "owner@example.com", true, Role::User).await;
    for title in ["ABCdef", "xabcy", "nothing here", "ab c"] {
        seed_task(&repo, &owner, title, TaskStatus::Open).await;
    }

    let filters = TaskFilters {
        title: Some("abc".to_string()),
        ..Default::default()
    };
    let page = state.tasks().get_filtered_paginated(&filters).await.unwrap();

    let mut titles: Vec<String> = page.data.into_iter().map(|t| t.title).collect();
    titles.sort();
    assert_eq!(titles, vec!["ABCdef".to_string(), "xabcy".to_string()]);
    assert_eq!(page.total_items, 2);
}

#[actix_rt::test]
async fn test_like_wildcards_in_needle_match_literally() {
    let (state, repo) = state();
    let owner = seed_user(&repo, "owner@example.com", true, Role::User).await;
    seed_task(&repo, &owner, "50% done", TaskStatus::Open).await;
    seed_task(&repo, &owner, "500 done", TaskStatus::Open).await;
    seed_task(&repo, &owner, "snake_case", TaskStatus::Open).await;
    seed_task(&repo, &owner, "snakeXcase", TaskStatus::Open).await;

    for (needle, expected) in [("50%", "50% done"), ("e_c", "snake_case")] {
        let filters = TaskFilters {
            title: Some(needle.to_string()),
            ..Default::default()
        };
        let all = state.tasks().get_filtered(&filters).await.unwrap();
        assert_eq!(all.len(), 1, "needle {:?}", needle);
        assert_eq!(all[0].title, expected);
    }
}

#[actix_rt::test]
async fn test_owner_active_flag_goes_through_the_join() {
    let (state, repo) = state();
    let active = seed_user(&repo, "active@example.com", true, Role::User).await;
    let inactive = seed_user(&repo, "inactive@example.com", false, Role::User).await;
    for i in 0..3 {
        seed_task(&repo, &active, &format!("active {}", i), TaskStatus::Open).await;
    }
    for i in 0..4 {
        seed_task(&repo, &inactive, &format!("inactive {}", i), TaskStatus::Open).await;
    }

    let filters = TaskFilters {
        user_is_active: Some(true),
        ..Default::default()
    };
    let page = state.tasks().get_filtered_paginated(&filters).await.unwrap();
    assert_eq!(page.total_items, 3);
    assert!(page
        .data
        .iter()
        .all(|t| t.user.as_ref().map(|u| u.uuid.as_str()) == Some(active.uuid.as_str())));

    let filters = TaskFilters {
        user_is_active: Some(false),
        ..Default::default()
    };
    let page = state.tasks().get_filtered_paginated(&filters).await.unwrap();
    assert_eq!(page.total_items, 4);
    assert!(page.data.iter().all(|t| t.user.as_ref().is_some_and(|u| !u.is_active)));
}

#[actix_rt::test]
async fn test_user_uuid_filter_selects_one_owner() {
    let (state, repo) = state();
    let alice = seed_user(&repo, "alice@example.com", true, Role::User).await;
    let bob = seed_user(&repo, "bob@example.com", true, Role::User).await;
    seed_task(&repo, &alice, "alice 1", TaskStatus::Open).await;
    seed_task(&repo, &alice, "alice 2", TaskStatus::Failed).await;
    seed_task(&repo, &bob, "bob 1", TaskStatus::Open).await;

    let filters = TaskFilters {
        user_uuid: Some(alice.uuid.clone()),
        status: Some(vec![TaskStatus::Open]),
        ..Default::default()
    };
    let all = state.tasks().get_filtered(&filters).await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].title, "alice 1");
}

#[actix_rt::test]
async fn test_page_past_the_end_is_empty_with_real_totals() {
    let (state, repo) = state();
    twenty_five_tasks(&repo).await;

    let page = state
        .tasks()
        .get_filtered_paginated(&with_status(vec![TaskStatus::Open], paging(99, 10)))
        .await
        .unwrap();

    assert!(page.data.is_empty());
    assert_eq!(page.number_of_elements, 0);
    assert_eq!(page.total_items, 12);
    assert_eq!(page.total_pages, 2);
    assert_eq!(page.current_page, 99);
}

#[actix_rt::test]
async fn test_empty_filters_equal_unfiltered_listing() {
    let (state, repo) = state();
    twenty_five_tasks(&repo).await;

    let filtered = state
        .tasks()
        .get_filtered_paginated(&TaskFilters::default())
        .await
        .unwrap();
    let unfiltered = state.tasks().get_paginated(PageRequest::default()).await.unwrap();

    assert_eq!(filtered, unfiltered);
    assert_eq!(filtered.total_items, 25);
    assert_eq!(filtered.page_size, 10);
    assert_eq!(filtered.total_pages, 3);
}

#[actix_rt::test]
async fn test_empty_status_list_is_no_constraint() {
    let (state, repo) = state();
    twenty_five_tasks(&repo).await;

    let empty = state
        .tasks()
        .get_filtered_paginated(&with_status(vec![], paging(0, 10)))
        .await
        .unwrap();
    let absent = state
        .tasks()
        .get_filtered_paginated(&TaskFilters {
            paging: paging(0, 10),
            ..Default::default()
        })
        .await
        .unwrap();

    assert_eq!(empty, absent);
    assert_eq!(empty.total_items, 25);
}

#[actix_rt::test]
async fn test_non_positive_size_and_negative_page_use_defaults() {
    let (state, repo) = state();
    twenty_five_tasks(&repo).await;

    for size in [0, -1, -50] {
        let page = state
            .tasks()
            .get_filtered_paginated(&TaskFilters {
                paging: paging(-3, size),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(page.page_size, 10);
        assert_eq!(page.current_page, 0);
        assert_eq!(page.number_of_elements, 10);
    }
}

#[actix_rt::test]
async fn test_total_items_matches_unpaginated_count() {
    let (state, repo) = state();
    twenty_five_tasks(&repo).await;
    let other = seed_user(&repo, "other@example.com", false, Role::User).await;
    seed_task(&repo, &other, "Task 99", TaskStatus::Cancelled).await;

    let cases = vec![
        TaskFilters::default(),
        with_status(vec![TaskStatus::Open, TaskStatus::Cancelled], paging(0, 4)),
        TaskFilters {
            title: Some("task 1".to_string()),
            paging: paging(1, 3),
            ..Default::default()
        },
        TaskFilters {
            user_is_active: Some(true),
            status: Some(vec![TaskStatus::Completed]),
            ..Default::default()
        },
    ];

    for filters in cases {
        let page = state.tasks().get_filtered_paginated(&filters).await.unwrap();
        let all = state.tasks().get_filtered(&filters).await.unwrap();

        assert_eq!(page.total_items, all.len() as u64, "filters {:?}", filters);
        assert_eq!(page.number_of_elements, page.data.len());
        assert!(page.data.len() <= page.page_size as usize);
        assert!(
            u64::from(page.current_page) * u64::from(page.page_size) + page.data.len() as u64
                <= page.total_items
                || page.data.is_empty()
        );
    }
}

#[actix_rt::test]
async fn test_sorting_and_unknown_sort_field() {
    let (state, repo) = state();
    let owner = seed_user(&repo, "owner@example.com", true, Role::User).await;
    for title in ["banana", "apple", "cherry"] {
        seed_task(&repo, &owner, title, TaskStatus::Open).await;
    }

    let mut filters = TaskFilters::default();
    filters.paging.sort_by = Some("title".to_string());
    filters.paging.order_by = Some(SortDirection::Desc);
    let page = state.tasks().get_filtered_paginated(&filters).await.unwrap();
    let titles: Vec<&str> = page.data.iter().map(|t| t.title.as_str()).collect();
    assert_eq!(titles, vec!["cherry", "banana", "apple"]);

    filters.paging.sort_by = Some("password_hash; DROP TABLE tasks".to_string());
    filters.paging.order_by = None;
    let page = state.tasks().get_filtered_paginated(&filters).await.unwrap();
    let titles: Vec<&str> = page.data.iter().map(|t| t.title.as_str()).collect();
    assert_eq!(titles, vec!["banana", "apple", "cherry"]);
}

#[actix_rt::test]
async fn test_user_filters() {
    let (state, repo) = state();
    seed_user(&repo, "admin@example.com", true, Role::Admin).await;
    seed_user(&repo, "alice@example.com", true, Role::User).await;
    seed_user(&repo, "bob@example.com", false, Role::User).await;
    seed_user(&repo, "carol@sample.org", true, Role::User).await;

    let filters = UserFilters {
        role: Some(Role::User),
        active: Some(true),
        ..Default::default()
    };
    let page = state.users().get_filtered_paginated(&filters).await.unwrap();
    let names: Vec<&str> = page.data.iter().map(|u| u.username.as_str()).collect();
    assert_eq!(names, vec!["alice@example.com", "carol@sample.org"]);

    let filters = UserFilters {
        username: Some("EXAMPLE.COM".to_string()),
        ..Default::default()
    };
    let all = state.users().get_filtered(&filters).await.unwrap();
    assert_eq!(all.len(), 3);

    let filters = UserFilters {
        username: Some("   ".to_string()),
        ..Default::default()
    };
    let page = state.users().get_filtered_paginated(&filters).await.unwrap();
    assert_eq!(page.total_items, 4);
}

/// A task store whose every call fails, as a dropped database would.
struct UnavailableStore;

#[async_trait]
impl TaskRepository for UnavailableStore {
    async fn find_page(
        &self,
        _spec: &TaskSpecification,
        _pageable: &Pageable<TaskSortField>,
    ) -> Result<Page<Task>, AppError> {
        Err(AppError::StorageFailure("connection refused".into()))
    }

    async fn find_all(&self, _spec: &TaskSpecification) -> Result<Vec<Task>, AppError> {
        Err(AppError::StorageFailure("connection refused".into()))
    }

    async fn find_by_uuid(&self, _uuid: &str) -> Result<Option<Task>, AppError> {
        Err(AppError::StorageFailure("connection refused".into()))
    }

    async fn find_by_title_and_user(
        &self,
        _title: &str,
        _user_id: i64,
    ) -> Result<Option<Task>, AppError> {
        Err(AppError::StorageFailure("connection refused".into()))
    }

    async fn insert(&self, _task: NewTask) -> Result<Task, AppError> {
        Err(AppError::StorageFailure("connection refused".into()))
    }

    async fn update(&self, _id: i64, _changes: TaskChanges) -> Result<Option<Task>, AppError> {
        Err(AppError::StorageFailure("connection refused".into()))
    }

    async fn delete(&self, _id: i64) -> Result<bool, AppError> {
        Err(AppError::StorageFailure("connection refused".into()))
    }

    async fn delete_all(&self) -> Result<u64, AppError> {
        Err(AppError::StorageFailure("connection refused".into()))
    }

    async fn delete_by_user(&self, _user_id: i64) -> Result<u64, AppError> {
        Err(AppError::StorageFailure("connection refused".into()))
    }
}

#[test_log::test(actix_rt::test)]
async fn test_storage_failure_propagates() {
    let service = TaskService::new(
        Arc::new(UnavailableStore),
        Arc::new(InMemoryRepository::new()),
    );

    let err = service
        .get_filtered_paginated(&TaskFilters::default())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::StorageFailure(_)));

    let err = service.get_filtered(&TaskFilters::default()).await.unwrap_err();
    assert!(matches!(err, AppError::StorageFailure(_)));
}
