use super::*;
use crate::models::{Wisdom, DEFAULT_CATEGORY};
use crate::repo::tests::setup_test_db;
use crate::repo::{activate_wisdom, create_wisdom, get_wisdom};

async fn create(pool: &DbPool, text: &str, category: &str) -> Wisdom {
    create_wisdom(pool, text.to_string(), None, Some(category.to_string()), DEFAULT_CATEGORY)
        .await
        .unwrap()
}

#[tokio::test]
async fn test_list_categories_counts_states() {
    let pool = setup_test_db();
    let zen = create(&pool, "zen 1", "Zen").await;
    create(&pool, "zen 2", "Zen").await;
    create(&pool, "stoic", "Stoic").await;
    activate_wisdom(&pool, &zen.get_id()).await.unwrap();

    let categories = list_categories(&pool).unwrap();
    assert_eq!(categories.len(), 2);

    assert_eq!(
        categories[0],
        CategoryCountDto { name: "Stoic".to_string(), queued: 1, active: 0, completed: 0, total: 1 }
    );
    assert_eq!(
        categories[1],
        CategoryCountDto { name: "Zen".to_string(), queued: 1, active: 1, completed: 0, total: 2 }
    );
}

#[tokio::test]
async fn test_list_categories_empty() {
    let pool = setup_test_db();
    assert!(list_categories(&pool).unwrap().is_empty());
}

#[tokio::test]
async fn test_rename_category() {
    let pool = setup_test_db();
    let first = create(&pool, "first", "Zen").await;
    let second = create(&pool, "second", "Zen").await;

    assert_eq!(rename_category(&pool, "Zen", "Buddhism").await.unwrap(), 2);

    let first = get_wisdom(&pool, &first.get_id()).unwrap().unwrap();
    let second = get_wisdom(&pool, &second.get_id()).unwrap().unwrap();
    assert_eq!(first.get_category(), "Buddhism");
    assert_eq!(second.get_category(), "Buddhism");
    assert!(first.get_queue_position() < second.get_queue_position());

    let names: Vec<String> = list_categories(&pool).unwrap().into_iter().map(|c| c.name).collect();
    assert_eq!(names, vec!["Buddhism".to_string()]);
}

#[tokio::test]
async fn test_rename_into_existing_category_queues_behind() {
    let pool = setup_test_db();
    let existing = create(&pool, "existing", "Stoic").await;
    let moved = create(&pool, "moved", "Roman").await;

    rename_category(&pool, "Roman", "Stoic").await.unwrap();

    let existing = get_wisdom(&pool, &existing.get_id()).unwrap().unwrap();
    let moved = get_wisdom(&pool, &moved.get_id()).unwrap().unwrap();
    assert_eq!(moved.get_category(), "Stoic");
    assert!(moved.get_queue_position() > existing.get_queue_position());
}

#[tokio::test]
async fn test_rename_category_rejects_blank_name() {
    let pool = setup_test_db();
    create(&pool, "text", "Zen").await;

    assert!(rename_category(&pool, "Zen", "  ").await.is_err());
    assert_eq!(list_categories(&pool).unwrap()[0].name, "Zen");
}

#[tokio::test]
async fn test_rename_missing_category() {
    let pool = setup_test_db();
    assert_eq!(rename_category(&pool, "Missing", "Other").await.unwrap(), 0);
}

#[tokio::test]
async fn test_delete_category_moves_to_default() {
    let pool = setup_test_db();
    let general = create(&pool, "general", DEFAULT_CATEGORY).await;
    let zen = create(&pool, "zen", "Zen").await;
    activate_wisdom(&pool, &zen.get_id()).await.unwrap();

    assert_eq!(delete_category(&pool, "Zen", DEFAULT_CATEGORY).await.unwrap(), 1);

    let zen = get_wisdom(&pool, &zen.get_id()).unwrap().unwrap();
    assert_eq!(zen.get_category(), DEFAULT_CATEGORY);
    assert!(zen.get_queue_position() > general.get_queue_position());
    // Cycle state survives the move
    assert!(zen.is_active());
}

#[tokio::test]
async fn test_delete_default_category_is_rejected() {
    let pool = setup_test_db();
    create(&pool, "general", DEFAULT_CATEGORY).await;

    assert!(delete_category(&pool, DEFAULT_CATEGORY, DEFAULT_CATEGORY).await.is_err());
    assert_eq!(list_categories(&pool).unwrap()[0].total, 1);
}
