//! Prefixing decorator suites

use crate::adapters::{PrefixAdapter, SchemaAdapter};
use crate::config::ConnectionConfig;
use crate::schema::{Column, ForeignKey, Index, Table};

use super::mock::MockAdapter;

fn prefixed(config: ConnectionConfig) -> (PrefixAdapter, super::mock::MockHandle) {
    let inner = MockAdapter::new();
    let handle = inner.handle();
    (PrefixAdapter::new(Box::new(inner), &config), handle)
}

#[tokio::test]
async fn every_table_name_is_rewritten() {
    let config = ConnectionConfig::new("postgres", "app").with_table_prefix("app_");
    let (mut adapter, handle) = prefixed(config);

    adapter
        .create_table(&Table::new("users").add_column(Column::string("name")))
        .await
        .unwrap();
    assert!(handle.has_table("app_users"));
    assert!(!handle.has_table("users"));

    // introspection goes through the same rewrite
    assert!(adapter.has_table("users").await.unwrap());
    adapter
        .add_column("users", &Column::boolean("active"))
        .await
        .unwrap();
    assert!(adapter.has_column("users", "active").await.unwrap());

    adapter
        .add_index("users", &Index::new(["name"]))
        .await
        .unwrap();
    assert!(adapter
        .has_index("users", &["name".to_string()])
        .await
        .unwrap());

    adapter.rename_table("users", "accounts").await.unwrap();
    assert!(handle.has_table("app_accounts"));

    adapter.drop_table("accounts").await.unwrap();
    assert!(!handle.has_table("app_accounts"));
}

#[tokio::test]
async fn foreign_key_referenced_tables_are_rewritten() {
    let config = ConnectionConfig::new("postgres", "app")
        .with_table_prefix("pre_")
        .with_table_suffix("_sfx");
    let (mut adapter, handle) = prefixed(config);

    adapter.create_table(&Table::new("users")).await.unwrap();
    adapter
        .create_table(
            &Table::new("posts")
                .add_column(Column::integer("user_id"))
                .add_foreign_key(ForeignKey::new(["user_id"], "users", ["id"])),
        )
        .await
        .unwrap();

    assert!(handle.has_table("pre_users_sfx"));
    assert!(handle.has_table("pre_posts_sfx"));
    assert!(adapter
        .has_foreign_key("posts", &["user_id".to_string()], None)
        .await
        .unwrap());
}

#[tokio::test]
async fn version_log_operations_are_not_rewritten() {
    let config = ConnectionConfig::new("postgres", "app").with_table_prefix("app_");
    let (mut adapter, handle) = prefixed(config);

    adapter
        .record_migrated(
            20240101000000,
            "CreateUsers",
            crate::migrations::Direction::Up,
            chrono::Utc::now(),
            chrono::Utc::now(),
        )
        .await
        .unwrap();
    assert_eq!(handle.versions(), vec![20240101000000]);
    assert_eq!(adapter.get_versions().await.unwrap(), vec![20240101000000]);
}
