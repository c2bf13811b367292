//! Recording adapter and inversion suites

use crate::adapters::{RecordedCommand, RecordingAdapter, SchemaAdapter};
use crate::error::MigrateError;
use crate::schema::{Column, ForeignKey, Index, Table};

use super::mock::{MockAdapter, MockTable};

fn cols(names: &[&str]) -> Vec<Column> {
    names.iter().map(|n| Column::string(n)).collect()
}

#[tokio::test]
async fn mutations_are_recorded_not_executed() {
    let mut inner = MockAdapter::new();
    let handle = inner.handle();

    let mut recorder = RecordingAdapter::new(&mut inner);
    recorder
        .create_table(&Table::new("widgets").add_column(Column::integer("qty")))
        .await
        .unwrap();
    recorder
        .add_column("widgets", &Column::boolean("flag"))
        .await
        .unwrap();

    assert_eq!(recorder.commands().len(), 2);
    assert!(matches!(
        recorder.commands()[0],
        RecordedCommand::CreateTable(_)
    ));
    // nothing reached the wrapped adapter
    assert!(!handle.has_table("widgets"));
    assert!(handle.op_log().is_empty());
}

#[tokio::test]
async fn reads_pass_through_to_the_wrapped_adapter() {
    let mut inner = MockAdapter::new();
    inner.handle().add_table(
        "accounts",
        MockTable {
            columns: cols(&["id", "email"]),
            ..MockTable::default()
        },
    );

    let mut recorder = RecordingAdapter::new(&mut inner);
    assert!(recorder.has_table("accounts").await.unwrap());
    assert!(recorder.has_column("accounts", "email").await.unwrap());
    assert_eq!(recorder.get_columns("accounts").await.unwrap().len(), 2);
    assert!(recorder.commands().is_empty());
}

#[tokio::test]
async fn inverted_playback_runs_inverses_in_reverse_order() {
    let mut inner = MockAdapter::new();
    let handle = inner.handle();

    // State as it looks after the forward run: gadgets was renamed to
    // gizmos, carries the added column/index/fk, and widgets exists.
    handle.add_table(
        "widgets",
        MockTable {
            columns: cols(&["id"]),
            ..MockTable::default()
        },
    );
    let mut gizmos = MockTable {
        columns: cols(&["id", "color", "bulk"]),
        ..MockTable::default()
    };
    gizmos
        .indexes
        .insert("gizmos_color".to_string(), vec!["color".to_string()]);
    gizmos
        .foreign_keys
        .insert("gizmos_widget_id_fk".to_string(), vec!["widget_id".to_string()]);
    handle.add_table("gizmos", gizmos);

    // Record the forward script.
    let mut recorder = RecordingAdapter::new(&mut inner);
    recorder
        .create_table(&Table::new("widgets"))
        .await
        .unwrap();
    recorder
        .add_column("gadgets", &Column::string("color"))
        .await
        .unwrap();
    recorder
        .rename_column("gadgets", "size", "bulk")
        .await
        .unwrap();
    recorder
        .add_index("gadgets", &Index::new(["color"]))
        .await
        .unwrap();
    recorder
        .add_foreign_key(
            "gadgets",
            &ForeignKey::new(["widget_id"], "widgets", ["id"]).named("gizmos_widget_id_fk"),
        )
        .await
        .unwrap();
    recorder
        .rename_table("gadgets", "gizmos")
        .await
        .unwrap();

    recorder.execute_inverted().await.unwrap();

    assert_eq!(
        handle.op_log(),
        vec![
            "rename_table gizmos gadgets",
            "drop_foreign_key gadgets gizmos_widget_id_fk",
            "drop_index gadgets gizmos_color",
            "rename_column gadgets bulk size",
            "drop_column gadgets color",
            "drop_table widgets",
        ]
    );
    assert!(!handle.has_table("widgets"));
    assert!(!handle.has_table("gizmos"));
    assert_eq!(handle.table_columns("gadgets"), vec!["id", "size"]);
}

#[tokio::test]
async fn rename_inversions_swap_their_arguments() {
    let mut inner = MockAdapter::new();
    let handle = inner.handle();
    handle.add_table("accounts", MockTable::default());

    let mut recorder = RecordingAdapter::new(&mut inner);
    recorder.rename_table("users", "accounts").await.unwrap();
    recorder.execute_inverted().await.unwrap();

    assert!(handle.has_table("users"));
    assert!(!handle.has_table("accounts"));
}

#[tokio::test]
async fn operations_without_an_inverse_fail_while_recording() {
    let mut inner = MockAdapter::new();
    inner.handle().add_table(
        "widgets",
        MockTable {
            columns: cols(&["id", "qty"]),
            ..MockTable::default()
        },
    );

    let mut recorder = RecordingAdapter::new(&mut inner);

    let error = recorder.drop_table("widgets").await.unwrap_err();
    assert!(matches!(error, MigrateError::Irreversible(_)));
    assert!(error.to_string().contains("drop_table"));

    assert!(matches!(
        recorder.drop_column("widgets", "qty").await.unwrap_err(),
        MigrateError::Irreversible(_)
    ));
    assert!(matches!(
        recorder
            .change_column("widgets", "qty", &Column::big_integer("qty"))
            .await
            .unwrap_err(),
        MigrateError::Irreversible(_)
    ));
    assert!(matches!(
        recorder.drop_index("widgets", &[]).await.unwrap_err(),
        MigrateError::Irreversible(_)
    ));
    assert!(matches!(
        recorder
            .drop_foreign_key("widgets", &[], None)
            .await
            .unwrap_err(),
        MigrateError::Irreversible(_)
    ));
    assert!(matches!(
        recorder.execute("DELETE FROM widgets").await.unwrap_err(),
        MigrateError::Irreversible(_)
    ));

    // the failed calls recorded nothing, and the schema is untouched
    assert!(recorder.commands().is_empty());
    assert!(inner.handle().has_table("widgets"));
}
