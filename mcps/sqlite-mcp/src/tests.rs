//! End-to-end tests for sqlite-mcp operations

#[cfg(test)]
#[allow(clippy::module_inception)]
mod tests {
    use super::super::config::DatabaseConfig;
    use super::super::database::{Affected, Database, Outcome, Row};
    use super::super::dispatcher::Dispatcher;
    use mcp_common::ErrorBody;
    use serde_json::{json, Value};

    /// In-memory dispatcher with a `users(id, name, age)` table
    async fn create_users_db() -> Dispatcher {
        let dispatcher = Dispatcher::new(Database::open_in_memory().unwrap());
        run(
            &dispatcher,
            "sqlite_query",
            json!({"sql": "CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT, age INTEGER)"}),
        )
        .await
        .unwrap();
        dispatcher
    }

    async fn run(dispatcher: &Dispatcher, operation: &str, args: Value) -> Result<Outcome, ErrorBody> {
        dispatcher.dispatch(operation, args).await.into_result()
    }

    fn row(value: Value) -> Row {
        serde_json::from_value(value).unwrap()
    }

    fn all_rows(outcome: Outcome) -> Vec<Row> {
        match outcome {
            Outcome::Rows(rows) => rows,
            other => panic!("expected rows, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_create_then_get_by_id() {
        let db = create_users_db().await;

        let created = run(&db, "create_item", json!({"table": "users", "data": {"name": "Ada"}}))
            .await
            .unwrap();
        assert_eq!(
            created,
            Outcome::Affected(Affected {
                count: 1,
                last_insert_id: Some(1)
            })
        );

        let fetched = run(&db, "get_item_by_id", json!({"table": "users", "id_value": 1}))
            .await
            .unwrap();
        assert_eq!(
            fetched,
            Outcome::Rows(vec![row(json!({"id": 1, "name": "Ada", "age": null}))])
        );
    }

    #[tokio::test]
    async fn test_created_fields_read_back_exactly() {
        let db = create_users_db().await;
        let data = json!({"name": "Grace", "age": 85});

        let id = match run(&db, "create_item", json!({"table": "users", "data": data}))
            .await
            .unwrap()
        {
            Outcome::Affected(Affected {
                last_insert_id: Some(id),
                ..
            }) => id,
            other => panic!("unexpected outcome: {:?}", other),
        };

        let rows = all_rows(
            run(&db, "get_item_by_id", json!({"table": "users", "id_value": id}))
                .await
                .unwrap(),
        );
        assert_eq!(rows.len(), 1);
        for (column, value) in data.as_object().unwrap() {
            assert_eq!(rows[0].get(column), Some(value), "column {}", column);
        }
    }

    #[tokio::test]
    async fn test_get_by_name_on_empty_table_is_not_found() {
        let db = create_users_db().await;

        let err = run(
            &db,
            "get_item_by_name",
            json!({"table": "users", "name_value": "Nobody"}),
        )
        .await
        .unwrap_err();
        assert_eq!(err.kind, "not_found");
        assert_eq!(err.operation.as_deref(), Some("get_item_by_name"));
    }

    #[tokio::test]
    async fn test_get_by_name_returns_every_match() {
        let db = create_users_db().await;
        for age in [30, 40] {
            run(
                &db,
                "create_item",
                json!({"table": "users", "data": {"name": "Sam", "age": age}}),
            )
            .await
            .unwrap();
        }

        let rows = all_rows(
            run(&db, "get_item_by_name", json!({"table": "users", "name_value": "Sam"}))
                .await
                .unwrap(),
        );
        assert_eq!(rows.len(), 2);
    }

    #[tokio::test]
    async fn test_failed_update_leaves_table_unchanged() {
        let db = create_users_db().await;
        run(&db, "create_item", json!({"table": "users", "data": {"name": "Ada"}}))
            .await
            .unwrap();
        let before = run(&db, "get_all_items", json!({"table": "users"})).await.unwrap();

        let err = run(
            &db,
            "update_item",
            json!({"table": "users", "id_value": 99, "data": {"name": "Eve"}}),
        )
        .await
        .unwrap_err();
        assert_eq!(err.kind, "not_found");

        let after = run(&db, "get_all_items", json!({"table": "users"})).await.unwrap();
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn test_update_changes_only_given_columns() {
        let db = create_users_db().await;
        run(
            &db,
            "create_item",
            json!({"table": "users", "data": {"name": "Ada", "age": 36}}),
        )
        .await
        .unwrap();

        let updated = run(
            &db,
            "update_item",
            json!({"table": "users", "id_value": 1, "data": {"age": 37}}),
        )
        .await
        .unwrap();
        assert_eq!(
            updated,
            Outcome::Affected(Affected {
                count: 1,
                last_insert_id: None
            })
        );

        let rows = all_rows(
            run(&db, "get_item_by_id", json!({"table": "users", "id_value": 1}))
                .await
                .unwrap(),
        );
        assert_eq!(rows[0], row(json!({"id": 1, "name": "Ada", "age": 37})));
    }

    #[tokio::test]
    async fn test_delete_then_get_is_not_found() {
        let db = create_users_db().await;
        run(&db, "create_item", json!({"table": "users", "data": {"name": "Ada"}}))
            .await
            .unwrap();

        let deleted = run(&db, "delete_item", json!({"table": "users", "id_value": 1}))
            .await
            .unwrap();
        assert_eq!(
            deleted,
            Outcome::Affected(Affected {
                count: 1,
                last_insert_id: None
            })
        );

        let err = run(&db, "get_item_by_id", json!({"table": "users", "id_value": 1}))
            .await
            .unwrap_err();
        assert_eq!(err.kind, "not_found");

        let err = run(&db, "delete_item", json!({"table": "users", "id_value": 1}))
            .await
            .unwrap_err();
        assert_eq!(err.kind, "not_found");
    }

    #[tokio::test]
    async fn test_custom_key_column() {
        let db = create_users_db().await;
        run(&db, "create_item", json!({"table": "users", "data": {"name": "Ada"}}))
            .await
            .unwrap();

        let deleted = run(
            &db,
            "delete_item",
            json!({"table": "users", "id_column": "name", "id_value": "Ada"}),
        )
        .await
        .unwrap();
        assert!(matches!(deleted, Outcome::Affected(Affected { count: 1, .. })));
    }

    #[tokio::test]
    async fn test_list_tables_fresh_then_one() {
        let db = Dispatcher::new(Database::open_in_memory().unwrap());

        let tables = run(&db, "list_all_tables", json!({})).await.unwrap();
        assert_eq!(tables, Outcome::Tables(vec![]));

        run(
            &db,
            "sqlite_query",
            json!({"sql": "CREATE TABLE notes (id INTEGER PRIMARY KEY AUTOINCREMENT, body TEXT)"}),
        )
        .await
        .unwrap();

        // AUTOINCREMENT creates sqlite_sequence, which is not listed
        let tables = run(&db, "list_all_tables", json!({})).await.unwrap();
        assert_eq!(tables, Outcome::Tables(vec!["notes".to_string()]));
    }

    #[tokio::test]
    async fn test_list_tables_pattern_and_alias() {
        let db = create_users_db().await;
        run(&db, "sqlite_query", json!({"sql": "CREATE TABLE orders (id INTEGER)"}))
            .await
            .unwrap();

        let tables = run(&db, "get_all_tables", json!({})).await.unwrap();
        assert_eq!(
            tables,
            Outcome::Tables(vec!["orders".to_string(), "users".to_string()])
        );

        let tables = run(&db, "list_all_tables", json!({"pattern": "us%"})).await.unwrap();
        assert_eq!(tables, Outcome::Tables(vec!["users".to_string()]));
    }

    #[tokio::test]
    async fn test_raw_query_arithmetic() {
        let db = Dispatcher::new(Database::open_in_memory().unwrap());

        let outcome = run(&db, "sqlite_query", json!({"sql": "SELECT 1+1 AS x"}))
            .await
            .unwrap();
        assert_eq!(outcome, Outcome::Rows(vec![row(json!({"x": 2}))]));
    }

    #[tokio::test]
    async fn test_raw_query_with_named_params() {
        let db = create_users_db().await;
        run(
            &db,
            "sqlite_query",
            json!({
                "sql": "INSERT INTO users (name, age) VALUES (:name, :age)",
                "params": {"name": "Linus", "age": 54}
            }),
        )
        .await
        .unwrap();

        let rows = all_rows(
            run(
                &db,
                "sqlite_query",
                json!({"sql": "SELECT name FROM users WHERE age > ?", "params": [50]}),
            )
            .await
            .unwrap(),
        );
        assert_eq!(rows, vec![row(json!({"name": "Linus"}))]);
    }

    #[tokio::test]
    async fn test_injection_attempts_never_reach_sql() {
        let db = create_users_db().await;

        for table in ["users; DROP TABLE users", "users--", "\"users\"", "1users", ""] {
            let err = run(&db, "get_all_items", json!({"table": table}))
                .await
                .unwrap_err();
            assert_eq!(err.kind, "invalid_identifier", "table {:?}", table);
        }

        let err = run(
            &db,
            "create_item",
            json!({"table": "users", "data": {"name) VALUES ('x'); --": "y"}}),
        )
        .await
        .unwrap_err();
        assert_eq!(err.kind, "invalid_identifier");

        // users still exists and is empty
        let rows = all_rows(run(&db, "get_all_items", json!({"table": "users"})).await.unwrap());
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn test_stacked_statements_are_refused() {
        let db = create_users_db().await;

        let err = run(
            &db,
            "sqlite_query",
            json!({"sql": "INSERT INTO users (name) VALUES ('Eve'); DROP TABLE users"}),
        )
        .await
        .unwrap_err();
        assert_eq!(err.kind, "invalid_arguments");

        let rows = all_rows(run(&db, "get_all_items", json!({"table": "users"})).await.unwrap());
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn test_get_item_on_any_column() {
        let db = create_users_db().await;
        run(&db, "create_item", json!({"table": "users", "data": {"name": "Ada", "age": 36}}))
            .await
            .unwrap();
        run(&db, "create_item", json!({"table": "users", "data": {"name": "Alan", "age": 41}}))
            .await
            .unwrap();

        let rows = all_rows(
            run(&db, "get_item", json!({"table": "users", "value": 41, "column": "age"}))
                .await
                .unwrap(),
        );
        assert_eq!(rows, vec![row(json!({"id": 2, "name": "Alan", "age": 41}))]);

        let err = run(&db, "get_item", json!({"table": "users", "value": 1}))
            .await
            .unwrap_err();
        assert_eq!(err.kind, "invalid_arguments");

        let err = run(
            &db,
            "get_item",
            json!({"table": "users", "value": 1, "column": "age; --"}),
        )
        .await
        .unwrap_err();
        assert_eq!(err.kind, "invalid_identifier");
    }

    #[tokio::test]
    async fn test_empty_payload() {
        let db = create_users_db().await;

        let err = run(&db, "create_item", json!({"table": "users", "data": {}}))
            .await
            .unwrap_err();
        assert_eq!(err.kind, "empty_payload");

        let err = run(
            &db,
            "update_item",
            json!({"table": "users", "id_value": 1, "data": {}}),
        )
        .await
        .unwrap_err();
        assert_eq!(err.kind, "empty_payload");
    }

    #[tokio::test]
    async fn test_engine_errors_carry_table_context() {
        let db = create_users_db().await;

        let err = run(
            &db,
            "create_item",
            json!({"table": "users", "data": {"nickname": "Ada"}}),
        )
        .await
        .unwrap_err();
        assert_eq!(err.kind, "execution_error");
        assert!(err.message.contains("nickname"), "{}", err.message);
        assert!(err.message.contains("users"), "{}", err.message);
    }

    #[tokio::test]
    async fn test_db_version_and_describe() {
        let db = create_users_db().await;

        match run(&db, "get_db_version", json!({})).await.unwrap() {
            Outcome::Version(version) => assert!(version.starts_with('3'), "{}", version),
            other => panic!("unexpected outcome: {:?}", other),
        }

        let columns = all_rows(run(&db, "describe_table", json!({"table": "users"})).await.unwrap());
        let names: Vec<&str> = columns
            .iter()
            .filter_map(|c| c.get("name").and_then(Value::as_str))
            .collect();
        assert_eq!(names, vec!["id", "name", "age"]);

        let err = run(&db, "describe_table", json!({"table": "ghosts"}))
            .await
            .unwrap_err();
        assert_eq!(err.kind, "not_found");
    }

    #[tokio::test]
    async fn test_read_only_database_refuses_writes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("app.db");

        let writable = Database::open(&DatabaseConfig {
            path: path.clone(),
            ..DatabaseConfig::default()
        })
        .unwrap();
        let db = Dispatcher::new(writable);
        run(&db, "sqlite_query", json!({"sql": "CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT)"}))
            .await
            .unwrap();
        run(&db, "create_item", json!({"table": "users", "data": {"name": "Ada"}}))
            .await
            .unwrap();
        drop(db);

        let read_only = Database::open(&DatabaseConfig {
            path,
            read_only: true,
            ..DatabaseConfig::default()
        })
        .unwrap();
        let db = Dispatcher::new(read_only);

        let err = run(&db, "create_item", json!({"table": "users", "data": {"name": "Eve"}}))
            .await
            .unwrap_err();
        assert_eq!(err.kind, "read_only");

        let err = run(&db, "sqlite_query", json!({"sql": "DELETE FROM users"}))
            .await
            .unwrap_err();
        assert_eq!(err.kind, "read_only");

        let rows = all_rows(run(&db, "get_all_items", json!({"table": "users"})).await.unwrap());
        assert_eq!(rows.len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_creates() {
        let db = create_users_db().await;

        let mut handles = Vec::new();
        for i in 0..10 {
            let db = db.clone();
            handles.push(tokio::spawn(async move {
                run(
                    &db,
                    "create_item",
                    json!({"table": "users", "data": {"name": format!("user{}", i)}}),
                )
                .await
            }));
        }

        let mut ids = Vec::new();
        for handle in handles {
            match handle.await.unwrap().unwrap() {
                Outcome::Affected(Affected {
                    count: 1,
                    last_insert_id: Some(id),
                }) => ids.push(id),
                other => panic!("unexpected outcome: {:?}", other),
            }
        }
        ids.sort_unstable();
        assert_eq!(ids, (1..=10).collect::<Vec<i64>>());
    }
}
