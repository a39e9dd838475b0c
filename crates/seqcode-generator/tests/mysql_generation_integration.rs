use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use seqcode_core::{EntityKind, GenerateError};
use seqcode_generator::{GeneratorSettings, SequentialCodeGenerator};
use seqcode_storage::{MySqlCollection, MySqlCounterStore};
use seqcode_test_infra::mysql::{MySqlServer, MysqlConfig};
use sqlx::mysql::MySqlPoolOptions;

struct Fixture {
    _mysql: MySqlServer,
    pool: sqlx::MySqlPool,
    accounts: MySqlCollection,
}

impl Fixture {
    async fn start() -> Self {
        let mysql = MySqlServer::new(MysqlConfig::builder().build())
            .await
            .expect("start mysql");
        let url = mysql.database_url().await.expect("mysql url");
        let pool = connect_with_retry(&url).await;

        MySqlCounterStore::new(pool.clone())
            .ensure_schema()
            .await
            .expect("create counter table");

        sqlx::query(
            r#"
            CREATE TABLE cuentas (
                id BIGINT NOT NULL AUTO_INCREMENT PRIMARY KEY,
                codigo_cuenta VARCHAR(32) NOT NULL UNIQUE
            )
            "#,
        )
        .execute(&pool)
        .await
        .expect("create cuentas");

        Self {
            _mysql: mysql,
            accounts: MySqlCollection::new(pool.clone(), "cuentas").unwrap(),
            pool,
        }
    }

    fn generator(&self, max_attempts: u32) -> SequentialCodeGenerator<MySqlCounterStore> {
        let settings = GeneratorSettings::builder().max_attempts(max_attempts).build();
        SequentialCodeGenerator::new(MySqlCounterStore::new(self.pool.clone()), settings).unwrap()
    }

    async fn insert_account(&self, code: &str) {
        sqlx::query("INSERT INTO cuentas (codigo_cuenta) VALUES (?)")
            .bind(code)
            .execute(&self.pool)
            .await
            .unwrap();
    }
}

async fn connect_with_retry(url: &str) -> sqlx::MySqlPool {
    let mut last_error = None;

    for _ in 0..20 {
        match MySqlPoolOptions::new()
            .max_connections(10)
            .connect(url)
            .await
        {
            Ok(pool) => return pool,
            Err(err) => {
                last_error = Some(err);
                tokio::time::sleep(Duration::from_millis(500)).await;
            }
        }
    }

    panic!("failed to connect mysql: {last_error:?}");
}

#[tokio::test]
async fn skips_legacy_code_at_the_next_slot() {
    let fixture = Fixture::start().await;
    sqlx::query("INSERT INTO sequence_counters (sequence_name, value, prefix) VALUES ('cuentas', 41, 'CTA-')")
        .execute(&fixture.pool)
        .await
        .unwrap();
    fixture.insert_account("CTA-0000000042").await;

    let generator = fixture.generator(10);
    let code = generator
        .generate(&fixture.accounts, &EntityKind::Account.spec())
        .await
        .unwrap();

    assert_eq!(code.as_str(), "CTA-0000000043");
}

#[tokio::test]
async fn exhausted_when_window_is_occupied() {
    let fixture = Fixture::start().await;
    for value in 1..=3 {
        fixture.insert_account(&format!("CTA-{value:010}")).await;
    }

    let generator = fixture.generator(3);
    let err = generator
        .generate(&fixture.accounts, &EntityKind::Account.spec())
        .await
        .unwrap_err();

    assert!(matches!(err, GenerateError::Exhausted { attempts: 3, .. }));
}

#[tokio::test]
async fn concurrent_creation_yields_distinct_codes() {
    let fixture = Fixture::start().await;
    let generator = Arc::new(fixture.generator(10));
    let accounts = Arc::new(fixture.accounts.clone());
    let mut handles = vec![];

    for _ in 0..40 {
        let generator = Arc::clone(&generator);
        let accounts = Arc::clone(&accounts);
        let pool = fixture.pool.clone();
        handles.push(tokio::spawn(async move {
            let code = generator
                .generate(accounts.as_ref(), &EntityKind::Account.spec())
                .await
                .unwrap();
            // The unique index would reject a duplicate here.
            sqlx::query("INSERT INTO cuentas (codigo_cuenta) VALUES (?)")
                .bind(code.as_str())
                .execute(&pool)
                .await
                .unwrap();
            code.into_string()
        }));
    }

    let mut codes = HashSet::new();
    for handle in handles {
        assert!(codes.insert(handle.await.unwrap()));
    }
    assert_eq!(codes.len(), 40);
}
