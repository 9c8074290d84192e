//! Database migrations.
//!
//! Schema migrations for the database. Everything except the partial
//! unique indexes goes through the schema builder, so the same migrations
//! run on `PostgreSQL` and on the `SQLite` databases used in tests.

#![allow(missing_docs)]

use sea_orm_migration::prelude::*;

mod m20250101_000001_create_user_table;
mod m20250101_000002_create_company_tables;
mod m20250101_000003_create_approval_tables;
mod m20250101_000004_create_quiz_tables;
mod m20250101_000005_create_quiz_result_table;
mod m20250101_000006_create_notification_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250101_000001_create_user_table::Migration),
            Box::new(m20250101_000002_create_company_tables::Migration),
            Box::new(m20250101_000003_create_approval_tables::Migration),
            Box::new(m20250101_000004_create_quiz_tables::Migration),
            Box::new(m20250101_000005_create_quiz_result_table::Migration),
            Box::new(m20250101_000006_create_notification_table::Migration),
        ]
    }
}
