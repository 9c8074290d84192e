//! Create `quiz_result` table.

use sea_orm_migration::prelude::*;

use super::m20250101_000001_create_user_table::User;
use super::m20250101_000004_create_quiz_tables::Quiz;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(QuizResult::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(QuizResult::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(QuizResult::QuizId).string_len(32).not_null())
                    .col(ColumnDef::new(QuizResult::UserId).string_len(32))
                    .col(
                        ColumnDef::new(QuizResult::CorrectQuestions)
                            .integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(QuizResult::TotalQuestions).integer().not_null())
                    .col(
                        ColumnDef::new(QuizResult::Timestamp)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_quiz_result_quiz")
                            .from(QuizResult::Table, QuizResult::QuizId)
                            .to(Quiz::Table, Quiz::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_quiz_result_user")
                            .from(QuizResult::Table, QuizResult::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_quiz_result_quiz_user")
                    .table(QuizResult::Table)
                    .col(QuizResult::QuizId)
                    .col(QuizResult::UserId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_quiz_result_user_id")
                    .table(QuizResult::Table)
                    .col(QuizResult::UserId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(QuizResult::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum QuizResult {
    Table,
    Id,
    QuizId,
    UserId,
    CorrectQuestions,
    TotalQuestions,
    Timestamp,
}
