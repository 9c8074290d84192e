//! Create quiz, question, and answer tables.

use sea_orm_migration::prelude::*;

use super::m20250101_000002_create_company_tables::Company;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Quiz::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Quiz::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Quiz::CompanyId).string_len(32).not_null())
                    .col(ColumnDef::new(Quiz::Title).string_len(256).not_null())
                    .col(ColumnDef::new(Quiz::Description).text())
                    .col(ColumnDef::new(Quiz::Frequency).integer().not_null())
                    .col(
                        ColumnDef::new(Quiz::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Quiz::UpdatedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_quiz_company")
                            .from(Quiz::Table, Quiz::CompanyId)
                            .to(Company::Table, Company::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_quiz_company_id")
                    .table(Quiz::Table)
                    .col(Quiz::CompanyId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Question::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Question::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Question::QuizId).string_len(32).not_null())
                    .col(ColumnDef::new(Question::Position).integer().not_null())
                    .col(ColumnDef::new(Question::Text).text().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_question_quiz")
                            .from(Question::Table, Question::QuizId)
                            .to(Quiz::Table, Quiz::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_question_quiz_id")
                    .table(Question::Table)
                    .col(Question::QuizId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Answer::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Answer::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Answer::QuestionId).string_len(32).not_null())
                    .col(ColumnDef::new(Answer::Position).integer().not_null())
                    .col(ColumnDef::new(Answer::Text).text().not_null())
                    .col(
                        ColumnDef::new(Answer::IsCorrect)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_answer_question")
                            .from(Answer::Table, Answer::QuestionId)
                            .to(Question::Table, Question::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_answer_question_id")
                    .table(Answer::Table)
                    .col(Answer::QuestionId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Answer::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Question::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Quiz::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum Quiz {
    Table,
    Id,
    CompanyId,
    Title,
    Description,
    Frequency,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Question {
    Table,
    Id,
    QuizId,
    Position,
    Text,
}

#[derive(Iden)]
enum Answer {
    Table,
    Id,
    QuestionId,
    Position,
    Text,
    IsCorrect,
}
