//! Create `company_invitation` and `user_request` tables.
//!
//! Both tables carry a partial unique index: at most one pending row per
//! (company, user).

use sea_orm_migration::prelude::*;

use super::m20250101_000001_create_user_table::User;
use super::m20250101_000002_create_company_tables::Company;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(CompanyInvitation::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CompanyInvitation::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(CompanyInvitation::CompanyId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CompanyInvitation::SenderId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CompanyInvitation::RecipientId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CompanyInvitation::Status)
                            .string_len(20)
                            .not_null()
                            .default("pending"),
                    )
                    .col(
                        ColumnDef::new(CompanyInvitation::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CompanyInvitation::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_company_invitation_company")
                            .from(CompanyInvitation::Table, CompanyInvitation::CompanyId)
                            .to(Company::Table, Company::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_company_invitation_sender")
                            .from(CompanyInvitation::Table, CompanyInvitation::SenderId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_company_invitation_recipient")
                            .from(CompanyInvitation::Table, CompanyInvitation::RecipientId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_company_invitation_recipient_id")
                    .table(CompanyInvitation::Table)
                    .col(CompanyInvitation::RecipientId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(UserRequest::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(UserRequest::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(UserRequest::CompanyId).string_len(32).not_null())
                    .col(ColumnDef::new(UserRequest::SenderId).string_len(32).not_null())
                    .col(
                        ColumnDef::new(UserRequest::Status)
                            .string_len(20)
                            .not_null()
                            .default("pending"),
                    )
                    .col(
                        ColumnDef::new(UserRequest::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(UserRequest::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_user_request_company")
                            .from(UserRequest::Table, UserRequest::CompanyId)
                            .to(Company::Table, Company::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_user_request_sender")
                            .from(UserRequest::Table, UserRequest::SenderId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_user_request_sender_id")
                    .table(UserRequest::Table)
                    .col(UserRequest::SenderId)
                    .to_owned(),
            )
            .await?;

        manager
            .get_connection()
            .execute_unprepared(
                r"
                CREATE UNIQUE INDEX IF NOT EXISTS idx_company_invitation_pending
                ON company_invitation (company_id, recipient_id)
                WHERE status = 'pending';
                ",
            )
            .await?;

        manager
            .get_connection()
            .execute_unprepared(
                r"
                CREATE UNIQUE INDEX IF NOT EXISTS idx_user_request_pending
                ON user_request (company_id, sender_id)
                WHERE status = 'pending';
                ",
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(UserRequest::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(CompanyInvitation::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum CompanyInvitation {
    Table,
    Id,
    CompanyId,
    SenderId,
    RecipientId,
    Status,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum UserRequest {
    Table,
    Id,
    CompanyId,
    SenderId,
    Status,
    CreatedAt,
    UpdatedAt,
}
