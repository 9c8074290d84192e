//! Create company and `company_member` tables.

use sea_orm_migration::prelude::*;

use super::m20250101_000001_create_user_table::User;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Company::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Company::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Company::OwnerId).string_len(32).not_null())
                    .col(ColumnDef::new(Company::Name).string_len(128).not_null())
                    .col(ColumnDef::new(Company::Description).text())
                    .col(
                        ColumnDef::new(Company::Visible)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Company::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Company::UpdatedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_company_owner")
                            .from(Company::Table, Company::OwnerId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_company_owner_id")
                    .table(Company::Table)
                    .col(Company::OwnerId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(CompanyMember::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CompanyMember::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(CompanyMember::CompanyId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(ColumnDef::new(CompanyMember::UserId).string_len(32).not_null())
                    .col(
                        ColumnDef::new(CompanyMember::Role)
                            .string_len(20)
                            .not_null()
                            .default("member"),
                    )
                    .col(
                        ColumnDef::new(CompanyMember::JoinedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_company_member_company")
                            .from(CompanyMember::Table, CompanyMember::CompanyId)
                            .to(Company::Table, Company::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_company_member_user")
                            .from(CompanyMember::Table, CompanyMember::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // One membership row per (company, user)
        manager
            .create_index(
                Index::create()
                    .name("idx_company_member_unique")
                    .table(CompanyMember::Table)
                    .col(CompanyMember::CompanyId)
                    .col(CompanyMember::UserId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_company_member_user_id")
                    .table(CompanyMember::Table)
                    .col(CompanyMember::UserId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(CompanyMember::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Company::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum Company {
    Table,
    Id,
    OwnerId,
    Name,
    Description,
    Visible,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum CompanyMember {
    Table,
    Id,
    CompanyId,
    UserId,
    Role,
    JoinedAt,
}
