//! Company member entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Role of a company member.
///
/// The owner holds a membership row of its own, so "members" always
/// includes the owner while "administrators" never does.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "lowercase")]
pub enum CompanyRole {
    /// Regular member.
    #[default]
    #[sea_orm(string_value = "member")]
    Member,
    /// Administrator - can invite, approve and author quizzes.
    #[sea_orm(string_value = "administrator")]
    Administrator,
    /// Owner - full control including deletion and admin management.
    #[sea_orm(string_value = "owner")]
    Owner,
}

impl CompanyRole {
    /// Check if the role can manage invitations, requests and quizzes.
    #[must_use]
    pub const fn can_manage(&self) -> bool {
        matches!(self, Self::Administrator | Self::Owner)
    }

    /// Check if this is the owner role.
    #[must_use]
    pub const fn is_owner(&self) -> bool {
        matches!(self, Self::Owner)
    }
}

/// Company member - tracks which users belong to which companies.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "company_member")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// The company.
    #[sea_orm(indexed)]
    pub company_id: String,

    /// The member.
    #[sea_orm(indexed)]
    pub user_id: String,

    /// Role of the member in the company.
    pub role: CompanyRole,

    /// When the user joined.
    pub joined_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::company::Entity",
        from = "Column::CompanyId",
        to = "super::company::Column::Id",
        on_delete = "Cascade"
    )]
    Company,
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    User,
}

impl Related<super::company::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Company.def()
    }
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
