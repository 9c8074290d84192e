//! Company entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A tenant organization that owns quizzes and a membership list.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "company")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// User who owns the company.
    #[sea_orm(indexed)]
    pub owner_id: String,

    /// Company name.
    pub name: String,

    /// Company description (optional).
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,

    /// Whether the company shows up in public listings.
    #[sea_orm(default_value = true)]
    pub visible: bool,

    /// When the company was created.
    pub created_at: DateTimeWithTimeZone,

    /// When the company was last updated.
    #[sea_orm(nullable)]
    pub updated_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::OwnerId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    Owner,
    #[sea_orm(has_many = "super::company_member::Entity")]
    Members,
    #[sea_orm(has_many = "super::company_invitation::Entity")]
    Invitations,
    #[sea_orm(has_many = "super::user_request::Entity")]
    Requests,
    #[sea_orm(has_many = "super::quiz::Entity")]
    Quizzes,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Owner.def()
    }
}

impl Related<super::company_member::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Members.def()
    }
}

impl Related<super::company_invitation::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Invitations.def()
    }
}

impl Related<super::user_request::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Requests.def()
    }
}

impl Related<super::quiz::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Quizzes.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
