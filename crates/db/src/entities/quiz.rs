//! Quiz entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A quiz authored by a company.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "quiz")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Owning company.
    #[sea_orm(indexed)]
    pub company_id: String,

    /// Quiz title.
    pub title: String,

    /// Quiz description (optional).
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,

    /// How many days may pass between attempts before members are reminded.
    pub frequency: i32,

    pub created_at: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub updated_at: Option<DateTimeWithTimeZone>,
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
    #[sea_orm(has_many = "super::question::Entity")]
    Questions,
    #[sea_orm(has_many = "super::quiz_result::Entity")]
    Results,
}

impl Related<super::company::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Company.def()
    }
}

impl Related<super::question::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Questions.def()
    }
}

impl Related<super::quiz_result::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Results.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
