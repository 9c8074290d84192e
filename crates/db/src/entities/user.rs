//! User entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A registered account. Credentials live with the authentication service;
/// this table only anchors foreign keys.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Unique login name.
    #[sea_orm(unique)]
    pub username: String,

    /// Contact email (optional).
    #[sea_orm(nullable)]
    pub email: Option<String>,

    /// When the account was created.
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::company_member::Entity")]
    Memberships,
    #[sea_orm(has_many = "super::quiz_result::Entity")]
    Results,
    #[sea_orm(has_many = "super::notification::Entity")]
    Notifications,
}

impl Related<super::company_member::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Memberships.def()
    }
}

impl Related<super::quiz_result::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Results.def()
    }
}

impl Related<super::notification::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Notifications.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
