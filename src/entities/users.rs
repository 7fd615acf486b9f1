use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub username: String,

    /// Lowercased copy of `username`. The unique index backs
    /// case-insensitive lookups and closes the duplicate-registration
    /// race at the storage layer.
    #[sea_orm(unique)]
    pub username_lower: String,

    /// Argon2id password hash
    pub password_hash: String,

    /// `owner` | `admin` | `user`
    pub role: String,

    pub created_at: String,

    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
