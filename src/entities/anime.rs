use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "anime")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Owning user id. There is no database-level cascade; user
    /// deletion removes these rows explicitly in one transaction.
    pub owner_id: i32,

    pub title: String,

    /// JSON-encoded `Vec<i32>`, one episode count per season.
    pub season_distribution: String,

    /// Always equals the sum of `season_distribution`.
    pub episodes: i32,

    /// Always equals the length of `season_distribution`.
    pub seasons: i32,

    pub rating: f32,

    /// `En Emisión` | `Finalizado` | `Próximamente`
    pub status: String,

    pub cover: String,

    pub description: String,

    pub watched_episodes: i32,

    pub created_at: String,

    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
