use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(unique)]
    pub order_code: String,
    pub user_id: Option<i32>,
    pub buyer_id: Option<i64>,
    pub total: f64,
    pub discount: f64,
    pub description: String,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id"
    )]
    Users,
    #[sea_orm(
        belongs_to = "super::buyers::Entity",
        from = "Column::BuyerId",
        to = "super::buyers::Column::Id"
    )]
    Buyers,
    #[sea_orm(has_many = "super::detail_orders::Entity")]
    DetailOrders,
    #[sea_orm(has_many = "super::ratings::Entity")]
    Ratings,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl Related<super::buyers::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Buyers.def()
    }
}

impl Related<super::detail_orders::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DetailOrders.def()
    }
}

impl Related<super::ratings::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Ratings.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
