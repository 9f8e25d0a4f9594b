use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "products")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub product_code: String,
    pub name: String,
    pub image: Option<String>,
    #[sea_orm(column_name = "type")]
    pub product_type: String,
    pub price: f64,
    pub description: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::detail_orders::Entity")]
    DetailOrders,
    #[sea_orm(has_many = "super::ratings::Entity")]
    Ratings,
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
