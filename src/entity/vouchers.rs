use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "vouchers")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    #[sea_orm(unique)]
    pub code: String,
    pub expired_time: DateTimeWithTimeZone,
    pub quantity_used: i32,
    pub quantity_max: i32,
    pub buyer_id: Option<i64>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::buyers::Entity",
        from = "Column::BuyerId",
        to = "super::buyers::Column::Id"
    )]
    Buyers,
}

impl Related<super::buyers::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Buyers.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
