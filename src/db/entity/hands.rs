use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "hands")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub game_id: i64,
    pub hand_number: i32,
    pub dealer_seat: i16,
    pub sb_seat: i16,
    pub bb_seat: i16,
    pub current_street: String,
    pub pot_size: i64,
    pub board_cards: String,
    pub is_completed: bool,
    pub start_time: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
