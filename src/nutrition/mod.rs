//! Nutrition aggregates: FoodGroup -> FoodItem -> Dish -> Meal -> DailyLedger

pub mod dish;
pub mod groups;
pub mod item;
pub mod ledger;
pub mod meal;
pub mod totals;

pub use dish::Dish;
pub use groups::FoodGroup;
pub use item::FoodItem;
pub use ledger::DailyLedger;
pub use meal::Meal;
pub use totals::{NutritionTotals, Rations};
