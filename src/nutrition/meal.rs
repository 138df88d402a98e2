use super::dish::Dish;
use super::totals::NutritionTotals;

/// Running sum of the dishes folded in during one sitting.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Meal {
    dish_count: u32,
    totals: NutritionTotals,
}

impl Meal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fold(&mut self, dish: &Dish) {
        self.totals += dish.totals();
        self.dish_count += 1;
    }

    pub fn dish_count(&self) -> u32 {
        self.dish_count
    }

    pub fn totals(&self) -> NutritionTotals {
        self.totals
    }

    pub fn weight_g(&self) -> f32 {
        self.totals.weight_g
    }

    pub fn is_empty(&self) -> bool {
        self.dish_count == 0
    }

    pub fn restore(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nutrition::groups;
    use crate::nutrition::item::FoodItem;

    fn dish_of(id: u8, weight: f32) -> Dish {
        let mut dish = Dish::new();
        dish.add_item(FoodItem::new(groups::find(id).unwrap(), weight));
        dish
    }

    #[test]
    fn test_totals_are_sum_of_folded_dishes() {
        let a = dish_of(8, 80.0);
        let b = dish_of(17, 120.0);
        let mut meal = Meal::new();
        meal.fold(&a);
        meal.fold(&b);
        assert_eq!(meal.dish_count(), 2);
        assert_eq!(meal.totals(), a.totals() + b.totals());
    }

    #[test]
    fn test_restore_zeroes_meal() {
        let a = dish_of(8, 80.0);
        let mut meal = Meal::new();
        meal.fold(&a);
        meal.restore();
        assert!(meal.is_empty());
        assert!(meal.totals().is_zero());
    }
}
