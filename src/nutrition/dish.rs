use super::item::FoodItem;
use super::totals::NutritionTotals;

/// Food being assembled on the scale. `totals` always equals the sum of `items`.
#[derive(Debug, Clone, Default)]
pub struct Dish {
    items: Vec<FoodItem>,
    totals: NutritionTotals,
}

impl Dish {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_item(&mut self, item: FoodItem) {
        self.totals += item.totals();
        self.items.push(item);
    }

    pub fn items(&self) -> &[FoodItem] {
        &self.items
    }

    pub fn totals(&self) -> NutritionTotals {
        self.totals
    }

    pub fn weight_g(&self) -> f32 {
        self.totals.weight_g
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Back to the freshly created state.
    pub fn restore(&mut self) {
        self.items.clear();
        self.totals = NutritionTotals::ZERO;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nutrition::groups;

    #[test]
    fn test_totals_track_items() {
        let mut dish = Dish::new();
        let weights = [80.0, 35.5, 12.25];
        let ids = [8, 16, 11];
        let mut expected = NutritionTotals::ZERO;
        for (w, id) in weights.iter().zip(ids) {
            let item = FoodItem::new(groups::find(id).unwrap(), *w);
            expected += item.totals();
            dish.add_item(item);
            assert_eq!(dish.totals(), expected);
        }
        assert_eq!(dish.items().len(), 3);
        assert!((dish.weight_g() - 127.75).abs() < 1e-4);
    }

    #[test]
    fn test_restore_zeroes() {
        let mut dish = Dish::new();
        dish.add_item(FoodItem::new(groups::find(6).unwrap(), 120.0));
        dish.restore();
        assert!(dish.is_empty());
        assert!(dish.totals().is_zero());
    }
}
