use super::groups::FoodGroup;
use super::totals::NutritionTotals;

/// A weighed portion of one food group. Replaced rather than edited.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FoodItem {
    group: &'static FoodGroup,
    weight_g: f32,
    totals: NutritionTotals,
}

impl FoodItem {
    pub fn new(group: &'static FoodGroup, weight_g: f32) -> Self {
        let weight_g = weight_g.max(0.0);
        let totals = NutritionTotals::from_macros(
            weight_g,
            weight_g * group.carb_per_g,
            weight_g * group.protein_per_g,
            weight_g * group.fat_per_g,
        );
        Self {
            group,
            weight_g,
            totals,
        }
    }

    pub fn group(&self) -> &'static FoodGroup {
        self.group
    }

    pub fn weight_g(&self) -> f32 {
        self.weight_g
    }

    pub fn totals(&self) -> NutritionTotals {
        self.totals
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nutrition::groups;

    #[test]
    fn test_item_scales_group_factors() {
        let legumes = groups::find(9).unwrap();
        let item = FoodItem::new(legumes, 100.0);
        let t = item.totals();
        assert!((t.carb_g - 46.5).abs() < 1e-3);
        assert!((t.protein_g - 21.9).abs() < 1e-3);
        assert!((t.fat_g - 3.0).abs() < 1e-3);
        assert!((t.kcal - (4.0 * 46.5 + 4.0 * 21.9 + 9.0 * 3.0)).abs() < 1e-2);
    }

    #[test]
    fn test_negative_weight_clamps_to_zero() {
        let item = FoodItem::new(groups::find(1).unwrap(), -3.0);
        assert_eq!(item.weight_g(), 0.0);
        assert!(item.totals().is_zero());
    }
}
