use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign};

pub const KCAL_PER_G_CARB: f32 = 4.0;
pub const KCAL_PER_G_PROTEIN: f32 = 4.0;
pub const KCAL_PER_G_FAT: f32 = 9.0;

/// Grams of macronutrient in one exchange portion.
pub const GRAMS_PER_RATION: f32 = 10.0;

/// Additive rollup shared by items, dishes, meals and the daily ledger.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct NutritionTotals {
    pub weight_g: f32,
    pub carb_g: f32,
    pub protein_g: f32,
    pub fat_g: f32,
    pub kcal: f32,
}

/// Exchange portions rounded to the nearest half.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rations {
    pub carb: f32,
    pub protein: f32,
    pub fat: f32,
}

pub fn rations_of(grams: f32) -> f32 {
    (2.0 * (grams / GRAMS_PER_RATION)).round() / 2.0
}

impl NutritionTotals {
    pub const ZERO: Self = Self {
        weight_g: 0.0,
        carb_g: 0.0,
        protein_g: 0.0,
        fat_g: 0.0,
        kcal: 0.0,
    };

    pub fn from_macros(weight_g: f32, carb_g: f32, protein_g: f32, fat_g: f32) -> Self {
        Self {
            weight_g,
            carb_g,
            protein_g,
            fat_g,
            kcal: KCAL_PER_G_CARB * carb_g + KCAL_PER_G_PROTEIN * protein_g + KCAL_PER_G_FAT * fat_g,
        }
    }

    pub fn rations(&self) -> Rations {
        Rations {
            carb: rations_of(self.carb_g),
            protein: rations_of(self.protein_g),
            fat: rations_of(self.fat_g),
        }
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }
}

impl Add for NutritionTotals {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            weight_g: self.weight_g + rhs.weight_g,
            carb_g: self.carb_g + rhs.carb_g,
            protein_g: self.protein_g + rhs.protein_g,
            fat_g: self.fat_g + rhs.fat_g,
            kcal: self.kcal + rhs.kcal,
        }
    }
}

impl AddAssign for NutritionTotals {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kcal_from_macros() {
        let t = NutritionTotals::from_macros(100.0, 10.0, 5.0, 2.0);
        assert_eq!(t.kcal, 40.0 + 20.0 + 18.0);
    }

    #[test]
    fn test_rations_round_to_half() {
        assert_eq!(rations_of(0.0), 0.0);
        assert_eq!(rations_of(7.4), 0.5);
        assert_eq!(rations_of(12.0), 1.0);
        assert_eq!(rations_of(13.0), 1.5);
        assert_eq!(rations_of(27.6), 3.0);
    }
}
