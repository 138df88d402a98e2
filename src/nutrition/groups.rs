//! Food group reference table
//!
//! Factors are grams of macronutrient per gram of food. Groups 7-9 and 16-18 change
//! composition when cooked; their cooked variants live at `id + COOKED_ID_OFFSET`.

use serde::Serialize;

pub const COOKED_ID_OFFSET: u8 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GroupColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl GroupColor {
    const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Perceived brightness, 0-255.
    pub fn luma(&self) -> u8 {
        ((self.r as u32 * 299 + self.g as u32 * 587 + self.b as u32 * 114) / 1000) as u8
    }
}

const DAIRY: GroupColor = GroupColor::rgb(90, 160, 230);
const FRUIT: GroupColor = GroupColor::rgb(250, 150, 40);
const VEGETABLE: GroupColor = GroupColor::rgb(60, 170, 70);
const STARCH: GroupColor = GroupColor::rgb(220, 190, 110);
const LEGUME: GroupColor = GroupColor::rgb(140, 90, 50);
const PASTRY: GroupColor = GroupColor::rgb(240, 140, 180);
const FAT: GroupColor = GroupColor::rgb(240, 220, 60);
const SUGAR: GroupColor = GroupColor::rgb(150, 80, 170);
const PROTEIN: GroupColor = GroupColor::rgb(200, 50, 50);

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FoodGroup {
    pub id: u8,
    pub name: &'static str,
    pub examples: &'static str,
    pub color: GroupColor,
    pub carb_per_g: f32,
    pub protein_per_g: f32,
    pub fat_per_g: f32,
}

impl FoodGroup {
    pub fn is_cooked_variant(&self) -> bool {
        self.id > COOKED_ID_OFFSET
    }

    /// True for groups whose composition depends on raw vs cooked.
    pub fn has_cooked_variant(&self) -> bool {
        find(self.id + COOKED_ID_OFFSET).is_some()
    }
}

macro_rules! group {
    ($id:expr, $name:expr, $examples:expr, $color:expr, carb: $c:expr, protein: $p:expr, fat: $f:expr) => {
        FoodGroup {
            id: $id,
            name: $name,
            examples: $examples,
            color: $color,
            carb_per_g: $c,
            protein_per_g: $p,
            fat_per_g: $f,
        }
    };
}

pub static FOOD_GROUPS: [FoodGroup; 26] = [
    group!(1, "Whole dairy", "Whole cow, sheep or goat milk, plain whole yogurt, curd",
        DAIRY, carb: 0.047191011, protein: 0.038014981, fat: 0.037910112),
    group!(2, "Semi-skimmed dairy", "Semi-skimmed pasteurized and UHT milk",
        DAIRY, carb: 0.046, protein: 0.033, fat: 0.016),
    group!(3, "Skimmed dairy", "Skimmed milk, skimmed yogurt plain or flavoured",
        DAIRY, carb: 0.052133333, protein: 0.041822222, fat: 0.0016),
    group!(4, "Sweetened dairy", "Cocoa milkshakes, fruit yogurts, sweetened drinking yogurts",
        DAIRY, carb: 0.131274419, protein: 0.032483721, fat: 0.02067907),
    group!(5, "Dairy desserts", "Rice pudding, egg flan, vanilla flan, custard",
        DAIRY, carb: 0.184489796, protein: 0.036653061, fat: 0.026938776),
    group!(6, "Fruit, dried fruit and juices", "Apricot, berries, cherries, dates, figs, kiwi, apple, melon, orange, banana, grapes",
        FRUIT, carb: 0.102822581, protein: 0.00719086, fat: 0.001747312),
    group!(7, "Vegetables", "Chard, artichoke, aubergine, broccoli, courgette, mushrooms, spinach, peas, lettuce, peppers, tomato, carrot",
        VEGETABLE, carb: 0.035195531, protein: 0.01673743, fat: 0.003128492),
    group!(8, "Cereals and tubers", "Rice, oats, sweet potato, chestnut, breakfast cereals, flour, corn, bread, pasta, potato, semolina",
        STARCH, carb: 0.4256, protein: 0.063073684, fat: 0.015621053),
    group!(9, "Legumes", "Beans, chickpeas, lentils",
        LEGUME, carb: 0.465, protein: 0.219, fat: 0.03),
    group!(10, "Pastry and baked goods", "Sponge cake, buns, croissant, biscuits, muffins, muesli, cakes, industrial pastries",
        PASTRY, carb: 0.501864407, protein: 0.071186441, fat: 0.211423729),
    group!(11, "Healthy fats", "Olive and peanut oil, olives, avocado, almonds, hazelnuts, peanuts, pistachios",
        FAT, carb: 0.045652174, protein: 0.053478261, fat: 0.679565217),
    group!(12, "Vegetable fats", "Sunflower, corn and soy oil, light mayonnaise, walnuts, pine nuts",
        FAT, carb: 0.00975, protein: 0.0110625, fat: 0.0879375),
    group!(13, "Saturated fats", "Coconut, coconut oil, butter, cooking or whipping cream",
        FAT, carb: 0.049206349, protein: 0.029365079, fat: 0.367460317),
    group!(14, "Very fatty blends", "Light margarine, enriched margarine, lard, pork fat",
        FAT, carb: 0.0032, protein: 0.0272, fat: 0.6624),
    group!(15, "Sugars and sweets", "White and brown sugar, honey, condensed milk, cocoa powder, low-calorie jam",
        SUGAR, carb: 0.810947368, protein: 0.021052632, fat: 0.018526316),
    group!(16, "Very lean protein", "Turkey, chicken, beef fillet, cooked ham, tuna in water, white fish, seafood, egg white",
        PROTEIN, carb: 0.002555911, protein: 0.073801917, fat: 0.006709265),
    group!(17, "Lean protein", "Pork loin, skinless chicken, beef steak, lean cured ham, oily fish, offal, quail",
        PROTEIN, carb: 0.00096, protein: 0.11456, fat: 0.03024),
    group!(18, "Medium-fat protein", "Pork chops, lamb, anchovies, canned tuna or sardines in oil, mackerel, salmon, egg, fresh cheese",
        PROTEIN, carb: 0.008351648, protein: 0.153186813, fat: 0.113186813),
    group!(19, "High-fat protein", "Lamb ribs, chorizo, sausages, fuet, aged cheeses",
        PROTEIN, carb: 0.004468085, protein: 0.222765957, fat: 0.299361702),
    group!(20, "Very high-fat protein", "Seasoned minced meat, pork belly, black pudding, mortadella, pate, salami",
        PROTEIN, carb: 0.016333333, protein: 0.145090909, fat: 0.308212121),
    group!(27, "Vegetables", "Chard, artichoke, aubergine, broccoli, courgette, mushrooms, spinach, peas, lettuce, peppers, tomato, carrot",
        VEGETABLE, carb: 0.037106447, protein: 0.017646177, fat: 0.003298351),
    group!(28, "Cereals and tubers", "Rice, oats, sweet potato, chestnut, breakfast cereals, flour, corn, bread, pasta, potato, semolina",
        STARCH, carb: 0.237695473, protein: 0.035226337, fat: 0.00872428),
    group!(29, "Legumes", "Beans, chickpeas, lentils",
        LEGUME, carb: 0.172933884, protein: 0.081446281, fat: 0.011157025),
    group!(36, "Very lean protein", "Turkey, chicken, beef fillet, cooked ham, tuna in water, white fish, seafood, egg white",
        PROTEIN, carb: 0.005798658, protein: 0.167436242, fat: 0.015221477),
    group!(37, "Lean protein", "Pork loin, skinless chicken, beef steak, lean cured ham, oily fish, offal, quail",
        PROTEIN, carb: 0.001726027, protein: 0.205972603, fat: 0.054369863),
    group!(38, "Medium-fat protein", "Pork chops, lamb, anchovies, canned tuna or sardines in oil, mackerel, salmon, egg, fresh cheese",
        PROTEIN, carb: 0.009282443, protein: 0.170259542, fat: 0.125801527),
];

pub fn find(id: u8) -> Option<&'static FoodGroup> {
    FOOD_GROUPS.iter().find(|g| g.id == id)
}

/// The variant to account for once a processing type is known.
pub fn for_processing(group: &'static FoodGroup, cooked: bool) -> &'static FoodGroup {
    let base_id = if group.is_cooked_variant() {
        group.id - COOKED_ID_OFFSET
    } else {
        group.id
    };
    let wanted = if cooked { base_id + COOKED_ID_OFFSET } else { base_id };
    find(wanted).unwrap_or(group)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_unique() {
        for (i, a) in FOOD_GROUPS.iter().enumerate() {
            for b in &FOOD_GROUPS[i + 1..] {
                assert_ne!(a.id, b.id);
            }
        }
    }

    #[test]
    fn test_cooked_variants_exist_for_processing_groups() {
        for id in [7, 8, 9, 16, 17, 18] {
            let raw = find(id).unwrap();
            assert!(raw.has_cooked_variant());
            let cooked = for_processing(raw, true);
            assert_eq!(cooked.id, id + COOKED_ID_OFFSET);
            assert_eq!(cooked.name, raw.name);
            assert_eq!(for_processing(cooked, false).id, id);
        }
    }

    #[test]
    fn test_group_without_cooked_variant_is_unchanged() {
        let fruit = find(6).unwrap();
        assert!(!fruit.has_cooked_variant());
        assert_eq!(for_processing(fruit, true).id, 6);
    }

    #[test]
    fn test_unknown_id() {
        assert!(find(0).is_none());
        assert!(find(21).is_none());
    }
}
