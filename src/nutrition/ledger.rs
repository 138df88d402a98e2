use super::meal::Meal;
use super::totals::NutritionTotals;
use crate::storage::MealRecord;
use chrono::NaiveDate;

/// Accumulated intake for one calendar day.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DailyLedger {
    date: NaiveDate,
    meal_count: u32,
    totals: NutritionTotals,
}

impl DailyLedger {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            meal_count: 0,
            totals: NutritionTotals::ZERO,
        }
    }

    /// Sums the records stamped with `date`, ignoring other days.
    pub fn rebuild<'a>(date: NaiveDate, records: impl IntoIterator<Item = &'a MealRecord>) -> Self {
        let mut ledger = Self::new(date);
        for record in records.into_iter().filter(|r| r.timestamp.date() == date) {
            ledger.totals += record.totals;
            ledger.meal_count += 1;
        }
        ledger
    }

    pub fn add_meal(&mut self, meal: &Meal) {
        self.totals += meal.totals();
        self.meal_count += 1;
    }

    pub fn clear(&mut self) {
        *self = Self::new(self.date);
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn meal_count(&self) -> u32 {
        self.meal_count
    }

    pub fn totals(&self) -> NutritionTotals {
        self.totals
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;

    fn record(ts: &str, weight: f32) -> MealRecord {
        MealRecord {
            timestamp: NaiveDateTime::parse_from_str(ts, "%Y-%m-%d %H:%M:%S").unwrap(),
            dish_count: 1,
            totals: NutritionTotals::from_macros(weight, 10.0, 5.0, 2.0),
        }
    }

    #[test]
    fn test_rebuild_only_counts_today() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 14).unwrap();
        let records = [
            record("2024-03-13 21:00:00", 300.0),
            record("2024-03-14 08:30:00", 150.0),
            record("2024-03-14 13:45:10", 420.0),
        ];
        let ledger = DailyLedger::rebuild(today, &records);
        assert_eq!(ledger.meal_count(), 2);
        assert_eq!(ledger.totals().weight_g, 570.0);
        assert_eq!(ledger.totals().carb_g, 20.0);
    }

    #[test]
    fn test_clear_keeps_date() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 14).unwrap();
        let mut ledger = DailyLedger::rebuild(today, &[record("2024-03-14 08:30:00", 150.0)]);
        ledger.clear();
        assert_eq!(ledger.date(), today);
        assert_eq!(ledger.meal_count(), 0);
        assert!(ledger.totals().is_zero());
    }
}
