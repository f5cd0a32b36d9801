use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum HolidayKind {
    Regular,
    Special,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Holiday {
    pub date: NaiveDate,
    pub kind: HolidayKind,
}

/// Static holiday calendar for one or more years.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HolidayCalendar {
    regular: BTreeSet<NaiveDate>,
    special: BTreeSet<NaiveDate>,
}

impl HolidayCalendar {
    pub fn new(holidays: impl IntoIterator<Item = Holiday>) -> Self {
        let mut calendar = Self::default();
        for h in holidays {
            match h.kind {
                HolidayKind::Regular => calendar.regular.insert(h.date),
                HolidayKind::Special => calendar.special.insert(h.date),
            };
        }
        calendar
    }

    pub fn kind_of(&self, date: NaiveDate) -> Option<HolidayKind> {
        if self.regular.contains(&date) {
            Some(HolidayKind::Regular)
        } else if self.special.contains(&date) {
            Some(HolidayKind::Special)
        } else {
            None
        }
    }

    pub fn is_holiday(&self, date: NaiveDate) -> bool {
        self.kind_of(date).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn regular_wins_over_special_on_same_date() {
        let date = NaiveDate::from_ymd_opt(2026, 12, 25).unwrap();
        let calendar = HolidayCalendar::new([
            Holiday { date, kind: HolidayKind::Special },
            Holiday { date, kind: HolidayKind::Regular },
        ]);
        assert_eq!(calendar.kind_of(date), Some(HolidayKind::Regular));
        assert!(!calendar.is_holiday(NaiveDate::from_ymd_opt(2026, 12, 24).unwrap()));
    }
}
