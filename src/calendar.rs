use crate::model::PeriodKind;
use chrono::{Datelike, NaiveDate, Weekday};
use std::collections::BTreeSet;

/// Classe une date : équivalent week-end ssi samedi/dimanche ou
/// présente dans l'ensemble de jours fériés.
pub fn period(date: NaiveDate, holidays: &BTreeSet<NaiveDate>) -> PeriodKind {
    if is_weekend(date) || holidays.contains(&date) {
        PeriodKind::Weekend
    } else {
        PeriodKind::Weekday
    }
}

pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Tous les jours du mois, en ordre croissant. `None` si le couple
/// (année, mois) n'est pas un mois calendaire valide.
pub fn month_days(year: i32, month: u32) -> Option<Vec<NaiveDate>> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let mut days = Vec::with_capacity(31);
    let mut current = first;
    while current.month() == month {
        days.push(current);
        current = current.succ_opt()?;
    }
    Some(days)
}
