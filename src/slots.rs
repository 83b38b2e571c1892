use crate::model::{PeriodKind, Post, PostCounts, SchedulerInput, ShiftTime, Slot, YearEndMode};
use crate::scheduler::{InfeasibleReason, SchedError, YearEndWindow};
use chrono::{Datelike, NaiveDate};
use tracing::debug;

/// Créneaux d'un jour ouvré : la bande Day y est couverte par la
/// rotation d'heures ouvrées et n'est pas planifiable ici.
pub const WEEKDAY_SLOTS: [(Post, ShiftTime); 3] = [
    (Post::Er, ShiftTime::Evening),
    (Post::Er, ShiftTime::Night),
    (Post::Ward, ShiftTime::Evening),
];

/// Créneaux d'un équivalent week-end : produit complet poste × bande.
pub const WEEKEND_SLOTS: [(Post, ShiftTime); 6] = [
    (Post::Er, ShiftTime::Day),
    (Post::Er, ShiftTime::Evening),
    (Post::Er, ShiftTime::Night),
    (Post::Ward, ShiftTime::Day),
    (Post::Ward, ShiftTime::Evening),
    (Post::Ward, ShiftTime::Night),
];

pub fn day_slots(period: PeriodKind) -> &'static [(Post, ShiftTime)] {
    match period {
        PeriodKind::Weekday => &WEEKDAY_SLOTS,
        PeriodKind::Weekend => &WEEKEND_SLOTS,
    }
}

/// Liste ordonnée des créneaux de la période : par date, puis poste,
/// puis bande horaire.
pub fn enumerate(input: &SchedulerInput) -> Vec<Slot> {
    let mut out = Vec::new();
    for &date in &input.days {
        for &(post, time) in day_slots(input.period_of(date)) {
            out.push(Slot { date, post, time });
        }
    }
    out
}

/// Le créneau appartient-il à la fenêtre du réveillon
/// (Night du 30/12 + tout le 31/12) ?
pub fn in_eve_window(date: NaiveDate, time: ShiftTime) -> bool {
    if date.month() != 12 {
        return false;
    }
    match date.day() {
        30 => time == ShiftTime::Night,
        31 => true,
        _ => false,
    }
}

/// Le créneau appartient-il à la fenêtre du Nouvel An (1–4/01) ?
pub fn in_new_year_window(date: NaiveDate) -> bool {
    date.month() == 1 && date.day() <= 4
}

/// Nombre de créneaux par (période, poste).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SlotTotals {
    pub weekday: PostCounts,
    pub weekend: PostCounts,
}

impl SlotTotals {
    pub fn get(&self, period: PeriodKind, post: Post) -> u32 {
        match period {
            PeriodKind::Weekday => self.weekday.get(post),
            PeriodKind::Weekend => self.weekend.get(post),
        }
    }

    fn bump(&mut self, period: PeriodKind, post: Post) {
        let counts = match period {
            PeriodKind::Weekday => &mut self.weekday,
            PeriodKind::Weekend => &mut self.weekend,
        };
        *counts.get_mut(post) += 1;
    }
}

/// Compte les créneaux par compartiment. En mode `Exclusive`, les
/// créneaux des fenêtres de fin d'année sont décomptés à part.
pub fn slot_totals(input: &SchedulerInput) -> SlotTotals {
    let exclusive = input.year_end.is_some()
        && input.policy.year_end_mode == YearEndMode::Exclusive;
    let mut totals = SlotTotals::default();
    for slot in enumerate(input) {
        if exclusive && (in_eve_window(slot.date, slot.time) || in_new_year_window(slot.date)) {
            continue;
        }
        totals.bump(input.period_of(slot.date), slot.post);
    }
    totals
}

/// Somme des quotas effectifs par compartiment.
pub fn quota_totals(input: &SchedulerInput) -> SlotTotals {
    let mut totals = SlotTotals::default();
    for quota in input.quotas.values() {
        for period in [PeriodKind::Weekday, PeriodKind::Weekend] {
            for post in Post::ALL {
                let counts = match period {
                    PeriodKind::Weekday => &mut totals.weekday,
                    PeriodKind::Weekend => &mut totals.weekend,
                };
                *counts.get_mut(post) += quota.get(period, post);
            }
        }
    }
    totals
}

/// Précontrôle de faisabilité : chaque compartiment (période, poste)
/// doit offrir exactement autant de créneaux que la somme des quotas
/// effectifs. Refuse de résoudre en cas d'écart.
pub fn precheck(input: &SchedulerInput) -> Result<(), SchedError> {
    let slots = slot_totals(input);
    let quotas = quota_totals(input);

    for period in [PeriodKind::Weekday, PeriodKind::Weekend] {
        for post in Post::ALL {
            let expected = slots.get(period, post);
            let got = quotas.get(period, post);
            if expected != got {
                return Err(SchedError::Infeasible(InfeasibleReason::Bucket {
                    period,
                    post,
                    slots: expected,
                    quota: got,
                }));
            }
        }
    }

    if let Some(year_end) = &input.year_end {
        let all = enumerate(input);
        let eve_slots = all
            .iter()
            .filter(|s| in_eve_window(s.date, s.time))
            .count() as u32;
        let ny_slots = all.iter().filter(|s| in_new_year_window(s.date)).count() as u32;
        let eve_quota: u32 = year_end.eve.values().sum();
        let ny_quota: u32 = year_end.new_year.values().sum();

        let window_ok = |slots: u32, quota: u32| match input.policy.year_end_mode {
            // Les médecins sans quota de fenêtre complètent le reste.
            YearEndMode::Combined => quota <= slots,
            // Seuls les quotas de fenêtre peuvent consommer la fenêtre.
            YearEndMode::Exclusive => quota == slots,
        };
        if (eve_quota > 0 || input.policy.year_end_mode == YearEndMode::Exclusive)
            && eve_slots > 0
            && !window_ok(eve_slots, eve_quota)
        {
            return Err(SchedError::Infeasible(InfeasibleReason::YearEnd {
                window: YearEndWindow::Eve,
                slots: eve_slots,
                quota: eve_quota,
            }));
        }
        if (ny_quota > 0 || input.policy.year_end_mode == YearEndMode::Exclusive)
            && ny_slots > 0
            && !window_ok(ny_slots, ny_quota)
        {
            return Err(SchedError::Infeasible(InfeasibleReason::YearEnd {
                window: YearEndWindow::NewYear,
                slots: ny_slots,
                quota: ny_quota,
            }));
        }
    }

    debug!(
        weekday_er = slots.weekday.er,
        weekday_ward = slots.weekday.ward,
        weekend_er = slots.weekend.er,
        weekend_ward = slots.weekend.ward,
        "feasibility precheck passed"
    );
    Ok(())
}
