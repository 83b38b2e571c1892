use crate::model::{DoctorId, PeriodKind, Post, Schedule, SchedulerInput, ShiftTime};
use chrono::{Datelike, NaiveDate};

/// Une affectation provisoire (médecin, date, poste, bande)
/// casserait-elle une règle dure compte tenu des gardes déjà placées ?
///
/// La saturation des quotas est suivie par le solveur, pas ici.
pub fn violates(
    input: &SchedulerInput,
    schedule: &Schedule,
    doctor: &DoctorId,
    date: NaiveDate,
    post: Post,
    time: ShiftTime,
) -> bool {
    double_booked(schedule, doctor, date, post, time)
        || breaks_chain(input, schedule, doctor, date, time)
        || autopsy_conflict(input, doctor, date, time)
}

/// Un seul poste par (médecin, date, bande). L'enregistrement
/// identique déjà placé (même poste) n'est pas un conflit : c'est le
/// créneau en cours de revalidation.
fn double_booked(
    schedule: &Schedule,
    doctor: &DoctorId,
    date: NaiveDate,
    post: Post,
    time: ShiftTime,
) -> bool {
    schedule
        .entries(date)
        .iter()
        .any(|a| a.time == time && &a.doctor == doctor && a.post != post)
}

/// Position d'une bande sur l'axe linéaire des bandes consécutives :
/// Day(d) < Evening(d) < Night(d) < Day(d+1).
fn band_pos(date: NaiveDate, time: ShiftTime) -> i64 {
    i64::from(date.num_days_from_ce()) * 3 + time.index()
}

fn band_at(pos: i64) -> Option<(NaiveDate, ShiftTime)> {
    let days = i32::try_from(pos.div_euclid(3)).ok()?;
    let date = NaiveDate::from_num_days_from_ce_opt(days)?;
    let time = match pos.rem_euclid(3) {
        0 => ShiftTime::Day,
        1 => ShiftTime::Evening,
        _ => ShiftTime::Night,
    };
    Some((date, time))
}

/// Les jours ouvrés portent l'occupation implicite de la bande Day
/// (rotation d'heures ouvrées, hors du périmètre planifié).
fn has_implicit_day(input: &SchedulerInput, date: NaiveDate) -> bool {
    match input.period_of(date) {
        PeriodKind::Weekday => true,
        PeriodKind::Weekend => {
            input.policy.sandwiched_implicit_day
                && date
                    .pred_opt()
                    .is_some_and(|prev| input.period_of(prev) == PeriodKind::Weekday)
                && date
                    .succ_opt()
                    .is_some_and(|next| input.period_of(next) == PeriodKind::Weekday)
        }
    }
}

/// Le médecin est-il présent à l'hôpital sur cette position de bande ?
/// Les dates hors période planifiée ne contraignent rien.
fn present(
    input: &SchedulerInput,
    schedule: &Schedule,
    doctor: &DoctorId,
    tentative: i64,
    pos: i64,
) -> bool {
    if pos == tentative {
        return true;
    }
    let Some((date, time)) = band_at(pos) else {
        return false;
    };
    if !input.in_span(date) {
        return false;
    }
    if time == ShiftTime::Day && has_implicit_day(input, date) {
        return true;
    }
    schedule.has_band(doctor, date, time)
}

/// Chaîne de présence bornée à 2 : rejette toute affectation dont la
/// série maximale de bandes consécutives occupées, dans la fenêtre de
/// ±2 bandes autour de la bande provisoire, dépasse 2.
fn breaks_chain(
    input: &SchedulerInput,
    schedule: &Schedule,
    doctor: &DoctorId,
    date: NaiveDate,
    time: ShiftTime,
) -> bool {
    let tentative = band_pos(date, time);
    let mut run = 1u32;

    let mut pos = tentative - 1;
    while pos >= tentative - 2 && present(input, schedule, doctor, tentative, pos) {
        run += 1;
        pos -= 1;
    }
    let mut pos = tentative + 1;
    while pos <= tentative + 2 && present(input, schedule, doctor, tentative, pos) {
        run += 1;
        pos += 1;
    }

    run > 2
}

/// Bandes interdites autour d'une obligation d'autopsie.
fn autopsy_conflict(
    input: &SchedulerInput,
    doctor: &DoctorId,
    date: NaiveDate,
    time: ShiftTime,
) -> bool {
    let next = date.succ_opt();
    let prev = date.pred_opt();

    for duty in input.autopsies_for(doctor) {
        if !input.policy.offspan_autopsy_blocks && !input.in_span(duty.date) {
            continue;
        }
        if duty.date == date {
            let banned = match duty.time {
                // La nuit précédant l'autopsie du matin reste prenable.
                ShiftTime::Day => matches!(time, ShiftTime::Day | ShiftTime::Evening),
                ShiftTime::Evening | ShiftTime::Night => true,
            };
            if banned {
                return true;
            }
        } else if next == Some(duty.date) {
            // Autopsie Day en D interdit Night en D-1.
            if duty.time == ShiftTime::Day && time == ShiftTime::Night {
                return true;
            }
        } else if prev == Some(duty.date) {
            match duty.time {
                // Autopsie Evening en D interdit Night en D+1.
                ShiftTime::Evening if time == ShiftTime::Night => return true,
                // Autopsie Night en D interdit Day en D+1.
                ShiftTime::Night if time == ShiftTime::Day => return true,
                _ => {}
            }
        }
    }
    false
}

/// Pénalité douce : nombre de triplets (médecin, paire de dates
/// consécutives, bande) où le médecin travaille la même bande deux
/// jours de suite. Rapportée et minimisée, jamais bloquante.
pub fn soft_penalty(input: &SchedulerInput, schedule: &Schedule) -> u32 {
    let mut penalty = 0u32;
    for doctor in &input.doctors {
        for window in input.days.windows(2) {
            let [date, next] = window else { continue };
            if next.pred_opt() != Some(*date) {
                continue;
            }
            for time in ShiftTime::ALL {
                if schedule.has_band(doctor, *date, time) && schedule.has_band(doctor, *next, time)
                {
                    penalty += 1;
                }
            }
        }
    }
    penalty
}
