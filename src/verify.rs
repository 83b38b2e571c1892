use crate::model::{
    DoctorId, PeriodKind, Post, Schedule, SchedulerInput, ShiftTime, YearEndMode,
};
use crate::scheduler::{violates, YearEndWindow};
use crate::slots::{self, in_eve_window, in_new_year_window};
use chrono::NaiveDate;
use std::collections::BTreeMap;
use tracing::debug;

/// Écart entre quota effectif et occupation observée.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuotaMismatch {
    pub doctor: DoctorId,
    pub period: PeriodKind,
    pub post: Post,
    pub expected: u32,
    pub got: u32,
}

/// Affectation placée qui casse une règle dure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleViolation {
    pub date: NaiveDate,
    pub post: Post,
    pub time: ShiftTime,
    pub doctor: DoctorId,
}

/// Écart sur une fenêtre de fin d'année.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowMismatch {
    pub doctor: DoctorId,
    pub window: YearEndWindow,
    pub expected: u32,
    pub got: u32,
}

/// Rapport structuré de vérification. Pur constat : le planning n'est
/// jamais modifié.
#[derive(Debug, Clone, Default)]
pub struct VerifyReport {
    /// Créneaux énumérés absents du planning.
    pub open_slots: usize,
    /// Entrées du planning hors de l'énumération (ou en double).
    pub foreign_entries: usize,
    pub quota_mismatches: Vec<QuotaMismatch>,
    pub rule_violations: Vec<RuleViolation>,
    pub window_mismatches: Vec<WindowMismatch>,
}

impl VerifyReport {
    pub fn is_ok(&self) -> bool {
        self.open_slots == 0
            && self.foreign_entries == 0
            && self.quota_mismatches.is_empty()
            && self.rule_violations.is_empty()
            && self.window_mismatches.is_empty()
    }
}

impl std::fmt::Display for VerifyReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_ok() {
            return writeln!(f, "schedule verification passed");
        }
        if self.open_slots > 0 {
            writeln!(f, "open slots: {}", self.open_slots)?;
        }
        if self.foreign_entries > 0 {
            writeln!(f, "foreign entries: {}", self.foreign_entries)?;
        }
        for m in &self.quota_mismatches {
            writeln!(
                f,
                "{} {} {}: expected {}, got {}",
                m.doctor,
                m.period.label(),
                m.post.label(),
                m.expected,
                m.got
            )?;
        }
        for v in &self.rule_violations {
            writeln!(
                f,
                "{} {} {}: {} breaks a hard rule",
                v.date,
                v.post.label(),
                v.time.label(),
                v.doctor
            )?;
        }
        for w in &self.window_mismatches {
            writeln!(
                f,
                "{} {} window: expected {}, got {}",
                w.doctor,
                w.window.label(),
                w.expected,
                w.got
            )?;
        }
        Ok(())
    }
}

/// Revérifie un planning produit : couverture des créneaux, quotas
/// exacts par (période, poste), règles dures rejouées une à une,
/// fenêtres de fin d'année.
pub fn verify_schedule(input: &SchedulerInput, schedule: &Schedule) -> VerifyReport {
    let mut report = VerifyReport::default();
    let exclusive =
        input.year_end.is_some() && input.policy.year_end_mode == YearEndMode::Exclusive;

    // Couverture : chaque créneau énuméré exactement une fois.
    let mut coverage: BTreeMap<(NaiveDate, Post, ShiftTime), usize> = slots::enumerate(input)
        .into_iter()
        .map(|s| ((s.date, s.post, s.time), 0usize))
        .collect();
    for (date, entries) in schedule.iter() {
        for a in entries {
            match coverage.get_mut(&(date, a.post, a.time)) {
                Some(n) => *n += 1,
                None => report.foreign_entries += 1,
            }
        }
    }
    for (_, &n) in coverage.iter() {
        match n {
            0 => report.open_slots += 1,
            1 => {}
            extra => report.foreign_entries += extra - 1,
        }
    }

    // Occupation observée par médecin et compartiment.
    let mut observed: BTreeMap<&DoctorId, crate::model::EffectiveQuota> = BTreeMap::new();
    let mut eve_observed: BTreeMap<&DoctorId, u32> = BTreeMap::new();
    let mut ny_observed: BTreeMap<&DoctorId, u32> = BTreeMap::new();
    for (date, entries) in schedule.iter() {
        let period = input.period_of(date);
        for a in entries {
            if in_eve_window(date, a.time) {
                *eve_observed.entry(&a.doctor).or_default() += 1;
            }
            if in_new_year_window(date) {
                *ny_observed.entry(&a.doctor).or_default() += 1;
            }
            if exclusive && (in_eve_window(date, a.time) || in_new_year_window(date)) {
                continue;
            }
            *observed
                .entry(&a.doctor)
                .or_default()
                .get_mut(period, a.post) += 1;
        }
    }

    for (doctor, quota) in &input.quotas {
        let seen = observed.get(doctor).copied().unwrap_or_default();
        for period in [PeriodKind::Weekday, PeriodKind::Weekend] {
            for post in Post::ALL {
                let expected = quota.get(period, post);
                let got = seen.get(period, post);
                if expected != got {
                    report.quota_mismatches.push(QuotaMismatch {
                        doctor: doctor.clone(),
                        period,
                        post,
                        expected,
                        got,
                    });
                }
            }
        }
    }

    // Règles dures rejouées sur chaque affectation placée.
    for (date, entries) in schedule.iter() {
        for a in entries {
            if violates(input, schedule, &a.doctor, date, a.post, a.time) {
                report.rule_violations.push(RuleViolation {
                    date,
                    post: a.post,
                    time: a.time,
                    doctor: a.doctor.clone(),
                });
            }
        }
    }

    if let Some(year_end) = &input.year_end {
        let has_eve_slots = slots::enumerate(input)
            .iter()
            .any(|s| in_eve_window(s.date, s.time));
        let has_ny_slots = slots::enumerate(input)
            .iter()
            .any(|s| in_new_year_window(s.date));
        if has_eve_slots {
            for (doctor, &expected) in &year_end.eve {
                let got = eve_observed.get(doctor).copied().unwrap_or(0);
                if got != expected {
                    report.window_mismatches.push(WindowMismatch {
                        doctor: doctor.clone(),
                        window: YearEndWindow::Eve,
                        expected,
                        got,
                    });
                }
            }
        }
        if has_ny_slots {
            for (doctor, &expected) in &year_end.new_year {
                let got = ny_observed.get(doctor).copied().unwrap_or(0);
                if got != expected {
                    report.window_mismatches.push(WindowMismatch {
                        doctor: doctor.clone(),
                        window: YearEndWindow::NewYear,
                        expected,
                        got,
                    });
                }
            }
        }
    }

    debug!(
        ok = report.is_ok(),
        open = report.open_slots,
        "schedule verified"
    );
    report
}
