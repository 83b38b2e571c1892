use crate::calendar;
use crate::model::{PeriodKind, Post, Schedule, SchedulerInput, ShiftTime};
use crate::slots::WEEKEND_SLOTS;
use crate::verify::verify_schedule;
use anyhow::{Context, Result};
use chrono::NaiveDate;
use csv::WriterBuilder;
use std::collections::BTreeSet;
use std::path::Path;

fn column_label(post: Post, time: ShiftTime) -> String {
    format!("{} {}", post.label(), time.label())
}

/// Export CSV du planning : une ligne par date, une colonne par couple
/// (poste, bande) en ordre canonique, puis un bloc récapitulatif
/// observé/attendu par médecin.
pub fn export_schedule_csv<P: AsRef<Path>>(
    path: P,
    input: &SchedulerInput,
    schedule: &Schedule,
) -> Result<()> {
    let path = path.as_ref();
    let mut w = WriterBuilder::new()
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("writing schedule {}", path.display()))?;

    let mut header = vec!["Date".to_string(), "Day".to_string(), "Period".to_string()];
    header.extend(WEEKEND_SLOTS.iter().map(|&(p, t)| column_label(p, t)));
    w.write_record(&header)?;

    for &date in &input.days {
        let period = input.period_of(date);
        let mut row = vec![
            date.to_string(),
            date.format("%A").to_string(),
            period.label().to_string(),
        ];
        for &(post, time) in &WEEKEND_SLOTS {
            let cell = schedule
                .doctor_for(date, post, time)
                .map(|d| d.as_str().to_string())
                .unwrap_or_default();
            row.push(cell);
        }
        w.write_record(&row)?;
    }

    // Bloc récapitulatif : occupation observée puis quota attendu.
    let report = verify_schedule(input, schedule);
    w.write_record(None::<&[u8]>)?;
    w.write_record(["Doctor", "Weekday ER", "Weekday ward", "Weekend ER", "Weekend ward"])?;
    for doctor in input.quotas.keys() {
        let mut observed = [0u32; 4];
        for (date, entries) in schedule.iter() {
            let period = input.period_of(date);
            for a in entries {
                if &a.doctor != doctor {
                    continue;
                }
                let idx = match (period, a.post) {
                    (PeriodKind::Weekday, Post::Er) => 0,
                    (PeriodKind::Weekday, Post::Ward) => 1,
                    (PeriodKind::Weekend, Post::Er) => 2,
                    (PeriodKind::Weekend, Post::Ward) => 3,
                };
                observed[idx] += 1;
            }
        }
        w.write_record([
            doctor.as_str().to_string(),
            observed[0].to_string(),
            observed[1].to_string(),
            observed[2].to_string(),
            observed[3].to_string(),
        ])?;
    }
    w.write_record(None::<&[u8]>)?;
    w.write_record(["Expected", "Weekday ER", "Weekday ward", "Weekend ER", "Weekend ward"])?;
    for (doctor, quota) in &input.quotas {
        w.write_record([
            doctor.as_str().to_string(),
            quota.weekday.er.to_string(),
            quota.weekday.ward.to_string(),
            quota.weekend.er.to_string(),
            quota.weekend.ward.to_string(),
        ])?;
    }
    if !report.is_ok() {
        w.write_record(None::<&[u8]>)?;
        w.write_record(["Warning", "schedule did not verify clean"])?;
    }
    w.flush()?;
    Ok(())
}

/// Gabarit mensuel vierge : une ligne par jour, colonnes de garde
/// vides. Les bandes Day des jours ouvrés sont marquées `-` : elles
/// relèvent de la rotation d'heures ouvrées, pas de ce planning.
pub fn export_blank_csv<P: AsRef<Path>>(
    path: P,
    year: i32,
    month: u32,
    holidays: &BTreeSet<NaiveDate>,
) -> Result<()> {
    let days = calendar::month_days(year, month)
        .with_context(|| format!("invalid month: {year}-{month}"))?;
    let path = path.as_ref();
    let mut w = WriterBuilder::new()
        .from_path(path)
        .with_context(|| format!("writing template {}", path.display()))?;

    let mut header = vec!["Date".to_string(), "Day".to_string(), "Period".to_string()];
    header.extend(WEEKEND_SLOTS.iter().map(|&(p, t)| column_label(p, t)));
    w.write_record(&header)?;

    for date in days {
        let period = calendar::period(date, holidays);
        let mut row = vec![
            date.to_string(),
            date.format("%a").to_string(),
            period.label().to_string(),
        ];
        for &(_, time) in &WEEKEND_SLOTS {
            let cell = if period == PeriodKind::Weekday && time == ShiftTime::Day {
                "-"
            } else {
                ""
            };
            row.push(cell.to_string());
        }
        w.write_record(&row)?;
    }
    w.flush()?;
    Ok(())
}
