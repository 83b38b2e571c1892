#![forbid(unsafe_code)]
use chrono::NaiveDate;
use medroster::{
    quota, schedule_span, verify_schedule, AnnealingSolver, AutopsyDuty, DoctorId, EffectiveQuota,
    Engine, ExactSolver, NominalQuota, PeriodKind, Post, PostCounts, SchedError, SchedulerInput,
    ShiftTime, SolveOptions, Solver,
};
use std::collections::BTreeMap;
use std::time::Duration;

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn eff(weekday_er: u32, weekday_ward: u32, weekend_er: u32, weekend_ward: u32) -> EffectiveQuota {
    EffectiveQuota {
        weekday: PostCounts {
            er: weekday_er,
            ward: weekday_ward,
        },
        weekend: PostCounts {
            er: weekend_er,
            ward: weekend_ward,
        },
    }
}

fn input_for(days: Vec<NaiveDate>, quotas: Vec<(&str, EffectiveQuota)>) -> SchedulerInput {
    let doctors: Vec<DoctorId> = quotas.iter().map(|(n, _)| DoctorId::new(n)).collect();
    let quotas: BTreeMap<DoctorId, EffectiveQuota> = quotas
        .into_iter()
        .map(|(n, q)| (DoctorId::new(n), q))
        .collect();
    SchedulerInput {
        days,
        doctors,
        quotas,
        ..SchedulerInput::default()
    }
}

fn opts_with_budget(secs: u64) -> SolveOptions {
    SolveOptions {
        time_budget: Duration::from_secs(secs),
        ..SolveOptions::default()
    }
}

/// Saturday 2025-07-12: six weekend slots over three doctors.
fn tiny_weekend() -> SchedulerInput {
    input_for(
        vec![d(2025, 7, 12)],
        vec![
            ("a", eff(0, 0, 2, 0)),
            ("b", eff(0, 0, 1, 1)),
            ("c", eff(0, 0, 0, 2)),
        ],
    )
}

#[test]
fn exact_solver_covers_a_tiny_weekend() {
    let input = tiny_weekend();
    let schedule = ExactSolver::new(opts_with_budget(30)).solve(&input).unwrap();

    assert_eq!(schedule.len(), 6);
    let report = verify_schedule(&input, &schedule);
    assert!(report.is_ok(), "verification failed:\n{report}");
}

#[test]
fn one_doctor_cannot_saturate_a_weekend_day() {
    // Quotas balance the six slots exactly, but one doctor can hold at
    // most one post per band and chain at most two bands.
    let input = input_for(vec![d(2025, 7, 12)], vec![("a", eff(0, 0, 3, 3))]);
    let err = ExactSolver::new(opts_with_budget(30))
        .solve(&input)
        .unwrap_err();
    assert!(matches!(err, SchedError::Unsatisfiable));
}

#[test]
fn empty_quota_month_is_infeasible_before_solving() {
    let days: Vec<NaiveDate> = (1..=28).map(|day| d(2027, 2, day)).collect();
    let input = input_for(days, vec![]);
    let err = schedule_span(&input, &SolveOptions::default()).unwrap_err();
    assert!(matches!(err, SchedError::Infeasible(_)));
}

#[test]
fn classical_four_doctor_month_hits_every_quota() {
    // February 2027 has 20 weekdays and 8 weekend days and no
    // configured holidays.
    let days: Vec<NaiveDate> = (1..=28).map(|day| d(2027, 2, day)).collect();

    let mut nominal = BTreeMap::new();
    for name in ["a", "b", "c", "d"] {
        nominal.insert(
            DoctorId::new(name),
            NominalQuota {
                weekday: PostCounts { er: 5, ward: 5 },
                weekend: PostCounts { er: 2, ward: 2 },
            },
        );
    }
    let quotas = quota::adjust(&nominal);
    let doctors: Vec<DoctorId> = quotas.keys().cloned().collect();
    let input = SchedulerInput {
        days,
        doctors,
        quotas,
        ..SchedulerInput::default()
    };

    let outcome = schedule_span(&input, &opts_with_budget(120)).unwrap();
    assert!(outcome.report.is_ok());
    assert_eq!(outcome.schedule.len(), 20 * 3 + 8 * 6);

    // Weekday ER ends up at twice the nominal count, ward at one time.
    let a = DoctorId::new("a");
    let mut weekday_er = 0;
    let mut weekday_ward = 0;
    for (date, entries) in outcome.schedule.iter() {
        if input.period_of(date) != PeriodKind::Weekday {
            continue;
        }
        for entry in entries {
            if entry.doctor == a {
                match entry.post {
                    Post::Er => weekday_er += 1,
                    Post::Ward => weekday_ward += 1,
                }
            }
        }
    }
    assert_eq!(weekday_er, 10);
    assert_eq!(weekday_ward, 5);
}

#[test]
fn identical_inputs_produce_identical_schedules() {
    let input = tiny_weekend();
    let opts = opts_with_budget(30);
    let first = ExactSolver::new(opts).solve(&input).unwrap();
    let second = ExactSolver::new(opts).solve(&input).unwrap();
    assert_eq!(first, second);
}

#[test]
fn solver_routes_around_an_autopsy() {
    // Mon 2025-07-07 .. Wed 2025-07-09, autopsy on Tuesday's Day band.
    let days = vec![d(2025, 7, 7), d(2025, 7, 8), d(2025, 7, 9)];
    let mut input = input_for(
        days,
        vec![
            ("a", eff(2, 0, 0, 0)),
            ("b", eff(2, 1, 0, 0)),
            ("c", eff(1, 1, 0, 0)),
            ("d", eff(1, 1, 0, 0)),
        ],
    );
    let a = DoctorId::new("a");
    input.autopsies.insert(
        a.clone(),
        vec![AutopsyDuty {
            date: d(2025, 7, 8),
            time: ShiftTime::Day,
        }],
    );

    let outcome = schedule_span(&input, &opts_with_budget(30)).unwrap();
    assert!(outcome.report.is_ok());

    // No Evening on the autopsy day, no Night the day before.
    for entry in outcome.schedule.entries(d(2025, 7, 8)) {
        if entry.time == ShiftTime::Evening {
            assert_ne!(entry.doctor, a);
        }
    }
    for entry in outcome.schedule.entries(d(2025, 7, 7)) {
        if entry.time == ShiftTime::Night {
            assert_ne!(entry.doctor, a);
        }
    }
}

#[test]
fn annealing_solver_covers_a_tiny_weekend() {
    let input = tiny_weekend();
    let opts = SolveOptions {
        engine: Engine::Annealing,
        time_budget: Duration::from_secs(10),
        ..SolveOptions::default()
    };

    let first = AnnealingSolver::new(opts).solve(&input).unwrap();
    assert_eq!(first.len(), 6);
    let report = verify_schedule(&input, &first);
    assert!(report.is_ok(), "verification failed:\n{report}");

    // Same seed, same schedule.
    let second = AnnealingSolver::new(opts).solve(&input).unwrap();
    assert_eq!(first, second);
}
