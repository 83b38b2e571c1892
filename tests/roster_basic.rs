#![forbid(unsafe_code)]
use chrono::NaiveDate;
use medroster::{
    calendar, quota, slots, violates, Assignment, AutopsyDuty, DoctorId, EffectiveQuota,
    InfeasibleReason, NominalQuota, PeriodKind, Post, PostCounts, SchedError, Schedule,
    SchedulerInput, ShiftTime,
};
use std::collections::{BTreeMap, BTreeSet};

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn weekend_quota(er: u32, ward: u32) -> EffectiveQuota {
    EffectiveQuota {
        weekday: PostCounts::default(),
        weekend: PostCounts { er, ward },
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

#[test]
fn weekend_classification_includes_holidays() {
    let holidays: BTreeSet<NaiveDate> = [d(2025, 7, 10)].into();

    // 2025-07-12 is a Saturday, 2025-07-09 a Wednesday.
    assert_eq!(
        calendar::period(d(2025, 7, 12), &holidays),
        PeriodKind::Weekend
    );
    assert_eq!(
        calendar::period(d(2025, 7, 13), &holidays),
        PeriodKind::Weekend
    );
    assert_eq!(
        calendar::period(d(2025, 7, 9), &holidays),
        PeriodKind::Weekday
    );
    // Thursday, but configured as a holiday.
    assert_eq!(
        calendar::period(d(2025, 7, 10), &holidays),
        PeriodKind::Weekend
    );
}

#[test]
fn month_days_covers_the_whole_month() {
    let days = calendar::month_days(2027, 2).unwrap();
    assert_eq!(days.len(), 28);
    assert_eq!(days[0], d(2027, 2, 1));
    assert_eq!(days[27], d(2027, 2, 28));
    assert!(calendar::month_days(2027, 13).is_none());
}

#[test]
fn quota_adjuster_applies_fixed_multipliers() {
    let mut nominal = BTreeMap::new();
    nominal.insert(
        DoctorId::new("a"),
        NominalQuota {
            weekday: PostCounts { er: 5, ward: 4 },
            weekend: PostCounts { er: 3, ward: 2 },
        },
    );

    let adjusted = quota::adjust(&nominal);
    let q = adjusted.get(&DoctorId::new("a")).unwrap();
    assert_eq!(q.weekday.er, 10);
    assert_eq!(q.weekday.ward, 4);
    assert_eq!(q.weekend.er, 9);
    assert_eq!(q.weekend.ward, 6);

    // Pure: same input, same output; empty input, empty output.
    assert_eq!(quota::adjust(&nominal), adjusted);
    assert!(quota::adjust(&BTreeMap::new()).is_empty());
}

#[test]
fn slot_enumeration_follows_canonical_order() {
    // 2025-07-09 is a Wednesday, 2025-07-12 a Saturday.
    let input = input_for(vec![d(2025, 7, 9), d(2025, 7, 12)], vec![]);
    let all = slots::enumerate(&input);
    assert_eq!(all.len(), 3 + 6);

    let weekday: Vec<(Post, ShiftTime)> = all[..3].iter().map(|s| (s.post, s.time)).collect();
    assert_eq!(
        weekday,
        vec![
            (Post::Er, ShiftTime::Evening),
            (Post::Er, ShiftTime::Night),
            (Post::Ward, ShiftTime::Evening),
        ]
    );
    let weekend: Vec<(Post, ShiftTime)> = all[3..].iter().map(|s| (s.post, s.time)).collect();
    assert_eq!(
        weekend,
        vec![
            (Post::Er, ShiftTime::Day),
            (Post::Er, ShiftTime::Evening),
            (Post::Er, ShiftTime::Night),
            (Post::Ward, ShiftTime::Day),
            (Post::Ward, ShiftTime::Evening),
            (Post::Ward, ShiftTime::Night),
        ]
    );
}

#[test]
fn precheck_rejects_quota_slot_mismatch() {
    // One weekday offers 2 ER + 1 ward slots; nobody carries a quota.
    let input = input_for(vec![d(2025, 7, 9)], vec![]);
    match slots::precheck(&input) {
        Err(SchedError::Infeasible(InfeasibleReason::Bucket {
            period,
            post,
            slots,
            quota,
        })) => {
            assert_eq!(period, PeriodKind::Weekday);
            assert_eq!(post, Post::Er);
            assert_eq!(slots, 2);
            assert_eq!(quota, 0);
        }
        other => panic!("expected bucket infeasibility, got {other:?}"),
    }
}

#[test]
fn checker_rejects_second_post_on_same_band() {
    let sat = d(2025, 7, 12);
    let input = input_for(vec![sat], vec![("a", weekend_quota(3, 3))]);
    let a = DoctorId::new("a");

    let mut schedule = Schedule::new();
    schedule.push(
        sat,
        Assignment {
            post: Post::Er,
            time: ShiftTime::Evening,
            doctor: a.clone(),
        },
    );

    assert!(violates(
        &input,
        &schedule,
        &a,
        sat,
        Post::Ward,
        ShiftTime::Evening
    ));
    // Re-checking the very record that is already placed is fine.
    assert!(!violates(
        &input,
        &schedule,
        &a,
        sat,
        Post::Er,
        ShiftTime::Evening
    ));
    // Another band on the same weekend date stays available.
    assert!(!violates(
        &input,
        &schedule,
        &a,
        sat,
        Post::Ward,
        ShiftTime::Night
    ));
}

#[test]
fn chain_rule_counts_the_implicit_weekday_day() {
    // 2025-07-08 Tue, 07-09 Wed, both weekdays.
    let tue = d(2025, 7, 8);
    let wed = d(2025, 7, 9);
    let input = input_for(vec![tue, wed], vec![]);
    let a = DoctorId::new("a");

    // Evening + Night on one weekday would chain Day + Evening + Night.
    let mut schedule = Schedule::new();
    schedule.push(
        wed,
        Assignment {
            post: Post::Er,
            time: ShiftTime::Evening,
            doctor: a.clone(),
        },
    );
    assert!(violates(
        &input,
        &schedule,
        &a,
        wed,
        Post::Er,
        ShiftTime::Night
    ));

    // Night on Tue, then Evening on Wed: Night + implicit Day + Evening.
    let mut schedule = Schedule::new();
    schedule.push(
        tue,
        Assignment {
            post: Post::Er,
            time: ShiftTime::Night,
            doctor: a.clone(),
        },
    );
    assert!(violates(
        &input,
        &schedule,
        &a,
        wed,
        Post::Ward,
        ShiftTime::Evening
    ));
}

#[test]
fn chain_rule_allows_two_bands_on_a_weekend() {
    let sat = d(2025, 7, 12);
    let input = input_for(vec![sat], vec![]);
    let a = DoctorId::new("a");

    let mut schedule = Schedule::new();
    schedule.push(
        sat,
        Assignment {
            post: Post::Er,
            time: ShiftTime::Day,
            doctor: a.clone(),
        },
    );
    // Day + Evening is a chain of two: allowed.
    assert!(!violates(
        &input,
        &schedule,
        &a,
        sat,
        Post::Er,
        ShiftTime::Evening
    ));

    schedule.push(
        sat,
        Assignment {
            post: Post::Er,
            time: ShiftTime::Evening,
            doctor: a.clone(),
        },
    );
    // Day + Evening + Night would be three.
    assert!(violates(
        &input,
        &schedule,
        &a,
        sat,
        Post::Er,
        ShiftTime::Night
    ));
}

#[test]
fn sandwiched_weekend_day_is_configurable() {
    // 2025-07-10 is a Thursday holiday between two weekdays.
    let wed = d(2025, 7, 9);
    let thu = d(2025, 7, 10);
    let fri = d(2025, 7, 11);
    let mut input = input_for(vec![wed, thu, fri], vec![]);
    input.holidays.insert(thu);
    let a = DoctorId::new("a");

    let mut schedule = Schedule::new();
    schedule.push(
        wed,
        Assignment {
            post: Post::Er,
            time: ShiftTime::Night,
            doctor: a.clone(),
        },
    );

    // Default reading: the holiday carries no implicit Day band, so
    // Wednesday's night and Thursday's evening do not chain.
    assert!(!violates(
        &input,
        &schedule,
        &a,
        thu,
        Post::Er,
        ShiftTime::Evening
    ));

    // Sandwiched reading: Night + inherited Day + Evening chains three.
    input.policy.sandwiched_implicit_day = true;
    assert!(violates(
        &input,
        &schedule,
        &a,
        thu,
        Post::Er,
        ShiftTime::Evening
    ));
}

#[test]
fn autopsy_on_day_blocks_evening_and_previous_night() {
    // Scenario: autopsy on Thursday's Day band.
    let wed = d(2025, 7, 9);
    let thu = d(2025, 7, 10);
    let mut input = input_for(vec![wed, thu], vec![]);
    let a = DoctorId::new("a");
    input.autopsies.insert(
        a.clone(),
        vec![AutopsyDuty {
            date: thu,
            time: ShiftTime::Day,
        }],
    );

    let schedule = Schedule::new();
    assert!(violates(&input, &schedule, &a, thu, Post::Er, ShiftTime::Evening));
    assert!(violates(&input, &schedule, &a, wed, Post::Er, ShiftTime::Night));
    // The night after the autopsy day stays available.
    assert!(!violates(&input, &schedule, &a, thu, Post::Er, ShiftTime::Night));
    // Other doctors are unaffected.
    let b = DoctorId::new("b");
    assert!(!violates(&input, &schedule, &b, thu, Post::Er, ShiftTime::Evening));
}

#[test]
fn autopsy_on_evening_blocks_the_whole_day_and_next_night() {
    let thu = d(2025, 7, 10);
    let fri = d(2025, 7, 11);
    let mut input = input_for(vec![thu, fri], vec![]);
    let a = DoctorId::new("a");
    input.autopsies.insert(
        a.clone(),
        vec![AutopsyDuty {
            date: thu,
            time: ShiftTime::Evening,
        }],
    );

    let schedule = Schedule::new();
    for time in ShiftTime::ALL {
        assert!(violates(&input, &schedule, &a, thu, Post::Er, time));
    }
    assert!(violates(&input, &schedule, &a, fri, Post::Er, ShiftTime::Night));
    assert!(!violates(&input, &schedule, &a, fri, Post::Er, ShiftTime::Evening));
}

#[test]
fn autopsy_on_night_blocks_next_day_morning() {
    let thu = d(2025, 7, 10);
    let fri = d(2025, 7, 11);
    let mut input = input_for(vec![thu, fri], vec![]);
    let a = DoctorId::new("a");
    input.autopsies.insert(
        a.clone(),
        vec![AutopsyDuty {
            date: thu,
            time: ShiftTime::Night,
        }],
    );

    let schedule = Schedule::new();
    assert!(violates(&input, &schedule, &a, thu, Post::Er, ShiftTime::Day));
    assert!(violates(&input, &schedule, &a, thu, Post::Er, ShiftTime::Evening));
    assert!(violates(&input, &schedule, &a, fri, Post::Er, ShiftTime::Day));
    assert!(!violates(&input, &schedule, &a, fri, Post::Er, ShiftTime::Evening));
}

#[test]
fn offspan_autopsy_blocking_is_configurable() {
    // Span starts on Friday; the autopsy sits on Thursday's Night band
    // and reaches into Friday's Day band.
    let thu = d(2025, 7, 10);
    let fri = d(2025, 7, 11);
    let mut input = input_for(vec![fri], vec![]);
    let a = DoctorId::new("a");
    input.autopsies.insert(
        a.clone(),
        vec![AutopsyDuty {
            date: thu,
            time: ShiftTime::Night,
        }],
    );

    let schedule = Schedule::new();
    assert!(violates(&input, &schedule, &a, fri, Post::Er, ShiftTime::Day));

    input.policy.offspan_autopsy_blocks = false;
    assert!(!violates(&input, &schedule, &a, fri, Post::Er, ShiftTime::Day));
}
