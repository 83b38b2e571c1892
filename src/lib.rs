#![forbid(unsafe_code)]
//! Medroster — planning mensuel de gardes ER/ward pour une petite
//! équipe de médecins.
//!
//! - Quotas exacts par (période, poste), développés depuis le nominal.
//! - Règles dures : un poste par bande, chaîne de présence ≤ 2,
//!   obligations d'autopsie, fenêtres du Nouvel An.
//! - Deux moteurs : recherche exacte (défaut) et recuit simulé.
//! - Coquille fichiers (JSON/CSV) derrière la feature `serde`.

pub mod calendar;
#[cfg(feature = "serde")]
pub mod config;
#[cfg(feature = "serde")]
pub mod export;
pub mod model;
pub mod quota;
pub mod scheduler;
pub mod slots;
#[cfg(feature = "serde")]
pub mod storage;
pub mod verify;

pub use model::{
    Assignment, AutopsyDuty, DoctorId, EffectiveQuota, NominalQuota, PeriodKind, Policy, Post,
    PostCounts, Schedule, SchedulerInput, ShiftTime, Slot, YearEndMode, YearEndQuotas,
};
pub use scheduler::{
    schedule_span, soft_penalty, violates, AnnealingSolver, Engine, ExactSolver, InfeasibleReason,
    SchedError, ScheduleOutcome, SolveOptions, Solver, YearEndWindow,
};
pub use verify::{verify_schedule, VerifyReport};

#[cfg(feature = "serde")]
pub use config::{load_config, schedule_month, RosterConfig};
#[cfg(feature = "serde")]
pub use export::{export_blank_csv, export_schedule_csv};
#[cfg(feature = "serde")]
pub use storage::{JsonStorage, Storage};
