mod anneal;
pub mod constraints;
mod search;
mod types;

pub use anneal::AnnealingSolver;
pub use constraints::{soft_penalty, violates};
pub use search::ExactSolver;
pub use types::{Engine, InfeasibleReason, SchedError, SolveOptions, YearEndWindow};

use crate::model::{Schedule, SchedulerInput};
use crate::verify::{self, VerifyReport};
use crate::slots;
use tracing::info;

/// Contrat externe séquentiel d'un moteur : une entrée immuable, un
/// planning complet ou une erreur.
pub trait Solver {
    fn solve(&self, input: &SchedulerInput) -> Result<Schedule, SchedError>;
}

pub fn solver_for(opts: SolveOptions) -> Box<dyn Solver> {
    match opts.engine {
        Engine::Exact => Box::new(ExactSolver::new(opts)),
        Engine::Annealing => Box::new(AnnealingSolver::new(opts)),
    }
}

/// Résultat d'une exécution de planification vérifiée.
#[derive(Debug, Clone)]
pub struct ScheduleOutcome {
    pub schedule: Schedule,
    pub report: VerifyReport,
    /// Pénalité douce résiduelle (même bande deux jours de suite).
    pub penalty: u32,
}

/// Pipeline complet : précontrôle, résolution, vérification. Un
/// planning produit qui échoue à la vérification est une erreur de
/// programmation et interrompt l'exécution.
pub fn schedule_span(
    input: &SchedulerInput,
    opts: &SolveOptions,
) -> Result<ScheduleOutcome, SchedError> {
    slots::precheck(input)?;

    let schedule = solver_for(*opts).solve(input)?;
    let report = verify::verify_schedule(input, &schedule);
    if !report.is_ok() {
        return Err(SchedError::VerifierFailed(report.to_string()));
    }
    let penalty = soft_penalty(input, &schedule);
    info!(
        slots = schedule.len(),
        penalty, "schedule produced and verified"
    );
    Ok(ScheduleOutcome {
        schedule,
        report,
        penalty,
    })
}
