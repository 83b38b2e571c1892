use crate::model::{PeriodKind, Post};
use std::time::Duration;
use thiserror::Error;

/// Moteur de résolution à employer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Engine {
    /// Recherche exacte par retour arrière ; gère les quotas de fin
    /// d'année.
    #[default]
    Exact,
    /// Construction gloutonne aléatoire + recuit simulé ; refuse les
    /// quotas de fin d'année.
    Annealing,
}

/// Options de résolution.
#[derive(Debug, Clone, Copy)]
pub struct SolveOptions {
    pub engine: Engine,
    /// Budget mural total ; à expiration le solveur rend le meilleur
    /// résultat complet trouvé, sinon `Unsatisfiable`.
    pub time_budget: Duration,
    /// Graine du moteur stochastique ; deux exécutions à entrées et
    /// graine identiques produisent le même planning.
    pub seed: u64,
    /// Nombre de redémarrages parallèles du moteur stochastique.
    pub restarts: usize,
    /// Plafond de nœuds explorés par le moteur exact.
    pub max_nodes: u64,
    /// Plafond d'itérations de recuit par redémarrage.
    pub max_iterations: u32,
    pub initial_temperature: f64,
    pub cooling_rate: f64,
}

impl Default for SolveOptions {
    fn default() -> Self {
        Self {
            engine: Engine::Exact,
            time_budget: Duration::from_secs(300),
            seed: 42,
            restarts: 8,
            max_nodes: 5_000_000,
            max_iterations: 100_000,
            initial_temperature: 10.0,
            cooling_rate: 0.995,
        }
    }
}

/// Fenêtre de fin d'année concernée par un écart de faisabilité.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum YearEndWindow {
    Eve,
    NewYear,
}

impl YearEndWindow {
    pub fn label(self) -> &'static str {
        match self {
            YearEndWindow::Eve => "new-year-eve",
            YearEndWindow::NewYear => "new-year",
        }
    }
}

/// Détail d'un écart détecté par le précontrôle de faisabilité.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InfeasibleReason {
    /// Le compartiment (période, poste) n'offre pas autant de créneaux
    /// que la somme des quotas effectifs.
    Bucket {
        period: PeriodKind,
        post: Post,
        slots: u32,
        quota: u32,
    },
    /// La fenêtre de fin d'année ne s'équilibre pas avec ses quotas.
    YearEnd {
        window: YearEndWindow,
        slots: u32,
        quota: u32,
    },
}

impl std::fmt::Display for InfeasibleReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InfeasibleReason::Bucket {
                period,
                post,
                slots,
                quota,
            } => write!(
                f,
                "{} {}: {} slots vs quota total {}",
                period.label(),
                post.label(),
                slots,
                quota
            ),
            InfeasibleReason::YearEnd {
                window,
                slots,
                quota,
            } => write!(
                f,
                "{} window: {} slots vs quota total {}",
                window.label(),
                slots,
                quota
            ),
        }
    }
}

#[derive(Error, Debug)]
pub enum SchedError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("infeasible: {0}")]
    Infeasible(InfeasibleReason),
    #[error("no feasible assignment within the search budget")]
    Unsatisfiable,
    #[error("produced schedule failed verification: {0}")]
    VerifierFailed(String),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
