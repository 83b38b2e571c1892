use crate::calendar;
use crate::model::{
    AutopsyDuty, DoctorId, NominalQuota, Policy, SchedulerInput, YearEndQuotas,
};
use crate::quota;
use crate::scheduler::{self, SchedError, ScheduleOutcome, SolveOptions};
use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

/// Configuration d'un tour de planification, telle que saisie par
/// l'opérateur. Un médecin sans bloc de quota (`null`) est listé mais
/// exclu de la planification.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RosterConfig {
    #[serde(default)]
    pub doctors: BTreeMap<String, Option<NominalQuota>>,
    #[serde(default)]
    pub holidays: BTreeSet<NaiveDate>,
    #[serde(default)]
    pub autopsy: BTreeMap<String, Vec<AutopsyDuty>>,
    #[serde(default)]
    pub year_end: Option<YearEndQuotas>,
    #[serde(default)]
    pub policy: Policy,
}

impl RosterConfig {
    pub fn validate(&self) -> Result<()> {
        if self.doctors.is_empty() {
            bail!("config must list at least one doctor");
        }
        for name in self.autopsy.keys() {
            if !self.doctors.contains_key(name) {
                bail!("autopsy entry references unknown doctor {name}");
            }
        }
        if let Some(year_end) = &self.year_end {
            for doctor in year_end.eve.keys().chain(year_end.new_year.keys()) {
                if !self.doctors.contains_key(doctor.as_str()) {
                    bail!("year-end quota references unknown doctor {doctor}");
                }
            }
        }
        Ok(())
    }

    /// Quotas nominaux des seuls médecins planifiables.
    pub fn nominal_quotas(&self) -> BTreeMap<DoctorId, NominalQuota> {
        self.doctors
            .iter()
            .filter_map(|(name, quota)| quota.map(|q| (DoctorId::new(name), q)))
            .collect()
    }

    /// Entrée de planification pour un mois calendaire.
    pub fn month_input(&self, year: i32, month: u32) -> Result<SchedulerInput, SchedError> {
        let days = calendar::month_days(year, month)
            .ok_or_else(|| SchedError::InvalidInput(format!("invalid month: {year}-{month}")))?;
        self.input_for_days(days)
    }

    /// Entrée de planification pour une suite de jours explicite.
    pub fn input_for_days(&self, days: Vec<NaiveDate>) -> Result<SchedulerInput, SchedError> {
        if days.is_empty() {
            return Err(SchedError::InvalidInput("empty day span".to_string()));
        }
        self.validate()
            .map_err(|e| SchedError::InvalidInput(e.to_string()))?;

        let quotas = quota::adjust(&self.nominal_quotas());
        let doctors: Vec<DoctorId> = quotas.keys().cloned().collect();
        let autopsies = self
            .autopsy
            .iter()
            .map(|(name, duties)| (DoctorId::new(name), duties.clone()))
            .collect();

        Ok(SchedulerInput {
            days,
            holidays: self.holidays.clone(),
            doctors,
            quotas,
            autopsies,
            year_end: self.year_end.clone().filter(|q| !q.is_empty()),
            policy: self.policy,
        })
    }
}

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<RosterConfig> {
    let path = path.as_ref();
    let data = fs::read(path).with_context(|| format!("reading config {}", path.display()))?;
    let config: RosterConfig = serde_json::from_slice(&data)
        .with_context(|| format!("parsing config {}", path.display()))?;
    config.validate()?;
    Ok(config)
}

/// Planifie un mois complet depuis une configuration : précontrôle,
/// résolution, vérification.
pub fn schedule_month(
    config: &RosterConfig,
    year: i32,
    month: u32,
    opts: &SolveOptions,
) -> Result<ScheduleOutcome, SchedError> {
    let input = config.month_input(year, month)?;
    scheduler::schedule_span(&input, opts)
}
