use super::constraints::{soft_penalty, violates};
use super::{SchedError, Solver, SolveOptions};
use crate::model::{
    Assignment, DoctorId, EffectiveQuota, PeriodKind, Post, Schedule, SchedulerInput, ShiftTime,
    YearEndMode,
};
use crate::slots::{self, in_eve_window, in_new_year_window};
use chrono::NaiveDate;
use std::cmp::Reverse;
use std::time::Instant;
use tracing::{debug, info};

/// Moteur exact : parcours en profondeur des créneaux en ordre
/// chronologique, avec élagage sur l'offre restante des fenêtres de
/// fin d'année, puis passe d'amélioration de la pénalité douce.
#[derive(Debug, Clone, Default)]
pub struct ExactSolver {
    opts: SolveOptions,
}

impl ExactSolver {
    pub fn new(opts: SolveOptions) -> Self {
        Self { opts }
    }
}

impl Solver for ExactSolver {
    fn solve(&self, input: &SchedulerInput) -> Result<Schedule, SchedError> {
        slots::precheck(input)?;

        let started = Instant::now();
        let mut search = Search::new(input, &self.opts, started);
        match search.dfs(0) {
            Outcome::Found => {
                info!(
                    nodes = search.nodes,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    penalty = soft_penalty(input, &search.schedule),
                    "complete assignment found"
                );
                search.improve();
                Ok(search.schedule)
            }
            Outcome::Exhausted => {
                debug!(nodes = search.nodes, "search space exhausted");
                Err(SchedError::Unsatisfiable)
            }
            Outcome::Budget => {
                debug!(nodes = search.nodes, "search budget expired");
                Err(SchedError::Unsatisfiable)
            }
        }
    }
}

enum Outcome {
    Found,
    Exhausted,
    Budget,
}

struct SlotInfo {
    date: NaiveDate,
    post: Post,
    time: ShiftTime,
    period: PeriodKind,
    /// Rang du créneau parmi ceux de sa date (ordre canonique).
    offset_in_date: usize,
    eve: bool,
    new_year: bool,
}

struct Search<'a> {
    input: &'a SchedulerInput,
    slots: Vec<SlotInfo>,
    /// Créneaux de fenêtre restants à partir de l'indice i inclus.
    eve_supply: Vec<u32>,
    ny_supply: Vec<u32>,
    remaining: Vec<EffectiveQuota>,
    /// Quota de fenêtre restant par médecin ; `None` = non contraint.
    eve_left: Vec<Option<u32>>,
    ny_left: Vec<Option<u32>>,
    eve_need: u32,
    ny_need: u32,
    exclusive: bool,
    schedule: Schedule,
    nodes: u64,
    deadline: Instant,
    max_nodes: u64,
}

impl<'a> Search<'a> {
    fn new(input: &'a SchedulerInput, opts: &SolveOptions, started: Instant) -> Self {
        let mut slot_infos = Vec::new();
        for &date in &input.days {
            let period = input.period_of(date);
            for (offset, &(post, time)) in slots::day_slots(period).iter().enumerate() {
                slot_infos.push(SlotInfo {
                    date,
                    post,
                    time,
                    period,
                    offset_in_date: offset,
                    eve: in_eve_window(date, time),
                    new_year: in_new_year_window(date),
                });
            }
        }

        let n = slot_infos.len();
        let mut eve_supply = vec![0u32; n + 1];
        let mut ny_supply = vec![0u32; n + 1];
        for i in (0..n).rev() {
            eve_supply[i] = eve_supply[i + 1] + u32::from(slot_infos[i].eve);
            ny_supply[i] = ny_supply[i + 1] + u32::from(slot_infos[i].new_year);
        }

        let remaining: Vec<EffectiveQuota> = input
            .doctors
            .iter()
            .map(|d| input.quotas.get(d).copied().unwrap_or_default())
            .collect();
        // Une fenêtre sans créneau dans la période planifiée ne
        // contraint rien : ses quotas sont ignorés.
        let has_eve = eve_supply[0] > 0;
        let has_ny = ny_supply[0] > 0;
        let (eve_left, ny_left): (Vec<_>, Vec<_>) = input
            .doctors
            .iter()
            .map(|d| match &input.year_end {
                Some(q) => (
                    q.eve.get(d).copied().filter(|_| has_eve),
                    q.new_year.get(d).copied().filter(|_| has_ny),
                ),
                None => (None, None),
            })
            .unzip();
        let eve_need = eve_left.iter().flatten().sum();
        let ny_need = ny_left.iter().flatten().sum();
        let exclusive = input.year_end.is_some()
            && input.policy.year_end_mode == YearEndMode::Exclusive;

        Self {
            input,
            slots: slot_infos,
            eve_supply,
            ny_supply,
            remaining,
            eve_left,
            ny_left,
            eve_need,
            ny_need,
            exclusive,
            schedule: Schedule::new(),
            nodes: 0,
            deadline: started + opts.time_budget,
            max_nodes: opts.max_nodes,
        }
    }

    fn doctor(&self, idx: usize) -> &DoctorId {
        &self.input.doctors[idx]
    }

    /// Le créneau relève-t-il de la comptabilité de fenêtre seule ?
    fn window_only(&self, slot: &SlotInfo) -> bool {
        self.exclusive && (slot.eve || slot.new_year)
    }

    fn eligible(&self, slot: &SlotInfo, idx: usize) -> bool {
        if self.window_only(slot) {
            // En mode exclusif, seuls les quotas de fenêtre consomment
            // la fenêtre.
            let left = if slot.eve {
                self.eve_left[idx]
            } else {
                self.ny_left[idx]
            };
            if left.map_or(true, |v| v == 0) {
                return false;
            }
        } else {
            if self.remaining[idx].get(slot.period, slot.post) == 0 {
                return false;
            }
            if slot.eve && self.eve_left[idx] == Some(0) {
                return false;
            }
            if slot.new_year && self.ny_left[idx] == Some(0) {
                return false;
            }
        }
        !violates(
            self.input,
            &self.schedule,
            self.doctor(idx),
            slot.date,
            slot.post,
            slot.time,
        )
    }

    /// Candidats triés : sur un créneau de fenêtre, d'abord les
    /// médecins dont la demande de fenêtre n'est pas servie ; puis
    /// ceux qui n'enchaînent pas la même bande qu'hier, le quota
    /// restant le plus large, et l'ordre stable des médecins.
    fn candidates(&self, i: usize) -> Vec<usize> {
        let slot = &self.slots[i];
        let mut out: Vec<usize> = (0..self.input.doctors.len())
            .filter(|&idx| self.eligible(slot, idx))
            .collect();
        out.sort_by_key(|&idx| {
            let window_demand = if slot.eve {
                self.eve_left[idx].unwrap_or(0)
            } else if slot.new_year {
                self.ny_left[idx].unwrap_or(0)
            } else {
                0
            };
            let repeat = slot
                .date
                .pred_opt()
                .is_some_and(|prev| self.schedule.has_band(self.doctor(idx), prev, slot.time));
            let headroom = if self.window_only(slot) {
                window_demand
            } else {
                self.remaining[idx].get(slot.period, slot.post)
            };
            (Reverse(window_demand.min(1)), repeat, Reverse(headroom), idx)
        });
        out
    }

    fn place(&mut self, i: usize, idx: usize) {
        let slot = &self.slots[i];
        if !self.window_only(slot) {
            *self.remaining[idx].get_mut(slot.period, slot.post) -= 1;
        }
        if slot.eve {
            if let Some(left) = &mut self.eve_left[idx] {
                *left -= 1;
                self.eve_need -= 1;
            }
        }
        if slot.new_year {
            if let Some(left) = &mut self.ny_left[idx] {
                *left -= 1;
                self.ny_need -= 1;
            }
        }
        self.schedule.push(
            slot.date,
            Assignment {
                post: slot.post,
                time: slot.time,
                doctor: self.doctor(idx).clone(),
            },
        );
    }

    fn unplace(&mut self, i: usize, idx: usize) {
        let slot = &self.slots[i];
        self.schedule.pop(slot.date);
        if !self.window_only(slot) {
            *self.remaining[idx].get_mut(slot.period, slot.post) += 1;
        }
        if slot.eve {
            if let Some(left) = &mut self.eve_left[idx] {
                *left += 1;
                self.eve_need += 1;
            }
        }
        if slot.new_year {
            if let Some(left) = &mut self.ny_left[idx] {
                *left += 1;
                self.ny_need += 1;
            }
        }
    }

    /// La demande de fenêtre restante ne doit jamais excéder l'offre
    /// de créneaux de fenêtre encore à venir.
    fn window_supply_ok(&self, next: usize) -> bool {
        self.eve_need <= self.eve_supply[next] && self.ny_need <= self.ny_supply[next]
    }

    fn over_budget(&mut self) -> bool {
        self.nodes += 1;
        if self.nodes > self.max_nodes {
            return true;
        }
        self.nodes % 1024 == 0 && Instant::now() >= self.deadline
    }

    fn dfs(&mut self, i: usize) -> Outcome {
        if i == self.slots.len() {
            return Outcome::Found;
        }
        if self.over_budget() {
            return Outcome::Budget;
        }
        for idx in self.candidates(i) {
            self.place(i, idx);
            if self.window_supply_ok(i + 1) {
                match self.dfs(i + 1) {
                    Outcome::Found => return Outcome::Found,
                    Outcome::Budget => {
                        self.unplace(i, idx);
                        return Outcome::Budget;
                    }
                    Outcome::Exhausted => {}
                }
            }
            self.unplace(i, idx);
        }
        Outcome::Exhausted
    }

    /// Échanges par paires de créneaux du même compartiment tant que
    /// la pénalité douce baisse, dans la limite du budget mural.
    fn improve(&mut self) {
        const MAX_SWEEPS: usize = 3;

        let before = soft_penalty(self.input, &self.schedule);
        let mut best = before;
        for _ in 0..MAX_SWEEPS {
            let mut improved = false;
            for i in 0..self.slots.len() {
                if Instant::now() >= self.deadline {
                    break;
                }
                for j in (i + 1)..self.slots.len() {
                    if self.try_swap(i, j, &mut best) {
                        improved = true;
                    }
                }
            }
            if !improved || Instant::now() >= self.deadline {
                break;
            }
        }
        if best < before {
            info!(before, after = best, "soft penalty reduced by swap pass");
        }
    }

    fn swappable(&self, i: usize, j: usize) -> bool {
        let (a, b) = (&self.slots[i], &self.slots[j]);
        if a.period != b.period || a.post != b.post {
            return false;
        }
        // Un échange ne doit pas déplacer d'occupation de fenêtre
        // lorsque l'un des deux médecins y est contraint.
        let da = self.assigned_idx(i);
        let db = self.assigned_idx(j);
        let constrained = |idx: usize| self.eve_left[idx].is_some() || self.ny_left[idx].is_some();
        if (a.eve != b.eve || a.new_year != b.new_year)
            && (da.map_or(false, constrained) || db.map_or(false, constrained))
        {
            return false;
        }
        true
    }

    fn assigned_idx(&self, i: usize) -> Option<usize> {
        let slot = &self.slots[i];
        let doctor = self
            .schedule
            .doctor_for(slot.date, slot.post, slot.time)?;
        self.input.doctors.iter().position(|d| d == doctor)
    }

    fn try_swap(&mut self, i: usize, j: usize, best: &mut u32) -> bool {
        if !self.swappable(i, j) {
            return false;
        }
        let (Some(da), Some(db)) = (self.assigned_idx(i), self.assigned_idx(j)) else {
            return false;
        };
        if da == db {
            return false;
        }

        self.apply_swap(i, db, j, da);
        let a = &self.slots[i];
        let b = &self.slots[j];
        let legal = !violates(
            self.input,
            &self.schedule,
            self.doctor(db),
            a.date,
            a.post,
            a.time,
        ) && !violates(
            self.input,
            &self.schedule,
            self.doctor(da),
            b.date,
            b.post,
            b.time,
        );
        let penalty = soft_penalty(self.input, &self.schedule);
        if legal && penalty < *best {
            *best = penalty;
            true
        } else {
            self.apply_swap(i, da, j, db);
            false
        }
    }

    fn apply_swap(&mut self, i: usize, doctor_i: usize, j: usize, doctor_j: usize) {
        let (date_i, off_i) = (self.slots[i].date, self.slots[i].offset_in_date);
        let (date_j, off_j) = (self.slots[j].date, self.slots[j].offset_in_date);
        let di = self.doctor(doctor_i).clone();
        let dj = self.doctor(doctor_j).clone();
        self.schedule.set_doctor(date_i, off_i, di);
        self.schedule.set_doctor(date_j, off_j, dj);
    }
}
