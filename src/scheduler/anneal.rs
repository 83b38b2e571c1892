use super::constraints::violates;
use super::{SchedError, Solver, SolveOptions};
use crate::model::{
    Assignment, DoctorId, EffectiveQuota, PeriodKind, Post, Schedule, SchedulerInput, ShiftTime,
};
use crate::slots;
use anyhow::anyhow;
use chrono::NaiveDate;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::time::Instant;
use tracing::{debug, info};

/// Moteur stochastique : construction gloutonne aléatoire puis recuit
/// simulé, répétés sur des redémarrages parallèles. Chaque travailleur
/// possède son propre planning d'essai et son propre générateur ; le
/// meilleur résultat est choisi par (coût, rang de redémarrage) pour
/// rester reproductible.
///
/// Ce moteur ne sait pas poser les égalités de fenêtre de fin d'année
/// et refuse les entrées qui en portent.
#[derive(Debug, Clone, Default)]
pub struct AnnealingSolver {
    opts: SolveOptions,
}

impl AnnealingSolver {
    pub fn new(opts: SolveOptions) -> Self {
        Self { opts }
    }
}

impl Solver for AnnealingSolver {
    fn solve(&self, input: &SchedulerInput) -> Result<Schedule, SchedError> {
        if input.year_end.as_ref().is_some_and(|q| !q.is_empty()) {
            return Err(SchedError::InvalidInput(
                "new-year quotas require the exact engine".to_string(),
            ));
        }
        slots::precheck(input)?;

        let opts = self.opts;
        let deadline = Instant::now() + opts.time_budget;
        let restarts = opts.restarts.max(1);

        let results: Vec<(u32, Schedule)> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..restarts)
                .map(|k| {
                    scope.spawn(move || {
                        let mut trial =
                            Trial::new(input, &opts, opts.seed.wrapping_add(k as u64), deadline);
                        trial.run()
                    })
                })
                .collect();
            handles
                .into_iter()
                .map(|h| h.join().map_err(|_| anyhow!("annealing worker panicked")))
                .collect::<Result<_, _>>()
        })?;

        // Départage stable : le coût, puis le rang du redémarrage.
        let (best_cost, best) = results
            .into_iter()
            .enumerate()
            .map(|(k, (cost, schedule))| ((cost, k), schedule))
            .min_by_key(|(key, _)| *key)
            .map(|((cost, _), schedule)| (cost, schedule))
            .ok_or(SchedError::Unsatisfiable)?;

        if best_cost == 0 {
            let mut schedule = best;
            schedule.normalize();
            Ok(schedule)
        } else {
            info!(best_cost, "no violation-free assignment reached");
            Err(SchedError::Unsatisfiable)
        }
    }
}

struct SlotInfo {
    date: NaiveDate,
    post: Post,
    time: ShiftTime,
    period: PeriodKind,
}

struct Trial<'a> {
    input: &'a SchedulerInput,
    opts: &'a SolveOptions,
    rng: StdRng,
    deadline: Instant,
    slots: Vec<SlotInfo>,
    /// Indices de créneaux par compartiment (période, poste).
    buckets: Vec<Vec<usize>>,
    assign: Vec<Option<usize>>,
    remaining: Vec<EffectiveQuota>,
    schedule: Schedule,
    open: Vec<usize>,
    violations: i64,
}

fn bucket_key(period: PeriodKind, post: Post) -> usize {
    let p = matches!(period, PeriodKind::Weekend) as usize;
    let q = matches!(post, Post::Ward) as usize;
    p * 2 + q
}

impl<'a> Trial<'a> {
    fn new(
        input: &'a SchedulerInput,
        opts: &'a SolveOptions,
        seed: u64,
        deadline: Instant,
    ) -> Self {
        let mut slot_infos = Vec::new();
        for &date in &input.days {
            let period = input.period_of(date);
            for &(post, time) in slots::day_slots(period) {
                slot_infos.push(SlotInfo {
                    date,
                    post,
                    time,
                    period,
                });
            }
        }
        let mut buckets = vec![Vec::new(); 4];
        for (i, s) in slot_infos.iter().enumerate() {
            buckets[bucket_key(s.period, s.post)].push(i);
        }
        let n = slot_infos.len();
        Self {
            input,
            opts,
            rng: StdRng::seed_from_u64(seed),
            deadline,
            slots: slot_infos,
            buckets,
            assign: vec![None; n],
            remaining: Vec::new(),
            schedule: Schedule::new(),
            open: Vec::new(),
            violations: 0,
        }
    }

    fn doctor(&self, idx: usize) -> &DoctorId {
        &self.input.doctors[idx]
    }

    /// Boucle de redémarrage du travailleur : glouton, puis recuit,
    /// jusqu'au succès ou à l'expiration du budget.
    fn run(&mut self) -> (u32, Schedule) {
        let mut best_cost = u32::MAX;
        let mut best = Schedule::new();
        loop {
            self.greedy();
            if self.cost() > 0 {
                self.anneal();
            }
            let cost = self.cost();
            if cost < best_cost {
                best_cost = cost;
                best = self.schedule.clone();
            }
            if best_cost == 0 || Instant::now() >= self.deadline {
                return (best_cost, best);
            }
        }
    }

    fn cost(&self) -> u32 {
        self.open.len() as u32 + self.violations.max(0) as u32
    }

    /// Construction gloutonne : pour chaque créneau, ordre aléatoire
    /// des médecins, premier candidat à quota restant qui ne viole
    /// rien ; sinon le créneau reste ouvert.
    fn greedy(&mut self) {
        self.assign = vec![None; self.slots.len()];
        self.schedule = Schedule::new();
        self.open = Vec::new();
        self.violations = 0;
        self.remaining = self
            .input
            .doctors
            .iter()
            .map(|d| self.input.quotas.get(d).copied().unwrap_or_default())
            .collect();

        let mut order: Vec<usize> = (0..self.input.doctors.len()).collect();
        for i in 0..self.slots.len() {
            order.shuffle(&mut self.rng);
            let slot = &self.slots[i];
            let chosen = order.iter().copied().find(|&idx| {
                self.remaining[idx].get(slot.period, slot.post) > 0
                    && !violates(
                        self.input,
                        &self.schedule,
                        self.doctor(idx),
                        slot.date,
                        slot.post,
                        slot.time,
                    )
            });
            match chosen {
                Some(idx) => self.set(i, idx),
                None => self.open.push(i),
            }
        }
        debug!(open = self.open.len(), "greedy construction done");
    }

    fn set(&mut self, i: usize, idx: usize) {
        let slot = &self.slots[i];
        *self.remaining[idx].get_mut(slot.period, slot.post) -= 1;
        self.assign[i] = Some(idx);
        self.schedule.push(
            slot.date,
            Assignment {
                post: slot.post,
                time: slot.time,
                doctor: self.doctor(idx).clone(),
            },
        );
    }

    fn clear(&mut self, i: usize) -> Option<usize> {
        let idx = self.assign[i].take()?;
        let slot = &self.slots[i];
        *self.remaining[idx].get_mut(slot.period, slot.post) += 1;
        self.schedule.remove(slot.date, slot.post, slot.time);
        Some(idx)
    }

    /// Violations des affectations du médecin à ±1 jour des dates
    /// touchées. Les règles dures sont locales à un médecin et à ses
    /// bandes voisines ; tout le reste est invariant par le mouvement.
    fn local_violations(&self, idx: usize, dates: &[NaiveDate]) -> i64 {
        let doctor = self.doctor(idx);
        let mut count = 0i64;
        for (i, slot) in self.slots.iter().enumerate() {
            if self.assign[i] != Some(idx) {
                continue;
            }
            let near = dates
                .iter()
                .any(|d| (slot.date - *d).num_days().abs() <= 1);
            if near
                && violates(
                    self.input,
                    &self.schedule,
                    doctor,
                    slot.date,
                    slot.post,
                    slot.time,
                )
            {
                count += 1;
            }
        }
        count
    }

    /// Recuit simulé : échange/déplacement dans un même compartiment
    /// ou remplissage d'un créneau ouvert ; coût = créneaux ouverts +
    /// violations ; refroidissement géométrique.
    fn anneal(&mut self) {
        let mut temperature = self.opts.initial_temperature;
        for iteration in 0..self.opts.max_iterations {
            if self.cost() == 0 {
                break;
            }
            if iteration % 256 == 0 && Instant::now() >= self.deadline {
                break;
            }
            let fill = !self.open.is_empty() && self.rng.gen_bool(0.5);
            if fill {
                self.fill_move(temperature);
            } else {
                self.swap_move(temperature);
            }
            temperature *= self.opts.cooling_rate;
        }
    }

    fn accept(&mut self, delta: i64, temperature: f64) -> bool {
        delta <= 0 || self.rng.gen::<f64>() < (-(delta as f64) / temperature).exp()
    }

    /// Affecte un créneau ouvert à un médecin sous-quota tiré au sort.
    fn fill_move(&mut self, temperature: f64) {
        let open_pos = self.rng.gen_range(0..self.open.len());
        let i = self.open[open_pos];
        let slot = &self.slots[i];
        let candidates: Vec<usize> = (0..self.input.doctors.len())
            .filter(|&idx| self.remaining[idx].get(slot.period, slot.post) > 0)
            .collect();
        let Some(&idx) = candidates.as_slice().choose(&mut self.rng) else {
            return;
        };

        let date = self.slots[i].date;
        let before = self.local_violations(idx, &[date]);
        self.set(i, idx);
        let after = self.local_violations(idx, &[date]);

        // -1 pour le créneau ouvert en moins.
        let delta = (after - before) - 1;
        if self.accept(delta, temperature) {
            self.open.swap_remove(open_pos);
            self.violations += after - before;
        } else {
            self.clear(i);
        }
    }

    /// Échange les médecins de deux créneaux d'un même compartiment,
    /// ou déplace une affectation vers un créneau ouvert du même
    /// compartiment.
    fn swap_move(&mut self, temperature: f64) {
        let i = self.rng.gen_range(0..self.slots.len());
        let Some(a) = self.assign[i] else {
            return;
        };
        let slot = &self.slots[i];
        let bucket = &self.buckets[bucket_key(slot.period, slot.post)];
        let j = bucket[self.rng.gen_range(0..bucket.len())];
        if i == j || self.assign[i] == self.assign[j] {
            return;
        }
        let dates = [self.slots[i].date, self.slots[j].date];

        match self.assign[j] {
            Some(b) => {
                let before = self.local_violations(a, &dates) + self.local_violations(b, &dates);
                self.clear(i);
                self.clear(j);
                self.set(i, b);
                self.set(j, a);
                let after = self.local_violations(a, &dates) + self.local_violations(b, &dates);
                let delta = after - before;
                if self.accept(delta, temperature) {
                    self.violations += delta;
                } else {
                    self.clear(i);
                    self.clear(j);
                    self.set(i, a);
                    self.set(j, b);
                }
            }
            None => {
                let before = self.local_violations(a, &dates);
                self.clear(i);
                self.set(j, a);
                let after = self.local_violations(a, &dates);
                let delta = after - before;
                if self.accept(delta, temperature) {
                    self.violations += delta;
                    match self.open.iter().position(|&s| s == j) {
                        Some(pos) => self.open[pos] = i,
                        None => self.open.push(i),
                    }
                } else {
                    self.clear(j);
                    self.set(i, a);
                }
            }
        }
    }
}
