use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Identifiant fort pour un médecin (nom fourni par l'opérateur).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct DoctorId(String);

impl DoctorId {
    pub fn new<S: AsRef<str>>(s: S) -> Self {
        Self(s.as_ref().to_owned())
    }
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for DoctorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Poste couvert pendant un créneau.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Post {
    Er,
    Ward,
}

impl Post {
    pub const ALL: [Post; 2] = [Post::Er, Post::Ward];

    pub fn label(self) -> &'static str {
        match self {
            Post::Er => "ER",
            Post::Ward => "ward",
        }
    }
}

/// Bande horaire de 8 heures. `Night` d'une date suit `Evening` de la
/// même date et se termine au matin de la date suivante.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ShiftTime {
    Day,
    Evening,
    Night,
}

impl ShiftTime {
    pub const ALL: [ShiftTime; 3] = [ShiftTime::Day, ShiftTime::Evening, ShiftTime::Night];

    pub fn label(self) -> &'static str {
        match self {
            ShiftTime::Day => "08.30-16.30",
            ShiftTime::Evening => "16.30-00.30",
            ShiftTime::Night => "00.30-08.30",
        }
    }

    pub(crate) fn index(self) -> i64 {
        match self {
            ShiftTime::Day => 0,
            ShiftTime::Evening => 1,
            ShiftTime::Night => 2,
        }
    }
}

/// Classification d'une date : jour ouvré ou équivalent week-end
/// (samedi, dimanche ou jour férié).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum PeriodKind {
    Weekday,
    Weekend,
}

impl PeriodKind {
    pub fn label(self) -> &'static str {
        match self {
            PeriodKind::Weekday => "weekday",
            PeriodKind::Weekend => "weekend",
        }
    }
}

/// Unité atomique de planification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Slot {
    pub date: NaiveDate,
    pub post: Post,
    pub time: ShiftTime,
}

/// Affectation placée dans le planning pour une date donnée.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Assignment {
    pub post: Post,
    pub time: ShiftTime,
    pub doctor: DoctorId,
}

/// Planning produit : date → affectations en ordre canonique
/// (poste puis bande horaire).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Schedule {
    days: BTreeMap<NaiveDate, Vec<Assignment>>,
}

impl Schedule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self, date: NaiveDate) -> &[Assignment] {
        self.days.get(&date).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, &[Assignment])> {
        self.days.iter().map(|(d, v)| (*d, v.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.days.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    pub fn push(&mut self, date: NaiveDate, assignment: Assignment) {
        self.days.entry(date).or_default().push(assignment);
    }

    /// Retire la dernière affectation de la date (usage LIFO du solveur).
    pub fn pop(&mut self, date: NaiveDate) -> Option<Assignment> {
        let entries = self.days.get_mut(&date)?;
        let out = entries.pop();
        if entries.is_empty() {
            self.days.remove(&date);
        }
        out
    }

    /// Remplace le médecin de l'affectation (date, index).
    pub fn set_doctor(&mut self, date: NaiveDate, index: usize, doctor: DoctorId) {
        if let Some(a) = self.days.get_mut(&date).and_then(|v| v.get_mut(index)) {
            a.doctor = doctor;
        }
    }

    /// Retire l'affectation (date, poste, bande), si présente.
    pub fn remove(&mut self, date: NaiveDate, post: Post, time: ShiftTime) -> Option<Assignment> {
        let entries = self.days.get_mut(&date)?;
        let pos = entries
            .iter()
            .position(|a| a.post == post && a.time == time)?;
        let out = entries.remove(pos);
        if entries.is_empty() {
            self.days.remove(&date);
        }
        Some(out)
    }

    /// Rétablit l'ordre canonique (poste puis bande) de chaque date.
    pub fn normalize(&mut self) {
        for entries in self.days.values_mut() {
            entries.sort_by_key(|a| (a.post, a.time));
        }
    }

    /// Le médecin occupe-t-il cette bande horaire à cette date ?
    pub fn has_band(&self, doctor: &DoctorId, date: NaiveDate, time: ShiftTime) -> bool {
        self.entries(date)
            .iter()
            .any(|a| a.time == time && &a.doctor == doctor)
    }

    pub fn doctor_for(&self, date: NaiveDate, post: Post, time: ShiftTime) -> Option<&DoctorId> {
        self.entries(date)
            .iter()
            .find(|a| a.post == post && a.time == time)
            .map(|a| &a.doctor)
    }
}

/// Compteurs par poste d'un même couple (période, médecin).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PostCounts {
    pub er: u32,
    pub ward: u32,
}

impl PostCounts {
    pub fn get(&self, post: Post) -> u32 {
        match post {
            Post::Er => self.er,
            Post::Ward => self.ward,
        }
    }

    pub fn get_mut(&mut self, post: Post) -> &mut u32 {
        match post {
            Post::Er => &mut self.er,
            Post::Ward => &mut self.ward,
        }
    }
}

/// Quota nominal par médecin, dans l'unité pensée par l'opérateur
/// ("gardes").
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NominalQuota {
    pub weekday: PostCounts,
    pub weekend: PostCounts,
}

/// Quota effectif : nombre exact de créneaux de 8 h à occuper par
/// (période, poste), dérivé du nominal par multiplicateurs fixes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EffectiveQuota {
    pub weekday: PostCounts,
    pub weekend: PostCounts,
}

impl EffectiveQuota {
    pub fn get(&self, period: PeriodKind, post: Post) -> u32 {
        match period {
            PeriodKind::Weekday => self.weekday.get(post),
            PeriodKind::Weekend => self.weekend.get(post),
        }
    }

    pub fn get_mut(&mut self, period: PeriodKind, post: Post) -> &mut u32 {
        match period {
            PeriodKind::Weekday => self.weekday.get_mut(post),
            PeriodKind::Weekend => self.weekend.get_mut(post),
        }
    }

    pub fn total(&self) -> u32 {
        self.weekday.er + self.weekday.ward + self.weekend.er + self.weekend.ward
    }
}

/// Obligation d'autopsie : le médecin est retenu ailleurs pendant
/// cette bande horaire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AutopsyDuty {
    pub date: NaiveDate,
    pub time: ShiftTime,
}

/// Interaction entre les quotas de fin d'année et les quotas
/// (période, poste) généraux.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum YearEndMode {
    /// Les égalités de fenêtre s'ajoutent aux quotas par compartiment.
    #[default]
    Combined,
    /// Les créneaux de fenêtre ne consomment pas les quotas par
    /// compartiment ; le précontrôle équilibre la fenêtre à part.
    Exclusive,
}

/// Quotas de la période du Nouvel An : fenêtre du réveillon
/// (Night du 30/12 + tous les créneaux du 31/12) et fenêtre du
/// Nouvel An (tous les créneaux du 1–4/01).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct YearEndQuotas {
    #[cfg_attr(feature = "serde", serde(default))]
    pub eve: BTreeMap<DoctorId, u32>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub new_year: BTreeMap<DoctorId, u32>,
}

impl YearEndQuotas {
    pub fn is_empty(&self) -> bool {
        self.eve.is_empty() && self.new_year.is_empty()
    }
}

/// Lectures configurables des points laissés ouverts par le métier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Policy {
    /// Une date équivalent week-end encadrée par deux jours ouvrés
    /// hérite-t-elle de l'occupation implicite de la bande Day ?
    pub sandwiched_implicit_day: bool,
    /// Une autopsie datée hors de la période planifiée bloque-t-elle
    /// quand même les créneaux adjacents dans la période ?
    pub offspan_autopsy_blocks: bool,
    pub year_end_mode: YearEndMode,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            sandwiched_implicit_day: false,
            offspan_autopsy_blocks: true,
            year_end_mode: YearEndMode::Combined,
        }
    }
}

/// Entrée complète et immuable d'une exécution de planification.
#[derive(Debug, Clone, Default)]
pub struct SchedulerInput {
    pub days: Vec<NaiveDate>,
    pub holidays: BTreeSet<NaiveDate>,
    /// Ordre stable des médecins ; fixe le départage du solveur.
    pub doctors: Vec<DoctorId>,
    pub quotas: BTreeMap<DoctorId, EffectiveQuota>,
    pub autopsies: BTreeMap<DoctorId, Vec<AutopsyDuty>>,
    pub year_end: Option<YearEndQuotas>,
    pub policy: Policy,
}

impl SchedulerInput {
    pub fn period_of(&self, date: NaiveDate) -> PeriodKind {
        crate::calendar::period(date, &self.holidays)
    }

    pub fn in_span(&self, date: NaiveDate) -> bool {
        match (self.days.first(), self.days.last()) {
            (Some(first), Some(last)) => date >= *first && date <= *last,
            _ => false,
        }
    }

    pub fn autopsies_for(&self, doctor: &DoctorId) -> &[AutopsyDuty] {
        self.autopsies
            .get(doctor)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}
