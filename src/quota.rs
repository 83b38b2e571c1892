use crate::model::{DoctorId, EffectiveQuota, NominalQuota, PostCounts};
use std::collections::BTreeMap;

/// Multiplicateurs nominal → effectif. Une garde week-end nominale
/// vaut trois occupations de 8 h (Day + Evening + Night) ; une garde
/// ER de semaine en vaut deux (Evening + Night).
const WEEKDAY_ER_FACTOR: u32 = 2;
const WEEKDAY_WARD_FACTOR: u32 = 1;
const WEEKEND_FACTOR: u32 = 3;

/// Développe les quotas nominaux en quotas effectifs. Les médecins
/// sans bloc de quota sont absents de l'entrée et donc de la sortie ;
/// la fonction est pure.
pub fn adjust(nominal: &BTreeMap<DoctorId, NominalQuota>) -> BTreeMap<DoctorId, EffectiveQuota> {
    nominal
        .iter()
        .map(|(doctor, q)| (doctor.clone(), effective(q)))
        .collect()
}

pub fn effective(q: &NominalQuota) -> EffectiveQuota {
    EffectiveQuota {
        weekday: PostCounts {
            er: q.weekday.er * WEEKDAY_ER_FACTOR,
            ward: q.weekday.ward * WEEKDAY_WARD_FACTOR,
        },
        weekend: PostCounts {
            er: q.weekend.er * WEEKEND_FACTOR,
            ward: q.weekend.ward * WEEKEND_FACTOR,
        },
    }
}
