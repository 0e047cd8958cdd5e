use super::{LaborPool, PoolError};
use tracing::debug;

/// Ce qu'un groupe disponible apporte à la répartition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Demand {
    /// Membres disponibles.
    pub members: usize,
    /// Somme des `count` des membres disponibles.
    pub count: i64,
    /// Places restantes pour cet appel.
    pub capacity: i64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Allocation {
    pub dnw: f64,
    pub ddnw: i64,
}

impl Allocation {
    fn residual(&self) -> f64 {
        self.ddnw as f64 - self.dnw
    }
}

/// Répartit `total` sélections entre groupes pour rapprocher chaque moyenne
/// par personne de la moyenne cible commune.
///
/// Un groupe au-dessus de sa capacité est plafonné et sort de l'ajustement ;
/// un groupe en excédent (`dnw < 0`) reçoit 0 mais reste ajustable.
pub(crate) fn apportion(demands: &[Demand], total: i64) -> Result<Vec<Allocation>, PoolError> {
    let members: usize = demands.iter().map(|d| d.members).sum();
    if members == 0 {
        if total == 0 {
            return Ok(vec![Allocation { dnw: 0.0, ddnw: 0 }; demands.len()]);
        }
        return Err(PoolError::RanOutOfGroup);
    }
    let counted: i64 = demands.iter().map(|d| d.count).sum();
    let wanted = counted.checked_add(total).ok_or(PoolError::RanOutOfGroup)?;
    let target_mean = wanted as f64 / members as f64;

    let mut out = Vec::with_capacity(demands.len());
    let mut adjustable = Vec::new();
    let mut assigned = 0i64;

    for (idx, demand) in demands.iter().enumerate() {
        let dnw = target_mean * demand.members as f64 - demand.count as f64;
        let ddnw = if dnw > demand.capacity as f64 {
            demand.capacity
        } else if dnw < 0.0 {
            adjustable.push(idx);
            0
        } else {
            adjustable.push(idx);
            dnw.round_ties_even() as i64
        };
        assigned += ddnw;
        out.push(Allocation { dnw, ddnw });
    }

    while assigned != total {
        if adjustable.is_empty() {
            return Err(PoolError::RanOutOfGroup);
        }
        adjustable.sort_by(|&a, &b| out[a].residual().total_cmp(&out[b].residual()));
        if assigned < total {
            let idx = adjustable[0];
            if out[idx].ddnw >= demands[idx].capacity {
                adjustable.remove(0);
                continue;
            }
            out[idx].ddnw += 1;
            assigned += 1;
        } else {
            let Some(&idx) = adjustable.last() else {
                continue;
            };
            if out[idx].ddnw <= 0 {
                adjustable.pop();
                continue;
            }
            out[idx].ddnw -= 1;
            assigned -= 1;
        }
    }

    Ok(out)
}

impl LaborPool {
    /// Fixe `ddnw` sur chaque groupe disponible pour que leur somme vaille `total`.
    pub fn set_quotas(&mut self, total: i64) -> Result<(), PoolError> {
        let ids = self.available.groups().to_vec();
        let demands: Vec<Demand> = ids
            .iter()
            .map(|&g| Demand {
                members: self.available.member_count(g),
                count: self.group_count(g),
                capacity: self.available.now_available(g),
            })
            .collect();

        let allocations = apportion(&demands, total)?;
        for (&g, alloc) in ids.iter().zip(allocations) {
            let Some(group) = self.groups.get_mut(g.index()) else {
                continue;
            };
            group.dnw = alloc.dnw;
            group.ddnw = alloc.ddnw;
            debug!(group = %group.name, dnw = alloc.dnw, ddnw = alloc.ddnw, "quota set");
        }
        Ok(())
    }
}
