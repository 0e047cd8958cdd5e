use crate::pool::PoolError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Identifiant fort pour Group (position dans le pool)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GroupId(pub usize);

impl GroupId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Référence non possédante vers une personne : groupe + position déclarée.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PersonRef {
    pub group: GroupId,
    pub member: usize,
}

impl PersonRef {
    pub fn new(group: GroupId, member: usize) -> Self {
        Self { group, member }
    }
}

/// Intervalle de dates fermé `[start, end]` rattaché à une personne.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateInterval {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub owner: PersonRef,
}

impl DateInterval {
    pub fn new(start: NaiveDate, end: NaiveDate, owner: PersonRef) -> Result<Self, PoolError> {
        if end < start {
            return Err(PoolError::InvalidInterval(format!(
                "end {end} is before start {start}"
            )));
        }
        Ok(Self { start, end, owner })
    }

    /// Intervalle d'un seul jour.
    pub fn single(day: NaiveDate, owner: PersonRef) -> Self {
        Self {
            start: day,
            end: day,
            owner,
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Nombre de jours couverts, bornes incluses.
    pub fn len_days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }
}

/// Personne d'un groupe, avec ses compteurs d'équité.
///
/// `rank` est la seule clé de priorité (plus petit = choisi plus tôt) et reste
/// égal à `count + fraction` après chaque sélection, réelle ou virtuelle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Person {
    pub name: String,
    pub group: GroupId,
    pub precount: i64,
    pub fraction: f64,
    pub rank: f64,
    pub count: i64,
    pub real_count: i64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dayoffs: Vec<DateInterval>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub vacancies: Vec<DateInterval>,
}

impl Person {
    pub fn new<N: Into<String>>(name: N, group: GroupId, precount: i64, fraction: f64) -> Self {
        Self {
            name: name.into(),
            group,
            precount,
            fraction,
            rank: -(precount as f64) + fraction,
            count: -precount,
            real_count: 0,
            dayoffs: Vec::new(),
            vacancies: Vec::new(),
        }
    }

    pub fn has_dayoff(&self, date: NaiveDate) -> bool {
        self.dayoffs.iter().any(|d| d.contains(date))
    }

    pub fn is_vacant(&self, date: NaiveDate) -> bool {
        self.vacancies.iter().any(|v| v.contains(date))
    }

    /// Absent ce jour-là, quelle qu'en soit la raison.
    pub fn is_away(&self, date: NaiveDate) -> bool {
        self.has_dayoff(date) || self.is_vacant(date)
    }

    /// Sélection virtuelle : compte sans travailler.
    pub(crate) fn bump(&mut self) {
        self.count += 1;
        self.rank += 1.0;
    }

    /// Sélection réelle.
    pub(crate) fn pick(&mut self) {
        self.real_count += 1;
        self.bump();
    }

    /// Sélections compensées (virtuelles) plus la dette reportée.
    pub fn removed_count(&self) -> i64 {
        self.count - self.real_count + self.precount
    }
}

/// Groupe ordonné de personnes avec un plafond de sélection par appel.
#[derive(Debug, Clone, Serialize)]
pub struct Group {
    pub id: GroupId,
    pub name: String,
    pub members: Vec<Person>,
    pub max_available: i64,
    /// Part continue idéale calculée par la dernière répartition.
    pub dnw: f64,
    /// Quota entier retenu pour l'appel courant.
    pub ddnw: i64,
    /// Ordre de priorité persistant ; retrié de façon stable à chaque tirage.
    #[serde(skip)]
    pub(crate) priority: Vec<usize>,
}

impl Group {
    pub fn new<N: Into<String>>(id: GroupId, name: N, max_available: i64) -> Self {
        Self {
            id,
            name: name.into(),
            members: Vec::new(),
            max_available,
            dnw: 0.0,
            ddnw: 0,
            priority: Vec::new(),
        }
    }

    /// Ajoute un membre en fin d'ordre de priorité.
    pub fn push_member(&mut self, person: Person) -> PersonRef {
        let member = self.members.len();
        self.members.push(person);
        self.priority.push(member);
        PersonRef::new(self.id, member)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn find_member(&self, name: &str) -> Option<PersonRef> {
        self.members
            .iter()
            .position(|p| p.name == name)
            .map(|m| PersonRef::new(self.id, m))
    }

    pub fn real_count(&self) -> i64 {
        self.members.iter().map(|p| p.real_count).sum()
    }
}
