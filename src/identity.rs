//! Person/institution/submission identity graph.
//!
//! Entities live in arenas (`Vec<Person>`, `Vec<Institution>`) and refer to
//! each other through index newtypes, so the many-to-many person-institution
//! relation is a pair of edge lists rather than an object graph.

use crate::model::Role;
use crate::normalize::{
    self, InstitutionType, UNKNOWN_COUNTRY, UNKNOWN_INSTITUTION, infer_institution_type,
    institution_country_override, normalize_country, normalize_institution,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PersonId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct InstitutionId(pub usize);

pub const UNKNOWN_GENDER: &str = "Unknown";

#[derive(Debug, Clone, PartialEq)]
pub struct Person {
    pub id: String,
    pub name: Option<String>,
    pub nationality: String,
    pub gender: String,
    pub roles: BTreeSet<Role>,
    pub institutions: Vec<InstitutionId>,
    /// First real institution seen; `None` while only the placeholder is known.
    pub primary_institution: Option<InstitutionId>,
    pub authored: Vec<u32>,
    pub reviewed: Vec<u32>,
}

impl Person {
    fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            name: None,
            nationality: UNKNOWN_COUNTRY.to_string(),
            gender: UNKNOWN_GENDER.to_string(),
            roles: BTreeSet::new(),
            institutions: Vec::new(),
            primary_institution: None,
            authored: Vec::new(),
            reviewed: Vec::new(),
        }
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    pub fn nationality_known(&self) -> bool {
        normalize::country::is_known(&self.nationality)
    }

    pub fn gender_known(&self) -> bool {
        self.gender != UNKNOWN_GENDER
    }

    /// Number of populated identity fields. Never decreases as more
    /// sightings of the same person are merged in.
    pub fn known_field_count(&self) -> usize {
        self.name.is_some() as usize
            + self.nationality_known() as usize
            + self.gender_known() as usize
            + self.primary_institution.is_some() as usize
            + self.institutions.len()
            + self.roles.len()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Institution {
    pub name: String,
    pub country: String,
    pub kind: InstitutionType,
    pub members: Vec<PersonId>,
    pub author_count: usize,
    pub reviewer_count: usize,
    pub total_members: usize,
}

/// One affiliation as it appears in a source record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AffiliationRecord {
    pub name: String,
    pub country: Option<String>,
    pub kind: Option<InstitutionType>,
}

/// One sighting of a person in a source record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PersonRecord {
    pub id: String,
    pub name: Option<String>,
    pub nationality: Option<String>,
    pub gender: Option<String>,
    pub affiliations: Vec<AffiliationRecord>,
    pub roles: Vec<Role>,
    pub authored: Vec<u32>,
    pub reviewed: Vec<u32>,
}

#[derive(Debug, Clone, Default)]
pub struct IdentityGraph {
    people: Vec<Person>,
    person_index: HashMap<String, PersonId>,
    institutions: Vec<Institution>,
    institution_index: HashMap<String, InstitutionId>,
}

impl IdentityGraph {
    pub fn person(&self, id: PersonId) -> &Person {
        &self.people[id.0]
    }

    pub fn institution(&self, id: InstitutionId) -> &Institution {
        &self.institutions[id.0]
    }

    pub fn people(&self) -> impl Iterator<Item = (PersonId, &Person)> {
        self.people.iter().enumerate().map(|(i, p)| (PersonId(i), p))
    }

    pub fn institutions(&self) -> impl Iterator<Item = (InstitutionId, &Institution)> {
        self.institutions
            .iter()
            .enumerate()
            .map(|(i, inst)| (InstitutionId(i), inst))
    }

    pub fn person_count(&self) -> usize {
        self.people.len()
    }

    pub fn institution_count(&self) -> usize {
        self.institutions.len()
    }

    pub fn find_person(&self, id: &str) -> Option<&Person> {
        self.person_index.get(id).map(|pid| self.person(*pid))
    }

    /// Looks an institution up by any raw spelling.
    pub fn find_institution(&self, raw: &str) -> Option<&Institution> {
        let key = institution_key(&normalize_institution(raw));
        self.institution_index
            .get(&key)
            .map(|id| self.institution(*id))
    }

    /// Type of the person's primary institution, `Unknown` without one.
    pub fn institution_type_of(&self, person: PersonId) -> InstitutionType {
        self.person(person)
            .primary_institution
            .map_or(InstitutionType::Unknown, |id| self.institution(id).kind)
    }
}

fn institution_key(canonical: &str) -> String {
    canonical.to_lowercase()
}

fn normalize_gender(raw: Option<&str>) -> String {
    match raw.map(str::trim) {
        None | Some("") => UNKNOWN_GENDER.to_string(),
        Some(g) if g.eq_ignore_ascii_case("unknown") || g.eq_ignore_ascii_case("n/a") => {
            UNKNOWN_GENDER.to_string()
        }
        Some(g) => g.to_string(),
    }
}

/// Accumulates sightings into an [`IdentityGraph`] with directional merge
/// semantics: known values are never replaced by unknown ones.
#[derive(Debug, Default)]
pub struct IdentityGraphBuilder {
    graph: IdentityGraph,
    declared_types: HashSet<InstitutionId>,
}

impl IdentityGraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an institution, returning `None` for the placeholder.
    ///
    /// Country resolution checks the override table before the asserted
    /// country. Country and type only ever move from unknown to known.
    pub fn add_institution(&mut self, record: &AffiliationRecord) -> Option<InstitutionId> {
        let canonical = normalize_institution(&record.name);
        if canonical == UNKNOWN_INSTITUTION {
            return None;
        }

        let country = institution_country_override(&canonical)
            .or_else(|| institution_country_override(&record.name))
            .map(str::to_string)
            .unwrap_or_else(|| normalize_country(record.country.as_deref()));
        let declared = record.kind.filter(|k| *k != InstitutionType::Unknown);

        let key = institution_key(&canonical);
        let id = match self.graph.institution_index.get(&key) {
            Some(id) => *id,
            None => {
                let id = InstitutionId(self.graph.institutions.len());
                let kind = declared.unwrap_or_else(|| infer_institution_type(&canonical));
                self.graph.institutions.push(Institution {
                    name: canonical,
                    country: UNKNOWN_COUNTRY.to_string(),
                    kind,
                    members: Vec::new(),
                    author_count: 0,
                    reviewer_count: 0,
                    total_members: 0,
                });
                self.graph.institution_index.insert(key, id);
                id
            }
        };

        let institution = &mut self.graph.institutions[id.0];
        if !normalize::country::is_known(&institution.country)
            && normalize::country::is_known(&country)
        {
            institution.country = country;
        }
        if let Some(kind) = declared {
            if self.declared_types.insert(id) {
                institution.kind = kind;
            }
        }

        Some(id)
    }

    /// Merges one sighting of a person and returns its arena id.
    pub fn add_person(&mut self, record: &PersonRecord) -> PersonId {
        let id = match self.graph.person_index.get(&record.id) {
            Some(id) => *id,
            None => {
                let id = PersonId(self.graph.people.len());
                self.graph.people.push(Person::new(&record.id));
                self.graph.person_index.insert(record.id.clone(), id);
                id
            }
        };

        let nationality = normalize_country(record.nationality.as_deref());
        let gender = normalize_gender(record.gender.as_deref());

        let mut affiliations = Vec::with_capacity(record.affiliations.len());
        for affiliation in &record.affiliations {
            let with_country = AffiliationRecord {
                country: affiliation
                    .country
                    .clone()
                    .or_else(|| record.nationality.clone()),
                ..affiliation.clone()
            };
            if let Some(inst) = self.add_institution(&with_country) {
                affiliations.push(inst);
            }
        }

        let person = &mut self.graph.people[id.0];
        person.roles.extend(record.roles.iter().copied());

        if person.name.is_none() {
            person.name = record.name.clone().filter(|n| !n.trim().is_empty());
        }
        if !person.nationality_known() && normalize::country::is_known(&nationality) {
            person.nationality = nationality;
        }
        if !person.gender_known() && gender != UNKNOWN_GENDER {
            person.gender = gender;
        }

        for inst in affiliations {
            if !person.institutions.contains(&inst) {
                person.institutions.push(inst);
            }
            if person.primary_institution.is_none() {
                person.primary_institution = Some(inst);
            }
        }

        person.authored.extend(&record.authored);
        person.reviewed.extend(&record.reviewed);
        id
    }

    pub fn record_authorship(&mut self, person: PersonId, submission: u32) {
        let p = &mut self.graph.people[person.0];
        p.roles.insert(Role::Author);
        p.authored.push(submission);
    }

    pub fn record_review(&mut self, person: PersonId, submission: u32) {
        let p = &mut self.graph.people[person.0];
        p.roles.insert(Role::Reviewer);
        p.reviewed.push(submission);
    }

    /// Finalizes edge lists and derived institution counts.
    pub fn build(mut self) -> IdentityGraph {
        for person in &mut self.graph.people {
            person.authored.sort_unstable();
            person.authored.dedup();
            person.reviewed.sort_unstable();
            person.reviewed.dedup();
        }

        for (pid, person) in self.graph.people.iter().enumerate() {
            for inst in &person.institutions {
                let institution = &mut self.graph.institutions[inst.0];
                institution.members.push(PersonId(pid));
                institution.total_members += 1;
                if person.has_role(Role::Author) {
                    institution.author_count += 1;
                }
                if person.has_role(Role::Reviewer) {
                    institution.reviewer_count += 1;
                }
            }
        }

        debug!(
            people = self.graph.people.len(),
            institutions = self.graph.institutions.len(),
            "Identity graph built"
        );
        self.graph
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn affiliation(name: &str, country: Option<&str>) -> AffiliationRecord {
        AffiliationRecord {
            name: name.into(),
            country: country.map(Into::into),
            kind: None,
        }
    }

    fn sighting(id: &str, nationality: Option<&str>, institution: Option<&str>) -> PersonRecord {
        PersonRecord {
            id: id.into(),
            nationality: nationality.map(Into::into),
            affiliations: institution.map(|i| affiliation(i, None)).into_iter().collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_spellings_join_on_canonical_name() {
        let mut builder = IdentityGraphBuilder::new();
        let a = builder.add_institution(&affiliation("MIT CSAIL", None));
        let b = builder.add_institution(&affiliation("Massachusetts Institute of Technology", Some("US")));
        assert_eq!(a, b);

        let graph = builder.build();
        assert_eq!(graph.institution_count(), 1);
        let inst = graph.find_institution("MIT").unwrap();
        assert_eq!(inst.country, "United States");
        assert_eq!(inst.kind, InstitutionType::University);
    }

    #[test]
    fn test_placeholder_institution_is_not_an_entity() {
        let mut builder = IdentityGraphBuilder::new();
        assert_eq!(builder.add_institution(&affiliation("  ", Some("US"))), None);
    }

    #[test]
    fn test_nationality_merges_directionally() {
        let mut builder = IdentityGraphBuilder::new();
        let id = builder.add_person(&sighting("p1", None, None));
        builder.add_person(&sighting("p1", Some("DE"), None));
        builder.add_person(&sighting("p1", Some("Unknown"), None));
        builder.add_person(&sighting("p1", Some("FR"), None));

        let graph = builder.build();
        assert_eq!(graph.person(id).nationality, "Germany");
    }

    #[test]
    fn test_institution_country_merges_directionally() {
        let mut builder = IdentityGraphBuilder::new();
        let id = builder.add_institution(&affiliation("Foo Lab", None)).unwrap();
        builder.add_institution(&affiliation("Foo Lab", Some("Japan")));
        builder.add_institution(&affiliation("Foo Lab", None));
        builder.add_institution(&affiliation("Foo Lab", Some("Korea")));

        let graph = builder.build();
        assert_eq!(graph.institution(id).country, "Japan");
    }

    #[test]
    fn test_override_beats_person_country() {
        let mut builder = IdentityGraphBuilder::new();
        let id = builder.add_person(&sighting("p1", Some("US"), Some("ByteDance Seattle")));
        let graph = builder.build();

        let person = graph.person(id);
        assert_eq!(person.nationality, "United States");
        let inst = graph.institution(person.primary_institution.unwrap());
        assert_eq!(inst.name, "ByteDance");
        assert_eq!(inst.country, "China");
    }

    #[test]
    fn test_institutions_append_and_primary_upgrades() {
        let mut builder = IdentityGraphBuilder::new();
        let id = builder.add_person(&sighting("p1", None, Some("")));
        builder.add_person(&sighting("p1", None, Some("Stanford")));
        builder.add_person(&sighting("p1", None, Some("Google Research")));
        builder.add_person(&sighting("p1", None, Some("Stanford University")));

        let graph = builder.build();
        let person = graph.person(id);
        assert_eq!(person.institutions.len(), 2);
        let primary = graph.institution(person.primary_institution.unwrap());
        assert_eq!(primary.name, "Stanford University");
    }

    #[test]
    fn test_roles_union_and_counts() {
        let mut builder = IdentityGraphBuilder::new();
        let a = builder.add_person(&sighting("a", Some("CN"), Some("Tsinghua")));
        let b = builder.add_person(&sighting("b", Some("CN"), Some("THU")));
        builder.record_authorship(a, 7);
        builder.record_review(a, 9);
        builder.record_review(b, 7);
        builder.record_review(b, 7);

        let graph = builder.build();
        assert!(graph.person(a).has_role(Role::Author));
        assert!(graph.person(a).has_role(Role::Reviewer));
        assert_eq!(graph.person(b).reviewed, vec![7]);

        let inst = graph.find_institution("Tsinghua University").unwrap();
        assert_eq!(inst.total_members, 2);
        assert_eq!(inst.author_count, 1);
        assert_eq!(inst.reviewer_count, 2);
    }

    #[test]
    fn test_declared_type_wins_over_inferred() {
        let mut builder = IdentityGraphBuilder::new();
        let id = builder.add_institution(&affiliation("Shanghai AI Lab", None)).unwrap();
        builder.add_institution(&AffiliationRecord {
            kind: Some(InstitutionType::Company),
            ..affiliation("Shanghai AI Lab", None)
        });
        builder.add_institution(&AffiliationRecord {
            kind: Some(InstitutionType::University),
            ..affiliation("Shanghai AI Lab", None)
        });

        let graph = builder.build();
        assert_eq!(graph.institution(id).kind, InstitutionType::Company);
    }

    fn arb_record() -> impl Strategy<Value = PersonRecord> {
        let ids = prop::sample::select(vec!["p1", "p2", "p3"]);
        let countries = prop::option::of(prop::sample::select(vec!["US", "CN", "", "Unknown", "Germany"]));
        let genders = prop::option::of(prop::sample::select(vec!["female", "male", "", "unknown"]));
        let insts = prop::option::of(prop::sample::select(vec!["MIT", "Tsinghua", "", "Acme, Lab X"]));
        (ids, countries, genders, insts).prop_map(|(id, country, gender, inst)| PersonRecord {
            id: id.to_string(),
            nationality: country.map(Into::into),
            gender: gender.map(Into::into),
            affiliations: inst.map(|i| affiliation(i, None)).into_iter().collect(),
            roles: vec![Role::Reviewer],
            ..Default::default()
        })
    }

    fn build(records: &[PersonRecord]) -> IdentityGraph {
        let mut builder = IdentityGraphBuilder::new();
        for record in records {
            builder.add_person(record);
        }
        builder.build()
    }

    proptest! {
        #[test]
        fn prop_merge_is_monotonic(
            a in prop::collection::vec(arb_record(), 0..8),
            b in prop::collection::vec(arb_record(), 0..8),
        ) {
            let before = build(&a);
            let union: Vec<_> = a.iter().chain(b.iter()).cloned().collect();
            let after = build(&union);

            for (_, person) in before.people() {
                let merged = after.find_person(&person.id).unwrap();
                prop_assert!(merged.known_field_count() >= person.known_field_count());
                if person.nationality_known() {
                    prop_assert_eq!(&merged.nationality, &person.nationality);
                }
            }
        }
    }
}
