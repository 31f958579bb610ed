//! Decoding of the people, reviews and institutions documents.
//!
//! Duck-typed source fields (ratings that are sometimes numbers and
//! sometimes `{ "value": ... }` objects, authors given as ids or profiles,
//! wrapped or bare documents) are resolved here, once, into the typed model.
//! Each record is decoded on its own so that a bad record is skipped and
//! counted instead of failing the document.

use crate::error::{Error, RecordKind, Result};
use crate::identity::{AffiliationRecord, IdentityGraphBuilder, PersonRecord};
use crate::model::{Dataset, Review, ReviewContent, Role, Submission};
use crate::normalize::InstitutionType;
use crate::stats::SkipCounts;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use std::path::Path;
use std::sync::LazyLock;
use tracing::{debug, info, warn};

/// Prefix of synthesized reviewer identities.
pub const ANONYMOUS_PREFIX: &str = "anonymous_reviewer_";

pub const PEOPLE_FILE: &str = "people.json";
pub const REVIEWS_FILE: &str = "reviews.json";
pub const INSTITUTIONS_FILE: &str = "institutions.json";

static LEADING_NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(-?\d+(?:\.\d+)?)").expect("leading number pattern must compile")
});

/// A numeric field as it appears in the wild.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawNumber {
    Number(f64),
    /// Form labels such as `"6: marginally above the acceptance threshold"`.
    Text(String),
    Wrapped { value: Option<Box<RawNumber>> },
}

impl RawNumber {
    pub fn resolve(&self) -> Option<f64> {
        match self {
            RawNumber::Number(n) => n.is_finite().then_some(*n),
            RawNumber::Text(s) => LEADING_NUMBER
                .captures(s)
                .and_then(|c| c[1].parse::<f64>().ok()),
            RawNumber::Wrapped { value } => value.as_ref().and_then(|v| v.resolve()),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum RawText {
    Text(String),
    Wrapped { value: Option<String> },
}

impl RawText {
    fn resolve(self) -> Option<String> {
        match self {
            RawText::Text(s) => Some(s),
            RawText::Wrapped { value } => value,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct RawContent {
    #[serde(default)]
    summary: Option<RawText>,
    #[serde(default)]
    strengths: Option<RawText>,
    #[serde(default)]
    weaknesses: Option<RawText>,
    #[serde(default)]
    questions: Option<RawText>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawSignature {
    One(String),
    Many(Vec<String>),
}

impl RawSignature {
    fn first(&self) -> Option<&str> {
        match self {
            RawSignature::One(s) => Some(s),
            RawSignature::Many(v) => v.first().map(String::as_str),
        }
    }
}

/// Inline profile data attached to an author or reviewer entry.
#[derive(Debug, Default, Deserialize)]
struct RawPersonRef {
    #[serde(default, alias = "author_id", alias = "reviewer_id", alias = "person_id")]
    id: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default, alias = "affiliation")]
    institution: Option<String>,
    #[serde(default, alias = "nationality")]
    country: Option<String>,
    #[serde(default)]
    gender: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawAuthor {
    Id(String),
    Profile(RawPersonRef),
}

#[derive(Debug, Deserialize)]
struct RawReview {
    #[serde(default, alias = "id")]
    review_id: Option<Value>,
    #[serde(default)]
    reviewer_id: Option<Value>,
    #[serde(default, alias = "signatures")]
    signature: Option<RawSignature>,
    #[serde(default)]
    rating: Option<RawNumber>,
    #[serde(default)]
    confidence: Option<RawNumber>,
    #[serde(default)]
    content: RawContent,
    #[serde(default, alias = "reviewer")]
    reviewer_profile: Option<RawPersonRef>,
}

#[derive(Debug, Deserialize)]
struct RawSubmission {
    #[serde(default, alias = "number")]
    submission_number: Option<Value>,
    #[serde(default)]
    authors: Vec<RawAuthor>,
    #[serde(default)]
    reviews: Vec<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawAffiliation {
    Name(String),
    Detail {
        #[serde(default, alias = "institution", alias = "institution_name")]
        name: Option<String>,
        #[serde(default)]
        country: Option<String>,
        #[serde(default, alias = "institution_type", alias = "type")]
        kind: Option<String>,
    },
}

impl RawAffiliation {
    fn into_record(self) -> Option<AffiliationRecord> {
        match self {
            RawAffiliation::Name(name) => Some(AffiliationRecord {
                name,
                ..Default::default()
            }),
            RawAffiliation::Detail {
                name,
                country,
                kind,
            } => name.map(|name| AffiliationRecord {
                name,
                country,
                kind: kind.as_deref().map(InstitutionType::from_label),
            }),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawRoles {
    List(Vec<String>),
    Text(String),
}

impl RawRoles {
    fn resolve(&self) -> Vec<Role> {
        let labels: Vec<&str> = match self {
            RawRoles::List(v) => v.iter().map(String::as_str).collect(),
            RawRoles::Text(s) => s.split([',', ';', '/']).collect(),
        };
        labels
            .into_iter()
            .filter_map(|label| match label.trim().to_lowercase().as_str() {
                "author" => Some(Role::Author),
                "reviewer" => Some(Role::Reviewer),
                _ => None,
            })
            .collect()
    }
}

#[derive(Debug, Deserialize)]
struct RawPerson {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default, alias = "country")]
    nationality: Option<String>,
    #[serde(default)]
    institution: Option<String>,
    #[serde(default)]
    institutions: Vec<RawAffiliation>,
    #[serde(default)]
    affiliations: Vec<RawAffiliation>,
    #[serde(default)]
    gender: Option<String>,
    #[serde(default, alias = "role")]
    roles: Option<RawRoles>,
    #[serde(default)]
    authored_papers: Vec<Value>,
    #[serde(default)]
    reviewed_papers: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct RawInstitution {
    #[serde(alias = "name", alias = "institution")]
    institution_name: String,
    #[serde(default)]
    country: Option<String>,
    #[serde(default, alias = "type")]
    institution_type: Option<String>,
}

/// Reads and parses one JSON document. Failure here is fatal for the run.
pub fn read_document(path: &Path) -> Result<Value> {
    let content = std::fs::read_to_string(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| Error::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Loads `people.json`, `reviews.json` and, when present, `institutions.json`
/// from `dir`.
#[tracing::instrument(skip(dir), fields(dir = %dir.display()))]
pub fn load_dataset(dir: &Path) -> Result<Dataset> {
    let people = read_document(&dir.join(PEOPLE_FILE))?;
    let reviews = read_document(&dir.join(REVIEWS_FILE))?;
    let institutions_path = dir.join(INSTITUTIONS_FILE);
    let institutions = if institutions_path.exists() {
        Some(read_document(&institutions_path)?)
    } else {
        debug!("No institutions document, relying on person affiliations");
        None
    };

    let dataset = build_dataset(&people, &reviews, institutions.as_ref());
    info!(
        submissions = dataset.submissions.len(),
        reviews = dataset.review_count(),
        people = dataset.graph.person_count(),
        institutions = dataset.graph.institution_count(),
        skipped = dataset.skipped.total(),
        withdrawn = dataset.withdrawn_submissions,
        "Dataset loaded"
    );
    Ok(dataset)
}

/// Builds a dataset from already-parsed documents. Never fails: malformed
/// records are skipped and counted in [`Dataset::skipped`].
pub fn build_dataset(people: &Value, reviews: &Value, institutions: Option<&Value>) -> Dataset {
    let mut builder = IdentityGraphBuilder::new();
    let mut skipped = SkipCounts::default();

    if let Some(doc) = institutions {
        for entry in entries(doc, "institutions") {
            match decode_institution(&entry) {
                Ok(record) => {
                    builder.add_institution(&record);
                }
                Err(e) => skip(&mut skipped, e),
            }
        }
    }

    for entry in entries(people, "people") {
        match decode_person(&entry) {
            Ok(record) => {
                builder.add_person(&record);
            }
            Err(e) => skip(&mut skipped, e),
        }
    }

    let mut submissions = Vec::new();
    let mut withdrawn_submissions = 0;

    for entry in entries(reviews, "reviews") {
        let raw = match decode_submission(&entry) {
            Ok(raw) => raw,
            Err(e) => {
                skip(&mut skipped, e);
                continue;
            }
        };

        let (number, authors, raw_reviews) = raw;
        let decoded: Vec<RawReview> = raw_reviews
            .iter()
            .enumerate()
            .filter_map(|(i, value)| {
                serde_json::from_value::<RawReview>(value.clone())
                    .map_err(|e| Error::malformed(RecordKind::Review, format!("{number}#{i}"), e))
                    .map_err(|e| skip(&mut skipped, e))
                    .ok()
            })
            .collect();

        if decoded.is_empty() {
            debug!(submission = number, "Submission has no reviews, treating as withdrawn");
            withdrawn_submissions += 1;
            continue;
        }

        let author_ids = authors
            .into_iter()
            .filter_map(author_record)
            .map(|record| {
                let id = builder.add_person(&record);
                builder.record_authorship(id, number);
                id
            })
            .collect();

        let reviews = decoded
            .into_iter()
            .enumerate()
            .map(|(index, raw)| resolve_review(&mut builder, raw, number, index))
            .collect();

        submissions.push(Submission {
            number,
            authors: author_ids,
            reviews,
        });
    }

    submissions.sort_by_key(|s| s.number);
    let before = submissions.len();
    submissions.dedup_by_key(|s| s.number);
    if submissions.len() < before {
        warn!(
            duplicates = before - submissions.len(),
            "Duplicate submission numbers, keeping the first"
        );
        skipped.submissions += before - submissions.len();
    }

    Dataset {
        submissions,
        graph: builder.build(),
        skipped,
        withdrawn_submissions,
    }
}

fn skip(skipped: &mut SkipCounts, error: Error) {
    if let Error::MalformedRecord { kind, .. } = &error {
        skipped.record(*kind);
    }
    warn!(error = %error, "Skipping record");
}

/// One record of a document. `key` is the map key for map documents and
/// `None` for list documents.
struct Entry<'a> {
    key: Option<String>,
    label: String,
    value: &'a Value,
}

/// Yields the records of a bare or wrapped map/list document.
fn entries<'a>(doc: &'a Value, wrapper: &str) -> Vec<Entry<'a>> {
    let inner = match doc.get(wrapper) {
        Some(inner @ (Value::Object(_) | Value::Array(_))) => inner,
        _ => doc,
    };
    match inner {
        Value::Object(map) => map
            .iter()
            .map(|(k, value)| Entry {
                key: Some(k.clone()),
                label: k.clone(),
                value,
            })
            .collect(),
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(i, value)| Entry {
                key: None,
                label: format!("#{i}"),
                value,
            })
            .collect(),
        _ => Vec::new(),
    }
}

fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn value_to_u32(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn decode_institution(entry: &Entry) -> Result<AffiliationRecord> {
    let raw: RawInstitution = serde_json::from_value(entry.value.clone())
        .map_err(|e| Error::malformed(RecordKind::Institution, &entry.label, e))?;
    Ok(AffiliationRecord {
        name: raw.institution_name,
        country: raw.country,
        kind: raw.institution_type.as_deref().map(InstitutionType::from_label),
    })
}

fn decode_person(entry: &Entry) -> Result<PersonRecord> {
    let raw: RawPerson = serde_json::from_value(entry.value.clone())
        .map_err(|e| Error::malformed(RecordKind::Person, &entry.label, e))?;

    // List documents carry the id inline; map documents use the key.
    let id = raw
        .id
        .filter(|id| !id.trim().is_empty())
        .or_else(|| entry.key.clone())
        .ok_or_else(|| Error::malformed(RecordKind::Person, &entry.label, "missing person id"))?;

    let mut affiliations: Vec<AffiliationRecord> = raw
        .institution
        .into_iter()
        .map(|name| AffiliationRecord {
            name,
            ..Default::default()
        })
        .collect();
    affiliations.extend(
        raw.institutions
            .into_iter()
            .chain(raw.affiliations)
            .filter_map(RawAffiliation::into_record),
    );

    Ok(PersonRecord {
        id,
        name: raw.name,
        nationality: raw.nationality,
        gender: raw.gender,
        affiliations,
        roles: raw.roles.map(|r| r.resolve()).unwrap_or_default(),
        authored: raw.authored_papers.iter().filter_map(value_to_u32).collect(),
        reviewed: raw.reviewed_papers.iter().filter_map(value_to_u32).collect(),
    })
}

fn decode_submission(entry: &Entry) -> Result<(u32, Vec<RawAuthor>, Vec<Value>)> {
    let raw: RawSubmission = serde_json::from_value(entry.value.clone())
        .map_err(|e| Error::malformed(RecordKind::Submission, &entry.label, e))?;
    let number = raw
        .submission_number
        .as_ref()
        .and_then(value_to_u32)
        .or_else(|| entry.key.as_deref().and_then(|k| k.trim().parse().ok()))
        .ok_or_else(|| {
            Error::malformed(RecordKind::Submission, &entry.label, "missing submission number")
        })?;
    Ok((number, raw.authors, raw.reviews))
}

fn author_record(author: RawAuthor) -> Option<PersonRecord> {
    match author {
        RawAuthor::Id(id) if !id.trim().is_empty() => Some(PersonRecord {
            id,
            roles: vec![Role::Author],
            ..Default::default()
        }),
        RawAuthor::Id(_) => None,
        RawAuthor::Profile(profile) => {
            let id = profile.id.clone().filter(|id| !id.trim().is_empty())?;
            Some(profile_record(id, profile, Role::Author))
        }
    }
}

fn profile_record(id: String, profile: RawPersonRef, role: Role) -> PersonRecord {
    PersonRecord {
        id,
        name: profile.name,
        nationality: profile.country.clone(),
        gender: profile.gender,
        affiliations: profile
            .institution
            .into_iter()
            .map(|name| AffiliationRecord {
                name,
                country: profile.country.clone(),
                kind: None,
            })
            .collect(),
        roles: vec![role],
        ..Default::default()
    }
}

/// Builds the placeholder identity for a review without a reviewer id.
pub fn synthesize_reviewer_id(
    signature: Option<&str>,
    review_id: Option<&str>,
    submission: u32,
    index: usize,
) -> String {
    const MARKER: &str = "Reviewer_";
    if let Some(suffix) = signature
        .and_then(|sig| sig.rfind(MARKER).map(|pos| &sig[pos + MARKER.len()..]))
        .filter(|suffix| !suffix.is_empty())
    {
        return format!("{ANONYMOUS_PREFIX}{suffix}");
    }
    match review_id {
        Some(id) => format!("{ANONYMOUS_PREFIX}{id}"),
        None => format!("{ANONYMOUS_PREFIX}{submission}_{index}"),
    }
}

fn resolve_review(
    builder: &mut IdentityGraphBuilder,
    raw: RawReview,
    submission: u32,
    index: usize,
) -> Review {
    let review_id = raw.review_id.as_ref().and_then(value_to_string);

    let (reviewer_id, provided, invalid) = match &raw.reviewer_id {
        Some(Value::String(s)) if !s.trim().is_empty() => (s.trim().to_string(), true, None),
        Some(other) => match value_to_string(other) {
            Some(s) => (s, true, Some(json_type(other))),
            None => (
                synthesize_reviewer_id(
                    raw.signature.as_ref().and_then(RawSignature::first),
                    review_id.as_deref(),
                    submission,
                    index,
                ),
                false,
                (!other.is_null() && !other.is_string()).then(|| json_type(other)),
            ),
        },
        None => (
            synthesize_reviewer_id(
                raw.signature.as_ref().and_then(RawSignature::first),
                review_id.as_deref(),
                submission,
                index,
            ),
            false,
            None,
        ),
    };

    let record = match raw.reviewer_profile {
        Some(profile) => profile_record(reviewer_id.clone(), profile, Role::Reviewer),
        None => PersonRecord {
            id: reviewer_id.clone(),
            roles: vec![Role::Reviewer],
            ..Default::default()
        },
    };
    let reviewer = builder.add_person(&record);
    builder.record_review(reviewer, submission);

    let content = raw.content;
    Review {
        review_id,
        reviewer,
        reviewer_id,
        reviewer_id_provided: provided,
        reviewer_id_type: invalid,
        rating: raw.rating.as_ref().and_then(RawNumber::resolve),
        confidence: raw.confidence.as_ref().and_then(RawNumber::resolve),
        content: ReviewContent {
            summary: content.summary.and_then(RawText::resolve),
            strengths: content.strengths.and_then(RawText::resolve),
            weaknesses: content.weaknesses.and_then(RawText::resolve),
            questions: content.questions.and_then(RawText::resolve),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn resolve(v: Value) -> Option<f64> {
        serde_json::from_value::<RawNumber>(v).unwrap().resolve()
    }

    #[test]
    fn test_rating_shapes() {
        assert_eq!(resolve(json!(6)), Some(6.0));
        assert_eq!(resolve(json!(5.5)), Some(5.5));
        assert_eq!(resolve(json!({"value": 8})), Some(8.0));
        assert_eq!(resolve(json!({"value": null})), None);
        assert_eq!(resolve(json!("6: marginally above the threshold")), Some(6.0));
        assert_eq!(resolve(json!("strong accept")), None);
    }

    #[test]
    fn test_synthesized_reviewer_ids() {
        assert_eq!(
            synthesize_reviewer_id(Some("ICLR.cc/2025/Conference/Submission1/Reviewer_3"), None, 1, 0),
            "anonymous_reviewer_3"
        );
        assert_eq!(
            synthesize_reviewer_id(None, Some("rev-9"), 1, 0),
            "anonymous_reviewer_rev-9"
        );
        assert_eq!(synthesize_reviewer_id(Some("Reviewer_"), None, 4, 2), "anonymous_reviewer_4_2");
    }

    #[test]
    fn test_wrapped_and_bare_documents() {
        let wrapped = json!({"reviews": {"1": {"reviews": []}}});
        assert_eq!(entries(&wrapped, "reviews").len(), 1);
        let bare = json!({"1": {"reviews": []}, "2": {"reviews": []}});
        assert_eq!(entries(&bare, "reviews").len(), 2);
        let list = json!({"institutions": [{"institution_name": "MIT"}]});
        assert_eq!(entries(&list, "institutions").len(), 1);
    }

    #[test]
    fn test_malformed_records_are_skipped_and_counted() {
        let people = json!({
            "a1": {"name": "Ada", "nationality": "UK", "institution": "UCL"},
            "bad": {"name": ["not", "a", "string"]}
        });
        let reviews = json!({
            "1": {
                "submission_number": 1,
                "authors": ["a1"],
                "reviews": [
                    {"reviewer_id": "r1", "rating": {"value": 6}, "confidence": 4,
                     "content": {"summary": {"value": "fine"}}},
                    {"reviewer_id": "r2", "rating": [1, 2]}
                ]
            },
            "x": {"authors": []},
            "3": {"submission_number": 3, "authors": ["a1"], "reviews": []}
        });

        let dataset = build_dataset(&people, &reviews, None);
        assert_eq!(dataset.submissions.len(), 1);
        assert_eq!(dataset.skipped.people, 1);
        assert_eq!(dataset.skipped.reviews, 1);
        assert_eq!(dataset.skipped.submissions, 1);
        assert_eq!(dataset.withdrawn_submissions, 1);

        let review = &dataset.submissions[0].reviews[0];
        assert_eq!(review.rating, Some(6.0));
        assert_eq!(review.content.summary.as_deref(), Some("fine"));

        let author = dataset.graph.find_person("a1").unwrap();
        assert_eq!(author.nationality, "United Kingdom");
        assert!(author.has_role(Role::Author));
        assert_eq!(author.authored, vec![1]);
    }

    #[test]
    fn test_missing_reviewer_becomes_distinct_identity() {
        let reviews = json!({
            "5": {"reviews": [
                {"review_id": "abc", "signature": "Conf/Submission5/Reviewer_Xy1", "rating": 3},
                {"review_id": "def", "rating": 4},
                {"review_id": "ghi", "reviewer_id": 42, "rating": 5}
            ]}
        });
        let dataset = build_dataset(&json!({}), &reviews, None);
        let reviews = &dataset.submissions[0].reviews;

        assert_eq!(reviews[0].reviewer_id, "anonymous_reviewer_Xy1");
        assert!(!reviews[0].reviewer_id_provided);
        assert_eq!(reviews[1].reviewer_id, "anonymous_reviewer_def");
        assert_ne!(reviews[0].reviewer, reviews[1].reviewer);
        assert_eq!(reviews[2].reviewer_id, "42");
        assert!(reviews[2].reviewer_id_provided);
        assert_eq!(reviews[2].reviewer_id_type, Some("number"));
    }

    #[test]
    fn test_reviewer_profile_feeds_identity_graph() {
        let reviews = json!({
            "2": {"authors": [{"id": "a", "institution": "Peking Univ.", "country": "CN"}],
                  "reviews": [{"reviewer_id": "r", "rating": 7,
                               "reviewer_profile": {"institution": "Stanford", "country": "USA"}}]}
        });
        let dataset = build_dataset(&json!({}), &reviews, None);
        let reviewer = dataset.graph.find_person("r").unwrap();
        assert_eq!(reviewer.nationality, "United States");
        assert!(reviewer.primary_institution.is_some());
        assert!(dataset.graph.find_institution("Stanford University").is_some());
        assert_eq!(dataset.graph.find_person("a").unwrap().nationality, "China");
    }

    #[test]
    fn test_roles_from_text_or_list() {
        let text = serde_json::from_value::<RawRoles>(json!("author, reviewer")).unwrap();
        assert_eq!(text.resolve(), vec![Role::Author, Role::Reviewer]);
        let list = serde_json::from_value::<RawRoles>(json!(["Reviewer"])).unwrap();
        assert_eq!(list.resolve(), vec![Role::Reviewer]);
    }
}
