//! Canonicalization of noisy institution and country strings.
//!
//! Everything here is a pure function over strings. Nothing fails: unknown
//! input degrades to a best-effort string, and empty input becomes
//! `"Unknown"` / `"Unknown Institution"`.

pub mod country;
pub mod culture;
pub mod institution;

pub use country::{UNKNOWN_COUNTRY, institution_country_override, normalize_country};
pub use culture::{CulturalCluster, clusters_of, primary_cluster};
pub use institution::{
    InstitutionType, UNKNOWN_INSTITUTION, infer_institution_type, normalize_institution,
};
