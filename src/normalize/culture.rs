use serde::{Deserialize, Serialize};

/// Fixed, overlapping country groupings used for cross-cultural comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CulturalCluster {
    #[serde(rename = "East_Asian")]
    EastAsian,
    #[serde(rename = "Western")]
    Western,
    #[serde(rename = "South_Asian")]
    SouthAsian,
    #[serde(rename = "European")]
    European,
    #[serde(rename = "Middle_Eastern")]
    MiddleEastern,
}

/// Cluster membership in table order. The first cluster listing a country is
/// that country's primary cluster.
static CLUSTERS: &[(CulturalCluster, &[&str])] = &[
    (
        CulturalCluster::EastAsian,
        &["China", "South Korea", "Japan", "Taiwan", "Singapore"],
    ),
    (
        CulturalCluster::Western,
        &[
            "United States",
            "Canada",
            "United Kingdom",
            "Australia",
            "Germany",
            "France",
            "Netherlands",
        ],
    ),
    (
        CulturalCluster::SouthAsian,
        &["India", "Pakistan", "Bangladesh"],
    ),
    (
        CulturalCluster::European,
        &[
            "Germany",
            "France",
            "Netherlands",
            "United Kingdom",
            "Italy",
            "Spain",
        ],
    ),
    (
        CulturalCluster::MiddleEastern,
        &["Iran", "Israel", "Turkey"],
    ),
];

impl CulturalCluster {
    pub const ALL: [CulturalCluster; 5] = [
        CulturalCluster::EastAsian,
        CulturalCluster::Western,
        CulturalCluster::SouthAsian,
        CulturalCluster::European,
        CulturalCluster::MiddleEastern,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CulturalCluster::EastAsian => "East_Asian",
            CulturalCluster::Western => "Western",
            CulturalCluster::SouthAsian => "South_Asian",
            CulturalCluster::European => "European",
            CulturalCluster::MiddleEastern => "Middle_Eastern",
        }
    }

    /// Canonical country names belonging to this cluster.
    pub fn members(&self) -> &'static [&'static str] {
        CLUSTERS
            .iter()
            .find(|(cluster, _)| cluster == self)
            .map(|(_, members)| *members)
            .unwrap_or(&[])
    }
}

/// Every cluster containing `country`, in table order. Countries outside the
/// table belong to no cluster.
pub fn clusters_of(country: &str) -> impl Iterator<Item = CulturalCluster> + '_ {
    CLUSTERS
        .iter()
        .filter(move |(_, members)| members.contains(&country))
        .map(|(cluster, _)| *cluster)
}

pub fn primary_cluster(country: &str) -> Option<CulturalCluster> {
    clusters_of(country).next()
}
