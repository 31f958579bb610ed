use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// Placeholder for an absent institution string.
pub const UNKNOWN_INSTITUTION: &str = "Unknown Institution";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum InstitutionType {
    University,
    Company,
    Other,
    Unknown,
}

impl InstitutionType {
    /// Parses a type label from an institutions document. Unrecognized labels
    /// are `Unknown` so that inference can still fill them in.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "university" | "academic" | "academia" => InstitutionType::University,
            "company" | "industry" | "corporate" => InstitutionType::Company,
            "other" => InstitutionType::Other,
            _ => InstitutionType::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            InstitutionType::University => "University",
            InstitutionType::Company => "Company",
            InstitutionType::Other => "Other",
            InstitutionType::Unknown => "Unknown",
        }
    }
}

/// Common misspellings, replaced on word boundaries before rule matching.
static TYPOS: &[(&str, &str)] = &[
    ("Univeristy", "University"),
    ("Univeresity", "University"),
    ("Technolgy", "Technology"),
    ("Instiute", "Institute"),
    ("Institue", "Institute"),
    ("Sceince", "Science"),
    ("Schol", "School"),
    ("Guang Zhou", "Guangzhou"),
    ("Laboratpry", "Laboratory"),
    ("Loboratory", "Laboratory"),
];

/// Ordered (pattern, canonical) rules. The first match wins, so a campus or
/// joint-institute pattern must come before the bare institution it
/// contains. Short acronyms carry `\b` so they never match inside words.
static RULE_TABLE: &[(&str, &str)] = &[
    (r"Tsinghua-Berkeley", "Tsinghua University"),
    (r"Lawrence Berkeley", "Lawrence Berkeley National Laboratory"),
    (
        r"\bUC Berkeley\b|University of California.*Berkeley",
        "University of California, Berkeley",
    ),
    (
        r"(\bHKUST\b|Hong Kong University of Science and Technology).*(Guangzhou|\bGZ\b)",
        "Hong Kong University of Science and Technology (Guangzhou)",
    ),
    (
        r"\bHKUST\b|Hong Kong University of Science and Technology",
        "Hong Kong University of Science and Technology",
    ),
    (
        r"(\bCUHK\b|Chinese University of Hong Kong).*(Shenzhen|\bSZ\b)",
        "The Chinese University of Hong Kong, Shenzhen",
    ),
    (
        r"\bCUHK\b|Chinese University of Hong Kong",
        "The Chinese University of Hong Kong",
    ),
    (
        r"\bLMU\b|Ludwig[- ]Maximilian",
        "Ludwig Maximilian University of Munich",
    ),
    (
        r"\bTUM\b|Technische Universität München|Technical University of Munich|\bTU Munich\b",
        "Technical University of Munich",
    ),
    (
        r"\bKIT\b|Karlsruhe Institute of Technology",
        "Karlsruhe Institute of Technology",
    ),
    (
        r"(\bETH\b|Swiss Federal Institute of Technology).*Zurich",
        "ETH Zurich",
    ),
    (
        r"(\bEPFL\b|Swiss Federal Institute of Technology).*Lausanne|\bEPFL\b",
        "EPFL",
    ),
    (r"Sorbonne", "Sorbonne University"),
    (r"Imperial College", "Imperial College London"),
    (r"University College London", "University College London"),
    // United States
    (r"\b(CMU|Carnegie Mellon)\b", "Carnegie Mellon University"),
    (
        r"\b(MIT|Massachusetts Institute of Technology)\b",
        "Massachusetts Institute of Technology",
    ),
    (
        r"\bUIUC\b|University of Illinois.*Urbana.*Champaign",
        "University of Illinois Urbana-Champaign",
    ),
    (
        r"\bUCSD\b|University of California.*San Diego",
        "University of California, San Diego",
    ),
    (
        r"\bUCLA\b|University of California.*Los Angeles",
        "University of California, Los Angeles",
    ),
    (
        r"\bUSC\b|University of Southern California",
        "University of Southern California",
    ),
    (r"\bNYU\b|New York University", "New York University"),
    (
        r"\bGeorgia Tech\b|Georgia Institute of Technology",
        "Georgia Institute of Technology",
    ),
    (
        r"\bUW[- ]Madison\b|University of Wisconsin",
        "University of Wisconsin-Madison",
    ),
    (r"\bUW\b|University of Washington", "University of Washington"),
    (
        r"\bCaltech\b|California Institute of Technology",
        "California Institute of Technology",
    ),
    (
        r"\bUT Austin\b|University of Texas at Austin",
        "University of Texas at Austin",
    ),
    (r"\bUMich\b|University of Michigan", "University of Michigan"),
    (r"Johns Hopkins", "Johns Hopkins University"),
    (r"Stanford", "Stanford University"),
    (r"Princeton", "Princeton University"),
    (r"Harvard", "Harvard University"),
    (r"\bYale\b", "Yale University"),
    (r"Cornell", "Cornell University"),
    (r"Columbia University", "Columbia University"),
    // China
    (r"\b(Tsinghua|THU)\b", "Tsinghua University"),
    (r"\b(Peking University|PKU)\b", "Peking University"),
    (
        r"\bSJTU\b|Shanghai Jiao.*Tong",
        "Shanghai Jiao Tong University",
    ),
    (r"\bFudan\b", "Fudan University"),
    (r"Zhejiang University|\bZJU\b", "Zhejiang University"),
    (
        r"\bUSTC\b|University of Science and Technology of China",
        "University of Science and Technology of China",
    ),
    (r"Nanjing University|\bNJU\b", "Nanjing University"),
    (r"Sun Yat-sen|\bSYSU\b", "Sun Yat-sen University"),
    (
        r"Harbin Institute of Technology|\bHIT\b",
        "Harbin Institute of Technology",
    ),
    (
        r"Beihang|Beijing University of Aeronautics",
        "Beihang University",
    ),
    (
        r"\bUCAS\b|University of Chinese Academy of Sciences",
        "University of Chinese Academy of Sciences",
    ),
    (
        r"Chinese Academy of Sciences|\bCAS\b",
        "Chinese Academy of Sciences",
    ),
    // Rest of Asia
    (
        r"\bKAIST\b|Korea Advanced Institute",
        "Korea Advanced Institute of Science and Technology",
    ),
    (
        r"\bSNU\b|Seoul National University",
        "Seoul National University",
    ),
    (
        r"\bPOSTECH\b|Pohang University",
        "Pohang University of Science and Technology",
    ),
    (
        r"\bNUS\b|National University of Singapore",
        "National University of Singapore",
    ),
    (
        r"\bNTU\b|Nanyang Technological University",
        "Nanyang Technological University",
    ),
    (r"University of Tokyo", "The University of Tokyo"),
    // Industry
    (r"\b(Google|DeepMind)\b", "Google DeepMind"),
    (r"\b(Meta|Facebook)\b", "Meta"),
    (r"\b(Microsoft|Msft)\b", "Microsoft"),
    (r"\bNVIDIA\b", "NVIDIA"),
    (r"\b(ByteDance|TikTok)\b", "ByteDance"),
    (r"\bTencent\b", "Tencent"),
    (r"\bAlibaba\b", "Alibaba Group"),
    (r"\bBaidu\b", "Baidu"),
    (r"\bHuawei\b", "Huawei Technologies"),
    (r"\b(Amazon|AWS)\b", "Amazon"),
    (r"\bApple\b", "Apple"),
    (r"\bAdobe\b", "Adobe"),
    (r"\bSamsung\b", "Samsung"),
    (r"\bSony\b", "Sony"),
    (r"\bUber\b", "Uber"),
    (r"\bOpenAI\b", "OpenAI"),
    (r"\bSalesforce\b", "Salesforce"),
    (r"\bIBM\b", "IBM"),
    (r"\bIntel\b", "Intel"),
    (r"\bQualcomm\b", "Qualcomm"),
];

/// A compiled (predicate, canonical name) rule.
pub struct Rule {
    pattern: Regex,
    pub canonical: &'static str,
}

impl Rule {
    pub fn matches(&self, name: &str) -> bool {
        self.pattern.is_match(name)
    }
}

pub static RULES: LazyLock<Vec<Rule>> = LazyLock::new(|| {
    RULE_TABLE
        .iter()
        .map(|(pattern, canonical)| Rule {
            pattern: Regex::new(&format!("(?i){pattern}"))
                .expect("institution rule table must compile"),
            canonical,
        })
        .collect()
});

static TYPO_RULES: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    TYPOS
        .iter()
        .map(|(typo, fix)| {
            let pattern = format!(r"\b{}\b", regex::escape(typo));
            (
                Regex::new(&pattern).expect("typo table must compile"),
                *fix,
            )
        })
        .collect()
});

static INSTITUTIONAL_SEGMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)University|College|Institute|Lab|Inc|Corp")
        .expect("segment keyword pattern must compile")
});

/// Cleans whitespace and ampersands, then applies the typo table.
fn preprocess(raw: &str) -> String {
    let mut cleaned = raw
        .replace('&', " and ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");

    for (typo, fix) in TYPO_RULES.iter() {
        if typo.is_match(&cleaned) {
            cleaned = typo.replace_all(&cleaned, *fix).into_owned();
        }
    }
    cleaned
}

/// Maps a raw affiliation string to its canonical institution name.
///
/// Never returns an empty string. Idempotent: every rule's canonical name is
/// itself matched by that rule, and the comma fallback only ever returns
/// comma-free text.
pub fn normalize_institution(raw: &str) -> String {
    let cleaned = preprocess(raw);
    if cleaned.is_empty() {
        return UNKNOWN_INSTITUTION.to_string();
    }

    if let Some(rule) = RULES.iter().find(|rule| rule.matches(&cleaned)) {
        return rule.canonical.to_string();
    }

    if !cleaned.contains(',') {
        return cleaned;
    }

    let segments: Vec<&str> = cleaned
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();

    segments
        .iter()
        .rev()
        .find(|s| INSTITUTIONAL_SEGMENT.is_match(s))
        .or_else(|| segments.last())
        .map(|s| s.to_string())
        .unwrap_or_else(|| UNKNOWN_INSTITUTION.to_string())
}

static UNIVERSITY_KEYWORDS: &[&str] = &[
    "university",
    "universität",
    "universite",
    "université",
    "universidad",
    "universiteit",
    "universita",
    "tech",
    "technology",
    "technological",
    "polytechnic",
    "politecnico",
    "college",
    "institute",
    "inst",
    "école",
    "ecole",
    "schule",
    "school",
    "academy",
    "campus",
    "faculty",
    "eth zurich",
    "epfl",
    "lmu",
    "technion",
    "大学",
    "学院",
];

static COMPANY_KEYWORDS: &[&str] = &[
    "inc",
    "corp",
    "corporation",
    "co",
    "ltd",
    "llc",
    "gmbh",
    "company",
    "technologies",
    "有限责任",
    "公司",
    "google",
    "deepmind",
    "meta",
    "facebook",
    "microsoft",
    "nvidia",
    "bytedance",
    "tiktok",
    "tencent",
    "kuaishou",
    "alibaba",
    "baidu",
    "huawei",
    "amazon",
    "aws",
    "apple",
    "adobe",
    "samsung",
    "sony",
    "uber",
    "openai",
    "salesforce",
    "ibm",
    "intel",
    "qualcomm",
    "tesla",
    "telecom",
];

fn is_cjk(c: char) -> bool {
    ('\u{4E00}'..='\u{9FFF}').contains(&c)
}

/// Keyword containment. Alphabetic keywords must sit on word boundaries so
/// that "intel" does not match "intelligent"; CJK keywords match anywhere.
fn contains_keyword(haystack: &str, keyword: &str) -> bool {
    if keyword.chars().any(is_cjk) {
        return haystack.contains(keyword);
    }

    haystack.match_indices(keyword).any(|(start, _)| {
        let end = start + keyword.len();
        let before = haystack[..start].chars().next_back();
        let after = haystack[end..].chars().next();
        !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
    })
}

/// Classifies an institution by counting university and company keyword
/// hits. Ties and names with no hits are `Other`.
pub fn infer_institution_type(name: &str) -> InstitutionType {
    let lower = name.to_lowercase();
    let university = UNIVERSITY_KEYWORDS
        .iter()
        .filter(|kw| contains_keyword(&lower, kw))
        .count();
    let company = COMPANY_KEYWORDS
        .iter()
        .filter(|kw| contains_keyword(&lower, kw))
        .count();

    match university.cmp(&company) {
        std::cmp::Ordering::Greater => InstitutionType::University,
        std::cmp::Ordering::Less => InstitutionType::Company,
        std::cmp::Ordering::Equal => InstitutionType::Other,
    }
}
