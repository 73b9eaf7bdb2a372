use super::{CrisisCategory, Mood};

const PANIC_WORDS: &[&str] = &[
    "panic",
    "can't breathe",
    "heart racing",
    "dying",
    "losing control",
    "terrified",
];

const STRESS_WORDS: &[&str] = &[
    "worried",
    "stressed",
    "anxious",
    "tense",
    "overthinking",
    "scared",
];

// Checked in order; the first category with a matching keyword wins.
const MEDICAL_KEYWORDS: &[(CrisisCategory, &[&str])] = &[
    (
        CrisisCategory::Cardiac,
        &["chest pain", "heart", "cardiac", "palpitation", "angina"],
    ),
    (
        CrisisCategory::Respiratory,
        &[
            "breathing",
            "breathe",
            "shortness of breath",
            "asthma",
            "choking",
        ],
    ),
    (
        CrisisCategory::Poisoning,
        &["poison", "overdose", "toxic", "ingested"],
    ),
    (
        CrisisCategory::Neurological,
        &[
            "headache",
            "stroke",
            "seizure",
            "fainting",
            "faint",
            "dizzy",
            "unconscious",
        ],
    ),
    (
        CrisisCategory::Trauma,
        &[
            "injury", "bleeding", "blood", "wound", "fracture", "broken", "cut",
        ],
    ),
    (
        CrisisCategory::Allergic,
        &["allergy", "allergic", "rash", "swelling", "anaphylaxis"],
    ),
    (
        CrisisCategory::Pain,
        &["severe pain", "excruciating", "unbearable pain"],
    ),
    (
        CrisisCategory::Fever,
        &["fever", "temperature", "hot", "chills"],
    ),
];

const FINANCIAL_KEYWORDS: &[(CrisisCategory, &[&str])] = &[
    (CrisisCategory::FraudShock, &["scam", "fraud", "hacked"]),
    (CrisisCategory::DebtShock, &["loan", "emi", "debt"]),
    (CrisisCategory::IncomeShock, &["salary", "not paid"]),
    (
        CrisisCategory::AssetShock,
        &["lost money", "crypto", "trading loss"],
    ),
    (CrisisCategory::IncomeShock, &["job lost", "laid off"]),
];

pub fn detect_mood(text: &str) -> Mood {
    let normalized = normalize(text);
    if contains_any(&normalized, PANIC_WORDS) {
        Mood::Panic
    } else if contains_any(&normalized, STRESS_WORDS) {
        Mood::Stress
    } else {
        Mood::Neutral
    }
}

pub fn detect_category(text: &str) -> CrisisCategory {
    let normalized = normalize(text);
    MEDICAL_KEYWORDS
        .iter()
        .chain(FINANCIAL_KEYWORDS.iter())
        .find(|(_, keywords)| contains_any(&normalized, keywords))
        .map(|(category, _)| *category)
        .unwrap_or(CrisisCategory::Unclassified)
}

/// Lowercases and pads every word with single spaces so keywords only match on
/// word boundaries ("emi" must not match "premium").
fn normalize(text: &str) -> String {
    let words = text
        .to_lowercase()
        .split(|ch: char| !(ch.is_alphanumeric() || ch == '\'' || ch == '\u{2019}'))
        .filter(|word| !word.is_empty())
        .map(|word| word.replace('\u{2019}', "'"))
        .collect::<Vec<_>>();
    format!(" {} ", words.join(" "))
}

fn contains_any(normalized: &str, keywords: &[&str]) -> bool {
    keywords
        .iter()
        .any(|keyword| normalized.contains(&format!(" {keyword} ")))
}
