use lifeline::router::{
    CrisisCategory, CrisisDomain, Mood, RiskTier, detect_category, detect_mood,
    mentions_self_harm, route,
};

#[test]
fn given_kill_myself_when_routed_then_tier_is_extreme_for_every_mood_and_category() {
    let categories = [
        CrisisCategory::FraudShock,
        CrisisCategory::ExpenseShock,
        CrisisCategory::Cardiac,
        CrisisCategory::Fever,
        CrisisCategory::Unclassified,
    ];
    let moods = [
        None,
        Some(Mood::Calm),
        Some(Mood::Neutral),
        Some(Mood::Stress),
        Some(Mood::Panic),
    ];

    for category in categories {
        for mood in moods {
            assert_eq!(
                route("I lost everything and I want to kill myself", mood, category),
                RiskTier::Extreme,
                "category={category:?} mood={mood:?}"
            );
        }
    }
}

#[test]
fn given_chest_pain_with_panic_when_routed_then_tier_is_high_not_extreme() {
    let text = "My father is having chest pain and sweating heavily";
    assert_eq!(detect_category(text), CrisisCategory::Cardiac);
    assert_eq!(route(text, Some(Mood::Panic), CrisisCategory::Cardiac), RiskTier::High);
}

#[test]
fn given_no_panic_when_routed_then_score_alone_decides_medium_or_low() {
    assert_eq!(
        route("", Some(Mood::Stress), CrisisCategory::FraudShock),
        RiskTier::Medium
    );
    assert_eq!(route("", None, CrisisCategory::Allergic), RiskTier::Medium);
    assert_eq!(route("", Some(Mood::Calm), CrisisCategory::Pain), RiskTier::Low);
    assert_eq!(route("", None, CrisisCategory::Unclassified), RiskTier::Low);
}

#[test]
fn self_harm_phrases_match_case_insensitively() {
    assert!(mentions_self_harm("Thinking about SUICIDE"));
    assert!(mentions_self_harm("sometimes I want to die"));
    assert!(!mentions_self_harm("my phone battery died"));
}

#[test]
fn mood_detection_prefers_panic_over_stress() {
    assert_eq!(detect_mood("I'm worried and I think I'm dying"), Mood::Panic);
    assert_eq!(detect_mood("I am so stressed about rent"), Mood::Stress);
    assert_eq!(detect_mood("Requesting some general advice"), Mood::Neutral);
}

#[test]
fn category_detection_covers_both_domains() {
    assert_eq!(
        detect_category("Someone hacked my account and moved money"),
        CrisisCategory::FraudShock
    );
    assert_eq!(
        detect_category("My salary has not been paid for two months"),
        CrisisCategory::IncomeShock
    );
    assert_eq!(
        detect_category("My child swallowed something toxic"),
        CrisisCategory::Poisoning
    );
    assert_eq!(
        detect_category("I can't stop thinking about my insurance premium"),
        CrisisCategory::Unclassified
    );
    assert_eq!(
        detect_category("Someone hacked my account").domain(),
        CrisisDomain::Financial
    );
}

#[test]
fn wire_names_accept_short_financial_aliases() {
    let category: CrisisCategory = serde_json::from_str("\"fraud\"").expect("alias should parse");
    assert_eq!(category, CrisisCategory::FraudShock);
    let category: CrisisCategory =
        serde_json::from_str("\"income_shock\"").expect("full name should parse");
    assert_eq!(category, CrisisCategory::IncomeShock);
}
