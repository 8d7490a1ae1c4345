//! Ordered pattern rules for pill name, manufacturer and dosage.
//!
//! Each list is tried top to bottom and the first rule with any match wins.
//! Curated product and company names come first; the shape-based fallbacks
//! (katakana + 錠/カプセル/散, latin + strength) come last so they only fire
//! when nothing specific was recognised.

use std::sync::LazyLock;

use regex::Regex;

/// How a rule picks one candidate out of all its matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    /// Longest match by character count; ties go to the earliest.
    Longest,
    /// Earliest match.
    First,
}

/// A compiled pattern with its selection policy.
pub struct PatternRule {
    pub name: &'static str,
    regex: Regex,
    selection: Selection,
}

impl PatternRule {
    /// The candidate this rule yields for `text`, if it matches at all.
    pub fn find(&self, text: &str) -> Option<String> {
        let mut matches = self.regex.find_iter(text).map(|m| m.as_str());
        match self.selection {
            Selection::First => matches.next().map(String::from),
            Selection::Longest => {
                let mut best: Option<(&str, usize)> = None;
                for candidate in matches {
                    let len = candidate.chars().count();
                    if best.map_or(true, |(_, best_len)| len > best_len) {
                        best = Some((candidate, len));
                    }
                }
                best.map(|(s, _)| s.to_string())
            }
        }
    }
}

/// Candidate from the first rule in `rules` that matches `text`.
pub fn first_match(rules: &[PatternRule], text: &str) -> Option<String> {
    rules.iter().find_map(|rule| {
        let found = rule.find(text)?;
        tracing::trace!(rule = rule.name, candidate = %found, "Pattern rule matched");
        Some(found)
    })
}

/// Product names that earn the well-known bonus when contained in a pill name.
pub const KNOWN_PRODUCT_NAMES: &[&str] = &[
    "ロキソニン",
    "カロナール",
    "ガスター",
    "ムコダイン",
    "アレグラ",
    "バファリン",
    "イブ",
    "正露丸",
    "パブロン",
    "ビオフェルミン",
];

pub fn is_known_product(pill_name: &str) -> bool {
    KNOWN_PRODUCT_NAMES.iter().any(|known| pill_name.contains(known))
}

/// Pill name rules: curated products, then generic shapes.
pub static PILL_NAME_RULES: LazyLock<Vec<PatternRule>> = LazyLock::new(|| {
    vec![
        rule("loxonin", r"(?i)ロキソニン錠?[0-9]*(?:mg)?", Selection::Longest),
        rule("calonal", r"(?i)カロナール錠?[0-9]*", Selection::Longest),
        rule("gaster", r"(?i)ガスター[0-9]*", Selection::Longest),
        rule("mucodyne", r"(?i)ムコダイン錠?[0-9]*(?:mg)?", Selection::Longest),
        rule("allegra", r"(?i)アレグラ錠?[0-9]*(?:mg)?", Selection::Longest),
        rule("bufferin", r"(?i)バファリン[AＡ]?", Selection::Longest),
        rule("eve", r"(?i)イブ[AＡ]?錠?", Selection::Longest),
        rule("seirogan", r"正露丸", Selection::Longest),
        rule("pabron", r"(?i)パブロン[A-Za-z0-9_]*", Selection::Longest),
        rule("biofermin", r"(?i)ビオフェルミン[A-Za-z0-9_]*", Selection::Longest),
        // Generic shapes
        rule("katakana_tablet", r"[ァ-ヴー]+錠[0-9]*(?:mg)?", Selection::Longest),
        rule("katakana_capsule", r"[ァ-ヴー]+カプセル", Selection::Longest),
        rule("katakana_powder", r"[ァ-ヴー]+散", Selection::Longest),
        // Letters must run into an `m`, so a bare `mg` or `g` unit never counts as a name
        rule("latin_strength", r"(?i)[A-Za-z]+錠?[0-9]*mg?", Selection::Longest),
    ]
});

/// Manufacturer rules: known companies, then 〜製薬 / 〜ファーマ.
pub static MANUFACTURER_RULES: LazyLock<Vec<PatternRule>> = LazyLock::new(|| {
    vec![
        rule("daiichi_sankyo", r"(?i)第一三共[A-Za-z0-9_]*", Selection::First),
        rule("showa_yakuhin", r"(?i)昭和薬品[A-Za-z0-9_]*", Selection::First),
        rule("kyorin", r"杏林製薬", Selection::First),
        rule("sanofi", r"サノフィ", Selection::First),
        rule("lion", r"ライオン", Selection::First),
        rule("ss_pharma", r"エスエス製薬", Selection::First),
        rule("taiko", r"大幸薬品", Selection::First),
        rule("taisho", r"大正製薬", Selection::First),
        rule("biofermin_pharma", r"ビオフェルミン製薬", Selection::First),
        rule("katakana_seiyaku", r"[ァ-ヴー]*製薬", Selection::First),
        rule("katakana_pharma", r"[ァ-ヴー]*ファーマ", Selection::First),
    ]
});

/// Dosage rules: mg, g, tablet count, capsule count.
pub static DOSAGE_RULES: LazyLock<Vec<PatternRule>> = LazyLock::new(|| {
    vec![
        rule("milligrams", r"(?i)[0-9]+\.?[0-9]*mg", Selection::First),
        rule("grams", r"(?i)[0-9]+\.?[0-9]*g", Selection::First),
        rule("tablets", r"[0-9]+錠", Selection::First),
        rule("capsules", r"[0-9]+カプセル", Selection::First),
    ]
});

fn rule(name: &'static str, pattern: &str, selection: Selection) -> PatternRule {
    PatternRule {
        name,
        regex: Regex::new(pattern).expect("Invalid pill pattern"),
        selection,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_rule_lists_compile() {
        assert_eq!(PILL_NAME_RULES.len(), 14);
        assert_eq!(MANUFACTURER_RULES.len(), 11);
        assert_eq!(DOSAGE_RULES.len(), 4);
    }

    #[test]
    fn curated_rules_precede_generic_shapes() {
        let names: Vec<_> = PILL_NAME_RULES.iter().map(|r| r.name).collect();
        let first_generic = names.iter().position(|n| *n == "katakana_tablet").unwrap();
        assert_eq!(first_generic, 10);
        assert_eq!(names.last(), Some(&"latin_strength"));
    }

    // ── selection ──

    #[test]
    fn longest_selection_prefers_more_detail() {
        let found = first_match(&PILL_NAME_RULES, "ロキソニン ロキソニン錠60mg");
        assert_eq!(found.as_deref(), Some("ロキソニン錠60mg"));
    }

    #[test]
    fn longest_selection_ties_go_to_first_occurrence() {
        let found = first_match(&PILL_NAME_RULES, "ガスター10 ガスター20");
        assert_eq!(found.as_deref(), Some("ガスター10"));
    }

    #[test]
    fn first_selection_takes_earliest() {
        let found = first_match(&DOSAGE_RULES, "1回 2錠 60mg 100mg");
        // mg rule is listed first, so it wins over the earlier 錠 match
        assert_eq!(found.as_deref(), Some("60mg"));
    }

    #[test]
    fn first_rule_with_any_match_wins_over_more_matches_later() {
        // One curated hit beats several generic katakana+錠 hits
        let text = "ムコダインテスト錠 カルボシステイン錠 ガスター";
        assert_eq!(first_match(&PILL_NAME_RULES, text).as_deref(), Some("ガスター"));
    }

    // ── pill names ──

    #[test]
    fn curated_product_names() {
        for (text, expected) in [
            ("カロナール錠200 あゆみ製薬", "カロナール錠200"),
            ("アレグラ錠60mg", "アレグラ錠60mg"),
            ("バファリンＡ 20錠", "バファリンＡ"),
            ("イブA錠 12錠", "イブA錠"),
            ("正露丸 大幸薬品", "正露丸"),
            ("パブロンGold 微粒", "パブロンGold"),
            ("新ビオフェルミンS錠", "ビオフェルミンS"),
        ] {
            assert_eq!(first_match(&PILL_NAME_RULES, text).as_deref(), Some(expected), "{text}");
        }
    }

    #[test]
    fn generic_katakana_shapes() {
        assert_eq!(
            first_match(&PILL_NAME_RULES, "アムロジピン錠5mg").as_deref(),
            Some("アムロジピン錠5mg")
        );
        assert_eq!(
            first_match(&PILL_NAME_RULES, "タミフルカプセル75").as_deref(),
            Some("タミフルカプセル")
        );
        assert_eq!(
            first_match(&PILL_NAME_RULES, "ツムラ葛根湯エキス顆粒 センナ散").as_deref(),
            Some("センナ散")
        );
    }

    #[test]
    fn latin_fallback_is_case_insensitive() {
        assert_eq!(
            first_match(&PILL_NAME_RULES, "zyrtec10MG 1日1回").as_deref(),
            Some("zyrtec10MG")
        );
    }

    #[test]
    fn bare_units_are_not_pill_names() {
        assert_eq!(first_match(&PILL_NAME_RULES, "1日3回 5mg"), None);
        assert_eq!(first_match(&PILL_NAME_RULES, "葛根湯エキス 2.5g"), None);
        assert_eq!(first_match(&PILL_NAME_RULES, "ZYRTEC 10mg"), None);
    }

    #[test]
    fn digits_are_ascii_only() {
        assert_eq!(first_match(&DOSAGE_RULES, "６０mg"), None);
        assert_eq!(first_match(&DOSAGE_RULES, "６０mg 60mg").as_deref(), Some("60mg"));
        assert_eq!(
            first_match(&PILL_NAME_RULES, "ガスター１０").as_deref(),
            Some("ガスター")
        );
    }

    #[test]
    fn no_pill_name_in_pure_kanji_text() {
        assert_eq!(first_match(&PILL_NAME_RULES, "解熱鎮痛消炎剤 一日三回"), None);
    }

    // ── manufacturers ──

    #[test]
    fn known_manufacturers() {
        for (text, expected) in [
            ("ロキソニン 第一三共", "第一三共"),
            ("杏林製薬株式会社", "杏林製薬"),
            ("アレグラ サノフィ", "サノフィ"),
            ("エスエス製薬 イブ", "エスエス製薬"),
            ("正露丸 大幸薬品", "大幸薬品"),
            ("パブロン 大正製薬", "大正製薬"),
        ] {
            assert_eq!(first_match(&MANUFACTURER_RULES, text).as_deref(), Some(expected), "{text}");
        }
    }

    #[test]
    fn generic_manufacturer_shapes() {
        assert_eq!(
            first_match(&MANUFACTURER_RULES, "ツムラ製薬").as_deref(),
            Some("ツムラ製薬")
        );
        assert_eq!(
            first_match(&MANUFACTURER_RULES, "サワイファーマ").as_deref(),
            Some("サワイファーマ")
        );
    }

    // ── dosages ──

    #[test]
    fn dosage_units() {
        assert_eq!(first_match(&DOSAGE_RULES, "0.5mg").as_deref(), Some("0.5mg"));
        assert_eq!(first_match(&DOSAGE_RULES, "1.2g 分包").as_deref(), Some("1.2g"));
        assert_eq!(first_match(&DOSAGE_RULES, "12錠入").as_deref(), Some("12錠"));
        assert_eq!(first_match(&DOSAGE_RULES, "30カプセル").as_deref(), Some("30カプセル"));
        assert_eq!(first_match(&DOSAGE_RULES, "60MG").as_deref(), Some("60MG"));
        assert_eq!(first_match(&DOSAGE_RULES, "用法用量"), None);
    }

    // ── known products ──

    #[test]
    fn known_product_is_substring_test() {
        assert!(is_known_product("ロキソニン錠60mg"));
        assert!(is_known_product("新ビオフェルミンS"));
        assert!(!is_known_product("アムロジピン錠5mg"));
    }
}
