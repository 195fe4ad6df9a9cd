use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// UI language. All curated text carries an English and an Arabic variant;
/// the core hands the presentation layer whichever it asks for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum Language {
    #[default]
    #[serde(rename = "EN")]
    En,
    #[serde(rename = "AR")]
    Ar,
}

impl Language {
    /// Pick the variant for this language from a bilingual field pair.
    pub fn pick<'a>(&self, en: &'a str, ar: &'a str) -> &'a str {
        match self {
            Language::En => en,
            Language::Ar => ar,
        }
    }

    pub fn is_rtl(&self) -> bool {
        matches!(self, Language::Ar)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pick_by_language() {
        assert_eq!(Language::En.pick("Clear", "واضح"), "Clear");
        assert_eq!(Language::Ar.pick("Clear", "واضح"), "واضح");
    }

    #[test]
    fn test_rtl() {
        assert!(!Language::En.is_rtl());
        assert!(Language::Ar.is_rtl());
    }
}
