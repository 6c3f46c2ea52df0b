//! Recipe summaries and the values derived from them.
//!
//! Difficulty, XP reward and unlock level are all pure functions of the
//! preparation time reported by the recipe provider.
use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_RATING, DESCRIPTION_MAX_CHARS, EASY_MAX_MINUTES, FALLBACK_CUISINE, HARD_MAX_MINUTES,
    MEDIUM_MAX_MINUTES, SCORE_PER_RATING_POINT, XP_PER_PREP_MINUTE,
};
use crate::numbers::round_to_tenth;
use crate::profile::XpAmount;
use crate::store::lenient;

static HTML_TAG: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"<[^>]+>").ok());

const BREAKFAST_DISH_TYPES: [&str; 3] = ["breakfast", "brunch", "morning meal"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
    Advanced,
}

impl Difficulty {
    #[must_use]
    pub const fn from_minutes(minutes: u32) -> Self {
        if minutes < EASY_MAX_MINUTES {
            Self::Easy
        } else if minutes < MEDIUM_MAX_MINUTES {
            Self::Medium
        } else if minutes < HARD_MAX_MINUTES {
            Self::Hard
        } else {
            Self::Advanced
        }
    }

    /// Lowest profile level allowed to cook this tier.
    #[must_use]
    pub const fn unlock_level(self) -> u32 {
        match self {
            Self::Easy => 1,
            Self::Medium => 2,
            Self::Hard => 3,
            Self::Advanced => 4,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Easy => "Easy",
            Self::Medium => "Medium",
            Self::Hard => "Hard",
            Self::Advanced => "Advanced",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Summary fields returned by the recipe search endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeSummary {
    pub id: u64,
    #[serde(default)]
    pub title: String,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub image: Option<String>,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub ready_in_minutes: u32,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub cuisines: Vec<String>,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub dish_types: Vec<String>,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub spoonacular_score: Option<f64>,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub summary: Option<String>,
}

impl RecipeSummary {
    #[must_use]
    pub const fn difficulty(&self) -> Difficulty {
        Difficulty::from_minutes(self.ready_in_minutes)
    }

    #[must_use]
    pub fn xp_reward(&self) -> XpAmount {
        XpAmount::new(u64::from(self.ready_in_minutes).saturating_mul(XP_PER_PREP_MINUTE))
    }

    /// Score on a five-point scale, one decimal.
    #[must_use]
    pub fn rating(&self) -> f64 {
        match self.spoonacular_score {
            Some(score) if score > 0.0 && score.is_finite() => {
                round_to_tenth(score / SCORE_PER_RATING_POINT)
            }
            _ => DEFAULT_RATING,
        }
    }

    /// Summary with markup removed, cut to a card-sized teaser.
    #[must_use]
    pub fn description(&self) -> String {
        let Some(summary) = self.summary.as_deref() else {
            return String::new();
        };
        let plain = HTML_TAG
            .as_ref()
            .map_or(std::borrow::Cow::Borrowed(summary), |re| re.replace_all(summary, ""));
        let mut teaser: String = plain.chars().take(DESCRIPTION_MAX_CHARS).collect();
        teaser.push_str("...");
        teaser
    }

    #[must_use]
    pub fn primary_cuisine(&self) -> &str {
        self.cuisines
            .first()
            .map(String::as_str)
            .filter(|c| !c.trim().is_empty())
            .unwrap_or(FALLBACK_CUISINE)
    }

    #[must_use]
    pub fn is_breakfast(&self) -> bool {
        self.dish_types.iter().any(|dish| {
            BREAKFAST_DISH_TYPES
                .iter()
                .any(|kind| dish.eq_ignore_ascii_case(kind))
        })
    }

    #[must_use]
    pub const fn is_locked_for(&self, level: u32) -> bool {
        level < self.difficulty().unlock_level()
    }
}

/// A cuisine filter offered by the recipe browser: `(query id, label)`.
pub const CUISINE_FILTERS: &[(&str, &str)] = &[
    ("african", "African"),
    ("asian", "Asian"),
    ("american", "American"),
    ("british", "British"),
    ("cajun", "Cajun"),
    ("chinese", "Chinese"),
    ("caribbean", "Caribbean"),
    ("eastern_european", "Eastern European"),
    ("european", "European"),
    ("french", "French"),
    ("german", "German"),
    ("greek", "Greek"),
    ("indian", "Indian"),
    ("irish", "Irish"),
    ("italian", "Italian"),
    ("japanese", "Japanese"),
    ("jewish", "Jewish"),
    ("korean", "Korean"),
    ("latin_american", "Latin American"),
    ("mediterranean", "Mediterranean"),
    ("mexican", "Mexican"),
    ("middle_eastern", "Middle Eastern"),
    ("nordic", "Nordic"),
    ("southern", "Southern"),
    ("spanish", "Spanish"),
    ("thai", "Thai"),
    ("vietnamese", "Vietnamese"),
];

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(minutes: u32) -> RecipeSummary {
        RecipeSummary {
            id: 1,
            title: "Test".into(),
            ready_in_minutes: minutes,
            ..RecipeSummary::default()
        }
    }

    #[test]
    fn difficulty_bands() {
        assert_eq!(Difficulty::from_minutes(24), Difficulty::Easy);
        assert_eq!(Difficulty::from_minutes(25), Difficulty::Medium);
        assert_eq!(Difficulty::from_minutes(44), Difficulty::Medium);
        assert_eq!(Difficulty::from_minutes(45), Difficulty::Hard);
        assert_eq!(Difficulty::from_minutes(89), Difficulty::Hard);
        assert_eq!(Difficulty::from_minutes(90), Difficulty::Advanced);
    }

    #[test]
    fn xp_and_locking_follow_prep_time() {
        let recipe = summary(45);
        assert_eq!(recipe.xp_reward(), XpAmount::new(90));
        assert!(recipe.is_locked_for(2));
        assert!(!recipe.is_locked_for(3));
        assert!(!summary(10).is_locked_for(1));
    }

    #[test]
    fn rating_defaults_and_rounds() {
        let mut recipe = summary(10);
        assert!((recipe.rating() - 4.5).abs() < f64::EPSILON);
        recipe.spoonacular_score = Some(87.3);
        assert!((recipe.rating() - 4.4).abs() < f64::EPSILON);
    }

    #[test]
    fn description_strips_markup_and_truncates() {
        let mut recipe = summary(10);
        assert_eq!(recipe.description(), "");
        recipe.summary = Some("<b>Quick</b> and <a href=\"x\">easy</a>".into());
        assert_eq!(recipe.description(), "Quick and easy...");
        recipe.summary = Some("é".repeat(200));
        assert_eq!(recipe.description().chars().count(), 123);
    }

    #[test]
    fn cuisine_and_breakfast_detection() {
        let mut recipe = summary(10);
        assert_eq!(recipe.primary_cuisine(), "Global");
        recipe.cuisines = vec!["Thai".into(), "Asian".into()];
        assert_eq!(recipe.primary_cuisine(), "Thai");
        assert!(!recipe.is_breakfast());
        recipe.dish_types = vec!["lunch".into(), "Breakfast".into()];
        assert!(recipe.is_breakfast());
    }

    #[test]
    fn provider_payload_decodes_leniently() {
        let recipe: RecipeSummary = serde_json::from_str(
            r#"{"id":716429,"title":"Pasta","readyInMinutes":"soon","cuisines":null,"spoonacularScore":92.0}"#,
        )
        .unwrap();
        assert_eq!(recipe.ready_in_minutes, 0);
        assert!(recipe.cuisines.is_empty());
        assert!((recipe.rating() - 4.6).abs() < f64::EPSILON);
    }
}
