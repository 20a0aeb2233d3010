use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    En,
    De,
    Fr,
    Es,
    Hi,
}

impl Language {
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "de" => Self::De,
            "fr" => Self::Fr,
            "es" => Self::Es,
            "hi" => Self::Hi,
            _ => Self::En,
        }
    }
}

/// Display strings keyed by language, falling back to English when a
/// translation is missing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LocalizedText(pub BTreeMap<Language, String>);

impl LocalizedText {
    pub fn get(&self, lang: Language) -> &str {
        self.0
            .get(&lang)
            .or_else(|| self.0.get(&Language::En))
            .map(String::as_str)
            .unwrap_or_default()
    }
}

fn text(en: &str, de: &str) -> LocalizedText {
    let mut map = BTreeMap::new();
    map.insert(Language::En, en.to_string());
    map.insert(Language::De, de.to_string());
    LocalizedText(map)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BadgeDefinition {
    pub id: String,
    pub name: LocalizedText,
    pub description: LocalizedText,
    pub icon: String,
    pub category: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RequirementType {
    Modules,
    Streak,
    Points,
    Quizzes,
    PerfectScores,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Requirement {
    #[serde(rename = "type")]
    pub requirement_type: RequirementType,
    pub count: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reward {
    pub points: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub badge_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Achievement {
    pub id: String,
    pub title: LocalizedText,
    pub description: LocalizedText,
    pub icon: String,
    pub requirement: Requirement,
    pub reward: Reward,
}

/// Immutable achievement/badge configuration. Badges are resolved by stable
/// string id, never by position, so catalog entries can be reordered freely.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AchievementCatalog {
    badges: Vec<BadgeDefinition>,
    achievements: Vec<Achievement>,
    #[serde(skip)]
    badge_index: HashMap<String, usize>,
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("failed to read catalog file: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid catalog JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("achievement {achievement} rewards unknown badge {badge}")]
    UnknownBadge { achievement: String, badge: String },
    #[error("duplicate badge id {0}")]
    DuplicateBadge(String),
}

impl AchievementCatalog {
    pub fn new(
        badges: Vec<BadgeDefinition>,
        achievements: Vec<Achievement>,
    ) -> Result<Self, CatalogError> {
        let mut badge_index = HashMap::with_capacity(badges.len());
        for (i, badge) in badges.iter().enumerate() {
            if badge_index.insert(badge.id.clone(), i).is_some() {
                return Err(CatalogError::DuplicateBadge(badge.id.clone()));
            }
        }
        for achievement in &achievements {
            if let Some(badge_id) = &achievement.reward.badge_id {
                if !badge_index.contains_key(badge_id) {
                    return Err(CatalogError::UnknownBadge {
                        achievement: achievement.id.clone(),
                        badge: badge_id.clone(),
                    });
                }
            }
        }
        Ok(Self {
            badges,
            achievements,
            badge_index,
        })
    }

    pub fn from_json_file(path: &str) -> Result<Self, CatalogError> {
        let raw = std::fs::read_to_string(path)?;
        let parsed: CatalogFile = serde_json::from_str(&raw)?;
        Self::new(parsed.badges, parsed.achievements)
    }

    pub fn badge(&self, id: &str) -> Option<&BadgeDefinition> {
        self.badge_index.get(id).map(|&i| &self.badges[i])
    }

    pub fn badges(&self) -> &[BadgeDefinition] {
        &self.badges
    }

    /// Achievements in fixed catalog order; evaluation order follows this.
    pub fn achievements(&self) -> &[Achievement] {
        &self.achievements
    }
}

#[derive(Deserialize)]
struct CatalogFile {
    badges: Vec<BadgeDefinition>,
    achievements: Vec<Achievement>,
}

impl Default for AchievementCatalog {
    fn default() -> Self {
        let badges = vec![
            BadgeDefinition {
                id: "first-steps".to_string(),
                name: text("First Steps", "Erste Schritte"),
                description: text(
                    "Complete your first module",
                    "Schließe dein erstes Modul ab",
                ),
                icon: "👣".to_string(),
                category: "beginner".to_string(),
            },
            BadgeDefinition {
                id: "week-warrior".to_string(),
                name: text("Week Warrior", "Wochen-Krieger"),
                description: text("7-day learning streak", "7-Tage-Lernsträhne"),
                icon: "🔥".to_string(),
                category: "streak".to_string(),
            },
            BadgeDefinition {
                id: "perfect-score".to_string(),
                name: text("Perfect Score", "Perfekte Punktzahl"),
                description: text("Get 100% on a quiz", "Erreiche 100% in einem Quiz"),
                icon: "💯".to_string(),
                category: "achievement".to_string(),
            },
            BadgeDefinition {
                id: "module-master".to_string(),
                name: text("Module Master", "Modul-Meister"),
                description: text("Complete 10 modules", "Schließe 10 Module ab"),
                icon: "🏆".to_string(),
                category: "achievement".to_string(),
            },
            BadgeDefinition {
                id: "language-lover".to_string(),
                name: text("Language Lover", "Sprach-Liebhaber"),
                description: text("Complete 25 modules", "Schließe 25 Module ab"),
                icon: "❤️".to_string(),
                category: "achievement".to_string(),
            },
            BadgeDefinition {
                id: "polyglot".to_string(),
                name: text("Polyglot", "Polyglott"),
                description: text("Complete 50 modules", "Schließe 50 Module ab"),
                icon: "🌟".to_string(),
                category: "achievement".to_string(),
            },
        ];

        let achievements = vec![
            Achievement {
                id: "achievement-first-module".to_string(),
                title: text("Getting Started", "Erste Schritte"),
                description: text(
                    "Complete your first learning module",
                    "Schließe dein erstes Lernmodul ab",
                ),
                icon: "🎯".to_string(),
                requirement: Requirement {
                    requirement_type: RequirementType::Modules,
                    count: 1,
                },
                reward: Reward {
                    points: 10,
                    badge_id: Some("first-steps".to_string()),
                },
            },
            Achievement {
                id: "achievement-week-streak".to_string(),
                title: text("Consistent Learner", "Beständiger Lerner"),
                description: text(
                    "Learn for 7 days in a row",
                    "Lerne 7 Tage hintereinander",
                ),
                icon: "📅".to_string(),
                requirement: Requirement {
                    requirement_type: RequirementType::Streak,
                    count: 7,
                },
                reward: Reward {
                    points: 50,
                    badge_id: Some("week-warrior".to_string()),
                },
            },
            Achievement {
                id: "achievement-perfect-quiz".to_string(),
                title: text("Quiz Champion", "Quiz-Champion"),
                description: text(
                    "Score 100% on any quiz",
                    "Erreiche 100% in einem Quiz",
                ),
                icon: "🎓".to_string(),
                requirement: Requirement {
                    requirement_type: RequirementType::PerfectScores,
                    count: 1,
                },
                reward: Reward {
                    points: 25,
                    badge_id: Some("perfect-score".to_string()),
                },
            },
            Achievement {
                id: "achievement-10-modules".to_string(),
                title: text("Dedicated Student", "Engagierter Schüler"),
                description: text(
                    "Complete 10 learning modules",
                    "Schließe 10 Lernmodule ab",
                ),
                icon: "📖".to_string(),
                requirement: Requirement {
                    requirement_type: RequirementType::Modules,
                    count: 10,
                },
                reward: Reward {
                    points: 100,
                    badge_id: Some("module-master".to_string()),
                },
            },
            Achievement {
                id: "achievement-25-modules".to_string(),
                title: text("Language Enthusiast", "Sprach-Enthusiast"),
                description: text(
                    "Complete 25 learning modules",
                    "Schließe 25 Lernmodule ab",
                ),
                icon: "🌈".to_string(),
                requirement: Requirement {
                    requirement_type: RequirementType::Modules,
                    count: 25,
                },
                reward: Reward {
                    points: 250,
                    badge_id: Some("language-lover".to_string()),
                },
            },
            Achievement {
                id: "achievement-50-modules".to_string(),
                title: text("Master Learner", "Meister-Lerner"),
                description: text(
                    "Complete 50 learning modules",
                    "Schließe 50 Lernmodule ab",
                ),
                icon: "👑".to_string(),
                requirement: Requirement {
                    requirement_type: RequirementType::Modules,
                    count: 50,
                },
                reward: Reward {
                    points: 500,
                    badge_id: Some("polyglot".to_string()),
                },
            },
        ];

        Self::new(badges, achievements).expect("built-in catalog is valid")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_catalog_resolves_every_reward_badge() {
        let catalog = AchievementCatalog::default();
        for achievement in catalog.achievements() {
            if let Some(badge_id) = &achievement.reward.badge_id {
                assert!(catalog.badge(badge_id).is_some(), "missing {badge_id}");
            }
        }
    }

    #[test]
    fn localized_text_falls_back_to_english() {
        let t = text("hello", "hallo");
        assert_eq!(t.get(Language::De), "hallo");
        assert_eq!(t.get(Language::Fr), "hello");
        assert_eq!(t.get(Language::Hi), "hello");
    }

    #[test]
    fn duplicate_badge_ids_are_rejected() {
        let badge = BadgeDefinition {
            id: "dup".to_string(),
            name: text("a", "a"),
            description: text("a", "a"),
            icon: "x".to_string(),
            category: "test".to_string(),
        };
        let err = AchievementCatalog::new(vec![badge.clone(), badge], vec![]);
        assert!(matches!(err, Err(CatalogError::DuplicateBadge(_))));
    }

    #[test]
    fn unknown_reward_badge_is_rejected() {
        let achievement = Achievement {
            id: "a1".to_string(),
            title: text("t", "t"),
            description: text("d", "d"),
            icon: "x".to_string(),
            requirement: Requirement {
                requirement_type: RequirementType::Modules,
                count: 1,
            },
            reward: Reward {
                points: 5,
                badge_id: Some("nope".to_string()),
            },
        };
        let err = AchievementCatalog::new(vec![], vec![achievement]);
        assert!(matches!(err, Err(CatalogError::UnknownBadge { .. })));
    }

    #[test]
    fn catalog_round_trips_through_json() {
        let catalog = AchievementCatalog::default();
        let raw = serde_json::to_string(&catalog).unwrap();
        let parsed: CatalogFile = serde_json::from_str(&raw).unwrap();
        let rebuilt = AchievementCatalog::new(parsed.badges, parsed.achievements).unwrap();
        assert_eq!(rebuilt.achievements().len(), catalog.achievements().len());
        assert_eq!(rebuilt.badges().len(), catalog.badges().len());
    }
}
