use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! labelled {
    ($name:ident { $($variant:ident => $label:expr),+ $(,)? }) => {
        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $label),+
                }
            }

            /// Lenient parse used on backend input: case-insensitive, and
            /// `-`/space are treated as `_`.
            pub fn parse_loose(value: &str) -> Option<Self> {
                let normalized = value.trim().to_ascii_lowercase().replace(['-', ' '], "_");
                Self::ALL.iter().copied().find(|item| item.as_str() == normalized)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventCategory {
    Music,
    Sports,
    Conference,
    Festival,
    Exhibition,
    Cultural,
    Culinary,
    Charity,
    Corporate,
    #[default]
    Other,
}

labelled!(EventCategory {
    Music => "music",
    Sports => "sports",
    Conference => "conference",
    Festival => "festival",
    Exhibition => "exhibition",
    Cultural => "cultural",
    Culinary => "culinary",
    Charity => "charity",
    Corporate => "corporate",
    Other => "other",
});

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    #[default]
    Upcoming,
    Completed,
    Cancelled,
}

labelled!(EventStatus {
    Upcoming => "upcoming",
    Completed => "completed",
    Cancelled => "cancelled",
});

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Industry {
    Technology,
    Finance,
    Telecommunications,
    Automotive,
    FoodBeverage,
    Retail,
    Energy,
    Healthcare,
    Media,
    RealEstate,
    Hospitality,
    #[default]
    Other,
}

labelled!(Industry {
    Technology => "technology",
    Finance => "finance",
    Telecommunications => "telecommunications",
    Automotive => "automotive",
    FoodBeverage => "food_beverage",
    Retail => "retail",
    Energy => "energy",
    Healthcare => "healthcare",
    Media => "media",
    RealEstate => "real_estate",
    Hospitality => "hospitality",
    Other => "other",
});

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SponsorTier {
    Title,
    Platinum,
    Gold,
    Silver,
    Bronze,
    #[default]
    Partner,
}

labelled!(SponsorTier {
    Title => "title",
    Platinum => "platinum",
    Gold => "gold",
    Silver => "silver",
    Bronze => "bronze",
    Partner => "partner",
});

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IncomeTier {
    Low,
    #[default]
    Middle,
    UpperMiddle,
    High,
}

labelled!(IncomeTier {
    Low => "low",
    Middle => "middle",
    UpperMiddle => "upper_middle",
    High => "high",
});

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    Verified,
    Pending,
    #[default]
    Unverified,
}

labelled!(VerificationStatus {
    Verified => "verified",
    Pending => "pending",
    Unverified => "unverified",
});

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MyEventStatus {
    #[default]
    Draft,
    Planned,
    Active,
}

labelled!(MyEventStatus {
    Draft => "draft",
    Planned => "planned",
    Active => "active",
});

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GapType {
    Geographic,
    #[default]
    Demographic,
    Seasonal,
    EventType,
    Budget,
}

labelled!(GapType {
    Geographic => "geographic",
    Demographic => "demographic",
    Seasonal => "seasonal",
    EventType => "event_type",
    Budget => "budget",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityType {
    Create,
    Update,
    Delete,
}

labelled!(ActivityType {
    Create => "create",
    Update => "update",
    Delete => "delete",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Event,
    Sponsor,
    MyEvent,
    MarketGap,
    Task,
}

labelled!(EntityType {
    Event => "event",
    Sponsor => "sponsor",
    MyEvent => "my_event",
    MarketGap => "market_gap",
    Task => "task",
});

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Todo,
    InProgress,
    Review,
    Done,
}

labelled!(TaskStatus {
    Todo => "todo",
    InProgress => "in_progress",
    Review => "review",
    Done => "done",
});

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

labelled!(TaskPriority {
    Low => "low",
    Medium => "medium",
    High => "high",
    Urgent => "urgent",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatRole {
    User,
    Assistant,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loose_parse_accepts_backend_spellings() {
        assert_eq!(TaskStatus::parse_loose("in-progress"), Some(TaskStatus::InProgress));
        assert_eq!(Industry::parse_loose("Food Beverage"), Some(Industry::FoodBeverage));
        assert_eq!(GapType::parse_loose("EVENT_TYPE"), Some(GapType::EventType));
        assert_eq!(SponsorTier::parse_loose("diamond"), None);
    }

    #[test]
    fn labels_match_serde_names() {
        for industry in Industry::ALL {
            let json = serde_json::to_value(industry).unwrap();
            assert_eq!(json, industry.as_str());
        }
        for category in EventCategory::ALL {
            let json = serde_json::to_value(category).unwrap();
            assert_eq!(json, category.as_str());
        }
    }
}
