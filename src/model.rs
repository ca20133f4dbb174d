//! Stored documents for the SkillSwap API
//!
//! Each top-level record (`User`, `Course`, `SwapRequest`) is stored as one
//! JSON document. Embedded arrays belong to their parent document. Links
//! between documents are plain ids.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::credential::PasswordHash;
use crate::policy::Role;

pub const DEFAULT_PROFILE_PICTURE: &str = "https://via.placeholder.com/150";
pub const DEFAULT_THUMBNAIL: &str = "https://via.placeholder.com/400x250";

/// Rolled-up rating over a list of 1–5 star ratings
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RatingSummary {
    pub average: f64,
    pub total_reviews: u32,
}

/// A skill a user offers to teach
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TeachSkill {
    pub skill_name: String,
    #[serde(default)]
    pub category: String,
    /// e.g. "Beginner", "Intermediate", "Expert"
    #[serde(default)]
    pub experience: Option<String>,
    #[serde(default)]
    pub verified: bool,
}

impl TeachSkill {
    pub fn new(skill_name: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            skill_name: skill_name.into(),
            category: category.into(),
            experience: None,
            verified: false,
        }
    }
}

/// A named skill with its category
///
/// Used for skills a user wants to learn and for both sides of a swap.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct SkillRef {
    pub skill_name: String,
    #[serde(default)]
    pub category: String,
}

impl SkillRef {
    pub fn new(skill_name: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            skill_name: skill_name.into(),
            category: category.into(),
        }
    }
}

impl From<&TeachSkill> for SkillRef {
    fn from(skill: &TeachSkill) -> Self {
        SkillRef::new(skill.skill_name.clone(), skill.category.clone())
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Badge {
    pub badge_name: String,
    pub badge_image: String,
    pub earned_date: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Coupon {
    pub coupon_code: String,
    /// e.g. "Amazon", "Flipkart"
    pub provider: String,
    pub discount: String,
    pub expiry_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub used: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password: PasswordHash,
    pub role: Role,

    pub profile_picture: String,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub age: Option<u8>,
    #[serde(default)]
    pub languages: Vec<String>,

    #[serde(default)]
    pub skills_to_teach: Vec<TeachSkill>,
    #[serde(default)]
    pub skills_to_learn: Vec<SkillRef>,

    #[serde(default)]
    pub points: i64,
    #[serde(default)]
    pub badges: Vec<Badge>,
    #[serde(default)]
    pub coupons: Vec<Coupon>,
    #[serde(default)]
    pub rating: RatingSummary,

    /// Cache of `profile::is_complete`; refreshed on every write
    #[serde(default)]
    pub profile_completed: bool,
    #[serde(default)]
    pub is_new_teacher: bool,
    pub joined_date: DateTime<Utc>,

    #[serde(default)]
    pub courses_created: Vec<Uuid>,
    #[serde(default)]
    pub courses_enrolled: Vec<Uuid>,
    #[serde(default)]
    pub active_swaps: Vec<Uuid>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Fresh account with empty profile fields
    pub fn new(username: String, email: String, password: PasswordHash, role: Role) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            username,
            email,
            password,
            role,
            profile_picture: DEFAULT_PROFILE_PICTURE.to_string(),
            bio: None,
            age: None,
            languages: Vec::new(),
            skills_to_teach: Vec::new(),
            skills_to_learn: Vec::new(),
            points: 0,
            badges: Vec::new(),
            coupons: Vec::new(),
            rating: RatingSummary::default(),
            profile_completed: false,
            is_new_teacher: role.can_teach(),
            joined_date: now,
            courses_created: Vec::new(),
            courses_enrolled: Vec::new(),
            active_swaps: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CourseCategory {
    Music,
    Coding,
    Art,
    Sports,
    Language,
    Cooking,
    Photography,
    Dance,
    Other,
}

impl CourseCategory {
    pub const ALL: [CourseCategory; 9] = [
        CourseCategory::Music,
        CourseCategory::Coding,
        CourseCategory::Art,
        CourseCategory::Sports,
        CourseCategory::Language,
        CourseCategory::Cooking,
        CourseCategory::Photography,
        CourseCategory::Dance,
        CourseCategory::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CourseCategory::Music => "Music",
            CourseCategory::Coding => "Coding",
            CourseCategory::Art => "Art",
            CourseCategory::Sports => "Sports",
            CourseCategory::Language => "Language",
            CourseCategory::Cooking => "Cooking",
            CourseCategory::Photography => "Photography",
            CourseCategory::Dance => "Dance",
            CourseCategory::Other => "Other",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|category| category.as_str() == value)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CourseLevel {
    Beginner,
    Intermediate,
    Advanced,
    #[default]
    #[serde(rename = "All Levels")]
    AllLevels,
}

impl CourseLevel {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Beginner" => Some(CourseLevel::Beginner),
            "Intermediate" => Some(CourseLevel::Intermediate),
            "Advanced" => Some(CourseLevel::Advanced),
            "All Levels" => Some(CourseLevel::AllLevels),
            _ => None,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub video_url: String,
    /// Length in minutes; missing counts as zero
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default)]
    pub order: u32,
    #[serde(default = "default_true")]
    pub is_public: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub user: Uuid,
    pub user_name: String,
    pub rating: u8,
    #[serde(default)]
    pub comment: String,
    pub date: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub category: CourseCategory,
    pub skill_name: String,

    pub teacher: Uuid,
    pub teacher_name: String,

    pub thumbnail: String,
    #[serde(default)]
    pub videos: Vec<Video>,

    /// Hours, one decimal; cache of `course::total_duration`
    #[serde(default)]
    pub total_duration: f64,
    pub language: String,
    #[serde(default)]
    pub level: CourseLevel,
    /// Days
    pub estimated_completion_time: u32,

    #[serde(default)]
    pub enrolled_students: Vec<Uuid>,
    #[serde(default)]
    pub total_enrollments: u32,

    /// Cache of `course::rating_summary`
    #[serde(default)]
    pub rating: RatingSummary,
    #[serde(default)]
    pub reviews: Vec<Review>,

    #[serde(default)]
    pub is_published: bool,
    pub published_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub views: u64,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SwapStatus {
    #[default]
    Pending,
    Accepted,
    Rejected,
    Completed,
    Cancelled,
}

impl SwapStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SwapStatus::Pending => "pending",
            SwapStatus::Accepted => "accepted",
            SwapStatus::Rejected => "rejected",
            SwapStatus::Completed => "completed",
            SwapStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(SwapStatus::Pending),
            "accepted" => Some(SwapStatus::Accepted),
            "rejected" => Some(SwapStatus::Rejected),
            "completed" => Some(SwapStatus::Completed),
            "cancelled" => Some(SwapStatus::Cancelled),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SwapStatus::Rejected | SwapStatus::Completed | SwapStatus::Cancelled
        )
    }
}

impl fmt::Display for SwapStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One side of a swap
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SwapParticipant {
    pub user: Uuid,
    pub name: String,
    pub skill_to_teach: SkillRef,
    pub skill_to_learn: SkillRef,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ProposedSchedule {
    pub days_per_week: Option<u8>,
    pub hours_per_session: Option<f64>,
    /// e.g. "Evenings", "Weekends"
    pub preferred_time: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MeetingLink {
    pub session_number: u32,
    pub scheduled_date: Option<DateTime<Utc>>,
    pub link: String,
    #[serde(default)]
    pub completed: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SwapMessage {
    pub sender: Uuid,
    pub sender_name: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SwapRating {
    pub rating: u8,
    #[serde(default)]
    pub review: Option<String>,
    pub rated_date: DateTime<Utc>,
}

/// Which side of a swap a user occupies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapSlot {
    /// The initiator
    User1,
    /// The recipient
    User2,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct SwapRequest {
    pub id: Uuid,
    pub user1: SwapParticipant,
    pub user2: SwapParticipant,

    pub match_percentage: u8,
    #[serde(default)]
    pub status: SwapStatus,

    /// Weeks
    pub proposed_duration: u32,
    #[serde(default)]
    pub proposed_schedule: ProposedSchedule,

    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,

    #[serde(default)]
    pub sessions_completed: u32,
    #[serde(default)]
    pub total_sessions: u32,

    #[serde(default)]
    pub meeting_links: Vec<MeetingLink>,
    #[serde(default)]
    pub messages: Vec<SwapMessage>,

    pub user1_rating_for_user2: Option<SwapRating>,
    pub user2_rating_for_user1: Option<SwapRating>,

    #[serde(default)]
    pub is_completed: bool,
    pub completed_date: Option<DateTime<Utc>>,
    pub notes: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SwapRequest {
    pub fn participant_slot(&self, user: Uuid) -> Option<SwapSlot> {
        if self.user1.user == user {
            Some(SwapSlot::User1)
        } else if self.user2.user == user {
            Some(SwapSlot::User2)
        } else {
            None
        }
    }

    pub fn participant(&self, slot: SwapSlot) -> &SwapParticipant {
        match slot {
            SwapSlot::User1 => &self.user1,
            SwapSlot::User2 => &self.user2,
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    pub fn sample_user(username: &str, role: Role) -> User {
        let password = PasswordHash::hash("password123", 4).unwrap();
        let mut user = User::new(
            username.to_string(),
            format!("{username}@example.com"),
            password,
            role,
        );
        user.is_new_teacher = false;
        user
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn course_level_uses_display_names_on_the_wire() {
        let json = serde_json::to_string(&CourseLevel::AllLevels).unwrap();
        assert_eq!(json, "\"All Levels\"");
        assert_eq!(CourseLevel::parse("All Levels"), Some(CourseLevel::AllLevels));
        assert_eq!(CourseLevel::parse("Expert"), None);
    }

    #[test]
    fn categories_are_a_closed_set() {
        assert_eq!(CourseCategory::parse("Music"), Some(CourseCategory::Music));
        assert_eq!(CourseCategory::parse("music"), None);
        assert_eq!(CourseCategory::parse("Gardening"), None);
    }

    #[test]
    fn terminal_statuses() {
        assert!(!SwapStatus::Pending.is_terminal());
        assert!(!SwapStatus::Accepted.is_terminal());
        assert!(SwapStatus::Rejected.is_terminal());
        assert!(SwapStatus::Completed.is_terminal());
        assert!(SwapStatus::Cancelled.is_terminal());
    }

    #[test]
    fn registering_as_teacher_raises_spotlight() {
        let password = PasswordHash::hash("password123", 4).unwrap();
        let user = User::new("t".into(), "t@example.com".into(), password, Role::Teacher);
        assert!(user.is_new_teacher);
    }

    #[test]
    fn video_defaults_to_public() {
        let video: Video = serde_json::from_str(r#"{"title":"Intro"}"#).unwrap();
        assert!(video.is_public);
        assert_eq!(video.duration, None);
    }
}
