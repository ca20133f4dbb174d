//! Request and response bodies
//!
//! Request fields are optional at the serde level so that a missing field
//! produces a 400 with a readable message instead of a JSON rejection.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::{
    Badge, Coupon, Course, ProposedSchedule, RatingSummary, SkillRef, SwapRequest, TeachSkill,
    User, Video,
};
use crate::policy::Role;
use crate::swap;

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
    pub age: Option<i64>,
    pub languages: Option<Vec<String>>,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub profile_completed: bool,
    pub token: String,
    pub message: String,
}

#[derive(Deserialize, Debug, Default)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub profile_completed: bool,
    pub profile_picture: String,
    pub points: i64,
    pub badges: Vec<Badge>,
    pub token: String,
    pub message: String,
}

/// Partial profile update; absent fields keep their value
#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub username: Option<String>,
    pub bio: Option<String>,
    pub age: Option<i64>,
    pub languages: Option<Vec<String>>,
    pub profile_picture: Option<String>,
    pub skills_to_teach: Option<Vec<TeachSkill>>,
    pub skills_to_learn: Option<Vec<SkillRef>>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct ChangeRoleRequest {
    pub new_role: Option<String>,
}

/// A user as seen by API clients; never carries the password hash
#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub profile_picture: String,
    pub bio: Option<String>,
    pub age: Option<u8>,
    pub languages: Vec<String>,
    pub skills_to_teach: Vec<TeachSkill>,
    pub skills_to_learn: Vec<SkillRef>,
    pub points: i64,
    pub badges: Vec<Badge>,
    pub coupons: Vec<Coupon>,
    pub rating: RatingSummary,
    pub profile_completed: bool,
    pub is_new_teacher: bool,
    pub joined_date: DateTime<Utc>,
    pub courses_created: Vec<Uuid>,
    pub courses_enrolled: Vec<Uuid>,
    pub active_swaps: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&User> for UserView {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            role: user.role,
            profile_picture: user.profile_picture.clone(),
            bio: user.bio.clone(),
            age: user.age,
            languages: user.languages.clone(),
            skills_to_teach: user.skills_to_teach.clone(),
            skills_to_learn: user.skills_to_learn.clone(),
            points: user.points,
            badges: user.badges.clone(),
            coupons: user.coupons.clone(),
            rating: user.rating,
            profile_completed: user.profile_completed,
            is_new_teacher: user.is_new_teacher,
            joined_date: user.joined_date,
            courses_created: user.courses_created.clone(),
            courses_enrolled: user.courses_enrolled.clone(),
            active_swaps: user.active_swaps.clone(),
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct CreateCourseRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub skill_name: Option<String>,
    pub thumbnail: Option<String>,
    pub language: Option<String>,
    pub level: Option<String>,
    pub estimated_completion_time: Option<u32>,
    pub videos: Option<Vec<Video>>,
    pub teacher_name: Option<String>,
    pub tags: Option<Vec<String>>,
}

/// Query parameters for the public course listing
///
/// Query string: `?category=Music&page=2&limit=20`
#[derive(Deserialize, Debug, Default)]
pub struct CourseListParams {
    pub category: Option<String>,
    /// Starts from 1
    pub page: Option<usize>,
    /// Maximum 100
    pub limit: Option<usize>,
}

#[derive(Deserialize, Debug, Default)]
pub struct ReviewRequest {
    pub rating: Option<i64>,
    pub comment: Option<String>,
}

#[derive(Serialize, Debug)]
pub struct CourseResponse {
    pub message: String,
    pub course: Course,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct CreateSwapRequest {
    pub partner_id: Option<String>,
    pub skill_to_teach: Option<SkillRef>,
    pub skill_to_learn: Option<SkillRef>,
    pub partner_skill_to_teach: Option<SkillRef>,
    pub partner_skill_to_learn: Option<SkillRef>,
    pub match_percentage: Option<i64>,
    /// Weeks
    pub proposed_duration: Option<u32>,
    pub proposed_schedule: Option<ProposedSchedule>,
    pub notes: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
pub struct SwapListParams {
    pub status: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
pub struct SwapStatusRequest {
    pub status: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct MeetingLinkRequest {
    pub link: Option<String>,
    pub scheduled_date: Option<DateTime<Utc>>,
}

#[derive(Deserialize, Debug, Default)]
pub struct SwapMessageRequest {
    pub message: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
pub struct RateSwapRequest {
    pub rating: Option<i64>,
    pub review: Option<String>,
}

/// A swap with its derived values computed on the way out
#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct SwapView {
    #[serde(flatten)]
    pub swap: SwapRequest,
    pub is_perfect_match: bool,
    pub progress: u8,
}

impl From<SwapRequest> for SwapView {
    fn from(swap: SwapRequest) -> Self {
        Self {
            is_perfect_match: swap::is_perfect_match(&swap),
            progress: swap::progress(&swap),
            swap,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::test_support::sample_user;

    #[test]
    fn user_view_never_serializes_the_password() {
        let user = sample_user("alice", Role::Both);
        let json = serde_json::to_value(UserView::from(&user)).unwrap();
        assert!(json.get("password").is_none());
        assert_eq!(json["username"], "alice");
        assert_eq!(json["role"], "both");
    }

    #[test]
    fn register_request_accepts_partial_bodies() {
        let request: RegisterRequest =
            serde_json::from_str(r#"{"username":"bob","role":"learner"}"#).unwrap();
        assert_eq!(request.username.as_deref(), Some("bob"));
        assert!(request.password.is_none());
    }
}
