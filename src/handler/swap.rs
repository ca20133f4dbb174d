//! Skill swap endpoints
//!
//! Every route here sits behind `require_auth`. Only participants may see
//! or change a swap; everybody else gets 403.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use chrono::Utc;
use redb::ReadableDatabase;
use tracing::info;
use uuid::Uuid;

use super::{max_len, parse_id, present, star_rating};
use crate::database::{get_json, put_json, values_rev, AppState, TABLE_SWAPS, TABLE_USERS};
use crate::dto::{
    CreateSwapRequest, MeetingLinkRequest, RateSwapRequest, SwapListParams, SwapMessageRequest,
    SwapStatusRequest, SwapView,
};
use crate::error::AppError;
use crate::middleware::CurrentUser;
use crate::model::{
    ProposedSchedule, SkillRef, SwapParticipant, SwapRequest, SwapSlot, SwapStatus, User,
};
use crate::policy::{self, Role};
use crate::swap;

const SWAP_NOT_FOUND: &str = "Swap request not found";
const PARTNER_NOT_FOUND: &str = "Partner not found";
const MAX_NOTES_LEN: usize = 1000;
const MAX_MESSAGE_LEN: usize = 1000;

fn not_a_participant() -> AppError {
    AppError::forbidden("You are not a participant in this swap")
}

/// Fills in a missing `daysPerWeek` and rejects values no week can hold
fn validate_schedule(mut schedule: ProposedSchedule) -> Result<ProposedSchedule, AppError> {
    let days = schedule
        .days_per_week
        .unwrap_or(swap::DEFAULT_DAYS_PER_WEEK);
    if !(1..=7).contains(&days) {
        return Err(AppError::validation("Days per week must be between 1 and 7"));
    }
    schedule.days_per_week = Some(days);

    if let Some(hours) = schedule.hours_per_session {
        if !hours.is_finite() || hours <= 0.0 || hours > 24.0 {
            return Err(AppError::validation(
                "Hours per session must be more than 0 and at most 24",
            ));
        }
    }
    Ok(schedule)
}

/// Loads a swap, applies `apply` on behalf of `caller` and persists it
fn update_swap<F>(
    state: &AppState,
    id: Uuid,
    caller: &User,
    apply: F,
) -> Result<SwapRequest, AppError>
where
    F: FnOnce(&mut SwapRequest, SwapSlot) -> Result<(), AppError>,
{
    let write_txn = state.db.begin_write()?;
    let swap = {
        let mut swaps = write_txn.open_table(TABLE_SWAPS)?;
        let mut swap: SwapRequest = get_json(&swaps, &id.to_string())?
            .ok_or_else(|| AppError::not_found(SWAP_NOT_FOUND))?;
        let slot = swap
            .participant_slot(caller.id)
            .ok_or_else(not_a_participant)?;

        apply(&mut swap, slot)?;
        put_json(&mut swaps, &id.to_string(), &swap)?;
        swap
    };
    write_txn.commit()?;
    Ok(swap)
}

/// Proposes a swap to another dual-role user
///
/// # Request Body
///
/// ```json
/// {
///   "partnerId": "7c1e...",
///   "skillToTeach": { "skillName": "Guitar", "category": "Music" },
///   "skillToLearn": { "skillName": "Python", "category": "Coding" },
///   "proposedDuration": 4,                        // Optional, weeks
///   "proposedSchedule": { "daysPerWeek": 2 },     // Optional
///   "notes": "Weekday evenings work best"         // Optional
/// }
/// ```
///
/// The partner's side is taken from the body when given, otherwise picked
/// from the partner's profile.
pub async fn create_swap(
    State(state): State<AppState>,
    Extension(CurrentUser(caller)): Extension<CurrentUser>,
    Json(payload): Json<CreateSwapRequest>,
) -> Result<impl IntoResponse, AppError> {
    if !policy::can_initiate_swap(&caller) {
        return Err(AppError::forbidden(
            "Only users with role 'both' can initiate skill swaps",
        ));
    }

    let partner_id = present(payload.partner_id)
        .ok_or_else(|| AppError::validation("Please provide a partner"))?;
    let partner_id = parse_id(&partner_id, PARTNER_NOT_FOUND)?;
    if partner_id == caller.id {
        return Err(AppError::validation("You cannot swap skills with yourself"));
    }

    let (Some(skill_to_teach), Some(skill_to_learn)) = (
        payload.skill_to_teach.filter(|skill| !skill.skill_name.trim().is_empty()),
        payload.skill_to_learn.filter(|skill| !skill.skill_name.trim().is_empty()),
    ) else {
        return Err(AppError::validation(
            "Please provide the skill to teach and the skill to learn",
        ));
    };

    let match_override = match payload.match_percentage {
        Some(value @ 0..=100) => Some(value as u8),
        Some(_) => {
            return Err(AppError::validation(
                "Match percentage must be between 0 and 100",
            ))
        }
        None => None,
    };
    let proposed_duration = payload
        .proposed_duration
        .unwrap_or(swap::DEFAULT_DURATION_WEEKS);
    if !(1..=swap::MAX_DURATION_WEEKS).contains(&proposed_duration) {
        return Err(AppError::validation(format!(
            "Proposed duration must be between 1 and {} weeks",
            swap::MAX_DURATION_WEEKS
        )));
    }
    let proposed_schedule = validate_schedule(payload.proposed_schedule.unwrap_or_default())?;
    let notes = present(payload.notes);
    if let Some(notes) = &notes {
        max_len(notes, MAX_NOTES_LEN, "Notes")?;
    }

    let write_txn = state.db.begin_write()?;
    let swap = {
        let mut users = write_txn.open_table(TABLE_USERS)?;
        let partner: User = get_json(&users, &partner_id.to_string())?
            .ok_or_else(|| AppError::not_found(PARTNER_NOT_FOUND))?;
        if partner.role != Role::Both {
            return Err(AppError::validation(
                "Partner must both teach and learn to take part in a swap",
            ));
        }

        let partner_teaches: Vec<SkillRef> =
            partner.skills_to_teach.iter().map(SkillRef::from).collect();
        let partner_skill_to_teach = payload
            .partner_skill_to_teach
            .or_else(|| swap::pick_skill(&partner_teaches, &skill_to_learn))
            .ok_or_else(|| AppError::validation("Partner has not listed any skills to teach"))?;
        let partner_skill_to_learn = payload
            .partner_skill_to_learn
            .or_else(|| swap::pick_skill(&partner.skills_to_learn, &skill_to_teach))
            .ok_or_else(|| AppError::validation("Partner has not listed any skills to learn"))?;

        let initiator = SwapParticipant {
            user: caller.id,
            name: caller.username.clone(),
            skill_to_teach,
            skill_to_learn,
        };
        let recipient = SwapParticipant {
            user: partner.id,
            name: partner.username.clone(),
            skill_to_teach: partner_skill_to_teach,
            skill_to_learn: partner_skill_to_learn,
        };

        let mut swap = swap::propose(
            initiator,
            recipient,
            proposed_duration,
            proposed_schedule,
            notes,
        );
        if let Some(value) = match_override {
            swap.match_percentage = value;
        }

        let mut swaps = write_txn.open_table(TABLE_SWAPS)?;
        put_json(&mut swaps, &swap.id.to_string(), &swap)?;

        for user_id in [caller.id, partner.id] {
            let key = user_id.to_string();
            if let Some(mut user) = get_json::<User, _>(&users, &key)? {
                user.active_swaps.push(swap.id);
                user.touch();
                put_json(&mut users, &key, &user)?;
            }
        }
        swap
    };
    write_txn.commit()?;

    info!(
        swap_id = %swap.id,
        initiator = %swap.user1.user,
        recipient = %swap.user2.user,
        match_percentage = swap.match_percentage,
        "swap proposed"
    );

    Ok((StatusCode::CREATED, Json(SwapView::from(swap))))
}

/// Swaps the caller takes part in, newest first
///
/// # Query Parameters
///
/// - `status` (optional) - Only swaps in this status
pub async fn list_swaps(
    State(state): State<AppState>,
    Extension(CurrentUser(caller)): Extension<CurrentUser>,
    Query(params): Query<SwapListParams>,
) -> Result<Json<Vec<SwapView>>, AppError> {
    let status = match params.status.as_deref() {
        Some(raw) => {
            Some(SwapStatus::parse(raw).ok_or_else(|| AppError::validation("Invalid status"))?)
        }
        None => None,
    };

    let read_txn = state.db.begin_read()?;
    let swaps = read_txn.open_table(TABLE_SWAPS)?;

    let mut mine = Vec::new();
    for raw in values_rev(&swaps)? {
        let swap: SwapRequest = serde_json::from_str(&raw)?;
        if swap.participant_slot(caller.id).is_none() {
            continue;
        }
        if status.is_some_and(|status| swap.status != status) {
            continue;
        }
        mine.push(swap);
    }
    mine.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    Ok(Json(mine.into_iter().map(SwapView::from).collect()))
}

pub async fn get_swap(
    State(state): State<AppState>,
    Extension(CurrentUser(caller)): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Result<Json<SwapView>, AppError> {
    let id = parse_id(&id, SWAP_NOT_FOUND)?;

    let read_txn = state.db.begin_read()?;
    let swaps = read_txn.open_table(TABLE_SWAPS)?;
    let swap: SwapRequest =
        get_json(&swaps, &id.to_string())?.ok_or_else(|| AppError::not_found(SWAP_NOT_FOUND))?;

    if !policy::can_act_on_swap(&caller, &swap) {
        return Err(not_a_participant());
    }
    Ok(Json(SwapView::from(swap)))
}

/// Moves a swap through its lifecycle
///
/// Only the recipient may accept or reject. Either side may complete or
/// cancel. Reaching a terminal status drops the swap from both users'
/// `activeSwaps` in the same transaction.
pub async fn update_swap_status(
    State(state): State<AppState>,
    Extension(CurrentUser(caller)): Extension<CurrentUser>,
    Path(id): Path<String>,
    Json(payload): Json<SwapStatusRequest>,
) -> Result<Json<SwapView>, AppError> {
    let id = parse_id(&id, SWAP_NOT_FOUND)?;
    let to = present(payload.status)
        .as_deref()
        .and_then(SwapStatus::parse)
        .ok_or_else(|| {
            AppError::validation(
                "Invalid status. Must be pending, accepted, rejected, completed, or cancelled",
            )
        })?;

    let write_txn = state.db.begin_write()?;
    let (swap, from) = {
        let mut swaps = write_txn.open_table(TABLE_SWAPS)?;
        let mut swap: SwapRequest = get_json(&swaps, &id.to_string())?
            .ok_or_else(|| AppError::not_found(SWAP_NOT_FOUND))?;
        let slot = swap
            .participant_slot(caller.id)
            .ok_or_else(not_a_participant)?;

        if matches!(to, SwapStatus::Accepted | SwapStatus::Rejected) && slot != SwapSlot::User2 {
            return Err(AppError::forbidden(
                "Only the recipient can accept or reject a swap request",
            ));
        }

        let from = swap.status;
        swap::transition(&mut swap, to, Utc::now())?;
        put_json(&mut swaps, &id.to_string(), &swap)?;

        if to.is_terminal() {
            let mut users = write_txn.open_table(TABLE_USERS)?;
            for user_id in [swap.user1.user, swap.user2.user] {
                let key = user_id.to_string();
                if let Some(mut user) = get_json::<User, _>(&users, &key)? {
                    user.active_swaps.retain(|active| *active != swap.id);
                    user.touch();
                    put_json(&mut users, &key, &user)?;
                }
            }
        }
        (swap, from)
    };
    write_txn.commit()?;

    info!(swap_id = %swap.id, %from, to = %swap.status, by = %caller.id, "swap status changed");

    Ok(Json(SwapView::from(swap)))
}

/// Counts one completed session on an accepted swap
pub async fn record_session(
    State(state): State<AppState>,
    Extension(CurrentUser(caller)): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Result<Json<SwapView>, AppError> {
    let id = parse_id(&id, SWAP_NOT_FOUND)?;
    let swap = update_swap(&state, id, &caller, |swap, _| {
        swap::record_session(swap, Utc::now())?;
        Ok(())
    })?;
    Ok(Json(SwapView::from(swap)))
}

pub async fn add_meeting_link(
    State(state): State<AppState>,
    Extension(CurrentUser(caller)): Extension<CurrentUser>,
    Path(id): Path<String>,
    Json(payload): Json<MeetingLinkRequest>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id, SWAP_NOT_FOUND)?;
    let swap = update_swap(&state, id, &caller, |swap, _| {
        swap::add_meeting_link(
            swap,
            present(payload.link),
            payload.scheduled_date,
            Utc::now(),
        )?;
        Ok(())
    })?;
    Ok((StatusCode::CREATED, Json(SwapView::from(swap))))
}

pub async fn post_message(
    State(state): State<AppState>,
    Extension(CurrentUser(caller)): Extension<CurrentUser>,
    Path(id): Path<String>,
    Json(payload): Json<SwapMessageRequest>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id, SWAP_NOT_FOUND)?;
    let message =
        present(payload.message).ok_or_else(|| AppError::validation("Message cannot be empty"))?;
    max_len(&message, MAX_MESSAGE_LEN, "Message")?;

    let swap = update_swap(&state, id, &caller, |swap, _| {
        swap::append_message(swap, caller.id, &caller.username, message, Utc::now())?;
        Ok(())
    })?;
    Ok((StatusCode::CREATED, Json(SwapView::from(swap))))
}

/// Rates the other participant of a completed swap
pub async fn rate_swap(
    State(state): State<AppState>,
    Extension(CurrentUser(caller)): Extension<CurrentUser>,
    Path(id): Path<String>,
    Json(payload): Json<RateSwapRequest>,
) -> Result<Json<SwapView>, AppError> {
    let id = parse_id(&id, SWAP_NOT_FOUND)?;
    let rating = star_rating(payload.rating)?;
    let review = present(payload.review);
    if let Some(review) = &review {
        max_len(review, MAX_MESSAGE_LEN, "Review")?;
    }

    let swap = update_swap(&state, id, &caller, |swap, slot| {
        swap::rate(swap, slot, rating, review, Utc::now())?;
        Ok(())
    })?;
    Ok(Json(SwapView::from(swap)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schedule(days_per_week: Option<u8>, hours_per_session: Option<f64>) -> ProposedSchedule {
        ProposedSchedule {
            days_per_week,
            hours_per_session,
            preferred_time: None,
        }
    }

    #[test]
    fn missing_days_per_week_defaults_to_one() {
        let schedule = validate_schedule(schedule(None, None)).unwrap();
        assert_eq!(schedule.days_per_week, Some(swap::DEFAULT_DAYS_PER_WEEK));
    }

    #[test]
    fn days_per_week_must_fit_in_a_week() {
        assert!(validate_schedule(schedule(Some(0), None)).is_err());
        assert!(validate_schedule(schedule(Some(8), None)).is_err());
        assert!(validate_schedule(schedule(Some(255), None)).is_err());
        assert_eq!(
            validate_schedule(schedule(Some(7), None)).unwrap().days_per_week,
            Some(7)
        );
    }

    #[test]
    fn hours_per_session_must_be_positive_and_finite() {
        assert!(validate_schedule(schedule(Some(2), Some(0.0))).is_err());
        assert!(validate_schedule(schedule(Some(2), Some(f64::NAN))).is_err());
        assert!(validate_schedule(schedule(Some(2), Some(25.0))).is_err());
        assert!(validate_schedule(schedule(Some(2), Some(1.5))).is_ok());
    }
}
