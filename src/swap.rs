//! Skill swap matching and lifecycle
//!
//! A swap pairs an initiator (`user1`) with a recipient (`user2`). Each side
//! declares one skill to teach and one to learn. Status moves along
//!
//! ```text
//! pending ──> accepted ──> completed
//!    │            │
//!    ├──> rejected└──> cancelled
//!    └──> cancelled
//! ```
//!
//! and never leaves `rejected`, `completed` or `cancelled`.

use chrono::{DateTime, Duration, Utc};
use rand::{distr::Alphanumeric, Rng};
use thiserror::Error;
use uuid::Uuid;

use crate::model::{
    MeetingLink, ProposedSchedule, SkillRef, SwapMessage, SwapParticipant, SwapRating,
    SwapRequest, SwapSlot, SwapStatus,
};

pub const DEFAULT_DURATION_WEEKS: u32 = 4;
pub const MAX_DURATION_WEEKS: u32 = 52;
pub const DEFAULT_DAYS_PER_WEEK: u8 = 1;

const MEETING_BASE_URL: &str = "https://meet.jit.si/skillswap-";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SwapError {
    #[error("Cannot change swap status from {from} to {to}")]
    IllegalTransition { from: SwapStatus, to: SwapStatus },

    #[error("Swap is {status}; this action needs a pending or accepted swap")]
    NotOpen { status: SwapStatus },

    #[error("Sessions can only be recorded on an accepted swap (currently {status})")]
    NotAccepted { status: SwapStatus },

    #[error("All {total} sessions are already completed")]
    SessionsExhausted { total: u32 },

    #[error("Ratings are only allowed after the swap is completed")]
    NotCompleted,

    #[error("Proposed schedule of {weeks} weeks cannot be planned")]
    ScheduleOutOfRange { weeks: u32 },

    #[error("You have already rated this swap")]
    AlreadyRated,
}

fn same_name(a: &SkillRef, b: &SkillRef) -> bool {
    a.skill_name.to_lowercase() == b.skill_name.to_lowercase()
}

fn same_category(a: &SkillRef, b: &SkillRef) -> bool {
    !a.category.is_empty() && a.category.to_lowercase() == b.category.to_lowercase()
}

/// True when each side wants to learn exactly what the other teaches
pub fn is_perfect_match(swap: &SwapRequest) -> bool {
    same_name(&swap.user1.skill_to_learn, &swap.user2.skill_to_teach)
        && same_name(&swap.user2.skill_to_learn, &swap.user1.skill_to_teach)
}

fn direction_score(wanted: &SkillRef, offered: &SkillRef) -> u8 {
    if same_name(wanted, offered) {
        50
    } else if same_category(wanted, offered) {
        25
    } else {
        0
    }
}

/// Match percentage for a proposed pairing
///
/// Each direction (what one side learns from the other) is worth 50 points
/// on a skill-name match and 25 on a category-only match.
pub fn match_score(user1: &SwapParticipant, user2: &SwapParticipant) -> u8 {
    direction_score(&user1.skill_to_learn, &user2.skill_to_teach)
        + direction_score(&user2.skill_to_learn, &user1.skill_to_teach)
}

/// Picks the skill from `offered` that matches `wanted`, else the first one
pub fn pick_skill(offered: &[SkillRef], wanted: &SkillRef) -> Option<SkillRef> {
    offered
        .iter()
        .find(|skill| same_name(skill, wanted))
        .or_else(|| offered.first())
        .cloned()
}

/// Completed share of the planned sessions, 0–100
pub fn progress(swap: &SwapRequest) -> u8 {
    if swap.total_sessions == 0 {
        return 0;
    }
    let ratio = f64::from(swap.sessions_completed) / f64::from(swap.total_sessions);
    (ratio * 100.0).round() as u8
}

pub fn can_transition(from: SwapStatus, to: SwapStatus) -> bool {
    use SwapStatus::*;
    matches!(
        (from, to),
        (Pending, Accepted)
            | (Pending, Rejected)
            | (Pending, Cancelled)
            | (Accepted, Completed)
            | (Accepted, Cancelled)
    )
}

/// New pending swap between `user1` (initiator) and `user2`
pub fn propose(
    user1: SwapParticipant,
    user2: SwapParticipant,
    proposed_duration: u32,
    proposed_schedule: ProposedSchedule,
    notes: Option<String>,
) -> SwapRequest {
    let now = Utc::now();
    let match_percentage = match_score(&user1, &user2);

    SwapRequest {
        id: Uuid::new_v4(),
        user1,
        user2,
        match_percentage,
        status: SwapStatus::Pending,
        proposed_duration,
        proposed_schedule,
        start_date: None,
        end_date: None,
        sessions_completed: 0,
        total_sessions: 0,
        meeting_links: Vec::new(),
        messages: Vec::new(),
        user1_rating_for_user2: None,
        user2_rating_for_user1: None,
        is_completed: false,
        completed_date: None,
        notes,
        created_at: now,
        updated_at: now,
    }
}

/// Moves the swap to `to`, applying the side effects of that status
pub fn transition(swap: &mut SwapRequest, to: SwapStatus, now: DateTime<Utc>) -> Result<(), SwapError> {
    if !can_transition(swap.status, to) {
        return Err(SwapError::IllegalTransition {
            from: swap.status,
            to,
        });
    }

    match to {
        SwapStatus::Accepted => {
            let weeks = swap.proposed_duration;
            let out_of_range = SwapError::ScheduleOutOfRange { weeks };
            let end_date = now
                .checked_add_signed(Duration::weeks(i64::from(weeks)))
                .ok_or_else(|| out_of_range.clone())?;
            let total_sessions = if swap.total_sessions == 0 {
                let days = swap
                    .proposed_schedule
                    .days_per_week
                    .filter(|days| *days > 0)
                    .unwrap_or(DEFAULT_DAYS_PER_WEEK);
                weeks.checked_mul(u32::from(days)).ok_or(out_of_range)?
            } else {
                swap.total_sessions
            };

            swap.start_date = Some(now);
            swap.end_date = Some(end_date);
            swap.total_sessions = total_sessions;
        }
        SwapStatus::Completed => {
            swap.is_completed = true;
            swap.completed_date = Some(now);
        }
        _ => {}
    }

    swap.status = to;
    swap.updated_at = now;
    Ok(())
}

fn ensure_open(swap: &SwapRequest) -> Result<(), SwapError> {
    match swap.status {
        SwapStatus::Pending | SwapStatus::Accepted => Ok(()),
        status => Err(SwapError::NotOpen { status }),
    }
}

/// Counts one more completed session
pub fn record_session(swap: &mut SwapRequest, now: DateTime<Utc>) -> Result<u8, SwapError> {
    if swap.status != SwapStatus::Accepted {
        return Err(SwapError::NotAccepted {
            status: swap.status,
        });
    }
    if swap.sessions_completed >= swap.total_sessions {
        return Err(SwapError::SessionsExhausted {
            total: swap.total_sessions,
        });
    }

    swap.sessions_completed += 1;
    let number = swap.sessions_completed;
    if let Some(link) = swap
        .meeting_links
        .iter_mut()
        .find(|link| link.session_number == number)
    {
        link.completed = true;
    }

    swap.updated_at = now;
    Ok(progress(swap))
}

fn generated_meeting_link() -> String {
    let room: String = rand::rng()
        .sample_iter(&Alphanumeric)
        .take(10)
        .map(char::from)
        .collect();
    format!("{MEETING_BASE_URL}{}", room.to_lowercase())
}

/// Adds a meeting link for the next session; generates a room when `link` is absent
pub fn add_meeting_link(
    swap: &mut SwapRequest,
    link: Option<String>,
    scheduled_date: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Result<&MeetingLink, SwapError> {
    ensure_open(swap)?;

    let link = link
        .filter(|link| !link.trim().is_empty())
        .unwrap_or_else(generated_meeting_link);

    swap.meeting_links.push(MeetingLink {
        session_number: swap.meeting_links.len() as u32 + 1,
        scheduled_date,
        link,
        completed: false,
    });
    swap.updated_at = now;

    Ok(&swap.meeting_links[swap.meeting_links.len() - 1])
}

/// Appends to the message thread
///
/// Timestamps never go backwards, even if the clock does.
pub fn append_message(
    swap: &mut SwapRequest,
    sender: Uuid,
    sender_name: &str,
    message: String,
    now: DateTime<Utc>,
) -> Result<(), SwapError> {
    ensure_open(swap)?;

    let timestamp = match swap.messages.last() {
        Some(last) if last.timestamp > now => last.timestamp,
        _ => now,
    };

    swap.messages.push(SwapMessage {
        sender,
        sender_name: sender_name.to_string(),
        message,
        timestamp,
    });
    swap.updated_at = now;
    Ok(())
}

/// Records `rater`'s rating of the other participant
pub fn rate(
    swap: &mut SwapRequest,
    rater: SwapSlot,
    rating: u8,
    review: Option<String>,
    now: DateTime<Utc>,
) -> Result<(), SwapError> {
    if swap.status != SwapStatus::Completed {
        return Err(SwapError::NotCompleted);
    }

    let slot = match rater {
        SwapSlot::User1 => &mut swap.user1_rating_for_user2,
        SwapSlot::User2 => &mut swap.user2_rating_for_user1,
    };
    if slot.is_some() {
        return Err(SwapError::AlreadyRated);
    }

    *slot = Some(SwapRating {
        rating,
        review,
        rated_date: now,
    });
    swap.updated_at = now;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [SwapStatus; 5] = [
        SwapStatus::Pending,
        SwapStatus::Accepted,
        SwapStatus::Rejected,
        SwapStatus::Completed,
        SwapStatus::Cancelled,
    ];

    fn participant(teach: (&str, &str), learn: (&str, &str)) -> SwapParticipant {
        SwapParticipant {
            user: Uuid::new_v4(),
            name: "someone".to_string(),
            skill_to_teach: SkillRef::new(teach.0, teach.1),
            skill_to_learn: SkillRef::new(learn.0, learn.1),
        }
    }

    fn guitar_python_swap() -> SwapRequest {
        let a = participant(("Guitar", "Music"), ("Python", "Coding"));
        let b = participant(("Python", "Coding"), ("Guitar", "Music"));
        let schedule = ProposedSchedule {
            days_per_week: Some(2),
            hours_per_session: Some(1.0),
            preferred_time: Some("Evenings".to_string()),
        };
        propose(a, b, DEFAULT_DURATION_WEEKS, schedule, None)
    }

    fn swapped_roles(swap: &SwapRequest) -> SwapRequest {
        let mut mirrored = swap.clone();
        std::mem::swap(&mut mirrored.user1, &mut mirrored.user2);
        mirrored
    }

    #[test]
    fn reciprocal_skills_are_a_perfect_match() {
        let swap = guitar_python_swap();
        assert!(is_perfect_match(&swap));
        assert_eq!(swap.match_percentage, 100);
    }

    #[test]
    fn match_ignores_case() {
        let a = participant(("guitar", "Music"), ("PYTHON", "Coding"));
        let b = participant(("Python", "Coding"), ("Guitar", "Music"));
        let swap = propose(a, b, 4, ProposedSchedule::default(), None);
        assert!(is_perfect_match(&swap));
    }

    #[test]
    fn perfect_match_is_symmetric() {
        let cases = [
            guitar_python_swap(),
            propose(
                participant(("Guitar", "Music"), ("Python", "Coding")),
                participant(("Rust", "Coding"), ("Guitar", "Music")),
                4,
                ProposedSchedule::default(),
                None,
            ),
            propose(
                participant(("Drawing", "Art"), ("Salsa", "Dance")),
                participant(("Baking", "Cooking"), ("Judo", "Sports")),
                4,
                ProposedSchedule::default(),
                None,
            ),
        ];

        for swap in cases {
            assert_eq!(is_perfect_match(&swap), is_perfect_match(&swapped_roles(&swap)));
            assert_eq!(
                match_score(&swap.user1, &swap.user2),
                match_score(&swap.user2, &swap.user1)
            );
        }
    }

    #[test]
    fn one_sided_match_is_not_perfect() {
        let a = participant(("Guitar", "Music"), ("Python", "Coding"));
        let b = participant(("Python", "Coding"), ("Piano", "Music"));
        let swap = propose(a, b, 4, ProposedSchedule::default(), None);
        assert!(!is_perfect_match(&swap));
        // name match one way, category match the other
        assert_eq!(swap.match_percentage, 75);
    }

    #[test]
    fn unrelated_skills_score_zero() {
        let a = participant(("Drawing", "Art"), ("Salsa", "Dance"));
        let b = participant(("Baking", "Cooking"), ("Judo", "Sports"));
        assert_eq!(match_score(&a, &b), 0);
    }

    #[test]
    fn pick_skill_prefers_the_wanted_name() {
        let offered = vec![SkillRef::new("Piano", "Music"), SkillRef::new("Python", "Coding")];
        let wanted = SkillRef::new("python", "Coding");
        assert_eq!(pick_skill(&offered, &wanted).unwrap().skill_name, "Python");

        let other = SkillRef::new("Chess", "Other");
        assert_eq!(pick_skill(&offered, &other).unwrap().skill_name, "Piano");
        assert!(pick_skill(&[], &wanted).is_none());
    }

    #[test]
    fn progress_is_zero_without_planned_sessions() {
        let swap = guitar_python_swap();
        assert_eq!(progress(&swap), 0);
    }

    #[test]
    fn progress_grows_to_one_hundred() {
        let mut swap = guitar_python_swap();
        transition(&mut swap, SwapStatus::Accepted, Utc::now()).unwrap();
        assert_eq!(swap.total_sessions, 8);

        let mut last = progress(&swap);
        for _ in 0..swap.total_sessions {
            let now = record_session(&mut swap, Utc::now()).unwrap();
            assert!(now >= last);
            last = now;
        }
        assert_eq!(last, 100);
        assert_eq!(
            record_session(&mut swap, Utc::now()),
            Err(SwapError::SessionsExhausted { total: 8 })
        );
        assert_eq!(swap.sessions_completed, swap.total_sessions);
    }

    #[test]
    fn progress_rounds_to_nearest_percent() {
        let mut swap = guitar_python_swap();
        swap.total_sessions = 3;
        swap.sessions_completed = 1;
        assert_eq!(progress(&swap), 33);
        swap.sessions_completed = 2;
        assert_eq!(progress(&swap), 67);
    }

    #[test]
    fn pending_reaches_only_accept_reject_cancel() {
        let reachable: Vec<SwapStatus> = ALL
            .into_iter()
            .filter(|to| can_transition(SwapStatus::Pending, *to))
            .collect();
        assert_eq!(
            reachable,
            vec![SwapStatus::Accepted, SwapStatus::Rejected, SwapStatus::Cancelled]
        );
    }

    #[test]
    fn terminal_states_have_no_exits() {
        for from in ALL.into_iter().filter(SwapStatus::is_terminal) {
            for to in ALL {
                let mut swap = guitar_python_swap();
                swap.status = from;
                assert_eq!(
                    transition(&mut swap, to, Utc::now()),
                    Err(SwapError::IllegalTransition { from, to })
                );
                assert_eq!(swap.status, from);
            }
        }
    }

    #[test]
    fn accepting_without_days_per_week_plans_one_session_a_week() {
        let a = participant(("Guitar", "Music"), ("Python", "Coding"));
        let b = participant(("Python", "Coding"), ("Guitar", "Music"));
        let mut swap = propose(a, b, 6, ProposedSchedule::default(), None);

        transition(&mut swap, SwapStatus::Accepted, Utc::now()).unwrap();
        assert_eq!(swap.total_sessions, 6);
        assert_eq!(record_session(&mut swap, Utc::now()), Ok(17));
    }

    #[test]
    fn oversized_schedule_fails_instead_of_overflowing() {
        let mut swap = guitar_python_swap();
        swap.proposed_duration = u32::MAX;
        swap.proposed_schedule.days_per_week = Some(u8::MAX);

        assert_eq!(
            transition(&mut swap, SwapStatus::Accepted, Utc::now()),
            Err(SwapError::ScheduleOutOfRange { weeks: u32::MAX })
        );
        assert_eq!(swap.status, SwapStatus::Pending);
        assert!(swap.start_date.is_none());
    }

    #[test]
    fn completion_sets_flags() {
        let mut swap = guitar_python_swap();
        transition(&mut swap, SwapStatus::Accepted, Utc::now()).unwrap();
        assert!(swap.start_date.is_some());
        transition(&mut swap, SwapStatus::Completed, Utc::now()).unwrap();
        assert!(swap.is_completed);
        assert!(swap.completed_date.is_some());
    }

    #[test]
    fn sessions_need_an_accepted_swap() {
        let mut swap = guitar_python_swap();
        assert_eq!(
            record_session(&mut swap, Utc::now()),
            Err(SwapError::NotAccepted {
                status: SwapStatus::Pending
            })
        );
    }

    #[test]
    fn messages_stay_in_order() {
        let mut swap = guitar_python_swap();
        let sender = swap.user1.user;
        let later = Utc::now();
        let earlier = later - Duration::seconds(30);

        append_message(&mut swap, sender, "a", "hi".to_string(), later).unwrap();
        append_message(&mut swap, sender, "a", "again".to_string(), earlier).unwrap();

        assert_eq!(swap.messages.len(), 2);
        assert!(swap.messages[1].timestamp >= swap.messages[0].timestamp);
    }

    #[test]
    fn messages_rejected_on_closed_swaps() {
        let mut swap = guitar_python_swap();
        transition(&mut swap, SwapStatus::Rejected, Utc::now()).unwrap();
        let sender = swap.user2.user;
        assert_eq!(
            append_message(&mut swap, sender, "b", "why?".to_string(), Utc::now()),
            Err(SwapError::NotOpen {
                status: SwapStatus::Rejected
            })
        );
    }

    #[test]
    fn ratings_only_after_completion_and_once_per_direction() {
        let mut swap = guitar_python_swap();
        assert_eq!(
            rate(&mut swap, SwapSlot::User1, 5, None, Utc::now()),
            Err(SwapError::NotCompleted)
        );

        transition(&mut swap, SwapStatus::Accepted, Utc::now()).unwrap();
        transition(&mut swap, SwapStatus::Completed, Utc::now()).unwrap();

        rate(&mut swap, SwapSlot::User1, 5, Some("Great teacher".into()), Utc::now()).unwrap();
        assert_eq!(
            rate(&mut swap, SwapSlot::User1, 4, None, Utc::now()),
            Err(SwapError::AlreadyRated)
        );
        rate(&mut swap, SwapSlot::User2, 4, None, Utc::now()).unwrap();

        assert_eq!(swap.user1_rating_for_user2.as_ref().unwrap().rating, 5);
        assert_eq!(swap.user2_rating_for_user1.as_ref().unwrap().rating, 4);
    }

    #[test]
    fn meeting_links_number_sessions_and_generate_rooms() {
        let mut swap = guitar_python_swap();
        let first = add_meeting_link(&mut swap, None, None, Utc::now()).unwrap();
        assert_eq!(first.session_number, 1);
        assert!(first.link.starts_with(MEETING_BASE_URL));

        let second = add_meeting_link(
            &mut swap,
            Some("https://zoom.example.com/j/1".to_string()),
            None,
            Utc::now(),
        )
        .unwrap();
        assert_eq!(second.session_number, 2);
        assert_eq!(second.link, "https://zoom.example.com/j/1");
    }
}
