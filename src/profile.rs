//! Profile completeness
//!
//! `User::profile_completed` is a cache of [`is_complete`]. Every write path
//! that touches a user calls [`refresh`] before persisting.

use crate::model::User;

/// Whether every field required for the user's role is populated
///
/// Always required: username, email, a non-empty bio, age and at least one
/// language. Teaching roles also need a skill to teach; learning roles need
/// a skill to learn.
pub fn is_complete(user: &User) -> bool {
    let base = !user.username.is_empty()
        && !user.email.is_empty()
        && user.bio.as_deref().is_some_and(|bio| !bio.is_empty())
        && user.age.is_some_and(|age| age > 0)
        && !user.languages.is_empty();

    let teaching = !user.role.can_teach() || !user.skills_to_teach.is_empty();
    let learning = !user.role.can_learn() || !user.skills_to_learn.is_empty();

    base && teaching && learning
}

/// Re-evaluates completeness and stores it on the user
pub fn refresh(user: &mut User) -> bool {
    user.profile_completed = is_complete(user);
    user.profile_completed
}
