//! Roles and role-gated capabilities
//!
//! A role is one of three values; `Both` composes the capabilities of the
//! other two. Every "teacher or both" / "learner or both" check in the crate
//! goes through [`Role::can_teach`] and [`Role::can_learn`].

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::model::{SwapRequest, User};
use crate::profile;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Learner,
    Teacher,
    Both,
}

impl Role {
    pub const INVALID_MESSAGE: &'static str = "Role must be learner, teacher, or both";

    pub fn parse(value: &str) -> Option<Role> {
        match value {
            "learner" => Some(Role::Learner),
            "teacher" => Some(Role::Teacher),
            "both" => Some(Role::Both),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Learner => "learner",
            Role::Teacher => "teacher",
            Role::Both => "both",
        }
    }

    pub fn can_teach(&self) -> bool {
        matches!(self, Role::Teacher | Role::Both)
    }

    pub fn can_learn(&self) -> bool {
        matches!(self, Role::Learner | Role::Both)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn can_create_course(user: &User) -> bool {
    user.role.can_teach()
}

pub fn can_enroll(user: &User) -> bool {
    user.role.can_learn()
}

/// Skill swaps are reserved for users who both teach and learn
pub fn can_initiate_swap(user: &User) -> bool {
    user.role == Role::Both
}

pub fn can_act_on_swap(user: &User, swap: &SwapRequest) -> bool {
    swap.participant_slot(user.id).is_some()
}

/// Applies a role change to `user`
///
/// Gaining teaching capability from a pure learner role raises the
/// spotlight flag. The flag is never lowered here; see
/// [`clear_spotlight`]. Profile completion depends on the role, so the
/// cached flag is refreshed before returning.
pub fn change_role(user: &mut User, new_role: Role) {
    let previous = user.role;
    user.role = new_role;

    if previous == Role::Learner && new_role.can_teach() {
        user.is_new_teacher = true;
    }

    profile::refresh(user);
}

pub fn clear_spotlight(user: &mut User) {
    user.is_new_teacher = false;
}
