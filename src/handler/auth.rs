//! Registration, login and profile management
//!
//! - `POST /api/auth/register`
//! - `POST /api/auth/login`
//! - `GET /api/auth/me`
//! - `PUT /api/auth/profile`
//! - `PUT /api/auth/change-role`
//! - `DELETE /api/auth/spotlight`

use axum::{extract::State, http::StatusCode, response::IntoResponse, Extension, Json};
use redb::{ReadableDatabase, ReadableTable};
use serde_json::{json, Value};
use tracing::{info, warn};

use super::{max_len, present};
use crate::credential;
use crate::database::{
    get_json, get_str, put_json, AppState, TABLE_USERS, TABLE_USER_EMAILS, TABLE_USER_NAMES,
};
use crate::dto::{
    ChangeRoleRequest, LoginRequest, LoginResponse, RegisterRequest, RegisterResponse,
    UpdateProfileRequest, UserView,
};
use crate::error::AppError;
use crate::middleware::CurrentUser;
use crate::model::{SkillRef, TeachSkill, User};
use crate::policy::{self, Role};
use crate::profile;
use crate::token;

/// Same message for unknown email and wrong password
const INVALID_CREDENTIALS: &str = "Invalid email or password";

const MIN_USERNAME_LEN: usize = 3;
const MAX_BIO_LEN: usize = 500;

fn validate_username(username: &str) -> Result<(), AppError> {
    if username.chars().count() < MIN_USERNAME_LEN {
        return Err(AppError::validation(format!(
            "Username must be at least {MIN_USERNAME_LEN} characters"
        )));
    }
    Ok(())
}

/// Key in the usernames index; names are unique regardless of case
fn username_key(username: &str) -> String {
    username.to_lowercase()
}

fn normalize_email(email: &str) -> Result<String, AppError> {
    let email = email.trim().to_lowercase();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(email),
        _ => Err(AppError::validation("Please provide a valid email address")),
    }
}

fn validate_age(age: i64) -> Result<u8, AppError> {
    match age {
        5..=120 => Ok(age as u8),
        _ => Err(AppError::validation("Age must be between 5 and 120")),
    }
}

/// Trims entries, drops blanks and case-insensitive duplicates
fn normalize_languages(languages: Vec<String>) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    let mut result = Vec::new();
    for language in languages {
        let language = language.trim().to_string();
        let key = language.to_lowercase();
        if language.is_empty() || seen.contains(&key) {
            continue;
        }
        seen.push(key);
        result.push(language);
    }
    result
}

fn require_skill_names<'a>(names: impl IntoIterator<Item = &'a str>) -> Result<(), AppError> {
    if names.into_iter().any(|name| name.trim().is_empty()) {
        return Err(AppError::validation("Every skill needs a skillName"));
    }
    Ok(())
}

/// Creates a new account and returns a session token
///
/// # Request Body
///
/// ```json
/// {
///   "username": "alice",
///   "email": "alice@example.com",
///   "password": "secret123",
///   "role": "both",
///   "age": 28,             // Optional
///   "languages": ["en"]    // Optional
/// }
/// ```
///
/// # Response
///
/// - **201 Created** - Account created, token issued
/// - **400 Bad Request** - Missing field, invalid role, or email/username taken
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    let (Some(username), Some(email), Some(password), Some(role)) = (
        present(payload.username),
        present(payload.email),
        payload.password.filter(|password| !password.is_empty()),
        present(payload.role),
    ) else {
        return Err(AppError::validation(
            "Please provide username, email, password, and role",
        ));
    };

    let role = Role::parse(&role).ok_or_else(|| AppError::validation(Role::INVALID_MESSAGE))?;
    validate_username(&username)?;
    let email = normalize_email(&email)?;
    credential::validate_password(&password)?;
    let age = payload.age.map(validate_age).transpose()?;
    let languages = normalize_languages(payload.languages.unwrap_or_default());

    let password = credential::hash_blocking(password, state.config.bcrypt_cost).await?;

    let mut user = User::new(username, email, password, role);
    user.age = age;
    user.languages = languages;
    profile::refresh(&mut user);

    let id = user.id.to_string();
    let write_txn = state.db.begin_write()?;
    {
        let mut emails = write_txn.open_table(TABLE_USER_EMAILS)?;
        let mut names = write_txn.open_table(TABLE_USER_NAMES)?;

        let name_key = username_key(&user.username);
        if emails.get(user.email.as_str())?.is_some() || names.get(name_key.as_str())?.is_some() {
            return Err(AppError::validation(
                "User with this email or username already exists",
            ));
        }

        emails.insert(user.email.as_str(), id.as_str())?;
        names.insert(name_key.as_str(), id.as_str())?;

        let mut users = write_txn.open_table(TABLE_USERS)?;
        put_json(&mut users, &id, &user)?;
    }
    write_txn.commit()?;

    info!(user_id = %user.id, role = %user.role, "user registered");

    let response = RegisterResponse {
        id: user.id,
        token: token::issue(user.id, &state.config.jwt_secret)?,
        username: user.username,
        email: user.email,
        role: user.role,
        profile_completed: user.profile_completed,
        message: "User registered successfully! Please complete your profile.".to_string(),
    };

    Ok((StatusCode::CREATED, Json(response)))
}

/// Exchanges email and password for a session token
///
/// # Response
///
/// - **200 OK** - User summary and token
/// - **400 Bad Request** - Email or password missing
/// - **401 Unauthorized** - Unknown email or wrong password (same message)
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let (Some(email), Some(password)) = (
        present(payload.email),
        payload.password.filter(|password| !password.is_empty()),
    ) else {
        return Err(AppError::validation("Please provide email and password"));
    };
    let email = email.to_lowercase();

    let user: Option<User> = {
        let read_txn = state.db.begin_read()?;
        let emails = read_txn.open_table(TABLE_USER_EMAILS)?;
        match get_str(&emails, &email)? {
            Some(id) => {
                let users = read_txn.open_table(TABLE_USERS)?;
                get_json(&users, &id)?
            }
            None => None,
        }
    };

    let Some(mut user) = user else {
        warn!("login attempt for unknown email");
        return Err(AppError::unauthorized(INVALID_CREDENTIALS));
    };

    if !credential::verify_blocking(user.password.clone(), password).await? {
        warn!(user_id = %user.id, "login attempt with wrong password");
        return Err(AppError::unauthorized(INVALID_CREDENTIALS));
    }

    let completed = profile::refresh(&mut user);
    info!(user_id = %user.id, "user logged in");

    Ok(Json(LoginResponse {
        id: user.id,
        token: token::issue(user.id, &state.config.jwt_secret)?,
        username: user.username,
        email: user.email,
        role: user.role,
        profile_completed: completed,
        profile_picture: user.profile_picture,
        points: user.points,
        badges: user.badges,
        message: if completed {
            "Login successful!".to_string()
        } else {
            "Login successful! Please complete your profile.".to_string()
        },
    }))
}

/// Current user without the credential, plus completion flags
pub async fn me(Extension(CurrentUser(mut user)): Extension<CurrentUser>) -> Json<Value> {
    let completed = profile::refresh(&mut user);

    Json(json!({
        "user": UserView::from(&user),
        "profileCompleted": completed,
        "needsProfileCompletion": !completed
    }))
}

/// Partial update of the caller's profile
///
/// Skill lists are only applied when the caller's role uses them.
/// `profileCompleted` is recomputed before the write.
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(CurrentUser(caller)): Extension<CurrentUser>,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<Json<Value>, AppError> {
    let username = present(payload.username);
    if let Some(username) = &username {
        validate_username(username)?;
    }
    if let Some(bio) = &payload.bio {
        max_len(bio, MAX_BIO_LEN, "Bio")?;
    }
    let age = payload.age.map(validate_age).transpose()?;
    if let Some(skills) = &payload.skills_to_teach {
        require_skill_names(skills.iter().map(|skill: &TeachSkill| skill.skill_name.as_str()))?;
    }
    if let Some(skills) = &payload.skills_to_learn {
        require_skill_names(skills.iter().map(|skill: &SkillRef| skill.skill_name.as_str()))?;
    }

    let id = caller.id.to_string();
    let write_txn = state.db.begin_write()?;
    let user = {
        let mut users = write_txn.open_table(TABLE_USERS)?;
        let mut user: User =
            get_json(&users, &id)?.ok_or_else(|| AppError::not_found("User not found"))?;

        if let Some(username) = username.filter(|name| *name != user.username) {
            let old_key = username_key(&user.username);
            let new_key = username_key(&username);
            if new_key != old_key {
                let mut names = write_txn.open_table(TABLE_USER_NAMES)?;
                if names.get(new_key.as_str())?.is_some() {
                    return Err(AppError::validation("Username already taken"));
                }
                names.remove(old_key.as_str())?;
                names.insert(new_key.as_str(), id.as_str())?;
            }
            user.username = username;
        }

        if let Some(bio) = payload.bio {
            user.bio = present(Some(bio));
        }
        if age.is_some() {
            user.age = age;
        }
        if let Some(languages) = payload.languages {
            user.languages = normalize_languages(languages);
        }
        if let Some(picture) = present(payload.profile_picture) {
            user.profile_picture = picture;
        }
        if let Some(skills) = payload.skills_to_teach.filter(|_| user.role.can_teach()) {
            user.skills_to_teach = skills;
        }
        if let Some(skills) = payload.skills_to_learn.filter(|_| user.role.can_learn()) {
            user.skills_to_learn = skills;
        }

        profile::refresh(&mut user);
        user.touch();
        put_json(&mut users, &id, &user)?;
        user
    };
    write_txn.commit()?;

    info!(user_id = %user.id, completed = user.profile_completed, "profile updated");

    Ok(Json(json!({
        "id": user.id,
        "username": user.username,
        "email": user.email,
        "role": user.role,
        "bio": user.bio,
        "age": user.age,
        "languages": user.languages,
        "profilePicture": user.profile_picture,
        "skillsToTeach": user.skills_to_teach,
        "skillsToLearn": user.skills_to_learn,
        "profileCompleted": user.profile_completed,
        "message": "Profile updated successfully!"
    })))
}

/// Switches the caller's role
pub async fn change_role(
    State(state): State<AppState>,
    Extension(CurrentUser(caller)): Extension<CurrentUser>,
    Json(payload): Json<ChangeRoleRequest>,
) -> Result<Json<Value>, AppError> {
    let new_role = payload
        .new_role
        .as_deref()
        .and_then(Role::parse)
        .ok_or_else(|| AppError::validation("Invalid role. Must be learner, teacher, or both"))?;

    let id = caller.id.to_string();
    let write_txn = state.db.begin_write()?;
    let user = {
        let mut users = write_txn.open_table(TABLE_USERS)?;
        let mut user: User =
            get_json(&users, &id)?.ok_or_else(|| AppError::not_found("User not found"))?;

        policy::change_role(&mut user, new_role);
        user.touch();
        put_json(&mut users, &id, &user)?;
        user
    };
    write_txn.commit()?;

    info!(user_id = %user.id, role = %user.role, "role changed");

    Ok(Json(json!({
        "message": "Role changed successfully!",
        "newRole": user.role,
        "id": user.id,
        "username": user.username,
        "isNewTeacher": user.is_new_teacher,
        "profileCompleted": user.profile_completed
    })))
}

/// Clears the new-teacher spotlight flag
pub async fn clear_spotlight(
    State(state): State<AppState>,
    Extension(CurrentUser(caller)): Extension<CurrentUser>,
) -> Result<Json<Value>, AppError> {
    let id = caller.id.to_string();
    let write_txn = state.db.begin_write()?;
    {
        let mut users = write_txn.open_table(TABLE_USERS)?;
        let mut user: User =
            get_json(&users, &id)?.ok_or_else(|| AppError::not_found("User not found"))?;

        policy::clear_spotlight(&mut user);
        user.touch();
        put_json(&mut users, &id, &user)?;
    }
    write_txn.commit()?;

    Ok(Json(json!({
        "message": "Spotlight cleared",
        "isNewTeacher": false
    })))
}
