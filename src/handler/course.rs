//! Course endpoints
//!
//! - `GET /api/courses` (public)
//! - `GET /api/courses/{id}` (public)
//! - `POST /api/courses/create`
//! - `GET /api/courses/my-courses`
//! - `POST /api/courses/{id}/videos`
//! - `POST /api/courses/{id}/enroll`
//! - `POST /api/courses/{id}/reviews`

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use chrono::Utc;
use redb::{ReadableDatabase, ReadableTable};
use tracing::info;
use uuid::Uuid;

use super::{max_len, parse_id, present, star_rating};
use crate::course;
use crate::database::{
    get_json, put_json, teacher_key, timeline_key, values_rev, values_with_prefix_rev, AppState,
    TABLE_COURSES, TABLE_COURSE_TEACHER_INDEX, TABLE_COURSE_TIMELINE, TABLE_USERS,
};
use crate::dto::{CourseListParams, CourseResponse, CreateCourseRequest, ReviewRequest};
use crate::error::AppError;
use crate::middleware::CurrentUser;
use crate::model::{
    Course, CourseCategory, CourseLevel, RatingSummary, Review, User, Video, DEFAULT_THUMBNAIL,
};
use crate::policy;

const MAX_TITLE_LEN: usize = 200;
const MAX_DESCRIPTION_LEN: usize = 2000;
const DEFAULT_COMPLETION_DAYS: u32 = 30;
const DEFAULT_PAGE_SIZE: usize = 50;
const MAX_PAGE_SIZE: usize = 100;

const COURSE_NOT_FOUND: &str = "Course not found";

fn validate_video(video: &Video) -> Result<(), AppError> {
    match video.duration {
        Some(minutes) if !minutes.is_finite() || minutes < 0.0 => Err(AppError::validation(
            "Video duration must be a non-negative number of minutes",
        )),
        _ => Ok(()),
    }
}

fn load_course<R>(courses: &R, id: Uuid) -> Result<Course, AppError>
where
    R: ReadableTable<&'static str, &'static str>,
{
    get_json(courses, &id.to_string())?.ok_or_else(|| AppError::not_found(COURSE_NOT_FOUND))
}

/// Resolves ids to courses, skipping ids with no document
fn courses_for_ids<R>(courses: &R, ids: Vec<String>) -> Result<Vec<Course>, AppError>
where
    R: ReadableTable<&'static str, &'static str>,
{
    let mut result = Vec::with_capacity(ids.len());
    for id in ids {
        if let Some(course) = get_json::<Course, _>(courses, &id)? {
            result.push(course);
        }
    }
    Ok(result)
}

/// Lists published courses, newest first
///
/// # Query Parameters
///
/// - `category` (optional) - Only courses in this category
/// - `page` (optional) - Page number, starts from 1 (default: 1)
/// - `limit` (optional) - Items per page, max 100 (default: 50)
pub async fn list_courses(
    State(state): State<AppState>,
    Query(params): Query<CourseListParams>,
) -> Result<Json<Vec<Course>>, AppError> {
    let category = match params.category.as_deref() {
        Some(raw) => Some(
            CourseCategory::parse(raw).ok_or_else(|| AppError::validation("Invalid category"))?,
        ),
        None => None,
    };
    let page = params.page.unwrap_or(1).max(1);
    let limit = params.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
    let offset = (page - 1).saturating_mul(limit);

    let read_txn = state.db.begin_read()?;
    let timeline = read_txn.open_table(TABLE_COURSE_TIMELINE)?;
    let courses = read_txn.open_table(TABLE_COURSES)?;

    let published: Vec<Course> = courses_for_ids(&courses, values_rev(&timeline)?)?
        .into_iter()
        .filter(|course| course.is_published)
        .filter(|course| category.map_or(true, |category| course.category == category))
        .skip(offset)
        .take(limit)
        .collect();

    Ok(Json(published))
}

/// Single published course; counts a view
pub async fn get_course(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Course>, AppError> {
    let id = parse_id(&id, COURSE_NOT_FOUND)?;

    let write_txn = state.db.begin_write()?;
    let course = {
        let mut courses = write_txn.open_table(TABLE_COURSES)?;
        let mut course = load_course(&courses, id)?;
        if !course.is_published {
            return Err(AppError::not_found(COURSE_NOT_FOUND));
        }
        course.views += 1;
        put_json(&mut courses, &id.to_string(), &course)?;
        course
    };
    write_txn.commit()?;

    Ok(Json(course))
}

/// Creates and publishes a course owned by the caller
///
/// # Request Body
///
/// ```json
/// {
///   "title": "Guitar for beginners",
///   "description": "Chords, strumming and your first song",
///   "category": "Music",
///   "skillName": "Guitar",
///   "language": "English",
///   "level": "Beginner",                 // Optional
///   "estimatedCompletionTime": 14,       // Optional, days
///   "videos": [{ "title": "Tuning", "duration": 12 }]
/// }
/// ```
///
/// # Response
///
/// - **201 Created** - Course created
/// - **400 Bad Request** - Missing or invalid field
/// - **403 Forbidden** - Caller cannot teach
///
/// The course and the owner's `coursesCreated` entry are written in the
/// same transaction.
pub async fn create_course(
    State(state): State<AppState>,
    Extension(CurrentUser(caller)): Extension<CurrentUser>,
    Json(payload): Json<CreateCourseRequest>,
) -> Result<impl IntoResponse, AppError> {
    if !policy::can_create_course(&caller) {
        return Err(AppError::forbidden("Only teachers can create courses"));
    }

    let (Some(title), Some(description), Some(category), Some(skill_name), Some(language)) = (
        present(payload.title),
        present(payload.description),
        present(payload.category),
        present(payload.skill_name),
        present(payload.language),
    ) else {
        return Err(AppError::validation("Please provide all required fields"));
    };

    max_len(&title, MAX_TITLE_LEN, "Title")?;
    max_len(&description, MAX_DESCRIPTION_LEN, "Description")?;
    let category = CourseCategory::parse(&category)
        .ok_or_else(|| AppError::validation(format!("Invalid category: {category}")))?;
    let level = match present(payload.level) {
        Some(level) => CourseLevel::parse(&level)
            .ok_or_else(|| AppError::validation(format!("Invalid level: {level}")))?,
        None => CourseLevel::default(),
    };
    let videos = payload.videos.unwrap_or_default();
    for video in &videos {
        validate_video(video)?;
    }

    let now = Utc::now();
    let mut course = Course {
        id: Uuid::new_v4(),
        title,
        description,
        category,
        skill_name,
        teacher: caller.id,
        teacher_name: present(payload.teacher_name).unwrap_or_else(|| caller.username.clone()),
        thumbnail: present(payload.thumbnail).unwrap_or_else(|| DEFAULT_THUMBNAIL.to_string()),
        videos,
        total_duration: 0.0,
        language,
        level,
        estimated_completion_time: payload
            .estimated_completion_time
            .unwrap_or(DEFAULT_COMPLETION_DAYS),
        enrolled_students: Vec::new(),
        total_enrollments: 0,
        rating: RatingSummary::default(),
        reviews: Vec::new(),
        is_published: true,
        published_date: Some(now),
        tags: payload.tags.unwrap_or_default(),
        views: 0,
        created_at: now,
        updated_at: now,
    };
    course::recompute_duration(&mut course);

    let course_id = course.id.to_string();
    let write_txn = state.db.begin_write()?;
    {
        let mut courses = write_txn.open_table(TABLE_COURSES)?;
        put_json(&mut courses, &course_id, &course)?;

        let mut timeline = write_txn.open_table(TABLE_COURSE_TIMELINE)?;
        let key = timeline_key(course.created_at, course.id);
        timeline.insert(key.as_str(), course_id.as_str())?;

        let mut by_teacher = write_txn.open_table(TABLE_COURSE_TEACHER_INDEX)?;
        let key = teacher_key(caller.id, course.created_at, course.id);
        by_teacher.insert(key.as_str(), course_id.as_str())?;

        let mut users = write_txn.open_table(TABLE_USERS)?;
        let owner_id = caller.id.to_string();
        if let Some(mut owner) = get_json::<User, _>(&users, &owner_id)? {
            owner.courses_created.push(course.id);
            owner.touch();
            put_json(&mut users, &owner_id, &owner)?;
        }
    }
    write_txn.commit()?;

    info!(course_id = %course.id, teacher = %caller.id, "course created");

    Ok((
        StatusCode::CREATED,
        Json(CourseResponse {
            message: "Course created successfully!".to_string(),
            course,
        }),
    ))
}

/// Courses owned by the caller, newest first
pub async fn my_courses(
    State(state): State<AppState>,
    Extension(CurrentUser(caller)): Extension<CurrentUser>,
) -> Result<Json<Vec<Course>>, AppError> {
    let read_txn = state.db.begin_read()?;
    let by_teacher = read_txn.open_table(TABLE_COURSE_TEACHER_INDEX)?;
    let courses = read_txn.open_table(TABLE_COURSES)?;

    let ids = values_with_prefix_rev(&by_teacher, &caller.id.to_string())?;
    Ok(Json(courses_for_ids(&courses, ids)?))
}

/// Appends a video to one of the caller's courses
pub async fn add_video(
    State(state): State<AppState>,
    Extension(CurrentUser(caller)): Extension<CurrentUser>,
    Path(id): Path<String>,
    Json(mut video): Json<Video>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id, COURSE_NOT_FOUND)?;
    validate_video(&video)?;

    let write_txn = state.db.begin_write()?;
    let course = {
        let mut courses = write_txn.open_table(TABLE_COURSES)?;
        let mut course = load_course(&courses, id)?;
        if course.teacher != caller.id {
            return Err(AppError::forbidden("Only the course teacher can add videos"));
        }

        if video.order == 0 {
            video.order = course.videos.len() as u32 + 1;
        }
        course.videos.push(video);
        course::recompute_duration(&mut course);
        course.updated_at = Utc::now();

        put_json(&mut courses, &id.to_string(), &course)?;
        course
    };
    write_txn.commit()?;

    Ok((
        StatusCode::CREATED,
        Json(CourseResponse {
            message: "Video added".to_string(),
            course,
        }),
    ))
}

/// Enrolls the caller in a course
pub async fn enroll(
    State(state): State<AppState>,
    Extension(CurrentUser(caller)): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Result<Json<CourseResponse>, AppError> {
    if !policy::can_enroll(&caller) {
        return Err(AppError::forbidden("Only learners can enroll in courses"));
    }
    let id = parse_id(&id, COURSE_NOT_FOUND)?;

    let write_txn = state.db.begin_write()?;
    let course = {
        let mut courses = write_txn.open_table(TABLE_COURSES)?;
        let mut course = load_course(&courses, id)?;

        if course.teacher == caller.id {
            return Err(AppError::validation("You cannot enroll in your own course"));
        }
        if course.enrolled_students.contains(&caller.id) {
            return Err(AppError::validation("Already enrolled in this course"));
        }

        course.enrolled_students.push(caller.id);
        course.total_enrollments = course.enrolled_students.len() as u32;
        course.updated_at = Utc::now();
        put_json(&mut courses, &id.to_string(), &course)?;

        let mut users = write_txn.open_table(TABLE_USERS)?;
        let student_id = caller.id.to_string();
        if let Some(mut student) = get_json::<User, _>(&users, &student_id)? {
            student.courses_enrolled.push(course.id);
            student.touch();
            put_json(&mut users, &student_id, &student)?;
        }
        course
    };
    write_txn.commit()?;

    info!(course_id = %course.id, student = %caller.id, "student enrolled");

    Ok(Json(CourseResponse {
        message: "Enrolled successfully!".to_string(),
        course,
    }))
}

/// Adds the caller's review and refreshes course and teacher ratings
pub async fn add_review(
    State(state): State<AppState>,
    Extension(CurrentUser(caller)): Extension<CurrentUser>,
    Path(id): Path<String>,
    Json(payload): Json<ReviewRequest>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id, COURSE_NOT_FOUND)?;
    let rating = star_rating(payload.rating)?;
    let comment = payload.comment.unwrap_or_default();
    max_len(&comment, MAX_DESCRIPTION_LEN, "Comment")?;

    let write_txn = state.db.begin_write()?;
    let course = {
        let mut courses = write_txn.open_table(TABLE_COURSES)?;
        let mut course = load_course(&courses, id)?;

        if !course.enrolled_students.contains(&caller.id) {
            return Err(AppError::forbidden(
                "Only enrolled students can review this course",
            ));
        }
        if course.reviews.iter().any(|review| review.user == caller.id) {
            return Err(AppError::validation("You have already reviewed this course"));
        }

        course.reviews.push(Review {
            user: caller.id,
            user_name: caller.username.clone(),
            rating,
            comment,
            date: Utc::now(),
        });
        course::recompute_rating(&mut course);
        course.updated_at = Utc::now();
        put_json(&mut courses, &id.to_string(), &course)?;

        let by_teacher = write_txn.open_table(TABLE_COURSE_TEACHER_INDEX)?;
        let teacher_id = course.teacher.to_string();
        let taught = courses_for_ids(&courses, values_with_prefix_rev(&by_teacher, &teacher_id)?)?;

        let mut users = write_txn.open_table(TABLE_USERS)?;
        if let Some(mut teacher) = get_json::<User, _>(&users, &teacher_id)? {
            teacher.rating = course::teacher_rating(&taught);
            teacher.touch();
            put_json(&mut users, &teacher_id, &teacher)?;
        }
        course
    };
    write_txn.commit()?;

    Ok((
        StatusCode::CREATED,
        Json(CourseResponse {
            message: "Review added".to_string(),
            course,
        }),
    ))
}
