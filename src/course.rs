//! Course roll-ups
//!
//! `Course::total_duration` and `Course::rating` are caches over the
//! embedded video and review lists. Call [`recompute_duration`] or
//! [`recompute_rating`] after every change to those lists.

use crate::model::{Course, RatingSummary, Review, Video};

/// Rounds half-up to one decimal place
fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Total running time of `videos` in hours, one decimal
pub fn total_duration(videos: &[Video]) -> f64 {
    let minutes: f64 = videos.iter().map(|video| video.duration.unwrap_or(0.0)).sum();
    round_one_decimal(minutes / 60.0)
}

pub fn rating_summary(reviews: &[Review]) -> RatingSummary {
    if reviews.is_empty() {
        return RatingSummary::default();
    }

    let sum: f64 = reviews.iter().map(|review| f64::from(review.rating)).sum();
    let count = reviews.len();

    RatingSummary {
        average: round_one_decimal(sum / count as f64),
        total_reviews: count as u32,
    }
}

pub fn recompute_duration(course: &mut Course) -> f64 {
    course.total_duration = total_duration(&course.videos);
    course.total_duration
}

pub fn recompute_rating(course: &mut Course) -> RatingSummary {
    course.rating = rating_summary(&course.reviews);
    course.rating
}

/// Teacher rating across every review on the given courses
pub fn teacher_rating<'a>(courses: impl IntoIterator<Item = &'a Course>) -> RatingSummary {
    let reviews: Vec<Review> = courses
        .into_iter()
        .flat_map(|course| course.reviews.iter().cloned())
        .collect();
    rating_summary(&reviews)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn video(minutes: Option<f64>) -> Video {
        Video {
            title: "Lesson".to_string(),
            description: String::new(),
            video_url: "https://videos.example.com/lesson.mp4".to_string(),
            duration: minutes,
            order: 0,
            is_public: true,
        }
    }

    fn review(rating: u8) -> Review {
        Review {
            user: Uuid::new_v4(),
            user_name: "student".to_string(),
            rating,
            comment: String::new(),
            date: Utc::now(),
        }
    }

    #[test]
    fn empty_video_list_has_zero_duration() {
        assert_eq!(total_duration(&[]), 0.0);
    }

    #[test]
    fn ninety_minutes_is_one_and_a_half_hours() {
        let videos = vec![video(Some(30.0)), video(Some(45.0)), video(Some(15.0))];
        assert_eq!(total_duration(&videos), 1.5);
    }

    #[test]
    fn duration_ignores_video_order() {
        let mut videos = vec![video(Some(12.0)), video(Some(47.0)), video(Some(3.0)), video(None)];
        let expected = total_duration(&videos);
        videos.reverse();
        assert_eq!(total_duration(&videos), expected);
        videos.swap(0, 2);
        assert_eq!(total_duration(&videos), expected);
    }

    #[test]
    fn missing_durations_count_as_zero() {
        let videos = vec![video(None), video(Some(60.0))];
        assert_eq!(total_duration(&videos), 1.0);
    }

    #[test]
    fn duration_rounds_to_one_decimal() {
        // 100 minutes = 1.666.. hours
        assert_eq!(total_duration(&[video(Some(100.0))]), 1.7);
        // 20 minutes = 0.333.. hours
        assert_eq!(total_duration(&[video(Some(20.0))]), 0.3);
    }

    #[test]
    fn no_reviews_means_zero_rating() {
        assert_eq!(rating_summary(&[]), RatingSummary::default());
    }

    #[test]
    fn single_review_sets_the_average() {
        for stars in 1..=5u8 {
            let summary = rating_summary(&[review(stars)]);
            assert_eq!(summary.average, f64::from(stars));
            assert_eq!(summary.total_reviews, 1);
        }
    }

    #[test]
    fn average_is_rounded_to_one_decimal() {
        let summary = rating_summary(&[review(5), review(4), review(4)]);
        assert_eq!(summary.average, 4.3);
        assert_eq!(summary.total_reviews, 3);
    }
}
