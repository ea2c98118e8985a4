use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entities::{courses, enrollments};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnrollmentStatus {
    Active,
    Completed,
    Cancelled,
}

impl EnrollmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EnrollmentStatus::Active => "active",
            EnrollmentStatus::Completed => "completed",
            EnrollmentStatus::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for EnrollmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for EnrollmentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "active" => Ok(EnrollmentStatus::Active),
            "completed" => Ok(EnrollmentStatus::Completed),
            "cancelled" => Ok(EnrollmentStatus::Cancelled),
            _ => Err(format!("Unknown enrollment status: {}", s)),
        }
    }
}

/// How a front-end refers to a course: a bare id, or the populated course
/// document it already holds. Resolved to an id once, at the API boundary.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "CourseRefRepr")]
pub enum CourseRef {
    Reference(String),
    Embedded(EmbeddedCourse),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EmbeddedCourse {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CourseRefRepr {
    Id(String),
    Course(EmbeddedCourse),
}

impl From<CourseRefRepr> for CourseRef {
    fn from(repr: CourseRefRepr) -> Self {
        match repr {
            CourseRefRepr::Id(id) => CourseRef::Reference(id),
            CourseRefRepr::Course(course) => CourseRef::Embedded(course),
        }
    }
}

impl CourseRef {
    pub fn id(&self) -> &str {
        match self {
            CourseRef::Reference(id) => id,
            CourseRef::Embedded(course) => &course.id,
        }
    }

    pub fn title(&self) -> Option<&str> {
        match self {
            CourseRef::Reference(_) => None,
            CourseRef::Embedded(course) => course.title.as_deref(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseSnapshot {
    pub title: String,
    pub description: String,
    pub image: Option<String>,
    pub price: f64,
    pub duration_weeks: i32,
    pub level: String,
}

impl CourseSnapshot {
    pub fn from_course(course: &courses::Model) -> Self {
        Self {
            title: course.title.clone(),
            description: course.description.clone(),
            image: course.image.clone(),
            price: course.price,
            duration_weeks: course.duration_weeks,
            level: course.level.clone(),
        }
    }

    pub fn from_enrollment(record: &enrollments::Model) -> Self {
        Self {
            title: record.course_title.clone(),
            description: record.course_description.clone(),
            image: record.course_image.clone(),
            price: record.price,
            duration_weeks: record.course_duration_weeks,
            level: record.course_level.clone(),
        }
    }
}

/// Read projection of an enrollment, joined with the live course when it
/// still exists and falling back to the snapshot taken at enrollment time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrollmentView {
    pub id: String,
    pub user_id: String,
    pub email: String,
    pub course_id: String,
    pub course: CourseSnapshot,
    pub course_name: String,
    pub price: f64,
    pub status: String,
    pub progress: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
    pub enrolled_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl EnrollmentView {
    pub fn new(record: enrollments::Model, live_course: Option<&courses::Model>) -> Self {
        let course = match live_course {
            Some(course) => CourseSnapshot::from_course(course),
            None => CourseSnapshot::from_enrollment(&record),
        };

        Self {
            course_name: live_course
                .map(|c| c.title.clone())
                .unwrap_or_else(|| record.course_name.clone()),
            price: live_course.map(|c| c.price).unwrap_or(record.price),
            course,
            id: record.id,
            user_id: record.user_id,
            email: record.email,
            course_id: record.course_id,
            status: record.status,
            progress: record.progress,
            order_id: record.order_id,
            enrolled_at: record.enrolled_at,
            completed_at: record.completed_at,
        }
    }
}

impl From<enrollments::Model> for EnrollmentView {
    fn from(record: enrollments::Model) -> Self {
        Self::new(record, None)
    }
}

/// Request body for POST /api/enrollments (enrollment without payment)
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectEnrollRequest {
    pub user_id: Option<String>,
    pub course_id: Option<CourseRef>,
    pub course_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectEnrollResponse {
    pub message: String,
    pub enrollment: EnrollmentView,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateEnrollmentRequest {
    pub status: Option<String>,
    pub progress: Option<i32>,
}
