use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::entities::courses;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instructor {
    pub name: String,
    pub title: String,
    pub bio: String,
    pub image: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Syllabus {
    pub title: String,
    #[serde(rename = "fileUrl")]
    pub file_url: String,
}

/// Weekday -> time slot, e.g. {"monday": "18:00-19:30"}
pub type Timetable = BTreeMap<String, String>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseResponse {
    pub id: String,
    pub title: String,
    pub description: String,
    pub price: f64,
    pub duration_weeks: i32,
    pub level: String,
    pub language: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub instructor: Instructor,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub syllabus: Option<Syllabus>,
    pub timetable: Timetable,
    pub created_at: DateTime<Utc>,
}

impl From<courses::Model> for CourseResponse {
    fn from(course: courses::Model) -> Self {
        let syllabus = match (course.syllabus_title, course.syllabus_file_url) {
            (Some(title), Some(file_url)) => Some(Syllabus { title, file_url }),
            _ => None,
        };
        let timetable = course
            .timetable
            .and_then(|value| serde_json::from_value(value).ok())
            .unwrap_or_default();

        Self {
            id: course.id,
            title: course.title,
            description: course.description,
            price: course.price,
            duration_weeks: course.duration_weeks,
            level: course.level,
            language: course.language,
            image: course.image,
            instructor: Instructor {
                name: course.instructor_name,
                title: course.instructor_title,
                bio: course.instructor_bio,
                image: course.instructor_image,
            },
            syllabus,
            timetable,
            created_at: course.created_at,
        }
    }
}

/// Lightweight listing used by the admin panel dropdowns
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseSummary {
    pub id: String,
    pub title: String,
    pub price: f64,
}

/// Instructor as submitted by the admin form; every field is checked
/// individually so the error can name it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InstructorInput {
    pub name: Option<String>,
    pub title: Option<String>,
    pub bio: Option<String>,
    pub image: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateCourseRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub duration_weeks: Option<i32>,
    pub level: Option<String>,
    pub language: Option<String>,
    pub image: Option<String>,
    pub instructor: Option<InstructorInput>,
    pub syllabus: Option<Syllabus>,
    pub timetable: Option<Timetable>,
}

/// A course that passed validation and can be persisted
#[derive(Debug, Clone, PartialEq)]
pub struct NewCourse {
    pub title: String,
    pub description: String,
    pub price: f64,
    pub duration_weeks: i32,
    pub level: String,
    pub language: String,
    pub image: Option<String>,
    pub instructor: Instructor,
    pub syllabus: Option<Syllabus>,
    pub timetable: Option<Timetable>,
}

impl CreateCourseRequest {
    pub fn validate(self) -> Result<NewCourse, String> {
        let title = required("title", self.title)?;
        let description = required("description", self.description)?;
        let price = self
            .price
            .filter(|p| p.is_finite() && *p > 0.0)
            .ok_or_else(|| missing("price"))?;
        let duration_weeks = self
            .duration_weeks
            .filter(|w| *w > 0)
            .ok_or_else(|| missing("duration_weeks"))?;
        let level = required("level", self.level)?;
        let language = required("language", self.language)?;

        let instructor = self.instructor.ok_or_else(|| missing("instructor"))?;
        let instructor = Instructor {
            name: required_instructor("name", instructor.name)?,
            title: required_instructor("title", instructor.title)?,
            bio: required_instructor("bio", instructor.bio)?,
            image: required_instructor("image", instructor.image)?,
        };

        Ok(NewCourse {
            title,
            description,
            price,
            duration_weeks,
            level,
            language,
            image: self.image.filter(|i| !i.trim().is_empty()),
            instructor,
            syllabus: self.syllabus,
            timetable: self.timetable,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateCourseRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub duration_weeks: Option<i32>,
    pub level: Option<String>,
    pub language: Option<String>,
    pub image: Option<String>,
    pub instructor: Option<InstructorInput>,
    pub syllabus: Option<Syllabus>,
    pub timetable: Option<Timetable>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteCourseResponse {
    pub success: bool,
    pub message: String,
    pub data: CourseResponse,
}

fn missing(field: &str) -> String {
    format!("Missing required field: {}", field)
}

fn required(field: &str, value: Option<String>) -> Result<String, String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| missing(field))
}

fn required_instructor(field: &str, value: Option<String>) -> Result<String, String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| format!("Missing required instructor field: {}", field))
}
