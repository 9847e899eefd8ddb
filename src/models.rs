use serde::{Deserialize, Serialize};

pub const XP_PER_LEVEL: i64 = 500;
pub const COMPLETION_XP: i64 = 100;
pub const ACTIVITY_XP: i64 = 25;
pub const MAX_PERFORMANCE_BONUS: i64 = 50;
pub const DEFAULT_PERFORMANCE: i32 = 50;
pub const DEFAULT_TARGET_HOURS: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    Tr,
}

impl Locale {
    pub fn as_str(&self) -> &'static str {
        match self {
            Locale::En => "en",
            Locale::Tr => "tr",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "en" | "english" | "ingilizce" => Some(Locale::En),
            "tr" | "turkish" | "türkçe" | "turkce" => Some(Locale::Tr),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub locale: Locale,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Course {
    pub id: i64,
    pub title: String,
    pub title_tr: Option<String>,
    pub description: Option<String>,
    pub created_at: String,
}

impl Course {
    // Falls back to the English title when no translation exists
    pub fn title_for(&self, locale: Locale) -> &str {
        match (locale, &self.title_tr) {
            (Locale::Tr, Some(tr)) => tr,
            _ => &self.title,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseModule {
    pub id: i64,
    pub course_id: i64,
    pub title: String,
    pub position: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lesson {
    pub id: i64,
    pub module_id: i64,
    pub title: String,
    pub position: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LessonProgress {
    pub id: i64,
    pub user_id: i64,
    pub lesson_id: i64,
    pub completed: bool,
    pub percent: i32,
    pub last_accessed: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseEnrollment {
    pub id: i64,
    pub user_id: i64,
    pub course_id: i64,
    pub percent: i32,
    pub completed: bool,
    pub enrolled_at: String,
    pub last_accessed: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Program {
    pub id: i64,
    pub name: String,
    pub target_hours: f64,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgramProgress {
    pub id: i64,
    pub user_id: i64,
    pub program_id: i64,
    pub completed_hours: f64,
    pub percent: i32,
    pub last_accessed: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GoalStatus {
    Active,
    Completed,
}

impl GoalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GoalStatus::Active => "active",
            GoalStatus::Completed => "completed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "active" => Some(GoalStatus::Active),
            "completed" | "complete" => Some(GoalStatus::Completed),
            _ => None,
        }
    }

    pub fn for_progress(progress: i32) -> Self {
        if progress >= 100 {
            GoalStatus::Completed
        } else {
            GoalStatus::Active
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Goal {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub course_id: Option<i64>,
    pub program_id: Option<i64>,
    pub progress: i32,
    pub status: GoalStatus,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudyHistoryEntry {
    pub id: i64,
    pub goal_id: i64,
    pub studied_on: String,
    pub hours: Option<f64>,
    pub performance: Option<i32>,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserLevel {
    pub user_id: i64,
    pub current_xp: i64,
    pub total_xp: i64,
    pub level: i64,
    pub streak_days: i64,
    pub last_activity: Option<String>,
}

impl UserLevel {
    pub fn fresh(user_id: i64) -> Self {
        Self {
            user_id,
            current_xp: 0,
            total_xp: 0,
            level: 1,
            streak_days: 0,
            last_activity: None,
        }
    }

    pub fn level_for_xp(total_xp: i64) -> i64 {
        total_xp.max(0) / XP_PER_LEVEL + 1
    }

    pub fn xp_to_next_level(&self) -> i64 {
        self.level * XP_PER_LEVEL - self.total_xp
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ActionKind {
    StartLesson,
    CompleteLesson,
    StartCourse,
    CompleteCourse,
}

impl ActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::StartLesson => "start-lesson",
            ActionKind::CompleteLesson => "complete-lesson",
            ActionKind::StartCourse => "start-course",
            ActionKind::CompleteCourse => "complete-course",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "start-lesson" => Some(ActionKind::StartLesson),
            "complete-lesson" => Some(ActionKind::CompleteLesson),
            "start-course" => Some(ActionKind::StartCourse),
            "complete-course" => Some(ActionKind::CompleteCourse),
            _ => None,
        }
    }

    pub fn is_completion(&self) -> bool {
        matches!(self, ActionKind::CompleteLesson | ActionKind::CompleteCourse)
    }
}

/// A single learner action, as posted by the web client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearnerAction {
    pub user_id: i64,
    pub kind: ActionKind,
    #[serde(default)]
    pub lesson_id: Option<i64>,
    #[serde(default)]
    pub course_id: Option<i64>,
    #[serde(default)]
    pub program_id: Option<i64>,
    #[serde(default)]
    pub goal_id: Option<i64>,
    #[serde(default)]
    pub hours_spent: Option<f64>,
    #[serde(default)]
    pub performance_score: Option<i32>,
    #[serde(default)]
    pub request_id: Option<String>,
}

impl LearnerAction {
    pub fn new(user_id: i64, kind: ActionKind) -> Self {
        Self {
            user_id,
            kind,
            lesson_id: None,
            course_id: None,
            program_id: None,
            goal_id: None,
            hours_spent: None,
            performance_score: None,
            request_id: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CascadeFlags {
    pub lesson: bool,
    pub course: bool,
    pub program: bool,
    pub goal: bool,
    pub level: bool,
}

impl CascadeFlags {
    pub fn summary(&self) -> String {
        let levels: Vec<&str> = [
            (self.lesson, "lesson"),
            (self.course, "course"),
            (self.program, "program"),
            (self.goal, "goal"),
            (self.level, "level"),
        ]
        .iter()
        .filter(|(hit, _)| *hit)
        .map(|(_, name)| *name)
        .collect();

        if levels.is_empty() {
            "none".to_string()
        } else {
            levels.join(" -> ")
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CascadeResult {
    pub lesson: Option<LessonProgress>,
    pub course: Option<CourseEnrollment>,
    pub program: Option<ProgramProgress>,
    pub goal: Option<Goal>,
    pub level: Option<UserLevel>,
    pub cascaded: CascadeFlags,
    pub xp_gained: i64,
    pub leveled_up: bool,
    #[serde(default)]
    pub replayed: bool,
}

// JSON output wrapper for CLI
#[derive(Debug, Serialize)]
pub struct JsonOutput<T: Serialize> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T: Serialize> JsonOutput<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(msg.into()),
        }
    }
}
