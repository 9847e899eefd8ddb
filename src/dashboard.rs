//! Read-side aggregation of a learner's courses, goals, programs and level.

use serde::{Deserialize, Serialize};

use crate::db::Database;
use crate::error::{Error, Result};
use crate::models::{
    Course, CourseEnrollment, CourseModule, Goal, GoalStatus, Program, ProgramProgress, User,
    UserLevel,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrolledCourse {
    pub enrollment: CourseEnrollment,
    pub course: Course,
    pub modules: Vec<CourseModule>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgramWithProgress {
    pub program: Program,
    pub progress: ProgramProgress,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardSummary {
    pub total_courses: usize,
    pub completed_courses: usize,
    pub active_goals: usize,
    pub completed_goals: usize,
    pub total_programs: usize,
    pub average_progress: f64,
    pub xp_to_next_level: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LearnerSnapshot {
    pub user: User,
    pub level: UserLevel,
    pub courses: Vec<EnrolledCourse>,
    pub goals: Vec<Goal>,
    pub programs: Vec<ProgramWithProgress>,
    pub summary: DashboardSummary,
}

impl LearnerSnapshot {
    pub fn load(db: &Database, user_id: i64) -> Result<Self> {
        let user = db
            .get_user(user_id)?
            .ok_or_else(|| Error::not_found("user", user_id))?;

        let level = db
            .get_user_level(user_id)?
            .unwrap_or_else(|| UserLevel::fresh(user_id));

        let mut courses = Vec::new();
        for enrollment in db.list_enrollments(user_id)? {
            let Some(course) = db.get_course(enrollment.course_id)? else {
                continue;
            };
            let modules = db.list_modules(course.id)?;
            courses.push(EnrolledCourse {
                enrollment,
                course,
                modules,
            });
        }

        let goals = db.list_goals(user_id)?;

        let mut programs = Vec::new();
        for progress in db.list_program_progress(user_id)? {
            if let Some(program) = db.get_program(progress.program_id)? {
                programs.push(ProgramWithProgress { program, progress });
            }
        }

        let summary = summarize(&level, &courses, &goals, &programs);

        Ok(Self {
            user,
            level,
            courses,
            goals,
            programs,
            summary,
        })
    }
}

pub fn summarize(
    level: &UserLevel,
    courses: &[EnrolledCourse],
    goals: &[Goal],
    programs: &[ProgramWithProgress],
) -> DashboardSummary {
    let average_progress = if courses.is_empty() {
        0.0
    } else {
        let total: i64 = courses.iter().map(|c| c.enrollment.percent as i64).sum();
        total as f64 / courses.len() as f64
    };

    DashboardSummary {
        total_courses: courses.len(),
        completed_courses: courses.iter().filter(|c| c.enrollment.completed).count(),
        active_goals: goals
            .iter()
            .filter(|g| g.status == GoalStatus::Active)
            .count(),
        completed_goals: goals
            .iter()
            .filter(|g| g.status == GoalStatus::Completed)
            .count(),
        total_programs: programs.len(),
        average_progress,
        xp_to_next_level: level.xp_to_next_level(),
    }
}
