//! Progress cascade: one learner action propagated through
//! lesson -> course -> program -> goal -> level.
//!
//! Every step reads the writes of the step before it, and the whole sequence
//! runs inside a single write transaction. A failure at any step leaves the
//! database exactly as it was.

use chrono::{DateTime, NaiveDate, Utc};
use tracing::{debug, error, info};

use crate::db::Database;
use crate::error::{Error, Result};
use crate::models::{
    ActionKind, CascadeFlags, CascadeResult, CourseEnrollment, Goal, GoalStatus, LearnerAction,
    LessonProgress, ProgramProgress, UserLevel, ACTIVITY_XP, COMPLETION_XP, DEFAULT_PERFORMANCE,
    MAX_PERFORMANCE_BONUS,
};

pub fn apply_action(db: &Database, action: &LearnerAction) -> Result<CascadeResult> {
    apply_action_at(db, action, Utc::now())
}

/// Same as [`apply_action`] with an explicit clock, which drives timestamps,
/// study-history dates and streaks.
pub fn apply_action_at(
    db: &Database,
    action: &LearnerAction,
    now: DateTime<Utc>,
) -> Result<CascadeResult> {
    validate(action)?;

    let tx = db.write_transaction()?;
    match run(db, action, now) {
        Ok(result) => {
            tx.commit()?;
            info!(
                user_id = action.user_id,
                kind = action.kind.as_str(),
                cascaded = %result.cascaded.summary(),
                xp_gained = result.xp_gained,
                replayed = result.replayed,
                "cascade applied"
            );
            Ok(result)
        }
        Err(e) => {
            // Dropping the transaction rolls back every step already written
            drop(tx);
            error!(
                user_id = action.user_id,
                kind = action.kind.as_str(),
                error = %e,
                "cascade failed, rolled back"
            );
            Err(e)
        }
    }
}

fn validate(action: &LearnerAction) -> Result<()> {
    if let Some(score) = action.performance_score {
        if !(0..=100).contains(&score) {
            return Err(Error::InvalidInput(format!(
                "performance score must be between 0 and 100, got {}",
                score
            )));
        }
    }

    if let Some(hours) = action.hours_spent {
        if !hours.is_finite() || hours < 0.0 {
            return Err(Error::InvalidInput(format!(
                "hours spent must be a non-negative number, got {}",
                hours
            )));
        }
    }

    Ok(())
}

fn run(db: &Database, action: &LearnerAction, now: DateTime<Utc>) -> Result<CascadeResult> {
    if let Some(request_id) = &action.request_id {
        if let Some(stored) = db.find_cascade_result(action.user_id, request_id)? {
            debug!(request_id = %request_id, "replaying stored cascade result");
            let mut result: CascadeResult = serde_json::from_str(&stored)?;
            result.replayed = true;
            return Ok(result);
        }
    }

    if db.get_user(action.user_id)?.is_none() {
        return Err(Error::not_found("user", action.user_id));
    }

    let stamp = now.to_rfc3339();
    let mut flags = CascadeFlags::default();

    let lesson = cascade_lesson(db, action, &stamp)?;
    flags.lesson = lesson.is_some();

    let course = cascade_course(db, action, &stamp)?;
    flags.course = course.is_some();

    let program = cascade_program(db, action, course.as_ref(), &stamp)?;
    flags.program = program.is_some();

    let goal = cascade_goal(db, action, course.as_ref(), program.as_ref(), now)?;
    flags.goal = goal.is_some();

    let (level, xp_gained, leveled_up) = cascade_level(db, action, now)?;
    flags.level = true;

    let result = CascadeResult {
        lesson,
        course,
        program,
        goal,
        level: Some(level),
        cascaded: flags,
        xp_gained,
        leveled_up,
        replayed: false,
    };

    if let Some(request_id) = &action.request_id {
        let body = serde_json::to_string(&result)?;
        db.record_cascade(request_id, action.user_id, action.kind.as_str(), &body, &stamp)?;
    }

    Ok(result)
}

fn cascade_lesson(
    db: &Database,
    action: &LearnerAction,
    stamp: &str,
) -> Result<Option<LessonProgress>> {
    let Some(lesson_id) = action.lesson_id else {
        return Ok(None);
    };

    if db.get_lesson(lesson_id)?.is_none() {
        debug!(lesson_id, "lesson not found, skipping lesson step");
        return Ok(None);
    }

    // A completed lesson stays completed; re-opening it only touches the timestamp
    let already_completed = db
        .get_lesson_progress(action.user_id, lesson_id)?
        .is_some_and(|p| p.completed);

    let (completed, percent) = if action.kind.is_completion() || already_completed {
        (true, 100)
    } else {
        (
            false,
            action.performance_score.unwrap_or(DEFAULT_PERFORMANCE),
        )
    };

    db.upsert_lesson_progress(action.user_id, lesson_id, completed, percent, stamp)?;
    debug!(lesson_id, completed, percent, "lesson progress written");

    Ok(db.get_lesson_progress(action.user_id, lesson_id)?)
}

fn cascade_course(
    db: &Database,
    action: &LearnerAction,
    stamp: &str,
) -> Result<Option<CourseEnrollment>> {
    let Some(course_id) = action.course_id else {
        return Ok(None);
    };

    if db.get_enrollment(action.user_id, course_id)?.is_none() {
        debug!(course_id, "user not enrolled, skipping course step");
        return Ok(None);
    }

    let (completed_lessons, total_lessons) = db.course_lesson_counts(action.user_id, course_id)?;
    let percent = course_percent(completed_lessons, total_lessons);

    db.update_enrollment(action.user_id, course_id, percent, percent == 100, stamp)?;
    debug!(
        course_id,
        completed_lessons, total_lessons, percent, "course progress recomputed"
    );

    Ok(db.get_enrollment(action.user_id, course_id)?)
}

fn cascade_program(
    db: &Database,
    action: &LearnerAction,
    course: Option<&CourseEnrollment>,
    stamp: &str,
) -> Result<Option<ProgramProgress>> {
    let Some(program_id) = action.program_id else {
        return Ok(None);
    };

    let Some(program) = db.get_program(program_id)? else {
        debug!(program_id, "program not found, skipping program step");
        return Ok(None);
    };

    let previous_hours = db
        .get_program_progress(action.user_id, program_id)?
        .map(|p| p.completed_hours)
        .unwrap_or(0.0);

    let course_pct = course.map(|c| c.percent);
    let completed_hours = previous_hours
        + action.hours_spent.unwrap_or(0.0)
        + course_pct.unwrap_or(0) as f64 / 100.0;

    let percent = match (action.kind.is_completion(), course_pct) {
        (true, Some(p)) => p,
        _ => hours_percent(completed_hours, program.target_hours),
    };

    db.upsert_program_progress(action.user_id, program_id, completed_hours, percent, stamp)?;
    debug!(program_id, completed_hours, percent, "program progress written");

    Ok(db.get_program_progress(action.user_id, program_id)?)
}

fn cascade_goal(
    db: &Database,
    action: &LearnerAction,
    course: Option<&CourseEnrollment>,
    program: Option<&ProgramProgress>,
    now: DateTime<Utc>,
) -> Result<Option<Goal>> {
    let Some(goal_id) = action.goal_id else {
        return Ok(None);
    };

    let goal = match db.get_goal(goal_id)? {
        Some(g) if g.user_id == action.user_id => g,
        Some(_) => {
            debug!(goal_id, "goal belongs to another user, skipping goal step");
            return Ok(None);
        }
        None => {
            debug!(goal_id, "goal not found, skipping goal step");
            return Ok(None);
        }
    };

    let progress = program
        .map(|p| p.percent)
        .or_else(|| course.map(|c| c.percent))
        .unwrap_or(0)
        .clamp(0, 100);
    let status = GoalStatus::for_progress(progress);
    let stamp = now.to_rfc3339();

    db.update_goal_progress(goal.id, progress, status, &stamp)?;

    if action.hours_spent.is_some() || action.performance_score.is_some() {
        let studied_on = now.date_naive().to_string();
        db.add_study_history(
            goal.id,
            &studied_on,
            action.hours_spent,
            action.performance_score,
            &stamp,
        )?;
    }
    debug!(goal_id, progress, status = status.as_str(), "goal progress written");

    Ok(db.get_goal(goal.id)?)
}

fn cascade_level(
    db: &Database,
    action: &LearnerAction,
    now: DateTime<Utc>,
) -> Result<(UserLevel, i64, bool)> {
    let mut level = db
        .get_user_level(action.user_id)?
        .unwrap_or_else(|| UserLevel::fresh(action.user_id));

    let gained = xp_gain(action.kind, action.performance_score);
    let previous_level = level.level;

    level.current_xp += gained;
    level.total_xp += gained;
    level.level = UserLevel::level_for_xp(level.total_xp);
    level.streak_days = next_streak(
        level.last_activity.as_deref(),
        level.streak_days,
        now.date_naive(),
    );
    level.last_activity = Some(now.to_rfc3339());

    db.save_user_level(&level)?;
    debug!(
        total_xp = level.total_xp,
        level = level.level,
        streak = level.streak_days,
        "level written"
    );

    let leveled_up = level.level > previous_level;
    Ok((level, gained, leveled_up))
}

/// XP for one action: a fixed base plus up to 50 for performance.
/// A missing score counts as 50.
pub fn xp_gain(kind: ActionKind, performance_score: Option<i32>) -> i64 {
    let base = if kind.is_completion() {
        COMPLETION_XP
    } else {
        ACTIVITY_XP
    };
    let score = performance_score.unwrap_or(DEFAULT_PERFORMANCE).clamp(0, 100) as i64;
    base + score * MAX_PERFORMANCE_BONUS / 100
}

pub fn course_percent(completed_lessons: i64, total_lessons: i64) -> i32 {
    if total_lessons <= 0 {
        return 0;
    }
    let completed = completed_lessons.clamp(0, total_lessons);
    ((completed as f64 / total_lessons as f64) * 100.0).round() as i32
}

pub fn hours_percent(completed_hours: f64, target_hours: f64) -> i32 {
    if target_hours <= 0.0 {
        return 0;
    }
    ((completed_hours / target_hours) * 100.0).round().clamp(0.0, 100.0) as i32
}

fn next_streak(last_activity: Option<&str>, streak: i64, today: NaiveDate) -> i64 {
    let last_day = last_activity
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc).date_naive());

    match last_day {
        Some(day) if day == today => streak.max(1),
        Some(day) if today.pred_opt() == Some(day) => streak + 1,
        _ => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Locale;
    use chrono::TimeZone;

    struct Fixture {
        db: Database,
        user: i64,
        course: i64,
        lessons: Vec<i64>,
    }

    // Two modules with two lessons each, user enrolled
    fn setup() -> Fixture {
        let db = Database::open(":memory:").expect("Failed to create in-memory database");
        db.init().expect("Failed to initialize database");

        let user = db.add_user("Zeynep", Locale::Tr).unwrap();
        let course = db.add_course("Geometry", Some("Geometri"), None).unwrap();
        let m1 = db.add_module(course, "Angles", 1).unwrap();
        let m2 = db.add_module(course, "Triangles", 2).unwrap();
        let lessons = vec![
            db.add_lesson(m1, "Acute", 1).unwrap(),
            db.add_lesson(m1, "Obtuse", 2).unwrap(),
            db.add_lesson(m2, "Pythagoras", 1).unwrap(),
            db.add_lesson(m2, "Similarity", 2).unwrap(),
        ];
        db.enroll(user, course).unwrap();

        Fixture {
            db,
            user,
            course,
            lessons,
        }
    }

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
    }

    fn lesson_action(f: &Fixture, kind: ActionKind, lesson: usize) -> LearnerAction {
        LearnerAction {
            lesson_id: Some(f.lessons[lesson]),
            course_id: Some(f.course),
            ..LearnerAction::new(f.user, kind)
        }
    }

    mod lesson_step_tests {
        use super::*;

        #[test]
        fn complete_lesson_ignores_score() {
            let f = setup();
            let action = LearnerAction {
                performance_score: Some(30),
                ..lesson_action(&f, ActionKind::CompleteLesson, 0)
            };

            let result = apply_action(&f.db, &action).unwrap();
            let lesson = result.lesson.unwrap();
            assert!(lesson.completed);
            assert_eq!(lesson.percent, 100);
            assert!(result.cascaded.lesson);
        }

        #[test]
        fn start_lesson_uses_score() {
            let f = setup();
            let action = LearnerAction {
                performance_score: Some(70),
                ..lesson_action(&f, ActionKind::StartLesson, 0)
            };

            let lesson = apply_action(&f.db, &action).unwrap().lesson.unwrap();
            assert!(!lesson.completed);
            assert_eq!(lesson.percent, 70);
        }

        #[test]
        fn start_lesson_defaults_to_50() {
            let f = setup();
            let action = lesson_action(&f, ActionKind::StartLesson, 0);

            let lesson = apply_action(&f.db, &action).unwrap().lesson.unwrap();
            assert_eq!(lesson.percent, 50);
        }

        #[test]
        fn restarting_completed_lesson_keeps_completion() {
            let f = setup();
            apply_action(&f.db, &lesson_action(&f, ActionKind::CompleteLesson, 0)).unwrap();

            let action = LearnerAction {
                performance_score: Some(20),
                ..lesson_action(&f, ActionKind::StartLesson, 0)
            };
            let lesson = apply_action(&f.db, &action).unwrap().lesson.unwrap();
            assert!(lesson.completed);
            assert_eq!(lesson.percent, 100);
        }

        #[test]
        fn unknown_lesson_is_skipped() {
            let f = setup();
            let action = LearnerAction {
                lesson_id: Some(9999),
                ..LearnerAction::new(f.user, ActionKind::StartLesson)
            };

            let result = apply_action(&f.db, &action).unwrap();
            assert!(result.lesson.is_none());
            assert!(!result.cascaded.lesson);
        }
    }

    mod course_step_tests {
        use super::*;

        #[test]
        fn percent_counts_only_this_course() {
            let f = setup();
            let result =
                apply_action(&f.db, &lesson_action(&f, ActionKind::CompleteLesson, 0)).unwrap();

            // One of four lessons, not one per module
            let course = result.course.unwrap();
            assert_eq!(course.percent, 25);
            assert!(!course.completed);
        }

        #[test]
        fn completions_elsewhere_do_not_leak_in() {
            let f = setup();
            let other = f.db.add_course("Music", None, None).unwrap();
            let module = f.db.add_module(other, "Rhythm", 1).unwrap();
            let outside = f.db.add_lesson(module, "Tempo", 1).unwrap();
            let action = LearnerAction {
                lesson_id: Some(outside),
                ..LearnerAction::new(f.user, ActionKind::CompleteLesson)
            };
            apply_action(&f.db, &action).unwrap();

            let action = LearnerAction {
                course_id: Some(f.course),
                ..LearnerAction::new(f.user, ActionKind::StartCourse)
            };
            let course = apply_action(&f.db, &action).unwrap().course.unwrap();
            assert_eq!(course.percent, 0);
        }

        #[test]
        fn repeated_cascade_is_stable() {
            let f = setup();
            apply_action(&f.db, &lesson_action(&f, ActionKind::CompleteLesson, 0)).unwrap();
            apply_action(&f.db, &lesson_action(&f, ActionKind::CompleteLesson, 2)).unwrap();

            let action = LearnerAction {
                course_id: Some(f.course),
                ..LearnerAction::new(f.user, ActionKind::StartCourse)
            };
            let first = apply_action(&f.db, &action).unwrap().course.unwrap();
            let second = apply_action(&f.db, &action).unwrap().course.unwrap();
            assert_eq!(first.percent, 50);
            assert_eq!(first.percent, second.percent);
        }

        #[test]
        fn all_lessons_complete_course() {
            let f = setup();
            let mut last = None;
            for i in 0..f.lessons.len() {
                last = Some(
                    apply_action(&f.db, &lesson_action(&f, ActionKind::CompleteLesson, i))
                        .unwrap(),
                );
            }

            let course = last.unwrap().course.unwrap();
            assert_eq!(course.percent, 100);
            assert!(course.completed);
            assert!(course.last_accessed.is_some());
        }

        #[test]
        fn not_enrolled_is_skipped() {
            let f = setup();
            let other = f.db.add_course("Art", None, None).unwrap();
            let action = LearnerAction {
                course_id: Some(other),
                ..LearnerAction::new(f.user, ActionKind::StartCourse)
            };

            let result = apply_action(&f.db, &action).unwrap();
            assert!(result.course.is_none());
            assert!(!result.cascaded.course);
        }
    }

    mod program_step_tests {
        use super::*;

        #[test]
        fn hours_accumulate_against_target() {
            let f = setup();
            let program = f.db.add_program("YKS Prep", 10.0).unwrap();
            let action = LearnerAction {
                program_id: Some(program),
                hours_spent: Some(2.0),
                ..LearnerAction::new(f.user, ActionKind::StartCourse)
            };

            let first = apply_action(&f.db, &action).unwrap().program.unwrap();
            assert_eq!(first.completed_hours, 2.0);
            assert_eq!(first.percent, 20);

            let second = apply_action(&f.db, &action).unwrap().program.unwrap();
            assert_eq!(second.completed_hours, 4.0);
            assert_eq!(second.percent, 40);
        }

        #[test]
        fn completion_carries_course_percent() {
            let f = setup();
            let program = f.db.add_program("YKS Prep", 100.0).unwrap();
            let action = LearnerAction {
                program_id: Some(program),
                hours_spent: Some(1.0),
                ..lesson_action(&f, ActionKind::CompleteLesson, 0)
            };

            let program = apply_action(&f.db, &action).unwrap().program.unwrap();
            assert_eq!(program.percent, 25);
            // 1 hour spent plus a quarter hour credited from the course percent
            assert_eq!(program.completed_hours, 1.25);
        }

        #[test]
        fn hours_percent_caps_at_100() {
            let f = setup();
            let program = f.db.add_program("Sprint", 1.0).unwrap();
            let action = LearnerAction {
                program_id: Some(program),
                hours_spent: Some(5.0),
                ..LearnerAction::new(f.user, ActionKind::StartLesson)
            };

            let program = apply_action(&f.db, &action).unwrap().program.unwrap();
            assert_eq!(program.percent, 100);
        }

        #[test]
        fn unknown_program_is_skipped() {
            let f = setup();
            let action = LearnerAction {
                program_id: Some(42),
                ..LearnerAction::new(f.user, ActionKind::StartLesson)
            };

            let result = apply_action(&f.db, &action).unwrap();
            assert!(result.program.is_none());
            assert!(!result.cascaded.program);
        }
    }

    mod goal_step_tests {
        use super::*;

        #[test]
        fn goal_follows_course_percent() {
            let f = setup();
            let goal = f.db.add_goal(f.user, "Finish geometry", Some(f.course), None).unwrap();
            let action = LearnerAction {
                goal_id: Some(goal),
                ..lesson_action(&f, ActionKind::CompleteLesson, 0)
            };

            let goal = apply_action(&f.db, &action).unwrap().goal.unwrap();
            assert_eq!(goal.progress, 25);
            assert_eq!(goal.status, GoalStatus::Active);
        }

        #[test]
        fn goal_prefers_program_percent() {
            let f = setup();
            let program = f.db.add_program("Sprint", 10.0).unwrap();
            let goal = f.db.add_goal(f.user, "Study", None, Some(program)).unwrap();
            let action = LearnerAction {
                program_id: Some(program),
                goal_id: Some(goal),
                hours_spent: Some(6.0),
                ..lesson_action(&f, ActionKind::StartLesson, 0)
            };

            let goal = apply_action(&f.db, &action).unwrap().goal.unwrap();
            assert_eq!(goal.progress, 60);
        }

        #[test]
        fn goal_without_sources_is_zero() {
            let f = setup();
            let goal = f.db.add_goal(f.user, "Someday", None, None).unwrap();
            let action = LearnerAction {
                goal_id: Some(goal),
                ..LearnerAction::new(f.user, ActionKind::StartLesson)
            };

            let goal = apply_action(&f.db, &action).unwrap().goal.unwrap();
            assert_eq!(goal.progress, 0);
            assert_eq!(goal.status, GoalStatus::Active);
        }

        #[test]
        fn goal_completes_at_100() {
            let f = setup();
            let program = f.db.add_program("Sprint", 10.0).unwrap();
            let goal = f.db.add_goal(f.user, "Sprint goal", None, Some(program)).unwrap();
            let action = LearnerAction {
                program_id: Some(program),
                goal_id: Some(goal),
                hours_spent: Some(25.0),
                ..LearnerAction::new(f.user, ActionKind::StartLesson)
            };

            let goal = apply_action(&f.db, &action).unwrap().goal.unwrap();
            assert_eq!(goal.progress, 100);
            assert_eq!(goal.status, GoalStatus::Completed);
        }

        #[test]
        fn study_history_written_when_hours_or_score_given() {
            let f = setup();
            let goal = f.db.add_goal(f.user, "Daily", None, None).unwrap();

            let bare = LearnerAction {
                goal_id: Some(goal),
                ..LearnerAction::new(f.user, ActionKind::StartLesson)
            };
            apply_action_at(&f.db, &bare, at(2026, 5, 1)).unwrap();
            assert!(f.db.list_study_history(goal).unwrap().is_empty());

            let scored = LearnerAction {
                performance_score: Some(90),
                ..bare.clone()
            };
            apply_action_at(&f.db, &scored, at(2026, 5, 2)).unwrap();

            let history = f.db.list_study_history(goal).unwrap();
            assert_eq!(history.len(), 1);
            assert_eq!(history[0].studied_on, "2026-05-02");
            assert_eq!(history[0].performance, Some(90));
            assert!(history[0].hours.is_none());
        }

        #[test]
        fn other_users_goal_is_untouched() {
            let f = setup();
            let stranger = f.db.add_user("Jane", Locale::En).unwrap();
            let goal = f.db.add_goal(stranger, "Not yours", None, None).unwrap();
            let action = LearnerAction {
                goal_id: Some(goal),
                hours_spent: Some(1.0),
                ..lesson_action(&f, ActionKind::CompleteLesson, 0)
            };

            let result = apply_action(&f.db, &action).unwrap();
            assert!(result.goal.is_none());
            assert!(!result.cascaded.goal);
            assert!(f.db.list_study_history(goal).unwrap().is_empty());
        }
    }

    mod level_step_tests {
        use super::*;

        #[test]
        fn xp_gain_formula() {
            assert_eq!(xp_gain(ActionKind::CompleteLesson, Some(80)), 140);
            assert_eq!(xp_gain(ActionKind::StartLesson, None), 50);
            assert_eq!(xp_gain(ActionKind::StartCourse, Some(0)), 25);
            assert_eq!(xp_gain(ActionKind::CompleteCourse, Some(100)), 150);
            assert_eq!(xp_gain(ActionKind::StartLesson, Some(45)), 47);
        }

        #[test]
        fn level_up_across_boundary() {
            let f = setup();
            let mut level = UserLevel::fresh(f.user);
            level.current_xp = 480;
            level.total_xp = 480;
            f.db.save_user_level(&level).unwrap();

            let action = LearnerAction {
                performance_score: Some(80),
                ..LearnerAction::new(f.user, ActionKind::CompleteLesson)
            };
            let result = apply_action(&f.db, &action).unwrap();

            let level = result.level.unwrap();
            assert_eq!(result.xp_gained, 140);
            assert_eq!(level.total_xp, 620);
            assert_eq!(level.current_xp, 620);
            assert_eq!(level.level, 2);
            assert!(result.leveled_up);
        }

        #[test]
        fn level_created_lazily() {
            let f = setup();
            assert!(f.db.get_user_level(f.user).unwrap().is_none());

            let result =
                apply_action(&f.db, &LearnerAction::new(f.user, ActionKind::StartLesson)).unwrap();

            let level = result.level.unwrap();
            assert_eq!(level.total_xp, 50);
            assert_eq!(level.level, 1);
            assert!(!result.leveled_up);
            assert!(result.cascaded.level);
        }

        #[test]
        fn xp_strictly_increases() {
            let f = setup();
            let action = LearnerAction {
                performance_score: Some(0),
                ..LearnerAction::new(f.user, ActionKind::StartLesson)
            };
            let mut previous = 0;
            for _ in 0..5 {
                let level = apply_action(&f.db, &action).unwrap().level.unwrap();
                assert!(level.total_xp > previous);
                previous = level.total_xp;
            }
        }

        #[test]
        fn streak_counts_consecutive_days() {
            let f = setup();
            let action = LearnerAction::new(f.user, ActionKind::StartLesson);

            let day1 = apply_action_at(&f.db, &action, at(2026, 3, 1)).unwrap();
            assert_eq!(day1.level.unwrap().streak_days, 1);

            let same_day = apply_action_at(&f.db, &action, at(2026, 3, 1)).unwrap();
            assert_eq!(same_day.level.unwrap().streak_days, 1);

            let day2 = apply_action_at(&f.db, &action, at(2026, 3, 2)).unwrap();
            assert_eq!(day2.level.unwrap().streak_days, 2);

            let gap = apply_action_at(&f.db, &action, at(2026, 3, 5)).unwrap();
            assert_eq!(gap.level.unwrap().streak_days, 1);
        }
    }

    mod contract_tests {
        use super::*;

        #[test]
        fn missing_ids_only_cascade_level() {
            let f = setup();
            let result =
                apply_action(&f.db, &LearnerAction::new(f.user, ActionKind::StartCourse)).unwrap();

            assert!(result.lesson.is_none());
            assert!(result.course.is_none());
            assert!(result.program.is_none());
            assert!(result.goal.is_none());
            assert!(result.level.is_some());
            assert_eq!(
                result.cascaded,
                CascadeFlags {
                    level: true,
                    ..CascadeFlags::default()
                }
            );
        }

        #[test]
        fn unknown_user_is_not_found() {
            let f = setup();
            let result = apply_action(&f.db, &LearnerAction::new(999, ActionKind::StartLesson));
            assert!(matches!(result, Err(Error::NotFound { entity: "user", id: 999 })));
        }

        #[test]
        fn out_of_range_score_rejected() {
            let f = setup();
            let action = LearnerAction {
                performance_score: Some(120),
                ..lesson_action(&f, ActionKind::StartLesson, 0)
            };

            assert!(matches!(
                apply_action(&f.db, &action),
                Err(Error::InvalidInput(_))
            ));
            assert!(f.db.get_lesson_progress(f.user, f.lessons[0]).unwrap().is_none());
        }

        #[test]
        fn negative_hours_rejected() {
            let f = setup();
            let action = LearnerAction {
                hours_spent: Some(-1.0),
                ..LearnerAction::new(f.user, ActionKind::StartLesson)
            };
            assert!(matches!(
                apply_action(&f.db, &action),
                Err(Error::InvalidInput(_))
            ));
        }

        #[test]
        fn failure_rolls_back_earlier_steps() {
            let f = setup();
            f.db.conn()
                .execute_batch(
                    r#"
                    CREATE TRIGGER fail_level BEFORE INSERT ON user_levels
                    BEGIN
                        SELECT RAISE(ABORT, 'level store unavailable');
                    END;
                    "#,
                )
                .unwrap();

            let result = apply_action(&f.db, &lesson_action(&f, ActionKind::CompleteLesson, 0));
            assert!(matches!(result, Err(Error::Database(_))));

            assert!(f.db.get_lesson_progress(f.user, f.lessons[0]).unwrap().is_none());
            let enrollment = f.db.get_enrollment(f.user, f.course).unwrap().unwrap();
            assert_eq!(enrollment.percent, 0);
            assert!(enrollment.last_accessed.is_none());
        }

        #[test]
        fn replayed_request_grants_xp_once() {
            let f = setup();
            let action = LearnerAction {
                request_id: Some("client-retry-1".to_string()),
                ..lesson_action(&f, ActionKind::CompleteLesson, 0)
            };

            let first = apply_action(&f.db, &action).unwrap();
            let second = apply_action(&f.db, &action).unwrap();

            assert!(!first.replayed);
            assert!(second.replayed);
            assert_eq!(second.xp_gained, first.xp_gained);

            let stored = f.db.get_user_level(f.user).unwrap().unwrap();
            assert_eq!(stored.total_xp, first.xp_gained);
        }

        #[test]
        fn request_id_reused_by_another_user_still_applies() {
            let f = setup();
            let other = f.db.add_user("Emre", Locale::Tr).unwrap();

            let first = LearnerAction {
                request_id: Some("r1".to_string()),
                ..lesson_action(&f, ActionKind::CompleteLesson, 0)
            };
            apply_action(&f.db, &first).unwrap();

            let second = LearnerAction {
                request_id: Some("r1".to_string()),
                ..LearnerAction::new(other, ActionKind::StartLesson)
            };
            let result = apply_action(&f.db, &second).unwrap();

            assert!(!result.replayed);
            assert_eq!(result.xp_gained, 50);
            assert_eq!(result.level.as_ref().unwrap().user_id, other);

            let stored = f.db.get_user_level(other).unwrap().unwrap();
            assert_eq!(stored.total_xp, 50);
            assert_eq!(f.db.get_user_level(f.user).unwrap().unwrap().total_xp, 125);

            // Each user's own retry still replays
            assert!(apply_action(&f.db, &second).unwrap().replayed);
            assert!(apply_action(&f.db, &first).unwrap().replayed);
        }

        #[test]
        fn result_serializes_camel_case() {
            let f = setup();
            let result =
                apply_action(&f.db, &lesson_action(&f, ActionKind::CompleteLesson, 0)).unwrap();
            let json = serde_json::to_value(&result).unwrap();

            assert_eq!(json["xpGained"], 125);
            assert_eq!(json["cascaded"]["lesson"], true);
            assert_eq!(json["cascaded"]["program"], false);
            assert!(json["program"].is_null());
        }
    }

    mod concurrency_tests {
        use super::*;
        use std::path::Path;
        use std::thread;
        use std::time::Duration;

        fn open_shared(path: &Path, timeout_ms: u64) -> Database {
            let db = Database::open(path).unwrap();
            db.set_busy_timeout(Duration::from_millis(timeout_ms)).unwrap();
            db
        }

        #[test]
        fn held_write_lock_makes_second_writer_busy() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("akademi.db");

            let first = open_shared(&path, 50);
            first.init().unwrap();
            let user = first.add_user("Selin", Locale::Tr).unwrap();
            let second = open_shared(&path, 50);

            let action = LearnerAction::new(user, ActionKind::StartLesson);
            {
                let tx = first.write_transaction().unwrap();
                let result = apply_action(&second, &action);
                assert!(matches!(
                    result,
                    Err(Error::Database(rusqlite::Error::SqliteFailure(err, _)))
                        if err.code == rusqlite::ErrorCode::DatabaseBusy
                ));
                tx.commit().unwrap();
            }
            assert!(second.get_user_level(user).unwrap().is_none());

            apply_action(&second, &action).unwrap();
            apply_action(&first, &LearnerAction::new(user, ActionKind::CompleteCourse)).unwrap();

            let level = first.get_user_level(user).unwrap().unwrap();
            assert_eq!(level.total_xp, 50 + 125);
        }

        #[test]
        fn concurrent_writers_do_not_lose_xp() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("akademi.db");

            let setup = open_shared(&path, 5000);
            setup.init().unwrap();
            let user = setup.add_user("Selin", Locale::Tr).unwrap();

            let writers: Vec<_> = (0..2)
                .map(|_| {
                    let path = path.clone();
                    thread::spawn(move || {
                        let db = open_shared(&path, 5000);
                        for _ in 0..10 {
                            apply_action(&db, &LearnerAction::new(user, ActionKind::StartLesson))
                                .unwrap();
                        }
                    })
                })
                .collect();
            for writer in writers {
                writer.join().unwrap();
            }

            let level = setup.get_user_level(user).unwrap().unwrap();
            assert_eq!(level.total_xp, 20 * 50);
            assert_eq!(level.current_xp, 20 * 50);
            assert_eq!(level.level, 3);
        }
    }

    mod helper_tests {
        use super::*;

        #[test]
        fn course_percent_rounds() {
            assert_eq!(course_percent(0, 0), 0);
            assert_eq!(course_percent(1, 3), 33);
            assert_eq!(course_percent(2, 3), 67);
            assert_eq!(course_percent(3, 3), 100);
            assert_eq!(course_percent(5, 3), 100);
        }

        #[test]
        fn hours_percent_bounds() {
            assert_eq!(hours_percent(0.0, 100.0), 0);
            assert_eq!(hours_percent(50.0, 100.0), 50);
            assert_eq!(hours_percent(500.0, 100.0), 100);
            assert_eq!(hours_percent(5.0, 0.0), 0);
        }
    }
}
