use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Result, Row, Transaction, TransactionBehavior};
use std::path::Path;
use std::time::Duration;

use crate::models::{
    Course, CourseEnrollment, CourseModule, Goal, GoalStatus, Lesson, LessonProgress, Locale,
    Program, ProgramProgress, StudyHistoryEntry, User, UserLevel,
};

pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Ok(Self { conn })
    }

    pub fn set_busy_timeout(&self, timeout: Duration) -> Result<()> {
        self.conn.busy_timeout(timeout)
    }

    #[cfg(test)]
    pub(crate) fn conn(&self) -> &Connection {
        &self.conn
    }

    pub fn init(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                locale TEXT NOT NULL DEFAULT 'en' CHECK(locale IN ('en', 'tr')),
                created_at TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE TABLE IF NOT EXISTS courses (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                title_tr TEXT,
                description TEXT,
                created_at TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE TABLE IF NOT EXISTS course_modules (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                course_id INTEGER NOT NULL,
                title TEXT NOT NULL,
                position INTEGER NOT NULL DEFAULT 0,
                FOREIGN KEY (course_id) REFERENCES courses(id) ON DELETE CASCADE
            );

            CREATE TABLE IF NOT EXISTS lessons (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                module_id INTEGER NOT NULL,
                title TEXT NOT NULL,
                position INTEGER NOT NULL DEFAULT 0,
                FOREIGN KEY (module_id) REFERENCES course_modules(id) ON DELETE CASCADE
            );

            CREATE TABLE IF NOT EXISTS lesson_progress (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                lesson_id INTEGER NOT NULL,
                completed INTEGER NOT NULL DEFAULT 0,
                percent INTEGER NOT NULL DEFAULT 0,
                last_accessed TEXT NOT NULL DEFAULT (datetime('now')),
                UNIQUE (user_id, lesson_id),
                FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE,
                FOREIGN KEY (lesson_id) REFERENCES lessons(id) ON DELETE CASCADE
            );

            CREATE TABLE IF NOT EXISTS enrollments (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                course_id INTEGER NOT NULL,
                percent INTEGER NOT NULL DEFAULT 0,
                completed INTEGER NOT NULL DEFAULT 0,
                enrolled_at TEXT NOT NULL DEFAULT (datetime('now')),
                last_accessed TEXT,
                UNIQUE (user_id, course_id),
                FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE,
                FOREIGN KEY (course_id) REFERENCES courses(id) ON DELETE CASCADE
            );

            CREATE TABLE IF NOT EXISTS programs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE,
                target_hours REAL NOT NULL DEFAULT 100.0 CHECK(target_hours > 0),
                created_at TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE TABLE IF NOT EXISTS program_progress (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                program_id INTEGER NOT NULL,
                completed_hours REAL NOT NULL DEFAULT 0,
                percent INTEGER NOT NULL DEFAULT 0,
                last_accessed TEXT NOT NULL DEFAULT (datetime('now')),
                UNIQUE (user_id, program_id),
                FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE,
                FOREIGN KEY (program_id) REFERENCES programs(id) ON DELETE CASCADE
            );

            CREATE TABLE IF NOT EXISTS goals (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                title TEXT NOT NULL,
                course_id INTEGER,
                program_id INTEGER,
                progress INTEGER NOT NULL DEFAULT 0 CHECK(progress BETWEEN 0 AND 100),
                status TEXT NOT NULL DEFAULT 'active' CHECK(status IN ('active', 'completed')),
                created_at TEXT NOT NULL DEFAULT (datetime('now')),
                updated_at TEXT NOT NULL DEFAULT (datetime('now')),
                FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE,
                FOREIGN KEY (course_id) REFERENCES courses(id) ON DELETE SET NULL,
                FOREIGN KEY (program_id) REFERENCES programs(id) ON DELETE SET NULL
            );

            CREATE TABLE IF NOT EXISTS study_history (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                goal_id INTEGER NOT NULL,
                studied_on TEXT NOT NULL,
                hours REAL,
                performance INTEGER,
                created_at TEXT NOT NULL DEFAULT (datetime('now')),
                FOREIGN KEY (goal_id) REFERENCES goals(id) ON DELETE CASCADE
            );

            CREATE TABLE IF NOT EXISTS user_levels (
                user_id INTEGER PRIMARY KEY,
                current_xp INTEGER NOT NULL DEFAULT 0,
                total_xp INTEGER NOT NULL DEFAULT 0,
                level INTEGER NOT NULL DEFAULT 1,
                streak_days INTEGER NOT NULL DEFAULT 0,
                last_activity TEXT,
                FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
            );

            -- Applied actions keyed by client request id, for retry deduplication
            CREATE TABLE IF NOT EXISTS cascade_log (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                request_id TEXT NOT NULL,
                user_id INTEGER NOT NULL,
                kind TEXT NOT NULL,
                result TEXT NOT NULL,
                created_at TEXT NOT NULL DEFAULT (datetime('now')),
                UNIQUE(user_id, request_id),
                FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
            );

            CREATE INDEX IF NOT EXISTS idx_modules_course ON course_modules(course_id);
            CREATE INDEX IF NOT EXISTS idx_lessons_module ON lessons(module_id);
            CREATE INDEX IF NOT EXISTS idx_lesson_progress_user ON lesson_progress(user_id);
            CREATE INDEX IF NOT EXISTS idx_enrollments_user ON enrollments(user_id);
            CREATE INDEX IF NOT EXISTS idx_program_progress_user ON program_progress(user_id);
            CREATE INDEX IF NOT EXISTS idx_goals_user ON goals(user_id);
            CREATE INDEX IF NOT EXISTS idx_study_history_goal ON study_history(goal_id);
            "#,
        )?;

        // Run migrations for existing databases
        self.migrate()?;

        Ok(())
    }

    // Databases created before streak tracking lack user_levels.streak_days
    fn migrate(&self) -> Result<()> {
        let has_streak: bool = self
            .conn
            .prepare("SELECT streak_days FROM user_levels LIMIT 1")
            .is_ok();

        if !has_streak {
            self.conn.execute_batch(
                "ALTER TABLE user_levels ADD COLUMN streak_days INTEGER NOT NULL DEFAULT 0;",
            )?;
        }

        // Request ids used to be unique across all users; they are now per user
        let log_sql: Option<String> = self
            .conn
            .query_row(
                "SELECT sql FROM sqlite_master WHERE type = 'table' AND name = 'cascade_log'",
                [],
                |row| row.get(0),
            )
            .optional()?;

        if log_sql.is_some_and(|sql| sql.contains("request_id TEXT NOT NULL UNIQUE")) {
            self.conn.execute_batch(
                r#"
                ALTER TABLE cascade_log RENAME TO cascade_log_old;
                CREATE TABLE cascade_log (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    request_id TEXT NOT NULL,
                    user_id INTEGER NOT NULL,
                    kind TEXT NOT NULL,
                    result TEXT NOT NULL,
                    created_at TEXT NOT NULL DEFAULT (datetime('now')),
                    UNIQUE(user_id, request_id),
                    FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
                );
                INSERT INTO cascade_log (id, request_id, user_id, kind, result, created_at)
                    SELECT id, request_id, user_id, kind, result, created_at FROM cascade_log_old;
                DROP TABLE cascade_log_old;
                "#,
            )?;
        }

        Ok(())
    }

    /// Starts a write transaction up front so concurrent writers queue on the
    /// SQLite lock (bounded by the busy timeout). Dropping it without
    /// `commit()` rolls everything back.
    pub fn write_transaction(&self) -> Result<Transaction<'_>> {
        Transaction::new_unchecked(&self.conn, TransactionBehavior::Immediate)
    }

    // User operations
    pub fn add_user(&self, name: &str, locale: Locale) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO users (name, locale, created_at) VALUES (?1, ?2, ?3)",
            params![name, locale.as_str(), Utc::now().to_rfc3339()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn get_user(&self, id: i64) -> Result<Option<User>> {
        self.conn
            .query_row(
                "SELECT id, name, locale, created_at FROM users WHERE id = ?1",
                params![id],
                row_to_user,
            )
            .optional()
    }

    pub fn list_users(&self) -> Result<Vec<User>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, locale, created_at FROM users ORDER BY id")?;
        let rows = stmt.query_map([], row_to_user)?;
        rows.collect()
    }

    // Catalog operations
    pub fn add_course(
        &self,
        title: &str,
        title_tr: Option<&str>,
        description: Option<&str>,
    ) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO courses (title, title_tr, description, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![title, title_tr, description, Utc::now().to_rfc3339()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn get_course(&self, id: i64) -> Result<Option<Course>> {
        self.conn
            .query_row(
                "SELECT id, title, title_tr, description, created_at FROM courses WHERE id = ?1",
                params![id],
                row_to_course,
            )
            .optional()
    }

    pub fn list_courses(&self) -> Result<Vec<Course>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, title, title_tr, description, created_at FROM courses ORDER BY title",
        )?;
        let rows = stmt.query_map([], row_to_course)?;
        rows.collect()
    }

    pub fn add_module(&self, course_id: i64, title: &str, position: i32) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO course_modules (course_id, title, position) VALUES (?1, ?2, ?3)",
            params![course_id, title, position],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn list_modules(&self, course_id: i64) -> Result<Vec<CourseModule>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, course_id, title, position
            FROM course_modules
            WHERE course_id = ?1
            ORDER BY position, id
            "#,
        )?;

        let rows = stmt.query_map(params![course_id], row_to_module)?;
        rows.collect()
    }

    pub fn get_module(&self, id: i64) -> Result<Option<CourseModule>> {
        self.conn
            .query_row(
                "SELECT id, course_id, title, position FROM course_modules WHERE id = ?1",
                params![id],
                row_to_module,
            )
            .optional()
    }

    pub fn add_lesson(&self, module_id: i64, title: &str, position: i32) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO lessons (module_id, title, position) VALUES (?1, ?2, ?3)",
            params![module_id, title, position],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn get_lesson(&self, id: i64) -> Result<Option<Lesson>> {
        self.conn
            .query_row(
                "SELECT id, module_id, title, position FROM lessons WHERE id = ?1",
                params![id],
                row_to_lesson,
            )
            .optional()
    }

    pub fn list_lessons(&self, module_id: i64) -> Result<Vec<Lesson>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, module_id, title, position
            FROM lessons
            WHERE module_id = ?1
            ORDER BY position, id
            "#,
        )?;
        let rows = stmt.query_map(params![module_id], row_to_lesson)?;
        rows.collect()
    }

    // Lesson progress operations
    pub fn get_lesson_progress(&self, user_id: i64, lesson_id: i64) -> Result<Option<LessonProgress>> {
        self.conn
            .query_row(
                r#"
                SELECT id, user_id, lesson_id, completed, percent, last_accessed
                FROM lesson_progress
                WHERE user_id = ?1 AND lesson_id = ?2
                "#,
                params![user_id, lesson_id],
                |row| {
                    Ok(LessonProgress {
                        id: row.get(0)?,
                        user_id: row.get(1)?,
                        lesson_id: row.get(2)?,
                        completed: row.get(3)?,
                        percent: row.get(4)?,
                        last_accessed: row.get(5)?,
                    })
                },
            )
            .optional()
    }

    pub fn upsert_lesson_progress(
        &self,
        user_id: i64,
        lesson_id: i64,
        completed: bool,
        percent: i32,
        now: &str,
    ) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO lesson_progress (user_id, lesson_id, completed, percent, last_accessed)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(user_id, lesson_id) DO UPDATE SET
                completed = excluded.completed,
                percent = excluded.percent,
                last_accessed = excluded.last_accessed
            "#,
            params![user_id, lesson_id, completed, percent, now],
        )?;
        Ok(())
    }

    /// Completed and total lesson counts for one course, both restricted to
    /// lessons that belong to the course's modules.
    pub fn course_lesson_counts(&self, user_id: i64, course_id: i64) -> Result<(i64, i64)> {
        self.conn.query_row(
            r#"
            SELECT COUNT(l.id),
                   COALESCE(SUM(CASE WHEN lp.completed = 1 THEN 1 ELSE 0 END), 0)
            FROM lessons l
            JOIN course_modules m ON l.module_id = m.id
            LEFT JOIN lesson_progress lp ON lp.lesson_id = l.id AND lp.user_id = ?1
            WHERE m.course_id = ?2
            "#,
            params![user_id, course_id],
            |row| {
                let total: i64 = row.get(0)?;
                let completed: i64 = row.get(1)?;
                Ok((completed, total))
            },
        )
    }

    // Enrollment operations
    pub fn enroll(&self, user_id: i64, course_id: i64) -> Result<i64> {
        self.conn.execute(
            "INSERT OR IGNORE INTO enrollments (user_id, course_id, enrolled_at) VALUES (?1, ?2, ?3)",
            params![user_id, course_id, Utc::now().to_rfc3339()],
        )?;
        self.conn.query_row(
            "SELECT id FROM enrollments WHERE user_id = ?1 AND course_id = ?2",
            params![user_id, course_id],
            |row| row.get(0),
        )
    }

    pub fn get_enrollment(&self, user_id: i64, course_id: i64) -> Result<Option<CourseEnrollment>> {
        self.conn
            .query_row(
                r#"
                SELECT id, user_id, course_id, percent, completed, enrolled_at, last_accessed
                FROM enrollments
                WHERE user_id = ?1 AND course_id = ?2
                "#,
                params![user_id, course_id],
                row_to_enrollment,
            )
            .optional()
    }

    pub fn list_enrollments(&self, user_id: i64) -> Result<Vec<CourseEnrollment>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, user_id, course_id, percent, completed, enrolled_at, last_accessed
            FROM enrollments
            WHERE user_id = ?1
            ORDER BY enrolled_at, id
            "#,
        )?;
        let rows = stmt.query_map(params![user_id], row_to_enrollment)?;
        rows.collect()
    }

    pub fn update_enrollment(
        &self,
        user_id: i64,
        course_id: i64,
        percent: i32,
        completed: bool,
        now: &str,
    ) -> Result<()> {
        self.conn.execute(
            r#"
            UPDATE enrollments
            SET percent = ?1, completed = ?2, last_accessed = ?3
            WHERE user_id = ?4 AND course_id = ?5
            "#,
            params![percent, completed, now, user_id, course_id],
        )?;
        Ok(())
    }

    // Program operations
    pub fn add_program(&self, name: &str, target_hours: f64) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO programs (name, target_hours, created_at) VALUES (?1, ?2, ?3)",
            params![name, target_hours, Utc::now().to_rfc3339()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn get_program(&self, id: i64) -> Result<Option<Program>> {
        self.conn
            .query_row(
                "SELECT id, name, target_hours, created_at FROM programs WHERE id = ?1",
                params![id],
                row_to_program,
            )
            .optional()
    }

    pub fn list_programs(&self) -> Result<Vec<Program>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, target_hours, created_at FROM programs ORDER BY name")?;
        let rows = stmt.query_map([], row_to_program)?;
        rows.collect()
    }

    pub fn get_program_progress(
        &self,
        user_id: i64,
        program_id: i64,
    ) -> Result<Option<ProgramProgress>> {
        self.conn
            .query_row(
                r#"
                SELECT id, user_id, program_id, completed_hours, percent, last_accessed
                FROM program_progress
                WHERE user_id = ?1 AND program_id = ?2
                "#,
                params![user_id, program_id],
                row_to_program_progress,
            )
            .optional()
    }

    pub fn list_program_progress(&self, user_id: i64) -> Result<Vec<ProgramProgress>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, user_id, program_id, completed_hours, percent, last_accessed
            FROM program_progress
            WHERE user_id = ?1
            ORDER BY program_id
            "#,
        )?;
        let rows = stmt.query_map(params![user_id], row_to_program_progress)?;
        rows.collect()
    }

    pub fn upsert_program_progress(
        &self,
        user_id: i64,
        program_id: i64,
        completed_hours: f64,
        percent: i32,
        now: &str,
    ) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO program_progress (user_id, program_id, completed_hours, percent, last_accessed)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(user_id, program_id) DO UPDATE SET
                completed_hours = excluded.completed_hours,
                percent = excluded.percent,
                last_accessed = excluded.last_accessed
            "#,
            params![user_id, program_id, completed_hours, percent, now],
        )?;
        Ok(())
    }

    // Goal operations
    pub fn add_goal(
        &self,
        user_id: i64,
        title: &str,
        course_id: Option<i64>,
        program_id: Option<i64>,
    ) -> Result<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            r#"
            INSERT INTO goals (user_id, title, course_id, program_id, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?5)
            "#,
            params![user_id, title, course_id, program_id, now],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn get_goal(&self, id: i64) -> Result<Option<Goal>> {
        self.conn
            .query_row(
                r#"
                SELECT id, user_id, title, course_id, program_id, progress, status, created_at, updated_at
                FROM goals
                WHERE id = ?1
                "#,
                params![id],
                row_to_goal,
            )
            .optional()
    }

    pub fn list_goals(&self, user_id: i64) -> Result<Vec<Goal>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, user_id, title, course_id, program_id, progress, status, created_at, updated_at
            FROM goals
            WHERE user_id = ?1
            ORDER BY status, updated_at DESC, id
            "#,
        )?;
        let rows = stmt.query_map(params![user_id], row_to_goal)?;
        rows.collect()
    }

    pub fn update_goal_progress(
        &self,
        goal_id: i64,
        progress: i32,
        status: GoalStatus,
        now: &str,
    ) -> Result<()> {
        self.conn.execute(
            "UPDATE goals SET progress = ?1, status = ?2, updated_at = ?3 WHERE id = ?4",
            params![progress, status.as_str(), now, goal_id],
        )?;
        Ok(())
    }

    pub fn add_study_history(
        &self,
        goal_id: i64,
        studied_on: &str,
        hours: Option<f64>,
        performance: Option<i32>,
        now: &str,
    ) -> Result<i64> {
        self.conn.execute(
            r#"
            INSERT INTO study_history (goal_id, studied_on, hours, performance, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![goal_id, studied_on, hours, performance, now],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn list_study_history(&self, goal_id: i64) -> Result<Vec<StudyHistoryEntry>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, goal_id, studied_on, hours, performance, created_at
            FROM study_history
            WHERE goal_id = ?1
            ORDER BY created_at DESC, id DESC
            "#,
        )?;

        let rows = stmt.query_map(params![goal_id], |row| {
            Ok(StudyHistoryEntry {
                id: row.get(0)?,
                goal_id: row.get(1)?,
                studied_on: row.get(2)?,
                hours: row.get(3)?,
                performance: row.get(4)?,
                created_at: row.get(5)?,
            })
        })?;

        rows.collect()
    }

    // Level operations
    pub fn get_user_level(&self, user_id: i64) -> Result<Option<UserLevel>> {
        self.conn
            .query_row(
                r#"
                SELECT user_id, current_xp, total_xp, level, streak_days, last_activity
                FROM user_levels
                WHERE user_id = ?1
                "#,
                params![user_id],
                |row| {
                    Ok(UserLevel {
                        user_id: row.get(0)?,
                        current_xp: row.get(1)?,
                        total_xp: row.get(2)?,
                        level: row.get(3)?,
                        streak_days: row.get(4)?,
                        last_activity: row.get(5)?,
                    })
                },
            )
            .optional()
    }

    pub fn save_user_level(&self, level: &UserLevel) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO user_levels (user_id, current_xp, total_xp, level, streak_days, last_activity)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(user_id) DO UPDATE SET
                current_xp = excluded.current_xp,
                total_xp = excluded.total_xp,
                level = excluded.level,
                streak_days = excluded.streak_days,
                last_activity = excluded.last_activity
            "#,
            params![
                level.user_id,
                level.current_xp,
                level.total_xp,
                level.level,
                level.streak_days,
                level.last_activity
            ],
        )?;
        Ok(())
    }

    // Cascade log operations
    pub fn find_cascade_result(&self, user_id: i64, request_id: &str) -> Result<Option<String>> {
        self.conn
            .query_row(
                "SELECT result FROM cascade_log WHERE request_id = ?1 AND user_id = ?2",
                params![request_id, user_id],
                |row| row.get(0),
            )
            .optional()
    }

    pub fn record_cascade(
        &self,
        request_id: &str,
        user_id: i64,
        kind: &str,
        result: &str,
        now: &str,
    ) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO cascade_log (request_id, user_id, kind, result, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![request_id, user_id, kind, result, now],
        )?;
        Ok(())
    }
}

fn row_to_user(row: &Row) -> Result<User> {
    let locale_str: String = row.get(2)?;
    Ok(User {
        id: row.get(0)?,
        name: row.get(1)?,
        locale: Locale::from_str(&locale_str).unwrap_or_default(),
        created_at: row.get(3)?,
    })
}

fn row_to_module(row: &Row) -> Result<CourseModule> {
    Ok(CourseModule {
        id: row.get(0)?,
        course_id: row.get(1)?,
        title: row.get(2)?,
        position: row.get(3)?,
    })
}

fn row_to_course(row: &Row) -> Result<Course> {
    Ok(Course {
        id: row.get(0)?,
        title: row.get(1)?,
        title_tr: row.get(2)?,
        description: row.get(3)?,
        created_at: row.get(4)?,
    })
}

fn row_to_lesson(row: &Row) -> Result<Lesson> {
    Ok(Lesson {
        id: row.get(0)?,
        module_id: row.get(1)?,
        title: row.get(2)?,
        position: row.get(3)?,
    })
}

fn row_to_enrollment(row: &Row) -> Result<CourseEnrollment> {
    Ok(CourseEnrollment {
        id: row.get(0)?,
        user_id: row.get(1)?,
        course_id: row.get(2)?,
        percent: row.get(3)?,
        completed: row.get(4)?,
        enrolled_at: row.get(5)?,
        last_accessed: row.get(6)?,
    })
}

fn row_to_program(row: &Row) -> Result<Program> {
    Ok(Program {
        id: row.get(0)?,
        name: row.get(1)?,
        target_hours: row.get(2)?,
        created_at: row.get(3)?,
    })
}

fn row_to_program_progress(row: &Row) -> Result<ProgramProgress> {
    Ok(ProgramProgress {
        id: row.get(0)?,
        user_id: row.get(1)?,
        program_id: row.get(2)?,
        completed_hours: row.get(3)?,
        percent: row.get(4)?,
        last_accessed: row.get(5)?,
    })
}

fn row_to_goal(row: &Row) -> Result<Goal> {
    let status_str: String = row.get(6)?;
    Ok(Goal {
        id: row.get(0)?,
        user_id: row.get(1)?,
        title: row.get(2)?,
        course_id: row.get(3)?,
        program_id: row.get(4)?,
        progress: row.get(5)?,
        status: GoalStatus::from_str(&status_str).unwrap_or(GoalStatus::Active),
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}
