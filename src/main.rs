mod cascade;
mod config;
mod dashboard;
mod db;
mod error;
mod models;
mod tui;

use clap::{Parser, Subcommand};
use std::io::Read;
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use config::Config;
use dashboard::LearnerSnapshot;
use db::Database;
use error::{Error, Result};
use models::{
    ActionKind, CascadeResult, JsonOutput, LearnerAction, Locale, DEFAULT_TARGET_HOURS,
};

#[derive(Parser)]
#[command(name = "akademi")]
#[command(about = "Bilingual learning tracker: courses, programs, goals and levels")]
#[command(version)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database
    Init,

    /// Manage learners
    #[command(subcommand)]
    User(UserCommands),

    /// Manage the course catalog
    #[command(subcommand)]
    Course(CourseCommands),

    /// Manage course modules
    #[command(subcommand)]
    Module(ModuleCommands),

    /// Manage lessons
    #[command(subcommand)]
    Lesson(LessonCommands),

    /// Manage study programs
    #[command(subcommand)]
    Program(ProgramCommands),

    /// Enroll a learner in a course
    Enroll {
        /// User ID
        user_id: i64,

        /// Course ID
        course_id: i64,
    },

    /// Manage learning goals
    #[command(subcommand)]
    Goal(GoalCommands),

    /// Record a learner action and cascade its progress
    Act {
        /// User ID
        user_id: i64,

        /// Action kind: start-lesson/complete-lesson/start-course/complete-course
        kind: String,

        /// Lesson ID
        #[arg(long)]
        lesson: Option<i64>,

        /// Course ID
        #[arg(long)]
        course: Option<i64>,

        /// Program ID
        #[arg(long)]
        program: Option<i64>,

        /// Goal ID
        #[arg(long)]
        goal: Option<i64>,

        /// Hours spent studying
        #[arg(long)]
        hours: Option<f64>,

        /// Performance score (0-100)
        #[arg(long, short)]
        score: Option<i32>,

        /// Idempotency key; repeating it replays the stored result
        #[arg(long, short)]
        request_id: Option<String>,
    },

    /// Apply a JSON learner action from a file, or stdin when omitted
    Apply {
        /// Path to the action JSON
        path: Option<PathBuf>,
    },

    /// Show a learner's dashboard
    Dashboard {
        /// User ID
        user_id: i64,
    },

    /// Launch interactive terminal UI
    Tui {
        /// User ID
        user_id: i64,
    },
}

#[derive(Subcommand)]
enum UserCommands {
    /// Add a learner
    Add {
        /// Display name
        name: String,

        /// Preferred locale: en/tr
        #[arg(long, short)]
        locale: Option<String>,
    },

    /// List learners
    List,
}

#[derive(Subcommand)]
enum CourseCommands {
    /// Add a course
    Add {
        /// English title
        title: String,

        /// Turkish title
        #[arg(long)]
        title_tr: Option<String>,

        /// Course description
        #[arg(long, short)]
        description: Option<String>,
    },

    /// List all courses
    List,

    /// Show course details
    Show {
        /// Course ID
        id: i64,
    },
}

#[derive(Subcommand)]
enum ModuleCommands {
    /// Add a module to a course
    Add {
        /// Course ID
        course_id: i64,

        /// Module title
        title: String,

        /// Ordering within the course (defaults to last)
        #[arg(long, short)]
        position: Option<i32>,
    },
}

#[derive(Subcommand)]
enum LessonCommands {
    /// Add a lesson to a module
    Add {
        /// Module ID
        module_id: i64,

        /// Lesson title
        title: String,

        /// Ordering within the module (defaults to last)
        #[arg(long, short)]
        position: Option<i32>,
    },
}

#[derive(Subcommand)]
enum ProgramCommands {
    /// Add a study program
    Add {
        /// Program name
        name: String,

        /// Hours needed to finish the program
        #[arg(long, short)]
        target_hours: Option<f64>,
    },

    /// List all programs
    List,
}

#[derive(Subcommand)]
enum GoalCommands {
    /// Add a goal for a learner
    Add {
        /// User ID
        user_id: i64,

        /// Goal title
        title: String,

        /// Course the goal tracks
        #[arg(long)]
        course: Option<i64>,

        /// Program the goal tracks
        #[arg(long)]
        program: Option<i64>,
    },

    /// List a learner's goals
    List {
        /// User ID
        user_id: i64,
    },

    /// Show study history for a goal
    History {
        /// Goal ID
        goal_id: i64,
    },
}

fn init_logging(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.as_deref().unwrap_or("warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = Config::load()?;
    init_logging(&config);

    let db_path = config.db_path();
    debug!(path = %db_path.display(), "opening database");
    let db = Database::open(&db_path)?;
    db.set_busy_timeout(Duration::from_millis(config.busy_timeout_ms))?;
    db.init()?;

    match cli.command {
        Commands::Init => {
            if cli.json {
                println!("{}", serde_json::to_string(&JsonOutput::<()>::ok(()))?);
            } else {
                println!("Database initialized at: {}", db_path.display());
            }
        }

        Commands::User(user_cmd) => match user_cmd {
            UserCommands::Add { name, locale } => {
                let locale = match locale {
                    Some(l) => Locale::from_str(&l).ok_or_else(|| {
                        Error::InvalidInput(format!("Invalid locale '{}'. Use: en or tr", l))
                    })?,
                    None => config.default_locale,
                };
                let id = db.add_user(&name, locale)?;

                if cli.json {
                    println!(
                        "{}",
                        serde_json::to_string(&JsonOutput::ok(serde_json::json!({
                            "id": id,
                            "name": name,
                            "locale": locale
                        })))?
                    );
                } else {
                    println!("Added user '{}' ({}) with ID: {}", name, locale.as_str(), id);
                }
            }

            UserCommands::List => {
                let users = db.list_users()?;
                if cli.json {
                    println!("{}", serde_json::to_string(&JsonOutput::ok(&users))?);
                } else if users.is_empty() {
                    println!("No users found.");
                } else {
                    println!("{:<5} {:<30} LOCALE", "ID", "NAME");
                    println!("{}", "-".repeat(45));
                    for user in users {
                        println!(
                            "{:<5} {:<30} {}",
                            user.id,
                            truncate(&user.name, 28),
                            user.locale.as_str()
                        );
                    }
                }
            }
        },

        Commands::Course(course_cmd) => match course_cmd {
            CourseCommands::Add {
                title,
                title_tr,
                description,
            } => {
                let id = db.add_course(&title, title_tr.as_deref(), description.as_deref())?;

                if cli.json {
                    println!(
                        "{}",
                        serde_json::to_string(&JsonOutput::ok(serde_json::json!({
                            "id": id,
                            "title": title
                        })))?
                    );
                } else {
                    println!("Added course '{}' with ID: {}", title, id);
                }
            }

            CourseCommands::List => {
                let courses = db.list_courses()?;
                if cli.json {
                    println!("{}", serde_json::to_string(&JsonOutput::ok(&courses))?);
                } else if courses.is_empty() {
                    println!("No courses found.");
                } else {
                    println!("{:<5} {:<36} TURKISH", "ID", "TITLE");
                    println!("{}", "-".repeat(75));
                    for course in courses {
                        println!(
                            "{:<5} {:<36} {}",
                            course.id,
                            truncate(&course.title, 34),
                            course.title_tr.as_deref().unwrap_or("-")
                        );
                    }
                }
            }

            CourseCommands::Show { id } => {
                if let Some(course) = db.get_course(id)? {
                    let mut modules = Vec::new();
                    for module in db.list_modules(id)? {
                        let lessons = db.list_lessons(module.id)?;
                        modules.push((module, lessons));
                    }

                    if cli.json {
                        let modules: Vec<_> = modules
                            .iter()
                            .map(|(module, lessons)| {
                                serde_json::json!({
                                    "module": module,
                                    "lessons": lessons
                                })
                            })
                            .collect();
                        println!(
                            "{}",
                            serde_json::to_string(&JsonOutput::ok(serde_json::json!({
                                "course": course,
                                "modules": modules
                            })))?
                        );
                    } else {
                        println!("Course: {}", course.title);
                        println!("ID: {}", course.id);
                        if let Some(tr) = &course.title_tr {
                            println!("Turkish title: {}", tr);
                        }
                        if let Some(desc) = &course.description {
                            println!("Description: {}", desc);
                        }
                        println!("Created: {}", course.created_at);

                        for (module, lessons) in &modules {
                            println!();
                            println!("[{}] {} (module {})", module.position, module.title, module.id);
                            if lessons.is_empty() {
                                println!("    (no lessons)");
                            }
                            for lesson in lessons {
                                println!("    {}. {} (lesson {})", lesson.position, lesson.title, lesson.id);
                            }
                        }
                    }
                } else if cli.json {
                    println!(
                        "{}",
                        serde_json::to_string(&JsonOutput::<()>::err("Course not found"))?
                    );
                } else {
                    println!("Course not found.");
                }
            }
        },

        Commands::Module(ModuleCommands::Add {
            course_id,
            title,
            position,
        }) => {
            if db.get_course(course_id)?.is_none() {
                return Err(Error::not_found("course", course_id));
            }
            let position = match position {
                Some(p) => p,
                None => db.list_modules(course_id)?.len() as i32 + 1,
            };
            let id = db.add_module(course_id, &title, position)?;

            if cli.json {
                println!(
                    "{}",
                    serde_json::to_string(&JsonOutput::ok(serde_json::json!({
                        "id": id,
                        "course_id": course_id,
                        "position": position
                    })))?
                );
            } else {
                println!("Added module '{}' to course {} with ID: {}", title, course_id, id);
            }
        }

        Commands::Lesson(LessonCommands::Add {
            module_id,
            title,
            position,
        }) => {
            let (id, position) = add_lesson(&db, module_id, &title, position)?;

            if cli.json {
                println!(
                    "{}",
                    serde_json::to_string(&JsonOutput::ok(serde_json::json!({
                        "id": id,
                        "module_id": module_id,
                        "position": position
                    })))?
                );
            } else {
                println!("Added lesson '{}' to module {} with ID: {}", title, module_id, id);
            }
        }

        Commands::Program(program_cmd) => match program_cmd {
            ProgramCommands::Add { name, target_hours } => {
                let target_hours = target_hours.unwrap_or(DEFAULT_TARGET_HOURS);
                if !target_hours.is_finite() || target_hours <= 0.0 {
                    return Err(Error::InvalidInput(format!(
                        "target hours must be positive, got {}",
                        target_hours
                    )));
                }
                let id = db.add_program(&name, target_hours)?;

                if cli.json {
                    println!(
                        "{}",
                        serde_json::to_string(&JsonOutput::ok(serde_json::json!({
                            "id": id,
                            "name": name,
                            "target_hours": target_hours
                        })))?
                    );
                } else {
                    println!("Added program '{}' with ID: {}", name, id);
                }
            }

            ProgramCommands::List => {
                let programs = db.list_programs()?;
                if cli.json {
                    println!("{}", serde_json::to_string(&JsonOutput::ok(&programs))?);
                } else if programs.is_empty() {
                    println!("No programs found.");
                } else {
                    println!("{:<5} {:<40} TARGET", "ID", "NAME");
                    println!("{}", "-".repeat(55));
                    for program in programs {
                        println!(
                            "{:<5} {:<40} {:.0}h",
                            program.id,
                            truncate(&program.name, 38),
                            program.target_hours
                        );
                    }
                }
            }
        },

        Commands::Enroll { user_id, course_id } => {
            if db.get_user(user_id)?.is_none() {
                return Err(Error::not_found("user", user_id));
            }
            if db.get_course(course_id)?.is_none() {
                return Err(Error::not_found("course", course_id));
            }
            let id = db.enroll(user_id, course_id)?;

            if cli.json {
                println!(
                    "{}",
                    serde_json::to_string(&JsonOutput::ok(serde_json::json!({
                        "id": id,
                        "user_id": user_id,
                        "course_id": course_id
                    })))?
                );
            } else {
                println!("Enrolled user {} in course {}.", user_id, course_id);
            }
        }

        Commands::Goal(goal_cmd) => match goal_cmd {
            GoalCommands::Add {
                user_id,
                title,
                course,
                program,
            } => {
                if db.get_user(user_id)?.is_none() {
                    return Err(Error::not_found("user", user_id));
                }
                let id = db.add_goal(user_id, &title, course, program)?;

                if cli.json {
                    println!(
                        "{}",
                        serde_json::to_string(&JsonOutput::ok(serde_json::json!({
                            "id": id,
                            "title": title
                        })))?
                    );
                } else {
                    println!("Added goal '{}' with ID: {}", title, id);
                }
            }

            GoalCommands::List { user_id } => {
                let goals = db.list_goals(user_id)?;
                if cli.json {
                    println!("{}", serde_json::to_string(&JsonOutput::ok(&goals))?);
                } else if goals.is_empty() {
                    println!("No goals found.");
                } else {
                    println!("{:<5} {:<36} {:<9} STATUS", "ID", "TITLE", "PROGRESS");
                    println!("{}", "-".repeat(65));
                    for goal in goals {
                        println!(
                            "{:<5} {:<36} {:<9} {}",
                            goal.id,
                            truncate(&goal.title, 34),
                            format!("{}%", goal.progress),
                            goal.status.as_str()
                        );
                    }
                }
            }

            GoalCommands::History { goal_id } => {
                if db.get_goal(goal_id)?.is_none() {
                    if cli.json {
                        println!(
                            "{}",
                            serde_json::to_string(&JsonOutput::<()>::err("Goal not found"))?
                        );
                    } else {
                        println!("Goal not found.");
                    }
                    return Ok(());
                }

                let history = db.list_study_history(goal_id)?;
                if cli.json {
                    println!("{}", serde_json::to_string(&JsonOutput::ok(&history))?);
                } else if history.is_empty() {
                    println!("No study sessions recorded.");
                } else {
                    println!("{:<12} {:<8} SCORE", "DATE", "HOURS");
                    println!("{}", "-".repeat(30));
                    for entry in history {
                        println!(
                            "{:<12} {:<8} {}",
                            entry.studied_on,
                            entry
                                .hours
                                .map(|h| format!("{:.1}", h))
                                .unwrap_or_else(|| "-".to_string()),
                            entry
                                .performance
                                .map(|p| p.to_string())
                                .unwrap_or_else(|| "-".to_string())
                        );
                    }
                }
            }
        },

        Commands::Act {
            user_id,
            kind,
            lesson,
            course,
            program,
            goal,
            hours,
            score,
            request_id,
        } => {
            let kind = ActionKind::from_str(&kind).ok_or_else(|| {
                Error::InvalidInput(format!(
                    "Invalid action '{}'. Use: start-lesson, complete-lesson, start-course, or complete-course",
                    kind
                ))
            })?;

            let action = LearnerAction {
                lesson_id: lesson,
                course_id: course,
                program_id: program,
                goal_id: goal,
                hours_spent: hours,
                performance_score: score,
                request_id,
                ..LearnerAction::new(user_id, kind)
            };
            apply_and_print(&db, &action, cli.json)?;
        }

        Commands::Apply { path } => {
            let body = match path {
                Some(path) => std::fs::read_to_string(path)?,
                None => {
                    let mut buf = String::new();
                    std::io::stdin().read_to_string(&mut buf)?;
                    buf
                }
            };
            let action: LearnerAction = serde_json::from_str(&body)?;
            apply_and_print(&db, &action, cli.json)?;
        }

        Commands::Dashboard { user_id } => match LearnerSnapshot::load(&db, user_id) {
            Ok(snapshot) => {
                if cli.json {
                    println!("{}", serde_json::to_string(&JsonOutput::ok(&snapshot))?);
                } else {
                    print_snapshot(&snapshot);
                }
            }
            Err(e) if cli.json && e.is_not_found() => {
                println!(
                    "{}",
                    serde_json::to_string(&JsonOutput::<()>::err(e.to_string()))?
                );
            }
            Err(e) => return Err(e),
        },

        Commands::Tui { user_id } => {
            tui::run(db, user_id)?;
        }
    }

    Ok(())
}

// Appends to the end of the module unless a position is given
fn add_lesson(
    db: &Database,
    module_id: i64,
    title: &str,
    position: Option<i32>,
) -> Result<(i64, i32)> {
    if db.get_module(module_id)?.is_none() {
        return Err(Error::not_found("module", module_id));
    }
    let position = match position {
        Some(p) => p,
        None => db.list_lessons(module_id)?.len() as i32 + 1,
    };
    let id = db.add_lesson(module_id, title, position)?;
    Ok((id, position))
}

fn apply_and_print(db: &Database, action: &LearnerAction, json: bool) -> Result<()> {
    match cascade::apply_action(db, action) {
        Ok(result) => {
            if json {
                println!("{}", serde_json::to_string(&JsonOutput::ok(&result))?);
            } else {
                print_cascade(&result);
            }
            Ok(())
        }
        Err(e) if json && e.is_not_found() => {
            println!(
                "{}",
                serde_json::to_string(&JsonOutput::<()>::err(e.to_string()))?
            );
            Ok(())
        }
        Err(e) => Err(e),
    }
}

fn print_cascade(result: &CascadeResult) {
    if result.replayed {
        println!("Already applied; showing the stored result.");
    }
    println!("Cascaded: {}", result.cascaded.summary());

    if let Some(lesson) = &result.lesson {
        println!(
            "Lesson {}: {}%{}",
            lesson.lesson_id,
            lesson.percent,
            if lesson.completed { " (completed)" } else { "" }
        );
    }
    if let Some(course) = &result.course {
        println!(
            "Course {}: {}%{}",
            course.course_id,
            course.percent,
            if course.completed { " (completed)" } else { "" }
        );
    }
    if let Some(program) = &result.program {
        println!(
            "Program {}: {}% ({:.1}h)",
            program.program_id, program.percent, program.completed_hours
        );
    }
    if let Some(goal) = &result.goal {
        println!(
            "Goal '{}': {}% ({})",
            goal.title,
            goal.progress,
            goal.status.as_str()
        );
    }
    if let Some(level) = &result.level {
        println!(
            "XP: +{} (total {}, level {}, streak {} days)",
            result.xp_gained, level.total_xp, level.level, level.streak_days
        );
        if result.leveled_up {
            println!("Level up! Now level {}.", level.level);
        }
    }
}

fn print_snapshot(snapshot: &LearnerSnapshot) {
    let locale = snapshot.user.locale;
    let level = &snapshot.level;
    let summary = &snapshot.summary;

    println!("=== {} ===", snapshot.user.name);
    println!(
        "Level {} ({} XP, {} to next), streak {} days",
        level.level, level.total_xp, summary.xp_to_next_level, level.streak_days
    );
    println!(
        "Courses: {} ({} completed), average progress {:.1}%",
        summary.total_courses, summary.completed_courses, summary.average_progress
    );
    println!(
        "Goals: {} active, {} completed",
        summary.active_goals, summary.completed_goals
    );

    if !snapshot.courses.is_empty() {
        println!();
        println!("--- Courses ---");
        for c in &snapshot.courses {
            println!(
                "{:<40} {:>3}%{}",
                truncate(c.course.title_for(locale), 38),
                c.enrollment.percent,
                if c.enrollment.completed { " ✓" } else { "" }
            );
        }
    }

    if !snapshot.programs.is_empty() {
        println!();
        println!("--- Programs ---");
        for p in &snapshot.programs {
            println!(
                "{:<40} {:>3}% ({:.1}/{:.0}h)",
                truncate(&p.program.name, 38),
                p.progress.percent,
                p.progress.completed_hours,
                p.program.target_hours
            );
        }
    }

    if !snapshot.goals.is_empty() {
        println!();
        println!("--- Goals ---");
        for g in &snapshot.goals {
            println!(
                "{:<40} {:>3}% {}",
                truncate(&g.title, 38),
                g.progress,
                g.status.as_str()
            );
        }
    }
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
