mod ui;
mod widgets;

use std::io;
use std::time::Duration;

use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};

use crate::dashboard::{EnrolledCourse, LearnerSnapshot};
use crate::db::Database;
use crate::error::Result;
use crate::models::{CourseModule, Goal, Lesson, LessonProgress, StudyHistoryEntry};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Overview,
    Courses,
    CourseDetail,
    Goals,
    GoalDetail,
}

impl View {
    fn next(&self) -> Self {
        match self {
            View::Overview => View::Courses,
            View::Courses => View::Goals,
            View::CourseDetail => View::Courses,
            View::Goals => View::Overview,
            View::GoalDetail => View::Goals,
        }
    }

    fn prev(&self) -> Self {
        match self {
            View::Overview => View::Goals,
            View::Courses => View::Overview,
            View::CourseDetail => View::Courses,
            View::Goals => View::Courses,
            View::GoalDetail => View::Goals,
        }
    }
}

pub struct StatefulList<T> {
    pub items: Vec<T>,
    pub selected: Option<usize>,
}

impl<T> StatefulList<T> {
    fn with_items(items: Vec<T>) -> Self {
        let selected = if items.is_empty() { None } else { Some(0) };
        Self { items, selected }
    }

    fn next(&mut self) {
        if self.items.is_empty() {
            return;
        }
        let i = match self.selected {
            Some(i) if i + 1 < self.items.len() => i + 1,
            _ => 0,
        };
        self.selected = Some(i);
    }

    fn previous(&mut self) {
        if self.items.is_empty() {
            return;
        }
        let i = match self.selected {
            Some(0) | None => self.items.len() - 1,
            Some(i) => i - 1,
        };
        self.selected = Some(i);
    }

    fn first(&mut self) {
        if !self.items.is_empty() {
            self.selected = Some(0);
        }
    }

    fn last(&mut self) {
        if !self.items.is_empty() {
            self.selected = Some(self.items.len() - 1);
        }
    }

    fn selected_item(&self) -> Option<&T> {
        self.selected.and_then(|i| self.items.get(i))
    }
}

pub type ModuleLessons = (CourseModule, Vec<(Lesson, Option<LessonProgress>)>);

pub struct App {
    db: Database,
    user_id: i64,
    pub view: View,
    pub snapshot: LearnerSnapshot,
    pub courses: StatefulList<EnrolledCourse>,
    pub goals: StatefulList<Goal>,
    pub selected_course: Option<EnrolledCourse>,
    pub selected_course_lessons: Vec<ModuleLessons>,
    pub selected_goal: Option<Goal>,
    pub selected_goal_history: Vec<StudyHistoryEntry>,
    pub filter: Option<String>,
    pub filter_input: String,
    pub filter_mode: bool,
    pub should_quit: bool,
}

impl App {
    pub fn new(db: Database, user_id: i64) -> Result<Self> {
        let snapshot = LearnerSnapshot::load(&db, user_id)?;
        let courses = StatefulList::with_items(snapshot.courses.clone());
        let goals = StatefulList::with_items(snapshot.goals.clone());

        Ok(Self {
            db,
            user_id,
            view: View::Overview,
            snapshot,
            courses,
            goals,
            selected_course: None,
            selected_course_lessons: Vec::new(),
            selected_goal: None,
            selected_goal_history: Vec::new(),
            filter: None,
            filter_input: String::new(),
            filter_mode: false,
            should_quit: false,
        })
    }

    pub fn refresh_data(&mut self) -> Result<()> {
        self.snapshot = LearnerSnapshot::load(&self.db, self.user_id)?;
        self.courses = StatefulList::with_items(self.filtered_courses());
        self.goals = StatefulList::with_items(self.snapshot.goals.clone());
        Ok(())
    }

    fn filtered_courses(&self) -> Vec<EnrolledCourse> {
        let locale = self.snapshot.user.locale;
        match &self.filter {
            Some(needle) => {
                let needle = needle.to_lowercase();
                self.snapshot
                    .courses
                    .iter()
                    .filter(|c| c.course.title_for(locale).to_lowercase().contains(&needle))
                    .cloned()
                    .collect()
            }
            None => self.snapshot.courses.clone(),
        }
    }

    fn apply_filter(&mut self) {
        if self.filter_input.is_empty() {
            self.filter = None;
        } else {
            self.filter = Some(self.filter_input.clone());
        }
        self.courses = StatefulList::with_items(self.filtered_courses());
    }

    fn select_course(&mut self) -> Result<()> {
        if let Some(enrolled) = self.courses.selected_item().cloned() {
            let mut modules = Vec::new();
            for module in &enrolled.modules {
                let mut lessons = Vec::new();
                for lesson in self.db.list_lessons(module.id)? {
                    let progress = self.db.get_lesson_progress(self.user_id, lesson.id)?;
                    lessons.push((lesson, progress));
                }
                modules.push((module.clone(), lessons));
            }
            self.selected_course_lessons = modules;
            self.selected_course = Some(enrolled);
            self.view = View::CourseDetail;
        }
        Ok(())
    }

    fn select_goal(&mut self) -> Result<()> {
        if let Some(goal) = self.goals.selected_item().cloned() {
            self.selected_goal_history = self.db.list_study_history(goal.id)?;
            self.selected_goal = Some(goal);
            self.view = View::GoalDetail;
        }
        Ok(())
    }

    fn back(&mut self) {
        match self.view {
            View::CourseDetail => {
                self.view = View::Courses;
                self.selected_course = None;
            }
            View::GoalDetail => {
                self.view = View::Goals;
                self.selected_goal = None;
            }
            _ => self.view = self.view.prev(),
        }
    }

    fn handle_key(&mut self, key: KeyCode, modifiers: KeyModifiers) -> Result<()> {
        if self.filter_mode {
            match key {
                KeyCode::Esc => {
                    self.filter_mode = false;
                    self.filter_input.clear();
                }
                KeyCode::Enter => {
                    self.filter_mode = false;
                    self.apply_filter();
                }
                KeyCode::Backspace => {
                    self.filter_input.pop();
                }
                KeyCode::Char(c) => {
                    self.filter_input.push(c);
                }
                _ => {}
            }
            return Ok(());
        }

        match key {
            KeyCode::Char('q') => self.should_quit = true,

            KeyCode::Char('r') if modifiers.contains(KeyModifiers::CONTROL) => {
                self.refresh_data()?;
            }

            KeyCode::Char('/') if self.view == View::Courses => {
                self.filter_mode = true;
                self.filter_input.clear();
            }

            KeyCode::Esc => match self.view {
                View::CourseDetail | View::GoalDetail => self.back(),
                View::Courses if self.filter.is_some() => {
                    self.filter_input.clear();
                    self.apply_filter();
                }
                _ => {}
            },

            KeyCode::Char('h') | KeyCode::Left => self.back(),
            KeyCode::Char('l') | KeyCode::Right => match self.view {
                View::Courses => self.select_course()?,
                View::Goals => self.select_goal()?,
                View::CourseDetail | View::GoalDetail => {}
                _ => self.view = self.view.next(),
            },

            KeyCode::Tab => {
                if modifiers.contains(KeyModifiers::SHIFT) {
                    self.view = self.view.prev();
                } else {
                    self.view = self.view.next();
                }
            }
            KeyCode::BackTab => self.view = self.view.prev(),

            KeyCode::Char('j') | KeyCode::Down => match self.view {
                View::Courses => self.courses.next(),
                View::Goals => self.goals.next(),
                _ => {}
            },
            KeyCode::Char('k') | KeyCode::Up => match self.view {
                View::Courses => self.courses.previous(),
                View::Goals => self.goals.previous(),
                _ => {}
            },
            KeyCode::Char('g') => match self.view {
                View::Courses => self.courses.first(),
                View::Goals => self.goals.first(),
                _ => {}
            },
            KeyCode::Char('G') => match self.view {
                View::Courses => self.courses.last(),
                View::Goals => self.goals.last(),
                _ => {}
            },

            KeyCode::Enter => match self.view {
                View::Courses => self.select_course()?,
                View::Goals => self.select_goal()?,
                _ => {}
            },

            _ => {}
        }
        Ok(())
    }
}

pub fn run(db: Database, user_id: i64) -> Result<()> {
    // Load before touching the terminal so a bad user id prints normally
    let mut app = App::new(db, user_id)?;

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

fn run_app(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> Result<()> {
    loop {
        terminal.draw(|f| ui::draw(f, app))?;

        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                app.handle_key(key.code, key.modifiers)?;
            }
        }

        if app.should_quit {
            return Ok(());
        }
    }
}
