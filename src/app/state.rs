use std::collections::BTreeSet;

use time::Date;
use unicode_segmentation::UnicodeSegmentation;

use crate::model::{format_date, parse_date, ApplicationDraft, JobApplication, Status};
use crate::search::{parse_query, DateRange, FilterCriteria};

/// Date windows cycled with `w`, in days. 0 means all time.
pub const WINDOW_PRESETS: [u32; 4] = [30, 90, 365, 0];

/// Key presses after the shell has decoded them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiEvent {
    Char(char),
    Enter,
    Esc,
    Backspace,
    Up,
    Down,
    Left,
    Right,
    Tab,
    BackTab,
    /// Ctrl-s
    Submit,
    /// Ctrl-c
    Quit,
    /// Ctrl-r
    Refresh,
}

/// What the reducer may look at besides its own state.
#[derive(Debug, Clone, Copy)]
pub struct Context<'a> {
    /// The rows currently shown in the table, in display order.
    pub visible: &'a [JobApplication],
    pub today: Date,
}

/// Side effects the shell executes after a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Create(ApplicationDraft),
    Update { id: i64, draft: ApplicationDraft },
    Delete(i64),
    Export,
    Refresh,
    Quit,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub state: ViewState,
    pub effect: Option<Effect>,
}

impl Transition {
    fn stay(state: ViewState) -> Self {
        Self {
            state,
            effect: None,
        }
    }

    fn with(state: ViewState, effect: Effect) -> Self {
        Self {
            state,
            effect: Some(effect),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    JobTitle,
    CompanyName,
    Location,
    ApplicationDate,
    Status,
    SalaryRange,
    JobDescription,
    Notes,
}

impl FormField {
    pub const ALL: [FormField; 8] = [
        FormField::JobTitle,
        FormField::CompanyName,
        FormField::Location,
        FormField::ApplicationDate,
        FormField::Status,
        FormField::SalaryRange,
        FormField::JobDescription,
        FormField::Notes,
    ];

    pub fn label(self) -> &'static str {
        match self {
            FormField::JobTitle => "Job Title *",
            FormField::CompanyName => "Company Name *",
            FormField::Location => "Location *",
            FormField::ApplicationDate => "Application Date *",
            FormField::Status => "Status *",
            FormField::SalaryRange => "Salary Range",
            FormField::JobDescription => "Job Description",
            FormField::Notes => "Notes",
        }
    }

    fn index(self) -> usize {
        Self::ALL.iter().position(|f| *f == self).unwrap_or(0)
    }

    fn step(self, delta: isize) -> FormField {
        let len = Self::ALL.len() as isize;
        Self::ALL[(self.index() as isize + delta).rem_euclid(len) as usize]
    }

    fn is_last(self) -> bool {
        self.index() == Self::ALL.len() - 1
    }
}

/// Add/edit overlay. Text is kept raw until submit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormState {
    pub editing: Option<i64>,
    pub focus: FormField,
    pub job_title: String,
    pub company_name: String,
    pub location: String,
    pub application_date: String,
    pub status: Status,
    pub salary_range: String,
    pub job_description: String,
    pub notes: String,
    pub error: Option<String>,
}

impl FormState {
    pub fn blank(today: Date) -> Self {
        Self {
            editing: None,
            focus: FormField::JobTitle,
            job_title: String::new(),
            company_name: String::new(),
            location: String::new(),
            application_date: format_date(today),
            status: Status::Applied,
            salary_range: String::new(),
            job_description: String::new(),
            notes: String::new(),
            error: None,
        }
    }

    pub fn for_record(record: &JobApplication) -> Self {
        Self {
            editing: Some(record.id),
            focus: FormField::JobTitle,
            job_title: record.job_title.clone(),
            company_name: record.company_name.clone(),
            location: record.location.clone(),
            application_date: format_date(record.application_date),
            status: record.status,
            salary_range: record.salary_range.clone().unwrap_or_default(),
            job_description: record.job_description.clone().unwrap_or_default(),
            notes: record.notes.clone().unwrap_or_default(),
            error: None,
        }
    }

    /// Displayed text for a field.
    pub fn value(&self, field: FormField) -> &str {
        match field {
            FormField::JobTitle => &self.job_title,
            FormField::CompanyName => &self.company_name,
            FormField::Location => &self.location,
            FormField::ApplicationDate => &self.application_date,
            FormField::Status => self.status.label(),
            FormField::SalaryRange => &self.salary_range,
            FormField::JobDescription => &self.job_description,
            FormField::Notes => &self.notes,
        }
    }

    fn text_mut(&mut self, field: FormField) -> Option<&mut String> {
        match field {
            FormField::JobTitle => Some(&mut self.job_title),
            FormField::CompanyName => Some(&mut self.company_name),
            FormField::Location => Some(&mut self.location),
            FormField::ApplicationDate => Some(&mut self.application_date),
            FormField::Status => None,
            FormField::SalaryRange => Some(&mut self.salary_range),
            FormField::JobDescription => Some(&mut self.job_description),
            FormField::Notes => Some(&mut self.notes),
        }
    }

    /// Builds a draft and validates it; the message lists every problem.
    fn to_draft(&self) -> Result<ApplicationDraft, String> {
        let raw_date = self.application_date.trim();
        let application_date = parse_date(raw_date);
        if !raw_date.is_empty() && application_date.is_none() {
            return Err(format!("application date '{raw_date}' must be YYYY-MM-DD"));
        }
        let draft = ApplicationDraft {
            job_title: self.job_title.clone(),
            company_name: self.company_name.clone(),
            location: self.location.clone(),
            application_date,
            status: Some(self.status),
            salary_range: Some(self.salary_range.clone()),
            job_description: Some(self.job_description.clone()),
            notes: Some(self.notes.clone()),
        };
        draft.validate().map_err(|err| err.to_string())?;
        Ok(draft)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    Browse,
    Search { input: String },
    StatusPicker { cursor: usize, pending: BTreeSet<Status> },
    Form(FormState),
    ConfirmDelete { id: i64, label: String },
}

/// Everything the dashboard remembers between key presses.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewState {
    pub criteria: FilterCriteria,
    pub selected: usize,
    pub mode: Mode,
    pub status_message: Option<String>,
    /// Active date preset; `None` when the range came from a typed query.
    pub window_days: Option<u32>,
    /// Last query accepted from the search prompt.
    pub query: String,
}

impl ViewState {
    pub fn new(window_days: u32, today: Date) -> Self {
        let mut state = Self {
            criteria: FilterCriteria::default(),
            selected: 0,
            mode: Mode::Browse,
            status_message: None,
            window_days: None,
            query: String::new(),
        };
        state.apply_window(window_days, today);
        state
    }

    pub fn window_label(&self) -> String {
        match self.window_days {
            Some(0) => "all time".to_string(),
            Some(days) => format!("last {days} days"),
            None => self
                .criteria
                .date_range
                .map(|range| range.label())
                .unwrap_or_else(|| "all time".to_string()),
        }
    }

    /// Keeps the selection inside a table of `len` rows.
    pub fn clamp_selection(&mut self, len: usize) {
        if len == 0 {
            self.selected = 0;
        } else if self.selected >= len {
            self.selected = len - 1;
        }
    }

    pub fn set_status_message(&mut self, message: impl Into<String>) {
        self.status_message = Some(message.into());
    }

    /// Called once a submitted form has been saved.
    pub fn close_form(&mut self) {
        if matches!(self.mode, Mode::Form(_)) {
            self.mode = Mode::Browse;
        }
    }

    /// Keeps a submitted form open with the reason its save failed.
    pub fn reject_form(&mut self, message: impl Into<String>) {
        if let Mode::Form(form) = &mut self.mode {
            form.error = Some(message.into());
        }
    }

    pub fn handle(mut self, event: UiEvent, ctx: &Context<'_>) -> Transition {
        if event == UiEvent::Quit {
            return Transition::with(self, Effect::Quit);
        }
        match std::mem::replace(&mut self.mode, Mode::Browse) {
            Mode::Browse => self.browse(event, ctx),
            Mode::Search { input } => self.search(input, event),
            Mode::StatusPicker { cursor, pending } => self.pick_status(cursor, pending, event),
            Mode::Form(form) => self.form(form, event),
            Mode::ConfirmDelete { id, label } => self.confirm_delete(id, label, event),
        }
    }

    fn browse(mut self, event: UiEvent, ctx: &Context<'_>) -> Transition {
        let len = ctx.visible.len();
        match event {
            UiEvent::Char('q') => return Transition::with(self, Effect::Quit),
            UiEvent::Char('j') | UiEvent::Down => {
                if len > 0 {
                    self.selected = (self.selected + 1).min(len - 1);
                }
            }
            UiEvent::Char('k') | UiEvent::Up => {
                self.selected = self.selected.saturating_sub(1);
            }
            UiEvent::Char('g') => self.selected = 0,
            UiEvent::Char('G') => self.selected = len.saturating_sub(1),
            UiEvent::Char('a') => {
                self.status_message = Some("New application: Tab moves, Ctrl-s saves".into());
                self.mode = Mode::Form(FormState::blank(ctx.today));
            }
            UiEvent::Char('e') | UiEvent::Enter => match ctx.visible.get(self.selected) {
                Some(record) => {
                    self.status_message = Some(format!("Editing {}", record.headline()));
                    self.mode = Mode::Form(FormState::for_record(record));
                }
                None => self.status_message = Some("Nothing selected".into()),
            },
            UiEvent::Char('d') => match ctx.visible.get(self.selected) {
                Some(record) => {
                    self.mode = Mode::ConfirmDelete {
                        id: record.id,
                        label: record.headline(),
                    };
                }
                None => self.status_message = Some("Nothing selected".into()),
            },
            UiEvent::Char('/') => {
                self.mode = Mode::Search {
                    input: self.query.clone(),
                };
            }
            UiEvent::Char('s') => {
                self.mode = Mode::StatusPicker {
                    cursor: 0,
                    pending: self.criteria.statuses.clone(),
                };
            }
            UiEvent::Char('w') => {
                let next = next_window(self.window_days);
                self.apply_window(next, ctx.today);
                self.selected = 0;
                self.status_message = Some(format!("Showing {}", self.window_label()));
            }
            UiEvent::Char('c') => {
                self.criteria = FilterCriteria::default();
                self.query.clear();
                self.window_days = Some(0);
                self.selected = 0;
                self.status_message = Some("Filters cleared".into());
            }
            UiEvent::Char('x') => return Transition::with(self, Effect::Export),
            UiEvent::Refresh => return Transition::with(self, Effect::Refresh),
            UiEvent::Esc => self.status_message = None,
            _ => {}
        }
        Transition::stay(self)
    }

    fn search(mut self, mut input: String, event: UiEvent) -> Transition {
        match event {
            UiEvent::Esc => {
                self.status_message = Some("Search canceled".into());
            }
            UiEvent::Enter => match parse_query(&input) {
                Ok(parsed) => {
                    self.criteria.search_term = parsed.search_term;
                    if !parsed.statuses.is_empty() {
                        self.criteria.statuses = parsed.statuses;
                    }
                    if parsed.date_range.is_some() {
                        self.criteria.date_range = parsed.date_range;
                        self.window_days = None;
                    }
                    self.query = input.trim().to_string();
                    self.selected = 0;
                    self.status_message = None;
                }
                Err(err) => {
                    self.status_message = Some(err.to_string());
                    self.mode = Mode::Search { input };
                }
            },
            UiEvent::Backspace => {
                pop_grapheme(&mut input);
                self.mode = Mode::Search { input };
            }
            UiEvent::Char(ch) => {
                input.push(ch);
                self.mode = Mode::Search { input };
            }
            _ => self.mode = Mode::Search { input },
        }
        Transition::stay(self)
    }

    fn pick_status(
        mut self,
        mut cursor: usize,
        mut pending: BTreeSet<Status>,
        event: UiEvent,
    ) -> Transition {
        let options: Vec<Status> = Status::all().collect();
        match event {
            UiEvent::Esc => return Transition::stay(self),
            UiEvent::Enter => {
                self.criteria.statuses = pending;
                self.selected = 0;
                self.status_message = Some(if self.criteria.statuses.is_empty() {
                    "Showing every status".to_string()
                } else {
                    format!("Filtering {} status(es)", self.criteria.statuses.len())
                });
                return Transition::stay(self);
            }
            UiEvent::Char('j') | UiEvent::Down | UiEvent::Tab => {
                cursor = (cursor + 1) % options.len();
            }
            UiEvent::Char('k') | UiEvent::Up | UiEvent::BackTab => {
                cursor = (cursor + options.len() - 1) % options.len();
            }
            UiEvent::Char(' ') => {
                if let Some(status) = options.get(cursor) {
                    if !pending.remove(status) {
                        pending.insert(*status);
                    }
                }
            }
            UiEvent::Char('c') => pending.clear(),
            _ => {}
        }
        self.mode = Mode::StatusPicker { cursor, pending };
        Transition::stay(self)
    }

    fn form(mut self, mut form: FormState, event: UiEvent) -> Transition {
        match event {
            UiEvent::Esc => {
                self.status_message = Some("Edit canceled".into());
                return Transition::stay(self);
            }
            UiEvent::Tab | UiEvent::Down => form.focus = form.focus.step(1),
            UiEvent::BackTab | UiEvent::Up => form.focus = form.focus.step(-1),
            UiEvent::Left if form.focus == FormField::Status => {
                form.status = form.status.cycle(-1);
            }
            UiEvent::Right | UiEvent::Char(' ') if form.focus == FormField::Status => {
                form.status = form.status.cycle(1);
            }
            UiEvent::Enter if !form.focus.is_last() => form.focus = form.focus.step(1),
            UiEvent::Enter | UiEvent::Submit => return self.submit_form(form),
            UiEvent::Backspace => {
                if let Some(text) = form.text_mut(form.focus) {
                    pop_grapheme(text);
                }
            }
            UiEvent::Char(ch) => {
                if let Some(text) = form.text_mut(form.focus) {
                    text.push(ch);
                }
            }
            _ => {}
        }
        self.mode = Mode::Form(form);
        Transition::stay(self)
    }

    /// A valid form stays open until the shell reports the save outcome.
    fn submit_form(mut self, mut form: FormState) -> Transition {
        match form.to_draft() {
            Ok(draft) => {
                let effect = match form.editing {
                    Some(id) => Effect::Update { id, draft },
                    None => Effect::Create(draft),
                };
                form.error = None;
                self.mode = Mode::Form(form);
                Transition::with(self, effect)
            }
            Err(message) => {
                form.error = Some(message);
                self.mode = Mode::Form(form);
                Transition::stay(self)
            }
        }
    }

    fn confirm_delete(mut self, id: i64, label: String, event: UiEvent) -> Transition {
        match event {
            UiEvent::Char('y') | UiEvent::Enter => Transition::with(self, Effect::Delete(id)),
            UiEvent::Char('n') | UiEvent::Esc => {
                self.status_message = Some("Delete canceled".into());
                Transition::stay(self)
            }
            _ => {
                self.mode = Mode::ConfirmDelete { id, label };
                Transition::stay(self)
            }
        }
    }

    fn apply_window(&mut self, days: u32, today: Date) {
        self.window_days = Some(days);
        self.criteria.date_range = match days {
            0 => None,
            days => Some(DateRange::last_days(today, days)),
        };
    }
}

fn next_window(current: Option<u32>) -> u32 {
    let position = current.and_then(|days| WINDOW_PRESETS.iter().position(|p| *p == days));
    match position {
        Some(index) => WINDOW_PRESETS[(index + 1) % WINDOW_PRESETS.len()],
        None => WINDOW_PRESETS[0],
    }
}

fn pop_grapheme(text: &mut String) {
    if let Some((index, _)) = text.grapheme_indices(true).next_back() {
        text.truncate(index);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use time::macros::{date, datetime};

    const TODAY: Date = date!(2024 - 03 - 15);

    fn record(id: i64, company: &str) -> JobApplication {
        JobApplication {
            id,
            job_title: "Engineer".into(),
            company_name: company.into(),
            location: "Remote".into(),
            application_date: date!(2024 - 03 - 01),
            status: Status::Applied,
            salary_range: None,
            job_description: None,
            notes: Some("referral".into()),
            created_at: datetime!(2024-03-01 0:00 UTC),
            updated_at: datetime!(2024-03-01 0:00 UTC),
        }
    }

    fn run(state: ViewState, events: &[UiEvent], visible: &[JobApplication]) -> Transition {
        let ctx = Context {
            visible,
            today: TODAY,
        };
        let mut transition = Transition::stay(state);
        for event in events {
            transition = transition.state.handle(*event, &ctx);
        }
        transition
    }

    fn typed(text: &str) -> Vec<UiEvent> {
        text.chars().map(UiEvent::Char).collect()
    }

    #[test]
    fn initial_window_sets_date_range() {
        let state = ViewState::new(90, TODAY);
        assert_eq!(
            state.criteria.date_range,
            Some(DateRange::new(date!(2023 - 12 - 17), TODAY))
        );
        assert_eq!(state.window_label(), "last 90 days");
        assert!(ViewState::new(0, TODAY).criteria.date_range.is_none());
    }

    #[test]
    fn selection_stays_within_visible_rows() {
        let rows = vec![record(1, "Acme"), record(2, "Beta")];
        let moved = run(
            ViewState::new(0, TODAY),
            &[UiEvent::Down, UiEvent::Down, UiEvent::Down],
            &rows,
        );
        assert_eq!(moved.state.selected, 1);
        let back = run(moved.state, &[UiEvent::Up, UiEvent::Up], &rows);
        assert_eq!(back.state.selected, 0);
    }

    #[test]
    fn search_prompt_applies_parsed_query() {
        let mut events = vec![UiEvent::Char('/')];
        events.extend(typed("acme status:offered"));
        events.push(UiEvent::Enter);
        let t = run(ViewState::new(90, TODAY), &events, &[]);
        assert_eq!(t.state.mode, Mode::Browse);
        assert_eq!(t.state.criteria.search_term, "acme");
        assert!(t.state.criteria.statuses.contains(&Status::Offered));
        assert_eq!(t.state.window_days, Some(90));
        assert_eq!(t.state.query, "acme status:offered");
    }

    #[test]
    fn bad_query_keeps_prompt_open_with_message() {
        let mut events = vec![UiEvent::Char('/')];
        events.extend(typed("status:ghosted"));
        events.push(UiEvent::Enter);
        let t = run(ViewState::new(0, TODAY), &events, &[]);
        assert_matches!(t.state.mode, Mode::Search { ref input } if input == "status:ghosted");
        assert!(t
            .state
            .status_message
            .as_deref()
            .is_some_and(|m| m.contains("ghosted")));
    }

    #[test]
    fn typed_date_range_replaces_window_preset() {
        let mut events = vec![UiEvent::Char('/')];
        events.extend(typed("date:2024-01-01..2024-01-31"));
        events.push(UiEvent::Enter);
        let t = run(ViewState::new(30, TODAY), &events, &[]);
        assert_eq!(t.state.window_days, None);
        assert_eq!(
            t.state.criteria.date_range,
            Some(DateRange::new(date!(2024 - 01 - 01), date!(2024 - 01 - 31)))
        );
    }

    #[test]
    fn backspace_removes_whole_grapheme() {
        let mut events = vec![UiEvent::Char('/')];
        events.extend(typed("cafe\u{301}"));
        events.push(UiEvent::Backspace);
        let t = run(ViewState::new(0, TODAY), &events, &[]);
        assert_eq!(
            t.state.mode,
            Mode::Search {
                input: "caf".into()
            }
        );
    }

    #[test]
    fn window_cycles_through_presets() {
        let t = run(ViewState::new(30, TODAY), &[UiEvent::Char('w')], &[]);
        assert_eq!(t.state.window_days, Some(90));
        let t = run(t.state, &[UiEvent::Char('w'), UiEvent::Char('w')], &[]);
        assert_eq!(t.state.window_days, Some(0));
        assert!(t.state.criteria.date_range.is_none());
        let t = run(t.state, &[UiEvent::Char('w')], &[]);
        assert_eq!(t.state.window_days, Some(30));
    }

    #[test]
    fn status_picker_toggles_and_applies() {
        let events = [
            UiEvent::Char('s'),
            UiEvent::Char(' '),
            UiEvent::Down,
            UiEvent::Char(' '),
            UiEvent::Char(' '),
            UiEvent::Down,
            UiEvent::Char(' '),
            UiEvent::Enter,
        ];
        let t = run(ViewState::new(0, TODAY), &events, &[]);
        let expected: BTreeSet<Status> =
            [Status::Applied, Status::TechnicalInterview].into_iter().collect();
        assert_eq!(t.state.criteria.statuses, expected);

        let canceled = run(
            t.state,
            &[UiEvent::Char('s'), UiEvent::Char('c'), UiEvent::Esc],
            &[],
        );
        assert_eq!(canceled.state.criteria.statuses, expected);
    }

    #[test]
    fn new_form_reports_missing_fields_then_creates() {
        let mut events = vec![UiEvent::Char('a')];
        events.extend(typed("Backend Engineer"));
        events.push(UiEvent::Submit);
        let t = run(ViewState::new(0, TODAY), &events, &[]);
        assert!(t.effect.is_none());
        let Mode::Form(form) = &t.state.mode else {
            panic!("form should stay open");
        };
        let error = form.error.as_deref().unwrap_or_default();
        assert!(error.contains("company name"));
        assert!(error.contains("location"));
        assert!(!error.contains("job title"));

        let mut events = vec![UiEvent::Tab];
        events.extend(typed("Acme"));
        events.push(UiEvent::Tab);
        events.extend(typed("Berlin"));
        events.extend([UiEvent::Tab, UiEvent::Tab, UiEvent::Right, UiEvent::Submit]);
        let t = run(t.state, &events, &[]);
        assert_matches!(&t.state.mode, Mode::Form(form) if form.error.is_none());
        let Some(Effect::Create(draft)) = t.effect else {
            panic!("expected create effect");
        };
        assert_eq!(draft.company_name, "Acme");
        assert_eq!(draft.application_date, Some(TODAY));
        assert_eq!(draft.status, Some(Status::PhoneScreen));

        let mut saved = t.state.clone();
        saved.close_form();
        assert_eq!(saved.mode, Mode::Browse);

        let mut failed = t.state;
        failed.reject_form("disk full");
        assert_matches!(&failed.mode, Mode::Form(form) if form.company_name == "Acme"
            && form.error.as_deref() == Some("disk full"));
    }

    #[test]
    fn malformed_date_blocks_submit() {
        let rows = vec![record(4, "Acme")];
        let mut events = vec![UiEvent::Char('e'), UiEvent::Tab, UiEvent::Tab, UiEvent::Tab];
        events.extend(std::iter::repeat(UiEvent::Backspace).take(3));
        events.push(UiEvent::Submit);
        let t = run(ViewState::new(0, TODAY), &events, &rows);
        assert!(t.effect.is_none());
        assert_matches!(&t.state.mode, Mode::Form(form) if form
            .error
            .as_deref()
            .is_some_and(|e| e.contains("YYYY-MM-DD")));
    }

    #[test]
    fn edit_form_submits_update_for_selected_record() {
        let rows = vec![record(4, "Acme"), record(9, "Beta")];
        let mut events = vec![UiEvent::Down, UiEvent::Enter];
        events.extend([UiEvent::BackTab]);
        events.extend(typed(" - met CTO"));
        events.push(UiEvent::Enter);
        let t = run(ViewState::new(0, TODAY), &events, &rows);
        let Some(Effect::Update { id, draft }) = t.effect else {
            panic!("expected update effect");
        };
        assert_eq!(id, 9);
        assert_eq!(draft.company_name, "Beta");
        assert_eq!(draft.notes.as_deref(), Some("referral - met CTO"));
    }

    #[test]
    fn delete_requires_confirmation() {
        let rows = vec![record(4, "Acme")];
        let asked = run(ViewState::new(0, TODAY), &[UiEvent::Char('d')], &rows);
        assert_matches!(asked.state.mode, Mode::ConfirmDelete { id: 4, .. });
        assert!(asked.effect.is_none());

        let declined = run(asked.state.clone(), &[UiEvent::Char('n')], &rows);
        assert!(declined.effect.is_none());
        assert_eq!(declined.state.mode, Mode::Browse);

        let confirmed = run(asked.state, &[UiEvent::Char('y')], &rows);
        assert_eq!(confirmed.effect, Some(Effect::Delete(4)));
    }

    #[test]
    fn actions_on_empty_table_only_set_a_message() {
        let t = run(ViewState::new(0, TODAY), &[UiEvent::Char('d')], &[]);
        assert_eq!(t.state.mode, Mode::Browse);
        assert_eq!(t.state.status_message.as_deref(), Some("Nothing selected"));
    }

    #[test]
    fn quit_and_export_are_effects() {
        let t = run(ViewState::new(0, TODAY), &[UiEvent::Char('x')], &[]);
        assert_eq!(t.effect, Some(Effect::Export));
        let t = run(ViewState::new(0, TODAY), &[UiEvent::Char('a'), UiEvent::Quit], &[]);
        assert_eq!(t.effect, Some(Effect::Quit));
        let t = run(ViewState::new(0, TODAY), &[UiEvent::Char('/'), UiEvent::Char('q')], &[]);
        assert!(t.effect.is_none());
    }
}
