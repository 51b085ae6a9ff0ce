use crate::bot::keyboards::{
    self, Presenter, MAIN_MENU_OPTIONS, SEARCH_MENU_OPTIONS, SETTINGS_OPTIONS, TIME_SUGGESTIONS,
};
use crate::bot::menu::{Menu, Scratch};
use crate::bot::strings;
use crate::database::models::{Role, User};
use crate::delivery::Sink;
use crate::directory::{Directory, SearchHit, TargetKind};
use crate::timetable::{render_schedule, DayRange, Prefs};
use anyhow::Result;
use chrono::{Datelike, Local, NaiveDate, NaiveTime};
use std::sync::Arc;
use teloxide::types::ReplyMarkup;
use tracing::warn;

/// The per-user conversation state machine. Holds its collaborators
/// explicitly (store pool, directory client, outbound sink, keyboard
/// presenter) so it can be exercised in tests without a live transport
/// or network.
pub struct Conversation {
    pool: sqlx::SqlitePool,
    directory: Arc<dyn Directory>,
    sink: Arc<dyn Sink>,
    presenter: Arc<dyn Presenter>,
}

impl Conversation {
    pub fn new(
        pool: sqlx::SqlitePool,
        directory: Arc<dyn Directory>,
        sink: Arc<dyn Sink>,
        presenter: Arc<dyn Presenter>,
    ) -> Self {
        Self {
            pool,
            directory,
            sink,
            presenter,
        }
    }

    /// Delivery failures are scoped to the one interaction; they are
    /// logged by the sink and must not abort the state transition.
    async fn send(&self, chat_id: i64, text: &str, markup: Option<ReplyMarkup>) {
        if let Err(e) = self.sink.send(chat_id, text, markup).await {
            warn!("chat {chat_id}: dropped outbound message: {e}");
        }
    }

    fn main_menu(&self) -> ReplyMarkup {
        self.presenter.menu(&MAIN_MENU_OPTIONS)
    }

    /// `/start` and `/restart`: reset the row to defaults and ask for
    /// the role again.
    pub async fn handle_restart(&self, chat_id: i64, login: Option<&str>) -> Result<()> {
        let user = User::get_or_create(&self.pool, chat_id).await?;
        let mut text = String::from(strings::WELCOME);
        if user.subscription_days.is_some() {
            text = format!("{}\n\n{}", strings::SUBSCRIPTION_RESET, text);
        }
        User::reset(&self.pool, chat_id, login).await?;
        self.send(chat_id, &text, Some(keyboards::role_keyboard()))
            .await;
        Ok(())
    }

    /// Free-text and reply-button input, routed by the stored menu
    /// position after the always-available "menu" escape.
    pub async fn handle_text(&self, chat_id: i64, text: &str) -> Result<()> {
        let user = User::get_or_create(&self.pool, chat_id).await?;
        let text = text.trim();

        if text.eq_ignore_ascii_case("menu") {
            User::set_menu(&self.pool, chat_id, Menu::MainMenu).await?;
            self.send(chat_id, strings::MOVED_TO_MAIN_MENU, Some(self.main_menu()))
                .await;
            return Ok(());
        }

        match user.menu_state() {
            Menu::Start => self.on_role_choice(&user, text).await,
            Menu::ChoiceGroup | Menu::SearchGroup => {
                self.on_search(&user, text, TargetKind::Group).await
            }
            Menu::ChoiceName | Menu::SearchTeacher => {
                self.on_search(&user, text, TargetKind::Lecturer).await
            }
            Menu::MainMenu => self.on_main_menu(&user, text).await,
            Menu::SearchMenu => self.on_search_menu(&user, text).await,
            Menu::SearchGroupDay => {
                self.on_search_day_pick(&user, text, TargetKind::Group).await
            }
            Menu::SearchTeacherDay => {
                self.on_search_day_pick(&user, text, TargetKind::Lecturer)
                    .await
            }
            Menu::SearchDay => self.on_specific_date(&user, text).await,
            Menu::Settings => self.on_settings(&user, text).await,
            Menu::SubscribeChoiceTime => self.on_subscribe_time(&user, text).await,
            Menu::SubscribeChoiceDay => self.on_subscribe_day(&user, text).await,
        }
    }

    /// Inline button input. `menu:` presses re-enter the text machine
    /// so both keyboard flavors drive the same transitions.
    pub async fn handle_callback(
        &self,
        chat_id: i64,
        message_id: Option<i32>,
        callback_id: &str,
        data: &str,
    ) -> Result<()> {
        if let Some(label) = data.strip_prefix("menu:") {
            let _ = self.sink.answer_callback(callback_id, label).await;
            return self.handle_text(chat_id, label).await;
        }
        if let Some(rest) = data.strip_prefix("pick:") {
            return self.on_pick(chat_id, message_id, callback_id, rest).await;
        }
        if let Some(option) = data.strip_prefix("opt:") {
            return self
                .on_display_option(chat_id, message_id, callback_id, option)
                .await;
        }
        let _ = self.sink.answer_callback(callback_id, "Unknown action").await;
        Ok(())
    }

    async fn on_role_choice(&self, user: &User, text: &str) -> Result<()> {
        match text {
            "Student" => {
                User::set_role(&self.pool, user.id, Role::Student, Menu::ChoiceGroup, false, false)
                    .await?;
                self.send(user.id, strings::GROUP_EXAMPLE, Some(keyboards::remove()))
                    .await;
            }
            "Teacher" => {
                // Teachers see groups and building locations by default.
                User::set_role(&self.pool, user.id, Role::Teacher, Menu::ChoiceName, true, true)
                    .await?;
                self.send(user.id, strings::TEACHER_EXAMPLE, Some(keyboards::remove()))
                    .await;
            }
            _ => {
                self.send(user.id, strings::WELCOME, Some(keyboards::role_keyboard()))
                    .await;
            }
        }
        Ok(())
    }

    async fn on_search(&self, user: &User, term: &str, kind: TargetKind) -> Result<()> {
        let result = match kind {
            TargetKind::Group => self.directory.search_groups(term).await,
            TargetKind::Lecturer => self.directory.search_teachers(term).await,
        };
        let hits = match result {
            Ok(hits) => hits,
            Err(e) => {
                warn!("chat {}: directory search failed: {e}", user.id);
                self.send(user.id, strings::CANT_GET_SCHEDULE, None).await;
                return Ok(());
            }
        };

        if hits.is_empty() {
            let template = match kind {
                TargetKind::Group => strings::GROUP_NOT_FOUND,
                TargetKind::Lecturer => strings::TEACHER_NOT_FOUND,
            };
            self.send(
                user.id,
                &strings::fill(template, term),
                Some(keyboards::remove()),
            )
            .await;
            return Ok(());
        }

        if hits.len() == 1 {
            return self.bind_hit(user, kind, &hits[0]).await;
        }

        let prompt = match kind {
            TargetKind::Group => strings::CHOOSE_GROUP,
            TargetKind::Lecturer => strings::CHOOSE_TEACHER,
        };
        self.send(
            user.id,
            prompt,
            Some(self.presenter.disambiguation(kind, &hits)),
        )
        .await;
        Ok(())
    }

    /// A uniquely resolved search hit either becomes the user's own
    /// target (first-time setup) or a one-off target awaiting a day
    /// pick (re-search flow).
    async fn bind_hit(&self, user: &User, kind: TargetKind, hit: &SearchHit) -> Result<()> {
        let searching = matches!(
            user.menu_state(),
            Menu::SearchGroup | Menu::SearchTeacher
        );
        if searching {
            let next = match kind {
                TargetKind::Group => Menu::SearchGroupDay,
                TargetKind::Lecturer => Menu::SearchTeacherDay,
            };
            User::set_scratch(&self.pool, user.id, Scratch::Target(hit.id.clone()), next)
                .await?;
            let template = match kind {
                TargetKind::Group => strings::GROUP_FOUND,
                TargetKind::Lecturer => strings::TEACHER_FOUND,
            };
            let text = format!(
                "{}\n{}",
                strings::fill(template, &hit.label),
                strings::CHOOSE_DAY_RANGE
            );
            self.send(
                user.id,
                &text,
                Some(self.presenter.menu(&keyboards::day_range_options())),
            )
            .await;
        } else {
            User::bind_target(&self.pool, user.id, &hit.id, &hit.label, Menu::MainMenu).await?;
            let template = match kind {
                TargetKind::Group => strings::GROUP_CHANGED_FOR,
                TargetKind::Lecturer => strings::TEACHER_BOUND,
            };
            let text = format!(
                "{}\n{}",
                strings::fill(template, &hit.label),
                strings::CHOOSE_MENU
            );
            self.send(user.id, &text, Some(self.main_menu())).await;
        }
        Ok(())
    }

    async fn on_main_menu(&self, user: &User, text: &str) -> Result<()> {
        if let Some(range) = DayRange::from_label(text) {
            return self.deliver_own(user, range).await;
        }
        match text {
            "Search" => {
                User::set_menu(&self.pool, user.id, Menu::SearchMenu).await?;
                self.send(
                    user.id,
                    strings::WHAT_TO_FIND,
                    Some(self.presenter.menu(&SEARCH_MENU_OPTIONS)),
                )
                .await;
            }
            "Settings" => {
                User::set_menu(&self.pool, user.id, Menu::Settings).await?;
                self.send(
                    user.id,
                    strings::WHAT_TO_SET,
                    Some(self.presenter.menu(&SETTINGS_OPTIONS)),
                )
                .await;
            }
            _ => {
                self.send(user.id, strings::CHOOSE_MENU, Some(self.main_menu()))
                    .await;
            }
        }
        Ok(())
    }

    async fn on_search_menu(&self, user: &User, text: &str) -> Result<()> {
        match text {
            "Back" => {
                User::set_menu(&self.pool, user.id, Menu::MainMenu).await?;
                self.send(user.id, strings::CHOOSE_MENU, Some(self.main_menu()))
                    .await;
            }
            "Group schedule" => {
                User::set_scratch(&self.pool, user.id, Scratch::Searching, Menu::SearchGroup)
                    .await?;
                self.send(user.id, strings::WRITE_GROUP, Some(keyboards::remove()))
                    .await;
            }
            "Teacher schedule" => {
                User::set_scratch(&self.pool, user.id, Scratch::Searching, Menu::SearchTeacher)
                    .await?;
                self.send(user.id, strings::WRITE_TEACHER, Some(keyboards::remove()))
                    .await;
            }
            "Specific date" => {
                User::set_scratch(&self.pool, user.id, Scratch::Searching, Menu::SearchDay)
                    .await?;
                self.send(user.id, strings::WRITE_DATE, Some(keyboards::remove()))
                    .await;
            }
            _ => {
                self.send(
                    user.id,
                    strings::WHAT_TO_FIND,
                    Some(self.presenter.menu(&SEARCH_MENU_OPTIONS)),
                )
                .await;
            }
        }
        Ok(())
    }

    async fn on_search_day_pick(&self, user: &User, text: &str, kind: TargetKind) -> Result<()> {
        let range = DayRange::from_label(text);
        let scratch = user.scratch();
        // Whatever happens, the one-off search is over.
        User::set_scratch(&self.pool, user.id, Scratch::Idle, Menu::MainMenu).await?;

        let (Some(range), Scratch::Target(target_id)) = (range, scratch) else {
            let text = if text == "Cancel" {
                strings::CANCELLED
            } else {
                strings::CHOOSE_MENU
            };
            self.send(user.id, text, Some(self.main_menu())).await;
            return Ok(());
        };

        let today = Local::now().date_naive();
        let (offset, days) = range.resolve(today);
        let heading = format!("Schedule for {}\n\n", range.spoken());
        self.deliver(
            user.id,
            &target_id,
            kind,
            offset,
            days,
            user_prefs(user),
            &heading,
        )
        .await;
        self.send(user.id, strings::CHOOSE_MENU, Some(self.main_menu()))
            .await;
        Ok(())
    }

    async fn on_specific_date(&self, user: &User, text: &str) -> Result<()> {
        let today = Local::now().date_naive();
        User::set_scratch(&self.pool, user.id, Scratch::Idle, Menu::MainMenu).await?;

        let Some(date) = parse_day(text, today) else {
            self.send(user.id, strings::INVALID_DATE, Some(self.main_menu()))
                .await;
            return Ok(());
        };

        let (Some(target_id), Some(role)) = (user.search_id.clone(), user.role_parsed()) else {
            self.send(user.id, strings::CHOOSE_ROLE_FIRST, Some(self.main_menu()))
                .await;
            return Ok(());
        };
        let offset = (date - today).num_days();
        self.deliver(
            user.id,
            &target_id,
            role.target_kind(),
            offset,
            1,
            user_prefs(user),
            "",
        )
        .await;
        self.send(user.id, strings::CHOOSE_MENU, Some(self.main_menu()))
            .await;
        Ok(())
    }

    async fn on_settings(&self, user: &User, text: &str) -> Result<()> {
        match text {
            "Back" => {
                User::set_menu(&self.pool, user.id, Menu::MainMenu).await?;
                self.send(user.id, strings::CHOOSE_MENU, Some(self.main_menu()))
                    .await;
            }
            "Displayed fields" => {
                self.send(
                    user.id,
                    strings::DISPLAY_SETTINGS,
                    Some(ReplyMarkup::InlineKeyboard(
                        keyboards::display_settings_markup(user.show_groups, user.show_location),
                    )),
                )
                .await;
            }
            "Subscribe to schedule" => {
                let Some(search_id) = user.search_id.clone() else {
                    self.send(user.id, strings::CHOOSE_ROLE_FIRST, Some(self.main_menu()))
                        .await;
                    return Ok(());
                };
                User::begin_subscription(&self.pool, user.id, &search_id).await?;
                self.send(
                    user.id,
                    strings::SUBSCRIBE_CHOICE_TIME,
                    Some(self.presenter.menu(&TIME_SUGGESTIONS)),
                )
                .await;
            }
            "Unsubscribe" => {
                User::clear_subscription(&self.pool, user.id, Menu::MainMenu).await?;
                self.send(user.id, strings::UNSUBSCRIBED, Some(self.main_menu()))
                    .await;
            }
            _ => {
                self.send(
                    user.id,
                    strings::WHAT_TO_SET,
                    Some(self.presenter.menu(&SETTINGS_OPTIONS)),
                )
                .await;
            }
        }
        Ok(())
    }

    async fn on_subscribe_time(&self, user: &User, text: &str) -> Result<()> {
        if text == "Cancel" {
            User::clear_subscription(&self.pool, user.id, Menu::MainMenu).await?;
            self.send(user.id, strings::CHOOSE_MENU, Some(self.main_menu()))
                .await;
            return Ok(());
        }

        let parsed = NaiveTime::parse_from_str(text, "%H:%M");
        let subscription_id = user
            .subscription_id
            .clone()
            .or_else(|| user.search_id.clone());

        match (parsed, subscription_id) {
            (Ok(time), Some(sid)) => {
                let hhmm = time.format("%H:%M").to_string();
                User::set_subscription_time(
                    &self.pool,
                    user.id,
                    &sid,
                    &hhmm,
                    Menu::SubscribeChoiceDay,
                )
                .await?;
                self.send(
                    user.id,
                    strings::SUBSCRIBE_CHOICE_DAY,
                    Some(self.presenter.menu(&keyboards::day_range_options())),
                )
                .await;
            }
            _ => {
                // Invalid time resets the whole subscription.
                User::clear_subscription(&self.pool, user.id, Menu::MainMenu).await?;
                self.send(
                    user.id,
                    strings::SUBSCRIBE_INVALID_TIME,
                    Some(self.main_menu()),
                )
                .await;
            }
        }
        Ok(())
    }

    async fn on_subscribe_day(&self, user: &User, text: &str) -> Result<()> {
        if let Some(range) = DayRange::from_label(text) {
            User::set_subscription_days(&self.pool, user.id, range.label(), Menu::MainMenu)
                .await?;
            let time = user.subscription_time.as_deref().unwrap_or("--:--");
            self.send(
                user.id,
                &strings::subscription_confirmed(time, range.spoken()),
                Some(self.main_menu()),
            )
            .await;
            return Ok(());
        }

        User::clear_subscription(&self.pool, user.id, Menu::MainMenu).await?;
        let text = if text == "Cancel" {
            strings::CHOOSE_MENU
        } else {
            strings::SUBSCRIBE_INVALID_DAY
        };
        self.send(user.id, text, Some(self.main_menu())).await;
        Ok(())
    }

    async fn on_pick(
        &self,
        chat_id: i64,
        message_id: Option<i32>,
        callback_id: &str,
        rest: &str,
    ) -> Result<()> {
        let user = User::get_or_create(&self.pool, chat_id).await?;
        let mut parts = rest.splitn(3, ':');
        let (Some(tag), Some(id), Some(label)) = (parts.next(), parts.next(), parts.next())
        else {
            let _ = self.sink.answer_callback(callback_id, "Unknown action").await;
            return Ok(());
        };
        let kind = match tag {
            "g" => TargetKind::Group,
            "t" => TargetKind::Lecturer,
            _ => {
                let _ = self.sink.answer_callback(callback_id, "Unknown action").await;
                return Ok(());
            }
        };
        let _ = self.sink.answer_callback(callback_id, label).await;
        // Collapse the disambiguation list onto the chosen label.
        if let Some(message_id) = message_id {
            let _ = self.sink.edit(chat_id, message_id, label, None).await;
        }
        let hit = SearchHit {
            id: id.to_owned(),
            label: label.to_owned(),
        };
        self.bind_hit(&user, kind, &hit).await
    }

    async fn on_display_option(
        &self,
        chat_id: i64,
        message_id: Option<i32>,
        callback_id: &str,
        option: &str,
    ) -> Result<()> {
        let user = User::get_or_create(&self.pool, chat_id).await?;
        let (show_groups, show_location) = match option {
            "groups" => (!user.show_groups, user.show_location),
            "location" => (user.show_groups, !user.show_location),
            "back" => {
                let _ = self.sink.answer_callback(callback_id, "").await;
                if let Some(message_id) = message_id {
                    let _ = self
                        .sink
                        .edit(chat_id, message_id, strings::WHAT_TO_SET, None)
                        .await;
                }
                return Ok(());
            }
            _ => {
                let _ = self.sink.answer_callback(callback_id, "Unknown action").await;
                return Ok(());
            }
        };
        User::set_display_prefs(&self.pool, chat_id, show_groups, show_location).await?;
        let _ = self.sink.answer_callback(callback_id, "Saved").await;
        if let Some(message_id) = message_id {
            let _ = self
                .sink
                .edit(
                    chat_id,
                    message_id,
                    strings::DISPLAY_SETTINGS,
                    Some(keyboards::display_settings_markup(show_groups, show_location)),
                )
                .await;
        }
        Ok(())
    }

    /// Schedule for the user's own bound target.
    async fn deliver_own(&self, user: &User, range: DayRange) -> Result<()> {
        let (Some(target_id), Some(role)) = (user.search_id.clone(), user.role_parsed()) else {
            if user.role.is_none() {
                self.send(
                    user.id,
                    strings::CHOOSE_ROLE_FIRST,
                    Some(keyboards::role_keyboard()),
                )
                .await;
            } else {
                self.send(user.id, strings::CANT_GET_SCHEDULE, Some(self.main_menu()))
                    .await;
            }
            return Ok(());
        };

        let today = Local::now().date_naive();
        let (offset, days) = range.resolve(today);
        let heading = format!("Schedule for {}\n\n", range.spoken());
        self.deliver(
            user.id,
            &target_id,
            role.target_kind(),
            offset,
            days,
            user_prefs(user),
            &heading,
        )
        .await;
        Ok(())
    }

    /// Fetch, aggregate, format and send; remote failures become one
    /// generic user-facing message.
    #[allow(clippy::too_many_arguments)]
    async fn deliver(
        &self,
        chat_id: i64,
        target_id: &str,
        kind: TargetKind,
        offset: i64,
        days: u32,
        prefs: Prefs,
        heading: &str,
    ) {
        let today = Local::now().date_naive();
        match render_schedule(
            self.directory.as_ref(),
            target_id,
            kind,
            today,
            offset,
            days,
            prefs,
            heading,
        )
        .await
        {
            Ok(text) => self.send(chat_id, &text, Some(self.main_menu())).await,
            Err(e) => {
                warn!("chat {chat_id}: error getting schedule: {e}");
                self.send(chat_id, strings::CANT_GET_SCHEDULE, None).await;
            }
        }
    }
}

fn user_prefs(user: &User) -> Prefs {
    Prefs {
        show_groups: user.show_groups,
        show_location: user.show_location,
    }
}

/// Accepts `dd.mm.yyyy` or `dd.mm` (current year assumed).
pub fn parse_day(text: &str, today: NaiveDate) -> Option<NaiveDate> {
    let text = text.trim();
    match text.split('.').count() {
        3 => NaiveDate::parse_from_str(text, "%d.%m.%Y").ok(),
        2 => NaiveDate::parse_from_str(&format!("{text}.{}", today.year()), "%d.%m.%Y").ok(),
        _ => None,
    }
}
