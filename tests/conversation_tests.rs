use async_trait::async_trait;
use chrono::NaiveDate;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use teloxide::types::{InlineKeyboardMarkup, ReplyMarkup};
use timetable_bot::bot::conversation::Conversation;
use timetable_bot::bot::keyboards::ReplyKeys;
use timetable_bot::bot::menu::Menu;
use timetable_bot::database::connection::DatabaseManager;
use timetable_bot::database::models::User;
use timetable_bot::delivery::{DeliveryError, Sink};
use timetable_bot::directory::{Directory, DirectoryError, RawLesson, SearchHit, TargetKind};

const CHAT: i64 = 1001;

#[derive(Default)]
struct MockDirectory {
    groups: Vec<SearchHit>,
    teachers: Vec<SearchHit>,
    fail: bool,
}

#[async_trait]
impl Directory for MockDirectory {
    async fn search_groups(&self, _term: &str) -> Result<Vec<SearchHit>, DirectoryError> {
        if self.fail {
            return Err(DirectoryError::Timeout);
        }
        Ok(self.groups.clone())
    }

    async fn search_teachers(&self, _term: &str) -> Result<Vec<SearchHit>, DirectoryError> {
        if self.fail {
            return Err(DirectoryError::Timeout);
        }
        Ok(self.teachers.clone())
    }

    async fn fetch_lessons(
        &self,
        _target_id: &str,
        _kind: TargetKind,
        start: NaiveDate,
        _end: NaiveDate,
    ) -> Result<Vec<RawLesson>, DirectoryError> {
        if self.fail {
            return Err(DirectoryError::Timeout);
        }
        // One lesson on the first requested day.
        Ok(vec![RawLesson {
            time_start: "10:00".to_string(),
            time_end: "11:30".to_string(),
            name: "Databases".to_string(),
            kind: "Lecture".to_string(),
            group: Some("PI18-1".to_string()),
            stream: None,
            auditorium: "Room 101".to_string(),
            location: Some("Main building".to_string()),
            lecturer: "Smith J.".to_string(),
            date: start.format("%Y.%m.%d").to_string(),
            note: None,
        }])
    }
}

#[derive(Default)]
struct RecordingSink {
    sent: Mutex<Vec<(i64, String)>>,
}

impl RecordingSink {
    fn texts(&self) -> Vec<String> {
        self.sent
            .lock()
            .expect("sink lock")
            .iter()
            .map(|(_, text)| text.clone())
            .collect()
    }

    fn last(&self) -> String {
        self.texts().last().cloned().unwrap_or_default()
    }
}

#[async_trait]
impl Sink for RecordingSink {
    async fn send(
        &self,
        chat_id: i64,
        text: &str,
        _markup: Option<ReplyMarkup>,
    ) -> Result<(), DeliveryError> {
        self.sent
            .lock()
            .expect("sink lock")
            .push((chat_id, text.to_string()));
        Ok(())
    }

    async fn edit(
        &self,
        chat_id: i64,
        _message_id: i32,
        text: &str,
        _markup: Option<InlineKeyboardMarkup>,
    ) -> Result<(), DeliveryError> {
        self.sent
            .lock()
            .expect("sink lock")
            .push((chat_id, text.to_string()));
        Ok(())
    }

    async fn delete(&self, _chat_id: i64, _message_id: i32) -> Result<(), DeliveryError> {
        Ok(())
    }

    async fn answer_callback(&self, _callback_id: &str, _text: &str) -> Result<(), DeliveryError> {
        Ok(())
    }
}

struct Fixture {
    pool: sqlx::SqlitePool,
    sink: Arc<RecordingSink>,
    conversation: Conversation,
    _dir: TempDir,
}

async fn fixture(directory: MockDirectory) -> Fixture {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let db_path = temp_dir.path().join("test.db");
    let db_url = format!("sqlite://{}", db_path.display());

    let db = DatabaseManager::open(&db_url)
        .await
        .expect("Failed to create test database");

    let sink = Arc::new(RecordingSink::default());
    let conversation = Conversation::new(
        db.pool.clone(),
        Arc::new(directory),
        sink.clone(),
        Arc::new(ReplyKeys),
    );
    Fixture {
        pool: db.pool,
        sink,
        conversation,
        _dir: temp_dir,
    }
}

fn one_group() -> MockDirectory {
    MockDirectory {
        groups: vec![SearchHit {
            id: "9999".to_string(),
            label: "ПИ18-1".to_string(),
        }],
        ..Default::default()
    }
}

async fn menu_of(pool: &sqlx::SqlitePool, chat: i64) -> Menu {
    User::find_by_id(pool, chat)
        .await
        .expect("fetch")
        .expect("exists")
        .menu_state()
}

#[tokio::test]
async fn restart_asks_for_role() {
    let f = fixture(MockDirectory::default()).await;

    f.conversation
        .handle_restart(CHAT, Some("alice"))
        .await
        .expect("restart");

    assert!(f.sink.last().contains("tell me who you are"));
    assert_eq!(menu_of(&f.pool, CHAT).await, Menu::Start);
}

#[tokio::test]
async fn restart_mentions_dropped_subscription() {
    let f = fixture(MockDirectory::default()).await;

    User::get_or_create(&f.pool, CHAT).await.expect("create");
    User::set_subscription_time(&f.pool, CHAT, "9999", "07:00", Menu::SubscribeChoiceDay)
        .await
        .expect("time");
    User::set_subscription_days(&f.pool, CHAT, "Today", Menu::MainMenu)
        .await
        .expect("days");

    f.conversation
        .handle_restart(CHAT, None)
        .await
        .expect("restart");

    let last = f.sink.last();
    assert!(last.contains("subscription has been reset"));
    let user = User::find_by_id(&f.pool, CHAT).await.expect("fetch").expect("exists");
    assert!(user.subscription_time.is_none());
}

#[tokio::test]
async fn student_with_unique_group_reaches_main_menu() {
    let f = fixture(one_group()).await;

    f.conversation.handle_restart(CHAT, None).await.expect("restart");
    f.conversation.handle_text(CHAT, "Student").await.expect("role");
    assert!(f.sink.last().contains("name of your group"));
    assert_eq!(menu_of(&f.pool, CHAT).await, Menu::ChoiceGroup);

    f.conversation.handle_text(CHAT, "пи18-1").await.expect("search");

    assert_eq!(menu_of(&f.pool, CHAT).await, Menu::MainMenu);
    let user = User::find_by_id(&f.pool, CHAT).await.expect("fetch").expect("exists");
    assert_eq!(user.search_id.as_deref(), Some("9999"));
    assert_eq!(user.search_display.as_deref(), Some("ПИ18-1"));
    assert!(f.sink.last().contains("«ПИ18-1»"));
}

#[tokio::test]
async fn unknown_group_reprompts_in_place() {
    let f = fixture(MockDirectory::default()).await;

    f.conversation.handle_restart(CHAT, None).await.expect("restart");
    f.conversation.handle_text(CHAT, "Student").await.expect("role");
    f.conversation.handle_text(CHAT, "nope").await.expect("search");

    assert!(f.sink.last().contains("Could not find group «nope»"));
    assert_eq!(menu_of(&f.pool, CHAT).await, Menu::ChoiceGroup);
}

#[tokio::test]
async fn directory_failure_keeps_state() {
    let f = fixture(MockDirectory {
        fail: true,
        ..Default::default()
    })
    .await;

    f.conversation.handle_restart(CHAT, None).await.expect("restart");
    f.conversation.handle_text(CHAT, "Student").await.expect("role");
    f.conversation.handle_text(CHAT, "пи18-1").await.expect("search");

    assert!(f.sink.last().contains("Could not retrieve the schedule"));
    assert_eq!(menu_of(&f.pool, CHAT).await, Menu::ChoiceGroup);
}

#[tokio::test]
async fn ambiguous_search_offers_choices_and_pick_binds() {
    let f = fixture(MockDirectory {
        groups: vec![
            SearchHit {
                id: "1".to_string(),
                label: "ПИ18-1".to_string(),
            },
            SearchHit {
                id: "2".to_string(),
                label: "ПИ18-2".to_string(),
            },
        ],
        ..Default::default()
    })
    .await;

    f.conversation.handle_restart(CHAT, None).await.expect("restart");
    f.conversation.handle_text(CHAT, "Student").await.expect("role");
    f.conversation.handle_text(CHAT, "пи18").await.expect("search");

    assert!(f.sink.last().contains("Several groups match"));
    assert_eq!(menu_of(&f.pool, CHAT).await, Menu::ChoiceGroup);

    f.conversation
        .handle_callback(CHAT, Some(55), "cb1", "pick:g:2:ПИ18-2")
        .await
        .expect("pick");

    assert_eq!(menu_of(&f.pool, CHAT).await, Menu::MainMenu);
    let user = User::find_by_id(&f.pool, CHAT).await.expect("fetch").expect("exists");
    assert_eq!(user.search_id.as_deref(), Some("2"));
}

#[tokio::test]
async fn today_delivers_rendered_schedule() {
    let f = fixture(one_group()).await;

    f.conversation.handle_restart(CHAT, None).await.expect("restart");
    f.conversation.handle_text(CHAT, "Student").await.expect("role");
    f.conversation.handle_text(CHAT, "пи18-1").await.expect("search");
    f.conversation.handle_text(CHAT, "Today").await.expect("deliver");

    let texts = f.sink.texts();
    let schedule = texts
        .iter()
        .find(|t| t.contains("📅"))
        .expect("schedule message sent");
    assert!(schedule.contains("Databases"));
    assert!(schedule.contains("⏱ 10:00 – 11:30 ⏱"));
}

#[tokio::test]
async fn menu_escape_works_from_any_state() {
    let f = fixture(one_group()).await;

    f.conversation.handle_restart(CHAT, None).await.expect("restart");
    f.conversation.handle_text(CHAT, "Student").await.expect("role");
    f.conversation.handle_text(CHAT, "пи18-1").await.expect("search");
    f.conversation.handle_text(CHAT, "Search").await.expect("search menu");
    assert_eq!(menu_of(&f.pool, CHAT).await, Menu::SearchMenu);

    f.conversation.handle_text(CHAT, "MENU").await.expect("escape");

    assert!(f.sink.last().contains("Back to the main menu"));
    assert_eq!(menu_of(&f.pool, CHAT).await, Menu::MainMenu);
}

#[tokio::test]
async fn subscription_happy_path() {
    let f = fixture(one_group()).await;

    f.conversation.handle_restart(CHAT, None).await.expect("restart");
    f.conversation.handle_text(CHAT, "Student").await.expect("role");
    f.conversation.handle_text(CHAT, "пи18-1").await.expect("search");
    f.conversation.handle_text(CHAT, "Settings").await.expect("settings");
    assert_eq!(menu_of(&f.pool, CHAT).await, Menu::Settings);

    f.conversation
        .handle_text(CHAT, "Subscribe to schedule")
        .await
        .expect("subscribe");
    assert_eq!(menu_of(&f.pool, CHAT).await, Menu::SubscribeChoiceTime);

    f.conversation.handle_text(CHAT, "12:35").await.expect("time");
    assert_eq!(menu_of(&f.pool, CHAT).await, Menu::SubscribeChoiceDay);

    f.conversation.handle_text(CHAT, "Tomorrow").await.expect("days");

    let user = User::find_by_id(&f.pool, CHAT).await.expect("fetch").expect("exists");
    assert_eq!(user.menu_state(), Menu::MainMenu);
    assert_eq!(user.subscription_time.as_deref(), Some("12:35"));
    assert_eq!(user.subscription_days.as_deref(), Some("Tomorrow"));
    assert_eq!(user.subscription_id.as_deref(), Some("9999"));
    assert!(f.sink.last().contains("Every day at 12:35"));
}

#[tokio::test]
async fn invalid_time_resets_subscription() {
    let f = fixture(one_group()).await;

    f.conversation.handle_restart(CHAT, None).await.expect("restart");
    f.conversation.handle_text(CHAT, "Student").await.expect("role");
    f.conversation.handle_text(CHAT, "пи18-1").await.expect("search");
    f.conversation.handle_text(CHAT, "Settings").await.expect("settings");
    f.conversation
        .handle_text(CHAT, "Subscribe to schedule")
        .await
        .expect("subscribe");

    f.conversation.handle_text(CHAT, "25:99").await.expect("time");

    let user = User::find_by_id(&f.pool, CHAT).await.expect("fetch").expect("exists");
    assert_eq!(user.menu_state(), Menu::MainMenu);
    assert!(user.subscription_id.is_none());
    assert!(user.subscription_time.is_none());
    assert!(f.sink.last().contains("Invalid time format"));
}

#[tokio::test]
async fn one_off_search_does_not_change_own_group() {
    let f = fixture(MockDirectory {
        groups: vec![SearchHit {
            id: "9999".to_string(),
            label: "ПИ18-1".to_string(),
        }],
        teachers: vec![SearchHit {
            id: "777".to_string(),
            label: "Коротеев Михаил Викторович".to_string(),
        }],
        ..Default::default()
    })
    .await;

    f.conversation.handle_restart(CHAT, None).await.expect("restart");
    f.conversation.handle_text(CHAT, "Student").await.expect("role");
    f.conversation.handle_text(CHAT, "пи18-1").await.expect("search");
    f.conversation.handle_text(CHAT, "Search").await.expect("search menu");
    f.conversation
        .handle_text(CHAT, "Teacher schedule")
        .await
        .expect("teacher search");
    assert_eq!(menu_of(&f.pool, CHAT).await, Menu::SearchTeacher);

    f.conversation.handle_text(CHAT, "Коротеев").await.expect("term");
    assert_eq!(menu_of(&f.pool, CHAT).await, Menu::SearchTeacherDay);
    let prompt = f.sink.last();
    assert!(prompt.contains("Found teacher «Коротеев Михаил Викторович»"));
    assert!(prompt.contains("Pick the period to show"));

    f.conversation.handle_text(CHAT, "Today").await.expect("day pick");

    let user = User::find_by_id(&f.pool, CHAT).await.expect("fetch").expect("exists");
    assert_eq!(user.menu_state(), Menu::MainMenu);
    // The one-off target never replaces the user's own group.
    assert_eq!(user.search_id.as_deref(), Some("9999"));
    assert_eq!(user.search_additional, "");
    let texts = f.sink.texts();
    assert!(texts.iter().any(|t| t.contains("Schedule for today")));
}

#[tokio::test]
async fn display_option_toggle_flips_flag() {
    let f = fixture(one_group()).await;

    f.conversation.handle_restart(CHAT, None).await.expect("restart");
    f.conversation.handle_text(CHAT, "Student").await.expect("role");
    f.conversation.handle_text(CHAT, "пи18-1").await.expect("search");

    f.conversation
        .handle_callback(CHAT, Some(77), "cb2", "opt:groups")
        .await
        .expect("toggle");

    let user = User::find_by_id(&f.pool, CHAT).await.expect("fetch").expect("exists");
    assert!(user.show_groups);
    assert!(!user.show_location);
}
