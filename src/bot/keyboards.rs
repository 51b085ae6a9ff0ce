use crate::directory::{SearchHit, TargetKind};
use crate::timetable::DayRange;
use teloxide::types::{
    InlineKeyboardButton, InlineKeyboardMarkup, KeyboardButton, KeyboardMarkup, KeyboardRemove,
    ReplyMarkup,
};

pub const MAIN_MENU_OPTIONS: [&str; 7] = [
    "Today",
    "Tomorrow",
    "Today and tomorrow",
    "This week",
    "Next week",
    "Search",
    "Settings",
];

pub const SEARCH_MENU_OPTIONS: [&str; 4] = [
    "Group schedule",
    "Teacher schedule",
    "Specific date",
    "Back",
];

pub const SETTINGS_OPTIONS: [&str; 4] = [
    "Subscribe to schedule",
    "Unsubscribe",
    "Displayed fields",
    "Back",
];

pub const TIME_SUGGESTIONS: [&str; 5] = ["07:00", "08:00", "09:00", "20:00", "Cancel"];

/// Renders menu option lists and disambiguation lists. Two flavors
/// exist: classic reply keyboards and inline keyboards whose presses
/// come back as `menu:<label>` callbacks routed into the same state
/// machine.
pub trait Presenter: Send + Sync {
    fn menu(&self, options: &[&str]) -> ReplyMarkup;

    fn disambiguation(&self, kind: TargetKind, hits: &[SearchHit]) -> ReplyMarkup;
}

/// Reply-keyboard presentation: option presses arrive as plain text.
pub struct ReplyKeys;

/// Inline-keyboard presentation: option presses arrive as callbacks.
pub struct InlineKeys;

impl Presenter for ReplyKeys {
    fn menu(&self, options: &[&str]) -> ReplyMarkup {
        let rows: Vec<Vec<KeyboardButton>> = options
            .chunks(2)
            .map(|pair| pair.iter().map(|o| KeyboardButton::new(*o)).collect())
            .collect();
        ReplyMarkup::Keyboard(KeyboardMarkup::new(rows).resize_keyboard(true))
    }

    fn disambiguation(&self, kind: TargetKind, hits: &[SearchHit]) -> ReplyMarkup {
        // Ids cannot ride on reply buttons, so disambiguation is inline
        // in both flavors.
        disambiguation_inline(kind, hits)
    }
}

impl Presenter for InlineKeys {
    fn menu(&self, options: &[&str]) -> ReplyMarkup {
        let rows: Vec<Vec<InlineKeyboardButton>> = options
            .chunks(2)
            .map(|pair| {
                pair.iter()
                    .map(|o| InlineKeyboardButton::callback(*o, format!("menu:{o}")))
                    .collect()
            })
            .collect();
        ReplyMarkup::InlineKeyboard(InlineKeyboardMarkup::new(rows))
    }

    fn disambiguation(&self, kind: TargetKind, hits: &[SearchHit]) -> ReplyMarkup {
        disambiguation_inline(kind, hits)
    }
}

/// Telegram rejects callback data over 64 bytes.
const CALLBACK_DATA_LIMIT: usize = 64;

/// `pick:<tag>:<id>:<label>` payload, with the label truncated on a
/// char boundary so long Cyrillic names never push the data past the
/// limit. The button caption always carries the full label.
fn pick_payload(tag: &str, hit: &SearchHit) -> String {
    let head = format!("pick:{tag}:{}:", hit.id);
    let room = CALLBACK_DATA_LIMIT.saturating_sub(head.len());
    let mut cut = hit.label.len().min(room);
    while cut > 0 && !hit.label.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{head}{}", &hit.label[..cut])
}

fn disambiguation_inline(kind: TargetKind, hits: &[SearchHit]) -> ReplyMarkup {
    let tag = match kind {
        TargetKind::Group => "g",
        TargetKind::Lecturer => "t",
    };
    let rows: Vec<Vec<InlineKeyboardButton>> = hits
        .iter()
        .map(|hit| {
            vec![InlineKeyboardButton::callback(
                hit.label.clone(),
                pick_payload(tag, hit),
            )]
        })
        .collect();
    ReplyMarkup::InlineKeyboard(InlineKeyboardMarkup::new(rows))
}

pub fn role_keyboard() -> ReplyMarkup {
    ReplyMarkup::Keyboard(
        KeyboardMarkup::new(vec![vec![
            KeyboardButton::new("Student"),
            KeyboardButton::new("Teacher"),
        ]])
        .resize_keyboard(true),
    )
}

pub fn day_range_options() -> Vec<&'static str> {
    let mut options: Vec<&str> = DayRange::ALL.iter().map(|r| r.label()).collect();
    options.push("Cancel");
    options
}

/// Inline toggles for the two formatter preferences; ticks reflect the
/// current values.
pub fn display_settings_markup(show_groups: bool, show_location: bool) -> InlineKeyboardMarkup {
    let mark = |on: bool| if on { "✅" } else { "☑️" };
    InlineKeyboardMarkup::new(vec![
        vec![InlineKeyboardButton::callback(
            format!("{} Groups in schedule", mark(show_groups)),
            "opt:groups",
        )],
        vec![InlineKeyboardButton::callback(
            format!("{} Location in schedule", mark(show_location)),
            "opt:location",
        )],
        vec![InlineKeyboardButton::callback("Back", "opt:back")],
    ])
}

pub fn remove() -> ReplyMarkup {
    ReplyMarkup::KeyboardRemove(KeyboardRemove::new())
}
