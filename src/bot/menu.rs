/// Finite per-user menu positions. Persisted as TEXT in the `menu`
/// column; unknown values decode to `Start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Menu {
    Start,
    ChoiceGroup,
    ChoiceName,
    MainMenu,
    SearchMenu,
    SearchGroup,
    SearchTeacher,
    SearchGroupDay,
    SearchTeacherDay,
    SearchDay,
    Settings,
    SubscribeChoiceTime,
    SubscribeChoiceDay,
}

impl Menu {
    pub fn as_str(&self) -> &'static str {
        match self {
            Menu::Start => "START",
            Menu::ChoiceGroup => "CHOICE_GROUP",
            Menu::ChoiceName => "CHOICE_NAME",
            Menu::MainMenu => "MAIN_MENU",
            Menu::SearchMenu => "SEARCH_MENU",
            Menu::SearchGroup => "SEARCH_GROUP",
            Menu::SearchTeacher => "SEARCH_TEACHER",
            Menu::SearchGroupDay => "SEARCH_GROUP_DAY",
            Menu::SearchTeacherDay => "SEARCH_TEACHER_DAY",
            Menu::SearchDay => "SEARCH_DAY",
            Menu::Settings => "SETTINGS",
            Menu::SubscribeChoiceTime => "SUBSCRIBE_CHOICE_TIME",
            Menu::SubscribeChoiceDay => "SUBSCRIBE_CHOICE_DAY",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "START" => Some(Menu::Start),
            "CHOICE_GROUP" => Some(Menu::ChoiceGroup),
            "CHOICE_NAME" => Some(Menu::ChoiceName),
            "MAIN_MENU" => Some(Menu::MainMenu),
            "SEARCH_MENU" => Some(Menu::SearchMenu),
            "SEARCH_GROUP" => Some(Menu::SearchGroup),
            "SEARCH_TEACHER" => Some(Menu::SearchTeacher),
            "SEARCH_GROUP_DAY" => Some(Menu::SearchGroupDay),
            "SEARCH_TEACHER_DAY" => Some(Menu::SearchTeacherDay),
            "SEARCH_DAY" => Some(Menu::SearchDay),
            "SETTINGS" => Some(Menu::Settings),
            "SUBSCRIBE_CHOICE_TIME" => Some(Menu::SubscribeChoiceTime),
            "SUBSCRIBE_CHOICE_DAY" => Some(Menu::SubscribeChoiceDay),
            _ => None,
        }
    }
}

/// Transient state of a one-off search flow, stored in the
/// `search_additional` column. Replaces the untyped sentinel string the
/// column historically held.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scratch {
    /// No search in progress.
    Idle,
    /// A one-off search was opened and awaits the user's query text.
    Searching,
    /// A one-off target was resolved and awaits the day-range pick.
    Target(String),
}

impl Scratch {
    pub fn encode(&self) -> String {
        match self {
            Scratch::Idle => String::new(),
            Scratch::Searching => "searching".to_owned(),
            Scratch::Target(id) => format!("target:{id}"),
        }
    }

    pub fn decode(value: &str) -> Self {
        match value {
            "" => Scratch::Idle,
            "searching" => Scratch::Searching,
            other => match other.strip_prefix("target:") {
                Some(id) => Scratch::Target(id.to_owned()),
                None => Scratch::Idle,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn menu_round_trips() {
        let all = [
            Menu::Start,
            Menu::ChoiceGroup,
            Menu::ChoiceName,
            Menu::MainMenu,
            Menu::SearchMenu,
            Menu::SearchGroup,
            Menu::SearchTeacher,
            Menu::SearchGroupDay,
            Menu::SearchTeacherDay,
            Menu::SearchDay,
            Menu::Settings,
            Menu::SubscribeChoiceTime,
            Menu::SubscribeChoiceDay,
        ];
        for menu in all {
            assert_eq!(Menu::parse(menu.as_str()), Some(menu));
        }
        assert_eq!(Menu::parse("NOT_A_MENU"), None);
    }

    #[test]
    fn scratch_round_trips() {
        for scratch in [
            Scratch::Idle,
            Scratch::Searching,
            Scratch::Target("110790".to_owned()),
        ] {
            assert_eq!(Scratch::decode(&scratch.encode()), scratch);
        }
        // Legacy junk degrades to Idle instead of failing.
        assert_eq!(Scratch::decode("CHANGES"), Scratch::Idle);
    }
}
