//! User-facing message texts, collected in one place.

pub const WELCOME: &str =
    "Hi!\n\nTo look up a schedule, first tell me who you are";
pub const SUBSCRIPTION_RESET: &str = "Your subscription has been reset";
pub const GROUP_EXAMPLE: &str =
    "Type the name of your group\n\nFor example: «ПИ18-1»";
pub const TEACHER_EXAMPLE: &str =
    "Type your full name\n\nFor example: «Коротеев Михаил Викторович»";
pub const CHOOSE_MENU: &str = "Pick a menu option";
pub const MOVED_TO_MAIN_MENU: &str = "Back to the main menu";
pub const CHOOSE_ROLE_FIRST: &str =
    "Pick who you are before requesting a schedule";
pub const GROUP_CHANGED_FOR: &str = "Your group is now «{}»";
pub const TEACHER_BOUND: &str = "Signed in as «{}»";
pub const GROUP_FOUND: &str = "Found group «{}»";
pub const TEACHER_FOUND: &str = "Found teacher «{}»";
pub const GROUP_NOT_FOUND: &str =
    "Could not find group «{}». Type the group name again";
pub const TEACHER_NOT_FOUND: &str =
    "Could not find «{}». Type the full name again";
pub const CHOOSE_GROUP: &str = "Several groups match, pick one";
pub const CHOOSE_TEACHER: &str = "Several teachers match, pick one";
pub const CANT_GET_SCHEDULE: &str = "Could not retrieve the schedule";
pub const WHAT_TO_FIND: &str = "What should I look up?";
pub const WHAT_TO_SET: &str = "What should I configure?";
pub const WRITE_GROUP: &str =
    "Type the group to look up\n\nFor example: «ПИ18-1»";
pub const WRITE_TEACHER: &str =
    "Type the teacher to look up\n\nFor example: «Коротеев Михаил Викторович»";
pub const WRITE_DATE: &str =
    "Type a date to see its schedule\n\nFor example: «01.10.2019» or «01.10»";
pub const INVALID_DATE: &str = "That is not a valid date";
pub const CHOOSE_DAY_RANGE: &str = "Pick the period to show";
pub const SUBSCRIBE_CHOICE_TIME: &str =
    "Type the time you want the schedule delivered at\n\nFor example: «12:35»";
pub const SUBSCRIBE_INVALID_TIME: &str =
    "Could not set up the subscription\nInvalid time format";
pub const SUBSCRIBE_CHOICE_DAY: &str =
    "Pick the period you want delivered";
pub const SUBSCRIBE_INVALID_DAY: &str =
    "Could not set up the subscription\nInvalid period";
pub const UNSUBSCRIBED: &str = "Schedule subscription cancelled";
pub const DISPLAY_SETTINGS: &str =
    "Choose which lines to show in the schedule";
pub const CANCELLED: &str = "Cancelled";

/// `GROUP_CHANGED_FOR`-style templates keep a literal `{}` placeholder.
pub fn fill(template: &str, value: &str) -> String {
    template.replacen("{}", value, 1)
}

/// Headline prepended to subscription pushes.
pub fn subscription_heading(spoken_range: &str) -> String {
    format!("Your schedule for {spoken_range}\n\n")
}

pub fn subscription_confirmed(time: &str, spoken_range: &str) -> String {
    format!(
        "Subscription set up\n\nEvery day at {time} you will receive the schedule for {spoken_range}"
    )
}
