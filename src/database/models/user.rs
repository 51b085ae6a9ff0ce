use crate::bot::menu::{Menu, Scratch};
use crate::directory::TargetKind;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Who the bound target belongs to: students follow a group, teachers
/// follow their own lecturer entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    Student,
    Teacher,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Teacher => "teacher",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "student" => Some(Role::Student),
            "teacher" => Some(Role::Teacher),
            _ => None,
        }
    }

    pub fn target_kind(&self) -> TargetKind {
        match self {
            Role::Student => TargetKind::Group,
            Role::Teacher => TargetKind::Lecturer,
        }
    }
}

/// One row per chat participant. Created lazily on first contact and
/// never hard-deleted; a restart resets the row to defaults.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub login: Option<String>,
    pub role: Option<String>,
    pub menu: String,
    pub search_id: Option<String>,
    pub search_display: Option<String>,
    pub search_additional: String,
    pub subscription_time: Option<String>,
    pub subscription_days: Option<String>,
    pub subscription_id: Option<String>,
    pub show_groups: bool,
    pub show_location: bool,
}

const ALL_COLUMNS: &str = "id, login, role, menu, search_id, search_display, \
     search_additional, subscription_time, subscription_days, subscription_id, \
     show_groups, show_location";

impl User {
    pub fn menu_state(&self) -> Menu {
        Menu::parse(&self.menu).unwrap_or(Menu::Start)
    }

    pub fn role_parsed(&self) -> Option<Role> {
        self.role.as_deref().and_then(Role::parse)
    }

    pub fn scratch(&self) -> Scratch {
        Scratch::decode(&self.search_additional)
    }

    /// Updates from one new chat can arrive on parallel handler tasks,
    /// so the insert must tolerate losing the race.
    pub async fn get_or_create(pool: &sqlx::SqlitePool, id: i64) -> Result<Self, sqlx::Error> {
        sqlx::query("INSERT OR IGNORE INTO users (id) VALUES (?)")
            .bind(id)
            .execute(pool)
            .await?;
        Self::find_by_id(pool, id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    pub async fn find_by_id(
        pool: &sqlx::SqlitePool,
        id: i64,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!("SELECT {ALL_COLUMNS} FROM users WHERE id = ?"))
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Explicit restart: back to role selection with every preference
    /// cleared, keeping only the row itself and the fresh login.
    pub async fn reset(
        pool: &sqlx::SqlitePool,
        id: i64,
        login: Option<&str>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE users SET login = ?, role = NULL, menu = 'START', search_id = NULL, \
             search_display = NULL, search_additional = '', subscription_time = NULL, \
             subscription_days = NULL, subscription_id = NULL, show_groups = FALSE, \
             show_location = FALSE WHERE id = ?",
        )
        .bind(login)
        .bind(id)
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn set_menu(
        pool: &sqlx::SqlitePool,
        id: i64,
        menu: Menu,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE users SET menu = ? WHERE id = ?")
            .bind(menu.as_str())
            .bind(id)
            .execute(pool)
            .await?;
        Ok(())
    }

    pub async fn set_role(
        pool: &sqlx::SqlitePool,
        id: i64,
        role: Role,
        menu: Menu,
        show_groups: bool,
        show_location: bool,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE users SET role = ?, menu = ?, show_groups = ?, show_location = ? \
             WHERE id = ?",
        )
        .bind(role.as_str())
        .bind(menu.as_str())
        .bind(show_groups)
        .bind(show_location)
        .bind(id)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Binds the resolved search target as the user's own schedule.
    pub async fn bind_target(
        pool: &sqlx::SqlitePool,
        id: i64,
        search_id: &str,
        search_display: &str,
        menu: Menu,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE users SET search_id = ?, search_display = ?, menu = ?, \
             search_additional = '' WHERE id = ?",
        )
        .bind(search_id)
        .bind(search_display)
        .bind(menu.as_str())
        .bind(id)
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn set_scratch(
        pool: &sqlx::SqlitePool,
        id: i64,
        scratch: Scratch,
        menu: Menu,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE users SET search_additional = ?, menu = ? WHERE id = ?")
            .bind(scratch.encode())
            .bind(menu.as_str())
            .bind(id)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Opens the subscription flow: freezes the current target and
    /// clears any previous time/days pick.
    pub async fn begin_subscription(
        pool: &sqlx::SqlitePool,
        id: i64,
        subscription_id: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE users SET menu = 'SUBSCRIBE_CHOICE_TIME', subscription_id = ?, \
             subscription_time = NULL, subscription_days = NULL WHERE id = ?",
        )
        .bind(subscription_id)
        .bind(id)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Records the push time-of-day.
    pub async fn set_subscription_time(
        pool: &sqlx::SqlitePool,
        id: i64,
        subscription_id: &str,
        time: &str,
        menu: Menu,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE users SET subscription_id = ?, subscription_time = ?, menu = ? \
             WHERE id = ?",
        )
        .bind(subscription_id)
        .bind(time)
        .bind(menu.as_str())
        .bind(id)
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn set_subscription_days(
        pool: &sqlx::SqlitePool,
        id: i64,
        days: &str,
        menu: Menu,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE users SET subscription_days = ?, menu = ? WHERE id = ?")
            .bind(days)
            .bind(menu.as_str())
            .bind(id)
            .execute(pool)
            .await?;
        Ok(())
    }

    pub async fn clear_subscription(
        pool: &sqlx::SqlitePool,
        id: i64,
        menu: Menu,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE users SET subscription_id = NULL, subscription_time = NULL, \
             subscription_days = NULL, menu = ? WHERE id = ?",
        )
        .bind(menu.as_str())
        .bind(id)
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn set_display_prefs(
        pool: &sqlx::SqlitePool,
        id: i64,
        show_groups: bool,
        show_location: bool,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE users SET show_groups = ?, show_location = ? WHERE id = ?")
            .bind(show_groups)
            .bind(show_location)
            .bind(id)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// All users whose broadcast is due at the given local `HH:MM`.
    pub async fn find_due(
        pool: &sqlx::SqlitePool,
        time: &str,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {ALL_COLUMNS} FROM users WHERE subscription_time = ?"
        ))
        .bind(time)
        .fetch_all(pool)
        .await
    }

    pub async fn count(pool: &sqlx::SqlitePool) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(pool)
            .await?;
        Ok(count)
    }
}
