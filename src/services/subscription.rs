use crate::bot::strings;
use crate::database::models::User;
use crate::delivery::Sink;
use crate::directory::{Directory, TargetKind};
use crate::timetable::{render_schedule, DayRange, Prefs};
use chrono::Local;
use sqlx::SqlitePool;
use std::sync::Arc;
use tokio_cron_scheduler::{Job, JobScheduler};

/// Pushes schedules to subscribed users on a tick aligned to the start
/// of every minute.
pub struct SubscriptionService {
    pool: SqlitePool,
    directory: Arc<dyn Directory>,
    sink: Arc<dyn Sink>,
    scheduler: JobScheduler,
}

impl SubscriptionService {
    pub async fn new(
        pool: SqlitePool,
        directory: Arc<dyn Directory>,
        sink: Arc<dyn Sink>,
    ) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let scheduler = JobScheduler::new().await?;

        Ok(Self {
            pool,
            directory,
            sink,
            scheduler,
        })
    }

    pub async fn start(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let pool = self.pool.clone();
        let directory = self.directory.clone();
        let sink = self.sink.clone();

        let tick_job = Job::new_async("0 * * * * *", move |_uuid, _l| {
            let pool = pool.clone();
            let directory = directory.clone();
            let sink = sink.clone();
            Box::pin(async move {
                let now = Local::now().format("%H:%M").to_string();
                if let Err(e) = broadcast_due(&pool, directory, sink, &now).await {
                    tracing::error!("subscription tick at {now} failed: {e}");
                }
            })
        })?;

        self.scheduler.add(tick_job).await?;
        self.scheduler.start().await?;

        tracing::info!("Subscription service started - broadcasting every minute at :00");
        Ok(())
    }

    pub async fn stop(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.scheduler.shutdown().await?;
        Ok(())
    }

    // Manual trigger for testing
    pub async fn broadcast_now(&self, hhmm: &str) -> Result<(), sqlx::Error> {
        broadcast_due(&self.pool, self.directory.clone(), self.sink.clone(), hhmm).await
    }
}

/// Selects users due at `hhmm` and spawns one independent push task per
/// user; a slow or failing recipient never delays the others or the
/// next tick.
pub async fn broadcast_due(
    pool: &SqlitePool,
    directory: Arc<dyn Directory>,
    sink: Arc<dyn Sink>,
    hhmm: &str,
) -> Result<(), sqlx::Error> {
    let due = User::find_due(pool, hhmm).await?;
    for user in due {
        let (Some(days), Some(target_id), Some(role)) = (
            user.subscription_days.clone(),
            user.subscription_id.clone(),
            user.role_parsed(),
        ) else {
            continue;
        };
        let Some(range) = DayRange::from_label(&days) else {
            tracing::warn!("chat {}: unknown subscription range {days:?}", user.id);
            continue;
        };
        let prefs = Prefs {
            show_groups: user.show_groups,
            show_location: user.show_location,
        };
        let directory = directory.clone();
        let sink = sink.clone();
        let chat_id = user.id;
        tokio::spawn(async move {
            if let Err(e) = broadcast_one(
                directory.as_ref(),
                sink.as_ref(),
                chat_id,
                &target_id,
                role.target_kind(),
                range,
                prefs,
            )
            .await
            {
                tracing::warn!("chat {chat_id}: subscription push failed: {e}");
            }
        });
    }
    Ok(())
}

async fn broadcast_one(
    directory: &dyn Directory,
    sink: &dyn Sink,
    chat_id: i64,
    target_id: &str,
    kind: TargetKind,
    range: DayRange,
    prefs: Prefs,
) -> anyhow::Result<()> {
    let today = Local::now().date_naive();
    let (offset, days) = range.resolve(today);
    let heading = strings::subscription_heading(range.spoken());
    let text = render_schedule(
        directory, target_id, kind, today, offset, days, prefs, &heading,
    )
    .await?;
    sink.send(chat_id, &text, None).await?;
    Ok(())
}
