use recruitment_pipeline::{
    config::{get_config, init_config, LogFormat},
    database::pool::{create_pool, run_migrations},
    AppState,
};
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = init_config() {
        init_tracing(LogFormat::Pretty);
        tracing::error!(error = %e, "Failed to load configuration");
        return Err(e.into());
    }
    let config = get_config();
    init_tracing(config.log_format);

    let pool = create_pool(config).await?;
    run_migrations(&pool).await?;

    let app_state = AppState::from_pool(pool, config)?;

    let lead = chrono::Duration::minutes(config.reminder_lead_minutes);
    let interval = Duration::from_secs(config.reminder_interval_secs.max(1));
    info!(
        lead_minutes = config.reminder_lead_minutes,
        interval_secs = interval.as_secs(),
        "Pipeline worker started"
    );

    let reminders = {
        let state = app_state.clone();
        tokio::spawn(async move {
            loop {
                if let Err(e) = state.interview_service.send_due_reminders(lead).await {
                    tracing::error!(error = %e, "Reminder sweep failed");
                }
                tokio::time::sleep(interval).await;
            }
        })
    };

    tokio::signal::ctrl_c().await?;
    info!("Shutdown requested, draining notifications");
    reminders.abort();
    app_state.notification_service.drain().await;
    info!("Pipeline worker stopped");

    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match format {
        LogFormat::Json => tracing_subscriber::fmt().with_env_filter(filter).json().init(),
        LogFormat::Pretty => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }
}
