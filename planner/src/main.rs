// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use std::sync::Arc;

use chrono::Local;
use planner::config::Settings;
use planner::database::{self, SqliteRemote};
use planner::planner::Planner;
use planner::remote::{Offline, RemoteSync};
use planner::routes;
use tokio::time::{self, Duration};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    tracing::info!("Starting up the planner...");

    let settings = Settings::load()?;

    // Without a database the page still works, showing an empty schedule.
    let remote: Arc<dyn RemoteSync> =
        match database::establish_connection_pool(&settings.database_url).await {
            Ok(pool) => {
                tracing::info!("Database connection was made successfully.");
                Arc::new(SqliteRemote::new(pool))
            }
            Err(e) => {
                tracing::error!("Failed to connect with the database: {:?}", e);
                Arc::new(Offline)
            }
        };

    let planner = Arc::new(Planner::new(remote, Local::now().date_naive()));
    planner.load().await;

    let ticker = planner.clone();
    let tick_every = Duration::from_secs(settings.tick_interval_secs.max(1));
    tokio::spawn(async move {
        let mut interval = time::interval(tick_every);
        loop {
            interval.tick().await;
            match ticker.tick(Local::now().naive_local()) {
                Some(now) => tracing::debug!(
                    "Now line at {} {}:00 +{}%",
                    now.date,
                    now.hour,
                    now.offset_percent
                ),
                None => tracing::debug!("Now line hidden"),
            }
        }
    });

    let app = routes::create_router(planner);

    let listener = tokio::net::TcpListener::bind(&settings.bind_address).await?;
    tracing::info!("The planner listens on http://{}", settings.bind_address);
    axum::serve(listener, app).await?;
    Ok(())
}
