// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use probewatch::application::use_cases::probe_cycle::ProbeCycleRunner;
use probewatch::application::use_cases::publish_batch::BatchPublication;
use probewatch::config::settings::Settings;
use probewatch::domain::repositories::target_repository::TargetRepository;
use probewatch::domain::services::publisher::BatchPublisher;
use probewatch::engines::probe_engine::HttpProbeEngineFactory;
use probewatch::infrastructure::database::connection;
use probewatch::infrastructure::observability::metrics::init_metrics;
use probewatch::infrastructure::repositories::target_repo_impl::TargetRepoImpl;
use probewatch::infrastructure::services::telegram_notifier::notifier_from_settings;
use probewatch::infrastructure::stream::redis_stream::RedisStreamPublisher;
use probewatch::presentation::routes;
use probewatch::queue::scheduler::DispatchScheduler;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{info, warn};

use probewatch::utils::telemetry;

/// 主函数
///
/// 应用程序入口点，负责初始化所有组件并启动服务
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Load configuration
    let settings = Arc::new(Settings::new()?);

    // 2. Initialize logging and metrics
    telemetry::init_telemetry(settings.telemetry.json);
    info!("Starting probewatch {}...", env!("CARGO_PKG_VERSION"));
    init_metrics(&settings.metrics);

    // 3. Alerting and result stream
    let notifier = notifier_from_settings(&settings.notifier);
    let publisher: Arc<dyn BatchPublisher> = Arc::new(RedisStreamPublisher::new(
        &settings.redis.url,
        settings.stream.topic.clone(),
        settings.stream.max_len,
    )?);
    if let Err(e) = publisher.ping().await {
        warn!("Result stream not reachable at startup: {}", e);
    }

    let publication = BatchPublication::new(
        publisher,
        notifier.clone(),
        Duration::from_secs(settings.stream.send_timeout_secs),
    );
    let runner = Arc::new(ProbeCycleRunner::new(
        Arc::new(HttpProbeEngineFactory),
        notifier,
        publication,
    ));

    // 4. Target store and periodic dispatch
    let scheduler = match settings.database.url.as_deref() {
        Some(url) => {
            let db = Arc::new(connection::create_pool(url, &settings.database).await?);
            info!("Database connection established");

            let repository: Arc<dyn TargetRepository> = Arc::new(TargetRepoImpl::new(db));
            let scheduler = Arc::new(DispatchScheduler::new(
                repository,
                runner.clone(),
                settings.dispatch.clone(),
                settings.probe.transport(settings.dispatch.timeout_secs),
            ));
            if settings.dispatch.enabled {
                scheduler.clone().start();
            } else {
                info!("Periodic dispatch disabled");
            }
            Some(scheduler)
        }
        None => {
            warn!("No database configured, periodic dispatch unavailable");
            None
        }
    };

    // 5. Start HTTP server
    let app = routes::app(runner, settings.clone(), scheduler);

    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
