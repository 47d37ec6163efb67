use endgame_api::{config::ApiConfig, startup::Application};
use endgame_config::{Environment, load_config};
use endgame_telemetry::init_tracing;
use std::sync::Arc;
use tracing::info;

fn main() -> anyhow::Result<()> {
    let config = load_config::<ApiConfig>()?;
    config.validate()?;

    let _log_flusher = init_tracing(env!("CARGO_BIN_NAME"))?;

    // Sentry has to be initialized before the async runtime starts.
    let _sentry_guard = init_sentry(&config)?;

    actix_web::rt::System::new().block_on(async_main(config))?;

    Ok(())
}

async fn async_main(config: ApiConfig) -> anyhow::Result<()> {
    info!("application settings:\n{}", config.application);

    let application = Application::build(config).await?;
    application.run_until_stopped().await?;

    Ok(())
}

fn init_sentry(config: &ApiConfig) -> anyhow::Result<Option<sentry::ClientInitGuard>> {
    let Some(sentry_config) = &config.sentry else {
        info!("sentry not configured, skipping initialization");
        return Ok(None);
    };

    info!("initializing sentry with supplied dsn");

    let environment = Environment::load()?;
    let guard = sentry::init(sentry::ClientOptions {
        dsn: Some(sentry_config.dsn.parse()?),
        environment: Some(environment.to_string().into()),
        integrations: vec![Arc::new(
            sentry::integrations::panic::PanicIntegration::new(),
        )],
        ..Default::default()
    });

    sentry::configure_scope(|scope| {
        scope.set_tag("service", "endgame");
    });

    Ok(Some(guard))
}
