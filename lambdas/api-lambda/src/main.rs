use garden_shared::{logging, AppConfig, AppState, LogFormat};
use lambda_http::{run, service_fn, Error, Request};
use std::sync::Arc;

mod http_handler;
use http_handler::function_handler;

#[tokio::main]
async fn main() -> Result<(), Error> {
    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            logging::init(LogFormat::Json);
            tracing::error!(error = %e, "Invalid configuration");
            return Err(e.into());
        }
    };
    logging::init(config.log_format);

    let state = Arc::new(AppState::from_aws(config).await);

    run(service_fn(move |event: Request| {
        let state = state.clone();
        async move { function_handler(event, state).await }
    }))
    .await
}
