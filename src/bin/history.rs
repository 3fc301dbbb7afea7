use lambda_runtime::{Error, run, service_fn};
use slack_relay::core::config::SlackConfig;
use slack_relay::history::handler;
use slack_relay::slack::SlackClient;
use tracing::error;

#[tokio::main]
async fn main() -> Result<(), Error> {
    slack_relay::setup_logging();

    let config = SlackConfig::from_env().map_err(|e| {
        error!("Config error: {}", e);
        Error::from(e)
    })?;
    let slack = SlackClient::from_config(&config);
    let slack = &slack;

    run(service_fn(move |event| async move { handler(slack, event).await })).await
}
