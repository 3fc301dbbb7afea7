use lambda_runtime::{Error, run, service_fn};
use slack_relay::answer::AnswerClient;
use slack_relay::core::config::{AnswerApiConfig, SlackConfig};
use slack_relay::proxy::{ProxyContext, handler};
use slack_relay::slack::SlackClient;
use tracing::error;

#[tokio::main]
async fn main() -> Result<(), Error> {
    slack_relay::setup_logging();

    let slack_config = SlackConfig::from_env().map_err(|e| {
        error!("Config error: {}", e);
        Error::from(e)
    })?;
    let answer_config = AnswerApiConfig::from_env().map_err(|e| {
        error!("Config error: {}", e);
        Error::from(e)
    })?;

    let slack = SlackClient::from_config(&slack_config);
    let answers = AnswerClient::from_config(&answer_config);
    let ctx = ProxyContext {
        platform: &slack,
        answers: &answers,
        signing_secret: slack_config.slack_signing_secret.as_deref(),
    };
    let ctx = &ctx;

    run(service_fn(move |event| async move { handler(ctx, event).await })).await
}
