//! Lambda entrypoint for the history aggregator.

use lambda_runtime::{Error, LambdaEvent};
use tracing::info;

use super::{TimeWindow, aggregate};
use crate::core::models::{HistoryRequest, Transcript};
use crate::slack::ChatPlatform;

pub use self::function_handler as handler;

/// Lambda handler for `{channel_id, hours_before}` requests.
///
/// `platform` is built once per process and shared across invocations.
///
/// # Errors
///
/// Never fails on Slack errors; those degrade to a partial transcript. The
/// `Result` is the Lambda runtime's handler contract.
#[tracing::instrument(level = "info", skip(platform, event), fields(request_id = %event.context.request_id))]
pub async fn function_handler(
    platform: &dyn ChatPlatform,
    event: LambdaEvent<HistoryRequest>,
) -> Result<Transcript, Error> {
    let request = event.payload;
    info!(
        channel_id = %request.channel_id,
        hours_before = request.hours_before,
        "History Lambda received request"
    );

    let window = TimeWindow::ending_now(request.hours_before);
    info!(
        oldest = window.oldest,
        latest = window.latest,
        "Computed history window"
    );

    let transcript = aggregate(platform, &request.channel_id, window).await;

    info!(
        threads = transcript.threads.len(),
        earliest = ?transcript.earliest,
        latest = ?transcript.latest,
        "Transcript assembled"
    );
    Ok(transcript)
}
