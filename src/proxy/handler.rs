//! Lambda entrypoint for the event proxy.

use lambda_runtime::{Error, LambdaEvent};
use serde_json::Value;
use tracing::{error, info};

use super::{ProxyContext, ProxyOutcome, handle};

pub use self::function_handler as handler;

/// Lambda handler for Slack Events API deliveries.
///
/// # Errors
///
/// Returns an error if the answer could not be produced or posted.
/// Malformed deliveries are answered with a value instead.
#[tracing::instrument(level = "info", skip(ctx, event), fields(request_id = %event.context.request_id))]
pub async fn function_handler(
    ctx: &ProxyContext<'_>,
    event: LambdaEvent<Value>,
) -> Result<ProxyOutcome, Error> {
    info!("Proxy Lambda received request: {}", event.payload);

    handle(&event.payload, ctx).await.map_err(|e| {
        error!("Failed to relay event: {}", e);
        Error::from(e)
    })
}
