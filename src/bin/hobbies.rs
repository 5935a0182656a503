use lambda_cors_proxy::handler::function_handler;
use lambda_cors_proxy::http::HTTP_CLIENT;
use lambda_cors_proxy::services::webflow;
use lambda_runtime::{Error, LambdaEvent, service_fn};
use serde_json::Value;

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Use Lambda runtime's built-in tracing subscriber for CloudWatch Logs
    lambda_runtime::tracing::init_default_subscriber();

    let config = webflow::config_from_env();
    let config = &config;

    lambda_runtime::run(service_fn(move |event: LambdaEvent<Value>| async move {
        function_handler(event, config, &*HTTP_CLIENT).await
    }))
    .await
}
