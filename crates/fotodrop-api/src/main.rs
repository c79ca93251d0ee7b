use fotodrop_core::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    fotodrop_api::telemetry::init_tracing();

    let config = Config::from_env()?;
    let (state, router) = fotodrop_api::setup::initialize_app(config).await?;
    fotodrop_api::setup::serve(state, router).await
}
