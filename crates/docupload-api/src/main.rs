use docupload_core::Config;

// Use mimalloc as the global allocator for better performance and lower fragmentation,
// especially when running on musl-based systems inside containers.
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize the application (telemetry, storage, services, routes)
    let (state, router) = docupload_api::setup::initialize_app(config.clone()).await?;

    // Start the server
    docupload_api::setup::server::start_server(&config, router, state.metrics_provider.clone())
        .await?;

    Ok(())
}
