mod app;
mod config;
mod core;
mod models;
mod utils;

#[dotenvy::load(path = "./.env", required = false)]
#[tokio::main]
async fn main() {
    let config = config::Config::init().expect("Failed to initialize configuration");
    app::common::init_logging(&config);

    match app::pipeline::run_pipeline(&config).await {
        Ok(report) if !report.failures.is_empty() => {
            tracing::warn!(
                "{} parts of the feed could not be extracted, see warnings above",
                report.failures.len()
            );
        }
        Ok(_) => {}
        Err(e) => tracing::error!("VOSE listing run failed: {e}"),
    }
}
