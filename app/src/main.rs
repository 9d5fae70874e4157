use xhedge_core::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    xhedge_lib::init_tracing();
    xhedge_lib::run(AppConfig::from_env()).await
}
