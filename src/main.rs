//! swapgate 主入口

use std::sync::Arc;

use anyhow::Result;
use swapgate::{api, app_state::AppState, config::Config, infrastructure::logging};

#[tokio::main]
async fn main() -> Result<()> {
    // 1. 环境变量
    dotenvy::dotenv().ok();

    // 2. 配置：CONFIG_PATH 指向的 TOML 文件优先，否则只读环境变量
    let config_path = std::env::var("CONFIG_PATH").ok();
    let config = Config::from_env_and_file(config_path.as_deref())?;
    config.validate()?;

    // 3. 日志
    logging::init_logging(&config.logging)?;
    tracing::info!(
        chain_id = config.chain.chain_id,
        engine_url = %config.engine.url,
        rfqt_keys = config.access.rfqt_api_key_whitelist.len(),
        "starting swapgate"
    );

    // 4. 应用状态与路由
    let config = Arc::new(config);
    let state = Arc::new(AppState::from_config(config.clone())?);
    let app = api::routes(state);

    // 5. 监听
    let bind_addr = config.server.bind_addr.clone();
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("server listening on http://{}", bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
