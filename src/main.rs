//! Scriptor - 小说章节分镜剧本生成服务

use std::sync::Arc;

use scriptor::config::{load_config, print_config};
use scriptor::infrastructure::adapters::{HttpLlmClient, HttpLlmClientConfig};
use scriptor::infrastructure::events::EventPublisher;
use scriptor::infrastructure::http::{serve, AppState};
use scriptor::infrastructure::memory::InMemoryRunTracker;
use scriptor::infrastructure::persistence::sqlite::{
    create_pool, run_migrations, DatabaseConfig, SqliteCreditLedger, SqliteScriptStore,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 加载配置（优先级：环境变量 > 配置文件 > 默认值）
    let config = load_config().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

    // 初始化日志
    let log_filter = format!(
        "{},scriptor={},tower_http=debug",
        config.log.level, config.log.level
    );
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_filter));
    if config.log.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    tracing::info!("Scriptor - 分镜剧本生成服务");
    print_config(&config);

    // 确保数据目录存在
    if let Some(parent) = std::path::Path::new(&config.database.path).parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    // 初始化数据库
    let db_config = DatabaseConfig::new(&config.database.path)
        .with_max_connections(config.database.max_connections);
    let pool = create_pool(&db_config).await?;
    run_migrations(&pool).await?;

    let script_store = Arc::new(SqliteScriptStore::new(pool.clone()));
    let credit_ledger = Arc::new(SqliteCreditLedger::new(pool.clone()));
    credit_ledger
        .ensure_feature(
            &config.pipeline.credit_feature_key,
            config.pipeline.credit_cost,
        )
        .await?;

    // 创建 LLM 客户端
    let llm_config = HttpLlmClientConfig {
        base_url: config.llm.base_url.clone(),
        api_key: config.llm.api_key.clone(),
        model: config.llm.model.clone(),
        timeout_secs: config.llm.timeout_secs,
        temperature: config.llm.temperature,
    };
    let llm = Arc::new(HttpLlmClient::new(llm_config)?);

    let event_publisher = Arc::new(EventPublisher::new());
    let run_tracker = Arc::new(InMemoryRunTracker::new());

    let state = AppState::new(
        llm,
        credit_ledger,
        script_store,
        run_tracker,
        event_publisher,
        config.pipeline.to_options(),
    );

    // 启动服务器（带优雅关闭）
    serve(&config.server, state, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for ctrl-c");
        }
        tracing::info!("Received shutdown signal");
    })
    .await?;

    tracing::info!("Server shutdown complete");

    Ok(())
}
