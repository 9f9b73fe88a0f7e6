use anyhow::Result;
use pacview::package_manager::{PackageSource, PacmanSource};
use pacview::state::{UiState, UiStateStore};
use pacview::{app, config, render};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    // 加载配置
    let config = config::Config::load_or_default()?;

    // 包管理器：配置文件指定 > 自动探测
    let source = match &config.command {
        Some(command) => PacmanSource::new(command),
        None => PacmanSource::detect().await?,
    }
    .explicit_only(config.explicit_only)
    .dedup_by_name(config.dedup_by_name)
    .with_timeout(config.timeout());
    let source: Arc<dyn PackageSource> = Arc::new(source);

    let mut store = UiStateStore::new(UiState {
        is_dark_mode: config.dark_mode,
        ..UiState::default()
    });

    // 输出内容变化时才重新打印
    let mut last_frame = String::new();
    store.subscribe(move |state| {
        let frame = render::render_text(state);
        if frame != last_frame {
            println!("{}\n", frame);
            last_frame = frame;
        }
    });

    app::run(&config, source, &mut store).await?;

    Ok(())
}
