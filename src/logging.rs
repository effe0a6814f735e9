use directories::ProjectDirs;
use std::fs::File;
use std::sync::Arc;
use tracing_subscriber::{fmt, prelude::*, Registry};

/// Logs go to a file: the terminal belongs to the UI.
pub fn init_logging() -> anyhow::Result<()> {
    let log_dir = ProjectDirs::from("com", "neuratalk", "neuratalk")
        .map(|dirs| dirs.data_dir().join("logs"));

    if let Some(dir) = log_dir {
        std::fs::create_dir_all(&dir)?;
        let log_file = dir.join("neuratalk.log");
        let file = File::create(log_file)?;

        let file_layer = fmt::layer()
            .with_writer(Arc::new(file))
            .with_ansi(false);

        Registry::default().with(file_layer).try_init()?;
    }

    Ok(())
}
