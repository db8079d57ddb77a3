// src/main.rs

use wfexec::types::TaskId;
use wfexec::{cli, config, exit_status, logging, run};

/// Exit status for errors of the worker itself (as opposed to the job).
const WORKER_FAILURE: i32 = 2;

#[tokio::main]
async fn main() {
    match run_main().await {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("wfexec error: {err:?}");
            std::process::exit(WORKER_FAILURE);
        }
    }
}

async fn run_main() -> anyhow::Result<i32> {
    let args = cli::parse();
    let task: TaskId = args.task_id.parse()?;
    let cfg = config::load(&args)?;

    let paths = logging::TaskLogPaths::new(&cfg.log_dir, &task, &cfg.worker_id);
    logging::init_logging(cfg.log_level, Some(paths.trace.as_path()))?;

    let outcome = run(cfg, task).await?;
    Ok(exit_status(outcome.exit_code()))
}
