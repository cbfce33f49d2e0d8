use tone_toner::config::AppConfig;
use tone_toner::{logging, orchestrator};

fn main() {
    if let Err(err) = run() {
        eprintln!("fatal: {err:#}");
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let config = AppConfig::load()?;
    let _log_guard = logging::init_logging(&config.logging)?;
    orchestrator::run(&config)
}
