//! Process-isolated worker: reads one request on stdin, writes its result to stdout.
use keyscout::search::run_worker_process;
use tracing_subscriber::EnvFilter;

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();

    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    if let Err(e) = run_worker_process(stdin.lock(), stdout.lock()) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
