use clap::Parser;
use research_panel::cli::Args;
use research_panel::launch;
use research_panel::telemetry::init_logging;

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_logging(args.verbose);
    let request = args.run_request();

    let result = match args.into_config() {
        Ok(config) => launch(&config, &request).await,
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        eprintln!("❌ 运行失败: {}", e);
        for cause in e.chain().skip(1) {
            eprintln!("   原因: {}", cause);
        }
        std::process::exit(1);
    }
}
