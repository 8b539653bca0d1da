use clap::Parser;
use headway::app::HeadwayOperation;

#[derive(Parser)]
#[command(
    name = "headway",
    about = "transit schedule store tooling and traversal-time queries"
)]
struct CliArgs {
    #[command(subcommand)]
    operation: HeadwayOperation,
}

fn main() {
    env_logger::init();

    log::debug!("cwd: {:?}", std::env::current_dir());
    let args = CliArgs::parse();
    args.operation.run();
}
