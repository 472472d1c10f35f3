use clap::Parser;
use feedscope_lib::Variant;
use feedscope_tui::{run, Cli};

fn main() -> anyhow::Result<()> {
    run(Variant::Gap, Cli::parse())
}
