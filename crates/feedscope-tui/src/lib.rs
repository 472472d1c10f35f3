//! Live terminal charts over a serial telemetry stream.
//!
//! `feedscope-rate` plots the firmware's `rate,...` lines (raw rate and the two EMAs);
//! `feedscope-gap` plots `gap,...` lines (EMA gap with its ±1.3 sigma bands).

mod render;

use std::io::{self, IsTerminal};

use anyhow::{Context, Result};
use clap::Parser;
use env_logger::Env;
use feedscope_lib::{
    io::open_serial,
    plot::LogRenderer,
    stop::{install_interrupt_handler, stop_channel},
    ExitReason, IngestLoop, PipelineConfig, RenderScheduler, Variant,
};
use log::info;

pub use render::TerminalRenderer;

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Plot feeder telemetry from a serial device",
    long_about = "Plot feeder telemetry from a serial device.\n\n\
                  Settings beyond the device come from the TOML file named by FEEDSCOPE_CONFIG."
)]
pub struct Cli {
    /// Serial device to read (e.g. /dev/ttyACM0 or COM5)
    pub device: Option<String>,
}

/// Run one pipeline instance until interrupted or the device stream ends.
pub fn run(variant: Variant, cli: Cli) -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("warn")).init();
    let config = PipelineConfig::from_env()?.with_device(cli.device);
    config.validate()?;

    let (stop_handle, stop) = stop_channel();
    install_interrupt_handler(stop_handle.clone()).context("installing Ctrl+C handler")?;

    let source = open_serial(
        &config.device_address,
        config.baud_rate,
        config.read_timeout(),
    )?;
    let mut ingest = IngestLoop::new(source, variant, config.window_capacity);

    let reason = if io::stdout().is_terminal() {
        let renderer =
            TerminalRenderer::new(&config.device_address, config.stop_breaches, stop_handle)?;
        let mut scheduler = RenderScheduler::new(renderer, &config);
        ingest.run(&mut scheduler, &stop)?
    } else {
        info!("stdout is not a terminal, logging draws instead");
        let mut scheduler = RenderScheduler::new(LogRenderer::new(config.stop_breaches), &config);
        ingest.run(&mut scheduler, &stop)?
    };

    let stats = ingest.stats();
    match reason {
        ExitReason::Stopped => println!("\nStopping."),
        ExitReason::EndOfStream => println!("{} closed the stream.", config.device_address),
    }
    println!(
        "{} {} samples from {} lines ({} skipped)",
        stats.appended, variant, stats.lines, stats.skipped
    );
    Ok(())
}
