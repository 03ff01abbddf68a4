//! Command Line Interface

use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "fanctld")]
#[command(version)]
#[command(about = "fanctld - temperature-driven fan control daemon")]
#[command(long_about = "fanctld - temperature-driven fan control daemon

Drives one fan from one temperature sensor, either by switching a digital
pin with hysteresis or by setting a PWM duty cycle from a stepped table.

EXAMPLES:
    fanctld --config /etc/fanctl/case.json
    fanctld --config case.json --devices ./devices --once

SIGNALS:
    SIGHUP             Reload the configuration file
    SIGINT, SIGTERM    Stop the control loop and exit

ENVIRONMENT VARIABLES:
    FANCTL_LOG=debug   Log filter (default: info)")]
pub struct Cli {
    /// Controller settings (JSON)
    #[arg(short, long, value_name = "FILE")]
    pub config: PathBuf,

    /// Root of the sensors/ and boards/ device tree
    #[arg(short, long, value_name = "DIR", default_value = "/run/fanctl")]
    pub devices: PathBuf,

    /// Name used for this fan in log output
    #[arg(short, long, default_value = "fan")]
    pub name: String,

    /// Print one status as JSON and exit
    #[arg(long)]
    pub once: bool,
}
