//! regsctl - voltage regulator configuration tool
//!
//! Validates regulator configuration files, prints their contents and runs
//! them against simulated hardware.

mod sim;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use common::logging::{self, LogConfig};
use common::EngineSettings;
use serde::Serialize;
use tracing::{debug, info};
use voltage_regulators::exception_utils::get_messages;
use voltage_regulators::{Device, Fault, FaultKind, System};

use crate::sim::{HardwareFile, SimServices};

#[derive(Parser)]
#[command(name = "regsctl")]
#[command(about = "Voltage regulator configuration tool")]
#[command(long_about = "Voltage regulator configuration tool

Commands:
  validate    Check a configuration file
  show        Print the rules, chassis, devices and rails of a configuration file
  simulate    Configure and monitor the system against simulated hardware

Examples:
  regsctl validate regulators.json
  regsctl show regulators.json --json
  regsctl simulate regulators.json --registers hardware.json")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Settings file (TOML, YAML or JSON)
    #[arg(short, long, global = true, env = "REGULATORS_SETTINGS")]
    settings: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Check a configuration file
    Validate {
        /// Configuration file (default: from settings)
        file: Option<PathBuf>,
    },

    /// Print the contents of a configuration file
    Show {
        /// Configuration file (default: from settings)
        file: Option<PathBuf>,

        /// Print JSON instead of a tree
        #[arg(long)]
        json: bool,
    },

    /// Run configuration, sensor monitoring and phase fault detection
    Simulate {
        /// Configuration file (default: from settings)
        file: Option<PathBuf>,

        /// Hardware file with register contents, VPD and presence
        #[arg(short, long)]
        registers: Option<PathBuf>,

        /// Number of monitoring cycles
        #[arg(long, default_value_t = 2)]
        cycles: u32,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.no_color {
        colored::control::set_override(false);
    }

    let settings = EngineSettings::load(cli.settings.as_deref())?;

    let level = if cli.verbose {
        "debug".to_string()
    } else {
        settings.log_level.clone()
    };
    logging::init_with_config(LogConfig {
        service_name: "regsctl".to_string(),
        level,
        log_dir: settings.log_dir.clone(),
        enable_json: settings.log_json,
        ansi: !cli.no_color,
    })?;
    debug!("Settings: {:?}", settings);

    match cli.command {
        Commands::Validate { file } => {
            let path = file.unwrap_or_else(|| settings.config_file.clone());
            validate(&path)
        },
        Commands::Show { file, json } => {
            let path = file.unwrap_or_else(|| settings.config_file.clone());
            let system = load(&path, &settings)?;
            show(&system, json)
        },
        Commands::Simulate {
            file,
            registers,
            cycles,
            json,
        } => {
            let path = file.unwrap_or_else(|| settings.config_file.clone());
            let system = load(&path, &settings)?;
            let hardware = match registers {
                Some(registers) => HardwareFile::load(&registers)?,
                None => HardwareFile::default(),
            };
            simulate(&system, &hardware, cycles, json)
        },
    }
}

fn load(path: &Path, settings: &EngineSettings) -> Result<System> {
    let system = System::from_file(path)
        .with_context(|| format!("Unable to load configuration file {}", path.display()))?;
    Ok(system.with_max_rule_depth(settings.max_rule_depth))
}

// ============================================================================
// validate
// ============================================================================

fn validate(path: &Path) -> Result<()> {
    print!("{} Validating {}... ", "-".bright_cyan(), path.display());
    match System::from_file(path) {
        Ok(system) => {
            println!("{}", "OK".green());
            let devices: usize = system.chassis().iter().map(|c| c.devices().len()).sum();
            println!(
                "  {} rule(s), {} chassis, {} device(s)",
                system.rules().len(),
                system.chassis().len(),
                devices
            );
            Ok(())
        },
        Err(e) => {
            println!("{}", "FAIL".red());
            for message in get_messages(&e) {
                eprintln!("  {} {}", "ERROR".red(), message);
            }
            std::process::exit(1);
        },
    }
}

// ============================================================================
// show
// ============================================================================

#[derive(Serialize)]
struct ConfigSummary<'a> {
    rules: Vec<RuleSummary<'a>>,
    chassis: Vec<ChassisSummary<'a>>,
}

#[derive(Serialize)]
struct RuleSummary<'a> {
    id: &'a str,
    actions: Vec<String>,
}

#[derive(Serialize)]
struct ChassisSummary<'a> {
    number: u32,
    devices: Vec<DeviceSummary<'a>>,
}

#[derive(Serialize)]
struct DeviceSummary<'a> {
    id: &'a str,
    is_regulator: bool,
    fru: &'a str,
    bus: u8,
    address: String,
    presence_detection: bool,
    configuration: bool,
    phase_fault_detection: bool,
    rails: Vec<RailSummary<'a>>,
}

#[derive(Serialize)]
struct RailSummary<'a> {
    id: &'a str,
    volts: Option<f64>,
    configuration: bool,
    sensor_monitoring: bool,
}

impl<'a> ConfigSummary<'a> {
    fn new(system: &'a System) -> Self {
        Self {
            rules: system
                .rules()
                .iter()
                .map(|rule| RuleSummary {
                    id: rule.id(),
                    actions: rule.actions().iter().map(ToString::to_string).collect(),
                })
                .collect(),
            chassis: system
                .chassis()
                .iter()
                .map(|chassis| ChassisSummary {
                    number: chassis.number(),
                    devices: chassis.devices().iter().map(DeviceSummary::new).collect(),
                })
                .collect(),
        }
    }
}

impl<'a> DeviceSummary<'a> {
    fn new(device: &'a Device) -> Self {
        Self {
            id: device.id(),
            is_regulator: device.is_regulator(),
            fru: device.fru(),
            bus: device.i2c_interface().bus,
            address: format!("0x{:02X}", device.i2c_interface().address),
            presence_detection: device.presence_detection().is_some(),
            configuration: device.configuration().is_some(),
            phase_fault_detection: device.phase_fault_detection().is_some(),
            rails: device
                .rails()
                .iter()
                .map(|rail| RailSummary {
                    id: rail.id(),
                    volts: rail.configuration().and_then(|c| c.volts()),
                    configuration: rail.configuration().is_some(),
                    sensor_monitoring: rail.sensor_monitoring().is_some(),
                })
                .collect(),
        }
    }
}

fn show(system: &System, json: bool) -> Result<()> {
    let summary = ConfigSummary::new(system);
    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("{}", "Rules".bright_cyan());
    for rule in &summary.rules {
        println!("  {} ({} action(s))", rule.id.bright_yellow(), rule.actions.len());
        for action in &rule.actions {
            println!("    - {}", action);
        }
    }

    println!("{}", "Chassis".bright_cyan());
    for chassis in &summary.chassis {
        println!("  {} {}", "chassis".bright_blue(), chassis.number);
        for device in &chassis.devices {
            let kind = if device.is_regulator { "regulator" } else { "device" };
            println!(
                "    {} {} (bus {}, address {}) {}",
                kind,
                device.id.bright_yellow(),
                device.bus,
                device.address,
                device.fru.dimmed()
            );
            for rail in &device.rails {
                match rail.volts {
                    Some(volts) => println!("      rail {} @ {} V", rail.id.green(), volts),
                    None => println!("      rail {}", rail.id.green()),
                }
            }
        }
    }
    Ok(())
}

// ============================================================================
// simulate
// ============================================================================

#[derive(Serialize)]
struct SimulationReport {
    faults: Vec<Fault>,
    sensors: Vec<SensorValue>,
    registers_written: usize,
}

#[derive(Serialize)]
struct SensorValue {
    rail: String,
    #[serde(rename = "type")]
    sensor_type: String,
    value: f64,
}

fn simulate(system: &System, hardware: &HardwareFile, cycles: u32, json: bool) -> Result<()> {
    let services = SimServices::new(hardware)?;

    info!("Configuring regulators");
    let mut faults = system.configure(&services);
    for cycle in 1..=cycles {
        debug!("Monitoring cycle {}", cycle);
        faults.extend(system.monitor_sensors(&services));
        faults.extend(system.detect_phase_faults(&services));
    }

    let report = SimulationReport {
        faults,
        sensors: services
            .sensors
            .readings()
            .into_iter()
            .map(|reading| SensorValue {
                rail: reading.rail_id,
                sensor_type: reading.sensor_type.to_string(),
                value: reading.value,
            })
            .collect(),
        registers_written: services.i2c.writes().len(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!(
        "{} {} register write(s)",
        "*".bright_blue(),
        report.registers_written
    );
    for sensor in &report.sensors {
        println!(
            "  {} {} = {}",
            sensor.rail.green(),
            sensor.sensor_type,
            sensor.value
        );
    }
    if report.faults.is_empty() {
        println!("{} No faults", "OK".green());
    }
    for fault in &report.faults {
        let label = match fault.kind {
            FaultKind::Error { .. } => "ERROR".red(),
            FaultKind::PhaseFault { .. } => "PHASE".yellow(),
        };
        println!("{} {}", label, fault);
    }
    Ok(())
}
