//! qhs-util - report the Qualcomm vendor features of a local controller

mod cli;
mod report;

use anyhow::{Context, Result};
use clap::Parser;
use log::{error, info};
use qhs::{HciError, HciSession};
use std::process::ExitCode;

use cli::Cli;
use report::{feature_lines, version_summary, Style};

fn main() -> ExitCode {
    let cli = Cli::parse();

    setup_logging(&cli);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Reading features of hci{} failed: {:#}", cli.device, e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Log level from `-v`, unless RUST_LOG says otherwise
fn setup_logging(cli: &Cli) {
    env_logger::Builder::new()
        .filter_level(cli.log_level())
        .parse_default_env()
        .init();
}

fn run(cli: &Cli) -> Result<()> {
    let style = Style::new(!cli.no_color);

    let mut session = HciSession::open_socket(cli.device, cli.session_config())
        .with_context(|| format!("Can't open device hci{}", cli.device))?;

    let addr = session.read_bd_addr().context("Read BD_ADDR failed")?;
    println!("Local address: {}", addr);

    let version = session
        .read_local_version()
        .context("Read Local Version Information failed")?;
    println!("{}", version_summary(&version));

    if !version.is_qti_controller() {
        println!("Not QTI controller, nothing more to do");
        return close(session);
    }

    let soc = match session.read_soc_addon_features() {
        Ok(soc) => soc,
        Err(HciError::Status(status)) => {
            println!("Add-on features not supported ({}), nothing more to do", status);
            return close(session);
        }
        Err(e) => return Err(e).context("Reading SoC add-on features failed"),
    };

    if !soc.supports_qle_hci().is_supported() {
        println!("Old device, QLE HCI is not supported, nothing more to do");
        return close(session);
    }

    println!(
        "Device SOC features (product 0x{:04x}, response version {}, {} bytes):",
        soc.product_id,
        soc.response_version,
        soc.valid_bytes()
    );
    println!("{}", feature_lines(soc.flags(), style));

    let qlmp = session
        .read_local_qlmp_features()
        .context("Reading local QLMP features failed")?;
    println!("QLMP features:");
    println!("{}", feature_lines(qlmp.flags(), style));
    match qlmp.max_qhs_rate() {
        Some(rate) => info!("Highest QHS rate: {}M", rate),
        None => info!("No QHS rate supported"),
    }

    if cli.qll {
        let qll = session
            .read_local_qll_features()
            .context("Reading local QLL features failed")?;
        println!("QLL features:");
        println!("{}", feature_lines(qll.flags(), style));
    }

    close(session)
}

fn close<T: qhs::HciTransport>(mut session: HciSession<T>) -> Result<()> {
    session.close().context("Closing the HCI session failed")
}
