//! Example: Reading vendor feature sets
//!
//! This example issues the QBCE reads through a session and dumps the raw
//! bitmaps next to the decoded flags.

use qhs::hci::{HciCommand, QbceSubOpcode};
use qhs::{HciSession, SessionConfig};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("Opening hci0...");
    let mut session = HciSession::open_socket(0, SessionConfig::default())?;

    // Any command can be sent raw; the answer is the undecoded event
    let event = session.execute(&HciCommand::Qbce {
        sub_opcode: QbceSubOpcode::ReadLocalQlmSupportedFeatures,
    })?;
    println!("QBCE event: {:02x?}", event);

    let qlmp = session.read_local_qlmp_features()?;
    println!("\nQLMP bitmap: {:02x?}", qlmp.as_bytes());
    for (flag, set) in qlmp.flags() {
        println!("  {:<12} {}", if set { "supported" } else { "-" }, flag);
    }

    match session.read_local_qll_features() {
        Ok(qll) => {
            println!("\nQLL bitmap: {:02x?}", qll.as_bytes());
            for (flag, _) in qll.flags().filter(|(_, set)| *set) {
                println!("  {} ({}, bit {})", flag, flag.name, flag.bit);
            }
        }
        Err(e) if e.status().is_some() => println!("\nQLL read rejected: {}", e),
        Err(e) => return Err(e.into()),
    }

    session.close()?;
    Ok(())
}
