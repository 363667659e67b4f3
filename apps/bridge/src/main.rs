//! # Cambio Bridge Entry Point
//!
//! Reads JSON-lines requests on stdin and answers on stdout. Logs go to
//! stderr. The process exits when stdin closes.

fn main() {
    // The actual setup is in lib.rs for better testability
    if let Err(e) = cambio_bridge_lib::run() {
        eprintln!("cambio-bridge: {}", e);
        std::process::exit(1);
    }
}
