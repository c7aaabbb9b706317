//! Web server command.

use console::style;

use crate::config::{BackendKind, Settings};
use crate::extraction::tools;

/// Default port when only a host is given.
const DEFAULT_PORT: u16 = 8000;

/// Start the web server.
pub async fn cmd_serve(settings: Settings, bind: &str) -> anyhow::Result<()> {
    let (host, port) = parse_bind_address(bind)?;

    if let Err(e) = settings.validate() {
        eprintln!("  {} {}", style("✗").red(), e);
        return Err(anyhow::anyhow!("Invalid configuration: {}", e));
    }

    println!(
        "{} Extraction backend: {}",
        style("→").cyan(),
        style(settings.backend).bold()
    );
    let status = tools::availability(&settings.ocr);
    if settings.backend == BackendKind::Local && !status.ready() {
        println!(
            "  {} {}",
            style("!").yellow(),
            tools::availability_hint(&settings.ocr)
        );
        println!("    Only PDFs with a text layer can be read until then");
    }

    println!(
        "{} Starting rubricly server at http://{}:{}",
        style("→").cyan(),
        host,
        port
    );
    println!("  Press Ctrl+C to stop");

    crate::server::serve(settings, &host, port).await
}

/// Parse a bind address that can be:
/// - Just a port: "8000" -> 127.0.0.1:8000
/// - Just a host: "0.0.0.0" -> 0.0.0.0:8000
/// - Host and port: "0.0.0.0:8000" -> 0.0.0.0:8000
fn parse_bind_address(bind: &str) -> anyhow::Result<(String, u16)> {
    let bind = bind.trim();
    if bind.is_empty() {
        anyhow::bail!("Bind address is empty");
    }

    if let Ok(port) = bind.parse::<u16>() {
        return Ok(("127.0.0.1".to_string(), port));
    }

    if let Some((host, port_str)) = bind.rsplit_once(':') {
        if let Ok(port) = port_str.parse::<u16>() {
            return Ok((host.to_string(), port));
        }
    }

    Ok((bind.to_string(), DEFAULT_PORT))
}
