// SPDX-FileCopyrightText: © 2023 Tenstorrent Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Serves aggregated accelerator telemetry as a Prometheus scrape endpoint.

- `GET /metrics` renders the current exposition; every request runs one
  scrape against the device-management core.
- `GET /healthz` answers "healthy" while at least one device is enumerable.

You can test this by running `curl localhost:29999/metrics` while the
service is running.
*/

use std::path::PathBuf;

use clap::Parser;
use tiny_http::{Header, Response, Server};

use telemux_exporter::{check_health, Exporter};
use telemux_if::{AttributionSource, NoAttribution};

mod snapshot;
use snapshot::{SnapshotCore, StaticAttribution};

/// Command line arguments.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct CommandLineArguments {
    /// Address to listen on
    #[arg(short, long, default_value = "0.0.0.0:29999")]
    addr: String,

    /// Telemetry snapshot file standing in for the device-management core
    #[arg(short, long)]
    snapshot: PathBuf,

    /// JSON map from PCI bus address to workload attribution
    #[arg(long)]
    attribution: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = CommandLineArguments::parse();

    let core = SnapshotCore::load(&args.snapshot)?;
    let attribution: Box<dyn AttributionSource> = match &args.attribution {
        Some(path) => Box::new(StaticAttribution::load(path)?),
        None => Box::new(NoAttribution),
    };

    let node_name = std::env::var("NODE_NAME").ok();
    let exporter = Exporter::new(node_name);

    let server = Server::http(&args.addr)
        .map_err(|err| format!("failed to bind {}: {err}", args.addr))?;
    tracing::info!("serving metrics on http://{}/metrics", args.addr);

    let text_plain = Header::from_bytes(&b"Content-Type"[..], &b"text/plain; version=0.0.4"[..])
        .expect("static header");

    for request in server.incoming_requests() {
        match request.url() {
            "/metrics" => match exporter.scrape(&core, attribution.as_ref()) {
                Ok(body) => {
                    let _ = request.respond(
                        Response::from_string(body).with_header(text_plain.clone()),
                    );
                }
                Err(err) => {
                    tracing::error!("scrape failed: {err}");
                    let _ = request.respond(
                        Response::from_string(format!("#nodata: {err}")).with_status_code(500),
                    );
                }
            },
            "/healthz" => match check_health(&core) {
                Ok(()) => {
                    let _ = request.respond(Response::from_string("healthy"));
                }
                Err(err) => {
                    let _ = request
                        .respond(Response::from_string(err.to_string()).with_status_code(500));
                }
            },
            _ => {
                let _ = request.respond(Response::empty(404));
            }
        }
    }

    Ok(())
}
