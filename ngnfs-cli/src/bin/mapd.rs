// SPDX-License-Identifier: BSD-3-Clause
// Copyright 2025. Triad National Security, LLC.

use std::net::TcpListener;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use log::info;

use ngnfs_fsinfo::FsInfo;
use ngnfs_maps::MapServer;
use ngnfs_transport::{TcpTransport, Transport};
use ngnfs_wire::{log_operation_error, AddressList, Error};

/// Cluster map server: answers `GET_MAPS` requests with a fixed, configured
/// address list.
#[derive(Parser)]
struct Args {
    /// Address to listen on, as "addr:port".
    #[arg(long, default_value = "0.0.0.0:2049")]
    listen: String,

    /// A device endpoint to include in the served map, as "addr:port".
    /// Repeat to add more than one.
    #[arg(long = "addr", required = true)]
    addrs: Vec<String>,

    /// Detach into a daemon after startup succeeds.
    #[arg(long)]
    daemonize: bool,
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    let reporter = if args.daemonize {
        match ngnfs_lifecycle::daemonize() {
            Ok(reporter) => reporter,
            Err(e) => {
                log_operation_error("daemonizing", &e);
                std::process::exit(1);
            }
        }
    } else {
        None
    };

    let mut addrs = AddressList::new();
    for text in &args.addrs {
        if let Err(e) = addrs.append(text) {
            log_operation_error("parsing --addr", &e);
            if let Some(reporter) = reporter {
                reporter.report(1);
            }
            std::process::exit(1);
        }
    }

    let mask = ngnfs_lifecycle::block_process_signals();
    let fsinfo = Arc::new(FsInfo::new());
    let listen = args.listen.clone();

    let exit_code = ngnfs_lifecycle::run_supervisor(mask, Arc::clone(&fsinfo), move |fsinfo| {
        let result = ngnfs_lifecycle::run_monitor(
            "map server",
            &fsinfo,
            || Ok(()),
            {
                let fsinfo = Arc::clone(&fsinfo);
                move || serve(&listen, addrs, &fsinfo)
            },
            || {},
        );

        if let Some(reporter) = reporter {
            reporter.report(if result.is_ok() { 0 } else { 1 });
        }
    });

    std::process::exit(exit_code);
}

/// Accept connections until shutdown is requested, handing each one its own
/// [`MapServer`]. This is the server's one blocking operation in the
/// lifecycle's worker sense: it runs for the life of the process rather
/// than completing once, since a map server's job never naturally finishes.
fn serve(listen: &str, addrs: AddressList, fsinfo: &FsInfo) -> Result<(), Error> {
    let listener = TcpListener::bind(listen)?;
    listener.set_nonblocking(true)?;
    info!("listening on {listen}");

    let mut servers = Vec::new();

    loop {
        if fsinfo.should_shutdown() {
            return Ok(());
        }

        match listener.accept() {
            Ok((stream, peer)) => {
                stream.set_nonblocking(false)?;
                info!("accepted connection from {peer}");
                let transport: Arc<dyn Transport> = Arc::new(TcpTransport::new(stream)?);
                let server = MapServer::setup(transport, addrs.clone())?;
                servers.push(server);
            }
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                std::thread::sleep(Duration::from_millis(200));
            }
            Err(e) => return Err(e.into()),
        }
    }
}
