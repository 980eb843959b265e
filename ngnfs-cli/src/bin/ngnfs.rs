// SPDX-License-Identifier: BSD-3-Clause
// Copyright 2025. Triad National Security, LLC.

use std::io::{self, BufRead, Write};
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};

use ngnfs_cli::{connect, report_error};
use ngnfs_fsinfo::FsInfo;
use ngnfs_maps::{request_and_wait, MapClient, DEFAULT_REQUEST_TIMEOUT};
use ngnfs_wire::{log_operation_error, Error, Map};

#[derive(Parser)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Request the cluster map from a server and print it.
    Map {
        /// Map server to contact, as "addr:port".
        #[arg(long)]
        server: String,

        #[arg(long, default_value_t = DEFAULT_REQUEST_TIMEOUT.as_secs())]
        timeout_secs: u64,
    },

    /// Request the map, then print which endpoint owns a block.
    Lookup {
        #[arg(long)]
        server: String,

        /// Block number to map.
        bnr: u64,
    },

    /// Mount: fetch the map and hold the connection open until interrupted.
    Mount {
        #[arg(long)]
        server: String,
    },

    /// An interactive command loop against a connected map server.
    Debugfs {
        #[arg(long)]
        server: String,
    },
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let exit_code = match cli.command {
        Command::Map { server, timeout_secs } => run_map(&server, Duration::from_secs(timeout_secs)),
        Command::Lookup { server, bnr } => run_lookup(&server, bnr),
        Command::Mount { server } => run_mount(&server),
        Command::Debugfs { server } => run_debugfs(&server),
    };

    std::process::exit(exit_code);
}

fn setup_client(server: &str) -> Result<(Arc<MapClient>, Arc<FsInfo>, ngnfs_wire::Endpoint), Error> {
    let (transport, endpoint) = connect(server)?;
    let fsinfo = Arc::new(FsInfo::new());
    let client = MapClient::setup(transport, Arc::clone(&fsinfo))?;
    Ok((client, fsinfo, endpoint))
}

fn print_map(map: &Map) {
    println!("map with {} addresses:", map.nr_addrs());
    for (i, addr) in map.devd_map().addrs.iter().enumerate() {
        println!("  [{i}] {addr}");
    }
}

fn run_map(server: &str, timeout: Duration) -> i32 {
    let (client, _fsinfo, endpoint) = match setup_client(server) {
        Ok(v) => v,
        Err(e) => return report_error("connecting", &e),
    };

    match request_and_wait(&client, endpoint, Some(timeout)) {
        Ok(map) => {
            print_map(&map);
            0
        }
        Err(e) => report_error("requesting map", &e),
    }
}

fn run_lookup(server: &str, bnr: u64) -> i32 {
    let (client, _fsinfo, endpoint) = match setup_client(server) {
        Ok(v) => v,
        Err(e) => return report_error("connecting", &e),
    };

    match request_and_wait(&client, endpoint, None) {
        Ok(_map) => match client.lookup(bnr) {
            Ok(addr) => {
                println!("{addr}");
                0
            }
            Err(e) => report_error("looking up block", &e),
        },
        Err(e) => report_error("requesting map", &e),
    }
}

fn run_mount(server: &str) -> i32 {
    let (client, fsinfo, endpoint) = match setup_client(server) {
        Ok(v) => v,
        Err(e) => return report_error("connecting", &e),
    };

    let mask = ngnfs_lifecycle::block_process_signals();
    ngnfs_lifecycle::run_supervisor(mask, Arc::clone(&fsinfo), move |fsinfo| {
        let result = ngnfs_lifecycle::run_monitor(
            "mount",
            &fsinfo,
            || Ok(()),
            {
                let fsinfo = Arc::clone(&fsinfo);
                move || {
                    let map = request_and_wait(&client, endpoint, None)?;
                    println!("mounted, {} addresses available", map.nr_addrs());
                    // Hold the mount open until a shutdown is requested.
                    while !fsinfo.should_shutdown() {
                        std::thread::sleep(Duration::from_millis(200));
                    }
                    client.destroy();
                    Ok::<(), Error>(())
                }
            },
            || {},
        );
        if let Err(e) = result {
            log_operation_error("mount", &e);
        }
    })
}

/// The root inode number every fresh debugfs session starts `cwd_ino` at.
/// There's no real on-disk format behind it yet; it only anchors the prompt
/// and the `stat`/`mkfs` stubs.
const ROOT_INO: u64 = 1;

fn run_debugfs(server: &str) -> i32 {
    let (client, fsinfo, endpoint) = match setup_client(server) {
        Ok(v) => v,
        Err(e) => return report_error("connecting", &e),
    };

    if let Err(e) = request_and_wait(&client, endpoint, None) {
        return report_error("requesting map", &e);
    }

    let cwd_ino = ROOT_INO;
    let stdin = io::stdin();
    print!("<{cwd_ino}> $ ");
    let _ = io::stdout().flush();

    for line in stdin.lock().lines() {
        let Ok(line) = line else { break };
        if fsinfo.should_shutdown() {
            break;
        }

        match run_command(&client, line.trim()) {
            CommandResult::Continue => {}
            CommandResult::Quit => break,
            CommandResult::UnknownCommand => println!("unknown command: '{}'", line.trim()),
        }

        print!("<{cwd_ino}> $ ");
        let _ = io::stdout().flush();
    }

    client.destroy();
    0
}

enum CommandResult {
    Continue,
    Quit,
    UnknownCommand,
}

/// Commands kept sorted by name, looked up with a binary search, matching
/// how a larger command table would be dispatched.
const COMMANDS: &[(&str, fn(&MapClient, &str) -> CommandResult)] = &[
    ("lookup", cmd_lookup),
    ("maps", cmd_maps),
    ("mkfs", cmd_mkfs),
    ("quit", cmd_quit),
    ("stat", cmd_stat),
];

fn run_command(client: &MapClient, line: &str) -> CommandResult {
    if line.is_empty() {
        return CommandResult::Continue;
    }
    let mut parts = line.splitn(2, char::is_whitespace);
    let name = parts.next().unwrap_or("");
    let rest = parts.next().unwrap_or("").trim();

    match COMMANDS.binary_search_by(|(cmd_name, _)| (*cmd_name).cmp(name)) {
        Ok(index) => (COMMANDS[index].1)(client, rest),
        Err(_) => CommandResult::UnknownCommand,
    }
}

fn cmd_quit(_client: &MapClient, _rest: &str) -> CommandResult {
    CommandResult::Quit
}

fn cmd_maps(client: &MapClient, _rest: &str) -> CommandResult {
    match client_current_map(client) {
        Some(map) => print_map(&map),
        None => println!("no map available"),
    }
    CommandResult::Continue
}

fn cmd_lookup(client: &MapClient, rest: &str) -> CommandResult {
    match rest.parse::<u64>() {
        Ok(bnr) => match client.lookup(bnr) {
            Ok(addr) => println!("{addr}"),
            Err(e) => log_operation_error("lookup", &e),
        },
        Err(_) => println!("usage: lookup <block number>"),
    }
    CommandResult::Continue
}

/// No on-disk format exists yet, so this just reports what a real `mkfs`
/// would have done to the root inode.
fn cmd_mkfs(_client: &MapClient, _rest: &str) -> CommandResult {
    println!("mkfs: formatted root inode {ROOT_INO} (stub, no on-disk format)");
    CommandResult::Continue
}

/// Prints placeholder fields for the root inode; there's no persistent
/// store backing them yet.
fn cmd_stat(_client: &MapClient, _rest: &str) -> CommandResult {
    println!(
        "ino: {ROOT_INO}\n\
         gen: 0\n\
         nlink: 1\n\
         mode: 40755\n\
         atime: 0\n\
         ctime: 0\n\
         mtime: 0\n\
         crtime: 0"
    );
    CommandResult::Continue
}

fn client_current_map(client: &MapClient) -> Option<Arc<Map>> {
    client.wait_until_ready(Some(Duration::from_millis(1))).ok()
}
