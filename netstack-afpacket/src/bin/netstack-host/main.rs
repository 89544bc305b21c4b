use crate::subscriber::StderrSubscriber;
use clap::{value_t, App, Arg, ArgMatches};
use netstack_afpacket::AfPacketDriver;
use netstack_packets::MacAddr;
use netstack_runtime::config::{StackConfig, DEFAULT_MTU};
use netstack_runtime::utils::run_until_interrupted;
use netstack_runtime::{NetStack, Result};
use std::net::Ipv4Addr;
use std::process;
use std::str::FromStr;
use std::time::Duration;
use tracing::{error, info, Level};

mod subscriber;

fn parses_as<T: FromStr>(value: String) -> std::result::Result<(), String> {
    value
        .parse::<T>()
        .map(|_| ())
        .map_err(|_| format!("could not parse {:?}", value))
}

fn main() {
    let default_mtu = DEFAULT_MTU.to_string();
    let matches = App::new("netstack-host")
        .version("0.1.0")
        .about("Runs the netstack on a Linux interface, answering ARP and ping")
        .arg(
            Arg::with_name("interface")
                .short("i")
                .long("interface")
                .value_name("IFACE")
                .help("Interface to bind to")
                .takes_value(true)
                .required(true),
        )
        .arg(
            Arg::with_name("ip")
                .long("ip")
                .value_name("ADDR")
                .help("IPv4 address the stack answers for")
                .takes_value(true)
                .required(true)
                .validator(parses_as::<Ipv4Addr>),
        )
        .arg(
            Arg::with_name("mac")
                .long("mac")
                .value_name("MAC")
                .help("Source MAC address, defaults to the interface's own")
                .takes_value(true)
                .validator(parses_as::<MacAddr>),
        )
        .arg(
            Arg::with_name("mtu")
                .long("mtu")
                .value_name("BYTES")
                .takes_value(true)
                .default_value(&default_mtu)
                .validator(parses_as::<usize>),
        )
        .arg(
            Arg::with_name("poll")
                .long("poll-interval")
                .value_name("MILLIS")
                .help("How often to poll the interface")
                .takes_value(true)
                .default_value("1")
                .validator(parses_as::<u64>),
        )
        .arg(
            Arg::with_name("verbose")
                .short("v")
                .long("verbose")
                .multiple(true)
                .help("Log more; repeat for packet level tracing"),
        )
        .get_matches();

    let level = match matches.occurrences_of("verbose") {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing::subscriber::set_global_default(StderrSubscriber::new(level))
        .expect("setting tracing default failed");

    if let Err(err) = run(&matches) {
        error!(%err, "netstack-host stopped");
        process::exit(1);
    }
}

fn run(matches: &ArgMatches) -> Result<()> {
    let iface = matches.value_of("interface").unwrap_or_default();
    let ipv4_addr = value_t!(matches, "ip", Ipv4Addr).unwrap_or_else(|e| e.exit());
    let mtu = value_t!(matches, "mtu", usize).unwrap_or_else(|e| e.exit());
    let poll_interval =
        Duration::from_millis(value_t!(matches, "poll", u64).unwrap_or_else(|e| e.exit()));

    let driver = AfPacketDriver::open(iface)?;
    let mac_addr = if matches.is_present("mac") {
        value_t!(matches, "mac", MacAddr).unwrap_or_else(|e| e.exit())
    } else {
        driver.hardware_addr()
    };
    info!(%iface, %ipv4_addr, %mac_addr, mtu, "bound interface");

    let config = StackConfig::new(ipv4_addr, mac_addr).with_mtu(mtu);
    let stack = NetStack::new(config, driver)?;
    let stack = run_until_interrupted(stack, poll_interval)?;

    let stats = stack.stats();
    info!(
        frames_received = stats.frames_received,
        frames_sent = stats.frames_sent,
        arp_replies_sent = stats.arp_replies_sent,
        echo_replies_sent = stats.echo_replies_sent,
        dropped = stats.total_drops(),
        "stack stopped"
    );
    Ok(())
}
