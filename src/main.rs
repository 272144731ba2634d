//! Fills a default routing table with a handful of identifiers, then prints the buckets and the
//! lookup results.
//!
//! Set `RUST_LOG=kbucket=debug` to follow the bucket splits.

use kbucket::{Config, Lookup, RoutingTable};
use tracing_subscriber::{fmt, EnvFilter};

const IDS: [&str; 8] = [
    "0000000000000000000000112233445566778899",
    "00000000000000000000aabbccddeeff00112233",
    "0000000000000000000011223344556677889900",
    "0000000000000000000022334455667788990011",
    "0000000000000000000033445566778899001122",
    "0000000000000000000033445566778899001123",
    "0000000000000000000033445566778899001124",
    "0000000000000000000033445566778899001125",
];

fn main() {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let mut rt: RoutingTable = match RoutingTable::new(Config::default()) {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("invalid configuration: {e}");
            std::process::exit(1);
        }
    };

    for id in IDS {
        if let Err(e) = rt.insert_hex(id) {
            eprintln!("couldn't insert {id}: {e}");
        }
    }

    print!("{rt}");

    for id in IDS.iter().chain(["0000000000000000000033445566778899001126"].iter()) {
        match rt.find_hex(id) {
            Ok(Lookup::Exact(peer)) => println!("{id}: found {}", peer.id()),
            Ok(Lookup::Sample(peers)) => {
                let ids: Vec<_> = peers.iter().map(|peer| peer.id().to_string()).collect();
                println!("{id}: not found, nearby [{}]", ids.join(", "));
            }
            Ok(Lookup::Empty) => println!("{id}: not found, bucket empty"),
            Err(e) => println!("{id}: {e}"),
        }
    }
}
