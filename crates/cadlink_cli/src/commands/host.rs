//! Host command implementation.

use cadlink_bridge::{Bridge, BridgeConfig};
use cadlink_engine::{MemoryDocument, ReconcileOptions};
use std::time::Duration;
use tracing::info;

/// Options for the host command.
#[derive(Debug, Clone)]
pub struct HostOptions {
    /// Address of the listening client.
    pub connect: String,
    /// Session key.
    pub session: String,
    /// Answer a single request, then exit.
    pub once: bool,
    /// Read timeout in seconds.
    pub read_timeout: Option<u64>,
    /// Skip regenerating dimension layouts.
    pub no_dimension_regen: bool,
    /// Skip the group linking pass.
    pub no_group_links: bool,
}

/// Runs the host command.
pub fn run(options: &HostOptions) -> Result<(), Box<dyn std::error::Error>> {
    let reconcile = ReconcileOptions::new()
        .with_regenerate_dimensions(!options.no_dimension_regen)
        .with_link_groups(!options.no_group_links);
    let config = BridgeConfig::new()
        .with_read_timeout(options.read_timeout.map(Duration::from_secs))
        .with_reconcile(reconcile);

    let mut bridge = Bridge::load(config, MemoryDocument::new())?;
    let peer = bridge.connect(&options.session, &options.connect)?;
    println!("Session {} connected to {}", options.session, peer);

    let answered = if options.once {
        bridge.db_operation(&options.session)?;
        1
    } else {
        bridge.serve(&options.session)?
    };

    let document = bridge.unload();
    let counters = document.counters();
    info!(
        answered,
        objects = document.object_count(),
        appended = counters.appended,
        erased = counters.erased,
        "host finished"
    );
    println!("Answered {} request(s)", answered);
    println!("Document objects: {}", document.object_count());
    Ok(())
}
