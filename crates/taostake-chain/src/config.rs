//! Network endpoints for chain connections.

use taostake_core::Network;

/// Default RPC endpoint for a network preset.
pub fn default_endpoint(network: Network) -> &'static str {
    match network {
        Network::Finney => "wss://entrypoint-finney.opentensor.ai:443",
        Network::Testnet => "wss://test.finney.opentensor.ai:443",
        Network::Local => "ws://127.0.0.1:9944",
    }
}

/// The endpoint to dial: an explicit override wins over the preset.
pub fn resolve_endpoint(network: Network, custom: Option<&str>) -> String {
    custom
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .unwrap_or_else(|| default_endpoint(network))
        .to_string()
}
