//! FlightVault gateway server binary.

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    flightvault_gateway::server::run().await
}
