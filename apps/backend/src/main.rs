#[tokio::main]
async fn main() -> anyhow::Result<()> {
    card_forge_backend::run().await
}
