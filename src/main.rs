#[tokio::main]
async fn main() -> anyhow::Result<()> {
    hubtrack::run().await
}
