#[tokio::main]
async fn main() -> anyhow::Result<()> {
    finance_server::run().await
}
