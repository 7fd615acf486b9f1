#[tokio::main]
async fn main() -> anyhow::Result<()> {
    animarr::run().await
}
