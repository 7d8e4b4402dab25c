#[tokio::main]
async fn main() {
    tarot_backend::run().await;
}
