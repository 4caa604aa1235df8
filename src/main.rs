#[tokio::main]
async fn main() -> std::io::Result<()> {
    home_services_booking::run().await
}
