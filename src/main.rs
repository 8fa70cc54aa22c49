#[tokio::main]
async fn main() {
    if let Err(e) = fpn_assistant::run().await {
        eprintln!("fpn-assistant: {e}");
        std::process::exit(1);
    }
}
