#[tokio::main]
async fn main() {
    if let Err(e) = rpost::app::run::main_with_error().await {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}
