//! feedline-web: HTTP server for the feedline social feed.

#[tokio::main]
async fn main() {
    if let Err(e) = feedline::web_client::run().await {
        feedline::tlog!("feedline-web failed: {}", e);
        std::process::exit(1);
    }
}
