//! Preview server for the generated site

use anyhow::Result;
use axum::Router;
use std::net::SocketAddr;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::Site;

/// Serve the destination directory until the process exits
pub async fn start(site: &Site, host: &str, port: u16) -> Result<()> {
    let app = router(site);
    let addr = bind_addr(host, port)?;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    println!("Server running at http://{}:{}", host, port);
    println!("Press Ctrl+C to stop.");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Static file router over the destination directory
pub fn router(site: &Site) -> Router {
    let files = ServeDir::new(&site.destination_dir).append_index_html_on_directories(true);
    Router::new()
        .fallback_service(files)
        .layer(TraceLayer::new_for_http())
}

/// Parse a bind address, accepting `localhost` as an alias for loopback
pub fn bind_addr(host: &str, port: u16) -> Result<SocketAddr> {
    let ip = if host == "localhost" { "127.0.0.1" } else { host };
    Ok(format!("{}:{}", ip, port).parse()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bind_addr() {
        assert_eq!(
            bind_addr("localhost", 8000).unwrap(),
            "127.0.0.1:8000".parse::<SocketAddr>().unwrap()
        );
        assert_eq!(
            bind_addr("0.0.0.0", 4000).unwrap(),
            "0.0.0.0:4000".parse::<SocketAddr>().unwrap()
        );
        assert!(bind_addr("not an ip", 80).is_err());
    }
}
